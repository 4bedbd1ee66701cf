// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use chrono::Utc;
use kuskcore::chain::*;
use kuskcore::node::TxPool;
use kuskcore::primitives::Tx;
use kuskcore::settings::{default_config_path, Settings};
use log::*;
use mimalloc::MiMalloc;
use std::io::{self, BufRead};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use triomphe::Arc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = default_config_path();
    if let Some(path) = &config_path {
        if !path.exists() {
            // Fall back to defaults and environment variables
            if let Err(err) = Settings::write_default(path) {
                error!("Failed to create configuration! Reason: {:#?}", err);
            }
        }
    }

    let settings = Settings::load(config_path.as_deref())?;
    let config = ChainConfig::new(&settings.node.network_name)?;
    info!("Starting kuskd on {}", config.network_name());

    let pool = Arc::new(TxPool::new(settings.txpool.clone()));
    let chain = Chain::new(MemoryBackend::new(), config, pool.clone())?;
    info!("Best block height {}", chain.best_block_height());

    // One hex encoded transaction per line
    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match Tx::from_hex(line) {
            Ok(tx) => match chain.validate_tx(&tx) {
                Ok(true) => info!("Accepted tx {}", tx.id.to_hex()),
                Ok(false) => info!("Tx {} is already in the pool", tx.id.to_hex()),
                Err(err) => warn!("Rejected tx {}: {}", tx.id.to_hex(), err),
            },
            Err(err) => warn!("Could not decode tx: {}", err),
        }

        let expired = pool.expire_transactions(Utc::now().timestamp_millis());
        if expired > 0 {
            debug!("Expired {} pool transactions", expired);
        }
    }

    info!("Shutting down, {} transactions in pool", pool.count());
    Ok(())
}
