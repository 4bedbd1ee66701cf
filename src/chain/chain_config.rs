// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::consensus::{Params, ParamsErr};

/// Network configuration selected once at startup. Immutable afterwards.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    params: Params,
}

impl ChainConfig {
    pub fn new(network_name: &str) -> Result<Self, ParamsErr> {
        Ok(Self {
            params: Params::by_chain_id(network_name)?,
        })
    }

    #[must_use]
    pub fn network_name(&self) -> &'static str {
        self.params.name
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl From<Params> for ChainConfig {
    fn from(params: Params) -> Self {
        Self { params }
    }
}
