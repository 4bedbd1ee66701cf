// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

mod block;
mod common;
mod entry;
mod hash;
mod input;
mod output;
mod transaction;
mod utxo;

pub use crate::primitives::block::*;
pub use crate::primitives::common::*;
pub use crate::primitives::entry::*;
pub use crate::primitives::hash::*;
pub use crate::primitives::input::*;
pub use crate::primitives::output::*;
pub use crate::primitives::transaction::*;
pub use crate::primitives::utxo::*;
