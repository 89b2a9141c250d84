// Copyright [2026] [Joseph Verdicchio]
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// Copyright (c) 2026 Joseph Verdicchio and Hangar Contributors
// SPDX-License-Identifier: Apache-2.0

//! hangar-core
//!
//! Issuance and garage engine for a collection of pilotable tokens.
//!
//! This crate implements:
//! - An asset ledger with sequential ids, approvals and a pluggable transfer guard
//! - Phased issuance with Merkle-proven free/paid allowances, refunds and a supply cap
//! - A per-token garage state machine with exclusive custom pilots and auto-parking
//! - Delegation lookups that fail closed when the registry is unavailable
//! - A host that applies every call atomically over a monotonic block clock

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod delegation;
pub mod error;
pub mod events;
pub mod garage;
pub mod hangar;
pub mod issuance;
pub mod ledger;
pub mod merkle;
pub mod pilot;
pub mod types;

pub use crate::config::{ConfigError, HangarConfig};
pub use crate::error::{HangarError, HangarResult};
pub use crate::events::{EventLog, HangarEvent};
pub use crate::garage::{PilotInfo, PilotStatus};
pub use crate::hangar::{CallContext, Hangar};
pub use crate::issuance::{AllowanceClaim, MintPhase};
pub use crate::pilot::PilotRef;
pub use crate::types::{Address, BlockHeight, Hash32, TokenId, Wei};
