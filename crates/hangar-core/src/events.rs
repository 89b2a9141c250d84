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

//! Notifications produced by committed calls.
//!
//! Calls buffer events in a pending list; the host appends them to the
//! [`EventLog`] only when the call commits.

use serde::{Deserialize, Serialize};

use crate::issuance::MintPhase;
use crate::pilot::PilotRef;
use crate::types::{Address, BlockHeight, Hash32, TokenId, Wei};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HangarEvent {
    Transfer {
        from: Address,
        to: Address,
        token: TokenId,
    },
    Approval {
        owner: Address,
        approved: Address,
        token: TokenId,
    },
    ApprovalForAll {
        owner: Address,
        operator: Address,
        approved: bool,
    },
    PhaseChanged {
        phase: MintPhase,
    },
    RootsUpdated {
        allowlist: Option<Hash32>,
        waitlist: Option<Hash32>,
    },
    Minted {
        to: Address,
        first_token: TokenId,
        quantity: u64,
        phase: MintPhase,
        paid: Wei,
    },
    Refunded {
        to: Address,
        amount: Wei,
    },
    Withdrawn {
        to: Address,
        amount: Wei,
    },
    Training {
        token: TokenId,
    },
    Parked {
        token: TokenId,
    },
    Piloted {
        token: TokenId,
        pilot: PilotRef,
    },
    MetadataUpdate {
        token: TokenId,
    },
    FlightStarted {
        token: TokenId,
        owner: Address,
        block: BlockHeight,
    },
    FlightEnded {
        token: TokenId,
        owner: Address,
        block: BlockHeight,
    },
    IssuerTransferred {
        previous: Address,
        current: Address,
    },
    AdminChanged {
        previous: Option<Address>,
        current: Option<Address>,
    },
}

impl HangarEvent {
    pub fn token(&self) -> Option<TokenId> {
        match self {
            Self::Transfer { token, .. }
            | Self::Approval { token, .. }
            | Self::Training { token }
            | Self::Parked { token }
            | Self::Piloted { token, .. }
            | Self::MetadataUpdate { token }
            | Self::FlightStarted { token, .. }
            | Self::FlightEnded { token, .. } => Some(*token),
            _ => None,
        }
    }
}

/// Append-only record of committed events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<HangarEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, events: Vec<HangarEvent>) {
        self.events.extend(events);
    }

    pub fn events(&self) -> &[HangarEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events committed after the first `offset` entries.
    pub fn since(&self, offset: usize) -> &[HangarEvent] {
        self.events.get(offset..).unwrap_or_default()
    }

    pub fn for_token(&self, token: TokenId) -> impl Iterator<Item = &HangarEvent> {
        self.events
            .iter()
            .filter(move |event| event.token() == Some(token))
    }
}
