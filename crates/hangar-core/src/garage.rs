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

//! Per-token garage state machine.
//!
//! Every token moves through `Untrained → Training → (Untrained | Parked) →
//! Piloted → Parked → …`. Custom pilots are exclusive: the reverse index maps
//! each one to the single token holding it in `Training` or `Piloted`, and
//! assigning a pilot that is already in use parks its previous holder first.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::delegation::{is_authorized_delegate, token_scopes, DelegationOracle};
use crate::error::{HangarError, HangarResult};
use crate::events::HangarEvent;
use crate::ledger::{AssetLedger, TransferGuard};
use crate::pilot::{PilotDirectory, PilotRef};
use crate::types::{Address, BlockHeight, TokenId};

pub const DEFAULT_TRAINING_DURATION: BlockHeight = 172_800;
pub const MAX_BATCH_SIZE: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PilotStatus {
    #[default]
    Untrained,
    Training,
    Parked,
    Piloted,
}

impl PilotStatus {
    /// Statuses in which a token holds its pilot exclusively.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Training | Self::Piloted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GarageRecord {
    pub status: PilotStatus,
    pub started_at_block: BlockHeight,
    pub pilot: Option<PilotRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PilotInfo {
    pub status: PilotStatus,
    /// Ready to park with a retained pilot or take a new one right now.
    pub pilotable: bool,
    pub started_at_block: BlockHeight,
    pub pilot: Option<PilotRef>,
}

/// Who is driving a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// Regular path: the token owner or one of its delegates.
    Holder(Address),
    /// Issuing-authority override, identity checked by the host.
    Issuer,
    /// Admin override, identity checked by the host.
    Admin,
}

/// Read-only collaborators a garage call consults.
pub struct GarageEnv<'a> {
    pub ledger: &'a AssetLedger,
    pub oracle: &'a dyn DelegationOracle,
    pub pilots: &'a PilotDirectory,
    pub ledger_address: Address,
    pub now: BlockHeight,
}

impl GarageEnv<'_> {
    fn elapsed_since(&self, started: BlockHeight) -> BlockHeight {
        self.now.saturating_sub(started)
    }
}

#[derive(Debug, Clone)]
pub struct GarageEngine {
    training_duration: BlockHeight,
    max_batch: usize,
    records: HashMap<TokenId, GarageRecord>,
    assignments: HashMap<PilotRef, TokenId>,
}

impl Default for GarageEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TRAINING_DURATION, MAX_BATCH_SIZE)
    }
}

impl GarageEngine {
    pub fn new(training_duration: BlockHeight, max_batch: usize) -> Self {
        Self {
            training_duration,
            max_batch: max_batch.min(MAX_BATCH_SIZE),
            records: HashMap::new(),
            assignments: HashMap::new(),
        }
    }

    pub fn training_duration(&self) -> BlockHeight {
        self.training_duration
    }

    pub fn record(&self, token: TokenId) -> GarageRecord {
        self.records.get(&token).copied().unwrap_or_default()
    }

    /// Token currently holding `pilot` in `Training` or `Piloted`.
    pub fn holder_of(&self, pilot: &PilotRef) -> Option<TokenId> {
        self.assignments.get(pilot).copied()
    }

    pub fn pilot_info(
        &self,
        ledger: &AssetLedger,
        token: TokenId,
        now: BlockHeight,
    ) -> HangarResult<PilotInfo> {
        if !ledger.exists(token) {
            return Err(HangarError::OwnerQueryForNonexistentToken);
        }
        let record = self.record(token);
        let elapsed = now.saturating_sub(record.started_at_block);
        let pilotable = match record.status {
            PilotStatus::Training => elapsed >= self.training_duration,
            PilotStatus::Parked => true,
            PilotStatus::Untrained | PilotStatus::Piloted => false,
        };
        Ok(PilotInfo {
            status: record.status,
            pilotable,
            started_at_block: record.started_at_block,
            pilot: record.pilot,
        })
    }

    /// Returns the token owner when `actor` may act on `token`.
    fn authorize(&self, env: &GarageEnv<'_>, actor: Actor, token: TokenId) -> HangarResult<Address> {
        let owner = env.ledger.owner_of(token)?;
        match actor {
            Actor::Issuer | Actor::Admin => Ok(owner),
            Actor::Holder(caller) if caller == owner => Ok(owner),
            Actor::Holder(caller) => {
                let scopes = token_scopes(env.ledger_address, token);
                if is_authorized_delegate(env.oracle, &caller, &owner, &scopes) {
                    Ok(owner)
                } else {
                    Err(HangarError::Unauthorized)
                }
            }
        }
    }

    fn check_batch_len(&self, len: usize) -> HangarResult<()> {
        if len == 0 || len > self.max_batch {
            return Err(HangarError::InvalidBatchPilotAction);
        }
        Ok(())
    }

    fn unindex(&mut self, token: TokenId, pilot: Option<PilotRef>) {
        if let Some(pilot) = pilot.filter(PilotRef::is_exclusive) {
            if self.assignments.get(&pilot) == Some(&token) {
                self.assignments.remove(&pilot);
            }
        }
    }

    fn park(
        &mut self,
        token: TokenId,
        owner: Address,
        now: BlockHeight,
        events: &mut Vec<HangarEvent>,
    ) {
        let record = self.records.entry(token).or_default();
        record.status = PilotStatus::Parked;
        let pilot = record.pilot;
        self.unindex(token, pilot);
        events.push(HangarEvent::Parked { token });
        events.push(HangarEvent::MetadataUpdate { token });
        events.push(HangarEvent::FlightEnded {
            token,
            owner,
            block: now,
        });
        tracing::debug!(target: "hangar.garage", token, "parked");
    }

    pub fn start_training(
        &mut self,
        env: &GarageEnv<'_>,
        caller: Address,
        token: TokenId,
        events: &mut Vec<HangarEvent>,
    ) -> HangarResult<()> {
        let owner = self.authorize(env, Actor::Holder(caller), token)?;
        if self.record(token).status != PilotStatus::Untrained {
            return Err(HangarError::InvalidPilotStatus);
        }
        self.records.insert(
            token,
            GarageRecord {
                status: PilotStatus::Training,
                started_at_block: env.now,
                pilot: Some(PilotRef::training_placeholder()),
            },
        );
        events.push(HangarEvent::Training { token });
        events.push(HangarEvent::MetadataUpdate { token });
        events.push(HangarEvent::FlightStarted {
            token,
            owner,
            block: env.now,
        });
        tracing::debug!(target: "hangar.garage", token, caller = %caller, "training started");
        Ok(())
    }

    pub fn release(
        &mut self,
        env: &GarageEnv<'_>,
        actor: Actor,
        token: TokenId,
        events: &mut Vec<HangarEvent>,
    ) -> HangarResult<()> {
        let owner = self.authorize(env, actor, token)?;
        let record = self.record(token);
        match record.status {
            PilotStatus::Training if env.elapsed_since(record.started_at_block) < self.training_duration => {
                self.unindex(token, record.pilot);
                self.records.insert(token, GarageRecord::default());
                events.push(HangarEvent::Parked { token });
                events.push(HangarEvent::MetadataUpdate { token });
                events.push(HangarEvent::FlightEnded {
                    token,
                    owner,
                    block: env.now,
                });
                tracing::debug!(target: "hangar.garage", token, "training abandoned");
            }
            PilotStatus::Training | PilotStatus::Piloted => {
                self.park(token, owner, env.now, events);
            }
            PilotStatus::Untrained | PilotStatus::Parked => {
                return Err(HangarError::InvalidPilotStatus);
            }
        }
        if actor != Actor::Holder(owner) {
            tracing::info!(target: "hangar.garage", token, actor = ?actor, "release on behalf of owner");
        }
        Ok(())
    }

    pub fn assign_pilot(
        &mut self,
        env: &GarageEnv<'_>,
        caller: Address,
        token: TokenId,
        contract: Address,
        id: u64,
        events: &mut Vec<HangarEvent>,
    ) -> HangarResult<()> {
        let owner = self.authorize(env, Actor::Holder(caller), token)?;
        let record = self.record(token);
        match record.status {
            PilotStatus::Untrained => return Err(HangarError::InvalidPilotStatus),
            PilotStatus::Training
                if env.elapsed_since(record.started_at_block) < self.training_duration =>
            {
                return Err(HangarError::InvalidPilotStatus)
            }
            PilotStatus::Training | PilotStatus::Parked | PilotStatus::Piloted => {}
        }

        let resolved = env.pilots.resolve(&env.ledger_address, contract, id)?;
        if let (PilotRef::Custom { contract, id }, Some(holder)) = (resolved.pilot, resolved.holder) {
            let acting_for_holder = holder == caller
                || holder == owner
                || is_authorized_delegate(
                    env.oracle,
                    &caller,
                    &holder,
                    &token_scopes(contract, TokenId::from(id)),
                );
            if !acting_for_holder {
                return Err(HangarError::InvalidCustomPilot("unauthorized"));
            }
        }
        let pilot = resolved.pilot;
        if record.status == PilotStatus::Piloted && record.pilot == Some(pilot) {
            return Err(HangarError::InvalidPilotStatus);
        }

        if record.status.is_active() {
            self.unindex(token, record.pilot);
            events.push(HangarEvent::FlightEnded {
                token,
                owner,
                block: env.now,
            });
        }

        if pilot.is_exclusive() {
            if let Some(previous) = self.holder_of(&pilot).filter(|t| *t != token) {
                let previous_owner = env.ledger.owner_of(previous)?;
                self.park(previous, previous_owner, env.now, events);
                tracing::info!(
                    target: "hangar.garage",
                    pilot = %pilot,
                    from = previous,
                    to = token,
                    "pilot reassigned; previous holder parked"
                );
            }
            self.assignments.insert(pilot, token);
        }

        self.records.insert(
            token,
            GarageRecord {
                status: PilotStatus::Piloted,
                started_at_block: env.now,
                pilot: Some(pilot),
            },
        );
        events.push(HangarEvent::Piloted { token, pilot });
        events.push(HangarEvent::MetadataUpdate { token });
        events.push(HangarEvent::FlightStarted {
            token,
            owner,
            block: env.now,
        });
        tracing::debug!(target: "hangar.garage", token, pilot = %pilot, "piloted");
        Ok(())
    }

    pub fn start_training_batch(
        &mut self,
        env: &GarageEnv<'_>,
        caller: Address,
        tokens: &[TokenId],
        events: &mut Vec<HangarEvent>,
    ) -> HangarResult<()> {
        self.check_batch_len(tokens.len())?;
        for token in tokens {
            self.start_training(env, caller, *token, events)?;
        }
        Ok(())
    }

    pub fn release_batch(
        &mut self,
        env: &GarageEnv<'_>,
        actor: Actor,
        tokens: &[TokenId],
        events: &mut Vec<HangarEvent>,
    ) -> HangarResult<()> {
        self.check_batch_len(tokens.len())?;
        for token in tokens {
            self.release(env, actor, *token, events)?;
        }
        Ok(())
    }

    pub fn assign_pilot_batch(
        &mut self,
        env: &GarageEnv<'_>,
        caller: Address,
        tokens: &[TokenId],
        contracts: &[Address],
        ids: &[u64],
        events: &mut Vec<HangarEvent>,
    ) -> HangarResult<()> {
        if tokens.len() != contracts.len() || tokens.len() != ids.len() {
            return Err(HangarError::InvalidBatchPilotAction);
        }
        self.check_batch_len(tokens.len())?;
        for ((token, contract), id) in tokens.iter().zip(contracts).zip(ids) {
            self.assign_pilot(env, caller, *token, *contract, *id, events)?;
        }
        Ok(())
    }

    /// Flight bookkeeping for an ownership change that keeps the session.
    pub fn hand_over(
        &self,
        token: TokenId,
        from: Address,
        to: Address,
        now: BlockHeight,
        events: &mut Vec<HangarEvent>,
    ) {
        if from == to || !self.record(token).status.is_active() {
            return;
        }
        events.push(HangarEvent::FlightEnded {
            token,
            owner: from,
            block: now,
        });
        events.push(HangarEvent::FlightStarted {
            token,
            owner: to,
            block: now,
        });
    }

    /// First broken link between records and the pilot index, if any.
    pub fn index_violation(&self) -> Option<&'static str> {
        for (pilot, token) in &self.assignments {
            let record = self.record(*token);
            if !record.status.is_active() {
                return Some("indexed token is not active");
            }
            if record.pilot != Some(*pilot) {
                return Some("indexed token holds a different pilot");
            }
        }
        for (token, record) in &self.records {
            if let Some(pilot) = record.pilot.filter(PilotRef::is_exclusive) {
                if record.status.is_active() && self.holder_of(&pilot) != Some(*token) {
                    return Some("active custom pilot missing from index");
                }
            }
        }
        None
    }
}

impl TransferGuard for GarageEngine {
    fn ensure_transferable(&self, token: TokenId) -> HangarResult<()> {
        if self.record(token).status != PilotStatus::Parked {
            return Err(HangarError::InvalidPilotStatus);
        }
        Ok(())
    }
}
