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

//! Pilot references and the external collections that own custom pilots.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{HangarError, HangarResult};
use crate::types::Address;

/// Seat recorded while a token trains with the built-in trainer.
pub const TRAINING_SEAT: u32 = 1;
/// Seat recorded when the trainer is assigned as a pilot.
pub const ASSIGNED_SEAT: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PilotRef {
    /// Built-in pseudo-pilot living at the zero address.
    Trainer { seat: u32 },
    /// A token of an external collection.
    Custom { contract: Address, id: u32 },
}

impl PilotRef {
    pub const fn training_placeholder() -> Self {
        Self::Trainer {
            seat: TRAINING_SEAT,
        }
    }

    pub const fn assigned_trainer() -> Self {
        Self::Trainer {
            seat: ASSIGNED_SEAT,
        }
    }

    pub fn contract(&self) -> Address {
        match self {
            Self::Trainer { .. } => Address::ZERO,
            Self::Custom { contract, .. } => *contract,
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            Self::Trainer { seat } => *seat,
            Self::Custom { id, .. } => *id,
        }
    }

    /// Only custom pilots are exclusive to one token at a time.
    pub fn is_exclusive(&self) -> bool {
        matches!(self, Self::Custom { .. })
    }
}

impl fmt::Display for PilotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.contract(), self.id())
    }
}

/// Ownership-queryable collection a custom pilot may come from.
pub trait PilotCollection: Send + Sync {
    fn owner_of(&self, id: u32) -> Option<Address>;
}

/// In-memory collection whose holders can be changed through a shared handle.
#[derive(Debug, Default)]
pub struct StaticPilotCollection {
    owners: RwLock<HashMap<u32, Address>>,
}

impl StaticPilotCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owners(owners: impl IntoIterator<Item = (u32, Address)>) -> Self {
        Self {
            owners: RwLock::new(owners.into_iter().collect()),
        }
    }

    pub fn set_owner(&self, id: u32, owner: Address) {
        self.owners.write().insert(id, owner);
    }

    pub fn burn(&self, id: u32) {
        self.owners.write().remove(&id);
    }
}

impl PilotCollection for StaticPilotCollection {
    fn owner_of(&self, id: u32) -> Option<Address> {
        self.owners.read().get(&id).copied()
    }
}

/// Collections accepted as custom pilot sources, keyed by contract address.
#[derive(Default, Clone)]
pub struct PilotDirectory {
    collections: BTreeMap<Address, Arc<dyn PilotCollection>>,
}

impl fmt::Debug for PilotDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PilotDirectory")
            .field("contracts", &self.collections.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A requested pilot after validity checks, with the holder to authorize against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPilot {
    pub pilot: PilotRef,
    /// Current holder of a custom pilot; `None` for the trainer.
    pub holder: Option<Address>,
}

impl PilotDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, contract: Address, collection: Arc<dyn PilotCollection>) {
        self.collections.insert(contract, collection);
    }

    pub fn unregister(&mut self, contract: &Address) -> bool {
        self.collections.remove(contract).is_some()
    }

    pub fn supports(&self, contract: &Address) -> bool {
        self.collections.contains_key(contract)
    }

    /// Validates `(contract, id)` as a pilot for tokens of `ledger_address`.
    ///
    /// Checks run in order: id width, contract support, pilot existence.
    /// Holder authorization is left to the caller.
    pub fn resolve(
        &self,
        ledger_address: &Address,
        contract: Address,
        id: u64,
    ) -> HangarResult<ResolvedPilot> {
        let id = u32::try_from(id).map_err(|_| HangarError::InvalidCustomPilot("pilot id too big"))?;
        if contract.is_zero() {
            return Ok(ResolvedPilot {
                pilot: PilotRef::assigned_trainer(),
                holder: None,
            });
        }
        if contract == *ledger_address {
            return Err(HangarError::InvalidCustomPilot("pilot contract not supported"));
        }
        let collection = self
            .collections
            .get(&contract)
            .ok_or(HangarError::InvalidCustomPilot("pilot contract not supported"))?;
        let holder = collection
            .owner_of(id)
            .ok_or(HangarError::InvalidCustomPilot("unauthorized"))?;
        Ok(ResolvedPilot {
            pilot: PilotRef::Custom { contract, id },
            holder: Some(holder),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEDGER: Address = Address::repeat_byte(0x10);
    const MECHS: Address = Address::repeat_byte(0x20);
    const HOLDER: Address = Address::repeat_byte(0x30);

    fn directory() -> PilotDirectory {
        let mut dir = PilotDirectory::new();
        dir.register(MECHS, Arc::new(StaticPilotCollection::with_owners([(7, HOLDER)])));
        dir
    }

    #[test]
    fn trainer_ignores_requested_id() {
        let resolved = directory()
            .resolve(&LEDGER, Address::ZERO, 999)
            .expect("trainer");
        assert_eq!(resolved.pilot, PilotRef::Trainer { seat: ASSIGNED_SEAT });
        assert_eq!(resolved.holder, None);
    }

    #[test]
    fn id_width_is_checked_first() {
        let err = directory()
            .resolve(&LEDGER, Address::ZERO, u64::from(u32::MAX) + 1)
            .expect_err("too big");
        assert_eq!(err, HangarError::InvalidCustomPilot("pilot id too big"));
    }

    #[test]
    fn own_ledger_and_unknown_contracts_are_unsupported() {
        let dir = directory();
        for contract in [LEDGER, Address::repeat_byte(0x99)] {
            assert_eq!(
                dir.resolve(&LEDGER, contract, 7),
                Err(HangarError::InvalidCustomPilot("pilot contract not supported"))
            );
        }
    }

    #[test]
    fn custom_pilot_reports_holder() {
        let resolved = directory().resolve(&LEDGER, MECHS, 7).expect("custom");
        assert_eq!(resolved.pilot, PilotRef::Custom { contract: MECHS, id: 7 });
        assert_eq!(resolved.holder, Some(HOLDER));
        assert!(resolved.pilot.is_exclusive());
        assert!(!PilotRef::training_placeholder().is_exclusive());
    }

    #[test]
    fn missing_pilot_is_unauthorized() {
        assert_eq!(
            directory().resolve(&LEDGER, MECHS, 8),
            Err(HangarError::InvalidCustomPilot("unauthorized"))
        );
    }

    #[test]
    fn shared_collection_handle_sees_updates() {
        let collection = Arc::new(StaticPilotCollection::new());
        let mut dir = PilotDirectory::new();
        dir.register(MECHS, collection.clone());
        collection.set_owner(1, HOLDER);
        assert!(dir.resolve(&LEDGER, MECHS, 1).is_ok());
        collection.burn(1);
        assert!(dir.resolve(&LEDGER, MECHS, 1).is_err());
    }

    #[test]
    fn unregistered_collection_stops_resolving() {
        let mut dir = directory();
        assert!(dir.supports(&MECHS));
        assert!(dir.unregister(&MECHS));
        assert!(!dir.supports(&MECHS));
        assert!(!dir.unregister(&MECHS));
        assert_eq!(
            dir.resolve(&LEDGER, MECHS, 7),
            Err(HangarError::InvalidCustomPilot("pilot contract not supported"))
        );
    }
}
