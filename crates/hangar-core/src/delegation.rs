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

//! Delegation lookups against an external registry.

use std::collections::HashSet;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Address, TokenId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum DelegationScope {
    /// Every asset the owner holds.
    All,
    /// Every token of one ledger/collection.
    Ledger { contract: Address },
    /// A single token.
    Token { contract: Address, token: TokenId },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("delegation registry unavailable: {0}")]
pub struct DelegationUnavailable(pub String);

pub trait DelegationOracle {
    fn is_delegate_for(
        &self,
        caller: &Address,
        owner: &Address,
        scope: DelegationScope,
    ) -> Result<bool, DelegationUnavailable>;
}

/// Checks `scopes` in order and fails closed: an unavailable registry denies.
pub fn is_authorized_delegate(
    oracle: &dyn DelegationOracle,
    caller: &Address,
    owner: &Address,
    scopes: &[DelegationScope],
) -> bool {
    for scope in scopes {
        match oracle.is_delegate_for(caller, owner, *scope) {
            Ok(true) => return true,
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(
                    target: "hangar.delegation",
                    caller = %caller,
                    owner = %owner,
                    error = %err,
                    "delegation lookup failed; denying"
                );
                return false;
            }
        }
    }
    false
}

/// Scopes that authorize `caller` for `token` on `contract`, broadest first.
pub fn token_scopes(contract: Address, token: TokenId) -> [DelegationScope; 3] {
    [
        DelegationScope::All,
        DelegationScope::Ledger { contract },
        DelegationScope::Token { contract, token },
    ]
}

/// In-memory registry keyed by `(owner, delegate, scope)`.
///
/// Grants can be changed through a shared handle while the host holds it.
#[derive(Debug, Default)]
pub struct StaticDelegationRegistry {
    grants: RwLock<HashSet<(Address, Address, DelegationScope)>>,
    offline: RwLock<bool>,
}

impl StaticDelegationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delegate(&self, owner: Address, delegate: Address, scope: DelegationScope) {
        self.grants.write().insert((owner, delegate, scope));
    }

    pub fn revoke(&self, owner: Address, delegate: Address, scope: DelegationScope) -> bool {
        self.grants.write().remove(&(owner, delegate, scope))
    }

    /// Simulates an outage: every lookup returns [`DelegationUnavailable`].
    pub fn set_offline(&self, offline: bool) {
        *self.offline.write() = offline;
    }
}

impl DelegationOracle for StaticDelegationRegistry {
    fn is_delegate_for(
        &self,
        caller: &Address,
        owner: &Address,
        scope: DelegationScope,
    ) -> Result<bool, DelegationUnavailable> {
        if *self.offline.read() {
            return Err(DelegationUnavailable("registry offline".to_string()));
        }
        Ok(self.grants.read().contains(&(*owner, *caller, scope)))
    }
}

/// Registry used when no delegation source is configured: nobody is a delegate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelegation;

impl DelegationOracle for NoDelegation {
    fn is_delegate_for(
        &self,
        _caller: &Address,
        _owner: &Address,
        _scope: DelegationScope,
    ) -> Result<bool, DelegationUnavailable> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEDGER: Address = Address::repeat_byte(0x11);
    const OWNER: Address = Address::repeat_byte(0x22);
    const HOT: Address = Address::repeat_byte(0x33);

    #[test]
    fn ledger_scope_grants_every_token() {
        let reg = StaticDelegationRegistry::new();
        reg.delegate(OWNER, HOT, DelegationScope::Ledger { contract: LEDGER });
        assert!(is_authorized_delegate(&reg, &HOT, &OWNER, &token_scopes(LEDGER, 7)));
        assert!(!is_authorized_delegate(
            &reg,
            &HOT,
            &OWNER,
            &token_scopes(Address::repeat_byte(0x44), 7)
        ));
    }

    #[test]
    fn token_scope_is_narrow() {
        let reg = StaticDelegationRegistry::new();
        reg.delegate(
            OWNER,
            HOT,
            DelegationScope::Token {
                contract: LEDGER,
                token: 3,
            },
        );
        assert!(is_authorized_delegate(&reg, &HOT, &OWNER, &token_scopes(LEDGER, 3)));
        assert!(!is_authorized_delegate(&reg, &HOT, &OWNER, &token_scopes(LEDGER, 4)));
    }

    #[test]
    fn grants_are_directional() {
        let reg = StaticDelegationRegistry::new();
        reg.delegate(OWNER, HOT, DelegationScope::All);
        assert!(!is_authorized_delegate(&reg, &OWNER, &HOT, &token_scopes(LEDGER, 1)));
    }

    #[test]
    fn outage_fails_closed() {
        let reg = StaticDelegationRegistry::new();
        reg.delegate(OWNER, HOT, DelegationScope::All);
        reg.set_offline(true);
        assert!(!is_authorized_delegate(&reg, &HOT, &OWNER, &token_scopes(LEDGER, 1)));
    }

    #[test]
    fn revoke_removes_grant() {
        let reg = StaticDelegationRegistry::new();
        reg.delegate(OWNER, HOT, DelegationScope::All);
        assert!(reg.revoke(OWNER, HOT, DelegationScope::All));
        assert!(!is_authorized_delegate(&reg, &HOT, &OWNER, &token_scopes(LEDGER, 1)));
        assert!(!is_authorized_delegate(&NoDelegation, &HOT, &OWNER, &token_scopes(LEDGER, 1)));
    }
}
