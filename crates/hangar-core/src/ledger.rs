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

//! Asset ledger: token identity, holders and transfer approvals.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{HangarError, HangarResult};
use crate::events::HangarEvent;
use crate::types::{Address, TokenId};

/// Consulted by the standard transfer path before a token changes hands.
pub trait TransferGuard {
    fn ensure_transferable(&self, token: TokenId) -> HangarResult<()>;
}

/// Guard that allows every transfer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unguarded;

impl TransferGuard for Unguarded {
    fn ensure_transferable(&self, _token: TokenId) -> HangarResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetLedger {
    start_token_id: TokenId,
    next_token_id: TokenId,
    owners: BTreeMap<TokenId, Address>,
    balances: HashMap<Address, u64>,
    token_approvals: HashMap<TokenId, Address>,
    operators: HashMap<Address, HashSet<Address>>,
}

impl AssetLedger {
    pub fn new(start_token_id: TokenId) -> Self {
        Self {
            start_token_id,
            next_token_id: start_token_id,
            owners: BTreeMap::new(),
            balances: HashMap::new(),
            token_approvals: HashMap::new(),
            operators: HashMap::new(),
        }
    }

    pub fn start_token_id(&self) -> TokenId {
        self.start_token_id
    }

    /// Id the next minted token will receive.
    pub fn next_token_id(&self) -> TokenId {
        self.next_token_id
    }

    pub fn total_supply(&self) -> u64 {
        self.next_token_id - self.start_token_id
    }

    pub fn exists(&self, token: TokenId) -> bool {
        self.owners.contains_key(&token)
    }

    pub fn owner_of(&self, token: TokenId) -> HangarResult<Address> {
        self.owners
            .get(&token)
            .copied()
            .ok_or(HangarError::OwnerQueryForNonexistentToken)
    }

    pub fn balance_of(&self, owner: &Address) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn tokens_of(&self, owner: &Address) -> Vec<TokenId> {
        self.owners
            .iter()
            .filter(|(_, holder)| *holder == owner)
            .map(|(token, _)| *token)
            .collect()
    }

    pub fn get_approved(&self, token: TokenId) -> HangarResult<Option<Address>> {
        if !self.exists(token) {
            return Err(HangarError::OwnerQueryForNonexistentToken);
        }
        Ok(self.token_approvals.get(&token).copied())
    }

    pub fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool {
        self.operators
            .get(owner)
            .is_some_and(|set| set.contains(operator))
    }

    pub fn token_uri(&self, base_uri: &str, token: TokenId) -> HangarResult<String> {
        if !self.exists(token) {
            return Err(HangarError::URIQueryForNonexistentToken);
        }
        if base_uri.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("{base_uri}{token}"))
    }

    /// Creates `quantity` sequential tokens for `to`. Callers check supply.
    pub(crate) fn mint_sequential(
        &mut self,
        to: Address,
        quantity: u64,
        events: &mut Vec<HangarEvent>,
    ) -> HangarResult<RangeInclusive<TokenId>> {
        if quantity == 0 {
            return Err(HangarError::ZeroQuantity);
        }
        if to.is_zero() {
            return Err(HangarError::TransferToZeroAddress);
        }
        let first = self.next_token_id;
        let last = first
            .checked_add(quantity - 1)
            .ok_or(HangarError::ArithmeticOverflow)?;
        let next = last.checked_add(1).ok_or(HangarError::ArithmeticOverflow)?;
        for token in first..=last {
            self.owners.insert(token, to);
            events.push(HangarEvent::Transfer {
                from: Address::ZERO,
                to,
                token,
            });
        }
        *self.balances.entry(to).or_default() += quantity;
        self.next_token_id = next;
        Ok(first..=last)
    }

    pub fn approve(
        &mut self,
        caller: Address,
        approved: Address,
        token: TokenId,
        events: &mut Vec<HangarEvent>,
    ) -> HangarResult<()> {
        let owner = self.owner_of(token)?;
        if caller != owner && !self.is_approved_for_all(&owner, &caller) {
            return Err(HangarError::Unauthorized);
        }
        if approved.is_zero() {
            self.token_approvals.remove(&token);
        } else {
            self.token_approvals.insert(token, approved);
        }
        events.push(HangarEvent::Approval {
            owner,
            approved,
            token,
        });
        Ok(())
    }

    pub fn set_approval_for_all(
        &mut self,
        caller: Address,
        operator: Address,
        approved: bool,
        events: &mut Vec<HangarEvent>,
    ) {
        let set = self.operators.entry(caller).or_default();
        if approved {
            set.insert(operator);
        } else {
            set.remove(&operator);
        }
        events.push(HangarEvent::ApprovalForAll {
            owner: caller,
            operator,
            approved,
        });
    }

    /// Standard transfer: owner, token-approved or operator callers, gated by `guard`.
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        token: TokenId,
        guard: &dyn TransferGuard,
        events: &mut Vec<HangarEvent>,
    ) -> HangarResult<()> {
        let owner = self.owner_of(token)?;
        if owner != from {
            return Err(HangarError::TransferFromIncorrectOwner);
        }
        let approved = self.token_approvals.get(&token) == Some(&caller);
        if caller != owner && !approved && !self.is_approved_for_all(&owner, &caller) {
            return Err(HangarError::Unauthorized);
        }
        if to.is_zero() {
            return Err(HangarError::TransferToZeroAddress);
        }
        guard.ensure_transferable(token)?;
        self.move_token(owner, to, token, events);
        Ok(())
    }

    /// Direct-owner transfer that bypasses the guard. Approved callers are refused.
    pub fn transfer_preserving(
        &mut self,
        caller: Address,
        to: Address,
        token: TokenId,
        events: &mut Vec<HangarEvent>,
    ) -> HangarResult<Address> {
        let owner = self.owner_of(token)?;
        if caller != owner {
            return Err(HangarError::Unauthorized);
        }
        if to.is_zero() {
            return Err(HangarError::TransferToZeroAddress);
        }
        self.move_token(owner, to, token, events);
        Ok(owner)
    }

    fn move_token(
        &mut self,
        from: Address,
        to: Address,
        token: TokenId,
        events: &mut Vec<HangarEvent>,
    ) {
        self.token_approvals.remove(&token);
        if let Some(balance) = self.balances.get_mut(&from) {
            *balance = balance.saturating_sub(1);
        }
        *self.balances.entry(to).or_default() += 1;
        self.owners.insert(token, to);
        events.push(HangarEvent::Transfer { from, to, token });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Frozen;

    impl TransferGuard for Frozen {
        fn ensure_transferable(&self, _token: TokenId) -> HangarResult<()> {
            Err(HangarError::InvalidPilotStatus)
        }
    }

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn bob() -> Address {
        Address::repeat_byte(0xb0)
    }

    fn carol() -> Address {
        Address::repeat_byte(0xc0)
    }

    #[test]
    fn mint_to_zero_address_is_refused() {
        let mut ledger = AssetLedger::new(1);
        let mut events = Vec::new();
        assert_eq!(
            ledger.mint_sequential(Address::ZERO, 2, &mut events),
            Err(HangarError::TransferToZeroAddress)
        );
        assert_eq!(ledger.total_supply(), 0);
        assert_eq!(ledger.balance_of(&Address::ZERO), 0);
        assert!(events.is_empty());
    }

    fn ledger_with(owner: Address, quantity: u64) -> AssetLedger {
        let mut ledger = AssetLedger::new(1);
        ledger
            .mint_sequential(owner, quantity, &mut Vec::new())
            .expect("mint");
        ledger
    }

    #[test]
    fn mint_assigns_sequential_ids_from_start() {
        let mut ledger = AssetLedger::new(1);
        let mut events = Vec::new();
        let range = ledger.mint_sequential(alice(), 3, &mut events).expect("mint");
        assert_eq!(range, 1..=3);
        assert_eq!(ledger.total_supply(), 3);
        assert_eq!(ledger.balance_of(&alice()), 3);
        assert_eq!(ledger.next_token_id(), 4);
        assert_eq!(events.len(), 3);
        let again = ledger.mint_sequential(bob(), 1, &mut events).expect("mint");
        assert_eq!(again, 4..=4);
    }

    #[test]
    fn unminted_tokens_fail_queries() {
        let ledger = ledger_with(alice(), 1);
        assert_eq!(
            ledger.owner_of(2),
            Err(HangarError::OwnerQueryForNonexistentToken)
        );
        assert_eq!(
            ledger.token_uri("ipfs://x/", 2),
            Err(HangarError::URIQueryForNonexistentToken)
        );
        assert_eq!(ledger.token_uri("ipfs://x/", 1).expect("uri"), "ipfs://x/1");
        assert_eq!(ledger.token_uri("", 1).expect("uri"), "");
    }

    #[test]
    fn approved_caller_can_transfer_and_approval_is_cleared() {
        let mut ledger = ledger_with(alice(), 1);
        let mut events = Vec::new();
        ledger.approve(alice(), bob(), 1, &mut events).expect("approve");
        ledger
            .transfer_from(bob(), alice(), carol(), 1, &Unguarded, &mut events)
            .expect("transfer");
        assert_eq!(ledger.owner_of(1).expect("owner"), carol());
        assert_eq!(ledger.get_approved(1).expect("approved"), None);
        assert_eq!(ledger.balance_of(&alice()), 0);
        assert_eq!(ledger.balance_of(&carol()), 1);
    }

    #[test]
    fn operator_can_transfer() {
        let mut ledger = ledger_with(alice(), 2);
        let mut events = Vec::new();
        ledger.set_approval_for_all(alice(), bob(), true, &mut events);
        ledger
            .transfer_from(bob(), alice(), carol(), 2, &Unguarded, &mut events)
            .expect("transfer");
        ledger.set_approval_for_all(alice(), bob(), false, &mut events);
        assert_eq!(
            ledger.transfer_from(bob(), alice(), carol(), 1, &Unguarded, &mut events),
            Err(HangarError::Unauthorized)
        );
    }

    #[test]
    fn transfer_checks_from_destination_and_guard() {
        let mut ledger = ledger_with(alice(), 1);
        let mut events = Vec::new();
        assert_eq!(
            ledger.transfer_from(alice(), bob(), carol(), 1, &Unguarded, &mut events),
            Err(HangarError::TransferFromIncorrectOwner)
        );
        assert_eq!(
            ledger.transfer_from(alice(), alice(), Address::ZERO, 1, &Unguarded, &mut events),
            Err(HangarError::TransferToZeroAddress)
        );
        assert_eq!(
            ledger.transfer_from(alice(), alice(), bob(), 1, &Frozen, &mut events),
            Err(HangarError::InvalidPilotStatus)
        );
        assert!(events.is_empty());
    }

    #[test]
    fn preserving_transfer_is_owner_only() {
        let mut ledger = ledger_with(alice(), 1);
        let mut events = Vec::new();
        ledger.approve(alice(), bob(), 1, &mut events).expect("approve");
        assert_eq!(
            ledger.transfer_preserving(bob(), carol(), 1, &mut events),
            Err(HangarError::Unauthorized)
        );
        let previous = ledger
            .transfer_preserving(alice(), carol(), 1, &mut events)
            .expect("owner transfer");
        assert_eq!(previous, alice());
        assert_eq!(ledger.owner_of(1).expect("owner"), carol());
    }

    #[test]
    fn approve_requires_owner_or_operator() {
        let mut ledger = ledger_with(alice(), 1);
        let mut events = Vec::new();
        assert_eq!(
            ledger.approve(bob(), carol(), 1, &mut events),
            Err(HangarError::Unauthorized)
        );
        ledger.set_approval_for_all(alice(), bob(), true, &mut events);
        ledger.approve(bob(), carol(), 1, &mut events).expect("operator approve");
        assert_eq!(ledger.get_approved(1).expect("approved"), Some(carol()));
    }

    #[test]
    fn tokens_of_lists_holdings() {
        let mut ledger = ledger_with(alice(), 2);
        ledger
            .mint_sequential(bob(), 1, &mut Vec::new())
            .expect("mint");
        assert_eq!(ledger.tokens_of(&alice()), vec![1, 2]);
        assert_eq!(ledger.tokens_of(&bob()), vec![3]);
    }
}
