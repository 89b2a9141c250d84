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

//! Phased issuance: public sale and proof-gated allowance claims.

use std::collections::HashMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{HangarError, HangarResult};
use crate::events::HangarEvent;
use crate::ledger::AssetLedger;
use crate::merkle::{allowance_leaf, verify_proof};
use crate::types::{Address, Hash32, TokenId, Wei};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MintPhase {
    #[default]
    Closed,
    Allowlist,
    Waitlist,
    Public,
}

/// Per-address consumption of allowlist and waitlist allowances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub allow_claims: u64,
    pub wait_claims: u64,
}

impl ClaimRecord {
    fn counter(&self, phase: MintPhase) -> u64 {
        match phase {
            MintPhase::Allowlist => self.allow_claims,
            MintPhase::Waitlist => self.wait_claims,
            MintPhase::Closed | MintPhase::Public => 0,
        }
    }

    fn counter_mut(&mut self, phase: MintPhase) -> Option<&mut u64> {
        match phase {
            MintPhase::Allowlist => Some(&mut self.allow_claims),
            MintPhase::Waitlist => Some(&mut self.wait_claims),
            MintPhase::Closed | MintPhase::Public => None,
        }
    }
}

/// Allowance terms a claimant presents together with its membership proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceClaim {
    pub free_allowance: u64,
    pub paid_allowance: u64,
    pub proof: Vec<Hash32>,
}

/// Split of a requested quantity into free and paid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowanceQuote {
    pub free_units: u64,
    pub paid_units: u64,
}

/// Free allowance is consumed before paid allowance.
pub fn quote_allowance(
    already_claimed: u64,
    free_allowance: u64,
    paid_allowance: u64,
    quantity: u64,
) -> HangarResult<AllowanceQuote> {
    let total = free_allowance
        .checked_add(paid_allowance)
        .ok_or(HangarError::ArithmeticOverflow)?;
    let remaining = total.saturating_sub(already_claimed);
    if quantity > remaining {
        return Err(HangarError::InsufficientAllowance);
    }
    let free_left = free_allowance.saturating_sub(already_claimed);
    let free_units = quantity.min(free_left);
    Ok(AllowanceQuote {
        free_units,
        paid_units: quantity - free_units,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReceipt {
    pub tokens: RangeInclusive<TokenId>,
    pub paid: Wei,
    pub refund: Wei,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuanceController {
    phase: MintPhase,
    max_supply: u64,
    unit_price: Wei,
    allowlist_root: Option<Hash32>,
    waitlist_root: Option<Hash32>,
    claims: HashMap<Address, ClaimRecord>,
    treasury: Wei,
}

impl IssuanceController {
    pub fn new(max_supply: u64, unit_price: Wei) -> Self {
        Self {
            phase: MintPhase::Closed,
            max_supply,
            unit_price,
            allowlist_root: None,
            waitlist_root: None,
            claims: HashMap::new(),
            treasury: 0,
        }
    }

    pub fn with_roots(mut self, allowlist: Option<Hash32>, waitlist: Option<Hash32>) -> Self {
        self.allowlist_root = allowlist;
        self.waitlist_root = waitlist;
        self
    }

    pub fn phase(&self) -> MintPhase {
        self.phase
    }

    pub fn max_supply(&self) -> u64 {
        self.max_supply
    }

    pub fn unit_price(&self) -> Wei {
        self.unit_price
    }

    pub fn treasury(&self) -> Wei {
        self.treasury
    }

    pub fn roots(&self) -> (Option<Hash32>, Option<Hash32>) {
        (self.allowlist_root, self.waitlist_root)
    }

    pub fn get_claimed(&self, address: &Address) -> ClaimRecord {
        self.claims.get(address).copied().unwrap_or_default()
    }

    pub fn set_phase(&mut self, phase: MintPhase, events: &mut Vec<HangarEvent>) {
        self.phase = phase;
        events.push(HangarEvent::PhaseChanged { phase });
    }

    pub fn set_roots(
        &mut self,
        allowlist: Option<Hash32>,
        waitlist: Option<Hash32>,
        events: &mut Vec<HangarEvent>,
    ) {
        self.allowlist_root = allowlist;
        self.waitlist_root = waitlist;
        events.push(HangarEvent::RootsUpdated {
            allowlist,
            waitlist,
        });
    }

    pub fn set_unit_price(&mut self, unit_price: Wei) {
        self.unit_price = unit_price;
    }

    fn ensure_supply(&self, ledger: &AssetLedger, quantity: u64) -> HangarResult<()> {
        let after = ledger
            .total_supply()
            .checked_add(quantity)
            .ok_or(HangarError::SoldOut)?;
        if after > self.max_supply {
            return Err(HangarError::SoldOut);
        }
        Ok(())
    }

    fn price_of(&self, units: u64) -> HangarResult<Wei> {
        self.unit_price
            .checked_mul(Wei::from(units))
            .ok_or(HangarError::ArithmeticOverflow)
    }

    fn settle(
        &mut self,
        ledger: &mut AssetLedger,
        to: Address,
        quantity: u64,
        cost: Wei,
        value: Wei,
        events: &mut Vec<HangarEvent>,
    ) -> HangarResult<MintReceipt> {
        let treasury = self
            .treasury
            .checked_add(cost)
            .ok_or(HangarError::ArithmeticOverflow)?;
        let tokens = ledger.mint_sequential(to, quantity, events)?;
        self.treasury = treasury;
        let refund = value - cost;
        events.push(HangarEvent::Minted {
            to,
            first_token: *tokens.start(),
            quantity,
            phase: self.phase,
            paid: cost,
        });
        if refund > 0 {
            events.push(HangarEvent::Refunded { to, amount: refund });
        }
        tracing::info!(
            target: "hangar.issuance",
            to = %to,
            quantity,
            paid = %cost,
            refund = %refund,
            phase = ?self.phase,
            "minted"
        );
        Ok(MintReceipt {
            tokens,
            paid: cost,
            refund,
        })
    }

    pub fn mint_public(
        &mut self,
        ledger: &mut AssetLedger,
        caller: Address,
        value: Wei,
        quantity: u64,
        events: &mut Vec<HangarEvent>,
    ) -> HangarResult<MintReceipt> {
        if self.phase != MintPhase::Public {
            return Err(HangarError::MintingClosed);
        }
        if quantity == 0 {
            return Err(HangarError::ZeroQuantity);
        }
        self.ensure_supply(ledger, quantity)?;
        let cost = self.price_of(quantity)?;
        if value < cost {
            return Err(HangarError::InsufficientValue {
                required: cost,
                provided: value,
            });
        }
        self.settle(ledger, caller, quantity, cost, value, events)
    }

    pub fn mint_with_allowance(
        &mut self,
        ledger: &mut AssetLedger,
        caller: Address,
        value: Wei,
        quantity: u64,
        claim: &AllowanceClaim,
        events: &mut Vec<HangarEvent>,
    ) -> HangarResult<MintReceipt> {
        let root = match self.phase {
            MintPhase::Allowlist => self.allowlist_root,
            MintPhase::Waitlist => self.waitlist_root,
            MintPhase::Closed | MintPhase::Public => return Err(HangarError::MintingClosed),
        };
        if quantity == 0 {
            return Err(HangarError::ZeroQuantity);
        }
        let leaf = allowance_leaf(&caller, claim.free_allowance, claim.paid_allowance);
        let Some(root) = root else {
            return Err(HangarError::InvalidProof);
        };
        if !verify_proof(&claim.proof, &leaf, &root) {
            return Err(HangarError::InvalidProof);
        }

        let record = self.get_claimed(&caller);
        let quote = quote_allowance(
            record.counter(self.phase),
            claim.free_allowance,
            claim.paid_allowance,
            quantity,
        )?;
        self.ensure_supply(ledger, quantity)?;
        let cost = self.price_of(quote.paid_units)?;
        if value < cost {
            return Err(HangarError::InsufficientValue {
                required: cost,
                provided: value,
            });
        }

        let mut updated = record;
        if let Some(counter) = updated.counter_mut(self.phase) {
            *counter += quantity;
        }
        let receipt = self.settle(ledger, caller, quantity, cost, value, events)?;
        self.claims.insert(caller, updated);
        Ok(receipt)
    }

    /// Reserve mint by the issuing authority: free, any phase, bounded by supply.
    pub fn issuer_mint(
        &mut self,
        ledger: &mut AssetLedger,
        to: Address,
        quantity: u64,
        events: &mut Vec<HangarEvent>,
    ) -> HangarResult<RangeInclusive<TokenId>> {
        if quantity == 0 {
            return Err(HangarError::ZeroQuantity);
        }
        self.ensure_supply(ledger, quantity)?;
        let tokens = ledger.mint_sequential(to, quantity, events)?;
        events.push(HangarEvent::Minted {
            to,
            first_token: *tokens.start(),
            quantity,
            phase: self.phase,
            paid: 0,
        });
        Ok(tokens)
    }

    pub fn withdraw(&mut self, to: Address, events: &mut Vec<HangarEvent>) -> HangarResult<Wei> {
        if to.is_zero() {
            return Err(HangarError::TransferToZeroAddress);
        }
        let amount = std::mem::take(&mut self.treasury);
        events.push(HangarEvent::Withdrawn { to, amount });
        Ok(amount)
    }
}
