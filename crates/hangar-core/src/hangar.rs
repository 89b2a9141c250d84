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

//! Host that owns every component and runs each call as one transaction.
//!
//! A call works on a staged copy of the state and a pending event buffer.
//! On `Ok` both are committed; on `Err` they are dropped, so a failed call,
//! batch or not, leaves no trace.

use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::config::{ConfigError, HangarConfig};
use crate::delegation::DelegationOracle;
use crate::error::{HangarError, HangarResult};
use crate::events::{EventLog, HangarEvent};
use crate::garage::{Actor, GarageEngine, GarageEnv, GarageRecord, PilotInfo};
use crate::issuance::{AllowanceClaim, ClaimRecord, IssuanceController, MintPhase, MintReceipt};
use crate::ledger::AssetLedger;
use crate::pilot::{PilotDirectory, PilotRef};
use crate::types::{Address, BlockHeight, Hash32, TokenId, Wei};

/// Caller, attached value and block height of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub sender: Address,
    pub value: Wei,
    pub block: BlockHeight,
}

impl CallContext {
    pub fn new(sender: Address, block: BlockHeight) -> Self {
        Self {
            sender,
            value: 0,
            block,
        }
    }

    pub fn with_value(mut self, value: Wei) -> Self {
        self.value = value;
        self
    }
}

#[derive(Debug, Clone)]
struct HangarState {
    ledger: AssetLedger,
    issuance: IssuanceController,
    garage: GarageEngine,
    issuer: Address,
    admin: Option<Address>,
    last_block: Option<BlockHeight>,
}

impl HangarState {
    fn ensure_issuer(&self, caller: &Address) -> HangarResult<()> {
        if *caller != self.issuer {
            return Err(HangarError::Unauthorized);
        }
        Ok(())
    }

    fn ensure_admin(&self, caller: &Address) -> HangarResult<()> {
        if self.admin != Some(*caller) {
            return Err(HangarError::Unauthorized);
        }
        Ok(())
    }
}

/// Collaborators visible to a running call.
struct CallEnv<'a> {
    oracle: &'a dyn DelegationOracle,
    pilots: &'a PilotDirectory,
    ledger_address: Address,
    ctx: CallContext,
}

impl CallEnv<'_> {
    fn garage<'b>(&'b self, ledger: &'b AssetLedger) -> GarageEnv<'b> {
        GarageEnv {
            ledger,
            oracle: self.oracle,
            pilots: self.pilots,
            ledger_address: self.ledger_address,
            now: self.ctx.block,
        }
    }
}

pub struct Hangar {
    name: String,
    symbol: String,
    ledger_address: Address,
    base_uri: String,
    oracle: Arc<dyn DelegationOracle + Send + Sync>,
    pilots: PilotDirectory,
    state: HangarState,
    log: EventLog,
}

impl Hangar {
    pub fn new(
        config: HangarConfig,
        oracle: Arc<dyn DelegationOracle + Send + Sync>,
        pilots: PilotDirectory,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = HangarState {
            ledger: AssetLedger::new(config.start_token_id),
            issuance: IssuanceController::new(config.max_supply, config.unit_price)
                .with_roots(config.allowlist_root, config.waitlist_root),
            garage: GarageEngine::new(config.training_duration, config.max_batch),
            issuer: config.issuer,
            admin: config.admin,
            last_block: None,
        };
        tracing::info!(
            target: "hangar.tx",
            name = %config.name,
            ledger = %config.ledger_address,
            issuer = %config.issuer,
            max_supply = config.max_supply,
            "hangar initialised"
        );
        Ok(Self {
            name: config.name,
            symbol: config.symbol,
            ledger_address: config.ledger_address,
            base_uri: config.base_uri,
            oracle,
            pilots,
            state,
            log: EventLog::new(),
        })
    }

    fn transact<T, F>(&mut self, op: &'static str, ctx: CallContext, f: F) -> HangarResult<T>
    where
        F: FnOnce(&mut HangarState, &CallEnv<'_>, &mut Vec<HangarEvent>) -> HangarResult<T>,
    {
        let mut staged = self.state.clone();
        let mut pending = Vec::new();
        let outcome = match self.state.last_block {
            Some(last) if ctx.block < last => Err(HangarError::ClockRegression {
                last,
                got: ctx.block,
            }),
            _ => {
                let env = CallEnv {
                    oracle: self.oracle.as_ref(),
                    pilots: &self.pilots,
                    ledger_address: self.ledger_address,
                    ctx,
                };
                f(&mut staged, &env, &mut pending)
            }
        };
        match outcome {
            Ok(value) => {
                staged.last_block = Some(ctx.block);
                self.state = staged;
                tracing::debug!(
                    target: "hangar.tx",
                    op,
                    sender = %ctx.sender,
                    block = ctx.block,
                    events = pending.len(),
                    "committed"
                );
                self.log.extend(pending);
                Ok(value)
            }
            Err(err) => {
                tracing::info!(
                    target: "hangar.tx",
                    op,
                    sender = %ctx.sender,
                    block = ctx.block,
                    error = %err,
                    "rejected"
                );
                Err(err)
            }
        }
    }

    // Issuance administration.

    pub fn set_phase(&mut self, ctx: CallContext, phase: MintPhase) -> HangarResult<()> {
        self.transact("set_phase", ctx, |state, env, events| {
            state.ensure_issuer(&env.ctx.sender)?;
            state.issuance.set_phase(phase, events);
            Ok(())
        })
    }

    pub fn set_roots(
        &mut self,
        ctx: CallContext,
        allowlist: Option<Hash32>,
        waitlist: Option<Hash32>,
    ) -> HangarResult<()> {
        self.transact("set_roots", ctx, |state, env, events| {
            state.ensure_issuer(&env.ctx.sender)?;
            state.issuance.set_roots(allowlist, waitlist, events);
            Ok(())
        })
    }

    pub fn set_unit_price(&mut self, ctx: CallContext, unit_price: Wei) -> HangarResult<()> {
        self.transact("set_unit_price", ctx, |state, env, _| {
            state.ensure_issuer(&env.ctx.sender)?;
            state.issuance.set_unit_price(unit_price);
            Ok(())
        })
    }

    pub fn withdraw(&mut self, ctx: CallContext, to: Address) -> HangarResult<Wei> {
        self.transact("withdraw", ctx, |state, env, events| {
            state.ensure_issuer(&env.ctx.sender)?;
            state.issuance.withdraw(to, events)
        })
    }

    pub fn transfer_issuer(&mut self, ctx: CallContext, new_issuer: Address) -> HangarResult<()> {
        self.transact("transfer_issuer", ctx, |state, env, events| {
            state.ensure_issuer(&env.ctx.sender)?;
            if new_issuer.is_zero() {
                return Err(HangarError::TransferToZeroAddress);
            }
            let previous = std::mem::replace(&mut state.issuer, new_issuer);
            events.push(HangarEvent::IssuerTransferred {
                previous,
                current: new_issuer,
            });
            Ok(())
        })
    }

    /// Grants the admin role to `admin`, or revokes it with `None`.
    pub fn set_admin(&mut self, ctx: CallContext, admin: Option<Address>) -> HangarResult<()> {
        self.transact("set_admin", ctx, |state, env, events| {
            state.ensure_issuer(&env.ctx.sender)?;
            let current = admin.filter(|a| !a.is_zero());
            let previous = std::mem::replace(&mut state.admin, current);
            events.push(HangarEvent::AdminChanged { previous, current });
            Ok(())
        })
    }

    // Minting.

    pub fn mint_public(&mut self, ctx: CallContext, quantity: u64) -> HangarResult<MintReceipt> {
        self.transact("mint_public", ctx, |state, env, events| {
            let HangarState {
                ledger, issuance, ..
            } = state;
            issuance.mint_public(ledger, env.ctx.sender, env.ctx.value, quantity, events)
        })
    }

    pub fn mint_with_allowance(
        &mut self,
        ctx: CallContext,
        quantity: u64,
        claim: &AllowanceClaim,
    ) -> HangarResult<MintReceipt> {
        self.transact("mint_with_allowance", ctx, |state, env, events| {
            let HangarState {
                ledger, issuance, ..
            } = state;
            issuance.mint_with_allowance(
                ledger,
                env.ctx.sender,
                env.ctx.value,
                quantity,
                claim,
                events,
            )
        })
    }

    pub fn issuer_mint(
        &mut self,
        ctx: CallContext,
        to: Address,
        quantity: u64,
    ) -> HangarResult<RangeInclusive<TokenId>> {
        self.transact("issuer_mint", ctx, |state, env, events| {
            state.ensure_issuer(&env.ctx.sender)?;
            let HangarState {
                ledger, issuance, ..
            } = state;
            issuance.issuer_mint(ledger, to, quantity, events)
        })
    }

    // Ledger.

    pub fn approve(&mut self, ctx: CallContext, approved: Address, token: TokenId) -> HangarResult<()> {
        self.transact("approve", ctx, |state, env, events| {
            state.ledger.approve(env.ctx.sender, approved, token, events)
        })
    }

    pub fn set_approval_for_all(
        &mut self,
        ctx: CallContext,
        operator: Address,
        approved: bool,
    ) -> HangarResult<()> {
        self.transact("set_approval_for_all", ctx, |state, env, events| {
            state
                .ledger
                .set_approval_for_all(env.ctx.sender, operator, approved, events);
            Ok(())
        })
    }

    /// Standard transfer; only `Parked` tokens may move.
    pub fn transfer_from(
        &mut self,
        ctx: CallContext,
        from: Address,
        to: Address,
        token: TokenId,
    ) -> HangarResult<()> {
        self.transact("transfer_from", ctx, |state, env, events| {
            let HangarState { ledger, garage, .. } = state;
            ledger.transfer_from(env.ctx.sender, from, to, token, &*garage, events)
        })
    }

    /// Owner-only transfer that keeps the garage record and any running session.
    pub fn transfer_preserving(
        &mut self,
        ctx: CallContext,
        to: Address,
        token: TokenId,
    ) -> HangarResult<()> {
        self.transact("transfer_preserving", ctx, |state, env, events| {
            let HangarState { ledger, garage, .. } = state;
            let previous = ledger.transfer_preserving(env.ctx.sender, to, token, events)?;
            garage.hand_over(token, previous, to, env.ctx.block, events);
            Ok(())
        })
    }

    // Garage.

    pub fn start_training(&mut self, ctx: CallContext, token: TokenId) -> HangarResult<()> {
        self.transact("start_training", ctx, |state, env, events| {
            let HangarState { ledger, garage, .. } = state;
            garage.start_training(&env.garage(ledger), env.ctx.sender, token, events)
        })
    }

    pub fn start_training_batch(&mut self, ctx: CallContext, tokens: &[TokenId]) -> HangarResult<()> {
        self.transact("start_training_batch", ctx, |state, env, events| {
            let HangarState { ledger, garage, .. } = state;
            garage.start_training_batch(&env.garage(ledger), env.ctx.sender, tokens, events)
        })
    }

    pub fn release(&mut self, ctx: CallContext, token: TokenId) -> HangarResult<()> {
        self.transact("release", ctx, |state, env, events| {
            let HangarState { ledger, garage, .. } = state;
            garage.release(&env.garage(ledger), Actor::Holder(env.ctx.sender), token, events)
        })
    }

    pub fn release_batch(&mut self, ctx: CallContext, tokens: &[TokenId]) -> HangarResult<()> {
        self.transact("release_batch", ctx, |state, env, events| {
            let HangarState { ledger, garage, .. } = state;
            garage.release_batch(&env.garage(ledger), Actor::Holder(env.ctx.sender), tokens, events)
        })
    }

    /// `contract == Address::ZERO` selects the built-in trainer; `id` is ignored then.
    pub fn assign_pilot(
        &mut self,
        ctx: CallContext,
        token: TokenId,
        contract: Address,
        id: u64,
    ) -> HangarResult<()> {
        self.transact("assign_pilot", ctx, |state, env, events| {
            let HangarState { ledger, garage, .. } = state;
            garage.assign_pilot(&env.garage(ledger), env.ctx.sender, token, contract, id, events)
        })
    }

    pub fn assign_pilot_batch(
        &mut self,
        ctx: CallContext,
        tokens: &[TokenId],
        contracts: &[Address],
        ids: &[u64],
    ) -> HangarResult<()> {
        self.transact("assign_pilot_batch", ctx, |state, env, events| {
            let HangarState { ledger, garage, .. } = state;
            garage.assign_pilot_batch(
                &env.garage(ledger),
                env.ctx.sender,
                tokens,
                contracts,
                ids,
                events,
            )
        })
    }

    pub fn force_release_as_issuer(&mut self, ctx: CallContext, token: TokenId) -> HangarResult<()> {
        self.force_release("force_release_as_issuer", ctx, Actor::Issuer, &[token], false)
    }

    pub fn force_release_as_issuer_batch(
        &mut self,
        ctx: CallContext,
        tokens: &[TokenId],
    ) -> HangarResult<()> {
        self.force_release("force_release_as_issuer_batch", ctx, Actor::Issuer, tokens, true)
    }

    pub fn force_release_as_admin(&mut self, ctx: CallContext, token: TokenId) -> HangarResult<()> {
        self.force_release("force_release_as_admin", ctx, Actor::Admin, &[token], false)
    }

    pub fn force_release_as_admin_batch(
        &mut self,
        ctx: CallContext,
        tokens: &[TokenId],
    ) -> HangarResult<()> {
        self.force_release("force_release_as_admin_batch", ctx, Actor::Admin, tokens, true)
    }

    fn force_release(
        &mut self,
        op: &'static str,
        ctx: CallContext,
        actor: Actor,
        tokens: &[TokenId],
        batch: bool,
    ) -> HangarResult<()> {
        self.transact(op, ctx, |state, env, events| {
            match actor {
                Actor::Admin => state.ensure_admin(&env.ctx.sender)?,
                Actor::Issuer | Actor::Holder(_) => state.ensure_issuer(&env.ctx.sender)?,
            }
            let HangarState { ledger, garage, .. } = state;
            let genv = env.garage(ledger);
            match tokens {
                [token] if !batch => garage.release(&genv, actor, *token, events),
                _ => garage.release_batch(&genv, actor, tokens, events),
            }
        })
    }

    // Queries.

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn ledger_address(&self) -> Address {
        self.ledger_address
    }

    pub fn issuer(&self) -> Address {
        self.state.issuer
    }

    pub fn admin(&self) -> Option<Address> {
        self.state.admin
    }

    pub fn last_block(&self) -> Option<BlockHeight> {
        self.state.last_block
    }

    pub fn pilot_info(&self, token: TokenId, now: BlockHeight) -> HangarResult<PilotInfo> {
        self.state.garage.pilot_info(&self.state.ledger, token, now)
    }

    pub fn garage_record(&self, token: TokenId) -> GarageRecord {
        self.state.garage.record(token)
    }

    pub fn pilot_holder(&self, pilot: &PilotRef) -> Option<TokenId> {
        self.state.garage.holder_of(pilot)
    }

    pub fn get_claimed(&self, address: &Address) -> ClaimRecord {
        self.state.issuance.get_claimed(address)
    }

    pub fn owner_of(&self, token: TokenId) -> HangarResult<Address> {
        self.state.ledger.owner_of(token)
    }

    pub fn balance_of(&self, owner: &Address) -> u64 {
        self.state.ledger.balance_of(owner)
    }

    pub fn get_approved(&self, token: TokenId) -> HangarResult<Option<Address>> {
        self.state.ledger.get_approved(token)
    }

    pub fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool {
        self.state.ledger.is_approved_for_all(owner, operator)
    }

    pub fn token_uri(&self, token: TokenId) -> HangarResult<String> {
        self.state.ledger.token_uri(&self.base_uri, token)
    }

    pub fn total_supply(&self) -> u64 {
        self.state.ledger.total_supply()
    }

    pub fn phase(&self) -> MintPhase {
        self.state.issuance.phase()
    }

    pub fn unit_price(&self) -> Wei {
        self.state.issuance.unit_price()
    }

    pub fn treasury(&self) -> Wei {
        self.state.issuance.treasury()
    }

    pub fn events(&self) -> &EventLog {
        &self.log
    }

    pub fn ledger(&self) -> &AssetLedger {
        &self.state.ledger
    }

    pub fn garage(&self) -> &GarageEngine {
        &self.state.garage
    }
}
