#![no_main]

use std::sync::Arc;

use arbitrary::{Arbitrary, Unstructured};
use hangar_core::delegation::{DelegationScope, StaticDelegationRegistry};
use hangar_core::pilot::{PilotDirectory, StaticPilotCollection};
use hangar_core::{Address, CallContext, Hangar, HangarConfig, MintPhase};
use libfuzzer_sys::fuzz_target;

const LEDGER: Address = Address::repeat_byte(0x10);
const MECHS: Address = Address::repeat_byte(0x20);
const ISSUER: Address = Address::repeat_byte(0x01);
const ADMIN: Address = Address::repeat_byte(0x02);

#[derive(Debug, Arbitrary)]
enum Op {
    MintPublic { who: u8, quantity: u8 },
    Start { who: u8, token: u8 },
    StartBatch { who: u8, tokens: Vec<u8> },
    Release { who: u8, token: u8 },
    ReleaseBatch { who: u8, tokens: Vec<u8> },
    Assign { who: u8, token: u8, custom: bool, id: u64 },
    ForceIssuer { tokens: Vec<u8> },
    ForceAdmin { token: u8 },
    Transfer { who: u8, token: u8, to: u8 },
    Preserve { who: u8, token: u8, to: u8 },
    Delegate { owner: u8, delegate: u8 },
    Outage { offline: bool },
    Wait { blocks: u16 },
    Rewind { blocks: u16 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    training_duration: u16,
    ops: Vec<Op>,
}

fn who(seed: u8) -> Address {
    Address::repeat_byte(0xa0 | (seed % 4))
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(input) = Input::arbitrary(&mut u) else {
        return;
    };

    let registry = Arc::new(StaticDelegationRegistry::new());
    let mechs = Arc::new(StaticPilotCollection::with_owners(
        (0..8u32).map(|id| (id, who(id as u8))),
    ));
    let mut pilots = PilotDirectory::new();
    pilots.register(MECHS, mechs);
    let mut config = HangarConfig::new(LEDGER, ISSUER, 64, 1);
    config.admin = Some(ADMIN);
    config.training_duration = u64::from(input.training_duration);
    let Ok(mut hangar) = Hangar::new(config, registry.clone(), pilots) else {
        return;
    };
    let mut block = 0u64;
    let _ = hangar.set_phase(CallContext::new(ISSUER, block), MintPhase::Public);

    for op in input.ops {
        let logged = hangar.events().len();
        let result = match op {
            Op::MintPublic { who: w, quantity } => hangar.mint_public(
                CallContext::new(who(w), block).with_value(u128::from(quantity)),
                u64::from(quantity),
            ).map(|_| ()),
            Op::Start { who: w, token } => {
                hangar.start_training(CallContext::new(who(w), block), u64::from(token))
            }
            Op::StartBatch { who: w, tokens } => {
                let tokens: Vec<u64> = tokens.into_iter().map(u64::from).collect();
                hangar.start_training_batch(CallContext::new(who(w), block), &tokens)
            }
            Op::Release { who: w, token } => {
                hangar.release(CallContext::new(who(w), block), u64::from(token))
            }
            Op::ReleaseBatch { who: w, tokens } => {
                let tokens: Vec<u64> = tokens.into_iter().map(u64::from).collect();
                hangar.release_batch(CallContext::new(who(w), block), &tokens)
            }
            Op::Assign { who: w, token, custom, id } => {
                let contract = if custom { MECHS } else { Address::ZERO };
                hangar.assign_pilot(CallContext::new(who(w), block), u64::from(token), contract, id)
            }
            Op::ForceIssuer { tokens } => {
                let tokens: Vec<u64> = tokens.into_iter().map(u64::from).collect();
                hangar.force_release_as_issuer_batch(CallContext::new(ISSUER, block), &tokens)
            }
            Op::ForceAdmin { token } => {
                hangar.force_release_as_admin(CallContext::new(ADMIN, block), u64::from(token))
            }
            Op::Transfer { who: w, token, to } => hangar.transfer_from(
                CallContext::new(who(w), block),
                who(w),
                who(to),
                u64::from(token),
            ),
            Op::Preserve { who: w, token, to } => hangar.transfer_preserving(
                CallContext::new(who(w), block),
                who(to),
                u64::from(token),
            ),
            Op::Delegate { owner, delegate } => {
                registry.delegate(who(owner), who(delegate), DelegationScope::Ledger { contract: LEDGER });
                Ok(())
            }
            Op::Outage { offline } => {
                registry.set_offline(offline);
                Ok(())
            }
            Op::Wait { blocks } => {
                block = block.saturating_add(u64::from(blocks));
                Ok(())
            }
            Op::Rewind { blocks } => {
                block = block.saturating_sub(u64::from(blocks));
                Ok(())
            }
        };

        if result.is_err() {
            assert_eq!(hangar.events().len(), logged, "failed call emitted events");
        }
        if let Some(violation) = hangar.garage().index_violation() {
            panic!("pilot index broken: {violation}");
        }
        assert!(hangar.total_supply() <= 64);
    }
});
