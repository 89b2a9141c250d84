use std::sync::Arc;

use hangar_core::delegation::{DelegationScope, StaticDelegationRegistry};
use hangar_core::pilot::{PilotDirectory, StaticPilotCollection};
use hangar_core::{
    Address, CallContext, Hangar, HangarConfig, HangarError, HangarEvent, PilotRef, PilotStatus,
};

const LEDGER: Address = Address::repeat_byte(0x10);
const MECHS: Address = Address::repeat_byte(0x20);
const ISSUER: Address = Address::repeat_byte(0x01);
const ADMIN: Address = Address::repeat_byte(0x02);
const ALICE: Address = Address::repeat_byte(0xa1);
const BOB: Address = Address::repeat_byte(0xb0);
const HOT_WALLET: Address = Address::repeat_byte(0xcc);
const DURATION: u64 = 172_800;

struct World {
    hangar: Hangar,
    registry: Arc<StaticDelegationRegistry>,
    mechs: Arc<StaticPilotCollection>,
}

fn world() -> World {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("hangar=debug")
        .with_test_writer()
        .try_init();
    let registry = Arc::new(StaticDelegationRegistry::new());
    let mechs = Arc::new(StaticPilotCollection::with_owners([(7, ALICE), (8, BOB)]));
    let mut pilots = PilotDirectory::new();
    pilots.register(MECHS, mechs.clone());
    let mut config = HangarConfig::new(LEDGER, ISSUER, 100, 0);
    config.admin = Some(ADMIN);
    let mut hangar = Hangar::new(config, registry.clone(), pilots).expect("hangar");
    hangar
        .issuer_mint(CallContext::new(ISSUER, 0), ALICE, 3)
        .expect("alice tokens");
    hangar
        .issuer_mint(CallContext::new(ISSUER, 0), BOB, 1)
        .expect("bob token");
    World {
        hangar,
        registry,
        mechs,
    }
}

fn as_(sender: Address, block: u64) -> CallContext {
    CallContext::new(sender, block)
}

#[test]
fn early_release_clears_training() {
    let mut w = world();
    w.hangar.start_training(as_(ALICE, 1_000), 1).expect("start");
    w.hangar
        .release(as_(ALICE, 1_000 + DURATION - 1), 1)
        .expect("release");
    let info = w.hangar.pilot_info(1, 1_000 + DURATION).expect("info");
    assert_eq!(info.status, PilotStatus::Untrained);
    assert_eq!(info.pilot, None);
    assert_eq!(info.started_at_block, 0);
}

#[test]
fn completed_training_parks_with_trainer_seat_one() {
    let mut w = world();
    w.hangar.start_training(as_(ALICE, 1_000), 1).expect("start");
    let info = w.hangar.pilot_info(1, 1_000 + DURATION).expect("info");
    assert!(info.pilotable);
    w.hangar
        .release(as_(ALICE, 1_000 + DURATION), 1)
        .expect("release");
    let info = w.hangar.pilot_info(1, 1_000 + DURATION).expect("info");
    assert_eq!(info.status, PilotStatus::Parked);
    assert_eq!(info.pilot, Some(PilotRef::Trainer { seat: 1 }));
    assert_eq!(
        w.hangar.release(as_(ALICE, 1_000 + DURATION), 1),
        Err(HangarError::InvalidPilotStatus)
    );
}

#[test]
fn training_to_piloted_closes_then_opens_flight() {
    let mut w = world();
    w.hangar.start_training(as_(ALICE, 10), 1).expect("start");
    let mark = w.hangar.events().len();
    w.hangar
        .assign_pilot(as_(ALICE, 10 + DURATION), 1, MECHS, 7)
        .expect("assign");
    let emitted = w.hangar.events().since(mark);
    assert_eq!(
        emitted,
        &[
            HangarEvent::FlightEnded {
                token: 1,
                owner: ALICE,
                block: 10 + DURATION,
            },
            HangarEvent::Piloted {
                token: 1,
                pilot: PilotRef::Custom { contract: MECHS, id: 7 },
            },
            HangarEvent::MetadataUpdate { token: 1 },
            HangarEvent::FlightStarted {
                token: 1,
                owner: ALICE,
                block: 10 + DURATION,
            },
        ]
    );
}

#[test]
fn reassigning_same_pilot_is_rejected() {
    let mut w = world();
    w.hangar.start_training(as_(ALICE, 0), 1).expect("start");
    w.hangar
        .assign_pilot(as_(ALICE, DURATION), 1, MECHS, 7)
        .expect("assign");
    assert_eq!(
        w.hangar.assign_pilot(as_(ALICE, DURATION), 1, MECHS, 7),
        Err(HangarError::InvalidPilotStatus)
    );
}

#[test]
fn parked_token_can_take_a_pilot_again() {
    let mut w = world();
    w.hangar.start_training(as_(ALICE, 0), 1).expect("start");
    w.hangar.release(as_(ALICE, DURATION), 1).expect("park");
    w.hangar
        .assign_pilot(as_(ALICE, DURATION + 1), 1, Address::ZERO, 0)
        .expect("trainer");
    assert_eq!(
        w.hangar.garage_record(1).pilot,
        Some(PilotRef::Trainer { seat: 2 })
    );
    w.hangar.release(as_(ALICE, DURATION + 2), 1).expect("park again");
    assert_eq!(w.hangar.garage_record(1).status, PilotStatus::Parked);
}

#[test]
fn pilot_checks_run_in_order() {
    let mut w = world();
    w.hangar.start_training(as_(ALICE, 0), 1).expect("start");
    let at = as_(ALICE, DURATION);
    assert_eq!(
        w.hangar.assign_pilot(at, 1, MECHS, u64::from(u32::MAX) + 1),
        Err(HangarError::InvalidCustomPilot("pilot id too big"))
    );
    assert_eq!(
        w.hangar.assign_pilot(at, 1, LEDGER, 2),
        Err(HangarError::InvalidCustomPilot("pilot contract not supported"))
    );
    assert_eq!(
        w.hangar.assign_pilot(at, 1, Address::repeat_byte(0x77), 2),
        Err(HangarError::InvalidCustomPilot("pilot contract not supported"))
    );
    assert_eq!(
        w.hangar.assign_pilot(at, 1, MECHS, 8),
        Err(HangarError::InvalidCustomPilot("unauthorized"))
    );
    assert_eq!(
        w.hangar.assign_pilot(at, 1, MECHS, 99),
        Err(HangarError::InvalidCustomPilot("unauthorized"))
    );
}

#[test]
fn strangers_cannot_touch_tokens() {
    let mut w = world();
    assert_eq!(
        w.hangar.start_training(as_(BOB, 0), 1),
        Err(HangarError::Unauthorized)
    );
    assert_eq!(
        w.hangar.start_training(as_(BOB, 0), 99),
        Err(HangarError::OwnerQueryForNonexistentToken)
    );
    assert_eq!(
        w.hangar.pilot_info(99, 0),
        Err(HangarError::OwnerQueryForNonexistentToken)
    );
}

#[test]
fn delegate_acts_for_owner_until_registry_goes_dark() {
    let mut w = world();
    w.registry.delegate(
        ALICE,
        HOT_WALLET,
        DelegationScope::Token {
            contract: LEDGER,
            token: 1,
        },
    );
    w.hangar
        .start_training(as_(HOT_WALLET, 0), 1)
        .expect("delegate may train");
    assert_eq!(
        w.hangar.start_training(as_(HOT_WALLET, 0), 2),
        Err(HangarError::Unauthorized)
    );
    // Flight events stay attributed to the owner.
    assert!(w.hangar.events().events().contains(&HangarEvent::FlightStarted {
        token: 1,
        owner: ALICE,
        block: 0,
    }));

    w.registry.set_offline(true);
    assert_eq!(
        w.hangar.release(as_(HOT_WALLET, 1), 1),
        Err(HangarError::Unauthorized)
    );
    w.hangar.release(as_(ALICE, 1), 1).expect("owner unaffected");
}

#[test]
fn delegate_may_bring_owners_pilot() {
    let mut w = world();
    w.registry
        .delegate(ALICE, HOT_WALLET, DelegationScope::Ledger { contract: LEDGER });
    w.hangar.start_training(as_(HOT_WALLET, 0), 1).expect("start");
    // Pilot 7 belongs to the token owner, so the delegate may assign it.
    w.hangar
        .assign_pilot(as_(HOT_WALLET, DURATION), 1, MECHS, 7)
        .expect("assign");

    w.mechs.set_owner(9, HOT_WALLET);
    w.hangar.start_training(as_(ALICE, DURATION), 2).expect("start");
    w.hangar
        .assign_pilot(as_(HOT_WALLET, 2 * DURATION), 2, MECHS, 9)
        .expect("delegate's own pilot");
}

#[test]
fn force_release_requires_role_and_follows_state_rules() {
    let mut w = world();
    w.hangar.start_training(as_(ALICE, 0), 1).expect("start 1");
    w.hangar.start_training(as_(ALICE, 0), 2).expect("start 2");

    assert_eq!(
        w.hangar.force_release_as_admin(as_(ALICE, 1), 1),
        Err(HangarError::Unauthorized)
    );
    assert_eq!(
        w.hangar.force_release_as_issuer(as_(ADMIN, 1), 1),
        Err(HangarError::Unauthorized)
    );
    w.hangar.force_release_as_admin(as_(ADMIN, 1), 1).expect("admin");
    assert_eq!(w.hangar.garage_record(1).status, PilotStatus::Untrained);

    w.hangar
        .force_release_as_issuer(as_(ISSUER, DURATION), 2)
        .expect("issuer");
    assert_eq!(w.hangar.garage_record(2).status, PilotStatus::Parked);
    assert_eq!(
        w.hangar.force_release_as_issuer(as_(ISSUER, DURATION), 3),
        Err(HangarError::InvalidPilotStatus)
    );
}

#[test]
fn admin_can_be_revoked() {
    let mut w = world();
    w.hangar.start_training(as_(ALICE, 0), 1).expect("start");
    w.hangar.set_admin(as_(ISSUER, 1), None).expect("revoke");
    assert_eq!(
        w.hangar.force_release_as_admin(as_(ADMIN, 1), 1),
        Err(HangarError::Unauthorized)
    );
}
