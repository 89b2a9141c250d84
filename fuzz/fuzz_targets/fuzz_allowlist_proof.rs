#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use hangar_core::merkle::{allowance_leaf, verify_proof, AllowlistEntry, AllowlistTree};
use hangar_core::Address;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    entries: Vec<([u8; 20], u64, u64)>,
    probe: [u8; 20],
    forged_free: u64,
    forged_proof: Vec<[u8; 32]>,
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(input) = Input::arbitrary(&mut u) else {
        return;
    };
    let entries: Vec<AllowlistEntry> = input
        .entries
        .iter()
        .map(|(addr, free, paid)| AllowlistEntry::new(Address::new(*addr), *free, *paid))
        .collect();
    let Some(tree) = AllowlistTree::build(&entries) else {
        return;
    };
    let root = tree.root();

    for entry in &entries {
        let proof = tree.proof(&entry.address).expect("member has proof");
        assert!(verify_proof(&proof, &entry.leaf(), &root));
        if input.forged_free != entry.free_allowance {
            let forged = allowance_leaf(&entry.address, input.forged_free, entry.paid_allowance);
            assert!(!verify_proof(&proof, &forged, &root));
        }
    }

    let probe = Address::new(input.probe);
    if !entries.iter().any(|e| e.address == probe) {
        assert!(tree.proof(&probe).is_none());
    }
    let _ = verify_proof(&input.forged_proof, &allowance_leaf(&probe, 0, 0), &root);
});
