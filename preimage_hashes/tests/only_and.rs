mod common;

use common::digest_hex;
use preimage::{config, GateKind, SymHash};
use preimage_hashes::{Md5, Ripemd160, Sha256};

#[test]
fn both_gate_policies_produce_identical_digests() {
    let message = b"gate policy equivalence";

    let mut hashers: Vec<Box<dyn SymHash>> = vec![
        Box::new(Sha256::new()),
        Box::new(Md5::new()),
        Box::new(Ripemd160::new()),
    ];
    for hasher in &mut hashers {
        let unrestricted = digest_hex(hasher.as_mut(), message);
        config::set_only_and_gates(true);
        let restricted = digest_hex(hasher.as_mut(), message);
        config::set_only_and_gates(false);
        assert_eq!(unrestricted, restricted, "{} diverged", hasher.name());
    }
}

#[test]
fn restricted_runs_emit_only_and_gates() {
    config::set_only_and_gates(true);
    let rep = Sha256::with_difficulty(4).symbolic(64);
    config::set_only_and_gates(false);

    assert!(!rep.gates().is_empty());
    assert!(rep
        .gates()
        .iter()
        .all(|gate| gate.kind == GateKind::And));

    // The same circuit without the restriction uses the richer gate set
    // and therefore fewer gates.
    let unrestricted = Sha256::with_difficulty(4).symbolic(64);
    assert!(unrestricted.gates().len() < rep.gates().len());
    assert!(unrestricted
        .gates()
        .iter()
        .any(|gate| gate.kind != GateKind::And));
}
