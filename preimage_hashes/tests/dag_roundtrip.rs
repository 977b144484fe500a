use preimage::{SymHash, SymRepresentation};
use preimage_hashes::Md5;

#[test]
fn md5_circuits_round_trip_through_the_dag_format() {
    let rep = Md5::with_difficulty(16).symbolic(64);
    assert!(rep.num_vars() > 0);
    assert!(!rep.gates().is_empty());

    let path = std::env::temp_dir().join(format!("md5-d16-{}.dag", std::process::id()));
    rep.to_dag(&path).unwrap();
    let reloaded = SymRepresentation::from_dag(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(reloaded.num_vars(), rep.num_vars());
    assert_eq!(reloaded.gates(), rep.gates());
    assert_eq!(reloaded.input_indices(), rep.input_indices());
    assert_eq!(reloaded.output_indices(), rep.output_indices());
    assert_eq!(reloaded.fingerprint(), rep.fingerprint());
}

#[test]
fn md5_circuits_round_trip_through_the_binary_format() {
    let rep = Md5::with_difficulty(16).symbolic(64);
    let bytes = rep.to_bytes().unwrap();
    let reloaded = SymRepresentation::from_bytes(&bytes).unwrap();
    assert_eq!(reloaded, rep);
}
