//! Persisted reports are byte-stable: re-running an operation over unchanged
//! inputs rewrites identical bytes.

use std::path::Path;

use authority_replay::config::VerifierConfig;
use authority_replay::forensics::compare;
use authority_replay::replayer::{verify_with, ReplayMode};
use authority_replay::report_dir::{
    json_report_bytes, FORENSIC_DELTA_JSON, NONDETERMINISM_REPORT_JSON, REPLAY_REPORT_JSON,
};
use authority_replay::sentinel::check;
use lock_tests::run_tree::{build_run, fixture_env, record_provenance, write_file};

fn read(dir: &Path, name: &str) -> Vec<u8> {
    std::fs::read(dir.join(name)).unwrap()
}

#[test]
fn replay_report_bytes_are_stable() {
    let root = tempfile::tempdir().unwrap();
    let run = root.path().join("run");
    let out = root.path().join("out");
    build_run(&run);
    record_provenance(&run, Some(&fixture_env()));
    let current = fixture_env().with_field("platform", "host-os-host-arch");

    let report = verify_with(&run, ReplayMode::Strict, Some(&out), &VerifierConfig::default(), &current).unwrap();
    let first = read(&out, REPLAY_REPORT_JSON);
    verify_with(&run, ReplayMode::Strict, Some(&out), &VerifierConfig::default(), &current).unwrap();
    let second = read(&out, REPLAY_REPORT_JSON);

    assert_eq!(first, second);
    assert_eq!(first, json_report_bytes(&report.to_json()));
    assert_eq!(first.last(), Some(&b'\n'));
}

#[test]
fn forensic_delta_bytes_are_stable() {
    let root = tempfile::tempdir().unwrap();
    let (a, b, out) = (root.path().join("A"), root.path().join("B"), root.path().join("out"));
    build_run(&a);
    build_run(&b);
    write_file(&b, "outputs/psi.csv", b"r,psi\n0.0,0.5\n");

    let delta = compare(&a, &b, &out).unwrap();
    let first = read(&out, FORENSIC_DELTA_JSON);
    let again = compare(&a, &b, &out).unwrap();
    let second = read(&out, FORENSIC_DELTA_JSON);

    assert_eq!(first, second);
    assert_eq!(delta.digest(), again.digest());
    let parsed: serde_json::Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(parsed["n_mismatch"], 1);
    assert_eq!(parsed["first_difference"]["path"], "outputs/psi.csv");
    assert_eq!(parsed["divergence_class"], "DATA_OUTPUT");
}

#[test]
fn sentinel_report_bytes_are_stable() {
    let root = tempfile::tempdir().unwrap();
    let run = root.path().join("run");
    let out = root.path().join("out");
    build_run(&run);

    check(&run, 3, Some(&out)).unwrap();
    let first = read(&out, NONDETERMINISM_REPORT_JSON);
    check(&run, 3, Some(&out)).unwrap();
    let second = read(&out, NONDETERMINISM_REPORT_JSON);
    assert_eq!(first, second);
}
