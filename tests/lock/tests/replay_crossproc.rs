//! Cross-process determinism for replay, comparison, and the sentinel.
//!
//! Runs the `replay_fixture` binary under four process variants and asserts
//! identical output. Manifest digests and verdicts must not depend on cwd,
//! locale, timezone, log filters, or unrelated variables.

use lock_tests::fixture_process::{run_replay_fixture, workspace_root};

const EXPECTED_LINES: &[&str] = &[
    "replay_ok=true",
    "replay_n_files=6",
    "replay_n_mismatch=0",
    "replay_env_match=false",
    "drift_n_mismatch=1",
    "delta_ok=false",
    "delta_first_difference=outputs/psi.csv",
    "delta_divergence_class=DATA_OUTPUT",
    "sentinel_ok=true",
];

#[test]
fn fixture_output_is_process_independent() {
    let root = workspace_root();
    let baseline = run_replay_fixture(root, &[]);

    for expected in EXPECTED_LINES {
        assert!(baseline.lines().any(|l| l == *expected), "baseline missing {expected}:\n{baseline}");
    }
    assert_eq!(baseline.lines().count(), 12);

    let other_cwd = std::env::temp_dir();
    assert_eq!(
        run_replay_fixture(&other_cwd, &[]),
        baseline,
        "cwd {} changed the output",
        other_cwd.display()
    );

    assert_eq!(
        run_replay_fixture(root, &[("LC_ALL", "C"), ("LANG", "C")]),
        baseline,
        "C locale changed the output"
    );

    let noisy: &[(&str, &str)] = &[
        ("REPLAY_NOISE", "should_not_matter"),
        ("TZ", "America/New_York"),
        ("REPLAY_AUTHORITY_LOG", "authority_replay=debug"),
    ];
    assert_eq!(
        run_replay_fixture(root, noisy),
        baseline,
        "timezone, noise variables, or debug logging changed the output"
    );
}
