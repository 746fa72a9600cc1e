//! Binary that builds two fixture runs in a temp directory, replays one,
//! compares them, and runs the nondeterminism sentinel, then prints
//! path-independent output lines for cross-process verification.
//!
//! Used by `replay_crossproc` to check that verification output does not
//! depend on cwd, locale, or unrelated environment variables.
//!
//! Usage: `replay_fixture`
//! Output: one `key=value` per line:
//!   `manifest_digest_a`=<hex>
//!   `manifest_digest_b`=<hex>
//!   `replay_ok`=true
//!   `replay_n_files`=6
//!   `replay_n_mismatch`=0
//!   `replay_env_match`=false
//!   `drift_n_mismatch`=1
//!   `delta_ok`=false
//!   `delta_first_difference`=outputs/psi.csv
//!   `delta_divergence_class`=DATA_OUTPUT
//!   `sentinel_ok`=true
//!   `sentinel_run_hash`=<hex>

use authority_replay::forensics::compare;
use authority_replay::manifest::resolve;
use authority_replay::replayer::verify;
use authority_replay::sentinel::check;
use lock_tests::run_tree::{build_run, fixture_env, record_provenance, write_file};
use lock_tests::tracing_setup::init_subscriber;

fn main() {
    init_subscriber();

    let root = std::env::temp_dir().join(format!("authority_replay_fixture_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&root);
    let run_a = root.join("A");
    let run_b = root.join("B");
    let out = root.join("out");

    build_run(&run_a);
    record_provenance(&run_a, Some(&fixture_env()));

    build_run(&run_b);
    write_file(&run_b, "outputs/psi.csv", b"r,psi\n0.0,1.0\n0.5,0.76\n");

    let digest_a = resolve(&run_a).expect("resolve A failed").hashes.digest();
    let digest_b = resolve(&run_b).expect("resolve B failed").hashes.digest();

    let replay = verify(&run_a, "relaxed", Some(&out.join("replay_a"))).expect("verify A failed");

    // Drift after recording: replay must see it.
    write_file(&run_a, "outputs/q_profile.csv", b"r,q\n0.0,1.1\n0.5,2.5\n");
    let drift = verify(&run_a, "relaxed", Some(&out.join("replay_drift"))).expect("verify drift failed");

    let delta = compare(&run_a, &run_b, &out.join("delta")).expect("compare failed");
    let sentinel = check(&run_b, 3, Some(&out.join("sentinel"))).expect("sentinel failed");

    let _ = std::fs::remove_dir_all(&root);

    println!("manifest_digest_a={digest_a}");
    println!("manifest_digest_b={digest_b}");
    println!("replay_ok={}", replay.ok);
    println!("replay_n_files={}", replay.n_files);
    println!("replay_n_mismatch={}", replay.n_mismatch);
    println!(
        "replay_env_match={}",
        replay.env_match.map_or_else(|| "none".to_string(), |m| m.to_string())
    );
    println!("drift_n_mismatch={}", drift.n_mismatch);
    println!("delta_ok={}", delta.ok);
    println!(
        "delta_first_difference={}",
        delta.first_difference.as_ref().map_or("none", |d| d.path.as_str())
    );
    println!("delta_divergence_class={}", delta.divergence_class);
    println!("sentinel_ok={}", sentinel.ok);
    println!("sentinel_run_hash={}", sentinel.run_hashes[0]);
}
