use std::io::Write;
use std::sync::{Arc, Barrier};

use kaamyab_access::config::{Config, UnknownTierPolicy};
use kaamyab_access::model::{AccessLevel, EmailDomainType, SubscriptionTier};
use kaamyab_access::ops::{self, UseOutcome};
use kaamyab_access::{db, paths};

fn open_temp_db(dir: &tempfile::TempDir) -> rusqlite::Connection {
    let path = dir.path().join("data/access.db");
    let path = path.to_str().unwrap();
    paths::ensure_db_dir(path).unwrap();
    let conn = db::open(path).unwrap();
    db::init(&conn).unwrap();
    conn
}

fn load_config(dir: &tempfile::TempDir, contents: &str) -> Config {
    let path = dir.path().join("access.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    Config::load_from(&path).unwrap()
}

#[test]
fn free_user_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_temp_db(&dir);
    let config = Config::default();

    ops::add_profile(&conn, "asha", "asha@example.com", None, None).unwrap();
    let e = ops::check_access(&conn, "asha", &config.policy).unwrap();
    assert_eq!(e.result.level, AccessLevel::Preview);

    assert_eq!(
        ops::use_strategic(&conn, "asha", &config.policy).unwrap(),
        UseOutcome::PreviewGranted
    );
    let e = ops::check_access(&conn, "asha", &config.policy).unwrap();
    assert_eq!(e.result.level, AccessLevel::None);

    // Upgrading restores access without resetting the trial.
    ops::set_subscription(&conn, "asha", Some("pro"), Some("active")).unwrap();
    assert_eq!(
        ops::use_strategic(&conn, "asha", &config.policy).unwrap(),
        UseOutcome::Granted
    );

    // Lapsing drops them back to none since the trial is spent.
    ops::set_subscription(&conn, "asha", None, Some("cancelled")).unwrap();
    let e = ops::check_access(&conn, "asha", &config.policy).unwrap();
    assert_eq!(e.result.level, AccessLevel::None);
    assert!(e.profile.strategic_trial_used);
}

#[test]
fn second_connection_cannot_reuse_the_trial() {
    let dir = tempfile::tempdir().unwrap();
    let first = open_temp_db(&dir);
    let second = open_temp_db(&dir);
    let policy = Config::default().policy;

    ops::add_profile(&first, "ravi", "ravi@example.com", None, None).unwrap();
    assert_eq!(
        ops::use_strategic(&first, "ravi", &policy).unwrap(),
        UseOutcome::PreviewGranted
    );
    assert!(matches!(
        ops::use_strategic(&second, "ravi", &policy).unwrap(),
        UseOutcome::Denied { .. }
    ));
    assert!(!ops::consume_trial(&second, "ravi").unwrap());
}

#[test]
fn concurrent_callers_get_one_preview_and_the_rest_denied() {
    const CALLERS: usize = 8;
    let dir = tempfile::tempdir().unwrap();
    let setup = open_temp_db(&dir);
    let policy = Config::default().policy;

    for round in 0..5 {
        let user = format!("racer-{round}");
        ops::add_profile(&setup, &user, &format!("{user}@example.com"), None, None).unwrap();

        let conns: Vec<_> = (0..CALLERS).map(|_| open_temp_db(&dir)).collect();
        let barrier = Arc::new(Barrier::new(CALLERS));
        let handles: Vec<_> = conns
            .into_iter()
            .map(|conn| {
                let barrier = Arc::clone(&barrier);
                let policy = policy.clone();
                let user = user.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    ops::use_strategic(&conn, &user, &policy)
                })
            })
            .collect();

        let outcomes: Vec<UseOutcome> = handles
            .into_iter()
            .map(|h| h.join().unwrap().expect("caller should not see a lock error"))
            .collect();

        let previews = outcomes
            .iter()
            .filter(|o| **o == UseOutcome::PreviewGranted)
            .count();
        let denied = outcomes
            .iter()
            .filter(|o| matches!(o, UseOutcome::Denied { .. }))
            .count();
        assert_eq!(previews, 1, "round {round}: {outcomes:?}");
        assert_eq!(denied, CALLERS - 1, "round {round}: {outcomes:?}");
        assert!(ops::get_profile(&setup, &user).unwrap().strategic_trial_used);
    }
}

#[test]
fn configured_domains_drive_classification() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_temp_db(&dir);
    let config = load_config(
        &dir,
        "[policy]\ndisposable_domains = [\"burner.example\"]\nenterprise_domains = [\"acme.com\"]\n",
    );

    ops::add_profile(&conn, "burner", "x@mail.burner.example", None, None).unwrap();
    ops::add_profile(&conn, "corp", "y@acme.com", None, None).unwrap();

    let e = ops::check_access(&conn, "burner", &config.policy).unwrap();
    assert_eq!(e.input.email_domain_type, EmailDomainType::Disposable);
    let e = ops::check_access(&conn, "corp", &config.policy).unwrap();
    assert_eq!(e.input.email_domain_type, EmailDomainType::Enterprise);
}

#[test]
fn strict_tier_policy_closes_unknown_tiers() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_temp_db(&dir);
    ops::add_profile(&conn, "u1", "u1@example.com", Some("Legacy"), Some("active")).unwrap();
    ops::consume_trial(&conn, "u1").unwrap();

    let permissive = Config::default();
    let e = ops::check_access(&conn, "u1", &permissive.policy).unwrap();
    assert_eq!(e.input.subscription_tier, SubscriptionTier::Other("legacy".into()));
    assert_eq!(e.result.level, AccessLevel::Full);

    let strict = load_config(&dir, "[policy]\nunknown_tier = \"standard\"\n");
    assert_eq!(strict.policy.unknown_tier, UnknownTierPolicy::Standard);
    let e = ops::check_access(&conn, "u1", &strict.policy).unwrap();
    assert_eq!(e.input.subscription_tier, SubscriptionTier::Standard);
    assert_eq!(e.result.level, AccessLevel::None);
}

#[test]
fn evaluation_serializes_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_temp_db(&dir);
    ops::add_profile(&conn, "u1", "u1@yopmail.com", None, None).unwrap();
    let e = ops::check_access(&conn, "u1", &Config::default().policy).unwrap();
    let json = serde_json::to_value(&e).unwrap();
    assert_eq!(json["profile"]["user_id"], "u1");
    assert_eq!(json["input"]["email_domain_type"], "disposable");
    assert_eq!(json["input"]["subscription_tier"], "standard");
    assert_eq!(json["result"]["level"], "preview");
    assert_eq!(json["result"]["can_view_full_plan"], false);

    let outcome = ops::use_strategic(&conn, "u1", &Config::default().policy).unwrap();
    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        serde_json::json!({ "outcome": "preview_granted" })
    );
}
