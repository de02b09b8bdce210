mod cli;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::info;
use rusqlite::Connection;

use cli::{Cli, Command};
use kaamyab_access::access::{decision_table, resolve};
use kaamyab_access::config::Config;
use kaamyab_access::model::{
    AccessInput, AccessLevel, EmailDomainType, SubscriptionState, SubscriptionTier,
};
use kaamyab_access::ops::UseOutcome;
use kaamyab_access::{db, ops, output, paths, watch};

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .target(env_logger::Target::Stderr)
        .filter_level(level)
        .parse_env("KAAMYAB_LOG")
        .format_timestamp_secs()
        .init();
}

fn open_db(db_path: &str) -> Result<Connection> {
    paths::ensure_db_dir(db_path)?;
    let conn = db::open(db_path)?;
    db::init(&conn)?;
    Ok(conn)
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let db_path = paths::resolve_db_path(cli.db)?;
    let config_path = paths::resolve_config_path(cli.config)?;
    let config = Config::load_from(&config_path)?;
    let policy = &config.policy;

    match cli.command {
        Command::Add {
            user,
            email,
            tier,
            state,
        } => {
            let conn = open_db(&db_path)?;
            ops::add_profile(&conn, &user, &email, tier.as_deref(), state.as_deref())?;
            eprintln!("Added profile '{user}'");
        }

        Command::Show { user, json } => {
            let conn = open_db(&db_path)?;
            let evaluation = ops::check_access(&conn, &user, policy)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&evaluation)?);
            } else {
                print!("{}", output::format_evaluation_detail(&evaluation));
            }
        }

        Command::List { level, json } => {
            let conn = open_db(&db_path)?;
            let level = level.map(|s| AccessLevel::parse(&s)).transpose()?;
            let evaluations = ops::list_profiles(&conn, level, policy)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&evaluations)?);
            } else {
                print!("{}", output::format_evaluation_list(&evaluations));
            }
        }

        Command::SetTier { user, tier, state } => {
            let conn = open_db(&db_path)?;
            ops::set_subscription(&conn, &user, tier.as_deref(), state.as_deref())?;
            eprintln!("Updated subscription for '{user}'");
        }

        Command::SetDomain {
            user,
            domain_type,
            clear: _,
        } => {
            let conn = open_db(&db_path)?;
            ops::set_email_domain_type(&conn, &user, domain_type.as_deref())?;
            match domain_type {
                Some(t) => eprintln!("Email domain for '{user}' set to {t}"),
                None => eprintln!("Cleared email domain override for '{user}'"),
            }
        }

        Command::Rm { user } => {
            let conn = open_db(&db_path)?;
            ops::remove_profile(&conn, &user)?;
            eprintln!("Removed profile '{user}'");
        }

        Command::ConsumeTrial { user } => {
            let conn = open_db(&db_path)?;
            if ops::consume_trial(&conn, &user)? {
                eprintln!("Consumed strategic trial for '{user}'");
            } else {
                eprintln!("Strategic trial for '{user}' was already used");
            }
        }

        Command::Use { user, json } => {
            let conn = open_db(&db_path)?;
            let outcome = ops::use_strategic(&conn, &user, policy)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print!("{}", output::format_use_outcome(&user, &outcome));
            }
            if matches!(outcome, UseOutcome::Denied { .. }) {
                std::process::exit(1);
            }
        }

        Command::Eval {
            tier,
            state,
            trial_used,
            email_type,
            json,
        } => {
            let input = AccessInput {
                subscription_tier: SubscriptionTier::parse(&tier),
                subscription_state: SubscriptionState::parse(&state),
                strategic_trial_used: trial_used,
                email_domain_type: EmailDomainType::parse(&email_type)?,
            };
            let result = resolve(&input);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", output::format_result(&result));
            }
        }

        Command::Table { json } => {
            let rows = decision_table();
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::decision_rows(&rows))?
                );
            } else {
                print!("{}", output::format_decision_table(&rows));
            }
        }

        Command::Watch { user, poll } => {
            let conn = open_db(&db_path)?;
            let (_watcher, rx) = watch::watch_db(&db_path)?;
            let mut tracker = watch::LevelTracker::default();
            info!("watching '{user}' in {db_path}");
            loop {
                let evaluation = ops::check_access(&conn, &user, policy)?;
                let level = evaluation.result.level;
                if let Some(previous) = tracker.observe(level) {
                    match previous {
                        Some(prev) => println!("{user}: {prev} -> {level}  {}", evaluation.result.reason),
                        None => println!("{user}: {level}  {}", evaluation.result.reason),
                    }
                }
                watch::wait_for_change(&rx, Duration::from_secs(poll));
                watch::drain_events(&rx);
            }
        }
    }

    Ok(())
}
