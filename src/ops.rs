use anyhow::{bail, Result};
use log::{debug, info};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;

use crate::access::{access_message, resolve};
use crate::adapter::{to_access_input, validate_email, validate_user_id, ProfileFacts};
use crate::config::PolicyConfig;
use crate::model::{AccessInput, AccessLevel, AccessResult, EmailDomainType, Profile};

fn profile_exists(conn: &Connection, user_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM profiles WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn require_profile(conn: &Connection, user_id: &str) -> Result<()> {
    if !profile_exists(conn, user_id)? {
        bail!("user '{user_id}' not found");
    }
    Ok(())
}

fn read_profile_row(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        user_id: row.get(1)?,
        email: row.get(2)?,
        subscription_tier: row.get(3)?,
        subscription_state: row.get(4)?,
        strategic_trial_used: row.get::<_, i64>(5)? != 0,
        trial_used_at: row.get(6)?,
        email_domain_type: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

const PROFILE_COLUMNS: &str = "id, user_id, email, subscription_tier, subscription_state, \
     strategic_trial_used, trial_used_at, email_domain_type, created_at, updated_at";

const INSERT_PROFILE: &str = "
INSERT INTO profiles (user_id, email, subscription_tier, subscription_state)
VALUES (?1, ?2, ?3, ?4)
";

const SET_SUBSCRIPTION: &str = "
UPDATE profiles
SET subscription_tier = COALESCE(?1, subscription_tier),
    subscription_state = COALESCE(?2, subscription_state),
    updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE user_id = ?3
";

const SET_DOMAIN_TYPE: &str = "
UPDATE profiles
SET email_domain_type = ?1,
    updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE user_id = ?2
";

// Only the first consumption matches; later ones touch zero rows.
const CONSUME_TRIAL: &str = "
UPDATE profiles
SET strategic_trial_used = 1,
    trial_used_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now'),
    updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE user_id = ?1 AND strategic_trial_used = 0
";

pub fn add_profile(
    conn: &Connection,
    user_id: &str,
    email: &str,
    tier: Option<&str>,
    state: Option<&str>,
) -> Result<()> {
    validate_user_id(user_id)?;
    validate_email(email)?;
    if profile_exists(conn, user_id)? {
        bail!("user '{user_id}' already exists");
    }
    conn.execute(INSERT_PROFILE, rusqlite::params![user_id, email, tier, state])?;
    info!("added profile '{user_id}'");
    Ok(())
}

pub fn get_profile(conn: &Connection, user_id: &str) -> Result<Profile> {
    require_profile(conn, user_id)?;
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?1");
    let profile = conn.query_row(&sql, [user_id], read_profile_row)?;
    debug!("loaded profile '{user_id}'");
    Ok(profile)
}

pub fn set_subscription(
    conn: &Connection,
    user_id: &str,
    tier: Option<&str>,
    state: Option<&str>,
) -> Result<()> {
    if tier.is_none() && state.is_none() {
        bail!("nothing to update: pass a tier, a state, or both");
    }
    require_profile(conn, user_id)?;
    conn.execute(SET_SUBSCRIPTION, rusqlite::params![tier, state, user_id])?;
    info!(
        "updated subscription for '{user_id}' (tier={}, state={})",
        tier.unwrap_or("unchanged"),
        state.unwrap_or("unchanged")
    );
    Ok(())
}

/// Set or clear the email domain type override.
pub fn set_email_domain_type(conn: &Connection, user_id: &str, domain_type: Option<&str>) -> Result<()> {
    let domain_type = domain_type.map(EmailDomainType::parse).transpose()?;
    require_profile(conn, user_id)?;
    conn.execute(
        SET_DOMAIN_TYPE,
        rusqlite::params![domain_type.map(EmailDomainType::as_str), user_id],
    )?;
    match domain_type {
        Some(t) => info!("set email domain type for '{user_id}' to {t}"),
        None => info!("cleared email domain type override for '{user_id}'"),
    }
    Ok(())
}

pub fn remove_profile(conn: &Connection, user_id: &str) -> Result<()> {
    require_profile(conn, user_id)?;
    conn.execute("DELETE FROM profiles WHERE user_id = ?1", [user_id])?;
    info!("removed profile '{user_id}'");
    Ok(())
}

/// Mark the one-time strategic trial as used. Returns true only for the
/// call that made the transition.
pub fn consume_trial(conn: &Connection, user_id: &str) -> Result<bool> {
    require_profile(conn, user_id)?;
    let rows = conn.execute(CONSUME_TRIAL, [user_id])?;
    if rows > 0 {
        info!("strategic trial consumed for '{user_id}'");
    } else {
        debug!("strategic trial for '{user_id}' was already used");
    }
    Ok(rows > 0)
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub profile: Profile,
    pub input: AccessInput,
    pub result: AccessResult,
}

pub fn evaluate(profile: Profile, policy: &PolicyConfig) -> Evaluation {
    let input = to_access_input(&ProfileFacts::from(&profile), policy);
    let result = resolve(&input);
    Evaluation {
        profile,
        input,
        result,
    }
}

pub fn check_access(conn: &Connection, user_id: &str, policy: &PolicyConfig) -> Result<Evaluation> {
    let profile = get_profile(conn, user_id)?;
    let evaluation = evaluate(profile, policy);
    debug!(
        "access for '{user_id}': {} ({})",
        evaluation.result.level, evaluation.result.reason
    );
    Ok(evaluation)
}

/// List profiles ordered by user id, optionally keeping only those that
/// currently resolve to `level`.
pub fn list_profiles(
    conn: &Connection,
    level: Option<AccessLevel>,
    policy: &PolicyConfig,
) -> Result<Vec<Evaluation>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY user_id");
    let mut stmt = conn.prepare(&sql)?;
    let profiles = stmt
        .query_map([], read_profile_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(profiles
        .into_iter()
        .map(|p| evaluate(p, policy))
        .filter(|e| level.map_or(true, |l| e.result.level == l))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UseOutcome {
    /// Paid access; nothing recorded.
    Granted,
    /// The one-time preview was granted and the trial is now used.
    PreviewGranted,
    Denied { message: String },
}

/// One run of the gated feature on behalf of `user_id`. The read and the
/// trial write share one immediate transaction, so concurrent callers queue
/// on the write lock and only the first can get the preview.
pub fn use_strategic(conn: &Connection, user_id: &str, policy: &PolicyConfig) -> Result<UseOutcome> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let evaluation = check_access(&tx, user_id, policy)?;
    let outcome = match evaluation.result.level {
        AccessLevel::Full => UseOutcome::Granted,
        AccessLevel::Preview => {
            if !consume_trial(&tx, user_id)? {
                bail!("strategic trial for '{user_id}' changed while holding the write lock");
            }
            UseOutcome::PreviewGranted
        }
        AccessLevel::None => UseOutcome::Denied {
            message: access_message(&evaluation.result).to_string(),
        },
    };

    tx.commit()?;
    Ok(outcome)
}
