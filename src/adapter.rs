//! Turns raw profile fields into a fully-typed [`AccessInput`].
//!
//! Everything the resolver refuses to do lives here: defaulting missing
//! fields, coercing unrecognized values, and classifying email domains.

use anyhow::{bail, Result};
use log::warn;

use crate::config::{PolicyConfig, UnknownTierPolicy};
use crate::model::{AccessInput, EmailDomainType, Profile, SubscriptionState, SubscriptionTier};

/// Throwaway-address providers recognized without any configuration.
pub const BUILTIN_DISPOSABLE_DOMAINS: &[&str] = &[
    "10minutemail.com",
    "dispostable.com",
    "getnada.com",
    "guerrillamail.com",
    "mailinator.com",
    "maildrop.cc",
    "sharklasers.com",
    "temp-mail.org",
    "tempmail.com",
    "throwawaymail.com",
    "trashmail.com",
    "yopmail.com",
];

/// Gating fields of a profile as stored, any of which may be missing.
#[derive(Debug, Clone, Default)]
pub struct ProfileFacts<'a> {
    pub email: Option<&'a str>,
    pub subscription_tier: Option<&'a str>,
    pub subscription_state: Option<&'a str>,
    pub strategic_trial_used: bool,
    pub email_domain_type: Option<&'a str>,
}

impl<'a> From<&'a Profile> for ProfileFacts<'a> {
    fn from(profile: &'a Profile) -> Self {
        Self {
            email: Some(profile.email.as_str()),
            subscription_tier: profile.subscription_tier.as_deref(),
            subscription_state: profile.subscription_state.as_deref(),
            strategic_trial_used: profile.strategic_trial_used,
            email_domain_type: profile.email_domain_type.as_deref(),
        }
    }
}

pub fn to_access_input(facts: &ProfileFacts<'_>, policy: &PolicyConfig) -> AccessInput {
    AccessInput {
        subscription_tier: adapt_tier(facts.subscription_tier, policy.unknown_tier),
        subscription_state: adapt_state(facts.subscription_state),
        strategic_trial_used: facts.strategic_trial_used,
        email_domain_type: adapt_domain_type(facts, policy),
    }
}

fn adapt_tier(raw: Option<&str>, unknown: UnknownTierPolicy) -> SubscriptionTier {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return SubscriptionTier::Standard;
    };
    match SubscriptionTier::parse(raw) {
        SubscriptionTier::Other(name) if unknown == UnknownTierPolicy::Standard => {
            warn!("unrecognized subscription tier '{name}', treating as standard");
            SubscriptionTier::Standard
        }
        tier => tier,
    }
}

fn adapt_state(raw: Option<&str>) -> SubscriptionState {
    match raw.filter(|s| !s.trim().is_empty()) {
        Some(s) => SubscriptionState::parse(s),
        None => SubscriptionState::Active,
    }
}

fn adapt_domain_type(facts: &ProfileFacts<'_>, policy: &PolicyConfig) -> EmailDomainType {
    if let Some(raw) = facts.email_domain_type.filter(|s| !s.trim().is_empty()) {
        return match EmailDomainType::parse(raw) {
            Ok(t) => t,
            Err(_) => {
                warn!("unrecognized email domain type '{raw}', treating as standard");
                EmailDomainType::Standard
            }
        };
    }
    match facts.email {
        Some(email) => classify_email(email, policy),
        None => EmailDomainType::Standard,
    }
}

/// Classify an address by its domain. Subdomains of a listed domain match too.
/// Disposable wins over enterprise when a domain is on both lists.
pub fn classify_email(email: &str, policy: &PolicyConfig) -> EmailDomainType {
    let Some(domain) = email_domain(email) else {
        return EmailDomainType::Standard;
    };
    let domain = domain.to_ascii_lowercase();

    let mut disposable = BUILTIN_DISPOSABLE_DOMAINS
        .iter()
        .copied()
        .chain(policy.disposable_domains.iter().map(String::as_str));
    if disposable.any(|d| domain_matches(&domain, d)) {
        return EmailDomainType::Disposable;
    }
    if policy
        .enterprise_domains
        .iter()
        .any(|d| domain_matches(&domain, d))
    {
        return EmailDomainType::Enterprise;
    }
    EmailDomainType::Standard
}

fn email_domain(email: &str) -> Option<&str> {
    let (local, domain) = email.trim().rsplit_once('@')?;
    if local.is_empty() || domain.is_empty() {
        return None;
    }
    Some(domain)
}

fn domain_matches(domain: &str, listed: &str) -> bool {
    let listed = listed.trim().trim_start_matches('.').to_ascii_lowercase();
    if listed.is_empty() {
        return false;
    }
    domain == listed
        || domain
            .strip_suffix(listed.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Validate a user id: must be non-empty and match [a-zA-Z0-9_-]+
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        bail!("user id must not be empty");
    }
    if !user_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        bail!("user id '{user_id}' contains invalid characters: only a-z, A-Z, 0-9, _, - allowed");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.chars().any(char::is_whitespace) {
        bail!("email '{email}' must not contain whitespace");
    }
    if email.matches('@').count() != 1 || email_domain(email).is_none() {
        bail!("email '{email}' must look like local@domain");
    }
    Ok(())
}
