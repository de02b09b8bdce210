//! Strategic planning access decisions.
//!
//! `resolve` is a pure classifier: the same input always yields the same
//! result, and it never reads or writes the trial flag itself. Callers fetch
//! the facts, adapt them with [`crate::adapter`], and persist any trial
//! consumption separately.

use crate::model::{
    AccessInput, AccessLevel, AccessResult, EmailDomainType, SubscriptionState, SubscriptionTier,
};

pub const REASON_ACTIVE_SUBSCRIPTION: &str = "Active subscription";
pub const REASON_DISPOSABLE_EMAIL: &str =
    "Strategic planning needs a stable account. Sign up with a permanent email address to unlock it.";
pub const REASON_TRIAL_AVAILABLE: &str = "Strategic trial available";
pub const REASON_UPGRADE: &str = "Upgrade to Pro for unlimited strategic planning.";

pub const PREVIEW_MESSAGE: &str =
    "You're viewing a one-time preview of your strategic plan. Upgrade to Pro to regenerate it and see the full plan.";

/// First matching rule wins: paid+active, then disposable email, then
/// unused trial, then upgrade.
pub fn resolve(input: &AccessInput) -> AccessResult {
    if input.subscription_tier.is_paid() && input.subscription_state.is_active() {
        return full(REASON_ACTIVE_SUBSCRIPTION);
    }

    if input.email_domain_type == EmailDomainType::Disposable {
        let level = if input.strategic_trial_used {
            AccessLevel::None
        } else {
            AccessLevel::Preview
        };
        return restricted(level, REASON_DISPOSABLE_EMAIL);
    }

    if !input.strategic_trial_used {
        return restricted(AccessLevel::Preview, REASON_TRIAL_AVAILABLE);
    }

    restricted(AccessLevel::None, REASON_UPGRADE)
}

/// User-facing line for a decision. Empty when nothing needs saying.
pub fn access_message(result: &AccessResult) -> &str {
    match result.level {
        AccessLevel::Full => "",
        AccessLevel::Preview => PREVIEW_MESSAGE,
        AccessLevel::None => result.reason,
    }
}

pub fn can_access_at_all(input: &AccessInput) -> bool {
    resolve(input).level != AccessLevel::None
}

/// Every representative input paired with its decision: three tiers (free,
/// a known paid tier, an unknown tier), active or not, trial used or not,
/// and each email domain type. 36 rows.
pub fn decision_table() -> Vec<(AccessInput, AccessResult)> {
    let tiers = [
        SubscriptionTier::Standard,
        SubscriptionTier::Pro,
        SubscriptionTier::Other("unknown".into()),
    ];
    let states = [
        SubscriptionState::Active,
        SubscriptionState::Inactive("expired".into()),
    ];

    let mut rows = Vec::with_capacity(36);
    for tier in &tiers {
        for state in &states {
            for trial_used in [false, true] {
                for email in EmailDomainType::ALL {
                    let input = AccessInput {
                        subscription_tier: tier.clone(),
                        subscription_state: state.clone(),
                        strategic_trial_used: trial_used,
                        email_domain_type: email,
                    };
                    let result = resolve(&input);
                    rows.push((input, result));
                }
            }
        }
    }
    rows
}

fn full(reason: &'static str) -> AccessResult {
    AccessResult {
        level: AccessLevel::Full,
        reason,
        can_regenerate: true,
        can_view_full_plan: true,
    }
}

// Preview is read-only and one-shot, so it shares the flags of None.
fn restricted(level: AccessLevel, reason: &'static str) -> AccessResult {
    AccessResult {
        level,
        reason,
        can_regenerate: false,
        can_view_full_plan: false,
    }
}
