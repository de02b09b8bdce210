use serde::{Serialize, Serializer};
use std::fmt;

/// Paid tier a user is subscribed to. `Standard` is the free baseline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionTier {
    Standard,
    Pro,
    /// A tier name this build doesn't know about. Counts as paid.
    Other(String),
}

impl SubscriptionTier {
    /// Never fails: blank input is `Standard`, unknown names land in `Other`.
    pub fn parse(s: &str) -> Self {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "" | "standard" => Self::Standard,
            "pro" => Self::Pro,
            _ => Self::Other(name),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard => "standard",
            Self::Pro => "pro",
            Self::Other(name) => name,
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, Self::Standard)
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SubscriptionTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionState {
    Active,
    /// Anything other than active, e.g. "expired" or "cancelled".
    Inactive(String),
}

impl SubscriptionState {
    pub fn parse(s: &str) -> Self {
        let name = s.trim().to_ascii_lowercase();
        if name == "active" {
            Self::Active
        } else {
            Self::Inactive(name)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Inactive(name) => name,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SubscriptionState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailDomainType {
    Standard,
    Disposable,
    Enterprise,
}

impl EmailDomainType {
    pub const ALL: [Self; 3] = [Self::Standard, Self::Disposable, Self::Enterprise];

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "disposable" => Ok(Self::Disposable),
            "enterprise" => Ok(Self::Enterprise),
            _ => anyhow::bail!(
                "invalid email domain type '{s}': must be standard, disposable, or enterprise"
            ),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Disposable => "disposable",
            Self::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for EmailDomainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    None,
    Preview,
    Full,
}

impl AccessLevel {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "preview" => Ok(Self::Preview),
            "full" => Ok(Self::Full),
            _ => anyhow::bail!("invalid access level '{s}': must be none, preview, or full"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Preview => "preview",
            Self::Full => "full",
        }
    }

    /// Returns display icon: +=full, ~=preview, -=none
    pub fn icon(self) -> &'static str {
        match self {
            Self::Full => "+",
            Self::Preview => "~",
            Self::None => "-",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts the resolver decides on. Built fresh for every evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessInput {
    pub subscription_tier: SubscriptionTier,
    pub subscription_state: SubscriptionState,
    pub strategic_trial_used: bool,
    pub email_domain_type: EmailDomainType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessResult {
    pub level: AccessLevel,
    pub reason: &'static str,
    pub can_regenerate: bool,
    pub can_view_full_plan: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: i64,
    pub user_id: String,
    pub email: String,
    pub subscription_tier: Option<String>,
    pub subscription_state: Option<String>,
    pub strategic_trial_used: bool,
    pub trial_used_at: Option<String>,
    pub email_domain_type: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_parse_is_case_insensitive() {
        assert_eq!(SubscriptionTier::parse("Standard"), SubscriptionTier::Standard);
        assert_eq!(SubscriptionTier::parse(" PRO "), SubscriptionTier::Pro);
        assert_eq!(
            SubscriptionTier::parse("Team"),
            SubscriptionTier::Other("team".into())
        );
    }

    #[test]
    fn blank_tier_is_standard() {
        assert_eq!(SubscriptionTier::parse(""), SubscriptionTier::Standard);
        assert_eq!(SubscriptionTier::parse("   "), SubscriptionTier::Standard);
        assert!(!SubscriptionTier::parse("").is_paid());
    }

    #[test]
    fn unknown_tier_counts_as_paid() {
        assert!(!SubscriptionTier::Standard.is_paid());
        assert!(SubscriptionTier::Pro.is_paid());
        assert!(SubscriptionTier::Other("lifetime".into()).is_paid());
    }

    #[test]
    fn state_parse() {
        assert!(SubscriptionState::parse("ACTIVE").is_active());
        assert_eq!(
            SubscriptionState::parse("expired"),
            SubscriptionState::Inactive("expired".into())
        );
    }

    #[test]
    fn domain_type_rejects_unknown() {
        assert_eq!(
            EmailDomainType::parse("Disposable").unwrap(),
            EmailDomainType::Disposable
        );
        assert!(EmailDomainType::parse("corporate").is_err());
    }

    #[test]
    fn serializes_as_lowercase_strings() {
        let input = AccessInput {
            subscription_tier: SubscriptionTier::Other("team".into()),
            subscription_state: SubscriptionState::Inactive("cancelled".into()),
            strategic_trial_used: true,
            email_domain_type: EmailDomainType::Enterprise,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["subscription_tier"], "team");
        assert_eq!(json["subscription_state"], "cancelled");
        assert_eq!(json["email_domain_type"], "enterprise");
        assert_eq!(serde_json::to_value(AccessLevel::Preview).unwrap(), "preview");
    }
}
