use serde::Serialize;

use crate::access::access_message;
use crate::model::{AccessInput, AccessResult};
use crate::ops::{Evaluation, UseOutcome};

#[derive(Serialize)]
pub struct DecisionRow<'a> {
    #[serde(flatten)]
    pub input: &'a AccessInput,
    #[serde(flatten)]
    pub result: &'a AccessResult,
}

pub fn format_evaluation_detail(evaluation: &Evaluation) -> String {
    let Evaluation {
        profile,
        input,
        result,
    } = evaluation;
    let mut out = String::new();
    out.push_str(&format!("User:          {}\n", profile.user_id));
    out.push_str(&format!("Email:         {}\n", profile.email));
    out.push_str(&format!(
        "Tier:          {}{}\n",
        input.subscription_tier,
        defaulted(profile.subscription_tier.as_deref())
    ));
    out.push_str(&format!(
        "State:         {}{}\n",
        input.subscription_state,
        defaulted(profile.subscription_state.as_deref())
    ));
    let domain_source = if profile.email_domain_type.is_some() {
        " (override)"
    } else {
        ""
    };
    out.push_str(&format!(
        "Email domain:  {}{domain_source}\n",
        input.email_domain_type
    ));
    match profile.trial_used_at {
        Some(ref at) => out.push_str(&format!("Trial:         used at {at}\n")),
        None if profile.strategic_trial_used => out.push_str("Trial:         used\n"),
        None => out.push_str("Trial:         unused\n"),
    }
    out.push_str(&format!("Created:       {}\n", profile.created_at));
    out.push_str(&format!("Updated:       {}\n", profile.updated_at));
    out.push('\n');
    out.push_str(&format_result(result));
    out
}

fn defaulted(raw: Option<&str>) -> &'static str {
    match raw {
        Some(s) if !s.trim().is_empty() => "",
        _ => " (default)",
    }
}

pub fn format_result(result: &AccessResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("Access:        {}\n", result.level));
    out.push_str(&format!("Reason:        {}\n", result.reason));
    out.push_str(&format!("Regenerate:    {}\n", yes_no(result.can_regenerate)));
    out.push_str(&format!("Full plan:     {}\n", yes_no(result.can_view_full_plan)));
    let message = access_message(result);
    if !message.is_empty() {
        out.push_str(&format!("Message:       {message}\n"));
    }
    out
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

pub fn format_evaluation_list(evaluations: &[Evaluation]) -> String {
    let mut out = String::new();
    for e in evaluations {
        out.push_str(&format!(
            "{} {}  {}  [{}/{}]  {}\n",
            e.result.level.icon(),
            e.profile.user_id,
            e.profile.email,
            e.input.subscription_tier,
            e.input.subscription_state,
            e.result.reason
        ));
    }
    out
}

pub fn format_decision_table(rows: &[(AccessInput, AccessResult)]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:<9} {:<6} {:<11} {:<8} {}\n",
        "TIER", "STATE", "TRIAL", "EMAIL", "ACCESS", "REASON"
    ));
    for (input, result) in rows {
        let trial = if input.strategic_trial_used { "used" } else { "unused" };
        out.push_str(&format!(
            "{:<10} {:<9} {:<6} {:<11} {:<8} {}\n",
            input.subscription_tier.as_str(),
            input.subscription_state.as_str(),
            trial,
            input.email_domain_type.as_str(),
            result.level.as_str(),
            result.reason
        ));
    }
    out
}

pub fn decision_rows(rows: &[(AccessInput, AccessResult)]) -> Vec<DecisionRow<'_>> {
    rows.iter()
        .map(|(input, result)| DecisionRow { input, result })
        .collect()
}

pub fn format_use_outcome(user_id: &str, outcome: &UseOutcome) -> String {
    match outcome {
        UseOutcome::Granted => format!("'{user_id}' may run strategic planning\n"),
        UseOutcome::PreviewGranted => {
            format!("'{user_id}' was granted the one-time preview (trial now used)\n")
        }
        UseOutcome::Denied { message } => format!("'{user_id}' denied: {message}\n"),
    }
}
