//! Risk assessment: derived budget and coverage-gap warnings, merged and
//! de-duplicated against whatever warnings the draft already carries.

use crate::models::{Goal, Profile, RiskWarning, Severity, StrategyRecommendation, coverage};
use std::collections::{HashMap, HashSet};

const BUDGET_SEGMENT: &str = "budget control";
const GAP_SEGMENT: &str = "coverage gap";
const AGE_SEGMENT: &str = "age and underwriting";

/// Rough annual premium per unit of sum assured.
fn premium_rate(coverage_type: &str) -> f64 {
    match coverage_type {
        coverage::TERM_LIFE => 0.002,
        coverage::CRITICAL_ILLNESS => 0.015,
        coverage::MEDICAL => 0.003,
        coverage::ACCIDENT => 0.0004,
        coverage::EDUCATION_SAVINGS => 0.005,
        coverage::ANNUITY_RETIREMENT => 0.004,
        _ => 0.003,
    }
}

/// Estimated annual premium across all recommended items.
pub fn estimate_annual_premium(rec: &StrategyRecommendation) -> f64 {
    rec.items
        .iter()
        .map(|item| premium_rate(&item.coverage_type) * item.recommended_sum_assured)
        .sum()
}

/// Budget check: warn when the estimated premium crosses 8% (medium) or 10%
/// (high) of annual income. Zero income suppresses the check entirely.
pub fn assess_budget(profile: &Profile, rec: &StrategyRecommendation) -> Vec<RiskWarning> {
    let income = profile.finance.annual_income;
    if income <= 0.0 {
        return Vec::new();
    }
    let estimated = estimate_annual_premium(rec);
    let ratio = estimated / income.max(1.0);

    let mut warnings = Vec::new();
    if ratio > 0.10 {
        warnings.push(RiskWarning::new(
            BUDGET_SEGMENT,
            Severity::High,
            format!(
                "Estimated annual premium is about {:.1}% of income; keep it under 10% by \
                 trimming sums assured or phasing the purchases",
                ratio * 100.0
            ),
        ));
    } else if ratio > 0.08 {
        warnings.push(RiskWarning::new(
            BUDGET_SEGMENT,
            Severity::Medium,
            format!(
                "Estimated annual premium is about {:.1}% of income, slightly high; watch \
                 cash flow and stagger the purchases",
                ratio * 100.0
            ),
        ));
    }
    warnings
}

/// Gap check: requested goals with no matching item, plus the late-age
/// critical-illness underwriting flag.
pub fn assess_gaps(profile: &Profile, rec: &StrategyRecommendation) -> Vec<RiskWarning> {
    let goals: HashSet<Goal> = profile.goals.iter().copied().collect();
    let types: HashSet<&str> = rec.items.iter().map(|i| i.coverage_type.as_str()).collect();

    let mut warnings = Vec::new();
    if goals.contains(&Goal::MedicalExpense) && !types.contains(coverage::MEDICAL) {
        warnings.push(RiskWarning::new(
            GAP_SEGMENT,
            Severity::High,
            "No medical reimbursement cover configured; add it first",
        ));
    }
    if goals.contains(&Goal::IncomeProtection) && !types.contains(coverage::TERM_LIFE) {
        warnings.push(RiskWarning::new(
            GAP_SEGMENT,
            Severity::High,
            "No term life cover configured; close the income gap soon",
        ));
    }
    if profile.insured.age > 55
        && goals.contains(&Goal::CriticalIllness)
        && !types.contains(coverage::CRITICAL_ILLNESS)
    {
        warnings.push(RiskWarning::new(
            AGE_SEGMENT,
            Severity::Medium,
            "Critical illness entry age is high and underwriting gets harder; configure it soon",
        ));
    }
    warnings
}

/// De-duplicate by (segment, advice). Later entries overwrite earlier ones
/// (last write wins for the level); output keeps first-insertion order.
pub fn merge_warnings(
    existing: Vec<RiskWarning>,
    computed: Vec<RiskWarning>,
) -> Vec<RiskWarning> {
    let mut merged: Vec<RiskWarning> = Vec::new();
    let mut position: HashMap<(String, String), usize> = HashMap::new();
    for warning in existing.into_iter().chain(computed) {
        let key = (warning.segment.clone(), warning.advice.clone());
        match position.get(&key) {
            Some(&idx) => merged[idx] = warning,
            None => {
                position.insert(key, merged.len());
                merged.push(warning);
            }
        }
    }
    merged
}

/// RiskAssess stage body: compute budget and gap warnings, merge them into
/// the draft's warning list in place.
pub fn assess(profile: &Profile, rec: &mut StrategyRecommendation) {
    let mut computed = assess_budget(profile, rec);
    computed.extend(assess_gaps(profile, rec));
    let existing = std::mem::take(&mut rec.risk_warnings);
    rec.risk_warnings = merge_warnings(existing, computed);
}
