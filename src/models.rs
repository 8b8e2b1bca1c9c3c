//! Wire-visible data model: the insured profile going in and the structured
//! strategy recommendation coming out. Field names are part of the JSON
//! contract and must not drift.

use crate::error::{InsuraError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coverage type tags used by the synthesizer and the premium rate table.
/// `StrategyItem::coverage_type` stays a plain string so backend-generated
/// drafts can carry free-text product types through unchanged.
pub mod coverage {
    pub const TERM_LIFE: &str = "term_life";
    pub const CRITICAL_ILLNESS: &str = "critical_illness";
    pub const MEDICAL: &str = "medical";
    pub const ACCIDENT: &str = "accident";
    pub const EDUCATION_SAVINGS: &str = "education_savings";
    pub const ANNUITY_RETIREMENT: &str = "annuity_retirement";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Insurance goals a profile can request. Item derivation walks these in a
/// fixed order regardless of how the caller ordered them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    IncomeProtection,
    MedicalExpense,
    EducationFund,
    WealthLegacy,
    CriticalIllness,
    Accident,
    Retirement,
}

impl Goal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::IncomeProtection => "income_protection",
            Goal::MedicalExpense => "medical_expense",
            Goal::EducationFund => "education_fund",
            Goal::WealthLegacy => "wealth_legacy",
            Goal::CriticalIllness => "critical_illness",
            Goal::Accident => "accident",
            Goal::Retirement => "retirement",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuredInfo {
    pub age: u32,
    pub gender: Gender,
    pub occupation: String,
    pub health_status: String,
    pub family_structure: String,
    #[serde(default)]
    pub smoker: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialStatus {
    pub annual_income: f64,
    #[serde(default)]
    pub liabilities: f64,
    #[serde(default)]
    pub assets: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_budget_for_insurance: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub product: String,
    pub coverage_type: String,
    pub sum_assured: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_annual: Option<f64>,
}

/// The full user profile fed into the pipeline. Immutable once constructed;
/// stages borrow it, nothing mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub insured: InsuredInfo,
    pub finance: FinancialStatus,
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub existing_policies: Vec<ExistingPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_hints: Option<Vec<String>>,
}

impl Profile {
    /// Range checks on caller-supplied values. Run at the ingestion boundary
    /// before any stage sees the profile.
    pub fn validate(&self) -> Result<()> {
        if self.insured.age > 120 {
            return Err(InsuraError::Validation {
                message: format!("age {} out of range 0..=120", self.insured.age),
            });
        }
        if self.finance.annual_income < 0.0 {
            return Err(InsuraError::Validation {
                message: "annual_income must be non-negative".into(),
            });
        }
        if let Some(budget) = self.finance.monthly_budget_for_insurance
            && budget < 0.0
        {
            return Err(InsuraError::Validation {
                message: "monthly_budget_for_insurance must be non-negative".into(),
            });
        }
        for policy in &self.existing_policies {
            if policy.sum_assured < 0.0 {
                return Err(InsuraError::Validation {
                    message: format!("existing policy '{}' has negative sum assured", policy.product),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMode {
    #[serde(rename = "annual")]
    Annual,
    #[serde(rename = "semi-annual")]
    SemiAnnual,
    #[serde(rename = "quarterly")]
    Quarterly,
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "single")]
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "now")]
    Now,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "12m")]
    TwelveMonths,
    #[serde(rename = "upgrade")]
    Upgrade,
}

/// One coverage recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyItem {
    pub coverage_type: String,
    pub recommended_sum_assured: f64,
    pub term_years: u32,
    pub payment_mode: PaymentMode,
    pub beneficiary: String,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseStep {
    pub phase: Phase,
    pub actions: Vec<String>,
}

/// A flagged concern. Two warnings are duplicates iff (segment, advice)
/// match exactly; the level is NOT part of the identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskWarning {
    pub segment: String,
    pub level: Severity,
    pub advice: String,
}

impl RiskWarning {
    pub fn new(segment: &str, level: Severity, advice: impl Into<String>) -> Self {
        Self {
            segment: segment.to_string(),
            level,
            advice: advice.into(),
        }
    }
}

/// The pipeline's terminal artifact. Created by the synthesizer (or parsed
/// from backend text), mutated in place by RiskAssess and Review, frozen
/// after the pipeline completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecommendation {
    pub items: Vec<StrategyItem>,
    pub purchase_plan: Vec<PurchaseStep>,
    pub policy_combo_explanation: String,
    /// Exactly two keys, "renewal" and "claims", each an ordered tip list.
    /// Kept sorted so identical recommendations serialize identically.
    pub renewal_and_claims: BTreeMap<String, Vec<String>>,
    pub risk_warnings: Vec<RiskWarning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<String>>,
}

pub const RENEWAL_KEY: &str = "renewal";
pub const CLAIMS_KEY: &str = "claims";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_serde_uses_snake_case_identifiers() {
        let json = serde_json::to_string(&Goal::IncomeProtection).unwrap();
        assert_eq!(json, "\"income_protection\"");
        let back: Goal = serde_json::from_str("\"critical_illness\"").unwrap();
        assert_eq!(back, Goal::CriticalIllness);
    }

    #[test]
    fn phase_serde_round_trips_short_tags() {
        let json = serde_json::to_string(&Phase::SixMonths).unwrap();
        assert_eq!(json, "\"6m\"");
        let back: Phase = serde_json::from_str("\"upgrade\"").unwrap();
        assert_eq!(back, Phase::Upgrade);
    }

    #[test]
    fn profile_validate_rejects_out_of_range_age() {
        let mut profile = crate::store::demo_profile();
        profile.insured.age = 130;
        assert!(profile.validate().is_err());
    }
}
