//! Heuristic strategy synthesizer: a deterministic rule engine that maps a
//! profile onto a baseline recommendation without touching any generation
//! backend. Given identical inputs it produces byte-identical output.

use crate::models::{
    CLAIMS_KEY, Goal, PaymentMode, Phase, Profile, PurchaseStep, RENEWAL_KEY, RiskWarning,
    Severity, StrategyItem, StrategyRecommendation, coverage,
};
use std::collections::{BTreeMap, HashSet};

pub const RETIREMENT_AGE: u32 = 65;
pub const MIN_TERM_YEARS: u32 = 10;

/// Items are derived in this order, regardless of how the profile ordered
/// its goals. WealthLegacy has no derivation rule and yields no item.
const DERIVATION_ORDER: [Goal; 6] = [
    Goal::IncomeProtection,
    Goal::CriticalIllness,
    Goal::MedicalExpense,
    Goal::Accident,
    Goal::EducationFund,
    Goal::Retirement,
];

fn years_to_retirement(age: u32) -> u32 {
    RETIREMENT_AGE.saturating_sub(age).max(MIN_TERM_YEARS)
}

fn default_beneficiary(family_structure: &str) -> &'static str {
    let lowered = family_structure.to_lowercase();
    let has_children = lowered
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| {
            matches!(
                token,
                "child" | "children" | "kid" | "kids" | "son" | "sons" | "daughter" | "daughters"
            )
        });
    if has_children {
        "spouse and children per statutory share"
    } else {
        "spouse or parents per statutory share"
    }
}

fn infer_items_by_goal(profile: &Profile) -> Vec<StrategyItem> {
    let years = years_to_retirement(profile.insured.age);
    let beneficiary = default_beneficiary(&profile.insured.family_structure);
    let income = profile.finance.annual_income;
    let goal_set: HashSet<Goal> = profile.goals.iter().copied().collect();

    let mut items = Vec::new();
    for goal in DERIVATION_ORDER {
        if !goal_set.contains(&goal) {
            continue;
        }
        let item = match goal {
            Goal::IncomeProtection => StrategyItem {
                coverage_type: coverage::TERM_LIFE.to_string(),
                recommended_sum_assured: (5.0 * income).max(300_000.0),
                term_years: years,
                payment_mode: PaymentMode::Annual,
                beneficiary: beneficiary.to_string(),
                rationale: "Sized at five years of income to cover loss of household earnings"
                    .to_string(),
            },
            Goal::CriticalIllness => StrategyItem {
                coverage_type: coverage::CRITICAL_ILLNESS.to_string(),
                recommended_sum_assured: 300_000.0_f64.max(0.5 * income),
                term_years: years,
                payment_mode: PaymentMode::Annual,
                beneficiary: beneficiary.to_string(),
                rationale: "Lump sum for treatment and recovery costs of a major illness"
                    .to_string(),
            },
            Goal::MedicalExpense => StrategyItem {
                coverage_type: coverage::MEDICAL.to_string(),
                recommended_sum_assured: 2_000_000.0,
                term_years: 1,
                payment_mode: PaymentMode::Annual,
                beneficiary: beneficiary.to_string(),
                rationale: "Reimbursement medical cover for hospitalization, surgery and \
                            emergency care beyond the public scheme"
                    .to_string(),
            },
            Goal::Accident => StrategyItem {
                coverage_type: coverage::ACCIDENT.to_string(),
                recommended_sum_assured: 1_000_000.0,
                term_years: 1,
                payment_mode: PaymentMode::Annual,
                beneficiary: beneficiary.to_string(),
                rationale: "Accidental death, disability and accident medical cover for \
                            commuting and travel risk"
                    .to_string(),
            },
            Goal::EducationFund => StrategyItem {
                coverage_type: coverage::EDUCATION_SAVINGS.to_string(),
                recommended_sum_assured: 200_000.0,
                term_years: years,
                payment_mode: PaymentMode::Annual,
                beneficiary: beneficiary.to_string(),
                rationale: "Long-horizon education fund with flexible contribution and \
                            withdrawal points"
                    .to_string(),
            },
            Goal::Retirement => StrategyItem {
                coverage_type: coverage::ANNUITY_RETIREMENT.to_string(),
                recommended_sum_assured: 300_000.0,
                term_years: years,
                payment_mode: PaymentMode::Annual,
                beneficiary: beneficiary.to_string(),
                rationale: "Supplementary pension hedging longevity risk; prefer guaranteed \
                            payout annuities"
                    .to_string(),
            },
            // No derivation rule
            Goal::WealthLegacy => continue,
        };
        items.push(item);
    }
    items
}

fn base_purchase_plan() -> Vec<PurchaseStep> {
    vec![
        PurchaseStep {
            phase: Phase::Now,
            actions: vec![
                "Lock in medical and critical illness cover first to secure health status and rates"
                    .to_string(),
            ],
        },
        PurchaseStep {
            phase: Phase::SixMonths,
            actions: vec![
                "Top up income protection (term life, accident) and recheck the budget".to_string(),
            ],
        },
        PurchaseStep {
            phase: Phase::TwelveMonths,
            actions: vec![
                "Add education or retirement savings as income develops".to_string(),
            ],
        },
        PurchaseStep {
            phase: Phase::Upgrade,
            actions: vec![
                "Upgrade medical cover or add deductible plans while health allows".to_string(),
            ],
        },
    ]
}

pub fn baseline_renewal_claims() -> (Vec<String>, Vec<String>) {
    let renewal = vec![
        "Report changes in health checkups or disclosures promptly".to_string(),
        "Watch renewal terms and waiting periods to avoid lapses in cover".to_string(),
        "Keep a premium calendar so policies never terminate for missed payment".to_string(),
    ];
    let claims = vec![
        "Report a claim immediately after the event and keep all receipts".to_string(),
        "Confirm hospital and procedure coverage before treatment where possible".to_string(),
        "Prepare claim documents against the checklist and keep copies".to_string(),
    ];
    (renewal, claims)
}

/// Build the baseline recommendation for a profile. Pure and deterministic;
/// the two seeded warnings are NOT deduplicated here, that is the risk
/// stage's job.
pub fn synthesize(profile: &Profile, context_docs: &[String]) -> StrategyRecommendation {
    let items = infer_items_by_goal(profile);

    let policy_combo_explanation = "Medical reimbursement absorbs short-term high bills; \
        critical illness pays a lump sum for the recovery period; term life covers loss of \
        household income; accident cover fills sudden-event risk; education and retirement \
        savings carry the long-term goals. The pieces complement each other without \
        duplication or gaps."
        .to_string();

    let (renewal, claims) = baseline_renewal_claims();
    let mut renewal_and_claims = BTreeMap::new();
    renewal_and_claims.insert(RENEWAL_KEY.to_string(), renewal);
    renewal_and_claims.insert(CLAIMS_KEY.to_string(), claims);

    let risk_warnings = vec![
        RiskWarning::new(
            "health disclosure",
            Severity::Medium,
            "If any checkup in the last year was abnormal, assess underwriting feasibility first",
        ),
        RiskWarning::new(
            "budget control",
            Severity::Low,
            "Keep premiums under 10% of annual income and review them periodically",
        ),
    ];

    let references = if context_docs.is_empty() {
        None
    } else {
        Some(
            (0..context_docs.len().min(5))
                .map(|i| format!("KB:{}", i + 1))
                .collect(),
        )
    };

    StrategyRecommendation {
        items,
        purchase_plan: base_purchase_plan(),
        policy_combo_explanation,
        renewal_and_claims,
        risk_warnings,
        assumptions: Some(vec![
            "Sum assured and coverage completeness come first, budget second".to_string(),
            "If underwriting is restricted, substitute insurable products and reduce leverage"
                .to_string(),
        ]),
        references,
    }
}

/// Purchase-plan refinement: append the concrete follow-up action each dated
/// phase needs. Runs inside the Strategize stage after synthesis.
pub fn refine_purchase_plan(rec: &mut StrategyRecommendation) {
    for step in &mut rec.purchase_plan {
        match step.phase {
            Phase::Now => step.actions.push(
                "Confirm underwriting paperwork (checkup, questionnaire, medical history)"
                    .to_string(),
            ),
            Phase::SixMonths => step
                .actions
                .push("Review cash flow and premium affordability".to_string()),
            Phase::TwelveMonths => step.actions.push(
                "Reassess family structure changes (marriage, children, dependents)".to_string(),
            ),
            Phase::Upgrade => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_years_floor_at_ten() {
        assert_eq!(years_to_retirement(35), 30);
        assert_eq!(years_to_retirement(58), 10);
        assert_eq!(years_to_retirement(70), 10);
    }

    #[test]
    fn beneficiary_keys_off_child_tokens() {
        assert_eq!(
            default_beneficiary("married, one child"),
            "spouse and children per statutory share"
        );
        assert_eq!(
            default_beneficiary("single person"),
            "spouse or parents per statutory share"
        );
        // "person" must not match "son"
        assert_eq!(
            default_beneficiary("two persons"),
            "spouse or parents per statutory share"
        );
    }
}
