//! Unit tests for the heuristic synthesizer: determinism, fixed item
//! ordering, and the goal derivation rules.

use insura::models::{
    FinancialStatus, Gender, Goal, InsuredInfo, Phase, Profile, coverage,
};
use insura::store::demo_profile;
use insura::strategy::{refine_purchase_plan, synthesize};

fn profile_with(goals: Vec<Goal>, age: u32, annual_income: f64) -> Profile {
    Profile {
        insured: InsuredInfo {
            age,
            gender: Gender::Female,
            occupation: "accountant".to_string(),
            health_status: "good".to_string(),
            family_structure: "married, one child".to_string(),
            smoker: false,
            city: None,
        },
        finance: FinancialStatus {
            annual_income,
            liabilities: 0.0,
            assets: 0.0,
            monthly_budget_for_insurance: None,
        },
        goals,
        existing_policies: Vec::new(),
        knowledge_hints: None,
    }
}

#[test]
fn synthesizer_is_deterministic() {
    let profile = demo_profile();
    let a = synthesize(&profile, &[]);
    let b = synthesize(&profile, &[]);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn two_goal_scenario_derives_exactly_two_items() {
    let profile = profile_with(
        vec![Goal::IncomeProtection, Goal::MedicalExpense],
        35,
        300_000.0,
    );
    let rec = synthesize(&profile, &[]);

    assert_eq!(rec.items.len(), 2);
    let term_life = &rec.items[0];
    assert_eq!(term_life.coverage_type, coverage::TERM_LIFE);
    assert_eq!(term_life.recommended_sum_assured, 1_500_000.0);
    assert!(term_life.term_years >= 10);

    let medical = &rec.items[1];
    assert_eq!(medical.coverage_type, coverage::MEDICAL);
    assert_eq!(medical.recommended_sum_assured, 2_000_000.0);
    assert_eq!(medical.term_years, 1);
}

#[test]
fn item_order_ignores_profile_goal_order() {
    let forward = profile_with(
        vec![Goal::IncomeProtection, Goal::CriticalIllness, Goal::Retirement],
        40,
        500_000.0,
    );
    let reversed = profile_with(
        vec![Goal::Retirement, Goal::CriticalIllness, Goal::IncomeProtection],
        40,
        500_000.0,
    );
    let a = synthesize(&forward, &[]);
    let b = synthesize(&reversed, &[]);
    assert_eq!(a.items, b.items);
    assert_eq!(a.items[0].coverage_type, coverage::TERM_LIFE);
    assert_eq!(a.items[1].coverage_type, coverage::CRITICAL_ILLNESS);
    assert_eq!(a.items[2].coverage_type, coverage::ANNUITY_RETIREMENT);
}

#[test]
fn wealth_legacy_has_no_derivation_rule() {
    let profile = profile_with(vec![Goal::WealthLegacy], 45, 800_000.0);
    let rec = synthesize(&profile, &[]);
    assert!(rec.items.is_empty());
}

#[test]
fn sum_floors_apply_at_low_income() {
    let profile = profile_with(
        vec![Goal::IncomeProtection, Goal::CriticalIllness],
        30,
        50_000.0,
    );
    let rec = synthesize(&profile, &[]);
    // 5x income (250k) is under the 300k floor
    assert_eq!(rec.items[0].recommended_sum_assured, 300_000.0);
    assert_eq!(rec.items[1].recommended_sum_assured, 300_000.0);
}

#[test]
fn references_are_capped_at_five_opaque_tags() {
    let profile = demo_profile();
    let docs: Vec<String> = (0..7).map(|i| format!("doc {}", i)).collect();
    let rec = synthesize(&profile, &docs);
    assert_eq!(
        rec.references,
        Some(vec![
            "KB:1".to_string(),
            "KB:2".to_string(),
            "KB:3".to_string(),
            "KB:4".to_string(),
            "KB:5".to_string(),
        ])
    );

    let rec_no_ctx = synthesize(&profile, &[]);
    assert_eq!(rec_no_ctx.references, None);
}

#[test]
fn baseline_seeds_two_risk_warnings() {
    let rec = synthesize(&demo_profile(), &[]);
    assert_eq!(rec.risk_warnings.len(), 2);
    assert_eq!(rec.risk_warnings[0].segment, "health disclosure");
    assert_eq!(rec.risk_warnings[1].segment, "budget control");
}

#[test]
fn purchase_plan_has_four_fixed_phases() {
    let rec = synthesize(&demo_profile(), &[]);
    let phases: Vec<Phase> = rec.purchase_plan.iter().map(|s| s.phase).collect();
    assert_eq!(
        phases,
        vec![Phase::Now, Phase::SixMonths, Phase::TwelveMonths, Phase::Upgrade]
    );
}

#[test]
fn refinement_appends_followups_to_dated_phases() {
    let mut rec = synthesize(&demo_profile(), &[]);
    let upgrade_actions = rec.purchase_plan[3].actions.clone();
    refine_purchase_plan(&mut rec);

    assert_eq!(rec.purchase_plan[0].actions.len(), 2);
    assert_eq!(rec.purchase_plan[1].actions.len(), 2);
    assert_eq!(rec.purchase_plan[2].actions.len(), 2);
    assert_eq!(rec.purchase_plan[3].actions, upgrade_actions);
}
