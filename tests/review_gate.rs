//! Completeness gate behavior, including the all-or-nothing renewal/claims
//! fill.

use insura::error::InsuraError;
use insura::models::{CLAIMS_KEY, RENEWAL_KEY};
use insura::review::{renewal_claims_tips, review};
use insura::store::demo_profile;
use insura::strategy::synthesize;

#[test]
fn accepts_a_fully_populated_recommendation() {
    let mut rec = synthesize(&demo_profile(), &[]);
    assert!(review(&mut rec).is_ok());
}

#[test]
fn rejects_empty_items() {
    let mut rec = synthesize(&demo_profile(), &[]);
    rec.items.clear();
    match review(&mut rec) {
        Err(InsuraError::Completeness { message }) => assert!(message.contains("items")),
        other => panic!("expected Completeness error, got {other:?}"),
    }
}

#[test]
fn rejects_empty_purchase_plan() {
    let mut rec = synthesize(&demo_profile(), &[]);
    rec.purchase_plan.clear();
    assert!(matches!(
        review(&mut rec),
        Err(InsuraError::Completeness { .. })
    ));
}

#[test]
fn rejects_blank_combo_explanation() {
    let mut rec = synthesize(&demo_profile(), &[]);
    rec.policy_combo_explanation = "   ".to_string();
    assert!(matches!(
        review(&mut rec),
        Err(InsuraError::Completeness { .. })
    ));
}

#[test]
fn missing_claims_replaces_both_tip_lists() {
    let mut rec = synthesize(&demo_profile(), &[]);
    let original_renewal = rec.renewal_and_claims.get(RENEWAL_KEY).cloned().unwrap();
    rec.renewal_and_claims.remove(CLAIMS_KEY);

    review(&mut rec).unwrap();

    let (canned_renewal, canned_claims) = renewal_claims_tips();
    assert_eq!(rec.renewal_and_claims.get(RENEWAL_KEY), Some(&canned_renewal));
    assert_eq!(rec.renewal_and_claims.get(CLAIMS_KEY), Some(&canned_claims));
    // the surviving side was replaced, not patched around
    assert_ne!(rec.renewal_and_claims.get(RENEWAL_KEY), Some(&original_renewal));
}

#[test]
fn empty_renewal_list_counts_as_missing() {
    let mut rec = synthesize(&demo_profile(), &[]);
    rec.renewal_and_claims
        .insert(RENEWAL_KEY.to_string(), Vec::new());

    review(&mut rec).unwrap();

    let (canned_renewal, canned_claims) = renewal_claims_tips();
    assert_eq!(rec.renewal_and_claims.get(RENEWAL_KEY), Some(&canned_renewal));
    assert_eq!(rec.renewal_and_claims.get(CLAIMS_KEY), Some(&canned_claims));
}

#[test]
fn populated_tip_lists_are_left_untouched() {
    let mut rec = synthesize(&demo_profile(), &[]);
    let before = rec.renewal_and_claims.clone();
    review(&mut rec).unwrap();
    assert_eq!(rec.renewal_and_claims, before);
}
