//! Review stage: fill missing renewal/claims tips, then gate the
//! recommendation on structural completeness.

use crate::error::{InsuraError, Result};
use crate::models::{CLAIMS_KEY, RENEWAL_KEY, StrategyRecommendation};

/// Canned tip set used when the draft arrives without renewal or claims
/// reminders.
pub fn renewal_claims_tips() -> (Vec<String>, Vec<String>) {
    let renewal = vec![
        "Confirm renewal terms with the insurer 30 days before expiry".to_string(),
        "Update the policy address and contact details as they change".to_string(),
        "Complete annual checkup and underwriting reviews on schedule".to_string(),
    ];
    let claims = vec![
        "Report within 48 hours of the event and keep imaging and receipts".to_string(),
        "Clear hospital transfers and special procedures with support first".to_string(),
        "Submit documents per the policy checklist and keep copies".to_string(),
    ];
    (renewal, claims)
}

/// Completeness gate. The renewal/claims fill is all-or-nothing: if either
/// side is missing or empty, both lists are replaced together.
pub fn review(rec: &mut StrategyRecommendation) -> Result<()> {
    let renewal_missing = rec
        .renewal_and_claims
        .get(RENEWAL_KEY)
        .is_none_or(|tips| tips.is_empty());
    let claims_missing = rec
        .renewal_and_claims
        .get(CLAIMS_KEY)
        .is_none_or(|tips| tips.is_empty());
    if renewal_missing || claims_missing {
        let (renewal, claims) = renewal_claims_tips();
        rec.renewal_and_claims.clear();
        rec.renewal_and_claims.insert(RENEWAL_KEY.to_string(), renewal);
        rec.renewal_and_claims.insert(CLAIMS_KEY.to_string(), claims);
    }

    if rec.items.is_empty() {
        return Err(InsuraError::Completeness {
            message: "strategy items must not be empty".to_string(),
        });
    }
    if rec.purchase_plan.is_empty() {
        return Err(InsuraError::Completeness {
            message: "purchase plan must not be empty".to_string(),
        });
    }
    if rec.policy_combo_explanation.trim().is_empty() {
        return Err(InsuraError::Completeness {
            message: "policy combo explanation must not be blank".to_string(),
        });
    }
    Ok(())
}
