//! Profile ingestion boundary. The real persistence layer lives outside
//! this crate; the pipeline only needs "a profile or a not-found signal",
//! which this trait captures. The in-memory store backs the demo and tests.

use crate::error::{InsuraError, Result};
use crate::models::{FinancialStatus, Gender, Goal, InsuredInfo, Profile};
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile by id. A missing profile is `NotFound`; the caller
    /// must not invoke any pipeline stage on that result.
    async fn fetch(&self, user_id: &str) -> Result<Profile>;
}

#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: HashMap<String, Profile>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user_id: impl Into<String>, profile: Profile) -> Result<()> {
        profile.validate()?;
        self.profiles.insert(user_id.into(), profile);
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn fetch(&self, user_id: &str) -> Result<Profile> {
        self.profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| InsuraError::NotFound {
                user_id: user_id.to_string(),
            })
    }
}

/// Canonical demo profile used by the CLI and the test suite.
pub fn demo_profile() -> Profile {
    Profile {
        insured: InsuredInfo {
            age: 35,
            gender: Gender::Male,
            occupation: "software engineer".to_string(),
            health_status: "good".to_string(),
            family_structure: "married, one child".to_string(),
            smoker: false,
            city: Some("Shanghai".to_string()),
        },
        finance: FinancialStatus {
            annual_income: 300_000.0,
            liabilities: 200_000.0,
            assets: 1_500_000.0,
            monthly_budget_for_insurance: Some(2_000.0),
        },
        goals: vec![
            Goal::IncomeProtection,
            Goal::MedicalExpense,
            Goal::CriticalIllness,
            Goal::EducationFund,
        ],
        existing_policies: Vec::new(),
        knowledge_hints: Some(vec![
            "critical illness".to_string(),
            "medical".to_string(),
            "income protection".to_string(),
        ]),
    }
}
