use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::super::domain::{AdmissionPath, BatchKey};

/// Quota for one program: either a flat cap across the whole program or
/// per-path sub-quotas. In JSON a rule is a bare integer or a path -> integer
/// map.
///
/// A program with no entry at all is a distinct case from an explicit zero:
/// the engine treats the absent program as uncapped, so an administrator who
/// forgets a program silently admits every scored candidate for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuotaRule {
    Flat(u32),
    PerPath(BTreeMap<AdmissionPath, u32>),
}

/// Per-(period, batch) quota configuration. Authored by tenant
/// administration; read-only to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub period: String,
    pub batch: String,
    #[serde(default)]
    pub quotas: BTreeMap<String, QuotaRule>,
}

impl SelectionConfig {
    pub fn key(&self) -> BatchKey {
        BatchKey::new(self.period.clone(), self.batch.clone())
    }

    pub fn rule_for(&self, program: &str) -> Option<&QuotaRule> {
        self.quotas.get(program)
    }
}
