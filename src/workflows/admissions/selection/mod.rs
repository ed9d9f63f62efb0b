mod config;
mod ranking;

pub use config::{QuotaRule, SelectionConfig};

use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{Application, ApplicationId};

/// The accepted/rejected partition computed for one (period, batch).
///
/// The planner is pure: it never touches storage, so re-planning over
/// unchanged applications always yields the identical partition. Ids within
/// each side are ordered by program, then rank, so two runs compare equal
/// structurally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionPlan {
    pub accepted: Vec<ApplicationId>,
    pub rejected: Vec<ApplicationId>,
}

/// Quota-constrained, ranked selection over a whole batch.
pub struct SelectionEngine;

impl SelectionEngine {
    /// Partition candidates by program and admission path, rank each
    /// partition deterministically, and decide every application:
    ///
    /// - per-path quotas accept the top of each configured path and reject
    ///   everyone on a path the configuration does not name;
    /// - a flat quota ranks the whole program, ignoring path;
    /// - a program absent from the configuration is uncapped: scored
    ///   candidates are accepted, unscored ones rejected.
    pub fn plan(config: &SelectionConfig, applications: &[Application]) -> SelectionPlan {
        let mut by_program: BTreeMap<&str, Vec<&Application>> = BTreeMap::new();
        for application in applications {
            let program = application.major_choice.as_deref().unwrap_or_default();
            by_program.entry(program).or_default().push(application);
        }

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for (program, members) in by_program {
            match config.rule_for(program) {
                Some(QuotaRule::PerPath(path_quotas)) => {
                    for (path, quota) in path_quotas {
                        let pool: Vec<&Application> = members
                            .iter()
                            .copied()
                            .filter(|candidate| candidate.admission_path == Some(*path))
                            .collect();
                        let (top, rest) = ranking::take_top(pool, *quota as usize);
                        accepted.extend(top.iter().map(|candidate| candidate.id.clone()));
                        rejected.extend(rest.iter().map(|candidate| candidate.id.clone()));
                    }

                    // Coverage is explicit: a candidate on a path the map
                    // does not name is rejected outright.
                    let uncovered: Vec<&Application> = members
                        .iter()
                        .copied()
                        .filter(|candidate| {
                            candidate
                                .admission_path
                                .map(|path| !path_quotas.contains_key(&path))
                                .unwrap_or(true)
                        })
                        .collect();
                    if !uncovered.is_empty() {
                        tracing::warn!(
                            program,
                            count = uncovered.len(),
                            "rejecting candidates on paths the quota map does not cover"
                        );
                    }
                    rejected.extend(uncovered.iter().map(|candidate| candidate.id.clone()));
                }
                Some(QuotaRule::Flat(quota)) => {
                    let (top, rest) = ranking::take_top(members, *quota as usize);
                    accepted.extend(top.iter().map(|candidate| candidate.id.clone()));
                    rejected.extend(rest.iter().map(|candidate| candidate.id.clone()));
                }
                None => {
                    // No quota defined for this program: uncapped by policy.
                    for candidate in members {
                        if candidate.total_score.is_some() {
                            accepted.push(candidate.id.clone());
                        } else {
                            rejected.push(candidate.id.clone());
                        }
                    }
                }
            }
        }

        SelectionPlan { accepted, rejected }
    }
}
