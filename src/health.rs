//! Configuration health analysis.
//!
//! Scans job-type configurations against the live resource inventory and
//! the current assignments. Read-only: the report describes gaps, it never
//! blocks or repairs anything.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total rules | One per required type of each enabled row |
//! | Coverage | Rules with at least one inventory resource ÷ total (1.0 when empty) |
//! | Missing types | Required types with no inventory resource |
//! | Issues | Idle active jobs, plus rule-level findings |

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    join_types, Assignment, Job, JobTypeConfiguration, Resource, ResourceType, RowType,
};
use crate::rules::RuleStore;

/// Configuration health summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Required-type rules across enabled rows.
    pub total_rules: usize,
    /// Rules with at least one matching resource.
    pub satisfied_rules: usize,
    /// `satisfied_rules / total_rules` (0.0..=1.0).
    pub coverage: f64,
    /// Required types with no resource in the inventory.
    pub missing_required_types: BTreeSet<ResourceType>,
    /// Operational and configuration findings.
    pub issues: Vec<HealthIssue>,
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HealthIssue {
    /// An active job has no assignments.
    #[serde(rename_all = "camelCase")]
    IdleJob { job_id: String, job_name: String },
    /// A job type's row requires a type that has no resource.
    #[serde(rename_all = "camelCase")]
    UnstaffedRow {
        job_type_id: String,
        row_type: RowType,
        resource_type: ResourceType,
    },
    /// A required attachment whose source type has no resource.
    #[serde(rename_all = "camelCase")]
    UnfillableAttachment {
        source_type: ResourceType,
        target_type: ResourceType,
    },
    /// A row requires types it does not allow.
    #[serde(rename_all = "camelCase")]
    RequiredNotAllowed {
        job_type_id: String,
        row_type: RowType,
        resource_types: BTreeSet<ResourceType>,
    },
}

impl fmt::Display for HealthIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdleJob { job_id, job_name } => {
                write!(f, "Active job '{job_name}' ({job_id}) has no assigned resources")
            }
            Self::UnstaffedRow {
                job_type_id,
                row_type,
                resource_type,
            } => write!(
                f,
                "Job type '{job_type_id}' row {row_type} requires {} but none exist",
                resource_type.display_name()
            ),
            Self::UnfillableAttachment {
                source_type,
                target_type,
            } => write!(
                f,
                "Every {} needs a {} attached but none exist",
                target_type.display_name(),
                source_type.display_name()
            ),
            Self::RequiredNotAllowed {
                job_type_id,
                row_type,
                resource_types,
            } => write!(
                f,
                "Job type '{job_type_id}' row {row_type} requires {} without allowing it",
                join_types(resource_types)
            ),
        }
    }
}

impl HealthReport {
    /// Analyzes job types against the inventory and assignments.
    ///
    /// # Arguments
    /// * `configs` - Job-type configurations; only enabled rows count.
    /// * `inventory` - Every resource available to the board.
    /// * `jobs` - Jobs on the board; only active ones are checked for staffing.
    /// * `assignments` - Current placements.
    pub fn analyze(
        configs: &[JobTypeConfiguration],
        inventory: &[Resource],
        jobs: &[Job],
        assignments: &[Assignment],
    ) -> Self {
        let available: HashSet<ResourceType> =
            inventory.iter().map(|r| r.resource_type).collect();

        let mut total_rules = 0;
        let mut satisfied_rules = 0;
        let mut missing_required_types = BTreeSet::new();
        let mut issues = Vec::new();

        for config in configs {
            for row in config.enabled_rows() {
                for &required in &row.required_resources {
                    total_rules += 1;
                    if available.contains(&required) {
                        satisfied_rules += 1;
                    } else {
                        missing_required_types.insert(required);
                        issues.push(HealthIssue::UnstaffedRow {
                            job_type_id: config.id.clone(),
                            row_type: row.row_type,
                            resource_type: required,
                        });
                    }
                }
            }
        }

        let staffed: HashSet<&str> = assignments.iter().map(|a| a.job_id.as_str()).collect();
        for job in jobs.iter().filter(|j| j.is_active()) {
            if !staffed.contains(job.id.as_str()) {
                issues.push(HealthIssue::IdleJob {
                    job_id: job.id.clone(),
                    job_name: job.name.clone(),
                });
            }
        }

        let coverage = if total_rules == 0 {
            1.0
        } else {
            satisfied_rules as f64 / total_rules as f64
        };

        debug!(
            total_rules,
            satisfied_rules,
            coverage,
            issues = issues.len(),
            "analyzed configuration health"
        );

        Self {
            total_rules,
            satisfied_rules,
            coverage,
            missing_required_types,
            issues,
        }
    }

    /// [`analyze`](Self::analyze) plus rule-level findings.
    ///
    /// Adds required magnet attachments whose source type has no resource
    /// while the target type does, and rows whose required types are not
    /// all allowed.
    pub fn analyze_with_rules(
        configs: &[JobTypeConfiguration],
        rules: &RuleStore,
        inventory: &[Resource],
        jobs: &[Job],
        assignments: &[Assignment],
    ) -> Self {
        let mut report = Self::analyze(configs, inventory, jobs, assignments);
        let available: HashSet<ResourceType> =
            inventory.iter().map(|r| r.resource_type).collect();

        for rule in rules.magnet_rules() {
            if rule.is_required
                && rule.can_attach
                && available.contains(&rule.target_type)
                && !available.contains(&rule.source_type)
            {
                report.issues.push(HealthIssue::UnfillableAttachment {
                    source_type: rule.source_type,
                    target_type: rule.target_type,
                });
            }
        }

        for config in configs {
            for row in &config.default_rows {
                let missing = row.required_not_allowed();
                if !missing.is_empty() {
                    report.issues.push(HealthIssue::RequiredNotAllowed {
                        job_type_id: config.id.clone(),
                        row_type: row.row_type,
                        resource_types: missing,
                    });
                }
            }
        }

        report
    }

    /// Whether every required type is covered and nothing was flagged.
    pub fn is_healthy(&self) -> bool {
        self.missing_required_types.is_empty() && self.issues.is_empty()
    }

    /// Issues as display strings.
    pub fn issue_messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}
