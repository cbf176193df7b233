//! Structural validation of board configuration.
//!
//! Checks integrity of layouts, job types, and rule tables before they are
//! stored. Detects:
//! - Duplicate IDs (boxes within a row, job types)
//! - Resource types allowed in more than one box of a row
//! - Box attachment rules that reach outside the box's allow-list
//! - Required types that are not allowed
//! - Contradictory magnet rules (required but not attachable)
//! - Attachment cycles (a type that can transitively attach to itself)
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{HashMap, HashSet};

use crate::layout::JobRowConfig;
use crate::models::{join_types, JobTypeConfiguration, ResourceType};
use crate::rules::RuleStore;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A resource type is allowed in more than one box of a row.
    DuplicateTypeAssignment,
    /// A box attachment rule mentions a type the box does not allow.
    AttachmentRuleOutOfScope,
    /// A required resource type is not in the allowed set.
    RequiredNotAllowed,
    /// A job type lists the same row type twice.
    DuplicateRow,
    /// A magnet rule is required but forbids attaching.
    ContradictoryRule,
    /// Attachment rules form a cycle.
    CyclicAttachment,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates one row layout.
///
/// Checks:
/// 1. No duplicate box IDs anywhere in the tree
/// 2. Each resource type allowed in at most one leaf
/// 3. Every leaf's attachment rules stay within its allow-list
pub fn validate_row_layout(config: &JobRowConfig) -> ValidationResult {
    let mut errors = Vec::new();

    let mut ids = HashSet::new();
    let mut stack: Vec<_> = config.boxes().iter().collect();
    while let Some(b) = stack.pop() {
        if !ids.insert(b.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!(
                    "Duplicate box ID '{}' in row {} of job '{}'",
                    b.id, config.row_type, config.job_id
                ),
            ));
        }
        if let Some(children) = b.sub_boxes() {
            stack.extend(children.iter());
        }
    }

    let mut owner: HashMap<ResourceType, &str> = HashMap::new();
    for (path, leaf) in config.leaves() {
        let Some(rules) = leaf.rules() else { continue };
        for t in &rules.allowed_types {
            if let Some(first) = owner.insert(*t, leaf.id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateTypeAssignment,
                    format!(
                        "Type '{}' is allowed in both box '{}' and box '{}' (at {})",
                        t, first, leaf.id, path
                    ),
                ));
            }
        }
        for rule in rules.out_of_scope_rules() {
            errors.push(ValidationError::new(
                ValidationErrorKind::AttachmentRuleOutOfScope,
                format!(
                    "Box '{}' has rule {} -> {} outside its allowed types",
                    leaf.id, rule.source_type, rule.target_type
                ),
            ));
        }
    }

    finish(errors)
}

/// Validates a job-type configuration set.
///
/// Checks:
/// 1. No duplicate job-type IDs
/// 2. No row type listed twice in one configuration
/// 3. `required ⊆ allowed` on every row
pub fn validate_job_types(configs: &[JobTypeConfiguration]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for config in configs {
        if !ids.insert(config.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate job type ID: {}", config.id),
            ));
        }

        let mut rows = HashSet::new();
        for row in &config.default_rows {
            if !rows.insert(row.row_type) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateRow,
                    format!("Job type '{}' lists row {} twice", config.id, row.row_type),
                ));
            }
            let missing = row.required_not_allowed();
            if !missing.is_empty() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::RequiredNotAllowed,
                    format!(
                        "Job type '{}' row {} requires {} without allowing it",
                        config.id,
                        row.row_type,
                        join_types(&missing)
                    ),
                ));
            }
        }
    }

    finish(errors)
}

/// Validates the magnet rule table.
///
/// Checks:
/// 1. No rule is required while forbidding the attachment
/// 2. No attachment cycles among attachable rules
pub fn validate_magnet_rules(rules: &RuleStore) -> ValidationResult {
    let mut errors = Vec::new();

    for rule in rules.magnet_rules() {
        if rule.is_required && !rule.can_attach {
            errors.push(ValidationError::new(
                ValidationErrorKind::ContradictoryRule,
                format!(
                    "Rule {} -> {} is required but cannot attach",
                    rule.source_type, rule.target_type
                ),
            ));
        }
    }

    if let Some(cycle_err) = detect_cycles(rules) {
        errors.push(cycle_err);
    }

    finish(errors)
}

/// Joins error messages into one line.
pub(crate) fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

fn finish(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects cycles in the attachment graph using DFS.
///
/// Nodes are resource types, edges run source → target for every
/// attachable rule. A back-edge means some type could end up attached,
/// directly or through a chain, to itself.
fn detect_cycles(rules: &RuleStore) -> Option<ValidationError> {
    let mut adj: HashMap<ResourceType, Vec<ResourceType>> = HashMap::new();
    for rule in rules.magnet_rules().filter(|r| r.can_attach) {
        adj.entry(rule.source_type).or_default().push(rule.target_type);
    }

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for node in ResourceType::ALL {
        if !visited.contains(&node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicAttachment,
                format!("Attachment cycle detected involving type '{node}'"),
            ));
        }
    }

    None
}

fn has_cycle_dfs(
    node: ResourceType,
    adj: &HashMap<ResourceType, Vec<ResourceType>>,
    visited: &mut HashSet<ResourceType>,
    in_stack: &mut HashSet<ResourceType>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(&node) {
        for &next in neighbors {
            if in_stack.contains(&next) {
                return true; // Back edge → cycle
            }
            if !visited.contains(&next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(&node);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{JobRowBox, SubBoxes};
    use crate::models::{
        standard_job_types, BoxAttachmentRule, JobRowConfiguration, MagnetInteractionRule,
        RowType,
    };

    fn row(boxes: Vec<JobRowBox>) -> JobRowConfig {
        JobRowConfig::with_boxes("J1", RowType::Equipment, boxes).unwrap()
    }

    #[test]
    fn test_valid_layout() {
        let config = row(vec![
            JobRowBox::leaf("a", "Equipment", 10)
                .with_allowed_types([ResourceType::Paver, ResourceType::Operator])
                .with_attachment_rule(BoxAttachmentRule::new(
                    ResourceType::Operator,
                    ResourceType::Paver,
                )),
            JobRowBox::leaf("b", "Crew", 10).with_allowed_types([ResourceType::Laborer]),
        ]);
        assert!(validate_row_layout(&config).is_ok());
        assert!(validate_row_layout(&JobRowConfig::new("J1", RowType::Crew)).is_ok());
    }

    #[test]
    fn test_duplicate_box_id_nested() {
        let config = row(vec![
            JobRowBox::leaf("a", "A", 1),
            JobRowBox::split(
                "b",
                "B",
                2,
                SubBoxes::pair(JobRowBox::leaf("a", "Inner", 1), JobRowBox::leaf("c", "C", 1)),
            ),
        ]);
        let errors = validate_row_layout(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("'a'")));
    }

    #[test]
    fn test_type_in_two_leaves() {
        let config = row(vec![
            JobRowBox::leaf("a", "A", 1).with_allowed_types([ResourceType::Operator]),
            JobRowBox::split(
                "b",
                "B",
                2,
                SubBoxes::pair(
                    JobRowBox::leaf("b1", "B1", 1).with_allowed_types([ResourceType::Operator]),
                    JobRowBox::leaf("b2", "B2", 1),
                ),
            ),
        ]);
        let errors = validate_row_layout(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateTypeAssignment));
    }

    #[test]
    fn test_rule_out_of_scope() {
        let config = row(vec![JobRowBox::leaf("a", "A", 1)
            .with_allowed_types([ResourceType::Operator])
            .with_attachment_rule(BoxAttachmentRule::new(
                ResourceType::Operator,
                ResourceType::Roller,
            ))]);
        let errors = validate_row_layout(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::AttachmentRuleOutOfScope);
    }

    #[test]
    fn test_job_types() {
        assert!(validate_job_types(&standard_job_types()).is_ok());

        let mut broken = JobRowConfiguration::new(RowType::Crew).allowing([ResourceType::Laborer]);
        broken.required_resources.insert(ResourceType::Foreman);
        let configs = vec![
            JobTypeConfiguration::new("x", "X")
                .with_row(broken)
                .with_row(JobRowConfiguration::new(RowType::Crew)),
            JobTypeConfiguration::new("x", "X again"),
        ];
        let errors = validate_job_types(&configs).unwrap_err();
        let kinds: Vec<_> = errors.iter().map(|e| e.kind.clone()).collect();
        assert!(kinds.contains(&ValidationErrorKind::DuplicateId));
        assert!(kinds.contains(&ValidationErrorKind::DuplicateRow));
        assert!(kinds.contains(&ValidationErrorKind::RequiredNotAllowed));
    }

    #[test]
    fn test_default_magnet_rules_valid() {
        assert!(validate_magnet_rules(&RuleStore::with_defaults()).is_ok());
    }

    #[test]
    fn test_contradictory_rule() {
        let mut rule = MagnetInteractionRule::forbidden(ResourceType::Driver, ResourceType::Truck);
        rule.is_required = true;
        let store = RuleStore::new().with_magnet_rule(rule);
        let errors = validate_magnet_rules(&store).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::ContradictoryRule);
    }

    #[test]
    fn test_attachment_cycle() {
        // operator → excavator → truck → operator
        let store = RuleStore::new()
            .with_magnet_rule(MagnetInteractionRule::new(
                ResourceType::Operator,
                ResourceType::Excavator,
            ))
            .with_magnet_rule(MagnetInteractionRule::new(
                ResourceType::Excavator,
                ResourceType::Truck,
            ))
            .with_magnet_rule(MagnetInteractionRule::new(
                ResourceType::Truck,
                ResourceType::Operator,
            ));
        let errors = validate_magnet_rules(&store).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::CyclicAttachment));
    }

    #[test]
    fn test_forbidden_rules_do_not_form_cycles() {
        let store = RuleStore::new()
            .with_magnet_rule(MagnetInteractionRule::new(
                ResourceType::Excavator,
                ResourceType::Truck,
            ))
            .with_magnet_rule(MagnetInteractionRule::forbidden(
                ResourceType::Truck,
                ResourceType::Excavator,
            ));
        assert!(validate_magnet_rules(&store).is_ok());
    }
}
