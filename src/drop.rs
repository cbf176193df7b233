//! Drop validation.
//!
//! Decides whether a resource type may be dropped onto a row or box.
//! An unsplit row consults the row type's drop rule. A leaf box consults
//! only its own allow-list; the row's drop rule no longer applies once the
//! row is split. A split box accepts nothing, its children do.

use std::collections::BTreeSet;

use crate::layout::{BoxPath, JobRowBox, JobRowConfig};
use crate::models::{ResourceType, RowType};
use crate::rules::RuleStore;

/// Where a magnet is being dropped.
#[derive(Debug, Clone, Copy)]
pub enum DropTarget<'a> {
    /// An unsplit row.
    Row(RowType),
    /// A box of a split row.
    Box(&'a JobRowBox),
}

/// Outcome of a capacity-aware drop check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropDecision {
    /// Accepted. `remaining` is `None` when unlimited.
    Allowed { remaining: Option<u32> },
    /// The type is not accepted here.
    NotAllowed,
    /// The box already holds `max_count` resources.
    Full { max_count: u32 },
}

impl DropDecision {
    #[inline]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Validates drops against the drop table and box allow-lists.
#[derive(Debug, Clone, Copy)]
pub struct DropValidator<'a> {
    rules: &'a RuleStore,
}

impl<'a> DropValidator<'a> {
    pub fn new(rules: &'a RuleStore) -> Self {
        Self { rules }
    }

    /// Membership check. No wildcards, no type hierarchy.
    pub fn is_allowed(&self, target: DropTarget<'_>, resource_type: ResourceType) -> bool {
        match target {
            DropTarget::Row(row_type) => self
                .rules
                .drop_rule_entry(row_type)
                .is_some_and(|rule| rule.allows(resource_type)),
            DropTarget::Box(b) => b.allows(resource_type),
        }
    }

    /// Types the target accepts.
    pub fn allowed_types(&self, target: DropTarget<'_>) -> BTreeSet<ResourceType> {
        match target {
            DropTarget::Row(row_type) => self.rules.drop_rule(row_type),
            DropTarget::Box(b) => b
                .rules()
                .map(|r| r.allowed_types.clone())
                .unwrap_or_default(),
        }
    }

    /// Membership plus box capacity (`max_count` 0 = unlimited).
    ///
    /// Rows carry no capacity here; job-type row limits are applied by the
    /// caller that knows the job type.
    pub fn check_drop(
        &self,
        target: DropTarget<'_>,
        resource_type: ResourceType,
        current_count: u32,
    ) -> DropDecision {
        if !self.is_allowed(target, resource_type) {
            return DropDecision::NotAllowed;
        }
        let max_count = match target {
            DropTarget::Row(_) => 0,
            DropTarget::Box(b) => b.max_count,
        };
        if max_count == 0 {
            DropDecision::Allowed { remaining: None }
        } else if current_count >= max_count {
            DropDecision::Full { max_count }
        } else {
            DropDecision::Allowed {
                remaining: Some(max_count - current_count),
            }
        }
    }

    /// Resolves the target from a row layout, then checks membership.
    ///
    /// Unsplit rows use the row's drop rule and ignore `path`. Split rows
    /// need a path to a box; a missing or dangling path accepts nothing.
    pub fn is_allowed_at(
        &self,
        config: &JobRowConfig,
        path: Option<&BoxPath>,
        resource_type: ResourceType,
    ) -> bool {
        if !config.is_split() {
            return self.is_allowed(DropTarget::Row(config.row_type), resource_type);
        }
        path.and_then(|p| config.box_at(p))
            .is_some_and(|b| self.is_allowed(DropTarget::Box(b), resource_type))
    }
}
