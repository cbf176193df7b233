//! Compatibility rules.
//!
//! Three kinds of rules decide what may go where on the board:
//!
//! | Rule | Key | Scope |
//! |------|-----|-------|
//! | [`DropRule`] | row type | allow-list of an unsplit row |
//! | [`MagnetInteractionRule`] | ordered (source, target) pair | global attachment policy |
//! | [`BoxAttachmentRule`] | ordered pair, within one box | local override of the global policy |
//!
//! Direction matters for attachment rules: `operator → excavator` (an
//! operator attaches to an excavator) is a different rule from
//! `excavator → operator`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{ResourceType, RowType};

/// Global attachment policy between two resource types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagnetInteractionRule {
    /// Type of the resource being attached.
    pub source_type: ResourceType,
    /// Type of the resource it attaches to.
    pub target_type: ResourceType,
    /// Whether the attachment is permitted at all.
    pub can_attach: bool,
    /// Whether a target should carry at least one such attachment.
    ///
    /// Advisory: reported by the health analyzer, never enforced.
    pub is_required: bool,
    /// Maximum attachments of `source_type` on one target (0 = unlimited).
    pub max_count: u32,
}

/// Row-level allow-list used while a row is not split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropRule {
    pub row_type: RowType,
    pub allowed_types: BTreeSet<ResourceType>,
}

/// Box-local attachment override.
///
/// Both types must be allowed in the owning box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxAttachmentRule {
    pub source_type: ResourceType,
    pub target_type: ResourceType,
    pub can_attach: bool,
    /// Attach automatically when the source is dropped next to a target.
    pub is_auto_attach: bool,
    /// Higher priority wins when several rules cover the same pair.
    pub priority: i32,
}

impl MagnetInteractionRule {
    /// Creates an attachable, optional rule with unlimited count.
    pub fn new(source_type: ResourceType, target_type: ResourceType) -> Self {
        Self {
            source_type,
            target_type,
            can_attach: true,
            is_required: false,
            max_count: 0,
        }
    }

    /// Creates a rule that forbids the attachment.
    pub fn forbidden(source_type: ResourceType, target_type: ResourceType) -> Self {
        Self {
            can_attach: false,
            ..Self::new(source_type, target_type)
        }
    }

    /// Marks the attachment as required on every target.
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Sets the maximum count (0 = unlimited).
    pub fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = max_count;
        self
    }

    /// The ordered key of this rule.
    #[inline]
    pub fn key(&self) -> (ResourceType, ResourceType) {
        (self.source_type, self.target_type)
    }

    /// Maximum count, `None` when unlimited.
    #[inline]
    pub fn limit(&self) -> Option<u32> {
        (self.max_count > 0).then_some(self.max_count)
    }
}

impl DropRule {
    /// Creates a drop rule.
    pub fn new(row_type: RowType, allowed_types: impl IntoIterator<Item = ResourceType>) -> Self {
        Self {
            row_type,
            allowed_types: allowed_types.into_iter().collect(),
        }
    }

    /// Membership test. No wildcards, no type hierarchy.
    #[inline]
    pub fn allows(&self, resource_type: ResourceType) -> bool {
        self.allowed_types.contains(&resource_type)
    }
}

impl BoxAttachmentRule {
    /// Creates an attachable rule with priority 0.
    pub fn new(source_type: ResourceType, target_type: ResourceType) -> Self {
        Self {
            source_type,
            target_type,
            can_attach: true,
            is_auto_attach: false,
            priority: 0,
        }
    }

    /// Creates a rule that blocks the pair inside the box.
    pub fn blocked(source_type: ResourceType, target_type: ResourceType) -> Self {
        Self {
            can_attach: false,
            ..Self::new(source_type, target_type)
        }
    }

    /// Enables automatic attachment.
    pub fn auto_attach(mut self) -> Self {
        self.is_auto_attach = true;
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Whether the rule mentions `resource_type` on either side.
    #[inline]
    pub fn mentions(&self, resource_type: ResourceType) -> bool {
        self.source_type == resource_type || self.target_type == resource_type
    }
}
