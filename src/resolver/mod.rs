//! Attachment compatibility resolution.
//!
//! Decides whether a resource of one type may attach to a resource of
//! another type. The magnet rule table is a closed world: an ordered pair
//! without a rule never attaches.
//!
//! # Decision order
//!
//! | Step | Check | Outcome when it fails |
//! |------|-------|-----------------------|
//! | 1 | Rule exists for `(source, target)` | [`AttachmentReason::NoRule`] |
//! | 2 | `can_attach` | [`AttachmentReason::NotAttachable`] |
//! | 3 | `current < max_count` (when `max_count > 0`) | [`AttachmentReason::CapacityExceeded`] |
//!
//! `is_required` never blocks an attachment; it feeds
//! [`missing_required_attachments`](CompatibilityResolver::missing_required_attachments)
//! and the health analyzer.

mod ledger;

pub use ledger::{AssignmentLedger, Roster};

use crate::layout::JobRowBox;
use crate::models::{BoxAttachmentRule, MagnetInteractionRule, Resource, ResourceType};
use crate::rules::RuleStore;

/// Outcome of an attachment check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentDecision {
    pub eligible: bool,
    pub reason: AttachmentReason,
}

/// Why an attachment is or is not eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentReason {
    /// Eligible. `remaining` is `None` when unlimited.
    Eligible { remaining: Option<u32> },
    /// No rule for the ordered pair.
    NoRule,
    /// A rule exists but forbids the attachment.
    NotAttachable,
    /// A box-local rule forbids the attachment.
    BlockedInBox,
    /// The target already carries `max` attachments of the source type.
    CapacityExceeded { max: u32 },
    /// The source resource is already placed somewhere.
    SourceAlreadyAssigned,
    /// Source and target are the same resource.
    SameResource,
}

impl AttachmentDecision {
    fn eligible(remaining: Option<u32>) -> Self {
        Self {
            eligible: true,
            reason: AttachmentReason::Eligible { remaining },
        }
    }

    fn rejected(reason: AttachmentReason) -> Self {
        Self {
            eligible: false,
            reason,
        }
    }
}

/// Resolves attachments against a rule store.
#[derive(Debug, Clone, Copy)]
pub struct CompatibilityResolver<'a> {
    rules: &'a RuleStore,
}

impl<'a> CompatibilityResolver<'a> {
    pub fn new(rules: &'a RuleStore) -> Self {
        Self { rules }
    }

    /// Checks one attachment of `source` onto `target`.
    ///
    /// `current_attached_count` is the number of `source`-type resources
    /// already attached to the target resource. Whether the source resource
    /// is free is the caller's concern; see
    /// [`resolve_resources`](Self::resolve_resources).
    pub fn resolve_attachment(
        &self,
        source: ResourceType,
        target: ResourceType,
        current_attached_count: u32,
    ) -> AttachmentDecision {
        let Some(rule) = self.rules.magnet_rule(source, target) else {
            return AttachmentDecision::rejected(AttachmentReason::NoRule);
        };
        if !rule.can_attach {
            return AttachmentDecision::rejected(AttachmentReason::NotAttachable);
        }
        capacity_check(rule.limit(), current_attached_count)
    }

    /// Checks an attachment inside a box.
    ///
    /// A local rule for the pair (highest priority wins) decides whether the
    /// attachment is possible at all; capacity still comes from the global
    /// rule, unlimited when none exists. Without a local rule the global
    /// decision applies. Split boxes carry no local rules.
    pub fn resolve_in_box(
        &self,
        b: &JobRowBox,
        source: ResourceType,
        target: ResourceType,
        current_attached_count: u32,
    ) -> AttachmentDecision {
        let Some(local) = local_rule(b, source, target) else {
            return self.resolve_attachment(source, target, current_attached_count);
        };
        if !local.can_attach {
            return AttachmentDecision::rejected(AttachmentReason::BlockedInBox);
        }
        let limit = self
            .rules
            .magnet_rule(source, target)
            .and_then(MagnetInteractionRule::limit);
        capacity_check(limit, current_attached_count)
    }

    /// Types a `source` automatically attaches to inside a box, highest
    /// priority first.
    pub fn auto_attach_targets(&self, b: &JobRowBox, source: ResourceType) -> Vec<ResourceType> {
        let Some(rules) = b.rules() else {
            return Vec::new();
        };
        let mut candidates: Vec<&BoxAttachmentRule> = rules
            .attachment_rules
            .iter()
            .filter(|r| r.source_type == source && r.can_attach && r.is_auto_attach)
            .collect();
        candidates.sort_by(|x, y| y.priority.cmp(&x.priority));

        let mut targets = Vec::with_capacity(candidates.len());
        for rule in candidates {
            if !targets.contains(&rule.target_type) {
                targets.push(rule.target_type);
            }
        }
        targets
    }

    /// Source types whose rule marks them as required on `target`.
    pub fn required_sources(&self, target: ResourceType) -> Vec<ResourceType> {
        self.rules
            .rules_targeting(target)
            .filter(|r| r.is_required && r.can_attach)
            .map(|r| r.source_type)
            .collect()
    }

    /// Required source types with no attachment on the target resource.
    pub fn missing_required_attachments<L: AssignmentLedger + ?Sized>(
        &self,
        ledger: &L,
        target: &Resource,
    ) -> Vec<ResourceType> {
        self.required_sources(target.resource_type)
            .into_iter()
            .filter(|&source| ledger.attached_count(&target.id, source) == 0)
            .collect()
    }

    /// Checks attaching one concrete resource onto another.
    ///
    /// Rejects a source that already holds an assignment, then resolves
    /// with the ledger's current attachment count.
    pub fn resolve_resources<L: AssignmentLedger + ?Sized>(
        &self,
        ledger: &L,
        source: &Resource,
        target: &Resource,
    ) -> AttachmentDecision {
        if source.id == target.id {
            return AttachmentDecision::rejected(AttachmentReason::SameResource);
        }
        if ledger.is_assigned(&source.id) {
            return AttachmentDecision::rejected(AttachmentReason::SourceAlreadyAssigned);
        }
        let current = ledger.attached_count(&target.id, source.resource_type);
        self.resolve_attachment(source.resource_type, target.resource_type, current)
    }
}

fn local_rule(
    b: &JobRowBox,
    source: ResourceType,
    target: ResourceType,
) -> Option<&BoxAttachmentRule> {
    b.rules()?
        .attachment_rules
        .iter()
        .filter(|r| r.source_type == source && r.target_type == target)
        .max_by_key(|r| r.priority)
}

fn capacity_check(limit: Option<u32>, current: u32) -> AttachmentDecision {
    match limit {
        None => AttachmentDecision::eligible(None),
        Some(max) if current >= max => {
            AttachmentDecision::rejected(AttachmentReason::CapacityExceeded { max })
        }
        Some(max) => AttachmentDecision::eligible(Some(max - current)),
    }
}
