//! Path-addressed layout mutations.
//!
//! Every operation reads the current [`JobRowConfig`] and returns a new
//! snapshot wrapped in a [`MutationOutcome`]; the input is never touched.
//! Paths that do not resolve, already-split boxes, and similar cases come
//! back as [`MutationOutcome::Unchanged`] with the reason, and the
//! returned config is deep-equal to the input. Only invariant violations
//! are errors.
//!
//! # Resource-type uniqueness
//! A resource type is allowed in at most one leaf per row, across every
//! nesting level. Giving a leaf a set of allowed types removes those types
//! (and the local attachment rules mentioning them) from every other leaf
//! of the row.
//!
//! # Complexity
//! Path resolution is O(depth). Building the new snapshot clones the row.

use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

use super::tree::{BoxKind, BoxPath, BoxRules, JobRowBox, JobRowConfig, RowLayout, SubBoxes};
use super::LayoutSettings;
use crate::error::{BoardError, BoardResult};
use crate::models::{BoxAttachmentRule, ResourceCategory, ResourceType};

/// Result of a layout mutation.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The mutation produced a new snapshot (revision bumped).
    Applied(JobRowConfig),
    /// Nothing changed; `config` equals the input.
    Unchanged {
        config: JobRowConfig,
        reason: NoOpReason,
    },
}

/// Why a mutation left the tree unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoOpReason {
    /// The path does not resolve to a box.
    InvalidPath(BoxPath),
    /// The row or box is already split.
    AlreadySplit,
    /// The row or box is not split.
    NotSplit,
    /// Removing the box would leave a split row empty.
    LastBox,
    /// Box index past the end of the row.
    IndexOutOfRange { index: usize, len: usize },
    /// The update sets no field.
    EmptyUpdate,
    /// The update matches the current values.
    NoChange,
}

/// Allow-lists given to the two boxes of a row split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitPartition {
    /// Both boxes start empty.
    #[default]
    Empty,
    /// First box takes equipment and vehicles, second box takes personnel.
    ByCategory,
}

/// Partial update of a box. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxUpdate {
    pub name: Option<String>,
    pub allowed_types: Option<BTreeSet<ResourceType>>,
    pub max_count: Option<u32>,
    pub attachment_rules: Option<Vec<BoxAttachmentRule>>,
}

/// Applies layout mutations with configured defaults.
#[derive(Debug, Clone, Default)]
pub struct LayoutEditor {
    settings: LayoutSettings,
}

impl MutationOutcome {
    /// Whether a new snapshot was produced.
    #[inline]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// The resulting config (new or unchanged).
    pub fn config(&self) -> &JobRowConfig {
        match self {
            Self::Applied(config) | Self::Unchanged { config, .. } => config,
        }
    }

    /// Consumes the outcome, returning the resulting config.
    pub fn into_config(self) -> JobRowConfig {
        match self {
            Self::Applied(config) | Self::Unchanged { config, .. } => config,
        }
    }

    /// The no-op reason, if nothing changed.
    pub fn reason(&self) -> Option<&NoOpReason> {
        match self {
            Self::Applied(_) => None,
            Self::Unchanged { reason, .. } => Some(reason),
        }
    }
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPath(path) => write!(f, "no box at path {path}"),
            Self::AlreadySplit => f.write_str("already split"),
            Self::NotSplit => f.write_str("not split"),
            Self::LastBox => f.write_str("cannot remove the last box"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "box index {index} out of range ({len} boxes)")
            }
            Self::EmptyUpdate => f.write_str("empty update"),
            Self::NoChange => f.write_str("no change"),
        }
    }
}

impl BoxUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn allowed_types(mut self, types: impl IntoIterator<Item = ResourceType>) -> Self {
        self.allowed_types = Some(types.into_iter().collect());
        self
    }

    pub fn max_count(mut self, max_count: u32) -> Self {
        self.max_count = Some(max_count);
        self
    }

    pub fn attachment_rules(mut self, rules: Vec<BoxAttachmentRule>) -> Self {
        self.attachment_rules = Some(rules);
        self
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.max_count.is_none() && !self.touches_leaf_data()
    }

    fn touches_leaf_data(&self) -> bool {
        self.allowed_types.is_some() || self.attachment_rules.is_some()
    }
}

impl LayoutEditor {
    /// Creates an editor with the given settings.
    pub fn new(settings: LayoutSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// Splits an unsplit row into two boxes.
    pub fn split_row(
        &self,
        config: &JobRowConfig,
        first_name: impl Into<String>,
        second_name: impl Into<String>,
        partition: SplitPartition,
    ) -> MutationOutcome {
        if config.is_split() {
            return unchanged(config, NoOpReason::AlreadySplit, "split_row");
        }
        let max = self.settings.split_row_max_count;
        let mut first = JobRowBox::leaf(new_box_id(), first_name, max);
        let mut second = JobRowBox::leaf(new_box_id(), second_name, max);
        if partition == SplitPartition::ByCategory {
            first = first.with_allowed_types(
                ResourceCategory::Equipment
                    .types()
                    .chain(ResourceCategory::Vehicle.types()),
            );
            second = second.with_allowed_types(ResourceCategory::Personnel.types());
        }

        let mut next = config.clone();
        next.layout = RowLayout::Split(SubBoxes::pair(first, second));
        applied(next, "split_row", None)
    }

    /// Collapses a split row, discarding every box.
    pub fn unsplit_row(&self, config: &JobRowConfig) -> MutationOutcome {
        if !config.is_split() {
            return unchanged(config, NoOpReason::NotSplit, "unsplit_row");
        }
        let mut next = config.clone();
        next.layout = RowLayout::Unsplit;
        applied(next, "unsplit_row", None)
    }

    /// Appends an empty top-level box to a split row.
    pub fn add_box(&self, config: &JobRowConfig, name: impl Into<String>) -> MutationOutcome {
        let mut next = config.clone();
        let RowLayout::Split(boxes) = &mut next.layout else {
            return unchanged(config, NoOpReason::NotSplit, "add_box");
        };
        boxes.push(JobRowBox::leaf(
            new_box_id(),
            name,
            self.settings.new_box_max_count,
        ));
        applied(next, "add_box", None)
    }

    /// Removes a top-level box. A split row always keeps at least one.
    pub fn remove_box(&self, config: &JobRowConfig, index: usize) -> MutationOutcome {
        let mut next = config.clone();
        let RowLayout::Split(boxes) = &mut next.layout else {
            return unchanged(config, NoOpReason::NotSplit, "remove_box");
        };
        let len = boxes.len();
        if index >= len {
            return unchanged(
                config,
                NoOpReason::IndexOutOfRange { index, len },
                "remove_box",
            );
        }
        if boxes.remove(index).is_none() {
            return unchanged(config, NoOpReason::LastBox, "remove_box");
        }
        applied(next, "remove_box", None)
    }

    /// Splits the leaf at `path` into two empty children.
    ///
    /// The children share the parent's `max_count`: the first receives
    /// `ceil(N/2)`, the second `floor(N/2)`. The parent's allow-list and
    /// rules are discarded.
    pub fn split_box(&self, config: &JobRowConfig, path: &BoxPath) -> MutationOutcome {
        let mut next = config.clone();
        let Some(node) = next.box_at_mut(path) else {
            return unchanged(config, NoOpReason::InvalidPath(path.clone()), "split_box");
        };
        if node.is_split() {
            return unchanged(config, NoOpReason::AlreadySplit, "split_box");
        }
        let n = node.max_count;
        let left = JobRowBox::leaf(new_box_id(), &*self.settings.left_box_name, n - n / 2);
        let right = JobRowBox::leaf(new_box_id(), &*self.settings.right_box_name, n / 2);
        node.kind = BoxKind::Split(SubBoxes::pair(left, right));
        applied(next, "split_box", Some(path))
    }

    /// Collapses the split box at `path` into an empty leaf.
    pub fn unsplit_box(&self, config: &JobRowConfig, path: &BoxPath) -> MutationOutcome {
        let mut next = config.clone();
        let Some(node) = next.box_at_mut(path) else {
            return unchanged(config, NoOpReason::InvalidPath(path.clone()), "unsplit_box");
        };
        if !node.is_split() {
            return unchanged(config, NoOpReason::NotSplit, "unsplit_box");
        }
        node.kind = BoxKind::Leaf(BoxRules::default());
        applied(next, "unsplit_box", Some(path))
    }

    /// Applies a partial update to the box at `path`.
    ///
    /// # Errors
    /// [`BoardError::InvariantViolation`] when the update sets an allow-list
    /// or rules on a split box, or supplies attachment rules that mention a
    /// type outside the box's (resulting) allow-list.
    ///
    /// Changing the allow-list alone drops existing rules that fall out of
    /// scope and strips the new types from every other leaf of the row.
    pub fn update_box(
        &self,
        config: &JobRowConfig,
        path: &BoxPath,
        update: BoxUpdate,
    ) -> BoardResult<MutationOutcome> {
        let Some(target) = config.box_at(path) else {
            return Ok(unchanged(
                config,
                NoOpReason::InvalidPath(path.clone()),
                "update_box",
            ));
        };
        if update.is_empty() {
            return Ok(unchanged(config, NoOpReason::EmptyUpdate, "update_box"));
        }

        let leaf_rules = match target.rules() {
            Some(current) => Some(updated_rules(current, &update, path)?),
            None if update.touches_leaf_data() => {
                return Err(BoardError::InvariantViolation(format!(
                    "box '{}' at {path} is split; its sub-boxes own the allow-list",
                    target.id
                )));
            }
            None => None,
        };

        let mut next = config.clone();
        if let Some(types) = &update.allowed_types {
            next.for_each_leaf_mut(|rules| rules.strip(types));
        }
        let Some(node) = next.box_at_mut(path) else {
            return Ok(unchanged(
                config,
                NoOpReason::InvalidPath(path.clone()),
                "update_box",
            ));
        };
        if let Some(name) = update.name {
            node.name = name;
        }
        if let Some(max_count) = update.max_count {
            node.max_count = max_count;
        }
        if let Some(rules) = leaf_rules {
            node.kind = BoxKind::Leaf(rules);
        }

        if next == *config {
            return Ok(unchanged(config, NoOpReason::NoChange, "update_box"));
        }
        Ok(applied(next, "update_box", Some(path)))
    }
}

/// Computes a leaf's rules after `update`.
fn updated_rules(current: &BoxRules, update: &BoxUpdate, path: &BoxPath) -> BoardResult<BoxRules> {
    let allowed = update
        .allowed_types
        .clone()
        .unwrap_or_else(|| current.allowed_types.clone());

    let attachment_rules = match &update.attachment_rules {
        Some(rules) => {
            let candidate = BoxRules::new(allowed.clone(), rules.clone());
            if let Some(bad) = candidate.out_of_scope_rules().next() {
                return Err(BoardError::InvariantViolation(format!(
                    "attachment rule {} -> {} at {path} mentions a type the box does not allow",
                    bad.source_type, bad.target_type
                )));
            }
            rules.clone()
        }
        None => current
            .attachment_rules
            .iter()
            .filter(|r| allowed.contains(&r.source_type) && allowed.contains(&r.target_type))
            .cloned()
            .collect(),
    };

    Ok(BoxRules::new(allowed, attachment_rules))
}

fn new_box_id() -> String {
    format!("box-{:016x}", rand::random::<u64>())
}

fn applied(mut next: JobRowConfig, op: &'static str, path: Option<&BoxPath>) -> MutationOutcome {
    // Saturates; the store refuses to hold a row at the last revision.
    next.revision = next.revision.saturating_add(1);
    debug!(
        op,
        job_id = %next.job_id,
        row_type = %next.row_type,
        path = %path.map(ToString::to_string).unwrap_or_default(),
        revision = next.revision,
        "Layout mutation applied"
    );
    MutationOutcome::Applied(next)
}

fn unchanged(config: &JobRowConfig, reason: NoOpReason, op: &'static str) -> MutationOutcome {
    debug!(
        op,
        job_id = %config.job_id,
        row_type = %config.row_type,
        reason = %reason,
        "Layout mutation skipped"
    );
    MutationOutcome::Unchanged {
        config: config.clone(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RowType;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn editor() -> LayoutEditor {
        LayoutEditor::default()
    }

    fn path(segments: &[usize]) -> BoxPath {
        BoxPath::from(segments)
    }

    /// Equipment row split into two boxes, the second split twice more:
    /// 0, 1 → 1/0, 1/1 → 1/1/0, 1/1/1
    fn deep_row() -> JobRowConfig {
        let ed = editor();
        let row = JobRowConfig::new("J1", RowType::Equipment);
        let row = ed
            .split_row(&row, "Machines", "People", SplitPartition::Empty)
            .into_config();
        let row = ed.split_box(&row, &path(&[1])).into_config();
        let row = ed.split_box(&row, &path(&[1, 1])).into_config();
        let row = ed
            .update_box(&row, &path(&[0]), BoxUpdate::new().allowed_types([ResourceType::Paver]))
            .unwrap()
            .into_config();
        ed.update_box(
            &row,
            &path(&[1, 0]),
            BoxUpdate::new().allowed_types([ResourceType::Foreman]),
        )
        .unwrap()
        .into_config()
    }

    /// Every path that resolves in `config`.
    fn all_paths(config: &JobRowConfig) -> Vec<BoxPath> {
        fn walk(b: &JobRowBox, p: BoxPath, out: &mut Vec<BoxPath>) {
            out.push(p.clone());
            if let Some(children) = b.sub_boxes() {
                for (i, c) in children.iter().enumerate() {
                    walk(c, p.child(i), out);
                }
            }
        }
        let mut out = Vec::new();
        for (i, b) in config.boxes().iter().enumerate() {
            walk(b, BoxPath::top(i), &mut out);
        }
        out
    }

    #[test]
    fn test_split_row_then_unsplit_restores() {
        let ed = editor();
        let row = JobRowConfig::new("J1", RowType::Crew);
        let split = ed.split_row(&row, "A", "B", SplitPartition::Empty);
        assert!(split.is_applied());
        let split = split.into_config();
        assert_eq!(split.boxes().len(), 2);
        assert_eq!(split.boxes()[0].name, "A");
        assert_eq!(split.boxes()[1].max_count, 10);
        assert!(split.allowed_types().is_empty());

        let back = ed.unsplit_row(&split).into_config();
        assert_eq!(back.layout, row.layout);
        assert_eq!(back.job_id, row.job_id);
        assert_eq!(back.row_type, row.row_type);
        assert_eq!(back.revision, row.revision + 2);
    }

    #[test]
    fn test_split_row_twice_is_noop() {
        let ed = editor();
        let row = ed
            .split_row(&JobRowConfig::new("J1", RowType::Crew), "A", "B", SplitPartition::Empty)
            .into_config();
        let again = ed.split_row(&row, "C", "D", SplitPartition::Empty);
        assert_eq!(again.reason(), Some(&NoOpReason::AlreadySplit));
        assert_eq!(again.config(), &row);
    }

    #[test]
    fn test_split_row_by_category_is_disjoint() {
        let ed = editor();
        let row = ed
            .split_row(
                &JobRowConfig::new("J1", RowType::Equipment),
                "Equipment",
                "Personnel",
                SplitPartition::ByCategory,
            )
            .into_config();
        let equipment = row.boxes()[0].rules().unwrap();
        let personnel = row.boxes()[1].rules().unwrap();
        assert!(equipment.allowed_types.contains(&ResourceType::Excavator));
        assert!(equipment.allowed_types.contains(&ResourceType::Truck));
        assert!(personnel.allowed_types.contains(&ResourceType::Operator));
        assert!(equipment
            .allowed_types
            .is_disjoint(&personnel.allowed_types));
        assert_eq!(
            equipment.allowed_types.len() + personnel.allowed_types.len(),
            ResourceType::ALL.len()
        );
    }

    #[test]
    fn test_unsplit_unsplit_row_is_noop() {
        let row = JobRowConfig::new("J1", RowType::Crew);
        let out = editor().unsplit_row(&row);
        assert_eq!(out.reason(), Some(&NoOpReason::NotSplit));
    }

    #[test]
    fn test_add_box_defaults() {
        let ed = editor();
        let row = JobRowConfig::new("J1", RowType::Crew);
        assert_eq!(ed.add_box(&row, "X").reason(), Some(&NoOpReason::NotSplit));

        let row = ed
            .split_row(&row, "A", "B", SplitPartition::Empty)
            .into_config();
        let row = ed.add_box(&row, "C").into_config();
        assert_eq!(row.boxes().len(), 3);
        let c = &row.boxes()[2];
        assert_eq!(c.name, "C");
        assert_eq!(c.max_count, 5);
        assert!(c.rules().unwrap().allowed_types.is_empty());
        assert_ne!(c.id, row.boxes()[0].id);
    }

    #[test]
    fn test_add_box_uses_settings() {
        let ed = LayoutEditor::new(LayoutSettings::default().with_new_box_max_count(7));
        let row = ed
            .split_row(&JobRowConfig::new("J1", RowType::Crew), "A", "B", SplitPartition::Empty)
            .into_config();
        let row = ed.add_box(&row, "C").into_config();
        assert_eq!(row.boxes()[2].max_count, 7);
    }

    #[test]
    fn test_remove_box() {
        let ed = editor();
        let row = ed
            .split_row(&JobRowConfig::new("J1", RowType::Crew), "A", "B", SplitPartition::Empty)
            .into_config();

        let out = ed.remove_box(&row, 2);
        assert_eq!(
            out.reason(),
            Some(&NoOpReason::IndexOutOfRange { index: 2, len: 2 })
        );

        let one = ed.remove_box(&row, 0).into_config();
        assert_eq!(one.boxes().len(), 1);
        assert_eq!(one.boxes()[0].name, "B");

        let out = ed.remove_box(&one, 0);
        assert_eq!(out.reason(), Some(&NoOpReason::LastBox));
        assert_eq!(out.config(), &one);

        let unsplit = JobRowConfig::new("J1", RowType::Crew);
        assert_eq!(
            ed.remove_box(&unsplit, 0).reason(),
            Some(&NoOpReason::NotSplit)
        );
    }

    #[test]
    fn test_split_box_halves_capacity() {
        let ed = editor();
        for n in [0u32, 1, 2, 5, 10, 11] {
            let row = ed
                .split_row(&JobRowConfig::new("J1", RowType::Crew), "A", "B", SplitPartition::Empty)
                .into_config();
            let row = ed
                .update_box(&row, &path(&[0]), BoxUpdate::new().max_count(n))
                .unwrap()
                .into_config();
            let row = ed.split_box(&row, &path(&[0])).into_config();
            let children = row.boxes()[0].sub_boxes().unwrap();
            assert_eq!(children.len(), 2);
            assert_eq!(children[0].max_count + children[1].max_count, n);
            assert_eq!(children[0].max_count, n.div_ceil(2));
            assert_eq!(children[0].name, "Left");
            assert_eq!(children[1].name, "Right");
            assert!(children[0].rules().unwrap().allowed_types.is_empty());
        }
    }

    #[test]
    fn test_split_box_discards_parent_rules() {
        let row = deep_row();
        assert!(row.box_at(&path(&[0])).unwrap().allows(ResourceType::Paver));
        let row = editor().split_box(&row, &path(&[0])).into_config();
        assert!(!row.allowed_types().contains(&ResourceType::Paver));
    }

    #[test]
    fn test_split_box_invalid_path() {
        let ed = editor();
        let row = deep_row();
        for bad in [vec![], vec![5], vec![0, 0], vec![1, 1, 2], vec![1, 1, 0, 0]] {
            let out = ed.split_box(&row, &BoxPath::new(bad.clone()));
            assert_eq!(out.reason(), Some(&NoOpReason::InvalidPath(BoxPath::new(bad))));
            assert_eq!(out.config(), &row);
        }
        let out = ed.split_box(&row, &path(&[1]));
        assert_eq!(out.reason(), Some(&NoOpReason::AlreadySplit));
    }

    #[test]
    fn test_unsplit_box() {
        let ed = editor();
        let row = deep_row();
        let out = ed.unsplit_box(&row, &path(&[1, 1])).into_config();
        let node = out.box_at(&path(&[1, 1])).unwrap();
        assert!(!node.is_split());
        assert!(out.box_at(&path(&[1, 1, 0])).is_none());
        // Sibling untouched
        assert_eq!(out.box_at(&path(&[1, 0])), row.box_at(&path(&[1, 0])));

        assert_eq!(
            ed.unsplit_box(&row, &path(&[0])).reason(),
            Some(&NoOpReason::NotSplit)
        );
        assert_eq!(
            ed.unsplit_box(&row, &path(&[9])).reason(),
            Some(&NoOpReason::InvalidPath(path(&[9])))
        );
    }

    #[test]
    fn test_update_box_invalid_path_is_deep_equal() {
        let row = deep_row();
        let out = editor()
            .update_box(
                &row,
                &path(&[1, 1, 7]),
                BoxUpdate::new().name("X").allowed_types([ResourceType::Paver]),
            )
            .unwrap();
        assert!(!out.is_applied());
        assert_eq!(out.config(), &row);
    }

    #[test]
    fn test_update_box_depth_three_touches_only_target() {
        let row = deep_row();
        let target = path(&[1, 1, 0]);
        let out = editor()
            .update_box(
                &row,
                &target,
                BoxUpdate::new().name("Rakers").max_count(4),
            )
            .unwrap()
            .into_config();

        let node = out.box_at(&target).unwrap();
        assert_eq!(node.name, "Rakers");
        assert_eq!(node.max_count, 4);
        // Siblings at every level
        for sibling in [path(&[0]), path(&[1, 0]), path(&[1, 1, 1])] {
            assert_eq!(out.box_at(&sibling), row.box_at(&sibling), "{sibling}");
        }
        assert_eq!(out.revision, row.revision + 1);
    }

    #[test]
    fn test_update_box_strips_types_from_other_leaves() {
        let row = deep_row();
        // Paver is allowed in box 0; moving it to 1/1/1 strips it from 0.
        let row = editor()
            .update_box(
                &row,
                &path(&[0]),
                BoxUpdate::new().attachment_rules(vec![]).allowed_types([
                    ResourceType::Paver,
                    ResourceType::Operator,
                ]),
            )
            .unwrap()
            .into_config();
        let row = editor()
            .update_box(
                &row,
                &path(&[0]),
                BoxUpdate::new().attachment_rules(vec![BoxAttachmentRule::new(
                    ResourceType::Operator,
                    ResourceType::Paver,
                )]),
            )
            .unwrap()
            .into_config();

        let out = editor()
            .update_box(
                &row,
                &path(&[1, 1, 1]),
                BoxUpdate::new().allowed_types([ResourceType::Paver]),
            )
            .unwrap()
            .into_config();

        let first = out.box_at(&path(&[0])).unwrap().rules().unwrap();
        assert!(!first.allowed_types.contains(&ResourceType::Paver));
        assert!(first.allowed_types.contains(&ResourceType::Operator));
        // The operator→paver rule lost its target type
        assert!(first.attachment_rules.is_empty());
        assert!(out.box_at(&path(&[1, 1, 1])).unwrap().allows(ResourceType::Paver));

        let holders = out
            .leaves()
            .into_iter()
            .filter(|(_, b)| b.allows(ResourceType::Paver))
            .count();
        assert_eq!(holders, 1);
    }

    #[test]
    fn test_update_box_rejects_out_of_scope_rules() {
        let row = deep_row();
        let err = editor()
            .update_box(
                &row,
                &path(&[0]),
                BoxUpdate::new().attachment_rules(vec![BoxAttachmentRule::new(
                    ResourceType::Operator,
                    ResourceType::Paver,
                )]),
            )
            .unwrap_err();
        assert!(matches!(err, BoardError::InvariantViolation(_)));
    }

    #[test]
    fn test_update_box_allowed_change_trims_rules() {
        let ed = editor();
        let row = ed
            .split_row(&JobRowConfig::new("J1", RowType::Equipment), "A", "B", SplitPartition::Empty)
            .into_config();
        let row = ed
            .update_box(
                &row,
                &path(&[0]),
                BoxUpdate::new()
                    .allowed_types([ResourceType::Operator, ResourceType::Roller])
                    .attachment_rules(vec![BoxAttachmentRule::new(
                        ResourceType::Operator,
                        ResourceType::Roller,
                    )]),
            )
            .unwrap()
            .into_config();
        assert_eq!(row.boxes()[0].rules().unwrap().attachment_rules.len(), 1);

        let row = ed
            .update_box(&row, &path(&[0]), BoxUpdate::new().allowed_types([ResourceType::Operator]))
            .unwrap()
            .into_config();
        assert!(row.boxes()[0].rules().unwrap().attachment_rules.is_empty());
    }

    #[test]
    fn test_update_split_box() {
        let row = deep_row();
        let err = editor()
            .update_box(&row, &path(&[1]), BoxUpdate::new().allowed_types([ResourceType::Paver]))
            .unwrap_err();
        assert!(matches!(err, BoardError::InvariantViolation(msg) if msg.contains("split")));

        let out = editor()
            .update_box(&row, &path(&[1]), BoxUpdate::new().name("Crew"))
            .unwrap();
        assert!(out.is_applied());
        assert_eq!(out.config().box_at(&path(&[1])).unwrap().name, "Crew");
    }

    #[test]
    fn test_update_box_no_change() {
        let row = deep_row();
        let current = row.box_at(&path(&[0])).unwrap().name.clone();
        let out = editor()
            .update_box(&row, &path(&[0]), BoxUpdate::new().name(current))
            .unwrap();
        assert_eq!(out.reason(), Some(&NoOpReason::NoChange));
        let out = editor().update_box(&row, &path(&[0]), BoxUpdate::new()).unwrap();
        assert_eq!(out.reason(), Some(&NoOpReason::EmptyUpdate));
        assert_eq!(out.config(), &row);

        // Invalid path wins over an empty update
        let out = editor().update_box(&row, &path(&[9]), BoxUpdate::new()).unwrap();
        assert_eq!(out.reason(), Some(&NoOpReason::InvalidPath(path(&[9]))));
    }

    #[test]
    fn test_revision_saturates() {
        let mut row = JobRowConfig::new("J1", RowType::Crew);
        row.revision = u64::MAX;
        let out = editor().split_row(&row, "A", "B", SplitPartition::Empty);
        assert!(out.is_applied());
        assert_eq!(out.config().revision, u64::MAX);
    }

    #[test]
    fn test_input_never_mutated() {
        let ed = editor();
        let row = deep_row();
        let snapshot = row.clone();
        let _ = ed.split_box(&row, &path(&[0]));
        let _ = ed.unsplit_box(&row, &path(&[1]));
        let _ = ed.add_box(&row, "Z");
        let _ = ed.remove_box(&row, 0);
        let _ = ed.unsplit_row(&row);
        let _ = ed.update_box(&row, &path(&[1, 1, 0]), BoxUpdate::new().name("Q"));
        assert_eq!(row, snapshot);
    }

    #[test]
    fn test_random_trees_path_contracts() {
        let ed = editor();
        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..20 {
            let mut row = ed
                .split_row(&JobRowConfig::new("J1", RowType::Crew), "A", "B", SplitPartition::Empty)
                .into_config();
            for _ in 0..12 {
                let paths = all_paths(&row);
                let p = &paths[rng.random_range(0..paths.len())];
                row = if rng.random_bool(0.7) {
                    ed.split_box(&row, p).into_config()
                } else {
                    ed.add_box(&row, "More").into_config()
                };
            }

            let paths = all_paths(&row);
            let deepest = paths.iter().map(BoxPath::depth).max().unwrap_or(0);
            assert!(deepest >= 2);

            // Invalid paths leave the tree deep-equal.
            let bad = BoxPath::new(vec![row.boxes().len() + rng.random_range(0..3)]);
            let out = ed
                .update_box(&row, &bad, BoxUpdate::new().name("nope"))
                .unwrap();
            assert_eq!(out.config(), &row);

            // Renaming one node leaves every other node as it was.
            let target = paths[rng.random_range(0..paths.len())].clone();
            let out = ed
                .update_box(&row, &target, BoxUpdate::new().name("renamed-target"))
                .unwrap()
                .into_config();
            for p in &paths {
                let before = row.box_at(p).unwrap();
                let after = out.box_at(p).unwrap();
                if *p == target {
                    assert_eq!(after.name, "renamed-target");
                } else {
                    assert_eq!(after.name, before.name);
                    assert_eq!(after.max_count, before.max_count);
                    assert_eq!(after.id, before.id);
                }
            }
        }
    }
}
