//! Row/box layout tree.
//!
//! A [`JobRowConfig`] is the root of the tree for one (job, row) pair. An
//! unsplit row uses its row type's drop rule; a split row owns one or more
//! [`JobRowBox`] nodes, each either a leaf (own allow-list and attachment
//! rules) or split into further sub-boxes.
//!
//! # Shape invariant
//! "Split" always carries at least one child and "leaf" never carries
//! children. Both are encoded in the types ([`BoxKind`], [`RowLayout`],
//! [`SubBoxes`]); the flat stored record
//! `{id, name, allowedTypes, maxCount, attachmentRules, isSplit, subBoxes}`
//! is checked on decode.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Deref;

use crate::models::{BoxAttachmentRule, ResourceType, RowType};

/// Address of a box: child indices walked from the row root.
///
/// The first index selects a top-level box of the row, every further
/// index selects among that node's sub-boxes. The empty path addresses
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxPath(Vec<usize>);

/// A node of the layout tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BoxRecord", into = "BoxRecord")]
pub struct JobRowBox {
    pub id: String,
    pub name: String,
    /// Resource cap for the box (0 = unlimited).
    pub max_count: u32,
    pub kind: BoxKind,
}

/// Leaf or split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxKind {
    /// Holds resources directly.
    Leaf(BoxRules),
    /// Partitioned into sub-boxes; owns no allow-list of its own.
    Split(SubBoxes),
}

/// Allow-list and local attachment rules of a leaf box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxRules {
    pub allowed_types: BTreeSet<ResourceType>,
    pub attachment_rules: Vec<BoxAttachmentRule>,
}

/// Non-empty list of child boxes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubBoxes(Vec<JobRowBox>);

/// Root of one (job, row) layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RowConfigRecord", into = "RowConfigRecord")]
pub struct JobRowConfig {
    pub job_id: String,
    pub row_type: RowType,
    pub layout: RowLayout,
    /// Bumped by every applied mutation.
    pub revision: u64,
}

/// Row-level layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowLayout {
    /// The row's drop rule applies.
    Unsplit,
    /// The boxes own their allow-lists.
    Split(SubBoxes),
}

impl BoxPath {
    /// Creates a path from child indices.
    pub fn new(segments: impl Into<Vec<usize>>) -> Self {
        Self(segments.into())
    }

    /// Path of a top-level box.
    pub fn top(index: usize) -> Self {
        Self(vec![index])
    }

    /// Path of the `index`-th child of this path's node.
    pub fn child(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    #[inline]
    pub fn segments(&self) -> &[usize] {
        &self.0
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for BoxPath {
    fn from(segments: Vec<usize>) -> Self {
        Self(segments)
    }
}

impl From<&[usize]> for BoxPath {
    fn from(segments: &[usize]) -> Self {
        Self(segments.to_vec())
    }
}

impl fmt::Display for BoxPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl JobRowBox {
    /// Creates an empty leaf.
    pub fn leaf(id: impl Into<String>, name: impl Into<String>, max_count: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_count,
            kind: BoxKind::Leaf(BoxRules::default()),
        }
    }

    /// Creates a split box.
    pub fn split(
        id: impl Into<String>,
        name: impl Into<String>,
        max_count: u32,
        sub_boxes: SubBoxes,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_count,
            kind: BoxKind::Split(sub_boxes),
        }
    }

    /// Sets the allowed types of a leaf. No effect on a split box.
    pub fn with_allowed_types(mut self, types: impl IntoIterator<Item = ResourceType>) -> Self {
        if let BoxKind::Leaf(rules) = &mut self.kind {
            rules.allowed_types = types.into_iter().collect();
        }
        self
    }

    /// Adds a local attachment rule to a leaf. No effect on a split box.
    pub fn with_attachment_rule(mut self, rule: BoxAttachmentRule) -> Self {
        if let BoxKind::Leaf(rules) = &mut self.kind {
            rules.attachment_rules.push(rule);
        }
        self
    }

    #[inline]
    pub fn is_split(&self) -> bool {
        matches!(self.kind, BoxKind::Split(_))
    }

    /// Leaf rules, `None` for a split box.
    pub fn rules(&self) -> Option<&BoxRules> {
        match &self.kind {
            BoxKind::Leaf(rules) => Some(rules),
            BoxKind::Split(_) => None,
        }
    }

    /// Children, `None` for a leaf.
    pub fn sub_boxes(&self) -> Option<&SubBoxes> {
        match &self.kind {
            BoxKind::Leaf(_) => None,
            BoxKind::Split(children) => Some(children),
        }
    }

    fn sub_boxes_mut(&mut self) -> Option<&mut SubBoxes> {
        match &mut self.kind {
            BoxKind::Leaf(_) => None,
            BoxKind::Split(children) => Some(children),
        }
    }

    /// Whether a leaf allows `resource_type`. Split boxes allow nothing.
    pub fn allows(&self, resource_type: ResourceType) -> bool {
        self.rules()
            .is_some_and(|r| r.allowed_types.contains(&resource_type))
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self
            .sub_boxes()
            .map(|c| c.iter().map(JobRowBox::node_count).sum::<usize>())
            .unwrap_or(0)
    }

    fn collect_leaves<'a>(&'a self, path: BoxPath, out: &mut Vec<(BoxPath, &'a JobRowBox)>) {
        match &self.kind {
            BoxKind::Leaf(_) => out.push((path, self)),
            BoxKind::Split(children) => {
                for (i, child) in children.iter().enumerate() {
                    child.collect_leaves(path.child(i), out);
                }
            }
        }
    }

    fn find<'a>(&'a self, id: &str, path: BoxPath) -> Option<(BoxPath, &'a JobRowBox)> {
        if self.id == id {
            return Some((path, self));
        }
        self.sub_boxes()?
            .iter()
            .enumerate()
            .find_map(|(i, child)| child.find(id, path.child(i)))
    }

    /// Applies `f` to every leaf's rules in this subtree.
    pub(crate) fn for_each_leaf_mut(&mut self, f: &mut impl FnMut(&mut BoxRules)) {
        match &mut self.kind {
            BoxKind::Leaf(rules) => f(rules),
            BoxKind::Split(children) => {
                for child in children.0.iter_mut() {
                    child.for_each_leaf_mut(f);
                }
            }
        }
    }
}

impl BoxRules {
    /// Creates leaf rules.
    pub fn new(
        allowed_types: BTreeSet<ResourceType>,
        attachment_rules: Vec<BoxAttachmentRule>,
    ) -> Self {
        Self {
            allowed_types,
            attachment_rules,
        }
    }

    /// Attachment rules that mention a type outside the allow-list.
    pub fn out_of_scope_rules(&self) -> impl Iterator<Item = &BoxAttachmentRule> {
        self.attachment_rules.iter().filter(|r| {
            !self.allowed_types.contains(&r.source_type)
                || !self.allowed_types.contains(&r.target_type)
        })
    }

    /// Removes `types` from the allow-list together with every rule that
    /// mentions one of them.
    pub(crate) fn strip(&mut self, types: &BTreeSet<ResourceType>) {
        self.allowed_types.retain(|t| !types.contains(t));
        self.attachment_rules
            .retain(|r| !types.iter().any(|&t| r.mentions(t)));
    }
}

impl SubBoxes {
    /// Wraps a list of boxes; `None` when empty.
    pub fn new(boxes: Vec<JobRowBox>) -> Option<Self> {
        (!boxes.is_empty()).then_some(Self(boxes))
    }

    /// Two boxes.
    pub fn pair(first: JobRowBox, second: JobRowBox) -> Self {
        Self(vec![first, second])
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut JobRowBox> {
        self.0.get_mut(index)
    }

    pub fn push(&mut self, b: JobRowBox) {
        self.0.push(b);
    }

    /// Removes a box unless it is out of range or the last one.
    pub fn remove(&mut self, index: usize) -> Option<JobRowBox> {
        (self.0.len() > 1 && index < self.0.len()).then(|| self.0.remove(index))
    }

    pub fn into_vec(self) -> Vec<JobRowBox> {
        self.0
    }
}

impl Deref for SubBoxes {
    type Target = [JobRowBox];

    fn deref(&self) -> &[JobRowBox] {
        &self.0
    }
}

impl JobRowConfig {
    /// Creates an unsplit row config.
    pub fn new(job_id: impl Into<String>, row_type: RowType) -> Self {
        Self {
            job_id: job_id.into(),
            row_type,
            layout: RowLayout::Unsplit,
            revision: 0,
        }
    }

    /// Creates a split row config from boxes; `None` when `boxes` is empty.
    pub fn with_boxes(
        job_id: impl Into<String>,
        row_type: RowType,
        boxes: Vec<JobRowBox>,
    ) -> Option<Self> {
        Some(Self {
            job_id: job_id.into(),
            row_type,
            layout: RowLayout::Split(SubBoxes::new(boxes)?),
            revision: 0,
        })
    }

    #[inline]
    pub fn is_split(&self) -> bool {
        matches!(self.layout, RowLayout::Split(_))
    }

    /// Top-level boxes (empty while unsplit).
    pub fn boxes(&self) -> &[JobRowBox] {
        match &self.layout {
            RowLayout::Unsplit => &[],
            RowLayout::Split(boxes) => boxes,
        }
    }

    /// Resolves a path in O(depth).
    pub fn box_at(&self, path: &BoxPath) -> Option<&JobRowBox> {
        let (first, rest) = path.segments().split_first()?;
        let mut node = self.boxes().get(*first)?;
        for &index in rest {
            node = node.sub_boxes()?.get(index)?;
        }
        Some(node)
    }

    /// Mutable path resolution in O(depth).
    pub(crate) fn box_at_mut(&mut self, path: &BoxPath) -> Option<&mut JobRowBox> {
        let (first, rest) = path.segments().split_first()?;
        let RowLayout::Split(boxes) = &mut self.layout else {
            return None;
        };
        let mut node = boxes.get_mut(*first)?;
        for &index in rest {
            node = node.sub_boxes_mut()?.get_mut(index)?;
        }
        Some(node)
    }

    /// Every leaf with its path, depth-first.
    pub fn leaves(&self) -> Vec<(BoxPath, &JobRowBox)> {
        let mut out = Vec::new();
        for (i, b) in self.boxes().iter().enumerate() {
            b.collect_leaves(BoxPath::top(i), &mut out);
        }
        out
    }

    /// Finds a box by id anywhere in the tree.
    pub fn find_box(&self, id: &str) -> Option<(BoxPath, &JobRowBox)> {
        self.boxes()
            .iter()
            .enumerate()
            .find_map(|(i, b)| b.find(id, BoxPath::top(i)))
    }

    /// Union of the leaves' allow-lists.
    pub fn allowed_types(&self) -> BTreeSet<ResourceType> {
        self.leaves()
            .into_iter()
            .filter_map(|(_, b)| b.rules())
            .flat_map(|r| r.allowed_types.iter().copied())
            .collect()
    }

    /// Applies `f` to every leaf's rules in the row.
    pub(crate) fn for_each_leaf_mut(&mut self, mut f: impl FnMut(&mut BoxRules)) {
        if let RowLayout::Split(boxes) = &mut self.layout {
            for b in boxes.0.iter_mut() {
                b.for_each_leaf_mut(&mut f);
            }
        }
    }
}

// ======================== Stored records ========================

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoxRecord {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    allowed_types: BTreeSet<ResourceType>,
    #[serde(default)]
    max_count: u32,
    #[serde(default)]
    attachment_rules: Vec<BoxAttachmentRule>,
    #[serde(default)]
    is_split: bool,
    #[serde(default)]
    sub_boxes: Vec<JobRowBox>,
}

impl TryFrom<BoxRecord> for JobRowBox {
    type Error = String;

    fn try_from(rec: BoxRecord) -> Result<Self, Self::Error> {
        let kind = match (rec.is_split, rec.sub_boxes.is_empty()) {
            (true, true) => {
                return Err(format!("box '{}' is split but has no sub-boxes", rec.id));
            }
            (false, false) => {
                return Err(format!("box '{}' is not split but has sub-boxes", rec.id));
            }
            // A split box's own allow-list and rules are superseded by its children.
            (true, false) => BoxKind::Split(SubBoxes(rec.sub_boxes)),
            (false, true) => BoxKind::Leaf(BoxRules::new(rec.allowed_types, rec.attachment_rules)),
        };
        Ok(Self {
            id: rec.id,
            name: rec.name,
            max_count: rec.max_count,
            kind,
        })
    }
}

impl From<JobRowBox> for BoxRecord {
    fn from(b: JobRowBox) -> Self {
        let (is_split, rules, sub_boxes) = match b.kind {
            BoxKind::Leaf(rules) => (false, rules, Vec::new()),
            BoxKind::Split(children) => (true, BoxRules::default(), children.into_vec()),
        };
        Self {
            id: b.id,
            name: b.name,
            allowed_types: rules.allowed_types,
            max_count: b.max_count,
            attachment_rules: rules.attachment_rules,
            is_split,
            sub_boxes,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RowConfigRecord {
    job_id: String,
    row_type: RowType,
    #[serde(default)]
    is_split: bool,
    #[serde(default)]
    boxes: Vec<JobRowBox>,
    #[serde(default)]
    revision: u64,
}

impl TryFrom<RowConfigRecord> for JobRowConfig {
    type Error = String;

    fn try_from(rec: RowConfigRecord) -> Result<Self, Self::Error> {
        let layout = match (rec.is_split, SubBoxes::new(rec.boxes)) {
            (true, Some(boxes)) => RowLayout::Split(boxes),
            (false, None) => RowLayout::Unsplit,
            (true, None) => {
                return Err(format!(
                    "row {} of job '{}' is split but has no boxes",
                    rec.row_type, rec.job_id
                ));
            }
            (false, Some(_)) => {
                return Err(format!(
                    "row {} of job '{}' is not split but has boxes",
                    rec.row_type, rec.job_id
                ));
            }
        };
        Ok(Self {
            job_id: rec.job_id,
            row_type: rec.row_type,
            layout,
            revision: rec.revision,
        })
    }
}

impl From<JobRowConfig> for RowConfigRecord {
    fn from(c: JobRowConfig) -> Self {
        let (is_split, boxes) = match c.layout {
            RowLayout::Unsplit => (false, Vec::new()),
            RowLayout::Split(boxes) => (true, boxes.into_vec()),
        };
        Self {
            job_id: c.job_id,
            row_type: c.row_type,
            is_split,
            boxes,
            revision: c.revision,
        }
    }
}
