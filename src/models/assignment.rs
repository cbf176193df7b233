//! Assignment model.
//!
//! An assignment places one resource on one job row, optionally inside a
//! box and optionally attached to another resource (an operator attached
//! to the excavator they run).

use serde::{Deserialize, Serialize};

use super::RowType;

/// A resource placed on a job row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    /// Unique assignment identifier.
    pub id: String,
    /// Job the resource is placed on.
    pub job_id: String,
    /// Assigned resource.
    pub resource_id: String,
    /// Row the resource sits in.
    pub row_type: RowType,
    /// Box within a split row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_id: Option<String>,
    /// Resource this one is attached to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_to: Option<String>,
}

impl Assignment {
    /// Creates an assignment on a row.
    pub fn new(
        id: impl Into<String>,
        job_id: impl Into<String>,
        resource_id: impl Into<String>,
        row_type: RowType,
    ) -> Self {
        Self {
            id: id.into(),
            job_id: job_id.into(),
            resource_id: resource_id.into(),
            row_type,
            box_id: None,
            attached_to: None,
        }
    }

    /// Places the assignment inside a box.
    pub fn in_box(mut self, box_id: impl Into<String>) -> Self {
        self.box_id = Some(box_id.into());
        self
    }

    /// Attaches the assigned resource to another resource.
    pub fn attached_to(mut self, target_resource_id: impl Into<String>) -> Self {
        self.attached_to = Some(target_resource_id.into());
        self
    }

    /// Whether this assignment is an attachment.
    #[inline]
    pub fn is_attachment(&self) -> bool {
        self.attached_to.is_some()
    }
}
