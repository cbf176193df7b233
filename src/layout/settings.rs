//! Layout editor settings.

use serde::{Deserialize, Serialize};

/// Defaults applied when the editor creates boxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutSettings {
    /// `max_count` of a box appended with `add_box` (default: 5).
    pub new_box_max_count: u32,
    /// `max_count` of each box created by `split_row` (default: 10).
    pub split_row_max_count: u32,
    /// Name of the first child created by `split_box`.
    pub left_box_name: String,
    /// Name of the second child created by `split_box`.
    pub right_box_name: String,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            new_box_max_count: 5,
            split_row_max_count: 10,
            left_box_name: "Left".to_string(),
            right_box_name: "Right".to_string(),
        }
    }
}

impl LayoutSettings {
    /// Sets the capacity of appended boxes.
    pub fn with_new_box_max_count(mut self, max_count: u32) -> Self {
        self.new_box_max_count = max_count;
        self
    }

    /// Sets the capacity of boxes created by a row split.
    pub fn with_split_row_max_count(mut self, max_count: u32) -> Self {
        self.split_row_max_count = max_count;
        self
    }

    /// Sets the names given to the two children of a box split.
    pub fn with_split_box_names(
        mut self,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        self.left_box_name = left.into();
        self.right_box_name = right.into();
        self
    }
}
