//! Row/box layout trees and their mutations.
//!
//! A job row is either unsplit (the row's drop rule applies) or split into
//! boxes. Boxes nest to any depth; each leaf carries its own allow-list,
//! capacity, and local attachment rules.
//!
//! # Usage
//!
//! ```
//! use board_rules::layout::{BoxPath, BoxUpdate, JobRowConfig, LayoutEditor, SplitPartition};
//! use board_rules::models::{ResourceType, RowType};
//!
//! let editor = LayoutEditor::default();
//! let row = JobRowConfig::new("J1", RowType::Equipment);
//! let row = editor
//!     .split_row(&row, "Equipment", "Personnel", SplitPartition::Empty)
//!     .into_config();
//! let row = editor
//!     .update_box(&row, &BoxPath::top(1), BoxUpdate::new().allowed_types([ResourceType::Operator]))
//!     .unwrap()
//!     .into_config();
//! assert!(row.box_at(&BoxPath::top(1)).unwrap().allows(ResourceType::Operator));
//! ```

mod editor;
mod settings;
mod tree;

pub use editor::{BoxUpdate, LayoutEditor, MutationOutcome, NoOpReason, SplitPartition};
pub use settings::LayoutSettings;
pub use tree::{BoxKind, BoxPath, BoxRules, JobRowBox, JobRowConfig, RowLayout, SubBoxes};
