//! Rule engine for a construction job board.
//!
//! Jobs are shown as rows (foreman, equipment, crew, trucks, ...). Resources
//! are dragged onto rows as magnets and may attach to each other, an
//! operator onto the excavator they run. This crate decides where a magnet
//! may land and what it may attach to.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Resource`, `ResourceType`, `RowType`,
//!   `Job`, `Assignment`, `JobTypeConfiguration`, rule records
//! - **`layout`**: Row/box layout trees and path-addressed mutations
//! - **`rules`**: Keyed magnet and drop rule tables with built-in defaults
//! - **`resolver`**: Attachment compatibility (closed-world magnet rules)
//! - **`drop`**: Drop validation against row rules and box allow-lists
//! - **`health`**: Configuration health report over the live inventory
//! - **`store`**: The board configuration context and its JSON documents
//! - **`validation`**: Structural checks (duplicate IDs, uniqueness, cycles)
//!
//! # Usage
//!
//! ```
//! use board_rules::drop::DropTarget;
//! use board_rules::models::{ResourceType, RowType};
//! use board_rules::store::BoardStore;
//!
//! let store = BoardStore::with_defaults();
//! let drops = store.drop_validator();
//! assert!(drops.is_allowed(DropTarget::Row(RowType::Trucks), ResourceType::Driver));
//!
//! let decision = store
//!     .resolver()
//!     .resolve_attachment(ResourceType::Operator, ResourceType::Excavator, 0);
//! assert!(decision.eligible);
//! ```
//!
//! # Architecture
//!
//! Everything is synchronous and side-effect free apart from the
//! [`store::BoardStore`] that owns the current snapshots. Layout mutations
//! return new snapshots; the store rejects snapshots that are not newer
//! than the one it holds.

pub mod drop;
pub mod error;
pub mod health;
pub mod layout;
pub mod models;
pub mod resolver;
pub mod rules;
pub mod store;
pub mod validation;

pub use error::{BoardError, BoardResult};
