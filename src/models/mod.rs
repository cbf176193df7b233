//! Board domain models.
//!
//! Plain data: the resource and row catalogs, the compatibility rules,
//! job-type configurations and the inventory types (resources, jobs,
//! assignments) the analyzer and resolver read.
//!
//! # Board Mappings
//!
//! | Model | On the board |
//! |-------|-------------|
//! | Job | Construction site card |
//! | RowType | Lane within a job card |
//! | Resource | Magnet (person or machine) |
//! | Assignment | Magnet placed on a lane, optionally attached to another |
//! | JobTypeConfiguration | Template for a new job's lanes |

mod assignment;
mod job;
mod job_type;
mod resource;
mod row;
mod rule;

pub use assignment::Assignment;
pub use job::{Job, JobStatus};
pub(crate) use job_type::join_types;
pub use job_type::{
    standard_job_types, JobRowConfiguration, JobTypeConfiguration, RowConfigurationUpdate,
};
pub use resource::{Resource, ResourceCategory, ResourceType};
pub use row::RowType;
pub use rule::{BoxAttachmentRule, DropRule, MagnetInteractionRule};
