//! Assignment ledger seam.
//!
//! The resolver never owns assignments. Callers hand it a ledger that
//! answers the two questions attachment decisions depend on.

use crate::models::{Assignment, Resource, ResourceType};

/// Read access to current placements.
pub trait AssignmentLedger {
    /// Whether the resource already holds any assignment.
    fn is_assigned(&self, resource_id: &str) -> bool;

    /// Number of `source_type` resources attached to the target resource.
    fn attached_count(&self, target_resource_id: &str, source_type: ResourceType) -> u32;
}

/// Ledger over borrowed resource and assignment slices.
#[derive(Debug, Clone, Copy)]
pub struct Roster<'a> {
    resources: &'a [Resource],
    assignments: &'a [Assignment],
}

impl<'a> Roster<'a> {
    pub fn new(resources: &'a [Resource], assignments: &'a [Assignment]) -> Self {
        Self {
            resources,
            assignments,
        }
    }

    pub fn resources(&self) -> &'a [Resource] {
        self.resources
    }

    pub fn assignments(&self) -> &'a [Assignment] {
        self.assignments
    }

    /// Finds a resource by id.
    pub fn resource(&self, id: &str) -> Option<&'a Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Assignments placed on a job.
    pub fn assignments_for_job(&self, job_id: &str) -> Vec<&'a Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.job_id == job_id)
            .collect()
    }

    /// Assignments attached to a target resource.
    pub fn attachments_on(&self, target_resource_id: &str) -> Vec<&'a Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.attached_to.as_deref() == Some(target_resource_id))
            .collect()
    }

    /// Number of inventory resources of a type.
    pub fn count_of_type(&self, resource_type: ResourceType) -> usize {
        self.resources
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .count()
    }
}

impl AssignmentLedger for Roster<'_> {
    fn is_assigned(&self, resource_id: &str) -> bool {
        self.assignments.iter().any(|a| a.resource_id == resource_id)
    }

    fn attached_count(&self, target_resource_id: &str, source_type: ResourceType) -> u32 {
        let count = self
            .attachments_on(target_resource_id)
            .into_iter()
            .filter_map(|a| self.resource(&a.resource_id))
            .filter(|r| r.resource_type == source_type)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}
