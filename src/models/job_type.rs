//! Job type configurations.
//!
//! A job type ("Paving", "Milling", ...) describes which rows a new job of
//! that type starts with and, per row, which resource types are allowed
//! and which are required.
//!
//! # Invariant
//! `required_resources ⊆ allowed_resources` for every row. Edits go
//! through [`JobTypeConfiguration::update_row`], which rejects updates that
//! would require a type the row does not allow and trims the required set
//! when allowed types are removed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use super::{ResourceCategory, ResourceType, RowType};
use crate::error::{BoardError, BoardResult};

/// A job type and its default rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTypeConfiguration {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub default_rows: Vec<JobRowConfiguration>,
    /// User-created (as opposed to built-in).
    #[serde(default)]
    pub is_custom: bool,
}

/// Per-row defaults within a job type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRowConfiguration {
    pub row_type: RowType,
    pub enabled: bool,
    /// The row must be present on every job of this type.
    pub required: bool,
    pub allowed_resources: BTreeSet<ResourceType>,
    pub required_resources: BTreeSet<ResourceType>,
    /// Resource cap for the row (0 = unlimited).
    pub max_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
}

/// Partial update of a [`JobRowConfiguration`].
///
/// Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowConfigurationUpdate {
    pub enabled: Option<bool>,
    pub required: Option<bool>,
    pub allowed_resources: Option<BTreeSet<ResourceType>>,
    pub required_resources: Option<BTreeSet<ResourceType>>,
    pub max_count: Option<u32>,
    pub custom_name: Option<Option<String>>,
}

impl JobRowConfiguration {
    /// Creates an enabled, optional row that allows nothing.
    pub fn new(row_type: RowType) -> Self {
        Self {
            row_type,
            enabled: true,
            required: false,
            allowed_resources: BTreeSet::new(),
            required_resources: BTreeSet::new(),
            max_count: 0,
            custom_name: None,
        }
    }

    /// Sets the allowed types.
    pub fn allowing(mut self, types: impl IntoIterator<Item = ResourceType>) -> Self {
        self.allowed_resources = types.into_iter().collect();
        self
    }

    /// Sets the required types. Each is also added to the allowed set.
    pub fn requiring(mut self, types: impl IntoIterator<Item = ResourceType>) -> Self {
        self.required_resources = types.into_iter().collect();
        self.allowed_resources
            .extend(self.required_resources.iter().copied());
        self
    }

    /// Marks the row as mandatory.
    pub fn mandatory(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the resource cap.
    pub fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = max_count;
        self
    }

    /// Required types that are not allowed (empty for a consistent row).
    pub fn required_not_allowed(&self) -> BTreeSet<ResourceType> {
        self.required_resources
            .difference(&self.allowed_resources)
            .copied()
            .collect()
    }

    /// Checks `required ⊆ allowed`.
    pub fn check(&self) -> BoardResult<()> {
        let missing = self.required_not_allowed();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(BoardError::InvariantViolation(format!(
                "row {} requires {} but does not allow {}",
                self.row_type,
                join_types(&missing),
                if missing.len() == 1 { "it" } else { "them" }
            )))
        }
    }

    /// Display label: the custom name when set, the row type otherwise.
    pub fn label(&self) -> &str {
        self.custom_name
            .as_deref()
            .unwrap_or_else(|| self.row_type.as_str())
    }
}

impl RowConfigurationUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn allowed_resources(mut self, types: impl IntoIterator<Item = ResourceType>) -> Self {
        self.allowed_resources = Some(types.into_iter().collect());
        self
    }

    pub fn required_resources(mut self, types: impl IntoIterator<Item = ResourceType>) -> Self {
        self.required_resources = Some(types.into_iter().collect());
        self
    }

    pub fn max_count(mut self, max_count: u32) -> Self {
        self.max_count = Some(max_count);
        self
    }

    /// Sets (`Some`) or clears (`None`) the custom row name.
    pub fn custom_name(mut self, name: Option<String>) -> Self {
        self.custom_name = Some(name);
        self
    }

    /// Applies the update to a row, enforcing `required ⊆ allowed`.
    fn apply(self, mut row: JobRowConfiguration) -> BoardResult<JobRowConfiguration> {
        if let Some(allowed) = self.allowed_resources {
            row.allowed_resources = allowed;
        }
        match self.required_resources {
            Some(required) => {
                row.required_resources = required;
                row.check()?;
            }
            None => {
                let before = row.required_resources.len();
                let allowed = &row.allowed_resources;
                row.required_resources.retain(|t| allowed.contains(t));
                if row.required_resources.len() != before {
                    debug!(
                        row_type = %row.row_type,
                        trimmed = before - row.required_resources.len(),
                        "Required types trimmed after allow-list change"
                    );
                }
            }
        }
        if let Some(enabled) = self.enabled {
            row.enabled = enabled;
        }
        if let Some(required) = self.required {
            row.required = required;
        }
        if let Some(max_count) = self.max_count {
            row.max_count = max_count;
        }
        if let Some(name) = self.custom_name {
            row.custom_name = name;
        }
        Ok(row)
    }
}

impl JobTypeConfiguration {
    /// Creates a custom job type with no rows.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            default_rows: Vec::new(),
            is_custom: true,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a default row.
    pub fn with_row(mut self, row: JobRowConfiguration) -> Self {
        self.default_rows.push(row);
        self
    }

    /// Marks the configuration as built-in.
    pub fn built_in(mut self) -> Self {
        self.is_custom = false;
        self
    }

    /// Finds the row of the given type.
    pub fn row(&self, row_type: RowType) -> Option<&JobRowConfiguration> {
        self.default_rows.iter().find(|r| r.row_type == row_type)
    }

    /// Enabled rows.
    pub fn enabled_rows(&self) -> impl Iterator<Item = &JobRowConfiguration> {
        self.default_rows.iter().filter(|r| r.enabled)
    }

    /// Returns a copy with one row updated.
    ///
    /// A row of `row_type` is created first when the configuration has
    /// none. Fails without touching `self` when the result would require a
    /// type the row does not allow.
    pub fn update_row(
        &self,
        row_type: RowType,
        update: RowConfigurationUpdate,
    ) -> BoardResult<Self> {
        let mut next = self.clone();
        match next.default_rows.iter().position(|r| r.row_type == row_type) {
            Some(idx) => {
                let row = next.default_rows[idx].clone();
                next.default_rows[idx] = update.apply(row)?;
            }
            None => {
                let row = update.apply(JobRowConfiguration::new(row_type))?;
                next.default_rows.push(row);
            }
        }
        Ok(next)
    }

    /// Checks every row.
    pub fn check(&self) -> BoardResult<()> {
        self.default_rows.iter().try_for_each(|r| r.check())
    }
}

/// Built-in job types.
pub fn standard_job_types() -> Vec<JobTypeConfiguration> {
    use ResourceType::*;

    let personnel: Vec<ResourceType> = ResourceCategory::Personnel.types().collect();
    let foreman_row = JobRowConfiguration::new(RowType::Forman)
        .allowing([Foreman])
        .requiring([Foreman])
        .mandatory()
        .with_max_count(1);
    let crew_row = JobRowConfiguration::new(RowType::Crew)
        .allowing(personnel.iter().copied())
        .requiring([Laborer]);
    let truck_row = JobRowConfiguration::new(RowType::Trucks)
        .allowing([Truck, Driver, PrivateDriver])
        .requiring([Truck, Driver]);

    vec![
        JobTypeConfiguration::new("paving", "Paving")
            .with_description("Asphalt paving with rolling and trucking")
            .with_row(foreman_row.clone())
            .with_row(
                JobRowConfiguration::new(RowType::Equipment)
                    .allowing([Paver, Roller, Skidsteer, Operator])
                    .requiring([Paver, Roller, Operator])
                    .mandatory(),
            )
            .with_row(crew_row.clone())
            .with_row(
                JobRowConfiguration::new(RowType::Tack)
                    .allowing([Laborer, Truck])
                    .requiring([Laborer]),
            )
            .with_row(truck_row.clone())
            .built_in(),
        JobTypeConfiguration::new("milling", "Milling")
            .with_description("Cold planing with sweeper follow-up")
            .with_row(foreman_row.clone())
            .with_row(
                JobRowConfiguration::new(RowType::Equipment)
                    .allowing([MillingMachine, Skidsteer, Operator])
                    .requiring([MillingMachine, Operator])
                    .mandatory(),
            )
            .with_row(
                JobRowConfiguration::new(RowType::Sweeper)
                    .allowing([Sweeper, Operator])
                    .requiring([Sweeper]),
            )
            .with_row(truck_row.clone())
            .built_in(),
        JobTypeConfiguration::new("excavation", "Excavation")
            .with_description("Earthwork and grading")
            .with_row(foreman_row)
            .with_row(
                JobRowConfiguration::new(RowType::Equipment)
                    .allowing([Excavator, Dozer, Grader, Payloader, Skidsteer, Operator])
                    .requiring([Excavator, Operator])
                    .mandatory(),
            )
            .with_row(crew_row)
            .with_row(truck_row)
            .built_in(),
        JobTypeConfiguration::new("striping", "Striping")
            .with_description("Pavement markings under traffic control")
            .with_row(
                JobRowConfiguration::new(RowType::Crew)
                    .allowing([Striper, Laborer, Foreman])
                    .requiring([Striper]),
            )
            .with_row(
                JobRowConfiguration::new(RowType::Mpt)
                    .allowing([Laborer, Truck])
                    .requiring([Truck]),
            )
            .built_in(),
    ]
}

pub(crate) fn join_types(types: &BTreeSet<ResourceType>) -> String {
    types
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
