//! Resource model and type catalog.
//!
//! Resources are the personnel and machines placed on the board: operators,
//! drivers, laborers, pavers, excavators, trucks. Every resource carries
//! exactly one [`ResourceType`], and the type alone decides where the
//! resource may be dropped and what it may attach to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BoardError;

/// A resource that can be assigned to a job row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Unique resource identifier.
    pub id: String,
    /// Human-readable name (person name or unit description).
    pub name: String,
    /// Resource classification.
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Unit number or badge (e.g., "EX-12").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

/// Resource type classification.
///
/// Closed set. The serialized names are the strings used in stored
/// documents (`"privateDriver"`, `"millingMachine"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
    Operator,
    Driver,
    PrivateDriver,
    Striper,
    Foreman,
    Laborer,
    Skidsteer,
    Paver,
    Excavator,
    Sweeper,
    MillingMachine,
    Grader,
    Dozer,
    Payloader,
    Roller,
    /// Generic equipment not covered by a dedicated type.
    Equipment,
    Truck,
}

/// Top-level grouping of resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceCategory {
    /// People: operators, drivers, laborers, foremen.
    Personnel,
    /// Machines that stay on site.
    Equipment,
    /// Road vehicles.
    Vehicle,
}

impl ResourceType {
    /// Every resource type, personnel first.
    pub const ALL: [ResourceType; 17] = [
        Self::Operator,
        Self::Driver,
        Self::PrivateDriver,
        Self::Striper,
        Self::Foreman,
        Self::Laborer,
        Self::Skidsteer,
        Self::Paver,
        Self::Excavator,
        Self::Sweeper,
        Self::MillingMachine,
        Self::Grader,
        Self::Dozer,
        Self::Payloader,
        Self::Roller,
        Self::Equipment,
        Self::Truck,
    ];

    /// Category this type belongs to.
    pub fn category(self) -> ResourceCategory {
        match self {
            Self::Operator
            | Self::Driver
            | Self::PrivateDriver
            | Self::Striper
            | Self::Foreman
            | Self::Laborer => ResourceCategory::Personnel,
            Self::Truck => ResourceCategory::Vehicle,
            _ => ResourceCategory::Equipment,
        }
    }

    /// Whether this type is a person.
    #[inline]
    pub fn is_personnel(self) -> bool {
        self.category() == ResourceCategory::Personnel
    }

    /// Stored name (`"millingMachine"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Driver => "driver",
            Self::PrivateDriver => "privateDriver",
            Self::Striper => "striper",
            Self::Foreman => "foreman",
            Self::Laborer => "laborer",
            Self::Skidsteer => "skidsteer",
            Self::Paver => "paver",
            Self::Excavator => "excavator",
            Self::Sweeper => "sweeper",
            Self::MillingMachine => "millingMachine",
            Self::Grader => "grader",
            Self::Dozer => "dozer",
            Self::Payloader => "payloader",
            Self::Roller => "roller",
            Self::Equipment => "equipment",
            Self::Truck => "truck",
        }
    }

    /// Label for reports (`"Milling Machine"`).
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Operator => "Operator",
            Self::Driver => "Driver",
            Self::PrivateDriver => "Private Driver",
            Self::Striper => "Striper",
            Self::Foreman => "Foreman",
            Self::Laborer => "Laborer",
            Self::Skidsteer => "Skid Steer",
            Self::Paver => "Paver",
            Self::Excavator => "Excavator",
            Self::Sweeper => "Sweeper",
            Self::MillingMachine => "Milling Machine",
            Self::Grader => "Grader",
            Self::Dozer => "Dozer",
            Self::Payloader => "Payloader",
            Self::Roller => "Roller",
            Self::Equipment => "Equipment",
            Self::Truck => "Truck",
        }
    }
}

impl ResourceCategory {
    /// Resource types in this category, in catalog order.
    pub fn types(self) -> impl Iterator<Item = ResourceType> {
        ResourceType::ALL
            .into_iter()
            .filter(move |t| t.category() == self)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| BoardError::UnknownResourceType(s.to_string()))
    }
}

impl Resource {
    /// Creates a new resource.
    pub fn new(id: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            resource_type,
            identifier: None,
        }
    }

    /// Sets the resource name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the unit number or badge.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Whether this resource is a person.
    pub fn is_personnel(&self) -> bool {
        self.resource_type.is_personnel()
    }
}
