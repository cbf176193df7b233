//! Built-in rule tables.
//!
//! A fresh board starts with these drop and magnet rules. Every entry can
//! be replaced through the rule store.

use crate::models::{DropRule, MagnetInteractionRule, ResourceCategory, ResourceType, RowType};

/// Equipment an operator runs.
const OPERATED: [ResourceType; 9] = [
    ResourceType::Skidsteer,
    ResourceType::Paver,
    ResourceType::Excavator,
    ResourceType::Sweeper,
    ResourceType::MillingMachine,
    ResourceType::Grader,
    ResourceType::Dozer,
    ResourceType::Payloader,
    ResourceType::Roller,
];

/// Default drop rule for every row type.
pub fn default_drop_rules() -> Vec<DropRule> {
    use ResourceType::*;

    RowType::ALL
        .into_iter()
        .map(|row| {
            let allowed: Vec<ResourceType> = match row {
                RowType::Forman => vec![Foreman],
                RowType::Equipment => ResourceCategory::Equipment.types().collect(),
                RowType::Sweeper => vec![Sweeper],
                RowType::Tack | RowType::Mpt => vec![Laborer, Truck],
                RowType::Crew => ResourceCategory::Personnel.types().collect(),
                RowType::Trucks => vec![Truck, Driver, PrivateDriver],
            };
            DropRule::new(row, allowed)
        })
        .collect()
}

/// Default attachment rules.
///
/// Operators run equipment (one per machine, required), drivers run
/// trucks (one per truck, required), private drivers and stripers may ride
/// a truck, laborers may work a paver without limit.
pub fn default_magnet_rules() -> Vec<MagnetInteractionRule> {
    let mut rules: Vec<MagnetInteractionRule> = OPERATED
        .into_iter()
        .map(|equipment| {
            MagnetInteractionRule::new(ResourceType::Operator, equipment)
                .required()
                .with_max_count(1)
        })
        .collect();

    rules.push(
        MagnetInteractionRule::new(ResourceType::Driver, ResourceType::Truck)
            .required()
            .with_max_count(1),
    );
    rules.push(
        MagnetInteractionRule::new(ResourceType::PrivateDriver, ResourceType::Truck)
            .with_max_count(1),
    );
    rules.push(
        MagnetInteractionRule::new(ResourceType::Striper, ResourceType::Truck).with_max_count(1),
    );
    rules.push(MagnetInteractionRule::new(
        ResourceType::Laborer,
        ResourceType::Paver,
    ));
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_drop_rules_cover_every_row() {
        let rules = default_drop_rules();
        assert_eq!(rules.len(), RowType::ALL.len());
        let rows: HashSet<RowType> = rules.iter().map(|r| r.row_type).collect();
        assert_eq!(rows.len(), RowType::ALL.len());

        let equipment = rules.iter().find(|r| r.row_type == RowType::Equipment).unwrap();
        assert!(equipment.allows(ResourceType::Excavator));
        assert!(!equipment.allows(ResourceType::Operator));
        assert!(!equipment.allows(ResourceType::Truck));
    }

    #[test]
    fn test_magnet_rules_unique_pairs() {
        let rules = default_magnet_rules();
        let keys: HashSet<_> = rules.iter().map(|r| r.key()).collect();
        assert_eq!(keys.len(), rules.len());
        assert!(rules
            .iter()
            .any(|r| r.key() == (ResourceType::Operator, ResourceType::Excavator) && r.is_required));
        // Attachment sources are always personnel
        assert!(rules.iter().all(|r| r.source_type.is_personnel()));
    }
}
