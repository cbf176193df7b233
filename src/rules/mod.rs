//! Compatibility rule store.
//!
//! Holds the two global rule tables, each keyed for direct lookup:
//!
//! - magnet interaction rules by ordered `(source, target)` type pair
//! - drop rules by row type
//!
//! Tables are replaced wholesale when a document is loaded and updated per
//! entry by editors. Lookups never fall back to a default: a pair without a
//! rule cannot attach, a row without a drop rule accepts nothing.

mod defaults;

pub use defaults::{default_drop_rules, default_magnet_rules};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{BoardError, BoardResult, DocumentKind};
use crate::models::{DropRule, MagnetInteractionRule, ResourceType, RowType};
use crate::store::{encode_document, parse_document, reject_duplicates};
use crate::validation::{join_messages, validate_magnet_rules};

/// Keyed magnet and drop rule tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RuleTables", into = "RuleTables")]
pub struct RuleStore {
    magnet_rules: BTreeMap<(ResourceType, ResourceType), MagnetInteractionRule>,
    drop_rules: BTreeMap<RowType, DropRule>,
}

impl RuleStore {
    /// Creates an empty store: nothing can attach, nothing can be dropped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with the built-in tables.
    pub fn with_defaults() -> Self {
        let mut store = Self::new();
        store.replace_magnet_rules(default_magnet_rules());
        store.replace_drop_rules(default_drop_rules());
        store
    }

    /// Builder: adds or replaces a magnet rule.
    pub fn with_magnet_rule(mut self, rule: MagnetInteractionRule) -> Self {
        self.update_magnet_rule(rule);
        self
    }

    /// Builder: adds or replaces a drop rule.
    pub fn with_drop_rule(mut self, rule: DropRule) -> Self {
        self.drop_rules.insert(rule.row_type, rule);
        self
    }

    // ======================== Magnet rules ========================

    /// Rule for the exact ordered pair.
    pub fn magnet_rule(
        &self,
        source: ResourceType,
        target: ResourceType,
    ) -> Option<&MagnetInteractionRule> {
        self.magnet_rules.get(&(source, target))
    }

    /// Maximum attachments of `source` on one `target` (0 = unlimited).
    ///
    /// Also 0 when no rule exists; such a pair cannot attach at all, which
    /// [`magnet_rule`](Self::magnet_rule) makes visible.
    pub fn max_attachments_for_type(&self, source: ResourceType, target: ResourceType) -> u32 {
        self.magnet_rule(source, target)
            .map(|r| r.max_count)
            .unwrap_or(0)
    }

    /// Adds or replaces the rule for its pair. Returns the previous rule.
    pub fn update_magnet_rule(
        &mut self,
        rule: MagnetInteractionRule,
    ) -> Option<MagnetInteractionRule> {
        self.magnet_rules.insert(rule.key(), rule)
    }

    /// Removes the rule for a pair.
    pub fn remove_magnet_rule(
        &mut self,
        source: ResourceType,
        target: ResourceType,
    ) -> Option<MagnetInteractionRule> {
        self.magnet_rules.remove(&(source, target))
    }

    /// Replaces the whole magnet table. Later duplicates win.
    pub fn replace_magnet_rules(&mut self, rules: impl IntoIterator<Item = MagnetInteractionRule>) {
        self.magnet_rules = rules.into_iter().map(|r| (r.key(), r)).collect();
    }

    /// All magnet rules in key order.
    pub fn magnet_rules(&self) -> impl Iterator<Item = &MagnetInteractionRule> {
        self.magnet_rules.values()
    }

    /// Rules whose target is `target`.
    pub fn rules_targeting(
        &self,
        target: ResourceType,
    ) -> impl Iterator<Item = &MagnetInteractionRule> {
        self.magnet_rules
            .values()
            .filter(move |r| r.target_type == target)
    }

    /// Rules whose source is `source`.
    pub fn rules_from(&self, source: ResourceType) -> impl Iterator<Item = &MagnetInteractionRule> {
        self.magnet_rules
            .range((source, ResourceType::Operator)..=(source, ResourceType::Truck))
            .map(|(_, r)| r)
    }

    pub fn magnet_rule_count(&self) -> usize {
        self.magnet_rules.len()
    }

    // ======================== Drop rules ========================

    /// Allowed types of an unsplit row (empty when no rule exists).
    pub fn drop_rule(&self, row_type: RowType) -> BTreeSet<ResourceType> {
        self.drop_rules
            .get(&row_type)
            .map(|r| r.allowed_types.clone())
            .unwrap_or_default()
    }

    /// The stored drop rule entry.
    pub fn drop_rule_entry(&self, row_type: RowType) -> Option<&DropRule> {
        self.drop_rules.get(&row_type)
    }

    /// Sets the allowed types of a row.
    pub fn update_drop_rule(
        &mut self,
        row_type: RowType,
        allowed_types: impl IntoIterator<Item = ResourceType>,
    ) {
        self.drop_rules
            .insert(row_type, DropRule::new(row_type, allowed_types));
    }

    /// Replaces the whole drop table. Later duplicates win.
    pub fn replace_drop_rules(&mut self, rules: impl IntoIterator<Item = DropRule>) {
        self.drop_rules = rules.into_iter().map(|r| (r.row_type, r)).collect();
    }

    /// All drop rules in row order.
    pub fn drop_rules(&self) -> impl Iterator<Item = &DropRule> {
        self.drop_rules.values()
    }

    pub fn drop_rule_count(&self) -> usize {
        self.drop_rules.len()
    }

    // ======================== Documents ========================

    /// Encodes the magnet rule list.
    pub fn magnet_rules_json(&self) -> BoardResult<String> {
        let rules: Vec<&MagnetInteractionRule> = self.magnet_rules().collect();
        encode_document(&rules)
    }

    /// Replaces the magnet table from a document.
    ///
    /// Fails on malformed JSON, a repeated pair, a required rule that cannot
    /// attach, or an attachment cycle; the current table is kept on failure.
    /// Returns the number of rules loaded.
    pub fn load_magnet_rules(&mut self, json: &str) -> BoardResult<usize> {
        let rules: Vec<MagnetInteractionRule> = parse_document(json, DocumentKind::MagnetRules)?;
        reject_duplicates(
            rules.iter().map(|r| r.key()),
            DocumentKind::MagnetRules,
            |(s, t)| format!("duplicate rule {s} -> {t}"),
        )?;
        let count = rules.len();
        let mut candidate = self.clone();
        candidate.replace_magnet_rules(rules);
        validate_magnet_rules(&candidate).map_err(|errors| BoardError::InvalidDocument {
            document: DocumentKind::MagnetRules,
            reason: join_messages(&errors),
        })?;
        self.magnet_rules = candidate.magnet_rules;
        Ok(count)
    }

    /// Encodes the drop rule list.
    pub fn drop_rules_json(&self) -> BoardResult<String> {
        let rules: Vec<&DropRule> = self.drop_rules().collect();
        encode_document(&rules)
    }

    /// Replaces the drop table from a document.
    pub fn load_drop_rules(&mut self, json: &str) -> BoardResult<usize> {
        let rules: Vec<DropRule> = parse_document(json, DocumentKind::DropRules)?;
        reject_duplicates(
            rules.iter().map(|r| r.row_type),
            DocumentKind::DropRules,
            |row| format!("duplicate row type {row}"),
        )?;
        let count = rules.len();
        self.replace_drop_rules(rules);
        Ok(count)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuleTables {
    magnet_rules: Vec<MagnetInteractionRule>,
    drop_rules: Vec<DropRule>,
}

impl From<RuleTables> for RuleStore {
    fn from(tables: RuleTables) -> Self {
        let mut store = RuleStore::new();
        store.replace_magnet_rules(tables.magnet_rules);
        store.replace_drop_rules(tables.drop_rules);
        store
    }
}

impl From<RuleStore> for RuleTables {
    fn from(store: RuleStore) -> Self {
        Self {
            magnet_rules: store.magnet_rules.into_values().collect(),
            drop_rules: store.drop_rules.into_values().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_store_is_closed() {
        let store = RuleStore::new();
        assert!(store
            .magnet_rule(ResourceType::Operator, ResourceType::Excavator)
            .is_none());
        assert_eq!(
            store.max_attachments_for_type(ResourceType::Operator, ResourceType::Excavator),
            0
        );
        assert!(store.drop_rule(RowType::Crew).is_empty());
    }

    #[test]
    fn test_direction_matters() {
        let store = RuleStore::new().with_magnet_rule(
            MagnetInteractionRule::new(ResourceType::Operator, ResourceType::Excavator)
                .with_max_count(1),
        );
        assert!(store
            .magnet_rule(ResourceType::Operator, ResourceType::Excavator)
            .is_some());
        assert!(store
            .magnet_rule(ResourceType::Excavator, ResourceType::Operator)
            .is_none());
        assert_eq!(
            store.max_attachments_for_type(ResourceType::Operator, ResourceType::Excavator),
            1
        );
    }

    #[test]
    fn test_update_replaces_by_key() {
        let mut store = RuleStore::new();
        assert!(store
            .update_magnet_rule(MagnetInteractionRule::new(
                ResourceType::Driver,
                ResourceType::Truck
            ))
            .is_none());
        let previous = store
            .update_magnet_rule(
                MagnetInteractionRule::new(ResourceType::Driver, ResourceType::Truck)
                    .with_max_count(2),
            )
            .unwrap();
        assert_eq!(previous.max_count, 0);
        assert_eq!(store.magnet_rule_count(), 1);
        assert_eq!(
            store.max_attachments_for_type(ResourceType::Driver, ResourceType::Truck),
            2
        );
        assert!(store
            .remove_magnet_rule(ResourceType::Driver, ResourceType::Truck)
            .is_some());
        assert_eq!(store.magnet_rule_count(), 0);
    }

    #[test]
    fn test_rules_by_side() {
        let store = RuleStore::with_defaults();
        let to_truck: Vec<ResourceType> = store
            .rules_targeting(ResourceType::Truck)
            .map(|r| r.source_type)
            .collect();
        assert!(to_truck.contains(&ResourceType::Driver));
        assert!(to_truck.contains(&ResourceType::PrivateDriver));
        assert!(!to_truck.contains(&ResourceType::Operator));

        let from_operator = store.rules_from(ResourceType::Operator).count();
        assert_eq!(from_operator, 9);
        assert!(store
            .rules_from(ResourceType::Operator)
            .all(|r| r.source_type == ResourceType::Operator));
    }

    #[test]
    fn test_drop_rule_update() {
        let mut store = RuleStore::with_defaults();
        assert!(store.drop_rule(RowType::Trucks).contains(&ResourceType::Driver));
        store.update_drop_rule(RowType::Trucks, [ResourceType::Truck]);
        let allowed = store.drop_rule(RowType::Trucks);
        assert_eq!(allowed.len(), 1);
        assert!(allowed.contains(&ResourceType::Truck));
        assert_eq!(store.drop_rule_count(), RowType::ALL.len());
    }

    #[test]
    fn test_magnet_document_round_trip() {
        let store = RuleStore::with_defaults();
        let json = store.magnet_rules_json().unwrap();
        let mut other = RuleStore::new();
        let count = other.load_magnet_rules(&json).unwrap();
        assert_eq!(count, store.magnet_rule_count());
        assert_eq!(
            other.magnet_rules().collect::<Vec<_>>(),
            store.magnet_rules().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_malformed_document_keeps_state() {
        let mut store = RuleStore::with_defaults();
        let before = store.clone();

        let err = store.load_magnet_rules("[{\"sourceType\": \"operator\"").unwrap_err();
        assert!(matches!(
            err,
            BoardError::MalformedDocument {
                document: DocumentKind::MagnetRules,
                ..
            }
        ));

        let err = store
            .load_drop_rules(r#"[{"rowType":"crew","allowedTypes":["crane"]}]"#)
            .unwrap_err();
        assert!(matches!(err, BoardError::MalformedDocument { .. }));
        assert_eq!(store, before);
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let mut store = RuleStore::new();
        let json = r#"[
            {"rowType":"crew","allowedTypes":["laborer"]},
            {"rowType":"crew","allowedTypes":["foreman"]}
        ]"#;
        let err = store.load_drop_rules(json).unwrap_err();
        assert!(matches!(
            err,
            BoardError::InvalidDocument { document: DocumentKind::DropRules, reason }
                if reason.contains("crew")
        ));
        assert_eq!(store.drop_rule_count(), 0);
    }

    #[test]
    fn test_inconsistent_magnet_rules_rejected() {
        let mut store = RuleStore::with_defaults();
        let before = store.clone();

        let cyclic = RuleStore::new()
            .with_magnet_rule(MagnetInteractionRule::new(
                ResourceType::Operator,
                ResourceType::Excavator,
            ))
            .with_magnet_rule(MagnetInteractionRule::new(
                ResourceType::Excavator,
                ResourceType::Truck,
            ))
            .with_magnet_rule(MagnetInteractionRule::new(
                ResourceType::Truck,
                ResourceType::Operator,
            ));
        let err = store
            .load_magnet_rules(&cyclic.magnet_rules_json().unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            BoardError::InvalidDocument { document: DocumentKind::MagnetRules, reason }
                if reason.contains("cycle")
        ));
        assert_eq!(store, before);

        let mut rule = MagnetInteractionRule::forbidden(ResourceType::Driver, ResourceType::Truck);
        rule.is_required = true;
        let contradictory = RuleStore::new().with_magnet_rule(rule);
        let err = store
            .load_magnet_rules(&contradictory.magnet_rules_json().unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            BoardError::InvalidDocument { document: DocumentKind::MagnetRules, reason }
                if reason.contains("driver -> truck")
        ));
        assert_eq!(store, before);
    }

    #[test]
    fn test_store_serde_as_lists() {
        let store = RuleStore::with_defaults();
        let value = serde_json::to_value(&store).unwrap();
        assert!(value["magnetRules"].is_array());
        assert_eq!(value["dropRules"].as_array().unwrap().len(), RowType::ALL.len());
        let back: RuleStore = serde_json::from_value(value).unwrap();
        assert_eq!(back, store);
    }
}
