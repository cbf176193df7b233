//! Board configuration context.
//!
//! [`BoardStore`] owns everything the board consults when a magnet is
//! dragged: the global rule tables, the job-type configuration set, and the
//! layout of every job row. It is the single logical owner of those
//! snapshots; layout mutations produce new [`JobRowConfig`] values that are
//! written back through [`BoardStore::update_job_row_config`].
//!
//! # Documents
//!
//! | Document | Save | Load |
//! |----------|------|------|
//! | Job types | [`job_types_json`](BoardStore::job_types_json) | [`load_job_types`](BoardStore::load_job_types) |
//! | Magnet rules | [`magnet_rules_json`](BoardStore::magnet_rules_json) | [`load_magnet_rules`](BoardStore::load_magnet_rules) |
//! | Drop rules | [`drop_rules_json`](BoardStore::drop_rules_json) | [`load_drop_rules`](BoardStore::load_drop_rules) |
//! | Row layouts | [`layouts_json`](BoardStore::layouts_json) | [`load_layouts`](BoardStore::load_layouts) |
//!
//! Each document loads independently. A failed load leaves the previous
//! state untouched.

mod document;

pub(crate) use document::{encode_document, parse_document, reject_duplicates};

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use crate::drop::DropValidator;
use crate::error::{BoardError, BoardResult, DocumentKind};
use crate::layout::{JobRowConfig, LayoutEditor, LayoutSettings};
use crate::models::{
    standard_job_types, JobTypeConfiguration, MagnetInteractionRule, ResourceType, RowType,
};
use crate::resolver::CompatibilityResolver;
use crate::rules::RuleStore;
use crate::validation::{join_messages, validate_job_types, validate_row_layout};

/// Process-wide board configuration.
#[derive(Debug, Clone, Default)]
pub struct BoardStore {
    rules: RuleStore,
    job_types: Vec<JobTypeConfiguration>,
    layouts: BTreeMap<(String, RowType), JobRowConfig>,
    editor: LayoutEditor,
}

impl BoardStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with the built-in rule tables and job types.
    pub fn with_defaults() -> Self {
        Self {
            rules: RuleStore::with_defaults(),
            job_types: standard_job_types(),
            ..Self::default()
        }
    }

    /// Builder: sets the layout defaults used by [`editor`](Self::editor).
    pub fn with_settings(mut self, settings: LayoutSettings) -> Self {
        self.editor = LayoutEditor::new(settings);
        self
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RuleStore {
        &mut self.rules
    }

    /// Layout editor configured with this store's settings.
    pub fn editor(&self) -> &LayoutEditor {
        &self.editor
    }

    /// Attachment resolver over the current magnet table.
    pub fn resolver(&self) -> CompatibilityResolver<'_> {
        CompatibilityResolver::new(&self.rules)
    }

    /// Drop validator over the current drop table.
    pub fn drop_validator(&self) -> DropValidator<'_> {
        DropValidator::new(&self.rules)
    }

    // ======================== Row layouts ========================

    /// Stored layout of a job row.
    pub fn job_row_config(&self, job_id: &str, row_type: RowType) -> Option<&JobRowConfig> {
        self.layouts.get(&(job_id.to_string(), row_type))
    }

    /// Stores a row layout, replacing the previous snapshot.
    ///
    /// A snapshot replaces the stored one only when its revision is higher,
    /// or when the revision is equal and the content identical. Two edits
    /// derived from the same base carry the same revision; the second one
    /// to arrive is stale.
    ///
    /// # Errors
    /// - [`BoardError::StaleRevision`] when the snapshot is not newer than
    ///   the stored one
    /// - [`BoardError::InvariantViolation`] when the revision is exhausted
    ///   (`u64::MAX`) or the layout fails structural validation (duplicate
    ///   box ids, a type allowed in two boxes, rules outside a box's
    ///   allow-list)
    pub fn update_job_row_config(&mut self, config: JobRowConfig) -> BoardResult<()> {
        if config.revision == u64::MAX {
            return Err(BoardError::InvariantViolation(format!(
                "row {} of job '{}' has no revisions left",
                config.row_type, config.job_id
            )));
        }
        let key = (config.job_id.clone(), config.row_type);
        if let Some(stored) = self.layouts.get(&key) {
            let newer = config.revision > stored.revision;
            let same = config.revision == stored.revision && config == *stored;
            if !newer && !same {
                warn!(
                    job_id = %config.job_id,
                    row_type = %config.row_type,
                    stored = stored.revision,
                    offered = config.revision,
                    "rejected stale row config"
                );
                return Err(BoardError::StaleRevision {
                    job_id: config.job_id,
                    row_type: config.row_type,
                    stored: stored.revision,
                    offered: config.revision,
                });
            }
        }
        validate_row_layout(&config)
            .map_err(|errors| BoardError::InvariantViolation(join_messages(&errors)))?;
        self.layouts.insert(key, config);
        Ok(())
    }

    /// Removes a stored row layout. The next save for the row starts fresh.
    pub fn remove_job_row_config(&mut self, job_id: &str, row_type: RowType) -> Option<JobRowConfig> {
        self.layouts.remove(&(job_id.to_string(), row_type))
    }

    /// Stored layouts of one job, in row order.
    pub fn job_row_configs<'a>(&'a self, job_id: &'a str) -> impl Iterator<Item = &'a JobRowConfig> {
        self.layouts
            .values()
            .filter(move |config| config.job_id == job_id)
    }

    pub fn layout_count(&self) -> usize {
        self.layouts.len()
    }

    // ======================== Rules ========================

    /// Allowed types of an unsplit row (empty when no rule exists).
    pub fn drop_rule(&self, row_type: RowType) -> BTreeSet<ResourceType> {
        self.rules.drop_rule(row_type)
    }

    pub fn update_drop_rule(
        &mut self,
        row_type: RowType,
        allowed_types: impl IntoIterator<Item = ResourceType>,
    ) {
        self.rules.update_drop_rule(row_type, allowed_types);
    }

    pub fn magnet_rule(
        &self,
        source: ResourceType,
        target: ResourceType,
    ) -> Option<&MagnetInteractionRule> {
        self.rules.magnet_rule(source, target)
    }

    /// Maximum attachments of `source` on one `target` (0 = unlimited, or no rule).
    pub fn max_attachments_for_type(&self, source: ResourceType, target: ResourceType) -> u32 {
        self.rules.max_attachments_for_type(source, target)
    }

    pub fn update_magnet_rule(&mut self, rule: MagnetInteractionRule) {
        self.rules.update_magnet_rule(rule);
    }

    // ======================== Job types ========================

    pub fn job_types(&self) -> &[JobTypeConfiguration] {
        &self.job_types
    }

    pub fn job_type(&self, id: &str) -> Option<&JobTypeConfiguration> {
        self.job_types.iter().find(|config| config.id == id)
    }

    /// Adds or replaces a job type by id.
    ///
    /// # Errors
    /// [`BoardError::InvariantViolation`] when a row requires a type it
    /// does not allow.
    pub fn upsert_job_type(&mut self, config: JobTypeConfiguration) -> BoardResult<()> {
        config.check()?;
        match self.job_types.iter_mut().find(|c| c.id == config.id) {
            Some(existing) => *existing = config,
            None => self.job_types.push(config),
        }
        Ok(())
    }

    pub fn remove_job_type(&mut self, id: &str) -> Option<JobTypeConfiguration> {
        let index = self.job_types.iter().position(|c| c.id == id)?;
        Some(self.job_types.remove(index))
    }

    // ======================== Documents ========================

    pub fn job_types_json(&self) -> BoardResult<String> {
        encode_document(&self.job_types)
    }

    /// Replaces the job-type set from a document.
    ///
    /// Fails on malformed JSON, repeated ids, a row listed twice, or a row
    /// requiring a type it does not allow.
    pub fn load_job_types(&mut self, json: &str) -> BoardResult<usize> {
        let configs: Vec<JobTypeConfiguration> = parse_document(json, DocumentKind::JobTypes)?;
        validate_job_types(&configs).map_err(|errors| BoardError::InvalidDocument {
            document: DocumentKind::JobTypes,
            reason: join_messages(&errors),
        })?;
        let count = configs.len();
        self.job_types = configs;
        info!(document = %DocumentKind::JobTypes, count, "loaded document");
        Ok(count)
    }

    pub fn magnet_rules_json(&self) -> BoardResult<String> {
        self.rules.magnet_rules_json()
    }

    pub fn load_magnet_rules(&mut self, json: &str) -> BoardResult<usize> {
        let count = self.rules.load_magnet_rules(json)?;
        info!(document = %DocumentKind::MagnetRules, count, "loaded document");
        Ok(count)
    }

    pub fn drop_rules_json(&self) -> BoardResult<String> {
        self.rules.drop_rules_json()
    }

    pub fn load_drop_rules(&mut self, json: &str) -> BoardResult<usize> {
        let count = self.rules.load_drop_rules(json)?;
        info!(document = %DocumentKind::DropRules, count, "loaded document");
        Ok(count)
    }

    pub fn layouts_json(&self) -> BoardResult<String> {
        let configs: Vec<&JobRowConfig> = self.layouts.values().collect();
        encode_document(&configs)
    }

    /// Replaces every stored row layout from a document.
    ///
    /// Each layout must pass structural validation and each
    /// `(job, row type)` may appear once. Revisions are taken as stored.
    pub fn load_layouts(&mut self, json: &str) -> BoardResult<usize> {
        let configs: Vec<JobRowConfig> = parse_document(json, DocumentKind::RowLayouts)?;
        reject_duplicates(
            configs.iter().map(|c| (c.job_id.as_str(), c.row_type)),
            DocumentKind::RowLayouts,
            |(job, row)| format!("duplicate layout for job '{job}' row {row}"),
        )?;
        for config in &configs {
            if config.revision == u64::MAX {
                return Err(BoardError::InvalidDocument {
                    document: DocumentKind::RowLayouts,
                    reason: format!(
                        "row {} of job '{}' has no revisions left",
                        config.row_type, config.job_id
                    ),
                });
            }
            validate_row_layout(config).map_err(|errors| BoardError::InvalidDocument {
                document: DocumentKind::RowLayouts,
                reason: join_messages(&errors),
            })?;
        }

        let count = configs.len();
        self.layouts = configs
            .into_iter()
            .map(|c| ((c.job_id.clone(), c.row_type), c))
            .collect();
        info!(document = %DocumentKind::RowLayouts, count, "loaded document");
        Ok(count)
    }
}
