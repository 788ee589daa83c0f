//! Main deidentification engine
//!
//! This module provides the [`DeidentificationEngine`] that turns one input
//! batch into a de-identified output batch while keeping the workspace key
//! store consistent across runs.
//!
//! # Run contract
//!
//! 1. Load the schema and validate the batch against it and the registry
//! 2. Load the key store for every included column
//! 3. Transform included columns one at a time, in row order, reusing known
//!    substitutes and generating fresh ones for unseen values
//! 4. Snapshot `config/` and `keydb/` into `archive/<archive_id>/`
//! 5. Stage the output file and key files, then rename them into place
//! 6. Append an audit record
//!
//! Steps 1–4 never touch the live key store or `files/`. If step 5 fails
//! after any key file was renamed, the key store is restored from the
//! snapshot taken in step 4.
//!
//! # Examples
//!
//! ```no_run
//! use deidb::deidentify::DeidentificationEngine;
//! use deidb::workspace::Workspace;
//!
//! # fn example() -> deidb::domain::Result<()> {
//! let workspace = Workspace::open("/data/study")?;
//! let engine = DeidentificationEngine::default();
//!
//! let outcome = engine.deidentify_file("/data/export.csv", &workspace)?;
//! println!("{} new keys", outcome.summary.new_keys());
//! # Ok(())
//! # }
//! ```

use crate::config::{AuditConfig, DeidentifyConfig};
use crate::deidentify::{
    archive::ArchiveManager,
    audit::{hash_contents, AuditLogger},
    commit::{discard_all, StagedFile},
    keystore::{ColumnKeys, KeyStore},
    registry::{TransformOptions, TransformRegistry, ValueTransformer},
    schema::{ColumnRole, Schema},
    summary::{ColumnStats, RunSummary},
    validation::validate,
};
use crate::domain::context::ResultExt;
use crate::domain::errors::{DeidbError, DeidentifyError};
use crate::domain::ids::{ArchiveId, RunId};
use crate::domain::{Batch, Result};
use crate::workspace::Workspace;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Stem used for output names when a batch has no source file
pub const DEFAULT_BATCH_STEM: &str = "batch";

/// Result of a run: the output batch and what happened
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// De-identified batch, same columns and row order as the input
    pub output: Batch,
    /// Run summary
    pub summary: RunSummary,
}

/// Output file name for an input stem and archive id
///
/// `export` + `20241019153000` → `export_deidentified-20241019153000.csv`
pub fn output_file_name(stem: &str, archive_id: &ArchiveId) -> String {
    format!("{stem}_deidentified-{archive_id}.csv")
}

/// Orchestrates validation, transformation, archiving and commit
///
/// The engine holds no workspace state; every run receives its
/// [`Workspace`] explicitly and loads schema and key store fresh.
pub struct DeidentificationEngine {
    registry: TransformRegistry,
    config: DeidentifyConfig,
    audit: AuditConfig,
}

impl DeidentificationEngine {
    /// Create a new engine
    pub fn new(registry: TransformRegistry, config: DeidentifyConfig, audit: AuditConfig) -> Self {
        Self {
            registry,
            config,
            audit,
        }
    }

    /// Transform registry used to resolve column functions
    pub fn registry(&self) -> &TransformRegistry {
        &self.registry
    }

    /// Whether runs stop before archive and commit
    pub fn is_dry_run(&self) -> bool {
        self.config.dry_run
    }

    /// De-identify a CSV file
    ///
    /// The output is named after the input file's stem.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or for any
    /// failure listed on [`deidentify`](Self::deidentify).
    pub fn deidentify_file(&self, path: impl AsRef<Path>, workspace: &Workspace) -> Result<RunOutcome> {
        let path = path.as_ref();
        let contents =
            fs::read(path).with_context(|| format!("Failed to read input file {}", path.display()))?;
        let batch = Batch::from_reader(contents.as_slice())
            .with_context(|| format!("Failed to parse input file {}", path.display()))?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_BATCH_STEM.to_string());

        let source = RunSource {
            stem,
            path: Some(path.to_path_buf()),
            sha256: Some(hash_contents(&contents)),
        };
        self.run(&batch, source, workspace)
    }

    /// De-identify an in-memory batch
    ///
    /// `stem` names the output file.
    ///
    /// # Errors
    ///
    /// - [`DeidentifyError::SchemaMismatch`] or
    ///   [`DeidentifyError::UnknownTransform`] if validation fails
    /// - [`DeidentifyError::ArchiveFailure`] if the snapshot fails
    /// - [`DeidentifyError::PersistenceFailure`] if the commit fails
    ///
    /// Validation and archive failures leave the workspace untouched.
    pub fn deidentify(&self, batch: &Batch, stem: &str, workspace: &Workspace) -> Result<RunOutcome> {
        let source = RunSource {
            stem: stem.to_string(),
            path: None,
            sha256: None,
        };
        self.run(batch, source, workspace)
    }

    fn run(&self, batch: &Batch, source: RunSource, workspace: &Workspace) -> Result<RunOutcome> {
        let started = Instant::now();
        let mut summary = RunSummary::new(RunId::new(), self.config.dry_run);
        summary.input_path = source.path.clone();
        summary.input_sha256 = source.sha256.clone();

        let span = tracing::info_span!("deidentify", run_id = %summary.run_id);
        let _enter = span.enter();

        crate::log_run_start!(workspace.root().display(), batch.len(), self.config.dry_run);

        let result = self.execute(batch, &source, workspace, &mut summary);
        summary.duration = started.elapsed();

        match result {
            Ok(output) => {
                if !summary.dry_run {
                    self.write_audit(workspace, &summary)?;
                }
                crate::log_run_complete!(
                    summary.rows,
                    summary.new_keys(),
                    summary.reused_keys(),
                    summary.duration
                );
                Ok(RunOutcome { output, summary })
            }
            Err(e) => {
                tracing::error!(error = %e, "Deidentification run failed");
                if summary.dry_run {
                    return Err(e);
                }
                if let Err(audit_error) = self.audit_logger(workspace).and_then(|logger| {
                    logger
                        .log_failure(&summary.run_id, source.path.as_deref(), &e)
                        .map_err(|e| DeidbError::Io(e.to_string()))
                }) {
                    tracing::warn!(error = %audit_error, "Failed to record run failure in audit log");
                }
                Err(e)
            }
        }
    }

    fn execute(
        &self,
        batch: &Batch,
        source: &RunSource,
        workspace: &Workspace,
        summary: &mut RunSummary,
    ) -> Result<Batch> {
        let schema = workspace.load_schema()?;
        validate(&schema, batch.columns(), &self.registry)?;

        let mut keystore = KeyStore::load(&workspace.keydb_dir(), &schema)?;
        let output = self.transform(batch, &schema, &mut keystore, summary)?;

        if self.config.dry_run {
            tracing::info!("Dry run: skipping archive and commit");
            return Ok(output);
        }

        let archive = ArchiveManager::new(workspace);
        let archive_id = archive.snapshot()?;
        summary.archive_id = Some(archive_id.clone());

        let output_path = workspace
            .files_dir()
            .join(output_file_name(&source.stem, &archive_id));
        self.commit(&output, &output_path, &keystore, workspace, &archive, &archive_id, summary)?;
        summary.output_path = Some(output_path);

        Ok(output)
    }

    /// Build the de-identified batch, growing `keystore` with new pairs
    ///
    /// The input batch is never modified. Included columns are processed one
    /// at a time in row order; excluded columns are copied verbatim and empty
    /// cells are passed through without a key.
    ///
    /// # Errors
    ///
    /// Returns [`DeidentifyError::Transform`] if a transform fails or cannot
    /// produce a fresh substitute within the configured number of attempts.
    pub fn transform(
        &self,
        batch: &Batch,
        schema: &Schema,
        keystore: &mut KeyStore,
        summary: &mut RunSummary,
    ) -> Result<Batch> {
        let mut rows: Vec<Vec<String>> = batch.rows().to_vec();
        summary.rows = batch.len();

        for (index, column) in batch.columns().iter().enumerate() {
            let spec = match schema.role(column) {
                ColumnRole::Included(spec) => spec,
                ColumnRole::Excluded | ColumnRole::Unknown => {
                    summary.passthrough_columns.push(column.clone());
                    continue;
                }
            };

            let function = schema.resolve_function(column).ok_or_else(|| {
                DeidentifyError::UnknownTransform {
                    columns: vec![column.clone()],
                }
            })?;
            let transformer =
                self.registry
                    .lookup(function)
                    .map_err(|_| DeidentifyError::UnknownTransform {
                        columns: vec![column.clone()],
                    })?;
            let options = spec.transform_options();
            let keys = keystore.column_mut(column);
            let mut stats = ColumnStats::default();

            for (row, original) in rows.iter_mut().zip(batch.rows()) {
                let original = &original[index];
                if original.is_empty() {
                    stats.blank += 1;
                    continue;
                }

                let substitute = match keys.get(original) {
                    Some(known) => {
                        stats.reused += 1;
                        known.to_string()
                    }
                    None => {
                        let fresh = self.generate(column, original, transformer, &options, keys)?;
                        keys.insert(original.as_str(), fresh.as_str());
                        stats.created += 1;
                        fresh
                    }
                };
                row[index] = substitute;
            }

            tracing::debug!(
                column = %column,
                function,
                reused = stats.reused,
                created = stats.created,
                "Column transformed"
            );
            summary.columns.insert(column.clone(), stats);
        }

        Batch::new(batch.columns().to_vec(), rows)
    }

    /// Draw substitutes until one is not already in use in the column
    ///
    /// A value the transform cannot change may map to itself; the pair stays
    /// reversible as long as no other original shares the substitute.
    fn generate(
        &self,
        column: &str,
        original: &str,
        transformer: &dyn ValueTransformer,
        options: &TransformOptions,
        keys: &ColumnKeys,
    ) -> std::result::Result<String, DeidentifyError> {
        let attempts = self.config.max_substitution_attempts;

        for attempt in 1..=attempts {
            let candidate =
                transformer
                    .transform(original, options)
                    .map_err(|e| DeidentifyError::Transform {
                        column: column.to_string(),
                        message: format!("{}: {e}", transformer.name()),
                    })?;

            if !keys.is_substitute(&candidate) {
                return Ok(candidate);
            }
            tracing::trace!(column, attempt, "Substitute collided, retrying");
        }

        Err(DeidentifyError::Transform {
            column: column.to_string(),
            message: format!(
                "{} produced no unused substitute in {attempts} attempts",
                transformer.name()
            ),
        })
    }

    /// Stage and publish the output and key files
    #[allow(clippy::too_many_arguments)]
    fn commit(
        &self,
        output: &Batch,
        output_path: &Path,
        keystore: &KeyStore,
        workspace: &Workspace,
        archive: &ArchiveManager<'_>,
        archive_id: &ArchiveId,
        summary: &RunSummary,
    ) -> std::result::Result<(), DeidentifyError> {
        let tag = summary.run_id.to_string();

        let mut buffer = Vec::new();
        output.write_to(&mut buffer).map_err(|e| {
            DeidentifyError::PersistenceFailure(format!("Failed to serialize output: {e}"))
        })?;

        fs::create_dir_all(workspace.files_dir()).map_err(|e| {
            DeidentifyError::PersistenceFailure(format!(
                "Failed to create {}: {e}",
                workspace.files_dir().display()
            ))
        })?;
        let staged_output = StagedFile::write(output_path, &tag, &buffer).map_err(|e| {
            DeidentifyError::PersistenceFailure(format!(
                "Failed to stage output {}: {e}",
                output_path.display()
            ))
        })?;

        let staged_keys = match keystore.stage(&workspace.keydb_dir(), &tag) {
            Ok(staged) => staged,
            Err(e) => {
                staged_output.discard();
                return Err(e);
            }
        };

        let mut pending = staged_keys.into_iter();
        while let Some(file) = pending.next() {
            let target = file.target().to_path_buf();
            if let Err(e) = file.commit() {
                discard_all(pending.collect());
                staged_output.discard();
                return Err(rollback(
                    archive,
                    archive_id,
                    format!("Failed to commit key file {}: {e}", target.display()),
                ));
            }
        }

        if let Err(e) = staged_output.commit() {
            return Err(rollback(
                archive,
                archive_id,
                format!("Failed to commit output {}: {e}", output_path.display()),
            ));
        }

        tracing::info!(
            output = %output_path.display(),
            archive_id = %archive_id,
            "Committed output and key store"
        );
        Ok(())
    }

    fn audit_logger(&self, workspace: &Workspace) -> Result<AuditLogger> {
        AuditLogger::new(
            workspace.audit_log_path(),
            self.audit.json_format,
            self.audit.enabled,
        )
        .map_err(|e| DeidbError::Io(e.to_string()))
    }

    fn write_audit(&self, workspace: &Workspace, summary: &RunSummary) -> Result<()> {
        self.audit_logger(workspace)
            .and_then(|logger| {
                logger
                    .log_run(summary)
                    .map_err(|e| DeidbError::Io(e.to_string()))
            })
            .map_err(|e| {
                DeidbError::Io(format!(
                    "Run {} committed {} but the audit record could not be written: {e}",
                    summary.run_id,
                    summary
                        .output_path
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                ))
            })
    }
}

impl Default for DeidentificationEngine {
    fn default() -> Self {
        Self::new(
            TransformRegistry::with_builtins(),
            DeidentifyConfig::default(),
            AuditConfig::default(),
        )
    }
}

/// Where a batch came from
struct RunSource {
    stem: String,
    path: Option<PathBuf>,
    sha256: Option<String>,
}

/// Put the archived key store back after a partial commit
fn rollback(archive: &ArchiveManager<'_>, archive_id: &ArchiveId, message: String) -> DeidentifyError {
    match archive.restore_keystore(archive_id) {
        Ok(()) => DeidentifyError::PersistenceFailure(format!(
            "{message}; key store restored from archive {archive_id}"
        )),
        Err(restore_error) => DeidentifyError::PersistenceFailure(format!(
            "{message}; restoring key store from archive {archive_id} also failed: {restore_error}"
        )),
    }
}

/// Count included-column values per column, for reporting
pub fn included_value_counts(batch: &Batch, schema: &Schema) -> BTreeMap<String, usize> {
    batch
        .columns()
        .iter()
        .filter(|c| matches!(schema.role(c), ColumnRole::Included(_)))
        .filter_map(|c| {
            batch
                .column_values(c)
                .map(|values| (c.clone(), values.filter(|v| !v.is_empty()).count()))
        })
        .collect()
}
