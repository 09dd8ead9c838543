//! Batch ingestion of uploaded files into collections.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::IngestConfig;
use crate::error::{ErrorKind, Result, VellumError};
use crate::input::{Parser, SourceMetadata, UploadedFile};
use crate::load::{BulkLoader, LoadReport};
use crate::provision::{CollectionProvisioner, PurgePolicy};
use crate::schema::SchemaBuilder;
use crate::store::{DocumentStore, VectorizerPolicy};

/// A file that could not be ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// File name as uploaded.
    pub file: String,
    /// Stage at which the file failed.
    pub kind: ErrorKind,
    /// Human-readable reason.
    pub reason: String,
}

/// Details of one collection created by a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
    /// Collection name.
    pub collection: String,
    /// File the collection was built from.
    pub file: String,
    /// Number of attributes in the schema.
    pub attributes: usize,
    /// Bulk load outcome.
    pub load: LoadReport,
    /// Metadata about the source file.
    pub source: SourceMetadata,
}

/// Aggregate outcome of one ingestion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestionResult {
    /// Created collection names, in input order.
    pub collections: Vec<String>,
    /// Schema descriptions of the created collections, separated by a blank line.
    pub schema_text: String,
    /// Files that could not be ingested, in input order.
    pub failures: Vec<FileFailure>,
    /// Per-collection details, parallel to `collections`.
    pub summaries: Vec<CollectionSummary>,
    /// Collections deleted before processing.
    pub purged: Vec<String>,
}

impl IngestionResult {
    /// Returns true if at least one collection was created.
    pub fn has_collections(&self) -> bool {
        !self.collections.is_empty()
    }
}

/// Derive the target collection name from a file name.
///
/// The extension is stripped, spaces become underscores and the result is
/// lower-cased.
pub fn derive_collection_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    stem.replace(' ', "_").to_lowercase()
}

/// Drives parse, schema, provision and load over a batch of files.
pub struct IngestionOrchestrator {
    parser: Parser,
    builder: SchemaBuilder,
    provisioner: CollectionProvisioner,
    loader: BulkLoader,
    config: IngestConfig,
}

struct Ingested {
    summary: CollectionSummary,
    description: String,
}

impl IngestionOrchestrator {
    /// Create an orchestrator over a store.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        vectorizer: VectorizerPolicy,
        config: IngestConfig,
    ) -> Self {
        Self {
            parser: Parser::with_config(config.parser.clone()),
            builder: SchemaBuilder::new(),
            provisioner: CollectionProvisioner::new(store.clone(), vectorizer),
            loader: BulkLoader::new(store, config.batch_size, config.max_failure_samples),
            config,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest a batch of files.
    ///
    /// Per-file failures are recorded and never abort the batch. The only
    /// error returned is a failed purge under [`PurgePolicy::Reset`].
    pub fn ingest(&self, files: &[UploadedFile]) -> Result<IngestionResult> {
        let names: Vec<String> = files
            .iter()
            .map(|f| derive_collection_name(&f.name))
            .collect();

        let mut outcomes: Vec<Option<Result<Ingested>>> =
            (0..files.len()).map(|_| None).collect();
        for (index, err) in detect_collisions(files, &names) {
            outcomes[index] = Some(Err(err));
        }

        let purged = match self.config.purge {
            PurgePolicy::Reset => self.provisioner.purge_all()?,
            PurgePolicy::Additive => Vec::new(),
        };

        let pending: Vec<usize> = (0..files.len())
            .filter(|&i| outcomes[i].is_none())
            .collect();

        let processed: Vec<(usize, Result<Ingested>)> =
            if self.config.parallel {
                pending
                    .par_iter()
                    .map(|&i| (i, self.ingest_file(&files[i], &names[i])))
                    .collect()
            } else {
                pending
                    .iter()
                    .map(|&i| (i, self.ingest_file(&files[i], &names[i])))
                    .collect()
            };
        for (index, outcome) in processed {
            outcomes[index] = Some(outcome);
        }

        let mut result = IngestionResult {
            purged,
            ..Default::default()
        };
        let mut descriptions = Vec::new();

        for (file, outcome) in files.iter().zip(outcomes) {
            match outcome {
                Some(Ok(ingested)) => {
                    result.collections.push(ingested.summary.collection.clone());
                    result.summaries.push(ingested.summary);
                    descriptions.push(ingested.description);
                }
                Some(Err(e)) => {
                    error!(file = %file.name, kind = %e.kind(), "Failed to ingest file: {}", e);
                    result.failures.push(FileFailure {
                        file: file.name.clone(),
                        kind: e.kind(),
                        reason: e.to_string(),
                    });
                }
                None => {}
            }
        }
        result.schema_text = descriptions.join("\n\n");

        info!(
            created = result.collections.len(),
            failed = result.failures.len(),
            "ingestion finished"
        );
        Ok(result)
    }

    fn ingest_file(&self, file: &UploadedFile, name: &str) -> Result<Ingested> {
        let (table, source) = self.parser.parse(file)?;
        let (schema, description) = self.builder.build(name, &table)?;
        let handle = self.provisioner.provision(name, &schema)?;
        let load = self.loader.load(&handle, &table);

        if load.is_partial() {
            warn!(
                collection = name,
                rejected = load.rejected,
                "collection created with rejected rows"
            );
        }
        info!(collection = name, rows = load.accepted, "Uploaded and created collection");

        Ok(Ingested {
            summary: CollectionSummary {
                collection: name.to_string(),
                file: file.name.clone(),
                attributes: schema.attribute_count(),
                load,
                source,
            },
            description,
        })
    }
}

/// Every file whose derived name is shared with another file in the batch.
fn detect_collisions(files: &[UploadedFile], names: &[String]) -> Vec<(usize, VellumError)> {
    let mut groups: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (index, name) in names.iter().enumerate() {
        groups.entry(name.as_str()).or_default().push(index);
    }

    groups
        .into_iter()
        .filter(|(_, indices)| indices.len() > 1)
        .flat_map(|(name, indices)| {
            let involved: Vec<String> = indices.iter().map(|&i| files[i].name.clone()).collect();
            indices.into_iter().map(move |i| {
                (
                    i,
                    VellumError::NameCollision {
                        collection: name.to_string(),
                        files: involved.clone(),
                    },
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn orchestrator(store: &Arc<InMemoryStore>, config: IngestConfig) -> IngestionOrchestrator {
        IngestionOrchestrator::new(store.clone(), VectorizerPolicy::default(), config)
    }

    #[test]
    fn test_derive_collection_name() {
        assert_eq!(derive_collection_name("Site Inventory.xlsx"), "site_inventory");
        assert_eq!(derive_collection_name("alarms.v2.csv"), "alarms.v2");
        assert_eq!(derive_collection_name("README"), "readme");
    }

    #[test]
    fn test_bad_file_does_not_abort_batch() {
        let store = Arc::new(InMemoryStore::new());
        let files = vec![
            UploadedFile::new("good.csv", "site,count\nnorth,3\nsouth,4\n"),
            UploadedFile::new("bad.csv", "name\n"),
            UploadedFile::new("notes.docx", "irrelevant"),
        ];

        let result = orchestrator(&store, IngestConfig::default())
            .ingest(&files)
            .unwrap();

        assert_eq!(result.collections, vec!["good"]);
        assert_eq!(result.failures.len(), 2);
        assert_eq!(result.failures[0].file, "bad.csv");
        assert_eq!(result.failures[0].kind, ErrorKind::Parse);
        assert_eq!(result.failures[1].file, "notes.docx");
        assert_eq!(store.object_count("good"), 2);
    }

    #[test]
    fn test_schema_text_joined() {
        let store = Arc::new(InMemoryStore::new());
        let files = vec![
            UploadedFile::new("a.csv", "x\n1\n"),
            UploadedFile::new("b.csv", "y\nhello\n"),
        ];
        let result = orchestrator(&store, IngestConfig::default())
            .ingest(&files)
            .unwrap();
        assert_eq!(
            result.schema_text,
            "Table: a\n- x: Number\n\n\nTable: b\n- y: Text\n"
        );
    }

    #[test]
    fn test_name_collision_fails_every_file_involved() {
        let store = Arc::new(InMemoryStore::new());
        let files = vec![
            UploadedFile::new("Sites.csv", "a\n1\n"),
            UploadedFile::new("other.csv", "b\n2\n"),
            UploadedFile::new("sites.xlsx", "not a workbook"),
        ];
        let result = orchestrator(&store, IngestConfig::default())
            .ingest(&files)
            .unwrap();

        assert_eq!(result.collections, vec!["other"]);
        assert_eq!(result.failures.len(), 2);
        assert!(result
            .failures
            .iter()
            .all(|f| f.kind == ErrorKind::NameCollision));
        assert!(!store.collection_exists("sites").unwrap());
    }

    #[test]
    fn test_reset_purges_unrelated_collections() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_collection("stale", Vec::new());

        let result = orchestrator(&store, IngestConfig::default())
            .ingest(&[UploadedFile::new("fresh.csv", "a\n1\n")])
            .unwrap();
        assert_eq!(result.purged, vec!["stale"]);
        assert_eq!(store.list_collections().unwrap(), vec!["fresh"]);
    }

    #[test]
    fn test_additive_keeps_unrelated_collections() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_collection("kept", Vec::new());
        let config = IngestConfig {
            purge: PurgePolicy::Additive,
            ..Default::default()
        };

        let result = orchestrator(&store, config)
            .ingest(&[UploadedFile::new("fresh.csv", "a\n1\n")])
            .unwrap();
        assert!(result.purged.is_empty());
        assert_eq!(store.list_collections().unwrap(), vec!["kept", "fresh"]);
    }

    #[test]
    fn test_purge_failure_aborts_run() {
        let store = Arc::new(InMemoryStore::new());
        store.set_unreachable(true);
        let result = orchestrator(&store, IngestConfig::default())
            .ingest(&[UploadedFile::new("a.csv", "a\n1\n")]);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Provision);
    }

    #[test]
    fn test_provision_failure_is_isolated() {
        let store = Arc::new(InMemoryStore::new());
        store.reject_collection("rejected");
        let files = vec![
            UploadedFile::new("rejected.csv", "a\n1\n"),
            UploadedFile::new("accepted.csv", "a\n1\n"),
        ];
        let result = orchestrator(&store, IngestConfig::default())
            .ingest(&files)
            .unwrap();
        assert_eq!(result.collections, vec!["accepted"]);
        assert_eq!(result.failures[0].kind, ErrorKind::Provision);
    }

    #[test]
    fn test_parallel_keeps_input_order() {
        let store = Arc::new(InMemoryStore::new());
        let files: Vec<_> = (0..8)
            .map(|i| UploadedFile::new(format!("file{}.csv", i), "v\n1\n2\n"))
            .collect();
        let config = IngestConfig {
            parallel: true,
            ..Default::default()
        };
        let result = orchestrator(&store, config).ingest(&files).unwrap();

        let expected: Vec<String> = (0..8).map(|i| format!("file{}", i)).collect();
        assert_eq!(result.collections, expected);
        assert!(result.summaries.iter().all(|s| s.load.accepted == 2));
    }
}
