//! Integration tests for Vellum.

use std::io::Write;
use std::sync::Arc;

use rust_xlsxwriter::Workbook;
use serde_json::json;
use tempfile::TempDir;

use vellum::{
    AttributeKind, DocumentStore, ErrorKind, InMemoryStore, IngestConfig, MockQueryCapability,
    PurgePolicy, QuerySession, SessionPolicy, UploadedFile, VectorizerPolicy, Vellum,
    VellumConfig, VellumError,
};

/// Helper to build an in-memory workbook with one sheet.
fn workbook(name: &str, headers: &[&str], rows: &[Vec<serde_json::Value>]) -> UploadedFile {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string(0, col as u16, *header)
            .expect("Failed to write header");
    }
    for (r, row) in rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            let col = col as u16;
            match value {
                serde_json::Value::Number(n) => {
                    sheet
                        .write_number(r, col, n.as_f64().unwrap_or_default())
                        .expect("Failed to write number");
                }
                serde_json::Value::String(s) => {
                    sheet.write_string(r, col, s).expect("Failed to write text");
                }
                _ => {}
            }
        }
    }
    let bytes = workbook.save_to_buffer().expect("Failed to save workbook");
    UploadedFile::new(name, bytes)
}

fn context(store: &Arc<InMemoryStore>, config: VellumConfig) -> (Vellum, Arc<MockQueryCapability>) {
    let mock = Arc::new(MockQueryCapability::new());
    let vellum = Vellum::new(
        store.clone(),
        mock.clone(),
        VectorizerPolicy::default(),
        config,
    );
    (vellum, mock)
}

fn additive() -> VellumConfig {
    VellumConfig {
        ingest: IngestConfig {
            purge: PurgePolicy::Additive,
            ..Default::default()
        },
        ..Default::default()
    }
}

// =============================================================================
// Batch behaviour
// =============================================================================

#[test]
fn test_valid_workbook_and_corrupt_csv() {
    let store = Arc::new(InMemoryStore::new());
    let (vellum, _) = context(&store, VellumConfig::default());

    let a = workbook(
        "a.xlsx",
        &["Site ID", "Alarm Code", "Region"],
        &[
            vec![json!("S1"), json!(1000), json!("North")],
            vec![json!("S2"), json!(2000), json!("South")],
        ],
    );
    let b = UploadedFile::new("b.csv", b"\xff\xfe\x00\x81\n\x9f\xff".to_vec());

    let result = vellum.ingest(&[a, b]).expect("Ingestion aborted");

    assert_eq!(result.collections, vec!["a"]);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].file, "b.csv");
    assert_eq!(result.failures[0].kind, ErrorKind::Parse);

    let stored = store.collection("a").expect("collection a missing");
    let names: Vec<_> = stored.attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["site_id", "alarm_code", "region"]);
    assert_eq!(stored.attributes[1].kind, AttributeKind::Numeric);
    assert_eq!(stored.objects.len(), 2);
    assert_eq!(
        result.schema_text,
        "Table: a\n- site_id: Text\n- alarm_code: Number\n- region: Text\n"
    );
}

#[test]
fn test_rerun_replaces_previous_data() {
    let store = Arc::new(InMemoryStore::new());
    let (vellum, _) = context(&store, additive());

    vellum
        .ingest(&[UploadedFile::new(
            "Site List.csv",
            "site,status,notes\nS1,ready,x\nS2,blocked,y\nS3,ready,z\n",
        )])
        .unwrap();
    assert_eq!(store.object_count("site_list"), 3);

    let result = vellum
        .ingest(&[UploadedFile::new("site list.csv", "site,count\nS9,4\n")])
        .unwrap();

    assert_eq!(result.collections, vec!["site_list"]);
    assert_eq!(store.list_collections().unwrap(), vec!["site_list"]);
    let stored = store.collection("site_list").unwrap();
    assert_eq!(stored.objects.len(), 1);
    assert_eq!(stored.attributes.len(), 2);
    assert_eq!(stored.objects[0].get("count"), Some(&json!(4)));
}

#[test]
fn test_absent_values_are_omitted() {
    let store = Arc::new(InMemoryStore::new());
    let (vellum, _) = context(&store, VellumConfig::default());

    vellum
        .ingest(&[UploadedFile::new("rows.csv", "col_a,col_b,empty\n5,,\n6,seven,\n")])
        .unwrap();

    let stored = store.collection("rows").unwrap();
    assert_eq!(stored.attributes.len(), 2);
    let first = &stored.objects[0];
    assert_eq!(first.len(), 1);
    assert_eq!(first.get("col_a"), Some(&json!(5)));
    assert!(!first.contains_key("col_b"));
}

#[test]
fn test_partial_load_still_counts_collection() {
    let store = Arc::new(InMemoryStore::new());
    store.reject_objects_where("status", json!("corrupt"));
    let (vellum, _) = context(&store, VellumConfig::default());

    let result = vellum
        .ingest(&[UploadedFile::new(
            "orders.csv",
            "order,status\n1,ok\n2,corrupt\n3,ok\n",
        )])
        .unwrap();

    assert_eq!(result.collections, vec!["orders"]);
    let load = &result.summaries[0].load;
    assert_eq!(load.accepted, 2);
    assert_eq!(load.rejected, 1);
    assert!(load.is_partial());
    assert!(load.failure_samples[0].contains("row 2"));
}

#[test]
fn test_reset_and_additive_policies() {
    let store = Arc::new(InMemoryStore::new());
    let (additive_ctx, _) = context(&store, additive());
    additive_ctx
        .ingest(&[UploadedFile::new("first.csv", "a\n1\n")])
        .unwrap();
    additive_ctx
        .ingest(&[UploadedFile::new("second.csv", "a\n1\n")])
        .unwrap();
    assert_eq!(store.list_collections().unwrap(), vec!["first", "second"]);

    let (reset_ctx, _) = context(&store, VellumConfig::default());
    let result = reset_ctx
        .ingest(&[UploadedFile::new("third.csv", "a\n1\n")])
        .unwrap();
    assert_eq!(result.purged, vec!["first", "second"]);
    assert_eq!(store.list_collections().unwrap(), vec!["third"]);
}

#[test]
fn test_name_collision_detected_before_provisioning() {
    let store = Arc::new(InMemoryStore::new());
    let (vellum, _) = context(&store, VellumConfig::default());

    let result = vellum
        .ingest(&[
            UploadedFile::new("Report.csv", "a\n1\n"),
            workbook("report.xlsx", &["b"], &[vec![json!(2)]]),
        ])
        .unwrap();

    assert!(!result.has_collections());
    assert_eq!(result.failures.len(), 2);
    for failure in &result.failures {
        assert_eq!(failure.kind, ErrorKind::NameCollision);
        assert!(failure.reason.contains("Report.csv"));
        assert!(failure.reason.contains("report.xlsx"));
    }
    assert!(store.collection("report").is_none());
}

#[test]
fn test_ingest_from_disk() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("Alarm Log.tsv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(b"Site ID\tAlarm-Code!\tid\nS1\t1000\t1\nS2\tN/A\t2\n")
        .unwrap();

    let store = Arc::new(InMemoryStore::new());
    let (vellum, _) = context(&store, VellumConfig::default());
    let result = vellum.ingest_paths(&[path]).unwrap();

    assert_eq!(result.collections, vec!["alarm_log"]);
    assert_eq!(
        result.schema_text,
        "Table: alarm_log\n- site_id: Text\n- alarm_code_: Text\n- id_field: Number\n"
    );
    assert_eq!(result.summaries[0].source.format, "tsv");
}

// =============================================================================
// Query sessions
// =============================================================================

#[test]
fn test_session_reused_across_questions() {
    let store = Arc::new(InMemoryStore::new());
    let (vellum, mock) = context(&store, VellumConfig::default());

    let result = vellum
        .ingest(&[UploadedFile::new("sites.csv", "site,alarm code\nS1,1000\n")])
        .unwrap();

    let first = vellum.ensure_session(&result).unwrap();
    let second = vellum.ensure_session(&result).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    vellum.ask("How many sites have alarm code 1000?").unwrap();
    vellum.ask("Which of them are in the north?").unwrap();
    assert_eq!(mock.sessions_created(), 1);
}

#[test]
fn test_empty_batch_has_no_session() {
    let store = Arc::new(InMemoryStore::new());
    let (vellum, mock) = context(&store, VellumConfig::default());

    let result = vellum
        .ingest(&[UploadedFile::new("broken.csv", "")])
        .unwrap();
    assert!(!result.has_collections());

    let err = vellum.ensure_session(&result).err().unwrap();
    assert!(matches!(err, VellumError::NoSession(_)));
    assert_eq!(mock.sessions_created(), 0);
}

#[test]
fn test_per_batch_policy_rebinds() {
    let store = Arc::new(InMemoryStore::new());
    let mut config = additive();
    config.query.session_policy = SessionPolicy::PerBatch;
    let (vellum, mock) = context(&store, config);

    let first = vellum
        .ingest(&[UploadedFile::new("one.csv", "a\n1\n")])
        .unwrap();
    vellum.ensure_session(&first).unwrap();
    let second = vellum
        .ingest(&[UploadedFile::new("two.csv", "a\n1\n")])
        .unwrap();
    let session = vellum.ensure_session(&second).unwrap();

    assert_eq!(session.collections().to_vec(), vec!["two".to_string()]);
    assert_eq!(mock.sessions_created(), 2);
}

#[test]
fn test_rerun_with_new_headers_refreshes_prompt() {
    let store = Arc::new(InMemoryStore::new());
    let mut config = VellumConfig::default();
    config.query.session_policy = SessionPolicy::PerBatch;
    let (vellum, mock) = context(&store, config);

    let first = vellum
        .ingest(&[UploadedFile::new("sites.csv", "old_col\n1\n")])
        .unwrap();
    vellum.ensure_session(&first).unwrap();

    let second = vellum
        .ingest(&[UploadedFile::new("sites.csv", "new_col\nx\n")])
        .unwrap();
    vellum.ensure_session(&second).unwrap();

    let answer = vellum.ask("Which columns exist?").unwrap();
    let prompt = answer.trace["system_prompt"].as_str().unwrap();
    assert!(prompt.contains("- new_col: Text"));
    assert!(!prompt.contains("old_col"));
    assert_eq!(mock.sessions_created(), 2);
}
