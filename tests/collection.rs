// tests/collection.rs
//! Import, persistence and recovery through the collection manager.

mod common;

use common::*;
use pinscan::{
    ingest_rows, start_discovery, CollectionManager, CollectionStore, GroupName, GroupStatus,
    IngestRow, ItemStatus, JsonFileStore, Orchestrator, ParentLabel,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn row(label: &str, group: &str, code: &str, weight: u64) -> IngestRow {
    IngestRow {
        label: label.to_string(),
        group: group.to_string(),
        code: code.to_string(),
        weight,
    }
}

fn maharashtra() -> ParentLabel {
    ParentLabel::new("Maharashtra").unwrap()
}

fn pune() -> GroupName {
    GroupName::new("Pune").unwrap()
}

#[tokio::test(start_paused = true)]
async fn completed_run_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    {
        let manager = CollectionManager::open(Arc::new(JsonFileStore::new(&path))).await;
        let groups = ingest_rows(vec![
            row("Maharashtra", "Pune", "411001", 3_124_458),
            row("Maharashtra", "Pune", "411002", 3_124_458),
        ])
        .unwrap();
        manager.import(groups).await;

        let extractor = shared(
            ScriptedExtractor::new(Duration::from_millis(50))
                .answer("411001", vec![record("Ruby Hall Clinic", "40 Sassoon Rd")])
                .answer("411002", vec![record("Jehangir Hospital", "32 Sassoon Rd")]),
        );
        let running = manager
            .update_group(&maharashtra(), &pune(), start_discovery)
            .await
            .unwrap();
        let session = Orchestrator::new(extractor).spawn(running);

        let mut updates = 0;
        let done = manager.track(session, |_| updates += 1).await.unwrap();
        assert_eq!(done.status(), GroupStatus::Completed);
        assert!(updates > 0);
    }

    let reopened = CollectionManager::open(Arc::new(JsonFileStore::new(&path))).await;
    let pune = reopened.group(&maharashtra(), &pune()).await.unwrap();
    assert_eq!(pune.status(), GroupStatus::Completed);
    assert_eq!(pune.result_count(), 2);
    assert_eq!(pune.weight(), 3_124_458);
}

#[tokio::test(start_paused = true)]
async fn interrupted_run_comes_back_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let store = Arc::new(JsonFileStore::new(&path));

    let manager = CollectionManager::open(store.clone()).await;
    manager
        .import(vec![group("Maharashtra", "Pune", &["411001", "411002"])])
        .await;
    let extractor = shared(
        ScriptedExtractor::new(Duration::from_secs(30))
            .latency("411001", Duration::from_millis(10))
            .answer("411001", vec![record("Ruby Hall Clinic", "40 Sassoon Rd")]),
    );
    let running = manager
        .update_group(&maharashtra(), &pune(), start_discovery)
        .await
        .unwrap();
    let mut session = Orchestrator::new(extractor).spawn(running);

    // Commit snapshots until one item is scanned, then walk away as if the
    // process died with the group still running.
    while let Some(snapshot) = session.next_update().await {
        manager.commit(snapshot.clone()).await.unwrap();
        if snapshot.scanned_count() == 1 {
            break;
        }
    }
    let saved = store.load().await.unwrap().unwrap();
    let saved_pune = saved.group(&maharashtra(), &pune()).unwrap();
    assert_eq!(saved_pune.status(), GroupStatus::Running);
    drop(session);

    let reopened = CollectionManager::open(Arc::new(JsonFileStore::new(&path))).await;
    let recovered = reopened.group(&maharashtra(), &pune()).await.unwrap();
    assert_eq!(recovered.status(), GroupStatus::Stopped);
    assert_eq!(
        recovered.items().iter().map(|i| i.status).collect::<Vec<_>>(),
        vec![ItemStatus::Scanned, ItemStatus::Pending]
    );
    assert_eq!(recovered.result_count(), 1);
}

#[tokio::test]
async fn reimport_merges_without_losing_progress() {
    let manager = CollectionManager::in_memory().await;
    manager
        .import(
            ingest_rows(vec![
                row("Maharashtra", "Pune", "411001", 100),
                row("Maharashtra", "Pune", "411002", 100),
            ])
            .unwrap(),
        )
        .await;

    let extractor = shared(
        ScriptedExtractor::new(Duration::from_millis(1))
            .answer("411001", vec![record("Ruby Hall Clinic", "40 Sassoon Rd")]),
    );
    let running = manager
        .update_group(&maharashtra(), &pune(), start_discovery)
        .await
        .unwrap();
    manager
        .track(Orchestrator::new(extractor).spawn(running), |_| {})
        .await
        .unwrap();

    let report = manager
        .import(
            ingest_rows(vec![
                row("Maharashtra", "Pune", "411001", 150),
                row("Maharashtra", "Pune", "411003", 150),
                row("Maharashtra", "Nagpur", "440001", 20),
            ])
            .unwrap(),
        )
        .await;
    assert_eq!(report.groups_added, 1);
    assert_eq!(report.groups_updated, 1);
    assert_eq!(report.codes_added, 1);

    let merged = manager.group(&maharashtra(), &pune()).await.unwrap();
    let items: Vec<(&str, ItemStatus)> = merged
        .items()
        .iter()
        .map(|i| (i.code.as_str(), i.status))
        .collect();
    assert_eq!(
        items,
        vec![
            ("411001", ItemStatus::Scanned),
            ("411002", ItemStatus::Scanned),
            ("411003", ItemStatus::Pending),
        ]
    );
    assert_eq!(merged.weight(), 150);
    assert_eq!(merged.result_count(), 1);

    let names: Vec<String> = manager
        .groups_under(&maharashtra())
        .await
        .unwrap()
        .iter()
        .map(|g| g.name().to_string())
        .collect();
    assert_eq!(names, vec!["Nagpur", "Pune"]);
}

#[tokio::test]
async fn reset_removes_snapshot_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let manager = CollectionManager::open(Arc::new(JsonFileStore::new(&path))).await;

    manager
        .import(vec![group("Goa", "Panaji", &["403001"])])
        .await;
    assert!(path.exists());

    manager.reset().await;
    assert!(!path.exists());
}

#[tokio::test]
async fn unreadable_snapshot_is_kept_aside_on_import() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let newer = r#"{"version":2,"savedAt":"2026-09-01T00:00:00Z","collection":{}}"#;
    std::fs::write(&path, newer).unwrap();

    let manager = CollectionManager::open(Arc::new(JsonFileStore::new(&path))).await;
    assert!(manager.groups().await.is_empty());
    manager
        .import(vec![group("Goa", "Panaji", &["403001"])])
        .await;

    let kept: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|p| {
            p.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("store.json.unreadable-")
        })
        .collect();
    assert_eq!(kept.len(), 1);
    assert_eq!(std::fs::read_to_string(&kept[0]).unwrap(), newer);

    let saved = JsonFileStore::new(&path).load().await.unwrap().unwrap();
    assert_eq!(saved.group_count(), 1);
}
