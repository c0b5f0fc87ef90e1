use jiff::{SignedDuration, Timestamp};
use protolink_core::{MetadataIndex, PageRequest, ReadIndex, ShortCode, StorageError};
use protolink_storage::JsonFileIndex;
use protolink_test_infra::fixtures::record;
use protolink_test_infra::Sandbox;
use std::sync::Arc;

#[tokio::test]
async fn records_survive_reopen() {
    let sandbox = Sandbox::start().unwrap();
    let created = Timestamp::from_second(1_745_143_200).unwrap();
    let rec = record("landing page", "a1b2c3d4", created);

    {
        let index = JsonFileIndex::open_in(sandbox.data_dir()).await.unwrap();
        index.upsert(rec.clone()).await.unwrap();
    }

    let reopened = JsonFileIndex::open_in(sandbox.data_dir()).await.unwrap();
    assert_eq!(reopened.get_by_id(&rec.id).await.unwrap(), Some(rec.clone()));
    assert_eq!(
        reopened
            .get_by_short_code(&ShortCode::new_unchecked("a1b2c3d4"))
            .await
            .unwrap(),
        Some(rec)
    );
}

#[tokio::test]
async fn delete_survives_reopen() {
    let sandbox = Sandbox::start().unwrap();
    let now = Timestamp::now();
    let kept = record("kept", "code0001", now);
    let dropped = record("dropped", "code0002", now);

    {
        let index = JsonFileIndex::open_in(sandbox.data_dir()).await.unwrap();
        index.upsert(kept.clone()).await.unwrap();
        index.upsert(dropped.clone()).await.unwrap();
        assert!(index.delete(&dropped.id).await.unwrap());
    }

    let reopened = JsonFileIndex::open_in(sandbox.data_dir()).await.unwrap();
    assert_eq!(reopened.all().await.unwrap(), vec![kept]);
}

#[tokio::test]
async fn concurrent_upserts_are_all_durable() {
    let sandbox = Sandbox::start().unwrap();
    let index = Arc::new(JsonFileIndex::open_in(sandbox.data_dir()).await.unwrap());
    let base = Timestamp::from_second(1_745_143_200).unwrap();

    let mut handles = vec![];
    for i in 0..20i64 {
        let index = Arc::clone(&index);
        handles.push(tokio::spawn(async move {
            let created = base + SignedDuration::from_secs(i);
            let rec = record(&format!("proto-{i}"), &format!("code-{i:03}"), created);
            index.upsert(rec).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    drop(index);

    // Writers in the same process serialize on the index lock, so no update
    // is lost. Separate processes sharing a file get no such guarantee.
    let reopened = JsonFileIndex::open_in(sandbox.data_dir()).await.unwrap();
    let page = reopened.list(PageRequest::new(1, 100)).await.unwrap();
    assert_eq!(page.total, 20);
    assert_eq!(page.items[0].name, "proto-19");
    assert_eq!(page.items[19].name, "proto-0");
}

#[tokio::test]
async fn conflicting_upsert_leaves_file_untouched() {
    let sandbox = Sandbox::start().unwrap();
    let index = JsonFileIndex::open_in(sandbox.data_dir()).await.unwrap();
    let now = Timestamp::now();
    index.upsert(record("one", "samecode", now)).await.unwrap();
    let before = std::fs::read(index.path()).unwrap();

    let err = index
        .upsert(record("two", "samecode", now))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Conflict(_)));
    assert_eq!(std::fs::read(index.path()).unwrap(), before);
}

#[tokio::test]
async fn no_temp_files_left_behind() {
    let sandbox = Sandbox::start().unwrap();
    let index = JsonFileIndex::open_in(sandbox.data_dir()).await.unwrap();
    for i in 0..3 {
        index
            .upsert(record(&format!("p{i}"), &format!("code000{i}"), Timestamp::now()))
            .await
            .unwrap();
    }

    let names: Vec<_> = std::fs::read_dir(sandbox.data_dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["prototypes.json".to_string()]);
}
