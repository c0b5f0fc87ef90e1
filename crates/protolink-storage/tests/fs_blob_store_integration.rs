use protolink_core::{BlobStore, PrototypeId, StorageError};
use protolink_storage::fs::STAGING_DIR_NAME;
use protolink_storage::FsBlobStore;
use protolink_test_infra::fixtures::{file_set, read_tree};
use protolink_test_infra::Sandbox;
use std::collections::BTreeMap;

fn tree(entries: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
    entries
        .iter()
        .map(|(path, content)| (path.to_string(), content.as_bytes().to_vec()))
        .collect()
}

#[tokio::test]
async fn write_reproduces_the_uploaded_tree() {
    let sandbox = Sandbox::start().unwrap();
    let store = FsBlobStore::open(sandbox.upload_dir()).await.unwrap();
    let id = PrototypeId::new();

    let files = file_set(&[
        ("index.html", "<html></html>"),
        ("css/site.css", "body {}"),
        ("assets/img/logo.svg", "<svg/>"),
    ]);
    store.write(&id, &files).await.unwrap();

    assert!(store.exists(&id).await.unwrap());
    assert_eq!(
        read_tree(&store.path_for(&id)).unwrap(),
        tree(&[
            ("assets/img/logo.svg", "<svg/>"),
            ("css/site.css", "body {}"),
            ("index.html", "<html></html>"),
        ])
    );
}

#[tokio::test]
async fn failed_write_keeps_files_written_so_far() {
    let sandbox = Sandbox::start().unwrap();
    let store = FsBlobStore::open(sandbox.upload_dir()).await.unwrap();
    let id = PrototypeId::new();

    // `a` is written as a file, so the directory for `a/b.html` cannot be made
    let err = store
        .write(&id, &file_set(&[("a", "x"), ("a/b.html", "y")]))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Io(_)));
    assert_eq!(
        read_tree(&store.path_for(&id)).unwrap(),
        tree(&[("a", "x")])
    );
}

#[tokio::test]
async fn replace_drops_files_missing_from_the_new_set() {
    let sandbox = Sandbox::start().unwrap();
    let store = FsBlobStore::open(sandbox.upload_dir()).await.unwrap();
    let id = PrototypeId::new();

    store
        .write(&id, &file_set(&[("index.html", "v1"), ("old.html", "stale")]))
        .await
        .unwrap();
    store
        .replace(&id, &file_set(&[("index.html", "v2")]))
        .await
        .unwrap();

    assert_eq!(
        read_tree(&store.path_for(&id)).unwrap(),
        tree(&[("index.html", "v2")])
    );
}

#[tokio::test]
async fn replace_creates_missing_directory() {
    let sandbox = Sandbox::start().unwrap();
    let store = FsBlobStore::open(sandbox.upload_dir()).await.unwrap();
    let id = PrototypeId::new();

    store
        .replace(&id, &file_set(&[("index.html", "fresh")]))
        .await
        .unwrap();

    assert_eq!(
        read_tree(&store.path_for(&id)).unwrap(),
        tree(&[("index.html", "fresh")])
    );
}

#[tokio::test]
async fn failed_replace_keeps_previous_tree() {
    let sandbox = Sandbox::start().unwrap();
    let store = FsBlobStore::open(sandbox.upload_dir()).await.unwrap();
    let id = PrototypeId::new();
    store
        .write(&id, &file_set(&[("index.html", "v1")]))
        .await
        .unwrap();

    let err = store
        .replace(&id, &file_set(&[("index.html", "v2"), ("../escape.html", "x")]))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Invalid(_)));
    assert_eq!(
        read_tree(&store.path_for(&id)).unwrap(),
        tree(&[("index.html", "v1")])
    );
    assert!(read_tree(&sandbox.upload_dir().join(STAGING_DIR_NAME))
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn list_ids_skips_foreign_entries() {
    let sandbox = Sandbox::start().unwrap();
    let store = FsBlobStore::open(sandbox.upload_dir()).await.unwrap();
    let mut ids = vec![PrototypeId::new(), PrototypeId::new()];
    for id in &ids {
        store
            .write(id, &file_set(&[("index.html", "x")]))
            .await
            .unwrap();
    }

    std::fs::create_dir_all(sandbox.upload_dir().join(STAGING_DIR_NAME)).unwrap();
    std::fs::create_dir_all(sandbox.upload_dir().join("not-an-id")).unwrap();
    std::fs::write(sandbox.upload_dir().join("stray.txt"), "x").unwrap();

    ids.sort();
    assert_eq!(store.list_ids().await.unwrap(), ids);
}

#[tokio::test]
async fn remove_deletes_the_whole_tree() {
    let sandbox = Sandbox::start().unwrap();
    let store = FsBlobStore::open(sandbox.upload_dir()).await.unwrap();
    let id = PrototypeId::new();
    store
        .write(&id, &file_set(&[("a/b/c.html", "deep")]))
        .await
        .unwrap();

    store.remove(&id).await.unwrap();

    assert!(!store.path_for(&id).exists());
    assert!(store.list_ids().await.unwrap().is_empty());
}
