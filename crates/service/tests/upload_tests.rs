//! Resumable upload tracking tests.

mod common;

use common::TestMetadata;
use common::fixtures::checksum;
use reposync_core::ErrorKind;
use reposync_core::config::AppConfig;
use time::{Duration, OffsetDateTime};

const CHUNK_SIZE: i64 = 16 * 1024 * 1024;

#[tokio::test]
async fn test_upload_lifecycle() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let uploads = &services.uploads;
    let file_hash = checksum("file.rpm");

    assert_eq!(
        uploads
            .get_existing_upload("org", &file_hash, CHUNK_SIZE)
            .await
            .unwrap(),
        None
    );

    uploads
        .store_file_upload("org", "upload-1", &file_hash, CHUNK_SIZE)
        .await
        .unwrap();

    let chunk_a = checksum("chunk-a");
    let chunk_b = checksum("chunk-b");
    assert!(uploads.store_chunk_upload("org", "upload-1", &chunk_a).await.unwrap());
    assert!(uploads.store_chunk_upload("org", "upload-1", &chunk_b).await.unwrap());

    let existing = uploads
        .get_existing_upload("org", &file_hash, CHUNK_SIZE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(existing.upload_uuid, "upload-1");
    assert_eq!(existing.completed_chunks, vec![chunk_a, chunk_b]);

    assert!(uploads.delete_upload("upload-1").await.unwrap());
    assert!(!uploads.delete_upload("upload-1").await.unwrap());
    assert_eq!(
        uploads
            .get_existing_upload("org", &file_hash, CHUNK_SIZE)
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn test_chunk_recorded_once() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let uploads = &services.uploads;
    let file_hash = checksum("file.rpm");
    let chunk = checksum("chunk");

    uploads
        .store_file_upload("org", "upload-1", &file_hash, CHUNK_SIZE)
        .await
        .unwrap();
    assert!(uploads.store_chunk_upload("org", "upload-1", &chunk).await.unwrap());
    assert!(!uploads.store_chunk_upload("org", "upload-1", &chunk).await.unwrap());
    // Upper-case hex is the same chunk.
    assert!(
        !uploads
            .store_chunk_upload("org", "upload-1", &chunk.to_uppercase())
            .await
            .unwrap()
    );

    let existing = uploads
        .get_existing_upload("org", &file_hash, CHUNK_SIZE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(existing.completed_chunks, vec![chunk]);
}

// Convergence only: the single-connection SQLite pool serializes these
// updates. postgres_tests.rs races them over a multi-connection pool.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_chunk_reports() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let file_hash = checksum("file.rpm");
    let chunk = checksum("chunk");

    services
        .uploads
        .store_file_upload("org", "upload-1", &file_hash, CHUNK_SIZE)
        .await
        .unwrap();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let uploads = services.uploads.clone();
            let chunk = chunk.clone();
            tokio::spawn(async move { uploads.store_chunk_upload("org", "upload-1", &chunk).await })
        })
        .collect();

    let mut recorded = 0;
    for handle in futures::future::join_all(handles).await {
        if handle.unwrap().unwrap() {
            recorded += 1;
        }
    }
    assert_eq!(recorded, 1);

    let existing = services
        .uploads
        .get_existing_upload("org", &file_hash, CHUNK_SIZE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(existing.completed_chunks.len(), 1);
}

#[tokio::test]
async fn test_uploads_are_scoped() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let uploads = &services.uploads;
    let file_hash = checksum("file.rpm");

    uploads
        .store_file_upload("org-a", "upload-a", &file_hash, CHUNK_SIZE)
        .await
        .unwrap();

    // Other org, other chunk size: no resumable upload.
    assert_eq!(
        uploads
            .get_existing_upload("org-b", &file_hash, CHUNK_SIZE)
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        uploads
            .get_existing_upload("org-a", &file_hash, CHUNK_SIZE / 2)
            .await
            .unwrap(),
        None
    );

    // Chunks cannot be reported against another org's upload.
    assert!(
        !uploads
            .store_chunk_upload("org-b", "upload-a", &checksum("chunk"))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_upload_validation() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let uploads = &services.uploads;
    let file_hash = checksum("file.rpm");

    let err = uploads
        .store_file_upload("", "upload-1", &file_hash, CHUNK_SIZE)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadValidation);

    let err = uploads
        .store_file_upload("org", "upload-1", "not-a-hash", CHUNK_SIZE)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadValidation);

    let err = uploads
        .store_file_upload("org", "upload-1", &file_hash, 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadValidation);

    uploads
        .store_file_upload("org", "upload-1", &file_hash, CHUNK_SIZE)
        .await
        .unwrap();
    let err = uploads
        .store_file_upload("org", "upload-1", &file_hash, CHUNK_SIZE)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadValidation);

    let err = uploads
        .store_chunk_upload("org", "upload-1", "xyz")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadValidation);
}

#[tokio::test]
async fn test_list_uploads_for_cleanup() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let uploads = &services.uploads;

    uploads
        .store_file_upload("org", "upload-1", &checksum("one"), CHUNK_SIZE)
        .await
        .unwrap();
    uploads
        .store_file_upload("org", "upload-2", &checksum("two"), CHUNK_SIZE)
        .await
        .unwrap();

    let past = OffsetDateTime::now_utc() - Duration::hours(1);
    assert!(uploads.list_uploads_created_before(past).await.unwrap().is_empty());

    let future = OffsetDateTime::now_utc() + Duration::hours(1);
    let stale = uploads.list_uploads_created_before(future).await.unwrap();
    let mut ids: Vec<_> = stale.into_iter().map(|row| row.upload_uuid).collect();
    ids.sort();
    assert_eq!(ids, vec!["upload-1".to_string(), "upload-2".to_string()]);
}
