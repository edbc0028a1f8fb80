//! Orphan collection and scheduler tests.

mod common;

use common::fixtures::{environment, package_group, packages};
use common::{TestMetadata, create_repository};
use reposync_core::ContentKind;
use reposync_core::config::AppConfig;
use reposync_service::OrphanScheduler;
use std::time::Duration;

#[tokio::test]
async fn test_collect_never_deletes_referenced_content() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let store = metadata.store();
    let repo = create_repository(&store, "https://example.com/orphans/").await;

    let listing = packages("kept", 6);
    services
        .packages
        .synchronize_repository(repo.uuid, &listing)
        .await
        .unwrap();
    services
        .packages
        .synchronize_repository(repo.uuid, &listing[..4])
        .await
        .unwrap();

    let collector = services.collector(ContentKind::Package);
    assert_eq!(collector.collect_orphans().await.unwrap(), 2);
    assert_eq!(collector.collect_orphans().await.unwrap(), 0);

    let keys = store
        .list_repository_content_keys(ContentKind::Package, repo.uuid)
        .await
        .unwrap();
    assert_eq!(keys.len(), 4);
    assert_eq!(store.count_content(ContentKind::Package).await.unwrap(), 4);
}

#[tokio::test]
async fn test_collect_is_scoped_to_kind() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let store = metadata.store();
    let repo = create_repository(&store, "https://example.com/kinds/").await;

    services
        .packages
        .synchronize_repository(repo.uuid, &packages("pkg", 2))
        .await
        .unwrap();
    services
        .package_groups
        .synchronize_repository(repo.uuid, &[package_group("core", "Core", &[])])
        .await
        .unwrap();
    services
        .environments
        .synchronize_repository(repo.uuid, &[environment("server", "Server")])
        .await
        .unwrap();

    services
        .packages
        .synchronize_repository(repo.uuid, &[])
        .await
        .unwrap();
    services
        .package_groups
        .synchronize_repository(repo.uuid, &[])
        .await
        .unwrap();

    let results = services
        .collect_orphans(&[ContentKind::PackageGroup])
        .await
        .unwrap();
    assert_eq!(results, vec![(ContentKind::PackageGroup, 1)]);
    assert_eq!(store.count_content(ContentKind::Package).await.unwrap(), 2);

    let results = services.collect_orphans(&ContentKind::ALL).await.unwrap();
    assert_eq!(
        results,
        vec![
            (ContentKind::Package, 2),
            (ContentKind::PackageGroup, 0),
            (ContentKind::Environment, 0),
        ]
    );
    assert_eq!(
        store.count_content(ContentKind::Environment).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_collect_in_batches() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let mut config = AppConfig::for_testing();
    config.sync.batch_size = 3;
    let services = metadata.services(config);
    let store = metadata.store();
    let repo = create_repository(&store, "https://example.com/orphan-batches/").await;

    services
        .packages
        .synchronize_repository(repo.uuid, &packages("pkg", 10))
        .await
        .unwrap();
    services
        .packages
        .synchronize_repository(repo.uuid, &[])
        .await
        .unwrap();

    let deleted = services
        .collector(ContentKind::Package)
        .collect_orphans()
        .await
        .unwrap();
    assert_eq!(deleted, 10);
    assert_eq!(store.count_content(ContentKind::Package).await.unwrap(), 0);
}

#[tokio::test]
async fn test_scheduler_disabled_by_default() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    assert!(OrphanScheduler::from_config(&services).is_none());
}

#[tokio::test]
async fn test_scheduler_run_once() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let mut config = AppConfig::for_testing();
    config.orphans.auto_schedule_enabled = true;
    config.orphans.kinds = vec![ContentKind::Package];
    let services = metadata.services(config);
    let store = metadata.store();
    let repo = create_repository(&store, "https://example.com/scheduled/").await;

    services
        .packages
        .synchronize_repository(repo.uuid, &packages("pkg", 3))
        .await
        .unwrap();
    services
        .packages
        .synchronize_repository(repo.uuid, &[])
        .await
        .unwrap();

    let scheduler = OrphanScheduler::from_config(&services).unwrap();
    assert_eq!(scheduler.run_once().await, 3);
    assert_eq!(scheduler.run_once().await, 0);
}

#[tokio::test]
async fn test_scheduler_loop_collects() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let store = metadata.store();
    let repo = create_repository(&store, "https://example.com/loop/").await;

    services
        .packages
        .synchronize_repository(repo.uuid, &packages("pkg", 2))
        .await
        .unwrap();
    services
        .packages
        .synchronize_repository(repo.uuid, &[])
        .await
        .unwrap();

    let handle = OrphanScheduler::new(
        services.clone(),
        Duration::from_millis(20),
        vec![ContentKind::Package],
    )
    .spawn();

    let mut remaining = u64::MAX;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        remaining = store.count_content(ContentKind::Package).await.unwrap();
        if remaining == 0 {
            break;
        }
    }
    handle.abort();
    assert_eq!(remaining, 0);
}
