//! Content synchronization tests across the three content kinds.

mod common;

use common::fixtures::{environment, package, package_group, packages};
use common::{TestMetadata, create_repository};
use reposync_core::config::AppConfig;
use reposync_core::{ContentKind, ErrorKind, NaturalKey};
use std::collections::BTreeSet;
use uuid::Uuid;

fn checksum_keys(items: &[reposync_core::Package]) -> Vec<NaturalKey> {
    let keys: BTreeSet<NaturalKey> = items
        .iter()
        .map(|p| NaturalKey::Checksum(p.checksum.clone()))
        .collect();
    keys.into_iter().collect()
}

#[tokio::test]
async fn test_package_sync_scenario() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let store = metadata.store();
    let repo = create_repository(&store, "https://example.com/repo/").await;

    let a = package("a");
    let b = package("b");
    let c = package("c");

    // Empty listing on a never-synced repository.
    let inserted = services
        .packages
        .synchronize_repository(repo.uuid, &[])
        .await
        .unwrap();
    assert_eq!(inserted, 0);
    assert!(
        store
            .list_repository_content_keys(ContentKind::Package, repo.uuid)
            .await
            .unwrap()
            .is_empty()
    );

    let inserted = services
        .packages
        .synchronize_repository(repo.uuid, &[a.clone(), b.clone()])
        .await
        .unwrap();
    assert_eq!(inserted, 2);

    let inserted = services
        .packages
        .synchronize_repository(repo.uuid, &[b.clone(), c.clone()])
        .await
        .unwrap();
    assert_eq!(inserted, 1);

    let keys = store
        .list_repository_content_keys(ContentKind::Package, repo.uuid)
        .await
        .unwrap();
    assert_eq!(keys, checksum_keys(&[b, c]));

    // A's global row survives until orphan collection.
    assert_eq!(store.count_content(ContentKind::Package).await.unwrap(), 3);
    let deleted = services
        .collector(ContentKind::Package)
        .collect_orphans()
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(store.count_content(ContentKind::Package).await.unwrap(), 2);
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let store = metadata.store();
    let repo = create_repository(&store, "https://example.com/idempotent/").await;
    let listing = packages("pkg", 10);

    let first = services
        .packages
        .synchronize_repository(repo.uuid, &listing)
        .await
        .unwrap();
    assert_eq!(first, 10);

    let second = services
        .packages
        .synchronize_repository(repo.uuid, &listing)
        .await
        .unwrap();
    assert_eq!(second, 0);

    assert_eq!(store.count_content(ContentKind::Package).await.unwrap(), 10);
    let keys = store
        .list_repository_content_keys(ContentKind::Package, repo.uuid)
        .await
        .unwrap();
    assert_eq!(keys, checksum_keys(&listing));
}

#[tokio::test]
async fn test_empty_listing_clears_associations() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let store = metadata.store();
    let repo = create_repository(&store, "https://example.com/clear/").await;

    services
        .packages
        .synchronize_repository(repo.uuid, &packages("pkg", 3))
        .await
        .unwrap();
    let inserted = services
        .packages
        .synchronize_repository(repo.uuid, &[])
        .await
        .unwrap();
    assert_eq!(inserted, 0);

    let keys = store
        .list_repository_content_keys(ContentKind::Package, repo.uuid)
        .await
        .unwrap();
    assert!(keys.is_empty());
    assert_eq!(store.count_content(ContentKind::Package).await.unwrap(), 3);
}

#[tokio::test]
async fn test_content_is_shared_across_repositories() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let store = metadata.store();
    let first = create_repository(&store, "https://example.com/first/").await;
    let second = create_repository(&store, "https://example.com/second/").await;

    let shared = packages("shared", 4);
    let mut second_listing = shared.clone();
    second_listing.push(package("only-second"));

    services
        .packages
        .synchronize_repository(first.uuid, &shared)
        .await
        .unwrap();
    let inserted = services
        .packages
        .synchronize_repository(second.uuid, &second_listing)
        .await
        .unwrap();
    assert_eq!(inserted, 5);
    assert_eq!(store.count_content(ContentKind::Package).await.unwrap(), 5);

    // Dropping everything from the first repository keeps rows the second
    // still references.
    services
        .packages
        .synchronize_repository(first.uuid, &[])
        .await
        .unwrap();
    let deleted = services
        .collector(ContentKind::Package)
        .collect_orphans()
        .await
        .unwrap();
    assert_eq!(deleted, 0);
    assert_eq!(store.count_content(ContentKind::Package).await.unwrap(), 5);
}

#[tokio::test]
async fn test_duplicate_keys_in_listing() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let store = metadata.store();
    let repo = create_repository(&store, "https://example.com/dupes/").await;

    let a = package("a");
    let mut renamed = a.clone();
    renamed.summary = "same checksum, different summary".to_string();

    let inserted = services
        .packages
        .synchronize_repository(repo.uuid, &[a.clone(), renamed, a])
        .await
        .unwrap();
    assert_eq!(inserted, 1);
    assert_eq!(store.count_content(ContentKind::Package).await.unwrap(), 1);
}

#[tokio::test]
async fn test_batch_boundaries() {
    const BATCH: usize = 5;

    for count in [BATCH - 1, BATCH, BATCH + 1, 3 * BATCH + 2] {
        let metadata = TestMetadata::in_memory().await.unwrap();
        let mut config = AppConfig::for_testing();
        config.sync.batch_size = BATCH;
        config.sync.lookup_batch_size = 3;
        let services = metadata.services(config);
        let store = metadata.store();
        let repo = create_repository(&store, "https://example.com/batches/").await;

        let listing = packages("batch", count);
        let inserted = services
            .packages
            .synchronize_repository(repo.uuid, &listing)
            .await
            .unwrap();
        assert_eq!(inserted, count as u64, "count {count}");
        assert_eq!(
            store.count_content(ContentKind::Package).await.unwrap(),
            count as u64
        );

        let keys = store
            .list_repository_content_keys(ContentKind::Package, repo.uuid)
            .await
            .unwrap();
        assert_eq!(keys, checksum_keys(&listing), "count {count}");

        // Swap half the listing for new items across batch edges.
        let mut next = listing[count / 2..].to_vec();
        next.extend(packages("next", count));
        let inserted = services
            .packages
            .synchronize_repository(repo.uuid, &next)
            .await
            .unwrap();
        assert_eq!(inserted, count as u64, "count {count}");
        let keys = store
            .list_repository_content_keys(ContentKind::Package, repo.uuid)
            .await
            .unwrap();
        assert_eq!(keys, checksum_keys(&next), "count {count}");
    }
}

#[tokio::test]
async fn test_batch_size_past_bind_parameter_limit() {
    // Larger than SQLite's per-statement variable limit on its own, and far
    // past it once every row binds nine values.
    const COUNT: usize = 35_000;

    let metadata = TestMetadata::in_memory().await.unwrap();
    let mut config = AppConfig::for_testing();
    config.sync.batch_size = 40_000;
    config.sync.lookup_batch_size = 100_000;
    config.validate().unwrap();
    let services = metadata.services(config);
    let store = metadata.store();
    let repo = create_repository(&store, "https://example.com/large/").await;

    let listing = packages("large", COUNT);
    let inserted = services
        .packages
        .synchronize_repository(repo.uuid, &listing)
        .await
        .unwrap();
    assert_eq!(inserted, COUNT as u64);
    assert_eq!(
        store.count_content(ContentKind::Package).await.unwrap(),
        COUNT as u64
    );
    assert_eq!(
        store
            .count_repository_content(ContentKind::Package, repo.uuid)
            .await
            .unwrap(),
        COUNT as u64
    );

    // Dropping every association and collecting the orphans runs the
    // uuid-list statements at the same size.
    services
        .packages
        .synchronize_repository(repo.uuid, &[])
        .await
        .unwrap();
    assert_eq!(
        store
            .count_repository_content(ContentKind::Package, repo.uuid)
            .await
            .unwrap(),
        0
    );
    let deleted = services
        .collector(ContentKind::Package)
        .collect_orphans()
        .await
        .unwrap();
    assert_eq!(deleted, COUNT as u64);
}

#[tokio::test]
async fn test_unknown_repository_is_not_found() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let store = metadata.store();

    let err = services
        .packages
        .synchronize_repository(Uuid::new_v4(), &packages("pkg", 2))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(store.count_content(ContentKind::Package).await.unwrap(), 0);
}

#[tokio::test]
async fn test_package_group_sync() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let store = metadata.store();
    let repo = create_repository(&store, "https://example.com/groups/").await;

    let core = package_group("core", "Core", &["bash", "coreutils"]);
    let dev = package_group("development", "Development Tools", &["gcc", "make"]);
    // Same id with another name is a distinct natural key.
    let dev_renamed = package_group("development", "Dev Tools", &["gcc"]);

    let inserted = services
        .package_groups
        .synchronize_repository(repo.uuid, &[core.clone(), dev.clone(), dev_renamed])
        .await
        .unwrap();
    assert_eq!(inserted, 3);

    let inserted = services
        .package_groups
        .synchronize_repository(repo.uuid, &[core, dev])
        .await
        .unwrap();
    assert_eq!(inserted, 0);

    let keys = store
        .list_repository_content_keys(ContentKind::PackageGroup, repo.uuid)
        .await
        .unwrap();
    assert_eq!(
        keys,
        vec![
            NaturalKey::id_name("core", "Core"),
            NaturalKey::id_name("development", "Development Tools"),
        ]
    );
}

#[tokio::test]
async fn test_environment_sync() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let store = metadata.store();
    let first = create_repository(&store, "https://example.com/env-a/").await;
    let second = create_repository(&store, "https://example.com/env-b/").await;

    let server = environment("server", "Server");
    let workstation = environment("workstation", "Workstation");

    services
        .environments
        .synchronize_repository(first.uuid, &[server.clone(), workstation.clone()])
        .await
        .unwrap();
    services
        .environments
        .synchronize_repository(second.uuid, &[server])
        .await
        .unwrap();
    assert_eq!(
        store.count_content(ContentKind::Environment).await.unwrap(),
        2
    );

    services
        .environments
        .synchronize_repository(first.uuid, &[])
        .await
        .unwrap();
    let deleted = services
        .collector(ContentKind::Environment)
        .collect_orphans()
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    let keys = store
        .list_repository_content_keys(ContentKind::Environment, second.uuid)
        .await
        .unwrap();
    assert_eq!(keys, vec![NaturalKey::id_name("server", "Server")]);
}

#[tokio::test]
async fn test_sync_listing_records_introspection() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let store = metadata.store();
    let repo = create_repository(&store, "https://example.com/ingest/").await;

    let listing = serde_json::to_vec(&packages("ingest", 3)).unwrap();
    let outcome = services
        .sync_listing(repo.uuid, ContentKind::Package, &listing)
        .await
        .unwrap();
    assert_eq!(outcome.listed, 3);
    assert_eq!(outcome.associations_inserted, 3);

    let repo = store.get_repository(repo.uuid).await.unwrap().unwrap();
    assert_eq!(repo.last_introspection_status.as_deref(), Some("Valid"));
    assert_eq!(repo.package_count, 3);
    assert!(repo.last_introspection_time.is_some());
}

#[tokio::test]
async fn test_sync_listing_package_count_is_per_repository() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let store = metadata.store();
    let repo = create_repository(&store, "https://example.com/counted/").await;
    let other = create_repository(&store, "https://example.com/other/").await;

    let listing = serde_json::to_vec(&packages("shared", 5)).unwrap();
    services
        .sync_listing(other.uuid, ContentKind::Package, &listing)
        .await
        .unwrap();
    services
        .sync_listing(repo.uuid, ContentKind::Package, &listing)
        .await
        .unwrap();

    let shrunk = serde_json::to_vec(&packages("shared", 2)).unwrap();
    services
        .sync_listing(repo.uuid, ContentKind::Package, &shrunk)
        .await
        .unwrap();

    let repo = store.get_repository(repo.uuid).await.unwrap().unwrap();
    assert_eq!(repo.package_count, 2);
    let other = store.get_repository(other.uuid).await.unwrap().unwrap();
    assert_eq!(other.package_count, 5);
}

#[tokio::test]
async fn test_sync_listing_group_json() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let store = metadata.store();
    let repo = create_repository(&store, "https://example.com/comps/").await;

    let listing = br#"[
        {"id": "core", "name": "Core", "description": "Smallest install", "packagelist": ["bash"]},
        {"id": "base", "name": "Base"}
    ]"#;
    let outcome = services
        .sync_listing(repo.uuid, ContentKind::PackageGroup, listing)
        .await
        .unwrap();
    assert_eq!(outcome.associations_inserted, 2);

    let repo = store.get_repository(repo.uuid).await.unwrap().unwrap();
    assert_eq!(repo.package_count, 0);
}

#[tokio::test]
async fn test_sync_listing_rejects_malformed_json() {
    let metadata = TestMetadata::in_memory().await.unwrap();
    let services = metadata.services(AppConfig::for_testing());
    let store = metadata.store();
    let repo = create_repository(&store, "https://example.com/broken/").await;

    let err = services
        .sync_listing(repo.uuid, ContentKind::Package, b"{not json")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadValidation);

    let repo = store.get_repository(repo.uuid).await.unwrap().unwrap();
    assert!(repo.last_introspection_status.is_none());
}
