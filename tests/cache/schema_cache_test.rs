//! Behavioral tests for the schema cache against a counting fixture backend.

use std::sync::Arc;

use schema_cache::backend::{DataSourceDef, InMemoryBackend};
use schema_cache::{
    BackendError, ColumnDescriptor, IndexDescriptor, PrimaryKey, SchemaBackend, SchemaCache,
};

fn users_def() -> DataSourceDef {
    DataSourceDef::new()
        .column(ColumnDescriptor::new("id", "bigint").not_null().identity())
        .column(ColumnDescriptor::new("email", "text").not_null())
        .column(ColumnDescriptor::new("bio", "text"))
        .primary_key(PrimaryKey::single("id"))
        .index(IndexDescriptor::new("users_email_idx", ["email"], true))
}

fn posts_def() -> DataSourceDef {
    DataSourceDef::new()
        .column(ColumnDescriptor::new("id", "bigint").not_null().identity())
        .column(ColumnDescriptor::new("user_id", "bigint").not_null())
        .column(ColumnDescriptor::new("body", "text"))
        .primary_key(PrimaryKey::single("id"))
        .index(IndexDescriptor::new("posts_user_id_idx", ["user_id"], false))
}

fn backend() -> Arc<InMemoryBackend> {
    Arc::new(
        InMemoryBackend::new()
            .with_data_source("users", users_def())
            .with_data_source("posts", posts_def())
            .with_schema_version(20260801120000)
            .with_database_version("PostgreSQL", "16.3"),
    )
}

fn cache_for(backend: &Arc<InMemoryBackend>) -> SchemaCache {
    SchemaCache::new(Arc::clone(backend) as Arc<dyn SchemaBackend>)
}

#[tokio::test]
async fn test_second_columns_read_hits_memory() {
    let backend = backend();
    let mut cache = cache_for(&backend);

    let first = cache.columns("users").await.unwrap();
    let second = cache.columns("users").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.calls.columns_of.get(), 1);
}

#[tokio::test]
async fn test_exists_bulk_seeds_once_then_probes_once() {
    let backend = backend();
    let mut cache = cache_for(&backend);

    // First existence question on an empty cache: one bulk listing, then a
    // single direct probe for the still-unknown name.
    assert!(!cache.exists("ghost").await.unwrap());
    assert_eq!(backend.calls.data_sources.get(), 1);
    assert_eq!(backend.calls.data_source_exists.get(), 1);

    // The false answer is cached; further calls are free.
    assert!(!cache.exists("ghost").await.unwrap());
    assert!(!cache.exists("ghost").await.unwrap());
    assert_eq!(backend.calls.data_sources.get(), 1);
    assert_eq!(backend.calls.data_source_exists.get(), 1);

    // Names the bulk seed covered never need a probe at all.
    assert!(cache.exists("users").await.unwrap());
    assert!(cache.exists("posts").await.unwrap());
    assert_eq!(backend.calls.data_source_exists.get(), 1);
}

#[tokio::test]
async fn test_primary_key_short_circuits_on_missing_source() {
    let backend = backend();
    let mut cache = cache_for(&backend);

    assert_eq!(cache.primary_key("ghost").await.unwrap(), None);
    assert_eq!(cache.primary_key("ghost").await.unwrap(), None);
    assert_eq!(backend.calls.primary_key_of.get(), 0);

    assert_eq!(
        cache.primary_key("users").await.unwrap(),
        Some(PrimaryKey::single("id"))
    );
    assert_eq!(backend.calls.primary_key_of.get(), 1);
}

#[tokio::test]
async fn test_backend_failures_propagate_and_are_not_cached() {
    let backend = backend();
    let mut cache = cache_for(&backend);

    // `columns` performs no existence check; the backend failure for an
    // unknown name comes through unmodified.
    let err = cache.columns("ghost").await.unwrap_err();
    assert!(matches!(err, BackendError::Remote { .. }));

    // Not cached: the next call retries against the backend.
    cache.columns("ghost").await.unwrap_err();
    assert_eq!(backend.calls.columns_of.get(), 2);
}

#[tokio::test]
async fn test_columns_by_name_is_columns_grouped_by_name() {
    let backend = backend();
    let mut cache = cache_for(&backend);

    let columns = cache.columns("users").await.unwrap();
    let by_name = cache.columns_by_name("users").await.unwrap();

    assert_eq!(by_name.len(), columns.len());
    for column in &columns {
        let found = by_name.get(column.name.as_str()).unwrap();
        assert!(Arc::ptr_eq(found, column));
    }
    // Deriving the map never re-queries the backend.
    assert_eq!(backend.calls.columns_of.get(), 1);
}

#[tokio::test]
async fn test_has_columns_by_name_has_no_population_side_effect() {
    let backend = backend();
    let mut cache = cache_for(&backend);

    assert!(!cache.has_columns_by_name("users"));
    assert_eq!(backend.calls.columns_of.get(), 0);

    cache.columns_by_name("users").await.unwrap();
    assert!(cache.has_columns_by_name("users"));
    assert!(!cache.has_columns_by_name("posts"));
}

#[tokio::test]
async fn test_equal_descriptors_share_one_canonical_instance() {
    let backend = backend();
    let mut cache = cache_for(&backend);

    let users = cache.columns("users").await.unwrap();
    let posts = cache.columns("posts").await.unwrap();

    // Both tables declare `id bigint NOT NULL IDENTITY`; one instance backs
    // both cache entries.
    assert_eq!(users[0], posts[0]);
    assert!(Arc::ptr_eq(&users[0], &posts[0]));
}

#[tokio::test]
async fn test_invalidate_targets_one_name_only() {
    let backend = backend();
    let mut cache = cache_for(&backend);
    cache.populate("users").await.unwrap();
    cache.populate("posts").await.unwrap();

    cache.invalidate("users");

    assert!(!cache.has_columns_by_name("users"));
    assert!(cache.has_columns_by_name("posts"));
    assert_eq!(cache.primary_key("posts").await.unwrap(), Some(PrimaryKey::single("id")));
    assert_eq!(backend.calls.primary_key_of.get(), 2); // users + posts, no refetch

    // Re-reading the invalidated name issues exactly one new query.
    let before = backend.calls.columns_of.get();
    cache.columns("users").await.unwrap();
    cache.columns("users").await.unwrap();
    assert_eq!(backend.calls.columns_of.get(), before + 1);
}

#[tokio::test]
async fn test_populate_caches_all_four_kinds_for_one_name() {
    let backend = backend();
    let mut cache = cache_for(&backend);

    cache.populate("users").await.unwrap();

    assert_eq!(backend.calls.primary_key_of.get(), 1);
    assert_eq!(backend.calls.columns_of.get(), 1);
    assert_eq!(backend.calls.indexes_of.get(), 1);

    // size() = users columns + by-name + primary key entries, plus the
    // bulk-seeded existence flags for users and posts.
    assert_eq!(cache.size(), 5);

    // Everything for "users" is now served from memory.
    cache.populate("users").await.unwrap();
    assert_eq!(backend.calls.columns_of.get(), 1);
}

#[tokio::test]
async fn test_populate_unknown_name_is_a_noop() {
    let backend = backend();
    let mut cache = cache_for(&backend);

    cache.populate("ghost").await.unwrap();

    assert_eq!(backend.calls.primary_key_of.get(), 0);
    assert_eq!(backend.calls.columns_of.get(), 0);
    assert_eq!(backend.calls.indexes_of.get(), 0);
}

#[tokio::test]
async fn test_populate_many_fetches_existing_names_and_skips_ghosts() {
    let backend = backend();
    let mut cache = cache_for(&backend);

    cache
        .populate_many(&["users", "posts", "ghost"])
        .await
        .unwrap();

    assert!(cache.has_columns_by_name("users"));
    assert!(cache.has_columns_by_name("posts"));
    assert!(!cache.has_columns_by_name("ghost"));
    assert_eq!(backend.calls.columns_of.get(), 2);
    assert_eq!(backend.calls.indexes_of.get(), 2);

    // Already-populated names are skipped on the next batch.
    cache.populate_many(&["users", "posts"]).await.unwrap();
    assert_eq!(backend.calls.columns_of.get(), 2);
}

#[tokio::test]
async fn test_database_version_computed_once_per_lifetime() {
    let backend = backend();
    let mut cache = cache_for(&backend);

    let v1 = cache.database_version().await.unwrap();
    let v2 = cache.database_version().await.unwrap();
    assert_eq!(v1, v2);
    assert_eq!(v1.to_string(), "PostgreSQL 16.3");
    assert_eq!(backend.calls.database_version.get(), 1);

    // Per-name invalidation leaves it alone.
    cache.invalidate("users");
    cache.database_version().await.unwrap();
    assert_eq!(backend.calls.database_version.get(), 1);
}

#[tokio::test]
async fn test_duplicate_evolves_independently() {
    let backend = backend();
    let mut cache = cache_for(&backend);
    cache.populate("users").await.unwrap();

    let mut copy = cache.clone();

    copy.invalidate("users");
    assert!(!copy.has_columns_by_name("users"));
    assert!(cache.has_columns_by_name("users"));

    copy.populate("posts").await.unwrap();
    assert!(copy.has_columns_by_name("posts"));
    assert!(!cache.has_columns_by_name("posts"));
}
