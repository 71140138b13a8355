//! Settings store and service tests

mod support;

use std::sync::Arc;

use farmcache_domain::ports::RemoteStore;
use farmcache_engine::{
    CacheEngine, CacheOrchestrator, CachePriority, CacheSettings, ExpiryPolicy,
    OutputCacheOrchestrator, OutputCachingCapability, SettingsService, SettingsStore,
};
use farmcache_providers::local::MokaCacheTier;
use farmcache_providers::remote::MemoryStore;
use support::{farm_settings, FailingStore};

#[test]
fn missing_file_loads_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::load_from(dir.path().join("farmcache.toml")).unwrap();
    let settings = store.snapshot();
    assert!(settings.silent_mode);
    assert!(settings.connection_string.is_empty());
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("farmcache.toml");
    std::fs::write(
        &path,
        r#"
connection_string = "cache01:6379"
silent_mode = false
use_compression = true
key_prefix = "farm1"
"#,
    )
    .unwrap();

    let store = SettingsStore::load_from(&path).unwrap();
    let settings = store.snapshot();
    assert_eq!(settings.connection_string, "cache01:6379");
    assert!(!settings.silent_mode);
    assert!(settings.use_compression);
    assert_eq!(settings.key_prefix, "farm1");
}

#[test]
fn invalid_key_prefix_in_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("farmcache.toml");
    std::fs::write(&path, "key_prefix = \"not a prefix!\"\n").unwrap();

    let err = SettingsStore::load_from(&path).unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn update_persists_to_the_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("farmcache.toml");
    let store = SettingsStore::load_from(&path).unwrap();

    store
        .update(CacheSettings {
            connection_string: "cache01".to_string(),
            key_prefix: "farm1".to_string(),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(store.snapshot().key_prefix, "farm1");

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("connection_string = \"cache01\""));
    assert!(written.contains("key_prefix = \"farm1\""));

    // A reload sees the persisted values
    let reloaded = SettingsStore::load_from(&path).unwrap();
    assert_eq!(reloaded.snapshot().connection_string, "cache01");
}

#[tokio::test]
async fn silent_mode_is_read_fresh_on_every_call() {
    let failing: Arc<dyn RemoteStore> = Arc::new(FailingStore);
    let settings_store = SettingsStore::new(farm_settings("farm1", true));
    let engine = CacheEngine::with_identity(settings_store.clone(), failing, "web01", 1);
    let cache = CacheOrchestrator::new(engine, Arc::new(MokaCacheTier::new()));

    // Silent: the failing remote write is swallowed
    cache
        .insert_value("k", &1u32, ExpiryPolicy::none(), CachePriority::Normal)
        .await
        .unwrap();

    // Flip the switch; the very next call sees it
    settings_store.update(farm_settings("farm1", false)).unwrap();
    assert!(cache
        .insert_value("k", &1u32, ExpiryPolicy::none(), CachePriority::Normal)
        .await
        .is_err());
}

#[tokio::test]
async fn updating_settings_purges_both_caches() {
    let store = MemoryStore::shared();
    let settings_store = SettingsStore::new(farm_settings("farm1", false));
    let engine = CacheEngine::with_identity(settings_store.clone(), store.clone(), "web01", 1);
    let cache = CacheOrchestrator::new(engine.clone(), Arc::new(MokaCacheTier::new()));
    let output = OutputCacheOrchestrator::new(engine, Arc::new(MokaCacheTier::new()));

    cache
        .insert_value("k", &"v", ExpiryPolicy::none(), CachePriority::Normal)
        .await
        .unwrap();
    let page_key = output.generate_key(7, &std::collections::BTreeMap::new());
    output
        .set_output(7, &page_key, std::time::Duration::from_secs(60), b"page")
        .await
        .unwrap();

    let service = SettingsService::new(settings_store, cache.clone(), output.clone());
    service
        .update_settings(CacheSettings {
            key_prefix: "farm1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(cache.get_value::<String>("k").await.unwrap().is_none());
    assert!(output.get_output(7, &page_key).await.unwrap().is_none());
    assert!(store.get("farm1_k").await.unwrap().is_none());
    assert!(store
        .get(&format!("farm1_Output_{}", page_key))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn service_exposes_the_current_settings() {
    let store = MemoryStore::shared();
    let settings_store = SettingsStore::new(farm_settings("farm1", true));
    let engine = CacheEngine::with_identity(settings_store.clone(), store, "web01", 1);
    let cache = CacheOrchestrator::new(engine.clone(), Arc::new(MokaCacheTier::new()));
    let output = OutputCacheOrchestrator::new(engine, Arc::new(MokaCacheTier::new()));

    let service = SettingsService::new(settings_store, cache, output);
    let settings = service.get_settings();
    assert_eq!(settings.key_prefix, "farm1");
    assert!(settings.silent_mode);
}
