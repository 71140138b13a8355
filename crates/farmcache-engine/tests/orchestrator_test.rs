//! Object-cache orchestrator tests
//!
//! Exercised against the in-memory remote store and Moka local tiers.

mod support;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use farmcache_domain::error::Error;
use farmcache_engine::{CachePriority, CachingCapability, ExpiryPolicy};
use farmcache_providers::remote::MemoryStore;
use support::{cache_instance, farm_settings, FailingStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Session {
    user: String,
    hits: u32,
}

fn session() -> Session {
    Session {
        user: "alice".to_string(),
        hits: 3,
    }
}

/// Value whose serialization always fails
struct Opaque;

impl Serialize for Opaque {
    fn serialize<S: serde::Serializer>(
        &self,
        _serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("opaque handle"))
    }
}

#[tokio::test]
async fn missing_key_returns_absent() {
    let cache = cache_instance(MemoryStore::shared(), farm_settings("farm1", false), "web01");
    let value: Option<Session> = cache.get_value("never-inserted").await.unwrap();
    assert!(value.is_none());
}

#[tokio::test]
async fn insert_then_get_round_trips() {
    let store = MemoryStore::shared();
    let cache = cache_instance(store.clone(), farm_settings("farm1", false), "web01");

    cache
        .insert_value(
            "session:1",
            &session(),
            ExpiryPolicy::none(),
            CachePriority::Normal,
        )
        .await
        .unwrap();

    let value: Option<Session> = cache.get_value("session:1").await.unwrap();
    assert_eq!(value, Some(session()));

    // The encoded form reached the shared store under the farm prefix
    use farmcache_domain::ports::RemoteStore;
    assert!(store.get("farm1_session:1").await.unwrap().is_some());
}

#[tokio::test]
async fn local_hit_does_not_touch_the_remote_store() {
    let store = MemoryStore::shared();
    let cache = cache_instance(store.clone(), farm_settings("farm1", false), "web01");

    cache
        .insert_value("k", &session(), ExpiryPolicy::none(), CachePriority::Normal)
        .await
        .unwrap();

    // Drop the remote copy behind the orchestrator's back; the local
    // tier still serves the value.
    use farmcache_domain::ports::RemoteStore;
    store.delete("farm1_k").await.unwrap();

    let value: Option<Session> = cache.get_value("k").await.unwrap();
    assert_eq!(value, Some(session()));
}

#[tokio::test]
async fn remove_clears_both_tiers() {
    let store = MemoryStore::shared();
    let cache = cache_instance(store.clone(), farm_settings("farm1", false), "web01");

    cache
        .insert_value("gone", &session(), ExpiryPolicy::none(), CachePriority::Normal)
        .await
        .unwrap();
    cache.remove("gone").await.unwrap();

    let value: Option<Session> = cache.get_value("gone").await.unwrap();
    assert!(value.is_none());

    use farmcache_domain::ports::RemoteStore;
    assert!(store.get("farm1_gone").await.unwrap().is_none());
}

#[tokio::test]
async fn clear_deletes_exactly_the_farm_keyspace() {
    let store = MemoryStore::shared();
    let cache = cache_instance(store.clone(), farm_settings("farm1", false), "web01");

    cache
        .insert_value("a", &1u32, ExpiryPolicy::none(), CachePriority::Normal)
        .await
        .unwrap();
    cache
        .insert_value("b", &2u32, ExpiryPolicy::none(), CachePriority::Normal)
        .await
        .unwrap();

    // A different farm sharing the same store must be untouched
    use farmcache_domain::ports::RemoteStore;
    store.set("farm2_a", "other", None).await.unwrap();

    cache.clear("Prefix", "").await.unwrap();

    assert!(cache.get_value::<u32>("a").await.unwrap().is_none());
    assert!(cache.get_value::<u32>("b").await.unwrap().is_none());
    assert!(store.get("farm1_a").await.unwrap().is_none());
    assert!(store.get("farm1_b").await.unwrap().is_none());
    assert!(store.get("farm2_a").await.unwrap().is_some());
}

#[tokio::test]
async fn non_serializable_value_raises_in_loud_mode() {
    let cache = cache_instance(MemoryStore::shared(), farm_settings("farm1", false), "web01");
    let err = cache
        .insert_value("bad", &Opaque, ExpiryPolicy::none(), CachePriority::Normal)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotSerializable { .. }));
}

#[tokio::test]
async fn non_serializable_value_is_swallowed_in_silent_mode() {
    let cache = cache_instance(MemoryStore::shared(), farm_settings("farm1", true), "web01");
    cache
        .insert_value("bad", &Opaque, ExpiryPolicy::none(), CachePriority::Normal)
        .await
        .unwrap();
    assert!(cache.get_value::<Session>("bad").await.unwrap().is_none());
}

#[tokio::test]
async fn silent_mode_degrades_to_local_only_when_the_store_is_down() {
    let store = std::sync::Arc::new(FailingStore);
    let cache = cache_instance(store, farm_settings("farm1", true), "web01");

    // The remote write fails and is swallowed; the local write already
    // applied, so the process keeps serving its own entry.
    cache
        .insert_value("k", &session(), ExpiryPolicy::none(), CachePriority::Normal)
        .await
        .unwrap();
    let value: Option<Session> = cache.get_value("k").await.unwrap();
    assert_eq!(value, Some(session()));

    // Misses, removals and clears are no-ops instead of errors
    assert!(cache.get_value::<Session>("other").await.unwrap().is_none());
    cache.remove("k").await.unwrap();
    cache.clear("Prefix", "").await.unwrap();
}

#[tokio::test]
async fn loud_mode_surfaces_store_outages() {
    let store = std::sync::Arc::new(FailingStore);
    let cache = cache_instance(store, farm_settings("farm1", false), "web01");

    let err = cache
        .insert_value("k", &session(), ExpiryPolicy::none(), CachePriority::Normal)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport { .. }));

    // The local write had already applied, so "k" still serves locally;
    // a key outside the local tier surfaces the remote failure.
    assert!(cache.get_value::<Session>("k").await.unwrap().is_some());
    let err = cache.get_value::<Session>("missing").await.unwrap_err();
    assert!(matches!(err, Error::Transport { .. }));
}

#[tokio::test]
async fn absolute_expiry_converts_to_remote_ttl() {
    let store = MemoryStore::shared();
    let cache = cache_instance(store.clone(), farm_settings("farm1", false), "web01");

    let at = chrono::Utc::now() + chrono::TimeDelta::seconds(5);
    cache
        .insert_value("abs", &1u32, ExpiryPolicy::absolute(at), CachePriority::Normal)
        .await
        .unwrap();

    use farmcache_domain::ports::RemoteStore;
    let remaining = store
        .get("farm1_abs")
        .await
        .unwrap()
        .unwrap()
        .remaining_ttl
        .unwrap();
    assert!(remaining > Duration::from_secs(4));
    assert!(remaining <= Duration::from_secs(5));
}

#[tokio::test]
async fn sliding_expiry_converts_to_remote_ttl_at_write_time() {
    let store = MemoryStore::shared();
    let cache = cache_instance(store.clone(), farm_settings("farm1", false), "web01");

    cache
        .insert_value(
            "slide",
            &1u32,
            ExpiryPolicy::sliding(Duration::from_secs(10)),
            CachePriority::Normal,
        )
        .await
        .unwrap();

    use farmcache_domain::ports::RemoteStore;
    let remaining = store
        .get("farm1_slide")
        .await
        .unwrap()
        .unwrap()
        .remaining_ttl
        .unwrap();
    assert!(remaining > Duration::from_secs(9));
    assert!(remaining <= Duration::from_secs(10));
}

#[tokio::test]
async fn remote_fallback_mirrors_the_value_locally() {
    let store = MemoryStore::shared();
    let settings = farm_settings("farm1", false);

    // One instance writes, a second starts cold and falls back to the
    // remote store on its first read.
    let writer = cache_instance(store.clone(), settings.clone(), "web01");
    let reader = cache_instance(store.clone(), settings, "web02");

    writer
        .insert_value("shared", &session(), ExpiryPolicy::none(), CachePriority::Normal)
        .await
        .unwrap();

    let value: Option<Session> = reader.get_value("shared").await.unwrap();
    assert_eq!(value, Some(session()));

    // The fallback repopulated the reader's local tier: the value
    // survives the remote copy disappearing.
    use farmcache_domain::ports::RemoteStore;
    store.delete("farm1_shared").await.unwrap();
    let value: Option<Session> = reader.get_value("shared").await.unwrap();
    assert_eq!(value, Some(session()));
}

#[tokio::test]
async fn compressed_values_round_trip_across_instances() {
    let store = MemoryStore::shared();
    let settings = farm_settings("farm1", false);
    let settings = farmcache_engine::CacheSettings {
        use_compression: true,
        ..settings
    };

    let writer = cache_instance(store.clone(), settings.clone(), "web01");
    let reader = cache_instance(store, settings, "web02");

    writer
        .insert_value("packed", &session(), ExpiryPolicy::none(), CachePriority::Normal)
        .await
        .unwrap();
    let value: Option<Session> = reader.get_value("packed").await.unwrap();
    assert_eq!(value, Some(session()));
}
