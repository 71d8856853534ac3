use resource_gateway::cache::{generate_key, CacheConfig, CacheOptions, ResourceCache};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn config(capacity: usize, sweep_interval_secs: u64) -> CacheConfig {
    CacheConfig {
        capacity,
        sweep_interval_secs,
        ..CacheConfig::default()
    }
}

#[test]
fn test_entry_expires_after_ttl() {
    let cache: ResourceCache<String> = ResourceCache::new(config(10, 0));
    cache.set("k", "v".to_string(), Duration::from_millis(100));
    assert_eq!(cache.get("k").as_deref(), Some("v"));

    thread::sleep(Duration::from_millis(200));
    assert_eq!(cache.get("k"), None);
    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[test]
fn test_background_sweep_removes_expired_entries() {
    let cache: ResourceCache<u32> =
        ResourceCache::with_sweep_interval(config(10, 1), Duration::from_millis(20));
    assert!(cache.is_sweeping());
    cache.set("short", 1, Duration::from_millis(10));
    cache.set("long", 2, Duration::from_secs(60));

    let mut swept = false;
    for _ in 0..100 {
        thread::sleep(Duration::from_millis(10));
        if cache.len() == 1 {
            swept = true;
            break;
        }
    }
    assert!(swept, "sweep never removed the expired entry");
    assert_eq!(cache.get("long"), Some(2));
    assert!(cache.stats().expirations >= 1);

    cache.stop();
    assert!(!cache.is_sweeping());
    cache.stop();
}

#[test]
fn test_capacity_evicts_soonest_expiry() {
    let cache: ResourceCache<u32> = ResourceCache::new(config(2, 0));
    cache.set("a", 1, Duration::from_secs(10));
    cache.set("b", 2, Duration::from_secs(100));
    cache.set("c", 3, Duration::from_secs(50));
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("b"), Some(2));
    assert_eq!(cache.get("c"), Some(3));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn test_concurrent_readers_and_writers() {
    let cache: Arc<ResourceCache<usize>> = Arc::new(ResourceCache::new(config(0, 0)));
    let workers: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..200 {
                    let key = format!("{t}-{i}");
                    cache.set(key.clone(), i, Duration::from_secs(30));
                    assert_eq!(cache.get(&key), Some(i));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(cache.len(), 1600);
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_cache_options_from_query() {
    let config = CacheConfig::default();
    let query = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    };
    assert!(CacheOptions::from_query(&query(&[]), &config).enabled);
    for value in ["", "true", "false", "0", "yes", "anything"] {
        assert!(
            !CacheOptions::from_query(&query(&[("no-cache", value)]), &config).enabled,
            "no-cache={value}"
        );
    }

    let disabled = CacheConfig {
        enabled: false,
        ..CacheConfig::default()
    };
    assert!(!CacheOptions::from_query(&query(&[]), &disabled).enabled);
}

#[test]
fn test_key_symmetry() {
    let a = generate_key("maas://machine", [("a", "1"), ("b", "2")]);
    let b = generate_key("maas://machine", [("b", "2"), ("a", "1")]);
    let c = generate_key("maas://machine", [("no-cache", "1"), ("b", "2"), ("a", "1")]);
    assert_eq!(a, b);
    assert_eq!(a, c);
}
