use sha2::{Digest, Sha256};

/// Reserved query parameter that bypasses the cache for one call
pub const NO_CACHE_PARAM: &str = "no-cache";

/// Deterministic cache key for a URI and its query parameters
///
/// The key is independent of parameter order, ignores any query string embedded
/// in `uri`, and never includes the [`NO_CACHE_PARAM`] flag.
///
/// ```rust
/// use resource_gateway::cache::generate_key;
///
/// let a = generate_key("maas://machine", [("a", "1"), ("b", "2")]);
/// let b = generate_key("maas://machine", [("b", "2"), ("no-cache", "true"), ("a", "1")]);
/// assert_eq!(a, b);
/// ```
pub fn generate_key<I, K, V>(uri: &str, query: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let path = uri.split_once('?').map_or(uri, |(path, _)| path);

    let mut pairs: Vec<(String, String)> = query
        .into_iter()
        .filter(|(k, _)| k.as_ref() != NO_CACHE_PARAM)
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .collect();
    pairs.sort();

    let canonical = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter())
        .finish();

    let mut hasher = Sha256::new();
    hasher.update(path.trim().as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[test]
    fn test_key_is_hex_sha256() {
        let key = generate_key("maas://machine", Vec::<(String, String)>::new());
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(key, generate_key("maas://machine", [("no-cache", "")]));
    }

    #[test]
    fn test_key_differs_by_uri_and_values() {
        let a = generate_key("maas://machine", [("limit", "10")]);
        let b = generate_key("maas://subnet", [("limit", "10")]);
        let c = generate_key("maas://machine", [("limit", "20")]);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_embedded_query_string_is_ignored() {
        let a = generate_key("maas://machine?limit=10", [("limit", "10")]);
        let b = generate_key("maas://machine", [("limit", "10")]);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_key_is_order_independent(
            params in proptest::collection::hash_map("[a-z]{1,6}", "[a-z0-9]{0,6}", 0..6),
            bypass in any::<bool>(),
        ) {
            let mut forward: Vec<(String, String)> = params.clone().into_iter().collect();
            forward.sort();
            let mut reverse = forward.clone();
            reverse.reverse();
            if bypass {
                reverse.insert(reverse.len() / 2, (NO_CACHE_PARAM.to_string(), "1".to_string()));
            }
            let as_map: HashMap<String, String> = params;
            prop_assert_eq!(
                generate_key("maas://machine", forward),
                generate_key("maas://machine", reverse)
            );
            let mut entries: Vec<(&String, &String)> = as_map.iter().collect();
            entries.reverse();
            prop_assert_eq!(
                generate_key("maas://machine", &as_map),
                generate_key("maas://machine", entries)
            );
        }
    }
}
