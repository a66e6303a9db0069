use serde::Serialize;
use tracing::warn;

/// Fixed key order; field order here is the canonical serialization order.
#[derive(Serialize)]
struct CanonicalEndpoint<'a> {
    action: &'a str,
    method: &'a str,
    path: &'a str,
    resource: &'a str,
}

/// Stable id for one (action, resource, path, method) tuple.
///
/// MD5 over the canonical JSON form, rendered as 32 lowercase hex chars.
/// This is a deduplication key for upserts, not an integrity check.
pub fn compute_id(action: &str, resource: &str, path: &str, method: &str) -> String {
    let canonical = CanonicalEndpoint {
        action,
        method,
        path,
        resource,
    };
    match serde_json::to_vec(&canonical) {
        Ok(bytes) => format!("{:x}", md5::compute(bytes)),
        Err(e) => {
            warn!(
                path,
                method,
                error = %e,
                "Endpoint id hashing failed, using degraded id"
            );
            fallback_id(action, resource, path, method)
        }
    }
}

fn fallback_id(action: &str, resource: &str, path: &str, method: &str) -> String {
    [action, resource, path, method]
        .join("_")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_known_id() {
        assert_eq!(
            compute_id("read", "user", "/users", "GET"),
            "efadcbd98f74586f41fcf395d53f1484"
        );
    }

    #[test]
    fn test_unrestricted_route_has_its_own_id() {
        let bare = compute_id("", "", "/users", "GET");
        assert_eq!(bare, "0d17d9d46e333f3d6a4e50ab73091064");
        assert_ne!(bare, compute_id("read", "user", "/users", "GET"));
    }

    #[test]
    fn test_fields_do_not_bleed_into_each_other() {
        assert_ne!(
            compute_id("ab", "c", "/x", "GET"),
            compute_id("a", "bc", "/x", "GET")
        );
    }

    #[test]
    fn test_no_collisions_across_ten_thousand_tuples() {
        let methods = ["GET", "POST", "PUT", "DELETE"];
        let mut ids = HashSet::new();
        for i in 0..10_000 {
            let id = compute_id(
                &format!("action-{}", i % 7),
                &format!("resource-{}", i % 13),
                &format!("/api/v1/r{}", i),
                methods[i % methods.len()],
            );
            assert_eq!(id.len(), 32);
            assert!(ids.insert(id), "collision at sample {}", i);
        }
    }

    #[test]
    fn test_fallback_id_is_sanitized() {
        assert_eq!(
            fallback_id("read", "user", "/users/:id", "GET"),
            "read_user__users__id_GET"
        );
    }

    proptest! {
        #[test]
        fn test_id_is_deterministic(
            action in "[a-z-]{0,12}",
            resource in "[a-z_]{0,12}",
            path in "/[a-z/:]{0,24}",
            method in "(GET|POST|PUT|PATCH|DELETE)",
        ) {
            prop_assert_eq!(
                compute_id(&action, &resource, &path, &method),
                compute_id(&action, &resource, &path, &method)
            );
        }

        #[test]
        fn test_distinct_tuples_get_distinct_ids(
            a in ("[a-z]{0,8}", "[a-z]{0,8}", "/[a-z/]{0,16}", "(GET|POST|DELETE)"),
            b in ("[a-z]{0,8}", "[a-z]{0,8}", "/[a-z/]{0,16}", "(GET|POST|DELETE)"),
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(
                compute_id(&a.0, &a.1, &a.2, &a.3),
                compute_id(&b.0, &b.1, &b.2, &b.3)
            );
        }
    }
}
