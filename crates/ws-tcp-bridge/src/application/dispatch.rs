//! Request routing.
//!
//! Every request that reaches the bridge ends up on exactly one of three
//! paths, decided here without touching the network:
//!
//! ```text
//! exiting?                       ─yes→ Route::Ignore
//! file serving && !wants_upgrade ─yes→ Route::ServeFile
//! otherwise                      ────→ Route::Upgrade
//! ```
//!
//! The `Connection` header is the *only* signal used to tell a plain request
//! from an upgrade: any header value containing `upgrade` (any case) counts.
//! When file serving is off, headers are not consulted at all.

use hyper::http::header::CONNECTION;
use hyper::http::HeaderMap;

/// What the dispatcher should do with one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The process is winding down; answer nothing, upgrade nothing.
    Ignore,
    /// Hand the whole request to the file-serving collaborator.
    ServeFile,
    /// Attempt a WebSocket upgrade and, on success, bridge to the target.
    Upgrade,
}

/// Returns `true` if any `Connection` header value contains `upgrade`,
/// compared case-insensitively.
pub fn wants_upgrade(headers: &HeaderMap) -> bool {
    headers.get_all(CONNECTION).iter().any(|value| {
        String::from_utf8_lossy(value.as_bytes())
            .to_ascii_lowercase()
            .contains("upgrade")
    })
}

/// Chooses the [`Route`] for a request.
///
/// `exiting` is the single-shot exit flag as read at dispatch time.
pub fn route_request(headers: &HeaderMap, file_serving: bool, exiting: bool) -> Route {
    if exiting {
        return Route::Ignore;
    }
    if file_serving && !wants_upgrade(headers) {
        return Route::ServeFile;
    }
    Route::Upgrade
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::http::HeaderValue;

    fn headers_with_connection(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_wants_upgrade_absent_header_is_false() {
        assert!(!wants_upgrade(&HeaderMap::new()));
    }

    #[test]
    fn test_wants_upgrade_is_case_insensitive() {
        assert!(wants_upgrade(&headers_with_connection("Upgrade")));
        assert!(wants_upgrade(&headers_with_connection("UPGRADE")));
        assert!(wants_upgrade(&headers_with_connection("upgrade")));
    }

    #[test]
    fn test_wants_upgrade_matches_substring_in_token_list() {
        // Firefox sends "keep-alive, Upgrade"
        assert!(wants_upgrade(&headers_with_connection("keep-alive, Upgrade")));
    }

    #[test]
    fn test_wants_upgrade_keep_alive_only_is_false() {
        assert!(!wants_upgrade(&headers_with_connection("keep-alive")));
    }

    #[test]
    fn test_wants_upgrade_checks_every_connection_header() {
        let mut headers = HeaderMap::new();
        headers.append(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.append(CONNECTION, HeaderValue::from_static("Upgrade"));
        assert!(wants_upgrade(&headers));
    }

    #[test]
    fn test_route_exiting_ignores_everything() {
        // Arrange: even a well-formed upgrade is ignored while exiting
        let headers = headers_with_connection("Upgrade");
        // Act / Assert
        assert_eq!(route_request(&headers, true, true), Route::Ignore);
        assert_eq!(route_request(&headers, false, true), Route::Ignore);
        assert_eq!(route_request(&HeaderMap::new(), true, true), Route::Ignore);
    }

    #[test]
    fn test_route_plain_request_with_file_serving_serves_file() {
        assert_eq!(
            route_request(&HeaderMap::new(), true, false),
            Route::ServeFile
        );
        assert_eq!(
            route_request(&headers_with_connection("close"), true, false),
            Route::ServeFile
        );
    }

    #[test]
    fn test_route_upgrade_request_with_file_serving_upgrades() {
        assert_eq!(
            route_request(&headers_with_connection("Upgrade"), true, false),
            Route::Upgrade
        );
    }

    #[test]
    fn test_route_without_file_serving_always_upgrades() {
        assert_eq!(
            route_request(&HeaderMap::new(), false, false),
            Route::Upgrade
        );
        assert_eq!(
            route_request(&headers_with_connection("keep-alive"), false, false),
            Route::Upgrade
        );
    }
}
