use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE, VARY,
};
use axum::http::{HeaderMap, HeaderValue};

use crate::config::AllowedOrigins;

const ALLOW_METHODS: &str = "POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";
const MAX_AGE_SECS: &str = "86400";

/// The `Access-Control-Allow-Origin` value granted to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsOrigin(String);

impl CorsOrigin {
    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Attach the allow-origin and `Vary` headers. Preflight responses also
    /// advertise methods, headers and cache lifetime.
    pub fn apply(&self, headers: &mut HeaderMap, preflight: bool) {
        // An origin that is not a valid header value cannot have been echoed
        // back by a browser; skip rather than fail the response.
        let Ok(origin) = HeaderValue::from_str(&self.0) else {
            return;
        };
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(VARY, HeaderValue::from_static("Origin"));

        if preflight {
            headers.insert(
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOW_METHODS),
            );
            headers.insert(
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOW_HEADERS),
            );
            headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECS));
        }
    }
}

/// Decide which origin, if any, the response may be exposed to.
pub fn resolve(origin: Option<&str>, allowed: &AllowedOrigins) -> Option<CorsOrigin> {
    match allowed {
        AllowedOrigins::Any => Some(CorsOrigin("*".to_string())),
        AllowedOrigins::List(list) => {
            let origin = origin?;
            list.iter()
                .any(|o| o == origin)
                .then(|| CorsOrigin(origin.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> AllowedOrigins {
        AllowedOrigins::List(vec!["https://a.com".into(), "https://b.com".into()])
    }

    #[test]
    fn test_listed_origin_is_echoed() {
        let cors = resolve(Some("https://b.com"), &list()).unwrap();
        assert_eq!(cors.as_str(), "https://b.com");
    }

    #[test]
    fn test_unlisted_origin_is_refused() {
        assert!(resolve(Some("https://evil.com"), &list()).is_none());
        assert!(resolve(None, &list()).is_none());
    }

    #[test]
    fn test_empty_origin_never_matches_list() {
        assert!(resolve(Some(""), &list()).is_none());
    }

    #[test]
    fn test_separator_only_list_allows_nothing() {
        let none = AllowedOrigins::parse(" , ");
        assert!(resolve(Some("https://evil.com"), &none).is_none());
        assert!(resolve(Some("*"), &none).is_none());
        assert!(resolve(None, &none).is_none());
    }

    #[test]
    fn test_wildcard_allows_anything() {
        let any = AllowedOrigins::Any;
        assert_eq!(resolve(Some("https://evil.com"), &any).unwrap().as_str(), "*");
        assert_eq!(resolve(None, &any).unwrap().as_str(), "*");
    }

    #[test]
    fn test_apply_simple_response() {
        let mut headers = HeaderMap::new();
        resolve(Some("https://a.com"), &list())
            .unwrap()
            .apply(&mut headers, false);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://a.com");
        assert_eq!(headers[VARY], "Origin");
        assert!(!headers.contains_key(ACCESS_CONTROL_ALLOW_METHODS));
        assert!(!headers.contains_key(ACCESS_CONTROL_MAX_AGE));
    }

    #[test]
    fn test_apply_preflight() {
        let mut headers = HeaderMap::new();
        resolve(None, &AllowedOrigins::Any)
            .unwrap()
            .apply(&mut headers, true);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "86400");
    }
}
