use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, HeaderName, VARY,
};
use http::{HeaderMap, HeaderValue};

/// Origin allow-list for the browser storefront. Only listed origins get CORS
/// headers; everyone else gets none (no wildcard).
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl CorsConfig {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self {
            allowed_origins,
            allowed_methods: vec!["POST".to_string(), "OPTIONS".to_string()],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
                "x-user-id".to_string(),
            ],
            allow_credentials: true,
        }
    }

    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/');
        self.allowed_origins
            .iter()
            .any(|allowed| allowed.trim_end_matches('/') == origin)
    }

    pub fn build_headers(&self, origin: &str) -> Vec<(HeaderName, String)> {
        if !self.is_origin_allowed(origin) {
            return Vec::new();
        }
        let mut headers = vec![(ACCESS_CONTROL_ALLOW_ORIGIN, origin.to_string())];
        if self.allow_credentials {
            headers.push((ACCESS_CONTROL_ALLOW_CREDENTIALS, "true".to_string()));
        }
        if !self.allowed_methods.is_empty() {
            headers.push((ACCESS_CONTROL_ALLOW_METHODS, self.allowed_methods.join(", ")));
        }
        if !self.allowed_headers.is_empty() {
            headers.push((ACCESS_CONTROL_ALLOW_HEADERS, self.allowed_headers.join(", ")));
        }
        headers
    }

    /// Adds CORS headers for `origin` to a response. Absent or unlisted origins
    /// only get `Vary: Origin`.
    pub fn apply(&self, origin: Option<&str>, headers: &mut HeaderMap) {
        headers.insert(VARY, HeaderValue::from_static("Origin"));
        let Some(origin) = origin else {
            return;
        };
        for (name, value) in self.build_headers(origin) {
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.insert(name, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CorsConfig {
        CorsConfig::new(vec![
            "https://nakhlestanmana.com".to_string(),
            "http://localhost:3000".to_string(),
        ])
    }

    #[test]
    fn listed_origin_is_echoed() {
        let mut headers = HeaderMap::new();
        config().apply(Some("http://localhost:3000"), &mut headers);
        assert_eq!(
            headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(), "true");
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(), "POST, OPTIONS");
        assert_eq!(
            headers.get(ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
            "Content-Type, Authorization, x-user-id"
        );
        assert_eq!(headers.get(VARY).unwrap(), "Origin");
    }

    #[test]
    fn unlisted_or_missing_origin_only_varies() {
        for origin in [Some("https://evil.example"), None] {
            let mut headers = HeaderMap::new();
            config().apply(origin, &mut headers);
            assert_eq!(headers.len(), 1, "{origin:?}");
            assert_eq!(headers.get(VARY).unwrap(), "Origin");
        }
    }

    #[test]
    fn trailing_slash_does_not_matter() {
        assert!(config().is_origin_allowed("https://nakhlestanmana.com/"));
        assert!(!config().is_origin_allowed("https://nakhlestanmana.com.evil"));
    }
}
