pub mod chat_completions;
pub mod google;
pub mod openai;
pub mod openrouter;

pub(crate) fn build_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let mut path = path.trim_start_matches('/');
    if base.ends_with("/v1") && (path == "v1" || path.starts_with("v1/")) {
        path = path.trim_start_matches("v1/").trim_start_matches("v1");
    }
    format!("{base}/{path}")
}

#[cfg(test)]
mod tests {
    use super::build_url;

    #[test]
    fn build_url_joins_without_duplicate_version() {
        assert_eq!(
            build_url("https://api.openai.com/", "/v1/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            build_url("https://gateway.example/v1", "/v1/chat/completions"),
            "https://gateway.example/v1/chat/completions"
        );
    }
}
