use crate::error::{PriceHubError, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub fn naver_headers(client_id: &str, client_secret: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert("x-naver-client-id", header_value(client_id)?);
    headers.insert("x-naver-client-secret", header_value(client_secret)?);
    Ok(headers)
}

pub fn storefront_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value.trim())
        .map_err(|e| PriceHubError::Config(format!("invalid header value: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naver_headers_carry_credentials() {
        let headers = naver_headers("id", " secret ").unwrap();
        assert_eq!(headers["x-naver-client-id"], "id");
        assert_eq!(headers["x-naver-client-secret"], "secret");
    }

    #[test]
    fn control_characters_are_rejected() {
        assert!(naver_headers("bad\nid", "secret").is_err());
    }
}
