//! Fetch relay for the remote GLB.
//!
//! Browsers refuse the asset host's responses cross-origin, so the viewer asks
//! the relay instead. The relay fetches once, passes the body and content type
//! through unchanged, and marks the response readable from any origin. It
//! never retries.

use std::io::Read;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
/// Upper bound on a relayed body.
pub const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("{0}")]
    Transport(String),
    #[error("failed to read upstream body: {0}")]
    Body(#[from] std::io::Error),
    #[error("upstream body exceeds {limit} bytes")]
    TooLarge { limit: u64 },
}

/// What the upstream server answered, success or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Upstream {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Fetcher {
    /// `Err` only when no HTTP response arrived at all.
    fn fetch(&self, url: &str) -> Result<Upstream, RelayError>;
}

pub struct UreqFetcher {
    agent: ureq::Agent,
}

impl UreqFetcher {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Default for UreqFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for UreqFetcher {
    fn fetch(&self, url: &str) -> Result<Upstream, RelayError> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(RelayError::Transport(transport.to_string()))
            }
        };
        let status = response.status();
        let status_text = response.status_text().to_string();
        let content_type = response.header("content-type").map(str::to_string);
        let body = read_body(response.into_reader(), MAX_BODY_BYTES)?;
        Ok(Upstream {
            status,
            status_text,
            content_type,
            body,
        })
    }
}

/// Reads at most `limit` bytes; a longer body is an error, never a truncation.
fn read_body(reader: impl Read, limit: u64) -> Result<Vec<u8>, RelayError> {
    let mut body = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut body)?;
    if body.len() as u64 > limit {
        return Err(RelayError::TooLarge { limit });
    }
    Ok(body)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RelayResponse {
    fn text(status: u16, message: String) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
            body: message.into_bytes(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Serves one relay request for the `url` query parameter.
pub fn handle(url: Option<&str>, fetcher: &dyn Fetcher) -> RelayResponse {
    let Some(url) = url.map(str::trim).filter(|url| !url.is_empty()) else {
        return RelayResponse::text(400, "Missing ?url=".to_string());
    };

    match fetcher.fetch(url) {
        Ok(upstream) if upstream.is_ok() => {
            log::info!("Relayed {} bytes from {url}", upstream.body.len());
            RelayResponse {
                status: 200,
                headers: vec![
                    ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
                    (
                        "Content-Type".to_string(),
                        upstream
                            .content_type
                            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                    ),
                ],
                body: upstream.body,
            }
        }
        Ok(upstream) => {
            log::warn!("Upstream {url} answered {}", upstream.status);
            RelayResponse::text(
                upstream.status,
                format!("Upstream error: {}", upstream.status_text),
            )
        }
        Err(err) => {
            log::error!("Relay fetch of {url} failed: {err}");
            RelayResponse::text(500, format!("Proxy error: {err}"))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Fetcher, RelayError, Upstream};
    use std::cell::RefCell;

    /// Serves canned answers and records requested URLs.
    pub struct CannedFetcher {
        pub answer: Result<Upstream, String>,
        pub calls: RefCell<Vec<String>>,
    }

    impl CannedFetcher {
        pub fn ok(content_type: Option<&str>, body: &[u8]) -> Self {
            Self {
                answer: Ok(Upstream {
                    status: 200,
                    status_text: "OK".to_string(),
                    content_type: content_type.map(str::to_string),
                    body: body.to_vec(),
                }),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn status(status: u16, status_text: &str) -> Self {
            Self {
                answer: Ok(Upstream {
                    status,
                    status_text: status_text.to_string(),
                    content_type: Some("text/html".to_string()),
                    body: b"nope".to_vec(),
                }),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn unreachable(message: &str) -> Self {
            Self {
                answer: Err(message.to_string()),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Fetcher for CannedFetcher {
        fn fetch(&self, url: &str) -> Result<Upstream, RelayError> {
            self.calls.borrow_mut().push(url.to_string());
            self.answer.clone().map_err(RelayError::Transport)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::CannedFetcher;
    use super::*;

    #[test]
    fn missing_url_is_bad_request() {
        let fetcher = CannedFetcher::ok(None, b"");
        for url in [None, Some(""), Some("   ")] {
            let response = handle(url, &fetcher);
            assert_eq!(response.status, 400);
            assert_eq!(response.body, b"Missing ?url=");
        }
        assert!(fetcher.calls.borrow().is_empty());
    }

    #[test]
    fn success_passes_body_and_content_type_through() {
        let fetcher = CannedFetcher::ok(Some("model/gltf-binary"), b"glTF....");
        let response = handle(Some("https://cdn.example/arrow.glb"), &fetcher);

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"glTF....");
        assert_eq!(response.header("content-type"), Some("model/gltf-binary"));
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
        assert_eq!(*fetcher.calls.borrow(), vec!["https://cdn.example/arrow.glb"]);
    }

    #[test]
    fn missing_content_type_defaults_to_octet_stream() {
        let fetcher = CannedFetcher::ok(None, b"x");
        let response = handle(Some("https://cdn.example/a.glb"), &fetcher);
        assert_eq!(response.header("Content-Type"), Some(DEFAULT_CONTENT_TYPE));
    }

    #[test]
    fn upstream_failure_keeps_status() {
        let fetcher = CannedFetcher::status(404, "Not Found");
        let response = handle(Some("https://cdn.example/missing.glb"), &fetcher);
        assert_eq!(response.status, 404);
        assert_eq!(response.body, b"Upstream error: Not Found");
        assert_eq!(response.header("Access-Control-Allow-Origin"), None);
    }

    #[test]
    fn body_at_limit_is_kept_whole() {
        let body = read_body(std::io::repeat(7).take(16), 16).unwrap();
        assert_eq!(body, vec![7u8; 16]);
    }

    #[test]
    fn oversized_body_is_an_error_not_a_truncation() {
        let err = read_body(std::io::repeat(7).take(26), 16).unwrap_err();
        assert!(matches!(err, RelayError::TooLarge { limit: 16 }));
    }

    struct OversizedFetcher;

    impl Fetcher for OversizedFetcher {
        fn fetch(&self, _url: &str) -> Result<Upstream, RelayError> {
            Err(RelayError::TooLarge {
                limit: MAX_BODY_BYTES,
            })
        }
    }

    #[test]
    fn oversized_upstream_is_a_proxy_error() {
        let response = handle(Some("https://cdn.example/huge.glb"), &OversizedFetcher);
        assert_eq!(response.status, 500);
        assert!(!response.is_ok());
        let body = String::from_utf8(response.body).unwrap();
        assert!(body.starts_with("Proxy error: upstream body exceeds"));
    }

    #[test]
    fn transport_failure_is_500() {
        let fetcher = CannedFetcher::unreachable("dns lookup failed");
        let response = handle(Some("https://nowhere.invalid/a.glb"), &fetcher);
        assert_eq!(response.status, 500);
        assert_eq!(response.body, b"Proxy error: dns lookup failed");
    }
}
