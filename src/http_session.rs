//! Shared blocking HTTP session used by every source.

use std::io::Read;
use std::time::Duration;

use serde_json::Value;

use crate::config::NetworkConfig;
use crate::error::SourceError;

/// Upper bound on a single downloaded payload.
const MAX_PAYLOAD_BYTES: u64 = 32 * 1024 * 1024;

/// Raw response body plus its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl FetchedPayload {
    pub fn declares_image(&self) -> bool {
        self.content_type.to_ascii_lowercase().contains("image")
    }
}

/// Blocking GET capability the sources are written against.
pub trait HttpFetch {
    /// GETs `url` with `query` pairs and parses the body as JSON.
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, SourceError>;

    /// GETs `url` and returns the body as text (HTML pages).
    fn get_text(&self, url: &str) -> Result<String, SourceError>;

    /// GETs a binary payload using the longer download timeout.
    fn get_payload(&self, url: &str) -> Result<FetchedPayload, SourceError>;
}

/// One reusable connection pool carrying a fixed identifying user agent.
pub struct HttpSession {
    agent: ureq::Agent,
    download_timeout: Duration,
}

impl HttpSession {
    pub fn new(config: &NetworkConfig) -> Self {
        let request_timeout = Duration::from_secs(config.request_timeout_secs.max(1));
        let agent = ureq::AgentBuilder::new()
            .user_agent(&config.user_agent)
            .timeout_connect(request_timeout)
            .timeout_read(request_timeout)
            .timeout_write(request_timeout)
            .build();

        Self {
            agent,
            download_timeout: Duration::from_secs(config.download_timeout_secs.max(1)),
        }
    }

    fn call(request: ureq::Request) -> Result<ureq::Response, SourceError> {
        match request.call() {
            Ok(response) if response.status() == 200 => Ok(response),
            Ok(response) => Err(SourceError::Status(response.status())),
            Err(ureq::Error::Status(code, _)) => Err(SourceError::Status(code)),
            Err(error) => Err(SourceError::Network(error.to_string())),
        }
    }
}

impl HttpFetch for HttpSession {
    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, SourceError> {
        let request = self
            .agent
            .get(url)
            .set("Accept", "application/json")
            .query_pairs(query.iter().copied());
        let response = Self::call(request)?;
        let mut body = String::new();
        response
            .into_reader()
            .take(MAX_PAYLOAD_BYTES)
            .read_to_string(&mut body)
            .map_err(|error| SourceError::Network(format!("Failed to read response: {error}")))?;
        serde_json::from_str(&body)
            .map_err(|error| SourceError::Parse(format!("Invalid JSON response: {error}")))
    }

    fn get_text(&self, url: &str) -> Result<String, SourceError> {
        let response = Self::call(self.agent.get(url))?;
        let mut body = String::new();
        response
            .into_reader()
            .take(MAX_PAYLOAD_BYTES)
            .read_to_string(&mut body)
            .map_err(|error| SourceError::Network(format!("Failed to read response: {error}")))?;
        Ok(body)
    }

    fn get_payload(&self, url: &str) -> Result<FetchedPayload, SourceError> {
        let response = Self::call(self.agent.get(url).timeout(self.download_timeout))?;
        let content_type = response
            .header("Content-Type")
            .unwrap_or_default()
            .to_string();
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_PAYLOAD_BYTES)
            .read_to_end(&mut bytes)
            .map_err(|error| SourceError::Network(format!("Failed to read payload: {error}")))?;
        Ok(FetchedPayload {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted in-memory stand-in for [`HttpSession`].

    use std::cell::RefCell;
    use std::collections::HashMap;

    use serde_json::Value;

    use super::{FetchedPayload, HttpFetch};
    use crate::error::SourceError;

    /// Serves canned responses keyed by URL; unknown URLs fail with 404.
    #[derive(Default)]
    pub struct ScriptedFetch {
        json: HashMap<String, Value>,
        text: HashMap<String, String>,
        payloads: HashMap<String, FetchedPayload>,
        pub requests: RefCell<Vec<String>>,
    }

    impl ScriptedFetch {
        pub fn with_json(mut self, url: &str, value: Value) -> Self {
            self.json.insert(url.to_string(), value);
            self
        }

        pub fn with_text(mut self, url: &str, body: &str) -> Self {
            self.text.insert(url.to_string(), body.to_string());
            self
        }

        pub fn with_payload(mut self, url: &str, bytes: Vec<u8>, content_type: &str) -> Self {
            self.payloads.insert(
                url.to_string(),
                FetchedPayload {
                    bytes,
                    content_type: content_type.to_string(),
                },
            );
            self
        }

        fn record(&self, key: String) {
            self.requests.borrow_mut().push(key);
        }

        /// Key used for JSON lookups: the URL followed by `?k=v&...` in call order.
        pub fn json_key(url: &str, query: &[(&str, &str)]) -> String {
            if query.is_empty() {
                return url.to_string();
            }
            let pairs = query
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join("&");
            format!("{url}?{pairs}")
        }
    }

    impl HttpFetch for ScriptedFetch {
        fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, SourceError> {
            let key = Self::json_key(url, query);
            self.record(key.clone());
            self.json.get(&key).cloned().ok_or(SourceError::Status(404))
        }

        fn get_text(&self, url: &str) -> Result<String, SourceError> {
            self.record(url.to_string());
            self.text.get(url).cloned().ok_or(SourceError::Status(404))
        }

        fn get_payload(&self, url: &str) -> Result<FetchedPayload, SourceError> {
            self.record(url.to_string());
            self.payloads
                .get(url)
                .cloned()
                .ok_or(SourceError::Status(404))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FetchedPayload;

    #[test]
    fn test_declares_image_accepts_image_content_types() {
        let payload = FetchedPayload {
            bytes: vec![1, 2, 3],
            content_type: "image/jpeg; charset=binary".to_string(),
        };
        assert!(payload.declares_image());

        let upper = FetchedPayload {
            bytes: vec![],
            content_type: "IMAGE/PNG".to_string(),
        };
        assert!(upper.declares_image());
    }

    #[test]
    fn test_declares_image_rejects_html_and_missing_type() {
        let html = FetchedPayload {
            bytes: b"<html></html>".to_vec(),
            content_type: "text/html".to_string(),
        };
        assert!(!html.declares_image());

        let missing = FetchedPayload {
            bytes: vec![0xff, 0xd8],
            content_type: String::new(),
        };
        assert!(!missing.declares_image());
    }
}
