//! Provider response values.
//!
//! Providers return results in shapes that change across models and API
//! versions. [`ProviderResponse`] is the closed set of shapes the pipeline
//! can reason about; the output extractor decides which of them carries the
//! artifact.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use tokio::io::AsyncRead;
use url::Url;

/// Maximum length of a diagnostic description.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// A readable byte stream handed back by a provider (file-like output).
pub struct StreamHandle {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    label: String,
}

impl StreamHandle {
    pub fn new(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            label: "stream".to_string(),
        }
    }

    /// Attach a short label used in diagnostics (e.g. the source file name).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn into_reader(self) -> Box<dyn AsyncRead + Send + Unpin> {
        self.reader
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle").field("label", &self.label).finish()
    }
}

/// Opaque provider output.
#[derive(Debug)]
pub enum ProviderResponse {
    /// Any string: a URL, an inline payload, or noise
    Text(String),
    /// Raw bytes already in memory
    Bytes(Vec<u8>),
    /// A file-like handle to drain
    Stream(StreamHandle),
    /// Ordered list of results
    Sequence(Vec<ProviderResponse>),
    /// Keyed object
    Mapping(BTreeMap<String, ProviderResponse>),
    /// Numbers, booleans and null
    Scalar(Value),
}

impl ProviderResponse {
    /// Short variant name for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderResponse::Text(_) => "text",
            ProviderResponse::Bytes(_) => "bytes",
            ProviderResponse::Stream(_) => "stream",
            ProviderResponse::Sequence(_) => "sequence",
            ProviderResponse::Mapping(_) => "mapping",
            ProviderResponse::Scalar(_) => "scalar",
        }
    }

    /// Compact human-readable description, bounded to [`MAX_DESCRIPTION_CHARS`].
    ///
    /// Large payloads are summarized (byte counts, truncated strings) so the
    /// result is safe to put in logs and error messages.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.write_description(&mut out);
        truncate_chars(&out, MAX_DESCRIPTION_CHARS)
    }

    fn write_description(&self, out: &mut String) {
        // Stop descending once the budget is spent; the result is truncated anyway.
        if out.len() > MAX_DESCRIPTION_CHARS * 4 {
            return;
        }
        match self {
            ProviderResponse::Text(s) => {
                out.push('"');
                out.push_str(&truncate_chars(s, 80));
                out.push('"');
            }
            ProviderResponse::Bytes(b) => out.push_str(&format!("<{} bytes>", b.len())),
            ProviderResponse::Stream(h) => out.push_str(&format!("<stream {}>", h.label())),
            ProviderResponse::Sequence(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_description(out);
                }
                out.push(']');
            }
            ProviderResponse::Mapping(map) => {
                out.push('{');
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&format!("{:?}: ", key));
                    value.write_description(out);
                }
                out.push('}');
            }
            ProviderResponse::Scalar(v) => out.push_str(&v.to_string()),
        }
    }
}

impl From<Value> for ProviderResponse {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => ProviderResponse::Text(s),
            Value::Array(items) => {
                ProviderResponse::Sequence(items.into_iter().map(ProviderResponse::from).collect())
            }
            Value::Object(map) => ProviderResponse::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, ProviderResponse::from(v)))
                    .collect(),
            ),
            other => ProviderResponse::Scalar(other),
        }
    }
}

impl From<&str> for ProviderResponse {
    fn from(s: &str) -> Self {
        ProviderResponse::Text(s.to_string())
    }
}

impl From<String> for ProviderResponse {
    fn from(s: String) -> Self {
        ProviderResponse::Text(s)
    }
}

impl From<Vec<u8>> for ProviderResponse {
    fn from(bytes: Vec<u8>) -> Self {
        ProviderResponse::Bytes(bytes)
    }
}

impl From<StreamHandle> for ProviderResponse {
    fn from(handle: StreamHandle) -> Self {
        ProviderResponse::Stream(handle)
    }
}

/// A fetchable reference to an artifact (http or https URL).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocator(Url);

impl RemoteLocator {
    /// Parse a string as a fetchable locator. Only `http` and `https` qualify.
    pub fn parse(s: &str) -> Option<Self> {
        let url = Url::parse(s.trim()).ok()?;
        match url.scheme() {
            "http" | "https" if url.has_host() => Some(Self(url)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for RemoteLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Truncate to at most `max` characters on a char boundary, marking the cut.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_value() {
        let value = json!({"output": ["https://x/y.mp4"], "status": 200, "ok": true});
        let response = ProviderResponse::from(value);
        let ProviderResponse::Mapping(map) = response else {
            panic!("expected mapping");
        };
        assert!(matches!(map.get("output"), Some(ProviderResponse::Sequence(items)) if items.len() == 1));
        assert!(matches!(map.get("status"), Some(ProviderResponse::Scalar(_))));
        assert!(matches!(map.get("ok"), Some(ProviderResponse::Scalar(_))));
    }

    #[test]
    fn test_describe_is_bounded() {
        let huge = ProviderResponse::Sequence(
            (0..1000).map(|i| ProviderResponse::Text(format!("item-{i}"))).collect(),
        );
        let description = huge.describe();
        assert!(description.chars().count() <= MAX_DESCRIPTION_CHARS + 3);
        assert!(description.starts_with("[\"item-0\""));
    }

    #[test]
    fn test_describe_summarizes_bytes() {
        let response = ProviderResponse::Bytes(vec![0u8; 4096]);
        assert_eq!(response.describe(), "<4096 bytes>");

        let stream = StreamHandle::new(std::io::Cursor::new(Vec::new())).with_label("clip.mp4");
        let wrapped = ProviderResponse::Sequence(vec![stream.into()]);
        assert_eq!(wrapped.describe(), "[<stream clip.mp4>]");
    }

    #[test]
    fn test_remote_locator_schemes() {
        assert!(RemoteLocator::parse("https://cdn.example.com/a.mp4").is_some());
        assert!(RemoteLocator::parse("http://localhost:9000/a").is_some());
        assert!(RemoteLocator::parse("  https://cdn.example.com/a.mp4\n").is_some());
        assert!(RemoteLocator::parse("file:///etc/passwd").is_none());
        assert!(RemoteLocator::parse("data:video/mp4;base64,AAAA").is_none());
        assert!(RemoteLocator::parse("not a url").is_none());
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé...");
        assert_eq!(truncate_chars("hi", 5), "hi");
    }
}
