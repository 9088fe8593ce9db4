//! Output extraction.
//!
//! Providers return artifacts in many shapes: a URL, a file-like stream, an
//! inline base64 payload, or any of those nested in lists and objects. The
//! extractor walks the response with a fixed priority chain and returns the
//! first artifact it can obtain.
//!
//! Priority, first match wins:
//! 1. Text that is an `http`/`https` URL
//! 2. A stream (drained) or raw bytes
//! 3. Text that decodes as a base64 payload of at least [`MIN_INLINE_CHARS`]
//! 4. A non-empty sequence: continue with its first element
//! 5. A mapping: continue with the first non-null value among [`MAPPING_KEYS`]
//!
//! Anything else is [`ExtractError::UnrecognizedShape`].

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;
use clipforge_models::{ProviderResponse, RemoteLocator, StreamHandle};
use serde_json::Value;
use thiserror::Error;
use tokio::io::AsyncReadExt;

/// Keys tried on mapping responses, in order.
pub const MAPPING_KEYS: [&str; 8] = [
    "video",
    "url",
    "output",
    "output_url",
    "download_url",
    "file",
    "artifact",
    "data",
];

/// Shortest text considered as an inline payload.
pub const MIN_INLINE_CHARS: usize = 64;

/// Maximum number of sequence/mapping unwraps.
pub const MAX_UNWRAP_DEPTH: usize = 16;

/// Artifact located in a provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// Artifact bytes already in hand
    Bytes(Vec<u8>),
    /// Artifact must be fetched from this locator
    Remote(RemoteLocator),
}

/// Why no artifact could be extracted.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to read provider stream: {0}")]
    Stream(#[from] std::io::Error),

    #[error("Provider returned an empty payload")]
    EmptyPayload,

    #[error("Unrecognized provider output: {snippet}")]
    UnrecognizedShape { snippet: String },
}

/// Locate the artifact in a provider response.
pub async fn extract(response: ProviderResponse) -> Result<Extracted, ExtractError> {
    // Described up front; the response is consumed while unwrapping.
    let snippet = response.describe();
    let unrecognized = || ExtractError::UnrecognizedShape {
        snippet: snippet.clone(),
    };

    let mut current = response;
    for _ in 0..=MAX_UNWRAP_DEPTH {
        current = match current {
            ProviderResponse::Text(text) => {
                if let Some(locator) = RemoteLocator::parse(&text) {
                    return Ok(Extracted::Remote(locator));
                }
                return decode_inline(&text)
                    .map(Extracted::Bytes)
                    .ok_or_else(unrecognized);
            }
            ProviderResponse::Stream(handle) => return drain(handle).await.map(Extracted::Bytes),
            ProviderResponse::Bytes(bytes) if bytes.is_empty() => {
                return Err(ExtractError::EmptyPayload)
            }
            ProviderResponse::Bytes(bytes) => return Ok(Extracted::Bytes(bytes)),
            ProviderResponse::Sequence(items) => match items.into_iter().next() {
                Some(first) => first,
                None => return Err(unrecognized()),
            },
            ProviderResponse::Mapping(mut map) => {
                let next = MAPPING_KEYS.iter().find_map(|key| {
                    map.remove(*key)
                        .filter(|v| !matches!(v, ProviderResponse::Scalar(Value::Null)))
                });
                match next {
                    Some(value) => value,
                    None => return Err(unrecognized()),
                }
            }
            ProviderResponse::Scalar(_) => return Err(unrecognized()),
        };
    }

    Err(unrecognized())
}

async fn drain(handle: StreamHandle) -> Result<Vec<u8>, ExtractError> {
    let mut reader = handle.into_reader();
    let mut data = Vec::new();
    reader.read_to_end(&mut data).await?;
    if data.is_empty() {
        return Err(ExtractError::EmptyPayload);
    }
    Ok(data)
}

/// Decode text as an inline base64 payload.
///
/// Accepts an optional `data:<mime>;base64,` prefix, ignores line breaks and
/// takes padded or unpadded standard-alphabet input. Any other whitespace
/// means prose, not a payload.
fn decode_inline(text: &str) -> Option<Vec<u8>> {
    let trimmed = text.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => rest.split_once(";base64,")?.1,
        None => trimmed,
    };

    let compact: String = payload.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
    if compact.len() < MIN_INLINE_CHARS || compact.contains(char::is_whitespace) {
        return None;
    }

    STANDARD
        .decode(&compact)
        .or_else(|_| STANDARD_NO_PAD.decode(&compact))
        .ok()
        .filter(|bytes| !bytes.is_empty())
}
