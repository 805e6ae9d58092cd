//! Shareable-URL payloads: a small JSON document, deflated and encoded as
//! URL-safe base64 so it fits in a `#share/` fragment.

use crate::clock::Millis;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::debug;

/// Browsers start truncating or rejecting URLs past this length.
pub const MAX_URL_LENGTH: usize = 2_000;
pub const SHARE_FRAGMENT: &str = "#share/";
const DOCUMENT_VERSION: u32 = 2;
/// Upper bound on inflated payload size; guards against decompression bombs.
const MAX_INFLATED_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SharedDocument {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Millis,
    #[serde(default = "default_read_only")]
    pub read_only: bool,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_read_only() -> bool {
    true
}

fn default_version() -> u32 {
    1
}

impl SharedDocument {
    pub fn new(content: impl Into<String>, title: Option<String>, created_at: Millis) -> Self {
        Self {
            content: content.into(),
            title,
            created_at,
            read_only: true,
            version: DOCUMENT_VERSION,
        }
    }
}

pub fn compress(text: &str) -> String {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    // Writing into a Vec cannot fail.
    let bytes = match encoder.write_all(text.as_bytes()).and_then(|()| encoder.finish()) {
        Ok(bytes) => bytes,
        Err(_) => return String::new(),
    };
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Inverse of [`compress`]. Any malformed token yields `None`.
pub fn decompress(token: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(token.trim()).ok()?;
    inflate_bounded(&bytes, MAX_INFLATED_BYTES)
}

/// Inflate at most `limit` bytes; anything larger is rejected rather than cut.
fn inflate_bounded(bytes: &[u8], limit: u64) -> Option<String> {
    let mut text = String::new();
    DeflateDecoder::new(bytes)
        .take(limit.saturating_add(1))
        .read_to_string(&mut text)
        .ok()?;
    if text.len() as u64 > limit {
        debug!(limit, "Share payload exceeds inflate limit");
        return None;
    }
    Some(text)
}

pub fn encode_document(document: &SharedDocument) -> anyhow::Result<String> {
    let json = serde_json::to_string(document)?;
    Ok(compress(&json))
}

/// Decode a share token. Payloads that inflate to plain text rather than a
/// document are treated as bare content from an older format.
pub fn decode_document(token: &str) -> Option<SharedDocument> {
    let text = decompress(token)?;
    match serde_json::from_str::<SharedDocument>(&text) {
        Ok(document) => Some(document),
        Err(err) => {
            debug!("Share payload is not a document, using it as content: {err}");
            Some(SharedDocument {
                content: text,
                title: None,
                created_at: 0,
                read_only: true,
                version: 1,
            })
        }
    }
}

pub fn share_url(base_url: &str, token: &str) -> String {
    format!("{base_url}{SHARE_FRAGMENT}{token}")
}

/// Token portion of a share URL or fragment.
pub fn share_token(url: &str) -> Option<&str> {
    let (_, token) = url.split_once(SHARE_FRAGMENT)?;
    (!token.is_empty()).then_some(token)
}

pub fn can_share_via_url(base_url: &str, token: &str) -> bool {
    base_url.len() + SHARE_FRAGMENT.len() + token.len() < MAX_URL_LENGTH
}
