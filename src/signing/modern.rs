//! HMAC-SHA1 URL signing
//!
//! The signature is computed as:
//! ```text
//! signature = base64url(HMAC-SHA1(key, options + "/" + image_url))
//! ```
//! and the signed path is `/{signature}/{options}/{image_url}`.

use hmac::{Hmac, Mac};
use sha1::Sha1;

use super::URL_SAFE_LENIENT;
use crate::error::UrlError;
use base64::{engine::general_purpose::URL_SAFE, Engine};

type HmacSha1 = Hmac<Sha1>;

/// Base64url-encoded HMAC-SHA1 of a canonical path
pub fn generate_signature(key: &[u8], path: &str) -> Result<String, UrlError> {
    let mac = keyed_mac(key, path)?;
    Ok(URL_SAFE.encode(mac.finalize().into_bytes()))
}

/// Check a signed path of the form `/{signature}/{path}`
///
/// The comparison is constant-time.
pub fn validate_signature(key: &[u8], signed_path: &str) -> Result<(), UrlError> {
    let (signature, path) = signed_path
        .strip_prefix('/')
        .unwrap_or(signed_path)
        .split_once('/')
        .ok_or(UrlError::InvalidSignature)?;

    let signature = URL_SAFE_LENIENT
        .decode(signature)
        .map_err(|_| UrlError::InvalidSignature)?;

    keyed_mac(key, path)?
        .verify_slice(&signature)
        .map_err(|_| UrlError::InvalidSignature)
}

fn keyed_mac(key: &[u8], path: &str) -> Result<HmacSha1, UrlError> {
    let mut mac = HmacSha1::new_from_slice(key)
        .map_err(|e| UrlError::invalid_argument("key", e.to_string()))?;
    mac.update(path.as_bytes());
    Ok(mac)
}
