//! URL signing
//!
//! [`CryptoUrl`] holds the security key and produces request paths in one
//! of two modes:
//!
//! ## Modern (HMAC)
//! ```text
//! /{base64url(HMAC-SHA1(key, options/image_url))}/{options}/{image_url}
//! ```
//!
//! ## Legacy (encrypted)
//! ```text
//! /{base64url(AES-128-ECB(key16, options/md5(image_url)))}/{image_url}
//! ```

pub mod legacy;
pub mod modern;

use std::fmt;

use base64::engine::{general_purpose, DecodePaddingMode, GeneralPurpose};
use base64::alphabet;

use crate::constants::LEGACY_KEY_LENGTH;
use crate::error::UrlError;
use crate::path::{self, ImageSegment};
use crate::request::TransformationRequest;

pub use legacy::{computed_key, LegacyDescriptor};
pub use modern::{generate_signature, validate_signature};

/// URL-safe alphabet that decodes with or without `=` padding
pub(crate) const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    general_purpose::PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Signing mode selected for a generated URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMode {
    Hmac,
    Legacy,
}

impl SigningMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hmac => "hmac",
            Self::Legacy => "legacy",
        }
    }
}

/// URL builder bound to one security key
///
/// Immutable after construction; share it freely between threads.
#[derive(Clone)]
pub struct CryptoUrl {
    key: Vec<u8>,
    computed_key: [u8; LEGACY_KEY_LENGTH],
}

impl fmt::Debug for CryptoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoUrl")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl CryptoUrl {
    /// Create a builder for the given security key
    ///
    /// An empty key is `InvalidArgument` in both modes. HMAC would accept
    /// it, but the legacy cipher key cannot be derived from zero bytes and
    /// one builder serves both modes.
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, UrlError> {
        let key = key.into();
        let computed_key = computed_key(&key)?;
        Ok(Self { key, computed_key })
    }

    /// The 16-byte key used by the legacy cipher
    pub fn computed_key(&self) -> &[u8; LEGACY_KEY_LENGTH] {
        &self.computed_key
    }

    /// Unsigned canonical path ending in the image hash
    ///
    /// Does not use the key.
    pub fn url_for(&self, request: &TransformationRequest) -> Result<String, UrlError> {
        path::url_for(request)
    }

    /// Signed path, legacy or modern depending on `request.legacy`
    pub fn generate(&self, request: &TransformationRequest) -> Result<String, UrlError> {
        if request.legacy {
            self.sign_legacy(request)
        } else {
            self.sign(request)
        }
    }

    /// HMAC-signed path
    pub fn sign(&self, request: &TransformationRequest) -> Result<String, UrlError> {
        let path = path::build_path(request, ImageSegment::Raw)?;
        let signature = generate_signature(&self.key, &path)?;

        tracing::debug!(
            mode = SigningMode::Hmac.as_str(),
            path_len = path.len(),
            "Generated signed image URL"
        );

        Ok(format!("/{}/{}", signature, path))
    }

    /// Encrypted legacy path
    pub fn sign_legacy(&self, request: &TransformationRequest) -> Result<String, UrlError> {
        let descriptor = LegacyDescriptor::from_request(request)?;
        let encrypted = legacy::encrypt(&self.computed_key, &descriptor);

        tracing::debug!(
            mode = SigningMode::Legacy.as_str(),
            segment_len = encrypted.len(),
            "Generated encrypted image URL"
        );

        Ok(format!("/{}/{}", encrypted, request.image))
    }

    /// Decrypt the first segment of a legacy URL
    pub fn decode_legacy(&self, encrypted: &str) -> Result<LegacyDescriptor, UrlError> {
        legacy::decrypt(&self.computed_key, encrypted).map_err(|e| {
            tracing::debug!(error = %e, "Failed to decode legacy URL");
            e
        })
    }

    /// Check the signature of a path produced by [`CryptoUrl::sign`]
    pub fn validate(&self, signed_path: &str) -> Result<(), UrlError> {
        validate_signature(&self.key, signed_path)
    }
}
