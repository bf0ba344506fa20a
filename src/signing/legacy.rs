//! Legacy encrypted URLs
//!
//! Older Thumbor servers expect the options as an AES-128-ECB encrypted
//! descriptor instead of a signature:
//!
//! ```text
//! /{base64url(AES(key16, pad(options + "/" + md5(image))))}/{image_url}
//! ```
//!
//! The descriptor text, the `{` padding and the cycled 16-byte key are a
//! frozen wire format.

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;
use std::sync::OnceLock;
use base64::{engine::general_purpose::URL_SAFE, Engine};
use regex::Regex;
use serde::Serialize;

use super::URL_SAFE_LENIENT;
use crate::constants::{LEGACY_BLOCK_SIZE, LEGACY_KEY_LENGTH, LEGACY_PAD_BYTE};
use crate::error::UrlError;
use crate::path::{image_hash, resolve_crop, OptionSegments};
use crate::request::{CropBox, HAlign, Trim, TransformationRequest, VAlign};

/// Grammar of the decrypted descriptor, in wire order
const DESCRIPTOR_PATTERN: &str = concat!(
    r"^(?:(?P<meta>meta)/)?",
    r"(?:(?P<trim>trim(?::[a-z-]+)?(?::\d+)?)/)?",
    r"(?:(?P<crop_left>-?\d+)x(?P<crop_top>-?\d+):(?P<crop_right>-?\d+)x(?P<crop_bottom>-?\d+)/)?",
    r"(?:(?P<fit_in>fit-in)/)?",
    r"(?:(?P<horizontal_flip>-)?(?P<width>\d+)?x(?P<vertical_flip>-)?(?P<height>\d+)?/)?",
    r"(?:(?P<halign>left|right|center)/)?",
    r"(?:(?P<valign>top|bottom|middle)/)?",
    r"(?:(?P<smart>smart)/)?",
    r"(?:filters:(?P<filters>(?s:.+))/)?",
    r"(?P<image_hash>[0-9a-f]{32})$",
);

static DESCRIPTOR_REGEX: OnceLock<Regex> = OnceLock::new();

/// Compiled descriptor grammar, built on first use
///
/// The pattern is a constant; `test_descriptor_regex_is_valid` covers it.
fn descriptor_regex() -> &'static Regex {
    DESCRIPTOR_REGEX
        .get_or_init(|| Regex::new(DESCRIPTOR_PATTERN).expect("Invalid legacy descriptor regex"))
}

/// Options as carried inside a legacy URL
///
/// Flips are separate flags here; the width and height are magnitudes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyDescriptor {
    pub horizontal_flip: bool,
    pub vertical_flip: bool,
    pub smart: bool,
    pub meta: bool,
    pub fit_in: bool,
    pub crop: CropBox,
    pub halign: HAlign,
    pub valign: VAlign,
    pub width: u32,
    pub height: u32,
    pub image_hash: String,
    /// Colon-joined filter calls, empty when there are none
    pub filters: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim: Option<Trim>,
}

impl LegacyDescriptor {
    /// Descriptor for a request, as the server will decode it
    ///
    /// A negative width becomes `horizontal_flip` plus its magnitude, which
    /// is also what the flip flag alone produces.
    pub fn from_request(request: &TransformationRequest) -> Result<Self, UrlError> {
        let image = request.ensure_image()?;
        let width = request.width.unwrap_or(0);
        let height = request.height.unwrap_or(0);

        Ok(Self {
            horizontal_flip: request.flip || width < 0,
            vertical_flip: request.flop || height < 0,
            smart: request.smart,
            meta: request.meta,
            fit_in: request.fit_in,
            crop: resolve_crop(request)?.unwrap_or_default(),
            halign: request.halign,
            valign: request.valign,
            width: width.unsigned_abs(),
            height: height.unsigned_abs(),
            image_hash: image_hash(image),
            filters: request.filters.join(":"),
            trim: request.trim,
        })
    }

    /// Descriptor text, before padding
    pub fn render(&self) -> String {
        let has_dimensions =
            self.width != 0 || self.height != 0 || self.horizontal_flip || self.vertical_flip;
        let dimensions = has_dimensions.then(|| {
            format!(
                "{}{}x{}{}",
                if self.horizontal_flip { "-" } else { "" },
                self.width,
                if self.vertical_flip { "-" } else { "" },
                self.height
            )
        });
        let filters: Vec<String> = if self.filters.is_empty() {
            Vec::new()
        } else {
            vec![self.filters.clone()]
        };

        let mut parts = OptionSegments {
            meta: self.meta,
            trim: self.trim,
            crop: Some(self.crop),
            fit_in: self.fit_in,
            dimensions,
            halign: self.halign,
            valign: self.valign,
            smart: self.smart,
            filters: &filters,
        }
        .render();
        parts.push(self.image_hash.clone());
        parts.join("/")
    }

    /// Parse decrypted descriptor text
    pub fn parse(text: &str) -> Result<Self, UrlError> {
        let caps = descriptor_regex()
            .captures(text)
            .ok_or_else(|| UrlError::decode("descriptor does not match the legacy layout"))?;

        let present = |name: &str| caps.name(name).is_some();
        let number = |name: &str| -> Result<Option<i64>, UrlError> {
            caps.name(name)
                .map(|m| {
                    m.as_str()
                        .parse::<i64>()
                        .map_err(|_| UrlError::decode(format!("{} is out of range", name)))
                })
                .transpose()
        };
        let crop_value = |name: &str| -> Result<i32, UrlError> {
            i32::try_from(number(name)?.unwrap_or(0))
                .map_err(|_| UrlError::decode(format!("{} is out of range", name)))
        };
        let size_value = |name: &str| -> Result<u32, UrlError> {
            u32::try_from(number(name)?.unwrap_or(0))
                .map_err(|_| UrlError::decode(format!("{} is out of range", name)))
        };

        let trim = caps
            .name("trim")
            .map(|m| m.as_str().parse::<Trim>())
            .transpose()
            .map_err(|e| UrlError::decode(e.to_string()))?;
        let halign = caps
            .name("halign")
            .map_or(Ok(HAlign::Center), |m| m.as_str().parse())
            .map_err(|e: UrlError| UrlError::decode(e.to_string()))?;
        let valign = caps
            .name("valign")
            .map_or(Ok(VAlign::Middle), |m| m.as_str().parse())
            .map_err(|e: UrlError| UrlError::decode(e.to_string()))?;

        Ok(Self {
            horizontal_flip: present("horizontal_flip"),
            vertical_flip: present("vertical_flip"),
            smart: present("smart"),
            meta: present("meta"),
            fit_in: present("fit_in"),
            crop: CropBox::new(
                crop_value("crop_left")?,
                crop_value("crop_top")?,
                crop_value("crop_right")?,
                crop_value("crop_bottom")?,
            ),
            halign,
            valign,
            width: size_value("width")?,
            height: size_value("height")?,
            image_hash: caps["image_hash"].to_string(),
            filters: caps
                .name("filters")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            trim,
        })
    }
}

/// Secret cycled and truncated to the AES-128 key length
///
/// `my-security-key` becomes `my-security-keym`.
pub fn computed_key(key: &[u8]) -> Result<[u8; LEGACY_KEY_LENGTH], UrlError> {
    if key.is_empty() {
        return Err(UrlError::invalid_argument("key", "security key is empty"));
    }

    let mut computed = [0u8; LEGACY_KEY_LENGTH];
    for (slot, byte) in computed.iter_mut().zip(key.iter().cycle()) {
        *slot = *byte;
    }
    Ok(computed)
}

/// Encrypt a descriptor into a base64url path segment
pub fn encrypt(key: &[u8; LEGACY_KEY_LENGTH], descriptor: &LegacyDescriptor) -> String {
    let mut data = pad(descriptor.render().into_bytes());

    let cipher = Aes128::new(GenericArray::from_slice(key));
    for block in data.chunks_exact_mut(LEGACY_BLOCK_SIZE) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }

    URL_SAFE.encode(data)
}

/// Decrypt and parse a base64url path segment
pub fn decrypt(
    key: &[u8; LEGACY_KEY_LENGTH],
    segment: &str,
) -> Result<LegacyDescriptor, UrlError> {
    let mut data = URL_SAFE_LENIENT
        .decode(segment.trim_matches('/'))
        .map_err(|e| UrlError::decode(format!("invalid base64: {}", e)))?;

    if data.is_empty() || data.len() % LEGACY_BLOCK_SIZE != 0 {
        return Err(UrlError::decode(format!(
            "ciphertext length {} is not a multiple of {}",
            data.len(),
            LEGACY_BLOCK_SIZE
        )));
    }

    let cipher = Aes128::new(GenericArray::from_slice(key));
    for block in data.chunks_exact_mut(LEGACY_BLOCK_SIZE) {
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
    }

    let text = unpad(&data)?;
    let text = std::str::from_utf8(text)
        .map_err(|_| UrlError::decode("decrypted descriptor is not valid UTF-8"))?;

    LegacyDescriptor::parse(text)
}

/// Append pad bytes up to the next block boundary, at least one
fn pad(mut data: Vec<u8>) -> Vec<u8> {
    let pad_len = LEGACY_BLOCK_SIZE - data.len() % LEGACY_BLOCK_SIZE;
    data.resize(data.len() + pad_len, LEGACY_PAD_BYTE);
    data
}

fn unpad(data: &[u8]) -> Result<&[u8], UrlError> {
    let pad_len = data
        .iter()
        .rev()
        .take_while(|&&byte| byte == LEGACY_PAD_BYTE)
        .count();

    if pad_len == 0 || pad_len > LEGACY_BLOCK_SIZE {
        return Err(UrlError::decode("bad padding"));
    }

    Ok(&data[..data.len() - pad_len])
}
