//! Canonical path builder
//!
//! Renders a [`TransformationRequest`] into the slash-delimited option path
//! understood by Thumbor:
//!
//! ```text
//! meta/trim/AxB:CxD/fit-in/-Ex-F/HALIGN/VALIGN/smart/filters:.../IMAGE
//! ```
//!
//! Each segment is present only when its option is set. No I/O and no
//! cryptography happens here, except the MD5 digest of the image locator.

pub mod crop;

use md5::{Digest, Md5};

use crate::constants::{FILTERS_PREFIX, FIT_IN_SEGMENT, META_SEGMENT, SMART_SEGMENT};
use crate::error::UrlError;
use crate::request::{CropBox, HAlign, Trim, TransformationRequest, VAlign};

pub use crop::auto_crop;

/// What the final path segment carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSegment {
    /// MD5 hex digest of the image locator
    Hash,
    /// The image locator as given
    Raw,
}

/// Canonical path ending in the image hash (unsigned, for inspection)
pub fn url_for(request: &TransformationRequest) -> Result<String, UrlError> {
    build_path(request, ImageSegment::Hash)
}

/// Canonical path with the chosen final segment
pub fn build_path(request: &TransformationRequest, image: ImageSegment) -> Result<String, UrlError> {
    let locator = request.ensure_image()?;

    let mut parts = option_segments(request)?;
    parts.push(match image {
        ImageSegment::Hash => image_hash(locator),
        ImageSegment::Raw => locator.to_string(),
    });

    Ok(parts.join("/"))
}

/// MD5 hex digest of an image locator
pub fn image_hash(image: &str) -> String {
    hex::encode(Md5::digest(image.as_bytes()))
}

/// The option segments, in wire order, without the image segment
pub fn option_segments(request: &TransformationRequest) -> Result<Vec<String>, UrlError> {
    let crop = resolve_crop(request)?;

    let width = request.width.unwrap_or(0);
    let height = request.height.unwrap_or(0);
    let dimensions = (width != 0 || height != 0 || request.flip || request.flop).then(|| {
        format!(
            "{}x{}",
            signed_dimension(width, request.flip),
            signed_dimension(height, request.flop)
        )
    });

    Ok(OptionSegments {
        meta: request.meta,
        trim: request.trim,
        crop,
        fit_in: request.fit_in,
        dimensions,
        halign: request.halign,
        valign: request.valign,
        smart: request.smart,
        filters: &request.filters,
    }
    .render())
}

/// Explicit non-empty crop, else the auto-crop box
pub fn resolve_crop(request: &TransformationRequest) -> Result<Option<CropBox>, UrlError> {
    match request.crop.filter(|crop| !crop.is_empty()) {
        Some(crop) => Ok(Some(crop)),
        None => auto_crop(request),
    }
}

/// Prefix `-` when mirroring; a negative value keeps its own sign too
fn signed_dimension(value: i32, mirrored: bool) -> String {
    if mirrored {
        format!("-{}", value)
    } else {
        value.to_string()
    }
}

/// Resolved option values, shared with the legacy descriptor rendering
pub(crate) struct OptionSegments<'a> {
    pub meta: bool,
    pub trim: Option<Trim>,
    pub crop: Option<CropBox>,
    pub fit_in: bool,
    pub dimensions: Option<String>,
    pub halign: HAlign,
    pub valign: VAlign,
    pub smart: bool,
    pub filters: &'a [String],
}

impl OptionSegments<'_> {
    pub(crate) fn render(&self) -> Vec<String> {
        let mut parts = Vec::new();

        if self.meta {
            parts.push(META_SEGMENT.to_string());
        }

        if let Some(trim) = self.trim {
            parts.push(trim.to_string());
        }

        if let Some(crop) = self.crop.filter(|crop| !crop.is_empty()) {
            parts.push(crop.to_string());
        }

        if self.fit_in {
            parts.push(FIT_IN_SEGMENT.to_string());
        }

        if let Some(ref dimensions) = self.dimensions {
            parts.push(dimensions.clone());
        }

        if self.halign != HAlign::Center {
            parts.push(self.halign.as_str().to_string());
        }

        if self.valign != VAlign::Middle {
            parts.push(self.valign.as_str().to_string());
        }

        if self.smart {
            parts.push(SMART_SEGMENT.to_string());
        }

        if !self.filters.is_empty() {
            parts.push(format!("{}{}", FILTERS_PREFIX, self.filters.join(":")));
        }

        parts
    }
}
