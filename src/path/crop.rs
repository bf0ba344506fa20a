//! Auto-crop around a focal point
//!
//! Given the original image size, the requested size and a center point,
//! compute the largest box with the requested aspect ratio that keeps the
//! center as close to its middle as the frame allows.

use crate::error::UrlError;
use crate::request::{CropBox, TransformationRequest};

/// Compute the auto-crop box for a request
///
/// Returns `Ok(None)` when the inputs needed for auto-crop are incomplete,
/// when the aspect ratios already match, or when the box would cover the
/// whole frame.
pub fn auto_crop(request: &TransformationRequest) -> Result<Option<CropBox>, UrlError> {
    let (original_width, original_height, center) =
        match (request.original_width, request.original_height, request.center) {
            (Some(w), Some(h), Some(center)) => (w, h, center),
            _ => return Ok(None),
        };

    center.validate()?;

    let width = request.width.unwrap_or(0);
    let height = request.height.unwrap_or(0);
    if width == 0 && height == 0 {
        return Ok(None);
    }

    if original_width == 0 || original_height == 0 {
        return Err(UrlError::invalid_argument(
            "original_width",
            "original dimensions must be positive",
        ));
    }

    let max_extent = i32::MAX as u32;
    if original_width > max_extent || original_height > max_extent {
        return Err(UrlError::invalid_argument(
            "original_width",
            format!("original dimensions must not exceed {}", max_extent),
        ));
    }

    // A missing requested dimension keeps the original one.
    let width = if width == 0 {
        f64::from(original_width)
    } else {
        f64::from(width).abs()
    };
    let height = if height == 0 {
        f64::from(original_height)
    } else {
        f64::from(height).abs()
    };

    let original_w = f64::from(original_width);
    let original_h = f64::from(original_height);
    let new_ratio = width / height;
    let original_ratio = original_w / original_h;

    let crop = if new_ratio > original_ratio {
        let cropped = (original_w / new_ratio).round();
        let top = place(center.y, cropped, original_h);
        CropBox::new(0, top, original_width as i32, top + cropped as i32)
    } else if new_ratio < original_ratio {
        let cropped = (original_h * new_ratio).round();
        let left = place(center.x, cropped, original_w);
        CropBox::new(left, 0, left + cropped as i32, original_height as i32)
    } else {
        return Ok(None);
    };

    let full_frame = CropBox::new(0, 0, original_width as i32, original_height as i32);
    if crop == full_frame {
        return Ok(None);
    }

    Ok(Some(crop))
}

/// Start offset of a `length` span centered on `focus`, kept inside `0..=extent`
fn place(focus: f64, length: f64, extent: f64) -> i32 {
    let start = (focus - length * 0.5).round();
    start.min(extent - length).max(0.0) as i32
}
