//! Transformation request model
//!
//! A [`TransformationRequest`] is the typed option set for one Thumbor URL.
//! It can be built directly with the `with_*` builders or parsed from a
//! loosely-typed parameter bag:
//!
//! ```text
//! image=my.domain.com/a.jpg&width=300&height=200&center=50,50&filters=quality(20)
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::constants::TRIM_SEGMENT;
use crate::error::UrlError;

/// Horizontal alignment used by the server when cropping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl HAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

impl FromStr for HAlign {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(HAlign::Left),
            "center" => Ok(HAlign::Center),
            "right" => Ok(HAlign::Right),
            _ => Err(UrlError::invalid_argument(
                "halign",
                format!("unknown horizontal alignment: {}", s),
            )),
        }
    }
}

/// Vertical alignment used by the server when cropping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

impl VAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Middle => "middle",
            Self::Bottom => "bottom",
        }
    }
}

impl FromStr for VAlign {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top" => Ok(VAlign::Top),
            "middle" => Ok(VAlign::Middle),
            "bottom" => Ok(VAlign::Bottom),
            _ => Err(UrlError::invalid_argument(
                "valign",
                format!("unknown vertical alignment: {}", s),
            )),
        }
    }
}

/// Corner whose pixel color is used as the trim reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimDirection {
    TopLeft,
    BottomRight,
}

impl TrimDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::BottomRight => "bottom-right",
        }
    }
}

impl FromStr for TrimDirection {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top-left" => Ok(TrimDirection::TopLeft),
            "bottom-right" => Ok(TrimDirection::BottomRight),
            _ => Err(UrlError::invalid_argument(
                "trim",
                format!("unknown trim direction: {}", s),
            )),
        }
    }
}

/// Border trimming
///
/// Renders as `trim`, `trim:{direction}` or `trim:{direction}:{tolerance}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Trim {
    /// Trim with the server's default reference pixel
    Enabled,
    Direction(TrimDirection),
    DirectionTolerance(TrimDirection, u32),
}

impl fmt::Display for Trim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trim::Enabled => write!(f, "{}", TRIM_SEGMENT),
            Trim::Direction(direction) => write!(f, "{}:{}", TRIM_SEGMENT, direction.as_str()),
            Trim::DirectionTolerance(direction, tolerance) => {
                write!(f, "{}:{}:{}", TRIM_SEGMENT, direction.as_str(), tolerance)
            }
        }
    }
}

impl From<Trim> for String {
    fn from(trim: Trim) -> Self {
        trim.to_string()
    }
}

/// Parses the option value form: `true`, `{direction}` or `{direction}:{tolerance}`.
/// The rendered segment form (`trim:...`) is accepted as well.
impl FromStr for Trim {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.strip_prefix(TRIM_SEGMENT).map_or(s, |rest| {
            rest.strip_prefix(':').unwrap_or(rest)
        });

        if value.is_empty() || value == "true" || value == "1" {
            return Ok(Trim::Enabled);
        }

        match value.split_once(':') {
            None => Ok(Trim::Direction(value.parse()?)),
            Some((direction, tolerance)) => {
                let tolerance: u32 = tolerance.parse().map_err(|_| {
                    UrlError::invalid_argument("trim", "tolerance must be a non-negative integer")
                })?;
                Ok(Trim::DirectionTolerance(direction.parse()?, tolerance))
            }
        }
    }
}

/// Focal point used by auto-crop, in original image coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Center {
    pub x: f64,
    pub y: f64,
}

impl Center {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub(crate) fn validate(&self) -> Result<(), UrlError> {
        if self.x.is_finite() && self.y.is_finite() {
            Ok(())
        } else {
            Err(UrlError::invalid_argument(
                "center",
                "coordinates must be finite numbers",
            ))
        }
    }
}

impl From<(f64, f64)> for Center {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl FromStr for Center {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(UrlError::invalid_argument(
                "center",
                "center must be an x,y pair",
            ));
        }

        let coordinate = |value: &str| -> Result<f64, UrlError> {
            value
                .parse()
                .map_err(|_| UrlError::invalid_argument("center", "coordinates must be numbers"))
        };

        let center = Center::new(coordinate(parts[0])?, coordinate(parts[1])?);
        center.validate()?;
        Ok(center)
    }
}

/// Crop box in original image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CropBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl CropBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// An all-zero box means "no crop"
    pub fn is_empty(&self) -> bool {
        self.left == 0 && self.top == 0 && self.right == 0 && self.bottom == 0
    }
}

impl fmt::Display for CropBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}:{}x{}",
            self.left, self.top, self.right, self.bottom
        )
    }
}

impl FromStr for CropBox {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<i32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| UrlError::invalid_argument("crop", "crop values must be integers"))?;

        match values.as_slice() {
            [left, top, right, bottom] => Ok(CropBox::new(*left, *top, *right, *bottom)),
            _ => Err(UrlError::invalid_argument(
                "crop",
                "crop must be left,top,right,bottom",
            )),
        }
    }
}

/// Options for a single image URL
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformationRequest {
    /// Source image locator (required)
    pub image: String,

    // === Resize ===
    /// Target width; a negative value is rendered literally
    pub width: Option<i32>,
    /// Target height; a negative value is rendered literally
    pub height: Option<i32>,
    /// Scale to fit inside the bounds instead of cropping
    pub fit_in: bool,
    /// Mirror along the horizontal axis (`-` before the width)
    pub flip: bool,
    /// Mirror along the vertical axis (`-` before the height)
    pub flop: bool,

    // === Crop ===
    pub original_width: Option<u32>,
    pub original_height: Option<u32>,
    /// Focal point for auto-crop
    pub center: Option<Center>,
    /// Explicit crop box, takes precedence over auto-crop
    pub crop: Option<CropBox>,
    pub halign: HAlign,
    pub valign: VAlign,
    /// Content-aware cropping on the server
    pub smart: bool,
    pub trim: Option<Trim>,

    // === Output ===
    /// Return image metadata instead of the image
    pub meta: bool,
    /// Pre-formatted filter calls, e.g. `quality(20)`
    pub filters: Vec<String>,

    /// Sign with the legacy encrypted format in `generate`
    pub legacy: bool,
}

impl TransformationRequest {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_width(mut self, width: i32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: i32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn with_original_size(mut self, width: u32, height: u32) -> Self {
        self.original_width = Some(width);
        self.original_height = Some(height);
        self
    }

    pub fn with_center(mut self, center: impl Into<Center>) -> Self {
        self.center = Some(center.into());
        self
    }

    pub fn with_crop(mut self, left: i32, top: i32, right: i32, bottom: i32) -> Self {
        self.crop = Some(CropBox::new(left, top, right, bottom));
        self
    }

    pub fn with_halign(mut self, halign: HAlign) -> Self {
        self.halign = halign;
        self
    }

    pub fn with_valign(mut self, valign: VAlign) -> Self {
        self.valign = valign;
        self
    }

    pub fn with_trim(mut self, trim: Trim) -> Self {
        self.trim = Some(trim);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filters.push(filter.into());
        self
    }

    pub fn fit_in(mut self) -> Self {
        self.fit_in = true;
        self
    }

    pub fn smart(mut self) -> Self {
        self.smart = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn flip(mut self) -> Self {
        self.flip = true;
        self
    }

    pub fn flop(mut self) -> Self {
        self.flop = true;
        self
    }

    pub fn legacy(mut self) -> Self {
        self.legacy = true;
        self
    }

    /// Fails with `MissingImage` when the locator is empty
    pub fn ensure_image(&self) -> Result<&str, UrlError> {
        if self.image.is_empty() {
            Err(UrlError::MissingImage)
        } else {
            Ok(&self.image)
        }
    }

    /// Parse from a parameter bag (e.g., decoded query string or CLI pairs)
    ///
    /// Unknown keys are ignored. A missing `image` is reported as
    /// `MissingImage`, malformed values as `InvalidArgument`.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, UrlError> {
        let image = params
            .get("image")
            .filter(|image| !image.is_empty())
            .ok_or(UrlError::MissingImage)?;
        let mut result = Self::new(image.as_str());

        if let Some(w) = params.get("width") {
            result.width = Some(parse_number("width", w)?);
        }
        if let Some(h) = params.get("height") {
            result.height = Some(parse_number("height", h)?);
        }
        if let Some(w) = params.get("original_width") {
            result.original_width = Some(parse_number("original_width", w)?);
        }
        if let Some(h) = params.get("original_height") {
            result.original_height = Some(parse_number("original_height", h)?);
        }

        if let Some(center) = params.get("center") {
            result.center = Some(center.parse()?);
        }
        if let Some(crop) = params.get("crop") {
            result.crop = Some(crop.parse()?);
        }

        if let Some(halign) = params.get("halign") {
            result.halign = halign.parse()?;
        }
        if let Some(valign) = params.get("valign") {
            result.valign = valign.parse()?;
        }

        if let Some(trim) = params.get("trim") {
            if parse_flag("trim", trim).ok() != Some(false) {
                result.trim = Some(trim.parse()?);
            }
        }

        if let Some(filters) = params.get("filters") {
            result.filters = split_filters(filters);
        }

        result.smart = flag(params, "smart")?;
        result.fit_in = flag(params, "fit_in")?;
        result.flip = flag(params, "flip")?;
        result.flop = flag(params, "flop")?;
        result.meta = flag(params, "meta")?;
        result.legacy = flag(params, "legacy")?;

        Ok(result)
    }
}

fn parse_number<T: FromStr>(param: &str, value: &str) -> Result<T, UrlError> {
    value
        .trim()
        .parse()
        .map_err(|_| UrlError::invalid_argument(param, format!("not a valid number: {}", value)))
}

fn parse_flag(param: &str, value: &str) -> Result<bool, UrlError> {
    match value {
        "1" | "true" => Ok(true),
        "" | "0" | "false" => Ok(false),
        _ => Err(UrlError::invalid_argument(
            param,
            format!("expected true or false, got {}", value),
        )),
    }
}

fn flag(params: &HashMap<String, String>, param: &str) -> Result<bool, UrlError> {
    params
        .get(param)
        .map_or(Ok(false), |value| parse_flag(param, value))
}

/// Split a colon-joined filter list, keeping colons inside parentheses
///
/// `quality(20):watermark(a.png,0,0,0):brightness(10)` yields three filters.
pub fn split_filters(filters: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, ch) in filters.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => {
                if index > start {
                    result.push(filters[start..index].to_string());
                }
                start = index + 1;
            }
            _ => {}
        }
    }

    if start < filters.len() {
        result.push(filters[start..].to_string());
    }

    result
}
