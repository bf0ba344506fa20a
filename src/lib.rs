// Thumbor URL builder library

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod path;
pub mod request;
pub mod signing;

pub use config::SignerConfig;
pub use error::UrlError;
pub use path::{build_path, image_hash, url_for, ImageSegment};
pub use request::{Center, CropBox, HAlign, TransformationRequest, Trim, TrimDirection, VAlign};
pub use signing::{CryptoUrl, LegacyDescriptor, SigningMode};
