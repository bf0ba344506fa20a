// Constants module - wire-format values shared by the path builder and signers
//
// These values are part of the contract with deployed Thumbor servers.
// Changing any of them produces URLs the server rejects or mis-decodes.

// =============================================================================
// Path segments
// =============================================================================

/// Segment emitted for metadata-only requests
pub const META_SEGMENT: &str = "meta";

/// Segment emitted for fit-in resizing
pub const FIT_IN_SEGMENT: &str = "fit-in";

/// Segment emitted for smart cropping
pub const SMART_SEGMENT: &str = "smart";

/// Prefix of the trim segment
pub const TRIM_SEGMENT: &str = "trim";

/// Prefix of the filters segment
pub const FILTERS_PREFIX: &str = "filters:";

// =============================================================================
// Legacy cipher
// =============================================================================

/// AES-128 key length in bytes; the secret is cycled to this length
pub const LEGACY_KEY_LENGTH: usize = 16;

/// AES block size in bytes
pub const LEGACY_BLOCK_SIZE: usize = 16;

/// Padding byte appended to the legacy plaintext
pub const LEGACY_PAD_BYTE: u8 = b'{';

// =============================================================================
// Configuration defaults
// =============================================================================

/// Environment variable consulted by the CLI when no key is configured
pub const SECURITY_KEY_ENV: &str = "THUMBOR_SECURITY_KEY";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "warn";
