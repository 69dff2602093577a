//! Global constants used throughout the tubegraph codebase
//!
//! This module contains compile-time constants that are shared across
//! multiple modules to ensure consistency and avoid magic numbers.

/// Base62 character set used for human-readable IDs
///
/// This character set provides 62 possible characters (0-9, a-z, A-Z)
/// for generating identifiers that are safe to embed in URLs and logs.
pub const BASE62_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Number of characters in an entity identifier
pub const ID16_LENGTH: usize = 16;

/// Page used when the caller supplies a missing, non-numeric or non-positive page
pub const DEFAULT_PAGE: u64 = 1;

/// Page size used when the caller supplies a missing, non-numeric or non-positive limit
pub const DEFAULT_LIMIT: u64 = 10;

/// Document field holding the identifier of every stored row
pub const ID_FIELD: &str = "_id";

/// Document field holding the creation timestamp (nanoseconds since epoch)
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Document field holding the last mutation timestamp
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Fields exposed when a user profile is joined onto another row
pub const PROFILE_FIELDS: &[&str] = &["_id", "username", "fullname", "avatar"];

/// Default time allowed for a single media store call
pub const DEFAULT_MEDIA_TIMEOUT_MS: u64 = 10_000;
