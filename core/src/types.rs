//! Shared primitive types used across the desk.

/// Client- or server-assigned complaint identifier.
pub type ComplaintId = String;

/// Monotonic counter bumped on every navigation.
/// Results of calls started under an older generation are discarded.
pub type Generation = u64;

/// Persisted key holding the JSON-encoded signed-in user.
pub const KEY_USER: &str = "user";

/// Persisted key holding the `"true"` sentinel once the tutorial is done.
pub const KEY_HAS_SEEN_VIDEO: &str = "hasSeenVideo";

/// Persisted key holding the JSON-encoded local complaint list.
pub const KEY_COMPLAINTS: &str = "complaints";
