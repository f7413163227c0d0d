//! Identity allocation for graph entities.

use uuid::Uuid;

/// Prefix carried by every allocated uri.
pub const URI_PREFIX: &str = "node_";

/// Number of random hex characters following the prefix.
pub const URI_SUFFIX_LEN: usize = 12;

/// Allocates a collision-resistant opaque uri for a new graph entity.
///
/// The token is the fixed prefix plus the first twelve hex characters of a
/// v4 UUID: unique with overwhelming probability within one graph instance,
/// with no uniqueness claim across instances.
pub fn generate_uri() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}{}", URI_PREFIX, &hex[..URI_SUFFIX_LEN])
}
