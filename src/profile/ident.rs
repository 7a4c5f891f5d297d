//! Username and UUID format helpers.

use crate::core::VhError;
use crate::core::client::UUID_HEX_LENGTH;

/// Validate a Minecraft username: 2–16 characters from `[A-Za-z0-9_]`.
pub fn validate_username(name: &str) -> Result<&str, VhError> {
    let ok = (2..=16).contains(&name.len())
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
    if ok {
        Ok(name)
    } else {
        Err(VhError::InvalidUsername(name.to_string()))
    }
}

/// Insert dashes into a 32-hex-char raw UUID: `8-4-4-4-12`.
pub fn format_uuid(hex_id: &str) -> Result<String, VhError> {
    if hex_id.len() != UUID_HEX_LENGTH || !hex_id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(VhError::Data(format!(
            "expected a {UUID_HEX_LENGTH}-char hex UUID, got {:?}",
            hex_id
        )));
    }
    Ok(format!(
        "{}-{}-{}-{}-{}",
        &hex_id[..8],
        &hex_id[8..12],
        &hex_id[12..16],
        &hex_id[16..20],
        &hex_id[20..]
    ))
}
