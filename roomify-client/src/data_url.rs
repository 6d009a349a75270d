//! Inline image representation (`data:<mime>;base64,<payload>`)

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode bytes as a base64 data URL
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// True for inline `data:` references
pub fn is_data_url(reference: &str) -> bool {
    reference.starts_with("data:")
}

/// Decode a base64 data URL into its MIME type and bytes
///
/// Returns `None` for anything that is not a well-formed base64 data URL.
pub fn decode_data_url(reference: &str) -> Option<(String, Vec<u8>)> {
    let rest = reference.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime_type = meta.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;
    Some((mime_type.to_string(), bytes))
}
