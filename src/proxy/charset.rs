//! Payload re-encoding to UTF-8.

use axum::body::Bytes;

/// Normalize an upstream payload to UTF-8.
///
/// Valid UTF-8 is returned untouched. Anything else is read as Latin-1
/// (every byte maps to the code point of the same value) and re-encoded.
pub fn to_utf8(body: Bytes) -> Bytes {
    if std::str::from_utf8(&body).is_ok() {
        return body;
    }
    let decoded: String = body.iter().map(|&byte| char::from(byte)).collect();
    Bytes::from(decoded)
}
