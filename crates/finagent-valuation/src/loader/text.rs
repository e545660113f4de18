//! Plain text decoding

/// Decode file bytes as UTF-8, falling back to Latin-1
///
/// The fallback maps every byte to the code point of the same value, so it
/// cannot fail.
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    }
}
