//! Percent and hex encoding used by canonical requests and rendered URLs.

const HEX_LOWER: &[u8; 16] = b"0123456789abcdef";
const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Encode bytes as lowercase hexadecimal string.
///
/// Used for encoding SHA-256 hashes and signatures.
pub fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        s.push(HEX_LOWER[(byte >> 4) as usize] as char);
        s.push(HEX_LOWER[(byte & 0x0f) as usize] as char);
    }
    s
}

/// Percent-encode a string according to RFC 3986.
///
/// Unreserved characters (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) are not encoded.
/// All other bytes are encoded as `%XX` where XX is the uppercase hex value.
pub fn percent_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push('%');
                result.push(HEX_UPPER[(byte >> 4) as usize] as char);
                result.push(HEX_UPPER[(byte & 0x0f) as usize] as char);
            }
        }
    }
    result
}

/// Percent-encode a URL path, preserving forward slashes.
///
/// Like [`percent_encode`], but keeps `/` characters unencoded to preserve
/// the path hierarchy in S3 keys.
pub fn percent_encode_path(path: &str) -> String {
    percent_encode(path).replace("%2F", "/")
}

/// Render `key=value` pairs joined with `&`, both sides percent-encoded.
pub(crate) fn encode_query<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
