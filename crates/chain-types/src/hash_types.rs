//! Primitive hash/key/signature aliases shared by every crate in the workspace.

/// A 32-byte SHA-256 digest, hex-encoded wherever it crosses a wire or a log line.
pub type Hash = [u8; 32];

/// A 32-byte Ed25519 public key.
pub type PublicKeyBytes = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type SignatureBytes = [u8; 64];

/// Hex-encodes a fixed-size byte array using lowercase digits.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        use std::fmt::Write as _;
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Decodes a hex string into bytes. Returns `None` on malformed input
/// (odd length or non-hex digits) rather than panicking.
pub fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    let mut out = Vec::with_capacity(s.len() / 2);
    let bytes = s.as_bytes();
    for chunk in bytes.chunks(2) {
        let hi = (chunk[0] as char).to_digit(16)?;
        let lo = (chunk[1] as char).to_digit(16)?;
        out.push(((hi << 4) | lo) as u8);
    }
    Some(out)
}

/// Decodes a hex string into a fixed-size array, failing if the decoded
/// length does not match `N`.
pub fn from_hex_fixed<const N: usize>(s: &str) -> Option<[u8; N]> {
    let bytes = from_hex(s)?;
    if bytes.len() != N {
        return None;
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Some(out)
}
