//! Content hashing using blake3.

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash a text buffer.
    #[inline]
    pub fn of(text: &str) -> Self {
        Self(*blake3::hash(text.as_bytes()).as_bytes())
    }

    /// Get the raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string (for debugging/display).
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display first 16 chars of hex for brevity
        write!(f, "{}", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_display() {
        let hash = ContentHash::new([0xab; 32]);
        assert_eq!(format!("{}", hash), "abababababababab");
    }

    #[test]
    fn test_same_text_same_hash() {
        assert_eq!(ContentHash::of("Hello Lucy !\n"), ContentHash::of("Hello Lucy !\n"));
        assert_ne!(ContentHash::of("a"), ContentHash::of("b"));
        assert_eq!(ContentHash::of("").to_hex().len(), 64);
    }
}
