use std::fmt::Display;

/// Content digest of a payload.
///
/// Two payloads with the same digest hold the same bytes,
/// which is how copies of a track are recognised after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadDigest(pub blake3::Hash);

impl PayloadDigest {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes))
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    /// first 16 hex chars, enough to tell payloads apart in urls and logs
    pub fn short(&self) -> String {
        self.to_hex()[..16].to_string()
    }
}

impl Display for PayloadDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
