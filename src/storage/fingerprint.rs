use std::fmt;
use std::str::FromStr;
use md5::{Digest, Md5};

/// Number of hex digits in the textual form of a [`Fingerprint`].
pub const FINGERPRINT_HEX_LEN: usize = 32;

/// Content identity of a byte sequence: its MD5 digest.
///
/// The textual form is 32 lowercase hex digits and is used verbatim as the
/// name of the archive entry directory, so archives written by other ox_mon
/// tooling share entries with this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u128);

impl Fingerprint {
    /// Computes the fingerprint of `data`.
    #[must_use]
    pub fn of(data: &[u8]) -> Self {
        Self::from_digest(&Md5::digest(data))
    }

    /// Packs a 16-byte digest big-endian so hex output keeps byte order.
    fn from_digest(digest: &[u8]) -> Self {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(digest);
        Self(u128::from_be_bytes(bytes))
    }

    /// Returns the raw digest.
    #[must_use]
    pub const fn as_u128(self) -> u128 {
        self.0
    }

    /// Returns the 32-digit lowercase hex encoding.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("{:032x}", self.0)
    }

    /// Whether `name` looks like an entry directory name.
    #[must_use]
    pub fn is_fingerprint_name(name: &str) -> bool {
        name.len() == FINGERPRINT_HEX_LEN
            && name
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Error returned when parsing a string that is not a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFingerprintError {
    /// The rejected input.
    input: String,
}

impl fmt::Display for ParseFingerprintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid fingerprint '{}': expected {FINGERPRINT_HEX_LEN} lowercase hex digits",
            self.input
        )
    }
}

impl std::error::Error for ParseFingerprintError {}

impl FromStr for Fingerprint {
    type Err = ParseFingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_fingerprint_name(s) {
            return Err(ParseFingerprintError {
                input: s.to_string(),
            });
        }
        u128::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| ParseFingerprintError {
                input: s.to_string(),
            })
    }
}

/// Incremental hasher for content that arrives in chunks.
///
/// Produces the same [`Fingerprint`] as [`Fingerprint::of`] over the
/// concatenated input.
pub struct FingerprintHasher {
    inner: Md5,
}

impl Default for FingerprintHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl FingerprintHasher {
    /// Creates an empty hasher.
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Md5::new() }
    }

    /// Feeds another chunk of content.
    pub fn update(&mut self, chunk: &[u8]) {
        Digest::update(&mut self.inner, chunk);
    }

    /// Returns the fingerprint of everything fed so far.
    #[must_use]
    pub fn finish(&self) -> Fingerprint {
        Fingerprint::from_digest(&self.inner.clone().finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let data = b"Hello, World!";
        let fp1 = Fingerprint::of(data);
        let fp2 = Fingerprint::of(data);
        assert_eq!(fp1, fp2);
        assert_eq!(fp1.to_hex().len(), FINGERPRINT_HEX_LEN);

        let fp3 = Fingerprint::of(b"Different data");
        assert_ne!(fp1, fp3);
    }

    #[test]
    fn test_known_entry_names() {
        // Directory names found in existing ox_mon archives.
        assert_eq!(
            Fingerprint::of(b"test.txt").to_hex(),
            "dd18bf3a8e0a2a3e53e2661c7fb53534"
        );
        assert_eq!(
            Fingerprint::of(b"").to_hex(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn test_display_matches_hex() {
        let fp = Fingerprint::of(b"test.txt");
        assert_eq!(fp.to_string(), fp.to_hex());
        assert_eq!(fp.to_hex(), format!("{:032x}", fp.as_u128()));
    }

    #[test]
    fn test_empty_content_has_fingerprint() {
        let fp = Fingerprint::of(b"");
        assert_eq!(fp.to_hex().len(), FINGERPRINT_HEX_LEN);
        assert_ne!(fp, Fingerprint::of(b"\0"));
    }

    #[test]
    fn test_parse() {
        let fp = Fingerprint::of(b"some test data");
        let parsed: Fingerprint = fp.to_hex().parse().unwrap();
        assert_eq!(parsed, fp);

        assert!("".parse::<Fingerprint>().is_err());
        assert!("xyz".parse::<Fingerprint>().is_err());
        assert!(fp.to_hex().to_uppercase().parse::<Fingerprint>().is_err());
        assert!(format!("{}0", fp.to_hex()).parse::<Fingerprint>().is_err());
    }

    #[test]
    fn test_is_fingerprint_name() {
        assert!(Fingerprint::is_fingerprint_name(
            "00000000000000000000000000000000"
        ));
        assert!(!Fingerprint::is_fingerprint_name(".tmpAbC123"));
        assert!(!Fingerprint::is_fingerprint_name(
            "0000000000000000000000000000000g"
        ));
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

        let mut hasher = FingerprintHasher::new();
        for chunk in data.chunks(65536) {
            hasher.update(chunk);
        }

        assert_eq!(hasher.finish(), Fingerprint::of(&data));
    }
}
