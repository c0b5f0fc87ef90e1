use crate::Generator;
use jiff::Timestamp;
use protolink_core::ShortCode;
use sha2::{Digest, Sha256};
use typed_builder::TypedBuilder;

pub const DEFAULT_CODE_LENGTH: usize = 8;
const MIN_CODE_LENGTH: usize = 4;
const MAX_CODE_LENGTH: usize = 64;
const SALT_LEN: usize = 8;

/// Mints hex short codes from a SHA-256 digest of the prototype name, a
/// fresh random salt and the current time.
///
/// With the default length of 8 hex characters a code carries 32 bits, so
/// collisions are unlikely but possible; the caller must check the index.
#[derive(Debug, Clone, TypedBuilder)]
pub struct HashGenerator {
    /// Number of hex characters kept from the digest, clamped to `4..=64`.
    #[builder(
        default = DEFAULT_CODE_LENGTH,
        setter(transform = |length: usize| length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH))
    )]
    length: usize,
}

impl HashGenerator {
    pub fn length(&self) -> usize {
        self.length
    }

    /// Computes a code from explicit inputs.
    pub fn code_for(&self, name: &str, salt: &[u8], unix_millis: i64) -> ShortCode {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}-{}-{}", name, hex::encode(salt), unix_millis));
        let mut digest = hex::encode(hasher.finalize());
        digest.truncate(self.length);
        ShortCode::new_unchecked(digest)
    }
}

impl Default for HashGenerator {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Generator for HashGenerator {
    type Output = ShortCode;

    fn generate(&self, name: &str) -> Self::Output {
        let salt: [u8; SALT_LEN] = rand::random();
        self.code_for(name, &salt, Timestamp::now().as_millisecond())
    }
}
