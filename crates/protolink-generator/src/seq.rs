use crate::Generator;
use protolink_core::ShortCode;
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic short code generator using a sequential counter.
///
/// This generator produces codes like "pl000000", "pl000001", etc. and
/// ignores the prototype name. It is unique within a single instance, which
/// makes it useful in tests and for seeding fixtures.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
            prefix: self.prefix.clone(),
        }
    }
}

impl SeqGenerator {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::with_offset(prefix, 0)
    }

    /// Creates a generator starting from a specific counter value.
    ///
    /// Passing an offset that was already handed out makes the generator
    /// repeat codes, which is how collision handling is exercised in tests.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
            prefix: prefix.into(),
        }
    }

    /// Rewinds the counter.
    pub fn reset_to(&self, value: u64) {
        self.counter.store(value, Ordering::SeqCst);
    }
}

impl Generator for SeqGenerator {
    type Output = ShortCode;

    fn generate(&self, _name: &str) -> ShortCode {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        ShortCode::new_unchecked(format!("{}{:06}", self.prefix, count))
    }
}
