pub mod hash;
pub mod seq;

pub use hash::HashGenerator;
pub use seq::SeqGenerator;

use protolink_core::ShortCode;

/// Trait for minting short codes.
///
/// Implementations are pure generators that don't interact with storage:
/// they do not guarantee that a code is unused, the caller checks that
/// against the index.
pub trait Generator: Send + Sync + 'static {
    type Output: Into<ShortCode>;

    /// Mints a code for a prototype with the given logical name.
    ///
    /// Implementations may use the name as input, but the output must not be
    /// predictable from the name alone.
    fn generate(&self, name: &str) -> Self::Output;
}

impl<G: Generator> Generator for std::sync::Arc<G> {
    type Output = G::Output;

    fn generate(&self, name: &str) -> Self::Output {
        (**self).generate(name)
    }
}
