/// Background removal seam
///
/// Segmentation itself is an external collaborator; this module only
/// defines how the rest of the app talks to it. A removal is a stream
/// of progress fractions terminated by exactly one result-or-error
/// item, which lets the batch engine consume real service calls and
/// scripted test doubles the same way.

use futures::stream::BoxStream;

pub mod http;

#[cfg(test)]
pub mod mock;

pub use http::{HttpRemover, RemoverConfig};

/// Why a removal failed
#[derive(Debug, thiserror::Error)]
pub enum RemovalError {
    #[error("removal service unreachable: {0}")]
    Network(#[from] reqwest::Error),
    #[error("removal service returned {status}: {detail}")]
    Service { status: u16, detail: String },
    #[error("removal service sent back an empty image")]
    EmptyOutput,
}

/// One item of a removal in progress
#[derive(Debug)]
pub enum RemovalUpdate {
    /// Fraction of the operation finished so far (0.0 - 1.0)
    Progress(f32),
    /// Terminal item; nothing follows it
    Done(Result<Vec<u8>, RemovalError>),
}

/// Stream of updates for one image's removal
pub type RemovalStream = BoxStream<'static, RemovalUpdate>;

/// The external background-removal operation.
///
/// Implementations take one image's bytes and emit progress followed
/// by a single terminal result. Progress updates always happen-before
/// the terminal item.
pub trait BackgroundRemover: Send + Sync {
    fn remove_background(&self, image: Vec<u8>, filename: &str) -> RemovalStream;
}
