use thiserror::Error;

use crate::cache::SourceKind;
use crate::document::ElementKey;

/// Top-level error type for the surface decomposition and conversion core.
#[derive(Debug, Error)]
pub enum BimsurfError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("zero-length vector")]
    ZeroVector,

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Errors raised by the geometry kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("unsupported kernel operation: {0}")]
    Unsupported(String),

    #[error("kernel operation failed: {0}")]
    Failed(String),
}

/// Errors related to the shared document and its mutation scopes.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("element not found: {0}")]
    ElementNotFound(ElementKey),

    #[error("element already exists: {0}")]
    DuplicateElement(ElementKey),

    #[error("stale handle for element {0}: its mutation scope has ended")]
    StaleHandle(ElementKey),

    #[error("document geometry is out of date; regenerate first")]
    NotRegenerated,

    #[error("geometry of element {element} is unavailable: {reason}")]
    GeometryUnavailable { element: ElementKey, reason: String },

    #[error("elements {0} and {1} are not joined")]
    NotJoined(ElementKey, ElementKey),

    #[error("no mutation scope is open")]
    NoOpenScope,

    #[error("mutation scope mismatch: expected {expected}, found {found}")]
    ScopeMismatch { expected: u64, found: u64 },
}

/// Errors related to conversion cache usage.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache lookup for {kind:?} requires a context discriminator")]
    MissingContext { kind: SourceKind },
}

/// Convenience type alias for results using [`BimsurfError`].
pub type Result<T> = std::result::Result<T, BimsurfError>;
