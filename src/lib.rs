//! Surface decomposition and identity-preserving conversion of building
//! element models.

pub mod cache;
pub mod convert;
pub mod decompose;
pub mod diagnostics;
pub mod document;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod math;

pub use error::{BimsurfError, Result};
