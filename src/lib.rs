//! Fresco is an image-filter execution engine for 2D scene graphics.
//!
//! A caller hands the engine an ordered sequence of pixel filters, a source
//! surface, and a target surface; the engine runs the chain and writes the
//! filtered pixels onto the target.
//!
//! # Pipeline overview
//!
//! 1. **Select**: [`with_filter_backend`] decides once, lazily, whether the
//!    GPU-accelerated backend is usable (capability detection) and otherwise
//!    routes to the software fallback.
//! 2. **Execute**: the backend threads one call-scoped [`PipelineState`]
//!    through every filter; each filter's output becomes the next one's
//!    input. [`Composed`] chains count as a single logical pass.
//! 3. **Copy out**: the accelerated backend moves pixels off the GPU with
//!    whichever copy strategy its one-time construction benchmark bound.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **No ambient configuration**: behavior is controlled by an explicit
//!   [`BackendOpts`] passed at construction.
//! - **Straight RGBA8 end-to-end**: sources and targets are plain
//!   non-premultiplied pixel rectangles.
//! - **Serializable filters**: every filter round-trips through a tagged
//!   JSON description via an open type registry.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Backend selection and execution (accelerated + software).
pub mod backend;
/// Filter capability, composition, and built-in filter types.
pub mod filters;
mod foundation;

pub use backend::accelerated::AcceleratedBackend;
pub use backend::capability::{
    ShaderPrecision, acceleration_supported, max_accelerated_dimension, shader_precision,
};
pub use backend::copy_strategy::CopyStrategy;
pub use backend::pipeline::{PassContext, PipelineState, SoftwarePass, apply_standard};
pub use backend::software::SoftwareBackend;
pub use backend::{
    BackendKind, BackendOpts, FilterBackend, GpuInfo, PipelineRun, create_filter_backend,
    reset_filter_backend, with_filter_backend,
};
pub use filters::color::{Brightness, Contrast, Invert};
pub use filters::color_matrix::{ColorMatrix, IDENTITY_MATRIX};
pub use filters::composed::Composed;
pub use filters::filter::{
    Filter, FilterCtor, ctor_of, deserialize_filter, register_filter_type, serialize_filter,
};
pub use foundation::core::{Affine, PixelBuffer, Surface2d};
pub use foundation::error::{FrescoError, FrescoResult};
