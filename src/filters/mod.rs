//! Filter capability, composition, and built-in filter types.

/// Brightness, contrast, and inversion filters.
pub mod color;
/// General 4x5 color matrix filter and named looks.
pub mod color_matrix;
/// Container filter applying an ordered sub-chain as one logical pass.
pub mod composed;
/// The filter capability contract, serialization, and the type registry.
pub mod filter;

pub use color::{Brightness, Contrast, Invert};
pub use color_matrix::ColorMatrix;
pub use composed::Composed;
pub use filter::{Filter, FilterCtor, deserialize_filter, register_filter_type, serialize_filter};

use crate::foundation::core::PixelBuffer;
use rayon::prelude::*;

/// Apply `f` to every RGBA8 pixel in parallel.
pub(crate) fn par_pixels(image: &mut PixelBuffer, f: impl Fn(&mut [u8]) + Send + Sync) {
    image.data.par_chunks_exact_mut(4).for_each(|px| f(px));
}
