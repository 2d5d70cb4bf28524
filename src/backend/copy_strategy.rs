//! Copy-out strategy: how filtered pixels leave the accelerated surface.

use std::time::Duration;

/// Method used to move pixels from the accelerated surface to a 2D target
/// surface.
///
/// The relative speed of the two is hardware- and driver-dependent, so the
/// backend times both once at construction and binds the faster one for its
/// lifetime (see `AcceleratedBackend`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyStrategy {
    /// Allocate a staging buffer per copy and release it afterwards. No
    /// retained memory; allocation cost on every call.
    Transient,
    /// Reuse one readback buffer sized for a full tile, allocated up front.
    /// No per-call allocation; holds tile-sized memory for the backend's
    /// lifetime.
    Persistent,
}

/// Pick the faster strategy from one timed copy each.
///
/// Ties favor [`CopyStrategy::Transient`]: it is evaluated first and only
/// replaced when the persistent copy is strictly faster.
pub(crate) fn choose(transient: Duration, persistent: Duration) -> CopyStrategy {
    if persistent < transient {
        CopyStrategy::Persistent
    } else {
        CopyStrategy::Transient
    }
}

/// Row stride for buffer copies: `width * 4` rounded up to the alignment
/// wgpu requires for texture-to-buffer transfers.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
}

#[cfg(test)]
#[path = "../../tests/unit/backend/copy_strategy.rs"]
mod tests;
