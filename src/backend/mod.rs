//! Backend selection and execution.
//!
//! A filter backend runs an ordered filter chain against a source surface
//! and writes the result onto a target surface. The accelerated backend does
//! this on GPU textures; the software backend on plain pixel buffers. The
//! process decides once, lazily, which one is "the" backend via
//! [`with_filter_backend`], and keeps it until [`reset_filter_backend`].

use std::sync::{Mutex, MutexGuard, OnceLock};

use tracing::info;

/// The GPU-accelerated backend.
pub mod accelerated;
pub(crate) mod caches;
/// Capability detection and process-wide probes.
pub mod capability;
/// Copy-out strategy types and selection.
pub mod copy_strategy;
/// Call-scoped pipeline state and the shared pass machinery.
pub mod pipeline;
/// The software fallback backend.
pub mod software;

use crate::filters::Filter;
use crate::foundation::core::Surface2d;
use crate::foundation::error::FrescoResult;

pub use accelerated::AcceleratedBackend;
pub use software::SoftwareBackend;

/// Options controlling backend selection and the accelerated context.
///
/// Passed explicitly at construction; there is no ambient configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackendOpts {
    /// Route to the accelerated backend when capability detection passes.
    pub acceleration_enabled: bool,
    /// Side length of the square accelerated surface, and the upper bound on
    /// a pipeline's working resolution.
    pub tile_size: u32,
    /// Skip the copy-out benchmark and always use the persistent readback
    /// buffer (allocated up front).
    pub force_persistent_readback: bool,
}

impl Default for BackendOpts {
    fn default() -> Self {
        Self {
            acceleration_enabled: true,
            tile_size: 2048,
            force_persistent_readback: false,
        }
    }
}

/// Which executor a backend is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// GPU textures behind a headless accelerated context.
    Accelerated,
    /// In-memory pixel buffers.
    Software,
}

/// Renderer and vendor identification strings, lower-cased.
///
/// Both empty when no accelerated context exists. Diagnostics and
/// allow-listing only, never control flow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GpuInfo {
    /// Adapter/renderer identification.
    pub renderer: String,
    /// Driver/vendor identification.
    pub vendor: String,
}

/// Summary of one `apply_filters` invocation, for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineRun {
    /// Final output width.
    pub dest_width: u32,
    /// Final output height.
    pub dest_height: u32,
    /// Passes actually executed.
    pub passes_applied: usize,
    /// Pass budget left unconsumed (skipped `None` entries).
    pub passes_remaining: usize,
}

/// The contract every filter backend implements.
///
/// Backends are not safe for concurrent invocation; callers serialize calls
/// per instance. `dispose` must not be called while a call is in flight.
pub trait FilterBackend: Send {
    /// Apply `filters` in order to `source` at the `width x height` working
    /// resolution and write the result onto `target`.
    ///
    /// `None` entries are skipped. `cache_key` lets the backend reuse the
    /// uploaded source across calls; callers must evict before reusing a key
    /// with a differently-sized source.
    fn apply_filters(
        &mut self,
        filters: &[Option<&dyn Filter>],
        source: &Surface2d,
        width: u32,
        height: u32,
        target: &mut Surface2d,
        cache_key: Option<&str>,
    ) -> FrescoResult<PipelineRun>;

    /// Which executor this is.
    fn kind(&self) -> BackendKind;

    /// GPU identification, empty for non-accelerated backends.
    fn gpu_info(&self) -> GpuInfo {
        GpuInfo::default()
    }

    /// Drop any resources cached under `key`. No-op when absent.
    fn evict_caches_for_key(&mut self, _key: &str) {}

    /// Release the context and every cached resource. The backend may be
    /// reconstructed afterwards.
    fn dispose(&mut self) {}
}

/// Instantiate a backend for `opts`.
///
/// Accelerated iff acceleration is enabled and capability detection passes;
/// detection failure silently routes to the software fallback.
pub fn create_filter_backend(opts: &BackendOpts) -> Box<dyn FilterBackend> {
    if opts.acceleration_enabled && capability::acceleration_supported(opts.tile_size) {
        Box::new(AcceleratedBackend::new(opts))
    } else {
        info!("routing filters to the software backend");
        Box::new(SoftwareBackend::new())
    }
}

fn backend_slot() -> &'static Mutex<Option<Box<dyn FilterBackend>>> {
    static SLOT: OnceLock<Mutex<Option<Box<dyn FilterBackend>>>> = OnceLock::new();
    SLOT.get_or_init(|| Mutex::new(None))
}

fn lock_slot() -> MutexGuard<'static, Option<Box<dyn FilterBackend>>> {
    match backend_slot().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Run `f` against the process-wide filter backend, creating it on first use
/// with `opts`.
///
/// The selection is never re-evaluated after the first call; later `opts`
/// are ignored until [`reset_filter_backend`]. The slot also serializes
/// access, satisfying the one-call-in-flight contract.
pub fn with_filter_backend<R>(
    opts: &BackendOpts,
    f: impl FnOnce(&mut dyn FilterBackend) -> R,
) -> R {
    let mut slot = lock_slot();
    let backend = slot.get_or_insert_with(|| create_filter_backend(opts));
    f(backend.as_mut())
}

/// Dispose and forget the process-wide backend, so the next
/// [`with_filter_backend`] re-runs selection.
pub fn reset_filter_backend() {
    let mut slot = lock_slot();
    if let Some(mut backend) = slot.take() {
        backend.dispose();
    }
}
