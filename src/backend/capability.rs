//! Acceleration capability detection and process-wide probes.

use std::sync::OnceLock;

use tracing::debug;

/// Numeric precision tier available to filter programs, probed once per
/// process from highest to lowest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderPrecision {
    /// Full 32-bit floats (always compilable in WGSL).
    F32,
    /// Half floats, available only when the device exposes the `f16`
    /// extension.
    F16,
}

impl ShaderPrecision {
    /// Shader-module prelude enabling the tier's language extensions.
    pub(crate) fn wgsl_prelude(self) -> &'static str {
        match self {
            Self::F32 => "",
            Self::F16 => "enable f16;\n",
        }
    }

    /// Short label used in program cache keys and logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::F16 => "f16",
        }
    }
}

static MAX_SURFACE_DIM: OnceLock<u32> = OnceLock::new();
static PRECISION: OnceLock<ShaderPrecision> = OnceLock::new();

/// A throwaway or backend-owned accelerated context.
pub(crate) struct AccelParts {
    pub(crate) adapter: wgpu::Adapter,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
}

/// Acquire a headless accelerated context, or `None` when the host has no
/// usable adapter.
pub(crate) fn acquire_context() -> Option<AccelParts> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .ok()?;

    let mut features = wgpu::Features::empty();
    if adapter.features().contains(wgpu::Features::SHADER_F16) {
        features |= wgpu::Features::SHADER_F16;
    }

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("fresco_filter_device"),
        required_features: features,
        required_limits: adapter.limits(),
        experimental_features: wgpu::ExperimentalFeatures::default(),
        memory_hints: wgpu::MemoryHints::Performance,
        trace: wgpu::Trace::Off,
    }))
    .ok()?;

    Some(AccelParts {
        adapter,
        device,
        queue,
    })
}

/// Decide whether the accelerated backend is usable for a square working
/// surface of `tile_size`.
///
/// Builds a throwaway context; succeeds iff a device can be acquired at all
/// and its maximum surface dimension covers `tile_size`. As a side effect the
/// maximum dimension and the shader precision probe are cached process-wide
/// for diagnostics and later program compilation. Failure is a routing
/// decision, not an error.
pub fn acceleration_supported(tile_size: u32) -> bool {
    let Some(parts) = acquire_context() else {
        debug!("no accelerated context available");
        return false;
    };
    let max_dim = parts.device.limits().max_texture_dimension_2d;
    let _ = MAX_SURFACE_DIM.set(max_dim);
    let precision = precision_for(&parts.device);
    debug!(max_dim, tile_size, ?precision, "capability probe");
    max_dim >= tile_size
}

/// Maximum supported surface dimension recorded by the first capability
/// probe. Diagnostics only.
pub fn max_accelerated_dimension() -> Option<u32> {
    MAX_SURFACE_DIM.get().copied()
}

/// Precision tier recorded by the first probe, if any has run.
pub fn shader_precision() -> Option<ShaderPrecision> {
    PRECISION.get().copied()
}

/// The process-wide precision tier, probing `device` on first use.
pub(crate) fn precision_for(device: &wgpu::Device) -> ShaderPrecision {
    *PRECISION.get_or_init(|| probe_shader_precision(device))
}

/// Try each tier from highest to lowest and keep the first whose trivial
/// fragment program compiles.
fn probe_shader_precision(device: &wgpu::Device) -> ShaderPrecision {
    for tier in [ShaderPrecision::F32, ShaderPrecision::F16] {
        if compiles_trivial_program(device, tier) {
            return tier;
        }
    }
    ShaderPrecision::F32
}

fn compiles_trivial_program(device: &wgpu::Device, tier: ShaderPrecision) -> bool {
    let source = match tier {
        ShaderPrecision::F32 => {
            "@fragment fn fs() -> @location(0) vec4<f32> { return vec4<f32>(0.0); }".to_string()
        }
        ShaderPrecision::F16 => format!(
            "{}@fragment fn fs() -> @location(0) vec4<f32> {{ let x: f16 = 0.5h; return vec4<f32>(f32(x)); }}",
            tier.wgsl_prelude()
        ),
    };
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let _module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fresco_precision_probe"),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    pollster::block_on(device.pop_error_scope()).is_none()
}
