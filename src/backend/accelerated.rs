//! The GPU-accelerated filter backend.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::backend::caches::{ProgramCache, TextureCache};
use crate::backend::capability::{self, ShaderPrecision};
use crate::backend::copy_strategy::{self, CopyStrategy};
use crate::backend::pipeline::{
    self, AcceleratedPass, PASSTHROUGH_FRAGMENT, PASSTHROUGH_KEY, PassContext, PipelineState,
};
use crate::backend::{BackendKind, BackendOpts, FilterBackend, GpuInfo, PipelineRun};
use crate::filters::Filter;
use crate::foundation::core::{Affine, PixelBuffer, Surface2d};
use crate::foundation::error::{FrescoError, FrescoResult};

const TEXTURE_USAGES: wgpu::TextureUsages = wgpu::TextureUsages::TEXTURE_BINDING
    .union(wgpu::TextureUsages::RENDER_ATTACHMENT)
    .union(wgpu::TextureUsages::COPY_SRC)
    .union(wgpu::TextureUsages::COPY_DST);

/// Device-bound state. Dropped as a unit on dispose so cached resources can
/// never outlive their device.
struct AccelContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    /// The accelerated surface: a `tile_size` square every final pass
    /// renders into and every copy-out reads from.
    canvas: wgpu::Texture,
    adapter_info: wgpu::AdapterInfo,
    max_texture_dim: u32,
    textures: TextureCache,
    programs: ProgramCache,
    precision: ShaderPrecision,
}

/// Filter executor backed by a headless accelerated context.
///
/// Owns the context, the texture and program caches, and the copy-strategy
/// binding. Not safe for concurrent invocation: callers serialize calls to
/// one instance (the process-wide selector in [`crate::backend`] does).
pub struct AcceleratedBackend {
    opts: BackendOpts,
    context: Option<AccelContext>,
    copy: CopyStrategy,
    readback: Option<wgpu::Buffer>,
    gpu_info: GpuInfo,
}

impl AcceleratedBackend {
    /// Construct the backend: acquire the context, create the canvas, bind a
    /// copy strategy, and capture GPU identification.
    ///
    /// When no context can be acquired the backend comes up degraded: it
    /// never panics, and operations that need the context return
    /// [`FrescoError::Acceleration`]. Callers normally never see this state
    /// because the backend selector routes to the software fallback first.
    pub fn new(opts: &BackendOpts) -> Self {
        let mut backend = Self {
            opts: *opts,
            context: build_context(opts),
            copy: CopyStrategy::Transient,
            readback: None,
            gpu_info: GpuInfo::default(),
        };
        backend.select_copy_strategy();
        backend.gpu_info = backend.capture_gpu_info();
        if backend.context.is_some() {
            info!(
                renderer = %backend.gpu_info.renderer,
                strategy = ?backend.copy,
                tile_size = opts.tile_size,
                "accelerated filter backend ready"
            );
        }
        backend
    }

    /// The copy strategy bound at construction.
    pub fn copy_strategy(&self) -> CopyStrategy {
        self.copy
    }

    /// Whether the accelerated context came up.
    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Backend-unique id of the texture cached under `key`, if any.
    /// Diagnostics and tests.
    pub fn cached_texture_id(&self, key: &str) -> Option<u64> {
        self.context.as_ref()?.textures.get_id(key)
    }

    /// Number of cached source textures.
    pub fn cached_texture_count(&self) -> usize {
        self.context.as_ref().map_or(0, |cx| cx.textures.len())
    }

    /// Number of compiled filter programs.
    pub fn program_count(&self) -> usize {
        self.context.as_ref().map_or(0, |cx| cx.programs.len())
    }

    /// Maximum texture dimension of the live context, if any. Diagnostics.
    pub fn max_texture_dimension(&self) -> Option<u32> {
        self.context.as_ref().map(|cx| cx.max_texture_dim)
    }

    /// One-time benchmark binding the faster copy-out method: forced
    /// persistent wins unconditionally; a degraded context defaults to
    /// transient with no benchmark; otherwise one timed copy per method on
    /// an identically sized scratch surface decides, ties to transient.
    fn select_copy_strategy(&mut self) {
        let tile = self.opts.tile_size;
        if self.opts.force_persistent_readback {
            self.copy = CopyStrategy::Persistent;
            if let Some(cx) = &self.context {
                self.readback = Some(create_readback_buffer(&cx.device, tile));
            }
            debug!("persistent readback forced by configuration");
            return;
        }
        let Some(cx) = &self.context else {
            self.copy = CopyStrategy::Transient;
            return;
        };

        let mut scratch = PixelBuffer::new(tile, tile);

        let started = Instant::now();
        let transient_ok =
            copy_region_transient(&cx.device, &cx.queue, &cx.canvas, tile, tile, &mut scratch)
                .is_ok();
        let transient = if transient_ok {
            started.elapsed()
        } else {
            Duration::MAX
        };

        let readback = create_readback_buffer(&cx.device, tile);
        let started = Instant::now();
        let persistent_ok = copy_region_persistent(
            &cx.device,
            &cx.queue,
            &cx.canvas,
            &readback,
            tile,
            tile,
            &mut scratch,
        )
        .is_ok();
        let persistent = if persistent_ok {
            started.elapsed()
        } else {
            Duration::MAX
        };

        self.copy = copy_strategy::choose(transient, persistent);
        if self.copy == CopyStrategy::Persistent {
            self.readback = Some(readback);
        } else {
            readback.destroy();
        }
        debug!(?transient, ?persistent, strategy = ?self.copy, "copy strategy benchmark");
    }

    fn capture_gpu_info(&self) -> GpuInfo {
        match &self.context {
            Some(cx) => GpuInfo {
                renderer: cx.adapter_info.name.to_lowercase(),
                vendor: cx.adapter_info.driver.to_lowercase(),
            },
            None => GpuInfo::default(),
        }
    }
}

impl FilterBackend for AcceleratedBackend {
    fn apply_filters(
        &mut self,
        filters: &[Option<&dyn Filter>],
        source: &Surface2d,
        width: u32,
        height: u32,
        target: &mut Surface2d,
        cache_key: Option<&str>,
    ) -> FrescoResult<PipelineRun> {
        let tile = self.opts.tile_size;
        if width == 0 || height == 0 || source.width() == 0 || source.height() == 0 {
            return Err(FrescoError::validation(
                "filter pipeline needs non-empty source and working dimensions",
            ));
        }
        if width > tile || height > tile {
            return Err(FrescoError::validation(format!(
                "working resolution {width}x{height} exceeds the {tile} tile size"
            )));
        }
        let Some(cx) = self.context.as_mut() else {
            return Err(FrescoError::acceleration(
                "acceleration context unavailable",
            ));
        };
        let AccelContext {
            ref device,
            ref queue,
            ref canvas,
            ref mut textures,
            ref mut programs,
            precision,
            ..
        } = *cx;

        // The original upload, cache-retained when a key is given.
        let (original_texture, original_cached) = match cache_key {
            Some(key) => {
                let entry = textures.get_or_upload(key, source.width(), source.height(), || {
                    upload_texture(device, queue, source.pixels())
                });
                (entry.texture.clone(), true)
            }
            None => (upload_texture(device, queue, source.pixels()), false),
        };

        // Fresh per-call textures at the working resolution. The source is
        // seeded from the original upload, resampling only when the native
        // and working resolutions differ.
        let source_texture = create_texture(device, width, height);
        let target_texture = create_texture(device, width, height);
        if (source.width(), source.height()) == (width, height) {
            copy_texture(device, queue, &original_texture, &source_texture, width, height);
        } else {
            let program =
                programs.get_or_compile(device, PASSTHROUGH_KEY, PASSTHROUGH_FRAGMENT, precision);
            pipeline::draw_pass(
                device,
                queue,
                programs,
                &program,
                &original_texture,
                &source_texture,
                None,
            );
        }

        let mut state = PipelineState {
            original_width: source.width(),
            original_height: source.height(),
            source_width: width,
            source_height: height,
            dest_width: width,
            dest_height: height,
            passes: filters.len(),
            pass: 0,
            ctx: PassContext::Accelerated(AcceleratedPass {
                device,
                queue,
                programs,
                precision,
                source_texture,
                target_texture,
                original_texture: original_texture.clone(),
                canvas,
                canvas_written: false,
            }),
        };

        for filter in filters {
            if let Some(filter) = filter {
                filter.apply_to(&mut state)?;
            }
        }

        let dest_width = state.dest_width;
        let dest_height = state.dest_height;
        if let PassContext::Accelerated(pass) = &mut state.ctx {
            if !pass.canvas_written {
                pass.blit_source_to_canvas(dest_width, dest_height);
            }
        }
        let run = PipelineRun {
            dest_width,
            dest_height,
            passes_applied: state.pass,
            passes_remaining: state.passes,
        };

        // Per-call textures go away; cached uploads stay.
        if let PassContext::Accelerated(pass) = state.ctx {
            pass.source_texture.destroy();
            pass.target_texture.destroy();
            if !original_cached {
                pass.original_texture.destroy();
            }
        }

        if (target.width(), target.height()) != (dest_width, dest_height) {
            target.resize(dest_width, dest_height);
        }
        match self.copy {
            CopyStrategy::Transient => copy_region_transient(
                device,
                queue,
                canvas,
                dest_width,
                dest_height,
                target.pixels_mut(),
            )?,
            CopyStrategy::Persistent => {
                let readback = self.readback.as_ref().ok_or_else(|| {
                    FrescoError::acceleration("persistent readback buffer missing")
                })?;
                copy_region_persistent(
                    device,
                    queue,
                    canvas,
                    readback,
                    dest_width,
                    dest_height,
                    target.pixels_mut(),
                )?;
            }
        }
        target.transform = Affine::IDENTITY;

        Ok(run)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Accelerated
    }

    fn gpu_info(&self) -> GpuInfo {
        self.gpu_info.clone()
    }

    fn evict_caches_for_key(&mut self, key: &str) {
        if let Some(cx) = &mut self.context {
            cx.textures.evict(key);
        }
    }

    fn dispose(&mut self) {
        if let Some(mut cx) = self.context.take() {
            debug!(
                textures = cx.textures.len(),
                programs = cx.programs.len(),
                "disposing accelerated backend"
            );
            cx.textures.clear();
            cx.programs.clear();
            cx.canvas.destroy();
        }
        if let Some(buffer) = self.readback.take() {
            buffer.destroy();
        }
    }
}

impl Drop for AcceleratedBackend {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn build_context(opts: &BackendOpts) -> Option<AccelContext> {
    let parts = capability::acquire_context()?;
    let adapter_info = parts.adapter.get_info();
    let max_texture_dim = parts.device.limits().max_texture_dimension_2d;
    if max_texture_dim < opts.tile_size {
        debug!(
            max_texture_dim,
            tile_size = opts.tile_size,
            "adapter cannot hold the working tile"
        );
        return None;
    }

    let canvas = create_texture(&parts.device, opts.tile_size, opts.tile_size);
    clear_texture(&parts.device, &parts.queue, &canvas);
    let precision = capability::precision_for(&parts.device);
    let programs = ProgramCache::new(&parts.device);

    Some(AccelContext {
        device: parts.device,
        queue: parts.queue,
        canvas,
        adapter_info,
        max_texture_dim,
        textures: TextureCache::new(),
        programs,
        precision,
    })
}

fn create_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("fresco_filter_texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: TEXTURE_USAGES,
        view_formats: &[],
    })
}

fn upload_texture(device: &wgpu::Device, queue: &wgpu::Queue, pixels: &PixelBuffer) -> wgpu::Texture {
    let texture = create_texture(device, pixels.width, pixels.height);
    queue.write_texture(
        texture.as_image_copy(),
        &pixels.data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(pixels.width * 4),
            rows_per_image: Some(pixels.height),
        },
        wgpu::Extent3d {
            width: pixels.width,
            height: pixels.height,
            depth_or_array_layers: 1,
        },
    );
    texture
}

fn copy_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    from: &wgpu::Texture,
    to: &wgpu::Texture,
    width: u32,
    height: u32,
) {
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("fresco_texture_copy"),
    });
    encoder.copy_texture_to_texture(
        from.as_image_copy(),
        to.as_image_copy(),
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));
}

fn clear_texture(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture) {
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("fresco_canvas_clear"),
    });
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("fresco_canvas_clear_rp"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &view,
            resolve_target: None,
            depth_slice: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    queue.submit(Some(encoder.finish()));
}

fn create_readback_buffer(device: &wgpu::Device, tile_size: u32) -> wgpu::Buffer {
    let stride = copy_strategy::padded_bytes_per_row(tile_size);
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("fresco_readback"),
        size: u64::from(stride) * u64::from(tile_size),
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Copy-out via a staging buffer allocated for this call only.
fn copy_region_transient(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
    out: &mut PixelBuffer,
) -> FrescoResult<()> {
    let stride = copy_strategy::padded_bytes_per_row(width);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("fresco_copy_staging"),
        size: u64::from(stride) * u64::from(height),
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let result = read_region_into(device, queue, texture, &buffer, width, height, out);
    buffer.destroy();
    result
}

/// Copy-out via the backend's retained readback buffer.
fn copy_region_persistent(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    buffer: &wgpu::Buffer,
    width: u32,
    height: u32,
    out: &mut PixelBuffer,
) -> FrescoResult<()> {
    read_region_into(device, queue, texture, buffer, width, height, out)
}

fn read_region_into(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    buffer: &wgpu::Buffer,
    width: u32,
    height: u32,
    out: &mut PixelBuffer,
) -> FrescoResult<()> {
    let stride = copy_strategy::padded_bytes_per_row(width);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("fresco_readback_encoder"),
    });
    encoder.copy_texture_to_buffer(
        texture.as_image_copy(),
        wgpu::TexelCopyBufferInfo {
            buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(stride),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));

    let needed = u64::from(stride) * u64::from(height);
    let slice = buffer.slice(0..needed);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = tx.send(res);
    });
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| FrescoError::acceleration(format!("device poll failed: {e:?}")))?;
    rx.recv()
        .map_err(|_| FrescoError::acceleration("readback channel closed"))?
        .map_err(|e| FrescoError::acceleration(format!("readback map failed: {e:?}")))?;

    debug_assert_eq!((out.width, out.height), (width, height));
    {
        let mapped = slice.get_mapped_range();
        let row_bytes = (width * 4) as usize;
        for y in 0..height as usize {
            let from = y * stride as usize;
            let to = y * row_bytes;
            out.data[to..to + row_bytes].copy_from_slice(&mapped[from..from + row_bytes]);
        }
    }
    buffer.unmap();
    Ok(())
}
