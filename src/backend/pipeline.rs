//! Call-scoped pipeline state threaded through a chain of filter
//! applications, plus the shared GPU pass machinery.

use crate::backend::caches::ProgramCache;
use crate::backend::capability::ShaderPrecision;
use crate::filters::Filter;
use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{FrescoError, FrescoResult};

/// Fixed parameter block size shared by all filter programs, in `f32` units.
/// Filter uniform data is zero-padded up to this size before upload.
pub(crate) const UNIFORM_FLOATS: usize = 32;
/// [`UNIFORM_FLOATS`] in bytes.
pub(crate) const UNIFORM_BYTES: u64 = (UNIFORM_FLOATS * 4) as u64;

/// Shared vertex stage: one fullscreen triangle, uv origin at the top-left so
/// a passthrough pass is an identity copy.
const VERTEX_STAGE: &str = r#"
struct VsOut {
  @builtin(position) pos: vec4<f32>,
  @location(0) uv: vec2<f32>,
};

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> VsOut {
  var p = array<vec2<f32>, 3>(
    vec2<f32>(-1.0, -1.0),
    vec2<f32>( 3.0, -1.0),
    vec2<f32>(-1.0,  3.0),
  );
  let pos = p[vi];
  var o: VsOut;
  o.pos = vec4<f32>(pos, 0.0, 1.0);
  o.uv = vec2<f32>((pos.x + 1.0) * 0.5, (1.0 - pos.y) * 0.5);
  return o;
}
"#;

/// Program-cache key for the passthrough copy.
pub(crate) const PASSTHROUGH_KEY: &str = "Passthrough";

/// Fragment stage that copies the source unchanged.
pub(crate) const PASSTHROUGH_FRAGMENT: &str = r#"
@group(0) @binding(0) var t_src: texture_2d<f32>;
@group(0) @binding(1) var s_src: sampler;

@fragment
fn fs(in: VsOut) -> @location(0) vec4<f32> {
  return textureSample(t_src, s_src, in.uv);
}
"#;

/// Assemble and compile a filter program from its fragment stage.
pub(crate) fn compile_program(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    fragment_source: &str,
    precision: ShaderPrecision,
) -> wgpu::RenderPipeline {
    let source = format!("{}{VERTEX_STAGE}{fragment_source}", precision.wgsl_prelude());
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fresco_filter_shader"),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("fresco_filter_pl"),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("fresco_filter_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: wgpu::TextureFormat::Rgba8Unorm,
                // Each pass rewrites its target wholesale.
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// The ephemeral state of one `apply_filters` invocation.
///
/// Exactly one instance exists per invocation; every filter in the chain
/// mutates it in turn, so each filter's output becomes the next one's input.
pub struct PipelineState<'a> {
    /// Native width of the original source surface.
    pub original_width: u32,
    /// Native height of the original source surface.
    pub original_height: u32,
    /// Working width of the pipeline.
    pub source_width: u32,
    /// Working height of the pipeline.
    pub source_height: u32,
    /// Width the final output will have.
    pub dest_width: u32,
    /// Height the final output will have.
    pub dest_height: u32,
    /// Remaining pass budget. Every filter application consumes exactly one;
    /// a [`crate::filters::Composed`] grows the budget by its sub-filter
    /// count minus one before delegating.
    pub passes: usize,
    /// Index of the current pass, starting at zero.
    pub pass: usize,
    /// The execution context the passes run against.
    pub ctx: PassContext<'a>,
}

/// Execution context of a pipeline: accelerated textures or a plain pixel
/// buffer.
pub enum PassContext<'a> {
    /// GPU textures and the owning backend's shared pass objects.
    Accelerated(AcceleratedPass<'a>),
    /// An in-memory pixel buffer mutated in place.
    Software(SoftwarePass),
}

/// Software pass context: filters mutate the buffer in place.
pub struct SoftwarePass {
    /// The pixels being filtered.
    pub image: PixelBuffer,
}

/// Accelerated pass context.
///
/// One of `source_texture`/`target_texture` is the current read surface at
/// any step; a standard pass renders source into target and swaps them,
/// except the final pass which renders into the backend's canvas.
pub struct AcceleratedPass<'a> {
    pub(crate) device: &'a wgpu::Device,
    pub(crate) queue: &'a wgpu::Queue,
    pub(crate) programs: &'a mut ProgramCache,
    pub(crate) precision: ShaderPrecision,
    pub(crate) source_texture: wgpu::Texture,
    pub(crate) target_texture: wgpu::Texture,
    pub(crate) original_texture: wgpu::Texture,
    pub(crate) canvas: &'a wgpu::Texture,
    pub(crate) canvas_written: bool,
}

impl AcceleratedPass<'_> {
    fn run_program(
        &mut self,
        filter: &dyn Filter,
        dest_width: u32,
        dest_height: u32,
        passes_remaining: usize,
    ) -> FrescoResult<()> {
        let program = self.programs.get_or_compile(
            self.device,
            &filter.program_key(),
            &filter.fragment_source(),
            self.precision,
        );

        let mut data = filter.uniform_data();
        if data.len() > UNIFORM_FLOATS {
            return Err(FrescoError::validation(format!(
                "filter `{}` uniform block is {} floats, limit is {UNIFORM_FLOATS}",
                filter.type_tag(),
                data.len()
            )));
        }
        data.resize(UNIFORM_FLOATS, 0.0);
        self.queue
            .write_buffer(&self.programs.uniforms, 0, bytemuck::cast_slice(&data));

        let last_pass = passes_remaining <= 1;
        if last_pass {
            draw_pass(
                self.device,
                self.queue,
                self.programs,
                &program,
                &self.source_texture,
                self.canvas,
                Some((dest_width, dest_height)),
            );
            self.canvas_written = true;
        } else {
            draw_pass(
                self.device,
                self.queue,
                self.programs,
                &program,
                &self.source_texture,
                &self.target_texture,
                None,
            );
            std::mem::swap(&mut self.source_texture, &mut self.target_texture);
        }
        Ok(())
    }

    /// Copy the current source into the canvas region unchanged.
    ///
    /// Run when the filter loop ends without a canvas write (empty chains,
    /// skipped entries) so the copy-out still observes the source pixels.
    pub(crate) fn blit_source_to_canvas(&mut self, dest_width: u32, dest_height: u32) {
        let program = self.programs.get_or_compile(
            self.device,
            PASSTHROUGH_KEY,
            PASSTHROUGH_FRAGMENT,
            self.precision,
        );
        draw_pass(
            self.device,
            self.queue,
            self.programs,
            &program,
            &self.source_texture,
            self.canvas,
            Some((dest_width, dest_height)),
        );
        self.canvas_written = true;
    }
}

/// Record and submit one filter pass: sample `source`, write `target`.
///
/// `viewport` restricts the write to a top-left region (canvas passes); the
/// attachment is cleared to transparent black first either way.
pub(crate) fn draw_pass(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    programs: &ProgramCache,
    program: &wgpu::RenderPipeline,
    source: &wgpu::Texture,
    target: &wgpu::Texture,
    viewport: Option<(u32, u32)>,
) {
    let source_view = source.create_view(&wgpu::TextureViewDescriptor::default());
    let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("fresco_filter_bind"),
        layout: &programs.layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&source_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&programs.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: programs.uniforms.as_entire_binding(),
            },
        ],
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("fresco_filter_encoder"),
    });
    {
        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("fresco_filter_rp"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target_view,
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
        rp.set_pipeline(program);
        if let Some((w, h)) = viewport {
            rp.set_viewport(0.0, 0.0, w as f32, h as f32, 0.0, 1.0);
            rp.set_scissor_rect(0, 0, w, h);
        }
        rp.set_bind_group(0, &bind_group, &[]);
        rp.draw(0..3, 0..1);
    }
    queue.submit(Some(encoder.finish()));
}

/// The shared standard pass: run `filter` against the current context and
/// consume one pass from the budget.
///
/// Primitive filters delegate their `apply_to` here; containers that manage
/// their own accounting (Composed) do not.
pub fn apply_standard(filter: &dyn Filter, state: &mut PipelineState<'_>) -> FrescoResult<()> {
    match &mut state.ctx {
        PassContext::Software(sw) => filter.apply_cpu(&mut sw.image)?,
        PassContext::Accelerated(gpu) => {
            gpu.run_program(filter, state.dest_width, state.dest_height, state.passes)?;
        }
    }
    state.passes = state.passes.saturating_sub(1);
    state.pass += 1;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/backend/pipeline.rs"]
mod tests;
