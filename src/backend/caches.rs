use std::collections::HashMap;

use tracing::{debug, trace};

use crate::backend::capability::ShaderPrecision;
use crate::backend::pipeline;

/// Keyed store of backend resources.
///
/// At most one entry per key; entries persist until explicitly evicted or the
/// owning backend is disposed.
#[derive(Debug, Default)]
pub(crate) struct KeyedCache<V> {
    entries: HashMap<String, V>,
}

impl<V> KeyedCache<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub(crate) fn get_or_insert_with(&mut self, key: &str, create: impl FnOnce() -> V) -> &V {
        self.entries.entry(key.to_string()).or_insert_with(create)
    }

    pub(crate) fn insert(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), value);
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key)
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (String, V)> + '_ {
        self.entries.drain()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A GPU texture retained across filter calls under a caller-supplied key.
///
/// `id` is unique per backend instance so callers and tests can observe
/// handle identity without GPU introspection.
pub(crate) struct CachedTexture {
    pub(crate) id: u64,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) texture: wgpu::Texture,
}

/// Uploaded-source texture cache.
///
/// A key always maps to a texture whose dimensions match the source supplied
/// the first time that key was used; reusing a key across differently-sized
/// sources without eviction is a caller contract violation.
pub(crate) struct TextureCache {
    entries: KeyedCache<CachedTexture>,
    next_id: u64,
}

impl TextureCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: KeyedCache::new(),
            next_id: 0,
        }
    }

    /// Return the texture cached under `key`, uploading through `upload` on
    /// first use.
    pub(crate) fn get_or_upload(
        &mut self,
        key: &str,
        width: u32,
        height: u32,
        upload: impl FnOnce() -> wgpu::Texture,
    ) -> &CachedTexture {
        let next_id = &mut self.next_id;
        self.entries.get_or_insert_with(key, || {
            let id = *next_id;
            *next_id += 1;
            trace!(key, id, width, height, "caching uploaded texture");
            CachedTexture {
                id,
                width,
                height,
                texture: upload(),
            }
        })
    }

    /// Backend-unique id of the entry under `key`, if present.
    pub(crate) fn get_id(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.id)
    }

    /// Release the texture stored under `key`, if any.
    pub(crate) fn evict(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                trace!(key, id = entry.id, "evicting cached texture");
                entry.texture.destroy();
                true
            }
            None => false,
        }
    }

    /// Release every cached texture.
    pub(crate) fn clear(&mut self) {
        for (_, entry) in self.entries.drain() {
            entry.texture.destroy();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Compiled filter programs plus the GPU objects every pass shares.
///
/// Programs are keyed by filter signature and precision tier; they live for
/// the backend's lifetime and are dropped wholesale on dispose.
pub(crate) struct ProgramCache {
    programs: KeyedCache<wgpu::RenderPipeline>,
    pub(crate) layout: wgpu::BindGroupLayout,
    pub(crate) sampler: wgpu::Sampler,
    pub(crate) uniforms: wgpu::Buffer,
}

impl ProgramCache {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fresco_filter_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("fresco_filter_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fresco_filter_params"),
            size: pipeline::UNIFORM_BYTES,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            programs: KeyedCache::new(),
            layout,
            sampler,
            uniforms,
        }
    }

    /// Return the compiled program for `program_key`, compiling
    /// `fragment_source` on first use.
    pub(crate) fn get_or_compile(
        &mut self,
        device: &wgpu::Device,
        program_key: &str,
        fragment_source: &str,
        precision: ShaderPrecision,
    ) -> wgpu::RenderPipeline {
        let key = format!("{program_key}@{}", precision.label());
        if let Some(program) = self.programs.get(&key) {
            return program.clone();
        }
        debug!(key, "compiling filter program");
        let program = pipeline::compile_program(device, &self.layout, fragment_source, precision);
        self.programs.insert(key, program.clone());
        program
    }

    pub(crate) fn len(&self) -> usize {
        self.programs.len()
    }

    /// Drop every compiled program.
    pub(crate) fn clear(&mut self) {
        self.programs.drain().for_each(drop);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/backend/caches.rs"]
mod tests;
