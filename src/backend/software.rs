//! Software fallback backend: the same filter contract on plain pixel
//! buffers.

use crate::backend::pipeline::{PassContext, PipelineState, SoftwarePass};
use crate::backend::{BackendKind, FilterBackend, PipelineRun};
use crate::filters::Filter;
use crate::foundation::core::{Affine, PixelBuffer, Surface2d};
use crate::foundation::error::{FrescoError, FrescoResult};

/// Filter executor over in-memory pixel buffers.
///
/// Used whenever acceleration is disabled or capability detection fails.
/// Cache keys are accepted and ignored: there is no upload cost to amortize.
#[derive(Debug, Default)]
pub struct SoftwareBackend;

impl SoftwareBackend {
    /// Create the fallback backend.
    pub fn new() -> Self {
        Self
    }
}

impl FilterBackend for SoftwareBackend {
    fn apply_filters(
        &mut self,
        filters: &[Option<&dyn Filter>],
        source: &Surface2d,
        width: u32,
        height: u32,
        target: &mut Surface2d,
        _cache_key: Option<&str>,
    ) -> FrescoResult<PipelineRun> {
        if width == 0 || height == 0 || source.width() == 0 || source.height() == 0 {
            return Err(FrescoError::validation(
                "filter pipeline needs non-empty source and working dimensions",
            ));
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
            ctx: PassContext::Software(SoftwarePass {
                image: crop_or_pad(source.pixels(), width, height),
            }),
        };

        for filter in filters {
            if let Some(filter) = filter {
                filter.apply_to(&mut state)?;
            }
        }

        let run = PipelineRun {
            dest_width: state.dest_width,
            dest_height: state.dest_height,
            passes_applied: state.pass,
            passes_remaining: state.passes,
        };

        let image = match state.ctx {
            PassContext::Software(sw) => sw.image,
            PassContext::Accelerated(_) => {
                return Err(FrescoError::validation(
                    "software pipeline ended with an accelerated context",
                ));
            }
        };
        if (target.width(), target.height()) != (image.width, image.height) {
            target.resize(image.width, image.height);
        }
        target.put_pixels(image);
        target.transform = Affine::IDENTITY;

        Ok(run)
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Software
    }
}

/// Take the `(0,0)`-anchored `width x height` view of `src`, padding with
/// transparent black where the source is smaller. The pipeline never
/// rescales implicitly.
fn crop_or_pad(src: &PixelBuffer, width: u32, height: u32) -> PixelBuffer {
    if (src.width, src.height) == (width, height) {
        return src.clone();
    }
    let mut out = PixelBuffer::new(width, height);
    let copy_w = (src.width.min(width) * 4) as usize;
    for y in 0..src.height.min(height) as usize {
        let from = y * (src.width * 4) as usize;
        let to = y * (width * 4) as usize;
        out.data[to..to + copy_w].copy_from_slice(&src.data[from..from + copy_w]);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/backend/software.rs"]
mod tests;
