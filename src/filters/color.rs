use serde_json::Value as JsonValue;

use crate::backend::pipeline::{PipelineState, apply_standard};
use crate::filters::Filter;
use crate::filters::par_pixels;
use crate::foundation::core::PixelBuffer;
use crate::foundation::error::FrescoResult;

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Additive brightness adjustment in `[-1, 1]`. `0` leaves the image alone.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Brightness {
    /// Offset added to each color channel, in normalized units.
    pub brightness: f32,
}

impl Default for Brightness {
    fn default() -> Self {
        Self { brightness: 0.0 }
    }
}

impl Filter for Brightness {
    fn type_tag(&self) -> &'static str {
        "Brightness"
    }

    fn apply_to(&self, state: &mut PipelineState<'_>) -> FrescoResult<()> {
        apply_standard(self, state)
    }

    fn fragment_source(&self) -> String {
        r#"
@group(0) @binding(0) var t_src: texture_2d<f32>;
@group(0) @binding(1) var s_src: sampler;
struct Params { value: vec4<f32> };
@group(0) @binding(2) var<uniform> u: Params;

@fragment
fn fs(in: VsOut) -> @location(0) vec4<f32> {
  let c = textureSample(t_src, s_src, in.uv);
  let rgb = clamp(c.rgb + vec3<f32>(u.value.x), vec3<f32>(0.0), vec3<f32>(1.0));
  return vec4<f32>(rgb, c.a);
}
"#
        .to_string()
    }

    fn uniform_data(&self) -> Vec<f32> {
        vec![self.brightness]
    }

    fn apply_cpu(&self, image: &mut PixelBuffer) -> FrescoResult<()> {
        let offset = self.brightness * 255.0;
        par_pixels(image, |px| {
            for c in &mut px[..3] {
                *c = to_u8(f32::from(*c) + offset);
            }
        });
        Ok(())
    }

    fn to_serializable(&self) -> JsonValue {
        serde_json::json!({ "type": "Brightness", "brightness": self.brightness })
    }

    fn is_neutral_state(&self) -> bool {
        self.brightness == 0.0
    }
}

/// Contrast adjustment in `[-1, 1]`. `0` leaves the image alone.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Contrast {
    /// Contrast amount; positive steepens, negative flattens.
    pub contrast: f32,
}

impl Default for Contrast {
    fn default() -> Self {
        Self { contrast: 0.0 }
    }
}

impl Contrast {
    fn factor(self) -> f32 {
        1.015 * (self.contrast + 1.0) / (1.015 - self.contrast)
    }
}

impl Filter for Contrast {
    fn type_tag(&self) -> &'static str {
        "Contrast"
    }

    fn apply_to(&self, state: &mut PipelineState<'_>) -> FrescoResult<()> {
        apply_standard(self, state)
    }

    fn fragment_source(&self) -> String {
        r#"
@group(0) @binding(0) var t_src: texture_2d<f32>;
@group(0) @binding(1) var s_src: sampler;
struct Params { value: vec4<f32> };
@group(0) @binding(2) var<uniform> u: Params;

@fragment
fn fs(in: VsOut) -> @location(0) vec4<f32> {
  let c = textureSample(t_src, s_src, in.uv);
  let rgb = clamp(u.value.x * (c.rgb - vec3<f32>(0.5)) + vec3<f32>(0.5), vec3<f32>(0.0), vec3<f32>(1.0));
  return vec4<f32>(rgb, c.a);
}
"#
        .to_string()
    }

    fn uniform_data(&self) -> Vec<f32> {
        vec![self.factor()]
    }

    fn apply_cpu(&self, image: &mut PixelBuffer) -> FrescoResult<()> {
        let factor = self.factor();
        par_pixels(image, |px| {
            for c in &mut px[..3] {
                let v = f32::from(*c) / 255.0;
                *c = to_u8((factor * (v - 0.5) + 0.5) * 255.0);
            }
        });
        Ok(())
    }

    fn to_serializable(&self) -> JsonValue {
        serde_json::json!({ "type": "Contrast", "contrast": self.contrast })
    }

    fn is_neutral_state(&self) -> bool {
        self.contrast == 0.0
    }
}

/// Color inversion. Alpha is untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Invert {
    /// When false the filter is a no-op, letting owners toggle inversion
    /// without rebuilding their filter list.
    pub invert: bool,
}

impl Default for Invert {
    fn default() -> Self {
        Self { invert: true }
    }
}

impl Filter for Invert {
    fn type_tag(&self) -> &'static str {
        "Invert"
    }

    fn apply_to(&self, state: &mut PipelineState<'_>) -> FrescoResult<()> {
        apply_standard(self, state)
    }

    fn fragment_source(&self) -> String {
        r#"
@group(0) @binding(0) var t_src: texture_2d<f32>;
@group(0) @binding(1) var s_src: sampler;
struct Params { value: vec4<f32> };
@group(0) @binding(2) var<uniform> u: Params;

@fragment
fn fs(in: VsOut) -> @location(0) vec4<f32> {
  let c = textureSample(t_src, s_src, in.uv);
  let rgb = mix(c.rgb, vec3<f32>(1.0) - c.rgb, u.value.x);
  return vec4<f32>(rgb, c.a);
}
"#
        .to_string()
    }

    fn uniform_data(&self) -> Vec<f32> {
        vec![if self.invert { 1.0 } else { 0.0 }]
    }

    fn apply_cpu(&self, image: &mut PixelBuffer) -> FrescoResult<()> {
        if !self.invert {
            return Ok(());
        }
        par_pixels(image, |px| {
            for c in &mut px[..3] {
                *c = 255 - *c;
            }
        });
        Ok(())
    }

    fn to_serializable(&self) -> JsonValue {
        serde_json::json!({ "type": "Invert", "invert": self.invert })
    }

    fn is_neutral_state(&self) -> bool {
        !self.invert
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filters/color.rs"]
mod tests;
