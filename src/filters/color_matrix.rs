use serde_json::Value as JsonValue;

use crate::backend::pipeline::{PipelineState, apply_standard};
use crate::filters::Filter;
use crate::filters::par_pixels;
use crate::foundation::core::PixelBuffer;
use crate::foundation::error::FrescoResult;

/// The 4x5 identity matrix: output equals input.
pub const IDENTITY_MATRIX: [f32; 20] = [
    1.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

/// General 4x5 color matrix transform.
///
/// Each output channel is a weighted sum of the input channels plus an
/// offset; rows are `[r g b a offset]` in normalized units. Offsets and
/// weights lose meaning outside `[-1, 1]` but are not clamped here, matching
/// the wide latitude the named looks below rely on.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorMatrix {
    /// 20 coefficients, row-major.
    pub matrix: [f32; 20],
    /// When true, alpha neither contributes to nor is changed by the matrix.
    pub colors_only: bool,
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self {
            matrix: IDENTITY_MATRIX,
            colors_only: true,
        }
    }
}

impl ColorMatrix {
    /// Create a color-only matrix transform.
    pub fn new(matrix: [f32; 20]) -> Self {
        Self {
            matrix,
            colors_only: true,
        }
    }

    /// Sepia look.
    pub fn sepia() -> Self {
        Self::new([
            0.393, 0.769, 0.189, 0.0, 0.0, //
            0.349, 0.686, 0.168, 0.0, 0.0, //
            0.272, 0.534, 0.131, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    /// Brownie look.
    pub fn brownie() -> Self {
        Self::new([
            0.59970, 0.34553, -0.27082, 0.0, 0.186, //
            -0.03770, 0.86095, 0.15059, 0.0, -0.1449, //
            0.24113, -0.07441, 0.44972, 0.0, -0.02965, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    /// Vintage photo look.
    pub fn vintage() -> Self {
        Self::new([
            0.62793, 0.32021, -0.03965, 0.0, 0.03784, //
            0.02578, 0.64411, 0.03259, 0.0, 0.02926, //
            0.04660, -0.08512, 0.52416, 0.0, 0.02023, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    /// Kodachrome film look.
    pub fn kodachrome() -> Self {
        Self::new([
            1.12855, -0.39673, -0.03992, 0.0, 0.24991, //
            -0.16404, 1.08352, -0.05498, 0.0, 0.09698, //
            -0.16786, -0.56034, 1.60148, 0.0, 0.13972, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    /// Technicolor film look.
    pub fn technicolor() -> Self {
        Self::new([
            1.91252, -0.85453, -0.09155, 0.0, 0.04624, //
            -0.30878, 1.76589, -0.10601, 0.0, -0.27589, //
            -0.23110, -0.75018, 1.84759, 0.0, 0.12137, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    /// Polaroid look.
    pub fn polaroid() -> Self {
        Self::new([
            1.438, -0.062, -0.062, 0.0, 0.0, //
            -0.122, 1.378, -0.122, 0.0, 0.0, //
            -0.016, -0.016, 1.483, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    /// Hard black-and-white threshold look.
    pub fn black_white() -> Self {
        Self::new([
            1.5, 1.5, 1.5, 0.0, -1.0, //
            1.5, 1.5, 1.5, 0.0, -1.0, //
            1.5, 1.5, 1.5, 0.0, -1.0, //
            0.0, 0.0, 0.0, 1.0, 0.0,
        ])
    }

    fn row(&self, i: usize) -> [f32; 5] {
        let m = &self.matrix;
        [m[i * 5], m[i * 5 + 1], m[i * 5 + 2], m[i * 5 + 3], m[i * 5 + 4]]
    }
}

impl Filter for ColorMatrix {
    fn type_tag(&self) -> &'static str {
        "ColorMatrix"
    }

    fn apply_to(&self, state: &mut PipelineState<'_>) -> FrescoResult<()> {
        apply_standard(self, state)
    }

    fn fragment_source(&self) -> String {
        r#"
@group(0) @binding(0) var t_src: texture_2d<f32>;
@group(0) @binding(1) var s_src: sampler;
struct Params {
  row_r: vec4<f32>,
  row_g: vec4<f32>,
  row_b: vec4<f32>,
  row_a: vec4<f32>,
  offsets: vec4<f32>,
  flags: vec4<f32>,
};
@group(0) @binding(2) var<uniform> u: Params;

@fragment
fn fs(in: VsOut) -> @location(0) vec4<f32> {
  let c = textureSample(t_src, s_src, in.uv);
  let m = mat4x4<f32>(u.row_r, u.row_g, u.row_b, u.row_a);
  let full = transpose(m) * c + u.offsets;
  // flags.x selects the color-only variant: alpha passes through untouched.
  let colors_only = vec4<f32>(full.rgb, c.a);
  let out = mix(full, colors_only, u.flags.x);
  return clamp(out, vec4<f32>(0.0), vec4<f32>(1.0));
}
"#
        .to_string()
    }

    fn uniform_data(&self) -> Vec<f32> {
        let mut data = Vec::with_capacity(24);
        for i in 0..4 {
            let row = self.row(i);
            // colors_only drops the alpha contribution from the color rows.
            let a_weight = if self.colors_only && i < 3 { 0.0 } else { row[3] };
            data.extend_from_slice(&[row[0], row[1], row[2], a_weight]);
        }
        data.extend_from_slice(&[self.row(0)[4], self.row(1)[4], self.row(2)[4], self.row(3)[4]]);
        data.extend_from_slice(&[if self.colors_only { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0]);
        data
    }

    fn apply_cpu(&self, image: &mut PixelBuffer) -> FrescoResult<()> {
        let rows: [[f32; 5]; 4] = [self.row(0), self.row(1), self.row(2), self.row(3)];
        let colors_only = self.colors_only;
        par_pixels(image, |px| {
            let r = f32::from(px[0]);
            let g = f32::from(px[1]);
            let b = f32::from(px[2]);
            let a = f32::from(px[3]);
            for (i, row) in rows.iter().enumerate().take(if colors_only { 3 } else { 4 }) {
                let alpha_term = if colors_only && i < 3 { 0.0 } else { a * row[3] };
                let v = r * row[0] + g * row[1] + b * row[2] + alpha_term + row[4] * 255.0;
                px[i] = v.round().clamp(0.0, 255.0) as u8;
            }
        });
        Ok(())
    }

    fn to_serializable(&self) -> JsonValue {
        serde_json::json!({
            "type": "ColorMatrix",
            "matrix": self.matrix.to_vec(),
            "colorsOnly": self.colors_only,
        })
    }

    fn is_neutral_state(&self) -> bool {
        self.matrix == IDENTITY_MATRIX
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filters/color_matrix.rs"]
mod tests;
