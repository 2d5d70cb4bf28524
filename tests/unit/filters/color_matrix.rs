use super::*;

fn buffer_of(pixels: &[[u8; 4]], width: u32, height: u32) -> PixelBuffer {
    let data = pixels.iter().flatten().copied().collect();
    PixelBuffer::from_rgba8(width, height, data).unwrap()
}

#[test]
fn identity_matrix_is_neutral_and_changes_nothing() {
    let filter = ColorMatrix::default();
    assert!(filter.is_neutral_state());

    let mut image = buffer_of(&[[12, 34, 56, 78], [255, 0, 128, 1]], 2, 1);
    let before = image.clone();
    filter.apply_cpu(&mut image).unwrap();
    assert_eq!(image, before);
}

#[test]
fn named_looks_are_not_neutral() {
    for filter in [
        ColorMatrix::sepia(),
        ColorMatrix::brownie(),
        ColorMatrix::vintage(),
        ColorMatrix::kodachrome(),
        ColorMatrix::technicolor(),
        ColorMatrix::polaroid(),
        ColorMatrix::black_white(),
    ] {
        assert!(!filter.is_neutral_state());
    }
}

#[test]
fn sepia_weights_mix_channels() {
    let mut image = buffer_of(&[[100, 100, 100, 200]], 1, 1);
    ColorMatrix::sepia().apply_cpu(&mut image).unwrap();
    let [r, g, b, a] = image.pixel(0, 0);
    // 100 * (0.393 + 0.769 + 0.189) = 135.1, and so on per row.
    assert_eq!(r, 135);
    assert_eq!(g, 120);
    assert_eq!(b, 94);
    assert_eq!(a, 200);
}

#[test]
fn colors_only_leaves_alpha_untouched() {
    let mut matrix = IDENTITY_MATRIX;
    matrix[18] = 0.5; // alpha-from-alpha weight
    let filter = ColorMatrix {
        matrix,
        colors_only: true,
    };
    let mut image = buffer_of(&[[10, 20, 30, 200]], 1, 1);
    filter.apply_cpu(&mut image).unwrap();
    assert_eq!(image.pixel(0, 0), [10, 20, 30, 200]);

    let filter = ColorMatrix {
        matrix,
        colors_only: false,
    };
    filter.apply_cpu(&mut image).unwrap();
    assert_eq!(image.pixel(0, 0)[3], 100);
}

#[test]
fn offsets_are_scaled_to_byte_range() {
    let mut matrix = IDENTITY_MATRIX;
    matrix[4] = 0.5; // +127.5 on red
    let filter = ColorMatrix::new(matrix);
    let mut image = buffer_of(&[[10, 0, 0, 255]], 1, 1);
    filter.apply_cpu(&mut image).unwrap();
    assert_eq!(image.pixel(0, 0)[0], 138);
}

#[test]
fn serialization_round_trips() {
    let filter = ColorMatrix::kodachrome();
    let serialized = filter.to_serializable();
    assert_eq!(serialized["type"], "ColorMatrix");
    assert_eq!(serialized["colorsOnly"], true);

    let revived = crate::filters::filter::deserialize_filter(&serialized).unwrap();
    assert_eq!(revived.to_serializable(), serialized);
}

#[test]
fn uniform_block_fits_the_shared_params_buffer() {
    let data = ColorMatrix::black_white().uniform_data();
    assert_eq!(data.len(), 24);
    assert!(data.len() <= crate::backend::pipeline::UNIFORM_FLOATS);
}
