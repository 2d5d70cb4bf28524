use super::*;

fn buffer_of(pixels: &[[u8; 4]], width: u32, height: u32) -> PixelBuffer {
    let data = pixels.iter().flatten().copied().collect();
    PixelBuffer::from_rgba8(width, height, data).unwrap()
}

#[test]
fn brightness_shifts_and_clamps() {
    let mut image = buffer_of(&[[10, 128, 250, 255]], 1, 1);
    Brightness { brightness: 0.1 }.apply_cpu(&mut image).unwrap();
    let [r, g, b, a] = image.pixel(0, 0);
    assert_eq!(r, 36); // 10 + 25.5 rounded
    assert_eq!(g, 154);
    assert_eq!(b, 255); // clamped
    assert_eq!(a, 255); // alpha untouched
}

#[test]
fn brightness_zero_is_identity() {
    let mut image = buffer_of(&[[1, 2, 3, 4], [250, 251, 252, 253]], 2, 1);
    let before = image.clone();
    Brightness { brightness: 0.0 }.apply_cpu(&mut image).unwrap();
    assert_eq!(image, before);
    assert!(Brightness { brightness: 0.0 }.is_neutral_state());
}

#[test]
fn contrast_zero_is_identity() {
    let mut image = buffer_of(&[[0, 64, 128, 200], [255, 1, 99, 3]], 2, 1);
    let before = image.clone();
    Contrast { contrast: 0.0 }.apply_cpu(&mut image).unwrap();
    assert_eq!(image, before);
}

#[test]
fn positive_contrast_pushes_away_from_midtone() {
    let mut image = buffer_of(&[[64, 128, 192, 255]], 1, 1);
    Contrast { contrast: 0.5 }.apply_cpu(&mut image).unwrap();
    let [r, _, b, a] = image.pixel(0, 0);
    assert!(r < 64);
    assert!(b > 192);
    assert_eq!(a, 255);
}

#[test]
fn invert_is_an_involution() {
    let mut image = buffer_of(&[[10, 20, 30, 40], [0, 255, 128, 7]], 2, 1);
    let before = image.clone();
    let invert = Invert::default();
    invert.apply_cpu(&mut image).unwrap();
    assert_eq!(image.pixel(0, 0), [245, 235, 225, 40]);
    invert.apply_cpu(&mut image).unwrap();
    assert_eq!(image, before);
}

#[test]
fn disabled_invert_is_neutral() {
    let mut image = buffer_of(&[[10, 20, 30, 40]], 1, 1);
    let before = image.clone();
    let invert = Invert { invert: false };
    assert!(invert.is_neutral_state());
    invert.apply_cpu(&mut image).unwrap();
    assert_eq!(image, before);
}
