use super::*;

use crate::filters::color::{Brightness, Contrast, Invert};
use crate::filters::composed::Composed;

fn gradient_surface(width: u32, height: u32) -> Surface2d {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 7, 255]);
        }
    }
    Surface2d::from_rgba8(width, height, data).unwrap()
}

#[test]
fn empty_filter_list_copies_the_source_through() {
    let mut backend = SoftwareBackend::new();
    let source = gradient_surface(100, 100);
    let mut target = Surface2d::new(1, 1);

    let run = backend
        .apply_filters(&[], &source, 100, 100, &mut target, Some("key"))
        .unwrap();

    assert_eq!((target.width(), target.height()), (100, 100));
    assert_eq!(target.pixels(), source.pixels());
    assert_eq!(run.passes_applied, 0);
    assert_eq!(run.passes_remaining, 0);
}

#[test]
fn composed_of_neutral_filters_is_exact_identity() {
    let mut backend = SoftwareBackend::new();
    let source = gradient_surface(16, 8);
    let mut target = Surface2d::new(16, 8);

    let composed = Composed::new(vec![
        Box::new(Brightness { brightness: 0.0 }),
        Box::new(Invert { invert: false }),
    ]);
    let filters: Vec<Option<&dyn Filter>> = vec![Some(&composed)];
    let run = backend
        .apply_filters(&filters, &source, 16, 8, &mut target, None)
        .unwrap();

    assert_eq!(target.pixels(), source.pixels());
    assert_eq!(run.passes_applied, 2);
    assert_eq!(run.passes_remaining, 0);
}

#[test]
fn null_entries_are_skipped() {
    let mut backend = SoftwareBackend::new();
    let source = gradient_surface(4, 4);
    let mut target = Surface2d::new(4, 4);

    let invert = Invert::default();
    let filters: Vec<Option<&dyn Filter>> = vec![None, Some(&invert), None];
    let run = backend
        .apply_filters(&filters, &source, 4, 4, &mut target, None)
        .unwrap();

    assert_eq!(run.passes_applied, 1);
    assert_eq!(run.passes_remaining, 2);
    let [r, g, b, a] = target.pixels().pixel(0, 0);
    let [sr, sg, sb, sa] = source.pixels().pixel(0, 0);
    assert_eq!((r, g, b, a), (255 - sr, 255 - sg, 255 - sb, sa));
}

#[test]
fn filters_apply_in_list_order() {
    let mut backend = SoftwareBackend::new();
    let source = Surface2d::from_rgba8(1, 1, vec![100, 100, 100, 255]).unwrap();
    let mut target = Surface2d::new(1, 1);

    // Brightness then invert: (100 + 51) = 151, inverted = 104.
    let brightness = Brightness { brightness: 0.2 };
    let invert = Invert::default();
    let filters: Vec<Option<&dyn Filter>> = vec![Some(&brightness), Some(&invert)];
    backend
        .apply_filters(&filters, &source, 1, 1, &mut target, None)
        .unwrap();
    assert_eq!(target.pixels().pixel(0, 0), [104, 104, 104, 255]);
}

#[test]
fn target_is_resized_and_its_transform_reset() {
    let mut backend = SoftwareBackend::new();
    let source = gradient_surface(8, 8);
    let mut target = Surface2d::new(3, 5);
    target.transform = Affine::scale(2.0);

    backend
        .apply_filters(&[], &source, 8, 8, &mut target, None)
        .unwrap();

    assert_eq!((target.width(), target.height()), (8, 8));
    assert_eq!(target.transform, Affine::IDENTITY);
}

#[test]
fn working_resolution_crops_or_pads_without_rescaling() {
    let mut backend = SoftwareBackend::new();
    let source = gradient_surface(8, 8);

    let mut cropped = Surface2d::new(1, 1);
    backend
        .apply_filters(&[], &source, 4, 4, &mut cropped, None)
        .unwrap();
    assert_eq!((cropped.width(), cropped.height()), (4, 4));
    assert_eq!(cropped.pixels().pixel(3, 3), source.pixels().pixel(3, 3));

    let mut padded = Surface2d::new(1, 1);
    backend
        .apply_filters(&[], &source, 10, 10, &mut padded, None)
        .unwrap();
    assert_eq!(padded.pixels().pixel(9, 9), [0, 0, 0, 0]);
    assert_eq!(padded.pixels().pixel(2, 2), source.pixels().pixel(2, 2));
}

#[test]
fn zero_dimensions_are_rejected() {
    let mut backend = SoftwareBackend::new();
    let source = gradient_surface(4, 4);
    let mut target = Surface2d::new(4, 4);
    assert!(
        backend
            .apply_filters(&[], &source, 0, 4, &mut target, None)
            .is_err()
    );
}

#[test]
fn contrast_and_brightness_compose_differently_than_reversed() {
    let mut backend = SoftwareBackend::new();
    let source = Surface2d::from_rgba8(1, 1, vec![100, 100, 100, 255]).unwrap();

    let brightness = Brightness { brightness: 0.2 };
    let contrast = Contrast { contrast: 0.5 };

    let mut ab = Surface2d::new(1, 1);
    let filters: Vec<Option<&dyn Filter>> = vec![Some(&brightness), Some(&contrast)];
    backend
        .apply_filters(&filters, &source, 1, 1, &mut ab, None)
        .unwrap();

    let mut ba = Surface2d::new(1, 1);
    let filters: Vec<Option<&dyn Filter>> = vec![Some(&contrast), Some(&brightness)];
    backend
        .apply_filters(&filters, &source, 1, 1, &mut ba, None)
        .unwrap();

    assert_ne!(ab.pixels().pixel(0, 0), ba.pixels().pixel(0, 0));
}
