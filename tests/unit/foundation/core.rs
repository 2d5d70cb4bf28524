use super::*;

#[test]
fn pixel_buffer_rejects_wrong_length() {
    assert!(PixelBuffer::from_rgba8(2, 2, vec![0; 15]).is_err());
    assert!(PixelBuffer::from_rgba8(2, 2, vec![0; 16]).is_ok());
}

#[test]
fn pixel_accessor_reads_rgba() {
    let mut data = vec![0u8; 2 * 2 * 4];
    data[4..8].copy_from_slice(&[1, 2, 3, 4]);
    let buf = PixelBuffer::from_rgba8(2, 2, data).unwrap();
    assert_eq!(buf.pixel(1, 0), [1, 2, 3, 4]);
    assert_eq!(buf.pixel(0, 1), [0, 0, 0, 0]);
}

#[test]
fn surface_resize_clears_content() {
    let mut surface = Surface2d::from_rgba8(1, 1, vec![9, 9, 9, 9]).unwrap();
    surface.resize(2, 1);
    assert_eq!((surface.width(), surface.height()), (2, 1));
    assert_eq!(surface.pixels().pixel(0, 0), [0, 0, 0, 0]);
}

#[test]
fn surface_starts_with_identity_transform() {
    let surface = Surface2d::new(4, 4);
    assert_eq!(surface.transform, Affine::IDENTITY);
}
