use cascade_ocr::document::bounds::Bounds;
use cascade_ocr::utils::error::ImageError;
use cascade_ocr::utils::image_utils::{
    crop_region, orient_line, pad_to_square, resize_exact, subtract_mean_normalize,
};
use image::{ImageBuffer, Rgb, RgbImage};

fn gradient(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 0]))
}

#[test]
fn test_crop_region() {
    let img = gradient(20, 10);
    let crop = crop_region(&img, &Bounds::new(5, 2, 15, 7)).unwrap();

    assert_eq!(crop.dimensions(), (10, 5));
    assert_eq!(crop.get_pixel(0, 0), &Rgb([5, 2, 0]));
    assert_eq!(crop.get_pixel(9, 4), &Rgb([14, 6, 0]));
}

#[test]
fn test_crop_region_is_clipped_to_image() {
    let img = gradient(20, 10);
    let crop = crop_region(&img, &Bounds::new(-5, -5, 5, 5)).unwrap();
    assert_eq!(crop.dimensions(), (5, 5));
    assert_eq!(crop.get_pixel(0, 0), &Rgb([0, 0, 0]));
}

#[test]
fn test_crop_region_outside_image() {
    let img = gradient(20, 10);
    let result = crop_region(&img, &Bounds::new(30, 30, 40, 40));
    assert!(matches!(result, Err(ImageError::EmptyRegion { .. })));
}

#[test]
fn test_pad_to_square() {
    let img: RgbImage = ImageBuffer::from_pixel(10, 4, Rgb([255, 255, 255]));
    let (padded, side) = pad_to_square(&img);

    assert_eq!(side, 10);
    assert_eq!(padded.dimensions(), (10, 10));
    assert_eq!(padded.get_pixel(0, 0), &Rgb([255, 255, 255]));
    assert_eq!(padded.get_pixel(9, 9), &Rgb([0, 0, 0]));
}

#[test]
fn test_orient_line() {
    let portrait = gradient(4, 10);
    assert_eq!(orient_line(&portrait).dimensions(), (10, 4));

    let landscape = gradient(10, 4);
    assert_eq!(orient_line(&landscape).dimensions(), (10, 4));
}

#[test]
fn test_resize_exact() {
    let img = gradient(30, 12);
    assert_eq!(resize_exact(&img, 256, 16).dimensions(), (256, 16));
}

#[test]
fn test_subtract_mean_normalize() {
    let img: RgbImage = ImageBuffer::from_pixel(3, 2, Rgb([255, 0, 127]));
    let mean = [127.5, 127.5, 127.5];
    let norm = [1.0 / 127.5, 1.0 / 127.5, 1.0 / 127.5];

    let tensor = subtract_mean_normalize(&img, &mean, &norm).unwrap();

    assert_eq!(tensor.shape(), &[1, 3, 2, 3]);
    assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-5);
    assert!((tensor[[0, 1, 1, 2]] + 1.0).abs() < 1e-5);
}

#[test]
fn test_subtract_mean_normalize_empty_image() {
    let img = RgbImage::new(0, 0);
    assert!(subtract_mean_normalize(&img, &[0.0; 3], &[1.0; 3]).is_err());
}
