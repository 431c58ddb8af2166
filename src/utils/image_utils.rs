use image::{imageops, RgbImage};
use ndarray::{Array, Array4};

use crate::document::bounds::Bounds;
use crate::utils::error::ImageError;

/// Clips `bounds` to the image and copies the covered pixels out.
///
/// Returns [`ImageError::EmptyRegion`] when nothing of the box lies inside
/// the image or the box itself has no area.
pub fn crop_region(src: &RgbImage, bounds: &Bounds) -> Result<RgbImage, ImageError> {
    let clipped = bounds.clip_to(src.width(), src.height());

    if clipped.width() <= 0 || clipped.height() <= 0 {
        return Err(ImageError::EmptyRegion {
            x: bounds.left(),
            y: bounds.top(),
            width: bounds.width(),
            height: bounds.height(),
        });
    }

    Ok(imageops::crop_imm(
        src,
        clipped.left() as u32,
        clipped.top() as u32,
        clipped.width() as u32,
        clipped.height() as u32,
    )
    .to_image())
}

/// Pads the image on the right and bottom so that it becomes square.
///
/// Returns the padded image and its side length.
pub fn pad_to_square(image: &RgbImage) -> (RgbImage, u32) {
    let side = image.width().max(image.height());
    if image.width() == image.height() {
        return (image.clone(), side);
    }

    let mut padded = RgbImage::new(side, side);
    imageops::replace(&mut padded, image, 0, 0);
    (padded, side)
}

/// Rotates portrait line crops so the text runs left to right.
pub fn orient_line(image: &RgbImage) -> RgbImage {
    if image.height() > image.width() {
        imageops::rotate270(image)
    } else {
        image.clone()
    }
}

pub fn resize_exact(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.width() == width && image.height() == height {
        return image.clone();
    }
    imageops::resize(image, width, height, imageops::FilterType::Triangle)
}

pub fn subtract_mean_normalize(
    img: &RgbImage,
    mean_values: &[f32; 3],
    norm_values: &[f32; 3],
) -> Result<Array4<f32>, ImageError> {
    let width = img.width() as usize;
    let height = img.height() as usize;

    if width == 0 || height == 0 {
        return Err(ImageError::InvalidInput {
            message: "cannot normalize an empty image".to_string(),
        });
    }

    let mut input = Array::zeros((1, 3, height, width));

    for y in 0..height {
        for x in 0..width {
            let pixel = img.get_pixel(x as u32, y as u32);

            for ch in 0..3 {
                let pixel_value = pixel.0[ch] as f32;

                let normalized =
                    (pixel_value * norm_values[ch]) - (mean_values[ch] * norm_values[ch]);

                input[[0, ch, y, x]] = normalized;
            }
        }
    }

    Ok(input)
}
