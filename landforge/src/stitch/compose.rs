//! 2×2 image stitching.

use image::{ImageBuffer, Pixel};

use crate::raster::{ensure_same_size, RasterError};

/// Quadrant offsets in stitch order: top-left, top-right, bottom-right, bottom-left.
const QUADRANTS: [(u32, u32); 4] = [(0, 0), (1, 0), (1, 1), (0, 1)];

/// Composites exactly four equal-size images into a 2×2 grid.
///
/// `images[0]` lands top-left, then top-right, bottom-right and
/// bottom-left, matching serpentine tile numbering. The output is twice
/// the width and height of the inputs.
pub fn stitch<P>(
    images: &[ImageBuffer<P, Vec<P::Subpixel>>],
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>, RasterError>
where
    P: Pixel + 'static,
{
    if images.len() != 4 {
        return Err(RasterError::WrongImageCount {
            expected: 4,
            actual: images.len(),
        });
    }
    let (width, height) = images[0].dimensions();
    for image in &images[1..] {
        ensure_same_size((width, height), image.dimensions())?;
    }

    let mut out = ImageBuffer::new(width * 2, height * 2);
    for (image, (qx, qy)) in images.iter().zip(QUADRANTS) {
        image::imageops::replace(&mut out, image, (qx * width) as i64, (qy * height) as i64);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};
    use proptest::prelude::*;

    #[test]
    fn test_stitch_quadrant_placement() {
        let images: Vec<GrayImage> = (0..4)
            .map(|i| GrayImage::from_pixel(2, 2, Luma([i as u8 * 10])))
            .collect();

        let out = stitch(&images).unwrap();

        assert_eq!(out.dimensions(), (4, 4));
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(3, 0)[0], 10);
        assert_eq!(out.get_pixel(3, 3)[0], 20);
        assert_eq!(out.get_pixel(0, 3)[0], 30);
    }

    #[test]
    fn test_stitch_wrong_count() {
        let images = vec![GrayImage::new(2, 2); 3];
        assert!(matches!(
            stitch(&images),
            Err(RasterError::WrongImageCount { actual: 3, .. })
        ));
    }

    #[test]
    fn test_stitch_size_mismatch() {
        let mut images = vec![GrayImage::new(2, 2); 4];
        images[2] = GrayImage::new(3, 2);
        assert!(matches!(
            stitch(&images),
            Err(RasterError::DimensionMismatch { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_quadrants_identical_to_sources(
            width in 1u32..8,
            height in 1u32..8,
            seed in any::<u64>(),
        ) {
            let images: Vec<RgbaImage> = (0..4u64)
                .map(|i| {
                    RgbaImage::from_fn(width, height, |x, y| {
                        let v = seed
                            .wrapping_mul(6364136223846793005)
                            .wrapping_add(i * 1000 + (y * width + x) as u64);
                        let b = v.to_le_bytes();
                        Rgba([b[0], b[1], b[2], b[3]])
                    })
                })
                .collect();

            let out = stitch(&images).unwrap();
            prop_assert_eq!(out.dimensions(), (width * 2, height * 2));

            for (image, (qx, qy)) in images.iter().zip(QUADRANTS) {
                for y in 0..height {
                    for x in 0..width {
                        prop_assert_eq!(
                            out.get_pixel(qx * width + x, qy * height + y),
                            image.get_pixel(x, y)
                        );
                    }
                }
            }
        }
    }
}
