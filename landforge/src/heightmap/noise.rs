//! Fractal value noise and Gaussian blur.

use noise::{NoiseFn, Value};
use rayon::prelude::*;

use super::HeightField;

/// Octaves summed per sample.
pub const OCTAVES: usize = 4;

/// Amplitude multiplier between octaves.
pub const PERSISTENCE: f64 = 0.33;

/// Frequency multiplier between octaves.
pub const LACUNARITY: f64 = 2.4;

/// Generates a normalized fractal noise field.
///
/// Each octave's raw sample is remapped from `[-1, 1]` to `[0, 1]` before it
/// is weighted and accumulated. The result is min-max normalized over the
/// whole field.
///
/// The same `seed` always produces the same field. With `None` a random
/// seed is drawn, so callers that need reproducible output must pass one.
pub fn generate_noise(resolution: usize, scale: f64, seed: Option<u32>) -> HeightField {
    let seed = seed.unwrap_or_else(rand::random);
    let source = Value::new(seed);

    let mut field = HeightField::zeros(resolution);
    field
        .data_mut()
        .par_chunks_mut(resolution.max(1))
        .enumerate()
        .for_each(|(i, row)| {
            let x = i as f64 / resolution as f64 * scale;
            for (j, cell) in row.iter_mut().enumerate() {
                let y = j as f64 / resolution as f64 * scale;
                *cell = fractal_sample(&source, x, y) as f32;
            }
        });

    field.normalize();
    field
}

fn fractal_sample(source: &Value, x: f64, y: f64) -> f64 {
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut value = 0.0;

    for _ in 0..OCTAVES {
        let raw = source.get([x * frequency, y * frequency]);
        value += (raw + 1.0) / 2.0 * amplitude;
        amplitude *= PERSISTENCE;
        frequency *= LACUNARITY;
    }

    value
}

/// Normalized 1-D Gaussian kernel of length `2 * radius + 1` with σ = radius / 3.
pub fn gaussian_kernel(radius: usize) -> Vec<f32> {
    if radius == 0 {
        return vec![1.0];
    }
    let sigma = radius as f64 / 3.0;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let weights: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-(x * x) / two_sigma_sq).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / total) as f32).collect()
}

/// Gaussian blur with a separable kernel.
///
/// Near the borders only in-bounds taps contribute and the weights are not
/// renormalized, so edges are darkened slightly. Nothing wraps around.
pub fn blur(field: &HeightField, radius: usize) -> HeightField {
    if radius == 0 {
        return field.clone();
    }
    let size = field.size();
    let kernel = gaussian_kernel(radius);

    // Horizontal pass
    let mut horizontal = HeightField::zeros(size);
    horizontal
        .data_mut()
        .par_chunks_mut(size.max(1))
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                *out = convolve(&kernel, radius, x, size, |sx| field.get(sx, y));
            }
        });

    // Vertical pass
    let mut result = HeightField::zeros(size);
    result
        .data_mut()
        .par_chunks_mut(size.max(1))
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                *out = convolve(&kernel, radius, y, size, |sy| horizontal.get(x, sy));
            }
        });

    result
}

#[inline]
fn convolve(
    kernel: &[f32],
    radius: usize,
    center: usize,
    size: usize,
    sample: impl Fn(usize) -> f32,
) -> f32 {
    let lo = center.saturating_sub(radius);
    let hi = (center + radius).min(size - 1);
    (lo..=hi)
        .map(|s| kernel[s + radius - center] * sample(s))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(16);
        assert_eq!(kernel.len(), 33);
        let total: f32 = kernel.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        for i in 0..16 {
            assert!((kernel[i] - kernel[32 - i]).abs() < 1e-7);
        }
        assert!(kernel[16] > kernel[15]);
    }

    #[test]
    fn test_same_seed_same_field() {
        let a = generate_noise(32, 1.5, Some(42));
        let b = generate_noise(32, 1.5, Some(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_different_field() {
        let a = generate_noise(32, 3.0, Some(1));
        let b = generate_noise(32, 3.0, Some(2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_blur_constant_interior_unchanged() {
        let field = HeightField::from_vec(vec![0.8; 64 * 64]).unwrap();
        let blurred = blur(&field, 3);
        assert!((blurred.get(32, 32) - 0.8).abs() < 1e-5);
    }

    #[test]
    fn test_blur_edges_lose_weight() {
        let field = HeightField::from_vec(vec![1.0; 32 * 32]).unwrap();
        let blurred = blur(&field, 6);
        // Corner keeps only a quarter of the kernel mass plus the centre row/column
        assert!(blurred.get(0, 0) < 0.5);
        assert!(blurred.get(0, 0) > 0.2);
    }

    #[test]
    fn test_blur_radius_zero_is_identity() {
        let field = generate_noise(16, 2.0, Some(7));
        assert_eq!(blur(&field, 0), field);
    }

    #[test]
    fn test_blur_matches_direct_2d_convolution() {
        let field = generate_noise(12, 4.0, Some(3));
        let radius = 3;
        let kernel = gaussian_kernel(radius);
        let blurred = blur(&field, radius);

        for y in 0..12usize {
            for x in 0..12usize {
                let mut expected = 0.0f32;
                for ky in -(radius as i64)..=radius as i64 {
                    for kx in -(radius as i64)..=radius as i64 {
                        let sx = x as i64 + kx;
                        let sy = y as i64 + ky;
                        if (0..12).contains(&sx) && (0..12).contains(&sy) {
                            let w = kernel[(ky + radius as i64) as usize]
                                * kernel[(kx + radius as i64) as usize];
                            expected += field.get(sx as usize, sy as usize) * w;
                        }
                    }
                }
                assert!((blurred.get(x, y) - expected).abs() < 1e-5);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_noise_is_normalized(resolution in 8usize..48, scale in 1.0f64..12.0, seed in any::<u32>()) {
            let field = generate_noise(resolution, scale, Some(seed));
            let (min, max) = field.min_max();
            prop_assert!(min.abs() < 1e-6);
            prop_assert!((max - 1.0).abs() < 1e-6);
        }
    }
}
