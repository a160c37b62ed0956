//! Color segmentation: RGB→HSV conversion, flame-color membership mask,
//! and morphological cleanup of the raw mask.
//! Cleanup cascade: close (fill small gaps) → open (drop speckle) →
//! light blur → hard re-threshold back to binary.

use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{close, open};

use crate::config::ColorRange;

/// Round structuring neighborhood radius for close/open.
const KERNEL_RADIUS: u8 = 2;
/// Sigma for the edge-smoothing blur after morphology.
const BLUR_SIGMA: f32 = 1.0;
/// Re-binarization cut after the blur. Midpoint keeps region edges in place.
const REBINARIZE_CUT: u8 = 127;

/// Convert one RGB pixel to HSV: hue in degrees [0, 360), saturation and
/// value in 0-255.
#[inline]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, u8, u8) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = (max - min) as f32;

    let h = if delta == 0.0 {
        0.0
    } else {
        let (rf, gf, bf) = (r as f32, g as f32, b as f32);
        let raw = if max == r {
            60.0 * ((gf - bf) / delta)
        } else if max == g {
            60.0 * ((bf - rf) / delta) + 120.0
        } else {
            60.0 * ((rf - gf) / delta) + 240.0
        };
        if raw < 0.0 {
            raw + 360.0
        } else {
            raw
        }
    };

    let s = if max == 0 {
        0
    } else {
        ((delta * 255.0) / max as f32).round() as u8
    };

    (h, s, max)
}

/// Binary membership mask (0/255): a pixel is set when its HSV value falls
/// inside any configured color range. Equivalent to per-range masks OR'd
/// together, done in a single pass so each pixel is converted once.
pub fn fire_mask(frame: &RgbImage, ranges: &[ColorRange]) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let p = frame.get_pixel(x, y);
        let (h, s, v) = rgb_to_hsv(p[0], p[1], p[2]);
        if ranges.iter().any(|r| r.contains(h, s, v)) {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Suppress single-pixel speckle while preserving compact bright regions.
pub fn clean_mask(mask: &GrayImage) -> GrayImage {
    let closed = close(mask, Norm::L2, KERNEL_RADIUS);
    let opened = open(&closed, Norm::L2, KERNEL_RADIUS);
    let blurred = gaussian_blur_f32(&opened, BLUR_SIGMA);
    threshold(&blurred, REBINARIZE_CUT, ThresholdType::Binary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fire_color_defaults;

    #[test]
    fn hsv_of_primary_colors() {
        assert_eq!(rgb_to_hsv(255, 0, 0), (0.0, 255, 255));
        let (h, s, v) = rgb_to_hsv(0, 255, 0);
        assert_eq!((h, s, v), (120.0, 255, 255));
        let (h, _, _) = rgb_to_hsv(0, 0, 255);
        assert_eq!(h, 240.0);
        // Greys have zero saturation and a hue of 0 by convention.
        assert_eq!(rgb_to_hsv(80, 80, 80), (0.0, 0, 80));
        assert_eq!(rgb_to_hsv(0, 0, 0), (0.0, 0, 0));
    }

    #[test]
    fn hsv_of_flame_orange() {
        // A bright orange: hue well inside the first fire range.
        let (h, s, v) = rgb_to_hsv(255, 80, 10);
        assert!(h > 10.0 && h < 25.0, "hue was {h}");
        assert!(s >= 100);
        assert!(v >= 200);
    }

    #[test]
    fn mask_flags_fire_pixels_only() {
        let ranges = fire_color_defaults();
        let mut frame = RgbImage::new(8, 8);
        frame.put_pixel(2, 3, image::Rgb([255, 80, 10]));
        frame.put_pixel(5, 5, image::Rgb([0, 200, 0]));

        let mask = fire_mask(&frame, &ranges);
        assert_eq!(mask.get_pixel(2, 3)[0], 255);
        assert_eq!(mask.get_pixel(5, 5)[0], 0);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn cleanup_removes_isolated_speckle_keeps_blocks() {
        let mut mask = GrayImage::new(40, 40);
        // Lone pixel: speckle noise.
        mask.put_pixel(3, 3, Luma([255]));
        // Solid 16x16 block: a real region.
        for y in 12..28 {
            for x in 12..28 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }

        let cleaned = clean_mask(&mask);
        assert_eq!(cleaned.get_pixel(3, 3)[0], 0);
        assert_eq!(cleaned.get_pixel(20, 20)[0], 255);
    }
}
