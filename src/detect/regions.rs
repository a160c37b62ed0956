//! Connected-region extraction over the cleaned binary mask.
//! Labels 8-connected components, accumulates per-region pixel area and
//! axis-aligned bounding box, and drops regions below the minimum area.

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use super::BoundingBox;

/// One surviving fire-colored region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub area: u32,
    pub bbox: BoundingBox,
}

struct RegionAccumulator {
    area: u32,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl RegionAccumulator {
    fn new(x: u32, y: u32) -> Self {
        Self { area: 0, min_x: x, min_y: y, max_x: x, max_y: y }
    }

    fn push(&mut self, x: u32, y: u32) {
        self.area += 1;
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

/// Find all 8-connected regions with pixel area >= `min_area`, ordered by
/// label (top-left first). Coordinates are in original frame pixels.
pub fn find_regions(mask: &GrayImage, min_area: u32) -> Vec<Region> {
    if mask.width() == 0 || mask.height() == 0 {
        return Vec::new();
    }

    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    // Label 0 is background; component labels start at 1.
    let mut accumulators: Vec<Option<RegionAccumulator>> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0] as usize;
        if label == 0 {
            continue;
        }
        if label >= accumulators.len() {
            accumulators.resize_with(label + 1, || None);
        }
        accumulators[label]
            .get_or_insert_with(|| RegionAccumulator::new(x, y))
            .push(x, y);
    }

    accumulators
        .into_iter()
        .flatten()
        .filter(|acc| acc.area >= min_area)
        .map(|acc| Region {
            area: acc.area,
            bbox: BoundingBox {
                x: acc.min_x,
                y: acc.min_y,
                w: acc.max_x - acc.min_x + 1,
                h: acc.max_y - acc.min_y + 1,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(mask: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn empty_mask_has_no_regions() {
        let mask = GrayImage::new(32, 32);
        assert!(find_regions(&mask, 1).is_empty());
    }

    #[test]
    fn two_blocks_with_area_filter() {
        let mut mask = GrayImage::new(64, 64);
        fill(&mut mask, 4, 4, 10, 10); // area 100
        fill(&mut mask, 30, 30, 5, 5); // area 25

        let all = find_regions(&mask, 1);
        assert_eq!(all.len(), 2);

        let filtered = find_regions(&mask, 50);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].area, 100);
        assert_eq!(
            filtered[0].bbox,
            BoundingBox { x: 4, y: 4, w: 10, h: 10 }
        );
    }

    #[test]
    fn diagonal_pixels_join_under_eight_connectivity() {
        let mut mask = GrayImage::new(8, 8);
        mask.put_pixel(1, 1, Luma([255]));
        mask.put_pixel(2, 2, Luma([255]));
        mask.put_pixel(3, 3, Luma([255]));

        let regions = find_regions(&mask, 1);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 3);
        assert_eq!(regions[0].bbox, BoundingBox { x: 1, y: 1, w: 3, h: 3 });
    }

    #[test]
    fn zero_sized_mask_is_fine() {
        let mask = GrayImage::new(0, 0);
        assert!(find_regions(&mask, 1).is_empty());
    }
}
