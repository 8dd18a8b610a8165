//! Coordinate conversion utilities.
//!
//! Detections arrive relative to the recognized region of interest. The
//! input-simulation side needs full-frame coordinates. Region and frame share
//! the same pixel density, so the mapping is a pure translation.

use serde::{Deserialize, Serialize};

use super::BoundingBox;

/// Where the recognized region's top-left corner sits in the full frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionOffset {
    pub x: f32,
    pub y: f32,
}

impl Default for RegionOffset {
    /// 1280-wide region centred in a 1920x1080 frame.
    fn default() -> Self {
        Self { x: 320.0, y: 0.0 }
    }
}

/// Translates `bbox` from region-local to full-frame coordinates.
pub fn to_full_frame(bbox: BoundingBox, offset: RegionOffset) -> BoundingBox {
    BoundingBox {
        x: bbox.x + offset.x,
        y: bbox.y + offset.y,
        width: bbox.width,
        height: bbox.height,
    }
}

/// Maps boxes with a fixed region offset.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CoordinateMapper {
    offset: RegionOffset,
}

impl CoordinateMapper {
    pub fn new(offset: RegionOffset) -> Self {
        Self { offset }
    }

    pub fn to_full_frame(&self, bbox: BoundingBox) -> BoundingBox {
        to_full_frame(bbox, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_maps_with_default_offset() {
        let mapper = CoordinateMapper::new(RegionOffset::default());
        let mapped = mapper.to_full_frame(BoundingBox::new(10.0, 20.0, 30.0, 15.0));
        assert_eq!(mapped, BoundingBox::new(330.0, 20.0, 30.0, 15.0));
    }

    #[test]
    fn test_zero_offset_is_identity() {
        let bbox = BoundingBox::new(7.0, 8.0, 9.0, 10.0);
        assert_eq!(to_full_frame(bbox, RegionOffset { x: 0.0, y: 0.0 }), bbox);
    }

    proptest! {
        #[test]
        fn prop_translation_preserves_size(
            x in 0u16..2000, y in 0u16..2000, w in 1u16..500, h in 1u16..500,
            ox in 0u16..1000, oy in 0u16..1000,
        ) {
            let bbox = BoundingBox::new(x as f32, y as f32, w as f32, h as f32);
            let offset = RegionOffset { x: ox as f32, y: oy as f32 };
            let mapped = to_full_frame(bbox, offset);
            prop_assert_eq!(mapped.width, bbox.width);
            prop_assert_eq!(mapped.height, bbox.height);
            prop_assert_eq!(mapped.x - offset.x, bbox.x);
            prop_assert_eq!(mapped.y - offset.y, bbox.y);
        }
    }
}
