//! Spatial relationships between detections of one frame.
//!
//! An item card is recognized as several fragments: the item name, a price on
//! the same row, a mutation/attribute label and a profit figure on neighbouring
//! rows. Fragments whose vertical centres are close together form a cluster.

use super::NormalizedDetection;

/// Pixel tolerances for row and cluster membership.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterGeometry {
    /// Max vertical centre distance for two fragments of the same cluster
    pub cluster_tolerance_px: f32,
    /// Max vertical centre distance for two fragments on the same row
    pub row_tolerance_px: f32,
    /// Max horizontal centre distance for two fragments on the same row
    pub max_row_gap_px: f32,
}

impl Default for ClusterGeometry {
    fn default() -> Self {
        Self {
            cluster_tolerance_px: 120.0,
            row_tolerance_px: 50.0,
            max_row_gap_px: 600.0,
        }
    }
}

/// Read-only view over the normalized detections of one frame.
///
/// Positions passed to the lookup methods are slice positions, not the
/// original batch indices.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    detections: &'a [NormalizedDetection],
    geometry: ClusterGeometry,
}

impl<'a> FrameView<'a> {
    pub fn new(detections: &'a [NormalizedDetection], geometry: ClusterGeometry) -> Self {
        Self {
            detections,
            geometry,
        }
    }

    pub fn detections(&self) -> &'a [NormalizedDetection] {
        self.detections
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    /// Other members of `pos`'s cluster, nearest first.
    pub fn cluster(&self, pos: usize) -> Vec<usize> {
        let Some(anchor) = self.detections.get(pos) else {
            return Vec::new();
        };
        let tolerance = self.geometry.cluster_tolerance_px;

        let mut members: Vec<(usize, f32, f32)> = self
            .detections
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != pos)
            .map(|(i, other)| {
                let (dx, dy) = offsets(anchor, other);
                (i, dx, dy)
            })
            .filter(|(_, _, dy)| *dy <= tolerance)
            .collect();

        members.sort_by(|a, b| a.2.total_cmp(&b.2).then(a.1.total_cmp(&b.1)));
        members.into_iter().map(|(i, _, _)| i).collect()
    }

    /// Fragments on the same row as `pos`, nearest first.
    pub fn row(&self, pos: usize) -> Vec<usize> {
        let Some(anchor) = self.detections.get(pos) else {
            return Vec::new();
        };
        let ClusterGeometry {
            row_tolerance_px,
            max_row_gap_px,
            ..
        } = self.geometry;

        let mut companions: Vec<(usize, f32)> = self
            .detections
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != pos)
            .filter_map(|(i, other)| {
                let (dx, dy) = offsets(anchor, other);
                (dy <= row_tolerance_px && dx <= max_row_gap_px).then(|| (i, dx.hypot(dy)))
            })
            .collect();

        companions.sort_by(|a, b| a.1.total_cmp(&b.1));
        companions.into_iter().map(|(i, _)| i).collect()
    }

    /// Price for `pos` and the position it was read from.
    ///
    /// The fragment's own text is preferred; otherwise the nearest same-row
    /// companion that carries a number is used.
    pub fn price_for(&self, pos: usize) -> Option<(u64, usize)> {
        let anchor = self.detections.get(pos)?;
        if let Some(price) = anchor.parsed_price {
            return Some((price, pos));
        }
        self.row(pos)
            .into_iter()
            .find_map(|i| self.detections[i].parsed_price.map(|p| (p, i)))
    }

    /// Profit figure for `pos`: the nearest cluster member carrying a number,
    /// skipping the fragment the price was read from.
    pub fn profit_for(&self, pos: usize, price_source: Option<usize>) -> Option<u64> {
        self.cluster(pos)
            .into_iter()
            .filter(|&i| Some(i) != price_source)
            .find_map(|i| self.detections[i].parsed_price)
    }

    /// True when `pos` or one of its cluster members contains `attribute`.
    ///
    /// `attribute` must already be lower-cased.
    pub fn has_attribute(&self, pos: usize, attribute: &str) -> bool {
        let Some(anchor) = self.detections.get(pos) else {
            return false;
        };
        anchor.corrected_text.contains(attribute)
            || self
                .cluster(pos)
                .into_iter()
                .any(|i| self.detections[i].corrected_text.contains(attribute))
    }
}

/// Absolute horizontal and vertical centre distances.
fn offsets(a: &NormalizedDetection, b: &NormalizedDetection) -> (f32, f32) {
    let (ax, ay) = a.full_frame_box.center();
    let (bx, by) = b.full_frame_box.center();
    ((ax - bx).abs(), (ay - by).abs())
}
