//! Recognized text fragments and their geometry.
//!
//! This module provides:
//! - The raw `Detection` record produced by the recognition pipeline
//! - The derived `NormalizedDetection` the rule matcher works on
//! - Region-to-frame coordinate mapping
//! - Row/cluster lookups between detections of the same frame

pub mod cluster;
pub mod coords;

pub use cluster::{ClusterGeometry, FrameView};
pub use coords::{CoordinateMapper, RegionOffset, to_full_frame};

use serde::{Deserialize, Serialize};

use crate::engine::error::EngineError;

/// Axis-aligned box in pixel units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    #[serde(alias = "w")]
    pub width: f32,
    #[serde(alias = "h")]
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Centre point `(cx, cy)`.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True for zero/negative extents or non-finite coordinates.
    pub fn is_degenerate(&self) -> bool {
        let finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        !finite || self.width <= 0.0 || self.height <= 0.0
    }
}

fn default_confidence() -> f32 {
    1.0
}

/// One recognized text fragment, in region-local coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub text: String,
    #[serde(rename = "box", alias = "bbox")]
    pub bbox: BoundingBox,
    /// Recognition confidence (0.0 to 1.0)
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

impl Detection {
    pub fn new(text: impl Into<String>, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence,
        }
    }

    /// Rejects detections that must not reach normalization.
    pub fn validate(&self, min_confidence: f32) -> Result<(), EngineError> {
        if self.text.trim().is_empty() {
            return Err(EngineError::MalformedDetection {
                reason: "empty text".to_string(),
            });
        }
        if self.bbox.is_degenerate() {
            return Err(EngineError::MalformedDetection {
                reason: format!(
                    "degenerate box {}x{} at ({}, {})",
                    self.bbox.width, self.bbox.height, self.bbox.x, self.bbox.y
                ),
            });
        }
        if !self.confidence.is_finite() || self.confidence < min_confidence {
            return Err(EngineError::MalformedDetection {
                reason: format!(
                    "confidence {:.2} below minimum {:.2}",
                    self.confidence, min_confidence
                ),
            });
        }
        Ok(())
    }
}

/// A detection after text correction, price parsing and coordinate mapping.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedDetection {
    /// Position of the source detection within its batch
    pub index: usize,
    pub corrected_text: String,
    pub parsed_price: Option<u64>,
    pub full_frame_box: BoundingBox,
    pub confidence: f32,
}
