//! Region persistence payload.
//!
//! The JSON shape consumed by the exam-configuration store and, later,
//! by the grader that crops answers out of student photos:
//!
//! ```json
//! {"image_width": 1000, "image_height": 800,
//!  "regions": [{"question_id": "all", "type": "mcq",
//!               "x": 100, "y": 100, "width": 200, "height": 50}]}
//! ```

use image::imageops;
use serde::{Deserialize, Serialize};

use crate::marker::{Region, RegionType};
use crate::types::{CalibrateError, Dimensions, RgbaImage};

/// Round half away from negative infinity, the way browser `Math.round`
/// does (`-2.5` rounds to `-2`).
#[allow(clippy::cast_possible_truncation)]
fn round_px(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_extent(v: f64) -> u32 {
    round_px(v).clamp(0, i64::from(u32::MAX)) as u32
}

/// One region in integer pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionEntry {
    /// `"all"` for the multiple-choice region, the question number
    /// otherwise.
    pub question_id: String,
    /// Region kind.
    #[serde(rename = "type")]
    pub region_type: RegionType,
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl RegionEntry {
    /// Round a committed region to whole pixels.
    #[must_use]
    pub fn from_region(region: &Region) -> Self {
        Self {
            question_id: region.question_id.clone(),
            region_type: region.region_type,
            x: round_px(region.x),
            y: round_px(region.y),
            width: round_extent(region.width),
            height: round_extent(region.height),
        }
    }

    /// Back to floating-point geometry, e.g. for drawing a saved payload.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_region(&self) -> Region {
        Region {
            question_id: self.question_id.clone(),
            region_type: self.region_type,
            x: self.x as f64,
            y: self.y as f64,
            width: f64::from(self.width),
            height: f64::from(self.height),
        }
    }
}

/// Calibration result for one exam template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionPayload {
    /// Natural width of the template at calibration time.
    pub image_width: u32,
    /// Natural height of the template at calibration time.
    pub image_height: u32,
    /// Regions in insertion order.
    pub regions: Vec<RegionEntry>,
}

impl RegionPayload {
    /// Build a payload from committed regions.
    #[must_use]
    pub fn from_regions(dimensions: Dimensions, regions: &[Region]) -> Self {
        Self {
            image_width: dimensions.width,
            image_height: dimensions.height,
            regions: regions.iter().map(RegionEntry::from_region).collect(),
        }
    }

    /// Template dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image_width, self.image_height)
    }

    /// Check the region-set rules: non-empty, exactly one
    /// multiple-choice region.
    ///
    /// # Errors
    ///
    /// [`CalibrateError::NoRegions`], [`CalibrateError::MissingMcq`], or
    /// [`CalibrateError::DuplicateMcq`].
    pub fn check(&self) -> Result<(), CalibrateError> {
        if self.regions.is_empty() {
            return Err(CalibrateError::NoRegions);
        }
        match self
            .regions
            .iter()
            .filter(|r| r.region_type == RegionType::Mcq)
            .count()
        {
            0 => Err(CalibrateError::MissingMcq),
            1 => Ok(()),
            _ => Err(CalibrateError::DuplicateMcq),
        }
    }

    /// Rescale every region onto a photo of different resolution.
    ///
    /// Horizontal and vertical factors are independent.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::ZeroDimensions`] if this payload
    /// records a zero width or height.
    pub fn scale_to(&self, target: Dimensions) -> Result<Self, CalibrateError> {
        if self.dimensions().is_empty() {
            return Err(CalibrateError::ZeroDimensions);
        }
        let sx = f64::from(target.width) / f64::from(self.image_width);
        let sy = f64::from(target.height) / f64::from(self.image_height);
        #[allow(clippy::cast_precision_loss)]
        let regions = self
            .regions
            .iter()
            .map(|r| RegionEntry {
                question_id: r.question_id.clone(),
                region_type: r.region_type,
                x: round_px(r.x as f64 * sx),
                y: round_px(r.y as f64 * sy),
                width: round_extent(f64::from(r.width) * sx),
                height: round_extent(f64::from(r.height) * sy),
            })
            .collect();
        Ok(Self {
            image_width: target.width,
            image_height: target.height,
            regions,
        })
    }

    /// Crop each region out of `image`, clamped to its bounds.
    ///
    /// Regions lying entirely outside the image yield 0-area crops so
    /// the output stays parallel to [`regions`](Self::regions).
    #[must_use]
    pub fn extract(&self, image: &RgbaImage) -> Vec<(String, RgbaImage)> {
        let (w, h) = (i64::from(image.width()), i64::from(image.height()));
        self.regions
            .iter()
            .map(|r| {
                let x0 = r.x.clamp(0, w);
                let y0 = r.y.clamp(0, h);
                let x1 = r.x.saturating_add(i64::from(r.width)).clamp(0, w);
                let y1 = r.y.saturating_add(i64::from(r.height)).clamp(0, h);
                let crop = match (
                    u32::try_from(x0),
                    u32::try_from(y0),
                    u32::try_from(x1 - x0),
                    u32::try_from(y1 - y0),
                ) {
                    (Ok(x), Ok(y), Ok(cw), Ok(ch)) => {
                        imageops::crop_imm(image, x, y, cw, ch).to_image()
                    }
                    _ => RgbaImage::new(0, 0),
                };
                tracing::debug!(
                    question_id = %r.question_id,
                    width = crop.width(),
                    height = crop.height(),
                    "extracted region"
                );
                (r.question_id.clone(), crop)
            })
            .collect()
    }
}
