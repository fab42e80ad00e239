//! Rectangle-region calibration over an exam template.
//!
//! The exam author drags out one multiple-choice region covering every
//! bubble answer, then one written region per free-response question.
//! Regions are kept in insertion order; the result is a
//! [`RegionPayload`] for the exam-configuration store.
//!
//! Draw state is `Idle -> Drawing(draft) -> Idle`. The active region
//! type is a separate mode that survives across draws.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mapper::PointerEvent;
use crate::payload::RegionPayload;
use crate::render::{DrawCommand, RenderStyle, TextAlign};
use crate::types::{CalibrateError, Dimensions, Point, Rect};

/// Question id carried by the multiple-choice region.
pub const MCQ_QUESTION_ID: &str = "all";

/// Kind of answer area a region covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionType {
    /// All multiple-choice bubbles.
    #[default]
    Mcq,
    /// One handwritten answer.
    Written,
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mcq => "mcq",
            Self::Written => "written",
        })
    }
}

/// A committed region, normalized to non-negative extents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// [`MCQ_QUESTION_ID`] or the written question number.
    pub question_id: String,
    /// Region kind.
    #[serde(rename = "type")]
    pub region_type: RegionType,
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Region {
    /// Bounds as a [`Rect`].
    #[must_use]
    pub const fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Text shown in the tag above the region.
    #[must_use]
    pub fn label(&self) -> String {
        match self.region_type {
            RegionType::Mcq => "MCQ Section (All)".to_owned(),
            RegionType::Written => format!("Written Q{}", self.question_id),
        }
    }
}

/// In-progress rectangle. Extents may be negative until the draw ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DraftRegion {
    /// Where the press happened.
    pub anchor: Point,
    /// Signed width (`pointer.x - anchor.x`).
    pub width: f64,
    /// Signed height (`pointer.y - anchor.y`).
    pub height: f64,
    /// Type captured when the draw began.
    pub region_type: RegionType,
}

impl DraftRegion {
    /// Un-normalized bounds.
    #[must_use]
    pub const fn rect(&self) -> Rect {
        Rect::new(self.anchor.x, self.anchor.y, self.width, self.height)
    }
}

/// Draw state of the marker.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DrawState {
    /// No rectangle in progress.
    #[default]
    Idle,
    /// A rectangle follows the pointer.
    Drawing(DraftRegion),
}

/// Tunables for the marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// A draft must exceed this size on both axes to be kept.
    pub min_drag: f64,
}

impl MarkerConfig {
    /// Default minimum drag in pixels.
    pub const DEFAULT_MIN_DRAG: f64 = 10.0;

    /// Check that `min_drag` is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::InvalidConfig`].
    pub fn validate(&self) -> Result<(), CalibrateError> {
        if !self.min_drag.is_finite() || self.min_drag < 0.0 {
            return Err(CalibrateError::InvalidConfig(format!(
                "min_drag must be a non-negative number, got {}",
                self.min_drag
            )));
        }
        Ok(())
    }

    /// Replace an out-of-range `min_drag` with the default.
    #[must_use]
    pub fn sanitized(self) -> Self {
        if self.min_drag.is_finite() && self.min_drag >= 0.0 {
            self
        } else {
            tracing::warn!(min_drag = self.min_drag, "invalid min_drag, using default");
            Self::default()
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            min_drag: Self::DEFAULT_MIN_DRAG,
        }
    }
}

/// Interactive region editor.
///
/// Drawing before [`load`](Self::load) is a no-op.
#[derive(Debug, Clone, Default)]
pub struct RegionMarker {
    config: MarkerConfig,
    dimensions: Option<Dimensions>,
    regions: Vec<Region>,
    active_type: RegionType,
    draw: DrawState,
}

impl RegionMarker {
    /// Create an empty marker. An invalid config falls back to the
    /// default.
    #[must_use]
    pub fn new(config: MarkerConfig) -> Self {
        Self {
            config: config.sanitized(),
            ..Self::default()
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &MarkerConfig {
        &self.config
    }

    /// Start calibrating a template of the given natural size.
    ///
    /// Discards any previous regions.
    pub fn load(&mut self, dimensions: Dimensions) {
        self.reset();
        self.dimensions = Some(dimensions);
        tracing::debug!(%dimensions, "marker loaded template");
    }

    /// Clear everything so a different template can be loaded.
    pub fn reset(&mut self) {
        self.dimensions = None;
        self.regions.clear();
        self.active_type = RegionType::Mcq;
        self.draw = DrawState::Idle;
    }

    /// Template dimensions, once loaded.
    #[must_use]
    pub const fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    /// Committed regions in insertion order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// The in-progress rectangle, if any.
    #[must_use]
    pub const fn draft(&self) -> Option<&DraftRegion> {
        match &self.draw {
            DrawState::Drawing(draft) => Some(draft),
            DrawState::Idle => None,
        }
    }

    /// Current draw state.
    #[must_use]
    pub const fn draw_state(&self) -> &DrawState {
        &self.draw
    }

    /// Type the next draw will produce.
    #[must_use]
    pub const fn active_type(&self) -> RegionType {
        self.active_type
    }

    /// Whether the multiple-choice region exists.
    #[must_use]
    pub fn has_mcq(&self) -> bool {
        self.regions.iter().any(|r| r.region_type == RegionType::Mcq)
    }

    /// Number of written regions currently in the list.
    #[must_use]
    pub fn written_count(&self) -> usize {
        self.regions
            .iter()
            .filter(|r| r.region_type == RegionType::Written)
            .count()
    }

    /// Whether switching to [`RegionType::Mcq`] would be accepted.
    #[must_use]
    pub fn can_select_mcq(&self) -> bool {
        !self.has_mcq()
    }

    /// What the next draw will mark, for the status line.
    #[must_use]
    pub fn active_label(&self) -> String {
        match self.active_type {
            RegionType::Mcq => "MCQ Section".to_owned(),
            RegionType::Written => format!("Written Question {}", self.written_count() + 1),
        }
    }

    /// Switch the type used by the next draw.
    ///
    /// Refused when asking for [`RegionType::Mcq`] while one already
    /// exists. Returns whether the mode changed.
    pub fn set_active_type(&mut self, region_type: RegionType) -> bool {
        if region_type == RegionType::Mcq && self.has_mcq() {
            return false;
        }
        let changed = self.active_type != region_type;
        self.active_type = region_type;
        changed
    }

    /// Start a zero-size draft at `point`.
    ///
    /// Ignored before load or while another draft is active. Returns
    /// whether a draft started.
    pub fn begin_draw(&mut self, point: Point) -> bool {
        if self.dimensions.is_none() || self.draw != DrawState::Idle {
            return false;
        }
        self.draw = DrawState::Drawing(DraftRegion {
            anchor: point,
            width: 0.0,
            height: 0.0,
            region_type: self.active_type,
        });
        true
    }

    /// Stretch the draft so its far corner sits at `point`.
    ///
    /// Not clamped to the image. Returns whether a draft moved.
    pub fn update_draw(&mut self, point: Point) -> bool {
        let DrawState::Drawing(draft) = &mut self.draw else {
            return false;
        };
        draft.width = point.x - draft.anchor.x;
        draft.height = point.y - draft.anchor.y;
        true
    }

    /// Finish the draft.
    ///
    /// Returns `Ok(Some(index))` for a committed region and `Ok(None)`
    /// when there was no draft or it was too small on either axis.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::DuplicateMcq`] when the draft is a
    /// multiple-choice region and one already exists. The draft is
    /// discarded either way.
    pub fn end_draw(&mut self) -> Result<Option<usize>, CalibrateError> {
        let DrawState::Drawing(draft) = std::mem::take(&mut self.draw) else {
            return Ok(None);
        };
        let min = self.config.min_drag;
        if draft.width.abs() <= min || draft.height.abs() <= min {
            tracing::debug!(
                width = draft.width,
                height = draft.height,
                "draft below minimum size, discarded"
            );
            return Ok(None);
        }
        if draft.region_type == RegionType::Mcq && self.has_mcq() {
            tracing::debug!("second mcq region rejected");
            return Err(CalibrateError::DuplicateMcq);
        }

        let question_id = match draft.region_type {
            RegionType::Mcq => MCQ_QUESTION_ID.to_owned(),
            RegionType::Written => (self.written_count() + 1).to_string(),
        };
        let r = draft.rect().normalized();
        self.regions.push(Region {
            question_id,
            region_type: draft.region_type,
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        });
        if draft.region_type == RegionType::Mcq {
            self.active_type = RegionType::Written;
        }
        let index = self.regions.len() - 1;
        tracing::debug!(
            index,
            question_id = %self.regions[index].question_id,
            region_type = %draft.region_type,
            "region committed"
        );
        Ok(Some(index))
    }

    /// Drop the draft without committing it.
    pub fn cancel_draw(&mut self) -> bool {
        std::mem::take(&mut self.draw) != DrawState::Idle
    }

    /// Remove the region at `index`.
    ///
    /// Remaining written regions keep their question ids.
    pub fn delete_region(&mut self, index: usize) -> Option<Region> {
        if index >= self.regions.len() {
            return None;
        }
        let removed = self.regions.remove(index);
        tracing::debug!(index, question_id = %removed.question_id, "region deleted");
        Some(removed)
    }

    /// Route a unified pointer event.
    ///
    /// Returns whether the state changed.
    ///
    /// # Errors
    ///
    /// Propagates the rejection from [`end_draw`](Self::end_draw).
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<bool, CalibrateError> {
        match event {
            PointerEvent::Down(p) => Ok(self.begin_draw(p)),
            PointerEvent::Move(p) => Ok(self.update_draw(p)),
            PointerEvent::Up => {
                let was_drawing = self.draft().is_some();
                self.end_draw()?;
                Ok(was_drawing)
            }
            PointerEvent::Cancel => Ok(self.cancel_draw()),
        }
    }

    /// Build the persistence payload.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrateError::NoRegions`] for an empty list,
    /// [`CalibrateError::MissingMcq`] without a multiple-choice region,
    /// or [`CalibrateError::NoImage`] if no template is loaded.
    pub fn save(&self) -> Result<RegionPayload, CalibrateError> {
        if self.regions.is_empty() {
            return Err(CalibrateError::NoRegions);
        }
        if !self.has_mcq() {
            return Err(CalibrateError::MissingMcq);
        }
        let dimensions = self.dimensions.ok_or(CalibrateError::NoImage)?;
        let payload = RegionPayload::from_regions(dimensions, &self.regions);
        tracing::info!(regions = payload.regions.len(), "regions saved");
        Ok(payload)
    }

    /// Draw commands for the current state.
    ///
    /// Empty when nothing is loaded.
    #[must_use]
    pub fn render(&self, style: &RenderStyle) -> Vec<DrawCommand> {
        if self.dimensions.is_none() {
            return Vec::new();
        }
        let mut cmds = vec![DrawCommand::Clear, DrawCommand::Image];
        push_region_commands(&mut cmds, &self.regions, style);
        if let Some(draft) = self.draft() {
            cmds.push(DrawCommand::StrokeRect {
                rect: draft.rect(),
                color: style.draft,
                width: style.region_stroke_width,
                dash: Some(style.draft_dash),
            });
        }
        cmds
    }
}

/// Append the outline, tag and label commands for committed regions.
///
/// Shared by [`RegionMarker::render`] and headless previews of a saved
/// payload.
pub fn push_region_commands(cmds: &mut Vec<DrawCommand>, regions: &[Region], style: &RenderStyle) {
    for region in regions {
        let color = match region.region_type {
            RegionType::Mcq => style.mcq,
            RegionType::Written => style.written,
        };
        cmds.push(DrawCommand::StrokeRect {
            rect: region.rect(),
            color,
            width: style.region_stroke_width,
            dash: None,
        });
        cmds.push(DrawCommand::FillRect {
            rect: Rect::new(
                region.x,
                region.y - style.tag_height,
                style.tag_width,
                style.tag_height,
            ),
            color,
        });
        cmds.push(DrawCommand::Text {
            text: region.label(),
            position: Point::new(region.x + 5.0, region.y - 10.0),
            color: style.tag_text,
            size: style.tag_label_size,
            align: TextAlign::Baseline,
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn marker() -> RegionMarker {
        let mut m = RegionMarker::new(MarkerConfig::default());
        m.load(Dimensions::new(1000, 800));
        m
    }

    fn drag(
        m: &mut RegionMarker,
        from: (f64, f64),
        to: (f64, f64),
    ) -> Result<Option<usize>, CalibrateError> {
        assert!(m.begin_draw(Point::new(from.0, from.1)));
        m.update_draw(Point::new(to.0, to.1));
        m.end_draw()
    }

    fn ids(m: &RegionMarker) -> Vec<&str> {
        m.regions().iter().map(|r| r.question_id.as_str()).collect()
    }

    #[test]
    fn mcq_region_commits_and_switches_to_written() {
        let mut m = marker();
        assert_eq!(drag(&mut m, (100.0, 100.0), (300.0, 150.0)).unwrap(), Some(0));
        assert_eq!(
            m.regions()[0],
            Region {
                question_id: "all".into(),
                region_type: RegionType::Mcq,
                x: 100.0,
                y: 100.0,
                width: 200.0,
                height: 50.0,
            }
        );
        assert_eq!(m.active_type(), RegionType::Written);
        assert_eq!(m.active_label(), "Written Question 1");
    }

    #[test]
    fn second_mcq_is_refused() {
        let mut m = marker();
        drag(&mut m, (100.0, 100.0), (300.0, 150.0)).unwrap();
        assert!(!m.set_active_type(RegionType::Mcq));
        assert_eq!(m.active_type(), RegionType::Written);
        assert!(!m.can_select_mcq());
    }

    #[test]
    fn duplicate_mcq_captured_at_begin_is_rejected_at_end() {
        let mut m = marker();
        // Start an mcq draft before any mcq exists.
        assert!(m.begin_draw(Point::new(10.0, 10.0)));
        m.update_draw(Point::new(50.0, 50.0));
        // Another mcq appears mid-drag.
        m.regions.push(Region {
            question_id: "all".into(),
            region_type: RegionType::Mcq,
            x: 100.0,
            y: 100.0,
            width: 200.0,
            height: 50.0,
        });
        assert!(matches!(m.end_draw(), Err(CalibrateError::DuplicateMcq)));
        assert_eq!(m.regions().len(), 1);
        assert!(m.draft().is_none());
    }

    #[test]
    fn negative_drag_is_normalized() {
        let mut m = marker();
        drag(&mut m, (300.0, 150.0), (100.0, 100.0)).unwrap();
        assert_eq!(m.regions()[0].rect(), Rect::new(100.0, 100.0, 200.0, 50.0));
    }

    #[test]
    fn small_drags_are_discarded() {
        let mut m = marker();
        for (to_x, to_y) in [(110.0, 200.0), (200.0, 110.0), (90.0, 90.0), (100.0, 100.0)] {
            assert_eq!(drag(&mut m, (100.0, 100.0), (to_x, to_y)).unwrap(), None);
            assert!(m.regions().is_empty());
        }
        assert_eq!(m.active_type(), RegionType::Mcq);
    }

    #[test]
    fn written_regions_are_not_renumbered() {
        let mut m = marker();
        m.set_active_type(RegionType::Written);
        for i in 0..3 {
            let y = f64::from(i).mul_add(100.0, 100.0);
            drag(&mut m, (50.0, y), (400.0, y + 50.0)).unwrap();
        }
        assert_eq!(ids(&m), ["1", "2", "3"]);
        m.delete_region(1);
        assert_eq!(ids(&m), ["1", "3"]);
        // The next written region counts what is left.
        drag(&mut m, (50.0, 600.0), (400.0, 650.0)).unwrap();
        assert_eq!(ids(&m), ["1", "3", "3"]);
    }

    #[test]
    fn deleting_mcq_allows_a_new_one() {
        let mut m = marker();
        drag(&mut m, (100.0, 100.0), (300.0, 150.0)).unwrap();
        let removed = m.delete_region(0).unwrap();
        assert_eq!(removed.region_type, RegionType::Mcq);
        assert!(m.can_select_mcq());
        assert!(m.set_active_type(RegionType::Mcq));
        drag(&mut m, (10.0, 10.0), (50.0, 50.0)).unwrap();
        let mcqs = m
            .regions()
            .iter()
            .filter(|r| r.region_type == RegionType::Mcq)
            .count();
        assert_eq!(mcqs, 1);
    }

    #[test]
    fn delete_out_of_range_is_none() {
        let mut m = marker();
        assert!(m.delete_region(0).is_none());
    }

    #[test]
    fn save_requires_regions_and_mcq() {
        let mut m = marker();
        assert!(matches!(m.save(), Err(CalibrateError::NoRegions)));
        m.set_active_type(RegionType::Written);
        drag(&mut m, (50.0, 50.0), (400.0, 100.0)).unwrap();
        assert!(matches!(m.save(), Err(CalibrateError::MissingMcq)));
        m.set_active_type(RegionType::Mcq);
        drag(&mut m, (100.4, 199.6), (300.4, 250.0)).unwrap();
        let payload = m.save().unwrap();
        assert_eq!((payload.image_width, payload.image_height), (1000, 800));
        assert_eq!(payload.regions.len(), 2);
        let mcq = &payload.regions[1];
        assert_eq!((mcq.x, mcq.y, mcq.width, mcq.height), (100, 200, 200, 50));
    }

    #[test]
    fn cancel_discards_draft() {
        let mut m = marker();
        m.handle_pointer(PointerEvent::Down(Point::new(100.0, 100.0))).unwrap();
        m.handle_pointer(PointerEvent::Move(Point::new(300.0, 300.0))).unwrap();
        assert!(m.handle_pointer(PointerEvent::Cancel).unwrap());
        assert!(m.regions().is_empty());
        assert!(m.draft().is_none());
    }

    #[test]
    fn pointer_sequence_commits() {
        let mut m = marker();
        assert!(m.handle_pointer(PointerEvent::Down(Point::new(100.0, 100.0))).unwrap());
        assert!(!m.handle_pointer(PointerEvent::Down(Point::new(5.0, 5.0))).unwrap());
        m.handle_pointer(PointerEvent::Move(Point::new(300.0, 150.0))).unwrap();
        assert!(m.handle_pointer(PointerEvent::Up).unwrap());
        assert_eq!(m.regions()[0].rect(), Rect::new(100.0, 100.0, 200.0, 50.0));
        assert!(!m.handle_pointer(PointerEvent::Up).unwrap());
    }

    #[test]
    fn nothing_happens_before_load() {
        let mut m = RegionMarker::default();
        assert!(!m.begin_draw(Point::new(1.0, 1.0)));
        assert!(!m.update_draw(Point::new(100.0, 100.0)));
        assert_eq!(m.end_draw().unwrap(), None);
        assert!(m.render(&RenderStyle::default()).is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let mut m = marker();
        drag(&mut m, (100.0, 100.0), (300.0, 150.0)).unwrap();
        m.reset();
        assert!(m.regions().is_empty());
        assert_eq!(m.dimensions(), None);
        assert_eq!(m.active_type(), RegionType::Mcq);
        assert_eq!(m.active_label(), "MCQ Section");
    }

    #[test]
    fn render_tags_regions_and_dashes_draft() {
        let mut m = marker();
        let style = RenderStyle::default();
        drag(&mut m, (100.0, 100.0), (300.0, 150.0)).unwrap();
        drag(&mut m, (100.0, 300.0), (300.0, 350.0)).unwrap();
        m.begin_draw(Point::new(500.0, 500.0));
        m.update_draw(Point::new(450.0, 480.0));

        let cmds = m.render(&style);
        assert_eq!(&cmds[..2], &[DrawCommand::Clear, DrawCommand::Image]);
        let labels: Vec<&str> = cmds
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, ["MCQ Section (All)", "Written Q1"]);
        assert_eq!(
            cmds[3],
            DrawCommand::FillRect {
                rect: Rect::new(100.0, 70.0, 180.0, 30.0),
                color: style.mcq,
            }
        );
        assert_eq!(
            cmds.last(),
            Some(&DrawCommand::StrokeRect {
                rect: Rect::new(500.0, 500.0, -50.0, -20.0),
                color: style.draft,
                width: 3.0,
                dash: Some([5.0, 5.0]),
            })
        );
    }

    #[test]
    fn region_commands_match_editor_render() {
        let style = RenderStyle::default();
        let mut m = marker();
        drag(&mut m, (100.0, 100.0), (300.0, 150.0)).unwrap();
        drag(&mut m, (100.0, 300.0), (300.0, 350.0)).unwrap();

        let mut cmds = vec![DrawCommand::Clear, DrawCommand::Image];
        push_region_commands(&mut cmds, m.regions(), &style);
        assert_eq!(cmds, m.render(&style));
        assert_eq!(cmds.len(), 2 + 3 * 2);
    }

    #[test]
    fn config_validation() {
        assert!(MarkerConfig::default().validate().is_ok());
        assert!(MarkerConfig { min_drag: f64::NAN }.validate().is_err());
        assert!(MarkerConfig { min_drag: -1.0 }.validate().is_err());
    }

    #[test]
    fn nan_min_drag_falls_back_to_default() {
        let mut m = RegionMarker::new(MarkerConfig { min_drag: f64::NAN });
        assert_eq!(m.config(), &MarkerConfig::default());
        m.load(Dimensions::new(1000, 800));
        assert_eq!(drag(&mut m, (100.0, 100.0), (105.0, 300.0)).unwrap(), None);
        assert!(m.regions().is_empty());
    }
}
