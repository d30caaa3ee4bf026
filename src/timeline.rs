//! Daily color timeline built from solar markers.
//!
//! A [`Timeline`] is a sorted, wrap-closed list of anchors. Colors between
//! anchors are linearly interpolated per channel; the segment after the last
//! anchor connects back to the first anchor of the next day.

use crate::palette::{AnchorSpec, DEFAULT_PALETTE};
use crate::solar::SolarMarkers;

/// Returned when a timeline has no anchors at all.
pub const NEUTRAL_GRAY: Color = Color::new(128, 128, 128);

/// Label returned when a timeline has no anchors at all.
pub const UNKNOWN_PERIOD: &str = "Unknown";

/// 8-bit RGB color.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Mean of the three channels.
    pub fn brightness(&self) -> u8 {
        ((u16::from(self.r) + u16::from(self.g) + u16::from(self.b)) / 3) as u8
    }
}

/// One vertex of the piecewise-linear color curve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AnchorPoint {
    /// Hour of day in `[0, 24)` once part of a timeline.
    pub hour: f64,
    pub color: Color,
    pub label: &'static str,
}

/// Sorted anchors for one calendar day.
#[derive(Clone, Debug, PartialEq)]
pub struct Timeline {
    anchors: Vec<AnchorPoint>,
}

impl Timeline {
    /// Build the day's timeline from the default palette.
    pub fn build(markers: &SolarMarkers) -> Self {
        Self::from_palette(markers, DEFAULT_PALETTE)
    }

    /// Build a timeline from an arbitrary anchor table.
    pub fn from_palette(markers: &SolarMarkers, palette: &[AnchorSpec]) -> Self {
        let anchors = palette
            .iter()
            .map(|spec| AnchorPoint {
                hour: spec.hour(markers),
                color: spec.color,
                label: spec.label,
            })
            .collect();
        Self::from_anchors(anchors)
    }

    /// Normalize anchor hours into `[0, 24)` and sort them.
    ///
    /// The sort is stable, so anchors landing on the same hour keep the order
    /// they were given in.
    pub fn from_anchors(mut anchors: Vec<AnchorPoint>) -> Self {
        for anchor in &mut anchors {
            anchor.hour = normalize_hour(anchor.hour);
        }
        anchors.sort_by(|a, b| a.hour.total_cmp(&b.hour));
        Self { anchors }
    }

    pub fn anchors(&self) -> &[AnchorPoint] {
        &self.anchors
    }

    /// Interpolated color at `hour`. Any finite hour is accepted.
    pub fn color_at(&self, hour: f64) -> Color {
        let (Some(first), Some(last)) = (self.anchors.first(), self.anchors.last()) else {
            return NEUTRAL_GRAY;
        };
        let hour = normalize_hour(hour);

        for pair in self.anchors.windows(2) {
            let (start, end) = (&pair[0], &pair[1]);
            if start.hour <= hour && hour <= end.hour {
                let progress = segment_progress(hour, start.hour, end.hour);
                return lerp_color(start.color, end.color, progress);
            }
        }

        // Wrap segment: last anchor to the first anchor of the next day.
        let hour = if hour < first.hour { hour + 24.0 } else { hour };
        let progress = segment_progress(hour, last.hour, first.hour + 24.0);
        lerp_color(last.color, first.color, progress)
    }

    /// Label of the segment containing `hour`.
    ///
    /// The lower anchor of a segment names it; labels never blend. Past the
    /// last anchor (and before the first) the last anchor's label applies.
    pub fn period_at(&self, hour: f64) -> &'static str {
        let Some(last) = self.anchors.last() else {
            return UNKNOWN_PERIOD;
        };
        let hour = normalize_hour(hour);
        self.anchors
            .iter()
            .rposition(|anchor| anchor.hour <= hour)
            .map_or(last.label, |idx| self.anchors[idx].label)
    }
}

/// Map any finite hour into `[0, 24)`. Non-finite hours map to midnight.
pub fn normalize_hour(hour: f64) -> f64 {
    if !hour.is_finite() {
        return 0.0;
    }
    let wrapped = hour.rem_euclid(24.0);
    // rem_euclid rounds tiny negatives up to exactly 24.0.
    if wrapped >= 24.0 { 0.0 } else { wrapped }
}

fn segment_progress(hour: f64, start: f64, end: f64) -> f64 {
    let span = end - start;
    if span > 0.0 {
        (hour - start) / span
    } else {
        0.0
    }
}

fn lerp_color(start: Color, end: Color, progress: f64) -> Color {
    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    Color {
        r: lerp_channel(start.r, end.r, progress),
        g: lerp_channel(start.g, end.g, progress),
        b: lerp_channel(start.b, end.b, progress),
    }
}

fn lerp_channel(start: u8, end: u8, progress: f64) -> u8 {
    let start = f64::from(start);
    let value = start + (f64::from(end) - start) * progress;
    value.round().clamp(0.0, 255.0) as u8
}
