//! Declarative anchor table for the daily color timeline.
//!
//! Each entry places one anchor relative to a solar marker. Entries with a
//! floor are clamped to at least that clock hour, which keeps morning anchors
//! from bunching together when sunrise comes very early.

use crate::solar::SolarMarkers;
use crate::timeline::Color;

/// The solar marker an anchor is measured from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Marker {
    /// Fixed clock time; the offset is the hour itself.
    Midnight,
    Sunrise,
    SolarNoon,
    Sunset,
    CivilTwilightEnd,
}

impl Marker {
    /// Resolve the marker to an hour for the given day.
    pub fn hour(self, markers: &SolarMarkers) -> f64 {
        let hour = match self {
            Marker::Midnight => 0.0,
            Marker::Sunrise => markers.sunrise,
            Marker::SolarNoon => markers.solar_noon,
            Marker::Sunset => markers.sunset,
            Marker::CivilTwilightEnd => markers.civil_twilight_end,
        };
        if hour.is_finite() { hour } else { 0.0 }
    }
}

/// One row of the anchor table.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AnchorSpec {
    pub base: Marker,
    pub offset: f64,
    /// Earliest clock hour this anchor may sit at.
    pub floor: Option<f64>,
    pub color: Color,
    pub label: &'static str,
}

impl AnchorSpec {
    const fn at(base: Marker, offset: f64, color: Color, label: &'static str) -> Self {
        Self {
            base,
            offset,
            floor: None,
            color,
            label,
        }
    }

    const fn floored(
        base: Marker,
        offset: f64,
        floor: f64,
        color: Color,
        label: &'static str,
    ) -> Self {
        Self {
            base,
            offset,
            floor: Some(floor),
            color,
            label,
        }
    }

    /// Raw (not yet normalized) hour of this anchor for the given day.
    pub fn hour(&self, markers: &SolarMarkers) -> f64 {
        let hour = self.base.hour(markers) + self.offset;
        match self.floor {
            Some(floor) => hour.max(floor),
            None => hour,
        }
    }
}

use Marker::{CivilTwilightEnd, Midnight, SolarNoon, Sunrise, Sunset};

/// Deep night through dawn, day, sunset, twilight and back to night.
pub const DEFAULT_PALETTE: &[AnchorSpec] = &[
    AnchorSpec::at(Midnight, 0.0, Color::new(8, 8, 25), "Deep Night"),
    AnchorSpec::floored(Sunrise, -3.0, 1.0, Color::new(10, 10, 25), "Pre-Dawn"),
    AnchorSpec::floored(Sunrise, -1.5, 2.0, Color::new(15, 15, 45), "Early Dawn"),
    AnchorSpec::floored(Sunrise, -1.0, 3.0, Color::new(25, 15, 65), "Early Dawn"),
    AnchorSpec::floored(Sunrise, -0.5, 4.0, Color::new(50, 30, 65), "Dawn"),
    AnchorSpec::floored(Sunrise, -0.25, 5.0, Color::new(120, 80, 110), "Dawn"),
    AnchorSpec::floored(Sunrise, 0.0, 6.0, Color::new(160, 120, 130), "Sunrise"),
    AnchorSpec::floored(Sunrise, 0.25, 7.0, Color::new(190, 150, 140), "Sunrise"),
    AnchorSpec::floored(Sunrise, 0.5, 8.0, Color::new(210, 180, 160), "Early Morning"),
    AnchorSpec::floored(Sunrise, 1.0, 9.0, Color::new(220, 200, 180), "Early Morning"),
    AnchorSpec::floored(Sunrise, 2.0, 10.0, Color::new(230, 240, 220), "Morning"),
    AnchorSpec::floored(SolarNoon, -1.5, 11.0, Color::new(210, 230, 200), "Late Morning"),
    AnchorSpec::floored(SolarNoon, -1.0, 11.5, Color::new(190, 220, 190), "Late Morning"),
    AnchorSpec::floored(SolarNoon, 0.0, 12.0, Color::new(170, 210, 230), "Noon"),
    AnchorSpec::floored(SolarNoon, 1.0, 13.0, Color::new(170, 210, 230), "Early Afternoon"),
    AnchorSpec::floored(SolarNoon, 1.5, 14.0, Color::new(170, 210, 230), "Early Afternoon"),
    AnchorSpec::floored(Sunset, -2.0, 15.0, Color::new(170, 210, 230), "Late Afternoon"),
    AnchorSpec::at(Sunset, -1.5, Color::new(170, 210, 230), "Late Afternoon"),
    AnchorSpec::at(Sunset, -1.0, Color::new(175, 200, 225), "Pre-Sunset"),
    AnchorSpec::at(Sunset, -0.5, Color::new(180, 195, 220), "Pre-Sunset"),
    AnchorSpec::at(Sunset, 0.0, Color::new(230, 140, 70), "Sunset"),
    AnchorSpec::at(Sunset, 0.1, Color::new(210, 120, 70), "Sunset"),
    AnchorSpec::at(CivilTwilightEnd, -0.35, Color::new(170, 100, 75), "Post-Sunset"),
    AnchorSpec::at(CivilTwilightEnd, -0.25, Color::new(140, 90, 80), "Post-Sunset"),
    AnchorSpec::at(CivilTwilightEnd, -0.15, Color::new(110, 80, 85), "Civil Twilight"),
    AnchorSpec::at(CivilTwilightEnd, -0.05, Color::new(95, 75, 95), "Civil Twilight"),
    AnchorSpec::at(CivilTwilightEnd, 0.0, Color::new(80, 65, 85), "Civil Twilight"),
    AnchorSpec::at(CivilTwilightEnd, 0.1, Color::new(65, 60, 75), "Evening"),
    AnchorSpec::at(CivilTwilightEnd, 0.35, Color::new(65, 55, 70), "Evening"),
    AnchorSpec::at(CivilTwilightEnd, 0.6, Color::new(60, 50, 70), "Evening"),
    AnchorSpec::at(CivilTwilightEnd, 0.85, Color::new(50, 45, 65), "Evening"),
    AnchorSpec::at(CivilTwilightEnd, 1.1, Color::new(45, 40, 65), "Evening"),
    AnchorSpec::at(CivilTwilightEnd, 1.35, Color::new(40, 35, 60), "Evening"),
    AnchorSpec::at(CivilTwilightEnd, 1.6, Color::new(35, 30, 55), "Evening"),
    AnchorSpec::at(CivilTwilightEnd, 1.85, Color::new(32, 28, 52), "Late Evening"),
    AnchorSpec::at(CivilTwilightEnd, 2.35, Color::new(28, 22, 48), "Late Evening"),
    AnchorSpec::at(CivilTwilightEnd, 2.85, Color::new(22, 17, 42), "Late Evening"),
    AnchorSpec::at(CivilTwilightEnd, 3.35, Color::new(15, 12, 35), "Night"),
    AnchorSpec::at(Midnight, 23.99, Color::new(8, 8, 20), "Night"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_wins_over_early_offset() {
        let mut markers = SolarMarkers::fallback();
        markers.sunrise = 4.5;
        let spec = AnchorSpec::floored(Sunrise, 1.0, 9.0, Color::new(0, 0, 0), "x");
        assert_eq!(spec.hour(&markers), 9.0);
        markers.sunrise = 8.5;
        assert_eq!(spec.hour(&markers), 9.5);
    }

    #[test]
    fn non_finite_marker_is_read_as_midnight() {
        let mut markers = SolarMarkers::fallback();
        markers.sunset = f64::NAN;
        assert_eq!(Marker::Sunset.hour(&markers), 0.0);
    }

    #[test]
    fn default_palette_starts_and_ends_at_night() {
        let first = DEFAULT_PALETTE.first().expect("palette is not empty");
        let last = DEFAULT_PALETTE.last().expect("palette is not empty");
        assert_eq!(first.label, "Deep Night");
        assert_eq!(last.label, "Night");
        assert_eq!(DEFAULT_PALETTE.len(), 39);
    }
}
