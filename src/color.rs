use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = 210.0 + (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.70, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Segment → Color32
// ---------------------------------------------------------------------------

/// Stable colour per segment label, shared by every chart so a segment
/// keeps its colour when switching views.
#[derive(Debug, Clone, Default)]
pub struct SegmentColors {
    mapping: BTreeMap<String, Color32>,
}

impl SegmentColors {
    pub fn new(segments: &BTreeSet<String>) -> Self {
        let palette = generate_palette(segments.len());
        let mapping = segments.iter().cloned().zip(palette).collect();
        SegmentColors { mapping }
    }

    pub fn color_for(&self, segment: &str) -> Color32 {
        self.mapping.get(segment).copied().unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_size_and_distinctness() {
        let p = generate_palette(4);
        assert_eq!(p.len(), 4);
        let unique: BTreeSet<_> = p.iter().map(|c| c.to_array()).collect();
        assert_eq!(unique.len(), 4);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn unknown_segment_is_gray() {
        let segments: BTreeSet<String> = ["Desktop", "Mobile"].iter().map(|s| s.to_string()).collect();
        let colors = SegmentColors::new(&segments);
        assert_ne!(colors.color_for("Mobile"), colors.color_for("Desktop"));
        assert_eq!(colors.color_for("Tablet"), Color32::GRAY);
    }
}
