use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Likert ramp
// ---------------------------------------------------------------------------

fn hsl_to_color32(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Ordered red → green ramp for Likert answer columns, so "strongly
/// disagree" and "strongly agree" end up on opposite ends.
pub fn likert_palette(n: usize) -> Vec<Color32> {
    match n {
        0 => Vec::new(),
        1 => vec![hsl_to_color32(210.0, 0.6, 0.5)],
        _ => (0..n)
            .map(|i| hsl_to_color32(i as f32 / (n - 1) as f32 * 120.0, 0.65, 0.5))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Series colours: series label → Color32
// ---------------------------------------------------------------------------

/// Stable colours for the series of the diverging chart and its legend.
#[derive(Debug, Clone)]
pub struct SeriesColors {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl SeriesColors {
    /// Red for the left category, blue for the right one.
    pub fn pair(left: &str, right: &str) -> Self {
        let mapping = BTreeMap::from([
            (left.to_string(), Color32::from_rgb(214, 96, 77)),
            (right.to_string(), Color32::from_rgb(67, 147, 195)),
        ]);
        SeriesColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given series label.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping
            .get(label)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_colours_each_side_and_greys_the_rest() {
        let colors = SeriesColors::pair("No", "Yes");
        assert_eq!(colors.color_for("No"), Color32::from_rgb(214, 96, 77));
        assert_eq!(colors.color_for("Yes"), Color32::from_rgb(67, 147, 195));
        assert_eq!(colors.color_for("Maybe"), Color32::GRAY);
    }

    #[test]
    fn likert_ramp_runs_red_to_green() {
        assert!(likert_palette(0).is_empty());
        let ramp = likert_palette(4);
        assert_eq!(ramp.len(), 4);
        assert!(ramp[0].r() > ramp[0].g());
        assert!(ramp[3].g() > ramp[3].r());
    }
}
