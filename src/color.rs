use std::collections::HashMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

/// Hue sweep for category colours: blue through teal to yellow-green.
const HUE_START: f32 = 260.0;
const HUE_SPAN: f32 = 180.0;

/// `n` colours stepping along one hue sweep, so neighbouring bars read as a
/// sequence rather than unrelated categories.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    let step = if n == 0 { 0.0 } else { HUE_SPAN / n as f32 };
    (0..n).map(|i| hue_to_color32(HUE_START - i as f32 * step)).collect()
}

fn hue_to_color32(hue: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, 0.65, 0.5).into_color();
    let rgb = rgb.into_format::<u8>();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

/// Colour per category label of a single chart, in display order.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    by_label: HashMap<String, Color32>,
}

impl ColorMap {
    pub fn new(labels: &[String]) -> Self {
        let by_label = labels
            .iter()
            .cloned()
            .zip(generate_palette(labels.len()))
            .collect();
        Self { by_label }
    }

    /// Unknown labels fall back to light blue.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.by_label.get(label).copied().unwrap_or(Color32::LIGHT_BLUE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_distinct() {
        let colors = generate_palette(5);
        assert_eq!(colors.len(), 5);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn test_color_map_falls_back_for_unknown_label() {
        let map = ColorMap::new(&["ATL".to_string(), "ORD".to_string()]);
        assert_ne!(map.color_for("ATL"), map.color_for("ORD"));
        assert_eq!(map.color_for("JFK"), Color32::LIGHT_BLUE);
    }
}
