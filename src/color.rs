use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues,
/// starting from `hue_offset` degrees.
pub fn generate_palette(n: usize, hue_offset: f32) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = hue_offset + (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
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
// Plot series colours
// ---------------------------------------------------------------------------

/// Colours of the J–V plot series.
#[derive(Debug, Clone, Copy)]
pub struct SeriesColors {
    pub jv_curve: Color32,
    pub power_curve: Color32,
    pub jsc_marker: Color32,
    pub voc_marker: Color32,
    pub mpp_marker: Color32,
    pub axes: Color32,
}

impl Default for SeriesColors {
    fn default() -> Self {
        // Blue first, like the classic J–V plot trace.
        let p = generate_palette(4, 220.0);
        Self {
            jv_curve: p[0],
            power_curve: p[1],
            jsc_marker: p[2],
            voc_marker: p[3],
            mpp_marker: Color32::from_rgb(200, 30, 30),
            axes: Color32::GRAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let p = generate_palette(4, 220.0);
        assert_eq!(p.len(), 4);
        for (i, a) in p.iter().enumerate() {
            for b in &p[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0, 0.0).is_empty());
    }

    #[test]
    fn jv_curve_is_blue() {
        let c = SeriesColors::default().jv_curve;
        assert!(c.b() > c.r() && c.b() > c.g(), "{c:?}");
    }
}
