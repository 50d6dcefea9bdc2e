use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::kpi::{COMPLETED_STATUS, DISCONTINUED_STATUSES};

// ---------------------------------------------------------------------------
// HSL helper
// ---------------------------------------------------------------------------

fn hsl_color(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Status colours: status group → Color32
// ---------------------------------------------------------------------------

/// Colours for the status-group labels in pickers and the preview table.
///
/// Completed trials are always green and discontinued ones always red; the
/// remaining groups share the hues in between.
#[derive(Debug, Clone, Default)]
pub struct StatusColors {
    mapping: BTreeMap<String, Color32>,
}

impl StatusColors {
    pub fn new(statuses: &BTreeSet<String>) -> Self {
        let others: Vec<&String> = statuses.iter().filter(|s| !is_fixed(s)).collect();
        // Hues from amber to violet, away from the fixed green and red.
        let step = if others.is_empty() {
            0.0
        } else {
            200.0 / others.len() as f32
        };

        let mut mapping = BTreeMap::new();
        for s in statuses {
            if s == COMPLETED_STATUS {
                mapping.insert(s.clone(), hsl_color(130.0, 0.6, 0.45));
            } else if DISCONTINUED_STATUSES.contains(&s.as_str()) {
                mapping.insert(s.clone(), hsl_color(0.0, 0.7, 0.55));
            }
        }
        for (i, s) in others.into_iter().enumerate() {
            let hue = 40.0 + step * i as f32;
            mapping.insert(s.clone(), hsl_color(hue, 0.7, 0.6));
        }

        Self { mapping }
    }

    /// Look up the colour for a status group; absent or unknown values are grey.
    pub fn color_for(&self, status: Option<&str>) -> Color32 {
        status
            .and_then(|s| self.mapping.get(s))
            .copied()
            .unwrap_or(Color32::GRAY)
    }
}

fn is_fixed(status: &str) -> bool {
    status == COMPLETED_STATUS || DISCONTINUED_STATUSES.contains(&status)
}
