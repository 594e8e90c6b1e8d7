use egui::Color32;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Clone)]
pub struct UiSettings {
    pub ui_scale: f32,

    // Notice kind → color mapping (extensible)
    pub notice_colors: HashMap<String, [u8; 4]>,
}

impl Default for UiSettings {
    fn default() -> Self {
        let mut notice_colors = HashMap::new();

        notice_colors.insert("Info".into(), [40, 70, 120, 255]);
        notice_colors.insert("Success".into(), [40, 110, 60, 255]);
        notice_colors.insert("Warning".into(), [150, 100, 30, 255]);
        notice_colors.insert("Error".into(), [140, 40, 40, 255]);

        Self {
            ui_scale: 1.0,
            notice_colors,
        }
    }
}

impl UiSettings {
    pub fn color(&self, key: &str) -> Color32 {
        self.notice_colors
            .get(key)
            .map(|c| Color32::from_rgba_unmultiplied(c[0], c[1], c[2], c[3]))
            .unwrap_or(Color32::DARK_GRAY)
    }
}
