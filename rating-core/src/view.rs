use crate::{Scale, Tick};
use serde::{Deserialize, Serialize};

/// Sizing and colour options. They affect only how the scale looks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualOptions {
    #[serde(alias = "widthPx")]
    pub width_px: u32,
    #[serde(alias = "trackHeightPx")]
    pub track_height_px: u32,
    #[serde(alias = "blockBg")]
    pub block_bg: String,
}

impl Default for VisualOptions {
    fn default() -> Self {
        Self {
            width_px: 980,
            track_height_px: 34,
            block_bg: "#A3A3A3".to_string(),
        }
    }
}

/// Text shown under the track.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleLabels {
    /// One label at each end of the track.
    Anchors { left: String, right: String },
    /// One label under every tick, in tick order.
    PerTick(Vec<String>),
}

impl ScaleLabels {
    /// Per-tick labels replace the anchors when a non-empty list is given.
    /// The list is cut or padded with empty strings to one label per tick.
    pub fn reconcile(
        scale: &Scale,
        left: &str,
        right: &str,
        tick_labels: Option<&[String]>,
    ) -> Self {
        match tick_labels {
            Some(labels) if !labels.is_empty() => {
                let n = scale.point_count() as usize;
                if labels.len() != n {
                    log::debug!(
                        "[confidence-rating] {} tick labels supplied for {} points; adjusting",
                        labels.len(),
                        n
                    );
                }
                let mut labels: Vec<String> = labels.iter().take(n).cloned().collect();
                labels.resize(n, String::new());
                ScaleLabels::PerTick(labels)
            }
            _ => ScaleLabels::Anchors {
                left: left.to_string(),
                right: right.to_string(),
            },
        }
    }
}

/// Everything a display needs to draw one frame of the scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleView {
    pub prompt: String,
    pub labels: ScaleLabels,
    pub scale: Scale,
    /// Selected tick, or `None` while the thumb is hidden.
    pub thumb: Option<Tick>,
    pub submit_enabled: bool,
    pub button_label: String,
    pub visual: VisualOptions,
}

/// Surface a trial session is mounted on.
pub trait DisplayTarget {
    /// Drawn length of the track, in the same units as pointer offsets.
    fn track_length(&self) -> f64;

    fn present(&mut self, view: &ScaleView);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn anchors_without_tick_labels() {
        let scale = Scale::new(4, true);
        assert_eq!(
            ScaleLabels::reconcile(&scale, "Guessing", "Certain", None),
            ScaleLabels::Anchors {
                left: "Guessing".into(),
                right: "Certain".into()
            }
        );
        assert!(matches!(
            ScaleLabels::reconcile(&scale, "a", "b", Some(&[][..])),
            ScaleLabels::Anchors { .. }
        ));
    }

    #[test]
    fn tick_labels_are_padded() {
        let scale = Scale::new(4, true);
        let given = labels(&["low", "<b>high</b>"]);
        assert_eq!(
            ScaleLabels::reconcile(&scale, "l", "r", Some(given.as_slice())),
            ScaleLabels::PerTick(labels(&["low", "<b>high</b>", "", ""]))
        );
    }

    #[test]
    fn tick_labels_are_truncated() {
        let scale = Scale::new(2, true);
        let given = labels(&["a", "b", "c"]);
        assert_eq!(
            ScaleLabels::reconcile(&scale, "l", "r", Some(given.as_slice())),
            ScaleLabels::PerTick(labels(&["a", "b"]))
        );
    }

    #[test]
    fn visual_options_accept_both_key_styles() {
        let snake: VisualOptions =
            serde_json::from_str(r#"{"width_px": 600, "track_height_px": 40}"#).unwrap();
        let camel: VisualOptions =
            serde_json::from_str(r##"{"widthPx": 600, "blockBg": "#ffffff"}"##).unwrap();
        assert_eq!(snake.width_px, 600);
        assert_eq!(snake.track_height_px, 40);
        assert_eq!(snake.block_bg, "#A3A3A3");
        assert_eq!(camel.width_px, 600);
        assert_eq!(camel.block_bg, "#ffffff");
    }
}
