use rating_core::VisualOptions;

/// Resolved look of the scale. Derived from [`VisualOptions`] alone and
/// holds no interaction state.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleStyle {
    pub background: [u8; 4],
    pub card_width: f32,
    /// Cap on the card width as a fraction of the canvas width.
    pub max_width_fraction: f32,
    pub track_height: f32,
    pub track_radius: f32,
    pub track_fill: [u8; 4],
    pub track_inner_fill: [u8; 4],
    pub track_inset: f32,
    pub outline: [u8; 4],
    pub outline_width: f32,
    pub divider_width: f32,
    pub divider: [u8; 4],
    pub thumb_diameter: f32,
    pub thumb_fill: [u8; 4],
    pub button_fill: [u8; 4],
    pub button_radius: f32,
    pub button_size: (f32, f32),
    pub disabled_opacity: f32,
    pub text: [u8; 4],
    pub text_size: f32,
}

const DEFAULT_BACKGROUND: [u8; 4] = [0xA3, 0xA3, 0xA3, 0xFF];
const INK: [u8; 4] = [0x11, 0x11, 0x11, 0xFF];

impl ScaleStyle {
    pub fn from_options(options: &VisualOptions) -> Self {
        let background = parse_hex_color(&options.block_bg).unwrap_or_else(|| {
            log::warn!(
                "[confidence-rating] Unrecognised background colour {:?}; using default",
                options.block_bg
            );
            DEFAULT_BACKGROUND
        });
        let track_height = options.track_height_px.max(12) as f32;
        let track_radius = (track_height / 2.0).ceil();

        Self {
            background,
            card_width: options.width_px.max(1) as f32,
            max_width_fraction: 0.92,
            track_height,
            track_radius,
            track_fill: [0xD9, 0xD9, 0xD9, 0xFF],
            track_inner_fill: [0xE7, 0xE7, 0xE7, 0xFF],
            track_inset: 3.0,
            outline: INK,
            outline_width: 2.0,
            divider_width: 2.0,
            divider: [INK[0], INK[1], INK[2], (0.8f32 * 255.0) as u8],
            thumb_diameter: track_height - 10.0,
            thumb_fill: [0xFF, 0xFF, 0xFF, 0xFF],
            button_fill: [0xFF, 0xFF, 0xFF, 0xFF],
            button_radius: 12.0,
            button_size: (140.0, 44.0),
            disabled_opacity: 0.55,
            text: INK,
            text_size: 24.0,
        }
    }

    /// `color` with its alpha scaled for a disabled control.
    pub fn dimmed(&self, color: [u8; 4]) -> [u8; 4] {
        let a = (color[3] as f32 * self.disabled_opacity).round() as u8;
        [color[0], color[1], color[2], a]
    }
}

/// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex_color(s: &str) -> Option<[u8; 4]> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => {
            let mut out = [0xFF; 4];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 16 + v;
            }
            Some(out)
        }
        6 => Some([byte(0)?, byte(2)?, byte(4)?, 0xFF]),
        8 => Some([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(parse_hex_color("#A3A3A3"), Some([0xA3, 0xA3, 0xA3, 0xFF]));
        assert_eq!(parse_hex_color("#fff"), Some([0xFF, 0xFF, 0xFF, 0xFF]));
        assert_eq!(parse_hex_color("#10203040"), Some([0x10, 0x20, 0x30, 0x40]));
        assert_eq!(parse_hex_color("A3A3A3"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#ggg"), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }

    #[test]
    fn derives_track_geometry_from_height() {
        let style = ScaleStyle::from_options(&VisualOptions::default());
        assert_eq!(style.track_height, 34.0);
        assert_eq!(style.track_radius, 17.0);
        assert_eq!(style.thumb_diameter, 24.0);
        assert_eq!(style.card_width, 980.0);
        assert_eq!(style.background, [0xA3, 0xA3, 0xA3, 0xFF]);

        let odd = ScaleStyle::from_options(&VisualOptions {
            track_height_px: 35,
            ..VisualOptions::default()
        });
        assert_eq!(odd.track_radius, 18.0);
    }

    #[test]
    fn bad_colour_falls_back() {
        let style = ScaleStyle::from_options(&VisualOptions {
            block_bg: "grey".into(),
            ..VisualOptions::default()
        });
        assert_eq!(style.background, DEFAULT_BACKGROUND);
    }

    #[test]
    fn dimming_scales_alpha() {
        let style = ScaleStyle::from_options(&VisualOptions::default());
        assert_eq!(style.dimmed([1, 2, 3, 255]), [1, 2, 3, 140]);
    }
}
