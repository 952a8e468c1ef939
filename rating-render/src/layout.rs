use crate::style::ScaleStyle;
use rating_core::{Scale, Tick, TrackPoint};

const PROMPT_HEIGHT: f32 = 32.0;
const PROMPT_GAP: f32 = 28.0;
const LABEL_GAP: f32 = 8.0;
const LABEL_HEIGHT: f32 = 32.0;
const BUTTON_GAP: f32 = 36.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Bounds {
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x as f64
            && x <= self.right() as f64
            && y >= self.y as f64
            && y <= self.bottom() as f64
    }
}

/// What a canvas point lands on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    Track(TrackPoint),
    Button,
    Outside,
}

/// Where each part of the scale sits on a canvas of a given size.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleLayout {
    pub canvas: (u32, u32),
    pub prompt_center: (f32, f32),
    pub track: Bounds,
    pub labels_y: f32,
    pub button: Bounds,
}

impl ScaleLayout {
    /// Card centred on the canvas: prompt, track, labels, then the button.
    pub fn compute(width: u32, height: u32, style: &ScaleStyle) -> Self {
        let (w, h) = (width as f32, height as f32);
        let card_w = style.card_width.min(w * style.max_width_fraction).max(1.0);
        let (button_w, button_h) = style.button_size;
        let stack = PROMPT_HEIGHT
            + PROMPT_GAP
            + style.track_height
            + LABEL_GAP
            + LABEL_HEIGHT
            + BUTTON_GAP
            + button_h;
        let top = ((h - stack) * 0.5).max(0.0);
        let left = (w - card_w) * 0.5;

        let track = Bounds {
            x: left,
            y: top + PROMPT_HEIGHT + PROMPT_GAP,
            w: card_w,
            h: style.track_height,
        };
        let labels_y = track.bottom() + LABEL_GAP + LABEL_HEIGHT * 0.5;
        let button = Bounds {
            x: (w - button_w) * 0.5,
            y: track.bottom() + LABEL_GAP + LABEL_HEIGHT + BUTTON_GAP,
            w: button_w,
            h: button_h,
        };

        Self {
            canvas: (width, height),
            prompt_center: (w * 0.5, top + PROMPT_HEIGHT * 0.5),
            track,
            labels_y,
            button,
        }
    }

    pub fn track_length(&self) -> f64 {
        self.track.w as f64
    }

    /// Canvas x of a fraction along the track.
    pub fn track_x(&self, fraction: f64) -> f32 {
        self.track.x + (fraction * self.track.w as f64) as f32
    }

    pub fn thumb_center(&self, scale: &Scale, tick: Tick) -> (f32, f32) {
        (
            self.track_x(scale.tick_to_fraction(tick)),
            self.track.y + self.track.h * 0.5,
        )
    }

    pub fn divider_xs(&self, scale: &Scale) -> Vec<f32> {
        scale.divider_fractions().map(|f| self.track_x(f)).collect()
    }

    pub fn tick_label_xs(&self, scale: &Scale) -> Vec<f32> {
        scale
            .ticks()
            .map(|t| self.track_x(scale.tick_to_fraction(t)))
            .collect()
    }

    /// Pointer position relative to the track, whatever the y coordinate.
    pub fn track_point(&self, x: f64) -> TrackPoint {
        TrackPoint::new(x - self.track.x as f64, self.track_length())
    }

    pub fn hit(&self, x: f64, y: f64) -> Hit {
        if self.track.contains(x, y) {
            Hit::Track(self.track_point(x))
        } else if self.button.contains(x, y) {
            Hit::Button
        } else {
            Hit::Outside
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rating_core::VisualOptions;

    fn layout(width: u32, height: u32) -> ScaleLayout {
        ScaleLayout::compute(width, height, &ScaleStyle::from_options(&VisualOptions::default()))
    }

    #[test]
    fn track_uses_configured_width_when_it_fits() {
        let l = layout(1280, 720);
        assert_eq!(l.track.w, 980.0);
        assert_eq!(l.track.x, 150.0);
        assert_eq!(l.track_length(), 980.0);
    }

    #[test]
    fn narrow_canvas_caps_track_width() {
        let l = layout(800, 600);
        assert!((l.track.w - 736.0).abs() < 1e-3);
        assert!((l.track.x - 32.0).abs() < 1e-3);
    }

    #[test]
    fn button_sits_below_track() {
        let l = layout(1280, 720);
        assert!(l.button.y > l.track.bottom());
        assert!(l.labels_y > l.track.bottom() && l.labels_y < l.button.y);
    }

    #[test]
    fn thumb_and_dividers_follow_tick_fractions() {
        let l = layout(1280, 720);
        let scale = Scale::new(5, true);
        let (x, y) = l.thumb_center(&scale, scale.tick(3).unwrap());
        assert_eq!(x, 150.0 + 490.0);
        assert_eq!(y, l.track.y + 17.0);
        assert_eq!(l.divider_xs(&scale), vec![395.0, 640.0, 885.0]);
        assert_eq!(l.tick_label_xs(&scale).len(), 5);
        assert_eq!(l.tick_label_xs(&scale)[4], 1130.0);
    }

    #[test]
    fn hit_testing() {
        let l = layout(1280, 720);
        let (cx, cy) = l.track.center();
        assert_eq!(
            l.hit(cx as f64, cy as f64),
            Hit::Track(TrackPoint::new(490.0, 980.0))
        );
        let (bx, by) = l.button.center();
        assert_eq!(l.hit(bx as f64, by as f64), Hit::Button);
        assert_eq!(l.hit(2.0, 2.0), Hit::Outside);
    }

    #[test]
    fn track_point_ignores_vertical_position() {
        let l = layout(1280, 720);
        assert_eq!(l.track_point(100.0), TrackPoint::new(-50.0, 980.0));
    }
}
