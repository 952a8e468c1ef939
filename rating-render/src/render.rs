use crate::layout::{Bounds, ScaleLayout};
use crate::style::ScaleStyle;
use crate::text::{plain_text, TextRenderer};
use anyhow::{bail, Result};
use rating_core::{DisplayTarget, ScaleLabels, ScaleView, VisualOptions};
use rating_timing::Timer;
use std::path::Path;
use std::time::Duration;
use tiny_skia::{
    Color, FillRule, Paint, Path as SkPath, PathBuilder, Pixmap, Rect, Stroke, Transform,
};

pub struct FrameStats {
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
}

/// Software renderer for the rating scale.
///
/// Draws into an offscreen premultiplied RGBA canvas that a window copies
/// into its frame buffer. Text is only drawn once a font is loaded.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    options: VisualOptions,
    style: ScaleStyle,
    layout: ScaleLayout,
    canvas: Pixmap,
    text: Option<TextRenderer>,
    last_view: Option<ScaleView>,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, options: &VisualOptions) -> Result<Self> {
        let Some(canvas) = Pixmap::new(width, height) else {
            bail!("cannot allocate a {width}x{height} canvas");
        };
        let style = ScaleStyle::from_options(options);
        let layout = ScaleLayout::compute(width, height, &style);
        let mut renderer = Self {
            width,
            height,
            options: options.clone(),
            style,
            layout,
            canvas,
            text: None,
            last_view: None,
        };
        renderer.clear();
        Ok(renderer)
    }

    pub fn with_font(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.text = Some(TextRenderer::from_file(path)?);
        Ok(self)
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        let Some(canvas) = Pixmap::new(new_width, new_height) else {
            bail!("cannot allocate a {new_width}x{new_height} canvas");
        };
        self.width = new_width;
        self.height = new_height;
        self.canvas = canvas;
        self.layout = ScaleLayout::compute(new_width, new_height, &self.style);
        log::debug!(
            "[confidence-rating] Canvas resized to {}x{}, track length {}",
            new_width,
            new_height,
            self.layout.track_length()
        );
        match self.last_view.take() {
            Some(view) => self.draw(&view),
            None => self.clear(),
        }
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layout(&self) -> &ScaleLayout {
        &self.layout
    }

    pub fn style(&self) -> &ScaleStyle {
        &self.style
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn last_view(&self) -> Option<&ScaleView> {
        self.last_view.as_ref()
    }

    fn clear(&mut self) {
        let [r, g, b, a] = self.style.background;
        self.canvas.fill(Color::from_rgba8(r, g, b, a));
    }

    fn restyle(&mut self, options: &VisualOptions) {
        self.options = options.clone();
        self.style = ScaleStyle::from_options(options);
        self.layout = ScaleLayout::compute(self.width, self.height, &self.style);
    }

    /// Redraws the whole canvas for `view`.
    pub fn draw(&mut self, view: &ScaleView) {
        if view.visual != self.options {
            self.restyle(&view.visual);
        }
        self.clear();
        self.draw_prompt(view);
        self.draw_track(view);
        self.draw_labels(view);
        self.draw_button(view);
        self.last_view = Some(view.clone());
    }

    fn draw_prompt(&mut self, view: &ScaleView) {
        let Some(text) = self.text.as_mut() else {
            return;
        };
        text.draw_centered(
            &mut self.canvas,
            &plain_text(&view.prompt),
            self.style.text_size,
            self.style.text,
            self.layout.prompt_center,
        );
    }

    fn draw_track(&mut self, view: &ScaleView) {
        let style = &self.style;
        let track = self.layout.track;

        if let Some(path) = rounded_rect(track, style.track_radius) {
            fill(&mut self.canvas, &path, style.track_fill);
            stroke(&mut self.canvas, &path, style.outline, style.outline_width);
        }
        let inset = style.track_inset;
        let inner = Bounds {
            x: track.x + inset,
            y: track.y + inset,
            w: track.w - inset * 2.0,
            h: track.h - inset * 2.0,
        };
        if let Some(path) = rounded_rect(inner, (style.track_radius - inset).max(0.0)) {
            fill(&mut self.canvas, &path, style.track_inner_fill);
        }

        let mut paint = solid(style.divider);
        paint.anti_alias = false;
        for x in self.layout.divider_xs(&view.scale) {
            if let Some(r) = Rect::from_xywh(
                x - style.divider_width * 0.5,
                inner.y,
                style.divider_width,
                inner.h,
            ) {
                self.canvas.fill_rect(r, &paint, Transform::identity(), None);
            }
        }

        if let Some(tick) = view.thumb {
            let (cx, cy) = self.layout.thumb_center(&view.scale, tick);
            if let Some(circle) = PathBuilder::from_circle(cx, cy, style.thumb_diameter * 0.5) {
                fill(&mut self.canvas, &circle, style.thumb_fill);
                stroke(&mut self.canvas, &circle, style.outline, style.outline_width);
            }
        }
    }

    fn draw_labels(&mut self, view: &ScaleView) {
        let Some(text) = self.text.as_mut() else {
            return;
        };
        let xs = self.layout.tick_label_xs(&view.scale);
        let y = self.layout.labels_y;
        let size = self.style.text_size * 0.75;
        let placed: Vec<(String, f32)> = match &view.labels {
            ScaleLabels::Anchors { left, right } => vec![
                (plain_text(left), self.layout.track.x),
                (plain_text(right), self.layout.track.right()),
            ],
            ScaleLabels::PerTick(labels) => labels
                .iter()
                .zip(xs)
                .map(|(label, x)| (plain_text(label), x))
                .collect(),
        };
        for (label, x) in placed {
            text.draw_centered(&mut self.canvas, &label, size, self.style.text, (x, y));
        }
    }

    fn draw_button(&mut self, view: &ScaleView) {
        let style = &self.style;
        let (fill_color, ink) = if view.submit_enabled {
            (style.button_fill, style.outline)
        } else {
            (style.dimmed(style.button_fill), style.dimmed(style.outline))
        };
        if let Some(path) = rounded_rect(self.layout.button, style.button_radius) {
            fill(&mut self.canvas, &path, fill_color);
            stroke(&mut self.canvas, &path, ink, style.outline_width);
        }
        let text_ink = if view.submit_enabled {
            style.text
        } else {
            style.dimmed(style.text)
        };
        let size = style.text_size * 0.75;
        let center = self.layout.button.center();
        if let Some(text) = self.text.as_mut() {
            let label = plain_text(&view.button_label);
            text.draw_centered(&mut self.canvas, &label, size, text_ink, center);
        }
    }

    /// Copies the canvas into an RGBA frame buffer of the same size.
    pub fn copy_to_frame(&self, frame_buffer: &mut [u8]) -> Result<()> {
        let data = self.canvas.data();
        if frame_buffer.len() != data.len() {
            bail!(
                "frame buffer holds {} bytes, canvas has {}",
                frame_buffer.len(),
                data.len()
            );
        }
        frame_buffer.copy_from_slice(data);
        Ok(())
    }

    pub fn render_frame<T: Timer>(
        &mut self,
        view: &ScaleView,
        frame_buffer: &mut [u8],
        timer: &T,
    ) -> Result<FrameStats> {
        let t_draw = {
            let t = timer.now();
            self.draw(view);
            timer.elapsed(t)
        };
        let t_copy = {
            let t = timer.now();
            self.copy_to_frame(frame_buffer)?;
            timer.elapsed(t)
        };
        Ok(FrameStats {
            draw: t_draw,
            copy: t_copy,
            total: t_draw + t_copy,
        })
    }
}

impl DisplayTarget for SkiaRenderer {
    fn track_length(&self) -> f64 {
        self.layout.track_length()
    }

    fn present(&mut self, view: &ScaleView) {
        self.draw(view);
    }
}

fn solid(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba8(color[0], color[1], color[2], color[3]));
    paint.anti_alias = true;
    paint
}

fn fill(canvas: &mut Pixmap, path: &SkPath, color: [u8; 4]) {
    canvas.fill_path(path, &solid(color), FillRule::Winding, Transform::identity(), None);
}

fn stroke(canvas: &mut Pixmap, path: &SkPath, color: [u8; 4], width: f32) {
    let stroke = Stroke {
        width,
        ..Stroke::default()
    };
    canvas.stroke_path(path, &solid(color), &stroke, Transform::identity(), None);
}

fn rounded_rect(b: Bounds, radius: f32) -> Option<SkPath> {
    if b.w <= 0.0 || b.h <= 0.0 {
        return None;
    }
    let r = radius.min(b.w * 0.5).min(b.h * 0.5).max(0.0);
    let (x0, y0, x1, y1) = (b.x, b.y, b.right(), b.bottom());
    let mut pb = PathBuilder::new();
    pb.move_to(x0 + r, y0);
    pb.line_to(x1 - r, y0);
    pb.quad_to(x1, y0, x1, y0 + r);
    pb.line_to(x1, y1 - r);
    pb.quad_to(x1, y1, x1 - r, y1);
    pb.line_to(x0 + r, y1);
    pb.quad_to(x0, y1, x0, y1 - r);
    pb.line_to(x0, y0 + r);
    pb.quad_to(x0, y0, x0 + r, y0);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rating_core::{Scale, Tick};
    use rating_timing::ManualTimer;

    fn view(thumb: Option<u32>, submit_enabled: bool) -> ScaleView {
        let scale = Scale::new(6, true);
        ScaleView {
            prompt: "Rate your confidence:".into(),
            labels: ScaleLabels::reconcile(&scale, "Guessing", "Certain", None),
            scale,
            thumb: thumb.and_then(|t| scale.tick(t as i64)),
            submit_enabled,
            button_label: "Submit".into(),
            visual: VisualOptions::default(),
        }
    }

    fn rgba(r: &SkiaRenderer, x: f32, y: f32) -> [u8; 4] {
        let px = r.canvas().pixel(x as u32, y as u32).unwrap();
        [px.red(), px.green(), px.blue(), px.alpha()]
    }

    #[test]
    fn track_length_comes_from_layout() {
        let r = SkiaRenderer::new(1280, 720, &VisualOptions::default()).unwrap();
        assert_eq!(r.track_length(), 980.0);
        let narrow = SkiaRenderer::new(500, 400, &VisualOptions::default()).unwrap();
        assert!((narrow.track_length() - 460.0).abs() < 1e-3);
    }

    #[test]
    fn draws_background_and_thumb() {
        let mut r = SkiaRenderer::new(1280, 720, &VisualOptions::default()).unwrap();
        r.present(&view(Some(4), true));
        assert_eq!(rgba(&r, 2.0, 2.0), [0xA3, 0xA3, 0xA3, 0xFF]);

        let scale = Scale::new(6, true);
        let (cx, cy) = r.layout().thumb_center(&scale, scale.tick(4).unwrap());
        assert_eq!(rgba(&r, cx, cy), [0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn hidden_thumb_leaves_track_fill() {
        let mut r = SkiaRenderer::new(1280, 720, &VisualOptions::default()).unwrap();
        r.present(&view(None, false));
        // Halfway between the third and fourth ticks, clear of any divider
        let x = r.layout().track_x(0.5);
        let (_, y) = r.layout().track.center();
        assert_eq!(rgba(&r, x, y), [0xE7, 0xE7, 0xE7, 0xFF]);
    }

    #[test]
    fn view_options_restyle_the_canvas() {
        let mut r = SkiaRenderer::new(1280, 720, &VisualOptions::default()).unwrap();
        let mut v = view(None, false);
        v.visual = VisualOptions {
            width_px: 600,
            block_bg: "#000000".into(),
            ..VisualOptions::default()
        };
        r.present(&v);
        assert_eq!(r.track_length(), 600.0);
        assert_eq!(rgba(&r, 2.0, 2.0), [0, 0, 0, 0xFF]);
    }

    #[test]
    fn render_frame_copies_canvas() {
        let mut r = SkiaRenderer::new(64, 48, &VisualOptions::default()).unwrap();
        let mut fb = vec![0u8; 64 * 48 * 4];
        let stats = r.render_frame(&view(Some(1), true), &mut fb, &ManualTimer::new()).unwrap();
        assert_eq!(stats.total, stats.draw + stats.copy);
        assert_eq!(&fb[..4], &[0xA3, 0xA3, 0xA3, 0xFF]);

        let mut short = vec![0u8; 16];
        assert!(r.copy_to_frame(&mut short).is_err());
    }

    fn darkest_red_inside_button(r: &SkiaRenderer) -> u8 {
        let b = r.layout().button;
        let (x0, y0) = (b.x as u32 + 4, b.y as u32 + 4);
        let (x1, y1) = (b.right() as u32 - 4, b.bottom() as u32 - 4);
        (y0..y1)
            .flat_map(|y| (x0..x1).map(move |x| (x, y)))
            .filter_map(|(x, y)| r.canvas().pixel(x, y))
            .map(|px| px.red())
            .min()
            .unwrap_or(0xFF)
    }

    #[test]
    fn submit_label_darkens_once_enabled() {
        let font = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/DejaVuSans.ttf");
        let mut r = SkiaRenderer::new(1280, 720, &VisualOptions::default())
            .unwrap()
            .with_font(font)
            .unwrap();

        r.present(&view(None, false));
        let gated = darkest_red_inside_button(&r);
        r.present(&view(Some(3), true));
        let enabled = darkest_red_inside_button(&r);

        assert!(enabled < 0x40, "enabled label ink {enabled:#x}");
        assert!(enabled < gated, "gated {gated:#x}, enabled {enabled:#x}");
    }

    #[test]
    fn resize_redraws_last_view() {
        let mut r = SkiaRenderer::new(1280, 720, &VisualOptions::default()).unwrap();
        r.present(&view(Some(2), true));
        r.resize(800, 600).unwrap();
        assert_eq!(r.size(), (800, 600));
        assert!((r.track_length() - 736.0).abs() < 1e-3);
        assert_eq!(r.last_view().and_then(|v| v.thumb).map(Tick::get), Some(2));
    }
}
