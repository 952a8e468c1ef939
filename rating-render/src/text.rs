use ab_glyph::{point, Font, FontVec, Glyph, PxScale, ScaleFont};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tiny_skia::{Pixmap, PixmapPaint, PremultipliedColorU8, Transform};

/// Text, size bits and ink of a rasterised string.
type CacheKey = (String, u32, [u8; 4]);

/// Rasterises prompt and label strings. Pixmaps are cached per string and
/// ink since the same few labels are drawn every frame.
pub struct TextRenderer {
    font: FontVec,
    cache: HashMap<CacheKey, Pixmap>,
}

impl TextRenderer {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading font file {}", path.display()))?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let font =
            FontVec::try_from_vec(bytes).map_err(|e| anyhow::anyhow!("invalid font: {e}"))?;
        Ok(Self {
            font,
            cache: HashMap::new(),
        })
    }

    /// Draws `text` centred on `center`. Empty strings draw nothing.
    pub fn draw_centered(
        &mut self,
        canvas: &mut Pixmap,
        text: &str,
        size_px: f32,
        color: [u8; 4],
        center: (f32, f32),
    ) {
        if text.trim().is_empty() {
            return;
        }
        let key = (text.to_owned(), size_px.to_bits(), color);
        if !self.cache.contains_key(&key) {
            match render_text_pixmap(text, size_px, &self.font, color) {
                Some(pm) => {
                    self.cache.insert(key.clone(), pm);
                }
                None => return,
            }
        }
        if let Some(pm) = self.cache.get(&key) {
            let x = (center.0 - pm.width() as f32 * 0.5).round() as i32;
            let y = (center.1 - pm.height() as f32 * 0.5).round() as i32;
            canvas.draw_pixmap(
                x,
                y,
                pm.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
    }
}

/// Lays `text` out on one line and rasterises it into a tight, transparent
/// pixmap. `None` when nothing in the string has an outline.
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: [u8; 4],
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // Baseline at ascent
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    if outlines.is_empty() {
        return None;
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;
            let Some(bg) = dst.get(i).copied() else {
                return;
            };

            // Source premultiplied by coverage * alpha, then Porter-Duff over
            let a = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a * 255.0) as u8;
            let inv = 1.0 - a;
            let blend =
                |s: u8, d: u8| ((s as f32 * a) as u8).saturating_add((d as f32 * inv) as u8);
            let r = blend(color[0], bg.red());
            let g = blend(color[1], bg.green());
            let bl = blend(color[2], bg.blue());
            let alpha = sa.saturating_add((bg.alpha() as f32 * inv) as u8);
            // Channels can exceed alpha by one after truncation
            if let Some(px) =
                PremultipliedColorU8::from_rgba(r.min(alpha), g.min(alpha), bl.min(alpha), alpha)
            {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

/// Visible text of a markup fragment: tags dropped, common entities decoded,
/// whitespace collapsed.
pub fn plain_text(markup: &str) -> String {
    let mut stripped = String::with_capacity(markup.len());
    let mut in_tag = false;
    for ch in markup.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                stripped.push(' ');
            }
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }

    let decoded = stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
