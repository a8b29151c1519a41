use std::sync::Arc;

use tracing::warn;

use crate::config::Config;

use super::color::Color;
use super::font::{Font, FontCache};
use super::glyphs::{glyph_for, Glyph, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::surface::{PresentError, Surface};
use super::texture::Texture;
use super::transform::Transform2;

/// Mediates all drawing for one frame and owns the reusable graphics state:
/// the transform and color stacks, the font cache, and the clear color.
///
/// A frame is bracketed by [`begin_render`] / [`end_render`]. The transform is
/// reset to identity once at `begin_render`; pushes left unmatched at frame
/// end leak stack depth into the next frame (the caller's bug to fix, not
/// silently corrected here).
///
/// [`begin_render`]: FrameRenderer::begin_render
/// [`end_render`]: FrameRenderer::end_render
pub struct FrameRenderer {
    surface: Box<dyn Surface>,
    transform: Transform2,
    matrices: Vec<Transform2>,
    color_stack: Vec<Color>,
    draw_color: Color,
    clear_color: Color,
    fonts: FontCache,
    active_font: Arc<Font>,
    frame_active: bool,
    frame_skipped: bool,
}

impl FrameRenderer {
    pub fn new(surface: Box<dyn Surface>) -> FrameRenderer {
        let mut fonts = FontCache::new();
        let active_font = fonts.default_font();
        FrameRenderer {
            surface,
            transform: Transform2::IDENTITY,
            matrices: Vec::new(),
            color_stack: Vec::new(),
            draw_color: Color::WHITE,
            clear_color: Color::BLACK,
            fonts,
            active_font,
            frame_active: false,
            frame_skipped: false,
        }
    }

    /// Like [`new`](Self::new) but seeds the clear color and the active font
    /// from config. Invalid values warn and keep the defaults.
    pub fn with_config(surface: Box<dyn Surface>, config: &Config) -> FrameRenderer {
        let mut renderer = FrameRenderer::new(surface);
        if let Some(raw) = config.get("clearColor") {
            renderer.clear_color = Color::resolve(raw);
        }
        if let Some((family, style_bits, size)) = font_request_from_config(config) {
            let font = renderer.fonts.get_new_font(&family, style_bits, size);
            renderer.active_font = font;
        }
        renderer
    }

    /// Preps for the frame's drawing operations. Skips the frame when the
    /// surface has no drawable yet; the matching `end_render` then no-ops
    /// without complaint.
    pub fn begin_render(&mut self) {
        if self.surface.frame_mut().is_none() {
            self.frame_skipped = true;
            return;
        }
        self.transform = Transform2::IDENTITY;
        self.frame_active = true;
    }

    /// Presents the frame. Ends a skipped (no-drawable) frame silently; warns
    /// and no-ops when not paired with a prior
    /// [`begin_render`](Self::begin_render) at all.
    pub fn end_render(&mut self) -> Result<(), PresentError> {
        if self.frame_skipped {
            self.frame_skipped = false;
            return Ok(());
        }
        if !self.frame_active {
            warn!("end_render without a matching begin_render; skipped");
            return Ok(());
        }
        self.frame_active = false;
        self.surface.present()
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn set_to_identity(&mut self) {
        self.transform = Transform2::IDENTITY;
    }

    /// Saves the active transform on the matrix stack.
    pub fn push_matrix(&mut self) {
        self.matrices.push(self.transform);
    }

    /// Restores the last saved transform. Popping an empty stack logs and
    /// no-ops.
    pub fn pop_matrix(&mut self) {
        match self.matrices.pop() {
            Some(saved) => self.transform = saved,
            None => warn!("no matrix on the stack to pop"),
        }
    }

    /// Translates so that point `(x, y)` lands at the surface center.
    pub fn look_at(&mut self, x: f32, y: f32) {
        let half_width = self.surface.width() as f32 * 0.5;
        let half_height = self.surface.height() as f32 * 0.5;
        self.transform.translate(half_width - x, half_height - y);
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    pub fn set_font(&mut self, font: Arc<Font>) {
        self.active_font = font;
    }

    /// Validated, cached font lookup; see [`FontCache::get_new_font`].
    pub fn get_new_font(&mut self, family: &str, style_bits: i32, size: i32) -> Arc<Font> {
        self.fonts.get_new_font(family, style_bits, size)
    }

    pub fn string_width(&self, text: &str) -> i32 {
        self.active_font.string_width(text)
    }

    pub fn string_height(&self) -> i32 {
        self.active_font.string_height()
    }

    /// Fills the whole surface with the clear color. The active draw color is
    /// saved on the color stack and restored before returning; the push and
    /// pop are always balanced within this call.
    pub fn clear_screen(&mut self) {
        self.color_stack.push(self.draw_color);
        self.draw_color = self.clear_color;

        let rgba = self.draw_color.to_rgba();
        if let Some(frame) = self.surface.frame_mut() {
            for pixel in frame.chunks_exact_mut(4) {
                pixel.copy_from_slice(&rgba);
            }
        }

        self.draw_color = self.color_stack.pop().unwrap_or(Color::BLACK);
    }

    /// Draws a string with its top-left at `(x, y)` in the current transform,
    /// using the active font.
    pub fn draw_text(&mut self, color: Color, text: &str, x: f32, y: f32) {
        self.draw_color = color;
        let (sx, sy) = self.transform.apply(x, y);
        let font = Arc::clone(&self.active_font);
        let width = self.surface.width();
        let height = self.surface.height();
        let rgba = color.to_rgba();
        let Some(frame) = self.surface.frame_mut() else {
            return;
        };

        let mut pen_x = sx.round() as i32;
        let pen_y = sy.round() as i32;
        for ch in text.chars() {
            draw_glyph(frame, width, height, pen_x, pen_y, glyph_for(ch), &font, rgba);
            pen_x += font.glyph_advance();
        }
    }

    /// Draws a texture centered on `(x, y)`, through the current transform.
    /// The transform is pushed and popped around the draw, so the caller's
    /// transform is never perturbed.
    pub fn draw_texture(&mut self, texture: &Texture, x: f32, y: f32) {
        self.push_matrix();
        self.transform.translate(x, y);
        self.blit_centered(texture);
        self.pop_matrix();
    }

    /// Draws a texture centered on screen point `(x, y)`, ignoring the
    /// current transform (the transform is reset to identity for the draw and
    /// restored afterwards).
    pub fn draw_image(&mut self, texture: &Texture, x: f32, y: f32) {
        self.push_matrix();
        self.set_to_identity();
        self.transform.translate(x, y);
        self.blit_centered(texture);
        self.pop_matrix();
    }

    fn blit_centered(&mut self, texture: &Texture) {
        let (cx, cy) = self.transform.apply(0.0, 0.0);
        let left = cx.round() as i32 - texture.width() as i32 / 2;
        let top = cy.round() as i32 - texture.height() as i32 / 2;
        let width = self.surface.width();
        let height = self.surface.height();
        let Some(frame) = self.surface.frame_mut() else {
            return;
        };
        blit_texture(frame, width, height, left, top, texture);
    }
}

/// Extracts a valid (family, style, size) font request from config, matching
/// the original key set. Any invalid part warns and aborts the request.
fn font_request_from_config(config: &Config) -> Option<(String, i32, i32)> {
    let family = config.get("font-family")?;
    let style_raw = config.get("font-style")?;
    let size_raw = config.get("font-size")?;

    let Some(style_bits) = combined_style_bits(style_raw) else {
        warn!(
            value = style_raw,
            "font-style must be a digit or a 'd | d' pair; using default font"
        );
        return None;
    };
    let Ok(size) = size_raw.parse::<i32>() else {
        warn!(value = size_raw, "font-size must be an integer; using default font");
        return None;
    };
    Some((family.to_string(), style_bits, size))
}

/// Parses a style spec that is either a single digit or two digits joined by
/// `|`, returning the bitwise OR.
fn combined_style_bits(raw: &str) -> Option<i32> {
    let mut bits = 0;
    let mut parts = 0;
    for part in raw.split('|') {
        let digit = part.trim().parse::<i32>().ok()?;
        if !(0..=9).contains(&digit) {
            return None;
        }
        bits |= digit;
        parts += 1;
    }
    if parts == 0 || parts > 2 {
        return None;
    }
    Some(bits)
}

fn draw_glyph(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    glyph: Glyph,
    font: &Font,
    color: [u8; 4],
) {
    if width == 0 || height == 0 {
        return;
    }
    let scale = font.pixel_scale();
    let bold = font.style().is_bold();
    let italic = font.style().is_italic();

    for (row_index, row_bits) in glyph.rows.iter().enumerate() {
        let glyph_y = y + row_index as i32 * scale;
        // Italic shears the upper rows one step further right per row pair.
        let shear = if italic {
            ((GLYPH_HEIGHT - 1 - row_index as i32) * scale) / 4
        } else {
            0
        };

        for col in 0..GLYPH_WIDTH {
            if (row_bits & (1u8 << (GLYPH_WIDTH - 1 - col))) == 0 {
                continue;
            }
            let glyph_x = x + col * scale + shear;
            fill_pixels(frame, width, height, glyph_x, glyph_y, scale, scale, color);
            if bold {
                fill_pixels(frame, width, height, glyph_x + 1, glyph_y, scale, scale, color);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn fill_pixels(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = (x + rect_width).min(width as i32);
    let end_y = (y + rect_height).min(height as i32);
    if end_x <= start_x || end_y <= start_y {
        return;
    }

    let width = width as usize;
    for py in start_y..end_y {
        for px in start_x..end_x {
            write_pixel_rgba(frame, width, px as usize, py as usize, color);
        }
    }
}

fn blit_texture(frame: &mut [u8], width: u32, height: u32, left: i32, top: i32, texture: &Texture) {
    let rgba = texture.rgba();
    let tex_width = texture.width() as usize;
    for row in 0..texture.height() as i32 {
        let py = top + row;
        if py < 0 || py >= height as i32 {
            continue;
        }
        for col in 0..texture.width() as i32 {
            let px = left + col;
            if px < 0 || px >= width as i32 {
                continue;
            }
            let source = (row as usize * tex_width + col as usize) * 4;
            let pixel = [rgba[source], rgba[source + 1], rgba[source + 2], rgba[source + 3]];
            // Fully transparent texels are skipped; no blending otherwise.
            if pixel[3] == 0 {
                continue;
            }
            write_pixel_rgba(frame, width as usize, px as usize, py as usize, pixel);
        }
    }
}

fn write_pixel_rgba(frame: &mut [u8], width: usize, x: usize, y: usize, color: [u8; 4]) {
    let offset = (y * width + x) * 4;
    let Some(end) = offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[offset..end].copy_from_slice(&color);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct TestSurface {
        width: u32,
        height: u32,
        frame: Vec<u8>,
        has_frame: bool,
        presents: Arc<AtomicU32>,
    }

    impl TestSurface {
        fn new(width: u32, height: u32) -> TestSurface {
            TestSurface {
                width,
                height,
                frame: vec![0; width as usize * height as usize * 4],
                has_frame: true,
                presents: Arc::new(AtomicU32::new(0)),
            }
        }

        fn without_frame(width: u32, height: u32) -> TestSurface {
            TestSurface {
                has_frame: false,
                ..TestSurface::new(width, height)
            }
        }

        fn present_counter(&self) -> Arc<AtomicU32> {
            Arc::clone(&self.presents)
        }
    }

    impl Surface for TestSurface {
        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }

        fn frame_mut(&mut self) -> Option<&mut [u8]> {
            if self.has_frame {
                Some(&mut self.frame)
            } else {
                None
            }
        }

        fn present(&mut self) -> Result<(), PresentError> {
            self.presents.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn pixel_at(renderer: &mut FrameRenderer, x: u32, y: u32) -> [u8; 4] {
        let width = renderer.surface.width() as usize;
        let frame = renderer.surface.frame_mut().expect("test frame");
        let offset = (y as usize * width + x as usize) * 4;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn begin_render_resets_transform_to_identity() {
        let mut renderer = FrameRenderer::new(Box::new(TestSurface::new(64, 64)));
        renderer.look_at(100.0, 100.0);
        assert!(!renderer.transform.is_identity());

        renderer.begin_render();
        assert!(renderer.transform.is_identity());
    }

    #[test]
    fn begin_render_without_drawable_is_a_no_op() {
        let mut renderer = FrameRenderer::new(Box::new(TestSurface::without_frame(64, 64)));
        renderer.begin_render();
        assert!(!renderer.frame_active);
        assert!(renderer.frame_skipped);
    }

    #[test]
    fn end_render_of_a_skipped_frame_is_silent_and_does_not_present() {
        let surface = TestSurface::without_frame(64, 64);
        let presents = surface.present_counter();
        let mut renderer = FrameRenderer::new(Box::new(surface));

        // Several loop iterations against a surface with no drawable yet:
        // each begin/end pair ends a skipped frame, not an unpaired one.
        for _ in 0..3 {
            renderer.begin_render();
            renderer.end_render().expect("skipped frame ends cleanly");
            assert!(!renderer.frame_skipped);
        }
        assert_eq!(presents.load(Ordering::Relaxed), 0);

        // A genuinely unpaired end is still distinguishable.
        renderer.end_render().expect("unpaired end is a no-op");
        assert!(!renderer.frame_active);
    }

    #[test]
    fn end_render_presents_only_when_paired() {
        let surface = TestSurface::new(64, 64);
        let presents = surface.present_counter();
        let mut renderer = FrameRenderer::new(Box::new(surface));

        renderer.end_render().expect("unpaired end is a no-op");
        assert_eq!(presents.load(Ordering::Relaxed), 0);

        renderer.begin_render();
        renderer.end_render().expect("present");
        renderer.end_render().expect("second end is a no-op");
        assert_eq!(presents.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn push_pop_round_trip_restores_transform_bits() {
        let mut renderer = FrameRenderer::new(Box::new(TestSurface::new(64, 64)));
        renderer.look_at(3.5, -12.25);
        let before = renderer.transform;

        renderer.push_matrix();
        renderer.look_at(900.0, 42.0);
        renderer.pop_matrix();

        assert_eq!(
            renderer.transform.m.map(f32::to_bits),
            before.m.map(f32::to_bits)
        );
    }

    #[test]
    fn pop_on_empty_stack_keeps_transform() {
        let mut renderer = FrameRenderer::new(Box::new(TestSurface::new(64, 64)));
        renderer.look_at(5.0, 5.0);
        let before = renderer.transform;

        renderer.pop_matrix();
        assert_eq!(renderer.transform, before);
    }

    #[test]
    fn look_at_maps_target_to_surface_center() {
        let mut renderer = FrameRenderer::new(Box::new(TestSurface::new(200, 100)));
        renderer.begin_render();
        renderer.look_at(30.0, 40.0);

        assert_eq!(renderer.transform.apply(30.0, 40.0), (100.0, 50.0));
    }

    #[test]
    fn clear_screen_fills_with_clear_color_and_restores_draw_color() {
        let mut renderer = FrameRenderer::new(Box::new(TestSurface::new(8, 8)));
        renderer.begin_render();
        renderer.draw_color = Color::YELLOW;
        renderer.set_clear_color(Color::rgb(10, 20, 30));

        renderer.clear_screen();

        assert_eq!(pixel_at(&mut renderer, 0, 0), [10, 20, 30, 255]);
        assert_eq!(pixel_at(&mut renderer, 7, 7), [10, 20, 30, 255]);
        assert_eq!(renderer.draw_color, Color::YELLOW);
        assert!(renderer.color_stack.is_empty());
    }

    #[test]
    fn draw_text_writes_glyph_pixels_in_requested_color() {
        let mut renderer = FrameRenderer::new(Box::new(TestSurface::new(64, 64)));
        renderer.begin_render();
        let small = renderer.get_new_font("Arial", 0, 6);
        renderer.set_font(small);

        renderer.draw_text(Color::RED, "I", 1.0, 1.0);

        // 'I' has a solid top row; with scale 1 the pixel at (1,1) is lit.
        assert_eq!(pixel_at(&mut renderer, 1, 1), Color::RED.to_rgba());
        assert_eq!(renderer.draw_color, Color::RED);
    }

    #[test]
    fn draw_texture_does_not_perturb_transform() {
        let mut renderer = FrameRenderer::new(Box::new(TestSurface::new(32, 32)));
        renderer.begin_render();
        renderer.look_at(7.0, 9.0);
        let before = renderer.transform;

        let texture = Texture::from_rgba(2, 2, vec![255; 16]).expect("texture");
        renderer.draw_texture(&texture, 3.0, 4.0);

        assert_eq!(
            renderer.transform.m.map(f32::to_bits),
            before.m.map(f32::to_bits)
        );
        assert!(renderer.matrices.is_empty());
    }

    #[test]
    fn draw_texture_centers_on_the_target_point() {
        let mut renderer = FrameRenderer::new(Box::new(TestSurface::new(32, 32)));
        renderer.begin_render();

        let texture =
            Texture::from_rgba(2, 2, vec![9, 9, 9, 255].repeat(4)).expect("texture");
        renderer.draw_texture(&texture, 16.0, 16.0);

        // 2x2 texture centered on (16,16) covers (15..17, 15..17).
        assert_eq!(pixel_at(&mut renderer, 15, 15), [9, 9, 9, 255]);
        assert_eq!(pixel_at(&mut renderer, 16, 16), [9, 9, 9, 255]);
        assert_eq!(pixel_at(&mut renderer, 17, 17), [0, 0, 0, 0]);
    }

    #[test]
    fn draw_image_ignores_the_camera_transform() {
        let mut renderer = FrameRenderer::new(Box::new(TestSurface::new(32, 32)));
        renderer.begin_render();
        renderer.look_at(1000.0, 1000.0);

        let texture =
            Texture::from_rgba(2, 2, vec![7, 7, 7, 255].repeat(4)).expect("texture");
        renderer.draw_image(&texture, 8.0, 8.0);

        assert_eq!(pixel_at(&mut renderer, 7, 7), [7, 7, 7, 255]);
    }

    #[test]
    fn transparent_texels_are_skipped() {
        let mut renderer = FrameRenderer::new(Box::new(TestSurface::new(8, 8)));
        renderer.begin_render();
        renderer.set_clear_color(Color::rgb(1, 2, 3));
        renderer.clear_screen();

        let mut rgba = vec![200, 200, 200, 255].repeat(4);
        rgba[3] = 0;
        let texture = Texture::from_rgba(2, 2, rgba).expect("texture");
        renderer.draw_image(&texture, 4.0, 4.0);

        // First texel is transparent, so the clear color shows through.
        assert_eq!(pixel_at(&mut renderer, 3, 3), [1, 2, 3, 255]);
        assert_eq!(pixel_at(&mut renderer, 4, 3), [200, 200, 200, 255]);
    }

    #[test]
    fn with_config_seeds_clear_color_and_font() {
        let config = Config::parse(
            "clearColor=#00FF00\nfont-family=Verdana\nfont-style=1 | 2\nfont-size=20\n",
        );
        let renderer = FrameRenderer::with_config(Box::new(TestSurface::new(8, 8)), &config);

        assert_eq!(renderer.clear_color, Color::GREEN);
        assert_eq!(renderer.active_font.family(), "Verdana");
        assert_eq!(renderer.active_font.style().bits(), 3);
        assert_eq!(renderer.active_font.size(), 20);
    }

    #[test]
    fn with_config_keeps_defaults_on_bad_font_values() {
        let config = Config::parse("font-family=Verdana\nfont-style=nope\nfont-size=20\n");
        let renderer = FrameRenderer::with_config(Box::new(TestSurface::new(8, 8)), &config);

        assert_eq!(renderer.active_font.family(), "Arial");
        assert_eq!(renderer.active_font.size(), 30);
    }

    #[test]
    fn combined_style_accepts_single_and_or_forms() {
        assert_eq!(combined_style_bits("0"), Some(0));
        assert_eq!(combined_style_bits("1|2"), Some(3));
        assert_eq!(combined_style_bits("1 | 2"), Some(3));
        assert_eq!(combined_style_bits("x"), None);
        assert_eq!(combined_style_bits("1|2|3"), None);
        assert_eq!(combined_style_bits("12"), None);
    }
}
