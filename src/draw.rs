// Software drawing utilities for the overlay.
// Visual effects provided here:
// 1) Alpha-blended rectangles (the darkened mask) and discs (hint markers).
// 2) Sprites scaled into a rectangle (border frame, scan line, frozen result).
// 3) A tiny 5x7 bitmap font to render the caption under the frame.
//
// Colors passed in are 0xAARRGGBB; the surface stores 0x00RRGGBB.

use crate::types::{FrameBuffer, Rect, Sprite};

/// Blend an ARGB color onto the pixel at (x,y) if it is inside bounds.
/// `opacity` scales the color's own alpha (255 = as given).
/// Visual: the pixel is tinted toward `argb`, fully replaced when opaque.
#[inline]
pub fn blend_pixel(fb: &mut FrameBuffer, x: i32, y: i32, argb: u32, opacity: u8) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let a = ((argb >> 24) & 0xFF) * opacity as u32 / 255;
    if a == 0 {
        return;
    }
    let idx = y * fb.width + x;
    if a == 255 {
        fb.pixels[idx] = argb & 0x00FF_FFFF;
        return;
    }
    let dst = fb.pixels[idx];
    let inv = 255 - a;
    let mix = |shift: u32| {
        let s = (argb >> shift) & 0xFF;
        let d = (dst >> shift) & 0xFF;
        ((s * a + d * inv) / 255) << shift
    };
    fb.pixels[idx] = mix(16) | mix(8) | mix(0);
}

/// Fill `rect` (clipped to the surface) with a blended color.
/// Visual: a translucent panel; the mask is four of these.
pub fn fill_rect(fb: &mut FrameBuffer, rect: Rect, argb: u32, opacity: u8) {
    let Some(r) = rect.intersect(&fb.bounds()) else { return };
    for y in r.top..r.bottom {
        for x in r.left..r.right {
            blend_pixel(fb, x, y, argb, opacity);
        }
    }
}

/// Fill a disc whose pixel centers lie within `radius` of (cx,cy), drawing
/// only inside `clip`.
/// Visual: a round dot; hint markers are drawn with this.
pub fn fill_circle(fb: &mut FrameBuffer, cx: f32, cy: f32, radius: f32, clip: Rect, argb: u32, opacity: u8) {
    if radius <= 0.0 {
        return;
    }
    let r2 = radius * radius;
    let bbox = Rect::new(
        (cx - radius).floor() as i32,
        (cy - radius).floor() as i32,
        (cx + radius).ceil() as i32 + 1,
        (cy + radius).ceil() as i32 + 1,
    );
    let Some(visible) = bbox.intersect(&clip) else { return };

    // Scan just the visible part of the bounding box
    for y in visible.top..visible.bottom {
        for x in visible.left..visible.right {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                blend_pixel(fb, x, y, argb, opacity);
            }
        }
    }
}

/// Stretch `sprite` over `dst` (nearest neighbour), drawing only where `dst`
/// overlaps `clip` and the surface.
/// Visual: the sprite appears resized to exactly fill `dst`.
pub fn blit_scaled(fb: &mut FrameBuffer, sprite: &Sprite, dst: Rect, clip: Rect, opacity: u8) {
    if sprite.width == 0 || sprite.height == 0 || dst.is_empty() {
        return;
    }
    let Some(visible) = dst.intersect(&clip).and_then(|r| r.intersect(&fb.bounds())) else {
        return;
    };
    let (dw, dh) = (dst.width() as usize, dst.height() as usize);
    for y in visible.top..visible.bottom {
        let sy = (y - dst.top) as usize * sprite.height / dh;
        for x in visible.left..visible.right {
            let sx = (x - dst.left) as usize * sprite.width / dw;
            blend_pixel(fb, x, y, sprite.get(sx, sy), opacity);
        }
    }
}

/// Stretch `src` over the whole surface (nearest neighbour), writing only the
/// pixels inside `region`.
/// Visual: the camera preview fills the window regardless of its resolution.
pub fn stretch_into(fb: &mut FrameBuffer, src: &FrameBuffer, region: Rect) {
    if src.width == 0 || src.height == 0 {
        return;
    }
    let Some(r) = region.intersect(&fb.bounds()) else { return };
    for y in r.top as usize..r.bottom as usize {
        let sy = y * src.height / fb.height;
        let row = y * fb.width;
        for x in r.left as usize..r.right as usize {
            fb.pixels[row + x] = src.get(x * src.width / fb.width, sy);
        }
    }
}

/* ---------- 5x7 bitmap font ---------- */

/// Glyph cell advance in font pixels (5 wide + 1 spacing).
const GLYPH_ADVANCE: i32 = 6;
/// Line height in font pixels (7 tall + 1 spacing).
const GLYPH_LINE: i32 = 8;

/// Return a 5x7 glyph bitmap for a limited character set.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
/// Lowercase letters are drawn as uppercase.
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    // Helper macro to define a glyph quickly
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        // Digits 0..9
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        // Uppercase letters
        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        // Punctuation
        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        ',' => g!(0b00000,0b00000,0b00000,0b00000,0b00110,0b00100,0b01000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '/' => g!(0b00001,0b00010,0b00010,0b00100,0b01000,0b01000,0b10000),
        '!' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00000,0b00100),
        '?' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b00000,0b00100),

        _ => None,
    }
}

/// Width in surface pixels of `text` drawn at `scale`.
pub fn text_width(text: &str, scale: i32) -> i32 {
    let n = text.chars().count() as i32;
    if n == 0 { 0 } else { (n * GLYPH_ADVANCE - 1) * scale }
}

/// Height in surface pixels of one line at `scale`.
pub fn line_height(scale: i32) -> i32 {
    GLYPH_LINE * scale
}

/// Draw a single 5x7 character at (x,y), each font pixel a `scale`-sized block.
/// Visual: a glyph with a 1-font-pixel dark shadow for contrast.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, scale: i32, argb: u32) {
    let Some(rows) = glyph5x7(ch) else { return };

    // Shadow pass first, foreground on top
    for (offset, color) in [(scale, 0xFF00_0000), (0, argb)] {
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) == 0 {
                    continue;
                }
                let px = x + rx * scale + offset;
                let py = y + ry as i32 * scale + offset;
                fill_rect(fb, Rect::from_origin_size(px, py, scale, scale), color, 255);
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs; (x,y) is the top-left corner.
/// Visual: a compact caption; each glyph is 5x7 font pixels with 1 pixel spacing.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, scale: i32, argb: u32) {
    let scale = scale.max(1);
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, scale, argb);
        x += GLYPH_ADVANCE * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_blend_replaces_and_translucent_mixes() {
        let mut fb = FrameBuffer::new(2, 1);
        fb.pixels = vec![0x00FF_FFFF, 0x00FF_FFFF];
        blend_pixel(&mut fb, 0, 0, 0xFF12_3456, 255);
        blend_pixel(&mut fb, 1, 0, 0xFF00_0000, 0x80);
        assert_eq!(fb.pixels[0], 0x0012_3456);
        assert_eq!(fb.pixels[1], 0x007F_7F7F);
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut fb = FrameBuffer::new(2, 2);
        blend_pixel(&mut fb, -1, 0, 0xFFFF_FFFF, 255);
        blend_pixel(&mut fb, 2, 1, 0xFFFF_FFFF, 255);
        fill_rect(&mut fb, Rect::new(-5, -5, 1, 1), 0xFFFF_FFFF, 255);
        assert_eq!(fb.pixels, vec![0x00FF_FFFF, 0, 0, 0]);
    }

    #[test]
    fn circle_covers_center_not_corners() {
        let mut fb = FrameBuffer::new(20, 20);
        let all = fb.bounds();
        fill_circle(&mut fb, 10.0, 10.0, 6.0, all, 0xFFFF_0000, 255);
        assert_eq!(fb.get(10, 10), 0x00FF_0000);
        assert_eq!(fb.get(4, 10), 0x00FF_0000);
        assert_eq!(fb.get(4, 4), 0, "bounding-box corner stays clear");
    }

    #[test]
    fn circle_stops_at_the_clip_edge() {
        let mut fb = FrameBuffer::new(20, 20);
        fill_circle(&mut fb, 10.0, 10.0, 6.0, Rect::new(0, 0, 20, 10), 0xFFFF_0000, 255);
        assert_eq!(fb.get(10, 9), 0x00FF_0000);
        assert_eq!(fb.get(10, 10), 0, "below the clip");
    }

    #[test]
    fn blit_stretches_and_clips() {
        let sprite = Sprite { width: 2, height: 1, pixels: vec![0xFF00_00FF, 0xFF00_FF00] };
        let mut fb = FrameBuffer::new(8, 2);
        blit_scaled(&mut fb, &sprite, Rect::new(0, 0, 8, 2), Rect::new(0, 0, 6, 2), 255);
        assert_eq!(fb.get(0, 1), 0x0000_00FF);
        assert_eq!(fb.get(3, 0), 0x0000_00FF);
        assert_eq!(fb.get(4, 0), 0x0000_FF00);
        assert_eq!(fb.get(6, 0), 0, "clipped");
    }

    #[test]
    fn stretch_fills_the_surface() {
        let src = FrameBuffer { width: 2, height: 1, pixels: vec![1, 2] };
        let mut fb = FrameBuffer::new(4, 2);
        let all = fb.bounds();
        stretch_into(&mut fb, &src, all);
        assert_eq!(fb.pixels, vec![1, 1, 2, 2, 1, 1, 2, 2]);
    }

    #[test]
    fn stretch_only_touches_the_region() {
        let src = FrameBuffer { width: 2, height: 1, pixels: vec![1, 2] };
        let mut fb = FrameBuffer::new(4, 2);
        stretch_into(&mut fb, &src, Rect::new(1, 1, 3, 2));
        assert_eq!(fb.pixels, vec![0, 0, 0, 0, 0, 1, 2, 0]);
    }

    #[test]
    fn text_metrics_scale() {
        assert_eq!(text_width("", 2), 0);
        assert_eq!(text_width("AB", 1), 11);
        assert_eq!(text_width("AB", 2), 22);
        assert_eq!(line_height(2), 16);
        assert!(glyph5x7('q').is_some(), "lowercase maps to uppercase");
    }
}
