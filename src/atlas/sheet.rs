//! Atlas sheet rendering
//!
//! Composites pre-scaled glyphs onto one transparent RGBA sheet and
//! encodes it as PNG. No resampling happens here.

use std::io::Write;

use image::{Rgba, RgbaImage};

use super::packer::{PackedAtlas, Placement};

/// Allocate a transparent sheet and copy every glyph to its placement
///
/// Pixels are replaced, not blended, so on overlap the later glyph wins.
/// Anything past the sheet bounds (oversized glyphs) is clipped.
pub fn render(atlas: &PackedAtlas) -> RgbaImage {
    let mut sheet = RgbaImage::from_pixel(atlas.sheet_width, atlas.sheet_height, Rgba([0, 0, 0, 0]));
    for glyph in &atlas.glyphs {
        let p = &glyph.placement;
        image::imageops::replace(&mut sheet, &glyph.image, p.x as i64, p.y as i64);
    }
    sheet
}

/// Encode a sheet as RGBA8 PNG, tuned for size
pub fn encode_png<W: Write>(sheet: &RgbaImage, out: W) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(out, sheet.width(), sheet.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Best);
    encoder.set_adaptive_filter(png::AdaptiveFilterType::Adaptive);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(sheet.as_raw())?;
    writer.finish()
}

/// Copy the pixels under `placement` out of a sheet
///
/// Returns None when the rectangle is empty or leaves the sheet.
pub fn crop(sheet: &RgbaImage, placement: &Placement) -> Option<RgbaImage> {
    if placement.width == 0 || placement.height == 0 {
        return None;
    }
    let x_end = placement.x.checked_add(placement.width)?;
    let y_end = placement.y.checked_add(placement.height)?;
    if x_end > sheet.width() || y_end > sheet.height() {
        return None;
    }
    Some(
        image::imageops::crop_imm(
            sheet,
            placement.x,
            placement.y,
            placement.width,
            placement.height,
        )
        .to_image(),
    )
}

/// True if any pixel has non-zero alpha
pub fn has_visible_pixels(image: &RgbaImage) -> bool {
    image.pixels().any(|px| px.0[3] != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::packer::PackedGlyph;

    fn glyph(ch: char, x: u32, y: u32, w: u32, h: u32, color: [u8; 4]) -> PackedGlyph {
        PackedGlyph {
            placement: Placement { ch, x, y, width: w, height: h },
            image: RgbaImage::from_pixel(w, h, Rgba(color)),
        }
    }

    fn atlas(width: u32, height: u32, glyphs: Vec<PackedGlyph>) -> PackedAtlas {
        PackedAtlas {
            target_height: height,
            sheet_width: width,
            sheet_height: height,
            shelf_count: 1,
            glyphs,
            oversized: Vec::new(),
        }
    }

    #[test]
    fn test_render_places_pixels() {
        let a = atlas(
            10,
            4,
            vec![
                glyph('a', 0, 0, 4, 4, [255, 0, 0, 255]),
                glyph('b', 6, 0, 4, 4, [0, 0, 255, 255]),
            ],
        );
        let sheet = render(&a);
        assert_eq!(sheet.dimensions(), (10, 4));
        assert_eq!(*sheet.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*sheet.get_pixel(3, 3), Rgba([255, 0, 0, 255]));
        // padding column stays transparent
        assert_eq!(*sheet.get_pixel(4, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*sheet.get_pixel(5, 2), Rgba([0, 0, 0, 0]));
        assert_eq!(*sheet.get_pixel(9, 3), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_last_write_wins() {
        let a = atlas(
            4,
            4,
            vec![
                glyph('a', 0, 0, 4, 4, [255, 0, 0, 255]),
                glyph('b', 2, 0, 2, 4, [0, 255, 0, 255]),
            ],
        );
        let sheet = render(&a);
        assert_eq!(*sheet.get_pixel(1, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(*sheet.get_pixel(2, 0), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_replace_keeps_translucent_source() {
        let a = atlas(2, 2, vec![glyph('a', 0, 0, 2, 2, [10, 20, 30, 40])]);
        let sheet = render(&a);
        assert_eq!(*sheet.get_pixel(1, 1), Rgba([10, 20, 30, 40]));
    }

    #[test]
    fn test_oversized_is_clipped() {
        let a = atlas(4, 2, vec![glyph('a', 0, 0, 8, 2, [1, 2, 3, 255])]);
        let sheet = render(&a);
        assert_eq!(sheet.dimensions(), (4, 2));
        assert_eq!(*sheet.get_pixel(3, 1), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn test_crop_bounds() {
        let sheet = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        let inside = Placement { ch: 'a', x: 4, y: 4, width: 4, height: 4 };
        let outside = Placement { ch: 'a', x: 5, y: 4, width: 4, height: 4 };
        let empty = Placement { ch: 'a', x: 0, y: 0, width: 0, height: 4 };
        assert_eq!(crop(&sheet, &inside).unwrap().dimensions(), (4, 4));
        assert!(crop(&sheet, &outside).is_none());
        assert!(crop(&sheet, &empty).is_none());
    }

    #[test]
    fn test_png_decodes_back() {
        let a = atlas(6, 3, vec![glyph('a', 1, 0, 3, 3, [9, 8, 7, 255])]);
        let sheet = render(&a);
        let mut bytes = Vec::new();
        encode_png(&sheet, &mut bytes).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.as_raw(), sheet.as_raw());
    }

    #[test]
    fn test_two_runs_encode_identical_bytes() {
        use crate::atlas::packer::{pack, PackOptions};
        use crate::source::GlyphEntry;

        let entries: Vec<GlyphEntry> = (0..24u32)
            .map(|i| {
                let (w, h) = (40 + i * 5, 64);
                let image = RgbaImage::from_fn(w, h, |x, y| {
                    Rgba([(x * 7 + i) as u8, (y * 3) as u8, (x ^ y) as u8, (128 + y) as u8])
                });
                GlyphEntry {
                    ch: char::from_u32(0x1F600 + i).unwrap(),
                    image,
                    path: format!("png/128/emoji_u{:x}.png", 0x1F600 + i),
                }
            })
            .collect();
        let options = PackOptions {
            sheet_width: 160,
            ..PackOptions::default()
        };

        let run = || {
            let sheet = render(&pack(&entries, 24, &options));
            let mut bytes = Vec::new();
            encode_png(&sheet, &mut bytes).unwrap();
            (sheet, bytes)
        };
        let (sheet_a, png_a) = run();
        let (sheet_b, png_b) = run();
        assert_eq!(sheet_a.dimensions(), sheet_b.dimensions());
        assert_eq!(sheet_a.as_raw(), sheet_b.as_raw());
        assert_eq!(png_a, png_b);
    }

    #[test]
    fn test_visible_pixels() {
        let clear = RgbaImage::new(3, 3);
        assert!(!has_visible_pixels(&clear));
        let mut dot = clear.clone();
        dot.put_pixel(1, 1, Rgba([0, 0, 0, 1]));
        assert!(has_visible_pixels(&dot));
    }
}
