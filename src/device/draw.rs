use half::f16;

/// Display pixels handed to a [`DrawTarget`], in the format the display buffer was built with.
#[derive(Clone, Copy, Debug)]
pub enum DisplayPixels<'a> {
    /// 8-bit RGBA.
    Byte(&'a [[u8; 4]]),
    /// Half-float linear RGBA.
    Half(&'a [[f16; 4]]),
}

/// Placement of a display tile inside the full frame.
#[derive(Clone, Copy, Debug)]
pub struct DrawRequest<'a> {
    /// Tile pixels, `width * height` entries, row-major.
    pub pixels: DisplayPixels<'a>,
    /// Width of the region holding valid pixels.
    pub draw_width: u32,
    /// Height of the region holding valid pixels.
    pub draw_height: u32,
    /// Tile x position in the full frame.
    pub full_x: i32,
    /// Tile y position in the full frame.
    pub full_y: i32,
    /// Tile width.
    pub width: u32,
    /// Tile height.
    pub height: u32,
    /// Whether the tile should be blended over existing content.
    pub transparent: bool,
}

/// Something that can present display tiles, e.g. a viewport.
pub trait DrawTarget {
    /// Present one tile.
    fn draw_pixels(&mut self, request: DrawRequest<'_>);
}
