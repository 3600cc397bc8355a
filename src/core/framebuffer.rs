use crate::core::color::Rgba;
use image::RgbaImage;

/// A 2D buffer containing RGBA color and depth information.
///
/// Used both as the offscreen picking target and as the color target of the
/// preview renderer. Depth is NDC z; smaller is closer.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    color: Vec<Rgba>,
    depth: Vec<f32>,
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            color: vec![Rgba::TRANSPARENT; size],
            depth: vec![f32::INFINITY; size],
        }
    }

    pub fn clear(&mut self, color: Rgba) {
        self.color.fill(color);
        self.depth.fill(f32::INFINITY);
    }

    #[inline(always)]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Writes `color` if `depth` is closer than what the pixel holds.
    /// Returns true if the pixel was written.
    #[inline]
    pub fn depth_test_and_set(&mut self, x: i64, y: i64, depth: f32, color: Rgba) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x as usize, y as usize);
        if depth >= self.depth[idx] {
            return false;
        }
        self.depth[idx] = depth;
        self.color[idx] = color;
        true
    }

    /// Fills the axis-aligned square of half-extent `radius` centered on
    /// `(cx, cy)`, depth-tested per pixel.
    pub fn fill_square(&mut self, cx: f32, cy: f32, radius: f32, depth: f32, color: Rgba) {
        let x0 = (cx - radius).floor() as i64;
        let x1 = (cx + radius).ceil() as i64;
        let y0 = (cy - radius).floor() as i64;
        let y1 = (cy + radius).ceil() as i64;
        for y in y0..y1 {
            for x in x0..x1 {
                self.depth_test_and_set(x, y, depth, color);
            }
        }
    }

    /// Reads back one pixel, the CPU analogue of a GPU pixel readback.
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        (x < self.width && y < self.height).then(|| self.color[self.index(x, y)])
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.color
    }

    pub fn to_image(&self) -> RgbaImage {
        let mut img = RgbaImage::new(self.width as u32, self.height as u32);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgba(self.color[self.index(x as usize, y as usize)].0);
        }
        img
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_test_keeps_closest() {
        let mut fb = FrameBuffer::new(4, 4);
        let near = Rgba::new(1, 0, 0, 255);
        let far = Rgba::new(0, 1, 0, 255);
        assert!(fb.depth_test_and_set(1, 1, 0.2, near));
        assert!(!fb.depth_test_and_set(1, 1, 0.5, far));
        assert_eq!(fb.get_pixel(1, 1), Some(near));
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut fb = FrameBuffer::new(2, 2);
        assert!(!fb.depth_test_and_set(-1, 0, 0.0, Rgba::new(1, 1, 1, 255)));
        assert!(!fb.depth_test_and_set(2, 0, 0.0, Rgba::new(1, 1, 1, 255)));
        assert_eq!(fb.get_pixel(2, 0), None);
    }

    #[test]
    fn test_square_is_clipped_to_buffer() {
        let mut fb = FrameBuffer::new(8, 8);
        let c = Rgba::new(9, 9, 9, 255);
        fb.fill_square(0.0, 0.0, 2.0, 0.0, c);
        assert_eq!(fb.get_pixel(0, 0), Some(c));
        assert_eq!(fb.get_pixel(1, 1), Some(c));
        assert_eq!(fb.get_pixel(2, 2), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_clear_resets_depth() {
        let mut fb = FrameBuffer::new(1, 1);
        fb.depth_test_and_set(0, 0, -0.9, Rgba::new(5, 5, 5, 255));
        fb.clear(Rgba::TRANSPARENT);
        assert!(fb.depth_test_and_set(0, 0, 0.9, Rgba::new(6, 6, 6, 255)));
    }
}
