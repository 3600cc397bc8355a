use nalgebra::Vector3;

/// An 8-bit RGBA color, the unit stored in and read back from pick buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    /// Cleared pick-buffer pixel. Never assigned to a camera.
    pub const TRANSPARENT: Rgba = Rgba([0, 0, 0, 0]);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub fn r(&self) -> u8 {
        self.0[0]
    }

    pub fn g(&self) -> u8 {
        self.0[1]
    }

    pub fn b(&self) -> u8 {
        self.0[2]
    }

    pub fn a(&self) -> u8 {
        self.0[3]
    }

    /// Quantizes a linear [0, 1] color to an opaque 8-bit color.
    pub fn from_linear(color: Vector3<f32>) -> Self {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self([q(color.x), q(color.y), q(color.z), 255])
    }

    /// Expands the RGB channels back to [0, 1].
    pub fn to_linear(&self) -> Vector3<f32> {
        Vector3::new(
            self.r() as f32 / 255.0,
            self.g() as f32 / 255.0,
            self.b() as f32 / 255.0,
        )
    }
}

/// Color reserved for the selected camera of a grid.
///
/// Walk colors always satisfy `r >= g >= b` with `r - b <= PICK_COLOR_STEP`,
/// so this value can never be produced by [`pick_color`].
pub const SELECTION_HIGHLIGHT: Rgba = Rgba::new(255, 200, 0, 255);

/// Channel increment of the pick-color walk.
pub const PICK_COLOR_STEP: u8 = 2;

/// Number of distinct colors the walk can produce before a channel overflows.
pub const PICK_COLOR_CAPACITY: usize = 3 * (255 / PICK_COLOR_STEP as usize);

/// Unique pick color of the camera at `ordinal` in row-major order.
///
/// The walk starts at black and adds `PICK_COLOR_STEP` to one channel per
/// camera, cycling red, green, blue. After `n` increments the red channel has
/// received `ceil(n / 3)` of them, green `ceil((n - 1) / 3)` and blue `n / 3`.
pub fn pick_color(ordinal: usize) -> Rgba {
    let n = ordinal + 1;
    let step = PICK_COLOR_STEP as usize;
    let channel = |increments: usize| (increments * step).min(255) as u8;
    Rgba::new(
        channel((n + 2) / 3),
        channel((n + 1) / 3),
        channel(n / 3),
        255,
    )
}

/// Inverse of [`pick_color`]: recovers the row-major ordinal from a color.
///
/// Returns `None` for the background, the selection highlight and any value
/// the walk does not produce.
pub fn pick_ordinal(color: Rgba) -> Option<usize> {
    if color.a() != 255 {
        return None;
    }
    let sum = color.r() as usize + color.g() as usize + color.b() as usize;
    let step = PICK_COLOR_STEP as usize;
    if sum == 0 || sum % step != 0 {
        return None;
    }
    let ordinal = sum / step - 1;
    (ordinal < PICK_COLOR_CAPACITY && pick_color(ordinal) == color).then_some(ordinal)
}
