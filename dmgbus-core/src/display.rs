use std::time::Duration;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;
pub const SCREEN_PIXELS: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

/// A finished frame, one grayscale byte per pixel in row-major order (0 = black, 255 = white).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![0; SCREEN_PIXELS],
        }
    }

    /// Out-of-bounds coordinates are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < SCREEN_WIDTH && y < SCREEN_HEIGHT {
            self.pixels[x + y * SCREEN_WIDTH] = value;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        (x < SCREEN_WIDTH && y < SCREEN_HEIGHT).then(|| self.pixels[x + y * SCREEN_WIDTH])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// A short diagonal gray ramp from the top-left corner, useful for checking that a display
    /// backend is wired up.
    pub fn test_pattern() -> Self {
        let mut frame_buffer = Self::new();
        for i in 0..20 {
            frame_buffer.set(i, i, (i * 12) as u8);
        }
        frame_buffer
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// A presentation backend. The core never decides when a frame is shown; the emulator loop calls
/// `update` with a finished frame and `wait` to pace itself.
pub trait Display {
    type Err;

    fn update(&mut self, frame_buffer: &FrameBuffer) -> Result<(), Self::Err>;

    fn wait(&mut self, duration: Duration);
}
