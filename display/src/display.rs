use sdl2::pixels::PixelFormatEnum;

use vm8_core::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use vm8_core::state::FrameBuffer;

const SCALE: usize = 10;

/// SDL2 presentation of the 64x32 monochrome framebuffer.
///
/// The display is passive: it renders only when the machine reports a
/// changed framebuffer, scaled up by `SCALE` and drawn as a black and white
/// RGB24 texture.
pub struct Display {
    canvas: sdl2::render::WindowCanvas,
}

// TODO surface SDL failures instead of unwrapping once the runner grows a
// proper error path for window creation
impl Display {
    /// Creates a window bound to an sdl2 context.
    pub fn new(sdl: &sdl2::Sdl) -> Self {
        let video_subsystem = sdl.video().unwrap();
        let window = video_subsystem
            .window(
                "vm8",
                (DISPLAY_WIDTH * SCALE) as u32,
                (DISPLAY_HEIGHT * SCALE) as u32,
            )
            .position_centered()
            .opengl()
            .build()
            .unwrap();
        let canvas = window.into_canvas().build().unwrap();

        Display { canvas }
    }

    /// Flattens the framebuffer into an RGB24 pixel array.
    ///
    /// Each 0/1 cell becomes three identical channel bytes at intensity 0 or
    /// 255, rows concatenated top to bottom.
    fn frame_to_texture(frame: &FrameBuffer) -> Vec<u8> {
        frame
            .iter()
            .flat_map(|row| row.iter())
            .flat_map(|cell| std::iter::repeat(cell * 255).take(3))
            .collect()
    }

    /// Uploads the framebuffer as a streaming texture and presents it.
    pub fn render(&mut self, frame: &FrameBuffer) {
        let texture_creator = self.canvas.texture_creator();

        let mut texture = texture_creator
            .create_texture_streaming(
                PixelFormatEnum::RGB24,
                DISPLAY_WIDTH as u32,
                DISPLAY_HEIGHT as u32,
            )
            .unwrap();

        texture
            .with_lock(None, |buffer: &mut [u8], _pitch: usize| {
                buffer.copy_from_slice(&Display::frame_to_texture(frame));
            })
            .unwrap();

        self.canvas.copy(&texture, None, None).unwrap();
        self.canvas.present()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_to_texture_expands_cells_to_rgb() {
        let mut frame: FrameBuffer = [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
        frame[0][0..2].copy_from_slice(&[0, 1]);
        frame[1][0..2].copy_from_slice(&[1, 0]);
        let texture = Display::frame_to_texture(&frame);

        assert_eq!(texture.len(), DISPLAY_WIDTH * DISPLAY_HEIGHT * 3);
        assert_eq!(texture[0..6], [0, 0, 0, 255, 255, 255]);
        assert_eq!(texture[192..198], [255, 255, 255, 0, 0, 0]);
    }
}
