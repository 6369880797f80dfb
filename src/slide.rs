use raylib::prelude::*;

pub struct Slide {
    image: Texture2D,
}

impl Slide {
    pub fn new(image: Texture2D) -> Self {
        Self { image }
    }

    /// Draws the slide filling `frame` (cropped, never letterboxed), shrunk
    /// around the frame center by `scale` and faded by `opacity`.
    pub fn draw(&self, d: &mut RaylibDrawHandle, frame: Rectangle, opacity: f32, scale: f32) {
        if opacity <= 0.0 {
            return;
        }
        let source = cover_source(
            self.image.width() as f32,
            self.image.height() as f32,
            frame.width,
            frame.height,
        );

        let scaled_width = frame.width * scale;
        let scaled_height = frame.height * scale;
        let dest = Rectangle::new(
            frame.x + (frame.width - scaled_width) * 0.5,
            frame.y + (frame.height - scaled_height) * 0.5,
            scaled_width,
            scaled_height,
        );

        let alpha = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
        d.draw_texture_pro(&self.image, source, dest, Vector2::new(0.0, 0.0), 0.0, Color::new(255, 255, 255, alpha));
    }
}

/// Centered source rectangle with the frame's aspect ratio.
pub fn cover_source(tex_width: f32, tex_height: f32, frame_width: f32, frame_height: f32) -> Rectangle {
    if tex_width <= 0.0 || tex_height <= 0.0 || frame_width <= 0.0 || frame_height <= 0.0 {
        return Rectangle::new(0.0, 0.0, tex_width.max(0.0), tex_height.max(0.0));
    }
    let frame_ratio = frame_width / frame_height;
    if tex_width / tex_height > frame_ratio {
        // Too wide: crop the sides
        let width = tex_height * frame_ratio;
        Rectangle::new((tex_width - width) * 0.5, 0.0, width, tex_height)
    } else {
        // Too tall: crop top and bottom
        let height = tex_width / frame_ratio;
        Rectangle::new(0.0, (tex_height - height) * 0.5, tex_width, height)
    }
}
