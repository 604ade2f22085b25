use std::fmt;

use chip8::{
    constants::{DISPLAY_BUFFER_SIZE, DISPLAY_HEIGHT, DISPLAY_WIDTH, PIXEL_SCALE},
    Display, Framebuffer,
};
use glow::{Context as GlowContext, HasContext};
use glutin::display::Display as GlDisplay;
use glutin::prelude::GlDisplay as _;

/// Draws the Chip8 framebuffer as scaled up blocks of white on black.
pub struct Render {
    /// The interface to the loaded OpenGL function.
    gl: GlowContext,
    info: OpenGLInfo,
    /// Copy of the last framebuffer handed over by the run loop.
    pixels: Box<[bool; DISPLAY_BUFFER_SIZE]>,
    dirty: bool,
}

impl Render {
    pub fn new(gl_display: &GlDisplay) -> Self {
        // Create glow context.
        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|symbol| gl_display.get_proc_address(symbol))
        };

        let info = OpenGLInfo::new(&gl);

        Self {
            gl,
            info,
            pixels: Box::new([false; DISPLAY_BUFFER_SIZE]),
            // first frame is always presented
            dirty: true,
        }
    }

    pub fn opengl_info(&self) -> &OpenGLInfo {
        &self.info
    }

    /// Whether the framebuffer changed since it was last presented.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Resize the OpenGL viewport to match the window surface.
    pub fn resize(&mut self, width: u32, height: u32) {
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
        }
        self.dirty = true;
    }

    /// Draw the current pixels into the bound surface.
    ///
    /// Every lit pixel is a scissored clear, which is plenty for 2048 pixels.
    pub fn present(&mut self) {
        let scale = PIXEL_SCALE as i32;

        unsafe {
            self.gl.disable(glow::SCISSOR_TEST);
            self.gl.clear_color(0.0, 0.0, 0.0, 1.0);
            self.gl.clear(glow::COLOR_BUFFER_BIT);

            self.gl.enable(glow::SCISSOR_TEST);
            self.gl.clear_color(1.0, 1.0, 1.0, 1.0);

            for (index, _) in self.pixels.iter().enumerate().filter(|(_, lit)| **lit) {
                let x = (index % DISPLAY_WIDTH) as i32;
                let y = (index / DISPLAY_WIDTH) as i32;

                // OpenGL window coordinates start at the bottom left.
                let flipped_y = DISPLAY_HEIGHT as i32 - 1 - y;

                self.gl.scissor(x * scale, flipped_y * scale, scale, scale);
                self.gl.clear(glow::COLOR_BUFFER_BIT);
            }

            self.gl.disable(glow::SCISSOR_TEST);
        }

        self.dirty = false;
    }
}

impl Display for Render {
    fn draw(&mut self, display: &Framebuffer) {
        if self.pixels.as_slice() != display.pixels().as_slice() {
            self.pixels.copy_from_slice(display.pixels());
            self.dirty = true;
        }
    }
}

pub struct OpenGLInfo {
    pub version: String,
    pub renderer: String,
    pub vendor: String,
}

impl OpenGLInfo {
    pub fn new(gl: &GlowContext) -> Self {
        unsafe {
            Self {
                version: gl.get_parameter_string(glow::VERSION),
                renderer: gl.get_parameter_string(glow::RENDERER),
                vendor: gl.get_parameter_string(glow::VENDOR),
            }
        }
    }
}

impl fmt::Display for OpenGLInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let Self {
            version,
            renderer,
            vendor,
        } = self;
        writeln!(f, "OpenGL Version: {version}")?;
        writeln!(f, "Renderer: {renderer}")?;
        writeln!(f, "Vendor: {vendor}")?;
        Ok(())
    }
}
