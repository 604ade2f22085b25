use std::num::NonZeroU32;

use chip8::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, PIXEL_SCALE};
use glutin::config::Config as GlutinConfig;
use glutin::config::ConfigTemplateBuilder;
use glutin::context::GlProfile;
use glutin::context::{ContextApi, ContextAttributesBuilder, Version as GlVersion};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::SwapInterval;
use glutin::surface::WindowSurface;
use glutin_winit::GlWindow;
use raw_window_handle::HasRawWindowHandle;
use winit::dpi::PhysicalSize;
use winit::window::WindowBuilder;

use crate::{error::AppError, EventLoop};

pub struct WindowContext {
    pub(crate) window: winit::window::Window,
    pub(crate) gl_context: glutin::context::PossiblyCurrentContext,
    pub(crate) gl_display: glutin::display::Display,
    pub(crate) gl_surface: glutin::surface::Surface<WindowSurface>,
}

impl WindowContext {
    /// Create a Window with an OpenGL context.
    ///
    /// The window is sized to fit the Chip8 display scaled by [`PIXEL_SCALE`].
    ///
    /// - For Windows, the main window must be created first, for the OpenGL
    ///   context to be created.
    /// - For Android, the OpenGL context is created before the window exists.
    pub fn new(event_loop: &EventLoop) -> Result<Self, AppError> {
        // --------------------------------------------------------------------
        // Window

        let inner_size = PhysicalSize::new(
            DISPLAY_WIDTH as u32 * PIXEL_SCALE,
            DISPLAY_HEIGHT as u32 * PIXEL_SCALE,
        );
        let window_builder = WindowBuilder::new()
            .with_resizable(false)
            .with_inner_size(inner_size)
            .with_title("chip8");

        let template = ConfigTemplateBuilder::new().prefer_hardware_accelerated(Some(true));

        // Helper crate handles the cross-platform complexity of setting up an OpenGL context.
        let (window, gl_config) = glutin_winit::DisplayBuilder::new()
            .with_preference(glutin_winit::ApiPrefence::FallbackEgl)
            .with_window_builder(Some(window_builder.clone()))
            .build(event_loop, template, |configs| {
                // Pick the config with the fewest samples, the blocks are axis aligned.
                configs
                    .inspect(|c: &GlutinConfig| {
                        log::debug!("consider config: num_samples={}", c.num_samples())
                    })
                    .min_by_key(|c| c.num_samples())
                    .expect("the system must supply at least one GL config")
            })
            .map_err(AppError::display)?;

        log::info!("picked GL config with {} samples", gl_config.num_samples());

        // On Android, the window is not available when the OpenGL display has to be created.
        // However on Windows the main window must first exist before OpenGL can be initialized.
        let window = match window {
            Some(window) => window,
            None => {
                log::info!("creating window with finalize_window");
                glutin_winit::finalize_window(event_loop, window_builder, &gl_config)?
            }
        };

        // --------------------------------------------------------------------
        // OpenGL Context

        // Raw handle is required to build the OpenGL context.
        let raw_window_handle = window.raw_window_handle();

        // The display could be obtained from any object created by it, so we
        // can query it from the config.
        let gl_display = gl_config.display();

        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(GlVersion::new(3, 3))))
            .with_profile(GlProfile::Core)
            .build(Some(raw_window_handle));

        // Since glutin by default tries to create OpenGL core context, which may not be
        // present we should try GLES.
        let fallback_context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(None))
            .build(Some(raw_window_handle));

        let not_current_gl_context = unsafe {
            match gl_display.create_context(&gl_config, &context_attributes) {
                Ok(context) => context,
                Err(_) => {
                    log::warn!("falling back to OpenGL ES");
                    gl_display.create_context(&gl_config, &fallback_context_attributes)?
                }
            }
        };

        // --------------------------------------------------------------------
        // Surface

        let attrs = window.build_surface_attributes(<_>::default());
        let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs)? };

        // Make context current for the next phase of configuration.
        let gl_context = not_current_gl_context.make_current(&gl_surface)?;

        // The run loop paces itself; vsync would throttle the instruction rate.
        if let Err(err) = gl_surface.set_swap_interval(&gl_context, SwapInterval::DontWait) {
            log::warn!("error disabling vsync: {err:?}");
        }

        // For WGL (Windows) the OpenGL context must be current,
        // otherwise only a subset of functions are loaded.
        if !gl_context.is_current() {
            return Err(AppError::display(
                "context must be current to load OpenGL functions",
            ));
        }

        Ok(Self {
            window,
            gl_context,
            gl_display,
            gl_surface,
        })
    }

    /// Returns an identifier unique to the window.
    #[inline]
    pub fn window_id(&self) -> winit::window::WindowId {
        self.window.id()
    }

    /// Queue a redraw, delivered after all OS events have been processed.
    #[inline]
    pub fn request_redraw(&self) {
        self.window.request_redraw()
    }

    /// Swaps the underlying back buffers when the surface is not single buffered.
    #[inline]
    pub fn swap_buffers(&self) -> glutin::error::Result<()> {
        self.gl_surface.swap_buffers(&self.gl_context)
    }

    /// Make the underlying surface current on the calling thread.
    #[inline]
    pub fn make_context_current(&self) -> glutin::error::Result<()> {
        self.gl_context.make_current(&self.gl_surface)
    }

    /// Resize the surface to a new size.
    ///
    /// Does not resize the window. Returns `false` for a zero sized surface,
    /// which is left untouched.
    pub fn resize_surface(&self, size: impl Into<PhysicalSize<u32>>) -> bool {
        let size = size.into();
        match (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
            (Some(width), Some(height)) => {
                self.gl_surface.resize(&self.gl_context, width, height);
                true
            }
            _ => false,
        }
    }
}
