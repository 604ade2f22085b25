use chip8::prelude::*;
use log::info;
use winit::{
    event::{Event as EV, WindowEvent as WE},
    event_loop::EventLoopBuilder,
    platform::run_return::EventLoopExtRunReturn,
};

use crate::{error::AppError, render::Render, window::WindowContext, EventLoop, InputMap};

/// Chip8 Application
pub struct Chip8App {
    window: WindowContext,
    render: Render,
    input_map: InputMap,
    runner: Runner,
}

impl Chip8App {
    /// Create the Chip8 window app, with an empty virtual machine.
    pub fn new(
        event_loop: &EventLoop,
        conf: Chip8Conf,
        input_map: InputMap,
    ) -> Result<Self, AppError> {
        let window = WindowContext::new(event_loop)?;

        let render = Render::new(&window.gl_display);
        info!("created OpenGL renderer:\n{}", render.opengl_info());

        let runner = Runner::new(Chip8Vm::new(conf));

        Ok(Self {
            window,
            render,
            input_map,
            runner,
        })
    }

    pub fn create_event_loop() -> EventLoop {
        EventLoopBuilder::new().build()
    }

    /// Load a program image already read into memory.
    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> Result<(), AppError> {
        self.runner.vm_mut().load_bytecode(bytecode)?;
        Ok(())
    }
}

/// Event Loop.
impl Chip8App {
    /// Run the loaded program until the user quits or the interpreter halts.
    pub fn run(&mut self, event_loop: &mut EventLoop) -> Status {
        let main_window_id = self.window.window_id();
        let mut status = None;

        // Window and program setup time must not reach the timers.
        self.runner.reset_clock();

        event_loop.run_return(|event, _, control_flow| {
            control_flow.set_poll();

            match event {
                EV::MainEventsCleared => {
                    // One interpreter cycle per pass, paced by the runner clock.
                    if let Some(s) = self.runner.run_once(&mut self.input_map, &mut self.render) {
                        status = Some(s);
                        control_flow.set_exit();
                        return;
                    }

                    if self.render.is_dirty() {
                        self.window.request_redraw();
                    }
                }
                EV::RedrawRequested(window_id) if window_id == main_window_id => {
                    if let Err(err) = self.window.make_context_current() {
                        log::error!("failed to make context current: {err}");
                        return;
                    }
                    self.render.present();
                    if let Err(err) = self.window.swap_buffers() {
                        log::error!("failed to swap buffers: {err}");
                    }
                }
                EV::WindowEvent { window_id, event } if window_id == main_window_id => {
                    match event {
                        WE::Resized(size) => {
                            if self.window.resize_surface(size) {
                                self.render.resize(size.width, size.height);
                            }
                        }
                        WE::KeyboardInput { input, .. } => {
                            if let Some(virtual_keycode) = input.virtual_keycode {
                                self.input_map.push_key(virtual_keycode, input.state);
                            }
                        }
                        WE::CloseRequested => {
                            // Picked up by the runner on its next poll.
                            self.input_map.request_quit();
                        }
                        _ => { /* blank */ }
                    }
                }
                _ => { /* blank */ }
            }
        });

        status.unwrap_or(Status::Quit)
    }
}
