mod app;
mod error;
mod inputmap;
mod render;
mod window;

pub use self::{
    app::Chip8App,
    error::{AppError, ErrorKind},
    inputmap::{InputKind, InputMap},
};

pub type EventLoop = winit::event_loop::EventLoop<()>;

/// Named actions that can be bound in the key map.
pub mod actions {
    /// End the session.
    pub const EXIT: &str = "exit";
}
