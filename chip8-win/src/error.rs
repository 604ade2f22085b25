//! Application errors
use std::fmt;

#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Chip8(err) => Some(err),
            ErrorKind::Io(err) => Some(err),
            ErrorKind::Window(err) => Some(err),
            ErrorKind::Gl(err) => Some(err),
            ErrorKind::Display(_) => None,
            ErrorKind::Keymap(err) => Some(err),
        }
    }
}

#[derive(Debug)]
pub enum ErrorKind {
    Chip8(chip8::Chip8Error),
    Io(std::io::Error),
    Window(winit::error::OsError),
    Gl(glutin::error::Error),
    /// Display setup failure with no underlying error value.
    Display(String),
    Keymap(serde_yaml::Error),
}

impl AppError {
    pub fn display(message: impl ToString) -> Self {
        Self {
            kind: ErrorKind::Display(message.to_string()),
        }
    }

    /// True when the window or graphics context could not be brought up.
    pub fn is_display(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Window(_) | ErrorKind::Gl(_) | ErrorKind::Display(_)
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chip8(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Window(err) => write!(f, "display failed to initialize: {err}"),
            Self::Gl(err) => write!(f, "display failed to initialize: {err}"),
            Self::Display(msg) => write!(f, "display failed to initialize: {msg}"),
            Self::Keymap(err) => write!(f, "invalid key map: {err}"),
        }
    }
}

impl From<chip8::Chip8Error> for AppError {
    fn from(err: chip8::Chip8Error) -> Self {
        Self {
            kind: ErrorKind::Chip8(err),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self {
            kind: ErrorKind::Io(err),
        }
    }
}

impl From<winit::error::OsError> for AppError {
    fn from(err: winit::error::OsError) -> Self {
        Self {
            kind: ErrorKind::Window(err),
        }
    }
}

impl From<glutin::error::Error> for AppError {
    fn from(err: glutin::error::Error) -> Self {
        Self {
            kind: ErrorKind::Gl(err),
        }
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        Self {
            kind: ErrorKind::Keymap(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = AppError::display("no GL config");
        assert!(err.is_display());
        assert_eq!(
            err.to_string(),
            "display failed to initialize: no GL config"
        );

        let err = AppError::from(chip8::Chip8Error::LargeProgram { size: 4000 });
        assert!(!err.is_display());
        assert!(err.to_string().starts_with("program failed to load"));
    }
}
