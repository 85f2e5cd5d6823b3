//! Application error type.
//!
//! Every failure carries a process exit code plus a human-readable message.
//! The codes classify what went wrong:
//!
//! - `2`: malformed input files or invalid configuration
//! - `3`: physically inconsistent atmosphere data
//! - `4`: evaluation, rendering, or output failures

/// Malformed input or invalid configuration.
pub const EXIT_INPUT: u8 = 2;
/// Physical-consistency violation (missing H2/He, negative abundances, ...).
pub const EXIT_PHYSICAL: u8 = 3;
/// Model evaluation or output failure.
pub const EXIT_OUTPUT: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn physical(message: impl Into<String>) -> Self {
        Self::new(EXIT_PHYSICAL, message)
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::new(EXIT_OUTPUT, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
