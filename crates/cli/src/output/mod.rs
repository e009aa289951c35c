//! Output handling for human-readable and JSON modes

mod formatter;

pub use formatter::Formatter;

/// Output settings shared by all commands
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Strict JSON on stdout, no colors
    pub json: bool,
    pub no_color: bool,
    /// Suppress non-error output
    pub quiet: bool,
}
