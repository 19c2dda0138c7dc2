//! Provides access to an external clipboard

use std::io;

/// Supplies text for the `paste-from-clipboard` command.
///
/// The editor degrades gracefully when no provider is installed or when a
/// provider fails: the paste command simply has no effect.
pub trait Clipboard: Send + Sync {
    /// Returns the current clipboard contents.
    fn get_text(&self) -> io::Result<String>;
}
