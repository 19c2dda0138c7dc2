//! Syntax highlighting for the input line

/// Transforms the input line into the text actually displayed.
///
/// The returned string may contain terminal escape sequences; any such
/// zero-width spans must be bracketed by the characters `'\x01'` and
/// `'\x02'` so that display-width calculations can skip them.
pub trait Highlighter {
    /// Returns the display form of the given line.
    fn highlight(&self, line: &str) -> String;
}
