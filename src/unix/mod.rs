mod caps;
mod terminal;
mod tty;

pub use self::caps::{auto_right_margin, eat_newline_glitch};
pub use self::terminal::terminal_read;
pub use self::tty::special_chars;
