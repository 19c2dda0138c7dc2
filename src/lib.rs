//! Provides a configurable, extensible, interactive input reader for Unix
//! terminals, with command line editing in both emacs and vi styles.
//!
//! Key behavior is compatible with GNU Readline: history recall and
//! incremental search, history event designators (`!!`, `!n`, `^a^b^`),
//! a kill ring with yank and yank-pop, programmable key bindings and
//! keyboard macros, and tab completion.
//!
//! The main entry to interactive read operations is the [`Interface`] type.
//!
//! # Basic example
//!
//! ```no_run
//! # use std::io;
//! use linewise::{Interface, ReadResult};
//!
//! # fn run() -> io::Result<()> {
//! let reader = Interface::new("my-application")?;
//!
//! reader.set_prompt("my-app> ")?;
//!
//! while let ReadResult::Input(input) = reader.read_line()? {
//!     println!("got input {:?}", input);
//! }
//!
//! println!("Goodbye.");
//! # Ok(())
//! # }
//! ```
//!
//! [`Interface`]: interface/struct.Interface.html

#![deny(missing_docs)]

#[cfg(test)] #[macro_use] extern crate assert_matches;

pub use crate::buffer::Buffer;
pub use crate::clipboard::Clipboard;
pub use crate::command::Command;
pub use crate::complete::{Completer, Completion, Suffix};
pub use crate::expand::{expand_events, EventNotFound};
pub use crate::function::Function;
pub use crate::highlighting::Highlighter;
pub use crate::history::History;
pub use crate::interface::{Directive, Interface};
pub use crate::keymap::{Binding, FindResult, KeyMap};
pub use crate::killring::KillRing;
pub use crate::prompter::Prompter;
pub use crate::reader::{Reader, ReadResult};
pub use crate::terminal::{DefaultTerminal, Signal, Size, Terminal};
pub use crate::writer::Writer;

pub mod buffer;
pub mod chars;
pub mod clipboard;
pub mod command;
pub mod complete;
pub mod expand;
pub mod function;
pub mod highlighting;
pub mod history;
pub mod interface;
pub mod keymap;
pub mod killring;
pub mod memory;
pub mod prompter;
pub mod reader;
pub mod table;
pub mod terminal;

mod messages;
mod util;
pub mod variables;
pub mod writer;

#[cfg(unix)]
#[path = "unix/mod.rs"]
mod sys;

#[cfg(test)]
mod test {
    use crate::interface::Interface;
    use crate::terminal::{DefaultTerminal, Terminal};

    fn assert_has_traits<T: 'static + Send + Sync>() {}

    fn assert_generic_traits<T: 'static + Terminal>() {
        assert_has_traits::<Interface<T>>();
    }

    #[test]
    fn test_interface_traits() {
        assert_generic_traits::<DefaultTerminal>();
    }
}
