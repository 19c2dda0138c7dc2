//! Provides the trait implemented by user-defined editing widgets
//!
//! A widget reaches the dispatcher in one of two ways: bound directly to
//! a key sequence as a [`Binding::Function`] (most simply through
//! [`Interface::set_triggered_action`]), or registered under a name with
//! [`Interface::define_function`] and bound as a custom command, the way
//! an `inputrc` line would refer to it.
//!
//! [`Binding::Function`]: ../keymap/enum.Binding.html
//! [`Interface::set_triggered_action`]: ../interface/struct.Interface.html#method.set_triggered_action
//! [`Interface::define_function`]: ../interface/struct.Interface.html#method.define_function

use std::io;

use crate::command::Category;
use crate::prompter::Prompter;
use crate::terminal::Terminal;

/// A user-defined editing widget.
///
/// When its key sequence is decoded, the widget runs with the same access
/// to the editor state that built-in commands have, through the given
/// [`Prompter`].
///
/// [`Prompter`]: ../prompter/struct.Prompter.html
pub trait Function<Term: Terminal>: Send + Sync {
    /// Performs the widget's action.
    ///
    /// `count` is the numeric argument accumulated before dispatch, `1`
    /// when none was given; [`Prompter::explicit_arg`] distinguishes the
    /// two cases. `ch` is the final character of the triggering key
    /// sequence, and [`Prompter::sequence`] yields the whole sequence.
    ///
    /// [`Prompter::explicit_arg`]: ../prompter/struct.Prompter.html#method.explicit_arg
    /// [`Prompter::sequence`]: ../prompter/struct.Prompter.html#method.sequence
    fn execute(&self, prompter: &mut Prompter<Term>, count: i32, ch: char)
        -> io::Result<()>;

    /// Classifies the widget for the bookkeeping that follows every
    /// dispatched command.
    ///
    /// The category decides what survives into the next dispatch: a
    /// `Digit` widget preserves the pending numeric argument and a
    /// `Complete` widget keeps the current completion set alive, where
    /// any other category discards both. The value is also what later
    /// commands observe through [`Prompter::last_command_category`].
    ///
    /// [`Prompter::last_command_category`]: ../prompter/struct.Prompter.html#method.last_command_category
    fn category(&self) -> Category {
        Category::Other
    }
}

/// Any suitable closure or `fn` item serves as a widget of the default
/// category.
impl<F, Term: Terminal> Function<Term> for F where
        F: Send + Sync,
        F: Fn(&mut Prompter<Term>, i32, char) -> io::Result<()> {
    fn execute(&self, prompter: &mut Prompter<Term>, count: i32, ch: char)
            -> io::Result<()> {
        self(prompter, count, ch)
    }
}
