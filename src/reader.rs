//! Provides access to terminal read operations and the input decoding state

use std::borrow::Cow;
use std::collections::HashMap;
use std::io;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, MutexGuard};
use std::time::{Duration, Instant};

use crate::buffer::Buffer;
use crate::chars::{ctrl, RUBOUT};
use crate::command::{Category, Command};
use crate::complete::{Completer, Completion};
use crate::clipboard::Clipboard;
use crate::function::Function;
use crate::interface::Interface;
use crate::keymap::{self, Binding, KeyMap, EMACS, VI_INSERT};
use crate::killring::KillRing;
use crate::prompter::Prompter;
use crate::terminal::{
    RawRead, Signal, SignalSet, Size, SpecialChars,
    Terminal, TerminalReader,
};
use crate::util::first_char;
use crate::variables::{Variable, VariableIter, Variables};

/// Default set of string characters
pub const STRING_CHARS: &str = "\"'";

/// Default set of word break characters
pub const WORD_BREAK_CHARS: &str = " \t\n\"\\'`@$><=;|&{(";

/// Indicates the start of a series of invisible characters in the prompt
pub const START_INVISIBLE: char = '\x01';

/// Indicates the end of a series of invisible characters in the prompt
pub const END_INVISIBLE: char = '\x02';

/// Provides access to data related to reading and processing user input.
///
/// Holds a lock on terminal read operations.
/// See [`Interface`] for more information about concurrent operations.
///
/// An instance of this type can be constructed using the
/// [`Interface::lock_reader`] method.
///
/// [`Interface`]: ../interface/struct.Interface.html
/// [`Interface::lock_reader`]: ../interface/struct.Interface.html#method.lock_reader
pub struct Reader<'a, Term: 'a + Terminal> {
    iface: &'a Interface<Term>,
    lock: ReadLock<'a, Term>,
}

pub(crate) struct Read<Term: Terminal> {
    /// Application name
    pub application: Cow<'static, str>,

    /// Pending input
    pub input_buffer: Vec<u8>,
    /// Pending characters, replayed before reading from the terminal
    pub macro_buffer: String,

    keymaps: HashMap<Cow<'static, str>, KeyMap<Term>>,
    keymap: Cow<'static, str>,
    pub functions: HashMap<Cow<'static, str>, Arc<dyn Function<Term>>>,

    /// Current input sequence
    pub sequence: String,

    /// Input decoding state
    pub state: InputState,
    /// Editor mode machine state
    pub mode: Mode,
    /// Mode in effect when the current command began
    pub previous_mode: Mode,
    /// Cursor position at which a vi operator became pending
    pub vi_op_start: usize,
    /// Whether the last command consumed a vi repeat digit
    pub is_arg_digit: bool,
    /// How the current `read_line` call should conclude
    pub line_state: LineState,

    pub last_cmd: Category,
    pub kill_ring: KillRing,
    /// Register for vi yank and put commands
    pub yank_buffer: String,
    /// Most recent vi character search
    pub char_search: Option<CharSearch>,

    /// Whether a keyboard macro is being recorded
    pub recording: bool,
    /// The most recently recorded keyboard macro
    pub kbd_macro: String,

    /// Incremental search term
    pub search_term: String,
    /// Term of the previous incremental search
    pub previous_search_term: String,
    /// History index currently matched by the search
    pub search_index: Option<usize>,
    /// Buffer contents saved when an incremental search began
    pub original_buffer: Option<Buffer>,
    /// State of an interactive vi `/` or `?` search
    pub vi_search: Option<ViSearch>,

    pub completers: Vec<Arc<dyn Completer<Term>>>,
    /// Completer that produced the current completion set
    pub active_completer: Option<Arc<dyn Completer<Term>>>,
    /// Character appended to completions
    pub completion_append_character: Option<char>,
    /// Current set of possible completions
    pub completions: Option<Vec<Completion>>,
    /// Start of the completed word
    pub completion_start: usize,

    pub string_chars: Cow<'static, str>,
    pub word_break: Cow<'static, str>,

    pub clipboard: Option<Arc<dyn Clipboard>>,

    pub catch_signals: bool,
    pub ignore_signals: SignalSet,
    pub report_signals: SignalSet,
    pub last_resize: Option<Size>,
    pub last_signal: Option<Signal>,

    variables: Variables,

    pub max_wait_duration: Option<Duration>,
}

pub(crate) struct ReadLock<'a, Term: 'a + Terminal> {
    pub term: Box<dyn TerminalReader<Term> + 'a>,
    pub data: MutexGuard<'a, Read<Term>>,
}

/// Returned from [`read_line`] to indicate the outcome of the operation
///
/// [`read_line`]: ../interface/struct.Interface.html#method.read_line
#[derive(Debug)]
pub enum ReadResult {
    /// User issued end-of-file
    Eof,
    /// User input received
    Input(String),
    /// The input line was interrupted; carries the buffer contents at the
    /// time of interruption
    Interrupted(String),
    /// Reported signal was received
    Signal(Signal),
}

#[derive(Copy, Clone, Debug)]
pub(crate) enum InputState {
    Inactive,
    NewSequence,
    ContinueSequence{
        expiry: Option<Instant>,
    },
    Number,
    CharSearch{
        n: usize,
        backward: bool,
    },
    ViCharSearch{
        n: usize,
        invoke: char,
    },
    ViChangeChar{
        n: usize,
    },
    ViSearchInput,
    ViSearchBrowse,
    QuotedInsert(usize),
    CompleteIntro,
    CompleteMore(usize),
}

/// The editor mode machine.
///
/// `Search` is incremental history search; the `Vi*To` states hold a
/// pending vi operator awaiting its motion.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Mode {
    Normal,
    Search{
        reverse: bool,
    },
    ViDeleteTo,
    ViChangeTo,
    ViYankTo,
}

impl Mode {
    pub fn is_vi_op(self) -> bool {
        match self {
            Mode::ViDeleteTo | Mode::ViChangeTo | Mode::ViYankTo => true,
            _ => false
        }
    }
}

/// How the current `read_line` call should conclude
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum LineState {
    Normal,
    Done,
    Eof,
    Interrupted,
}

/// Remembers the most recent vi character search
#[derive(Copy, Clone, Debug)]
pub(crate) struct CharSearch {
    /// Character being searched for
    pub ch: char,
    /// Invocation key establishing direction, with case switches applied
    pub first: char,
    /// Most recent invocation key
    pub last: char,
}

/// State of an interactive vi `/` or `?` search
#[derive(Clone, Debug)]
pub(crate) struct ViSearch {
    pub forward: bool,
    pub term: String,
    pub index: Option<usize>,
    pub orig: Buffer,
}

impl<'a, Term: 'a + Terminal> Reader<'a, Term> {
    pub(crate) fn new(iface: &'a Interface<Term>, lock: ReadLock<'a, Term>)
            -> Reader<'a, Term> {
        Reader{iface, lock}
    }

    /// Interactively reads a line from the terminal device.
    ///
    /// User input is collected until one of the following conditions is met:
    ///
    /// * If the user issues an end-of-file, `ReadResult::Eof` is returned.
    /// * When the user inputs a newline (`'\n'`), the resulting input
    ///   (after history event expansion) is returned as `ReadResult::Input(_)`.
    /// * When the line is interrupted, by `SIGINT` or a bound `interrupt`
    ///   command, `ReadResult::Interrupted(_)` is returned, carrying the
    ///   buffer contents at the time of interruption.
    /// * When a reported signal (see [`set_report_signal`]) is received,
    ///   it is returned as `ReadResult::Signal(_)`. The `read_line` operation may
    ///   then be either resumed with another call to `read_line` or ended by
    ///   calling [`cancel_read_line`].
    ///
    /// [`cancel_read_line`]: #method.cancel_read_line
    /// [`set_report_signal`]: #method.set_report_signal
    pub fn read_line(&mut self) -> io::Result<ReadResult> {
        self.read_line_with(None, None)
    }

    /// Interactively reads a line, optionally masking the echoed input
    /// and seeding the buffer.
    ///
    /// A mask of `'\0'` suppresses echo entirely; any other mask character
    /// is displayed in place of each buffer character. Masked input is
    /// never added to history. The mask applies only to this read.
    pub fn read_line_with(&mut self, mask: Option<char>, initial: Option<&str>)
            -> io::Result<ReadResult> {
        loop {
            if let Some(res) = self.read_line_step_with(None, mask, initial)? {
                return Ok(res);
            }
        }
    }

    /// Performs one step of the interactive `read_line` loop.
    ///
    /// This method can be used to drive the `read_line` process asynchronously.
    /// It will wait for input only up to the specified duration, then process
    /// any available input from the terminal.
    ///
    /// If the user completes the input process, `Ok(Some(result))` is returned.
    /// Otherwise, `Ok(None)` is returned to indicate that the interactive loop
    /// may continue.
    ///
    /// The interactive prompt may be cancelled prematurely using the
    /// [`cancel_read_line`] method.
    ///
    /// See [`read_line`] for details on the return value.
    ///
    /// [`cancel_read_line`]: #method.cancel_read_line
    /// [`read_line`]: #method.read_line
    pub fn read_line_step(&mut self, timeout: Option<Duration>)
            -> io::Result<Option<ReadResult>> {
        self.read_line_step_with(timeout, None, None)
    }

    /// Cancels an in-progress `read_line` operation.
    ///
    /// This method will reset internal data structures to their original state
    /// and move the terminal cursor to a new, empty line.
    ///
    /// This method is called to prematurely end the interactive loop when
    /// using the [`read_line_step`] method.
    ///
    /// It is not necessary to call this method if using the [`read_line`] method.
    ///
    /// [`read_line`]: #method.read_line
    /// [`read_line_step`]: #method.read_line_step
    pub fn cancel_read_line(&mut self) -> io::Result<()> {
        self.end_read_line()
    }

    fn read_line_step_with(&mut self, timeout: Option<Duration>,
            mask: Option<char>, initial: Option<&str>)
            -> io::Result<Option<ReadResult>> {
        self.initialize_read_line(mask, initial)?;

        let state = self.prepare_term()?;
        let res = self.read_line_step_impl(timeout);
        self.lock.term.restore(state)?;

        res
    }

    fn initialize_read_line(&mut self, mask: Option<char>, initial: Option<&str>)
            -> io::Result<()> {
        if !self.lock.is_active() {
            self.prompter().start_read_line(mask, initial)?;
        }
        Ok(())
    }

    fn read_line_step_impl(&mut self, timeout: Option<Duration>)
            -> io::Result<Option<ReadResult>> {
        let do_read = if self.lock.is_input_available() {
            // This branch will be taken only if a macro has buffered some input.
            // We check for input with a zero duration to see if the user has
            // entered Ctrl-C, e.g. to interrupt an infinitely recursive macro.
            self.lock.term.wait_for_input(Some(Duration::from_secs(0)))?
        } else {
            let timeout = limit_duration(timeout, self.lock.max_wait_duration);
            self.lock.term.wait_for_input(timeout)?
        };

        if do_read {
            self.lock.read_input()?;
        }

        if let Some(size) = self.lock.take_resize() {
            self.handle_resize(size)?;
        }

        if let Some(sig) = self.lock.take_signal() {
            if self.lock.report_signals.contains(sig) {
                return Ok(Some(ReadResult::Signal(sig)));
            }
            if !self.lock.ignore_signals.contains(sig) {
                if let Signal::Interrupt = sig {
                    let res = self.prompter().interrupt_line()?;
                    return Ok(Some(res));
                }
                self.handle_signal(sig)?;
            }
        }

        // Acquire the write lock and process all available input
        {
            let mut prompter = self.prompter();

            if let Some(r) = prompter.check_expire_timeout()? {
                prompter.end_read_line()?;
                return Ok(Some(r));
            }

            // If the macro buffer grows in size while input is being processed,
            // we end this step and let the caller try again. This is to allow
            // reading Ctrl-C to interrupt (perhaps infinite) macro execution.
            let mut macro_len = prompter.read.data.macro_buffer.len();

            while prompter.read.is_input_available() {
                if let Some(ch) = prompter.read.read_char()? {
                    if let Some(r) = prompter.handle_input(ch)? {
                        prompter.end_read_line()?;
                        return Ok(Some(r));
                    }
                }

                let new_macro_len = prompter.read.data.macro_buffer.len();

                if new_macro_len != 0 && new_macro_len >= macro_len {
                    break;
                }

                macro_len = new_macro_len;
            }

            prompter.sync_display()?;
        }

        Ok(None)
    }

    fn end_read_line(&mut self) -> io::Result<()> {
        if self.lock.is_active() {
            self.prompter().end_read_line()?;
        }
        Ok(())
    }

    fn prepare_term(&mut self) -> io::Result<Term::PrepareState> {
        if self.read_next_raw() {
            self.lock.term.prepare(true, SignalSet::new())
        } else {
            let mut signals = self.lock.report_signals.union(self.lock.ignore_signals);

            if self.lock.catch_signals {
                // Ctrl-C is always intercepted (unless we're catching no signals),
                // interrupting the current line.
                signals.insert(Signal::Interrupt);
            }

            let block_signals = !self.lock.catch_signals;

            self.lock.term.prepare(block_signals, signals)
        }
    }

    fn read_next_raw(&self) -> bool {
        match self.lock.state {
            InputState::QuotedInsert(_) => true,
            _ => false
        }
    }

    /// Sets the prompt that will be displayed when `read_line` is called.
    ///
    /// This method internally acquires the `Interface` write lock.
    ///
    /// # Notes
    ///
    /// If `prompt` contains any terminal escape sequences (e.g. color codes),
    /// such escape sequences should be immediately preceded by the character
    /// `'\x01'` and immediately followed by the character `'\x02'`.
    pub fn set_prompt(&mut self, prompt: &str) -> io::Result<()> {
        self.prompter().set_prompt(prompt)
    }

    /// Adds a line to history.
    ///
    /// This method internally acquires the `Interface` write lock.
    ///
    /// If a `read_line` call is in progress, this method has no effect.
    pub fn add_history(&self, line: String) {
        if !self.lock.is_active() {
            if let Ok(mut lock) = self.iface.lock_write() {
                lock.history.add(line);
            }
        }
    }

    /// Adds a line to history, unless it is identical to the most recent entry.
    ///
    /// This method internally acquires the `Interface` write lock.
    ///
    /// If a `read_line` call is in progress, this method has no effect.
    pub fn add_history_unique(&self, line: String) {
        if !self.lock.is_active() {
            if let Ok(mut lock) = self.iface.lock_write() {
                lock.history.add_unique(line);
            }
        }
    }

    /// Removes all history entries.
    ///
    /// This method internally acquires the `Interface` write lock.
    ///
    /// If a `read_line` call is in progress, this method has no effect.
    pub fn clear_history(&self) {
        if !self.lock.is_active() {
            if let Ok(mut lock) = self.iface.lock_write() {
                lock.history.clear();
            }
        }
    }

    /// Sets the maximum number of history entries.
    ///
    /// This method internally acquires the `Interface` write lock.
    ///
    /// If `n` is less than the current number of history entries,
    /// the oldest entries are discarded.
    ///
    /// If a `read_line` call is in progress, this method has no effect.
    pub fn set_history_size(&self, n: usize) {
        if !self.lock.is_active() {
            if let Ok(mut lock) = self.iface.lock_write() {
                lock.history.set_max_size(n);
            }
        }
    }

    /// Returns the application name
    pub fn application(&self) -> &str {
        &self.lock.application
    }

    /// Sets the application name
    pub fn set_application<T>(&mut self, application: T)
            where T: Into<Cow<'static, str>> {
        self.lock.application = application.into();
    }

    /// Adds a completer to the end of the completer list.
    pub fn add_completer(&mut self, completer: Arc<dyn Completer<Term>>) {
        self.lock.completers.push(completer);
    }

    /// Replaces the list of completers.
    ///
    /// When completion is performed, each completer is consulted in order
    /// until one produces a completion set.
    pub fn set_completers(&mut self, completers: Vec<Arc<dyn Completer<Term>>>) {
        self.lock.completers = completers;
    }

    /// Returns the current list of completers.
    pub fn completers(&self) -> &[Arc<dyn Completer<Term>>] {
        &self.lock.completers
    }

    /// Sets the clipboard provider consulted by `paste-from-clipboard`.
    pub fn set_clipboard(&mut self, clipboard: Option<Arc<dyn Clipboard>>) {
        self.lock.clipboard = clipboard;
    }

    /// Returns the value of the named variable or `None`
    /// if no such variable exists.
    pub fn get_variable(&self, name: &str) -> Option<Variable> {
        self.lock.get_variable(name)
    }

    /// Sets the value of the named variable and returns the previous
    /// value.
    ///
    /// If `name` does not refer to a variable or the `value` is not
    /// a valid value for the variable, `None` is returned.
    pub fn set_variable(&mut self, name: &str, value: &str) -> Option<Variable> {
        self.lock.set_variable(name, value)
    }

    /// Returns an iterator over stored variables.
    pub fn variables(&self) -> VariableIter {
        self.lock.variables.iter()
    }

    /// Returns whether the editor will catch certain signals.
    pub fn catch_signals(&self) -> bool {
        self.lock.catch_signals
    }

    /// Sets whether the editor will catch certain signals.
    ///
    /// This setting is `true` by default. It can be disabled to allow the
    /// host program to handle signals itself.
    pub fn set_catch_signals(&mut self, enabled: bool) {
        self.lock.catch_signals = enabled;
    }

    /// Returns whether the given `Signal` is ignored.
    pub fn ignore_signal(&self, signal: Signal) -> bool {
        self.lock.ignore_signals.contains(signal)
    }

    /// Sets whether the given `Signal` will be ignored.
    pub fn set_ignore_signal(&mut self, signal: Signal, set: bool) {
        if set {
            self.lock.ignore_signals.insert(signal);
            self.lock.report_signals.remove(signal);
        } else {
            self.lock.ignore_signals.remove(signal);
        }
    }

    /// Returns whether the given `Signal` is to be reported.
    pub fn report_signal(&self, signal: Signal) -> bool {
        self.lock.report_signals.contains(signal)
    }

    /// Sets whether to report the given `Signal`.
    ///
    /// When a reported signal is received via the terminal, it will be returned
    /// from `Interface::read_line` as `Ok(Signal(signal))`.
    pub fn set_report_signal(&mut self, signal: Signal, set: bool) {
        if set {
            self.lock.report_signals.insert(signal);
            self.lock.ignore_signals.remove(signal);
        } else {
            self.lock.report_signals.remove(signal);
        }
    }

    /// Returns the name of the currently active key map.
    pub fn keymap(&self) -> &str {
        self.lock.keymap()
    }

    /// Sets the active key map by name.
    ///
    /// Returns `false` if no key map with the given name exists.
    pub fn set_keymap(&mut self, name: &str) -> bool {
        self.lock.set_keymap(name)
    }

    /// Binds a sequence in the active key map to a command.
    ///
    /// Returns the previously bound value.
    pub fn bind_sequence<T>(&mut self, seq: T, cmd: Command) -> Option<Binding<Term>>
            where T: AsRef<str> {
        self.lock.keymap_mut().bind(seq, cmd)
    }

    /// Binds a sequence in the active key map to a macro.
    ///
    /// Returns the previously bound value.
    pub fn bind_macro<T, M>(&mut self, seq: T, keys: M) -> Option<Binding<Term>>
            where T: AsRef<str>, M: Into<Cow<'static, str>> {
        self.lock.keymap_mut().bind(seq, Binding::Macro(keys.into()))
    }

    /// Removes a binding for the given sequence from the active key map.
    ///
    /// Returns the previously bound value.
    pub fn unbind_sequence(&mut self, seq: &str) -> Option<Binding<Term>> {
        self.lock.keymap_mut().unbind(seq)
    }

    /// Binds a single-character sequence in the active key map directly
    /// to a widget.
    pub fn set_triggered_action(&mut self, ch: char, action: Arc<dyn Function<Term>>) {
        self.lock.keymap_mut().bind(ch.to_string(), Binding::Function(action));
    }

    /// Defines a named function to which sequences may be bound.
    ///
    /// The name should consist of lowercase ASCII letters and numbers,
    /// containing no spaces, with words separated by hyphens. However,
    /// this is not a requirement.
    ///
    /// Returns the function previously defined with the same name.
    pub fn define_function<T>(&mut self, name: T, cmd: Arc<dyn Function<Term>>)
            -> Option<Arc<dyn Function<Term>>> where T: Into<Cow<'static, str>> {
        self.lock.define_function(name, cmd)
    }

    /// Removes a function defined with the given name.
    ///
    /// Returns the defined function.
    pub fn remove_function(&mut self, name: &str) -> Option<Arc<dyn Function<Term>>> {
        self.lock.remove_function(name)
    }

    fn prompter<'b>(&'b mut self) -> Prompter<'b, 'a, Term> {
        Prompter::new(
            &mut self.lock,
            self.iface.lock_write().expect("Failed to acquire write lock"))
    }

    fn handle_resize(&mut self, size: Size) -> io::Result<()> {
        self.prompter().handle_resize(size)
    }

    fn handle_signal(&mut self, sig: Signal) -> io::Result<()> {
        self.prompter().handle_signal(sig)
    }
}

impl<'a, Term: 'a + Terminal> ReadLock<'a, Term> {
    pub fn new(term: Box<dyn TerminalReader<Term> + 'a>, data: MutexGuard<'a, Read<Term>>)
            -> ReadLock<'a, Term> {
        ReadLock{term, data}
    }

    /// Reads the next character of input.
    ///
    /// Performs a non-blocking read from the terminal, if necessary.
    ///
    /// If non-input data was received (e.g. a signal) or insufficient input
    /// is available, `Ok(None)` is returned.
    pub fn read_char(&mut self) -> io::Result<Option<char>> {
        if let Some(ch) = self.macro_pop() {
            Ok(Some(ch))
        } else if let Some(ch) = self.decode_input()? {
            Ok(Some(ch))
        } else {
            Ok(None)
        }
    }

    fn read_input(&mut self) -> io::Result<()> {
        match self.term.read(&mut self.data.input_buffer)? {
            RawRead::Bytes(_) => (),
            RawRead::Resize(new_size) => {
                self.last_resize = Some(new_size);
            }
            RawRead::Signal(sig) => {
                self.last_signal = Some(sig);
            }
        }

        Ok(())
    }

    pub fn is_input_available(&self) -> bool {
        !self.data.macro_buffer.is_empty() || match self.peek_input() {
            Ok(Some(_)) | Err(_) => true,
            Ok(None) => false
        }
    }

    /// Waits up to `timeout` for further input to arrive.
    pub fn poll_input(&mut self, timeout: Option<Duration>) -> io::Result<bool> {
        self.term.wait_for_input(timeout)
    }

    fn macro_pop(&mut self) -> Option<char> {
        if self.data.macro_buffer.is_empty() {
            None
        } else {
            Some(self.data.macro_buffer.remove(0))
        }
    }

    fn decode_input(&mut self) -> io::Result<Option<char>> {
        let res = self.peek_input();

        if let Ok(Some(ch)) = res {
            self.data.input_buffer.drain(..ch.len_utf8());
        }

        res
    }

    fn peek_input(&self) -> io::Result<Option<char>> {
        if self.data.input_buffer.is_empty() {
            Ok(None)
        } else {
            first_char(&self.data.input_buffer)
        }
    }

    fn take_resize(&mut self) -> Option<Size> {
        self.last_resize.take()
    }

    fn take_signal(&mut self) -> Option<Signal> {
        self.last_signal.take()
    }
}

impl<'a, Term: 'a + Terminal> Deref for ReadLock<'a, Term> {
    type Target = Read<Term>;

    fn deref(&self) -> &Read<Term> {
        &self.data
    }
}

impl<'a, Term: 'a + Terminal> DerefMut for ReadLock<'a, Term> {
    fn deref_mut(&mut self) -> &mut Read<Term> {
        &mut self.data
    }
}

impl<Term: Terminal> Deref for Read<Term> {
    type Target = Variables;

    fn deref(&self) -> &Variables {
        &self.variables
    }
}

impl<Term: Terminal> DerefMut for Read<Term> {
    fn deref_mut(&mut self) -> &mut Variables {
        &mut self.variables
    }
}

impl<Term: Terminal> Read<Term> {
    pub fn new(term: &Term, application: Cow<'static, str>) -> Read<Term> {
        let mut keymaps = HashMap::new();

        keymaps.insert(Cow::Borrowed(keymap::EMACS), keymap::emacs());
        keymaps.insert(Cow::Borrowed(keymap::VI_INSERT), keymap::vi_insert());
        keymaps.insert(Cow::Borrowed(keymap::VI_MOVE), keymap::vi_move());

        let mut r = Read{
            application,

            input_buffer: Vec::new(),
            macro_buffer: String::new(),

            keymaps,
            keymap: EMACS.into(),
            functions: HashMap::new(),

            sequence: String::new(),

            state: InputState::Inactive,
            mode: Mode::Normal,
            previous_mode: Mode::Normal,
            vi_op_start: 0,
            is_arg_digit: false,
            line_state: LineState::Normal,

            last_cmd: Category::Other,
            kill_ring: KillRing::new(),
            yank_buffer: String::new(),
            char_search: None,

            recording: false,
            kbd_macro: String::new(),

            search_term: String::new(),
            previous_search_term: String::new(),
            search_index: None,
            original_buffer: None,
            vi_search: None,

            completers: Vec::new(),
            active_completer: None,
            completion_append_character: Some(' '),
            completions: None,
            completion_start: 0,

            string_chars: STRING_CHARS.into(),
            word_break: WORD_BREAK_CHARS.into(),

            clipboard: None,

            catch_signals: true,
            ignore_signals: SignalSet::new(),
            report_signals: SignalSet::new(),
            last_resize: None,
            last_signal: None,

            variables: Variables::default(),

            max_wait_duration: None,
        };

        if r.variables.bind_tty_special_chars {
            if let Some(chars) = term.special_chars() {
                r.bind_tty_chars(chars);
            }
        }

        r
    }

    /// Overrides the default erase, word-erase, line-kill, and literal-next
    /// bindings with the characters configured into the terminal device.
    fn bind_tty_chars(&mut self, chars: SpecialChars) {
        for name in &[EMACS, VI_INSERT] {
            if let Some(map) = self.keymaps.get_mut(*name) {
                rebind_special(map, Command::BackwardDeleteChar, RUBOUT, chars.erase);
                rebind_special(map, Command::UnixWordRubout, ctrl('w'), chars.word_erase);
                rebind_special(map, Command::UnixLineDiscard, ctrl('u'), chars.kill);
                rebind_special(map, Command::QuotedInsert, ctrl('v'), chars.literal_next);
            }
        }
    }

    pub fn keymap(&self) -> &str {
        &self.keymap
    }

    pub fn keymap_ref(&self) -> &KeyMap<Term> {
        self.keymaps.get(&self.keymap[..]).expect("current keymap missing")
    }

    pub fn keymap_mut(&mut self) -> &mut KeyMap<Term> {
        self.keymaps.get_mut(&self.keymap[..]).expect("current keymap missing")
    }

    pub fn set_keymap(&mut self, name: &str) -> bool {
        if self.keymaps.contains_key(name) {
            self.keymap = name.to_owned().into();
            true
        } else {
            false
        }
    }

    /// Prepends a sequence of characters to the pending input queue.
    pub fn queue_input(&mut self, seq: &str) {
        self.macro_buffer.insert_str(0, seq);
    }

    pub fn is_active(&self) -> bool {
        match self.state {
            InputState::Inactive => false,
            _ => true
        }
    }

    pub fn reset_data(&mut self) {
        self.state = InputState::NewSequence;
        self.mode = Mode::Normal;
        self.previous_mode = Mode::Normal;
        self.line_state = LineState::Normal;
        self.vi_op_start = 0;
        self.is_arg_digit = false;
        self.sequence.clear();

        self.last_cmd = Category::Other;
        self.recording = false;

        self.search_term.clear();
        self.previous_search_term.clear();
        self.search_index = None;
        self.original_buffer = None;
        self.vi_search = None;

        self.completions = None;
        self.active_completer = None;

        self.last_resize = None;
        self.last_signal = None;
        self.max_wait_duration = None;
    }

    pub fn define_function<T>(&mut self, name: T, cmd: Arc<dyn Function<Term>>)
            -> Option<Arc<dyn Function<Term>>> where T: Into<Cow<'static, str>> {
        self.functions.insert(name.into(), cmd)
    }

    pub fn remove_function(&mut self, name: &str) -> Option<Arc<dyn Function<Term>>> {
        self.functions.remove(name)
    }
}

fn rebind_special<Term: Terminal>(map: &mut KeyMap<Term>, cmd: Command,
        default: char, new: Option<char>) {
    let new = match new {
        Some(ch) => ch,
        None => return
    };

    let def_seq = default.to_string();

    if map.get(&def_seq).and_then(|b| b.command()) == Some(&cmd) {
        map.bind(def_seq, Command::SelfInsert);
        map.bind(new.to_string(), cmd);
    }
}

fn limit_duration(dur: Option<Duration>, max: Option<Duration>) -> Option<Duration> {
    match (dur, max) {
        (dur, None) | (None, dur) => dur,
        (Some(dur), Some(max)) => Some(dur.min(max)),
    }
}
