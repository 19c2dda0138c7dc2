//! Implements the input dispatch loop and the table of editing commands

use std::io;
use std::mem::replace;
use std::time::{Duration, Instant};

use crate::chars::{is_printable, EOF, ESCAPE, RUBOUT};
use crate::command::{Category, Command};
use crate::complete::Completion;
use crate::expand::expand_events;
use crate::keymap::{Binding, FindResult, VI_INSERT, VI_MOVE};
use crate::messages;
use crate::reader::{
    CharSearch, InputState, LineState, Mode, ReadLock, ReadResult, ViSearch,
};
use crate::table::column_rows;
use crate::terminal::{CursorMode, Signal, Size, Terminal};
use crate::util::{
    backward_search_char, find_matching_paren, first_print_pos,
    forward_search_char, get_open_paren, is_word_delim, longest_common_prefix,
    next_word_pos, prev_word_pos, word_run_end,
};
use crate::writer::{Digit, WriteLock, Writer, BLINK_DURATION};

/// Timeout distinguishing a pasted tab from a typed one
const COPY_PASTE_DETECTION_TIMEOUT: Duration = Duration::from_millis(50);

/// Provides access to the current state of input while a `read_line` call
/// is in progress.
///
/// Holds read and write locks on terminal operations.
/// See [`Interface`] for more information about concurrent operations.
///
/// Instances of this type cannot be constructed by public methods.
/// Instead, an instance is created internally during a call to [`read_line`].
///
/// [`Interface`]: ../interface/struct.Interface.html
/// [`read_line`]: ../interface/struct.Interface.html#method.read_line
pub struct Prompter<'a, 'b: 'a, Term: 'b + Terminal> {
    pub(crate) read: &'a mut ReadLock<'b, Term>,
    pub(crate) write: WriteLock<'b, Term>,
}

impl<'a, 'b: 'a, Term: 'b + Terminal> Prompter<'a, 'b, Term> {
    pub(crate) fn new(read: &'a mut ReadLock<'b, Term>, write: WriteLock<'b, Term>)
            -> Prompter<'a, 'b, Term> {
        Prompter{read, write}
    }

    /// Returns a `Writer` instance using the currently held write lock.
    ///
    /// This method will move the cursor to a new line after the prompt,
    /// allowing output to be written without corrupting the prompt text.
    /// The prompt will be redrawn when the `Writer` instance is dropped.
    ///
    /// To instead erase the prompt and write text, use [`writer_erase`].
    ///
    /// [`writer_erase`]: #method.writer_erase
    pub fn writer_append<'c>(&'c mut self) -> io::Result<Writer<'c, 'b, Term>> {
        Writer::with_ref(&mut self.write, false)
    }

    /// Returns a `Writer` instance using the currently held write lock.
    ///
    /// This method will erase the prompt, allowing output to be written
    /// without corrupting the prompt text. The prompt will be redrawn
    /// when the `Writer` instance is dropped.
    ///
    /// To instead write text after the prompt, use [`writer_append`].
    ///
    /// [`writer_append`]: #method.writer_append
    pub fn writer_erase<'c>(&'c mut self) -> io::Result<Writer<'c, 'b, Term>> {
        Writer::with_ref(&mut self.write, true)
    }

    /// Returns the current buffer contents.
    pub fn buffer(&self) -> &str {
        self.write.buf.as_str()
    }

    /// Returns the current position of the cursor.
    pub fn cursor(&self) -> usize {
        self.write.buf.cursor()
    }

    /// Sets the buffer to the given value, moving the cursor to its end.
    pub fn set_buffer(&mut self, buf: &str) -> io::Result<()> {
        self.write.buf.set_text(buf);
        Ok(())
    }

    /// Sets the cursor to the given position within the buffer.
    ///
    /// # Panics
    ///
    /// If the given position is out of bounds or is not aligned to `char` boundaries.
    pub fn set_cursor(&mut self, pos: usize) -> io::Result<()> {
        self.write.buf.set_cursor(pos);
        Ok(())
    }

    /// Sets the prompt that will be displayed when `read_line` is called.
    ///
    /// # Notes
    ///
    /// If `prompt` contains any terminal escape sequences (e.g. color codes),
    /// such escape sequences should be immediately preceded by the character
    /// `'\x01'` and immediately followed by the character `'\x02'`.
    pub fn set_prompt(&mut self, prompt: &str) -> io::Result<()> {
        self.write.set_prompt(prompt)
    }

    /// Returns the size of the terminal at the last draw operation.
    pub fn screen_size(&self) -> Size {
        self.write.screen_size
    }

    /// Returns whether a numerical argument was explicitly supplied by the user.
    pub fn explicit_arg(&self) -> bool {
        self.write.explicit_arg
    }

    /// Returns the current input sequence.
    pub fn sequence(&self) -> &str {
        &self.read.sequence
    }

    /// Returns the command `Category` of the most recently executed command.
    ///
    /// Some commands may use this to influence behavior of repeated commands.
    pub fn last_command_category(&self) -> Category {
        self.read.last_cmd
    }

    /// Returns the set of characters that indicate a word break.
    pub fn word_break_chars(&self) -> &str {
        &self.read.word_break
    }

    /// Returns the current number of history entries.
    pub fn history_len(&self) -> usize {
        self.write.history.len()
    }

    /// Inserts a character at the cursor `n` times.
    pub fn insert(&mut self, n: usize, ch: char) -> io::Result<()> {
        self.write.buf.insert(n, ch);
        Ok(())
    }

    /// Inserts a string at the cursor, advancing the cursor past it.
    pub fn insert_str(&mut self, s: &str) -> io::Result<()> {
        self.write.buf.insert_str(s);
        Ok(())
    }

    /// Deletes the range `[start, end)` from the buffer.
    pub fn delete_range(&mut self, start: usize, end: usize) -> io::Result<()> {
        self.write.buf.delete_range(start, end);
        Ok(())
    }

    /// Deletes the range `[start, end)` from the buffer, adding the
    /// removed text to the kill ring as a forward kill.
    pub fn kill_range(&mut self, start: usize, end: usize) -> io::Result<()> {
        if start != end {
            let removed = self.write.buf.delete_range(start, end);
            self.read.kill_ring.add(removed);
        }
        Ok(())
    }

    /// Returns the current set of completions.
    ///
    /// Unless the most recent command executed was one operating on completion
    /// sets, the result is `None`.
    pub fn completions(&self) -> Option<&[Completion]> {
        self.read.completions.as_ref().map(|v| &v[..])
    }

    /// Sets the current set of completions.
    ///
    /// This set will only remain active until the end of the next
    /// non-completion command's execution. Therefore, any `Function`
    /// that uses this method must be of the `Complete` category.
    pub fn set_completions(&mut self, completions: Option<Vec<Completion>>) {
        self.read.completions = completions;
    }

    /// Accepts the current input buffer as user input.
    ///
    /// This method may be called by a [`Function`] implementation, immediately
    /// before ending execution, in order to simulate the `accept-line` command.
    ///
    /// [`Function`]: ../function/trait.Function.html
    pub fn accept_input(&mut self) -> io::Result<()> {
        self.read.line_state = LineState::Done;
        Ok(())
    }

    fn beep(&mut self) -> io::Result<()> {
        let style = self.read.bell_style;
        let prefer_visible = self.read.prefer_visible_bell;

        self.write.beep(style, prefer_visible)
    }

    pub(crate) fn start_read_line(&mut self, mask: Option<char>, initial: Option<&str>)
            -> io::Result<()> {
        self.read.reset_data();
        self.write.reset_data();

        self.read.state = InputState::NewSequence;
        self.write.mask = mask;

        if let Some(initial) = initial {
            self.write.buf.set_text(initial);
        }

        self.write.is_prompt_drawn = true;
        self.write.update_size()?;
        self.write.redisplay()?;
        self.write.flush()
    }

    pub(crate) fn end_read_line(&mut self) -> io::Result<()> {
        self.write.expire_blink()?;

        if self.write.buf.overtype() {
            self.write.set_cursor_mode(CursorMode::Normal)?;
        }

        if self.write.is_prompt_drawn {
            self.write.redisplay()?;
            self.write.move_to_display_end()?;
            self.write.new_line()?;
            self.write.is_prompt_drawn = false;
        }

        self.write.flush()?;

        self.read.reset_data();
        self.write.reset_data();
        self.read.state = InputState::Inactive;
        self.write.history.move_to_end();

        Ok(())
    }

    /// Concludes the line when a signal interrupted it.
    pub(crate) fn interrupt_line(&mut self) -> io::Result<ReadResult> {
        self.read.data.macro_buffer.clear();
        self.read.line_state = LineState::Interrupted;
        let res = self.take_line_result()?
            .expect("interrupted line must produce a result");
        Ok(res)
    }

    /// Reconciles the screen with the editor state after input processing.
    pub(crate) fn sync_display(&mut self) -> io::Result<()> {
        match self.read.state {
            // Raw completion paging bypasses the redisplay engine
            InputState::Inactive | InputState::CompleteMore(_) => return Ok(()),
            _ => ()
        }

        self.write.redisplay()?;

        if let Some(pos) = self.write.pending_blink.take() {
            self.write.start_blink(pos)?;
            self.read.max_wait_duration = Some(BLINK_DURATION);
        }

        self.write.flush()
    }

    fn expire_blink(&mut self) -> io::Result<()> {
        self.read.max_wait_duration = None;
        self.write.expire_blink()
    }

    pub(crate) fn check_expire_timeout(&mut self) -> io::Result<Option<ReadResult>> {
        let now = Instant::now();

        if self.write.check_expire_blink(now)? {
            self.read.max_wait_duration = None;
        }

        if let InputState::ContinueSequence{expiry: Some(expiry)} = self.read.state {
            if now >= expiry {
                self.read.max_wait_duration = None;
                self.force_execute_sequence()?;
                self.sync_display()?;
            }
        }

        self.take_line_result()
    }

    /// Processes one decoded character of input.
    ///
    /// Returns the outcome of the `read_line` operation once the line is
    /// finished.
    pub(crate) fn handle_input(&mut self, ch: char) -> io::Result<Option<ReadResult>> {
        self.expire_blink()?;

        match self.read.state {
            InputState::Inactive => panic!("input received in inactive state"),
            InputState::NewSequence | InputState::ContinueSequence{..} => {
                if self.read.recording {
                    self.read.kbd_macro.push(ch);
                }

                if ch == EOF && self.write.buf.is_empty()
                        && self.read.sequence.is_empty() {
                    self.write.redisplay()?;
                    self.write.move_to_display_end()?;
                    self.write.new_line()?;
                    self.write.is_prompt_drawn = false;
                    return Ok(Some(ReadResult::Eof));
                }

                self.read.sequence.push(ch);
                self.execute_sequence()?;
            }
            InputState::Number => {
                if let Some(digit) = ch.to_digit(10) {
                    self.write.input_arg.input(digit as i32);

                    if self.write.input_arg.is_out_of_bounds() {
                        self.read.state = InputState::NewSequence;
                        self.write.input_arg = Digit::None;
                        self.write.explicit_arg = false;
                    }
                } else {
                    self.read.state = InputState::NewSequence;
                    self.read.queue_input(&ch.to_string());
                }
            }
            InputState::CharSearch{n, backward} => {
                if n != 0 {
                    let buf = self.write.buf.as_str().to_owned();
                    let cursor = self.write.buf.cursor();

                    let pos = if backward {
                        backward_search_char(n, &buf, cursor, ch)
                    } else {
                        forward_search_char(n, &buf, cursor, ch)
                    };

                    if let Some(pos) = pos {
                        self.write.buf.set_cursor(pos);
                    }
                }
                self.read.state = InputState::NewSequence;
            }
            InputState::ViCharSearch{n, invoke} => {
                self.read.state = InputState::NewSequence;

                if self.read.recording {
                    self.read.kbd_macro.push(ch);
                }

                if !self.do_vi_char_search(n, invoke, Some(ch)) {
                    self.beep()?;
                }

                let mode = self.read.mode;
                if mode.is_vi_op() {
                    self.apply_vi_op(mode)?;
                }
            }
            InputState::ViChangeChar{n} => {
                self.read.state = InputState::NewSequence;

                if ch != ESCAPE && ch != '\x03' {
                    self.vi_change_char(n, ch)?;
                }
            }
            InputState::ViSearchInput => {
                self.vi_search_input(ch)?;
            }
            InputState::ViSearchBrowse => {
                self.vi_search_browse(ch)?;
            }
            InputState::QuotedInsert(n) => {
                if self.read.recording {
                    self.read.kbd_macro.push(ch);
                }

                if n != 0 {
                    self.write.buf.insert(n, ch);
                }
                self.read.state = InputState::NewSequence;
            }
            InputState::CompleteIntro => {
                self.complete_intro_input(ch)?;
            }
            InputState::CompleteMore(offset) => {
                self.complete_more_input(offset, ch)?;
            }
        }

        self.take_line_result()
    }

    fn take_line_result(&mut self) -> io::Result<Option<ReadResult>> {
        match self.read.line_state {
            LineState::Normal => Ok(None),
            LineState::Done => {
                self.read.line_state = LineState::Normal;
                let line = self.finish_line()?;
                Ok(Some(ReadResult::Input(line)))
            }
            LineState::Eof => {
                self.read.line_state = LineState::Normal;
                self.write.redisplay()?;
                self.write.move_to_display_end()?;
                self.write.new_line()?;
                self.write.is_prompt_drawn = false;
                Ok(Some(ReadResult::Eof))
            }
            LineState::Interrupted => {
                self.read.line_state = LineState::Normal;
                let buf = self.write.buf.as_str().to_owned();

                self.write.expire_blink()?;
                self.write.redisplay()?;
                self.write.move_to_display_end()?;

                if self.read.echo_control_characters {
                    self.write.write_str("^C")?;
                }

                self.write.new_line()?;
                self.write.is_prompt_drawn = false;

                Ok(Some(ReadResult::Interrupted(buf)))
            }
        }
    }

    /// Concludes an accepted line: expands history events, prints the
    /// expansion, and updates history.
    fn finish_line(&mut self) -> io::Result<String> {
        self.write.expire_blink()?;
        self.write.post = None;
        self.write.redisplay()?;
        self.write.move_to_display_end()?;
        self.write.new_line()?;
        self.write.is_prompt_drawn = false;

        let line = self.write.buf.as_str().to_owned();
        let mut result = line.clone();

        if !self.read.disable_event_expansion {
            match expand_events(&line, &self.write.history) {
                Ok(expanded) => {
                    if expanded != line {
                        self.write.write_str(&expanded)?;
                        self.write.new_line()?;
                    }
                    result = expanded;
                }
                Err(_) => {
                    self.beep()?;
                    self.write.buf.clear();
                    result = String::new();
                }
            }
        }

        if !result.is_empty() && self.write.mask.is_none()
                && !self.read.disable_history {
            // Re-escape characters that would expand again when recalled
            let mut entry = result.replace('!', "\\!");
            if entry.starts_with('^') {
                entry.insert(0, '\\');
            }

            self.write.history.add(entry);
        }

        self.write.mask = None;
        self.write.flush()?;

        Ok(result)
    }

    /// Attempts to resolve and execute the current input sequence.
    fn execute_sequence(&mut self) -> io::Result<()> {
        match self.find_current() {
            FindResult::Found(binding) => {
                if binding == Binding::Command(Command::DoLowercaseVersion) {
                    return self.do_lowercase_version();
                }

                self.read.state = InputState::NewSequence;
                self.dispatch_binding(binding)?;
                self.read.sequence.clear();
            }
            FindResult::Undecided(_) => {
                // An ambiguous sequence, such as a lone ESC in vi insert
                // mode, resolves to its own binding if no continuation
                // arrives before the key sequence timeout.
                let expiry = self.keyseq_expiry();
                self.read.state = InputState::ContinueSequence{expiry};
            }
            FindResult::Incomplete => {
                let expiry = if self.search_terminator_pending() {
                    self.keyseq_expiry()
                } else {
                    None
                };
                self.read.state = InputState::ContinueSequence{expiry};
            }
            FindResult::NotFound => {
                self.read.state = InputState::NewSequence;

                let single = self.read.sequence.chars().count() == 1;

                if single {
                    let other = self.read.keymap_ref().other_key().cloned();

                    if let Some(binding) = other {
                        self.dispatch_binding(binding)?;
                        self.read.sequence.clear();
                    } else {
                        self.insert_first_char()?;
                    }
                } else {
                    self.backoff_sequence()?;
                }
            }
        }

        Ok(())
    }

    /// Walks a failed sequence back one character at a time, replaying the
    /// stripped characters, until some prefix resolves to a binding.
    ///
    /// A prefix that is itself bound, such as a lone ESC in vi insert
    /// mode, resolves to its own binding; a dangling unbound prefix is
    /// dropped.
    fn backoff_sequence(&mut self) -> io::Result<()> {
        loop {
            let last = match self.read.sequence.pop() {
                Some(ch) => ch,
                None => break
            };

            self.read.queue_input(&last.to_string());

            if self.read.sequence.is_empty() {
                break;
            }

            match self.find_current() {
                FindResult::Found(binding) | FindResult::Undecided(binding) => {
                    self.dispatch_binding(binding)?;
                    self.read.sequence.clear();
                    return Ok(());
                }
                FindResult::Incomplete => {
                    if self.read.sequence.chars().count() == 1 {
                        self.read.sequence.clear();
                        return Ok(());
                    }
                }
                FindResult::NotFound => {
                    self.read.sequence.clear();
                    return Ok(());
                }
            }
        }

        self.read.sequence.clear();
        Ok(())
    }

    fn force_execute_sequence(&mut self) -> io::Result<()> {
        self.read.state = InputState::NewSequence;

        match self.find_current() {
            FindResult::Found(binding) | FindResult::Undecided(binding) => {
                self.dispatch_binding(binding)?;
                self.read.sequence.clear();
            }
            FindResult::Incomplete => {
                // A lone search terminator with no continuation commits
                // the search.
                if let Mode::Search{..} = self.read.mode {
                    if let Some(idx) = self.read.search_index {
                        self.write.history.move_to(idx);
                    }
                    self.leave_search();
                }
                self.read.sequence.clear();
            }
            FindResult::NotFound => {
                self.insert_first_char()?;
            }
        }

        Ok(())
    }

    fn find_current(&self) -> FindResult<Binding<Term>> {
        match self.read.keymap_ref().find(&self.read.sequence) {
            FindResult::Found(b) => FindResult::Found(b.clone()),
            FindResult::Undecided(b) => FindResult::Undecided(b.clone()),
            FindResult::Incomplete => FindResult::Incomplete,
            FindResult::NotFound => FindResult::NotFound,
        }
    }

    fn do_lowercase_version(&mut self) -> io::Result<()> {
        let mut seq = self.read.sequence.clone();

        match seq.pop() {
            Some(last) if last.is_uppercase() => {
                seq.extend(last.to_lowercase());
                self.read.sequence = seq;
                self.execute_sequence()
            }
            _ => {
                self.read.state = InputState::NewSequence;
                self.read.sequence.clear();
                self.beep()
            }
        }
    }

    fn search_terminator_pending(&self) -> bool {
        match self.read.mode {
            Mode::Search{..} => {
                let mut chars = self.read.sequence.chars();

                match (chars.next(), chars.next()) {
                    (Some(ch), None) => self.read.search_terminators.contains(ch),
                    _ => false
                }
            }
            _ => false
        }
    }

    fn keyseq_expiry(&mut self) -> Option<Instant> {
        if let Some(t) = self.read.keyseq_timeout {
            self.read.max_wait_duration = Some(t);
            Some(Instant::now() + t)
        } else {
            None
        }
    }

    /// Execute the command `SelfInsert` on the first character in the input
    /// sequence, if it is printable; beep otherwise. Then, queue the
    /// remaining characters so they may be reinterpreted.
    fn insert_first_char(&mut self) -> io::Result<()> {
        let (first, rest) = {
            let mut chars = self.read.sequence.chars();

            (chars.next(), chars.as_str().to_owned())
        };

        self.read.sequence.clear();

        if let Some(first) = first {
            if is_printable(first) {
                let n = self.write.input_arg.to_i32();

                self.update_kill_state(Some(&Command::SelfInsert));
                self.execute_command(Command::SelfInsert, n, first)?;
            } else {
                self.beep()?;
            }
        }

        if !rest.is_empty() {
            self.read.queue_input(&rest);
        }

        Ok(())
    }

    fn dispatch_binding(&mut self, binding: Binding<Term>) -> io::Result<()> {
        let n = self.write.input_arg.to_i32();
        let ch = self.read.sequence.chars().next_back().unwrap_or('\0');

        match binding {
            Binding::Command(cmd) => {
                self.update_kill_state(Some(&cmd));
                self.execute_command(cmd, n, ch)
            }
            Binding::Macro(seq) => {
                self.update_kill_state(None);
                self.read.queue_input(&seq);
                Ok(())
            }
            Binding::Function(fun) => {
                self.update_kill_state(None);
                fun.execute(self, n, ch)?;
                let category = fun.category();
                self.finish_category(category);
                Ok(())
            }
        }
    }

    /// Resets the kill ring's operation flags as part of key decoding.
    fn update_kill_state(&mut self, cmd: Option<&Command>) {
        use crate::command::Command::*;

        if self.read.recording {
            return;
        }

        let is_yank = match cmd {
            Some(&Yank) | Some(&YankPop) => true,
            _ => false
        };
        let is_kill = match cmd {
            Some(&KillLine) | Some(&KillWholeLine) | Some(&BackwardKillWord) |
            Some(&KillWord) | Some(&UnixLineDiscard) | Some(&UnixWordRubout) => true,
            _ => false
        };

        if !is_yank {
            self.read.kill_ring.reset_last_yank();
        }
        if !is_kill {
            self.read.kill_ring.reset_last_kill();
        }
    }

    fn finish_category(&mut self, category: Category) {
        if category != Category::Digit && !self.read.is_arg_digit {
            if self.read.mode == Mode::Normal {
                self.write.input_arg = Digit::None;
                self.write.explicit_arg = false;
            }

            self.read.last_cmd = category;

            if category != Category::Complete {
                self.read.completions = None;
                self.read.active_completer = None;

                if self.read.mode == Mode::Normal {
                    self.write.post = None;
                }
            }
        }

        match self.read.mode {
            Mode::Search{..} => (),
            _ => {
                self.read.original_buffer = None;
                self.read.search_index = None;

                if !self.read.search_term.is_empty() {
                    let term = replace(&mut self.read.search_term, String::new());
                    self.read.previous_search_term = term;
                }
            }
        }
    }

    pub(crate) fn execute_command(&mut self, mut cmd: Command, n: i32, ch: char)
            -> io::Result<()> {
        use crate::command::Command::*;

        if let Mode::Search{..} = self.read.mode {
            return self.search_command(cmd, ch);
        }

        self.read.is_arg_digit = false;

        if self.read.mode.is_vi_op() && !cmd.is_vi_motion() {
            cmd = ViMovementMode;
        }

        self.read.previous_mode = self.read.mode;

        let mut custom_category = None;
        let category = cmd.category();
        let count = if n <= 0 { 1 } else { n as usize };

        match cmd {
            Abort => {
                self.beep()?;
                self.write.buf.clear();
            }
            AcceptLine => {
                self.read.line_state = LineState::Done;
            }
            Interrupt => {
                self.read.line_state = LineState::Interrupted;
            }
            ExitOrDeleteChar => {
                if self.write.buf.is_empty() {
                    self.read.line_state = LineState::Eof;
                } else {
                    let removed = self.write.buf.delete(count);
                    if removed.is_empty() {
                        self.beep()?;
                    }
                }
            }
            SelfInsert => {
                if n > 0 {
                    self.write.buf.insert(n as usize, ch);

                    if self.read.blink_matching_paren {
                        self.queue_paren_blink(ch)?;
                    }
                }
            }
            TabInsert => {
                if n > 0 {
                    self.write.buf.insert(n as usize, '\t');
                }
            }
            QuotedInsert => {
                self.read.state = InputState::QuotedInsert(
                    if n >= 0 { n as usize } else { 0 });
            }
            OverwriteMode => {
                let overtype = !self.write.buf.overtype();
                self.write.buf.set_overtype(overtype);

                let mode = if overtype {
                    CursorMode::Overwrite
                } else {
                    CursorMode::Normal
                };

                self.write.set_cursor_mode(mode)?;
            }
            BeginningOfLine => self.write.buf.move_to_start(),
            EndOfLine => self.write.buf.move_to_end(),
            BackwardChar => {
                if n >= 0 {
                    if self.write.buf.move_cursor(-(n as isize)) == 0 {
                        self.beep()?;
                    }
                } else {
                    self.write.buf.move_cursor((-n) as isize);
                }
            }
            ForwardChar => {
                if n >= 0 {
                    if self.write.buf.move_cursor(n as isize) == 0 {
                        self.beep()?;
                    }
                } else {
                    self.write.buf.move_cursor(n as isize);
                }
            }
            BackwardWord => {
                let pos = prev_word_pos(self.write.buf.as_str(),
                    self.write.buf.cursor(), is_word_delim);
                self.write.buf.set_cursor(pos);
            }
            ForwardWord => {
                let pos = next_word_pos(self.write.buf.as_str(),
                    self.write.buf.cursor(), is_word_delim);
                self.write.buf.set_cursor(pos);
            }
            BackwardDeleteChar => {
                if n > 0 {
                    let removed = self.write.buf.backspace(n as usize);
                    if removed.is_empty() {
                        self.beep()?;
                    }
                } else if n < 0 {
                    self.write.buf.delete((-n) as usize);
                }
            }
            DeleteChar => {
                if n > 0 {
                    let removed = self.write.buf.delete(n as usize);
                    if removed.is_empty() {
                        self.beep()?;
                    }
                } else if n < 0 {
                    self.write.buf.backspace((-n) as usize);
                }
            }
            TransposeChars => {
                self.transpose_chars(count)?;
            }
            CapitalizeWord => self.case_word(CaseOp::Capitalize),
            UpcaseWord => self.case_word(CaseOp::Upper),
            DowncaseWord => self.case_word(CaseOp::Lower),
            KillLine => {
                let start = self.write.buf.cursor();
                let end = self.write.buf.len();
                self.kill_range(start, end)?;
            }
            KillWholeLine => {
                self.kill_whole_line()?;
            }
            UnixLineDiscard => {
                let cursor = self.write.buf.cursor();

                if cursor == 0 {
                    self.beep()?;
                } else {
                    let removed = self.write.buf.delete_range(0, cursor);
                    self.read.kill_ring.add_backwards(removed);
                }
            }
            BackwardKillWord => {
                let cursor = self.write.buf.cursor();
                let pos = prev_word_pos(self.write.buf.as_str(), cursor, is_word_delim);

                if pos < cursor {
                    let removed = self.write.buf.delete_range(pos, cursor);
                    self.read.kill_ring.add_backwards(removed);
                }
            }
            KillWord => {
                let cursor = self.write.buf.cursor();
                let pos = next_word_pos(self.write.buf.as_str(), cursor, is_word_delim);

                if pos > cursor {
                    let removed = self.write.buf.delete_range(cursor, pos);
                    self.read.kill_ring.add(removed);
                }
            }
            UnixWordRubout => {
                let mut killed = String::new();

                for _ in 0..count {
                    let cursor = self.write.buf.cursor();

                    if cursor == 0 {
                        self.beep()?;
                        break;
                    }

                    let pos = prev_word_pos(self.write.buf.as_str(), cursor,
                        char::is_whitespace);
                    let removed = self.write.buf.delete_range(pos, cursor);
                    killed.insert_str(0, &removed);
                }

                if !killed.is_empty() {
                    self.read.kill_ring.add_backwards(killed);
                }
            }
            Yank => {
                match self.read.kill_ring.yank() {
                    Some(s) => self.write.buf.insert_str(&s),
                    None => self.beep()?
                }
            }
            YankPop => {
                self.yank_pop()?;
            }
            ClearScreen => {
                self.write.clear_screen()?;
            }
            PreviousHistory => {
                if !self.move_history(false, 1) {
                    self.beep()?;
                }
            }
            NextHistory => {
                if !self.move_history(true, 1) {
                    self.beep()?;
                }
            }
            ViPreviousHistory => {
                if self.move_history(false, count) {
                    self.write.buf.move_to_start();
                } else {
                    self.beep()?;
                }
            }
            ViNextHistory => {
                if self.move_history(true, count) {
                    self.write.buf.move_to_start();
                } else {
                    self.beep()?;
                }
            }
            BeginningOfHistory => {
                if self.write.history.move_to_first() {
                    let ent = self.write.history.current().to_owned();
                    self.write.buf.set_text(&ent);
                } else {
                    self.beep()?;
                }
            }
            EndOfHistory => {
                if self.write.history.move_to_last() {
                    let ent = self.write.history.current().to_owned();
                    self.write.buf.set_text(&ent);
                } else {
                    self.beep()?;
                }
            }
            ReverseSearchHistory => {
                self.start_search_history(true)?;
            }
            ForwardSearchHistory => {
                self.start_search_history(false)?;
            }
            HistorySearchBackward => {
                self.history_search_backward()?;
            }
            HistorySearchForward => {
                self.history_search_forward()?;
            }
            CharacterSearch => {
                let (n, backward) = if n >= 0 {
                    (n as usize, false)
                } else {
                    ((-n) as usize, true)
                };
                self.read.state = InputState::CharSearch{n, backward};
            }
            CharacterSearchBackward => {
                let (n, backward) = if n >= 0 {
                    (n as usize, true)
                } else {
                    ((-n) as usize, false)
                };
                self.read.state = InputState::CharSearch{n, backward};
            }
            Complete => {
                if self.is_tab_literal()? || self.read.disable_completion {
                    self.write.buf.insert(count, '\t');
                } else {
                    self.complete_word()?;
                }
            }
            PossibleCompletions => {
                if self.read.completions.is_none() {
                    self.build_completions();
                }

                if let Some(completions) = self.read.completions.take() {
                    self.show_completions(&completions)?;
                    self.read.completions = Some(completions);
                }
            }
            InsertCompletions => {
                if self.read.completions.is_none() {
                    self.build_completions();
                }

                if let Some(completions) = self.read.completions.take() {
                    self.insert_completions(&completions)?;
                    self.read.completions = Some(completions);
                }
            }
            PasteFromClipboard => {
                // Clipboard failures are swallowed
                let clip = self.read.clipboard.clone();

                if let Some(clip) = clip {
                    if let Ok(text) = clip.get_text() {
                        self.write.buf.insert_str(&text);
                    }
                }
            }
            InsertComment => {
                self.do_insert_comment(false)?;
            }
            ViInsertComment => {
                self.do_insert_comment(true)?;
            }
            InsertCloseParen => self.insert_close(')')?,
            InsertCloseCurly => self.insert_close('}')?,
            InsertCloseSquare => self.insert_close(']')?,
            DigitArgument => {
                self.read.state = InputState::Number;
                self.write.set_digit_from_char(ch);
            }
            StartKbdMacro => {
                self.read.recording = true;
                self.read.kbd_macro.clear();
            }
            EndKbdMacro => {
                self.read.recording = false;

                // Remove the sequence that ended the recording
                let seq_chars = self.read.sequence.chars().count();
                let macro_chars = self.read.kbd_macro.chars().count();
                let keep = macro_chars.saturating_sub(seq_chars);
                let kept = self.read.kbd_macro.chars().take(keep).collect::<String>();
                self.read.kbd_macro = kept;
            }
            CallLastKbdMacro => {
                let keys = self.read.kbd_macro.clone();
                self.read.queue_input(&keys);
            }
            ReReadInitFile => {
                // Configuration directives are supplied by the host
                // application; there is no file to re-read here.
            }
            EmacsEditingMode => {
                self.read.set_keymap(crate::keymap::EMACS);
            }
            ViEditingMode | ViInsertionMode => {
                self.read.set_keymap(VI_INSERT);
            }
            ViMovementMode => {
                if self.read.mode == Mode::Normal {
                    self.write.buf.move_cursor(-1);
                }
                self.read.set_keymap(VI_MOVE);
            }
            ViAppendMode => {
                self.write.buf.move_cursor(1);
                self.read.set_keymap(VI_INSERT);
            }
            ViAppendEol => {
                self.write.buf.move_to_end();
                self.read.set_keymap(VI_INSERT);
            }
            ViInsertBeg => {
                self.write.buf.move_to_start();
                self.read.set_keymap(VI_INSERT);
            }
            ViMoveAcceptLine => {
                self.read.set_keymap(VI_INSERT);
                self.read.line_state = LineState::Done;
            }
            ViEofMaybe => {
                if self.write.buf.is_empty() {
                    self.read.line_state = LineState::Eof;
                } else {
                    self.read.line_state = LineState::Done;
                }
            }
            ViArgDigit => {
                if let Some(digit) = ch.to_digit(10) {
                    self.write.input_arg.input(digit as i32);
                    self.write.explicit_arg = true;
                    self.read.is_arg_digit = true;
                }
            }
            ViBeginningOfLineOrArgDigit => {
                let digits_pending = match self.write.input_arg {
                    Digit::Num(_) => self.write.explicit_arg,
                    _ => false
                };

                if digits_pending {
                    self.write.input_arg.input(0);
                    self.read.is_arg_digit = true;
                } else {
                    self.write.buf.move_to_start();
                }
            }
            ViFirstPrint => {
                let pos = first_print_pos(self.write.buf.as_str());
                self.write.buf.set_cursor(pos);
            }
            ViPrevWord => {
                if !self.vi_prev_word(count) {
                    self.beep()?;
                }
            }
            ViNextWord => {
                if !self.vi_next_word(count) {
                    self.beep()?;
                }
            }
            ViEndWord => {
                self.vi_end_word(count);
            }
            ViCharSearch => {
                if ch == ';' || ch == ',' {
                    if !self.do_vi_char_search(count, ch, None) {
                        self.beep()?;
                    }
                } else {
                    self.read.state = InputState::ViCharSearch{n: count, invoke: ch};
                }
            }
            ViMatch => {
                if !self.do_vi_match() {
                    self.beep()?;
                }
            }
            ViDelete => {
                for _ in 0..count {
                    let removed = self.write.buf.delete(1);
                    if removed.is_empty() {
                        self.beep()?;
                        break;
                    }
                }
            }
            ViRubout => {
                for _ in 0..count {
                    let removed = self.write.buf.backspace(1);
                    if removed.is_empty() {
                        self.beep()?;
                        break;
                    }
                }
            }
            ViChangeCase => {
                self.vi_change_case(count)?;
            }
            ViChangeChar => {
                self.read.state = InputState::ViChangeChar{n: count};
            }
            ViPut => {
                self.vi_put(count)?;
            }
            ViDeleteTo => {
                if self.read.mode == Mode::ViDeleteTo {
                    // "dd" deletes the whole line
                    self.kill_whole_line()?;
                    self.read.mode = Mode::Normal;
                    self.read.previous_mode = Mode::Normal;
                } else {
                    self.read.vi_op_start = self.write.buf.cursor();
                    self.read.mode = Mode::ViDeleteTo;
                }
            }
            ViChangeTo => {
                if self.read.mode == Mode::ViChangeTo {
                    // "cc" changes the whole line
                    self.kill_whole_line()?;
                    self.read.mode = Mode::Normal;
                    self.read.previous_mode = Mode::Normal;
                    self.read.set_keymap(VI_INSERT);
                } else {
                    self.read.vi_op_start = self.write.buf.cursor();
                    self.read.mode = Mode::ViChangeTo;
                }
            }
            ViYankTo => {
                if self.read.mode == Mode::ViYankTo {
                    // "yy" yanks the whole line
                    self.read.yank_buffer = self.write.buf.as_str().to_owned();
                    self.read.mode = Mode::Normal;
                    self.read.previous_mode = Mode::Normal;
                } else {
                    self.read.vi_op_start = self.write.buf.cursor();
                    self.read.mode = Mode::ViYankTo;
                }
            }
            ViDeleteToEol => {
                let cursor = self.write.buf.cursor();
                let end = self.write.buf.len();
                self.vi_delete_range(cursor, end, false);
            }
            ViChangeToEol => {
                let cursor = self.write.buf.cursor();
                let end = self.write.buf.len();
                self.vi_delete_range(cursor, end, true);
                self.read.set_keymap(VI_INSERT);
            }
            ViKillWholeLine => {
                self.kill_whole_line()?;
                self.read.set_keymap(VI_INSERT);
            }
            ViSearch => {
                self.start_vi_search(ch);
            }
            ViColumn | ViGotoMark | DoLowercaseVersion => {
                self.beep()?;
            }
            Custom(ref name) => {
                let fun = self.read.functions.get(&name[..]).cloned();

                match fun {
                    Some(fun) => {
                        fun.execute(self, n, ch)?;
                        custom_category = Some(fun.category());
                    }
                    None => self.beep()?
                }
            }
        }

        if self.read.previous_mode.is_vi_op() && !self.pending_vi_motion() {
            let op = self.read.previous_mode;
            self.apply_vi_op(op)?;
        }

        self.finish_category(custom_category.unwrap_or(category));

        Ok(())
    }

    fn pending_vi_motion(&self) -> bool {
        match self.read.state {
            InputState::ViCharSearch{..} => true,
            _ => false
        }
    }

    fn queue_paren_blink(&mut self, ch: char) -> io::Result<()> {
        if let Some(open) = get_open_paren(ch) {
            let pos = find_matching_paren(self.write.buf.up_to_cursor(),
                &self.read.string_chars, open, ch);

            if let Some(pos) = pos {
                self.write.pending_blink = Some(pos);
            }
        }

        Ok(())
    }

    fn insert_close(&mut self, close: char) -> io::Result<()> {
        self.write.buf.insert(1, close);

        if let Some(open) = get_open_paren(close) {
            let pos = find_matching_paren(self.write.buf.up_to_cursor(),
                &self.read.string_chars, open, close);

            match pos {
                Some(pos) => self.write.pending_blink = Some(pos),
                None => self.beep()?
            }
        }

        Ok(())
    }

    fn transpose_chars(&mut self, count: usize) -> io::Result<()> {
        for _ in 0..count {
            let cursor = self.write.buf.cursor();

            if cursor == 0 || cursor == self.write.buf.len() {
                self.beep()?;
                break;
            }

            let prev = self.write.buf.current();
            let next = self.write.buf.next_char();

            let start = cursor - prev.len_utf8();
            let end = cursor + next.len_utf8();

            let mut swapped = String::with_capacity(end - start);
            swapped.push(next);
            swapped.push(prev);

            self.write.buf.replace_range(start, end, &swapped);
        }

        Ok(())
    }

    fn case_word(&mut self, op: CaseOp) {
        let cursor = self.write.buf.cursor();
        let end = word_run_end(self.write.buf.as_str(), cursor);

        if end > cursor {
            let word = self.write.buf.as_str()[cursor..end].to_owned();

            let repl = match op {
                CaseOp::Upper => word.to_uppercase(),
                CaseOp::Lower => word.to_lowercase(),
                CaseOp::Capitalize => {
                    let mut chars = word.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase()
                            .chain(chars.as_str().to_lowercase().chars())
                            .collect(),
                        None => word.clone()
                    }
                }
            };

            self.write.buf.replace_range(cursor, end, &repl);
        }
    }

    fn kill_whole_line(&mut self) -> io::Result<()> {
        let end = self.write.buf.len();
        self.kill_range(0, end)
    }

    fn yank_pop(&mut self) -> io::Result<()> {
        if !self.read.kill_ring.last_yank() {
            return self.beep();
        }

        let current = match self.read.kill_ring.yank() {
            Some(s) => s,
            None => return self.beep()
        };

        let n = current.chars().count();
        self.write.buf.backspace(n);

        if let Some(prev) = self.read.kill_ring.yank_pop() {
            self.write.buf.insert_str(&prev);
        }

        Ok(())
    }

    fn move_history(&mut self, next: bool, count: usize) -> bool {
        for _ in 0..count {
            let ok = if next {
                self.write.history.next()
            } else {
                self.write.history.previous()
            };

            if !ok {
                return false;
            }
        }

        let ent = self.write.history.current().to_owned();
        self.write.buf.set_text(&ent);
        true
    }

    //
    // Incremental history search
    //

    fn start_search_history(&mut self, reverse: bool) -> io::Result<()> {
        self.read.original_buffer = Some(self.write.buf.clone());

        if !self.read.search_term.is_empty() {
            let term = self.read.search_term.clone();
            self.read.previous_search_term = term;
        }

        self.read.search_term = self.write.buf.as_str().to_owned();
        self.read.search_index = None;
        self.read.mode = Mode::Search{reverse};

        if !self.read.search_term.is_empty() {
            self.research_full()?;
        }

        self.update_search_status()
    }

    /// Handles a decoded operation while an incremental search is active.
    fn search_command(&mut self, cmd: Command, ch: char) -> io::Result<()> {
        use crate::command::Command::*;

        match cmd {
            Abort => {
                if let Some(orig) = self.read.original_buffer.take() {
                    self.write.buf = orig;
                }
                self.leave_search();
                return Ok(());
            }
            ReverseSearchHistory | ForwardSearchHistory => {
                let reverse = cmd == ReverseSearchHistory;
                self.read.mode = Mode::Search{reverse};

                if self.read.search_term.is_empty() {
                    let prev = self.read.previous_search_term.clone();
                    self.read.search_term = prev;
                }

                if !self.read.search_term.is_empty() {
                    let term = self.read.search_term.clone();
                    let found = match self.read.search_index {
                        Some(idx) => if reverse {
                            self.write.history.search_backward(&term, idx, false)
                        } else {
                            self.write.history.search_forward(&term, idx + 1, false)
                        },
                        None => if reverse {
                            let end = self.write.history.index();
                            self.write.history.search_backward(&term, end, false)
                        } else {
                            let from = self.write.history.index();
                            self.write.history.search_forward(&term, from, false)
                        }
                    };

                    match found {
                        Some(idx) => self.read.search_index = Some(idx),
                        // No further match; keep the current one
                        None => self.beep()?
                    }
                }
            }
            BackwardDeleteChar => {
                if !self.read.search_term.is_empty() {
                    self.read.search_term.pop();

                    if self.read.search_term.is_empty() {
                        self.read.search_index = None;
                    } else {
                        self.research_full()?;
                    }
                }
            }
            SelfInsert => {
                self.read.search_term.push(ch);
                self.research_full()?;
            }
            other => {
                // Any other operation commits the search. The operation
                // itself is discarded unless it accepts the line.
                if let Some(idx) = self.read.search_index {
                    self.write.history.move_to(idx);
                }

                self.leave_search();

                if other == AcceptLine {
                    return self.execute_command(AcceptLine, 1, ch);
                }

                return Ok(());
            }
        }

        self.update_search_status()
    }

    fn is_reverse_search(&self) -> bool {
        match self.read.mode {
            Mode::Search{reverse} => reverse,
            _ => false
        }
    }

    /// Searches for the full term again, from the appropriate end.
    fn research_full(&mut self) -> io::Result<()> {
        let term = self.read.search_term.clone();
        let reverse = self.is_reverse_search();

        let found = if reverse {
            let end = self.write.history.index();
            self.write.history.search_backward(&term, end, false)
        } else {
            let from = self.write.history.index();
            self.write.history.search_forward(&term, from, false)
        };

        match found {
            Some(idx) => self.read.search_index = Some(idx),
            // No match for the new term; keep the current one
            None => self.beep()?
        }

        Ok(())
    }

    fn update_search_status(&mut self) -> io::Result<()> {
        let reverse = self.is_reverse_search();
        let label = if reverse { "bck-i-search" } else { "i-search" };
        let term = self.read.search_term.clone();

        self.write.post = Some(vec![format!("{}: {}_", label, term)]);

        if let Some(idx) = self.read.search_index {
            let ent = self.write.history.get(idx).to_owned();
            let pos = ent.find(&term).unwrap_or(0);

            self.write.buf.set_text(&ent);
            self.write.buf.set_cursor(pos);
        }

        Ok(())
    }

    fn leave_search(&mut self) {
        self.read.mode = Mode::Normal;
        self.write.post = None;
        self.read.original_buffer = None;
        self.read.search_index = None;

        if !self.read.search_term.is_empty() {
            let term = replace(&mut self.read.search_term, String::new());
            self.read.previous_search_term = term;
        }
    }

    //
    // Prefix history search
    //

    fn history_search_backward(&mut self) -> io::Result<()> {
        let prefix = self.write.buf.up_to_cursor().to_owned();
        let pos = prefix.len();
        let from = self.write.history.index();

        match self.write.history.search_backward(&prefix, from, true) {
            Some(idx) => {
                self.write.history.move_to(idx);
                let ent = self.write.history.current().to_owned();
                self.write.buf.set_text(&ent);
                self.write.buf.set_cursor(pos);
            }
            None => self.beep()?
        }

        Ok(())
    }

    fn history_search_forward(&mut self) -> io::Result<()> {
        let prefix = self.write.buf.up_to_cursor().to_owned();
        let pos = prefix.len();
        let from = self.write.history.index() + 1;
        let end = self.write.history.first_index() + self.write.history.len();

        match self.write.history.search_forward(&prefix, from, true) {
            Some(idx) => {
                self.write.history.move_to(idx);
                let ent = self.write.history.current().to_owned();
                self.write.buf.set_text(&ent);
                self.write.buf.set_cursor(pos);
            }
            None => {
                if self.write.history.index() < end {
                    // Past the most recent match; restore the search prefix
                    self.write.history.move_to_end();
                    self.write.buf.set_text(&prefix);
                } else {
                    self.beep()?;
                }
            }
        }

        Ok(())
    }

    //
    // vi helpers
    //

    fn buf_chars(&self) -> (Vec<char>, Vec<usize>) {
        let s = self.write.buf.as_str();
        let mut chars = Vec::with_capacity(s.len());
        let mut offsets = Vec::with_capacity(s.len() + 1);

        for (idx, ch) in s.char_indices() {
            offsets.push(idx);
            chars.push(ch);
        }

        offsets.push(s.len());

        (chars, offsets)
    }

    fn cursor_char(&self, offsets: &[usize]) -> usize {
        let cursor = self.write.buf.cursor();

        offsets.iter().position(|&off| off == cursor)
            .expect("cursor not on a character boundary")
    }

    fn apply_vi_op(&mut self, op: Mode) -> io::Result<()> {
        self.read.mode = Mode::Normal;
        self.read.previous_mode = Mode::Normal;

        let start = self.read.vi_op_start;
        let cursor = self.write.buf.cursor();

        match op {
            Mode::ViDeleteTo => {
                self.vi_delete_range(start, cursor, false);
            }
            Mode::ViChangeTo => {
                self.vi_delete_range(start, cursor, true);
                self.read.set_keymap(VI_INSERT);
            }
            Mode::ViYankTo => {
                let (a, b) = if start <= cursor {
                    (start, cursor)
                } else {
                    (cursor, start)
                };

                self.read.yank_buffer = self.write.buf.as_str()[a..b].to_owned();
                let buf_len = self.write.buf.len();
                self.write.buf.set_cursor(start.min(buf_len));
            }
            _ => ()
        }

        Ok(())
    }

    /// Deletes the span between two cursor positions, in either order.
    ///
    /// Unless the delete is part of a change operation, the cursor is kept
    /// within the line rather than dangling off its end.
    fn vi_delete_range(&mut self, a: usize, b: usize, is_change: bool) {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };

        if start == end {
            return;
        }

        self.write.buf.delete_range(start, end);
        self.write.buf.set_cursor(start);

        if !is_change && start > 0 && start == self.write.buf.len() {
            self.write.buf.move_cursor(-1);
        }
    }

    fn vi_prev_word(&mut self, count: usize) -> bool {
        let (chars, offsets) = self.buf_chars();
        let cur = self.cursor_char(&offsets);

        if cur == 0 {
            return false;
        }

        let mut pos = cur - 1;

        for i in 0..count {
            if pos == 0 {
                break;
            }

            while pos > 0 && chars[pos].is_whitespace() {
                pos -= 1;
            }
            while pos > 0 && !is_word_delim(chars[pos - 1]) {
                pos -= 1;
            }

            if pos > 0 && i < count - 1 {
                pos -= 1;
            }
        }

        self.write.buf.set_cursor(offsets[pos]);
        true
    }

    fn vi_next_word(&mut self, count: usize) -> bool {
        let (chars, offsets) = self.buf_chars();
        let end = chars.len();
        let mut pos = self.cursor_char(&offsets);

        if pos == end {
            return false;
        }

        // During a change operation, trailing delimiters after the last
        // word are left intact.
        let is_change = self.read.mode == Mode::ViChangeTo;

        for i in 0..count {
            if pos >= end {
                break;
            }

            while pos < end && !is_word_delim(chars[pos]) {
                pos += 1;
            }

            if i < count - 1 || !is_change {
                while pos < end && is_word_delim(chars[pos]) {
                    pos += 1;
                }
            }
        }

        self.write.buf.set_cursor(offsets[pos]);
        true
    }

    fn vi_end_word(&mut self, count: usize) {
        let (chars, offsets) = self.buf_chars();
        let end = chars.len();
        let mut pos = self.cursor_char(&offsets);

        for _ in 0..count {
            if pos >= end {
                break;
            }

            if pos + 1 < end && !is_word_delim(chars[pos])
                    && is_word_delim(chars[pos + 1]) {
                pos += 1;
            }

            while pos < end && is_word_delim(chars[pos]) {
                pos += 1;
            }
            while pos + 1 < end && !is_word_delim(chars[pos + 1]) {
                pos += 1;
            }
        }

        self.write.buf.set_cursor(offsets[pos.min(end)]);
    }

    fn do_vi_match(&mut self) -> bool {
        let (chars, offsets) = self.buf_chars();
        let cur = self.cursor_char(&offsets);

        match crate::util::find_bracket_match(&chars, cur) {
            Some(mut pos) => {
                // When an operator is pending and the match lies forward,
                // the matching bracket itself is included in the span.
                if pos > cur && self.read.mode.is_vi_op() {
                    pos += 1;
                }

                self.write.buf.set_cursor(offsets[pos]);
                true
            }
            None => false
        }
    }

    /// Performs a vi character search.
    ///
    /// `f` searches forward and `F` backward; `t` and `T` stop one
    /// character short of the target. `;` repeats the previous search and
    /// `,` reverses it. `target` is `None` for the repeat forms.
    fn do_vi_char_search(&mut self, count: usize, invoke: char, target: Option<char>)
            -> bool {
        let search_char;
        let first;

        if invoke == ';' || invoke == ',' {
            match self.read.char_search {
                None => return false,
                Some(ref mut cs) => {
                    let mut f = cs.first;

                    if cs.last == ';' || cs.last == ',' {
                        if cs.last != invoke {
                            f = switch_case(f);
                        }
                    } else if invoke == ',' {
                        f = switch_case(f);
                    }

                    cs.first = f;
                    first = f;
                    search_char = cs.ch;
                }
            }
        } else {
            let target = match target {
                Some(t) => t,
                None => return false
            };

            search_char = target;
            first = invoke;
            self.read.char_search = Some(CharSearch{
                ch: target,
                first: invoke,
                last: invoke,
            });
        }

        if let Some(ref mut cs) = self.read.char_search {
            cs.last = invoke;
        }

        let forward = first.is_lowercase();
        let stop_before = first.to_ascii_lowercase() == 't';
        let in_vi_op = self.read.mode.is_vi_op();

        let (chars, offsets) = self.buf_chars();
        let mut cur = self.cursor_char(&offsets);
        let mut found = false;

        if forward {
            for _ in 0..count {
                let mut pos = cur + 1;

                while pos < chars.len() {
                    if chars[pos] == search_char {
                        cur = pos;
                        found = true;
                        break;
                    }
                    pos += 1;
                }
            }

            if found {
                if stop_before {
                    cur -= 1;
                }

                // Include the landing character in a pending operator span
                if in_vi_op {
                    cur += 1;
                }
            }
        } else {
            for _ in 0..count {
                let mut pos = cur as isize - 1;

                while pos >= 0 {
                    if chars[pos as usize] == search_char {
                        cur = pos as usize;
                        found = true;
                        break;
                    }
                    pos -= 1;
                }
            }

            if found && stop_before {
                cur += 1;
            }
        }

        if found {
            self.write.buf.set_cursor(offsets[cur]);
        }

        found
    }

    fn vi_change_case(&mut self, count: usize) -> io::Result<()> {
        for _ in 0..count {
            let cursor = self.write.buf.cursor();

            if cursor >= self.write.buf.len() {
                self.beep()?;
                break;
            }

            let ch = self.write.buf.next_char();
            let flipped = if ch.is_uppercase() {
                ch.to_lowercase().collect::<String>()
            } else if ch.is_lowercase() {
                ch.to_uppercase().collect::<String>()
            } else {
                ch.to_string()
            };

            let end = cursor + ch.len_utf8();
            self.write.buf.replace_range(cursor, end, &flipped);
        }

        Ok(())
    }

    fn vi_change_char(&mut self, count: usize, ch: char) -> io::Result<()> {
        for i in 0..count {
            let cursor = self.write.buf.cursor();

            if cursor >= self.write.buf.len() {
                self.beep()?;
                break;
            }

            let old = self.write.buf.next_char();
            let end = cursor + old.len_utf8();

            self.write.buf.replace_range(cursor, end, &ch.to_string());
            self.write.buf.move_cursor(-1);

            if i < count - 1 {
                self.write.buf.move_cursor(1);
            }
        }

        Ok(())
    }

    fn vi_put(&mut self, count: usize) -> io::Result<()> {
        let yank = self.read.yank_buffer.clone();

        if yank.is_empty() {
            return Ok(());
        }

        if self.write.buf.cursor() < self.write.buf.len() {
            self.write.buf.move_cursor(1);
        }

        for _ in 0..count {
            self.write.buf.insert_str(&yank);
        }

        self.write.buf.move_cursor(-1);
        Ok(())
    }

    //
    // Interactive vi search
    //

    fn start_vi_search(&mut self, ch: char) {
        let forward = ch == '/';

        self.read.vi_search = Some(ViSearch{
            forward,
            term: String::new(),
            index: None,
            orig: self.write.buf.clone(),
        });

        self.write.buf.clear();
        self.write.buf.insert(1, ch);
        self.read.state = InputState::ViSearchInput;
    }

    fn abort_vi_search(&mut self) {
        if let Some(search) = self.read.vi_search.take() {
            self.write.buf = search.orig;
        }
        self.read.state = InputState::NewSequence;
    }

    fn vi_search_input(&mut self, ch: char) -> io::Result<()> {
        match ch {
            ESCAPE => self.abort_vi_search(),
            '\x08' | RUBOUT => {
                self.write.buf.backspace(1);

                // Backspacing through the search prompt aborts
                if self.write.buf.cursor() == 0 {
                    self.abort_vi_search();
                }
            }
            '\r' | '\n' => {
                let (forward, term) = match self.read.vi_search {
                    Some(ref s) => (s.forward, self.write.buf.as_str()[1..].to_owned()),
                    None => return Ok(())
                };

                let found = if forward {
                    let start = self.write.history.first_index();
                    self.write.history.search_forward(&term, start, false)
                } else {
                    let end = self.write.history.index();
                    self.write.history.search_backward(&term, end, false)
                };

                match found {
                    Some(idx) => {
                        if let Some(ref mut s) = self.read.vi_search {
                            s.term = term;
                            s.index = Some(idx);
                        }

                        let ent = self.write.history.get(idx).to_owned();
                        self.write.buf.set_text(&ent);
                        self.write.buf.move_to_start();
                        self.read.state = InputState::ViSearchBrowse;
                    }
                    None => {
                        self.abort_vi_search();
                        self.write.buf.move_to_start();
                    }
                }
            }
            ch => {
                self.write.buf.insert(1, ch);
            }
        }

        Ok(())
    }

    fn vi_search_browse(&mut self, ch: char) -> io::Result<()> {
        match ch {
            'n' | 'N' | 'p' | 'P' => {
                let (mut forward, term, idx) = match self.read.vi_search {
                    Some(ref s) => match s.index {
                        Some(idx) => (s.forward, s.term.clone(), idx),
                        None => return Ok(())
                    },
                    None => return Ok(())
                };

                if ch == 'p' || ch == 'P' {
                    forward = !forward;
                }

                let found = if forward {
                    self.write.history.search_forward(&term, idx + 1, false)
                } else {
                    self.write.history.search_backward(&term, idx, false)
                };

                if let Some(idx) = found {
                    if let Some(ref mut s) = self.read.vi_search {
                        s.index = Some(idx);
                    }

                    let ent = self.write.history.get(idx).to_owned();
                    self.write.buf.set_text(&ent);
                    self.write.buf.move_to_start();
                }
            }
            ch => {
                // Any other key resumes normal editing of the shown entry
                self.read.vi_search = None;
                self.read.state = InputState::NewSequence;
                self.read.queue_input(&ch.to_string());
            }
        }

        Ok(())
    }

    //
    // Completion
    //

    fn is_tab_literal(&mut self) -> io::Result<bool> {
        if !self.read.copy_paste_detection {
            return Ok(false);
        }

        if self.read.sequence != "\t" {
            return Ok(false);
        }

        if !self.read.data.macro_buffer.is_empty()
                || !self.read.data.input_buffer.is_empty() {
            return Ok(true);
        }

        self.read.poll_input(Some(COPY_PASTE_DETECTION_TIMEOUT))
    }

    fn build_completions(&mut self) {
        let completers = self.read.completers.clone();
        let end = self.write.buf.cursor();

        self.read.completions = None;
        self.read.active_completer = None;

        for completer in completers {
            let start = completer.word_start(self.write.buf.as_str(), end, self);

            if start > end {
                panic!("Completer::word_start returned invalid index; \
                    start > end ({} > {})", start, end);
            }

            let word = completer.unquote(&self.write.buf.as_str()[start..end])
                .into_owned();

            if let Some(completions) = completer.complete(&word, self, start, end) {
                self.read.completions = Some(completions);
                self.read.completion_start = start;
                self.read.active_completer = Some(completer);
                break;
            }
        }
    }

    fn complete_word(&mut self) -> io::Result<()> {
        if let Some(completions) = self.read.completions.take() {
            if completions.len() == 1 {
                self.substitute_completion(&completions[0])?;
            } else {
                self.show_completions(&completions)?;
                self.read.completions = Some(completions);
            }
        } else {
            self.build_completions();
            let completions = self.read.completions.take().unwrap_or_default();

            if completions.len() == 1 {
                self.substitute_completion(&completions[0])?;
            } else if !completions.is_empty() {
                let start = self.read.completion_start;
                let end = self.write.buf.cursor();

                {
                    let pfx = longest_common_prefix(completions.iter()
                        .map(|compl| &compl.completion))
                        .unwrap_or_default().to_owned();
                    self.write.buf.replace_range(start, end, &pfx);
                }

                self.read.completions = Some(completions);
            } else {
                self.beep()?;
            }
        }

        Ok(())
    }

    fn substitute_completion(&mut self, compl: &Completion) -> io::Result<()> {
        let mut s = match self.read.active_completer {
            Some(ref c) => c.quote(&compl.completion).into_owned(),
            None => compl.completion.clone()
        };

        if let Some(suffix) = compl.suffix
                .with_default(self.read.completion_append_character) {
            s.push(suffix);
        }

        let start = self.read.completion_start;
        let end = self.write.buf.cursor();
        self.write.buf.replace_range(start, end, &s);

        Ok(())
    }

    fn insert_completions(&mut self, completions: &[Completion]) -> io::Result<()> {
        let mut words = String::new();

        for compl in completions {
            match self.read.active_completer {
                Some(ref c) => words.push_str(&c.unquote(&compl.completion)),
                None => words.push_str(&compl.completion)
            }
            words.push(' ');
        }

        let start = self.read.completion_start;
        let end = self.write.buf.cursor();
        self.write.buf.replace_range(start, end, &words);

        Ok(())
    }

    fn completion_rows(&self) -> Vec<String> {
        let completions = match self.read.completions {
            Some(ref c) => c,
            None => return Vec::new()
        };

        let width = self.write.screen_size.columns
            .min(self.read.completion_display_width);
        let items = completions.iter()
            .map(|compl| compl.display().into_owned())
            .collect::<Vec<_>>();

        column_rows(&items, width, self.read.print_completions_horizontally)
    }

    fn show_completions(&mut self, completions: &[Completion]) -> io::Result<()> {
        if completions.is_empty() {
            return Ok(());
        }

        let n = completions.len();

        if self.read.page_completions && n >= self.read.completion_query_items {
            self.write.post = Some(vec![
                messages::format_count("display-candidates", n)]);
            self.read.state = InputState::CompleteIntro;
        } else {
            let width = self.write.screen_size.columns
                .min(self.read.completion_display_width);
            let items = completions.iter()
                .map(|compl| compl.display().into_owned())
                .collect::<Vec<_>>();
            let rows = column_rows(&items, width,
                self.read.print_completions_horizontally);

            self.write.post = Some(rows);
        }

        Ok(())
    }

    fn complete_intro_input(&mut self, ch: char) -> io::Result<()> {
        let yes = messages::lookup("display-candidates-yes")
            .chars().next().unwrap_or('y').to_ascii_lowercase();
        let no = messages::lookup("display-candidates-no")
            .chars().next().unwrap_or('n').to_ascii_lowercase();

        let lch = ch.to_ascii_lowercase();

        if lch == yes || ch == ' ' {
            self.begin_page_completions(false)
        } else if lch == no || lch == 'q' || ch == RUBOUT {
            self.read.state = InputState::NewSequence;
            self.write.post = None;
            Ok(())
        } else if ch == '\r' || ch == '\n' {
            self.begin_page_completions(true)
        } else {
            self.beep()
        }
    }

    fn begin_page_completions(&mut self, one_line: bool) -> io::Result<()> {
        self.write.post = None;
        self.write.redisplay()?;
        self.write.move_to_display_end()?;
        self.write.new_line()?;

        if one_line {
            self.show_completions_line(0)
        } else {
            self.show_completions_page(0)
        }
    }

    fn show_completions_page(&mut self, offset: usize) -> io::Result<()> {
        let rows = self.completion_rows();
        let page = self.write.screen_size.lines.saturating_sub(1).max(1);
        let end = (offset + page).min(rows.len());

        for row in &rows[offset..end] {
            self.write.write_str(row)?;
            self.write.write_str("\n")?;
        }

        self.continue_page_completions(end, rows.len())
    }

    fn show_completions_line(&mut self, offset: usize) -> io::Result<()> {
        let rows = self.completion_rows();
        let end = (offset + 1).min(rows.len());

        for row in &rows[offset..end] {
            self.write.write_str(row)?;
            self.write.write_str("\n")?;
        }

        self.continue_page_completions(end, rows.len())
    }

    fn continue_page_completions(&mut self, end: usize, total: usize)
            -> io::Result<()> {
        if end < total {
            self.write.write_str(messages::lookup("display-more"))?;
            self.write.flush()?;
            self.read.state = InputState::CompleteMore(end);
        } else {
            self.end_page_completions()?;
        }

        Ok(())
    }

    fn erase_more_prompt(&mut self) -> io::Result<()> {
        let n = messages::lookup("display-more").chars().count();

        self.write.write_str("\r")?;
        for _ in 0..n {
            self.write.write_str(" ")?;
        }
        self.write.write_str("\r")
    }

    fn complete_more_input(&mut self, offset: usize, ch: char) -> io::Result<()> {
        match ch {
            'y' | 'Y' | ' ' => {
                self.erase_more_prompt()?;
                self.show_completions_page(offset)
            }
            '\r' | '\n' => {
                self.erase_more_prompt()?;
                self.show_completions_line(offset)
            }
            'q' | 'Q' | 'n' | 'N' | RUBOUT => {
                self.erase_more_prompt()?;
                self.end_page_completions()
            }
            _ => self.beep()
        }
    }

    fn end_page_completions(&mut self) -> io::Result<()> {
        self.read.state = InputState::NewSequence;
        self.write.redraw_line();
        self.write.redisplay()?;
        self.write.flush()
    }

    //
    // Comments
    //

    fn do_insert_comment(&mut self, vi: bool) -> io::Result<()> {
        let comment = self.read.comment_begin.clone();

        self.write.buf.move_to_start();
        self.write.buf.insert_str(&comment);

        if vi {
            self.read.set_keymap(VI_INSERT);
        }

        self.read.line_state = LineState::Done;
        Ok(())
    }

    //
    // Signals and resize
    //

    pub(crate) fn handle_resize(&mut self, size: Size) -> io::Result<()> {
        self.expire_blink()?;

        if let InputState::CompleteMore(_) = self.read.state {
            self.end_page_completions()?;
        }

        self.write.screen_size = size;
        self.write.full_repaint()?;
        self.write.flush()
    }

    pub(crate) fn handle_signal(&mut self, signal: Signal) -> io::Result<()> {
        self.expire_blink()?;

        if let Signal::Continue = signal {
            self.write.full_repaint()?;
            self.write.flush()?;
        }

        Ok(())
    }
}

#[derive(Copy, Clone)]
enum CaseOp {
    Upper,
    Lower,
    Capitalize,
}

fn switch_case(ch: char) -> char {
    if ch.is_uppercase() {
        ch.to_ascii_lowercase()
    } else {
        ch.to_ascii_uppercase()
    }
}
