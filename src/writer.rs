//! Provides terminal write operations and the incremental redisplay engine
//!
//! The editor never repaints the whole screen on each keystroke. Instead,
//! a snapshot of the previously rendered text is kept and each update is
//! computed as a per-line diff between the old and new renderings,
//! preferring the terminal's insert/delete-character operations and
//! falling back to overwriting.

use std::fmt;
use std::io;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, MutexGuard};
use std::time::{Duration, Instant};

use crate::buffer::Buffer;
use crate::chars::{is_ctrl, unctrl};
use crate::highlighting::Highlighter;
use crate::history::History;
use crate::reader::{END_INVISIBLE, START_INVISIBLE};
use crate::terminal::{CursorMode, Size, Terminal, TerminalWriter};
use crate::util::{is_combining_mark, is_wide, repeat_char};
use crate::variables::BellStyle;

/// Duration to show a matching bracket before restoring the cursor
pub(crate) const BLINK_DURATION: Duration = Duration::from_millis(500);

/// Tab column interval
const TAB_STOP: usize = 8;

/// Provides an interface to write line-by-line output to the terminal device.
///
/// Holds a lock on terminal write operations.
/// See [`Interface`] for more information about concurrent operations.
///
/// An instance of this type can be constructed using either the
/// [`Interface::lock_writer_append`] or the [`Interface::lock_writer_erase`]
/// method.
///
/// [`Interface`]: ../interface/struct.Interface.html
/// [`Interface::lock_writer_append`]: ../interface/struct.Interface.html#method.lock_writer_append
/// [`Interface::lock_writer_erase`]: ../interface/struct.Interface.html#method.lock_writer_erase
pub struct Writer<'a, 'b: 'a, Term: 'b + Terminal> {
    write: WriterImpl<'a, 'b, Term>,
}

enum WriterImpl<'a, 'b: 'a, Term: 'b + Terminal> {
    Mutex(WriteLock<'b, Term>),
    MutRef(&'a mut WriteLock<'b, Term>),
}

pub(crate) struct Write {
    /// Input buffer
    pub buf: Buffer,
    /// Character hiding the buffer contents, if any
    pub mask: Option<char>,

    /// Prompt text, possibly spanning several lines
    pub prompt: String,
    /// Cell width of the prompt's final line, invisible spans excluded
    pub prompt_len: usize,

    /// Auxiliary lines rendered below the input line
    pub post: Option<Vec<String>>,

    /// Rendering drawn by the previous redisplay
    old_prompt: String,
    old_buf: String,
    old_post: Option<Vec<String>>,
    old_columns: usize,

    /// Visual cursor position, as a cell offset from the prompt origin
    cursor_pos: usize,

    /// Whether the prompt is drawn; i.e. a `read_line` operation is in progress
    pub is_prompt_drawn: bool,

    /// Terminal size as of last draw operation
    pub screen_size: Size,

    /// Stored history entries
    pub history: History,

    /// Numerical argument
    pub input_arg: Digit,
    /// Whether a numerical argument was supplied
    pub explicit_arg: bool,

    /// Bracket position awaiting a blink after the next redisplay
    pub pending_blink: Option<usize>,

    blink: Option<Blink>,
}

pub(crate) struct WriteLock<'a, Term: 'a + Terminal> {
    term: Box<dyn TerminalWriter<Term> + 'a>,
    data: MutexGuard<'a, Write>,
    highlighter: Option<Arc<dyn Highlighter + Send + Sync>>,
}

#[derive(Copy, Clone)]
struct Blink {
    expiry: Instant,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum DiffOp {
    Equal,
    Insert,
    Delete,
}

impl<'a, Term: Terminal> WriteLock<'a, Term> {
    pub fn new(term: Box<dyn TerminalWriter<Term> + 'a>, data: MutexGuard<'a, Write>,
            highlighter: Option<Arc<dyn Highlighter + Send + Sync>>)
            -> WriteLock<'a, Term> {
        WriteLock{term, data, highlighter}
    }

    pub fn size(&self) -> io::Result<Size> {
        self.term.size()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.term.flush()
    }

    pub fn update_size(&mut self) -> io::Result<()> {
        let size = self.size()?;
        self.data.screen_size = size;
        Ok(())
    }

    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.term.write(s)
    }

    /// Moves to the next line and invalidates the display snapshot.
    pub fn new_line(&mut self) -> io::Result<()> {
        self.term.write("\n")?;
        self.redraw_line();
        Ok(())
    }

    /// Invalidates the display snapshot, forcing the next redisplay to
    /// repaint in full from the current cursor position.
    pub fn redraw_line(&mut self) {
        let data = &mut *self.data;

        data.old_prompt.clear();
        data.old_buf.clear();
        data.old_post = None;
        data.cursor_pos = 0;
    }

    /// Repaints the prompt and buffer from scratch, first clearing the
    /// screen area they previously occupied.
    pub fn full_repaint(&mut self) -> io::Result<()> {
        let columns = self.data.old_columns.max(1);
        let lines = self.data.cursor_pos / columns;

        self.term.move_up(lines)?;
        self.term.move_to_first_column()?;
        self.term.clear_to_screen_end()?;
        self.redraw_line();
        self.redisplay()
    }

    pub fn clear_screen(&mut self) -> io::Result<()> {
        self.term.clear_screen()?;
        self.redraw_line();
        Ok(())
    }

    pub fn set_cursor_mode(&mut self, mode: CursorMode) -> io::Result<()> {
        self.term.set_cursor_mode(mode)
    }

    /// Draws attention to the user according to the configured bell style.
    pub fn beep(&mut self, style: BellStyle, prefer_visible: bool) -> io::Result<()> {
        let visible = match style {
            BellStyle::None => return Ok(()),
            BellStyle::Audible => false,
            BellStyle::Visible => true,
            BellStyle::On => prefer_visible,
        };

        if !visible || !self.term.flash()? {
            self.term.bell()?;
        }

        self.term.flush()
    }

    pub fn set_prompt(&mut self, prompt: &str) -> io::Result<()> {
        let redraw = self.data.is_prompt_drawn;

        {
            let columns = self.data.screen_size.columns;
            let data = &mut *self.data;

            data.prompt.clear();
            data.prompt.push_str(prompt);
            data.prompt_len = cell_width(last_line(prompt), 0, columns.max(1));
        }

        if redraw {
            self.full_repaint()?;
        }

        Ok(())
    }

    /// Returns the display form of the input buffer.
    fn rendered_buffer(&self) -> String {
        match self.data.mask {
            Some('\0') => String::new(),
            Some(ch) => repeat_char(ch, self.data.buf.char_count()),
            None => match self.highlighter {
                Some(ref h) => h.highlight(self.data.buf.as_str()),
                None => self.data.buf.as_str().to_owned(),
            }
        }
    }

    /// Reconciles the physical screen with the current prompt, buffer, and
    /// post lines, then places the visual cursor at the buffer cursor.
    pub fn redisplay(&mut self) -> io::Result<()> {
        let columns = self.data.screen_size.columns;

        if columns == 0 {
            return Ok(());
        }

        let rendered = self.rendered_buffer();

        let new_content = compose(&self.data.prompt, &rendered, &self.data.post);
        let old_content = compose(&self.data.old_prompt, &self.data.old_buf,
            &self.data.old_post);

        let old_columns = match self.data.old_columns {
            0 => columns,
            n => n
        };

        let old_lines = render_lines(&old_content, old_columns);
        let new_lines = render_lines(&new_content, columns);

        // A pending wrap exists only on terminals that wrap on their own
        // but defer the motion until the next character is written.
        let deferred_wrap = self.term.auto_right_margin()
            && self.term.eat_newline_glitch();

        let mut line_index = 0;
        let mut current_pos = 0;

        while line_index < old_lines.len().min(new_lines.len()) {
            let old_line = &old_lines[line_index];
            let new_line = &new_lines[line_index];
            let cur_col = current_pos;

            line_index += 1;

            let diffs = diff_line(old_line, new_line);
            let n_diffs = diffs.len();
            let mut ident = true;
            let mut cleared = false;

            for (i, &(op, ref text)) in diffs.iter().enumerate() {
                let width = line_width(text);

                match op {
                    DiffOp::Equal => {
                        if !ident {
                            self.move_visual_cursor_to(current_pos)?;
                            self.term.write(text)?;
                            self.data.cursor_pos += width;
                            current_pos = self.data.cursor_pos;
                        } else {
                            current_pos += width;
                        }
                    }
                    DiffOp::Insert => {
                        if i + 1 < n_diffs && diffs[i + 1].0 == DiffOp::Equal {
                            self.move_visual_cursor_to(current_pos)?;

                            if self.term.insert_chars(width)? {
                                self.term.write(text)?;
                                self.data.cursor_pos += width;
                                current_pos = self.data.cursor_pos;
                                continue;
                            }
                        }

                        self.move_visual_cursor_to(current_pos)?;
                        self.term.write(text)?;
                        self.data.cursor_pos += width;
                        current_pos = self.data.cursor_pos;
                        ident = false;
                    }
                    DiffOp::Delete => {
                        if cleared {
                            continue;
                        }
                        if current_pos - cur_col >= columns {
                            continue;
                        }

                        if i + 1 < n_diffs && diffs[i + 1].0 == DiffOp::Equal &&
                                current_pos - cur_col
                                    + line_width(&diffs[i + 1].1) < columns {
                            self.move_visual_cursor_to(current_pos)?;

                            if self.term.delete_chars(width)? {
                                continue;
                            }
                        }

                        let old_len = line_width(old_line);
                        let new_len = line_width(new_line);
                        let nb = old_len.max(new_len)
                            .saturating_sub(current_pos - cur_col);

                        self.move_visual_cursor_to(current_pos)?;

                        if !self.term.clear_to_line_end()? {
                            self.write_spaces(nb)?;
                            self.data.cursor_pos += nb;
                        }

                        cleared = true;
                        ident = false;
                    }
                }
            }

            // A dummy space followed by a carriage return commits a
            // deferred wrap at the right margin.
            if deferred_wrap && self.data.cursor_pos > cur_col &&
                    self.data.cursor_pos % columns == 0 {
                self.term.write(" ")?;
                self.term.write("\r")?;
            }

            current_pos = cur_col + columns;
        }

        while line_index < old_lines.len().max(new_lines.len()) {
            self.move_visual_cursor_to(current_pos)?;

            if line_index < old_lines.len() {
                if !self.term.clear_to_line_end()? {
                    let nb = line_width(&old_lines[line_index]);
                    self.write_spaces(nb)?;
                    self.data.cursor_pos += nb;
                }
            } else {
                let text = &new_lines[line_index];

                self.term.write(text)?;
                self.data.cursor_pos += line_width(text);

                if deferred_wrap && self.data.cursor_pos > current_pos &&
                        self.data.cursor_pos % columns == 0 {
                    self.term.write(" ")?;
                    self.term.write("\r")?;
                }
            }

            line_index += 1;
            current_pos += columns;
        }

        let target = self.buffer_cell(self.data.buf.cursor());
        self.move_visual_cursor_to(target)?;

        let data = &mut *self.data;

        data.old_prompt.clone_from(&data.prompt);
        data.old_buf = rendered;
        data.old_post.clone_from(&data.post);
        data.old_columns = columns;

        Ok(())
    }

    /// Returns the cell position corresponding to a buffer position.
    fn buffer_cell(&self, pos: usize) -> usize {
        let columns = self.data.screen_size.columns.max(1);
        let prompt_lines = render_lines(&self.data.prompt, columns).len();
        let prompt_len = self.data.prompt_len;

        let buf_width = match self.data.mask {
            Some('\0') => 0,
            Some(ch) => {
                let n = self.data.buf.as_str()[..pos].chars().count();
                cell_width(&repeat_char(ch, n), prompt_len, columns)
            }
            None => cell_width(&self.data.buf.as_str()[..pos], prompt_len, columns),
        };

        (prompt_lines - 1) * columns + prompt_len + buf_width
    }

    /// Moves the visual cursor to the end of the rendered display.
    pub fn move_to_display_end(&mut self) -> io::Result<()> {
        let columns = self.data.old_columns.max(1);
        let content = compose(&self.data.old_prompt, &self.data.old_buf,
            &self.data.old_post);
        let lines = render_lines(&content, columns);

        let end = (lines.len() - 1) * columns
            + lines.last().map_or(0, |l| line_width(l));

        self.move_visual_cursor_to(end)
    }

    /// Erases the prompt and all rendered input from the screen.
    pub fn clear_full_prompt(&mut self) -> io::Result<()> {
        let columns = self.data.old_columns.max(1);
        let lines = self.data.cursor_pos / columns;

        self.term.move_up(lines)?;
        self.term.move_to_first_column()?;
        self.term.clear_to_screen_end()?;
        self.redraw_line();
        Ok(())
    }

    fn move_visual_cursor_to(&mut self, target: usize) -> io::Result<()> {
        let columns = self.data.screen_size.columns.max(1);
        let i0 = self.data.cursor_pos;

        if i0 == target {
            return Ok(());
        }

        let l0 = i0 / columns;
        let mut c0 = i0 % columns;
        let l1 = target / columns;
        let c1 = target % columns;

        if l0 > l1 {
            self.term.move_up(l0 - l1)?;
        } else if l0 < l1 {
            self.term.write("\r")?;
            for _ in 0..l1 - l0 {
                self.term.write("\n")?;
            }
            c0 = 0;
        }

        if c0 < c1 {
            self.term.move_right(c1 - c0)?;
        } else if c0 > c1 {
            self.term.move_left(c0 - c1)?;
        }

        self.data.cursor_pos = target;
        Ok(())
    }

    fn write_spaces(&mut self, n: usize) -> io::Result<()> {
        if n != 0 {
            let s = repeat_char(' ', n);
            self.term.write(&s)?;
        }
        Ok(())
    }

    /// Parks the visual cursor on the given buffer position until the next
    /// input or the blink timeout.
    pub fn start_blink(&mut self, pos: usize) -> io::Result<()> {
        self.expire_blink()?;

        let cell = self.buffer_cell(pos);
        self.move_visual_cursor_to(cell)?;

        self.data.blink = Some(Blink{
            expiry: Instant::now() + BLINK_DURATION,
        });

        Ok(())
    }

    pub fn check_expire_blink(&mut self, now: Instant) -> io::Result<bool> {
        if let Some(blink) = self.data.blink {
            if now >= blink.expiry {
                self.expire_blink()?;
            }
        }

        Ok(self.data.blink.is_none())
    }

    pub fn expire_blink(&mut self) -> io::Result<()> {
        if self.data.blink.take().is_some() {
            let cell = self.buffer_cell(self.data.buf.cursor());
            self.move_visual_cursor_to(cell)?;
        }

        Ok(())
    }

    pub fn reset_data(&mut self) {
        self.data.reset_data();
    }

    pub fn set_digit_from_char(&mut self, ch: char) {
        let digit = match ch {
            '-' => Digit::NegNone,
            '0' ..= '9' => Digit::from(ch),
            _ => Digit::None
        };

        self.data.input_arg = digit;
        self.data.explicit_arg = true;
    }
}

impl<'a, 'b: 'a, Term: 'b + Terminal> Writer<'a, 'b, Term> {
    fn new(mut write: WriterImpl<'a, 'b, Term>, clear: bool) -> io::Result<Self> {
        write.expire_blink()?;

        if write.is_prompt_drawn {
            if clear {
                write.clear_full_prompt()?;
            } else {
                write.move_to_display_end()?;
                write.new_line()?;
            }
        }

        Ok(Writer{write})
    }

    pub(crate) fn with_lock(write: WriteLock<'b, Term>, clear: bool) -> io::Result<Self> {
        Writer::new(WriterImpl::Mutex(write), clear)
    }

    pub(crate) fn with_ref(write: &'a mut WriteLock<'b, Term>, clear: bool) -> io::Result<Self> {
        Writer::new(WriterImpl::MutRef(write), clear)
    }

    /// Writes some text to the terminal device.
    ///
    /// Before the `Writer` is dropped, any output written should be followed
    /// by a newline. A newline is automatically written if the `writeln!`
    /// macro is used.
    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.write.write_str(s)
    }

    /// Writes formatted text to the terminal display.
    ///
    /// This method enables `Writer` to be used as the receiver to
    /// the [`writeln!`] macro.
    ///
    /// [`writeln!`]: https://doc.rust-lang.org/std/macro.writeln.html
    pub fn write_fmt(&mut self, args: fmt::Arguments) -> io::Result<()> {
        let s = args.to_string();
        self.write_str(&s)
    }
}

impl<'a, 'b: 'a, Term: 'b + Terminal> Drop for Writer<'a, 'b, Term> {
    fn drop(&mut self) {
        if self.write.is_prompt_drawn {
            // There's not really anything useful to be done with this error.
            let _ = self.write.redisplay();
            let _ = self.write.flush();
        }
    }
}

impl<'a, Term: 'a + Terminal> Deref for WriteLock<'a, Term> {
    type Target = Write;

    fn deref(&self) -> &Write {
        &self.data
    }
}

impl<'a, Term: 'a + Terminal> DerefMut for WriteLock<'a, Term> {
    fn deref_mut(&mut self) -> &mut Write {
        &mut self.data
    }
}

impl Write {
    pub fn new(screen_size: Size) -> Write {
        Write{
            buf: Buffer::new(),
            mask: None,

            prompt: String::new(),
            prompt_len: 0,

            post: None,

            old_prompt: String::new(),
            old_buf: String::new(),
            old_post: None,
            old_columns: screen_size.columns,

            cursor_pos: 0,

            is_prompt_drawn: false,

            screen_size,

            history: History::new(),

            input_arg: Digit::None,
            explicit_arg: false,

            pending_blink: None,

            blink: None,
        }
    }

    pub fn reset_data(&mut self) {
        self.buf.clear();
        self.buf.set_overtype(false);
        self.mask = None;
        self.post = None;
        self.input_arg = Digit::None;
        self.explicit_arg = false;
        self.pending_blink = None;
    }
}

/// Maximum value of digit input
const NUMBER_MAX: i32 = 1_000_000;

#[derive(Copy, Clone, Debug)]
pub(crate) enum Digit {
    None,
    NegNone,
    Num(i32),
    NegNum(i32),
}

impl Digit {
    pub fn input(&mut self, n: i32) {
        match *self {
            Digit::None => *self = Digit::Num(n),
            Digit::NegNone => *self = Digit::NegNum(n),
            Digit::Num(ref mut m) | Digit::NegNum(ref mut m) => {
                *m *= 10;
                *m += n;
            }
        }
    }

    pub fn is_out_of_bounds(&self) -> bool {
        match *self {
            Digit::Num(n) | Digit::NegNum(n) if n > NUMBER_MAX => true,
            _ => false
        }
    }

    pub fn to_i32(&self) -> i32 {
        match *self {
            Digit::None => 1,
            Digit::NegNone => -1,
            Digit::Num(n) => n,
            Digit::NegNum(n) => -n,
        }
    }
}

impl From<char> for Digit {
    /// Convert a decimal digit character to a `Digit` value.
    ///
    /// The input must be in the range `'0' ..= '9'`.
    fn from(ch: char) -> Digit {
        let n = (ch as u8) - b'0';
        Digit::Num(n as i32)
    }
}

/// Returns the text after the last newline, or the whole string.
fn last_line(s: &str) -> &str {
    match s.rfind('\n') {
        Some(pos) => &s[pos + 1..],
        None => s
    }
}

fn compose(prompt: &str, buf: &str, post: &Option<Vec<String>>) -> String {
    let mut s = String::with_capacity(prompt.len() + buf.len());

    s.push_str(prompt);
    s.push_str(buf);

    if let Some(ref post) = *post {
        s.push('\n');
        s.push_str(&post.join("\n"));
    }

    s
}

/// Splits text into physical screen lines of rendered cells.
///
/// Tabs are expanded to the next tab stop, control characters render as
/// `^X`, wide characters never straddle the right margin, and spans
/// bracketed by the invisible markers occupy no cells.
fn render_lines(s: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();
    let mut cur = String::new();
    let mut col = 0;
    let mut invisible = false;

    for ch in s.chars() {
        match ch {
            START_INVISIBLE => {
                invisible = true;
                cur.push(ch);
            }
            END_INVISIBLE => {
                invisible = false;
                cur.push(ch);
            }
            _ if invisible => cur.push(ch),
            '\n' => {
                lines.push(std::mem::replace(&mut cur, String::new()));
                col = 0;
            }
            '\t' => {
                let n = (TAB_STOP - col % TAB_STOP).min(columns - col);

                for _ in 0..n {
                    cur.push(' ');
                }
                col += n;

                if col == columns {
                    lines.push(std::mem::replace(&mut cur, String::new()));
                    col = 0;
                }
            }
            _ if is_combining_mark(ch) => cur.push(ch),
            _ if is_wide(ch) => {
                if col + 2 > columns && col > 0 {
                    while col < columns {
                        cur.push(' ');
                        col += 1;
                    }
                    lines.push(std::mem::replace(&mut cur, String::new()));
                    col = 0;
                }

                cur.push(ch);
                col += 2;

                if col >= columns {
                    lines.push(std::mem::replace(&mut cur, String::new()));
                    col = 0;
                }
            }
            _ if is_ctrl(ch) => {
                if col + 2 > columns && col > 0 {
                    while col < columns {
                        cur.push(' ');
                        col += 1;
                    }
                    lines.push(std::mem::replace(&mut cur, String::new()));
                    col = 0;
                }

                cur.push('^');
                cur.push(unctrl(ch));
                col += 2;

                if col >= columns {
                    lines.push(std::mem::replace(&mut cur, String::new()));
                    col = 0;
                }
            }
            ch => {
                cur.push(ch);
                col += 1;

                if col == columns {
                    lines.push(std::mem::replace(&mut cur, String::new()));
                    col = 0;
                }
            }
        }
    }

    lines.push(cur);
    lines
}

/// Returns the number of cells occupied by `s` when rendered starting at
/// cell column `start`.
pub(crate) fn cell_width(s: &str, start: usize, columns: usize) -> usize {
    let columns = columns.max(1);
    let mut col = start;
    let mut invisible = false;

    for ch in s.chars() {
        match ch {
            START_INVISIBLE => invisible = true,
            END_INVISIBLE => invisible = false,
            _ if invisible => (),
            '\n' => col += columns - col % columns,
            '\t' => {
                let c = col % columns;
                col += (TAB_STOP - c % TAB_STOP).min(columns - c);
            }
            _ if is_combining_mark(ch) => (),
            _ if is_wide(ch) => {
                col += if col % columns == columns - 1 { 3 } else { 2 };
            }
            _ if is_ctrl(ch) => col += 2,
            _ => col += 1,
        }
    }

    col - start
}

/// Returns the cell width of an already-rendered line.
fn line_width(s: &str) -> usize {
    let mut width = 0;
    let mut invisible = false;

    for ch in s.chars() {
        match ch {
            START_INVISIBLE => invisible = true,
            END_INVISIBLE => invisible = false,
            _ if invisible => (),
            _ if is_combining_mark(ch) => (),
            _ if is_wide(ch) => width += 2,
            _ => width += 1,
        }
    }

    width
}

/// Computes a character-level diff of two rendered lines as a common
/// prefix, a removed span, an inserted span, and a common suffix.
fn diff_line(old: &str, new: &str) -> Vec<(DiffOp, String)> {
    if old == new {
        return vec![(DiffOp::Equal, old.to_owned())];
    }

    let old_chars = old.chars().collect::<Vec<char>>();
    let new_chars = new.chars().collect::<Vec<char>>();

    let mut pre = 0;
    while pre < old_chars.len() && pre < new_chars.len()
            && old_chars[pre] == new_chars[pre] {
        pre += 1;
    }

    let mut suf = 0;
    while suf < old_chars.len() - pre && suf < new_chars.len() - pre
            && old_chars[old_chars.len() - 1 - suf] == new_chars[new_chars.len() - 1 - suf] {
        suf += 1;
    }

    let mut res = Vec::new();

    if pre != 0 {
        res.push((DiffOp::Equal, old_chars[..pre].iter().collect()));
    }
    if pre + suf < old_chars.len() {
        res.push((DiffOp::Delete,
            old_chars[pre..old_chars.len() - suf].iter().collect()));
    }
    if pre + suf < new_chars.len() {
        res.push((DiffOp::Insert,
            new_chars[pre..new_chars.len() - suf].iter().collect()));
    }
    if suf != 0 {
        res.push((DiffOp::Equal,
            old_chars[old_chars.len() - suf..].iter().collect()));
    }

    res
}

impl<'a, 'b, Term: 'b + Terminal> Deref for WriterImpl<'a, 'b, Term> {
    type Target = WriteLock<'b, Term>;

    fn deref(&self) -> &WriteLock<'b, Term> {
        match *self {
            WriterImpl::Mutex(ref m) => m,
            WriterImpl::MutRef(ref m) => m,
        }
    }
}

impl<'a, 'b: 'a, Term: 'b + Terminal> DerefMut for WriterImpl<'a, 'b, Term> {
    fn deref_mut(&mut self) -> &mut WriteLock<'b, Term> {
        match *self {
            WriterImpl::Mutex(ref mut m) => m,
            WriterImpl::MutRef(ref mut m) => m,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{cell_width, diff_line, line_width, render_lines, DiffOp};

    #[test]
    fn test_render_lines() {
        assert_eq!(render_lines("", 10), vec![String::new()]);
        assert_eq!(render_lines("abc", 10), vec!["abc".to_owned()]);
        assert_eq!(render_lines("abcde", 4),
            vec!["abcd".to_owned(), "e".to_owned()]);
        assert_eq!(render_lines("abcd", 4),
            vec!["abcd".to_owned(), String::new()]);
        assert_eq!(render_lines("ab\ncd", 4),
            vec!["ab".to_owned(), "cd".to_owned()]);
    }

    #[test]
    fn test_render_tabs_and_ctrl() {
        assert_eq!(render_lines("a\tb", 20), vec!["a       b".to_owned()]);
        assert_eq!(render_lines("\x03", 20), vec!["^C".to_owned()]);
        assert_eq!(cell_width("a\tb", 0, 20), 9);
        assert_eq!(cell_width("\x03", 0, 20), 2);
        assert_eq!(cell_width("\t", 4, 20), 4);
    }

    #[test]
    fn test_wide_wrap() {
        // A full-width character may not straddle the right margin
        let lines = render_lines("ab\u{4e2d}", 3);
        assert_eq!(lines, vec!["ab ".to_owned(), "\u{4e2d}".to_owned()]);
        assert_eq!(line_width("\u{4e2d}"), 2);
    }

    #[test]
    fn test_invisible_spans() {
        let s = "\x01\x1b[1m\x02ok";
        assert_eq!(line_width(s), 2);
        assert_eq!(cell_width(s, 0, 20), 2);
    }

    #[test]
    fn test_diff_line() {
        assert_eq!(diff_line("abc", "abc"),
            vec![(DiffOp::Equal, "abc".to_owned())]);

        assert_eq!(diff_line("abd", "abcd"), vec![
            (DiffOp::Equal, "ab".to_owned()),
            (DiffOp::Insert, "c".to_owned()),
            (DiffOp::Equal, "d".to_owned()),
        ]);

        assert_eq!(diff_line("abcd", "abd"), vec![
            (DiffOp::Equal, "ab".to_owned()),
            (DiffOp::Delete, "c".to_owned()),
            (DiffOp::Equal, "d".to_owned()),
        ]);

        assert_eq!(diff_line("axd", "ayd"), vec![
            (DiffOp::Equal, "a".to_owned()),
            (DiffOp::Delete, "x".to_owned()),
            (DiffOp::Insert, "y".to_owned()),
            (DiffOp::Equal, "d".to_owned()),
        ]);

        assert_eq!(diff_line("", "ab"),
            vec![(DiffOp::Insert, "ab".to_owned())]);
    }
}
