extern crate linewise;

#[macro_use] extern crate assert_matches;

use std::io;
use std::sync::Arc;

use linewise::{Command, Completer, Completion, Interface, Prompter, ReadResult};
use linewise::memory::MemoryTerminal;
use linewise::terminal::{Size, Terminal};

const UP_ARROW: &str = "\x1b[A";
const DOWN_ARROW: &str = "\x1b[B";
const RIGHT_ARROW: &str = "\x1b[C";
const LEFT_ARROW: &str = "\x1b[D";
const HOME: &str = "\x1b[H";
const INSERT: &str = "\x1b[2~";
const DELETE: &str = "\x1b[3~";

fn test(input: &str) -> (MemoryTerminal, Interface<MemoryTerminal>) {
    let term = MemoryTerminal::with_size(Size{columns: 40, lines: 6});

    term.push_input(input);

    let interface = Interface::with_term("test", term.clone()).unwrap();

    interface.set_prompt("$ ").unwrap();

    (term, interface)
}

fn assert_lines(term: &MemoryTerminal, tests: &[&str]) {
    let mut lines = term.lines();
    let mut tests = tests.iter();

    while let Some(line) = lines.next() {
        let test = match tests.next() {
            Some(test) => test,
            None => ""
        };

        let end = match line.iter().rposition(|&ch| ch != ' ') {
            Some(pos) => pos + 1,
            None => 0
        };

        if line[..end].iter().cloned().ne(test.chars()) {
            let line = line[..end].iter().cloned().collect::<String>();
            panic!("terminal line doesn't match: line={:?}; test={:?}", line, test);
        }
    }
}

fn assert_read<T: Terminal>(r: &Interface<T>, line: &str) {
    assert_matches!(r.read_line(), Ok(ReadResult::Input(ref s)) if s == line);
}

#[test]
fn test_eof() {
    let (term, r) = test("\x04");

    assert_matches!(r.read_line(), Ok(ReadResult::Eof));

    term.push_input("foo\x04\n");
    assert_read(&r, "foo");

    assert_lines(&term, &["$", "$ foo"]);
}

#[test]
fn test_echo_and_accept() {
    let (term, r) = test("hello\n");

    assert_read(&r, "hello");
    assert_eq!(r.history_len(), 1);
    assert_eq!(r.history().get(0), "hello");

    assert_lines(&term, &["$ hello"]);
}

#[test]
fn test_backspace() {
    let (term, r) = test("abc\x7f\n");

    assert_read(&r, "ab");
    assert_lines(&term, &["$ ab"]);
}

#[test]
fn test_quoted_insert() {
    let (term, r) = test("\x16\x03\n");

    assert_read(&r, "\x03");
    assert_lines(&term, &["$ ^C"]);
}

#[test]
fn test_interrupt() {
    let (term, r) = test("abc\x03");

    assert_matches!(r.read_line(), Ok(ReadResult::Interrupted(ref s)) if s == "abc");
    assert_lines(&term, &["$ abc^C"]);
}

#[test]
fn test_kill_and_yank() {
    let (_term, r) = test("one two\x15\x19\n");

    assert_read(&r, "one two");
}

#[test]
fn test_yank_pop() {
    let (_term, r) = test("x\x15y\x15\x19\x1by\n");

    assert_read(&r, "x");

    let (_term, r) = test("x\x15y\x15\x19\x1by\x1by\n");

    assert_read(&r, "y");
}

#[test]
fn test_consecutive_kills_append() {
    let (_term, r) = test("foo bar baz\x1b\x7f\x1b\x7f\n");

    assert_read(&r, "foo ");

    // Two adjacent backward word kills merge into one kill-ring slot
    let (_term, r) = test("foo bar baz\x1b\x7f\x1b\x7f\x19\n");

    assert_read(&r, "foo bar baz");
}

#[test]
fn test_unix_word_rubout() {
    let (_term, r) = test("alpha beta\x17\x17gamma\n");

    assert_read(&r, "gamma");

    let (_term, r) = test("alpha beta\x17\x19\n");

    assert_read(&r, "alpha beta");
}

#[test]
fn test_kill_word_forward() {
    let (_term, r) = test("one two\x01\x1bd\n");

    assert_read(&r, " two");
}

#[test]
fn test_arrows() {
    let (term, r) = test("abcde");

    term.push_input(LEFT_ARROW);
    term.push_input("x");
    term.push_input(HOME);
    term.push_input("y");
    term.push_input(RIGHT_ARROW);
    term.push_input("z\n");
    assert_read(&r, "yazbcdxe");

    assert_lines(&term, &["$ yazbcdxe"]);
}

#[test]
fn test_delete_key() {
    let (term, r) = test("sup");

    term.push_input(LEFT_ARROW);
    term.push_input(LEFT_ARROW);
    term.push_input(DELETE);
    term.push_input("\n");

    assert_read(&r, "sp");
    assert_lines(&term, &["$ sp"]);
}

#[test]
fn test_overwrite() {
    let (term, r) = test("foo");

    term.push_input(LEFT_ARROW);
    term.push_input(LEFT_ARROW);
    term.push_input(INSERT);
    term.push_input("xxx\n");

    assert_read(&r, "fxxx");
    assert_lines(&term, &["$ fxxx"]);
}

#[test]
fn test_transpose_chars() {
    let (term, r) = test("");

    term.push_input("abc");
    term.push_input(LEFT_ARROW);
    term.push_input("\x14\n");
    assert_read(&r, "acb");
}

#[test]
fn test_case_commands() {
    let (_term, r) = test("foo BAR\x01\x1bu\n");

    assert_read(&r, "FOO BAR");

    let (_term, r) = test("FOO bar\x01\x1bl\n");

    assert_read(&r, "foo bar");

    let (_term, r) = test("foo bar\x01\x1bc\n");

    assert_read(&r, "Foo bar");
}

#[test]
fn test_digit_argument() {
    let (term, r) = test("\x1b10.\n");

    assert_read(&r, "..........");
    assert_lines(&term, &["$ .........."]);
}

#[test]
fn test_character_search() {
    let (term, r) = test("lolwut");

    term.push_input(HOME);
    term.push_input("\x1dwX\n");

    assert_read(&r, "lolXwut");
    assert_lines(&term, &["$ lolXwut"]);
}

#[test]
fn test_history_recall() {
    let (term, r) = test("");

    r.add_history("alpha".to_owned());
    r.add_history("beta".to_owned());
    r.add_history("gamma".to_owned());

    term.push_input(UP_ARROW);
    term.push_input(UP_ARROW);
    term.push_input("\n");

    assert_read(&r, "beta");

    term.push_input("foo");
    term.push_input(UP_ARROW);
    term.push_input(DOWN_ARROW);
    term.push_input("\n");

    // Recalling history replaces the buffer; moving past the end leaves
    // it empty
    assert_read(&r, "");
}

#[test]
fn test_beginning_end_of_history() {
    let (term, r) = test("");

    r.set_variable("disable-history", "on");
    r.add_history("first".to_owned());
    r.add_history("last".to_owned());

    term.push_input("\x1b<\n");
    assert_read(&r, "first");

    term.push_input("\x1b>\n");
    assert_read(&r, "last");
}

#[test]
fn test_history_prefix_search() {
    let (term, r) = test("");

    r.set_variable("disable-history", "on");
    r.bind_sequence("\x01", Command::HistorySearchBackward);
    r.bind_sequence("\x02", Command::HistorySearchForward);

    r.add_history("foo".into());
    r.add_history("fab".into());
    r.add_history("fun".into());

    term.push_input("f\x01\n");
    assert_read(&r, "fun");

    term.push_input("f\x01\x01\n");
    assert_read(&r, "fab");

    term.push_input("f\x01\x01\x01\n");
    assert_read(&r, "foo");

    term.push_input("f\x01\x01\x02\n");
    assert_read(&r, "fun");
}

#[test]
fn test_incremental_search() {
    let (term, r) = test("");

    r.add_history("alpha".to_owned());
    r.add_history("beta".to_owned());
    r.add_history("gamma".to_owned());

    // A second reverse search with no earlier match beeps and keeps
    // the current match
    term.push_input("\x12b\x12\n");

    assert_read(&r, "beta");
    assert_eq!(term.bell_count(), 1);

    assert_lines(&term, &["$ beta"]);
}

#[test]
fn test_incremental_search_term_grows() {
    let (term, r) = test("");

    r.set_variable("disable-history", "on");
    r.add_history("cat".to_owned());
    r.add_history("car".to_owned());

    // Growing the term re-searches from the most recent entry
    term.push_input("\x12cat\n");
    assert_read(&r, "cat");

    // Deleting a search character re-searches with the shorter term
    term.push_input("\x12car\x7f\n");
    assert_read(&r, "car");
}

#[test]
fn test_incremental_search_abort() {
    let (term, r) = test("");

    r.add_history("alpha".to_owned());

    term.push_input("keep");
    term.push_input("\x12a\x07\n");

    assert_read(&r, "keep");
    assert_lines(&term, &["$ keep"]);
}

#[test]
fn test_event_expansion() {
    let (term, r) = test("");

    r.add_history("echo foo".to_owned());

    term.push_input("!!\n");
    assert_read(&r, "echo foo");

    assert_lines(&term, &["$ !!", "echo foo"]);
}

#[test]
fn test_event_expansion_words() {
    let (term, r) = test("");

    r.add_history("ls /tmp".to_owned());

    term.push_input("cat !$\n");
    assert_read(&r, "cat /tmp");

    term.push_input("^tmp^var^\n");
    assert_read(&r, "ls /var");
}

#[test]
fn test_event_not_found() {
    let (term, r) = test("!zz\n");

    assert_read(&r, "");
    assert_eq!(term.bell_count(), 1);
    assert_eq!(r.history_len(), 0);
}

#[test]
fn test_event_expansion_disabled() {
    let (term, r) = test("");

    r.add_history("echo foo".to_owned());
    r.set_variable("disable-event-expansion", "on");

    term.push_input("!!\n");
    assert_read(&r, "!!");
}

#[test]
fn test_disable_history() {
    let (term, r) = test("");

    r.set_variable("disable-history", "on");

    term.push_input("secret\n");
    assert_read(&r, "secret");
    assert_eq!(r.history_len(), 0);
}

#[test]
fn test_masked_input() {
    let (term, r) = test("secret\n");

    assert_matches!(r.read_line_with(Some('*'), None),
        Ok(ReadResult::Input(ref s)) if s == "secret");

    // Masked lines are never added to history
    assert_eq!(r.history_len(), 0);
    assert_lines(&term, &["$ ******"]);
}

#[test]
fn test_hidden_input() {
    let (term, r) = test("secret\n");

    assert_matches!(r.read_line_with(Some('\0'), None),
        Ok(ReadResult::Input(ref s)) if s == "secret");

    assert_lines(&term, &["$"]);
}

#[test]
fn test_initial_buffer() {
    let (term, r) = test("!\n");

    assert_matches!(r.read_line_with(None, Some("hello")),
        Ok(ReadResult::Input(ref s)) if s == "hello!");

    assert_lines(&term, &["$ hello!"]);
}

#[test]
fn test_macro_binding() {
    let (term, r) = test("");

    r.bind_macro("A", "foo");
    r.bind_macro("B", "barCquux");
    r.bind_macro("C", "baz");

    term.push_input("A\n");
    assert_read(&r, "foo");

    term.push_input("B\n");
    assert_read(&r, "barbazquux");

    assert_lines(&term, &["$ foo", "$ barbazquux"]);
}

#[test]
fn test_kbd_macro() {
    let (term, r) = test("\x18(abc\x18)\x18e\n");

    assert_read(&r, "abcabc");
    assert_lines(&term, &["$ abcabc"]);
}

#[test]
fn test_insert_comment() {
    let (term, r) = test("lol\x1b#");

    assert_read(&r, "#lol");
    assert_lines(&term, &["$ #lol"]);
}

fn fn_foo<Term: Terminal>(prompter: &mut Prompter<Term>, count: i32, ch: char)
        -> io::Result<()> {
    assert_eq!(count, 1);
    assert_eq!(ch, '\x06');
    assert!(!prompter.explicit_arg());

    prompter.insert_str("foo")
}

#[test]
fn test_function() {
    let (term, r) = test("");

    r.define_function("fn-foo", Arc::new(fn_foo));
    r.bind_sequence("\x18\x06", Command::from_str("fn-foo"));

    term.push_input("\x18\x06\n");
    assert_read(&r, "foo");

    assert_lines(&term, &["$ foo"]);
}

fn fn_quit<Term: Terminal>(prompter: &mut Prompter<Term>, _count: i32, _ch: char)
        -> io::Result<()> {
    prompter.set_buffer("quit")?;
    prompter.accept_input()
}

#[test]
fn test_triggered_action() {
    let (term, r) = test("q");

    r.set_triggered_action('q', Arc::new(fn_quit));

    assert_read(&r, "quit");
    assert_lines(&term, &["$ quit"]);
}

struct TestCompleter(Vec<&'static str>);

impl<Term: Terminal> Completer<Term> for TestCompleter {
    fn complete(&self, _word: &str, _prompter: &Prompter<Term>,
            _start: usize, _end: usize) -> Option<Vec<Completion>> {
        Some(self.0.clone().into_iter()
            .map(|s| Completion::simple(s.to_owned())).collect())
    }
}

#[test]
fn test_complete() {
    let (term, r) = test("hi foo\t\t");

    r.add_completer(Arc::new(TestCompleter(vec!["foobar", "foobaz"])));

    // The first tab inserts the longest common prefix; the second lists
    // the candidates below the input line
    term.push_input("\n");
    assert_read(&r, "hi fooba");
    assert_lines(&term, &["$ hi fooba"]);

    term.clear_all();
    term.push_input("hi foo\x1b*\n");

    assert_read(&r, "hi foobar foobaz ");
    assert_lines(&term, &["$ hi foobar foobaz"]);
}

#[test]
fn test_complete_single() {
    let (term, r) = test("hi foo\t\n");

    r.add_completer(Arc::new(TestCompleter(vec!["food"])));

    assert_read(&r, "hi food ");
    assert_lines(&term, &["$ hi food"]);
}

#[test]
fn test_completion_listing_shows() {
    let (term, r) = test("");

    r.add_completer(Arc::new(TestCompleter(vec!["foobar", "foobaz"])));

    term.push_input("hi foo\x1b?");

    // Drive a single step so the listing is visible before accepting
    let res = r.read_line_step(None).unwrap();
    assert!(res.is_none());

    assert_lines(&term, &["$ hi foo", "foobar  foobaz"]);

    term.push_input("\n");
    assert_read(&r, "hi foo");
    assert_lines(&term, &["$ hi foo"]);
}

#[test]
fn test_disable_completion() {
    let (term, r) = test("");

    r.add_completer(Arc::new(TestCompleter(vec!["foobar", "foobaz"])));
    r.set_variable("disable-completion", "on");

    term.push_input("foo\t\n");
    assert_read(&r, "foo\t");
}

#[test]
fn test_long_line_wraps() {
    let (term, r) = test("");

    term.resize(Size{columns: 10, lines: 5});
    term.push_input("abcdefghijkl\n");

    assert_read(&r, "abcdefghijkl");
    assert_lines(&term, &["$ abcdefgh", "ijkl"]);
}

#[test]
fn test_resize_mid_line() {
    let (term, r) = test("ab");

    term.resize(Size{columns: 20, lines: 6});
    term.push_input("c\n");

    assert_read(&r, "abc");
    assert_lines(&term, &["$ abc"]);
}

#[test]
fn test_bell_style() {
    // An unbound control key beeps
    let (term, r) = test("\x1a");

    r.set_variable("bell-style", "audible");
    term.push_input("ok\n");

    assert_read(&r, "ok");
    assert_eq!(term.bell_count(), 1);

    let (term, r) = test("\x1a");

    r.set_variable("bell-style", "none");
    term.push_input("ok\n");

    assert_read(&r, "ok");
    assert_eq!(term.bell_count(), 0);
}

#[test]
fn test_keymap_accessor() {
    let (_term, r) = test("\n");

    assert_eq!(r.keymap(), "emacs");
    assert!(r.set_keymap("vi-insert"));
    assert_eq!(r.keymap(), "vi-insert");
    assert!(!r.set_keymap("no-such-map"));

    r.set_keymap("emacs");
    assert_read(&r, "");
}
