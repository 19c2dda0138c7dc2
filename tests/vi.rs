extern crate linewise;

#[macro_use] extern crate assert_matches;

use std::thread::sleep;
use std::time::Duration;

use linewise::{Interface, ReadResult};
use linewise::memory::MemoryTerminal;
use linewise::terminal::{Size, Terminal};

fn test(input: &str) -> (MemoryTerminal, Interface<MemoryTerminal>) {
    let term = MemoryTerminal::with_size(Size{columns: 40, lines: 6});

    term.push_input(input);

    let interface = Interface::with_term("test", term.clone()).unwrap();

    interface.set_prompt("$ ").unwrap();
    interface.set_keymap("vi-insert");

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

// A lone ESC followed immediately by another key resolves through the
// pending-sequence backoff, entering movement mode and replaying the key.

#[test]
fn test_movement_mode() {
    let (term, r) = test("abc\x1bx\n");

    assert_read(&r, "ab");
    assert_lines(&term, &["$ ab"]);

    assert_eq!(r.keymap(), "vi-insert");
}

#[test]
fn test_insert_modes() {
    // "a" appends after the cursor
    let (_term, r) = test("xz\x1b0axy\x1b\r");
    assert_read(&r, "xxyz");

    // "I" inserts at the beginning of the line
    let (_term, r) = test("world\x1bIhello \x1b\r");
    assert_read(&r, "hello world");

    // "A" appends at the end of the line
    let (_term, r) = test("hello\x1b0A world\x1b\r");
    assert_read(&r, "hello world");
}

#[test]
fn test_delete_and_rubout() {
    let (_term, r) = test("abcd\x1b0xx\n");
    assert_read(&r, "cd");

    // "X" deletes before the cursor
    let (_term, r) = test("abcd\x1bX\n");
    assert_read(&r, "abd");

    // A repeat count applies to "x"
    let (_term, r) = test("abcdef\x1b03x\n");
    assert_read(&r, "def");
}

#[test]
fn test_delete_word() {
    let (_term, r) = test("one two\x1b0dw\n");

    assert_read(&r, "two");
}

#[test]
fn test_change_word() {
    // With the buffer "hello world" and the cursor at the start, "cw"
    // changes only the word, leaving the separator in place
    let (term, r) = test("hello world\x1b0cwHI\x1b\r");

    assert_read(&r, "HI world");
    assert_lines(&term, &["$ HI world"]);
}

#[test]
fn test_whole_line_operators() {
    // "dd" deletes the whole line, placing it in the kill ring
    let (_term, r) = test("hello\x1bddi\x19\n");
    assert_read(&r, "hello");

    // "cc" changes the whole line
    let (_term, r) = test("old text\x1bccnew\x1b\r");
    assert_read(&r, "new");

    // "yy" yanks the whole line; "p" puts it after the cursor
    let (_term, r) = test("abc\x1byyp\n");
    assert_read(&r, "abcabc");

    // "S" kills the line and enters insert mode
    let (_term, r) = test("junk\x1bSkeep\n");
    assert_read(&r, "keep");
}

#[test]
fn test_delete_change_to_eol() {
    let (_term, r) = test("hello\x1b02lD\n");
    assert_read(&r, "he");

    let (_term, r) = test("hello\x1b02lCy!\x1b\r");
    assert_read(&r, "hey!");
}

#[test]
fn test_change_char() {
    let (_term, r) = test("abc\x1brx\n");

    assert_read(&r, "abx");

    // ESC aborts a pending change-char
    let (_term, r) = test("abc\x1br\x1b\r");
    assert_read(&r, "abc");
}

#[test]
fn test_change_case() {
    let (_term, r) = test("abc\x1b0~~\n");

    assert_read(&r, "ABc");
}

#[test]
fn test_word_motions() {
    // "w" then "x" deletes the first character of the second word
    let (_term, r) = test("one two\x1b0wx\n");
    assert_read(&r, "one wo");

    // "e" moves to the end of the word
    let (_term, r) = test("one two\x1b0ex\n");
    assert_read(&r, "on two");

    // "b" moves back a word
    let (_term, r) = test("one two\x1bbx\n");
    assert_read(&r, "one wo");
}

#[test]
fn test_first_print() {
    let (_term, r) = test("  abc\x1b^x\n");

    assert_read(&r, "  bc");
}

#[test]
fn test_char_search() {
    let (_term, r) = test("banana\x1b0fn;x\n");

    assert_read(&r, "banaa");

    // "," reverses the previous search
    let (_term, r) = test("banana\x1b0fn;,x\n");
    assert_read(&r, "baana");

    // "t" stops short of the target; with a pending "d" the landing
    // character is included
    let (_term, r) = test("abc)def\x1b0dt)\n");
    assert_read(&r, ")def");
}

#[test]
fn test_bracket_match() {
    let (_term, r) = test("(ab)\x1b0%x\n");

    assert_read(&r, "(ab");

    // "d%" deletes through the matching bracket
    let (_term, r) = test("(ab)c\x1b0d%\n");
    assert_read(&r, "c");
}

#[test]
fn test_repeat_count_arguments() {
    // "3l" moves three characters right from the start
    let (_term, r) = test("abcdef\x1b03lx\n");
    assert_read(&r, "abcef");

    // "d2w" deletes two words
    let (_term, r) = test("one two three\x1b0d2w\n");
    assert_read(&r, "three");

    // "2dw" behaves identically
    let (_term, r) = test("one two three\x1b02dw\n");
    assert_read(&r, "three");
}

#[test]
fn test_vi_history() {
    let (term, r) = test("");

    r.set_variable("disable-history", "on");
    r.add_history("older".to_owned());
    r.add_history("newer".to_owned());

    term.push_input("\x1bk\r");
    assert_read(&r, "newer");

    term.push_input("\x1bkk\r");
    assert_read(&r, "older");

    term.push_input("\x1bkkj\r");
    assert_read(&r, "newer");
}

#[test]
fn test_vi_eof() {
    let (_term, r) = test("\x1b\x04");

    assert_matches!(r.read_line(), Ok(ReadResult::Eof));

    // Ctrl-D on a non-empty line accepts it
    let (_term, r) = test("data\x04");
    assert_read(&r, "data");
}

#[test]
fn test_vi_put_register() {
    // "yw" yanks into the vi register without modifying the buffer;
    // "p" pastes after the cursor
    let (_term, r) = test("one two\x1b0yw$p\n");

    assert_read(&r, "one twoone ");
}

#[test]
fn test_vi_search() {
    let (term, r) = test("");

    r.set_variable("disable-history", "on");
    r.add_history("alpha".to_owned());
    r.add_history("beta".to_owned());

    // "/" searches oldest-first; editing resumes on the shown entry
    term.push_input("\x1b/al\rx\r");
    assert_read(&r, "lpha");

    // "?" searches newest-first
    term.push_input("\x1b?a\rx\r");
    assert_read(&r, "eta");

    // ESC aborts the search, restoring the original line
    term.push_input("keep\x1b/zz\x1b\r");
    assert_read(&r, "keep");
}

#[test]
fn test_vi_insert_comment() {
    let (term, r) = test("lol\x1b#");

    assert_read(&r, "#lol");
    assert_lines(&term, &["$ #lol"]);
}

#[test]
fn test_escape_timeout() {
    let (term, r) = test("");

    r.set_variable("keyseq-timeout", "10");
    term.push_input("abc\x1b");

    // The lone ESC is ambiguous until the key sequence timeout passes
    assert_matches!(r.read_line_step(Some(Duration::from_millis(1))), Ok(None));

    sleep(Duration::from_millis(30));

    // The expired timeout resolves the ESC to vi movement mode
    assert_matches!(r.read_line_step(Some(Duration::from_millis(1))), Ok(None));

    term.push_input("x\n");
    assert_read(&r, "ab");
}

#[test]
fn test_escape_sequence_without_pause() {
    let (term, r) = test("");

    r.add_history("one".to_owned());

    // A console sequence arriving at once decodes as a single binding
    term.push_input("\x1b[A\n");
    assert_read(&r, "one");
}

#[test]
fn test_search_terminator_timeout() {
    let (term, r) = test("");

    r.set_variable("keyseq-timeout", "10");
    r.set_keymap("emacs");
    r.add_history("alpha".to_owned());
    r.add_history("beta".to_owned());

    term.push_input("\x12b");

    assert_matches!(r.read_line_step(Some(Duration::from_millis(1))), Ok(None));

    // A lone ESC terminates the search once the timeout expires
    term.push_input("\x1b");
    assert_matches!(r.read_line_step(Some(Duration::from_millis(1))), Ok(None));

    sleep(Duration::from_millis(30));

    assert_matches!(r.read_line_step(Some(Duration::from_millis(1))), Ok(None));

    // The search is committed; the cursor sits on the match start
    term.push_input("s\n");
    assert_read(&r, "sbeta");
}

#[test]
fn test_insertion_mode_command() {
    let (term, r) = test("");

    // "i" returns from movement mode to insert mode
    r.set_keymap("vi-move");
    term.push_input("ihello\n");

    assert_read(&r, "hello");
    let _ = term;
}
