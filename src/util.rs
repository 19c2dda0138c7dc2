//! Provides miscellaneous utilities

use std::io;
use std::str::{from_utf8, from_utf8_unchecked};

/// Returns the longest common prefix of a set of strings.
///
/// If no common prefix exists, `None` is returned.
pub fn longest_common_prefix<'a, I, S>(iter: I) -> Option<&'a str> where
        I: IntoIterator<Item=&'a S>,
        S: 'a + ?Sized + AsRef<str>,
        {
    let mut iter = iter.into_iter();

    let mut pfx = iter.next()?.as_ref();

    for s in iter {
        let s = s.as_ref();

        let n = pfx.chars().zip(s.chars())
            .take_while(|&(a, b)| a == b)
            .map(|(ch, _)| ch.len_utf8()).sum();

        if n == 0 {
            return None;
        } else {
            pfx = &pfx[..n];
        }
    }

    Some(pfx)
}

/// Returns a string consisting of a `char`, repeated `n` times.
pub fn repeat_char(ch: char, n: usize) -> String {
    let mut buf = [0; 4];
    let s = ch.encode_utf8(&mut buf);

    s.repeat(n)
}

/// Returns the first character in the buffer, if it contains any valid characters.
pub fn first_char(buf: &[u8]) -> io::Result<Option<char>> {
    match from_utf8(buf) {
        Ok(s) => Ok(s.chars().next()),
        Err(e) => {
            if e.error_len().is_some() {
                return Err(io::Error::new(io::ErrorKind::InvalidData,
                    "invalid utf-8 input received"));
            }

            let valid = e.valid_up_to();

            let s = unsafe { from_utf8_unchecked(&buf[..valid]) };
            Ok(s.chars().next())
        }
    }
}

/// Returns the position `n` characters before `cur`, ignoring combining marks.
pub fn backward_char(n: usize, s: &str, cur: usize) -> usize {
    let mut chars = s[..cur].char_indices()
        .filter(|&(_, ch)| !is_combining_mark(ch));
    let mut res = cur;

    for _ in 0..n {
        match chars.next_back() {
            Some((idx, _)) => res = idx,
            None => return 0
        }
    }

    res
}

/// Returns the position `n` characters after `cur`, ignoring combining marks.
pub fn forward_char(n: usize, s: &str, cur: usize) -> usize {
    let mut chars = s[cur..].char_indices()
        .filter(|&(_, ch)| !is_combining_mark(ch));

    for _ in 0..n {
        match chars.next() {
            Some(_) => (),
            None => return s.len()
        }
    }

    match chars.next() {
        Some((idx, _)) => cur + idx,
        None => s.len()
    }
}

/// Searches backward for the `n`th occurrence of `ch` before the cursor.
pub fn backward_search_char(n: usize, buf: &str, mut cur: usize, ch: char) -> Option<usize> {
    let mut pos = None;

    for _ in 0..n {
        match buf[..cur].rfind(ch) {
            Some(p) => {
                cur = p;
                pos = Some(cur);
            }
            None => break
        }
    }

    pos
}

/// Searches forward for the `n`th occurrence of `ch` after the cursor.
pub fn forward_search_char(n: usize, buf: &str, mut cur: usize, ch: char) -> Option<usize> {
    let mut pos = None;

    for _ in 0..n {
        // Skip past the character under the cursor
        let off = match buf[cur..].chars().next() {
            Some(ch) => ch.len_utf8(),
            None => break
        };

        match buf[cur + off..].find(ch) {
            Some(p) => {
                cur += off + p;
                pos = Some(cur);
            }
            None => break
        }
    }

    pos
}

/// Returns whether the character separates words.
///
/// Anything that is not alphanumeric is considered a word break.
pub fn is_word_delim(ch: char) -> bool {
    !ch.is_alphanumeric()
}

/// Returns the start of the word before `cur`.
///
/// Delimiter characters immediately before the position are skipped first.
pub fn prev_word_pos<F>(s: &str, cur: usize, delim: F) -> usize
        where F: Fn(char) -> bool {
    let mut pos = cur;

    while let Some(ch) = s[..pos].chars().next_back() {
        if delim(ch) {
            pos -= ch.len_utf8();
        } else {
            break;
        }
    }
    while let Some(ch) = s[..pos].chars().next_back() {
        if !delim(ch) {
            pos -= ch.len_utf8();
        } else {
            break;
        }
    }

    pos
}

/// Returns the end of the word after `cur`.
///
/// Delimiter characters immediately after the position are skipped first.
pub fn next_word_pos<F>(s: &str, cur: usize, delim: F) -> usize
        where F: Fn(char) -> bool {
    let mut pos = cur;

    while let Some(ch) = s[pos..].chars().next() {
        if delim(ch) {
            pos += ch.len_utf8();
        } else {
            break;
        }
    }
    while let Some(ch) = s[pos..].chars().next() {
        if !delim(ch) {
            pos += ch.len_utf8();
        } else {
            break;
        }
    }

    pos
}

/// Returns the end of the run of word characters starting at `cur`.
pub fn word_run_end(s: &str, cur: usize) -> usize {
    let mut pos = cur;

    while let Some(ch) = s[pos..].chars().next() {
        if is_word_delim(ch) {
            break;
        }
        pos += ch.len_utf8();
    }

    pos
}

/// Returns the position of the first non-whitespace character.
pub fn first_print_pos(s: &str) -> usize {
    let mut pos = 0;

    while let Some(ch) = s[pos..].chars().next() {
        if !ch.is_whitespace() {
            break;
        }
        pos += ch.len_utf8();
    }

    pos
}

/// Returns the opening bracket character matching a closing one.
pub fn get_open_paren(ch: char) -> Option<char> {
    match ch {
        ')' => Some('('),
        ']' => Some('['),
        '}' => Some('{'),
        _ => None
    }
}

/// Searches backward through `s` for the opening bracket matching `close`,
/// skipping over spans delimited by any of the `quotes` characters.
pub fn find_matching_paren(s: &str, quotes: &str, open: char, close: char) -> Option<usize> {
    let mut chars = s.char_indices().rev();
    let mut level = 0;
    let mut string_delim = None;

    while let Some((ind, ch)) = chars.next() {
        if string_delim == Some(ch) {
            string_delim = None;
        } else if quotes.contains(ch) {
            string_delim = Some(ch);
        } else if string_delim.is_none() && ch == close {
            level += 1;
        } else if string_delim.is_none() && ch == open {
            level -= 1;

            if level == 0 {
                return Some(ind);
            }
        }
    }

    None
}

/// Classifies a bracket character; the value is negated for closing forms.
fn bracket_type(ch: char) -> i32 {
    match ch {
        '[' => 1,
        ']' => -1,
        '{' => 2,
        '}' => -2,
        '(' => 3,
        ')' => -3,
        _ => 0
    }
}

/// Finds the bracket matching the one at `cursor`, scanning in the
/// direction appropriate for its form.
///
/// Positions are character indices into `chars`.
pub fn find_bracket_match(chars: &[char], cursor: usize) -> Option<usize> {
    if cursor >= chars.len() {
        return None;
    }

    let ty = bracket_type(chars[cursor]);

    if ty == 0 {
        return None;
    }

    let step: isize = if ty < 0 { -1 } else { 1 };
    let mut level = 1;
    let mut pos = cursor as isize;

    while level > 0 {
        pos += step;

        if pos < 0 || pos as usize >= chars.len() {
            return None;
        }

        let cur = bracket_type(chars[pos as usize]);

        if cur == ty {
            level += 1;
        } else if cur == -ty {
            level -= 1;
        }
    }

    Some(pos as usize)
}

/// Returns whether the character is a zero-width combining mark.
pub fn is_combining_mark(ch: char) -> bool {
    use mortal::util::is_combining_mark;

    is_combining_mark(ch)
}

/// Returns whether the character occupies two terminal cells.
pub fn is_wide(ch: char) -> bool {
    use mortal::util::char_width;

    char_width(ch) == Some(2)
}

#[cfg(test)]
mod test {
    use super::{
        find_bracket_match, first_print_pos, is_word_delim,
        longest_common_prefix, next_word_pos, prev_word_pos, word_run_end,
    };

    #[test]
    fn test_longest_common_prefix() {
        let empty: &[&str] = &[];

        assert_eq!(longest_common_prefix(empty.iter()),
            None);
        assert_eq!(longest_common_prefix(["foo", "bar"].iter()),
            None);
        assert_eq!(longest_common_prefix(["foo"].iter()),
            Some("foo"));
        assert_eq!(longest_common_prefix(["foo", "foobar"].iter()),
            Some("foo"));
        assert_eq!(longest_common_prefix(["alpha", "alpaca", "alto"].iter()),
            Some("al"));

        assert_eq!(longest_common_prefix(["äöüx", "äöüy"].iter()),
            Some("äöü"));
    }

    #[test]
    fn test_word_pos() {
        let s = "foo bar  baz";

        assert_eq!(prev_word_pos(s, 12, is_word_delim), 9);
        assert_eq!(prev_word_pos(s, 9, is_word_delim), 4);
        assert_eq!(prev_word_pos(s, 5, is_word_delim), 4);
        assert_eq!(prev_word_pos(s, 0, is_word_delim), 0);

        assert_eq!(next_word_pos(s, 0, is_word_delim), 3);
        assert_eq!(next_word_pos(s, 3, is_word_delim), 7);
        assert_eq!(next_word_pos(s, 7, is_word_delim), 12);

        assert_eq!(word_run_end(s, 4), 7);
        assert_eq!(word_run_end(s, 3), 3);
    }

    #[test]
    fn test_first_print() {
        assert_eq!(first_print_pos("  three"), 2);
        assert_eq!(first_print_pos("three"), 0);
        assert_eq!(first_print_pos("   "), 3);
    }

    #[test]
    fn test_bracket_match() {
        let chars = "a(b[c]d)e".chars().collect::<Vec<_>>();

        assert_eq!(find_bracket_match(&chars, 1), Some(7));
        assert_eq!(find_bracket_match(&chars, 7), Some(1));
        assert_eq!(find_bracket_match(&chars, 3), Some(5));
        assert_eq!(find_bracket_match(&chars, 0), None);
        assert_eq!(find_bracket_match(&chars, 9), None);

        let unbalanced = "(()".chars().collect::<Vec<_>>();
        assert_eq!(find_bracket_match(&unbalanced, 0), None);
    }
}
