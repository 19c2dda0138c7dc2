//! Implements history event designators
//!
//! A finished line may reference earlier history entries using the
//! designators recognized by GNU bash: `!!`, `!n`, `!-n`, `!?string?`,
//! `!prefix`, `!$`, `!#`, and the quick substitution `^old^new^`.
//! [`expand_events`] rewrites such a line before it is accepted.
//!
//! [`expand_events`]: fn.expand_events.html

use std::error::Error;
use std::fmt;

use crate::history::History;

/// Error produced when an event designator names no history entry
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EventNotFound {
    /// The designator that failed to resolve
    pub event: String,
}

impl fmt::Display for EventNotFound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: event not found", self.event)
    }
}

impl Error for EventNotFound {}

fn not_found<T>(event: String) -> Result<T, EventNotFound> {
    Err(EventNotFound{event})
}

/// Global index one past the most recent entry, independent of the
/// position of the recall cursor.
fn end_index(history: &History) -> usize {
    history.first_index() + history.len()
}

fn last_entry(history: &History) -> Option<&str> {
    if history.is_empty() {
        None
    } else {
        Some(history.get(end_index(history) - 1))
    }
}

/// Expands history event designators in a line.
///
/// Designators are rewritten left to right:
///
/// * `\!` yields a literal `!`; a leading `\^` yields a literal `^`.
/// * `!!` is replaced by the previous history entry.
/// * `!#` is replaced by the text expanded so far.
/// * `!?string?` is replaced by the most recent entry containing `string`.
/// * `!$` is replaced by the last whitespace-delimited word of the
///   previous entry.
/// * `!` followed by a space or tab is literal.
/// * `!n` and `!-n` select an entry by absolute index or offset from the
///   end.
/// * `!string` is replaced by the most recent entry starting with `string`.
/// * `^old^new^` at the start of the line repeats the previous entry with
///   the first occurrence of `old` replaced by `new`.
///
/// Returns the expanded line, which equals the input when no designator
/// applies.
pub fn expand_events(line: &str, history: &History) -> Result<String, EventNotFound> {
    let chars = line.chars().collect::<Vec<char>>();
    let mut out = String::with_capacity(line.len());
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        match ch {
            '\\' => {
                // `\!` anywhere and `\^` at the start of the line escape
                // expansion; the backslash is dropped
                match chars.get(i + 1) {
                    Some(&'!') => {
                        out.push('!');
                        i += 1;
                    }
                    Some(&'^') if i == 0 => {
                        out.push('^');
                        i += 1;
                    }
                    _ => out.push('\\')
                }
            }
            '!' if i + 1 < chars.len() => {
                i += 1;
                i = expand_designator(&chars, i, &mut out, history)?;
                continue;
            }
            '^' if i == 0 => {
                if let Some(end) = expand_substitution(&chars, &mut out, history)? {
                    i = end;
                    continue;
                }
                out.push('^');
            }
            ch => out.push(ch)
        }

        i += 1;
    }

    Ok(out)
}

/// Expands the designator beginning at `chars[i]`, after the `!`.
///
/// Returns the index of the first character past the designator.
fn expand_designator(chars: &[char], mut i: usize, out: &mut String,
        history: &History) -> Result<usize, EventNotFound> {
    match chars[i] {
        '!' => {
            match last_entry(history) {
                Some(ent) => out.push_str(ent),
                None => return not_found("!!".to_owned())
            }
            Ok(i + 1)
        }
        '#' => {
            let sofar = out.clone();
            out.push_str(&sofar);
            Ok(i + 1)
        }
        '?' => {
            let end = chars[i + 1..].iter().position(|&ch| ch == '?')
                .map_or(chars.len(), |p| i + 1 + p);
            let term = chars[i + 1..end].iter().collect::<String>();

            match history.search_backward(&term, end_index(history), false) {
                Some(idx) => {
                    out.push_str(history.get(idx));
                    Ok(end + 1)
                }
                None => not_found(format!("!?{}", term))
            }
        }
        '$' => {
            let previous = match last_entry(history) {
                Some(ent) => ent.trim(),
                None => return not_found("!$".to_owned())
            };

            let word = previous.rsplit(char::is_whitespace).next().unwrap_or(previous);
            out.push_str(word);
            Ok(i + 1)
        }
        ' ' | '\t' => {
            out.push('!');
            out.push(chars[i]);
            Ok(i + 1)
        }
        '-' | '0'..='9' => {
            let neg = chars[i] == '-';

            if neg {
                i += 1;
            }

            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }

            let digits = chars[start..i].iter().collect::<String>();
            let event = || format!("{}{}", if neg { "!-" } else { "!" }, digits);

            let idx = match digits.parse::<usize>() {
                Ok(n) => n,
                Err(_) => return not_found(event())
            };

            let first = history.first_index();
            let end = end_index(history);

            if neg && idx > 0 && idx <= history.len() {
                out.push_str(history.get(end - idx));
            } else if !neg && idx > first && idx <= end {
                out.push_str(history.get(idx - 1));
            } else {
                return not_found(event());
            }

            Ok(i)
        }
        _ => {
            let prefix = chars[i..].iter().collect::<String>();

            match history.search_backward(&prefix, end_index(history), true) {
                Some(idx) => {
                    out.push_str(history.get(idx));
                    Ok(chars.len())
                }
                None => not_found(format!("!{}", prefix))
            }
        }
    }
}

/// Expands a leading `^old^new^` substitution.
///
/// Returns the index past the substitution, or `None` when the line does
/// not form one.
fn expand_substitution(chars: &[char], out: &mut String, history: &History)
        -> Result<Option<usize>, EventNotFound> {
    let i1 = match chars[1..].iter().position(|&ch| ch == '^') {
        Some(p) => 1 + p,
        None => return Ok(None)
    };
    let i2 = chars[i1 + 1..].iter().position(|&ch| ch == '^')
        .map_or(chars.len(), |p| i1 + 1 + p);

    if i1 == 1 {
        // Empty `old` pattern
        return Ok(None);
    }

    let previous = match last_entry(history) {
        Some(ent) => ent,
        None => return not_found("^".to_owned())
    };

    let old = chars[1..i1].iter().collect::<String>();
    let new = chars[i1 + 1..i2].iter().collect::<String>();

    out.push_str(&previous.replacen(&old, &new, 1));

    Ok(Some((i2 + 1).min(chars.len())))
}

#[cfg(test)]
mod test {
    use super::{expand_events, EventNotFound};
    use crate::history::History;

    fn sample() -> History {
        let mut h = History::new();
        h.add("echo foo".to_owned());
        h.add("ls /tmp".to_owned());
        h
    }

    fn expand(line: &str) -> Result<String, EventNotFound> {
        expand_events(line, &sample())
    }

    #[test]
    fn test_plain() {
        assert_eq!(expand("echo hi").unwrap(), "echo hi");
        assert_eq!(expand("").unwrap(), "");
        assert_eq!(expand("trailing !").unwrap(), "trailing !");
        assert_eq!(expand("! x").unwrap(), "! x");
    }

    #[test]
    fn test_previous() {
        assert_eq!(expand("!!").unwrap(), "ls /tmp");
        assert_eq!(expand("sudo !!").unwrap(), "sudo ls /tmp");
    }

    #[test]
    fn test_last_word() {
        assert_eq!(expand("cat !$").unwrap(), "cat /tmp");
    }

    #[test]
    fn test_numeric() {
        assert_eq!(expand("!1").unwrap(), "echo foo");
        assert_eq!(expand("!2").unwrap(), "ls /tmp");
        assert_eq!(expand("!-1").unwrap(), "ls /tmp");
        assert_eq!(expand("!-2").unwrap(), "echo foo");

        assert_eq!(expand("!3").unwrap_err(),
            EventNotFound{event: "!3".to_owned()});
        assert_eq!(expand("!-3").unwrap_err(),
            EventNotFound{event: "!-3".to_owned()});
    }

    #[test]
    fn test_prefix_and_substring() {
        assert_eq!(expand("!ec").unwrap(), "echo foo");
        assert_eq!(expand("!?foo?").unwrap(), "echo foo");
        assert_eq!(expand("!?tm? -l").unwrap(), "ls /tmp -l");

        assert_eq!(expand("!zz").unwrap_err(),
            EventNotFound{event: "!zz".to_owned()});
        assert_eq!(expand("!?zz?").unwrap_err(),
            EventNotFound{event: "!?zz".to_owned()});
    }

    #[test]
    fn test_so_far() {
        assert_eq!(expand("ab!#").unwrap(), "abab");
    }

    #[test]
    fn test_substitution() {
        assert_eq!(expand("^tmp^var^").unwrap(), "ls /var");
        assert_eq!(expand("^ls^stat^").unwrap(), "stat /tmp");
        // Only the first occurrence is replaced
        let mut h = History::new();
        h.add("aa aa".to_owned());
        assert_eq!(expand_events("^aa^bb^", &h).unwrap(), "bb aa");
    }

    #[test]
    fn test_escapes() {
        assert_eq!(expand("\\!!").unwrap(), "!!");
        assert_eq!(expand("\\^a^b^").unwrap(), "^a^b^");
        assert_eq!(expand("a\\!b").unwrap(), "a!b");
        assert_eq!(expand("a\\b").unwrap(), "a\\b");
    }

    #[test]
    fn test_empty_history() {
        let h = History::new();

        assert_eq!(expand_events("!!", &h).unwrap_err(),
            EventNotFound{event: "!!".to_owned()});
        assert_eq!(expand_events("!$", &h).unwrap_err(),
            EventNotFound{event: "!$".to_owned()});
    }
}
