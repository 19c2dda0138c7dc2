//! Defines the set of line editing commands

use std::borrow::Cow::{self, Borrowed, Owned};
use std::fmt;

macro_rules! define_commands {
    ( $( #[$meta:meta] $name:ident => $str:expr , )+ ) => {
        /// Represents a command to modify editor state
        #[derive(Clone, Debug, Eq, PartialEq)]
        pub enum Command {
            $( #[$meta] $name , )+
            /// Custom application-defined command
            Custom(Cow<'static, str>),
        }

        /// List of all command names
        pub static COMMANDS: &[&str] = &[ $( $str ),+ ];

        impl fmt::Display for Command {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                match *self {
                    $( Command::$name => f.write_str($str) , )+
                    Command::Custom(ref s) => f.write_str(s),
                }
            }
        }

        impl Command {
            /// Constructs a command from a `'static str` reference.
            ///
            /// If the string does not refer to a built-in command, a value
            /// of `Command::Custom(Borrowed(name))` will be returned.
            pub fn from_str(name: &'static str) -> Command {
                Command::opt_from_str(name)
                    .unwrap_or_else(|| Command::Custom(Borrowed(name)))
            }

            /// Constructs a command from a non-`'static` string-like type.
            ///
            /// If the string does not refer to a built-in command, a value
            /// of `Command::Custom(Owned(name.into()))` will be returned.
            pub fn from_string<T>(name: T) -> Command
                    where T: AsRef<str> + Into<String> {
                Command::opt_from_str(name.as_ref())
                    .unwrap_or_else(|| Command::Custom(Owned(name.into())))
            }

            fn opt_from_str(s: &str) -> Option<Command> {
                match s {
                    $( $str => Some(Command::$name), )+
                    _ => None
                }
            }
        }
    }
}

define_commands!{
    /// Abort the current operation
    Abort => "abort",
    /// Accepts the current input line
    AcceptLine => "accept-line",
    /// Move the cursor backward one character
    BackwardChar => "backward-char",
    /// Delete one character before the cursor
    BackwardDeleteChar => "backward-delete-char",
    /// Kill a word before the cursor
    BackwardKillWord => "backward-kill-word",
    /// Move the cursor backward one word
    BackwardWord => "backward-word",
    /// Move to the first line of history
    BeginningOfHistory => "beginning-of-history",
    /// Move the cursor to the beginning of the line
    BeginningOfLine => "beginning-of-line",
    /// Replay the most recently recorded keyboard macro
    CallLastKbdMacro => "call-last-kbd-macro",
    /// Capitalize the word at the cursor
    CapitalizeWord => "capitalize-word",
    /// Search for a given character
    CharacterSearch => "character-search",
    /// Search backward for a given character
    CharacterSearchBackward => "character-search-backward",
    /// Clear the screen
    ClearScreen => "clear-screen",
    /// Perform completion
    Complete => "complete",
    /// Delete one character after the cursor
    DeleteChar => "delete-char",
    /// Begin numeric argument input
    DigitArgument => "digit-argument",
    /// Re-dispatch on the lowercase form of the last key
    DoLowercaseVersion => "do-lowercase-version",
    /// Lowercase the word at the cursor
    DowncaseWord => "downcase-word",
    /// Switch to the emacs key map
    EmacsEditingMode => "emacs-editing-mode",
    /// Stop recording a keyboard macro
    EndKbdMacro => "end-kbd-macro",
    /// Move to the last line of history
    EndOfHistory => "end-of-history",
    /// Move the cursor to the end of the line
    EndOfLine => "end-of-line",
    /// Signal end-of-file on an empty line; delete a character otherwise
    ExitOrDeleteChar => "exit-or-delete-char",
    /// Move the cursor forward one character
    ForwardChar => "forward-char",
    /// Incremental search forward in history
    ForwardSearchHistory => "forward-search-history",
    /// Move the cursor forward one word
    ForwardWord => "forward-word",
    /// Non-incremental backward history search using input up to the cursor
    HistorySearchBackward => "history-search-backward",
    /// Non-incremental forward history search using input up to the cursor
    HistorySearchForward => "history-search-forward",
    /// Insert a closing curly brace, briefly showing its match
    InsertCloseCurly => "insert-close-curly",
    /// Insert a closing parenthesis, briefly showing its match
    InsertCloseParen => "insert-close-paren",
    /// Insert a closing square bracket, briefly showing its match
    InsertCloseSquare => "insert-close-square",
    /// Insert a comment and accept input
    InsertComment => "insert-comment",
    /// Insert all completions into the input buffer
    InsertCompletions => "insert-completions",
    /// Interrupt the current input line
    Interrupt => "interrupt",
    /// Kill all characters after the cursor
    KillLine => "kill-line",
    /// Kill the entire line
    KillWholeLine => "kill-whole-line",
    /// Kill a word after the cursor
    KillWord => "kill-word",
    /// Select next line in history
    NextHistory => "next-history",
    /// Toggles insert/overwrite mode
    OverwriteMode => "overwrite-mode",
    /// Insert the contents of the clipboard
    PasteFromClipboard => "paste-from-clipboard",
    /// Show possible completions
    PossibleCompletions => "possible-completions",
    /// Select previous line in history
    PreviousHistory => "previous-history",
    /// Insert literal character
    QuotedInsert => "quoted-insert",
    /// Re-evaluate the initialization file
    ReReadInitFile => "re-read-init-file",
    /// Incremental reverse search in history
    ReverseSearchHistory => "reverse-search-history",
    /// Insert character or sequence at the cursor
    SelfInsert => "self-insert",
    /// Begin recording a keyboard macro
    StartKbdMacro => "start-kbd-macro",
    /// Inserts a tab character
    TabInsert => "tab-insert",
    /// Drag the character before the cursor forward
    TransposeChars => "transpose-chars",
    /// Kill all characters before the cursor
    UnixLineDiscard => "unix-line-discard",
    /// Kill a word before the cursor, delimited by whitespace
    UnixWordRubout => "unix-word-rubout",
    /// Uppercase the word at the cursor
    UpcaseWord => "upcase-word",
    /// Move to the end of the line and enter vi insert mode
    ViAppendEol => "vi-append-eol",
    /// Advance the cursor and enter vi insert mode
    ViAppendMode => "vi-append-mode",
    /// Accumulate a digit of the vi repeat count
    ViArgDigit => "vi-arg-digit",
    /// Move to the start of the line, or accumulate a repeat digit
    ViBeginningOfLineOrArgDigit => "vi-beginning-of-line-or-arg-digit",
    /// Toggle the case of the character at the cursor
    ViChangeCase => "vi-change-case",
    /// Replace the character at the cursor
    ViChangeChar => "vi-change-char",
    /// vi change operator; doubled, changes the whole line
    ViChangeTo => "vi-change-to",
    /// Change from the cursor to the end of the line
    ViChangeToEol => "vi-change-to-eol",
    /// vi character search (`f`, `F`, `t`, `T`, `;`, `,`)
    ViCharSearch => "vi-char-search",
    /// Move the cursor to a given column
    ViColumn => "vi-column",
    /// Delete the character at the cursor
    ViDelete => "vi-delete",
    /// vi delete operator; doubled, deletes the whole line
    ViDeleteTo => "vi-delete-to",
    /// Delete from the cursor to the end of the line
    ViDeleteToEol => "vi-delete-to-eol",
    /// Switch to the vi insert key map
    ViEditingMode => "vi-editing-mode",
    /// Move to the end of the next word, vi style
    ViEndWord => "vi-end-word",
    /// Signal end-of-file on an empty line; accept it otherwise
    ViEofMaybe => "vi-eof-maybe",
    /// Move to the first non-blank character of the line
    ViFirstPrint => "vi-first-print",
    /// Move to a previously set mark
    ViGotoMark => "vi-goto-mark",
    /// Move to the start of the line and enter vi insert mode
    ViInsertBeg => "vi-insert-beg",
    /// Insert a comment and accept input, returning to vi insert mode
    ViInsertComment => "vi-insert-comment",
    /// Enter vi insert mode
    ViInsertionMode => "vi-insertion-mode",
    /// Kill the entire line and enter vi insert mode
    ViKillWholeLine => "vi-kill-whole-line",
    /// Move to the bracket matching the one at the cursor
    ViMatch => "vi-match",
    /// Accept the line, returning to vi insert mode
    ViMoveAcceptLine => "vi-move-accept-line",
    /// Enter vi movement (command) mode
    ViMovementMode => "vi-movement-mode",
    /// Select next line in history, vi style
    ViNextHistory => "vi-next-history",
    /// Move to the next word, vi style
    ViNextWord => "vi-next-word",
    /// Select previous line in history, vi style
    ViPreviousHistory => "vi-previous-history",
    /// Move to the previous word, vi style
    ViPrevWord => "vi-prev-word",
    /// Paste the vi yank buffer after the cursor
    ViPut => "vi-put",
    /// Delete the character before the cursor
    ViRubout => "vi-rubout",
    /// Interactive vi history search (`/`, `?`)
    ViSearch => "vi-search",
    /// vi yank operator; doubled, yanks the whole line
    ViYankTo => "vi-yank-to",
    /// Insert text into buffer from the kill ring
    Yank => "yank",
    /// Rotate the kill ring and yank the new top
    YankPop => "yank-pop",
}

/// Describes the category of a command
///
/// A command's category determines how particular operations behave
/// in succession.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Category {
    /// Completion command
    Complete,
    /// Kill command
    Kill,
    /// Non-incremental search command
    Search,
    /// Incremental search command
    IncrementalSearch,
    /// Yank command
    Yank,
    /// Digit argument command
    Digit,
    /// Other command
    Other,
}

impl Command {
    /// Returns the category of the command
    pub fn category(&self) -> Category {
        use self::Command::*;

        match *self {
            DigitArgument => Category::Digit,
            Complete | InsertCompletions | PossibleCompletions => Category::Complete,
            KillLine | KillWholeLine | BackwardKillWord | KillWord |
                UnixLineDiscard | UnixWordRubout => Category::Kill,
            ForwardSearchHistory | ReverseSearchHistory => Category::IncrementalSearch,
            HistorySearchForward | HistorySearchBackward => Category::Search,
            Yank | YankPop => Category::Yank,
            _ => Category::Other
        }
    }

    /// Returns whether the command may complete a pending vi
    /// operator-motion.
    ///
    /// While a `d`, `c`, or `y` operator is pending, any other command is
    /// remapped to `vi-movement-mode`, aborting the operator.
    pub(crate) fn is_vi_motion(&self) -> bool {
        use self::Command::*;

        match *self {
            ViEofMaybe | Abort | BackwardChar | ForwardChar | EndOfLine |
            ViMatch | ViBeginningOfLineOrArgDigit | ViArgDigit |
            ViPrevWord | ViEndWord | ViCharSearch | ViNextWord |
            ViFirstPrint | ViGotoMark | ViColumn |
            ViDeleteTo | ViYankTo | ViChangeTo => true,
            _ => false
        }
    }
}

impl Default for Command {
    fn default() -> Self {
        Command::Custom(Borrowed(""))
    }
}

#[cfg(test)]
mod test {
    use super::{Category, Command, COMMANDS};

    #[test]
    fn test_from_str() {
        assert_eq!(Command::from_str("vi-put"), Command::ViPut);
        assert_eq!(Command::from_str("frob"),
            Command::Custom("frob".into()));
        assert_eq!(COMMANDS.len(), 87);
    }

    #[test]
    fn test_category() {
        assert_eq!(Command::KillWord.category(), Category::Kill);
        assert_eq!(Command::YankPop.category(), Category::Yank);
        assert_eq!(Command::ReverseSearchHistory.category(),
            Category::IncrementalSearch);
        assert_eq!(Command::ViPut.category(), Category::Other);
    }

    #[test]
    fn test_vi_motion() {
        assert!(Command::ViNextWord.is_vi_motion());
        assert!(Command::ViDeleteTo.is_vi_motion());
        assert!(!Command::ViPut.is_vi_motion());
        assert!(!Command::SelfInsert.is_vi_motion());
    }
}
