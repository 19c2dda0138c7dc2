use nix::sys::termios::{tcgetattr, SpecialCharacterIndices};

use crate::terminal::SpecialChars;

pub fn special_chars() -> Option<SpecialChars> {
    let attrs = tcgetattr(libc::STDIN_FILENO).ok()?;

    let get = |idx: SpecialCharacterIndices| {
        let c = attrs.control_chars[idx as usize];

        if c > 0 && c < 255 {
            Some(c as char)
        } else {
            None
        }
    };

    Some(SpecialChars{
        erase: get(SpecialCharacterIndices::VERASE),
        word_erase: get(SpecialCharacterIndices::VWERASE),
        kill: get(SpecialCharacterIndices::VKILL),
        literal_next: get(SpecialCharacterIndices::VLNEXT),
    })
}
