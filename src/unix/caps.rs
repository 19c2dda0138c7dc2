use std::sync::atomic::{AtomicU8, Ordering};

use terminfo::capability::{AutoRightMargin, EatNewlineGlitch};
use terminfo::Database;

const KNOWN: u8 = 1;
const AUTO_RIGHT_MARGIN: u8 = 2;
const EAT_NEWLINE_GLITCH: u8 = 4;

// Capability flags for the process's terminal, queried once
static CAPS: AtomicU8 = AtomicU8::new(0);

fn load() -> u8 {
    let cached = CAPS.load(Ordering::Relaxed);

    if cached & KNOWN != 0 {
        return cached;
    }

    let mut flags = KNOWN;

    if let Ok(db) = Database::from_env() {
        if db.get::<AutoRightMargin>().map_or(false, |cap| cap.0) {
            flags |= AUTO_RIGHT_MARGIN;
        }
        if db.get::<EatNewlineGlitch>().map_or(false, |cap| cap.0) {
            flags |= EAT_NEWLINE_GLITCH;
        }
    }

    CAPS.store(flags, Ordering::Relaxed);
    flags
}

pub fn auto_right_margin() -> bool {
    load() & AUTO_RIGHT_MARGIN != 0
}

pub fn eat_newline_glitch() -> bool {
    load() & EAT_NEWLINE_GLITCH != 0
}
