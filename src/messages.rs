//! User-facing messages, looked up by name
//!
//! Implementations shipping translations may substitute this table;
//! the defaults are the English texts.

static MESSAGES: &[(&str, &str)] = &[
    ("display-candidates", "Display all {} possibilities? (y or n)"),
    ("display-candidates-yes", "yes"),
    ("display-candidates-no", "no"),
    ("display-more", "--More--"),
];

pub fn lookup(name: &str) -> &'static str {
    MESSAGES.iter().find(|&&(n, _)| n == name)
        .map_or("", |&(_, msg)| msg)
}

pub fn format_count(name: &str, n: usize) -> String {
    lookup(name).replacen("{}", &n.to_string(), 1)
}

#[cfg(test)]
mod test {
    use super::{format_count, lookup};

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("display-more"), "--More--");
        assert_eq!(lookup("no-such-message"), "");
        assert_eq!(format_count("display-candidates", 120),
            "Display all 120 possibilities? (y or n)");
    }
}
