//! Character classes used by the tokenizer.
//!
//! All predicates look at a single byte. Courier source is ASCII outside of
//! string literals and comments; any other byte is rejected by the tokenizer
//! unless it appears inside one of those runs.

/// Characters that always terminate a run and start a token of their own.
pub const RESERVED_CHARS: &[u8] = b"()[]{};+-/*:@.#,%";

pub fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c')
}

pub fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

/// Letters and `_`, i.e. anything that may start an identifier.
pub fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

pub fn is_hex_digit(c: u8) -> bool {
    c.is_ascii_hexdigit()
}

pub fn is_binary_digit(c: u8) -> bool {
    c == b'0' || c == b'1'
}

pub fn is_quote(c: u8) -> bool {
    c == b'"'
}

pub fn is_comment_marker(c: u8) -> bool {
    c == b'#'
}

pub fn is_reserved(c: u8) -> bool {
    RESERVED_CHARS.contains(&c)
}

/// True when `c` ends an identifier or numeric run.
pub fn is_run_terminator(c: u8) -> bool {
    is_whitespace(c) || is_reserved(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_set_covers_operators_and_brackets() {
        for c in b"+-*/%()[]{}".iter().copied() {
            assert!(is_reserved(c), "{} should be reserved", c as char);
        }
        assert!(is_reserved(b'#'));
        assert!(is_reserved(b','));
        assert!(!is_reserved(b'"'));
        assert!(!is_reserved(b'_'));
    }

    #[test]
    fn alpha_includes_underscore_but_not_digits() {
        assert!(is_alpha(b'_'));
        assert!(is_alpha(b'Z'));
        assert!(!is_alpha(b'7'));
    }

    #[test]
    fn binary_and_hex_digits() {
        assert!(is_binary_digit(b'1'));
        assert!(!is_binary_digit(b'2'));
        assert!(is_hex_digit(b'f'));
        assert!(is_hex_digit(b'F'));
        assert!(!is_hex_digit(b'g'));
    }

    #[test]
    fn terminators() {
        assert!(is_run_terminator(b' '));
        assert!(is_run_terminator(b';'));
        assert!(is_run_terminator(b'.'));
        assert!(!is_run_terminator(b'a'));
    }
}
