//! Random values from compact `<class><length>` patterns
//!
//! `h32` is 32 lower-case hex digits, `S16` is 16 printable characters.
//! Used by `set`/`import` when a Password is given as `{pattern}`.

use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;

use crate::report::Report;

const HEX_LOWER: &[u8] = b"0123456789abcdef";
const HEX_UPPER: &[u8] = b"0123456789ABCDEF";
const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const PRINTABLE: &[u8] =
    b"!\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";

/// Character set a pattern draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    HexLower,
    HexUpper,
    Letters,
    Printable,
    Alphanumeric,
}

impl CharClass {
    /// Map a selector character to its class; unknown selectors are alphanumeric
    pub fn from_selector(selector: char) -> Self {
        match selector {
            'h' => Self::HexLower,
            'H' => Self::HexUpper,
            'L' => Self::Letters,
            'S' => Self::Printable,
            _ => Self::Alphanumeric,
        }
    }

    pub fn chars(&self) -> &'static [u8] {
        match self {
            Self::HexLower => HEX_LOWER,
            Self::HexUpper => HEX_UPPER,
            Self::Letters => LETTERS,
            Self::Printable => PRINTABLE,
            Self::Alphanumeric => ALPHANUMERIC,
        }
    }
}

/// A parsed generation pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub class: CharClass,
    pub length: usize,
}

impl Pattern {
    /// Used whenever a pattern does not parse
    pub const FALLBACK: Pattern = Pattern {
        class: CharClass::Alphanumeric,
        length: 32,
    };

    /// Parse `<class><1-3 digits>`
    pub fn parse(pattern: &str) -> Option<Self> {
        if !pattern_regex().is_match(pattern) {
            return None;
        }

        let mut chars = pattern.chars();
        let selector = chars.next()?;
        let length = chars.as_str().parse().ok()?;

        Some(Self {
            class: CharClass::from_selector(selector),
            length,
        })
    }

    pub fn generate(&self) -> String {
        let chars = self.class.chars();
        let mut rng = rand::thread_rng();

        (0..self.length)
            .map(|_| chars[rng.gen_range(0..chars.len())] as char)
            .collect()
    }
}

// Selector is exactly one of h H A L S; `|` is not a selector and falls back.
fn pattern_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[hHALS][0-9]{1,3}$").unwrap())
}

/// Generate a value for `pattern`, falling back to `A32` with a warning
pub fn generate(pattern: &str, report: &mut Report) -> String {
    let parsed = Pattern::parse(pattern).unwrap_or_else(|| {
        report.warn(format!(
            "unknown password pattern {}, fallback to A32",
            pattern
        ));
        Pattern::FALLBACK
    });

    parsed.generate()
}
