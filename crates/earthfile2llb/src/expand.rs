//! Word normalization and variable expansion.
//!
//! `+` marks target and artifact references; a literal `+` inside a path
//! is written `\+`. Variable substitution consumes backslash escapes, so
//! the escaped marker is doubled before substitution and, for literal
//! values, collapsed back to a bare `+` afterwards.

use once_cell::sync::Lazy;
use regex::Regex;

use earthfile_types::{EarthError, Result};

static ENV_VAR_NAME: Lazy<Regex> = Lazy::new(|| compile(r"^[a-zA-Z_]+[a-zA-Z0-9_]*$"));

static LINE_CONTINUATION: Lazy<Regex> = Lazy::new(|| compile(r"\\(\n|\r\n)[\t ]*"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern compiles")
}

/// How a word's reference markers survive expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// The result is re-parsed as a target or artifact reference; escaped
    /// markers stay escaped.
    Reference,
    /// The result is used as-is; escaped markers become plain `+`.
    Literal,
}

/// Expands `word` through `substitute` in the given mode.
pub fn expand_word<F>(word: &str, mode: Expansion, substitute: F) -> String
where
    F: FnOnce(&str) -> String,
{
    let expanded = substitute(&escape_slash_plus(word));
    match mode {
        Expansion::Reference => expanded,
        Expansion::Literal => unescape_slash_plus(&expanded),
    }
}

// Known limitation: an already escaped backslash before the marker (`\\+`)
// is not distinguished from an escaped marker.
pub fn escape_slash_plus(s: &str) -> String {
    s.replace("\\+", "\\\\+")
}

pub fn unescape_slash_plus(s: &str) -> String {
    s.replace("\\+", "+")
}

/// Removes backslash-newline continuations and the indentation after them.
pub fn replace_escape(word: &str) -> String {
    LINE_CONTINUATION.replace_all(word, "").into_owned()
}

/// ENV and ARG keys are identifiers; they are never expanded.
pub fn check_env_var_name(key: &str) -> Result<()> {
    if ENV_VAR_NAME.is_match(key) {
        Ok(())
    } else {
        Err(EarthError::invalid_value(format!("invalid env key definition {key}")))
    }
}

/// Splits a WITH DOCKER `--load` value into `(image name, target)`.
///
/// `img=+target` names the image explicitly; a bare `+target` leaves the
/// name empty so it is inferred from that target's SAVE IMAGE.
pub fn parse_load(load: &str) -> (String, String) {
    match load.split_once('=') {
        Some((image, target)) => (image.to_string(), target.to_string()),
        None => (String::new(), load.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal substitution: drops one level of backslash escapes.
    fn unescape(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn escaped_marker_survives_reference_mode() {
        assert_eq!(
            expand_word(r"./c\+\+/main.cc", Expansion::Reference, unescape),
            r"./c\+\+/main.cc"
        );
    }

    #[test]
    fn escaped_marker_becomes_literal() {
        assert_eq!(
            expand_word(r"./c\+\+/main.cc", Expansion::Literal, unescape),
            "./c++/main.cc"
        );
    }

    #[test]
    fn bare_marker_is_untouched() {
        for mode in [Expansion::Reference, Expansion::Literal] {
            assert_eq!(expand_word("+build/out", mode, unescape), "+build/out");
        }
    }

    #[test]
    fn double_escape_limitation() {
        // `\\+` should read as an escaped backslash followed by a marker,
        // but the simple scheme treats its tail as an escaped marker.
        assert_eq!(escape_slash_plus(r"a\\+b"), r"a\\\+b");
        assert_eq!(expand_word(r"a\\+b", Expansion::Literal, unescape), "a+b");
    }

    #[test]
    fn line_continuations_removed() {
        assert_eq!(replace_escape("foo\\\n    bar"), "foobar");
        assert_eq!(replace_escape("foo\\\r\n\tbar"), "foobar");
        assert_eq!(replace_escape(r"foo\bar"), r"foo\bar");
    }

    #[test]
    fn env_var_names() {
        assert!(check_env_var_name("PATH").is_ok());
        assert!(check_env_var_name("_private_1").is_ok());
        assert!(check_env_var_name("1abc").is_err());
        assert!(check_env_var_name("A-B").is_err());
        assert!(check_env_var_name("$(whoami)").is_err());
        let err = check_env_var_name("").unwrap_err();
        assert_eq!(err.to_string(), "invalid env key definition ");
    }

    #[test]
    fn load_forms() {
        let load = |s: &str| {
            let (image, target) = parse_load(s);
            format!("{image}|{target}")
        };
        assert_eq!(load("app:latest=+docker"), "app:latest|+docker");
        assert_eq!(load("+docker"), "|+docker");
        assert_eq!(load("a=b=c"), "a|b=c");
    }
}
