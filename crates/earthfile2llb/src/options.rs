//! Per-statement option decoding.
//!
//! Each statement declares its options with an [`OptionSet`]; decoding a
//! word list yields the option values plus the positional residue. Syntax
//! follows the usual flag conventions:
//!
//! - `-name` and `--name` are equivalent
//! - `--name value` and `--name=value` for valued options
//! - `--flag`, `--flag=true`, `--flag=false` for booleans
//! - decoding stops at the first non-option word, or after `--`

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use earthfile_types::{EarthError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptKind {
    Flag,
    Str,
    List,
    Duration(Duration),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq)]
enum OptValue {
    Flag(bool),
    Str(String),
    List(Vec<String>),
    Duration(Duration),
    Int(i64),
}

/// The declared options of one statement kind.
#[derive(Debug, Clone)]
pub struct OptionSet {
    command: &'static str,
    options: Vec<(&'static str, OptKind)>,
}

impl OptionSet {
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            options: Vec::new(),
        }
    }

    /// Boolean option, default `false`.
    pub fn flag(self, name: &'static str) -> Self {
        self.with(name, OptKind::Flag)
    }

    /// String option, default empty. Repeats keep the last value.
    pub fn string(self, name: &'static str) -> Self {
        self.with(name, OptKind::Str)
    }

    /// Repeatable string option collecting every occurrence in order.
    pub fn list(self, name: &'static str) -> Self {
        self.with(name, OptKind::List)
    }

    pub fn duration(self, name: &'static str, default: Duration) -> Self {
        self.with(name, OptKind::Duration(default))
    }

    pub fn int(self, name: &'static str, default: i64) -> Self {
        self.with(name, OptKind::Int(default))
    }

    fn with(mut self, name: &'static str, kind: OptKind) -> Self {
        self.options.push((name, kind));
        self
    }

    fn lookup(&self, name: &str) -> Option<(&'static str, OptKind)> {
        self.options.iter().copied().find(|(n, _)| *n == name)
    }

    /// Decodes `words` into option values and positional arguments.
    pub fn parse(&self, words: &[String]) -> Result<Options> {
        let mut values: HashMap<&'static str, OptValue> = self
            .options
            .iter()
            .map(|&(name, kind)| (name, default_value(kind)))
            .collect();

        let mut i = 0;
        while i < words.len() {
            let word = &words[i];
            if word.len() < 2 || !word.starts_with('-') {
                break;
            }
            i += 1;
            if word == "--" {
                break;
            }
            let body = word.strip_prefix("--").unwrap_or_else(|| &word[1..]);
            if body.is_empty() || body.starts_with('-') || body.starts_with('=') {
                return Err(self.fail(words, format!("bad flag syntax: {word}")));
            }
            let (name, inline) = match body.split_once('=') {
                Some((n, v)) => (n, Some(v)),
                None => (body, None),
            };
            let Some((name, kind)) = self.lookup(name) else {
                let reason = format!("flag provided but not defined: -{name}");
                return Err(self.fail(words, reason));
            };

            if kind == OptKind::Flag {
                let on = match inline {
                    None => true,
                    Some(v) => match parse_bool(v) {
                        Some(on) => on,
                        None => {
                            let reason = format!("invalid boolean value {v:?} for -{name}");
                            return Err(self.fail(words, reason));
                        }
                    },
                };
                values.insert(name, OptValue::Flag(on));
                continue;
            }

            let raw = match inline {
                Some(v) => v.to_string(),
                None => {
                    let Some(v) = words.get(i) else {
                        let reason = format!("flag needs an argument: -{name}");
                        return Err(self.fail(words, reason));
                    };
                    i += 1;
                    v.clone()
                }
            };
            let value = match kind {
                OptKind::Str => OptValue::Str(raw),
                OptKind::List => {
                    let mut acc = match values.remove(name) {
                        Some(OptValue::List(acc)) => acc,
                        _ => Vec::new(),
                    };
                    acc.push(raw);
                    OptValue::List(acc)
                }
                OptKind::Duration(_) => match parse_duration(&raw) {
                    Some(d) => OptValue::Duration(d),
                    None => {
                        let reason = invalid_value(&raw, name, "invalid duration");
                        return Err(self.fail(words, reason));
                    }
                },
                OptKind::Int(_) => match raw.parse() {
                    Ok(n) => OptValue::Int(n),
                    Err(e) => return Err(self.fail(words, invalid_value(&raw, name, e))),
                },
                OptKind::Flag => unreachable!("handled above"),
            };
            values.insert(name, value);
        }

        Ok(Options {
            values,
            args: words[i..].to_vec(),
        })
    }

    fn fail(&self, words: &[String], reason: String) -> EarthError {
        EarthError::OptionDecode {
            command: self.command.to_string(),
            words: words.to_vec(),
            reason,
        }
    }
}

fn default_value(kind: OptKind) -> OptValue {
    match kind {
        OptKind::Flag => OptValue::Flag(false),
        OptKind::Str => OptValue::Str(String::new()),
        OptKind::List => OptValue::List(Vec::new()),
        OptKind::Duration(d) => OptValue::Duration(d),
        OptKind::Int(n) => OptValue::Int(n),
    }
}

fn invalid_value(raw: &str, name: &str, detail: impl fmt::Display) -> String {
    format!("invalid value {raw:?} for flag -{name}: {detail}")
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn parse_duration(s: &str) -> Option<Duration> {
    if s == "0" {
        return Some(Duration::ZERO);
    }
    humantime::parse_duration(s).ok()
}

/// Decoded options of one statement.
///
/// Accessors fall back to the type's empty value for names that were not
/// declared, so handlers read every option unconditionally.
#[derive(Debug, Clone)]
pub struct Options {
    values: HashMap<&'static str, OptValue>,
    args: Vec<String>,
}

impl Options {
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(OptValue::Flag(true)))
    }

    pub fn string(&self, name: &str) -> &str {
        match self.values.get(name) {
            Some(OptValue::Str(s)) => s,
            _ => "",
        }
    }

    pub fn list(&self, name: &str) -> &[String] {
        match self.values.get(name) {
            Some(OptValue::List(l)) => l,
            _ => &[],
        }
    }

    pub fn duration(&self, name: &str) -> Duration {
        match self.values.get(name) {
            Some(OptValue::Duration(d)) => *d,
            _ => Duration::ZERO,
        }
    }

    pub fn int(&self, name: &str) -> i64 {
        match self.values.get(name) {
            Some(OptValue::Int(n)) => *n,
            _ => 0,
        }
    }

    /// Positional arguments left after the options.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    fn copy_set() -> OptionSet {
        OptionSet::new("COPY")
            .flag("dir")
            .string("chown")
            .list("build-arg")
    }

    #[test]
    fn flags_values_and_positionals() {
        let args = words(&[
            "--dir",
            "--chown",
            "app:app",
            "--build-arg",
            "A=1",
            "--build-arg=B=2",
            "src",
            "dest",
        ]);
        let opts = copy_set().parse(&args).unwrap();
        assert!(opts.flag("dir"));
        assert_eq!(opts.string("chown"), "app:app");
        assert_eq!(opts.list("build-arg"), ["A=1", "B=2"]);
        assert_eq!(opts.args(), ["src", "dest"]);
    }

    #[test]
    fn defaults_when_absent() {
        let opts = copy_set().parse(&words(&["src", "dest"])).unwrap();
        assert!(!opts.flag("dir"));
        assert_eq!(opts.string("chown"), "");
        assert!(opts.list("build-arg").is_empty());
    }

    #[test]
    fn stops_at_first_positional() {
        let opts = OptionSet::new("RUN")
            .flag("push")
            .parse(&words(&["echo", "--push"]))
            .unwrap();
        assert!(!opts.flag("push"));
        assert_eq!(opts.args(), ["echo", "--push"]);
    }

    #[test]
    fn double_dash_terminates() {
        let opts = OptionSet::new("RUN")
            .flag("push")
            .parse(&words(&["--", "--push"]))
            .unwrap();
        assert!(!opts.flag("push"));
        assert_eq!(opts.args(), ["--push"]);
    }

    #[test]
    fn single_dash_and_lone_dash() {
        let opts = OptionSet::new("FROM DOCKERFILE")
            .string("f")
            .parse(&words(&["-f", "Dockerfile.dev", "-"]))
            .unwrap();
        assert_eq!(opts.string("f"), "Dockerfile.dev");
        assert_eq!(opts.args(), ["-"]);
    }

    #[test]
    fn explicit_bool_values() {
        let set = OptionSet::new("RUN").flag("push");
        let parse = |ws: &[&str]| set.parse(&words(ws));
        assert!(parse(&["--push=true", "x"]).unwrap().flag("push"));
        assert!(!parse(&["--push=0", "x"]).unwrap().flag("push"));
        assert!(parse(&["--push=maybe", "x"]).is_err());
    }

    #[test]
    fn last_string_wins() {
        let opts = OptionSet::new("FROM")
            .string("platform")
            .parse(&words(&["--platform", "a", "--platform", "b", "img"]))
            .unwrap();
        assert_eq!(opts.string("platform"), "b");
    }

    #[test]
    fn unknown_flag() {
        let err = copy_set()
            .parse(&words(&["--from", "x", "a", "b"]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"invalid COPY arguments ["--from", "x", "a", "b"]: flag provided but not defined: -from"#
        );
    }

    #[test]
    fn missing_value() {
        let err = copy_set().parse(&words(&["--chown"])).unwrap_err();
        assert!(err.to_string().ends_with("flag needs an argument: -chown"));
    }

    #[test]
    fn bad_syntax() {
        assert!(copy_set().parse(&words(&["---dir"])).is_err());
        assert!(copy_set().parse(&words(&["--=x"])).is_err());
    }

    #[test]
    fn durations_and_ints() {
        let set = OptionSet::new("HEALTHCHECK")
            .duration("interval", Duration::from_secs(30))
            .duration("start-period", Duration::ZERO)
            .int("retries", 3);
        let opts = set.parse(&words(&["CMD", "true"])).unwrap();
        assert_eq!(opts.duration("interval"), Duration::from_secs(30));
        assert_eq!(opts.int("retries"), 3);

        let args = words(&["--interval", "5s", "--start-period=1m", "NONE"]);
        let opts = set.parse(&args).unwrap();
        assert_eq!(opts.duration("interval"), Duration::from_secs(5));
        assert_eq!(opts.duration("start-period"), Duration::from_secs(60));
        assert_eq!(opts.args(), ["NONE"]);

        let opts = set.parse(&words(&["--retries", "7", "NONE"])).unwrap();
        assert_eq!(opts.int("retries"), 7);

        let opts = set.parse(&words(&["--interval=0", "NONE"])).unwrap();
        assert_eq!(opts.duration("interval"), Duration::ZERO);

        assert!(set.parse(&words(&["--interval", "soon", "NONE"])).is_err());
        assert!(set.parse(&words(&["--retries", "many", "NONE"])).is_err());
    }
}
