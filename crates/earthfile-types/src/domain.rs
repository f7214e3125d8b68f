//! Target and artifact references.
//!
//! ```text
//! +build                         target in the same Earthfile
//! ./sub/dir+build                target in a local directory
//! github.com/org/repo:v1+build   target in a remote repository
//! +build/out/bin                 artifact `out/bin` produced by `+build`
//! ```
//!
//! The reference marker is the first `+` that is not preceded by a
//! backslash, so `./my\+file` is a plain path.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("invalid target reference {0}: missing +")]
    MissingMarker(String),
    #[error("invalid target reference {0}: empty target name")]
    EmptyTargetName(String),
    #[error("invalid artifact reference {0}: missing artifact path")]
    MissingArtifactPath(String),
}

/// Where a referenced target lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetLocation {
    /// The Earthfile being interpreted.
    Current,
    /// A directory relative to (or absolute on) the build host.
    Local(String),
    /// A remote repository, optionally pinned to a tag or branch.
    Remote { repo: String, tag: Option<String> },
}

/// `[<location>]+<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub location: TargetLocation,
    pub name: String,
}

impl Target {
    pub fn parse(s: &str) -> Result<Self, ReferenceError> {
        let idx = marker_index(s)?;
        let (location, name) = (&s[..idx], &s[idx + 1..]);
        if name.is_empty() {
            return Err(ReferenceError::EmptyTargetName(s.to_string()));
        }
        Ok(Self {
            location: parse_location(location),
            name: name.to_string(),
        })
    }

    pub fn is_local(&self) -> bool {
        !matches!(self.location, TargetLocation::Remote { .. })
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            TargetLocation::Current => {}
            TargetLocation::Local(path) => write!(f, "{path}")?,
            TargetLocation::Remote { repo, tag } => {
                write!(f, "{repo}")?;
                if let Some(tag) = tag {
                    write!(f, ":{tag}")?;
                }
            }
        }
        write!(f, "+{}", self.name)
    }
}

/// `<target>/<artifact path>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Artifact {
    pub target: Target,
    pub path: String,
}

impl Artifact {
    pub fn parse(s: &str) -> Result<Self, ReferenceError> {
        let idx = marker_index(s)?;
        let rest = &s[idx + 1..];
        let (name, path) = rest
            .split_once('/')
            .ok_or_else(|| ReferenceError::MissingArtifactPath(s.to_string()))?;
        if path.is_empty() {
            return Err(ReferenceError::MissingArtifactPath(s.to_string()));
        }
        let target = Target::parse(&s[..idx + 1 + name.len()])?;
        Ok(Self {
            target,
            path: path.to_string(),
        })
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.target, self.path)
    }
}

/// Byte index of the first `+` not escaped by a backslash.
fn marker_index(s: &str) -> Result<usize, ReferenceError> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            '\\' => escaped = !escaped,
            '+' if !escaped => return Ok(i),
            _ => escaped = false,
        }
    }
    Err(ReferenceError::MissingMarker(s.to_string()))
}

fn parse_location(s: &str) -> TargetLocation {
    if s.is_empty() {
        TargetLocation::Current
    } else if s.starts_with('.') || s.starts_with('/') {
        TargetLocation::Local(s.to_string())
    } else {
        // A colon after the last slash separates the tag: host:port/org/repo:tag
        let tag_sep = s.rfind(':').filter(|&colon| s[colon..].find('/').is_none());
        match tag_sep {
            Some(colon) => TargetLocation::Remote {
                repo: s[..colon].to_string(),
                tag: Some(s[colon + 1..].to_string()),
            },
            None => TargetLocation::Remote {
                repo: s.to_string(),
                tag: None,
            },
        }
    }
}
