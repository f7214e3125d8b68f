//! Platform specifiers: `os[/arch[/variant]]` or a bare architecture.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "illumos", "ios", "js", "linux",
    "netbsd", "openbsd", "plan9", "solaris", "windows",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "arm", "arm64", "loong64", "mips", "mips64", "mips64le", "mipsle", "ppc64",
    "ppc64le", "riscv64", "s390x", "wasm",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("invalid platform {0:?}: empty component")]
    EmptyComponent(String),
    #[error("invalid platform {0:?}: unknown operating system or architecture")]
    Unknown(String),
    #[error("invalid platform {0:?}: too many components")]
    TooManyComponents(String),
}

/// A target platform triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: String,
    pub architecture: String,
    pub variant: Option<String>,
}

impl Platform {
    pub fn new(os: impl Into<String>, architecture: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            architecture: architecture.into(),
            variant: None,
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    pub fn parse(specifier: &str) -> Result<Self, PlatformError> {
        let lower = specifier.to_ascii_lowercase();
        let parts: Vec<&str> = lower.split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(PlatformError::EmptyComponent(specifier.to_string()));
        }
        match parts.as_slice() {
            [single] => {
                if KNOWN_OS.contains(single) {
                    Ok(Self::new(*single, default_arch()))
                } else if let Some((arch, variant)) = normalize_arch(single, None) {
                    Ok(Self {
                        os: "linux".to_string(),
                        architecture: arch,
                        variant,
                    })
                } else {
                    Err(PlatformError::Unknown(specifier.to_string()))
                }
            }
            [os, arch] => Self::from_parts(specifier, os, arch, None),
            [os, arch, variant] => Self::from_parts(specifier, os, arch, Some(*variant)),
            _ => Err(PlatformError::TooManyComponents(specifier.to_string())),
        }
    }

    fn from_parts(
        specifier: &str,
        os: &str,
        arch: &str,
        variant: Option<&str>,
    ) -> Result<Self, PlatformError> {
        let os = normalize_os(os);
        if !KNOWN_OS.contains(&os) {
            return Err(PlatformError::Unknown(specifier.to_string()));
        }
        let (architecture, variant) = normalize_arch(arch, variant)
            .ok_or_else(|| PlatformError::Unknown(specifier.to_string()))?;
        Ok(Self {
            os: os.to_string(),
            architecture,
            variant,
        })
    }
}

impl FromStr for Platform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)?;
        if let Some(variant) = &self.variant {
            write!(f, "/{variant}")?;
        }
        Ok(())
    }
}

fn normalize_os(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn normalize_arch(arch: &str, variant: Option<&str>) -> Option<(String, Option<String>)> {
    let (arch, variant) = match (arch, variant) {
        ("i386", v) => ("386", v),
        ("x86_64" | "x86-64", v) => ("amd64", v),
        ("aarch64", v) => ("arm64", v),
        ("arm64", Some("8" | "v8")) => ("arm64", None),
        ("armhf", None) => ("arm", Some("v7")),
        ("armel", None) => ("arm", Some("v6")),
        ("arm", Some(v)) if !v.starts_with('v') => {
            return Some(("arm".to_string(), Some(format!("v{v}"))));
        }
        (a, v) => (a, v),
    };
    if !KNOWN_ARCH.contains(&arch) {
        return None;
    }
    Some((arch.to_string(), variant.map(str::to_string)))
}

fn default_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "arm" => "arm",
        "s390x" => "s390x",
        "powerpc64" => "ppc64le",
        "riscv64" => "riscv64",
        _ => "amd64",
    }
}
