//! Parse-tree nodes for Earthfiles.
//!
//! The grammar front end produces these; the interpreter never sees raw
//! source text. Statement words are kept exactly as written, escapes and
//! line continuations included.

use crate::Span;
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Commands
// ══════════════════════════════════════════════════════════════════════════════

/// Every statement kind the grammar recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    From,
    FromDockerfile,
    Copy,
    Run,
    SaveArtifact,
    SaveImage,
    Build,
    Workdir,
    User,
    Cmd,
    Entrypoint,
    Expose,
    Volume,
    Env,
    Arg,
    Label,
    GitClone,
    Healthcheck,
    WithDocker,
    End,
    Add,
    Stopsignal,
    Onbuild,
    Shell,
    DockerLoad,
    DockerPull,
    /// Any other leading word.
    Generic,
}

impl Command {
    /// The statement keyword as written in an Earthfile.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::From => "FROM",
            Self::FromDockerfile => "FROM DOCKERFILE",
            Self::Copy => "COPY",
            Self::Run => "RUN",
            Self::SaveArtifact => "SAVE ARTIFACT",
            Self::SaveImage => "SAVE IMAGE",
            Self::Build => "BUILD",
            Self::Workdir => "WORKDIR",
            Self::User => "USER",
            Self::Cmd => "CMD",
            Self::Entrypoint => "ENTRYPOINT",
            Self::Expose => "EXPOSE",
            Self::Volume => "VOLUME",
            Self::Env => "ENV",
            Self::Arg => "ARG",
            Self::Label => "LABEL",
            Self::GitClone => "GIT CLONE",
            Self::Healthcheck => "HEALTHCHECK",
            Self::WithDocker => "WITH DOCKER",
            Self::End => "END",
            Self::Add => "ADD",
            Self::Stopsignal => "STOPSIGNAL",
            Self::Onbuild => "ONBUILD",
            Self::Shell => "SHELL",
            Self::DockerLoad => "DOCKER LOAD",
            Self::DockerPull => "DOCKER PULL",
            Self::Generic => "",
        }
    }

    /// Statements whose words may be a JSON array (exec form).
    pub fn accepts_exec_form(self) -> bool {
        matches!(self, Self::Run | Self::Cmd | Self::Entrypoint)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// The argument shape of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtArgs {
    /// Plain word list.
    Words(Vec<String>),
    /// Word list that may also be read as a JSON array of strings.
    WordsMaybeJson(Vec<String>),
    /// `ENV key=value` / `ARG key[=value]`
    EnvArg { key: String, value: Option<String> },
    /// `LABEL k1=v1 k2=v2`; the grammar may leave the lists uneven.
    Labels {
        keys: Vec<String>,
        values: Vec<String>,
    },
}

/// One statement: keyword, arguments, and its full source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stmt {
    pub command: Command,
    pub args: StmtArgs,
    pub text: String,
    pub span: Span,
}

impl Stmt {
    /// Word-list statement. Commands that accept exec form get
    /// [`StmtArgs::WordsMaybeJson`].
    pub fn words<I, S>(command: Command, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();
        let text = join_text(command.keyword(), &words);
        let args = if command.accepts_exec_form() {
            StmtArgs::WordsMaybeJson(words)
        } else {
            StmtArgs::Words(words)
        };
        Self {
            command,
            args,
            text,
            span: Span::default(),
        }
    }

    pub fn env(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::env_arg(Command::Env, key.into(), Some(value.into()))
    }

    pub fn arg(key: impl Into<String>, value: Option<&str>) -> Self {
        Self::env_arg(Command::Arg, key.into(), value.map(str::to_string))
    }

    fn env_arg(command: Command, key: String, value: Option<String>) -> Self {
        let text = match &value {
            Some(v) => format!("{} {key}={v}", command.keyword()),
            None => format!("{} {key}", command.keyword()),
        };
        Self {
            command,
            args: StmtArgs::EnvArg { key, value },
            text,
            span: Span::default(),
        }
    }

    pub fn labels<K, V>(pairs: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let keys: Vec<String> = pairs.iter().map(|(k, _)| k.as_ref().to_string()).collect();
        let values: Vec<String> = pairs.iter().map(|(_, v)| v.as_ref().to_string()).collect();
        let words: Vec<String> = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k.as_ref(), v.as_ref()))
            .collect();
        Self {
            command: Command::Label,
            text: join_text("LABEL", &words),
            args: StmtArgs::Labels { keys, values },
            span: Span::default(),
        }
    }

    /// An unrecognized command line.
    pub fn generic(text: impl Into<String>) -> Self {
        let text = text.into();
        let words = text.split_whitespace().map(str::to_string).collect();
        Self {
            command: Command::Generic,
            args: StmtArgs::Words(words),
            text,
            span: Span::default(),
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

fn join_text(keyword: &str, words: &[String]) -> String {
    std::iter::once(keyword)
        .chain(words.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

// ══════════════════════════════════════════════════════════════════════════════
// Blocks & Targets
// ══════════════════════════════════════════════════════════════════════════════

/// A statement sequence in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        let span = stmts
            .iter()
            .fold(Span::default(), |acc, stmt| acc.merge(stmt.span));
        Self { stmts, span }
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }
}

/// `name:` followed by its statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDecl {
    pub name: String,
    pub body: Block,
    pub span: Span,
}

/// A whole Earthfile: the leading base block plus named targets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Earthfile {
    /// Statements before the first target header; they form the `base`
    /// target.
    pub base: Block,
    pub targets: Vec<TargetDecl>,
}

impl Earthfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, stmts: Vec<Stmt>) -> Self {
        self.base = Block::new(stmts);
        self
    }

    pub fn with_target(mut self, name: impl Into<String>, stmts: Vec<Stmt>) -> Self {
        let body = Block::new(stmts);
        let span = body.span;
        self.targets.push(TargetDecl {
            name: name.into(),
            body,
            span,
        });
        self
    }

    pub fn target(&self, name: &str) -> Option<&TargetDecl> {
        self.targets.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_text_and_shape() {
        let stmt = Stmt::words(Command::SaveArtifact, ["./out", "AS", "LOCAL", "./local"]);
        assert_eq!(stmt.text, "SAVE ARTIFACT ./out AS LOCAL ./local");
        assert!(matches!(stmt.args, StmtArgs::Words(ref w) if w.len() == 4));

        let stmt = Stmt::words(Command::Run, ["echo", "hi"]);
        assert!(matches!(stmt.args, StmtArgs::WordsMaybeJson(_)));
    }

    #[test]
    fn env_arg_text() {
        assert_eq!(Stmt::env("PATH", "/bin").text, "ENV PATH=/bin");
        assert_eq!(Stmt::arg("VERSION", None).text, "ARG VERSION");
    }

    #[test]
    fn labels_keep_pairs_in_order() {
        let stmt = Stmt::labels(&[("a", "1"), ("b", "2")]);
        assert_eq!(stmt.text, "LABEL a=1 b=2");
        match stmt.args {
            StmtArgs::Labels { keys, values } => {
                assert_eq!(keys, ["a", "b"]);
                assert_eq!(values, ["1", "2"]);
            }
            other => panic!("unexpected args {other:?}"),
        }
    }

    #[test]
    fn block_span_covers_statements() {
        let block = Block::new(vec![
            Stmt::words(Command::Workdir, ["/a"]).at(Span::line(2)),
            Stmt::words(Command::Workdir, ["/b"]).at(Span::new(5, 5, 5, 9)),
        ]);
        assert_eq!(block.span, Span::new(2, 1, 5, 9));
    }

    #[test]
    fn target_lookup() {
        let file = Earthfile::new()
            .with_target("build", vec![])
            .with_target("docker", vec![]);
        assert!(file.target("docker").is_some());
        assert!(file.target("test").is_none());
    }
}
