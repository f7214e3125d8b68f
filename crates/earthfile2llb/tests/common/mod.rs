//! Shared test harness: a builder that records every call.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use earthfile2llb::{
    interpret, Context, CopyOpts, GraphBuilder, ListenerConfig, RunOpts, SaveImageOpts,
    WithDockerOpt,
};
use earthfile_types::ast::{Command, Earthfile, Stmt};
use earthfile_types::{EarthError, Platform};

/// One recorded builder call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    From {
        image: String,
        platform: Option<Platform>,
        build_args: Vec<String>,
    },
    FromDockerfile {
        context: String,
        dockerfile_path: String,
        target: String,
        platform: Option<Platform>,
        build_args: Vec<String>,
    },
    CopyArtifact {
        artifact: String,
        dest: String,
        platform: Option<Platform>,
        build_args: Vec<String>,
        opts: CopyOpts,
        if_exists: bool,
    },
    CopyClassical {
        srcs: Vec<String>,
        dest: String,
        opts: CopyOpts,
    },
    Run { args: Vec<String>, opts: RunOpts },
    WithDockerRun {
        args: Vec<String>,
        opt: WithDockerOpt,
    },
    SaveArtifact {
        src: String,
        dest: String,
        save_as_local: String,
        keep_ts: bool,
        keep_own: bool,
        if_exists: bool,
    },
    SaveImage {
        image_names: Vec<String>,
        opts: SaveImageOpts,
    },
    Build {
        target: String,
        platform: Option<Platform>,
        build_args: Vec<String>,
    },
    Workdir(String),
    User(String),
    Cmd { args: Vec<String>, with_shell: bool },
    Entrypoint { args: Vec<String>, with_shell: bool },
    Expose(Vec<String>),
    Volume(Vec<String>),
    Env { key: String, value: String },
    Arg {
        key: String,
        value: String,
        global: bool,
    },
    Label(BTreeMap<String, String>),
    GitClone {
        url: String,
        branch: String,
        dest: String,
        keep_ts: bool,
    },
    Healthcheck {
        is_none: bool,
        cmd: Vec<String>,
        interval: Duration,
        timeout: Duration,
        start_period: Duration,
        retries: i64,
    },
}

impl Call {
    pub fn from_image(image: &str) -> Self {
        Call::From {
            image: image.to_string(),
            platform: None,
            build_args: Vec::new(),
        }
    }

    /// The implicit first call of every target.
    pub fn base() -> Self {
        Self::from_image("+base")
    }

    fn op(&self) -> &'static str {
        match self {
            Call::From { .. } => "from",
            Call::FromDockerfile { .. } => "from_dockerfile",
            Call::CopyArtifact { .. } => "copy_artifact",
            Call::CopyClassical { .. } => "copy_classical",
            Call::Run { .. } => "run",
            Call::WithDockerRun { .. } => "with_docker_run",
            Call::SaveArtifact { .. } => "save_artifact",
            Call::SaveImage { .. } => "save_image",
            Call::Build { .. } => "build",
            Call::Workdir(_) => "workdir",
            Call::User(_) => "user",
            Call::Cmd { .. } => "cmd",
            Call::Entrypoint { .. } => "entrypoint",
            Call::Expose(_) => "expose",
            Call::Volume(_) => "volume",
            Call::Env { .. } => "env",
            Call::Arg { .. } => "arg",
            Call::Label(_) => "label",
            Call::GitClone { .. } => "git_clone",
            Call::Healthcheck { .. } => "healthcheck",
        }
    }
}

/// Records calls and expands `$NAME` from a fixed variable map. A
/// backslash escapes the next character and is consumed.
#[derive(Debug, Default)]
pub struct RecordingBuilder {
    pub calls: Vec<Call>,
    pub vars: HashMap<String, String>,
    /// Operation name that fails instead of recording.
    pub fail_on: Option<&'static str>,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }

    pub fn failing_on(mut self, op: &'static str) -> Self {
        self.fail_on = Some(op);
        self
    }

    fn record(&mut self, call: Call) -> anyhow::Result<()> {
        if self.fail_on == Some(call.op()) {
            anyhow::bail!("{} rejected by builder", call.op());
        }
        self.calls.push(call);
        Ok(())
    }
}

fn owned(words: &[String]) -> Vec<String> {
    words.to_vec()
}

impl GraphBuilder for RecordingBuilder {
    fn from(
        &mut self,
        _ctx: &Context,
        image: &str,
        platform: Option<&Platform>,
        build_args: &[String],
    ) -> anyhow::Result<()> {
        self.record(Call::From {
            image: image.to_string(),
            platform: platform.cloned(),
            build_args: owned(build_args),
        })
    }

    fn from_dockerfile(
        &mut self,
        _ctx: &Context,
        context: &str,
        dockerfile_path: &str,
        target: &str,
        platform: Option<&Platform>,
        build_args: &[String],
    ) -> anyhow::Result<()> {
        self.record(Call::FromDockerfile {
            context: context.to_string(),
            dockerfile_path: dockerfile_path.to_string(),
            target: target.to_string(),
            platform: platform.cloned(),
            build_args: owned(build_args),
        })
    }

    fn copy_artifact(
        &mut self,
        _ctx: &Context,
        artifact: &str,
        dest: &str,
        platform: Option<&Platform>,
        build_args: &[String],
        opts: &CopyOpts,
        if_exists: bool,
    ) -> anyhow::Result<()> {
        self.record(Call::CopyArtifact {
            artifact: artifact.to_string(),
            dest: dest.to_string(),
            platform: platform.cloned(),
            build_args: owned(build_args),
            opts: opts.clone(),
            if_exists,
        })
    }

    fn copy_classical(
        &mut self,
        _ctx: &Context,
        srcs: &[String],
        dest: &str,
        opts: &CopyOpts,
    ) -> anyhow::Result<()> {
        self.record(Call::CopyClassical {
            srcs: owned(srcs),
            dest: dest.to_string(),
            opts: opts.clone(),
        })
    }

    fn run(&mut self, _ctx: &Context, args: &[String], opts: &RunOpts) -> anyhow::Result<()> {
        self.record(Call::Run {
            args: owned(args),
            opts: opts.clone(),
        })
    }

    fn with_docker_run(
        &mut self,
        _ctx: &Context,
        args: &[String],
        opt: WithDockerOpt,
    ) -> anyhow::Result<()> {
        self.record(Call::WithDockerRun {
            args: owned(args),
            opt,
        })
    }

    fn save_artifact(
        &mut self,
        _ctx: &Context,
        src: &str,
        dest: &str,
        save_as_local: &str,
        keep_ts: bool,
        keep_own: bool,
        if_exists: bool,
    ) -> anyhow::Result<()> {
        self.record(Call::SaveArtifact {
            src: src.to_string(),
            dest: dest.to_string(),
            save_as_local: save_as_local.to_string(),
            keep_ts,
            keep_own,
            if_exists,
        })
    }

    fn save_image(
        &mut self,
        _ctx: &Context,
        image_names: &[String],
        opts: &SaveImageOpts,
    ) -> anyhow::Result<()> {
        self.record(Call::SaveImage {
            image_names: owned(image_names),
            opts: opts.clone(),
        })
    }

    fn build(
        &mut self,
        _ctx: &Context,
        target: &str,
        platform: Option<&Platform>,
        build_args: &[String],
    ) -> anyhow::Result<()> {
        self.record(Call::Build {
            target: target.to_string(),
            platform: platform.cloned(),
            build_args: owned(build_args),
        })
    }

    fn workdir(&mut self, _ctx: &Context, path: &str) -> anyhow::Result<()> {
        self.record(Call::Workdir(path.to_string()))
    }

    fn user(&mut self, _ctx: &Context, user: &str) -> anyhow::Result<()> {
        self.record(Call::User(user.to_string()))
    }

    fn cmd(&mut self, _ctx: &Context, args: &[String], with_shell: bool) -> anyhow::Result<()> {
        self.record(Call::Cmd {
            args: owned(args),
            with_shell,
        })
    }

    fn entrypoint(
        &mut self,
        _ctx: &Context,
        args: &[String],
        with_shell: bool,
    ) -> anyhow::Result<()> {
        self.record(Call::Entrypoint {
            args: owned(args),
            with_shell,
        })
    }

    fn expose(&mut self, _ctx: &Context, ports: &[String]) -> anyhow::Result<()> {
        self.record(Call::Expose(owned(ports)))
    }

    fn volume(&mut self, _ctx: &Context, volumes: &[String]) -> anyhow::Result<()> {
        self.record(Call::Volume(owned(volumes)))
    }

    fn env(&mut self, _ctx: &Context, key: &str, value: &str) -> anyhow::Result<()> {
        self.record(Call::Env {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    fn arg(&mut self, _ctx: &Context, key: &str, value: &str, global: bool) -> anyhow::Result<()> {
        self.record(Call::Arg {
            key: key.to_string(),
            value: value.to_string(),
            global,
        })
    }

    fn label(&mut self, _ctx: &Context, labels: &BTreeMap<String, String>) -> anyhow::Result<()> {
        self.record(Call::Label(labels.clone()))
    }

    fn git_clone(
        &mut self,
        _ctx: &Context,
        url: &str,
        branch: &str,
        dest: &str,
        keep_ts: bool,
    ) -> anyhow::Result<()> {
        self.record(Call::GitClone {
            url: url.to_string(),
            branch: branch.to_string(),
            dest: dest.to_string(),
            keep_ts,
        })
    }

    fn healthcheck(
        &mut self,
        _ctx: &Context,
        opts: &earthfile2llb::HealthcheckOpts,
    ) -> anyhow::Result<()> {
        self.record(Call::Healthcheck {
            is_none: opts.is_none,
            cmd: opts.cmd.clone(),
            interval: opts.interval,
            timeout: opts.timeout,
            start_period: opts.start_period,
            retries: opts.retries,
        })
    }

    fn expand_args(&self, word: &str) -> String {
        let mut out = String::with_capacity(word.len());
        let mut chars = word.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        out.push(next);
                    }
                }
                '$' => {
                    let mut name = String::new();
                    while let Some(&n) = chars.peek() {
                        if n.is_ascii_alphanumeric() || n == '_' {
                            name.push(n);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if name.is_empty() {
                        out.push('$');
                    } else if let Some(value) = self.vars.get(&name) {
                        out.push_str(value);
                    }
                }
                _ => out.push(c),
            }
        }
        out
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Interprets `target` with a fresh recording builder.
pub fn run_target(file: &Earthfile, target: &str) -> (Vec<Call>, Result<(), EarthError>) {
    run_with(RecordingBuilder::new(), file, target)
}

pub fn run_with(
    mut builder: RecordingBuilder,
    file: &Earthfile,
    target: &str,
) -> (Vec<Call>, Result<(), EarthError>) {
    let ctx = Context::background();
    let config = ListenerConfig::for_target(target);
    let result = interpret(file, &mut builder, &ctx, &config);
    (builder.calls, result)
}

/// Interprets `target` and expects success.
pub fn calls(file: &Earthfile, target: &str) -> Vec<Call> {
    let (calls, result) = run_target(file, target);
    if let Err(err) = result {
        panic!("interpretation failed: {err}");
    }
    calls
}

/// Interprets `target` and expects failure.
pub fn failure(file: &Earthfile, target: &str) -> EarthError {
    match run_target(file, target) {
        (_, Err(err)) => err,
        (calls, Ok(())) => panic!("expected failure, got calls {calls:?}"),
    }
}

pub fn strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

pub fn stmt(command: Command, words: &[&str]) -> Stmt {
    Stmt::words(command, words.iter().copied())
}

pub fn end() -> Stmt {
    stmt(Command::End, &[])
}

/// A file whose only target is `build`.
pub fn target(stmts: Vec<Stmt>) -> Earthfile {
    Earthfile::new().with_target("build", stmts)
}
