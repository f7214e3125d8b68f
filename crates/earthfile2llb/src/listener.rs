//! The statement interpreter.
//!
//! [`Listener`] receives parse-tree events from [`crate::walk`], collects
//! each statement's raw words, and on the statement's exit event decodes,
//! validates and expands it before calling the [`GraphBuilder`].
//!
//! The first error is latched. From then on, and for every statement
//! outside the requested target, events are ignored.

use earthfile_types::ast::Command;
use earthfile_types::{EarthError, Platform, Result};

use crate::block::WithDockerBlock;
use crate::builder::{Context, GraphBuilder};
use crate::config::ListenerConfig;
use crate::expand::{self, Expansion};
use crate::target::TargetFilter;
use crate::walk::EarthfileListener;

// ══════════════════════════════════════════════════════════════════════════════
// Statement
// ══════════════════════════════════════════════════════════════════════════════

/// Argument events collected between `enter_stmt` and `exit_stmt`.
#[derive(Debug, Default)]
struct Scratch {
    words: Vec<String>,
    exec_mode: bool,
    env_key: String,
    env_value: String,
    label_keys: Vec<String>,
    label_values: Vec<String>,
}

/// One complete statement, handed to its handler by value.
#[derive(Debug)]
pub(crate) struct Statement {
    pub command: Command,
    /// Source text, for error messages.
    pub text: String,
    /// Line-continuation free, not yet expanded.
    pub words: Vec<String>,
    /// Words came from a JSON array.
    pub exec_mode: bool,
    pub env_key: String,
    pub env_value: String,
    pub label_keys: Vec<String>,
    pub label_values: Vec<String>,
}

impl Statement {
    fn new(command: Command, text: &str, scratch: Scratch) -> Self {
        Self {
            command,
            text: text.to_string(),
            words: scratch.words,
            exec_mode: scratch.exec_mode,
            env_key: scratch.env_key,
            env_value: scratch.env_value,
            label_keys: scratch.label_keys,
            label_values: scratch.label_values,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Listener
// ══════════════════════════════════════════════════════════════════════════════

pub struct Listener<'a, B: GraphBuilder + ?Sized> {
    pub(crate) builder: &'a mut B,
    pub(crate) ctx: &'a Context,
    pub(crate) config: ListenerConfig,
    pub(crate) targets: TargetFilter,
    /// Set by a successful `--push` action; cleared by the next target.
    pub(crate) push_only: bool,
    pub(crate) with_docker: WithDockerBlock,
    scratch: Option<Scratch>,
    err: Option<EarthError>,
}

impl<'a, B: GraphBuilder + ?Sized> Listener<'a, B> {
    pub fn new(builder: &'a mut B, ctx: &'a Context, config: &ListenerConfig) -> Self {
        Self {
            builder,
            ctx,
            targets: TargetFilter::new(config.target.clone()),
            config: config.clone(),
            push_only: false,
            with_docker: WithDockerBlock::new(),
            scratch: None,
            err: None,
        }
    }

    /// The interpretation outcome: the latched error, or a not-found error
    /// if the requested target never appeared.
    pub fn finish(self) -> Result<()> {
        match self.err {
            Some(err) => Err(err),
            None => self.targets.finish(),
        }
    }

    fn should_skip(&self) -> bool {
        self.err.is_some() || !self.targets.is_active()
    }

    fn latch(&mut self, result: Result<()>) {
        if let Err(err) = result {
            if self.err.is_none() {
                log::debug!("target {} failed: {err}", self.targets.current());
                self.err = Some(err);
            }
        }
    }

    fn scratch(&mut self) -> &mut Scratch {
        self.scratch.get_or_insert_with(Scratch::default)
    }

    fn dispatch(&mut self, stmt: Statement) -> Result<()> {
        match stmt.command {
            Command::From => self.apply_from(stmt),
            Command::FromDockerfile => self.apply_from_dockerfile(stmt),
            Command::Copy => self.apply_copy(stmt),
            Command::Run => self.apply_run(stmt),
            Command::SaveArtifact => self.apply_save_artifact(stmt),
            Command::SaveImage => self.apply_save_image(stmt),
            Command::Build => self.apply_build(stmt),
            Command::Workdir => self.apply_workdir(stmt),
            Command::User => self.apply_user(stmt),
            Command::Cmd => self.apply_cmd(stmt),
            Command::Entrypoint => self.apply_entrypoint(stmt),
            Command::Expose => self.apply_expose(stmt),
            Command::Volume => self.apply_volume(stmt),
            Command::Env => self.apply_env(stmt),
            Command::Arg => self.apply_arg(stmt),
            Command::Label => self.apply_label(stmt),
            Command::GitClone => self.apply_git_clone(stmt),
            Command::Healthcheck => self.apply_healthcheck(stmt),
            Command::WithDocker => self.apply_with_docker(stmt),
            Command::End => self.apply_end(stmt),
            Command::Add
            | Command::Stopsignal
            | Command::Onbuild
            | Command::Shell
            | Command::DockerLoad
            | Command::DockerPull
            | Command::Generic => Err(rejection(&stmt)),
        }
    }

    // ── Shared handler helpers ───────────────────────────────────────────

    /// Fails once a `--push` action ran in this target.
    pub(crate) fn ensure_not_push_only(&self, stmt: &Statement) -> Result<()> {
        if self.push_only {
            let text = &stmt.text;
            let msg = format!("no non-push commands allowed after a --push: {text}");
            return Err(EarthError::state(msg));
        }
        Ok(())
    }

    pub(crate) fn expand(&self, word: &str, mode: Expansion) -> String {
        expand::expand_word(word, mode, |s| self.builder.expand_args(s))
    }

    pub(crate) fn expand_all(&self, words: &[String], mode: Expansion) -> Vec<String> {
        words.iter().map(|w| self.expand(w, mode)).collect()
    }

    /// Expands and parses an optional `--platform` value.
    pub(crate) fn platform(&self, raw: &str) -> Result<Option<Platform>> {
        let expanded = self.expand(raw, Expansion::Literal);
        if expanded.is_empty() {
            return Ok(None);
        }
        Platform::parse(&expanded)
            .map(Some)
            .map_err(|e| EarthError::invalid_value(format!("parse platform {expanded}: {e}")))
    }
}

/// Statements that are recognized but never applied.
fn rejection(stmt: &Statement) -> EarthError {
    match stmt.command {
        Command::Add => EarthError::unsupported("command ADD not yet supported"),
        Command::Stopsignal => EarthError::unsupported("command STOPSIGNAL not yet supported"),
        Command::Shell => EarthError::unsupported("command SHELL not yet supported"),
        Command::Onbuild => EarthError::unsupported("command ONBUILD not supported"),
        Command::DockerLoad => EarthError::obsolete("DOCKER LOAD", "WITH DOCKER --load"),
        Command::DockerPull => EarthError::obsolete("DOCKER PULL", "WITH DOCKER --pull"),
        _ => EarthError::unsupported(format!("invalid command {}", stmt.text)),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Events
// ══════════════════════════════════════════════════════════════════════════════

impl<B: GraphBuilder + ?Sized> EarthfileListener for Listener<'_, B> {
    fn enter_target_header(&mut self, name: &str) {
        if self.err.is_some() {
            return;
        }
        let result = match self.targets.enter_header(name) {
            Ok(true) => {
                log::debug!("entering target {name}");
                self.builder
                    .from(self.ctx, "+base", None, &[])
                    .map_err(|e| EarthError::builder("apply implicit FROM +base", e))
            }
            Ok(false) => Ok(()),
            Err(err) => Err(err),
        };
        self.latch(result);
    }

    fn enter_stmts(&mut self) {
        if self.should_skip() {
            return;
        }
        self.push_only = false;
    }

    fn exit_stmts(&mut self) {
        if self.should_skip() {
            return;
        }
        let result = self.with_docker.ensure_closed();
        self.latch(result);
    }

    fn enter_stmt(&mut self) {
        if self.should_skip() {
            return;
        }
        self.scratch = Some(Scratch::default());
    }

    fn enter_stmt_word(&mut self, word: &str) {
        if self.should_skip() {
            return;
        }
        self.scratch().words.push(expand::replace_escape(word));
    }

    fn exit_stmt_words_maybe_json(&mut self, text: &str) {
        if self.should_skip() {
            return;
        }
        if let Ok(words) = serde_json::from_str::<Vec<String>>(text) {
            let scratch = self.scratch();
            scratch.words = words;
            scratch.exec_mode = true;
        }
    }

    fn enter_env_arg_key(&mut self, key: &str) {
        if self.should_skip() {
            return;
        }
        self.scratch().env_key = key.to_string();
        let result = expand::check_env_var_name(key);
        self.latch(result);
    }

    fn enter_env_arg_value(&mut self, value: &str) {
        if self.should_skip() {
            return;
        }
        self.scratch().env_value = value.to_string();
    }

    fn enter_label_key(&mut self, key: &str) {
        if self.should_skip() {
            return;
        }
        self.scratch().label_keys.push(key.to_string());
    }

    fn enter_label_value(&mut self, value: &str) {
        if self.should_skip() {
            return;
        }
        self.scratch().label_values.push(value.to_string());
    }

    fn exit_stmt(&mut self, command: Command, text: &str) {
        if self.should_skip() {
            return;
        }
        let stmt = Statement::new(command, text, self.scratch.take().unwrap_or_default());
        let result = self.dispatch(stmt);
        if result.is_ok() {
            log::debug!("applied {text}");
        }
        self.latch(result);
    }
}
