//! The build-graph builder seam.
//!
//! The interpreter validates and expands each statement, then hands plain
//! values to a [`GraphBuilder`]. Builders own everything past that point:
//! layer construction, image composition, caching, registry I/O.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use earthfile_types::Platform;

/// Cancellation and deadline carrier passed to every builder call.
///
/// The interpreter only threads it through; builders decide when to
/// observe it.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `true` once cancelled or past the deadline.
    pub fn is_done(&self) -> bool {
        if self.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Operation payloads
// ══════════════════════════════════════════════════════════════════════════════

/// File-copy modifiers shared by both COPY forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyOpts {
    pub is_dir: bool,
    pub keep_ts: bool,
    pub keep_own: bool,
    pub chown: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOpts {
    pub mounts: Vec<String>,
    pub secrets: Vec<String>,
    pub privileged: bool,
    pub with_entrypoint: bool,
    pub with_docker: bool,
    pub with_shell: bool,
    pub push: bool,
    pub with_ssh: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveImageOpts {
    pub push: bool,
    pub insecure: bool,
    pub cache_hint: bool,
    pub cache_from: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthcheckOpts {
    pub is_none: bool,
    pub cmd: Vec<String>,
    pub interval: Duration,
    pub timeout: Duration,
    pub start_period: Duration,
    pub retries: i64,
}

/// An image built by another target and loaded into the inner daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerLoadOpt {
    pub target: String,
    /// Empty when the name should come from the target's SAVE IMAGE.
    pub image_name: String,
    pub platform: Option<Platform>,
    pub build_args: Vec<String>,
}

/// An image pulled into the inner daemon before the RUN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerPullOpt {
    pub image_name: String,
    pub platform: Option<Platform>,
}

/// Everything a WITH DOCKER block collected for its single RUN.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WithDockerOpt {
    pub compose_files: Vec<String>,
    pub compose_services: Vec<String>,
    pub loads: Vec<DockerLoadOpt>,
    pub pulls: Vec<DockerPullOpt>,
    pub mounts: Vec<String>,
    pub secrets: Vec<String>,
    pub with_shell: bool,
    pub with_entrypoint: bool,
}

// ══════════════════════════════════════════════════════════════════════════════
// GraphBuilder
// ══════════════════════════════════════════════════════════════════════════════

/// Receives fully expanded statements in document order.
///
/// Any error returned is wrapped with the statement context and becomes
/// the interpretation's terminal error; no further calls follow it.
pub trait GraphBuilder {
    fn from(
        &mut self,
        ctx: &Context,
        image: &str,
        platform: Option<&Platform>,
        build_args: &[String],
    ) -> anyhow::Result<()>;

    /// `context` is either a build-context path or an artifact reference.
    fn from_dockerfile(
        &mut self,
        ctx: &Context,
        context: &str,
        dockerfile_path: &str,
        target: &str,
        platform: Option<&Platform>,
        build_args: &[String],
    ) -> anyhow::Result<()>;

    #[allow(clippy::too_many_arguments)]
    fn copy_artifact(
        &mut self,
        ctx: &Context,
        artifact: &str,
        dest: &str,
        platform: Option<&Platform>,
        build_args: &[String],
        opts: &CopyOpts,
        if_exists: bool,
    ) -> anyhow::Result<()>;

    fn copy_classical(
        &mut self,
        ctx: &Context,
        srcs: &[String],
        dest: &str,
        opts: &CopyOpts,
    ) -> anyhow::Result<()>;

    fn run(&mut self, ctx: &Context, args: &[String], opts: &RunOpts) -> anyhow::Result<()>;

    fn with_docker_run(
        &mut self,
        ctx: &Context,
        args: &[String],
        opt: WithDockerOpt,
    ) -> anyhow::Result<()>;

    #[allow(clippy::too_many_arguments)]
    fn save_artifact(
        &mut self,
        ctx: &Context,
        src: &str,
        dest: &str,
        save_as_local: &str,
        keep_ts: bool,
        keep_own: bool,
        if_exists: bool,
    ) -> anyhow::Result<()>;

    fn save_image(
        &mut self,
        ctx: &Context,
        image_names: &[String],
        opts: &SaveImageOpts,
    ) -> anyhow::Result<()>;

    fn build(
        &mut self,
        ctx: &Context,
        target: &str,
        platform: Option<&Platform>,
        build_args: &[String],
    ) -> anyhow::Result<()>;

    fn workdir(&mut self, ctx: &Context, path: &str) -> anyhow::Result<()>;

    fn user(&mut self, ctx: &Context, user: &str) -> anyhow::Result<()>;

    fn cmd(&mut self, ctx: &Context, args: &[String], with_shell: bool) -> anyhow::Result<()>;

    fn entrypoint(
        &mut self,
        ctx: &Context,
        args: &[String],
        with_shell: bool,
    ) -> anyhow::Result<()>;

    fn expose(&mut self, ctx: &Context, ports: &[String]) -> anyhow::Result<()>;

    fn volume(&mut self, ctx: &Context, volumes: &[String]) -> anyhow::Result<()>;

    fn env(&mut self, ctx: &Context, key: &str, value: &str) -> anyhow::Result<()>;

    fn arg(&mut self, ctx: &Context, key: &str, value: &str, global: bool) -> anyhow::Result<()>;

    fn label(&mut self, ctx: &Context, labels: &BTreeMap<String, String>) -> anyhow::Result<()>;

    fn git_clone(
        &mut self,
        ctx: &Context,
        url: &str,
        branch: &str,
        dest: &str,
        keep_ts: bool,
    ) -> anyhow::Result<()>;

    fn healthcheck(&mut self, ctx: &Context, opts: &HealthcheckOpts) -> anyhow::Result<()>;

    /// Substitutes build-arg and env references in `word`. Backslash
    /// escapes are consumed by the substitution.
    fn expand_args(&self, word: &str) -> String;
}
