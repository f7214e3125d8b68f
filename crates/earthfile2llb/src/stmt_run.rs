//! RUN, the WITH DOCKER block, and the image run configuration statements.

use std::time::Duration;

use earthfile_types::{EarthError, Result};

use crate::builder::{
    DockerLoadOpt, DockerPullOpt, GraphBuilder, HealthcheckOpts, RunOpts, WithDockerOpt,
};
use crate::expand::{self, Expansion};
use crate::listener::{Listener, Statement};
use crate::options::OptionSet;

const DEFAULT_HEALTHCHECK_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_HEALTHCHECK_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_HEALTHCHECK_RETRIES: i64 = 3;

impl<B: GraphBuilder + ?Sized> Listener<'_, B> {
    pub(crate) fn apply_run(&mut self, stmt: Statement) -> Result<()> {
        let opts = OptionSet::new("RUN")
            .flag("push")
            .flag("privileged")
            .flag("entrypoint")
            .flag("with-docker")
            .flag("ssh")
            .list("secret")
            .list("mount")
            .parse(&stmt.words)?;
        let push = opts.flag("push");
        if !push {
            self.ensure_not_push_only(&stmt)?;
        }
        if opts.args().is_empty() {
            return Err(EarthError::arity("not enough arguments for RUN"));
        }
        let with_shell = !stmt.exec_mode;
        let args = if with_shell {
            opts.args().to_vec()
        } else {
            self.expand_all(opts.args(), Expansion::Literal)
        };
        let secrets = self.expand_all(opts.list("secret"), Expansion::Reference);
        let mounts = self.expand_all(opts.list("mount"), Expansion::Literal);

        if self.with_docker.is_open() {
            if push {
                return Err(EarthError::state("RUN --push not allowed in WITH DOCKER"));
            }
            let mut opt = self.with_docker.take_for_run()?;
            opt.mounts = mounts;
            opt.secrets = secrets;
            opt.with_shell = with_shell;
            opt.with_entrypoint = opts.flag("entrypoint");
            return self
                .builder
                .with_docker_run(self.ctx, &args, opt)
                .map_err(|e| EarthError::builder("with docker run", e));
        }

        let with_docker = opts.flag("with-docker");
        let run_opts = RunOpts {
            mounts,
            secrets,
            // --with-docker is the legacy spelling of a privileged WITH DOCKER.
            privileged: opts.flag("privileged") || with_docker,
            with_entrypoint: opts.flag("entrypoint"),
            with_docker,
            with_shell,
            push,
            with_ssh: opts.flag("ssh"),
        };
        self.builder
            .run(self.ctx, &args, &run_opts)
            .map_err(|e| EarthError::builder("run", e))?;
        if push {
            self.push_only = true;
        }
        Ok(())
    }

    pub(crate) fn apply_with_docker(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        if self.with_docker.is_open() {
            return Err(EarthError::state("cannot use WITH DOCKER within WITH DOCKER"));
        }
        let opts = OptionSet::new("WITH DOCKER")
            .list("compose")
            .list("service")
            .list("load")
            .string("platform")
            .list("build-arg")
            .list("pull")
            .parse(&stmt.words)?;
        if !opts.args().is_empty() {
            let args = opts.args();
            return Err(EarthError::arity(format!("invalid WITH DOCKER arguments {args:?}")));
        }
        let platform = self.platform(opts.string("platform"))?;
        let build_args = self.expand_all(opts.list("build-arg"), Expansion::Reference);

        let pulls = opts
            .list("pull")
            .iter()
            .map(|image| DockerPullOpt {
                image_name: self.expand(image, Expansion::Literal),
                platform: platform.clone(),
            })
            .collect();
        let loads = opts
            .list("load")
            .iter()
            .map(|load| {
                let (image_name, target) =
                    expand::parse_load(&self.expand(load, Expansion::Reference));
                DockerLoadOpt {
                    target,
                    image_name,
                    platform: platform.clone(),
                    build_args: build_args.clone(),
                }
            })
            .collect();

        let opt = WithDockerOpt {
            compose_files: self.expand_all(opts.list("compose"), Expansion::Literal),
            compose_services: self.expand_all(opts.list("service"), Expansion::Literal),
            loads,
            pulls,
            ..WithDockerOpt::default()
        };
        self.with_docker.open(opt)
    }

    pub(crate) fn apply_end(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        if !stmt.words.is_empty() {
            let text = &stmt.text;
            return Err(EarthError::arity(format!("END does not take any arguments: {text}")));
        }
        self.with_docker.close()
    }

    pub(crate) fn apply_cmd(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let (args, with_shell) = self.image_command(stmt);
        self.builder
            .cmd(self.ctx, &args, with_shell)
            .map_err(|e| EarthError::builder("cmd", e))
    }

    pub(crate) fn apply_entrypoint(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let (args, with_shell) = self.image_command(stmt);
        self.builder
            .entrypoint(self.ctx, &args, with_shell)
            .map_err(|e| EarthError::builder("entrypoint", e))
    }

    /// Exec-form words are expanded here; shell-form words are left to the
    /// image's shell.
    fn image_command(&self, stmt: Statement) -> (Vec<String>, bool) {
        if stmt.exec_mode {
            (self.expand_all(&stmt.words, Expansion::Literal), false)
        } else {
            (stmt.words, true)
        }
    }

    pub(crate) fn apply_healthcheck(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let opts = OptionSet::new("HEALTHCHECK")
            .duration("interval", DEFAULT_HEALTHCHECK_INTERVAL)
            .duration("timeout", DEFAULT_HEALTHCHECK_TIMEOUT)
            .duration("start-period", Duration::ZERO)
            .int("retries", DEFAULT_HEALTHCHECK_RETRIES)
            .parse(&stmt.words)?;
        let words = &stmt.words;
        let exec_form = || {
            let msg = bad_args("exec form not yet supported", "HEALTHCHECK CMD", words);
            EarthError::unsupported(msg)
        };
        let (is_none, cmd) = match opts.args() {
            [] => {
                let msg = bad_args("invalid number of arguments", "HEALTHCHECK", words);
                return Err(EarthError::arity(msg));
            }
            [none] if none == "NONE" => (true, Vec::new()),
            [cmd] if cmd == "CMD" => {
                let msg = bad_args("invalid number of arguments", "HEALTHCHECK CMD", words);
                return Err(EarthError::arity(msg));
            }
            [cmd, rest @ ..] if cmd == "CMD" => {
                if rest[0].starts_with('[') {
                    return Err(exec_form());
                }
                (false, self.expand_all(rest, Expansion::Literal))
            }
            [first, ..] if first.starts_with('[') => return Err(exec_form()),
            _ => {
                let msg = bad_args("invalid arguments", "HEALTHCHECK", words);
                return Err(EarthError::arity(msg));
            }
        };
        let hc = HealthcheckOpts {
            is_none,
            cmd,
            interval: opts.duration("interval"),
            timeout: opts.duration("timeout"),
            start_period: opts.duration("start-period"),
            retries: opts.int("retries"),
        };
        self.builder
            .healthcheck(self.ctx, &hc)
            .map_err(|e| EarthError::builder("healthcheck", e))
    }
}

/// `{problem} for {command}: {words:?}`
fn bad_args(problem: &str, command: &str, words: &[String]) -> String {
    format!("{problem} for {command}: {words:?}")
}
