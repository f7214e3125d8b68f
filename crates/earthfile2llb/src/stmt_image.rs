//! FROM, FROM DOCKERFILE, COPY, BUILD, GIT CLONE and the SAVE statements.

use earthfile_types::{Artifact, EarthError, Result};

use crate::builder::{CopyOpts, GraphBuilder, SaveImageOpts};
use crate::expand::Expansion;
use crate::listener::{Listener, Statement};
use crate::options::OptionSet;

impl<B: GraphBuilder + ?Sized> Listener<'_, B> {
    pub(crate) fn apply_from(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let opts = OptionSet::new("FROM")
            .list("build-arg")
            .string("platform")
            .parse(&stmt.words)?;
        match opts.args() {
            [_] => {}
            [_, alias, _] if alias == "AS" => {
                return Err(EarthError::unsupported(
                    "AS not supported, use earthly targets instead",
                ));
            }
            _ => {
                return Err(EarthError::arity(format!(
                    "invalid number of arguments for FROM: {:?}",
                    stmt.words
                )));
            }
        }
        let image = self.expand(&opts.args()[0], Expansion::Reference);
        let platform = self.platform(opts.string("platform"))?;
        let build_args = self.expand_all(opts.list("build-arg"), Expansion::Reference);
        self.builder
            .from(self.ctx, &image, platform.as_ref(), &build_args)
            .map_err(|e| EarthError::builder(format!("apply FROM {image}"), e))
    }

    pub(crate) fn apply_from_dockerfile(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let opts = OptionSet::new("FROM DOCKERFILE")
            .list("build-arg")
            .string("platform")
            .string("target")
            .string("f")
            .parse(&stmt.words)?;
        if opts.args().len() != 1 {
            return Err(EarthError::arity(format!(
                "invalid number of arguments for FROM DOCKERFILE: {:?}",
                stmt.words
            )));
        }
        if !opts.string("f").is_empty() {
            return Err(EarthError::unsupported(
                "FROM DOCKERFILE -f not supported; place the Dockerfile at the root of the build context",
            ));
        }
        let context = self.artifact_or_path(&opts.args()[0]).into_string();
        let build_args = self.expand_all(opts.list("build-arg"), Expansion::Reference);
        let platform = self.platform(opts.string("platform"))?;
        let df_target = self.expand(opts.string("target"), Expansion::Literal);
        self.builder
            .from_dockerfile(
                self.ctx,
                &context,
                "",
                &df_target,
                platform.as_ref(),
                &build_args,
            )
            .map_err(|e| EarthError::builder("from dockerfile", e))
    }

    pub(crate) fn apply_copy(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let opts = OptionSet::new("COPY")
            .string("from")
            .flag("dir")
            .string("chown")
            .flag("keep-ts")
            .flag("keep-own")
            .flag("if-exists")
            .string("platform")
            .list("build-arg")
            .parse(&stmt.words)?;
        let (dest, srcs) = match opts.args() {
            [srcs @ .., dest] if !srcs.is_empty() => (dest, srcs),
            _ => {
                let words = &stmt.words;
                return Err(EarthError::arity(format!("not enough COPY arguments {words:?}")));
            }
        };
        if !opts.string("from").is_empty() {
            return Err(EarthError::unsupported(
                "COPY --from not implemented. Use COPY artifacts form instead",
            ));
        }
        let dest = self.expand(dest, Expansion::Literal);
        let build_args = self.expand_all(opts.list("build-arg"), Expansion::Reference);
        let copy_opts = CopyOpts {
            is_dir: opts.flag("dir"),
            keep_ts: opts.flag("keep-ts"),
            keep_own: opts.flag("keep-own"),
            chown: self.expand(opts.string("chown"), Expansion::Literal),
        };
        let platform = self.platform(opts.string("platform"))?;

        let sources: Vec<Source> = srcs.iter().map(|s| self.artifact_or_path(s)).collect();
        let artifacts = sources.iter().filter(|s| s.is_artifact()).count();
        if artifacts != 0 && artifacts != sources.len() {
            let srcs: Vec<&str> = sources.iter().map(Source::as_str).collect();
            return Err(EarthError::conflict(format!(
                "combining artifacts and build context arguments in a single COPY command is not allowed: {srcs:?}"
            )));
        }
        let srcs: Vec<String> = sources.into_iter().map(Source::into_string).collect();

        if artifacts > 0 {
            for src in &srcs {
                self.builder
                    .copy_artifact(
                        self.ctx,
                        src,
                        &dest,
                        platform.as_ref(),
                        &build_args,
                        &copy_opts,
                        opts.flag("if-exists"),
                    )
                    .map_err(|e| EarthError::builder("copy artifact", e))?;
            }
            Ok(())
        } else {
            if !build_args.is_empty() {
                return Err(EarthError::conflict(format!(
                    "build args not supported for non +artifact arguments case {:?}",
                    stmt.words
                )));
            }
            self.builder
                .copy_classical(self.ctx, &srcs, &dest, &copy_opts)
                .map_err(|e| EarthError::builder("copy classical", e))
        }
    }

    pub(crate) fn apply_save_artifact(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let opts = OptionSet::new("SAVE ARTIFACT")
            .flag("keep-ts")
            .flag("keep-own")
            .flag("if-exists")
            .parse(&stmt.words)?;
        let invalid = || {
            EarthError::arity(format!(
                "invalid arguments for SAVE ARTIFACT command: {:?}",
                stmt.words
            ))
        };
        let (src, save_to, save_as_local) = match opts.args() {
            [] => {
                let msg = "no arguments provided to the SAVE ARTIFACT command";
                return Err(EarthError::arity(msg));
            }
            [src] => (src.as_str(), "./", ""),
            [src, dest] => (src.as_str(), dest.as_str(), ""),
            [src, as_, local, local_dest] if as_ == "AS" && local == "LOCAL" => {
                (src.as_str(), "./", local_dest.as_str())
            }
            [src, dest, as_, local, local_dest] if as_ == "AS" && local == "LOCAL" => {
                (src.as_str(), dest.as_str(), local_dest.as_str())
            }
            args if args.len() > 5 => {
                return Err(EarthError::arity(format!(
                    "too many arguments provided to the SAVE ARTIFACT command: {:?}",
                    stmt.words
                )));
            }
            _ => return Err(invalid()),
        };
        let src = self.expand(src, Expansion::Literal);
        let save_to = self.expand(save_to, Expansion::Literal);
        let save_as_local = self.expand(save_as_local, Expansion::Literal);
        self.builder
            .save_artifact(
                self.ctx,
                &src,
                &save_to,
                &save_as_local,
                opts.flag("keep-ts"),
                opts.flag("keep-own"),
                opts.flag("if-exists"),
            )
            .map_err(|e| EarthError::builder("apply SAVE ARTIFACT", e))
    }

    pub(crate) fn apply_save_image(&mut self, stmt: Statement) -> Result<()> {
        let opts = OptionSet::new("SAVE IMAGE")
            .flag("push")
            .flag("cache-hint")
            .flag("insecure")
            .list("cache-from")
            .parse(&stmt.words)?;
        let push = opts.flag("push");
        if !push {
            self.ensure_not_push_only(&stmt)?;
        }
        if push && opts.args().is_empty() {
            return Err(EarthError::arity(format!(
                "invalid number of arguments for SAVE IMAGE --push: {:?}",
                stmt.words
            )));
        }
        let save_opts = SaveImageOpts {
            push,
            insecure: opts.flag("insecure"),
            cache_hint: opts.flag("cache-hint"),
            cache_from: self.expand_all(opts.list("cache-from"), Expansion::Literal),
        };
        let image_names = self.expand_all(opts.args(), Expansion::Literal);
        if image_names.is_empty() && !save_opts.cache_hint && save_opts.cache_from.is_empty() {
            if self.config.warn_deprecations {
                log::warn!(
                    "Deprecation: using SAVE IMAGE with no arguments is no longer necessary and can be safely removed"
                );
            }
            return Ok(());
        }
        self.builder
            .save_image(self.ctx, &image_names, &save_opts)
            .map_err(|e| EarthError::builder("save image", e))?;
        if push {
            self.push_only = true;
        }
        Ok(())
    }

    pub(crate) fn apply_build(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let opts = OptionSet::new("BUILD")
            .list("platform")
            .list("build-arg")
            .parse(&stmt.words)?;
        if opts.args().len() != 1 {
            return Err(EarthError::arity(format!(
                "invalid number of arguments for BUILD: {:?}",
                stmt.words
            )));
        }
        let target = self.expand(&opts.args()[0], Expansion::Reference);
        let mut platforms = Vec::with_capacity(opts.list("platform").len());
        for raw in opts.list("platform") {
            platforms.push(self.platform(raw)?);
        }
        if platforms.is_empty() {
            platforms.push(None);
        }
        let build_args = self.expand_all(opts.list("build-arg"), Expansion::Reference);
        for platform in &platforms {
            self.builder
                .build(self.ctx, &target, platform.as_ref(), &build_args)
                .map_err(|e| EarthError::builder(format!("apply BUILD {target}"), e))?;
        }
        Ok(())
    }

    pub(crate) fn apply_git_clone(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let opts = OptionSet::new("GIT CLONE")
            .string("branch")
            .flag("keep-ts")
            .parse(&stmt.words)?;
        let [url, dest] = opts.args() else {
            return Err(EarthError::arity(format!(
                "invalid number of arguments for GIT CLONE: {:?}",
                stmt.words
            )));
        };
        let url = self.expand(url, Expansion::Literal);
        let dest = self.expand(dest, Expansion::Literal);
        let branch = self.expand(opts.string("branch"), Expansion::Literal);
        self.builder
            .git_clone(self.ctx, &url, &branch, &dest, opts.flag("keep-ts"))
            .map_err(|e| EarthError::builder("git clone", e))
    }

    /// Classifies a COPY source or FROM DOCKERFILE context.
    fn artifact_or_path(&self, word: &str) -> Source {
        match Artifact::parse(&self.expand(word, Expansion::Reference)) {
            Ok(artifact) => Source::Artifact(artifact.to_string()),
            Err(_) => Source::Path(self.expand(word, Expansion::Literal)),
        }
    }
}

/// An expanded COPY source.
enum Source {
    Artifact(String),
    Path(String),
}

impl Source {
    fn is_artifact(&self) -> bool {
        matches!(self, Self::Artifact(_))
    }

    fn as_str(&self) -> &str {
        match self {
            Self::Artifact(s) | Self::Path(s) => s,
        }
    }

    fn into_string(self) -> String {
        match self {
            Self::Artifact(s) | Self::Path(s) => s,
        }
    }
}
