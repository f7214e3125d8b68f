//! Earthfile interpreter: turns a parsed Earthfile into build graph calls.
//!
//! ```text
//! Earthfile → walk → Listener → option decoding → expansion → GraphBuilder
//! ```
//!
//! Only the statements of the requested target have effects. The first
//! error ends interpretation; no builder call follows it.

mod listener;
mod stmt_image;
mod stmt_meta;
mod stmt_run;
pub mod block;
pub mod builder;
pub mod config;
pub mod expand;
pub mod options;
pub mod target;
pub mod walk;

pub use builder::{
    Context, CopyOpts, DockerLoadOpt, DockerPullOpt, GraphBuilder, HealthcheckOpts, RunOpts,
    SaveImageOpts, WithDockerOpt,
};
pub use config::ListenerConfig;
pub use listener::Listener;
pub use walk::{walk, EarthfileListener};

use earthfile_types::ast::Earthfile;

/// Interprets `file`, applying the statements of `config.target` to
/// `builder` in document order.
pub fn interpret<B: GraphBuilder + ?Sized>(
    file: &Earthfile,
    builder: &mut B,
    ctx: &Context,
    config: &ListenerConfig,
) -> earthfile_types::Result<()> {
    log::debug!("interpreting target {}", config.target);
    let mut listener = Listener::new(builder, ctx, config);
    walk(file, &mut listener);
    listener.finish()
}
