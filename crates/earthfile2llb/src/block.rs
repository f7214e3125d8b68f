//! WITH DOCKER ... END pairing.
//!
//! ```text
//! Idle --WITH DOCKER--> AwaitingRun --RUN--> RunDone --END--> Idle
//! ```
//!
//! Only one block may be open, it must contain exactly one RUN, and the
//! statement list must not end while it is open.

use std::mem;

use earthfile_types::{EarthError, Result};

use crate::builder::WithDockerOpt;

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    AwaitingRun(WithDockerOpt),
    RunDone,
}

#[derive(Debug, Default)]
pub struct WithDockerBlock {
    state: State,
}

impl WithDockerBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, State::Idle)
    }

    /// `WITH DOCKER`
    pub fn open(&mut self, opt: WithDockerOpt) -> Result<()> {
        if self.is_open() {
            return Err(EarthError::state("cannot use WITH DOCKER within WITH DOCKER"));
        }
        self.state = State::AwaitingRun(opt);
        Ok(())
    }

    /// Hands the collected configuration to the block's RUN.
    pub fn take_for_run(&mut self) -> Result<WithDockerOpt> {
        match mem::take(&mut self.state) {
            State::AwaitingRun(opt) => {
                self.state = State::RunDone;
                Ok(opt)
            }
            State::RunDone => {
                self.state = State::RunDone;
                Err(EarthError::state("only one RUN command allowed in WITH DOCKER"))
            }
            State::Idle => Err(EarthError::state("RUN is not inside a WITH DOCKER block")),
        }
    }

    /// `END`
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            State::Idle => {
                Err(EarthError::state("END can only be used to end a WITH DOCKER clause"))
            }
            State::AwaitingRun(_) => Err(EarthError::state("no RUN command found in WITH DOCKER")),
            State::RunDone => {
                self.state = State::Idle;
                Ok(())
            }
        }
    }

    /// End of a statement list.
    pub fn ensure_closed(&self) -> Result<()> {
        if self.is_open() {
            return Err(EarthError::state("no matching END found for WITH DOCKER"));
        }
        Ok(())
    }
}
