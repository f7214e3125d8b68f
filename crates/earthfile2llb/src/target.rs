//! Target selection.
//!
//! Only the requested target's statements have effects. Statements of
//! every other target are still walked, but never validated.

use earthfile_types::{EarthError, Result};

/// The pseudo-target formed by statements before the first header.
pub const BASE_TARGET: &str = "base";

const RESERVED_TARGETS: &[&str] = &[BASE_TARGET, "secrets"];

#[derive(Debug)]
pub struct TargetFilter {
    execute_target: String,
    current_target: String,
    found: bool,
}

impl TargetFilter {
    pub fn new(execute_target: impl Into<String>) -> Self {
        let execute_target = execute_target.into();
        Self {
            found: execute_target == BASE_TARGET,
            execute_target,
            current_target: BASE_TARGET.to_string(),
        }
    }

    /// Records a target header. Returns `true` when the header starts the
    /// requested target, which then inherits from `+base`.
    pub fn enter_header(&mut self, name: &str) -> Result<bool> {
        self.current_target = name.to_string();
        if RESERVED_TARGETS.contains(&name) {
            return Err(EarthError::state("target name cannot be \"base\" or \"secrets\""));
        }
        if !self.is_active() {
            return Ok(false);
        }
        if self.found {
            return Err(EarthError::state(format!("target {name} is declared twice")));
        }
        self.found = true;
        Ok(true)
    }

    pub fn is_active(&self) -> bool {
        self.current_target == self.execute_target
    }

    pub fn current(&self) -> &str {
        &self.current_target
    }

    /// ARGs declared in the base target are global.
    pub fn in_base(&self) -> bool {
        self.current_target == BASE_TARGET
    }

    /// Post-walk check that the requested target was declared.
    pub fn finish(&self) -> Result<()> {
        if self.found {
            Ok(())
        } else {
            Err(EarthError::TargetNotFound(self.execute_target.clone()))
        }
    }
}
