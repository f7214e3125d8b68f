//! Image metadata statements: WORKDIR, USER, EXPOSE, VOLUME, ENV, ARG and
//! LABEL.

use std::collections::BTreeMap;

use earthfile_types::{EarthError, Result};

use crate::builder::GraphBuilder;
use crate::expand::Expansion;
use crate::listener::{Listener, Statement};

impl<B: GraphBuilder + ?Sized> Listener<'_, B> {
    pub(crate) fn apply_workdir(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let path = self.single_word(&stmt)?;
        self.builder
            .workdir(self.ctx, &path)
            .map_err(|e| EarthError::builder("workdir", e))
    }

    pub(crate) fn apply_user(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let user = self.single_word(&stmt)?;
        self.builder
            .user(self.ctx, &user)
            .map_err(|e| EarthError::builder("user", e))
    }

    pub(crate) fn apply_expose(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let ports = self.some_words(&stmt)?;
        self.builder
            .expose(self.ctx, &ports)
            .map_err(|e| EarthError::builder("expose", e))
    }

    pub(crate) fn apply_volume(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let volumes = self.some_words(&stmt)?;
        self.builder
            .volume(self.ctx, &volumes)
            .map_err(|e| EarthError::builder("volume", e))
    }

    pub(crate) fn apply_env(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let value = self.expand(&stmt.env_value, Expansion::Literal);
        self.builder
            .env(self.ctx, &stmt.env_key, &value)
            .map_err(|e| EarthError::builder("env", e))
    }

    /// ARG values may name targets, so markers stay escaped. ARGs in the
    /// base target are global.
    pub(crate) fn apply_arg(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let value = self.expand(&stmt.env_value, Expansion::Reference);
        let global = self.targets.in_base();
        self.builder
            .arg(self.ctx, &stmt.env_key, &value, global)
            .map_err(|e| EarthError::builder("arg", e))
    }

    pub(crate) fn apply_label(&mut self, stmt: Statement) -> Result<()> {
        self.ensure_not_push_only(&stmt)?;
        let text = &stmt.text;
        if stmt.label_keys.is_empty() {
            return Err(EarthError::arity(format!("no labels provided in LABEL command: {text}")));
        }
        if stmt.label_keys.len() != stmt.label_values.len() {
            return Err(EarthError::arity(format!("label keys and values do not match: {text}")));
        }
        let labels: BTreeMap<String, String> = stmt
            .label_keys
            .iter()
            .zip(&stmt.label_values)
            .map(|(k, v)| {
                (
                    self.expand(k, Expansion::Literal),
                    self.expand(v, Expansion::Literal),
                )
            })
            .collect();
        self.builder
            .label(self.ctx, &labels)
            .map_err(|e| EarthError::builder("label", e))
    }

    fn single_word(&self, stmt: &Statement) -> Result<String> {
        match stmt.words.as_slice() {
            [word] => Ok(self.expand(word, Expansion::Literal)),
            _ => Err(EarthError::arity(format!(
                "invalid number of arguments for {}: {}",
                stmt.command, stmt.text
            ))),
        }
    }

    fn some_words(&self, stmt: &Statement) -> Result<Vec<String>> {
        if stmt.words.is_empty() {
            return Err(EarthError::arity(format!(
                "no arguments provided to the {} command",
                stmt.command
            )));
        }
        Ok(self.expand_all(&stmt.words, Expansion::Literal))
    }
}
