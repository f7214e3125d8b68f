//! Depth-first walk of an [`Earthfile`] emitting listener events.
//!
//! Events arrive strictly in document order, each exactly once:
//!
//! ```text
//! enter_stmts  (base block)
//!   enter_stmt, <argument events>, exit_stmt   (per statement)
//! exit_stmts
//! enter_target_header(name)                    (per target)
//!   enter_stmts ... exit_stmts
//! ```

use earthfile_types::ast::{Block, Command, Earthfile, Stmt, StmtArgs};

/// Callbacks for Earthfile parse-tree events. Every method defaults to a
/// no-op.
pub trait EarthfileListener {
    fn enter_target_header(&mut self, _name: &str) {}
    fn enter_stmts(&mut self) {}
    fn exit_stmts(&mut self) {}
    fn enter_stmt(&mut self) {}
    fn enter_stmt_word(&mut self, _word: &str) {}
    /// Offered after the words of statements that accept exec form.
    fn exit_stmt_words_maybe_json(&mut self, _text: &str) {}
    fn enter_env_arg_key(&mut self, _key: &str) {}
    fn enter_env_arg_value(&mut self, _value: &str) {}
    fn enter_label_key(&mut self, _key: &str) {}
    fn enter_label_value(&mut self, _value: &str) {}
    fn exit_stmt(&mut self, _command: Command, _text: &str) {}
}

pub fn walk<L: EarthfileListener + ?Sized>(file: &Earthfile, listener: &mut L) {
    if !file.base.is_empty() {
        walk_block(&file.base, listener);
    }
    for target in &file.targets {
        log::trace!("target header {} at {}", target.name, target.span);
        listener.enter_target_header(&target.name);
        walk_block(&target.body, listener);
    }
}

fn walk_block<L: EarthfileListener + ?Sized>(block: &Block, listener: &mut L) {
    listener.enter_stmts();
    for stmt in &block.stmts {
        walk_stmt(stmt, listener);
    }
    listener.exit_stmts();
}

fn walk_stmt<L: EarthfileListener + ?Sized>(stmt: &Stmt, listener: &mut L) {
    log::trace!("{} at {}", stmt.text, stmt.span);
    listener.enter_stmt();
    match &stmt.args {
        StmtArgs::Words(words) => {
            for word in words {
                listener.enter_stmt_word(word);
            }
        }
        StmtArgs::WordsMaybeJson(words) => {
            for word in words {
                listener.enter_stmt_word(word);
            }
            listener.exit_stmt_words_maybe_json(&words.join(" "));
        }
        StmtArgs::EnvArg { key, value } => {
            listener.enter_env_arg_key(key);
            if let Some(value) = value {
                listener.enter_env_arg_value(value);
            }
        }
        StmtArgs::Labels { keys, values } => {
            // The grammar interleaves pairs; uneven lists still emit every
            // key and value.
            let longest = keys.len().max(values.len());
            for i in 0..longest {
                if let Some(key) = keys.get(i) {
                    listener.enter_label_key(key);
                }
                if let Some(value) = values.get(i) {
                    listener.enter_label_value(value);
                }
            }
        }
    }
    listener.exit_stmt(stmt.command, &stmt.text);
}
