//! Scoped cleanup for commands emitted into a build script.
//!
//! A [`CleanupScope`] guarantees that every deferred command lands in the
//! script after everything written through the scope, in reverse order of
//! registration, on every exit path (explicit `close` or drop).

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::buildfile::{shell_quote, BuildScript};

const SCRATCH_PREFIX: &str = "rapman_registry_repo";

/// Append-through wrapper that holds a LIFO stack of cleanup commands.
pub struct CleanupScope<'a, B: BuildScript + ?Sized> {
    script: &'a mut B,
    deferred: Vec<String>,
}

impl<'a, B: BuildScript + ?Sized> CleanupScope<'a, B> {
    pub fn new(script: &'a mut B) -> Self {
        Self {
            script,
            deferred: Vec::new(),
        }
    }

    /// Register a command to run when the scope ends.
    pub fn defer(&mut self, command: impl Into<String>) {
        self.deferred.push(command.into());
    }

    pub fn pending(&self) -> usize {
        self.deferred.len()
    }

    /// Flush the deferred commands now.
    pub fn close(mut self) {
        self.flush();
    }

    fn flush(&mut self) {
        while let Some(cmd) = self.deferred.pop() {
            debug!(command = %cmd, "emitting deferred cleanup");
            self.script.write_cmd(&cmd);
        }
    }
}

impl<B: BuildScript + ?Sized> BuildScript for CleanupScope<'_, B> {
    fn write_cmd(&mut self, command: &str) {
        self.script.write_cmd(command);
    }

    fn write_cmd_silent(&mut self, command: &str) {
        self.script.write_cmd_silent(command);
    }
}

impl<B: BuildScript + ?Sized> Drop for CleanupScope<'_, B> {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Per-invocation scratch directory used for registry staging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Scratch path under the system temp root, unique per build id.
    pub fn for_build(build_id: &str) -> Self {
        Self::under(Path::new("/tmp"), build_id)
    }

    pub fn under(root: &Path, build_id: &str) -> Self {
        let id: String = build_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Self {
            path: root.join(format!("{SCRATCH_PREFIX}-{id}")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Shell-quoted path for embedding in commands.
    pub fn quoted(&self) -> String {
        shell_quote(&self.path.to_string_lossy())
    }

    /// Command that acquires the scratch dir by cloning `repo` into it.
    pub fn clone_command(&self, repo: &str) -> String {
        format!("git clone {} {}", shell_quote(repo), self.quoted())
    }

    /// Command that releases the scratch dir.
    pub fn remove_command(&self) -> String {
        format!("rm -rf {}", self.quoted())
    }
}

/// Fresh build identifier for invocations that were not given one.
pub fn new_build_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
