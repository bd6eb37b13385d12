//! Build plan writer.
//!
//! Turns a validated [`Rapman`] into commands on the host build script:
//! test commands in declaration order, then optional registry staging with
//! a guaranteed trailing cleanup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::buildfile::{shell_quote, BuildScript};
use crate::config::{is_plain_name, NamedTest, Rapman};
use crate::error::Result;
use crate::materialize::{materialize, MaterializedTest};
use crate::scope::{new_build_id, CleanupScope, ScratchDir};

/// Diagnostic emitted when repository credentials are incomplete.
pub const MISSING_ARGUMENTS_DIAGNOSTIC: &str = r#"echo "Rapman: Missing argument(s)""#;

/// Plan writer progress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanState {
    NotStarted,
    TestsWritten,
    RepoSkipped,
    RepoStaged,
    Done,
}

/// Inputs for one plan invocation.
#[derive(Debug, Clone)]
pub struct PlanContext {
    /// Where per-test artifacts are written; `None` emits commands only.
    pub artifacts_root: Option<PathBuf>,
    /// Identifies this invocation; scopes the registry scratch directory.
    pub build_id: String,
}

impl PlanContext {
    pub fn new(build_id: impl Into<String>) -> Self {
        Self {
            artifacts_root: None,
            build_id: build_id.into(),
        }
    }

    pub fn with_artifacts_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.artifacts_root = Some(root.into());
        self
    }
}

impl Default for PlanContext {
    fn default() -> Self {
        Self::new(new_build_id())
    }
}

/// What a plan invocation did.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    /// Every state visited, starting at `NotStarted` and ending at `Done`.
    pub states: Vec<PlanState>,
    pub tests_written: usize,
    pub materialized: Vec<MaterializedTest>,
    /// Scratch directory staged for the registry repository, if any.
    pub scratch: Option<ScratchDir>,
}

impl PlanOutcome {
    pub fn final_state(&self) -> PlanState {
        self.states.last().copied().unwrap_or(PlanState::NotStarted)
    }

    pub fn repo_staged(&self) -> bool {
        self.states.contains(&PlanState::RepoStaged)
    }

    pub fn repo_skipped(&self) -> bool {
        self.states.contains(&PlanState::RepoSkipped)
    }
}

impl NamedTest {
    /// Echo the test name, then run its command. Disabled tests write nothing.
    pub fn write<B: BuildScript + ?Sized>(&self, script: &mut B) -> bool {
        if !self.enabled {
            return false;
        }
        let echo = if is_plain_name(&self.name) {
            format!("echo \"{}\"", self.name)
        } else {
            format!("echo {}", shell_quote(&self.name))
        };
        script.write_cmd(&echo);
        script.write_cmd(&self.command);
        true
    }
}

impl Rapman {
    /// Emit this configuration's build plan into `script`.
    ///
    /// The configuration is validated first, so nothing is written for an
    /// invalid one. Artifact write failures abort the plan; artifacts already
    /// written for earlier tests are left in place.
    pub fn write<B: BuildScript + ?Sized>(
        &self,
        script: &mut B,
        ctx: &PlanContext,
    ) -> Result<PlanOutcome> {
        self.validate()?;

        let mut outcome = PlanOutcome {
            states: vec![PlanState::NotStarted],
            tests_written: 0,
            materialized: Vec::new(),
            scratch: None,
        };

        info!(build_id = %ctx.build_id, tests = self.tests.len(), "writing build plan");

        for test in &self.tests {
            if !test.enabled {
                info!(test = %test.name, "skipping disabled test");
                continue;
            }
            if let Some(root) = &ctx.artifacts_root {
                outcome.materialized.push(materialize(root, test, self)?);
            }
            test.write(script);
            outcome.tests_written += 1;
        }
        outcome.states.push(PlanState::TestsWritten);

        if let Some(repo) = &self.repo {
            let missing = repo.missing_fields();
            if !missing.is_empty() {
                warn!(build_id = %ctx.build_id, ?missing, "registry repository incomplete, skipping staging");
                script.write_cmd_silent(MISSING_ARGUMENTS_DIAGNOSTIC);
                outcome.states.push(PlanState::RepoSkipped);
                outcome.states.push(PlanState::Done);
                return Ok(outcome);
            }

            let scratch = ScratchDir::for_build(&ctx.build_id);
            let mut scope = CleanupScope::new(script);
            scope.write_cmd(&scratch.clone_command(&repo.git_repo));
            scope.defer(scratch.remove_command());
            scope.close();

            info!(build_id = %ctx.build_id, scratch = %scratch.path().display(), "staged registry repository");
            outcome.scratch = Some(scratch);
            outcome.states.push(PlanState::RepoStaged);
        }

        outcome.states.push(PlanState::Done);
        Ok(outcome)
    }
}
