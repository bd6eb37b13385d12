//! Rapman Core
//!
//! Translates a declarative test/publish configuration into a build plan:
//! shell commands appended to the host build script, per-test sandbox
//! permission manifests, and container image definitions.
//!
//! # Modules
//!
//! - [`config`]      — `Rapman`, `RapmanRepo`, `NamedTest`; loading and validation
//! - [`condition`]   — run-gating `Condition` (returned to the host unevaluated)
//! - [`permissions`] — `SandboxPolicy` and `permissions.json` generation
//! - [`imagefile`]   — `ImageDefinition` for `SubuserImagefile[.base]`
//! - [`buildfile`]   — `BuildScript` trait and in-memory `Buildfile`
//! - [`scope`]       — `CleanupScope` and per-build `ScratchDir`
//! - [`materialize`] — per-test artifact writer
//! - [`plan`]        — `Rapman::write`, the build plan orchestrator

pub mod buildfile;
pub mod condition;
pub mod config;
pub mod error;
pub mod imagefile;
pub mod materialize;
pub mod permissions;
pub mod plan;
pub mod scope;
pub mod telemetry;

pub use buildfile::{shell_quote, BuildScript, Buildfile, ScriptLine};
pub use condition::Condition;
pub use config::{NamedTest, Rapman, RapmanRepo, TestSet, IMAGE_DIR};
pub use error::{ConfigError, RapmanError, Result};
pub use imagefile::{build_base_image, build_output_image, ImageDefinition};
pub use materialize::{
    materialize, MaterializedTest, WrittenArtifact, BASE_IMAGEFILE, IMAGEFILE, PERMISSIONS_FILE,
};
pub use permissions::{generate_permissions, PermissionManifest, PolicyOverrides, SandboxPolicy};
pub use plan::{PlanContext, PlanOutcome, PlanState, MISSING_ARGUMENTS_DIAGNOSTIC};
pub use scope::{new_build_id, CleanupScope, ScratchDir};
pub use telemetry::init_tracing;
