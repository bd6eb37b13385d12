//! Container image definitions (`SubuserImagefile`).

use serde::{Deserialize, Serialize};

use crate::config::Rapman;

/// An ordered image definition: base image, environment, then build commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageDefinition {
    pub from: String,
    pub env: Vec<String>,
    pub commands: Vec<String>,
}

impl ImageDefinition {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            env: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Declare an environment entry (`KEY=value`).
    pub fn write_env(&mut self, decl: impl Into<String>) {
        self.env.push(decl.into());
    }

    /// Append a build command.
    pub fn write_cmd(&mut self, cmd: impl Into<String>) {
        self.commands.push(cmd.into());
    }

    /// Serialize to imagefile text. Environment always precedes commands.
    pub fn render(&self) -> String {
        let mut out = format!("FROM {}\n", self.from);
        for decl in &self.env {
            out.push_str("ENV ");
            out.push_str(decl);
            out.push('\n');
        }
        for cmd in &self.commands {
            out.push_str("RUN ");
            out.push_str(cmd);
            out.push('\n');
        }
        out
    }
}

/// Base image: `base_image`, then `build_environment`, then `build_script`.
pub fn build_base_image(cfg: &Rapman) -> ImageDefinition {
    let mut image = ImageDefinition::new(cfg.base_image_name.clone());
    for decl in &cfg.env {
        image.write_env(decl.clone());
    }
    for cmd in &cfg.script {
        image.write_cmd(cmd.clone());
    }
    image
}

/// Output image: rooted at `docker_image`, or at `base_image` when unset.
pub fn build_output_image(cfg: &Rapman) -> ImageDefinition {
    let from = cfg
        .image_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(&cfg.base_image_name);
    ImageDefinition::new(from)
}
