//! Host build-script abstraction.
//!
//! The host runner owns an append-only command sequence. Rapman only ever
//! appends to it through [`BuildScript`]; it never reads lines back while
//! planning. [`Buildfile`] is the in-process implementation used by the CLI
//! and tests.

use serde::{Deserialize, Serialize};

/// Append-only sink for shell commands.
pub trait BuildScript {
    /// Append a command that is echoed to the build log before it runs.
    fn write_cmd(&mut self, command: &str);

    /// Append a command without echoing it.
    fn write_cmd_silent(&mut self, command: &str);
}

/// One emitted command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScriptLine {
    pub command: String,
    pub silent: bool,
}

/// Ordered, in-memory build script.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Buildfile {
    lines: Vec<ScriptLine>,
}

impl Buildfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[ScriptLine] {
        &self.lines
    }

    /// Commands in emission order, without the silent flag.
    pub fn commands(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.command.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render as a POSIX shell script body.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            if !line.silent {
                out.push_str("echo ");
                out.push_str(&shell_quote(&format!("$ {}", line.command)));
                out.push('\n');
            }
            out.push_str(&line.command);
            out.push('\n');
        }
        out
    }
}

impl BuildScript for Buildfile {
    fn write_cmd(&mut self, command: &str) {
        self.lines.push(ScriptLine {
            command: command.to_string(),
            silent: false,
        });
    }

    fn write_cmd_silent(&mut self, command: &str) {
        self.lines.push(ScriptLine {
            command: command.to_string(),
            silent: true,
        });
    }
}

/// Quote a string for a POSIX shell using single quotes.
pub fn shell_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}
