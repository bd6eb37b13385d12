//! Sandbox permission manifests for test executables.
//!
//! Every test runs inside a container governed by a `permissions.json`
//! manifest. The policy part of the manifest starts from [`SandboxPolicy`]
//! defaults and may be overridden per test through [`PolicyOverrides`].

use serde::{Deserialize, Serialize};

use crate::config::NamedTest;

/// Maintainer recorded in every generated manifest.
pub const MAINTAINER: &str = "robobench";

/// Sandbox options applied to a test container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SandboxPolicy {
    /// Directories (relative to `$HOME`) the program may read and write.
    pub user_dirs: Vec<String>,
    /// Allow the program to open X11 windows.
    pub x11: bool,
    pub access_working_directory: bool,
    pub allow_network_access: bool,
    /// Privileged access to `/dev`.
    pub privileged: bool,
    pub as_root: bool,
    /// Port mappings in `host:container` form.
    pub ports: Vec<String>,
    pub use_host_descriptor: bool,
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        Self {
            user_dirs: Vec::new(),
            x11: true,
            access_working_directory: false,
            allow_network_access: true,
            privileged: false,
            as_root: false,
            ports: vec!["8000:80".to_string()],
            use_host_descriptor: true,
        }
    }
}

impl SandboxPolicy {
    /// Apply per-test overrides on top of this policy.
    pub fn with_overrides(mut self, overrides: &PolicyOverrides) -> Self {
        if let Some(dirs) = &overrides.user_dirs {
            self.user_dirs = dirs.clone();
        }
        if let Some(v) = overrides.x11 {
            self.x11 = v;
        }
        if let Some(v) = overrides.access_working_directory {
            self.access_working_directory = v;
        }
        if let Some(v) = overrides.allow_network_access {
            self.allow_network_access = v;
        }
        if let Some(v) = overrides.privileged {
            self.privileged = v;
        }
        if let Some(v) = overrides.as_root {
            self.as_root = v;
        }
        if let Some(ports) = &overrides.ports {
            self.ports = ports.clone();
        }
        if let Some(v) = overrides.use_host_descriptor {
            self.use_host_descriptor = v;
        }
        self
    }
}

/// Optional per-test policy settings; unset fields keep the default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PolicyOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_dirs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x11: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_working_directory: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_network_access: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_root: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_host_descriptor: Option<bool>,
}

impl PolicyOverrides {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// The on-disk shape of `permissions.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionManifest {
    pub description: String,
    pub maintainer: String,
    /// Path to the executable within the image.
    pub executable: String,
    #[serde(flatten)]
    pub policy: SandboxPolicy,
}

impl PermissionManifest {
    pub fn for_test(test: &NamedTest) -> Self {
        Self {
            description: test.description.clone(),
            maintainer: MAINTAINER.to_string(),
            executable: test.command.clone(),
            policy: SandboxPolicy::default().with_overrides(&test.permissions),
        }
    }

    /// Render as pretty JSON with a trailing newline.
    pub fn render(&self) -> String {
        // Plain strings, bools and string lists cannot fail to serialize.
        let mut out = serde_json::to_string_pretty(self).unwrap_or_default();
        out.push('\n');
        out
    }
}

/// Produce the permission manifest text for a test.
pub fn generate_permissions(test: &NamedTest) -> String {
    PermissionManifest::for_test(test).render()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_case(command: &str) -> NamedTest {
        NamedTest {
            command: command.to_string(),
            name: "t1".to_string(),
            description: "smoke test".to_string(),
            enabled: true,
            permissions: PolicyOverrides::default(),
        }
    }

    #[test]
    fn defaults_match_fixed_constants() {
        let p = SandboxPolicy::default();
        assert!(p.user_dirs.is_empty());
        assert!(p.x11);
        assert!(!p.access_working_directory);
        assert!(p.allow_network_access);
        assert!(!p.privileged);
        assert!(!p.as_root);
        assert_eq!(p.ports, vec!["8000:80".to_string()]);
        assert!(p.use_host_descriptor);
    }

    #[test]
    fn manifest_carries_command_and_description() {
        let text = generate_permissions(&test_case("run.sh"));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["executable"], "run.sh");
        assert_eq!(value["description"], "smoke test");
        assert_eq!(value["maintainer"], MAINTAINER);
        assert_eq!(value["allow-network-access"], true);
        assert_eq!(value["use-host-descriptor"], true);
        assert_eq!(value["ports"][0], "8000:80");
    }

    #[test]
    fn manifest_key_order_is_stable() {
        let text = generate_permissions(&test_case("run.sh"));
        let desc = text.find("\"description\"").unwrap();
        let exe = text.find("\"executable\"").unwrap();
        let dirs = text.find("\"user-dirs\"").unwrap();
        let host = text.find("\"use-host-descriptor\"").unwrap();
        assert!(desc < exe && exe < dirs && dirs < host);
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn generation_is_deterministic() {
        let t = test_case("make check");
        assert_eq!(generate_permissions(&t), generate_permissions(&t));
    }

    #[test]
    fn overrides_replace_only_set_fields() {
        let mut t = test_case("run.sh");
        t.permissions = PolicyOverrides {
            allow_network_access: Some(false),
            ports: Some(vec![]),
            ..Default::default()
        };
        let manifest = PermissionManifest::for_test(&t);
        assert!(!manifest.policy.allow_network_access);
        assert!(manifest.policy.ports.is_empty());
        assert!(manifest.policy.x11);
    }

    #[test]
    fn command_with_quotes_is_escaped() {
        let text = generate_permissions(&test_case(r#"sh -c "echo hi""#));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["executable"], r#"sh -c "echo hi""#);
    }
}
