//! Per-test artifact layout on disk.
//!
//! Layout under the artifact root:
//!
//! ```text
//! <root>/<test>/permissions.json
//! <root>/docker-file/SubuserImagefile.base
//! <root>/docker-file/SubuserImagefile
//! ```
//!
//! The image files are shared by every test of one configuration and are
//! rewritten with identical content for each test.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::{NamedTest, Rapman, IMAGE_DIR};
use crate::error::{RapmanError, Result};
use crate::imagefile::{build_base_image, build_output_image};
use crate::permissions::generate_permissions;

pub const PERMISSIONS_FILE: &str = "permissions.json";
pub const BASE_IMAGEFILE: &str = "SubuserImagefile.base";
pub const IMAGEFILE: &str = "SubuserImagefile";

/// One written file and the SHA-256 of its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    pub path: PathBuf,
    pub sha256: String,
}

/// Artifacts written for one test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedTest {
    pub test: String,
    pub permissions: WrittenArtifact,
    pub base_imagefile: WrittenArtifact,
    pub imagefile: WrittenArtifact,
}

/// Write the permission manifest and both image definitions for `test`.
pub fn materialize(repo_path: &Path, test: &NamedTest, cfg: &Rapman) -> Result<MaterializedTest> {
    let test_dir = repo_path.join(&test.name);
    create_dir(&test.name, &test_dir)?;

    let permissions = write_artifact(
        &test.name,
        &test_dir.join(PERMISSIONS_FILE),
        generate_permissions(test).as_bytes(),
    )?;

    let image_dir = repo_path.join(IMAGE_DIR);
    create_dir(&test.name, &image_dir)?;

    let base_imagefile = write_artifact(
        &test.name,
        &image_dir.join(BASE_IMAGEFILE),
        build_base_image(cfg).render().as_bytes(),
    )?;

    let imagefile = write_artifact(
        &test.name,
        &image_dir.join(IMAGEFILE),
        build_output_image(cfg).render().as_bytes(),
    )?;

    info!(test = %test.name, root = %repo_path.display(), "materialized test artifacts");

    Ok(MaterializedTest {
        test: test.name.clone(),
        permissions,
        base_imagefile,
        imagefile,
    })
}

fn create_dir(test: &str, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| RapmanError::Io {
        test: test.to_string(),
        path: dir.to_path_buf(),
        source,
    })
}

/// Write via a temp file in the target directory, then rename into place.
fn write_artifact(test: &str, path: &Path, data: &[u8]) -> Result<WrittenArtifact> {
    let io_err = |source: std::io::Error| RapmanError::Io {
        test: test.to_string(),
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(data).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    let sha256 = hex::encode(Sha256::digest(data));
    debug!(test = %test, path = %path.display(), sha256 = %sha256, "wrote artifact");

    Ok(WrittenArtifact {
        path: path.to_path_buf(),
        sha256,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PolicyOverrides;

    fn named(name: &str, command: &str) -> NamedTest {
        NamedTest {
            command: command.to_string(),
            name: name.to_string(),
            description: String::new(),
            enabled: true,
            permissions: PolicyOverrides::default(),
        }
    }

    fn config() -> Rapman {
        Rapman {
            base_image_name: "ubuntu".into(),
            image_name: Some("robobench/app".into()),
            env: vec!["FOO=1".into()],
            script: vec!["echo hi".into()],
            ..Default::default()
        }
    }

    #[test]
    fn writes_expected_layout() {
        let dir = tempfile::tempdir().unwrap();
        let out = materialize(dir.path(), &named("t1", "run.sh"), &config()).unwrap();

        assert_eq!(out.permissions.path, dir.path().join("t1").join(PERMISSIONS_FILE));
        assert_eq!(
            out.base_imagefile.path,
            dir.path().join(IMAGE_DIR).join(BASE_IMAGEFILE)
        );
        assert_eq!(out.imagefile.path, dir.path().join(IMAGE_DIR).join(IMAGEFILE));

        let base = fs::read_to_string(&out.base_imagefile.path).unwrap();
        assert_eq!(base, "FROM ubuntu\nENV FOO=1\nRUN echo hi\n");
        let image = fs::read_to_string(&out.imagefile.path).unwrap();
        assert_eq!(image, "FROM robobench/app\n");
    }

    #[test]
    fn digests_match_content() {
        let dir = tempfile::tempdir().unwrap();
        let out = materialize(dir.path(), &named("t1", "run.sh"), &config()).unwrap();
        let bytes = fs::read(&out.permissions.path).unwrap();
        assert_eq!(out.permissions.sha256, hex::encode(Sha256::digest(&bytes)));
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        materialize(dir.path(), &named("t1", "run.sh"), &config()).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path().join(IMAGE_DIR))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn unwritable_root_reports_test_and_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = materialize(&blocker, &named("t1", "run.sh"), &config()).unwrap_err();
        match err {
            RapmanError::Io { test, path, .. } => {
                assert_eq!(test, "t1");
                assert_eq!(path, blocker.join("t1"));
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
