//! Test fixtures for OTA job documents
//!
//! Job documents live under `tests/fixtures/jobs/`.

use std::path::{Path, PathBuf};

/// Path to a job document fixture
pub fn job_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/jobs")
        .join(name)
}

/// Version carried by `upgrade.json` and `notification.json`
pub const FIXTURE_VERSION: &str = "fw-3.1.4";

/// md5 carried by `upgrade.json` and `notification.json`
pub const FIXTURE_MD5: &str = "6b7e6c0a4f3b5e3d7c7c51f1a3e1d9b2";
