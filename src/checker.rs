// Copyright 2025 Cowboy AI, LLC.

//! External URDF validation
//!
//! The engine does not validate joint graphs itself; it shells out to
//! the standard `check_urdf` tool. [`ValidationPolicy`] decides when the
//! load and write entry points run the checker; [`check_urdf`] can always
//! be called directly.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// When engine entry points run the external checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationPolicy {
    /// Validate on load and after every write.
    Always,
    /// Never validate.
    Never,
    /// Validate only when [`check_urdf`] is called directly.
    OnDemand,
}

impl ValidationPolicy {
    /// Whether load and write entry points should invoke the checker.
    pub fn should_check(&self) -> bool {
        matches!(self, ValidationPolicy::Always)
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        ValidationPolicy::Always
    }
}

/// Checker configuration carried by load and write entry points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// When the checker runs.
    pub policy: ValidationPolicy,
    /// Checker executable to invoke.
    pub command: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            policy: ValidationPolicy::default(),
            command: "check_urdf".to_string(),
        }
    }
}

impl CheckerConfig {
    /// Configuration that never runs the checker.
    pub fn disabled() -> Self {
        Self {
            policy: ValidationPolicy::Never,
            ..Self::default()
        }
    }
}

/// Failures from the external checker.
#[derive(Debug, Error)]
pub enum CheckUrdfError {
    /// The checker executable could not be run at all.
    #[error("could not run URDF checker `{command}`: {source}")]
    Unavailable {
        /// Executable that was invoked.
        command: String,
        /// Underlying launch failure.
        #[source]
        source: std::io::Error,
    },
    /// The checker ran and rejected the document.
    #[error("URDF checker `{command}` rejected {}: {detail}", .path.display())]
    Rejected {
        /// Executable that was invoked.
        command: String,
        /// File that failed validation.
        path: PathBuf,
        /// Checker output.
        detail: String,
    },
}

/// Run the external checker against a file on disk.
pub fn check_urdf(path: impl AsRef<Path>, config: &CheckerConfig) -> Result<(), CheckUrdfError> {
    let path = path.as_ref();
    debug!(command = %config.command, path = %path.display(), "running external URDF checker");
    let output = Command::new(&config.command)
        .arg(path)
        .output()
        .map_err(|source| CheckUrdfError::Unavailable {
            command: config.command.clone(),
            source,
        })?;
    if output.status.success() {
        return Ok(());
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut detail = stdout.trim().to_string();
    if !stderr.trim().is_empty() {
        if !detail.is_empty() {
            detail.push_str("; ");
        }
        detail.push_str(stderr.trim());
    }
    if detail.is_empty() {
        detail = format!("exit status {}", output.status);
    }
    Err(CheckUrdfError::Rejected {
        command: config.command.clone(),
        path: path.to_path_buf(),
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test the default configuration validates with check_urdf
    #[test]
    fn test_default_config() {
        let config = CheckerConfig::default();
        assert_eq!(config.policy, ValidationPolicy::Always);
        assert_eq!(config.command, "check_urdf");
        assert!(config.policy.should_check());
    }

    /// Test disabled and on-demand policies skip engine-driven checks
    #[test]
    fn test_non_checking_policies() {
        assert!(!CheckerConfig::disabled().policy.should_check());
        assert!(!ValidationPolicy::OnDemand.should_check());
        assert!(!ValidationPolicy::Never.should_check());
    }

    /// Test a missing checker executable reports as unavailable
    #[test]
    fn test_missing_checker_binary() {
        let config = CheckerConfig {
            command: "urdf-checker-that-does-not-exist".to_string(),
            ..CheckerConfig::default()
        };
        let err = check_urdf(Path::new("ignored.urdf"), &config).unwrap_err();
        assert!(matches!(err, CheckUrdfError::Unavailable { .. }));
        assert!(err.to_string().contains("urdf-checker-that-does-not-exist"));
    }

    /// Test a failing checker run reports the exit status
    #[test]
    fn test_rejected_document() {
        // `false` exits non-zero without output on any POSIX system.
        let config = CheckerConfig {
            command: "false".to_string(),
            ..CheckerConfig::default()
        };
        let err = check_urdf(Path::new("whatever.urdf"), &config).unwrap_err();
        match err {
            CheckUrdfError::Rejected { detail, .. } => assert!(detail.contains("exit status")),
            other => panic!("expected Rejected, got {other}"),
        }
    }
}
