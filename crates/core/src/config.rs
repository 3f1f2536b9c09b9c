//! Settings and target membership loading.
//!
//! Target memberships live in a directory of `<family>.yaml` files, each a
//! mapping of identity to role. Settings are an optional TOML file; every
//! field has a default so an empty file is valid.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{IgnoreList, Identity, Membership, Role};

/// Enterprise-installed org admins that are automation, not people.
pub const DEFAULT_IGNORED_ADMINS: [&str; 3] = ["google-admin", "google-ospo-team", "googlebot"];

/// Extension of target membership files.
pub const TARGET_FILE_EXTENSION: &str = "yaml";

/// Run settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Organization owning every synced team.
    pub org: String,
    /// Org admins excluded from the maintainer override.
    pub ignored_admins: Vec<String>,
    /// Suffix appended to a family name for its main team.
    pub team_suffix: String,
    /// Suffix appended to a family name for its maintainers-only team.
    pub approvers_suffix: String,
    /// Upper bound on in-flight membership changes per team.
    pub max_concurrent_operations: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            org: "abcxyz".to_string(),
            ignored_admins: DEFAULT_IGNORED_ADMINS
                .iter()
                .map(ToString::to_string)
                .collect(),
            team_suffix: "-readability".to_string(),
            approvers_suffix: "-readability-approvers".to_string(),
            max_concurrent_operations: 4,
        }
    }
}

impl Settings {
    /// Load and validate settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).map_err(|e| Error::file_read_failed(path, e.to_string()))?;
        Self::parse(path, &contents)
    }

    /// Parse and validate settings from TOML text. `path` is only used for
    /// error messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn parse(path: &Path, contents: &str) -> Result<Self> {
        let settings: Self =
            toml::from_str(contents).map_err(|e| Error::toml_parse_failed(path, e.to_string()))?;
        settings.validate()
    }

    /// Check cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns an error when the org is empty, a suffix is empty, both
    /// suffixes are equal, or the concurrency bound is zero.
    pub fn validate(self) -> Result<Self> {
        if self.org.trim().is_empty() {
            return Err(Error::invalid_settings("org must not be empty"));
        }
        if self.team_suffix.is_empty() || self.approvers_suffix.is_empty() {
            return Err(Error::invalid_settings("team suffixes must not be empty"));
        }
        if self.team_suffix == self.approvers_suffix {
            return Err(Error::invalid_settings(
                "team_suffix and approvers_suffix must differ",
            ));
        }
        if self.max_concurrent_operations == 0 {
            return Err(Error::invalid_settings(
                "max_concurrent_operations must be at least 1",
            ));
        }
        Ok(self)
    }

    /// The ignore list built from `ignored_admins`.
    #[must_use]
    pub fn ignore_list(&self) -> IgnoreList {
        IgnoreList::new(self.ignored_admins.iter().map(String::as_str))
    }
}

/// Load every `<family>.yaml` file in `dir`, keyed by family name.
///
/// Subdirectories and files with other extensions are skipped.
///
/// # Errors
///
/// Returns an error if the directory or a file cannot be read, a file is not
/// a YAML mapping of strings, or a role value is not recognized.
pub fn load_target_dir(dir: &Path) -> Result<BTreeMap<String, Membership>> {
    let entries =
        fs::read_dir(dir).map_err(|e| Error::directory_read_failed(dir, e.to_string()))?;

    let mut families = BTreeMap::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::directory_read_failed(dir, e.to_string()))?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(TARGET_FILE_EXTENSION) {
            continue;
        }
        let Some(family) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };

        let contents =
            fs::read_to_string(&path).map_err(|e| Error::file_read_failed(&path, e.to_string()))?;
        let membership = parse_target(&path, &contents)?;
        debug!(family, members = membership.len(), "loaded target membership");
        families.insert(family.to_string(), membership);
    }

    debug!(families = ?families.keys().collect_vec(), "found target configs");
    Ok(families)
}

/// Parse one target file. `path` is only used for error messages.
///
/// # Errors
///
/// Returns an error if the text is not a YAML mapping of strings or a role
/// value is not recognized.
pub fn parse_target(path: &Path, contents: &str) -> Result<Membership> {
    if contents.trim().is_empty() {
        return Ok(Membership::new());
    }

    let raw: Option<BTreeMap<String, String>> = serde_yaml::from_str(contents)
        .map_err(|e| Error::yaml_parse_failed(path, e.to_string()))?;

    raw.unwrap_or_default()
        .into_iter()
        .map(|(identity, value)| {
            value
                .parse::<Role>()
                .map(|role| (Identity::new(identity.as_str()), role))
                .map_err(|_| Error::invalid_target_role(path, identity, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_parse_target() -> Result<()> {
        let membership = parse_target(
            Path::new("go.yaml"),
            "alice: maintainer\nbob: member\n",
        )?;
        assert_eq!(membership.get("alice"), Some(Role::Maintainer));
        assert_eq!(membership.get("bob"), Some(Role::Member));
        Ok(())
    }

    #[test]
    fn test_parse_target_rejects_unknown_role() {
        let result = parse_target(Path::new("go.yaml"), "alice: owner\n");
        assert!(matches!(
            result,
            Err(Error::InvalidTargetRole { ref identity, ref value, .. })
                if identity == "alice" && value == "owner"
        ));
    }

    #[test]
    fn test_parse_target_rejects_non_mapping() {
        let result = parse_target(Path::new("go.yaml"), "- alice\n- bob\n");
        assert!(matches!(result, Err(Error::YamlParseFailed { .. })));
    }

    #[test]
    fn test_parse_empty_target() -> Result<()> {
        assert!(parse_target(Path::new("go.yaml"), "")?.is_empty());
        assert!(parse_target(Path::new("go.yaml"), "  \n")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_target_dir_filters_entries() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("go.yaml"), "alice: maintainer\n")?;
        fs::write(dir.path().join("java.yaml"), "bob: member\n")?;
        fs::write(dir.path().join("README.md"), "not a target\n")?;
        fs::write(dir.path().join("python.yml"), "carol: member\n")?;
        fs::create_dir(dir.path().join("nested.yaml"))?;

        let families = load_target_dir(dir.path())?;
        assert_eq!(families.keys().collect_vec(), vec!["go", "java"]);
        assert_eq!(
            families.get("go").and_then(|m| m.get("alice")),
            Some(Role::Maintainer)
        );
        Ok(())
    }

    #[test]
    fn test_load_target_dir_missing() {
        let result = load_target_dir(&PathBuf::from("/nonexistent/rostersync/targets"));
        assert!(matches!(result, Err(Error::DirectoryReadFailed { .. })));
    }

    #[test]
    fn test_settings_defaults_from_empty_file() -> Result<()> {
        let settings = Settings::parse(Path::new("rostersync.toml"), "")?;
        assert_eq!(settings, Settings::default());
        assert!(settings.ignore_list().contains("googlebot"));
        Ok(())
    }

    #[test]
    fn test_settings_override() -> Result<()> {
        let settings = Settings::parse(
            Path::new("rostersync.toml"),
            "org = \"example\"\nignored_admins = [\"robot\"]\nmax_concurrent_operations = 1\n",
        )?;
        assert_eq!(settings.org, "example");
        assert!(settings.ignore_list().contains("robot"));
        assert!(!settings.ignore_list().contains("googlebot"));
        assert_eq!(settings.team_suffix, "-readability");
        Ok(())
    }

    #[test]
    fn test_settings_validation() {
        let path = Path::new("rostersync.toml");
        assert!(Settings::parse(path, "max_concurrent_operations = 0\n").is_err());
        assert!(Settings::parse(path, "team_suffix = \"-x\"\napprovers_suffix = \"-x\"\n").is_err());
        assert!(Settings::parse(path, "org = \" \"\n").is_err());
        assert!(matches!(
            Settings::parse(path, "unknown = 1\n"),
            Err(Error::TomlParseFailed { .. })
        ));
    }
}
