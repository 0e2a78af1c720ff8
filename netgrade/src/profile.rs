//! Assignment profiles: which checks count, and how much.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::checks::known_checks;
use crate::normalize::model::NormalizedConfig;

/// Assignment used when nothing else identifies one.
pub const DEFAULT_ASSIGNMENT: &str = "static";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssignmentProfile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Check name -> weight. Weights sum to 100.
    pub weights: BTreeMap<String, u32>,
}

impl AssignmentProfile {
    pub fn weight(&self, check: &str) -> u32 {
        self.weights.get(check).copied().unwrap_or(0)
    }
}

#[derive(Debug, Deserialize)]
struct ProfileFile {
    assignment: Vec<AssignmentProfile>,
}

#[derive(Debug, Error)]
pub enum ProfileLoadError {
    #[error("failed to read profiles file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse profiles file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("assignment '{name}' weights sum to {total}, expected 100")]
    WeightsNotHundred { name: String, total: u32 },
    #[error("assignment '{name}' weights unknown check '{check}'")]
    UnknownCheck { name: String, check: String },
    #[error("assignment '{0}' defined more than once")]
    Duplicate(String),
    #[error("unknown assignment type '{0}'")]
    UnknownAssignment(String),
}

/// A validated set of assignment profiles.
#[derive(Debug, Clone)]
pub struct ProfileSet {
    profiles: Vec<AssignmentProfile>,
}

impl ProfileSet {
    /// Profiles compiled into the binary.
    pub fn embedded() -> Result<Self, ProfileLoadError> {
        let raw = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/profiles/assignments.toml"
        ));
        Self::parse(raw, "embedded profiles".to_string())
    }

    pub fn load(path: &Path) -> Result<Self, ProfileLoadError> {
        let raw = fs::read_to_string(path).map_err(|source| ProfileLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw, path.display().to_string())
    }

    fn parse(raw: &str, path: String) -> Result<Self, ProfileLoadError> {
        let parsed: ProfileFile =
            toml::from_str(raw).map_err(|source| ProfileLoadError::Parse { path, source })?;

        let known = known_checks();
        let mut seen = BTreeSet::new();
        for profile in &parsed.assignment {
            if !seen.insert(profile.name.to_ascii_lowercase()) {
                return Err(ProfileLoadError::Duplicate(profile.name.clone()));
            }
            if let Some(check) = profile
                .weights
                .keys()
                .find(|check| !known.contains(&check.as_str()))
            {
                return Err(ProfileLoadError::UnknownCheck {
                    name: profile.name.clone(),
                    check: check.clone(),
                });
            }
            let total: u32 = profile.weights.values().sum();
            if total != 100 {
                return Err(ProfileLoadError::WeightsNotHundred {
                    name: profile.name.clone(),
                    total,
                });
            }
        }
        Ok(Self {
            profiles: parsed.assignment,
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|p| p.name.as_str())
    }

    pub fn get(&self, name: &str) -> Result<&AssignmentProfile, ProfileLoadError> {
        self.find(name)
            .ok_or_else(|| ProfileLoadError::UnknownAssignment(name.to_string()))
    }

    fn find(&self, name: &str) -> Option<&AssignmentProfile> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Pick the assignment for a grading run.
    ///
    /// An explicit name always wins. Otherwise the master archive file name
    /// is searched for a profile name, then the master configurations are
    /// inspected: access lists mean `acl`, static routes `static`, OSPF
    /// `ospf`. Falls back to [`DEFAULT_ASSIGNMENT`].
    pub fn detect<'a, I>(
        &self,
        explicit: Option<&str>,
        master_file: &str,
        masters: I,
    ) -> Result<&AssignmentProfile, ProfileLoadError>
    where
        I: IntoIterator<Item = &'a NormalizedConfig>,
    {
        if let Some(name) = explicit {
            return self.get(name);
        }

        let file = master_file.to_ascii_lowercase();
        if let Some(profile) = self
            .profiles
            .iter()
            .find(|p| file.contains(&p.name.to_ascii_lowercase()))
        {
            return Ok(profile);
        }

        let (mut acls, mut statics, mut ospf) = (false, false, false);
        for config in masters {
            acls |= !config.acls.is_empty();
            statics |= !config.static_routes.is_empty();
            ospf |= !config.ospf.is_empty();
        }
        let by_content = [("acl", acls), ("static", statics), ("ospf", ospf)]
            .into_iter()
            .filter(|(_, present)| *present)
            .find_map(|(name, _)| self.find(name));
        if let Some(profile) = by_content {
            return Ok(profile);
        }

        self.find(DEFAULT_ASSIGNMENT)
            .or_else(|| self.profiles.first())
            .ok_or_else(|| ProfileLoadError::UnknownAssignment(DEFAULT_ASSIGNMENT.to_string()))
    }
}
