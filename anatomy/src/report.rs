//! Build diagnostics
//!
//! Recoverable conditions collected while assembling a creature. Each one is
//! also logged through `tracing` at the site where it happens.

use serde::Serialize;

/// A recoverable problem encountered during a build.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildWarning {
    #[error("chain '{chain}' references unknown bone '{bone}' (skipped)")]
    MissingBone { chain: String, bone: String },

    #[error("body part '{part}' references unknown chain '{chain}' (part skipped)")]
    UnknownChain { part: String, chain: String },

    #[error("body part '{part}' uses unknown generator '{generator}' (part skipped)")]
    UnknownGenerator { part: String, generator: String },

    #[error(
        "body part '{part}' resolved {resolved} point(s), needs {required}; using placeholder"
    )]
    InsufficientPoints {
        part: String,
        required: usize,
        resolved: usize,
    },

    #[error("body part '{part}' has invalid options ({message}); using defaults")]
    InvalidOptions { part: String, message: String },

    #[error("body part '{part}' option '{field}' = {value} clamped to {clamped}")]
    ClampedValue {
        part: String,
        field: String,
        value: f32,
        clamped: f32,
    },

    #[error("body part '{part}' found no root bone among {candidates:?}")]
    MissingRootBone {
        part: String,
        candidates: Vec<String>,
    },

    #[error("body part '{part}' uses unknown radius profile '{profile}'")]
    UnknownProfile { part: String, profile: String },

    #[error("isolated part '{part}' is not declared")]
    IsolatedPartNotFound { part: String },

    #[error("behavior '{key}' is not registered; creature is static")]
    UnknownBehavior { key: String },

    #[error("no body part produced geometry; emitted placeholder")]
    EmptyBuild,
}

impl BuildWarning {
    /// Log this warning through `tracing`.
    pub fn emit(&self) {
        tracing::warn!("{}", self);
    }
}

/// Per-part outcome of a build, kept as debug metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartSummary {
    pub name: String,
    pub generator: String,
    pub chain: String,
    pub vertex_count: usize,
    pub placeholder: bool,
}

/// Everything a build reported besides the mesh itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    pub parts: Vec<PartSummary>,
    pub warnings: Vec<BuildWarning>,
}

impl BuildReport {
    pub fn warn(&mut self, warning: BuildWarning) {
        warning.emit();
        self.warnings.push(warning);
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Names of parts that fell back to a placeholder primitive.
    pub fn placeholder_parts(&self) -> impl Iterator<Item = &str> {
        self.parts
            .iter()
            .filter(|p| p.placeholder)
            .map(|p| p.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_records_in_order() {
        let mut report = BuildReport::default();
        assert!(!report.has_warnings());
        report.warn(BuildWarning::EmptyBuild);
        report.warn(BuildWarning::UnknownBehavior { key: "hop".into() });
        assert_eq!(
            report.warnings,
            vec![
                BuildWarning::EmptyBuild,
                BuildWarning::UnknownBehavior { key: "hop".into() },
            ]
        );
    }

    #[test]
    fn test_placeholder_parts_filters_by_flag() {
        let summary = |name: &str, placeholder| PartSummary {
            name: name.into(),
            generator: "limb".into(),
            chain: name.into(),
            vertex_count: 0,
            placeholder,
        };
        let report = BuildReport {
            parts: vec![summary("legFL", false), summary("tail", true)],
            warnings: Vec::new(),
        };
        assert_eq!(report.placeholder_parts().collect::<Vec<_>>(), vec!["tail"]);
    }
}
