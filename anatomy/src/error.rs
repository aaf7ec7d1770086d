//! Error types
//!
//! Only structural problems are errors. Everything the pipeline can recover
//! from is reported as a [`BuildWarning`](crate::report::BuildWarning) instead.

use std::path::PathBuf;

/// Structural skeleton failure. Fatal: no world transform can be computed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkeletonError {
    #[error("skeleton has no bones")]
    Empty,

    #[error("duplicate bone name '{0}'")]
    DuplicateBone(String),

    #[error("dangling parent reference(s): {}", format_dangling(.0))]
    DanglingParent(Vec<(String, String)>),

    #[error("bone hierarchy contains a cycle through '{0}'")]
    Cycle(String),

    #[error("skeleton has {0} bones, but skin indices are limited to {max}", max = u16::MAX)]
    TooManyBones(usize),
}

fn format_dangling(refs: &[(String, String)]) -> String {
    refs.iter()
        .map(|(bone, parent)| format!("'{bone}' -> '{parent}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure while loading a blueprint document.
#[derive(Debug, thiserror::Error)]
pub enum BlueprintError {
    #[error("failed to read blueprint {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse blueprint: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure while writing an exported mesh.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize mesh: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Top-level error for assembling a creature from a blueprint.
#[derive(Debug, thiserror::Error)]
pub enum AnatomyError {
    #[error(transparent)]
    Skeleton(#[from] SkeletonError),

    #[error(transparent)]
    Blueprint(#[from] BlueprintError),
}
