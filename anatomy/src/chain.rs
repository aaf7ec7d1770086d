//! Named bone chains and their resolution to world-space polylines

use glam::Vec3;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::report::BuildWarning;
use crate::skeleton::{Pose, Skeleton};

/// A named, ordered view over skeleton bones
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    pub name: String,
    pub bones: Vec<String>,
    /// Optional per-chain radii, used when a part declares none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radii: Option<Vec<f32>>,
    /// Optional named radius profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl Chain {
    pub fn new(name: &str, bones: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            bones: bones.iter().map(|b| b.to_string()).collect(),
            radii: None,
            profile: None,
        }
    }
}

/// Chains indexed by name, in declaration order
#[derive(Debug, Clone, Default)]
pub struct ChainSet {
    chains: Vec<Chain>,
    lookup: HashMap<String, usize>,
}

impl ChainSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chain, replacing any chain with the same name
    pub fn insert(&mut self, chain: Chain) {
        if let Some(&i) = self.lookup.get(&chain.name) {
            self.chains[i] = chain;
        } else {
            self.lookup.insert(chain.name.clone(), self.chains.len());
            self.chains.push(chain);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Chain> {
        self.lookup.get(name).map(|&i| &self.chains[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chain> {
        self.chains.iter()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl FromIterator<Chain> for ChainSet {
    fn from_iter<I: IntoIterator<Item = Chain>>(iter: I) -> Self {
        let mut set = ChainSet::new();
        for chain in iter {
            set.insert(chain);
        }
        set
    }
}

/// World-space control polyline of a chain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedChain {
    pub name: String,
    /// One world position per resolved bone
    pub points: Vec<Vec3>,
    /// Skeleton joint index per point
    pub joints: Vec<u16>,
    /// Bone names that were absent from the skeleton
    pub missing: Vec<String>,
}

impl ResolvedChain {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn root(&self) -> Option<Vec3> {
        self.points.first().copied()
    }

    pub fn tip(&self) -> Option<Vec3> {
        self.points.last().copied()
    }

    /// Warnings for every skipped bone
    pub fn warnings(&self) -> Vec<BuildWarning> {
        self.missing
            .iter()
            .map(|bone| BuildWarning::MissingBone {
                chain: self.name.clone(),
                bone: bone.clone(),
            })
            .collect()
    }

    /// Insert a joint ahead of the current root
    pub fn prepend(&mut self, point: Vec3, joint: u16) {
        self.points.insert(0, point);
        self.joints.insert(0, joint);
    }
}

/// Resolve a chain against a pose
///
/// Bones absent from the skeleton are skipped and recorded in
/// [`ResolvedChain::missing`]; the pose must be current.
pub fn resolve_chain(skeleton: &Skeleton, pose: &Pose, chain: &Chain) -> ResolvedChain {
    let mut resolved = ResolvedChain {
        name: chain.name.clone(),
        points: Vec::with_capacity(chain.bones.len()),
        joints: Vec::with_capacity(chain.bones.len()),
        missing: Vec::new(),
    };

    for bone in &chain.bones {
        match skeleton.index_of(bone) {
            Some(index) => {
                resolved.points.push(pose.world_position(index));
                resolved.joints.push(index as u16);
            }
            None => {
                tracing::debug!("chain '{}': bone '{}' not in skeleton, skipping", chain.name, bone);
                resolved.missing.push(bone.clone());
            }
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{resolve_world_transforms, BoneDef};

    fn skeleton() -> Skeleton {
        Skeleton::from_bones(&[
            BoneDef::new("a", None, [0.0, 0.0, 0.0]),
            BoneDef::new("b", Some("a"), [0.0, 0.0, 2.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_missing_bone_skipped() {
        let skeleton = skeleton();
        let pose = resolve_world_transforms(&skeleton);
        let chain = Chain::new("body", &["a", "missing", "b"]);
        let resolved = resolve_chain(&skeleton, &pose, &chain);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved.joints, vec![0, 1]);
        assert_eq!(resolved.points[1], Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(resolved.missing, vec!["missing".to_string()]);
        assert_eq!(resolved.warnings().len(), 1);
    }

    #[test]
    fn test_chain_set_replaces_by_name() {
        let mut set = ChainSet::new();
        set.insert(Chain::new("tail", &["a"]));
        set.insert(Chain::new("spine", &["a", "b"]));
        set.insert(Chain::new("tail", &["b"]));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("tail").unwrap().bones, vec!["b".to_string()]);
        assert_eq!(set.iter().next().unwrap().name, "tail");
    }
}
