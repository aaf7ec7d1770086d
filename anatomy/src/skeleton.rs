//! Skeleton construction and pose resolution
//!
//! A [`Skeleton`] is built once from a flat bone list. World transforms are
//! never cached on joints: [`resolve_world_transforms`] computes a [`Pose`]
//! that is threaded explicitly into chain resolution.

use glam::{Mat4, Quat, Vec3};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::SkeletonError;

/// One entry of a blueprint's flat bone list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneDef {
    pub name: String,
    /// Parent bone name; `None` or empty for a root
    #[serde(default)]
    pub parent: Option<String>,
    /// Offset from the parent joint
    pub position: [f32; 3],
}

impl BoneDef {
    pub fn new(name: &str, parent: Option<&str>, position: [f32; 3]) -> Self {
        Self {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            position,
        }
    }

    fn parent_name(&self) -> Option<&str> {
        self.parent.as_deref().filter(|p| !p.is_empty())
    }
}

/// A named node in the joint tree
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub local_position: Vec3,
    /// Only behavior controllers change this between frames
    pub local_rotation: Quat,
}

impl Joint {
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.local_rotation, self.local_position)
    }
}

/// Joint tree with a name lookup and a fixed joint order
///
/// Joint order equals bone declaration order and is the skin-index order.
#[derive(Debug, Clone)]
pub struct Skeleton {
    joints: Vec<Joint>,
    lookup: HashMap<String, usize>,
    /// Parents before children
    eval_order: Vec<usize>,
}

impl Skeleton {
    /// Build from a flat bone list
    ///
    /// Parents may be declared after their children. Every parent name must
    /// exist; all dangling references are reported together.
    pub fn from_bones(bones: &[BoneDef]) -> Result<Self, SkeletonError> {
        Self::from_bones_scaled(bones, 1.0)
    }

    /// Build from a flat bone list with every offset multiplied by `scale`
    pub fn from_bones_scaled(bones: &[BoneDef], scale: f32) -> Result<Self, SkeletonError> {
        if bones.is_empty() {
            return Err(SkeletonError::Empty);
        }
        if bones.len() > u16::MAX as usize {
            return Err(SkeletonError::TooManyBones(bones.len()));
        }

        let mut lookup = HashMap::with_capacity(bones.len());
        for (i, bone) in bones.iter().enumerate() {
            if lookup.insert(bone.name.clone(), i).is_some() {
                return Err(SkeletonError::DuplicateBone(bone.name.clone()));
            }
        }

        let mut dangling = Vec::new();
        let mut joints: Vec<Joint> = bones
            .iter()
            .map(|bone| {
                let parent = bone.parent_name().and_then(|p| {
                    let found = lookup.get(p).copied();
                    if found.is_none() {
                        dangling.push((bone.name.clone(), p.to_string()));
                    }
                    found
                });
                Joint {
                    name: bone.name.clone(),
                    parent,
                    children: Vec::new(),
                    local_position: Vec3::from(bone.position) * scale,
                    local_rotation: Quat::IDENTITY,
                }
            })
            .collect();

        if !dangling.is_empty() {
            return Err(SkeletonError::DanglingParent(dangling));
        }

        for i in 0..joints.len() {
            if let Some(p) = joints[i].parent {
                joints[p].children.push(i);
            }
        }

        let eval_order = evaluation_order(&joints)?;

        Ok(Self {
            joints,
            lookup,
            eval_order,
        })
    }

    /// Look up a joint by name
    pub fn resolve(&self, name: &str) -> Option<&Joint> {
        self.index_of(name).map(|i| &self.joints[i])
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    /// All joints in skin-index order
    pub fn all_joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    /// Mutable access for behavior controllers
    pub fn joint_mut(&mut self, index: usize) -> Option<&mut Joint> {
        self.joints.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joint_names(&self) -> Vec<String> {
        self.joints.iter().map(|j| j.name.clone()).collect()
    }

    pub fn parent_indices(&self) -> Vec<Option<usize>> {
        self.joints.iter().map(|j| j.parent).collect()
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.joints
            .iter()
            .enumerate()
            .filter(|(_, j)| j.parent.is_none())
            .map(|(i, _)| i)
    }
}

/// Topological order (parents first); fails on cycles
fn evaluation_order(joints: &[Joint]) -> Result<Vec<usize>, SkeletonError> {
    let mut order = Vec::with_capacity(joints.len());
    let mut stack: Vec<usize> = joints
        .iter()
        .enumerate()
        .filter(|(_, j)| j.parent.is_none())
        .map(|(i, _)| i)
        .rev()
        .collect();

    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(joints[i].children.iter().rev().copied());
    }

    if order.len() != joints.len() {
        // Anything unreachable from a root sits on a parent cycle
        let mut reached = vec![false; joints.len()];
        for &i in &order {
            reached[i] = true;
        }
        let culprit = reached.iter().position(|r| !r).unwrap_or(0);
        return Err(SkeletonError::Cycle(joints[culprit].name.clone()));
    }

    Ok(order)
}

/// World matrices for every joint of one skeleton state
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    world: Vec<Mat4>,
}

impl Pose {
    pub fn world_matrix(&self, joint: usize) -> Mat4 {
        self.world.get(joint).copied().unwrap_or(Mat4::IDENTITY)
    }

    pub fn world_position(&self, joint: usize) -> Vec3 {
        self.world_matrix(joint).w_axis.truncate()
    }

    pub fn len(&self) -> usize {
        self.world.len()
    }

    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }

    /// Inverse bind matrices (column-major) treating this pose as bind pose
    pub fn inverse_bind_matrices(&self) -> Vec<[f32; 16]> {
        self.world
            .iter()
            .map(|m| m.inverse().to_cols_array())
            .collect()
    }
}

/// Resolve world transforms for the skeleton's current local state
pub fn resolve_world_transforms(skeleton: &Skeleton) -> Pose {
    let mut world = vec![Mat4::IDENTITY; skeleton.joints.len()];
    for &i in &skeleton.eval_order {
        let joint = &skeleton.joints[i];
        let local = joint.local_matrix();
        world[i] = match joint.parent {
            Some(p) => world[p] * local,
            None => local,
        };
    }
    Pose { world }
}
