//! Behavior controllers
//!
//! A controller animates a built creature by rotating joints between frames.
//! Controllers come from a [`BehaviorRegistry`] keyed by the blueprint's gait
//! name; an unknown key leaves the creature static.

use std::f32::consts::TAU;

use glam::Quat;
use hashbrown::HashMap;

use crate::chain::ChainSet;
use crate::skeleton::Skeleton;

/// Key that maps to no controller
pub const NO_BEHAVIOR: &str = "none";

pub trait BehaviorController: Send {
    /// Advance by `dt` seconds, writing joint local rotations
    fn update(&mut self, dt: f32, skeleton: &mut Skeleton);

    fn name(&self) -> &str;
}

type Factory = Box<dyn Fn(&Skeleton, &ChainSet) -> Box<dyn BehaviorController> + Send + Sync>;

/// Controller factories by key
pub struct BehaviorRegistry {
    factories: HashMap<String, Factory>,
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(IdleBreathing::KEY, |skeleton, chains| {
            Box::new(IdleBreathing::for_creature(skeleton, chains))
        });
        registry
    }
}

impl BehaviorRegistry {
    /// Registry without the built-in controllers
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, key: &str, factory: F)
    where
        F: Fn(&Skeleton, &ChainSet) -> Box<dyn BehaviorController> + Send + Sync + 'static,
    {
        self.factories.insert(key.to_string(), Box::new(factory));
    }

    pub fn contains(&self, key: &str) -> bool {
        key == NO_BEHAVIOR || self.factories.contains_key(key)
    }

    /// Every accepted key, `"none"` first, the rest sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys.insert(0, NO_BEHAVIOR);
        keys
    }

    /// Instantiate the controller for `key`
    ///
    /// `Ok(None)` for `"none"`, `Err(UnknownBehavior)` for an unregistered key.
    pub fn create(
        &self,
        key: &str,
        skeleton: &Skeleton,
        chains: &ChainSet,
    ) -> Result<Option<Box<dyn BehaviorController>>, UnknownBehavior> {
        if key == NO_BEHAVIOR {
            return Ok(None);
        }
        self.factories
            .get(key)
            .map(|factory| Some(factory(skeleton, chains)))
            .ok_or(UnknownBehavior)
    }
}

/// The requested behavior key is not registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownBehavior;

/// Slow pitch oscillation of the spine root
pub struct IdleBreathing {
    joint: usize,
    elapsed: f32,
    /// Peak rotation, radians
    pub amplitude: f32,
    /// Seconds per breath
    pub period: f32,
}

impl IdleBreathing {
    pub const KEY: &'static str = "idle_breathing";

    pub fn new(joint: usize) -> Self {
        Self {
            joint,
            elapsed: 0.0,
            amplitude: 0.03,
            period: 4.0,
        }
    }

    /// Drive the first bone of the `spine` chain, else the first root joint
    pub fn for_creature(skeleton: &Skeleton, chains: &ChainSet) -> Self {
        let joint = chains
            .get("spine")
            .and_then(|c| c.bones.iter().find_map(|b| skeleton.index_of(b)))
            .or_else(|| skeleton.roots().next())
            .unwrap_or(0);
        Self::new(joint)
    }

    pub fn joint(&self) -> usize {
        self.joint
    }
}

impl BehaviorController for IdleBreathing {
    fn update(&mut self, dt: f32, skeleton: &mut Skeleton) {
        if !dt.is_finite() || self.period <= 0.0 {
            return;
        }
        self.elapsed = (self.elapsed + dt) % self.period;
        let angle = self.amplitude * (TAU * self.elapsed / self.period).sin();
        if let Some(joint) = skeleton.joint_mut(self.joint) {
            joint.local_rotation = Quat::from_rotation_x(angle);
        }
    }

    fn name(&self) -> &str {
        Self::KEY
    }
}
