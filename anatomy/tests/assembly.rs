//! End-to-end creature builds

use std::path::PathBuf;

use creature_anatomy::blueprint::Sizes;
use creature_anatomy::{
    BehaviorController, BehaviorRegistry, BodyPartDecl, BoneDef, BuildWarning, Chain, ChainSet,
    CreatureAssembler, SkeletonError, SpeciesBlueprint, validate_blueprint,
};
use glam::{Quat, Vec3};
use serde_json::json;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn quadruped_skeleton() -> creature_anatomy::Skeleton {
    creature_anatomy::Skeleton::from_bones(&[
        BoneDef::new("spine_base", None, [0.0, 1.0, 0.0]),
        BoneDef::new("spine_mid", Some("spine_base"), [0.0, 0.0, 1.0]),
        BoneDef::new("spine_neck", Some("spine_mid"), [0.0, 0.0, 1.0]),
        BoneDef::new("head", Some("spine_neck"), [0.0, 0.3, 0.6]),
    ])
    .expect("valid skeleton")
}

fn quadruped_chains() -> ChainSet {
    [
        Chain::new("spine", &["spine_base", "spine_mid", "spine_neck"]),
        Chain::new("head", &["head"]),
    ]
    .into_iter()
    .collect()
}

fn quadruped_parts() -> Vec<BodyPartDecl> {
    vec![
        BodyPartDecl::new("torso", "torso", "spine", json!({ "radii": [1.0, 1.2, 0.8] })),
        BodyPartDecl::new("head", "head", "head", json!({ "radius": 0.6 })),
    ]
}

fn assert_attributes_uniform(mesh: &creature_anatomy::CreatureMesh) {
    let g = &mesh.geometry;
    let n = g.vertex_count();
    assert_eq!(g.normals.len(), n);
    assert_eq!(g.uvs.len(), n);
    assert_eq!(g.skin_indices.len(), n);
    assert_eq!(g.skin_weights.len(), n);
    assert!(g.indices.is_empty());
    assert_eq!(n % 3, 0);
    for i in 0..n {
        assert!(g.positions[i].iter().all(|c| c.is_finite()));
        assert!(g.normals[i].iter().all(|c| c.is_finite()));
        let sum: f32 = g.skin_weights[i].iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "vertex {i} weight sum {sum}");
        for (joint, weight) in g.skin_indices[i].iter().zip(&g.skin_weights[i]) {
            if *weight > 0.0 {
                assert!((*joint as usize) < mesh.joint_count());
            }
        }
    }
}

#[test]
fn minimal_quadruped_builds_without_warnings() {
    let creature =
        CreatureAssembler::new().build(quadruped_skeleton(), &quadruped_parts(), &quadruped_chains());

    assert!(creature.mesh.vertex_count() > 0);
    assert!(!creature.mesh.placeholder);
    assert!(creature.report.warnings.is_empty(), "{:?}", creature.report.warnings);
    assert_eq!(creature.report.parts.len(), 2);
    assert!(creature.report.parts.iter().all(|p| !p.placeholder));
    assert_eq!(
        creature.mesh.joint_names,
        vec!["spine_base", "spine_mid", "spine_neck", "head"]
    );
    assert_attributes_uniform(&creature.mesh);

    // The head part is skinned to the head joint only
    let head = creature.mesh.part("head").expect("head range");
    for i in head.start..head.start + head.count {
        assert_eq!(creature.mesh.geometry.skin_indices[i][0], 3);
        assert_eq!(creature.mesh.geometry.skin_weights[i][0], 1.0);
    }
}

#[test]
fn unknown_generator_is_skipped_with_one_warning() {
    let assembler = CreatureAssembler::new();
    let baseline = assembler.build(quadruped_skeleton(), &quadruped_parts(), &quadruped_chains());

    let mut parts = quadruped_parts();
    parts.push(BodyPartDecl::new("mystery", "unknownThing", "spine", json!({})));
    let creature = assembler.build(quadruped_skeleton(), &parts, &quadruped_chains());

    assert_eq!(creature.mesh.geometry, baseline.mesh.geometry);
    assert_eq!(
        creature.report.warnings,
        vec![BuildWarning::UnknownGenerator {
            part: "mystery".into(),
            generator: "unknownThing".into(),
        }]
    );
}

#[test]
fn missing_chain_bone_gives_shorter_tube() {
    let skeleton = creature_anatomy::Skeleton::from_bones(&[
        BoneDef::new("a", None, [0.0, 0.0, 0.0]),
        BoneDef::new("b", Some("a"), [0.0, 0.0, 2.0]),
    ])
    .unwrap();
    let chains: ChainSet = [Chain::new("body", &["a", "missing", "b"])].into_iter().collect();
    let parts = [BodyPartDecl::new(
        "body",
        "limb",
        "body",
        json!({ "sides": 6, "capEnd": false }),
    )];
    let creature = CreatureAssembler::new().build(skeleton, &parts, &chains);

    assert_eq!(
        creature.report.warnings,
        vec![BuildWarning::MissingBone {
            chain: "body".into(),
            bone: "missing".into(),
        }]
    );
    assert!(!creature.report.parts[0].placeholder);
    // Two rings of six, one quad strip: 12 triangles
    assert_eq!(creature.mesh.triangle_count(), 12);
    assert_attributes_uniform(&creature.mesh);
}

#[test]
fn insufficient_points_fall_back_to_placeholder() {
    let mut chains = quadruped_chains();
    chains.insert(Chain::new("stub", &["spine_base", "ghost"]));
    let mut parts = quadruped_parts();
    parts.push(BodyPartDecl::new("tail", "tail", "stub", json!(null)));

    let creature = CreatureAssembler::new().build(quadruped_skeleton(), &parts, &chains);
    let placeholders: Vec<&str> = creature.report.placeholder_parts().collect();
    assert_eq!(placeholders, vec!["tail"]);
    assert!(creature.report.warnings.iter().any(|w| matches!(
        w,
        BuildWarning::InsufficientPoints { part, required: 2, resolved: 1 } if part == "tail"
    )));
    assert!(creature.mesh.part("tail").is_some());
}

#[test]
fn rump_extension_widens_first_ring() {
    let skeleton = || {
        creature_anatomy::Skeleton::from_bones(&[
            BoneDef::new("hips", None, [0.0, 2.0, 0.0]),
            BoneDef::new("chest", Some("hips"), [0.0, 0.0, 2.0]),
            BoneDef::new("back_leg", Some("hips"), [0.5, -1.5, 0.0]),
        ])
        .unwrap()
    };
    let chains: ChainSet = [Chain::new("spine", &["hips", "chest"])].into_iter().collect();
    let first_ring_radius = |options: serde_json::Value| {
        let parts = [BodyPartDecl::new("torso", "torso", "spine", options)];
        let creature = CreatureAssembler::new().build(skeleton(), &parts, &chains);
        let hips = Vec3::new(0.0, 2.0, 0.0);
        creature
            .mesh
            .geometry
            .positions
            .iter()
            .map(|p| Vec3::from(*p))
            .filter(|p| p.z.abs() < 1e-4)
            .map(|p| p.distance(hips))
            .fold(0.0f32, f32::max)
    };

    let plain = first_ring_radius(json!({ "radii": [0.5, 0.5], "sides": 8 }));
    let extended = first_ring_radius(json!({
        "radii": [0.5, 0.5],
        "sides": 8,
        "extendRumpToRearLegs": { "bones": ["back_leg"], "extraMargin": 0.1 }
    }));
    assert!((plain - 0.5).abs() < 1e-4);
    assert!(extended > plain);
}

#[test]
fn elephant_fixture_builds_cleanly() {
    let blueprint = SpeciesBlueprint::load(fixture("elephant.json")).expect("fixture loads");
    let assembler = CreatureAssembler::new();

    let known = assembler.registry().keys();
    assert!(validate_blueprint(&blueprint, &known).is_empty());

    let mut creature = assembler.build_blueprint(&blueprint).expect("builds");
    assert!(creature.report.warnings.is_empty(), "{:?}", creature.report.warnings);
    assert_eq!(creature.report.parts.len(), 13);
    assert_eq!(creature.mesh.name, "Elephant");
    assert_eq!(
        creature.mesh.material.as_ref().and_then(|m| m.color.as_deref()),
        Some("#8a8580")
    );
    assert_attributes_uniform(&creature.mesh);

    let names: Vec<&str> = creature.mesh.part_ranges.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names[0], "torso");
    assert_eq!(&names[11..], ["tuskLeft", "tuskRight"]);

    // Ears fan out symmetrically
    let bounds_of = |part: &str| {
        let range = creature.mesh.part(part).unwrap();
        let positions = &creature.mesh.geometry.positions[range.start..range.start + range.count];
        positions.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])))
    };
    let (left_min, left_max) = bounds_of("earLeft");
    let (right_min, right_max) = bounds_of("earRight");
    assert!((left_max + right_min).abs() < 1e-3);
    assert!((left_min + right_max).abs() < 1e-3);

    let controller = creature.controller.as_ref().expect("idle breathing controller");
    assert_eq!(controller.name(), "idle_breathing");
    let before = creature.pose.world_matrix(1);
    creature.update(1.0);
    assert_ne!(creature.pose.world_matrix(1), before);
}

#[test]
fn isolate_part_from_blueprint() {
    let mut blueprint = SpeciesBlueprint::load(fixture("elephant.json")).unwrap();
    blueprint.debug.isolate_part = Some("trunk".into());
    let creature = CreatureAssembler::new().build_blueprint(&blueprint).unwrap();
    assert_eq!(creature.report.parts.len(), 1);
    assert_eq!(creature.mesh.part_ranges[0].name, "trunk");

    // Assembler setting wins over the blueprint
    let creature = CreatureAssembler::new()
        .with_isolate(["tail", "head"])
        .build_blueprint(&blueprint)
        .unwrap();
    let names: Vec<&str> = creature.mesh.part_ranges.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["head", "tail"]);
}

#[test]
fn rebuild_replaces_mesh() {
    let blueprint = SpeciesBlueprint::load(fixture("elephant.json")).unwrap();
    let assembler = CreatureAssembler::new();
    let mut creature = assembler.build_blueprint(&blueprint).unwrap();
    let full = creature.mesh.vertex_count();

    let mut edited = blueprint.clone();
    edited.debug.isolate_part = Some("head".into());
    creature.rebuild(&assembler, &edited).unwrap();
    assert!(creature.mesh.vertex_count() < full);
    assert_eq!(creature.report.parts.len(), 1);
}

#[test]
fn unknown_behavior_leaves_creature_static() {
    let mut blueprint = SpeciesBlueprint::load(fixture("elephant.json")).unwrap();
    blueprint.behavior_presets.gait = Some("moonwalk".into());
    let mut creature = CreatureAssembler::new().build_blueprint(&blueprint).unwrap();
    assert!(creature.controller.is_none());
    assert_eq!(
        creature.report.warnings,
        vec![BuildWarning::UnknownBehavior {
            key: "moonwalk".into()
        }]
    );
    let before = creature.pose.clone();
    creature.update(0.5);
    assert_eq!(creature.pose, before);
}

#[test]
fn dangling_parent_is_fatal() {
    let blueprint = SpeciesBlueprint::from_json(
        &json!({
            "skeleton": { "bones": [
                { "name": "a", "parent": "", "position": [0, 0, 0] },
                { "name": "b", "parent": "nowhere", "position": [0, 0, 1] }
            ]}
        })
        .to_string(),
    )
    .unwrap();
    let err = CreatureAssembler::new().build_blueprint(&blueprint).unwrap_err();
    assert!(matches!(
        err,
        creature_anatomy::AnatomyError::Skeleton(SkeletonError::DanglingParent(_))
    ));
}

#[test]
fn global_scale_scales_bones_and_radii() {
    let mut blueprint = SpeciesBlueprint::load(fixture("elephant.json")).unwrap();
    blueprint.debug.isolate_part = Some("neck".into());
    let base = CreatureAssembler::new().build_blueprint(&blueprint).unwrap();
    blueprint.sizes.global_scale = Some(2.0);
    let scaled = CreatureAssembler::new().build_blueprint(&blueprint).unwrap();

    let extent = |b: &creature_anatomy::merge::Bounds| Vec3::from(b.max) - Vec3::from(b.min);
    let ratio = extent(&scaled.mesh.bounds) / extent(&base.mesh.bounds);
    assert!((ratio - Vec3::splat(2.0)).abs().max_element() < 1e-3);
}

struct Wag {
    joint: usize,
    elapsed: f32,
}

impl BehaviorController for Wag {
    fn update(&mut self, dt: f32, skeleton: &mut creature_anatomy::Skeleton) {
        self.elapsed += dt;
        if let Some(joint) = skeleton.joint_mut(self.joint) {
            joint.local_rotation = Quat::from_rotation_y(self.elapsed.sin() * 0.5);
        }
    }

    fn name(&self) -> &str {
        "wag"
    }
}

#[test]
fn custom_behavior_from_registry() {
    let mut registry = BehaviorRegistry::default();
    registry.register("wag", |skeleton, _chains| {
        Box::new(Wag {
            joint: skeleton.index_of("tail_base").unwrap_or(0),
            elapsed: 0.0,
        })
    });
    let mut blueprint = SpeciesBlueprint::load(fixture("elephant.json")).unwrap();
    blueprint.behavior_presets.gait = Some("wag".into());
    let assembler = CreatureAssembler::new().with_registry(registry);
    assert!(validate_blueprint(&blueprint, &assembler.registry().keys()).is_empty());

    let mut creature = assembler.build_blueprint(&blueprint).unwrap();
    assert!(creature.report.warnings.is_empty());
    let tail_base = creature.skeleton.index_of("tail_base").unwrap();
    let tail_tip = creature.skeleton.index_of("tail_tip").unwrap();
    let before = creature.pose.world_position(tail_tip);
    creature.update(1.0);
    assert_ne!(creature.pose.world_position(tail_tip), before);
    // The joint itself only rotates
    assert!(
        creature
            .pose
            .world_position(tail_base)
            .abs_diff_eq(Vec3::new(0.0, 2.2, -1.3), 1e-5)
    );
}

#[test]
fn assembler_size_table_sets_default_radius() {
    let skeleton = creature_anatomy::Skeleton::from_bones(&[
        BoneDef::new("neck_base", None, [0.0, 1.0, 0.0]),
        BoneDef::new("head", Some("neck_base"), [0.0, 0.0, 1.0]),
    ])
    .unwrap();
    let chains: ChainSet = [Chain::new("neck", &["neck_base", "head"])].into_iter().collect();
    let parts = [BodyPartDecl::new("neck", "neck", "neck", json!(null))];
    let sizes = Sizes {
        default_radius: Some(0.4),
        ..Default::default()
    };
    let creature = CreatureAssembler::new()
        .with_sizes(sizes)
        .build(skeleton, &parts, &chains);

    let first = Vec3::from(creature.mesh.geometry.positions[0]);
    assert!((first.distance(Vec3::new(0.0, 1.0, 0.0)) - 0.4).abs() < 1e-4);
}
