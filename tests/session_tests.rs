//! Retargeting Session Tests
//!
//! Tests for:
//! - Cache lifecycle: compute, idempotence, invalidation, identity change
//! - Scale clamping and configuration setters
//! - Correction store lifecycle
//! - The clone → repair → apply clip pipeline end to end

use glam::{Quat, Vec3};

use anim_retarget::clip::{AnimationClip, Keyframe, Track, TrackPath, TransformTrack};
use anim_retarget::errors::RetargetError;
use anim_retarget::rig::BoneMap;
use anim_retarget::session::Retargeter;
use anim_retarget::skeleton::{BoneRest, Skeleton};

const EPSILON: f32 = 1e-5;

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn bone_track<'a>(clip: &'a AnimationClip, bone: &str) -> &'a TransformTrack {
    clip.transform_tracks()
        .find(|t| t.path.bone_name() == Some(bone))
        .unwrap_or_else(|| panic!("no track for bone '{bone}'"))
}

fn humanoid(hips_height: f32) -> Skeleton {
    let mut skeleton = Skeleton::new();
    let hips = skeleton.add_bone(
        "hips",
        None,
        BoneRest::new(Vec3::new(0.0, hips_height, 0.0), Quat::IDENTITY, Vec3::ONE),
    );
    skeleton.add_bone(
        "spine",
        Some(hips),
        BoneRest::new(Vec3::new(0.0, 0.2, 0.0), Quat::IDENTITY, Vec3::ONE),
    );
    skeleton
}

fn configured_session() -> Retargeter {
    let mut session = Retargeter::new();
    session.set_source_skeleton_path("Source/Skeleton");
    session.set_target_skeleton_path("Target/Skeleton");
    session
}

fn computed_session(source: &Skeleton, target: &Skeleton) -> Retargeter {
    let mut session = configured_session();
    session
        .calculate_retargeting_data(source, target, "Source/Skeleton", "Target/Skeleton")
        .expect("skeletons share bone names");
    session
}

fn walk_clip() -> AnimationClip {
    let mut clip = AnimationClip::new("walk", 1.0);
    let mut track = TransformTrack::new(TrackPath::for_bone("Source/Skeleton", "hips"));
    track.insert_key(Keyframe {
        time: 0.0,
        position: Vec3::new(0.0, 0.0, 0.5),
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    });
    clip.push_track(Track::Transform(track));
    clip
}

// ============================================================================
// Cache lifecycle
// ============================================================================

#[test]
fn fresh_session_has_no_data() {
    let session = configured_session();
    assert!(!session.has_retargeting_data());
}

#[test]
fn disjoint_skeletons_yield_no_data_error() {
    let mut source = Skeleton::new();
    source.add_bone("tail", None, BoneRest::default());
    let target = humanoid(1.0);

    let mut session = configured_session();
    let err = session
        .calculate_retargeting_data(&source, &target, "Source/Skeleton", "Target/Skeleton")
        .unwrap_err();
    assert!(matches!(err, RetargetError::NoRetargetingData));
    assert!(!session.has_retargeting_data());
}

#[test]
fn successful_calculation_caches_data() {
    let source = humanoid(1.0);
    let target = humanoid(1.2);
    let session = computed_session(&source, &target);

    assert!(session.has_retargeting_data());
    assert_eq!(session.retarget_map().offsets.len(), 2);
    assert_eq!(session.retarget_map().target_root.as_deref(), Some("hips"));
}

#[test]
fn recalculation_is_idempotent_while_valid() {
    let source = humanoid(1.0);
    let target = humanoid(1.2);
    let mut session = computed_session(&source, &target);

    // A second call must return immediately without rebuilding; feeding a
    // skeleton that would fail proves the early return.
    let empty = Skeleton::new();
    session
        .calculate_retargeting_data(&empty, &empty, "Source/Skeleton", "Target/Skeleton")
        .expect("valid cache short-circuits recomputation");
    assert!(session.has_retargeting_data());
}

#[test]
fn scale_change_invalidates_until_recomputed() {
    let source = humanoid(1.0);
    let target = humanoid(1.2);
    let mut session = computed_session(&source, &target);

    session.set_source_skeleton_scale(2.0);
    assert!(!session.has_retargeting_data());

    session
        .calculate_retargeting_data(&source, &target, "Source/Skeleton", "Target/Skeleton")
        .unwrap();
    assert!(session.has_retargeting_data());
}

#[test]
fn skeleton_path_change_drops_map_and_corrections() {
    let source = humanoid(1.0);
    let target = humanoid(1.2);
    let mut session = computed_session(&source, &target);

    session.set_correction_bone("hips");
    session.set_position_correction(Vec3::new(0.0, 0.5, 0.0));

    session.set_target_skeleton_path("Another/Skeleton");
    assert!(!session.has_retargeting_data());
    assert!(session.retarget_map().is_empty());

    // The tuned correction record is gone; re-selecting the bone yields a
    // zeroed record.
    session.set_correction_bone("hips");
    assert!(approx_vec3(session.correction().position, Vec3::ZERO));
}

#[test]
fn same_path_reassignment_keeps_cache() {
    let source = humanoid(1.0);
    let target = humanoid(1.2);
    let mut session = computed_session(&source, &target);

    session.set_target_skeleton_path("Target/Skeleton");
    assert!(session.has_retargeting_data());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn non_positive_scales_clamp_to_one() {
    let mut session = Retargeter::new();
    session.set_source_skeleton_scale(-5.0);
    session.set_target_skeleton_scale(0.0);
    assert!((session.source_skeleton_scale() - 1.0).abs() < EPSILON);
    assert!((session.target_skeleton_scale() - 1.0).abs() < EPSILON);
}

#[test]
fn custom_map_growth_is_observable() {
    let mut source = Skeleton::new();
    source.add_bone("Bip01", None, BoneRest::default());
    source.add_bone("Bip01_Spine", Some(0), BoneRest::default());
    let target = humanoid(1.0);

    let mut session = configured_session();
    let mut table = BoneMap::default();
    table.insert("Bip01".to_string(), "hips".to_string());
    session.set_custom_bone_map(table);

    session
        .calculate_retargeting_data(&source, &target, "Source/Skeleton", "Target/Skeleton")
        .unwrap();

    // The unmapped source bone was recorded with an empty mapping.
    assert_eq!(
        session.custom_bone_map().get("Bip01_Spine").map(String::as_str),
        Some("")
    );
}

// ============================================================================
// Correction store
// ============================================================================

#[test]
fn correction_values_persist_across_bone_switches() {
    let mut session = Retargeter::new();
    session.set_correction_bone("hips");
    session.set_rotation_correction(Vec3::new(0.0, 45.0, 0.0));

    session.set_correction_bone("spine");
    assert!(approx_vec3(session.correction().rotation_degrees, Vec3::ZERO));

    session.set_correction_bone("hips");
    assert!(approx_vec3(
        session.correction().rotation_degrees,
        Vec3::new(0.0, 45.0, 0.0)
    ));
}

#[test]
fn correction_bone_name_is_trimmed() {
    let mut session = Retargeter::new();
    session.set_correction_bone("  hips  ");
    assert_eq!(session.correction_bone(), "hips");
}

// ============================================================================
// Clip pipeline
// ============================================================================

#[test]
fn retarget_clip_without_data_fails() {
    let session = configured_session();
    let err = session.retarget_clip(&walk_clip(), &humanoid(1.0)).unwrap_err();
    assert!(matches!(err, RetargetError::NoRetargetingData));
}

#[test]
fn retarget_clip_never_mutates_the_source() {
    let source = humanoid(1.0);
    let target = humanoid(1.2);
    let mut session = computed_session(&source, &target);
    session.options.retarget_position = true;

    let clip = walk_clip();
    let original_path = clip.tracks[0].path().as_str().to_string();
    session.retarget_clip(&clip, &target).unwrap();

    assert_eq!(clip.tracks[0].path().as_str(), original_path);
    assert!(approx_vec3(
        clip.transform_tracks().next().unwrap().keys[0].position,
        Vec3::new(0.0, 0.0, 0.5)
    ));
}

#[test]
fn full_pipeline_remaps_and_offsets() {
    // Source hips rest at y=1.0, target at y=1.2, equal scales: the
    // retargeted key is shifted by the rest delta and the track readdressed.
    let source = humanoid(1.0);
    let target = humanoid(1.2);
    let mut session = computed_session(&source, &target);
    session.options.retarget_position = true;

    let retargeted = session.retarget_clip(&walk_clip(), &target).unwrap();

    let hips = bone_track(&retargeted, "hips");
    assert!(hips.path.starts_with("Target/Skeleton"));
    assert!(approx_vec3(hips.keys[0].position, Vec3::new(0.0, 0.2, 0.5)));

    // The unanimated spine got a flat guarantee track.
    assert_eq!(bone_track(&retargeted, "spine").keys.len(), 2);
}

#[test]
fn ignore_list_survives_the_pipeline() {
    let source = humanoid(1.0);
    let target = humanoid(1.2);
    let mut session = computed_session(&source, &target);
    session.options.retarget_position = true;
    session.ignore_bones.push("hips".to_string());

    let retargeted = session.retarget_clip(&walk_clip(), &target).unwrap();
    let hips = bone_track(&retargeted, "hips");
    assert!(approx_vec3(hips.keys[0].position, Vec3::new(0.0, 0.0, 0.5)));
}
