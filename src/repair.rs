//! Track repair: keeps a cloned clip's track set aligned to the target
//! skeleton.
//!
//! Four steps, in order: remap track paths from the source-skeleton prefix to
//! the target-skeleton prefix, select the bone-name key set to guarantee
//! tracks for, insert flat identity tracks for missing bones, and finally
//! remove tracks that no longer resolve. Only the cloned clip is mutated;
//! value tracks pass through untouched.

use log::debug;

use crate::clip::{AnimationClip, Keyframe, Track, TrackPath, TransformTrack};
use crate::offsets::RetargetMap;
use crate::rig::{BoneMap, RigType};

/// Sentinel substituted for a bone name whose custom mapping is empty.
/// Tracks carrying it are removed in the final cleanup step.
pub const MISSING_MAPPING_SENTINEL: &str = "bone_missing_mapping";

pub struct RepairContext<'a> {
    /// Player-to-skeleton relative prefix of source-side track paths.
    pub source_prefix: &'a str,
    /// Player-to-skeleton relative prefix target-side tracks must carry.
    pub target_prefix: &'a str,
    pub target_rig_type: RigType,
    pub custom: &'a BoneMap,
    pub map: &'a RetargetMap,
}

/// Repairs `clip` in place against the target skeleton's track expectations.
pub fn repair_tracks(clip: &mut AnimationClip, ctx: &RepairContext) {
    remap_track_paths(clip, ctx);
    let key_set = select_key_set(ctx);
    insert_missing_bone_tracks(clip, ctx, &key_set);
    remove_stale_tracks(clip, ctx);
}

/// Step 1: replace the source prefix with the target prefix on every
/// transform track, substituting custom-mapped bone names as we go. An empty
/// mapping becomes the missing-mapping sentinel. Idempotent: already-remapped
/// paths no longer start with the source prefix and are left alone.
fn remap_track_paths(clip: &mut AnimationClip, ctx: &RepairContext) {
    if ctx.source_prefix == ctx.target_prefix {
        return;
    }
    let substitute = ctx.target_rig_type == RigType::Custom && !ctx.custom.is_empty();

    for track in clip.tracks.iter_mut().filter_map(Track::as_transform_mut) {
        if !track.path.replace_prefix(ctx.source_prefix, ctx.target_prefix) {
            continue;
        }
        if !substitute {
            continue;
        }
        let Some(bone) = track.path.bone_name() else {
            continue;
        };
        if let Some(mapped) = ctx.custom.get(bone) {
            let replacement = if mapped.is_empty() {
                MISSING_MAPPING_SENTINEL
            } else {
                mapped.as_str()
            };
            track.path.replace_bone(replacement);
        }
    }
}

/// Step 2: the bone names every repaired clip must carry a track for.
fn select_key_set(ctx: &RepairContext) -> Vec<String> {
    if ctx.target_rig_type == RigType::Custom && !ctx.custom.is_empty() {
        return ctx.custom.values().cloned().collect();
    }
    if ctx.target_rig_type == RigType::Genesis3And8 {
        return RigType::Genesis3And8
            .preset_table()
            .iter()
            .map(|(key, _)| (*key).to_string())
            .collect();
    }
    ctx.map.offsets.keys().cloned().collect()
}

/// Step 3: every key-set bone gets a track. Existing tracks get their prefix
/// remapped if step 1 missed them; absent bones get an appended flat track
/// with identity keys at t = 0 and t = clip length.
fn insert_missing_bone_tracks(clip: &mut AnimationClip, ctx: &RepairContext, key_set: &[String]) {
    for bone in key_set {
        if bone.is_empty() {
            continue;
        }

        if let Some(index) = clip.find_bone_track(bone) {
            if let Some(track) = clip.tracks[index].as_transform_mut() {
                track
                    .path
                    .replace_prefix(ctx.source_prefix, ctx.target_prefix);
            }
            continue;
        }

        let mut track = TransformTrack::new(TrackPath::for_bone(ctx.target_prefix, bone));
        track.insert_key(Keyframe::identity(0.0));
        track.insert_key(Keyframe::identity(clip.length));
        debug!("inserted flat track for unanimated bone '{bone}'");
        clip.push_track(Track::Transform(track));
    }
}

/// Step 4: remove transform tracks that do not resolve on the target
/// skeleton — wrong prefix, or carrying the missing-mapping sentinel. One
/// removal per scan, restarting after each, until a full scan removes
/// nothing.
fn remove_stale_tracks(clip: &mut AnimationClip, ctx: &RepairContext) {
    loop {
        let stale = clip.tracks.iter().position(|track| {
            track.as_transform().is_some_and(|t| {
                !t.path.starts_with(ctx.target_prefix) || t.path.contains(MISSING_MAPPING_SENTINEL)
            })
        });
        match stale {
            Some(index) => {
                debug!("removing stale track '{}'", clip.tracks[index].path());
                clip.tracks.remove(index);
            }
            None => break,
        }
    }
}
