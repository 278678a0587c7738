//! Keyframe retargeting: applies the retargeting map, plus root-motion,
//! correction, and fixate options, to every keyframe of every transform
//! track of a repaired clip.

use glam::{EulerRot, Quat, Vec3};

use crate::clip::{AnimationClip, Track};
use crate::offsets::RetargetMap;
use crate::rig::{BoneMap, RigType};
use crate::session::{Correction, RetargetOptions};

pub struct ApplyContext<'a> {
    pub map: &'a RetargetMap,
    pub options: &'a RetargetOptions,
    pub target_rig_type: RigType,
    pub custom: &'a BoneMap,
    pub ignore_bones: &'a [String],
    /// The active correction bone; empty when none is selected.
    pub correction_bone: &'a str,
    pub correction: Correction,
    /// Whether the correction bone resolves in the target skeleton. Gates
    /// the position correction on non-root bones.
    pub correction_resolves: bool,
}

impl ApplyContext<'_> {
    /// Whether the active target rig's key set admits `bone`: the custom
    /// table's values for Custom with a non-empty table, the preset table's
    /// keys for third-party rigs, and everything for Custom with an empty
    /// table.
    fn rig_admits(&self, bone: &str) -> bool {
        match self.target_rig_type {
            RigType::Custom => {
                self.custom.is_empty() || self.custom.values().any(|mapped| mapped == bone)
            }
            rig => rig.preset_contains(bone),
        }
    }
}

/// Rewrites every keyframe of every eligible transform track in place.
///
/// A track is eligible when its bone is in the retargeting map, not ignored,
/// and admitted by the target rig's key set. Unselected options leave the
/// corresponding keyframe component unchanged; all three components are
/// written back together.
pub fn apply_offsets(clip: &mut AnimationClip, ctx: &ApplyContext) {
    for track in clip.tracks.iter_mut().filter_map(Track::as_transform_mut) {
        let Some(bone) = track.path.bone_name() else {
            continue;
        };
        let Some(offset) = ctx.map.offset(bone) else {
            continue;
        };
        if ctx.ignore_bones.iter().any(|ignored| ignored == bone) {
            continue;
        }
        if !ctx.rig_admits(bone) {
            continue;
        }

        let is_root = ctx.map.is_target_root(bone);
        let is_correction = !ctx.correction_bone.is_empty() && bone == ctx.correction_bone;
        let root_motion = is_root && ctx.options.root_motion;

        for key in &mut track.keys {
            let mut position = key.position;
            let mut rotation = key.rotation;
            let mut scale = key.scale;

            if ctx.options.retarget_scale || root_motion {
                scale = key.scale + offset.scale_offset;
                if is_correction {
                    scale += ctx.correction.scale;
                }
            }

            if ctx.options.retarget_position || root_motion {
                if root_motion {
                    position = key.position * ctx.map.root_motion_scale + offset.origin_offset;
                    if is_correction {
                        position += ctx.correction.position;
                    }
                } else {
                    position = key.position * ctx.map.scale_mod + offset.origin_offset;
                    if is_correction && ctx.correction_resolves {
                        position += ctx.correction.position;
                    }
                }
            }

            if ctx.options.retarget_rotation || root_motion {
                rotation = (offset.quat_offset * key.rotation).normalize();
                if is_correction {
                    rotation = (rotation * correction_quat(ctx.correction.rotation_degrees))
                        .normalize();
                }
            }

            if is_root && ctx.options.fixate_in_place {
                position = Vec3::ZERO;
            }

            key.position = position;
            key.rotation = rotation;
            key.scale = scale;
        }
    }
}

/// Correction rotation: degrees → radians → unit quaternion.
fn correction_quat(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::XYZ,
        degrees.x.to_radians(),
        degrees.y.to_radians(),
        degrees.z.to_radians(),
    )
    .normalize()
}
