//! Rest-pose offset calculation.
//!
//! For each resolved bone pair, computes the position/rotation/scale offset
//! between the two rest poses, compensated for the overall skeleton scales.

use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;

use crate::resolver::Resolution;
use crate::skeleton::Skeleton;

/// Per-bone rest-pose correction.
///
/// `scale_offset` is an additive delta (source rest scale minus target rest
/// scale), not a ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneOffset {
    pub origin_offset: Vec3,
    pub quat_offset: Quat,
    pub scale_offset: Vec3,
}

/// The cached product of resolver + offset calculation, keyed by the target
/// bone name.
///
/// `scale_mod` and `root_motion_scale` are deliberately single values shared
/// by every bone: the calculation overwrites them per pair, so the last
/// matched pair's values apply to all bones at keyframe time.
#[derive(Debug, Clone)]
pub struct RetargetMap {
    pub offsets: FxHashMap<String, BoneOffset>,
    pub scale_mod: f32,
    pub root_motion_scale: f32,
    pub source_root: Option<String>,
    pub target_root: Option<String>,
}

impl Default for RetargetMap {
    fn default() -> Self {
        Self {
            offsets: FxHashMap::default(),
            scale_mod: 1.0,
            root_motion_scale: 1.0,
            source_root: None,
            target_root: None,
        }
    }
}

impl RetargetMap {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    #[must_use]
    pub fn offset(&self, bone: &str) -> Option<&BoneOffset> {
        self.offsets.get(bone)
    }

    /// Whether `bone` is the target skeleton's root.
    #[must_use]
    pub fn is_target_root(&self, bone: &str) -> bool {
        self.target_root.as_deref() == Some(bone)
    }
}

/// Computes rest offsets for every resolved pair.
///
/// Scales arrive pre-clamped by the session setters (non-positive input is
/// reset to 1.0 there). A resolution with zero pairs yields an empty map
/// with both scale factors at 1.0.
#[must_use]
pub fn calculate(
    source: &Skeleton,
    target: &Skeleton,
    resolution: &Resolution,
    source_scale: f32,
    target_scale: f32,
) -> RetargetMap {
    let mut map = RetargetMap {
        source_root: resolution.source_root.clone(),
        target_root: resolution.target_root.clone(),
        ..RetargetMap::default()
    };

    for pair in &resolution.pairs {
        let (Some(source_bone), Some(target_bone)) =
            (source.bone(pair.source_index), target.bone(pair.target_index))
        else {
            continue;
        };

        let source_rest = source_bone.rest;
        let target_rest = target_bone.rest;

        map.root_motion_scale = source_scale / target_scale;

        let origin_offset = if target_scale > source_scale {
            map.scale_mod = target_scale / source_scale;
            target_rest.position - (source_rest.position * target_scale / map.scale_mod)
        } else if target_scale < source_scale {
            map.scale_mod = map.root_motion_scale;
            target_rest.position - (source_rest.position * target_scale * map.scale_mod)
        } else {
            map.root_motion_scale = 1.0;
            map.scale_mod = 1.0;
            target_rest.position - source_rest.position
        };

        let quat_offset =
            (target_rest.rotation.normalize().inverse() * source_rest.rotation.normalize())
                .normalize();
        let scale_offset = source_rest.scale - target_rest.scale;

        map.offsets.insert(
            pair.lookup_name.clone(),
            BoneOffset {
                origin_offset,
                quat_offset,
                scale_offset,
            },
        );
    }

    map
}
