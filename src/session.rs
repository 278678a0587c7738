//! The retargeting session.
//!
//! [`Retargeter`] owns every configuration field and the single cached data
//! product, the [`RetargetMap`]. Single-threaded, single-writer: invalidation
//! is a monotonic pending flag plus equality checks against the skeleton
//! identities seen at the last computation, never a generation counter.

use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::apply::{self, ApplyContext};
use crate::clip::AnimationClip;
use crate::errors::{RetargetError, Result};
use crate::offsets::{self, RetargetMap};
use crate::repair::{self, RepairContext};
use crate::resolver;
use crate::rig::{BoneMap, RigType};
use crate::skeleton::Skeleton;

/// Per-keyframe application switches.
///
/// Unselected components pass through from the source keyframe unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetOptions {
    pub retarget_position: bool,
    pub retarget_rotation: bool,
    pub retarget_scale: bool,
    /// Treat the root bone's animated translation as character displacement,
    /// scaled by the root-motion scale instead of the general scale modifier.
    pub root_motion: bool,
    /// Force the root bone's translation to zero on every keyframe,
    /// canceling root motion. Overrides every other position computation.
    pub fixate_in_place: bool,
    /// Restart both players in phase when restoring playback after a batch.
    pub sync_playback: bool,
}

impl Default for RetargetOptions {
    fn default() -> Self {
        Self {
            retarget_position: false,
            retarget_rotation: true,
            retarget_scale: false,
            root_motion: false,
            fixate_in_place: false,
            sync_playback: false,
        }
    }
}

/// Manually tuned per-bone delta applied on top of the computed offset.
/// Rotation is in degrees, converted at application time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Correction {
    pub position: Vec3,
    pub rotation_degrees: Vec3,
    pub scale: Vec3,
}

/// Retargeting session state: configuration, the cached retargeting map, and
/// the per-bone correction store.
#[derive(Debug)]
pub struct Retargeter {
    // Configuration
    source_skeleton_path: String,
    target_skeleton_path: String,
    source_player_path: String,
    target_player_path: String,
    source_rig_type: RigType,
    target_rig_type: RigType,
    source_skeleton_scale: f32,
    target_skeleton_scale: f32,
    custom_bone_map: BoneMap,
    pub ignore_bones: Vec<String>,
    pub options: RetargetOptions,

    // Correction store, keyed by bone name. Entries persist across
    // correction-bone switches; cleared only on skeleton-identity change.
    correction_bone: String,
    correction: Correction,
    corrections: rustc_hash::FxHashMap<String, Correction>,
    correction_mode: bool,

    // Cache
    map: RetargetMap,
    needs_recompute: bool,
    computed_identity: Option<(String, String)>,
    source_prefix: String,
    target_prefix: String,
}

impl Retargeter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            source_skeleton_path: String::new(),
            target_skeleton_path: String::new(),
            source_player_path: String::new(),
            target_player_path: String::new(),
            source_rig_type: RigType::Custom,
            target_rig_type: RigType::Custom,
            source_skeleton_scale: 1.0,
            target_skeleton_scale: 1.0,
            custom_bone_map: BoneMap::default(),
            ignore_bones: Vec::new(),
            options: RetargetOptions::default(),
            correction_bone: String::new(),
            correction: Correction::default(),
            corrections: rustc_hash::FxHashMap::default(),
            correction_mode: false,
            map: RetargetMap::default(),
            needs_recompute: true,
            computed_identity: None,
            source_prefix: String::new(),
            target_prefix: String::new(),
        }
    }

    // ========================================================================
    // Configuration setters (cache-invalidating ones flag a recompute)
    // ========================================================================

    pub fn set_source_skeleton_path(&mut self, path: impl Into<String>) {
        let path = path.into();
        if self.source_skeleton_path != path {
            self.invalidate_for_skeleton_change();
        }
        self.source_skeleton_path = path;
    }

    pub fn set_target_skeleton_path(&mut self, path: impl Into<String>) {
        let path = path.into();
        if self.target_skeleton_path != path {
            self.invalidate_for_skeleton_change();
        }
        self.target_skeleton_path = path;
    }

    pub fn set_source_player_path(&mut self, path: impl Into<String>) {
        self.source_player_path = path.into();
    }

    pub fn set_target_player_path(&mut self, path: impl Into<String>) {
        self.target_player_path = path.into();
    }

    /// Non-positive input silently resets to 1.0.
    pub fn set_source_skeleton_scale(&mut self, scale: f32) {
        self.source_skeleton_scale = if scale <= 0.0 { 1.0 } else { scale };
        self.needs_recompute = true;
    }

    /// Non-positive input silently resets to 1.0.
    pub fn set_target_skeleton_scale(&mut self, scale: f32) {
        self.target_skeleton_scale = if scale <= 0.0 { 1.0 } else { scale };
        self.needs_recompute = true;
    }

    pub fn set_source_rig_type(&mut self, rig: RigType) {
        self.source_rig_type = rig;
        self.needs_recompute = true;
    }

    pub fn set_target_rig_type(&mut self, rig: RigType) {
        self.target_rig_type = rig;
        self.needs_recompute = true;
    }

    pub fn set_custom_bone_map(&mut self, map: BoneMap) {
        if self.custom_bone_map != map {
            self.needs_recompute = true;
        }
        self.custom_bone_map = map;
    }

    #[must_use]
    pub fn source_skeleton_path(&self) -> &str {
        &self.source_skeleton_path
    }

    #[must_use]
    pub fn target_skeleton_path(&self) -> &str {
        &self.target_skeleton_path
    }

    #[must_use]
    pub fn source_player_path(&self) -> &str {
        &self.source_player_path
    }

    #[must_use]
    pub fn target_player_path(&self) -> &str {
        &self.target_player_path
    }

    #[must_use]
    pub fn source_skeleton_scale(&self) -> f32 {
        self.source_skeleton_scale
    }

    #[must_use]
    pub fn target_skeleton_scale(&self) -> f32 {
        self.target_skeleton_scale
    }

    #[must_use]
    pub fn source_rig_type(&self) -> RigType {
        self.source_rig_type
    }

    #[must_use]
    pub fn target_rig_type(&self) -> RigType {
        self.target_rig_type
    }

    /// The user-editable custom bone map. Grows during computation: source
    /// bones without an entry are recorded with an empty mapping.
    #[must_use]
    pub fn custom_bone_map(&self) -> &BoneMap {
        &self.custom_bone_map
    }

    #[must_use]
    pub fn retarget_map(&self) -> &RetargetMap {
        &self.map
    }

    // ========================================================================
    // Correction bone
    // ========================================================================

    /// Selects the active correction bone, restoring previously tuned values
    /// for it or creating a zeroed record on first reference.
    pub fn set_correction_bone(&mut self, bone: &str) {
        self.correction_bone = bone.trim().to_string();
        if let Some(stored) = self.corrections.get(&self.correction_bone) {
            self.correction = *stored;
        } else {
            self.correction = Correction::default();
            self.corrections
                .insert(self.correction_bone.clone(), Correction::default());
        }
    }

    #[must_use]
    pub fn correction_bone(&self) -> &str {
        &self.correction_bone
    }

    #[must_use]
    pub fn correction(&self) -> Correction {
        self.correction
    }

    pub fn set_position_correction(&mut self, position: Vec3) {
        self.correction.position = position;
        if let Some(stored) = self.corrections.get_mut(&self.correction_bone) {
            stored.position = position;
        }
    }

    pub fn set_rotation_correction(&mut self, degrees: Vec3) {
        self.correction.rotation_degrees = degrees;
        if let Some(stored) = self.corrections.get_mut(&self.correction_bone) {
            stored.rotation_degrees = degrees;
        }
    }

    pub fn set_scale_correction(&mut self, scale: Vec3) {
        self.correction.scale = scale;
        if let Some(stored) = self.corrections.get_mut(&self.correction_bone) {
            stored.scale = scale;
        }
    }

    pub fn enable_correction_mode(&mut self) {
        self.correction_mode = true;
    }

    pub fn disable_correction_mode(&mut self) {
        self.correction_mode = false;
    }

    #[must_use]
    pub fn correction_mode(&self) -> bool {
        self.correction_mode
    }

    // ========================================================================
    // Cache
    // ========================================================================

    /// True iff both skeleton identities match their last-computed values,
    /// the map is non-empty, and no recompute is pending.
    #[must_use]
    pub fn has_retargeting_data(&self) -> bool {
        let identity_matches = self.computed_identity.as_ref().is_some_and(|(src, dst)| {
            *src == self.source_skeleton_path && *dst == self.target_skeleton_path
        });
        identity_matches && !self.map.is_empty() && !self.needs_recompute
    }

    /// Derives the retargeting map from the two skeletons. Idempotent:
    /// returns immediately when valid data already exists.
    ///
    /// `source_prefix` / `target_prefix` are the player-to-skeleton relative
    /// addressing strings the host's path resolver produced; the repair
    /// engine consumes them literally.
    pub fn calculate_retargeting_data(
        &mut self,
        source: &Skeleton,
        target: &Skeleton,
        source_prefix: &str,
        target_prefix: &str,
    ) -> Result<()> {
        if self.has_retargeting_data() {
            return Ok(());
        }

        self.source_prefix = source_prefix.to_string();
        self.target_prefix = target_prefix.to_string();

        let resolution = resolver::resolve(
            source,
            target,
            self.source_rig_type,
            self.target_rig_type,
            &mut self.custom_bone_map,
        );
        self.map = offsets::calculate(
            source,
            target,
            &resolution,
            self.source_skeleton_scale,
            self.target_skeleton_scale,
        );
        self.computed_identity = Some((
            self.source_skeleton_path.clone(),
            self.target_skeleton_path.clone(),
        ));
        self.needs_recompute = false;

        if self.map.is_empty() {
            return Err(RetargetError::NoRetargetingData);
        }
        debug!(
            "retargeting map ready: {} bones, scale_mod {}, root_motion_scale {}",
            self.map.offsets.len(),
            self.map.scale_mod,
            self.map.root_motion_scale
        );
        Ok(())
    }

    // ========================================================================
    // Per-clip pipeline: clone → repair → apply
    // ========================================================================

    /// Produces the retargeted counterpart of `source_clip`. The source clip
    /// is never mutated; repair and keyframe application run on a clone.
    pub fn retarget_clip(
        &self,
        source_clip: &AnimationClip,
        target: &Skeleton,
    ) -> Result<AnimationClip> {
        if self.map.is_empty() {
            return Err(RetargetError::NoRetargetingData);
        }

        let mut clip = source_clip.clone();

        repair::repair_tracks(
            &mut clip,
            &RepairContext {
                source_prefix: &self.source_prefix,
                target_prefix: &self.target_prefix,
                target_rig_type: self.target_rig_type,
                custom: &self.custom_bone_map,
                map: &self.map,
            },
        );

        apply::apply_offsets(
            &mut clip,
            &ApplyContext {
                map: &self.map,
                options: &self.options,
                target_rig_type: self.target_rig_type,
                custom: &self.custom_bone_map,
                ignore_bones: &self.ignore_bones,
                correction_bone: &self.correction_bone,
                correction: self.correction,
                correction_resolves: target.find_bone(&self.correction_bone).is_some(),
            },
        );

        Ok(clip)
    }

    /// Skeleton-identity change: drop the map and the correction store, flag
    /// a recompute.
    fn invalidate_for_skeleton_change(&mut self) {
        self.map = RetargetMap::default();
        self.computed_identity = None;
        self.needs_recompute = true;
        self.corrections.clear();
    }
}

impl Default for Retargeter {
    fn default() -> Self {
        Self::new()
    }
}
