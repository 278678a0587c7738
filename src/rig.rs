//! Rig naming conventions and bone-name tables.
//!
//! A rig type names a bone-naming convention. Preset rigs carry a fixed
//! canonical-name → rig-name table; the Custom rig is driven by a
//! user-editable [`BoneMap`] instead. Every lookup goes through
//! [`RigType::preset_table`] rather than any runtime type inspection.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// User-editable source-name → target-name table for the Custom rig.
///
/// An empty-string value means "unmapped": the resolver leaves such bones
/// unretargeted but keeps the entry so a UI can surface it for the user to
/// fill in later.
pub type BoneMap = FxHashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RigType {
    #[default]
    Custom,
    Rigify2,
    Genesis3And8,
    ThreeDsMax,
    MakeHuman,
}

/// Genesis 3 / Genesis 8 skeletons. Only the hip differs between the
/// canonical name set and the rig's own names.
const GENESIS3AND8_TABLE: &[(&str, &str)] = &[
    ("hip", "hips"),
    ("pelvis", "pelvis"),
    ("abdomenLower", "abdomenLower"),
    ("abdomenUpper", "abdomenUpper"),
    ("chestLower", "chestLower"),
    ("chestUpper", "chestUpper"),
    ("neckLower", "neckLower"),
    ("neckUpper", "neckUpper"),
    ("head", "head"),
    ("lCollar", "lCollar"),
    ("lShldrBend", "lShldrBend"),
    ("lForearmBend", "lForearmBend"),
    ("lHand", "lHand"),
    ("rCollar", "rCollar"),
    ("rShldrBend", "rShldrBend"),
    ("rForearmBend", "rForearmBend"),
    ("rHand", "rHand"),
    ("lThighBend", "lThighBend"),
    ("lThighTwist", "lThighTwist"),
    ("lShin", "lShin"),
    ("lFoot", "lFoot"),
    ("lToe", "lToe"),
    ("rThighBend", "rThighBend"),
    ("rThighTwist", "rThighTwist"),
    ("rShin", "rShin"),
    ("rFoot", "rFoot"),
    ("rToe", "rToe"),
    ("lThumb1", "lThumb1"),
    ("lThumb2", "lThumb2"),
    ("lThumb3", "lThumb3"),
    ("lIndex1", "lIndex1"),
    ("lIndex2", "lIndex2"),
    ("lIndex3", "lIndex3"),
    ("lMid1", "lMid1"),
    ("lMid2", "lMid2"),
    ("lMid3", "lMid3"),
    ("lRing1", "lRing1"),
    ("lRing2", "lRing2"),
    ("lRing3", "lRing3"),
    ("lPinky1", "lPinky1"),
    ("lPinky2", "lPinky2"),
    ("lPinky3", "lPinky3"),
    ("rThumb1", "rThumb1"),
    ("rThumb2", "rThumb2"),
    ("rThumb3", "rThumb3"),
    ("rIndex1", "rIndex1"),
    ("rIndex2", "rIndex2"),
    ("rIndex3", "rIndex3"),
    ("rMid1", "rMid1"),
    ("rMid2", "rMid2"),
    ("rMid3", "rMid3"),
    ("rRing1", "rRing1"),
    ("rRing2", "rRing2"),
    ("rRing3", "rRing3"),
    ("rPinky1", "rPinky1"),
    ("rPinky2", "rPinky2"),
    ("rPinky3", "rPinky3"),
];

// No tables shipped for these rig families yet; their key-set checks admit
// no bones until the tables are filled in.
const RIGIFY2_TABLE: &[(&str, &str)] = &[];
const THREEDSMAX_TABLE: &[(&str, &str)] = &[];
const MAKEHUMAN_TABLE: &[(&str, &str)] = &[];

impl RigType {
    /// The fixed canonical-name → rig-name table for this preset. Custom has
    /// no preset table; its naming comes from the user's [`BoneMap`].
    #[must_use]
    pub fn preset_table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            RigType::Custom => &[],
            RigType::Rigify2 => RIGIFY2_TABLE,
            RigType::Genesis3And8 => GENESIS3AND8_TABLE,
            RigType::ThreeDsMax => THREEDSMAX_TABLE,
            RigType::MakeHuman => MAKEHUMAN_TABLE,
        }
    }

    /// Whether `canonical` is a key of this preset's table.
    #[must_use]
    pub fn preset_contains(self, canonical: &str) -> bool {
        self.preset_table().iter().any(|(key, _)| *key == canonical)
    }
}

/// Parses a custom bone map from a JSON object of string → string.
pub fn bone_map_from_json(json: &str) -> Result<BoneMap> {
    Ok(serde_json::from_str(json)?)
}

/// Serializes a custom bone map to a JSON object.
pub fn bone_map_to_json(map: &BoneMap) -> Result<String> {
    Ok(serde_json::to_string_pretty(map)?)
}
