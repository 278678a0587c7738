//! Bone correspondence resolution.
//!
//! Walks the source skeleton in bone-index order and pairs each source bone
//! with a target bone of the same (possibly remapped) name. Unmatched bones
//! are skipped, never an error: partial rig coverage is expected.

use log::debug;
use smallvec::SmallVec;

use crate::rig::{BoneMap, RigType};
use crate::skeleton::Skeleton;

/// One resolved (source bone, target bone) correspondence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BonePair {
    /// Bone name in the source skeleton.
    pub source_bone: String,
    /// The lookup key after custom-map substitution; equals the target
    /// skeleton's bone name and keys the retargeting map.
    pub lookup_name: String,
    pub source_index: usize,
    pub target_index: usize,
    pub source_is_root: bool,
    pub target_is_root: bool,
}

/// Resolver output: the pair list plus the roots observed while iterating.
///
/// Root bookkeeping is last-write-wins in iteration order, matching the
/// single-pass walk. The target root name is the lookup name, i.e. the name
/// tracks carry after repair.
#[derive(Debug, Default)]
pub struct Resolution {
    pub pairs: SmallVec<[BonePair; 32]>,
    pub source_root: Option<String>,
    pub target_root: Option<String>,
}

/// Resolves bone correspondence between two skeletons.
///
/// Under Custom → Custom with a non-empty table, source names are substituted
/// through `custom` before the target lookup; source names absent from the
/// table are inserted with an empty mapping as a side effect, so the table
/// accumulates every real source bone name for the user to fill in. An empty
/// mapping is a valid "no substitution yet" placeholder and is still
/// attempted as-is.
pub fn resolve(
    source: &Skeleton,
    target: &Skeleton,
    source_rig: RigType,
    target_rig: RigType,
    custom: &mut BoneMap,
) -> Resolution {
    let mut resolution = Resolution::default();
    let substitute =
        source_rig == RigType::Custom && target_rig == RigType::Custom && !custom.is_empty();

    for (source_index, bone) in source.bones().iter().enumerate() {
        let source_is_root = bone.parent.is_none();
        if source_is_root {
            resolution.source_root = Some(bone.name.clone());
        }

        let mut lookup_name = bone.name.clone();
        if substitute {
            if let Some(mapped) = custom.get(&bone.name) {
                lookup_name = mapped.clone();
            } else {
                custom.insert(bone.name.clone(), String::new());
            }
        }

        let Some(target_index) = target.find_bone(&lookup_name) else {
            debug!("no target bone for source bone '{}', skipping", bone.name);
            continue;
        };

        let target_is_root = target
            .bone(target_index)
            .is_some_and(|b| b.parent.is_none());
        if target_is_root {
            resolution.target_root = Some(lookup_name.clone());
        }

        resolution.pairs.push(BonePair {
            source_bone: bone.name.clone(),
            lookup_name,
            source_index,
            target_index,
            source_is_root,
            target_is_root,
        });
    }

    debug!(
        "resolved {} bone pairs ({} source bones)",
        resolution.pairs.len(),
        source.bone_count()
    );
    resolution
}
