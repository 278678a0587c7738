//! Skeletal animation retargeting.
//!
//! Retargets animation clips recorded against a source rig onto a
//! differently-proportioned, differently-named target rig. Bone identity is
//! resolved by name, through a user-supplied rename table, or through fixed
//! preset tables for known third-party rigs; a scale-compensated rest-pose
//! offset is computed per matched bone and applied to every keyframe, while
//! track repair keeps the retargeted clip's track set consistent with the
//! target skeleton.
//!
//! The crate is a pure data-transform core: skeletons arrive as snapshots,
//! clips as plain keyframe data, and the host scene graph, playback, and
//! persistence stay behind the traits in [`batch`].

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod apply;
pub mod batch;
pub mod clip;
pub mod errors;
pub mod offsets;
pub mod repair;
pub mod resolver;
pub mod rig;
pub mod session;
pub mod skeleton;

pub use batch::{
    BatchReport, BatchSettings, ClipExporter, ClipLibrary, ExportFormat, MemoryLibrary,
    RetargetMode, SkeletonHost, start_retargeting,
};
pub use clip::{AnimationClip, Keyframe, Track, TrackPath, TransformTrack, ValueTrack};
pub use errors::{RetargetError, Result};
pub use offsets::{BoneOffset, RetargetMap};
pub use repair::MISSING_MAPPING_SENTINEL;
pub use resolver::{BonePair, Resolution};
pub use rig::{BoneMap, RigType};
pub use session::{Correction, RetargetOptions, Retargeter};
pub use skeleton::{Bone, BoneRest, Skeleton};
