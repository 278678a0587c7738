use std::fmt;

use glam::{Quat, Vec3};

/// Skeleton-relative track addressing string, `"node/path:bone_name"`.
///
/// The repair engine consumes this literally as a string prefix plus a final
/// bone-name sub-path, so the representation stays a plain string with
/// helpers rather than a parsed structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackPath(String);

impl TrackPath {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Builds `"{prefix}:{bone}"`.
    #[must_use]
    pub fn for_bone(prefix: &str, bone: &str) -> Self {
        Self(format!("{prefix}:{bone}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final sub-path component, i.e. the bone name after the last `:`.
    #[must_use]
    pub fn bone_name(&self) -> Option<&str> {
        self.0.rsplit_once(':').map(|(_, bone)| bone)
    }

    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.0.contains(needle)
    }

    /// Replaces `from` with `to` at the start of the path. Returns whether a
    /// replacement happened; a path not starting with `from` is untouched.
    pub fn replace_prefix(&mut self, from: &str, to: &str) -> bool {
        if let Some(rest) = self.0.strip_prefix(from) {
            self.0 = format!("{to}{rest}");
            true
        } else {
            false
        }
    }

    /// Substitutes the final bone-name component. No-op on paths without a
    /// bone sub-path.
    pub fn replace_bone(&mut self, bone: &str) {
        if let Some(colon) = self.0.rfind(':') {
            self.0.truncate(colon + 1);
            self.0.push_str(bone);
        }
    }
}

impl fmt::Display for TrackPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One key of a transform track. The three value fields are always written
/// back together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Keyframe {
    /// Identity transform key (zero translation, identity rotation, unit scale).
    #[must_use]
    pub fn identity(time: f32) -> Self {
        Self {
            time,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Bone-space TRS keyframes addressed at one bone of a skeleton.
#[derive(Debug, Clone)]
pub struct TransformTrack {
    pub path: TrackPath,
    /// Ordered by time.
    pub keys: Vec<Keyframe>,
}

impl TransformTrack {
    #[must_use]
    pub fn new(path: TrackPath) -> Self {
        Self {
            path,
            keys: Vec::new(),
        }
    }

    pub fn insert_key(&mut self, key: Keyframe) {
        let at = self.keys.partition_point(|k| k.time <= key.time);
        self.keys.insert(at, key);
    }
}

/// Scalar keyframes on an arbitrary property path. Retargeting never touches
/// these; they exist so clips can carry non-bone tracks through the pipeline.
#[derive(Debug, Clone)]
pub struct ValueTrack {
    pub path: TrackPath,
    pub times: Vec<f32>,
    pub values: Vec<f32>,
}

#[derive(Debug, Clone)]
pub enum Track {
    Transform(TransformTrack),
    Value(ValueTrack),
}

impl Track {
    #[must_use]
    pub fn path(&self) -> &TrackPath {
        match self {
            Track::Transform(t) => &t.path,
            Track::Value(t) => &t.path,
        }
    }

    #[must_use]
    pub fn as_transform(&self) -> Option<&TransformTrack> {
        match self {
            Track::Transform(t) => Some(t),
            Track::Value(_) => None,
        }
    }

    #[must_use]
    pub fn as_transform_mut(&mut self) -> Option<&mut TransformTrack> {
        match self {
            Track::Transform(t) => Some(t),
            Track::Value(_) => None,
        }
    }
}

/// An animation clip: named, fixed-length, owning an ordered track list.
///
/// `Clone` duplicates all storage; retargeting always works on a clone and
/// never mutates the source clip.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub length: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    #[must_use]
    pub fn new(name: impl Into<String>, length: f32) -> Self {
        Self {
            name: name.into(),
            length,
            tracks: Vec::new(),
        }
    }

    pub fn push_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Transform tracks only, in track order.
    pub fn transform_tracks(&self) -> impl Iterator<Item = &TransformTrack> {
        self.tracks.iter().filter_map(Track::as_transform)
    }

    /// Index of the first transform track whose final path component equals
    /// `bone`.
    #[must_use]
    pub fn find_bone_track(&self, bone: &str) -> Option<usize> {
        self.tracks.iter().position(|t| {
            t.as_transform()
                .is_some_and(|t| t.path.bone_name() == Some(bone))
        })
    }
}
