use glam::{Quat, Vec3};

/// Rest transform of a single bone (bone-local TRS).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneRest {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl BoneRest {
    #[must_use]
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }
}

impl Default for BoneRest {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    /// `None` for root bones.
    pub parent: Option<usize>,
    pub rest: BoneRest,
}

/// Read-only snapshot of a skeleton's bone list.
///
/// Insertion order is bone-index order. Bones are immutable for the duration
/// of one retargeting computation; the host owns the live skeleton.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a bone and returns its index.
    pub fn add_bone(
        &mut self,
        name: impl Into<String>,
        parent: Option<usize>,
        rest: BoneRest,
    ) -> usize {
        self.bones.push(Bone {
            name: name.into(),
            parent,
            rest,
        });
        self.bones.len() - 1
    }

    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Name lookup. Bone names are unique within a skeleton.
    #[must_use]
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// First parentless bone in index order.
    #[must_use]
    pub fn root(&self) -> Option<usize> {
        self.bones.iter().position(|b| b.parent.is_none())
    }
}
