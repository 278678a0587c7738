//! Batch orchestration: selects source clips, drives the per-clip pipeline,
//! publishes the results, and restores playback.
//!
//! The host scene graph, playback, and persistence stay behind the
//! [`SkeletonHost`], [`ClipLibrary`], and [`ClipExporter`] traits; the
//! orchestrator only sequences them.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::clip::AnimationClip;
use crate::errors::{RetargetError, Result};
use crate::session::Retargeter;
use crate::skeleton::Skeleton;

/// Which source clips a batch processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetargetMode {
    /// Every clip in the source library.
    #[default]
    AllAnimations,
    /// Only the clip currently assigned on the source player.
    CurrentAnimation,
    /// Only clips the target library does not have yet.
    NewSourceAnimations,
    /// Only clips the target library already has.
    ExistingTargetAnimations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Tres,
    #[default]
    Anim,
}

impl ExportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Tres => ".tres",
            ExportFormat::Anim => ".anim",
        }
    }
}

/// Batch-level settings: clip selection, renaming, publishing, export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub mode: RetargetMode,
    /// Prepended to each published clip name. Surrounding whitespace is
    /// ignored.
    pub rename_prefix: String,
    /// Appended to each published clip name. Surrounding whitespace is
    /// ignored.
    pub rename_suffix: String,
    /// Replace an already-published clip of the same name.
    pub replace_existing: bool,
    /// Export each retargeted clip through the exporter.
    pub export_animations: bool,
    /// Aggregate all retargeted clips into one library container and export
    /// it as a unit.
    pub export_library: bool,
    pub export_format: ExportFormat,
    pub export_directory: String,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            mode: RetargetMode::AllAnimations,
            rename_prefix: String::new(),
            rename_suffix: String::new(),
            replace_existing: true,
            export_animations: false,
            export_library: false,
            export_format: ExportFormat::Anim,
            export_directory: String::new(),
        }
    }
}

/// One recorded export failure. Export failures never abort the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFailure {
    pub path: String,
    pub reason: String,
}

/// What a batch run produced.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Published clip names, in processing order.
    pub retargeted: Vec<String>,
    pub export_failures: Vec<ExportFailure>,
}

// ============================================================================
// Host boundary traits
// ============================================================================

/// Scene-graph services the orchestrator needs from the host.
pub trait SkeletonHost {
    /// Resolves a skeleton node path to its snapshot.
    fn skeleton(&self, path: &str) -> Option<&Skeleton>;
    /// Whether an animation player exists at `path`.
    fn has_player(&self, path: &str) -> bool;
    /// The relative addressing string from a player's root to a skeleton,
    /// consumed literally as a track-path prefix.
    fn player_to_skeleton_prefix(&self, player_path: &str, skeleton_path: &str) -> Option<String>;
    /// Resets the skeleton's bone poses to rest before retargeting runs, so
    /// the algorithmic core never touches skeleton state itself.
    fn reset_pose(&mut self, skeleton_path: &str);
}

/// Clip storage plus the minimal playback surface the orchestrator restores
/// after a batch.
pub trait ClipLibrary {
    fn clip_names(&self) -> Vec<String>;
    fn clip(&self, name: &str) -> Option<&AnimationClip>;
    fn insert_clip(&mut self, name: &str, clip: AnimationClip);
    fn remove_clip(&mut self, name: &str);
    fn has_clip(&self, name: &str) -> bool {
        self.clip(name).is_some()
    }
    /// The currently assigned clip, if any.
    fn assigned_clip(&self) -> Option<String>;
    fn play(&mut self, name: &str);
    fn stop(&mut self);
    fn position(&self) -> f32;
    fn seek(&mut self, time: f32);
}

/// Durable-storage boundary. Failures are reported per item and surfaced in
/// the batch report.
pub trait ClipExporter {
    fn export_clip(&mut self, path: &str, clip: &AnimationClip) -> Result<()>;
    fn export_library(&mut self, path: &str, library: &MemoryLibrary) -> Result<()>;
}

// ============================================================================
// In-memory library
// ============================================================================

/// Insertion-ordered clip container. Serves as the test double for player
/// libraries and as the aggregation container for library export.
#[derive(Debug, Clone, Default)]
pub struct MemoryLibrary {
    clips: Vec<(String, AnimationClip)>,
    assigned: Option<String>,
    playing: bool,
    position: f32,
}

impl MemoryLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn clips(&self) -> impl Iterator<Item = (&str, &AnimationClip)> {
        self.clips.iter().map(|(name, clip)| (name.as_str(), clip))
    }
}

impl ClipLibrary for MemoryLibrary {
    fn clip_names(&self) -> Vec<String> {
        self.clips.iter().map(|(name, _)| name.clone()).collect()
    }

    fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clips
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, clip)| clip)
    }

    fn insert_clip(&mut self, name: &str, clip: AnimationClip) {
        if let Some(entry) = self.clips.iter_mut().find(|(n, _)| n == name) {
            entry.1 = clip;
        } else {
            self.clips.push((name.to_string(), clip));
        }
    }

    fn remove_clip(&mut self, name: &str) {
        self.clips.retain(|(n, _)| n != name);
    }

    fn assigned_clip(&self) -> Option<String> {
        self.assigned.clone()
    }

    fn play(&mut self, name: &str) {
        self.assigned = Some(name.to_string());
        self.playing = true;
    }

    fn stop(&mut self) {
        self.playing = false;
        self.position = 0.0;
    }

    fn position(&self) -> f32 {
        self.position
    }

    fn seek(&mut self, time: f32) {
        self.position = time;
    }
}

// ============================================================================
// Batch run
// ============================================================================

/// Validates the setup, resets poses, (re)computes the retargeting map, and
/// retargets every clip the mode selects. Publishes each result under
/// `prefix + name + suffix`, optionally exporting it, then restores playback
/// on both players.
///
/// Setup failures abort before anything is mutated. Export failures are
/// collected in the report and never abort the batch.
pub fn start_retargeting<H, S, T>(
    session: &mut Retargeter,
    host: &mut H,
    source_library: &mut S,
    target_library: &mut T,
    mut exporter: Option<&mut dyn ClipExporter>,
    settings: &BatchSettings,
) -> Result<BatchReport>
where
    H: SkeletonHost,
    S: ClipLibrary,
    T: ClipLibrary,
{
    validate_setup(session, host, source_library, settings)?;

    let source_skeleton_path = session.source_skeleton_path().to_string();
    let target_skeleton_path = session.target_skeleton_path().to_string();
    host.reset_pose(&source_skeleton_path);
    host.reset_pose(&target_skeleton_path);

    let source_prefix = host
        .player_to_skeleton_prefix(session.source_player_path(), &source_skeleton_path)
        .ok_or_else(|| {
            RetargetError::Setup("cannot resolve source player-to-skeleton path".to_string())
        })?;
    let target_prefix = host
        .player_to_skeleton_prefix(session.target_player_path(), &target_skeleton_path)
        .ok_or_else(|| {
            RetargetError::Setup("cannot resolve target player-to-skeleton path".to_string())
        })?;

    let source_skeleton = host
        .skeleton(&source_skeleton_path)
        .ok_or_else(|| RetargetError::Setup("missing source skeleton".to_string()))?;
    let target_skeleton = host
        .skeleton(&target_skeleton_path)
        .ok_or_else(|| RetargetError::Setup("missing target skeleton".to_string()))?;

    let source_assigned = source_library.assigned_clip();
    let target_assigned = target_library.assigned_clip();

    session.calculate_retargeting_data(
        source_skeleton,
        target_skeleton,
        &source_prefix,
        &target_prefix,
    )?;

    let prefix = settings.rename_prefix.trim();
    let suffix = settings.rename_suffix.trim();
    let directory = settings.export_directory.trim();

    let mut report = BatchReport::default();
    let mut aggregate = settings.export_library.then(MemoryLibrary::new);

    for name in source_library.clip_names() {
        if !selected_by_mode(settings.mode, &name, source_assigned.as_deref(), target_library) {
            continue;
        }
        let Some(source_clip) = source_library.clip(&name) else {
            continue;
        };

        let retargeted = session.retarget_clip(source_clip, target_skeleton)?;
        let published_name = format!("{prefix}{name}{suffix}");

        if settings.replace_existing && target_library.has_clip(&published_name) {
            target_library.remove_clip(&published_name);
        }
        if !target_library.has_clip(&published_name) {
            target_library.insert_clip(&published_name, retargeted.clone());
        }

        if settings.export_animations {
            if let Some(exporter) = exporter.as_deref_mut() {
                let path = format!(
                    "{directory}/{published_name}{}",
                    settings.export_format.extension()
                );
                if let Err(err) = exporter.export_clip(&path, &retargeted) {
                    warn!("failed to export retargeted clip to '{path}': {err}");
                    report.export_failures.push(ExportFailure {
                        path,
                        reason: err.to_string(),
                    });
                }
            }
        }

        if let Some(aggregate) = aggregate.as_mut() {
            aggregate.insert_clip(&published_name, retargeted);
        }

        report.retargeted.push(published_name);
    }

    if let (Some(aggregate), Some(exporter)) = (aggregate.as_ref(), exporter.as_deref_mut()) {
        if !aggregate.is_empty() {
            let path = format!("{directory}/{prefix}AnimationLibrary{suffix}.scn");
            if let Err(err) = exporter.export_library(&path, aggregate) {
                warn!("failed to export aggregated library to '{path}': {err}");
                report.export_failures.push(ExportFailure {
                    path,
                    reason: err.to_string(),
                });
            }
        }
    }

    restore_playback(source_library, source_assigned.as_deref(), session);
    restore_playback(target_library, target_assigned.as_deref(), session);

    Ok(report)
}

/// Re-retargets the currently assigned clip after a correction tweak so the
/// user sees the adjustment at the paused playback position. No-op unless
/// correction mode is enabled and a clip is assigned on the target player.
pub fn apply_correction_preview<S, T>(
    session: &Retargeter,
    target_skeleton: &Skeleton,
    source_library: &S,
    target_library: &mut T,
    settings: &BatchSettings,
) -> Result<()>
where
    S: ClipLibrary,
    T: ClipLibrary,
{
    if !session.correction_mode() {
        return Ok(());
    }
    let Some(assigned) = target_library.assigned_clip() else {
        return Ok(());
    };
    let position = target_library.position();

    let source_clip = source_library.clip(&assigned).ok_or_else(|| {
        RetargetError::Setup(format!("source library has no clip named '{assigned}'"))
    })?;
    let retargeted = session.retarget_clip(source_clip, target_skeleton)?;

    if settings.replace_existing {
        if target_library.has_clip(&assigned) {
            target_library.remove_clip(&assigned);
        }
        target_library.insert_clip(&assigned, retargeted);
        target_library.play(&assigned);
        target_library.seek(position);
    }
    Ok(())
}

fn validate_setup<H, S>(
    session: &Retargeter,
    host: &H,
    source_library: &S,
    settings: &BatchSettings,
) -> Result<()>
where
    H: SkeletonHost,
    S: ClipLibrary,
{
    if host.skeleton(session.source_skeleton_path()).is_none() {
        return Err(RetargetError::Setup(
            "missing source skeleton, did you pick the wrong path?".to_string(),
        ));
    }
    if host.skeleton(session.target_skeleton_path()).is_none() {
        return Err(RetargetError::Setup(
            "missing target skeleton, did you pick the wrong path?".to_string(),
        ));
    }
    if !host.has_player(session.source_player_path()) {
        return Err(RetargetError::Setup(
            "missing source animation player, did you pick the wrong path?".to_string(),
        ));
    }
    if !host.has_player(session.target_player_path()) {
        return Err(RetargetError::Setup(
            "missing target animation player, did you pick the wrong path?".to_string(),
        ));
    }
    if settings.mode == RetargetMode::CurrentAnimation && source_library.assigned_clip().is_none() {
        return Err(RetargetError::Setup(
            "current-animation mode requires an assigned animation on the source player"
                .to_string(),
        ));
    }
    Ok(())
}

fn selected_by_mode<T: ClipLibrary>(
    mode: RetargetMode,
    name: &str,
    source_assigned: Option<&str>,
    target_library: &T,
) -> bool {
    match mode {
        RetargetMode::AllAnimations => true,
        RetargetMode::CurrentAnimation => source_assigned == Some(name),
        RetargetMode::NewSourceAnimations => !target_library.has_clip(name),
        RetargetMode::ExistingTargetAnimations => target_library.has_clip(name),
    }
}

fn restore_playback<L: ClipLibrary>(
    library: &mut L,
    previously_assigned: Option<&str>,
    session: &Retargeter,
) {
    if let Some(name) = previously_assigned {
        if library.has_clip(name) {
            if session.options.sync_playback {
                library.stop();
            }
            library.play(name);
        }
    }
}
