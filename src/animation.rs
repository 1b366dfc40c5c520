//! Keyframe animation: clip sampling, a single-action mixer, and the manager
//! that tracks which clip is playing.

use glam::{Quat, Vec3};
use tracing::{debug, info};

use crate::constants::{ANIMATION_DEFAULT_SPEED, ANIMATION_MAX_DELTA};
use crate::scene::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    Step,
    /// Outputs are stored as `[in_tangent, value, out_tangent]` per key.
    CubicSpline,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

/// Keyframes driving one property of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub node: usize,
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    pub values: TrackValues,
}

impl Track {
    /// Writes the sampled value at `time` into `transform`.
    pub fn apply(&self, time: f32, transform: &mut Transform) {
        match &self.values {
            TrackValues::Translation(values) => {
                if let Some(v) = sample_vec3(&self.times, values, self.interpolation, time) {
                    transform.translation = v;
                }
            }
            TrackValues::Scale(values) => {
                if let Some(v) = sample_vec3(&self.times, values, self.interpolation, time) {
                    transform.scale = v;
                }
            }
            TrackValues::Rotation(values) => {
                if let Some(q) = sample_quat(&self.times, values, self.interpolation, time) {
                    transform.rotation = q;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    /// Builds a clip whose duration is the last key time across all tracks.
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks
            .iter()
            .filter_map(|t| t.times.last().copied())
            .fold(0.0_f32, f32::max);
        Self {
            name: name.into(),
            duration,
            tracks,
        }
    }

    pub fn apply(&self, time: f32, pose: &mut [Transform]) {
        for track in &self.tracks {
            if let Some(transform) = pose.get_mut(track.node) {
                track.apply(time, transform);
            }
        }
    }
}

enum KeySpan {
    Hold(usize),
    /// `(left, right, t, span)` with `t` in `[0, 1]`
    Between(usize, usize, f32, f32),
}

/// Locates the key interval containing `time`, holding the end keys outside
/// the keyed range.
fn locate(times: &[f32], time: f32) -> Option<KeySpan> {
    let last = times.len().checked_sub(1)?;
    if time <= times[0] {
        return Some(KeySpan::Hold(0));
    }
    if time >= times[last] {
        return Some(KeySpan::Hold(last));
    }
    let right = times.partition_point(|&t| t <= time);
    let left = right - 1;
    let span = times[right] - times[left];
    let t = if span > 0.0 {
        (time - times[left]) / span
    } else {
        0.0
    };
    Some(KeySpan::Between(left, right, t, span))
}

fn hermite<T>(v0: T, b0: T, v1: T, a1: T, t: f32, span: f32) -> T
where
    T: std::ops::Mul<f32, Output = T> + std::ops::Add<Output = T>,
{
    let t2 = t * t;
    let t3 = t2 * t;
    v0 * (2.0 * t3 - 3.0 * t2 + 1.0)
        + b0 * ((t3 - 2.0 * t2 + t) * span)
        + v1 * (-2.0 * t3 + 3.0 * t2)
        + a1 * ((t3 - t2) * span)
}

fn sample_vec3(
    times: &[f32],
    values: &[Vec3],
    interpolation: Interpolation,
    time: f32,
) -> Option<Vec3> {
    let key = |i: usize| -> Option<Vec3> {
        match interpolation {
            Interpolation::CubicSpline => values.get(i * 3 + 1).copied(),
            _ => values.get(i).copied(),
        }
    };
    match locate(times, time)? {
        KeySpan::Hold(i) => key(i),
        KeySpan::Between(l, r, t, span) => match interpolation {
            Interpolation::Step => key(l),
            Interpolation::Linear => Some(key(l)?.lerp(key(r)?, t)),
            Interpolation::CubicSpline => {
                let v0 = *values.get(l * 3 + 1)?;
                let b0 = *values.get(l * 3 + 2)?;
                let a1 = *values.get(r * 3)?;
                let v1 = *values.get(r * 3 + 1)?;
                Some(hermite(v0, b0, v1, a1, t, span))
            }
        },
    }
}

fn sample_quat(
    times: &[f32],
    values: &[Quat],
    interpolation: Interpolation,
    time: f32,
) -> Option<Quat> {
    let key = |i: usize| -> Option<Quat> {
        match interpolation {
            Interpolation::CubicSpline => values.get(i * 3 + 1).copied(),
            _ => values.get(i).copied(),
        }
    };
    let q = match locate(times, time)? {
        KeySpan::Hold(i) => key(i)?,
        KeySpan::Between(l, r, t, span) => match interpolation {
            Interpolation::Step => key(l)?,
            Interpolation::Linear => key(l)?.slerp(key(r)?, t),
            Interpolation::CubicSpline => {
                let v0 = *values.get(l * 3 + 1)?;
                let b0 = *values.get(l * 3 + 2)?;
                let a1 = *values.get(r * 3)?;
                let v1 = *values.get(r * 3 + 1)?;
                hermite(v0, b0, v1, a1, t, span)
            }
        },
    };
    Some(q.normalize())
}

/// One clip playing on the mixer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationAction {
    pub clip: usize,
    pub time: f32,
    pub time_scale: f32,
}

impl AnimationAction {
    fn advance(&mut self, delta: f32, duration: f32) {
        self.time += delta * self.time_scale;
        // Loop forever
        if duration > 0.0 {
            self.time = self.time.rem_euclid(duration);
        } else {
            self.time = 0.0;
        }
    }
}

/// Drives clips onto a pose. Only one action plays at a time.
#[derive(Debug, Clone, Default)]
pub struct AnimationMixer {
    action: Option<AnimationAction>,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clip_action(&mut self, clip: usize, time_scale: f32) -> &mut AnimationAction {
        self.action.insert(AnimationAction {
            clip,
            time: 0.0,
            time_scale,
        })
    }

    pub fn action(&self) -> Option<&AnimationAction> {
        self.action.as_ref()
    }

    pub fn action_mut(&mut self) -> Option<&mut AnimationAction> {
        self.action.as_mut()
    }

    pub fn stop_all_action(&mut self) {
        self.action = None;
    }

    pub fn update(&mut self, delta: f32, clips: &[AnimationClip], pose: &mut [Transform]) {
        let Some(action) = self.action.as_mut() else {
            return;
        };
        let Some(clip) = clips.get(action.clip) else {
            return;
        };
        action.advance(delta, clip.duration);
        clip.apply(action.time, pose);
    }
}

/// Result of switching to another clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationSwitch {
    pub name: String,
    pub index: usize,
    pub total: usize,
}

/// Snapshot of the manager state for display.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationInfo {
    pub has_animations: bool,
    pub count: usize,
    pub current_index: usize,
    pub current_name: Option<String>,
    pub speed: f32,
}

#[derive(Debug, Clone)]
pub struct AnimationManager {
    mixer: Option<AnimationMixer>,
    animations: Vec<AnimationClip>,
    current_index: usize,
    speed: f32,
}

impl Default for AnimationManager {
    fn default() -> Self {
        Self::new(ANIMATION_DEFAULT_SPEED)
    }
}

impl AnimationManager {
    pub fn new(speed: f32) -> Self {
        Self {
            mixer: None,
            animations: Vec::new(),
            current_index: 0,
            speed,
        }
    }

    /// Takes over the clips of a freshly loaded model and starts the
    /// preferred clip, or the first one.
    pub fn initialize(&mut self, animations: Vec<AnimationClip>, preferred: Option<&str>) {
        if animations.is_empty() {
            self.mixer = None;
            self.animations.clear();
            debug!("Model has no animations");
            return;
        }

        self.mixer = Some(AnimationMixer::new());
        self.animations = animations;

        let index = preferred
            .and_then(|name| self.animations.iter().position(|clip| clip.name == name))
            .unwrap_or(0);
        self.current_index = index;
        info!(
            "Playing animation {:?} ({}/{})",
            self.animations[index].name,
            index + 1,
            self.animations.len()
        );
        self.play_animation(index);
    }

    pub fn play_animation(&mut self, index: usize) {
        if index >= self.animations.len() {
            return;
        }
        let speed = self.speed;
        let Some(mixer) = self.mixer.as_mut() else {
            return;
        };
        mixer.stop_all_action();
        mixer.clip_action(index, speed);
    }

    pub fn switch_to_next(&mut self) -> Option<AnimationSwitch> {
        if self.animations.is_empty() || self.mixer.is_none() {
            return None;
        }

        self.current_index = (self.current_index + 1) % self.animations.len();
        self.play_animation(self.current_index);

        Some(AnimationSwitch {
            name: self.animations[self.current_index].name.clone(),
            index: self.current_index,
            total: self.animations.len(),
        })
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
        if let Some(action) = self.mixer.as_mut().and_then(AnimationMixer::action_mut) {
            action.time_scale = speed;
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Advances the playing clip and writes it into `pose`.
    pub fn update(&mut self, delta: f32, pose: &mut [Transform]) {
        let Some(mixer) = self.mixer.as_mut() else {
            return;
        };
        let clamped = delta.min(ANIMATION_MAX_DELTA);
        mixer.update(clamped, &self.animations, pose);
    }

    pub fn info(&self) -> AnimationInfo {
        AnimationInfo {
            has_animations: !self.animations.is_empty(),
            count: self.animations.len(),
            current_index: self.current_index,
            current_name: self
                .animations
                .get(self.current_index)
                .map(|clip| clip.name.clone()),
            speed: self.speed,
        }
    }

    pub fn current_time(&self) -> Option<f32> {
        self.mixer
            .as_ref()
            .and_then(AnimationMixer::action)
            .map(|a| a.time)
    }

    pub fn dispose(&mut self) {
        if let Some(mixer) = self.mixer.as_mut() {
            mixer.stop_all_action();
        }
        self.mixer = None;
        self.animations.clear();
    }
}
