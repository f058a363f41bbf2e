//! Animation Mixer
//!
//! Holds the clips of one animated object and one action per clip. Each
//! action keeps its own playback time and blend weight; weights change over
//! time through fades, which is how cross-fades are expressed.

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::{AnimationClip, LoopMode};

/// Index of an action inside its mixer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(usize);

/// Weight ramp in progress
#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
}

/// Playback state of one clip
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationAction {
    clip_name: String,
    clip_duration: f32,
    pub loop_mode: LoopMode,
    /// Hold the last frame after a play-once action ends
    pub clamp_when_finished: bool,
    time: f32,
    weight: f32,
    fade: Option<Fade>,
    running: bool,
    finished: bool,
}

impl AnimationAction {
    fn new(clip: &AnimationClip) -> Self {
        Self {
            clip_name: clip.name.clone(),
            clip_duration: clip.duration,
            loop_mode: LoopMode::Repeat,
            clamp_when_finished: false,
            time: 0.0,
            weight: 1.0,
            fade: None,
            running: false,
            finished: false,
        }
    }

    pub fn clip_name(&self) -> &str {
        &self.clip_name
    }

    /// Playback position in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Blend weight in [0, 1]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// A play-once action that reached its last frame
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    fn fade_to(&mut self, to: f32, duration: f32) {
        if duration <= 0.0 {
            self.weight = to;
            self.fade = None;
            if to == 0.0 {
                self.running = false;
            }
            return;
        }
        self.fade = Some(Fade {
            from: self.weight,
            to,
            duration,
            elapsed: 0.0,
        });
    }

    fn advance(&mut self, dt: f32) {
        if let Some(fade) = &mut self.fade {
            fade.elapsed += dt;
            let k = (fade.elapsed / fade.duration).min(1.0);
            self.weight = fade.from + (fade.to - fade.from) * k;
            if k >= 1.0 {
                let target = fade.to;
                self.fade = None;
                if target == 0.0 {
                    self.running = false;
                    return;
                }
            }
        }

        if self.finished {
            return;
        }

        self.time += dt;
        if self.time < self.clip_duration {
            return;
        }
        match self.loop_mode {
            LoopMode::Repeat => {
                if self.clip_duration > 0.0 {
                    self.time = self.time.rem_euclid(self.clip_duration);
                }
            }
            LoopMode::Once => {
                self.time = self.clip_duration;
                self.finished = true;
                if !self.clamp_when_finished {
                    self.running = false;
                }
            }
        }
    }
}

/// Animation mixer for a single animated object
#[derive(Debug, Default)]
pub struct AnimationMixer {
    clips: Vec<AnimationClip>,
    clip_index: AHashMap<String, usize>,
    actions: SmallVec<[AnimationAction; 4]>,
    action_by_clip: AHashMap<usize, ActionId>,
    time: f64,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip, replacing any clip with the same name
    pub fn add_clip(&mut self, clip: AnimationClip) {
        match self.clip_index.get(&clip.name) {
            Some(&index) => self.clips[index] = clip,
            None => {
                self.clip_index.insert(clip.name.clone(), self.clips.len());
                self.clips.push(clip);
            }
        }
    }

    pub fn find_clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clip_index.get(name).map(|&index| &self.clips[index])
    }

    /// The action for a clip, created on first use
    pub fn clip_action(&mut self, name: &str) -> Option<ActionId> {
        let clip = *self.clip_index.get(name)?;
        if let Some(&id) = self.action_by_clip.get(&clip) {
            return Some(id);
        }

        let id = ActionId(self.actions.len());
        self.actions.push(AnimationAction::new(&self.clips[clip]));
        self.action_by_clip.insert(clip, id);
        Some(id)
    }

    pub fn action(&self, id: ActionId) -> Option<&AnimationAction> {
        self.actions.get(id.0)
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut AnimationAction> {
        self.actions.get_mut(id.0)
    }

    /// Start an action at full weight
    pub fn play(&mut self, id: ActionId) {
        if let Some(action) = self.actions.get_mut(id.0) {
            action.running = true;
        }
    }

    /// Rewind an action and cancel any fade
    pub fn reset(&mut self, id: ActionId) {
        if let Some(action) = self.actions.get_mut(id.0) {
            action.time = 0.0;
            action.weight = 1.0;
            action.fade = None;
            action.finished = false;
        }
    }

    pub fn stop(&mut self, id: ActionId) {
        if let Some(action) = self.actions.get_mut(id.0) {
            action.running = false;
            action.fade = None;
        }
    }

    /// Fade `from` out and `to` in over `duration` seconds.
    ///
    /// `to` restarts from its first frame.
    pub fn cross_fade(&mut self, from: ActionId, to: ActionId, duration: f32) {
        if from == to {
            return;
        }
        self.reset(to);
        if let Some(action) = self.actions.get_mut(to.0) {
            action.running = true;
            action.weight = 0.0;
            action.fade_to(1.0, duration);
        }
        if let Some(action) = self.actions.get_mut(from.0) {
            action.fade_to(0.0, duration);
        }
    }

    /// Advance every running action by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.time += dt as f64;
        for action in self.actions.iter_mut().filter(|action| action.running) {
            action.advance(dt);
        }
    }

    /// Total time advanced
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn running_actions(&self) -> impl Iterator<Item = &AnimationAction> {
        self.actions.iter().filter(|action| action.running)
    }
}
