//! Action selection
//!
//! [`AnimationController`] keeps track of which clip is "the" current action
//! of a character and turns requests for a named clip into mixer calls: the
//! first request plays directly, later ones cross-fade from the current
//! action. Asking for the clip that is already current does nothing.

use crate::{ActionId, AnimationClip, AnimationMixer, LoopMode};

/// Currently selected action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationState {
    pub action: String,
    pub loop_mode: LoopMode,
}

/// Outcome of an action request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// First action, played without a fade
    Started,
    /// Cross-faded from the named action
    CrossFaded { from: String },
    /// Requested action was already current
    Unchanged,
    /// No clip with that name
    UnknownClip,
}

/// Chooses and blends the current action of one character
#[derive(Debug)]
pub struct AnimationController {
    mixer: AnimationMixer,
    current: Option<(ActionId, AnimationState)>,
    cross_fade: f32,
}

impl AnimationController {
    /// Controller over `clips`, fading for `cross_fade` seconds between actions
    pub fn new(clips: impl IntoIterator<Item = AnimationClip>, cross_fade: f32) -> Self {
        let mut mixer = AnimationMixer::new();
        for clip in clips {
            mixer.add_clip(clip);
        }
        Self {
            mixer,
            current: None,
            cross_fade,
        }
    }

    /// Make `name` the current action
    pub fn request(&mut self, name: &str, loop_mode: LoopMode) -> Transition {
        if self
            .current
            .as_ref()
            .is_some_and(|(_, state)| state.action == name)
        {
            return Transition::Unchanged;
        }
        let Some(next) = self.mixer.clip_action(name) else {
            log::debug!("No animation clip named {:?}", name);
            return Transition::UnknownClip;
        };

        if let Some(action) = self.mixer.action_mut(next) {
            action.loop_mode = loop_mode;
            action.clamp_when_finished = true;
        }

        let state = AnimationState {
            action: name.to_string(),
            loop_mode,
        };
        let transition = match self.current.replace((next, state)) {
            None => {
                self.mixer.reset(next);
                self.mixer.play(next);
                Transition::Started
            }
            Some((previous, previous_state)) => {
                self.mixer.cross_fade(previous, next, self.cross_fade);
                Transition::CrossFaded {
                    from: previous_state.action,
                }
            }
        };
        log::trace!("Animation -> {} ({:?})", name, transition);
        transition
    }

    pub fn state(&self) -> Option<&AnimationState> {
        self.current.as_ref().map(|(_, state)| state)
    }

    /// Name of the current action
    pub fn current_action(&self) -> Option<&str> {
        self.state().map(|state| state.action.as_str())
    }

    /// Advance the mixer
    pub fn update(&mut self, dt: f32) {
        self.mixer.update(dt);
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    pub fn cross_fade_duration(&self) -> f32 {
        self.cross_fade
    }
}
