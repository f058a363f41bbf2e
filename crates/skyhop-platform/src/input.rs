//! Input Handling
//!
//! Raw keyboard and pointer events folded into a per-frame input state.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::window::Viewport;

/// Input event types
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Keyboard key pressed (repeats while held)
    KeyPressed(KeyCode),
    /// Keyboard key released
    KeyReleased(KeyCode),
    /// Pointer moved, in client pixel coordinates
    PointerMoved { x: f32, y: f32 },
    /// Window was resized
    Resized { width: f32, height: f32 },
}

/// Keyboard key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    W, A, S, D,
    Space,
    Escape,
    Other(char),
}

impl KeyCode {
    /// Map a printed key to a key code (`' '` is the jump key)
    pub fn from_char(c: char) -> Self {
        match c.to_ascii_lowercase() {
            'w' => KeyCode::W,
            'a' => KeyCode::A,
            's' => KeyCode::S,
            'd' => KeyCode::D,
            ' ' => KeyCode::Space,
            '\u{1b}' => KeyCode::Escape,
            other => KeyCode::Other(other),
        }
    }

    /// Whether the key drives one of the four movement axes
    pub fn is_movement(&self) -> bool {
        matches!(self, KeyCode::W | KeyCode::A | KeyCode::S | KeyCode::D)
    }
}

/// Held state of the movement keys, each 0.0 or 1.0
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovementKeys {
    pub forward: f32,
    pub back: f32,
    pub left: f32,
    pub right: f32,
}

impl MovementKeys {
    /// Whether any movement key is held
    pub fn any(&self) -> bool {
        self.forward != 0.0 || self.back != 0.0 || self.left != 0.0 || self.right != 0.0
    }
}

/// A key going down or up, recorded in arrival order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEdge {
    pub key: KeyCode,
    pub pressed: bool,
    /// Whether a movement key was still held once this edge applied
    pub movement_held: bool,
}

/// Input state owned by the frame driver
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Currently pressed keys
    keys_pressed: HashSet<KeyCode>,
    /// Keys pressed since the last `end_frame`
    keys_just_pressed: HashSet<KeyCode>,
    /// Keys released since the last `end_frame`
    keys_just_released: HashSet<KeyCode>,
    /// Key state changes since the last `end_frame`, oldest first
    key_edges: Vec<KeyEdge>,
    /// Pointer position normalized to [-1, 1]²
    mouse: Vec2,
    /// Pending jump request (edge triggered)
    jump_requested: bool,
    /// Viewport used to normalize pointer events
    viewport: Viewport,
}

impl InputState {
    /// Create a new input state
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// Check if a key is currently pressed
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Check if a key was pressed this frame
    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.keys_just_pressed.contains(&key)
    }

    /// Check if a key was released this frame
    pub fn is_key_just_released(&self, key: KeyCode) -> bool {
        self.keys_just_released.contains(&key)
    }

    /// Whether any movement key went down this frame
    pub fn movement_just_pressed(&self) -> bool {
        self.keys_just_pressed.iter().any(KeyCode::is_movement)
    }

    /// Whether any key went up this frame
    pub fn any_key_just_released(&self) -> bool {
        !self.keys_just_released.is_empty()
    }

    /// Key state changes of this frame, in the order they arrived.
    ///
    /// Auto-repeated presses of a held key are not edges.
    pub fn key_edges(&self) -> &[KeyEdge] {
        &self.key_edges
    }

    fn record_edge(&mut self, key: KeyCode, pressed: bool) {
        let movement_held = self.keys_pressed.iter().any(KeyCode::is_movement);
        self.key_edges.push(KeyEdge {
            key,
            pressed,
            movement_held,
        });
    }

    /// Held state of the movement keys
    pub fn movement(&self) -> MovementKeys {
        let axis = |key| if self.is_key_pressed(key) { 1.0 } else { 0.0 };
        MovementKeys {
            forward: axis(KeyCode::W),
            back: axis(KeyCode::S),
            left: axis(KeyCode::A),
            right: axis(KeyCode::D),
        }
    }

    /// Pointer offset in [-1, 1]², recomputed from the latest pointer event
    pub fn mouse(&self) -> Vec2 {
        self.mouse
    }

    /// Current viewport
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Whether a jump request is pending
    pub fn jump_requested(&self) -> bool {
        self.jump_requested
    }

    /// Consume the pending jump request
    pub fn take_jump_request(&mut self) -> bool {
        std::mem::take(&mut self.jump_requested)
    }

    /// Handle an input event
    pub fn handle_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyPressed(key) => {
                if self.keys_pressed.insert(key) {
                    self.keys_just_pressed.insert(key);
                    self.record_edge(key, true);
                    if key == KeyCode::Space {
                        self.jump_requested = true;
                    }
                }
            }
            InputEvent::KeyReleased(key) => {
                if self.keys_pressed.remove(&key) {
                    self.keys_just_released.insert(key);
                    self.record_edge(key, false);
                }
            }
            InputEvent::PointerMoved { x, y } => {
                self.mouse = self.viewport.normalize(x, y);
            }
            InputEvent::Resized { width, height } => match Viewport::new(width, height) {
                Ok(viewport) => self.viewport = viewport,
                Err(err) => log::debug!("Ignoring resize: {}", err),
            },
        }
    }

    /// Clear per-frame state (call at the end of each frame)
    pub fn end_frame(&mut self) {
        self.keys_just_pressed.clear();
        self.keys_just_released.clear();
        self.key_edges.clear();
        self.jump_requested = false;
    }
}
