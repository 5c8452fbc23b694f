//! Volume control
//!
//! Volume is a linear level in `[0, 1]` handed straight to the media output.
//! Mute is kept separate so toggling it never loses the level.

/// Volume controller
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// Linear level (0.0 - 1.0)
    level: f32,

    /// Mute state (preserves volume level)
    muted: bool,
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Volume {
    /// Create new volume controller, clamping the level into `[0, 1]`
    pub fn new(level: f32) -> Self {
        Self {
            level: Self::clamp(level),
            muted: false,
        }
    }

    /// Set volume level
    ///
    /// Any positive level also clears mute. A level of zero leaves the
    /// mute flag as it was.
    pub fn set_level(&mut self, level: f32) {
        self.level = Self::clamp(level);
        if self.level > 0.0 {
            self.muted = false;
        }
    }

    /// Current volume level (0.0 - 1.0)
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Mute audio (preserves volume level)
    pub fn mute(&mut self) {
        self.muted = true;
    }

    /// Unmute audio
    pub fn unmute(&mut self) {
        self.muted = false;
    }

    /// Toggle mute state, returning the new state
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Gain actually audible: 0.0 when muted, otherwise the level
    pub fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.level
        }
    }

    fn clamp(level: f32) -> f32 {
        if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 1.0)
        }
    }
}
