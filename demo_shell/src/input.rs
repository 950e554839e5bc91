//! Input handling.
//!
//! The shell samples one [`InputState`] per frame and hands it to the mounted
//! scene through its context. Headless runs drive it from console commands.

/// User input state at a moment in time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    /// Throttle, -1 (reverse) to 1.
    pub forward: f32,
    /// Steering, -1 (left) to 1.
    pub right: f32,
    pub brake: bool,
}

impl InputState {
    /// Axes clamped to their valid range.
    pub fn clamped(self) -> Self {
        Self {
            forward: self.forward.clamp(-1.0, 1.0),
            right: self.right.clamp(-1.0, 1.0),
            brake: self.brake,
        }
    }

    /// Parses a key string such as `"wd"` or `"s space"` into axes.
    pub fn from_keys(keys: &str) -> Self {
        let mut input = Self::default();
        for token in keys.split_whitespace() {
            if token == "space" {
                input.brake = true;
                continue;
            }
            for key in token.chars() {
                match key {
                    'w' => input.forward += 1.0,
                    's' => input.forward -= 1.0,
                    'd' => input.right += 1.0,
                    'a' => input.right -= 1.0,
                    _ => {}
                }
            }
        }
        input.clamped()
    }

    pub fn is_idle(&self) -> bool {
        self.forward == 0.0 && self.right == 0.0 && !self.brake
    }
}
