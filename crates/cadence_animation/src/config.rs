//! Animator defaults

/// Defaults applied to animations that do not set their own tween or duration
#[derive(Clone, Debug, PartialEq)]
pub struct AnimatorConfig {
    /// Registered tween name
    pub default_tween: String,
    /// Seconds
    pub default_duration: f64,
}

impl AnimatorConfig {
    /// Quick UI-style transitions
    pub fn snappy() -> Self {
        Self {
            default_tween: "decelerate".to_string(),
            default_duration: 0.25,
        }
    }
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            default_tween: "linear".to_string(),
            default_duration: 1.0,
        }
    }
}
