use crate::collision::{
    UpAxis,
    settings::{
        DEFAULT_ADDED_MARGIN, DEFAULT_FALL_SPEED, DEFAULT_GRAVITY, DEFAULT_JUMP_SPEED,
        DEFAULT_MAX_SLOPE_DEG, DEFAULT_STEP_HEIGHT,
    },
};

/// Per-actor kinematic character controller (KCC) tuning.
///
/// Notes
/// - Values are expressed in meters, seconds and radians.
/// - Nothing here is validated; negative or non-finite values produce
///   whatever motion the step phases compute from them.
/// - With the `serde` feature, missing fields fall back to [`Default`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ControllerSettings {
    /// Maximum height of a step the character climbs without jumping (meters).
    pub step_height: f32,

    /// Steepest walkable slope (radians). Steeper surfaces are not stood on.
    pub max_slope_radians: f32,

    /// Downward acceleration magnitude (m/s²).
    pub gravity: f32,

    /// Terminal fall speed (m/s).
    pub fall_speed: f32,

    /// Take-off speed of a jump (m/s). Also caps upward vertical velocity.
    pub jump_speed: f32,

    /// Extra margin added to the shape during forward sweeps (meters).
    pub added_margin: f32,

    pub up_axis: UpAxis,

    /// Lerp to the step-up hit instead of snapping to the full step target.
    pub interpolate_up: bool,

    /// Recompute landing fractions from the hit height to avoid bouncing on
    /// descent, and clamp the drop distance to the terminal fall speed.
    pub bounce_fix: bool,

    /// Sweep only against the ghost's overlapping pairs instead of the whole world.
    ///
    /// Off by default: the pair cache is built from the ghost's bounds at the
    /// start of the tick, so a ghost sweep misses anything the move reaches
    /// beyond them.
    pub use_ghost_sweep_test: bool,

    /// Deflect the forward target along the last touching normal before sweeping.
    pub deflect_touching_contact: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            step_height: DEFAULT_STEP_HEIGHT,
            max_slope_radians: DEFAULT_MAX_SLOPE_DEG.to_radians(),
            gravity: DEFAULT_GRAVITY,
            fall_speed: DEFAULT_FALL_SPEED,
            jump_speed: DEFAULT_JUMP_SPEED,
            added_margin: DEFAULT_ADDED_MARGIN,
            up_axis: UpAxis::Y,
            interpolate_up: true,
            bounce_fix: false,
            use_ghost_sweep_test: false,
            deflect_touching_contact: false,
        }
    }
}

impl ControllerSettings {
    /// Default settings with the given step height.
    pub fn with_step_height(step_height: f32) -> Self {
        Self {
            step_height,
            ..Self::default()
        }
    }
}
