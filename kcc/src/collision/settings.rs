/*!
Kinematic character controller (KCC) constants and tolerances.

These constants centralize the fixed parameters of the four-phase step
(penetration recovery, step up, step forward, step down) and the defaults the
per-actor [`ControllerSettings`](crate::ControllerSettings) start from.
Keeping them together makes tuning easier and keeps the step phases free of
magic numbers.

Notes
- Distances are in meters, time in seconds, speeds in meters per second.
- Per-actor values (step height, slope limit, speeds) belong in
  `ControllerSettings`; only algorithm invariants live here.
*/

/// Lengths below this are treated as zero instead of being normalized.
pub const SIMD_EPSILON: f32 = f32::EPSILON;

/// Fraction of the penetration depth removed per contact point in one recovery pass.
pub const PENETRATION_RECOVERY_FACTOR: f32 = 0.2;

/// Maximum number of penetration-recovery passes per tick.
/// Residual penetration after this many passes is accepted.
pub const MAX_PENETRATION_LOOPS: u32 = 4;

/// Maximum number of sweep/slide iterations in the forward phase.
pub const MAX_STRAFE_ITERATIONS: u32 = 10;

/// The forward phase stops once less than this fraction of the move remains.
pub const MIN_STRAFE_FRACTION: f32 = 0.01;

/// Cosine of the slope cone accepted by the upward sweep (45 degrees).
pub const STEP_UP_SLOPE_DOT: f32 = 0.7071;

/// Default collision margin (dilation) of controller shapes.
pub const DEFAULT_COLLISION_MARGIN: f32 = 0.0;

/// Extra margin applied to the shape during forward sweeps.
pub const DEFAULT_ADDED_MARGIN: f32 = 0.02;

/// Default maximum step height (meters).
pub const DEFAULT_STEP_HEIGHT: f32 = 0.35;

/// Default maximum walkable slope (degrees).
pub const DEFAULT_MAX_SLOPE_DEG: f32 = 45.0;

/// Default gravity magnitude: three times earth gravity for snappier arcs.
pub const DEFAULT_GRAVITY: f32 = 9.8 * 3.0;

/// Default terminal fall speed, roughly that of a sky diver.
pub const DEFAULT_FALL_SPEED: f32 = 55.0;

/// Default take-off speed of a jump.
pub const DEFAULT_JUMP_SPEED: f32 = 10.0;

/// Default penetration tolerated by sweeps before they report a hit at the start.
pub const DEFAULT_ALLOWED_CCD_PENETRATION: f32 = 0.04;

/// Default distance at which contact points are still reported as touching.
pub const DEFAULT_CONTACT_BREAKING_THRESHOLD: f32 = 0.02;
