use thiserror::Error;

use crate::collision::ObjectHandle;

/// Errors returned by collision-world management operations.
///
/// The per-tick movement path never fails; these only come from adding,
/// moving or removing objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("unknown collision object {0}")]
    UnknownObject(ObjectHandle),

    #[error("collision object pose is not finite")]
    NonFinitePosition,
}
