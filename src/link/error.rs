// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later
//! Defines the errors that a motion link can report while streaming a trajectory.
use std::fmt::{Debug, Display, Formatter, Result};

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Errors reported by the motion link or one of the amplifiers behind it.
#[derive(Serialize_repr, Deserialize_repr, Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u16)]
#[derive(FromPrimitive, ToPrimitive)]
pub enum LinkErrorKind {
    /// An axis node was not in the state required to accept the trajectory.
    NodeState = 0,
    /// The link did not confirm the start of the move in time.
    StartMoveTimeout = 1,
    /// The move did not finish within the requested timeout.
    MoveTimeout = 2,
    /// The amplifiers ran out of trajectory points while moving.
    Underflow = 3,
    /// An amplifier reported a fault and disabled its output stage.
    AmpFault = 4,
    /// The following error of an axis exceeded its limit.
    TrackingError = 5,
    /// The underlying network is down or a node stopped responding.
    NetworkDown = 6,
    /// The trajectory was rejected, e.g. because it is empty or violates the move limits.
    BadTrajectory = 7,
    /// A code which is not known to this library.
    Unknown = 0xFFFF,
}

impl LinkErrorKind {
    /// Maps a raw error code of the link to a kind. Unknown codes map to
    /// [`Unknown`](`LinkErrorKind::Unknown`).
    pub fn from_code(code: u16) -> LinkErrorKind {
        LinkErrorKind::from_u16(code).unwrap_or(LinkErrorKind::Unknown)
    }

    /// True if a send that failed with this kind may be repeated with the same points.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LinkErrorKind::NodeState | LinkErrorKind::StartMoveTimeout
        )
    }
}

impl Display for LinkErrorKind {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{:?}", self)
    }
}
