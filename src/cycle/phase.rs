// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later
use std::fmt::{Display, Formatter, Result};

use serde_repr::{Deserialize_repr, Serialize_repr};

/// The two alternating phases of the pick and place cycle.
#[derive(Serialize_repr, Deserialize_repr, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    /// Vacuum outputs are switched on before the move, the part is picked up.
    OutputsHi = 0,
    /// The onboard program switches the vacuum off at the release positions, the part is dropped.
    ProgramThresholds = 1,
}

impl Phase {
    /// Phase of the cycle following a cycle in `self`.
    pub fn next(self) -> Phase {
        match self {
            Phase::OutputsHi => Phase::ProgramThresholds,
            Phase::ProgramThresholds => Phase::OutputsHi,
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{:?}", self)
    }
}
