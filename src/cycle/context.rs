// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cycle::phase::Phase;

/// State which is carried from one cycle to the next.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct CycleContext {
    /// Phase of the next cycle.
    pub phase: Phase,
    /// Segment duration used for the next built trajectory.
    pub inter_point_delay: Duration,
    /// Number of detected drops since the session started. Never reset.
    pub drop_count: u64,
    /// Number of completed cycles.
    pub cycles_completed: u64,
}

impl CycleContext {
    /// Creates the context of a new session which starts in [`Phase::OutputsHi`].
    pub fn new(inter_point_delay: Duration) -> Self {
        CycleContext {
            phase: Phase::OutputsHi,
            inter_point_delay,
            drop_count: 0,
            cycles_completed: 0,
        }
    }
}
