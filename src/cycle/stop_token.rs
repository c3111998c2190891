// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag which asks a running session to stop.
///
/// Clones refer to the same flag, so one clone can be handed to a signal handler or an
/// operator thread while the session checks another.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stop_requested: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        StopToken::default()
    }

    /// Asks every holder of this token to stop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }
}
