// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains helpers for running the cycle loop with realtime priority.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::exception::{ZheadException, ZheadResult};

/// Used to decide whether to enforce realtime mode for the thread which runs the cycle loop.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum RealtimeConfig {
    Enforce,
    Ignore,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        RealtimeConfig::Ignore
    }
}

/// Present on kernels built with PREEMPT_RT.
const REALTIME_KERNEL_MARKER: &str = "/sys/kernel/realtime";

/// Prepares the thread which runs the cycle loop according to `config`.
///
/// With [`Enforce`](`RealtimeConfig::Enforce`) the thread is scheduled with `SCHED_FIFO` one
/// below the maximum priority and all current and future pages of the process are locked, so
/// neither the scheduler nor paging delays a send while the axes move.
/// # Errors
/// * [`RealTimeException`](`crate::exception::ZheadException::RealTimeException`) if realtime
/// is enforced but the kernel is not a realtime kernel, the priority cannot be raised or the
/// memory cannot be locked. Raising the priority needs an `rtprio` entry for the user in
/// `/etc/security/limits.conf`.
pub fn apply_realtime_config(config: RealtimeConfig) -> ZheadResult<()> {
    match config {
        RealtimeConfig::Ignore => Ok(()),
        RealtimeConfig::Enforce => enforce_realtime(Path::new(REALTIME_KERNEL_MARKER)),
    }
}

fn enforce_realtime(kernel_marker: &Path) -> ZheadResult<()> {
    if !kernel_marker.exists() {
        return Err(realtime_error(format!(
            "{} is missing, the kernel cannot run the cycle loop in realtime",
            kernel_marker.display()
        )));
    }
    raise_cycle_thread_priority()?;
    lock_process_memory()
}

fn raise_cycle_thread_priority() -> ZheadResult<()> {
    let max_priority = unsafe { libc::sched_get_priority_max(libc::SCHED_FIFO) };
    if max_priority == -1 {
        return Err(realtime_error("cannot query the SCHED_FIFO priority range"));
    }
    let parameters = libc::sched_param {
        sched_priority: max_priority - 1,
    };
    let result =
        unsafe { libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_FIFO, &parameters) };
    if result != 0 {
        return Err(realtime_error(format!(
            "cannot move the cycle thread to SCHED_FIFO priority {} (error {})",
            parameters.sched_priority, result
        )));
    }
    Ok(())
}

fn lock_process_memory() -> ZheadResult<()> {
    if unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) } != 0 {
        return Err(realtime_error("cannot lock the trajectory buffers in memory"));
    }
    Ok(())
}

fn realtime_error(message: impl Into<String>) -> ZheadException {
    ZheadException::RealTimeException {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use crate::control_tools::{apply_realtime_config, enforce_realtime, RealtimeConfig};
    use crate::exception::ZheadException;

    #[test]
    fn ignore_never_fails() {
        assert!(apply_realtime_config(RealtimeConfig::Ignore).is_ok());
    }

    #[test]
    fn enforce_without_realtime_kernel_fails_before_touching_the_scheduler() {
        let directory = tempfile::tempdir().unwrap();
        match enforce_realtime(&directory.path().join("realtime")) {
            Err(ZheadException::RealTimeException { message }) => {
                assert!(message.contains("realtime"))
            }
            other => panic!("expected RealTimeException but found {:?}", other),
        }
    }
}
