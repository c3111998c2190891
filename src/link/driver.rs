// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the zhead::LinkDriver type which streams buffered trajectories to a motion link.
use std::time::Duration;

use tracing::{error, warn};

use crate::cycle::stop_token::StopToken;
use crate::exception::{create_validation_error, ZheadException, ZheadResult};
use crate::link::error::LinkErrorKind;
use crate::link::{MotionLink, MoveLimits};
use crate::trajectory::segment_buffer::SegmentBuffer;

/// Classified result of a single trajectory send.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SendResult {
    Success,
    /// The send failed but may be repeated with the same points.
    Transient(LinkErrorKind),
    /// The send failed and the session has to be ended.
    Fatal(LinkErrorKind),
}

impl From<Result<(), LinkErrorKind>> for SendResult {
    fn from(result: Result<(), LinkErrorKind>) -> Self {
        match result {
            Ok(()) => SendResult::Success,
            Err(kind) if kind.is_transient() => SendResult::Transient(kind),
            Err(kind) => SendResult::Fatal(kind),
        }
    }
}

/// Sends the queued points of a [`SegmentBuffer`] to a [`MotionLink`] and tracks what the link
/// executed.
pub struct LinkDriver<L: MotionLink> {
    link: L,
    max_send_attempts: Option<u32>,
    in_flight: usize,
}

impl<L: MotionLink> LinkDriver<L> {
    /// Creates a new driver.
    /// # Arguments
    /// * `link` - The link which executes the trajectories.
    /// * `max_send_attempts` - Upper bound of attempts in
    /// [`send_with_retry`](`Self::send_with_retry`). `None` retries until the send succeeds, a
    /// fatal error occurs or a stop is requested.
    pub fn new(link: L, max_send_attempts: Option<u32>) -> Self {
        LinkDriver {
            link,
            max_send_attempts,
            in_flight: 0,
        }
    }

    /// Sets the path limits of the link.
    /// # Errors
    /// * [`FatalLinkError`](`crate::exception::ZheadException::FatalLinkError`) if the link rejects the limits.
    pub fn set_move_limits(&mut self, limits: MoveLimits) -> ZheadResult<()> {
        self.link
            .set_move_limits(limits)
            .map_err(|kind| fatal(kind, "setting the move limits"))
    }

    /// Sends the queued points of `buffer` once and classifies the outcome.
    pub fn send_trajectory(&mut self, buffer: &SegmentBuffer) -> SendResult {
        let points = buffer.queued_points();
        let result = SendResult::from(self.link.send_trajectory(points));
        if result == SendResult::Success {
            self.in_flight = points.len();
        }
        result
    }

    /// Sends the queued points of `buffer`, repeating the send immediately as long as the link
    /// reports a transient error.
    ///
    /// Every attempt sends exactly the same points. The stop token is checked before each
    /// attempt.
    /// # Errors
    /// * [`ValidationError`](`crate::exception::ZheadException::ValidationError`) if the buffer has no queued points.
    /// * [`Stopped`](`crate::exception::ZheadException::Stopped`) if a stop was requested.
    /// * [`FatalLinkError`](`crate::exception::ZheadException::FatalLinkError`) if the link
    /// reports a fatal error or the attempt limit is reached.
    /// # Return
    /// Number of attempts needed.
    pub fn send_with_retry(
        &mut self,
        buffer: &SegmentBuffer,
        stop_token: &StopToken,
    ) -> ZheadResult<u32> {
        if buffer.point_count() == 0 {
            return Err(create_validation_error("no queued points to send"));
        }
        let mut attempts = 0;
        loop {
            if stop_token.is_stop_requested() {
                return Err(ZheadException::Stopped);
            }
            attempts = count_attempt(attempts);
            match self.send_trajectory(buffer) {
                SendResult::Success => return Ok(attempts),
                SendResult::Transient(kind) => {
                    warn!(%kind, attempt = attempts, "sending trajectory failed, attempting again");
                    if let Some(max_send_attempts) = self.max_send_attempts {
                        if attempts >= max_send_attempts {
                            error!(attempts, "giving up sending trajectory");
                            return Err(fatal(kind, "sending the trajectory"));
                        }
                    }
                }
                SendResult::Fatal(kind) => {
                    return Err(fatal(kind, "sending the trajectory"));
                }
            }
        }
    }

    /// Blocks until the link executed the last sent trajectory, then consumes the sent points
    /// from `buffer`.
    /// # Arguments
    /// * `timeout` - Maximum time to wait, `None` waits indefinitely.
    /// # Errors
    /// * [`FatalLinkError`](`crate::exception::ZheadException::FatalLinkError`) if the link
    /// reports any error, including a timeout.
    pub fn wait_move_done(
        &mut self,
        buffer: &mut SegmentBuffer,
        timeout: Option<Duration>,
    ) -> ZheadResult<()> {
        self.link
            .wait_move_done(timeout)
            .map_err(|kind| fatal(kind, "waiting for the linkage move to finish"))?;
        buffer.consume(self.in_flight);
        self.in_flight = 0;
        Ok(())
    }

    /// Commands the link to decelerate all axes to standstill.
    pub fn halt(&mut self) -> ZheadResult<()> {
        self.link
            .halt()
            .map_err(|kind| fatal(kind, "halting the axes"))
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn into_link(self) -> L {
        self.link
    }
}

/// A persisting transient fault may be retried indefinitely, so the count stops at `u32::MAX`.
fn count_attempt(attempts: u32) -> u32 {
    attempts.saturating_add(1)
}

fn fatal(kind: LinkErrorKind, context: &str) -> ZheadException {
    ZheadException::FatalLinkError {
        kind,
        context: context.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crate::cycle::stop_token::StopToken;
    use crate::exception::ZheadException;
    use crate::link::driver::{count_attempt, LinkDriver, SendResult};
    use crate::link::error::LinkErrorKind;
    use crate::link::MockMotionLink;
    use crate::trajectory::pvt_point::PvtPoint;
    use crate::trajectory::segment_buffer::SegmentBuffer;
    use mockall::Sequence;
    use std::time::Duration;

    fn buffer_with_points(count: usize) -> SegmentBuffer {
        let mut buffer = SegmentBuffer::new(3).unwrap();
        for i in 0..count {
            let x = i as f64 * 1000.;
            buffer
                .append_point(&[x, x, x], Duration::from_millis(10))
                .unwrap();
        }
        buffer
    }

    #[test]
    fn results_are_classified() {
        assert_eq!(SendResult::from(Ok(())), SendResult::Success);
        assert_eq!(
            SendResult::from(Err(LinkErrorKind::NodeState)),
            SendResult::Transient(LinkErrorKind::NodeState)
        );
        assert_eq!(
            SendResult::from(Err(LinkErrorKind::StartMoveTimeout)),
            SendResult::Transient(LinkErrorKind::StartMoveTimeout)
        );
        assert_eq!(
            SendResult::from(Err(LinkErrorKind::AmpFault)),
            SendResult::Fatal(LinkErrorKind::AmpFault)
        );
    }

    #[test]
    fn transient_errors_resend_the_same_points() {
        let buffer = buffer_with_points(5);
        let expected: Vec<PvtPoint> = buffer.queued_points().to_vec();
        let mut link = MockMotionLink::new();
        let mut sequence = Sequence::new();
        for kind in [
            LinkErrorKind::NodeState,
            LinkErrorKind::StartMoveTimeout,
            LinkErrorKind::NodeState,
        ]
        .iter()
        {
            let kind = *kind;
            let expected = expected.clone();
            link.expect_send_trajectory()
                .withf(move |points: &[PvtPoint]| points == expected.as_slice())
                .times(1)
                .in_sequence(&mut sequence)
                .returning(move |_| Err(kind));
        }
        let expected_last = expected.clone();
        link.expect_send_trajectory()
            .withf(move |points: &[PvtPoint]| points == expected_last.as_slice())
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(()));

        let mut driver = LinkDriver::new(link, None);
        let attempts = driver.send_with_retry(&buffer, &StopToken::new()).unwrap();
        assert_eq!(attempts, 4);
        assert_eq!(buffer.queued_points(), expected.as_slice());
    }

    #[test]
    fn fatal_errors_are_not_retried() {
        let buffer = buffer_with_points(3);
        let mut link = MockMotionLink::new();
        link.expect_send_trajectory()
            .times(1)
            .returning(|_| Err(LinkErrorKind::TrackingError));
        let mut driver = LinkDriver::new(link, None);
        match driver.send_with_retry(&buffer, &StopToken::new()) {
            Err(ZheadException::FatalLinkError { kind, .. }) => {
                assert_eq!(kind, LinkErrorKind::TrackingError)
            }
            other => panic!("expected FatalLinkError but found {:?}", other),
        }
    }

    #[test]
    fn attempt_limit_turns_transient_into_fatal() {
        let buffer = buffer_with_points(3);
        let mut link = MockMotionLink::new();
        link.expect_send_trajectory()
            .times(3)
            .returning(|_| Err(LinkErrorKind::StartMoveTimeout));
        let mut driver = LinkDriver::new(link, Some(3));
        match driver.send_with_retry(&buffer, &StopToken::new()) {
            Err(ZheadException::FatalLinkError { kind, .. }) => {
                assert_eq!(kind, LinkErrorKind::StartMoveTimeout)
            }
            other => panic!("expected FatalLinkError but found {:?}", other),
        }
    }

    #[test]
    fn attempt_count_saturates_for_endless_retries() {
        assert_eq!(count_attempt(0), 1);
        assert_eq!(count_attempt(u32::MAX - 1), u32::MAX);
        assert_eq!(count_attempt(u32::MAX), u32::MAX);
    }

    #[test]
    fn requested_stop_ends_the_retry_loop() {
        let buffer = buffer_with_points(3);
        let stop_token = StopToken::new();
        let operator = stop_token.clone();
        let mut link = MockMotionLink::new();
        let mut calls = 0;
        link.expect_send_trajectory().times(2).returning(move |_| {
            calls += 1;
            if calls == 2 {
                operator.request_stop();
            }
            Err(LinkErrorKind::NodeState)
        });
        let mut driver = LinkDriver::new(link, None);
        match driver.send_with_retry(&buffer, &stop_token) {
            Err(ZheadException::Stopped) => {}
            other => panic!("expected Stopped but found {:?}", other),
        }
    }

    #[test]
    fn empty_buffer_is_not_sent() {
        let buffer = SegmentBuffer::new(3).unwrap();
        let link = MockMotionLink::new();
        let mut driver = LinkDriver::new(link, None);
        assert!(driver.send_with_retry(&buffer, &StopToken::new()).is_err());
    }

    #[test]
    fn executed_points_are_consumed_after_the_move() {
        let mut buffer = buffer_with_points(4);
        let mut link = MockMotionLink::new();
        link.expect_send_trajectory().returning(|_| Ok(()));
        link.expect_wait_move_done()
            .withf(|timeout| timeout.is_none())
            .times(1)
            .returning(|_| Ok(()));
        let mut driver = LinkDriver::new(link, None);
        driver.send_with_retry(&buffer, &StopToken::new()).unwrap();
        assert_eq!(buffer.point_count(), 4);
        driver.wait_move_done(&mut buffer, None).unwrap();
        assert_eq!(buffer.point_count(), 0);
    }

    #[test]
    fn failed_wait_is_fatal_and_keeps_the_points() {
        let mut buffer = buffer_with_points(4);
        let mut link = MockMotionLink::new();
        link.expect_send_trajectory().returning(|_| Ok(()));
        link.expect_wait_move_done()
            .returning(|_| Err(LinkErrorKind::MoveTimeout));
        let mut driver = LinkDriver::new(link, None);
        driver.send_with_retry(&buffer, &StopToken::new()).unwrap();
        match driver.wait_move_done(&mut buffer, Some(Duration::from_secs(1))) {
            Err(ZheadException::FatalLinkError { kind, .. }) => {
                assert_eq!(kind, LinkErrorKind::MoveTimeout)
            }
            other => panic!("expected FatalLinkError but found {:?}", other),
        }
        assert_eq!(buffer.point_count(), 4);
    }
}
