use std::collections::VecDeque;

use crate::sync::FenceValue;

/// Fence values paired with the last queue submission they follow.
///
/// Waiting on a value only needs that submission to finish, not whatever
/// was queued after it.
#[derive(Debug)]
pub(super) struct SignalPoints<S> {
    points: VecDeque<(FenceValue, Option<S>)>,
}

impl<S: Clone> SignalPoints<S> {
    pub fn new() -> Self {
        Self {
            points: VecDeque::new(),
        }
    }

    /// Records `value` as signalled behind `submission` and forgets every
    /// point at or below `completed`.
    pub fn push(&mut self, value: FenceValue, submission: Option<S>, completed: FenceValue) {
        while self.points.front().is_some_and(|(v, _)| *v <= completed) {
            self.points.pop_front();
        }
        self.points.push_back((value, submission));
    }

    /// Submission to wait for so that `value` is reached.
    ///
    /// `None` when the value is unknown (already retired) or was signalled
    /// before anything was submitted.
    pub fn submission_for(&self, value: FenceValue) -> Option<S> {
        self.points
            .iter()
            .find(|(v, _)| *v >= value)
            .and_then(|(_, s)| s.clone())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_only_for_the_matching_submission() {
        let mut points = SignalPoints::new();
        points.push(1, Some(10u32), 0);
        points.push(2, Some(11), 0);
        points.push(3, Some(12), 0);

        assert_eq!(points.submission_for(1), Some(10));
        assert_eq!(points.submission_for(3), Some(12));
    }

    #[test]
    fn empty_frames_reuse_the_previous_submission() {
        let mut points = SignalPoints::new();
        points.push(1, Some(10u32), 0);
        // Skipped frame: no new submission between the two signals.
        points.push(2, Some(10), 0);
        assert_eq!(points.submission_for(2), Some(10));
    }

    #[test]
    fn completed_points_are_dropped() {
        let mut points = SignalPoints::new();
        points.push(1, Some(10u32), 0);
        points.push(2, Some(11), 0);
        points.push(3, Some(12), 2);
        assert_eq!(points.len(), 1);
        assert_eq!(points.submission_for(3), Some(12));
    }

    #[test]
    fn signal_before_any_submission_has_nothing_to_wait_on() {
        let mut points = SignalPoints::<u32>::new();
        points.push(1, None, 0);
        assert_eq!(points.submission_for(1), None);
    }
}
