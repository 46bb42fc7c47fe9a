use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{ErrorCode, GpuError, GpuResult};

/// Fence counter value. Zero means "never signalled".
pub type FenceValue = u64;

#[derive(Debug, Default)]
struct Counters {
    /// Highest value handed to the queue.
    current: FenceValue,
    /// Highest value the GPU has reached.
    completed: FenceValue,
}

#[derive(Debug, Default)]
struct Shared {
    counters: Mutex<Counters>,
    reached: Condvar,
}

/// Queue-side half of the fence protocol.
///
/// A timeline knows how to enqueue a signal behind all previously submitted
/// work, and how to make progress while the CPU waits (on wgpu this polls the
/// device, on a test double it may do nothing and let another thread complete
/// the fence).
pub trait Timeline {
    /// Enqueues a GPU-side signal: once all prior work completes, `completer`
    /// must be invoked with `value`.
    fn enqueue_signal(&mut self, completer: FenceCompleter, value: FenceValue) -> GpuResult<()>;

    /// Drives the queue towards `value` without spinning, giving up after
    /// `timeout` when one is set.
    fn drive(&self, fence: &Fence, value: FenceValue, timeout: Option<Duration>) -> GpuResult<()>;
}

/// CPU/GPU synchronization counter.
///
/// `current` is bumped once per [`Fence::signal`]; `completed` only moves
/// forward and never exceeds `current`.
#[derive(Debug, Default)]
pub struct Fence {
    shared: Arc<Shared>,
}

impl Fence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value handed to the queue.
    pub fn current_value(&self) -> FenceValue {
        self.shared.counters.lock().current
    }

    /// Last value the GPU reported as reached.
    pub fn completed_value(&self) -> FenceValue {
        self.shared.counters.lock().completed
    }

    /// Increments the CPU counter and enqueues a signal for it.
    pub fn signal<T: Timeline + ?Sized>(&mut self, queue: &mut T) -> GpuResult<FenceValue> {
        let value = {
            let mut counters = self.shared.counters.lock();
            counters.current += 1;
            counters.current
        };
        // A failed enqueue is fatal for the device, so `current` is not rolled back.
        queue.enqueue_signal(self.completer(), value)?;
        Ok(value)
    }

    /// Blocks the calling thread until the GPU reaches `value`. No timeout.
    pub fn block_until<T: Timeline + ?Sized>(&self, queue: &T, value: FenceValue) -> GpuResult<()> {
        self.wait_impl(queue, value, None)
    }

    /// Like [`Fence::block_until`] but fails with [`ErrorCode::Timeout`] when
    /// `timeout` expires first.
    pub fn block_until_for<T: Timeline + ?Sized>(
        &self,
        queue: &T,
        value: FenceValue,
        timeout: Duration,
    ) -> GpuResult<()> {
        self.wait_impl(queue, value, Some(timeout))
    }

    /// Returns a handle the queue uses to report completion.
    pub fn completer(&self) -> FenceCompleter {
        FenceCompleter {
            shared: Arc::clone(&self.shared),
        }
    }

    fn wait_impl<T: Timeline + ?Sized>(
        &self,
        queue: &T,
        value: FenceValue,
        timeout: Option<Duration>,
    ) -> GpuResult<()> {
        {
            let counters = self.shared.counters.lock();
            assert!(
                value <= counters.current,
                "waiting on fence value {value} that was never signalled (current {})",
                counters.current
            );
            if counters.completed >= value {
                return Ok(());
            }
        }

        log::debug!("fence: waiting for {value}");
        let deadline = timeout.map(|t| Instant::now() + t);
        queue.drive(self, value, timeout)?;

        let mut counters = self.shared.counters.lock();
        while counters.completed < value {
            match deadline {
                None => self.shared.reached.wait(&mut counters),
                Some(deadline) => {
                    if self.shared.reached.wait_until(&mut counters, deadline).timed_out()
                        && counters.completed < value
                    {
                        return Err(GpuError::new(ErrorCode::Timeout, "fence wait").with_detail(
                            format!("completed {} < target {value}", counters.completed),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Cloneable, thread-safe handle that advances a fence's completed value.
#[derive(Debug, Clone)]
pub struct FenceCompleter {
    shared: Arc<Shared>,
}

impl FenceCompleter {
    /// Last value the GPU reported as reached.
    pub fn completed_value(&self) -> FenceValue {
        self.shared.counters.lock().completed
    }

    /// Raises the completed value to `value` and wakes waiters.
    ///
    /// Lower values are ignored so out-of-order callbacks cannot move the
    /// counter backwards.
    pub fn complete(&self, value: FenceValue) {
        let mut counters = self.shared.counters.lock();
        assert!(
            value <= counters.current,
            "fence completed past its current value ({value} > {})",
            counters.current
        );
        if value > counters.completed {
            counters.completed = value;
            self.shared.reached.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    /// Completes every signal on enqueue.
    struct Immediate;

    impl Timeline for Immediate {
        fn enqueue_signal(&mut self, completer: FenceCompleter, value: FenceValue) -> GpuResult<()> {
            completer.complete(value);
            Ok(())
        }

        fn drive(&self, _: &Fence, _: FenceValue, _: Option<Duration>) -> GpuResult<()> {
            Ok(())
        }
    }

    /// Never completes on its own.
    struct Stalled;

    impl Timeline for Stalled {
        fn enqueue_signal(&mut self, _: FenceCompleter, _: FenceValue) -> GpuResult<()> {
            Ok(())
        }

        fn drive(&self, _: &Fence, _: FenceValue, _: Option<Duration>) -> GpuResult<()> {
            Ok(())
        }
    }

    /// Fails every drive the way a device poll does when its timeout expires.
    struct PollTimesOut;

    impl Timeline for PollTimesOut {
        fn enqueue_signal(&mut self, _: FenceCompleter, _: FenceValue) -> GpuResult<()> {
            Ok(())
        }

        fn drive(&self, _: &Fence, _: FenceValue, timeout: Option<Duration>) -> GpuResult<()> {
            match timeout {
                Some(_) => Err(GpuError::new(ErrorCode::Timeout, "device.poll")),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn signal_increments_current_by_one() {
        let mut fence = Fence::new();
        let mut q = Immediate;
        assert_eq!(fence.signal(&mut q).unwrap(), 1);
        assert_eq!(fence.signal(&mut q).unwrap(), 2);
        assert_eq!(fence.current_value(), 2);
        assert_eq!(fence.completed_value(), 2);
    }

    #[test]
    fn completed_never_moves_backwards() {
        let mut fence = Fence::new();
        let mut q = Stalled;
        fence.signal(&mut q).unwrap();
        fence.signal(&mut q).unwrap();
        let c = fence.completer();
        c.complete(2);
        c.complete(1);
        assert_eq!(fence.completed_value(), 2);
    }

    #[test]
    fn block_until_returns_immediately_when_reached() {
        let mut fence = Fence::new();
        let mut q = Immediate;
        let v = fence.signal(&mut q).unwrap();
        fence.block_until(&q, v).unwrap();
    }

    #[test]
    fn block_until_waits_for_completer() {
        let mut fence = Fence::new();
        let mut q = Stalled;
        let v = fence.signal(&mut q).unwrap();
        let completer = fence.completer();
        let (tx, rx) = mpsc::channel();

        std::thread::scope(|s| {
            s.spawn(|| {
                fence.block_until(&Stalled, v).unwrap();
                tx.send(()).unwrap();
            });

            std::thread::sleep(Duration::from_millis(50));
            assert!(rx.try_recv().is_err(), "wait returned before completion");

            completer.complete(v);
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        });
    }

    #[test]
    fn bounded_wait_times_out() {
        let mut fence = Fence::new();
        let mut q = Stalled;
        let v = fence.signal(&mut q).unwrap();
        let err = fence
            .block_until_for(&q, v, Duration::from_millis(10))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Timeout);
    }

    #[test]
    fn bounded_wait_hands_its_timeout_to_the_queue() {
        let mut fence = Fence::new();
        let mut q = PollTimesOut;
        let v = fence.signal(&mut q).unwrap();
        let err = fence
            .block_until_for(&q, v, Duration::from_secs(30))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Timeout);
        assert_eq!(err.operation, "device.poll");
    }

    #[test]
    fn completer_reports_progress() {
        let mut fence = Fence::new();
        let mut q = Stalled;
        fence.signal(&mut q).unwrap();
        let c = fence.completer();
        assert_eq!(c.completed_value(), 0);
        c.complete(1);
        assert_eq!(c.completed_value(), 1);
    }

    #[test]
    #[should_panic(expected = "never signalled")]
    fn waiting_on_unsignalled_value_panics() {
        let fence = Fence::new();
        let _ = fence.block_until(&Stalled, 1);
    }
}
