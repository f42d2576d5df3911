//! Background sampling tasks.
//!
//! Text shapes need a font load plus outline extrusion, which is too slow
//! for a frame budget. [`SampleTask`] runs that work on a worker thread and
//! hands the finished buffer back through a shared slot. The frame loop
//! polls it with [`SampleTask::try_take`]; tools and tests can block on it
//! as a [`Future`] with `pollster::block_on`.

use crate::buffer::PositionBuffer;
use crate::error::SampleError;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, Waker};

/// Identifier of a shape request. Later requests have larger ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestId(pub u64);

impl RequestId {
    /// The id after this one.
    #[inline]
    pub fn next(self) -> Self {
        RequestId(self.0 + 1)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type SampleResult = Result<PositionBuffer, SampleError>;

#[derive(Default)]
struct Slot {
    result: Option<SampleResult>,
    waker: Option<Waker>,
    taken: bool,
}

/// Worker-side handle used to publish the result.
#[derive(Clone)]
pub(crate) struct Completer {
    slot: Arc<Mutex<Slot>>,
    cancelled: Arc<AtomicBool>,
}

impl Completer {
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub(crate) fn complete(&self, result: SampleResult) {
        let waker = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            slot.result = Some(result);
            slot.waker.take()
        };
        if let Some(w) = waker {
            w.wake();
        }
    }
}

/// Handle to a shape being sampled off the frame thread.
pub struct SampleTask {
    id: RequestId,
    slot: Arc<Mutex<Slot>>,
    cancelled: Arc<AtomicBool>,
}

impl SampleTask {
    /// Create a task and the handle its worker completes.
    pub(crate) fn pair(id: RequestId) -> (Self, Completer) {
        let slot = Arc::new(Mutex::new(Slot::default()));
        let cancelled = Arc::new(AtomicBool::new(false));
        let completer = Completer {
            slot: Arc::clone(&slot),
            cancelled: Arc::clone(&cancelled),
        };
        (
            Self {
                id,
                slot,
                cancelled,
            },
            completer,
        )
    }

    /// A task that is already finished with `result`.
    #[cfg(test)]
    pub(crate) fn ready(id: RequestId, result: SampleResult) -> Self {
        let (task, completer) = Self::pair(id);
        completer.complete(result);
        task
    }

    /// Run `work` on a named worker thread.
    ///
    /// If the thread cannot be spawned the task finishes with
    /// [`SampleError::Worker`].
    pub(crate) fn spawn<F>(id: RequestId, work: F) -> Self
    where
        F: FnOnce(&Completer) -> SampleResult + Send + 'static,
    {
        let (task, completer) = Self::pair(id);
        let worker = completer.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("cosmorph-sample-{}", id.0))
            .spawn(move || {
                let result = if worker.is_cancelled() {
                    Err(SampleError::Cancelled)
                } else {
                    work(&worker)
                };
                worker.complete(result);
            });
        if let Err(e) = spawned {
            tracing::warn!(id = %id, error = %e, "failed to spawn sampling worker");
            completer.complete(Err(SampleError::Worker(e)));
        }
        task
    }

    #[inline]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Ask the worker to stop. Work already running completes but its
    /// result is replaced by [`SampleError::Cancelled`] if not yet taken.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether a result is waiting to be taken.
    pub fn is_finished(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .result
            .is_some()
    }

    /// Take the result if the worker is done. Never blocks.
    ///
    /// Returns `Some` at most once.
    pub fn try_take(&mut self) -> Option<SampleResult> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        let result = slot.result.take()?;
        slot.taken = true;
        Some(if self.is_cancelled() {
            Err(SampleError::Cancelled)
        } else {
            result
        })
    }
}

impl Future for SampleTask {
    type Output = SampleResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut slot = this.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.result.take() {
            Some(result) => {
                slot.taken = true;
                drop(slot);
                Poll::Ready(if this.is_cancelled() {
                    Err(SampleError::Cancelled)
                } else {
                    result
                })
            }
            None if slot.taken => Poll::Ready(Err(SampleError::Cancelled)),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl std::fmt::Debug for SampleTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleTask")
            .field("id", &self.id)
            .field("finished", &self.is_finished())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_request_ids_increase() {
        let a = RequestId::default();
        let b = a.next();
        assert!(b > a);
        assert_eq!(b.to_string(), "#1");
    }

    #[test]
    fn test_block_on_worker_result() {
        let task = SampleTask::spawn(RequestId(3), |_| Ok(PositionBuffer::zeroed(5)));
        assert_eq!(task.id(), RequestId(3));
        let buf = pollster::block_on(task).unwrap();
        assert_eq!(buf.count(), 5);
    }

    #[test]
    fn test_try_take_only_once() {
        let mut task = SampleTask::ready(RequestId(1), Ok(PositionBuffer::zeroed(2)));
        assert!(task.is_finished());
        assert!(task.try_take().unwrap().is_ok());
        assert!(task.try_take().is_none());
    }

    #[test]
    fn test_try_take_pending_then_ready() {
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let mut task = SampleTask::spawn(RequestId(1), move |_| {
            let _ = gate_rx.recv_timeout(Duration::from_secs(5));
            Ok(PositionBuffer::zeroed(1))
        });
        assert!(task.try_take().is_none());
        gate_tx.send(()).unwrap();
        let result = pollster::block_on(&mut task);
        assert!(result.is_ok());
    }

    #[test]
    fn test_cancel_replaces_result() {
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let task = SampleTask::spawn(RequestId(9), move |_| {
            let _ = gate_rx.recv_timeout(Duration::from_secs(5));
            Ok(PositionBuffer::zeroed(1))
        });
        task.cancel();
        gate_tx.send(()).unwrap();
        assert!(matches!(pollster::block_on(task), Err(SampleError::Cancelled)));
    }
}
