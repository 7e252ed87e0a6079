//! Timer plumbing for the pollers: a repeating tick with an optional
//! one-shot deadline, plus a handle for loops running on their own task.
//!
//! Everything here runs on `tokio::time`, so tests drive it with a paused
//! clock instead of waiting in real time.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Poll,
    Deadline,
}

pub struct PollSchedule {
    interval: Interval,
    deadline: Option<Pin<Box<Sleep>>>,
}

impl PollSchedule {
    /// First tick fires one full period from now.
    pub fn every(period: Duration) -> Self {
        Self::starting_at(Instant::now() + period, period)
    }

    /// First tick fires immediately.
    pub fn immediate(period: Duration) -> Self {
        Self::starting_at(Instant::now(), period)
    }

    fn starting_at(start: Instant, period: Duration) -> Self {
        let mut interval = time::interval_at(start, period);
        // a slow response pushes the next tick back instead of bursting
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, ceiling: Duration) -> Self {
        self.deadline = Some(Box::pin(time::sleep(ceiling)));
        self
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    /// Waits for whichever comes first. The deadline wins a tie.
    pub async fn next(&mut self) -> Tick {
        match &mut self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                () = deadline.as_mut() => Tick::Deadline,
                _ = self.interval.tick() => Tick::Poll,
            },
            None => {
                self.interval.tick().await;
                Tick::Poll
            }
        }
    }
}

/// Owns a polling loop spawned onto the runtime. Stopping or dropping the
/// handle cancels the loop at its next suspension point.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            task: tokio::spawn(future),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
