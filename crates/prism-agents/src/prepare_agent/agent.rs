// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The per-frame driver that owns a queue and its limiter.

use super::limiter::{CountLimiter, FrameTimeBudget, UploadLimiter};
use super::queue::{PreparationQueue, TickReport};
use prism_core::{PrepareSettings, Stopwatch};
use std::fmt;
use std::hash::Hash;

/// A snapshot of the agent's progress, for logs and debug overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareStatus {
    /// Frames driven so far.
    pub frame_count: u64,
    /// Items still waiting in the queue.
    pub pending: usize,
    /// Items uploaded since the agent was created.
    pub total_uploaded: u64,
    /// Items dropped after a failed load.
    pub total_failed: u64,
    /// Items dropped after a resource was destroyed.
    pub total_discarded: u64,
    /// The report of the most recent frame.
    pub last_report: TickReport,
    /// Time the most recent tick took, in milliseconds.
    pub last_tick_ms: f64,
    /// A score between 0 and 1, lower when the backlog grows or stalls.
    pub health_score: f32,
    /// `true` if items have been waiting without progress for too long.
    pub is_stalled: bool,
    /// A human-readable summary.
    pub message: String,
}

/// Drives a [`PreparationQueue`] once per frame under an [`UploadLimiter`].
pub struct PrepareAgent<I: Send + 'static> {
    queue: PreparationQueue<I>,
    limiter: Box<dyn UploadLimiter>,
    stall_frames: u64,
    frame_count: u64,
    frames_without_progress: u64,
    last_report: TickReport,
    last_tick_ms: f64,
    tick_timer: Stopwatch,
}

impl<I> PrepareAgent<I>
where
    I: Clone + Eq + Hash + fmt::Debug + Send + 'static,
{
    /// Creates an agent with an empty queue driven by `limiter`.
    pub fn new(limiter: impl UploadLimiter + 'static) -> Self {
        Self {
            queue: PreparationQueue::new(),
            limiter: Box::new(limiter),
            stall_frames: PrepareSettings::default().stall_frames,
            frame_count: 0,
            frames_without_progress: 0,
            last_report: TickReport::default(),
            last_tick_ms: 0.0,
            tick_timer: Stopwatch::new(),
        }
    }

    /// Creates an agent configured from `settings`.
    ///
    /// A positive `frame_time_limit_ms` selects a [`FrameTimeBudget`];
    /// otherwise uploads are capped at `uploads_per_frame` by a [`CountLimiter`].
    pub fn from_settings(settings: &PrepareSettings) -> Self {
        let mut agent = if settings.frame_time_limit_ms > 0.0 {
            log::info!(
                "PrepareAgent: time budget of {} ms per frame",
                settings.frame_time_limit_ms
            );
            Self::new(FrameTimeBudget::new(settings.frame_time_limit_ms))
        } else {
            log::info!(
                "PrepareAgent: at most {} upload(s) per frame",
                settings.uploads_per_frame
            );
            Self::new(CountLimiter::new(settings.uploads_per_frame))
        };
        agent.stall_frames = settings.stall_frames;
        agent
    }

    /// Sets how many frames without progress mark the agent as stalled. `0` disables it.
    pub fn with_stall_frames(mut self, stall_frames: u64) -> Self {
        self.stall_frames = stall_frames;
        self
    }

    /// The queue this agent drives.
    pub fn queue(&self) -> &PreparationQueue<I> {
        &self.queue
    }

    /// Mutable access to the queue, to register handlers and add items.
    pub fn queue_mut(&mut self) -> &mut PreparationQueue<I> {
        &mut self.queue
    }

    /// Runs one frame: starts the limiter's frame, then ticks the queue.
    pub fn update(&mut self) -> TickReport {
        self.tick_timer.restart();
        self.limiter.begin_frame();
        let report = self.queue.tick(self.limiter.as_mut());
        self.last_tick_ms = self.tick_timer.elapsed_ms_f64();
        self.frame_count += 1;

        if report.made_progress() || report.pending_after == 0 {
            self.frames_without_progress = 0;
        } else {
            self.frames_without_progress += 1;
            if self.stall_frames > 0 && self.frames_without_progress == self.stall_frames {
                log::warn!(
                    "PrepareAgent: {} item(s) made no progress for {} frames",
                    report.pending_after,
                    self.stall_frames
                );
            }
        }

        self.last_report = report;
        report
    }

    fn is_stalled(&self) -> bool {
        self.stall_frames > 0 && self.frames_without_progress >= self.stall_frames
    }

    /// Returns a snapshot of the agent's progress.
    pub fn report_status(&self) -> PrepareStatus {
        let pending = self.queue.len();
        let is_stalled = self.is_stalled();
        let health_score = if is_stalled {
            0.0
        } else if pending == 0 {
            1.0
        } else if self.last_report.budget_exhausted {
            0.6
        } else {
            0.9
        };

        PrepareStatus {
            frame_count: self.frame_count,
            pending,
            total_uploaded: self.queue.total_uploaded(),
            total_failed: self.queue.total_failed(),
            total_discarded: self.queue.total_discarded(),
            last_report: self.last_report,
            last_tick_ms: self.last_tick_ms,
            health_score,
            is_stalled,
            message: format!(
                "pending={} uploaded_last={} budget_exhausted={}",
                pending, self.last_report.uploaded, self.last_report.budget_exhausted
            ),
        }
    }
}

impl<I: Send + 'static> fmt::Debug for PrepareAgent<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrepareAgent")
            .field("queue", &self.queue)
            .field("frame_count", &self.frame_count)
            .field("last_report", &self.last_report)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_agent(per_frame: usize) -> PrepareAgent<u32> {
        let mut agent = PrepareAgent::new(CountLimiter::new(per_frame));
        agent
            .queue_mut()
            .register_handler("bare", |_| true, |_| Vec::new(), |_, _| {});
        agent
    }

    #[test]
    fn update_resets_the_limiter_each_frame() {
        let mut agent = bare_agent(2);
        for item in 0..5 {
            agent.queue_mut().add(item);
        }

        assert_eq!(agent.update().uploaded, 2);
        assert_eq!(agent.update().uploaded, 2);
        let last = agent.update();
        assert_eq!(last.uploaded, 1);
        assert_eq!(last.pending_after, 0);

        let status = agent.report_status();
        assert_eq!(status.frame_count, 3);
        assert_eq!(status.total_uploaded, 5);
        assert_eq!(status.health_score, 1.0);
    }

    #[test]
    fn from_settings_picks_a_limiter() {
        let settings = PrepareSettings {
            uploads_per_frame: 1,
            ..PrepareSettings::default()
        };
        let mut agent: PrepareAgent<u32> = PrepareAgent::from_settings(&settings);
        agent
            .queue_mut()
            .register_handler("bare", |_| true, |_| Vec::new(), |_, _| {});
        agent.queue_mut().add(1);
        agent.queue_mut().add(2);

        assert_eq!(agent.update().uploaded, 1);
        assert!(agent.report_status().last_report.budget_exhausted);
    }

    #[test]
    fn tick_time_covers_only_the_latest_frame() {
        let mut agent: PrepareAgent<u32> = PrepareAgent::new(CountLimiter::new(1));
        agent.queue_mut().register_handler(
            "slow",
            |_| true,
            |_| Vec::new(),
            |_, _| std::thread::sleep(std::time::Duration::from_millis(20)),
        );
        agent.queue_mut().add(1);

        agent.update();
        let slow_tick = agent.report_status().last_tick_ms;
        assert!(slow_tick >= 20.0);

        std::thread::sleep(std::time::Duration::from_millis(20));
        agent.update();
        let idle_tick = agent.report_status().last_tick_ms;
        assert!(idle_tick < slow_tick);
        assert!(idle_tick < 20.0);
    }

    #[test]
    fn stalled_queue_is_reported() {
        let mut agent = bare_agent(0).with_stall_frames(3);
        agent.queue_mut().add(9);

        for _ in 0..2 {
            agent.update();
        }
        assert!(!agent.report_status().is_stalled);

        agent.update();
        let status = agent.report_status();
        assert!(status.is_stalled);
        assert_eq!(status.health_score, 0.0);
        assert_eq!(status.pending, 1);
    }
}
