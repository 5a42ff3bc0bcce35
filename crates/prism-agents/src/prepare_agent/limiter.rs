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

//! Per-frame upload limiters.

use prism_core::utils::{Clock, SystemClock};
use std::fmt;

/// Decides whether more upload work fits in the current frame.
///
/// The host loop calls [`begin_frame`](UploadLimiter::begin_frame) once per
/// frame, then the queue asks [`allowed_to_upload`](UploadLimiter::allowed_to_upload)
/// before each item and reports each upload through
/// [`record_upload`](UploadLimiter::record_upload).
pub trait UploadLimiter: Send {
    /// Starts a new frame, resetting any per-frame accounting.
    fn begin_frame(&mut self);

    /// Returns `true` while the current frame still has room for an upload.
    ///
    /// Must not change the limiter's state.
    fn allowed_to_upload(&self) -> bool;

    /// Records that one item was uploaded in the current frame.
    fn record_upload(&mut self);
}

/// Limits uploads by wall-clock time spent since the start of the frame.
///
/// A limit of `0` disables the budget and always allows uploads.
pub struct FrameTimeBudget<C: Clock = SystemClock> {
    limit_ms: f64,
    frame_start: std::time::Duration,
    upload_hint: usize,
    clock: C,
}

impl FrameTimeBudget {
    /// Creates a budget of `limit_ms` milliseconds per frame on the system clock.
    ///
    /// Negative and NaN limits are treated as `0`, which means unlimited.
    pub fn new(limit_ms: f64) -> Self {
        Self::with_clock(limit_ms, SystemClock::new())
    }
}

impl<C: Clock> FrameTimeBudget<C> {
    /// Creates a budget that reads time from `clock`. The first frame starts now.
    pub fn with_clock(limit_ms: f64, clock: C) -> Self {
        let limit_ms = if limit_ms.is_nan() || limit_ms < 0.0 {
            0.0
        } else {
            limit_ms
        };
        Self {
            limit_ms,
            frame_start: clock.now(),
            upload_hint: 0,
            clock,
        }
    }

    /// The per-frame limit in milliseconds. `0` means unlimited.
    pub fn limit_ms(&self) -> f64 {
        self.limit_ms
    }

    /// Uploads recorded since the last [`begin_frame`](UploadLimiter::begin_frame).
    pub fn upload_hint(&self) -> usize {
        self.upload_hint
    }

    /// Milliseconds elapsed since the current frame began.
    pub fn elapsed_ms(&self) -> f64 {
        self.clock
            .now()
            .saturating_sub(self.frame_start)
            .as_secs_f64()
            * 1000.0
    }
}

impl<C: Clock> UploadLimiter for FrameTimeBudget<C> {
    fn begin_frame(&mut self) {
        self.frame_start = self.clock.now();
        self.upload_hint = 0;
    }

    fn allowed_to_upload(&self) -> bool {
        self.limit_ms == 0.0 || self.elapsed_ms() < self.limit_ms
    }

    fn record_upload(&mut self) {
        self.upload_hint += 1;
    }
}

impl<C: Clock> fmt::Debug for FrameTimeBudget<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameTimeBudget")
            .field("limit_ms", &self.limit_ms)
            .field("upload_hint", &self.upload_hint)
            .finish()
    }
}

/// Limits uploads to a fixed number of items per frame.
#[derive(Debug, Clone)]
pub struct CountLimiter {
    max_per_frame: usize,
    uploaded: usize,
}

impl CountLimiter {
    /// Creates a limiter allowing `max_per_frame` uploads each frame.
    pub fn new(max_per_frame: usize) -> Self {
        Self {
            max_per_frame,
            uploaded: 0,
        }
    }

    /// The number of uploads allowed each frame.
    pub fn max_per_frame(&self) -> usize {
        self.max_per_frame
    }
}

impl UploadLimiter for CountLimiter {
    fn begin_frame(&mut self) {
        self.uploaded = 0;
    }

    fn allowed_to_upload(&self) -> bool {
        self.uploaded < self.max_per_frame
    }

    fn record_upload(&mut self) {
        self.uploaded += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::utils::ManualClock;
    use std::time::Duration;

    #[test]
    fn zero_limit_always_allows() {
        let clock = ManualClock::new();
        let mut budget = FrameTimeBudget::with_clock(0.0, clock.clone());
        budget.begin_frame();
        clock.advance(Duration::from_secs(10));
        assert!(budget.allowed_to_upload());
    }

    #[test]
    fn invalid_limits_are_clamped_to_unlimited() {
        assert_eq!(FrameTimeBudget::new(-5.0).limit_ms(), 0.0);
        assert_eq!(FrameTimeBudget::new(f64::NAN).limit_ms(), 0.0);
        assert!(FrameTimeBudget::new(-5.0).allowed_to_upload());
    }

    #[test]
    fn budget_expires_and_stays_expired_until_next_frame() {
        let clock = ManualClock::new();
        let mut budget = FrameTimeBudget::with_clock(100.0, clock.clone());

        budget.begin_frame();
        assert!(budget.allowed_to_upload());

        clock.advance(Duration::from_millis(99));
        assert!(budget.allowed_to_upload());

        clock.advance(Duration::from_millis(1));
        assert!(!budget.allowed_to_upload());
        assert!(!budget.allowed_to_upload());

        clock.advance(Duration::from_millis(500));
        assert!(!budget.allowed_to_upload());

        budget.begin_frame();
        assert!(budget.allowed_to_upload());
    }

    #[test]
    fn budget_expires_on_the_system_clock() {
        let mut budget = FrameTimeBudget::new(100.0);
        budget.begin_frame();
        assert!(budget.allowed_to_upload());

        std::thread::sleep(Duration::from_millis(200));
        assert!(!budget.allowed_to_upload());
    }

    #[test]
    fn upload_hint_resets_each_frame() {
        let mut budget = FrameTimeBudget::with_clock(16.0, ManualClock::new());
        budget.record_upload();
        budget.record_upload();
        assert_eq!(budget.upload_hint(), 2);

        budget.begin_frame();
        assert_eq!(budget.upload_hint(), 0);
    }

    #[test]
    fn count_limiter_allows_n_per_frame() {
        let mut limiter = CountLimiter::new(2);
        limiter.begin_frame();
        assert!(limiter.allowed_to_upload());
        limiter.record_upload();
        assert!(limiter.allowed_to_upload());
        limiter.record_upload();
        assert!(!limiter.allowed_to_upload());

        limiter.begin_frame();
        assert!(limiter.allowed_to_upload());
    }

    #[test]
    fn count_limiter_of_zero_never_allows() {
        let limiter = CountLimiter::new(0);
        assert!(!limiter.allowed_to_upload());
    }
}
