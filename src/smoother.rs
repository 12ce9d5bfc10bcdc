// src/smoother.rs
use crate::skeleton::SkeletonPosition;
use std::collections::VecDeque;
use tracing::warn;

/// Default number of trailing frames averaged together.
pub const DEFAULT_SMOOTHING_FRAMES: usize = 5;

/// Hard cap on retained history, independent of the configured window.
const MAX_HISTORY_SIZE: usize = 100;

/// Temporal smoothing filter over per-frame joint positions.
///
/// Keeps a bounded history of raw frames and a running window sum, trading
/// a little latency for jitter reduction. One instance serves exactly one
/// tracked body; frames from different bodies must never share a smoother.
pub struct Smoother {
    window_size: usize,
    hard_cap: usize,
    raw: VecDeque<SkeletonPosition>,
    smoothed: VecDeque<SkeletonPosition>,
}

impl Smoother {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            hard_cap: MAX_HISTORY_SIZE.max(window_size),
            raw: VecDeque::new(),
            smoothed: VecDeque::new(),
        }
    }

    /// Sets the number of trailing frames averaged over.
    ///
    /// The running sum is window-specific, so reconfiguring drops the
    /// accumulated history. A window of 1 or less disables smoothing.
    pub fn configure(&mut self, window_size: usize) {
        self.window_size = window_size;
        self.hard_cap = MAX_HISTORY_SIZE.max(window_size);
        self.reset();
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn history_len(&self) -> usize {
        self.raw.len()
    }

    /// Drops all accumulated history.
    pub fn reset(&mut self) {
        self.raw.clear();
        self.smoothed.clear();
    }

    /// Feeds one frame and returns the raw or smoothed position.
    ///
    /// Raw passthrough (with the frame's true timestamp) applies while fewer
    /// than `window_size` frames have been seen, when `smoothing_enabled` is
    /// false, or when the window is 1 or less. Otherwise the output is the
    /// running window sum divided by the window size, timestamped with the
    /// latest raw frame.
    ///
    /// A frame whose joint set differs from the history resets the smoother:
    /// the window sum assumes identical keys across the whole window, and
    /// restarting beats letting one bad frame poison the session.
    pub fn process(&mut self, sample: SkeletonPosition, smoothing_enabled: bool) -> SkeletonPosition {
        if let Some(last) = self.raw.back() {
            if !sample.same_joint_set(last) {
                warn!(
                    history_frames = self.raw.len(),
                    incoming_joints = sample.joint_count(),
                    "incoming frame joint set differs from smoothing history, resetting"
                );
                self.reset();
            }
        }

        self.raw.push_back(sample.clone());

        if self.window_size <= 1 {
            self.trim_history();
            return sample;
        }

        // Running window sum: add the newest frame, drop the frame that just
        // left the window. O(1) per call instead of a full resum.
        let previous = self.smoothed.back().cloned();
        let mut accumulator = match previous {
            None => sample.clone(),
            Some(previous) => {
                let mut sum = match previous.add_pointwise(&sample) {
                    Ok(sum) => sum,
                    Err(_) => return self.recover(sample),
                };
                if self.raw.len() > self.window_size {
                    let leaving = self.raw[self.raw.len() - 1 - self.window_size].clone();
                    sum = match sum.sub_pointwise(&leaving) {
                        Ok(sum) => sum,
                        Err(_) => return self.recover(sample),
                    };
                }
                sum
            }
        };

        // Smoothed output carries the timestamp of the latest raw frame.
        accumulator.timestamp_ms = sample.timestamp_ms;
        self.smoothed.push_back(accumulator);

        self.trim_history();

        let has_enough = self.raw.len() >= self.window_size;
        if smoothing_enabled && has_enough {
            self.smoothed
                .back()
                .map(|sum| sum.scale_divide(self.window_size as f64))
                .unwrap_or(sample)
        } else {
            sample
        }
    }

    // Evicts entries that no longer contribute to the window sum once the
    // hard cap is exceeded.
    fn trim_history(&mut self) {
        let keep = self.window_size.max(1);
        if self.raw.len() > self.hard_cap {
            while self.raw.len() > keep {
                self.raw.pop_front();
            }
        }
        if self.smoothed.len() > self.hard_cap {
            while self.smoothed.len() > keep {
                self.smoothed.pop_front();
            }
        }
    }

    // A joint-set mismatch slipped past the entry check, which means the
    // accumulated state is unusable. Restart from the offending frame.
    fn recover(&mut self, sample: SkeletonPosition) -> SkeletonPosition {
        warn!("smoothing accumulator lost joint-set alignment, resetting");
        self.reset();
        self.raw.push_back(sample.clone());
        sample
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_FRAMES)
    }
}
