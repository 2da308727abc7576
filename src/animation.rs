//! Cumulative-reveal schedules for animated charts.

use serde::Serialize;

use crate::error::{AnalyticsError, AnalyticsResult};

/// Frames an animation aims for when no step is given
pub const DEFAULT_FRAME_TARGET: usize = 36;
pub const DEFAULT_DURATION_SECS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FramePlan {
    pub total_points: usize,
    pub frame_step: usize,
    pub frame_count: usize,
    pub fps: u32,
}

impl FramePlan {
    /// Number of leading points frame `frame` shows.
    ///
    /// Frame `i` reveals `data[0..=frame_step * i]`; the last frame always reveals
    /// the whole dataset, so leftovers from integer division are never dropped.
    pub fn reveal_len(&self, frame: usize) -> usize {
        if frame + 1 >= self.frame_count {
            return self.total_points;
        }
        (self.frame_step * frame + 1).min(self.total_points)
    }

    pub fn frames(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.frame_count).map(|i| self.reveal_len(i))
    }
}

/// Plan an animation over `total_points` lasting roughly `duration_secs`.
///
/// Without an explicit step the data is split into about 36 frames. A step of
/// zero is normalized to one.
pub fn plan(
    total_points: usize,
    frame_step: Option<usize>,
    duration_secs: u32,
) -> AnalyticsResult<FramePlan> {
    plan_with_target(total_points, frame_step, DEFAULT_FRAME_TARGET, duration_secs)
}

/// Like [`plan`], aiming for `frame_target` frames when no step is given.
pub fn plan_with_target(
    total_points: usize,
    frame_step: Option<usize>,
    frame_target: usize,
    duration_secs: u32,
) -> AnalyticsResult<FramePlan> {
    if total_points == 0 {
        return Err(AnalyticsError::config("cannot animate an empty dataset"));
    }
    if duration_secs == 0 {
        return Err(AnalyticsError::config("animation duration must be >= 1s"));
    }

    let frame_step = frame_step
        .unwrap_or(total_points / frame_target.max(1))
        .max(1);
    let frame_count = (total_points / frame_step).max(1);
    let fps = u32::try_from(frame_count / duration_secs as usize)
        .unwrap_or(u32::MAX)
        .max(1);

    Ok(FramePlan {
        total_points,
        frame_step,
        frame_count,
        fps,
    })
}
