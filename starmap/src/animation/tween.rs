//! Tweens and the per-channel tween pool

use crate::core::camera::CameraPose;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Values a tween can blend between
pub trait Interpolate: Copy {
    /// Blend from `self` towards `to`; `t` runs from 0 to 1
    fn interpolate(&self, to: &Self, t: f64) -> Self;

    fn is_finite(&self) -> bool;
}

impl Interpolate for f64 {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        self + (to - self) * t
    }

    fn is_finite(&self) -> bool {
        f64::is_finite(*self)
    }
}

impl Interpolate for DVec3 {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        self.lerp(*to, t)
    }

    fn is_finite(&self) -> bool {
        DVec3::is_finite(*self)
    }
}

impl Interpolate for CameraPose {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        CameraPose::new(
            self.position.lerp(to.position, t),
            self.target.lerp(to.target, t),
        )
    }

    fn is_finite(&self) -> bool {
        CameraPose::is_finite(self)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    QuadraticInOut,
    CubicOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// Logical animation target; one live tween per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweenChannel {
    CameraMove,
    GalaxyParticles,
}

/// Subsystem that started a tween
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweenOwner {
    CameraTransitions,
    SceneDecor,
}

/// Identifies one started tween
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenToken(u64);

#[derive(Debug, Error, PartialEq)]
pub enum TweenError {
    #[error("tween endpoints are not finite")]
    InvalidTransform,
}

/// A value moving from `from` to `to` over `duration`, starting at `start`
#[derive(Debug, Clone)]
pub struct Tween<T> {
    token: TweenToken,
    channel: TweenChannel,
    owner: TweenOwner,
    from: T,
    to: T,
    start: Duration,
    duration: Duration,
    easing: Easing,
    last_progress: Option<f64>,
}

impl<T: Interpolate> Tween<T> {
    pub fn token(&self) -> TweenToken {
        self.token
    }

    pub fn channel(&self) -> TweenChannel {
        self.channel
    }

    pub fn owner(&self) -> TweenOwner {
        self.owner
    }

    pub fn destination(&self) -> T {
        self.to
    }

    /// Linear progress in `[0, 1]` at time `now`
    pub fn progress(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    pub fn value_at(&self, now: Duration) -> T {
        let progress = self.progress(now);
        if progress >= 1.0 {
            return self.to;
        }
        self.from.interpolate(&self.to, self.easing.apply(progress))
    }

    pub fn is_finished(&self) -> bool {
        self.last_progress.is_some_and(|p| p >= 1.0)
    }

    /// Advance to `now`; returns the value if progress moved since the last call
    pub fn update(&mut self, now: Duration) -> Option<T> {
        let progress = self.progress(now);
        if self.last_progress == Some(progress) {
            return None;
        }
        self.last_progress = Some(progress);
        Some(self.value_at(now))
    }
}

/// Value produced by a tween during [`TweenPool::update`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenFrame<T> {
    pub token: TweenToken,
    pub channel: TweenChannel,
    pub value: T,
    /// This was the tween's last frame; it has left the pool
    pub finished: bool,
}

/// Running tweens, at most one per channel
#[derive(Debug, Clone)]
pub struct TweenPool<T> {
    active: Vec<Tween<T>>,
    next_token: u64,
}

impl<T: Interpolate> Default for TweenPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Interpolate> TweenPool<T> {
    pub fn new() -> Self {
        Self {
            active: Vec::new(),
            next_token: 0,
        }
    }

    /// Start a tween on `channel`, superseding the one already there
    ///
    /// Non-finite endpoints are rejected before the pool changes.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        &mut self,
        channel: TweenChannel,
        owner: TweenOwner,
        from: T,
        to: T,
        duration: Duration,
        easing: Easing,
        now: Duration,
    ) -> Result<TweenToken, TweenError> {
        if !from.is_finite() || !to.is_finite() {
            return Err(TweenError::InvalidTransform);
        }
        if let Some(superseded) = self.cancel_channel(channel) {
            debug!(token = ?superseded, channel = ?channel, "Superseded tween");
        }

        self.next_token += 1;
        let token = TweenToken(self.next_token);
        self.active.push(Tween {
            token,
            channel,
            owner,
            from,
            to,
            start: now,
            duration,
            easing,
            last_progress: None,
        });
        Ok(token)
    }

    pub fn cancel(&mut self, token: TweenToken) -> bool {
        let before = self.active.len();
        self.active.retain(|t| t.token != token);
        self.active.len() != before
    }

    /// Remove the tween running on `channel`, returning its token
    pub fn cancel_channel(&mut self, channel: TweenChannel) -> Option<TweenToken> {
        let index = self.active.iter().position(|t| t.channel == channel)?;
        Some(self.active.remove(index).token)
    }

    pub fn is_active(&self, token: TweenToken) -> bool {
        self.active.iter().any(|t| t.token == token)
    }

    pub fn active_on(&self, channel: TweenChannel) -> Option<&Tween<T>> {
        self.active.iter().find(|t| t.channel == channel)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Advance every tween; finished ones are removed after their last frame
    pub fn update(&mut self, now: Duration) -> Vec<TweenFrame<T>> {
        let mut frames = Vec::new();
        for tween in &mut self.active {
            if let Some(value) = tween.update(now) {
                frames.push(TweenFrame {
                    token: tween.token,
                    channel: tween.channel,
                    value,
                    finished: tween.is_finished(),
                });
            }
        }
        self.active.retain(|t| !t.is_finished());
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::QuadraticInOut, Easing::CubicOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
        assert_eq!(Easing::QuadraticInOut.apply(0.5), 0.5);
    }

    #[test]
    fn test_tween_reaches_destination_and_leaves_pool() {
        let mut pool = TweenPool::<f64>::new();
        let token = pool
            .start(
                TweenChannel::GalaxyParticles,
                TweenOwner::SceneDecor,
                0.0,
                10.0,
                ms(500),
                Easing::Linear,
                ms(1_000),
            )
            .unwrap();

        let frames = pool.update(ms(1_250));
        assert_eq!(frames.len(), 1);
        assert!((frames[0].value - 5.0).abs() < 1e-9);
        assert!(!frames[0].finished);

        let frames = pool.update(ms(1_600));
        assert_eq!(frames[0].value, 10.0);
        assert!(frames[0].finished);
        assert!(!pool.is_active(token));
        assert!(pool.is_empty());
        assert!(pool.update(ms(2_000)).is_empty());
    }

    #[test]
    fn test_no_frame_without_progress() {
        let mut pool = TweenPool::<f64>::new();
        pool.start(
            TweenChannel::CameraMove,
            TweenOwner::CameraTransitions,
            0.0,
            1.0,
            ms(100),
            Easing::Linear,
            ms(0),
        )
        .unwrap();
        assert_eq!(pool.update(ms(10)).len(), 1);
        assert!(pool.update(ms(10)).is_empty());
    }

    #[test]
    fn test_same_channel_supersedes() {
        let mut pool = TweenPool::<f64>::new();
        let first = pool
            .start(
                TweenChannel::CameraMove,
                TweenOwner::CameraTransitions,
                0.0,
                1.0,
                ms(800),
                Easing::Linear,
                ms(0),
            )
            .unwrap();
        let second = pool
            .start(
                TweenChannel::CameraMove,
                TweenOwner::CameraTransitions,
                0.5,
                2.0,
                ms(800),
                Easing::Linear,
                ms(100),
            )
            .unwrap();
        pool.start(
            TweenChannel::GalaxyParticles,
            TweenOwner::SceneDecor,
            0.0,
            1.0,
            ms(500),
            Easing::Linear,
            ms(100),
        )
        .unwrap();

        assert!(!pool.is_active(first));
        assert!(pool.is_active(second));
        assert_eq!(pool.len(), 2);
        assert_eq!(
            pool.active_on(TweenChannel::CameraMove).map(|t| t.destination()),
            Some(2.0)
        );
    }

    #[test]
    fn test_non_finite_rejected_without_side_effects() {
        let mut pool = TweenPool::<DVec3>::new();
        let token = pool
            .start(
                TweenChannel::CameraMove,
                TweenOwner::CameraTransitions,
                DVec3::ZERO,
                DVec3::ONE,
                ms(800),
                Easing::Linear,
                ms(0),
            )
            .unwrap();

        let result = pool.start(
            TweenChannel::CameraMove,
            TweenOwner::CameraTransitions,
            DVec3::ZERO,
            DVec3::new(f64::NAN, 0.0, 0.0),
            ms(800),
            Easing::Linear,
            ms(0),
        );
        assert_eq!(result, Err(TweenError::InvalidTransform));
        assert!(pool.is_active(token));
    }

    #[test]
    fn test_zero_duration_finishes_immediately() {
        let mut pool = TweenPool::<f64>::new();
        pool.start(
            TweenChannel::GalaxyParticles,
            TweenOwner::SceneDecor,
            1.0,
            4.0,
            Duration::ZERO,
            Easing::CubicOut,
            ms(5),
        )
        .unwrap();
        let frames = pool.update(ms(5));
        assert_eq!(frames[0].value, 4.0);
        assert!(frames[0].finished);
    }
}
