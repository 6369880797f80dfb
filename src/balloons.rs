use std::f32::consts::PI;
use std::time::Duration;

use rand::Rng;

use crate::constants::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Balloon {
    pub id: usize,
    /// Horizontal offset in percent of the viewport width.
    pub left: f32,
    pub delay: Duration,
    pub duration: Duration,
}

impl Balloon {
    /// Lift above the resting line in `[0, 1]`: up at the start and end of
    /// each period, down at mid-period. Resting until the delay elapses.
    pub fn lift(&self, elapsed: Duration) -> f32 {
        let Some(running) = elapsed.checked_sub(self.delay) else {
            return 0.0;
        };
        let period = self.duration.as_secs_f32();
        if period <= 0.0 {
            return 0.0;
        }
        let t = running.as_secs_f32().rem_euclid(period) / period;
        1.0 - (PI * t).sin()
    }
}

/// The decorative balloon layout, drawn once per mount.
#[derive(Debug, Clone, PartialEq)]
pub struct BalloonSet {
    balloons: Vec<Balloon>,
}

impl BalloonSet {
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let balloons = (0..BALLOON_COUNT)
            .map(|id| Balloon {
                id,
                left: rng.random_range(0.0..=100.0),
                delay: Duration::from_millis(rng.random_range(0..=BALLOON_MAX_DELAY_MS)),
                duration: Duration::from_millis(
                    rng.random_range(BALLOON_MIN_DURATION_MS..=BALLOON_MAX_DURATION_MS),
                ),
            })
            .collect();
        Self { balloons }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Balloon> {
        self.balloons.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.balloons.len()
    }
}
