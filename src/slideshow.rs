use std::time::Duration;

use log::debug;
use raylib::ease::{self, Tween};

use crate::constants::*;
use crate::timers::Interval;

/// Emphasis of one slide: 1.0 fully shown, 0.0 dimmed.
struct Fade {
    value: f32,
    target: f32,
    elapsed: f32,
    tween: Option<Tween>,
}

impl Fade {
    fn settled(value: f32) -> Self {
        Self { value, target: value, elapsed: 0.0, tween: None }
    }

    fn retarget(&mut self, target: f32) {
        if self.value == target && self.tween.is_none() {
            return;
        }
        self.target = target;
        self.elapsed = 0.0;
        self.tween = Some(Tween::new(ease::sine_in_out, self.value, target, SLIDE_FADE_DURATION));
    }

    fn update(&mut self, dt: f32) {
        let Some(tween) = self.tween.as_mut() else {
            return;
        };
        self.elapsed += dt;
        if self.elapsed >= SLIDE_FADE_DURATION {
            self.value = self.target;
            self.tween = None;
        } else {
            self.value = tween.apply(dt).clamp(0.0, 1.0);
        }
    }
}

/// Index over a fixed, ordered image list plus the cross-fade between
/// entries. Every slide stays present; only its emphasis changes.
pub struct Slideshow {
    len: usize,
    current: usize,
    auto_advance: Interval,
    fades: Vec<Fade>,
}

impl Slideshow {
    pub fn new(len: usize) -> Self {
        let fades = (0..len)
            .map(|i| Fade::settled(if i == 0 { 1.0 } else { 0.0 }))
            .collect();
        Self {
            len,
            current: 0,
            auto_advance: Interval::new(SLIDE_INTERVAL),
            fades,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn advance(&mut self) {
        if self.len == 0 {
            return;
        }
        self.show((self.current + 1) % self.len);
    }

    pub fn retreat(&mut self) {
        if self.len == 0 {
            return;
        }
        self.show((self.current + self.len - 1) % self.len);
    }

    /// Callers only pass indices from the rendered dot row.
    pub fn jump_to(&mut self, index: usize) {
        debug_assert!(index < self.len, "slide index {index} out of range");
        if index < self.len {
            self.show(index);
        }
    }

    fn show(&mut self, index: usize) {
        self.current = index;
        for (i, fade) in self.fades.iter_mut().enumerate() {
            fade.retarget(if i == index { 1.0 } else { 0.0 });
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        for _ in 0..self.auto_advance.tick(dt) {
            self.advance();
            debug!("slideshow auto-advanced to {}", self.current);
        }
        let dt = dt.as_secs_f32();
        for fade in self.fades.iter_mut() {
            fade.update(dt);
        }
    }

    /// Stops auto-advance for good; used on unmount.
    pub fn stop(&mut self) {
        self.auto_advance.cancel();
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.auto_advance.is_active()
    }

    pub fn opacity(&self, index: usize) -> f32 {
        self.fades.get(index).map_or(0.0, |fade| fade.value)
    }

    pub fn scale(&self, index: usize) -> f32 {
        SLIDE_DIMMED_SCALE + (1.0 - SLIDE_DIMMED_SCALE) * self.opacity(index)
    }
}
