use std::time::Duration;

use log::debug;
use rand::Rng;

use crate::constants::*;
use crate::timers::Timeout;

pub const PALETTE: [[u8; 3]; 6] = [
    [0xFF, 0xD7, 0x00], // gold
    [0xFF, 0x69, 0xB4], // hot pink
    [0x00, 0xCE, 0xD1], // dark turquoise
    [0xFF, 0x63, 0x47], // tomato
    [0x93, 0x70, 0xDB], // medium purple
    [0x32, 0xCD, 0x32], // lime green
];

const GRAVITY: f32 = 120.0; // px/s²

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: DEFAULT_VIEWPORT_WIDTH, height: DEFAULT_VIEWPORT_HEIGHT }
    }
}

#[derive(Debug, Clone)]
pub struct Piece {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub color: [u8; 3],
    vx: f32,
    vy: f32,
    spin: f32,
}

/// Confetti burst with an expiry: visible for `CONFETTI_DURATION` after the
/// most recent trigger, pieces bounded by the live viewport.
pub struct Confetti {
    visible: bool,
    viewport: Viewport,
    expiry: Timeout,
    pieces: Vec<Piece>,
}

impl Confetti {
    /// Visible from mount; pieces arrive once a viewport is known.
    pub fn new(viewport: Viewport) -> Self {
        let mut expiry = Timeout::new(CONFETTI_DURATION);
        expiry.arm();
        Self { visible: true, viewport, expiry, pieces: Vec::new() }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[cfg(test)]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    #[cfg(test)]
    pub fn remaining(&self) -> Option<Duration> {
        self.expiry.remaining()
    }

    /// "More confetti": shows a fresh burst and restarts the expiry.
    pub fn trigger<R: Rng>(&mut self, rng: &mut R) {
        self.visible = true;
        self.expiry.arm();
        self.spawn(rng);
    }

    /// Spawns the burst for the current viewport if it is still showing.
    pub fn spawn<R: Rng>(&mut self, rng: &mut R) {
        if !self.visible {
            return;
        }
        let Viewport { width, height } = self.viewport;
        self.pieces = (0..CONFETTI_PIECES)
            .map(|i| Piece {
                x: rng.random_range(0.0..=width),
                y: rng.random_range(-height..=0.0),
                width: rng.random_range(5.0..12.0),
                height: rng.random_range(8.0..18.0),
                rotation: rng.random_range(0.0..360.0),
                color: PALETTE[i % PALETTE.len()],
                vx: rng.random_range(-60.0..60.0),
                vy: rng.random_range(60.0..180.0),
                spin: rng.random_range(-360.0..360.0),
            })
            .collect();
        debug!("spawned {} confetti pieces in {}x{}", self.pieces.len(), width, height);
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn tick(&mut self, dt: Duration) {
        if self.expiry.tick(dt) {
            debug!("confetti expired");
            self.visible = false;
            self.pieces.clear();
        }
        if !self.visible {
            return;
        }

        let dt = dt.as_secs_f32();
        let Viewport { width, height } = self.viewport;
        for piece in self.pieces.iter_mut() {
            piece.vy += GRAVITY * dt;
            piece.x += piece.vx * dt;
            piece.y += piece.vy * dt;
            piece.rotation = (piece.rotation + piece.spin * dt).rem_euclid(360.0);
            if width > 0.0 {
                piece.x = piece.x.rem_euclid(width);
            }
        }
        // Non-recycling: pieces that left the bottom edge are gone.
        self.pieces.retain(|piece| piece.y <= height + piece.height);
    }

    /// Unmount: the pending expiry must not fire against a torn-down view.
    pub fn stop(&mut self) {
        self.expiry.cancel();
        self.visible = false;
        self.pieces.clear();
    }
}
