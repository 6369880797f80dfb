use std::time::Duration;

pub const WINDOW_WIDTH: i32 = 1280;                                  // Default window width
pub const WINDOW_HEIGHT: i32 = 720;                                  // Default window height
pub const FPS: u32 = 60;                                             // Frames per second

pub const SLIDE_INTERVAL: Duration = Duration::from_millis(3000);    // Auto-advance period
pub const SLIDE_FADE_DURATION: f32 = 0.5;                            // Cross-fade duration (seconds)
pub const SLIDE_DIMMED_SCALE: f32 = 0.95;                            // Scale of non-active slides

pub const CONFETTI_DURATION: Duration = Duration::from_millis(10_000); // Confetti lifetime after a trigger
pub const CONFETTI_PIECES: usize = 200;                              // Pieces per burst

pub const BALLOON_COUNT: usize = 20;
pub const BALLOON_MAX_DELAY_MS: u64 = 2000;
pub const BALLOON_MIN_DURATION_MS: u64 = 2000;
pub const BALLOON_MAX_DURATION_MS: u64 = 4000;

pub const DEFAULT_VOLUME: f32 = 0.5;
pub const VOLUME_STEP: f32 = 0.1;                                    // Slider granularity

pub const DEFAULT_VIEWPORT_WIDTH: f32 = 800.0;                       // Used until the window is attached
pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 600.0;
