use std::time::Duration;

use log::{debug, info};
use rand::rngs::StdRng;
use thiserror::Error;

use crate::audio::AudioController;
use crate::balloons::BalloonSet;
use crate::confetti::{Confetti, Viewport};
use crate::config::PageConfig;
use crate::media::MediaResource;
use crate::slideshow::Slideshow;

#[derive(Debug, Error, PartialEq)]
pub enum PageError {
    #[error("the slideshow needs at least one image")]
    NoImages,
}

/// Everything a user (or the host) can ask the page to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    TogglePlay,
    SetVolume(f32),
    MoreConfetti,
    Previous,
    Next,
    JumpTo(usize),
    Resize(Viewport),
    DumpAudioDiagnostics,
}

/// The greeting page state. Mounting is deterministic; randomized and
/// environment-dependent setup waits for `attach`.
pub struct Page<M: MediaResource> {
    slideshow: Slideshow,
    confetti: Confetti,
    balloons: Option<BalloonSet>,
    audio: AudioController<M>,
    viewport: Viewport,
    elapsed: Duration,
    rng: StdRng,
    mounted: bool,
}

impl<M: MediaResource> Page<M> {
    pub fn mount(config: &PageConfig, primary: Option<M>, fallback: Option<M>, rng: StdRng) -> Result<Self, PageError> {
        if config.images.is_empty() {
            return Err(PageError::NoImages);
        }
        let fallback = if config.fallback_audio { fallback } else { None };
        let mut audio = AudioController::new(primary, fallback, config.volume);
        audio.mount();

        let viewport = Viewport::default();
        info!("page mounted with {} images", config.images.len());
        Ok(Self {
            slideshow: Slideshow::new(config.images.len()),
            confetti: Confetti::new(viewport),
            balloons: None,
            audio,
            viewport,
            elapsed: Duration::ZERO,
            rng,
            mounted: true,
        })
    }

    /// Runs once the page is shown in a live window. Later calls only
    /// refresh the viewport.
    pub fn attach(&mut self, viewport: Viewport) {
        self.resize(viewport);
        if self.balloons.is_some() {
            return;
        }
        self.balloons = Some(BalloonSet::generate(&mut self.rng));
        self.confetti.spawn(&mut self.rng);
        info!("page attached at {}x{}", viewport.width, viewport.height);
    }

    pub fn dispatch(&mut self, action: Action) {
        if !self.mounted {
            return;
        }
        debug!("action {action:?}");
        match action {
            Action::TogglePlay => self.audio.toggle(),
            Action::SetVolume(volume) => self.audio.set_volume(volume),
            Action::MoreConfetti => self.confetti.trigger(&mut self.rng),
            Action::Previous => self.slideshow.retreat(),
            Action::Next => self.slideshow.advance(),
            Action::JumpTo(index) => self.slideshow.jump_to(index),
            Action::Resize(viewport) => self.resize(viewport),
            Action::DumpAudioDiagnostics => self.audio.log_diagnostics(),
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        if !self.mounted {
            return;
        }
        self.elapsed += dt;
        self.slideshow.tick(dt);
        self.confetti.tick(dt);
        self.audio.update();
    }

    /// Cancels timers and detaches media listeners.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.slideshow.stop();
        self.confetti.stop();
        self.audio.unmount();
        info!("page unmounted");
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.confetti.resize(viewport);
    }

    pub fn slideshow(&self) -> &Slideshow {
        &self.slideshow
    }

    pub fn confetti(&self) -> &Confetti {
        &self.confetti
    }

    pub fn balloons(&self) -> Option<&BalloonSet> {
        self.balloons.as_ref()
    }

    pub fn audio(&self) -> &AudioController<M> {
        &self.audio
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[cfg(test)]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}
