use std::sync::mpsc::{self, Receiver};

use log::{debug, error, info, warn};

use crate::constants::*;
use crate::media::{MediaEventKind, MediaResource, PlayRequest, Subscription};

pub const MSG_FILE_ERROR: &str = "Audio file not found or cannot be played";
pub const MSG_ENABLE_PLAYBACK: &str = "Click to enable audio playback";
pub const MSG_NOT_FOUND: &str = "Audio element not found";

const PRIMARY_EVENTS: [MediaEventKind; 8] = [
    MediaEventKind::CanPlay,
    MediaEventKind::CanPlayThrough,
    MediaEventKind::Play,
    MediaEventKind::Pause,
    MediaEventKind::Error,
    MediaEventKind::Ended,
    MediaEventKind::LoadStart,
    MediaEventKind::LoadedData,
];

const FALLBACK_EVENTS: [MediaEventKind; 4] = [
    MediaEventKind::Play,
    MediaEventKind::Pause,
    MediaEventKind::Error,
    MediaEventKind::Ended,
];

#[derive(Debug, Clone, PartialEq)]
pub struct AudioState {
    pub ready: bool,
    pub playing: bool,
    pub volume: f32,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioStatus {
    NotReady,
    ReadyPaused,
    ReadyPlaying,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Primary,
    Fallback,
}

struct Track<M> {
    media: M,
    events: Option<Receiver<MediaEventKind>>,
    subscriptions: Vec<Subscription>,
}

impl<M: MediaResource> Track<M> {
    fn new(media: M) -> Self {
        Self { media, events: None, subscriptions: Vec::new() }
    }

    fn attach(&mut self, kinds: &[MediaEventKind]) {
        if self.events.is_some() {
            return;
        }
        let (tx, rx) = mpsc::channel();
        self.subscriptions = kinds
            .iter()
            .map(|kind| self.media.subscribe(*kind, tx.clone()))
            .collect();
        self.events = Some(rx);
    }

    fn detach(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            self.media.unsubscribe(subscription);
        }
        self.events = None;
    }

    fn drain(&self) -> Vec<MediaEventKind> {
        self.events.as_ref().map(|rx| rx.try_iter().collect()).unwrap_or_default()
    }
}

/// Background music controller. User intent issues requests; the
/// resources' lifecycle notifications decide what is actually playing.
pub struct AudioController<M: MediaResource> {
    primary: Option<Track<M>>,
    fallback: Option<Track<M>>,
    state: AudioState,
    active: Option<Channel>,
    pending: Option<(Channel, PlayRequest)>,
    mounted: bool,
}

impl<M: MediaResource> AudioController<M> {
    pub fn new(primary: Option<M>, fallback: Option<M>, volume: f32) -> Self {
        Self {
            primary: primary.map(Track::new),
            fallback: fallback.map(Track::new),
            state: AudioState {
                ready: false,
                playing: false,
                volume: clamp_volume(volume).unwrap_or(DEFAULT_VOLUME),
                error: None,
            },
            active: None,
            pending: None,
            mounted: false,
        }
    }

    /// Subscribes once and issues the initial load. Volume changes never
    /// come back through here.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        let volume = self.state.volume;
        if let Some(track) = self.primary.as_mut() {
            track.attach(&PRIMARY_EVENTS);
            track.media.set_volume(volume);
            track.media.load();
        } else {
            warn!("no background track configured");
        }
        if let Some(track) = self.fallback.as_mut() {
            track.attach(&FALLBACK_EVENTS);
        }
    }

    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.pending = None;
        if let Some(channel) = self.active.take() {
            if let Some(track) = self.track_mut(channel) {
                track.media.pause();
            }
        }
        for track in [self.primary.as_mut(), self.fallback.as_mut()].into_iter().flatten() {
            track.detach();
        }
        self.state.playing = false;
        info!("audio controller unmounted");
    }

    pub fn state(&self) -> &AudioState {
        &self.state
    }

    pub fn status(&self) -> AudioStatus {
        if let Some(message) = &self.state.error {
            AudioStatus::Error(message.clone())
        } else if self.state.playing {
            AudioStatus::ReadyPlaying
        } else if self.state.ready {
            AudioStatus::ReadyPaused
        } else {
            AudioStatus::NotReady
        }
    }

    /// The play control is inert until the primary resource is ready.
    /// Without any primary resource it stays live so a press can report it.
    pub fn can_toggle(&self) -> bool {
        self.primary.is_none() || self.status() != AudioStatus::NotReady
    }

    #[cfg(test)]
    pub fn active_channel(&self) -> Option<Channel> {
        self.active
    }

    #[cfg(test)]
    pub fn is_request_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn toggle(&mut self) {
        if !self.mounted {
            return;
        }
        if self.primary.is_none() {
            error!("play requested without a primary audio resource");
            self.state.error = Some(MSG_NOT_FOUND.to_string());
            return;
        }
        if !self.can_toggle() {
            debug!("play toggle ignored: audio not ready");
            return;
        }
        if self.pending.is_some() {
            debug!("play toggle ignored: request in flight");
            return;
        }

        if self.state.playing {
            let channel = self.active.unwrap_or(Channel::Primary);
            if let Some(track) = self.track_mut(channel) {
                track.media.pause();
            }
            self.state.playing = false;
        } else if let Some(track) = self.primary.as_mut() {
            debug!("requesting playback on primary track");
            self.pending = Some((Channel::Primary, track.media.play()));
            // Notifications raised while starting must land before the answer.
            self.process_events();
            self.settle();
        }
    }

    /// Clamps and applies the volume to the sounding resource(s) without
    /// touching subscriptions or reloading.
    pub fn set_volume(&mut self, volume: f32) {
        let Some(volume) = clamp_volume(volume) else {
            warn!("ignoring non-finite volume {volume}");
            return;
        };
        self.state.volume = volume;
        if let Some(track) = self.primary.as_mut() {
            track.media.set_volume(volume);
        }
        if self.active == Some(Channel::Fallback) {
            if let Some(track) = self.fallback.as_mut() {
                track.media.set_volume(volume);
            }
        }
    }

    /// Services the resources, applies queued lifecycle notifications and
    /// settles any answered play request.
    pub fn update(&mut self) {
        if !self.mounted {
            return;
        }
        for track in [self.primary.as_mut(), self.fallback.as_mut()].into_iter().flatten() {
            track.media.pump();
        }
        self.process_events();
        self.settle();
    }

    fn process_events(&mut self) {
        let primary_events = self.primary.as_ref().map(Track::drain).unwrap_or_default();
        for kind in primary_events {
            self.on_primary_event(kind);
        }
        let fallback_events = self.fallback.as_ref().map(Track::drain).unwrap_or_default();
        for kind in fallback_events {
            self.on_fallback_event(kind);
        }
    }

    pub fn log_diagnostics(&self) {
        info!("audio state: {:?} (status {:?}, active {:?})", self.state, self.status(), self.active);
        for (name, track) in [("primary", self.primary.as_ref()), ("fallback", self.fallback.as_ref())] {
            match track {
                Some(track) => info!("{name} track: {}", track.media.diagnostics()),
                None => info!("{name} track: none"),
            }
        }
    }

    fn track_mut(&mut self, channel: Channel) -> Option<&mut Track<M>> {
        match channel {
            Channel::Primary => self.primary.as_mut(),
            Channel::Fallback => self.fallback.as_mut(),
        }
    }

    fn on_primary_event(&mut self, kind: MediaEventKind) {
        debug!("primary track: {kind}");
        match kind {
            MediaEventKind::LoadStart => {}
            MediaEventKind::CanPlay => {
                self.state.ready = true;
                self.state.error = None;
            }
            MediaEventKind::CanPlayThrough | MediaEventKind::LoadedData => {
                self.state.ready = true;
            }
            MediaEventKind::Play => {
                self.active = Some(Channel::Primary);
                self.state.playing = true;
                self.state.error = None;
            }
            MediaEventKind::Pause | MediaEventKind::Ended => {
                if self.active != Some(Channel::Fallback) {
                    self.state.playing = false;
                }
            }
            MediaEventKind::Error => {
                error!("primary track reported an error");
                if self.active == Some(Channel::Fallback) {
                    if let Some(track) = self.fallback.as_mut() {
                        track.media.pause();
                    }
                }
                self.active = None;
                self.state.error = Some(MSG_FILE_ERROR.to_string());
                self.state.playing = false;
                self.state.ready = false;
            }
        }
    }

    fn on_fallback_event(&mut self, kind: MediaEventKind) {
        debug!("fallback track: {kind}");
        match kind {
            MediaEventKind::Play => {
                self.active = Some(Channel::Fallback);
                self.state.ready = true;
                self.state.playing = true;
                self.state.error = None;
            }
            MediaEventKind::Pause | MediaEventKind::Ended => {
                if self.active == Some(Channel::Fallback) {
                    self.state.playing = false;
                }
            }
            MediaEventKind::Error => {
                if self.active == Some(Channel::Fallback) {
                    error!("fallback track failed while playing");
                    self.active = None;
                    self.state.playing = false;
                    self.state.error = Some(MSG_ENABLE_PLAYBACK.to_string());
                }
            }
            _ => {}
        }
    }

    fn settle(&mut self) {
        while let Some((channel, request)) = self.pending.take() {
            let Some(result) = request.poll() else {
                self.pending = Some((channel, request));
                return;
            };
            match (channel, result) {
                (channel, Ok(())) => {
                    info!("playback started on {channel:?} track");
                    self.active = Some(channel);
                    self.state.ready = true;
                    self.state.playing = true;
                    self.state.error = None;
                }
                (Channel::Primary, Err(err)) => {
                    warn!("primary playback failed: {err}");
                    let volume = self.state.volume;
                    match self.fallback.as_mut() {
                        Some(track) => {
                            track.media.set_volume(volume);
                            self.pending = Some((Channel::Fallback, track.media.play()));
                        }
                        None => self.fail_playback(),
                    }
                }
                (Channel::Fallback, Err(err)) => {
                    error!("fallback playback failed: {err}");
                    self.fail_playback();
                }
            }
        }
    }

    fn fail_playback(&mut self) {
        self.active = None;
        self.state.playing = false;
        self.state.error = Some(MSG_ENABLE_PLAYBACK.to_string());
    }
}

/// Volumes live in `[0, 1]`; non-finite input is rejected.
pub fn clamp_volume(volume: f32) -> Option<f32> {
    volume.is_finite().then(|| volume.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::testing::{FakeMedia, Script};
    use pretty_assertions::assert_eq;

    fn controller(primary: &FakeMedia, fallback: &FakeMedia) -> AudioController<FakeMedia> {
        let mut audio = AudioController::new(Some(primary.clone()), Some(fallback.clone()), 0.5);
        audio.mount();
        audio
    }

    fn ready(primary: &FakeMedia, audio: &mut AudioController<FakeMedia>) {
        primary.emit(MediaEventKind::CanPlay);
        audio.update();
    }

    #[test]
    fn mount_subscribes_once_and_loads() {
        let primary = FakeMedia::default();
        let fallback = FakeMedia::default();
        let mut audio = controller(&primary, &fallback);
        audio.mount();
        assert_eq!(primary.state().loads, 1);
        assert_eq!(primary.state().listeners.len(), PRIMARY_EVENTS.len());
        assert_eq!(fallback.state().listeners.len(), FALLBACK_EVENTS.len());
        assert_eq!(primary.state().volume, Some(0.5));
        assert_eq!(audio.status(), AudioStatus::NotReady);
    }

    #[test]
    fn can_play_makes_it_ready() {
        let primary = FakeMedia::default();
        let mut audio = controller(&primary, &FakeMedia::default());
        ready(&primary, &mut audio);
        assert_eq!(audio.status(), AudioStatus::ReadyPaused);
    }

    #[test]
    fn toggle_is_inert_while_not_ready() {
        let primary = FakeMedia::default();
        let mut audio = controller(&primary, &FakeMedia::default());
        assert!(!audio.can_toggle());
        audio.toggle();
        assert_eq!(primary.state().plays, 0);
        assert_eq!(audio.status(), AudioStatus::NotReady);
    }

    #[test]
    fn successful_play_then_pause() {
        let primary = FakeMedia::default();
        let mut audio = controller(&primary, &FakeMedia::default());
        ready(&primary, &mut audio);

        audio.toggle();
        assert_eq!(audio.status(), AudioStatus::ReadyPlaying);
        assert_eq!(audio.active_channel(), Some(Channel::Primary));

        audio.toggle();
        assert_eq!(audio.status(), AudioStatus::ReadyPaused);
        assert_eq!(primary.state().pauses, 1);
    }

    #[test]
    fn deferred_play_resolution_is_awaited() {
        let primary = FakeMedia::scripted([Script::Hold]);
        let mut audio = controller(&primary, &FakeMedia::default());
        ready(&primary, &mut audio);

        audio.toggle();
        assert!(audio.is_request_pending());
        assert_eq!(audio.status(), AudioStatus::ReadyPaused);
        audio.toggle();
        assert_eq!(primary.state().plays, 1);

        primary.resolve_pending(Ok(()));
        audio.update();
        assert_eq!(audio.status(), AudioStatus::ReadyPlaying);
    }

    #[test]
    fn fallback_takes_over_when_primary_is_rejected() {
        let primary = FakeMedia::scripted([Script::Fail]);
        let fallback = FakeMedia::scripted([Script::Succeed]);
        let mut audio = controller(&primary, &fallback);
        ready(&primary, &mut audio);
        audio.set_volume(0.8);

        audio.toggle();
        assert_eq!(audio.status(), AudioStatus::ReadyPlaying);
        assert_eq!(audio.active_channel(), Some(Channel::Fallback));
        assert_eq!(fallback.state().volume, Some(0.8));

        audio.toggle();
        assert_eq!(fallback.state().pauses, 1);
        assert_eq!(primary.state().pauses, 0);
        assert_eq!(audio.status(), AudioStatus::ReadyPaused);
    }

    #[test]
    fn both_failing_surfaces_enable_message() {
        let primary = FakeMedia::scripted([Script::Fail]);
        let fallback = FakeMedia::scripted([Script::Fail]);
        let mut audio = controller(&primary, &fallback);
        ready(&primary, &mut audio);

        audio.toggle();
        assert_eq!(audio.status(), AudioStatus::Error(MSG_ENABLE_PLAYBACK.into()));
        assert!(!audio.state().playing);
    }

    #[test]
    fn success_clears_a_previous_error() {
        let primary = FakeMedia::scripted([Script::Fail, Script::Succeed]);
        let fallback = FakeMedia::scripted([Script::Fail]);
        let mut audio = controller(&primary, &fallback);
        ready(&primary, &mut audio);

        audio.toggle();
        assert_eq!(audio.state().error.as_deref(), Some(MSG_ENABLE_PLAYBACK));
        audio.toggle();
        assert_eq!(audio.state().error, None);
        assert_eq!(audio.status(), AudioStatus::ReadyPlaying);
    }

    #[test]
    fn primary_error_notification_wins_from_any_state() {
        let primary = FakeMedia::default();
        let mut audio = controller(&primary, &FakeMedia::default());
        ready(&primary, &mut audio);
        audio.toggle();
        assert_eq!(audio.status(), AudioStatus::ReadyPlaying);

        primary.emit(MediaEventKind::Error);
        audio.update();
        assert_eq!(audio.status(), AudioStatus::Error(MSG_FILE_ERROR.into()));
        assert!(!audio.state().playing);
        assert!(!audio.state().ready);
    }

    #[test]
    fn primary_error_silences_a_playing_fallback() {
        let primary = FakeMedia::scripted([Script::Fail]);
        let fallback = FakeMedia::scripted([Script::Succeed]);
        let mut audio = controller(&primary, &fallback);
        ready(&primary, &mut audio);
        audio.toggle();
        assert_eq!(audio.active_channel(), Some(Channel::Fallback));
        assert!(fallback.state().playing);

        primary.emit(MediaEventKind::Error);
        audio.update();
        assert_eq!(fallback.state().pauses, 1);
        assert!(!fallback.state().playing);
        assert_eq!(audio.status(), AudioStatus::Error(MSG_FILE_ERROR.into()));
        assert!(!audio.state().playing);
        assert_eq!(audio.active_channel(), None);
    }

    #[test]
    fn volume_follows_the_active_fallback() {
        let primary = FakeMedia::scripted([Script::Fail]);
        let fallback = FakeMedia::scripted([Script::Succeed]);
        let mut audio = controller(&primary, &fallback);
        ready(&primary, &mut audio);
        audio.toggle();
        assert_eq!(audio.active_channel(), Some(Channel::Fallback));

        audio.set_volume(0.2);
        assert_eq!(fallback.state().volume, Some(0.2));
        assert_eq!(primary.state().volume, Some(0.2));
        assert_eq!(audio.state().volume, 0.2);
    }

    #[test]
    fn idle_fallback_keeps_its_volume() {
        let primary = FakeMedia::default();
        let fallback = FakeMedia::default();
        let mut audio = controller(&primary, &fallback);
        ready(&primary, &mut audio);
        audio.toggle();

        audio.set_volume(0.2);
        assert_eq!(primary.state().volume, Some(0.2));
        assert_eq!(fallback.state().volume, None);
    }

    #[test]
    fn lifecycle_notifications_override_intent() {
        let primary = FakeMedia::default();
        let mut audio = controller(&primary, &FakeMedia::default());
        ready(&primary, &mut audio);
        audio.toggle();

        primary.emit(MediaEventKind::Pause);
        audio.update();
        assert_eq!(audio.status(), AudioStatus::ReadyPaused);

        primary.emit(MediaEventKind::Play);
        audio.update();
        assert_eq!(audio.status(), AudioStatus::ReadyPlaying);

        primary.emit(MediaEventKind::Ended);
        audio.update();
        assert_eq!(audio.status(), AudioStatus::ReadyPaused);
    }

    #[test]
    fn fallback_notifications_track_the_fallback() {
        let primary = FakeMedia::scripted([Script::Fail]);
        let fallback = FakeMedia::scripted([Script::Succeed]);
        let mut audio = controller(&primary, &fallback);
        ready(&primary, &mut audio);
        audio.toggle();

        // A pause from the idle primary says nothing about the fallback.
        primary.emit(MediaEventKind::Pause);
        audio.update();
        assert!(audio.state().playing);

        fallback.emit(MediaEventKind::Ended);
        audio.update();
        assert!(!audio.state().playing);
    }

    #[test]
    fn error_raised_while_starting_does_not_stop_the_fallback() {
        let primary = FakeMedia::scripted([Script::Fail, Script::Fail]);
        let fallback = FakeMedia::scripted([Script::Succeed, Script::Succeed]);
        let mut audio = controller(&primary, &fallback);
        ready(&primary, &mut audio);

        // The primary reports its failure as a notification too.
        primary.emit(MediaEventKind::Error);
        audio.toggle();
        assert_eq!(audio.status(), AudioStatus::ReadyPlaying);
        assert_eq!(fallback.state().pauses, 0);

        audio.toggle();
        assert_eq!(audio.status(), AudioStatus::ReadyPaused);
        audio.toggle();
        assert_eq!(audio.status(), AudioStatus::ReadyPlaying);
        assert_eq!(fallback.state().plays, 2);
    }

    #[test]
    fn missing_primary_reports_not_found_without_fallback() {
        let fallback = FakeMedia::default();
        let mut audio = AudioController::new(None, Some(fallback.clone()), 0.5);
        audio.mount();
        assert!(audio.can_toggle());
        audio.toggle();
        assert_eq!(audio.status(), AudioStatus::Error(MSG_NOT_FOUND.into()));
        assert_eq!(fallback.state().plays, 0);
    }

    #[test]
    fn volume_is_clamped_and_idempotent() {
        let primary = FakeMedia::default();
        let mut audio = controller(&primary, &FakeMedia::default());
        audio.set_volume(0.3);
        audio.set_volume(0.3);
        assert_eq!(audio.state().volume, 0.3);
        assert_eq!(primary.state().volume, Some(0.3));

        audio.set_volume(1.7);
        assert_eq!(audio.state().volume, 1.0);
        audio.set_volume(-2.0);
        assert_eq!(audio.state().volume, 0.0);
        audio.set_volume(f32::NAN);
        assert_eq!(audio.state().volume, 0.0);
    }

    #[test]
    fn volume_changes_never_reload() {
        let primary = FakeMedia::default();
        let mut audio = controller(&primary, &FakeMedia::default());
        for step in 0..=10 {
            audio.set_volume(step as f32 * VOLUME_STEP);
        }
        assert_eq!(primary.state().loads, 1);
        assert_eq!(primary.state().listeners.len(), PRIMARY_EVENTS.len());
    }

    #[test]
    fn unmount_detaches_and_ignores_late_answers() {
        let primary = FakeMedia::scripted([Script::Hold]);
        let mut audio = controller(&primary, &FakeMedia::default());
        ready(&primary, &mut audio);
        audio.toggle();

        audio.unmount();
        assert_eq!(primary.state().listeners.len(), 0);

        primary.resolve_pending(Ok(()));
        primary.emit(MediaEventKind::Play);
        audio.update();
        assert!(!audio.state().playing);
        assert!(!audio.is_request_pending());
    }

    #[test]
    fn aborted_request_goes_to_fallback() {
        let primary = FakeMedia::scripted([Script::Hold]);
        let fallback = FakeMedia::scripted([Script::Succeed]);
        let mut audio = controller(&primary, &fallback);
        ready(&primary, &mut audio);
        audio.toggle();

        let resolver = primary.0.borrow_mut().held.remove(0);
        drop(resolver);
        audio.update();
        assert_eq!(audio.active_channel(), Some(Channel::Fallback));
        assert_eq!(audio.status(), AudioStatus::ReadyPlaying);
    }
}
