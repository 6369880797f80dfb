//! Playable media capability. The audio controller only talks to this
//! trait, so the raylib stream and the scripted test double are
//! interchangeable.

use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("media is not loaded")]
    NotLoaded,
    #[error("failed to load media: {0}")]
    Load(String),
    #[error("playback rejected: {0}")]
    Rejected(String),
    #[error("play request dropped before it was answered")]
    Aborted,
}

/// Lifecycle notifications emitted by a media resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEventKind {
    LoadStart,
    LoadedData,
    CanPlay,
    CanPlayThrough,
    Play,
    Pause,
    Ended,
    Error,
}

impl fmt::Display for MediaEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaEventKind::LoadStart => "loadstart",
            MediaEventKind::LoadedData => "loadeddata",
            MediaEventKind::CanPlay => "canplay",
            MediaEventKind::CanPlayThrough => "canplaythrough",
            MediaEventKind::Play => "play",
            MediaEventKind::Pause => "pause",
            MediaEventKind::Ended => "ended",
            MediaEventKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// Pending answer to a play request.
pub struct PlayRequest(Receiver<Result<(), MediaError>>);

/// Producer side of a [`PlayRequest`].
pub struct PlayResolver(Sender<Result<(), MediaError>>);

impl PlayRequest {
    pub fn pending() -> (PlayResolver, PlayRequest) {
        let (tx, rx) = mpsc::channel();
        (PlayResolver(tx), PlayRequest(rx))
    }

    /// A request answered on the spot.
    pub fn resolved(result: Result<(), MediaError>) -> PlayRequest {
        let (resolver, request) = PlayRequest::pending();
        resolver.resolve(result);
        request
    }

    /// `None` while the answer is outstanding.
    pub fn poll(&self) -> Option<Result<(), MediaError>> {
        match self.0.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(MediaError::Aborted)),
        }
    }
}

impl PlayResolver {
    pub fn resolve(self, result: Result<(), MediaError>) {
        // The requester may be gone (unmounted); its answer no longer matters.
        let _ = self.0.send(result);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Listener registry shared by media implementations.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    entries: Vec<(Subscription, MediaEventKind, Sender<MediaEventKind>)>,
}

impl Listeners {
    pub fn add(&mut self, kind: MediaEventKind, sink: Sender<MediaEventKind>) -> Subscription {
        let subscription = Subscription(self.next_id);
        self.next_id += 1;
        self.entries.push((subscription, kind, sink));
        subscription
    }

    pub fn remove(&mut self, subscription: Subscription) {
        self.entries.retain(|(id, _, _)| *id != subscription);
    }

    pub fn emit(&mut self, kind: MediaEventKind) {
        // Entries whose receiver was dropped are pruned instead of delivered.
        self.entries
            .retain(|(_, wanted, sink)| *wanted != kind || sink.send(kind).is_ok());
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Snapshot for the diagnostics dump.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaDiagnostics {
    pub source: String,
    pub loaded: bool,
    pub playing: bool,
    pub position: f32,
    pub length: f32,
    pub volume: f32,
}

impl fmt::Display for MediaDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match (self.loaded, self.playing) {
            (false, _) => "not loaded",
            (true, true) => "playing",
            (true, false) => "paused",
        };
        write!(
            f,
            "{} [{state}] {:.1}/{:.1}s volume {:.0}%",
            self.source,
            self.position,
            self.length,
            self.volume * 100.0
        )
    }
}

pub trait MediaResource {
    /// Starts loading; loading an already loaded resource is a no-op.
    fn load(&mut self);
    fn play(&mut self) -> PlayRequest;
    fn pause(&mut self);
    fn set_volume(&mut self, volume: f32);
    fn subscribe(&mut self, kind: MediaEventKind, sink: Sender<MediaEventKind>) -> Subscription;
    fn unsubscribe(&mut self, subscription: Subscription);
    /// Per-frame servicing (stream refill, end detection).
    fn pump(&mut self);
    fn diagnostics(&self) -> MediaDiagnostics;
}

#[cfg(test)]
pub mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;

    /// How the next play request gets answered.
    pub enum Script {
        Succeed,
        Fail,
        /// Leave it pending; answer later with `FakeMedia::resolve_pending`.
        Hold,
    }

    #[derive(Default)]
    pub struct FakeState {
        pub listeners: Listeners,
        pub script: VecDeque<Script>,
        pub held: Vec<PlayResolver>,
        pub loads: usize,
        pub plays: usize,
        pub pauses: usize,
        pub volume: Option<f32>,
        pub playing: bool,
    }

    /// Scripted media double; clones share state so the test keeps a
    /// handle after moving one into the controller.
    #[derive(Clone, Default)]
    pub struct FakeMedia(pub Rc<RefCell<FakeState>>);

    impl FakeMedia {
        pub fn scripted(script: impl IntoIterator<Item = Script>) -> Self {
            let media = FakeMedia::default();
            media.0.borrow_mut().script.extend(script);
            media
        }

        pub fn emit(&self, kind: MediaEventKind) {
            self.0.borrow_mut().listeners.emit(kind);
        }

        pub fn resolve_pending(&self, result: Result<(), MediaError>) {
            let resolver = self.0.borrow_mut().held.remove(0);
            resolver.resolve(result);
        }

        pub fn state(&self) -> std::cell::Ref<'_, FakeState> {
            self.0.borrow()
        }
    }

    impl MediaResource for FakeMedia {
        fn load(&mut self) {
            self.0.borrow_mut().loads += 1;
        }

        fn play(&mut self) -> PlayRequest {
            let mut state = self.0.borrow_mut();
            state.plays += 1;
            match state.script.pop_front().unwrap_or(Script::Succeed) {
                Script::Succeed => {
                    state.playing = true;
                    PlayRequest::resolved(Ok(()))
                }
                Script::Fail => PlayRequest::resolved(Err(MediaError::Rejected("scripted".into()))),
                Script::Hold => {
                    let (resolver, request) = PlayRequest::pending();
                    state.held.push(resolver);
                    request
                }
            }
        }

        fn pause(&mut self) {
            let mut state = self.0.borrow_mut();
            state.pauses += 1;
            state.playing = false;
        }

        fn set_volume(&mut self, volume: f32) {
            self.0.borrow_mut().volume = Some(volume);
        }

        fn subscribe(&mut self, kind: MediaEventKind, sink: Sender<MediaEventKind>) -> Subscription {
            self.0.borrow_mut().listeners.add(kind, sink)
        }

        fn unsubscribe(&mut self, subscription: Subscription) {
            self.0.borrow_mut().listeners.remove(subscription);
        }

        fn pump(&mut self) {}

        fn diagnostics(&self) -> MediaDiagnostics {
            let state = self.0.borrow();
            MediaDiagnostics {
                source: "fake".into(),
                loaded: state.loads > 0,
                playing: state.playing,
                volume: state.volume.unwrap_or(1.0),
                ..MediaDiagnostics::default()
            }
        }
    }
}
