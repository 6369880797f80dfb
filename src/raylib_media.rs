use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use log::{debug, error};
use raylib::prelude::*;

use crate::media::{
    Listeners, MediaDiagnostics, MediaError, MediaEventKind, MediaResource, PlayRequest, Subscription,
};

/// A looping music stream on the raylib audio device.
pub struct RaylibTrack<'aud> {
    device: &'aud RaylibAudio,
    path: PathBuf,
    music: Option<Music<'aud>>,
    listeners: Listeners,
    volume: f32,
    paused: bool,
    was_playing: bool,
}

impl<'aud> RaylibTrack<'aud> {
    pub fn new(device: &'aud RaylibAudio, path: &Path) -> Self {
        Self {
            device,
            path: path.to_path_buf(),
            music: None,
            listeners: Listeners::default(),
            volume: 1.0,
            paused: false,
            was_playing: false,
        }
    }

    fn open(&mut self) -> Result<(), MediaError> {
        if self.music.is_some() {
            return Ok(());
        }
        self.listeners.emit(MediaEventKind::LoadStart);
        let path = self
            .path
            .to_str()
            .ok_or_else(|| MediaError::Load(format!("non UTF-8 path {:?}", self.path)))?;
        let music = self
            .device
            .new_music(path)
            .map_err(|e| MediaError::Load(format!("{}: {}", self.path.display(), e)))?;
        // raylib streams loop by default.
        music.set_volume(self.volume);
        debug!("loaded {} ({:.1}s)", self.path.display(), music.get_time_length());
        self.music = Some(music);
        self.listeners.emit(MediaEventKind::LoadedData);
        self.listeners.emit(MediaEventKind::CanPlay);
        self.listeners.emit(MediaEventKind::CanPlayThrough);
        Ok(())
    }
}

impl MediaResource for RaylibTrack<'_> {
    fn load(&mut self) {
        if let Err(e) = self.open() {
            error!("{e}");
            self.listeners.emit(MediaEventKind::Error);
        }
    }

    fn play(&mut self) -> PlayRequest {
        if let Err(e) = self.open() {
            self.listeners.emit(MediaEventKind::Error);
            return PlayRequest::resolved(Err(e));
        }
        let Some(music) = self.music.as_ref() else {
            return PlayRequest::resolved(Err(MediaError::NotLoaded));
        };
        if self.paused {
            music.resume_stream();
        } else {
            music.play_stream();
        }
        if !music.is_stream_playing() {
            return PlayRequest::resolved(Err(MediaError::Rejected(format!(
                "{} did not start",
                self.path.display()
            ))));
        }
        self.paused = false;
        self.was_playing = true;
        self.listeners.emit(MediaEventKind::Play);
        PlayRequest::resolved(Ok(()))
    }

    fn pause(&mut self) {
        if let Some(music) = self.music.as_ref() {
            music.pause_stream();
            self.paused = true;
            self.was_playing = false;
            self.listeners.emit(MediaEventKind::Pause);
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(music) = self.music.as_ref() {
            music.set_volume(volume);
        }
    }

    fn subscribe(&mut self, kind: MediaEventKind, sink: Sender<MediaEventKind>) -> Subscription {
        self.listeners.add(kind, sink)
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        self.listeners.remove(subscription);
    }

    fn pump(&mut self) {
        let Some(music) = self.music.as_ref() else {
            return;
        };
        music.update_stream();
        if self.was_playing && !music.is_stream_playing() {
            self.was_playing = false;
            self.paused = false;
            self.listeners.emit(MediaEventKind::Ended);
        }
    }

    fn diagnostics(&self) -> MediaDiagnostics {
        let mut diagnostics = MediaDiagnostics {
            source: self.path.display().to_string(),
            volume: self.volume,
            ..MediaDiagnostics::default()
        };
        if let Some(music) = self.music.as_ref() {
            diagnostics.loaded = true;
            diagnostics.playing = music.is_stream_playing();
            diagnostics.position = music.get_time_played();
            diagnostics.length = music.get_time_length();
        }
        diagnostics
    }
}
