use std::path::PathBuf;

use clap::Parser;

use crate::constants::*;
use crate::texture_loader::{LoadError, resolve_image_paths};

#[derive(Parser, Debug)]
#[command(name = "birthday-page", about = "Animated birthday greeting with slideshow and music")]
pub struct Args {
    /// Image directory, or image files in display order
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Background music file
    #[arg(long)]
    pub audio: Option<PathBuf>,

    /// Do not retry playback on a secondary stream
    #[arg(long)]
    pub no_fallback: bool,

    /// Initial volume between 0 and 1
    #[arg(long, default_value_t = DEFAULT_VOLUME)]
    pub volume: f32,

    /// Who the greeting is for
    #[arg(long, default_value = "Talha Yaqoob")]
    pub name: String,

    #[arg(long, default_value = "Kaun Talha")]
    pub song: String,

    #[arg(long, default_value = "Talha Anjum")]
    pub artist: String,

    #[arg(long, default_value_t = WINDOW_WIDTH)]
    pub width: i32,

    #[arg(long, default_value_t = WINDOW_HEIGHT)]
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Greeting {
    pub recipient: String,
    pub song_title: String,
    pub song_artist: String,
}

/// Everything the page needs from the outside world.
#[derive(Debug, Clone, PartialEq)]
pub struct PageConfig {
    pub images: Vec<PathBuf>,
    pub audio: Option<PathBuf>,
    pub fallback_audio: bool,
    pub volume: f32,
    pub greeting: Greeting,
}

impl Args {
    pub fn page_config(&self) -> Result<PageConfig, LoadError> {
        Ok(PageConfig {
            images: resolve_image_paths(&self.images)?,
            audio: self.audio.clone(),
            fallback_audio: !self.no_fallback,
            volume: self.volume,
            greeting: Greeting {
                recipient: self.name.clone(),
                song_title: self.song.clone(),
                song_artist: self.artist.clone(),
            },
        })
    }
}
