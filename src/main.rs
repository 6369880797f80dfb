use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use raylib::prelude::*;

mod audio;
mod balloons;
mod config;
mod confetti;
mod constants;
mod media;
mod page;
mod raylib_media;
mod shell;
mod slide;
mod slideshow;
mod texture_loader;
mod timers;

use crate::config::Args;
use crate::constants::*;
use crate::page::Page;
use crate::raylib_media::RaylibTrack;
use crate::shell::Shell;
use crate::slide::Slide;
use crate::texture_loader::load_texture_with_exif_rotation;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = args.page_config().context("no usable images given")?;

    let (mut rl, thread) = raylib::init()
        .size(args.width, args.height)
        .title("Happy Birthday!")
        .vsync()
        .resizable()
        .build();
    rl.set_target_fps(FPS);
    rl.set_trace_log(TraceLogLevel::LOG_ERROR);

    // --- Load Slides ---
    let mut slides = Vec::new();
    let mut loaded = Vec::new();
    for path in config.images.drain(..) {
        match load_texture_with_exif_rotation(&mut rl, &thread, &path) {
            Ok(texture) => {
                slides.push(Slide::new(texture));
                loaded.push(path);
            }
            Err(e) => warn!("skipping image: {e}"),
        }
    }
    if loaded.is_empty() {
        bail!("none of the images could be loaded");
    }
    config.images = loaded;
    info!("loaded {} slides", slides.len());

    // --- Audio ---
    let device = match RaylibAudio::init_audio_device() {
        Ok(device) => Some(device),
        Err(e) => {
            warn!("audio device unavailable: {e:?}");
            None
        }
    };
    let (primary, fallback) = match (device.as_ref(), config.audio.as_deref()) {
        (Some(device), Some(path)) => (
            Some(RaylibTrack::new(device, path)),
            Some(RaylibTrack::new(device, path)),
        ),
        _ => (None, None),
    };

    let page = Page::mount(&config, primary, fallback, StdRng::from_os_rng())?;
    let mut shell = Shell::new(page, slides, config.greeting.clone());
    shell.attach(&rl);

    // --- Main Loop ---
    while !rl.window_should_close() {
        let dt = Duration::from_secs_f32(rl.get_frame_time().max(0.0));
        shell.handle_input(&rl);
        shell.update(dt);

        let mut d = rl.begin_drawing(&thread);
        shell.draw(&mut d);
    }

    shell.unmount();
    Ok(())
}
