use std::time::Duration;

use raylib::prelude::*;

use crate::audio::AudioStatus;
use crate::config::Greeting;
use crate::confetti::Viewport;
use crate::constants::*;
use crate::page::{Action, Page};
use crate::raylib_media::RaylibTrack;
use crate::slide::Slide;

const WISHES: [&str; 3] = [
    "Wishing you a day filled with joy, laughter, and wonderful surprises!",
    "May all your dreams come true and may this year bring you endless happiness!",
    "You deserve all the love, success, and beautiful moments life has to offer!",
];

fn rgba(hex: u32, alpha: f32) -> Color {
    Color::new(
        (hex >> 16) as u8,
        (hex >> 8) as u8,
        hex as u8,
        (alpha.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Left edge that centers a run `text_width` pixels wide on `center_x`.
fn centered(center_x: f32, text_width: i32) -> i32 {
    (center_x - text_width as f32 * 0.5) as i32
}

fn contains(rect: &Rectangle, point: Vector2) -> bool {
    point.x >= rect.x && point.x <= rect.x + rect.width && point.y >= rect.y && point.y <= rect.y + rect.height
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Play,
    Diagnostics,
    Volume,
    Confetti,
    Previous,
    Next,
    Dot(usize),
}

/// Screen placement of every interactive element for one viewport.
#[derive(Debug, Clone)]
pub struct Layout {
    pub audio_panel: Rectangle,
    pub play_button: Rectangle,
    pub volume_track: Rectangle,
    pub diagnostics_button: Rectangle,
    pub message_origin: Vector2,
    pub message_width: f32,
    pub confetti_button: Rectangle,
    pub frame: Rectangle,
    pub image_area: Rectangle,
    pub previous_button: Rectangle,
    pub next_button: Rectangle,
    pub dots: Vec<Rectangle>,
}

impl Layout {
    pub fn compute(viewport: Viewport, slides: usize) -> Self {
        let Viewport { width, height } = viewport;

        let audio_panel = Rectangle::new(width - 16.0 - 170.0, 16.0, 170.0, 270.0);
        let play_button = Rectangle::new(audio_panel.x + 61.0, audio_panel.y + 36.0, 48.0, 48.0);
        let volume_track = Rectangle::new(audio_panel.x + 35.0, audio_panel.y + 160.0, 100.0, 8.0);
        let diagnostics_button = Rectangle::new(audio_panel.x + 45.0, audio_panel.y + 232.0, 80.0, 24.0);

        let column = (width * 0.5 - 48.0).max(160.0);
        let message_origin = Vector2::new(32.0, (height * 0.18).max(32.0));
        let confetti_button = Rectangle::new(32.0, (height - 150.0).max(message_origin.y), 260.0, 56.0);

        let frame_width = column.min(640.0);
        let frame_height = (height - 120.0).clamp(200.0, 600.0);
        let frame = Rectangle::new(width * 0.5 + 16.0, (height - frame_height) * 0.5, frame_width, frame_height);
        let image_area = Rectangle::new(frame.x + 16.0, frame.y + 56.0, frame.width - 32.0, frame.height - 56.0 - 64.0);

        let buttons_y = image_area.y + image_area.height + 16.0;
        let center = frame.x + frame.width * 0.5;
        let previous_button = Rectangle::new(center - 8.0 - 120.0, buttons_y, 120.0, 36.0);
        let next_button = Rectangle::new(center + 8.0, buttons_y, 120.0, 36.0);

        let dot = 12.0;
        let gap = 8.0;
        let row = slides as f32 * dot + slides.saturating_sub(1) as f32 * gap;
        let dots_x = image_area.x + (image_area.width - row) * 0.5;
        let dots_y = image_area.y + image_area.height - 16.0 - dot;
        let dots = (0..slides)
            .map(|i| Rectangle::new(dots_x + i as f32 * (dot + gap), dots_y, dot, dot))
            .collect();

        Self {
            audio_panel,
            play_button,
            volume_track,
            diagnostics_button,
            message_origin,
            message_width: column,
            confetti_button,
            frame,
            image_area,
            previous_button,
            next_button,
            dots,
        }
    }

    /// Control under `point`; the floating audio panel sits on top.
    pub fn hit(&self, point: Vector2) -> Option<Control> {
        let slider_grip = Rectangle::new(
            self.volume_track.x - 6.0,
            self.volume_track.y - 8.0,
            self.volume_track.width + 12.0,
            self.volume_track.height + 16.0,
        );
        if contains(&self.play_button, point) {
            return Some(Control::Play);
        }
        if contains(&slider_grip, point) {
            return Some(Control::Volume);
        }
        if contains(&self.diagnostics_button, point) {
            return Some(Control::Diagnostics);
        }
        if contains(&self.audio_panel, point) {
            return None;
        }
        if let Some(i) = self.dots.iter().position(|dot| contains(dot, point)) {
            return Some(Control::Dot(i));
        }
        if contains(&self.previous_button, point) {
            return Some(Control::Previous);
        }
        if contains(&self.next_button, point) {
            return Some(Control::Next);
        }
        if contains(&self.confetti_button, point) {
            return Some(Control::Confetti);
        }
        None
    }
}

/// Slider position to volume, snapped to the slider step.
pub fn slider_value(track: &Rectangle, x: f32) -> f32 {
    if track.width <= 0.0 {
        return 0.0;
    }
    let raw = ((x - track.x) / track.width).clamp(0.0, 1.0);
    (raw / VOLUME_STEP).round() * VOLUME_STEP
}

/// Greedy word wrap against an arbitrary text measure.
pub fn wrap_words(text: &str, max_width: i32, measure: impl Fn(&str) -> i32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let candidate = if line.is_empty() { word.to_string() } else { format!("{line} {word}") };
        if !line.is_empty() && measure(&candidate) > max_width {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Hosts the page in a raylib window: input → actions, state → pixels.
pub struct Shell<'aud> {
    page: Page<RaylibTrack<'aud>>,
    slides: Vec<Slide>,
    greeting: Greeting,
    layout: Layout,
    dragging_volume: bool,
}

impl<'aud> Shell<'aud> {
    pub fn new(page: Page<RaylibTrack<'aud>>, slides: Vec<Slide>, greeting: Greeting) -> Self {
        let layout = Layout::compute(page.viewport(), slides.len());
        Self { page, slides, greeting, layout, dragging_volume: false }
    }

    fn window_viewport(rl: &RaylibHandle) -> Viewport {
        Viewport {
            width: rl.get_screen_width() as f32,
            height: rl.get_screen_height() as f32,
        }
    }

    pub fn attach(&mut self, rl: &RaylibHandle) {
        let viewport = Self::window_viewport(rl);
        self.page.attach(viewport);
        self.layout = Layout::compute(viewport, self.slides.len());
    }

    pub fn handle_input(&mut self, rl: &RaylibHandle) {
        if rl.is_window_resized() {
            let viewport = Self::window_viewport(rl);
            self.page.dispatch(Action::Resize(viewport));
            self.layout = Layout::compute(viewport, self.slides.len());
        }

        let mouse = rl.get_mouse_position();
        if rl.is_mouse_button_pressed(MouseButton::MOUSE_BUTTON_LEFT) {
            match self.layout.hit(mouse) {
                Some(Control::Play) => self.page.dispatch(Action::TogglePlay),
                Some(Control::Volume) => self.dragging_volume = true,
                Some(Control::Diagnostics) => self.page.dispatch(Action::DumpAudioDiagnostics),
                Some(Control::Confetti) => self.page.dispatch(Action::MoreConfetti),
                Some(Control::Previous) => self.page.dispatch(Action::Previous),
                Some(Control::Next) => self.page.dispatch(Action::Next),
                Some(Control::Dot(i)) => self.page.dispatch(Action::JumpTo(i)),
                None => {}
            }
        }
        if self.dragging_volume {
            let volume = slider_value(&self.layout.volume_track, mouse.x);
            if volume != self.page.audio().state().volume {
                self.page.dispatch(Action::SetVolume(volume));
            }
            if !rl.is_mouse_button_down(MouseButton::MOUSE_BUTTON_LEFT) {
                self.dragging_volume = false;
            }
        }

        let keys = [
            (KeyboardKey::KEY_LEFT, Action::Previous),
            (KeyboardKey::KEY_RIGHT, Action::Next),
            (KeyboardKey::KEY_SPACE, Action::TogglePlay),
            (KeyboardKey::KEY_C, Action::MoreConfetti),
            (KeyboardKey::KEY_D, Action::DumpAudioDiagnostics),
        ];
        for (key, action) in keys {
            if rl.is_key_pressed(key) {
                self.page.dispatch(action);
            }
        }
    }

    pub fn update(&mut self, dt: Duration) {
        self.page.tick(dt);
    }

    pub fn unmount(&mut self) {
        self.page.unmount();
    }

    pub fn draw(&self, d: &mut RaylibDrawHandle) {
        let Viewport { width, height } = self.page.viewport();
        d.clear_background(rgba(0x111827, 1.0));
        d.draw_rectangle_gradient_v(0, 0, width as i32, height as i32, rgba(0x111827, 1.0), rgba(0x581C87, 1.0));

        if self.page.confetti().is_visible() {
            self.draw_confetti(d);
        }
        self.draw_balloons(d, width);
        self.draw_message(d);
        self.draw_slideshow(d);
        self.draw_audio_panel(d);

        let footer = format!("Happy Birthday {}!", self.greeting.recipient);
        let footer_x = centered(width * 0.5, d.measure_text(&footer, 16));
        d.draw_text(&footer, footer_x, height as i32 - 28, 16, rgba(0xFFFFFF, 0.6));
    }

    fn draw_confetti(&self, d: &mut RaylibDrawHandle) {
        for piece in self.page.confetti().pieces() {
            let [r, g, b] = piece.color;
            d.draw_rectangle_pro(
                Rectangle::new(piece.x, piece.y, piece.width, piece.height),
                Vector2::new(piece.width * 0.5, piece.height * 0.5),
                piece.rotation,
                Color::new(r, g, b, 255),
            );
        }
    }

    fn draw_balloons(&self, d: &mut RaylibDrawHandle, width: f32) {
        let Some(balloons) = self.page.balloons() else {
            return;
        };
        let elapsed = self.page.elapsed();
        for balloon in balloons.iter() {
            let x = (balloon.left / 100.0 * width) as i32;
            let y = (40.0 - balloon.lift(elapsed) * 24.0) as i32;
            d.draw_line(x, y + 12, x, y + 30, rgba(0xFFFFFF, 0.3));
            let (body, shine) = if balloon.id % 2 == 0 { (0xA855F7, 0xF472B6) } else { (0xF472B6, 0xA855F7) };
            d.draw_ellipse(x, y, 8.0, 12.0, rgba(body, 0.6));
            d.draw_ellipse(x, y - 3, 7.0, 8.0, rgba(shine, 0.6));
        }
    }

    fn draw_message(&self, d: &mut RaylibDrawHandle) {
        let origin = self.layout.message_origin;
        let max_width = self.layout.message_width as i32;
        let x = origin.x as i32;
        let mut y = origin.y as i32;

        // Slow pulse, one cycle every two seconds.
        let phase = self.page.elapsed().as_secs_f32() * std::f32::consts::PI;
        let pulse = 0.75 + 0.25 * phase.cos();
        d.draw_text("Happy Birthday!", x, y, 72, rgba(0xFACC15, pulse));
        y += 92;
        d.draw_text(&format!("{}!", self.greeting.recipient), x, y, 44, Color::WHITE);
        y += 64;

        let styles = [(26, rgba(0xFFFFFF, 1.0)), (20, rgba(0xD1D5DB, 1.0)), (18, rgba(0x9CA3AF, 1.0))];
        for (wish, (size, color)) in WISHES.iter().zip(styles) {
            let lines = wrap_words(wish, max_width, |text| d.measure_text(text, size));
            for line in lines {
                d.draw_text(&line, x, y, size, color);
                y += size + 6;
            }
            y += 10;
        }

        self.draw_cake(d, x + 40, y + 30);

        let button = self.layout.confetti_button;
        d.draw_rectangle_rounded(button, 1.0, 16, rgba(0xEC4899, 1.0));
        let label = "More Confetti!";
        let label_x = centered(button.x + button.width * 0.5, d.measure_text(label, 24));
        d.draw_text(
            label,
            label_x,
            (button.y + button.height * 0.5 - 12.0) as i32,
            24,
            Color::WHITE,
        );
    }

    fn draw_cake(&self, d: &mut RaylibDrawHandle, x: i32, y: i32) {
        let t = self.page.elapsed().as_secs_f32();
        let bounce = ((t * std::f32::consts::PI).sin().abs() * 12.0) as i32;
        let y = y - bounce;
        d.draw_rectangle(x - 30, y, 60, 26, rgba(0xF9A8D4, 1.0));
        d.draw_rectangle(x - 30, y + 8, 60, 4, rgba(0xFFFFFF, 0.9));
        d.draw_rectangle(x - 3, y - 16, 6, 16, rgba(0xFDE68A, 1.0));
        d.draw_circle(x, y - 20, 4.0, rgba(0xF97316, 1.0));
    }

    fn draw_slideshow(&self, d: &mut RaylibDrawHandle) {
        let layout = &self.layout;
        let slideshow = self.page.slideshow();

        d.draw_rectangle_rounded(layout.frame, 0.08, 12, rgba(0x000000, 0.2));
        d.draw_rectangle_lines_ex(layout.frame, 1.0, rgba(0xFFFFFF, 0.1));

        let heading = format!("{}'s Birthday Memories", self.greeting.recipient);
        let heading_x = centered(layout.frame.x + layout.frame.width * 0.5, d.measure_text(&heading, 24));
        d.draw_text(
            &heading,
            heading_x,
            (layout.frame.y + 18.0) as i32,
            24,
            Color::WHITE,
        );

        // Every slide is drawn; only the current one is fully opaque.
        for (i, slide) in self.slides.iter().enumerate() {
            slide.draw(d, layout.image_area, slideshow.opacity(i), slideshow.scale(i));
        }

        for (i, dot) in layout.dots.iter().enumerate() {
            let center = Vector2::new(dot.x + dot.width * 0.5, dot.y + dot.height * 0.5);
            if i == slideshow.current() {
                d.draw_circle_v(center, dot.width * 0.5 * 1.25, Color::WHITE);
            } else {
                d.draw_circle_v(center, dot.width * 0.5, rgba(0xFFFFFF, 0.5));
            }
        }

        for (button, label) in [(layout.previous_button, "< Previous"), (layout.next_button, "Next >")] {
            d.draw_rectangle_rounded(button, 0.3, 8, rgba(0xFFFFFF, 0.2));
            let label_x = centered(button.x + button.width * 0.5, d.measure_text(label, 18));
            d.draw_text(
                label,
                label_x,
                (button.y + 9.0) as i32,
                18,
                Color::WHITE,
            );
        }
    }

    fn draw_audio_panel(&self, d: &mut RaylibDrawHandle) {
        let layout = &self.layout;
        let audio = self.page.audio();
        let panel = layout.audio_panel;
        let center_x = panel.x + panel.width * 0.5;

        d.draw_rectangle_rounded(panel, 0.1, 8, rgba(0x000000, 0.3));
        d.draw_rectangle_lines_ex(panel, 1.0, rgba(0xFFFFFF, 0.2));
        let title = "Background Music";
        let title_x = centered(center_x, d.measure_text(title, 14));
        d.draw_text(title, title_x, (panel.y + 12.0) as i32, 14, Color::WHITE);

        let button = layout.play_button;
        let center = Vector2::new(button.x + button.width * 0.5, button.y + button.height * 0.5);
        let fill = if audio.can_toggle() { rgba(0xDB2777, 1.0) } else { rgba(0x6B7280, 1.0) };
        d.draw_circle_v(center, button.width * 0.5, fill);
        if audio.state().playing {
            d.draw_rectangle((center.x - 8.0) as i32, (center.y - 9.0) as i32, 5, 18, Color::WHITE);
            d.draw_rectangle((center.x + 3.0) as i32, (center.y - 9.0) as i32, 5, 18, Color::WHITE);
        } else {
            d.draw_triangle(
                Vector2::new(center.x - 6.0, center.y - 10.0),
                Vector2::new(center.x - 6.0, center.y + 10.0),
                Vector2::new(center.x + 10.0, center.y),
                Color::WHITE,
            );
        }

        let mut y = (button.y + button.height + 10.0) as i32;
        match audio.status() {
            AudioStatus::NotReady => {
                let text = "Loading audio...";
                let text_x = centered(center_x, d.measure_text(text, 12));
                d.draw_text(text, text_x, y, 12, rgba(0xFDE047, 1.0));
            }
            AudioStatus::Error(message) => {
                let lines = wrap_words(&message, panel.width as i32 - 16, |text| d.measure_text(text, 12));
                for line in lines {
                    let line_x = centered(center_x, d.measure_text(&line, 12));
                    d.draw_text(&line, line_x, y, 12, rgba(0xFCA5A5, 1.0));
                    y += 14;
                }
            }
            AudioStatus::ReadyPaused | AudioStatus::ReadyPlaying => {}
        }

        let track = layout.volume_track;
        let label = "Volume";
        let label_x = centered(center_x, d.measure_text(label, 12));
        d.draw_text(label, label_x, (track.y - 20.0) as i32, 12, Color::WHITE);
        let volume = audio.state().volume;
        d.draw_rectangle_rounded(track, 1.0, 8, rgba(0xFFFFFF, 0.2));
        d.draw_rectangle_rounded(
            Rectangle::new(track.x, track.y, track.width * volume, track.height),
            1.0,
            8,
            Color::WHITE,
        );
        d.draw_circle_v(Vector2::new(track.x + track.width * volume, track.y + track.height * 0.5), 7.0, Color::WHITE);

        let song = &self.greeting.song_title;
        let artist = &self.greeting.song_artist;
        let song_x = centered(center_x, d.measure_text(song, 12));
        d.draw_text(song, song_x, (track.y + 22.0) as i32, 12, Color::WHITE);
        let artist_x = centered(center_x, d.measure_text(artist, 12));
        d.draw_text(artist, artist_x, (track.y + 38.0) as i32, 12, rgba(0xD1D5DB, 1.0));

        let diagnostics = layout.diagnostics_button;
        d.draw_rectangle_rec(diagnostics, rgba(0x3B82F6, 1.0));
        let text = "Test Audio";
        let text_x = centered(center_x, d.measure_text(text, 12));
        d.draw_text(text, text_x, (diagnostics.y + 6.0) as i32, 12, Color::WHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn center(rect: &Rectangle) -> Vector2 {
        Vector2::new(rect.x + rect.width * 0.5, rect.y + rect.height * 0.5)
    }

    fn layout() -> Layout {
        Layout::compute(Viewport { width: 1280.0, height: 720.0 }, 5)
    }

    #[test]
    fn one_dot_per_slide_each_hittable() {
        let layout = layout();
        assert_eq!(layout.dots.len(), 5);
        for (i, dot) in layout.dots.iter().enumerate() {
            assert_eq!(layout.hit(center(dot)), Some(Control::Dot(i)));
        }
    }

    #[test]
    fn buttons_map_to_their_controls() {
        let layout = layout();
        assert_eq!(layout.hit(center(&layout.play_button)), Some(Control::Play));
        assert_eq!(layout.hit(center(&layout.volume_track)), Some(Control::Volume));
        assert_eq!(layout.hit(center(&layout.diagnostics_button)), Some(Control::Diagnostics));
        assert_eq!(layout.hit(center(&layout.previous_button)), Some(Control::Previous));
        assert_eq!(layout.hit(center(&layout.next_button)), Some(Control::Next));
        assert_eq!(layout.hit(center(&layout.confetti_button)), Some(Control::Confetti));
        assert_eq!(layout.hit(Vector2::new(2.0, 2.0)), None);
    }

    #[test]
    fn slider_snaps_to_tenths_and_clamps() {
        let track = Rectangle::new(100.0, 0.0, 100.0, 8.0);
        assert_eq!(slider_value(&track, 50.0), 0.0);
        assert_eq!(slider_value(&track, 250.0), 1.0);
        assert!((slider_value(&track, 132.0) - 0.3).abs() < 1e-6);
        assert!((slider_value(&track, 150.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn wrapping_respects_the_width() {
        let lines = wrap_words("one two three four", 9, |text| text.len() as i32);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn text_is_centered_on_its_anchor() {
        assert_eq!(centered(100.0, 40), 80);
        assert_eq!(centered(640.0, 0), 640);
        let button = layout().confetti_button;
        let x = centered(button.x + button.width * 0.5, 120);
        assert_eq!(x as f32, button.x + (button.width - 120.0) * 0.5);
    }

    #[test]
    fn an_overlong_word_gets_its_own_line() {
        let lines = wrap_words("hi extraordinarily", 5, |text| text.len() as i32);
        assert_eq!(lines, vec!["hi", "extraordinarily"]);
    }
}
