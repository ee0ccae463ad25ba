// Interactive demo for one scratch zone.
// • Hold Left Mouse: paint (or erase) into the image.
// • The HUD shows the mode and how much of the eligible area is covered.
// • When coverage crosses the trigger threshold the HUD shows DONE.
// • R resets the round. ESC quits.

mod draw;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use draw::{Drawer, ZoneView, draw_crosshair, draw_text_5x7};
use log::*;
use scratch_zone::source::load_source;
use scratch_zone::{EligibilityPolicy, Error, FrameBuffer, PointerId, ResetMode, Zone, ZoneConfig, ZoneId};

// Canvas size when the zone is disabled and there is no image to size it.
const FALLBACK_SIZE: (usize, usize) = (512, 384);
const MOUSE: PointerId = PointerId(0);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Paint where the image is transparent
    Paint,
    /// Erase where the image is opaque
    Erase,
}

#[derive(Parser, Debug)]
#[command(name = "scratch-zone", version, about = "Paint or erase an image until a coverage threshold fires")]
struct Args {
    /// Source image (PNG, JPEG, ...)
    image: PathBuf,

    /// Zone config file (TOML); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Brush radius in texels
    #[arg(long)]
    radius: Option<u32>,

    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Alpha cut-off in [0,1] for eligible texels
    #[arg(long)]
    alpha_threshold: Option<f32>,

    /// Coverage ratio in (0,1] that fires the trigger
    #[arg(long)]
    trigger: Option<f32>,

    /// Make Reset wait for the worker to go idle
    #[arg(long)]
    quiescent: bool,
}

impl Args {
    fn zone_config(&self) -> Result<ZoneConfig, Error> {
        let mut cfg = match &self.config {
            Some(path) => ZoneConfig::load(path)?,
            None => ZoneConfig::default(),
        };
        if let Some(mode) = self.mode {
            cfg.policy = match mode {
                Mode::Paint => EligibilityPolicy::PaintWhereTransparent,
                Mode::Erase => EligibilityPolicy::EraseWhereOpaque,
            };
        }
        if let Some(r) = self.radius {
            cfg.brush_radius = r;
        }
        if let Some(t) = self.alpha_threshold {
            cfg.alpha_threshold = t;
        }
        if let Some(t) = self.trigger {
            cfg.trigger_threshold = t;
        }
        if self.quiescent {
            cfg.reset_mode = ResetMode::Quiescent;
        }
        Ok(cfg)
    }
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let args = Args::parse();
    let cfg = args.zone_config()?;
    info!("Config: {:?}", cfg);

    /* --- Zone setup ---
       A missing image is reported once; the window still opens on a blank canvas. */
    let mut zone = Zone::activate(ZoneId(0), load_source(&args.image), &cfg);
    let (w, h) = zone.initial().map_or(FALLBACK_SIZE, |fb| (fb.width, fb.height));

    let done = Arc::new(AtomicBool::new(false));
    let done_flag = Arc::clone(&done);
    zone.on_threshold(move |id| {
        info!("Zone {} complete", id.0);
        done_flag.store(true, Ordering::Release);
    });

    let mut drawer = Drawer::new("Scratch Zone", w, h)?;
    let mut view = ZoneView::new(w, h);
    let mut screen = FrameBuffer::filled(w, h, 0);

    let mode_tag = match zone.config().map(|c| c.policy) {
        Some(EligibilityPolicy::PaintWhereTransparent) => "PAINT",
        Some(EligibilityPolicy::EraseWhereOpaque) => "ERASE",
        None => "DISABLED",
    };

    let mut was_down = false;
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        // 1) Input → strokes. Press/hold/release edges map to begin/move/end.
        let down = drawer.left_mouse_down();
        let pos = drawer.mouse_pos();
        match (was_down, down, pos) {
            (false, true, Some((x, y))) => {
                zone.stroke_begin(MOUSE, x, y);
            }
            (true, true, Some((x, y))) => {
                zone.stroke_move(MOUSE, x, y);
            }
            (true, false, _) => zone.stroke_end(MOUSE),
            _ => {}
        }
        was_down = down;

        if drawer.r_pressed_once() {
            zone.reset();
            done.store(false, Ordering::Release);
        }

        // 2) Pick up whatever the worker painted since last frame.
        zone.frame(&mut view)?;
        screen.pixels.copy_from_slice(&view.composited.pixels);

        // 3) Crosshair + HUD
        if let Some((mx, my)) = pos {
            draw_crosshair(&mut screen, mx as i32, my as i32, 12, 0x00_FF_CC_33);
        }
        let status = if done.load(Ordering::Acquire) { " | DONE" } else { "" };
        let hud = format!(
            "{} | COVER: {:.1}%{} | R: RESET | {}",
            mode_tag,
            zone.coverage() * 100.0,
            status,
            hud_fps_text
        );
        draw_text_5x7(&mut screen, 8, 8, &hud, 0x00_FF_FF_FF);

        // 4) Present
        drawer.present(&screen)?;

        // 5) FPS, once per second
        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let fps = frames_this_second as f32 / now.duration_since(last_fps_time).as_secs_f32();
            debug!("FPS: {:.1}, coverage {:.3}", fps, zone.coverage());
            hud_fps_text = format!("FPS: {:.1}", fps);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    zone.deactivate();
    info!("Bye");
    Ok(())
}
