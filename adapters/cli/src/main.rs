#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line host that boots the Gridshade experience.
//!
//! The host owns both halves of the concurrency contract: the simulation
//! session thread (via [`session::SessionHandle`]) and the macroquad render
//! loop, wired together by a command channel and a published-scene slot.

mod levels;
mod scene;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use gridshade_core::{Command, ScreenPoint, WELCOME_BANNER};
use gridshade_rendering::{compute_layout, Color, Presentation, RenderingBackend, ViewportLayout};
use gridshade_rendering_macroquad::MacroquadBackend;
use gridshade_system_detection::Detection;
use tracing::info;

/// Command-line arguments for the Gridshade host.
#[derive(Debug, Parser)]
#[command(name = "gridshade", about = "A grid stealth-planning puzzle")]
struct Args {
    /// Zero-based index of the level to start on.
    #[arg(long, default_value_t = 0)]
    level: usize,

    /// Print a frame-rate summary to stdout once per second.
    #[arg(long)]
    fps: bool,

    /// Let guards watch without ever failing the attempt.
    #[arg(long)]
    no_detection: bool,

    /// Guards also spot placed clones, not just the player.
    #[arg(long)]
    spot_clones: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let book = levels::load_book()?;
    let profiles = levels::clone_profiles();
    let detection = if args.no_detection {
        None
    } else if args.spot_clones {
        Some(Detection::including_clones())
    } else {
        Some(Detection::new())
    };

    info!("{WELCOME_BANNER}");

    let session = session::SessionHandle::spawn(book, profiles, args.level, detection)
        .context("failed to start the simulation session")?;
    let client = session.client();
    let initial_scene = client.latest_scene();

    let backend = if args.fps {
        MacroquadBackend::new().with_fps_counter()
    } else {
        MacroquadBackend::new()
    };
    let presentation =
        Presentation::new("Gridshade", Color::from_rgb_u8(255, 255, 255), initial_scene);

    let mut last_layout: Option<ViewportLayout> = None;
    backend.run(presentation, move |_dt, input, scene| {
        *scene = client.latest_scene();

        if let Ok(layout) = compute_layout(
            input.screen.x as i32,
            input.screen.y as i32,
            scene.grid.columns as i32,
            scene.grid.rows as i32,
        ) {
            if last_layout != Some(layout) {
                last_layout = Some(layout);
                client.send(Command::ConfigureLayout {
                    viewport_width: layout.viewport_width,
                    panel_width: layout.panel_width,
                    height: layout.height,
                    cell_size: layout.cell_size,
                });
            }
        }

        if let Some(at) = input.pointer_up {
            client.send(Command::Click {
                at: ScreenPoint::new(at.x as i32, at.y as i32),
            });
        }
    })?;

    // The render loop is done; stop the simulation thread before teardown.
    drop(session);
    Ok(())
}
