//! The simulation session: a single-owner world thread fed by a command
//! queue.
//!
//! The session thread exclusively owns the [`World`]; the render thread never
//! touches it. Input arrives as [`Command`] values through a channel, the
//! thread ticks the world at a fixed cadence, pumps the detection system, and
//! publishes a freshly built [`Scene`] into a single-slot mutex for the render
//! thread to copy. Pacing follows the host contract: a 16 ms target frame,
//! the tick delta is the larger of the target and the previous frame's cost,
//! and an overrunning frame skips its sleep instead of accumulating debt.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::{ensure, Result};
use gridshade_core::{CloneProfile, Command, Event, GameMode};
use gridshade_rendering::Scene;
use gridshade_system_detection::Detection;
use gridshade_world::{apply, query, World};
use tracing::{debug, error, info};

use crate::{levels::LevelBook, scene::build_scene};

const TARGET_FRAME: Duration = Duration::from_millis(16);

/// Cell pixel size used until the first layout event arrives.
const BOOTSTRAP_CELL_SIZE: i32 = 100;

/// Owning handle for the simulation thread.
///
/// Dropping the handle signals the thread to stop and joins it, so the world
/// is never torn down while the simulation still runs.
pub(crate) struct SessionHandle {
    sender: Sender<Command>,
    scene: Arc<Mutex<Scene>>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

/// Cloneable client half handed to the render loop.
#[derive(Clone)]
pub(crate) struct SessionClient {
    sender: Sender<Command>,
    scene: Arc<Mutex<Scene>>,
}

impl SessionClient {
    /// Queues a command for the session thread. Never blocks.
    pub(crate) fn send(&self, command: Command) {
        let _ = self.sender.send(command);
    }

    /// Copies the most recently published scene.
    pub(crate) fn latest_scene(&self) -> Scene {
        match self.scene.lock() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl SessionHandle {
    /// Validates the level book, builds the starting world and spawns the
    /// simulation thread.
    pub(crate) fn spawn(
        book: LevelBook,
        profiles: Vec<CloneProfile>,
        start_level: usize,
        detection: Option<Detection>,
    ) -> Result<Self> {
        ensure!(!book.levels.is_empty(), "level book contains no levels");
        // Every level must construct; a malformed blueprint is a hard failure
        // at startup rather than a surprise mid-progression.
        for level in &book.levels {
            let _ = World::from_level(level, &profiles, BOOTSTRAP_CELL_SIZE)?;
        }

        let level_index = start_level.min(book.levels.len() - 1);
        let world = World::from_level(&book.levels[level_index], &profiles, BOOTSTRAP_CELL_SIZE)?;
        let scene = Arc::new(Mutex::new(build_scene(&world)));
        let stop = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::channel();

        let runner = SessionLoop {
            world,
            book,
            profiles,
            level_index,
            detection,
            receiver,
            scene: Arc::clone(&scene),
            stop: Arc::clone(&stop),
            last_layout: None,
        };
        let thread = thread::Builder::new()
            .name("gridshade-session".to_owned())
            .spawn(move || runner.run())?;

        Ok(Self {
            sender,
            scene,
            stop,
            thread: Some(thread),
        })
    }

    /// Creates a client half for the render loop.
    pub(crate) fn client(&self) -> SessionClient {
        SessionClient {
            sender: self.sender.clone(),
            scene: Arc::clone(&self.scene),
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

struct SessionLoop {
    world: World,
    book: LevelBook,
    profiles: Vec<CloneProfile>,
    level_index: usize,
    detection: Option<Detection>,
    receiver: Receiver<Command>,
    scene: Arc<Mutex<Scene>>,
    stop: Arc<AtomicBool>,
    last_layout: Option<Command>,
}

impl SessionLoop {
    fn run(mut self) {
        let mut last_frame = TARGET_FRAME;
        while !self.stop.load(Ordering::Relaxed) {
            let frame_start = Instant::now();

            self.drain_input();
            self.tick(last_frame);
            self.publish();

            let frame_time = frame_start.elapsed();
            last_frame = frame_time.max(TARGET_FRAME);
            if let Some(sleep) = TARGET_FRAME.checked_sub(frame_time) {
                thread::sleep(sleep);
            }
        }
    }

    fn drain_input(&mut self) {
        while let Ok(command) = self.receiver.try_recv() {
            if matches!(command, Command::Click { .. }) && query::mode(&self.world).is_terminal() {
                // A terminal state is dismissed by the next click: advance on
                // success, retry the same level on failure.
                self.advance_level();
                continue;
            }
            if matches!(command, Command::ConfigureLayout { .. }) {
                self.last_layout = Some(command.clone());
            }
            let mut events = Vec::new();
            apply(&mut self.world, command, &mut events);
            self.log_events(&events);
        }
    }

    fn tick(&mut self, dt: Duration) {
        let mut events = Vec::new();
        apply(&mut self.world, Command::Tick { dt }, &mut events);

        if let Some(detection) = &self.detection {
            let guards = query::guard_vision(&self.world);
            let intruders = query::intruders(&self.world);
            let mut commands = Vec::new();
            detection.handle(
                &events,
                query::mode(&self.world),
                &guards,
                &intruders,
                &mut commands,
            );
            for command in commands {
                apply(&mut self.world, command, &mut events);
            }
        }

        self.log_events(&events);
    }

    fn advance_level(&mut self) {
        if query::mode(&self.world) == GameMode::Success {
            self.level_index += 1;
        }
        self.level_index = self.level_index.min(self.book.levels.len() - 1);
        let blueprint = &self.book.levels[self.level_index];
        match World::from_level(blueprint, &self.profiles, BOOTSTRAP_CELL_SIZE) {
            Ok(world) => {
                self.world = world;
                info!(level = self.level_index, name = %blueprint.name, "level loaded");
                if let Some(layout) = self.last_layout.clone() {
                    let mut events = Vec::new();
                    apply(&mut self.world, layout, &mut events);
                }
            }
            // The book was validated at startup, so this cannot fire for the
            // same blueprint twice.
            Err(problem) => error!(%problem, "level rebuild failed"),
        }
    }

    fn publish(&self) {
        let scene = build_scene(&self.world);
        match self.scene.lock() {
            Ok(mut slot) => *slot = scene,
            Err(poisoned) => *poisoned.into_inner() = scene,
        }
    }

    fn log_events(&self, events: &[Event]) {
        for event in events {
            match event {
                Event::ModeChanged { mode } => info!(?mode, "game state changed"),
                Event::SelectionChanged { selected } => debug!(?selected, "selection changed"),
                Event::CloneSpawned { profile, cell, .. } => {
                    debug!(profile, ?cell, "clone placed");
                }
                Event::IntruderSighted { guard, .. } => {
                    info!(guard = guard.get(), "intruder sighted");
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SessionHandle;
    use crate::levels::{clone_profiles, load_book};
    use gridshade_core::{Command, ScreenPoint};
    use gridshade_rendering::ControlGlyph;
    use std::time::{Duration, Instant};

    fn wait_until<F>(mut condition: F) -> bool
    where
        F: FnMut() -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn the_session_publishes_scenes_and_applies_clicks() {
        let session = SessionHandle::spawn(
            load_book().expect("book parses"),
            clone_profiles(),
            0,
            None,
        )
        .expect("session spawns");
        let client = session.client();

        client.send(Command::ConfigureLayout {
            viewport_width: 900,
            panel_width: 100,
            height: 600,
            cell_size: 100,
        });
        // Panel toggle: the first level starts in plan mode showing play.
        assert!(wait_until(|| {
            client.latest_scene().panel.control == Some(ControlGlyph::Play)
        }));

        client.send(Command::Click {
            at: ScreenPoint::new(950, 10),
        });
        assert!(wait_until(|| {
            client.latest_scene().panel.control == Some(ControlGlyph::Pause)
        }));

        drop(session);
    }

    #[test]
    fn out_of_range_start_levels_clamp_to_the_last_level() {
        let book = load_book().expect("book parses");
        let session = SessionHandle::spawn(book, clone_profiles(), 999, None)
            .expect("session spawns despite the out-of-range start");
        drop(session);
    }

    #[test]
    fn dropping_the_handle_stops_the_thread() {
        let session = SessionHandle::spawn(
            load_book().expect("book parses"),
            clone_profiles(),
            0,
            None,
        )
        .expect("session spawns");
        let client = session.client();
        drop(session);

        // The thread is gone: sends are ignored rather than applied.
        client.send(Command::Click {
            at: ScreenPoint::new(10, 10),
        });
    }
}
