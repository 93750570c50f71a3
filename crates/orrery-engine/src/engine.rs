//! Real-time engine
//!
//! The engine advances the logical clock, evaluates the scene's trigger
//! entities and dispatches their messages to the sink. The clock is
//! idealized: logical position advances by exactly one period per tick
//! regardless of how late the tick actually fired, so the sequence of
//! logical times is reproducible bit for bit under any scheduling jitter.
//! Deadlines are absolute (`last_deadline + period`), so repeated
//! rescheduling cannot accumulate drift.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use orrery_model::EntityIx;
use orrery_osc::Sink;
use orrery_scene::Scene;

use crate::config::EngineConfig;
use crate::sched::{TickScheduler, Wake};

/// Clock state shared between the worker and foreign callers.
/// The lock is held only for the read-modify-write of advancing; never
/// across trigger evaluation or dispatch.
#[derive(Debug)]
struct ClockState {
    /// Logical position in seconds
    pos: f64,
    running: bool,
    /// Absolute deadline of the most recently scheduled tick
    last_deadline: Instant,
}

struct EngineShared {
    scene: Arc<RwLock<Scene>>,
    clock: Mutex<ClockState>,
    sched: TickScheduler,
    sink: Sink,
    config: EngineConfig,
    period: Duration,
}

/// The real-time engine: Stopped ⇄ Running, with a terminal shutdown
pub struct Engine {
    shared: Arc<EngineShared>,
    worker: Option<JoinHandle<()>>,
}

impl Engine {
    /// Build an engine over `scene` and spawn its worker thread; starts
    /// ticking immediately when the config says so
    pub fn new(scene: Arc<RwLock<Scene>>, config: EngineConfig) -> Engine {
        let period = config.period();
        let sink = Sink::from_endpoint(config.sink);
        let shared = Arc::new(EngineShared {
            scene,
            clock: Mutex::new(ClockState {
                pos: 0.0,
                running: false,
                last_deadline: Instant::now(),
            }),
            sched: TickScheduler::new(),
            sink,
            config,
            period,
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::spawn(move || worker_shared.run());

        let autostart = shared.config.autostart;
        let engine = Engine {
            shared,
            worker: Some(worker),
        };
        if autostart {
            engine.start();
        }
        engine
    }

    /// The scene this engine evaluates
    pub fn scene(&self) -> Arc<RwLock<Scene>> {
        Arc::clone(&self.shared.scene)
    }

    /// Current logical position in seconds
    pub fn position(&self) -> f64 {
        self.shared.clock.lock().pos
    }

    /// Set the logical position. Silently ignored while running; position
    /// is only externally settable while stopped.
    pub fn set_position(&self, pos: f64) {
        let mut clock = self.shared.clock.lock();
        if !clock.running {
            clock.pos = pos;
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.clock.lock().running
    }

    /// Start ticking from wherever the logical clock currently is
    pub fn start(&self) {
        let mut clock = self.shared.clock.lock();
        if !clock.running {
            clock.running = true;
            clock.last_deadline = Instant::now() + self.shared.period;
            self.shared.sched.schedule_at(clock.last_deadline);
        }
    }

    /// Pause in a resumable way, cancelling the at-most-one outstanding
    /// tick. An already in-flight tick may still complete.
    pub fn pause(&self) {
        {
            let mut clock = self.shared.clock.lock();
            clock.running = false;
        }
        self.shared.sched.cancel();
    }

    /// Reset the logical position to zero, re-entering the state held
    /// before the call
    pub fn rewind(&self) {
        if self.is_running() {
            self.pause();
            self.shared.clock.lock().pos = 0.0;
            self.start();
        } else {
            self.shared.clock.lock().pos = 0.0;
        }
    }

    /// Stop the loop and release the worker. No tick fires after this
    /// returns; the transition is terminal.
    pub fn shutdown(&mut self) {
        self.pause();
        self.shared.sched.shutdown();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl EngineShared {
    fn run(&self) {
        loop {
            // the idle bound keeps the loop re-checking liveness instead of
            // blocking forever with nothing scheduled
            match self.sched.wait(self.period) {
                Wake::Shutdown => break,
                Wake::Idle => continue,
                Wake::Due => self.tick(),
            }
        }
    }

    fn tick(&self) {
        let proceed = {
            let mut clock = self.clock.lock();
            // ticks arrive with jitter; the idealized clock does not
            clock.pos += self.period.as_secs_f64();
            tracing::debug!("tick -> {:.6}", clock.pos);

            if let Some(end) = self.config.end_time {
                if clock.pos > end {
                    clock.running = false;
                }
            }
            if clock.running {
                clock.last_deadline += self.period;
                self.sched.schedule_at(clock.last_deadline);
            }
            clock.running
        };

        if proceed {
            self.fire_triggers();
        }
    }

    fn fire_triggers(&self) {
        // re-read the position through the accessor now that the advance
        // has released the lock
        let t = self.clock.lock().pos;
        let t_next = t + self.period.as_secs_f64();

        let scene = self.scene.read();
        for ix in scene.list_by_class("control") {
            self.dispatch(&scene, ix, t);
        }
        for ix in scene.list_by_class("bumper") {
            if scene.arena().bumper_collision(ix, t, t_next) {
                self.dispatch(&scene, ix, t);
            }
        }
    }

    fn dispatch(&self, scene: &Scene, ix: EntityIx, t: f64) {
        let Some(emitter) = scene.arena().emitter(ix) else {
            return;
        };
        match scene.arena().emitter_message(emitter, t) {
            Ok((path, data)) => self.sink.send(&path, &data),
            Err(e) => tracing::warn!("dispatch for {} skipped: {}", scene.entity(ix).id, e),
        }
    }
}
