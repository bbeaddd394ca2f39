//! Single-writer sharing and a background stepping thread for interactive front ends.
//!
//! The field itself lives behind a [`parking_lot::RwLock`]: stepping, impulses
//! and parameter changes take the write lock, renderers and scorers take read
//! guards. Input collaborators never touch the field directly; they post wells,
//! path samples and impulses to the driver, which applies them on its next tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::field::ParticleField;
use crate::forces::{GravityWell, PathPoint};
use crate::impulse::Impulse;

/// Longest frame gap, in nominal frames, handed to `advance` after a stall.
pub const MAX_FRAME_DT: f32 = 3.0;

#[derive(Clone)]
pub struct SharedField {
    inner: Arc<RwLock<ParticleField>>,
}

impl SharedField {
    pub fn new(field: ParticleField) -> Self {
        Self {
            inner: Arc::new(RwLock::new(field)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ParticleField> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ParticleField> {
        self.inner.write()
    }
}

/// Recently drawn path samples, oldest first. Samples are dropped once they
/// are older than the fade duration.
#[derive(Debug, Clone, Default)]
pub struct PathTrail {
    points: Vec<PathPoint>,
}

impl PathTrail {
    pub fn push(&mut self, point: PathPoint) {
        self.points.push(point);
    }

    pub fn prune(&mut self, now: f64, fade: f64) {
        self.points.retain(|p| now - p.timestamp <= fade);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Default)]
struct DriverInput {
    wells: Vec<GravityWell>,
    trail: PathTrail,
    impulses: Vec<(Impulse, f32, f32, f32)>,
    paused: bool,
}

struct DriverState {
    field: SharedField,
    input: Mutex<DriverInput>,
    epoch: Instant,
}

impl DriverState {
    fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    /// Apply queued impulses, then advance unless paused (or `force`d).
    fn step(&self, dt: f32, now: f64, force: bool) {
        let (wells, path, impulses, paused) = {
            let mut input = self.input.lock();
            let fade = self.field.read().config().path_fade;
            input.trail.prune(now, fade);
            (
                input.wells.clone(),
                input.trail.points().to_vec(),
                std::mem::take(&mut input.impulses),
                input.paused,
            )
        };

        let mut field = self.field.write();
        for (impulse, x, y, strength) in impulses {
            field.apply_impulse(impulse, x, y, strength);
        }
        if force || !paused {
            field.advance(&wells, &path, dt, now);
        }
    }
}

/// Owns the input side of a [`SharedField`] and optionally steps it on a
/// background thread at a fixed rate.
pub struct FieldDriver {
    state: Arc<DriverState>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl FieldDriver {
    /// A driver that only steps when [`FieldDriver::tick`] is called.
    pub fn new(field: ParticleField) -> Self {
        Self {
            state: Arc::new(DriverState {
                field: SharedField::new(field),
                input: Mutex::new(DriverInput::default()),
                epoch: Instant::now(),
            }),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Start stepping on a background thread, `rate_hz` steps per second.
    ///
    /// `dt` is measured in nominal frames, so a late step advances further,
    /// capped at [`MAX_FRAME_DT`].
    pub fn spawn(field: ParticleField, rate_hz: f32) -> Self {
        let mut driver = Self::new(field);
        let frame = Duration::from_secs_f32(1.0 / rate_hz.max(1.0));
        let state = Arc::clone(&driver.state);
        let running = Arc::clone(&driver.running);
        running.store(true, Ordering::Release);

        driver.worker = Some(thread::spawn(move || {
            let mut last = Instant::now();
            while running.load(Ordering::Acquire) {
                let elapsed = last.elapsed();
                if elapsed < frame {
                    thread::sleep(frame - elapsed);
                    continue;
                }
                last = Instant::now();
                let dt = (elapsed.as_secs_f32() / frame.as_secs_f32()).min(MAX_FRAME_DT);
                state.step(dt, state.now_ms(), false);
            }
        }));
        debug!("field driver started at {rate_hz} Hz");
        driver
    }

    pub fn field(&self) -> &SharedField {
        &self.state.field
    }

    /// Milliseconds since the driver was created; the clock used for path samples.
    pub fn now_ms(&self) -> f64 {
        self.state.now_ms()
    }

    pub fn set_wells(&self, wells: &[GravityWell]) {
        let mut input = self.state.input.lock();
        input.wells.clear();
        input.wells.extend_from_slice(wells);
    }

    /// Record a path sample stamped with the driver clock.
    pub fn push_path_point(&self, x: f32, y: f32) {
        let now = self.now_ms();
        self.push_path_point_at(PathPoint::new(x, y, now));
    }

    pub fn push_path_point_at(&self, point: PathPoint) {
        self.state.input.lock().trail.push(point);
    }

    pub fn clear_path(&self) {
        self.state.input.lock().trail.clear();
    }

    pub fn path(&self) -> Vec<PathPoint> {
        self.state.input.lock().trail.points().to_vec()
    }

    pub fn queue_explosion(&self, x: f32, y: f32, strength: f32) {
        self.queue_impulse(Impulse::Explosion, x, y, strength);
    }

    pub fn queue_implosion(&self, x: f32, y: f32, strength: f32) {
        self.queue_impulse(Impulse::Implosion, x, y, strength);
    }

    pub fn queue_impulse(&self, impulse: Impulse, x: f32, y: f32, strength: f32) {
        self.state.input.lock().impulses.push((impulse, x, y, strength));
    }

    pub fn set_paused(&self, paused: bool) {
        self.state.input.lock().paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.state.input.lock().paused
    }

    /// Step once now with `dt = 1.0`, honouring the pause flag.
    pub fn tick(&self) {
        self.state.step(1.0, self.now_ms(), false);
    }

    /// Step once at an explicit time, even while paused.
    pub fn tick_at(&self, dt: f32, now: f64) {
        self.state.step(dt, now, true);
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("field driver thread panicked");
            }
            debug!("field driver stopped");
        }
    }
}

impl Drop for FieldDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
