//! Cooperative scene building.
//!
//! The decode phase is always synchronous; only assembly can be paced. An
//! in-progress [`SceneBuild`] is driven by the caller one mesh at a time
//! (or in wall-clock slices), which decouples the core from any specific
//! scheduler: a synchronous caller simply loops until no units remain, and
//! both modes produce the identical graph.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use super::assembler::SceneAssembler;
use super::Scene;
use crate::archive::ModelArchive;
use crate::decode;
use crate::model::Model;
use crate::util::{Error, Result};

/// Build phase reported through [`BuildObserver::progress`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildPhase {
    Decode,
    Assemble,
}

/// Progress and result callbacks for one build request.
pub trait BuildObserver {
    fn progress(&mut self, _phase: BuildPhase, _label: &str, _fraction: f32) {}
    fn completed(&mut self, scene: Scene);
    fn failed(&mut self, error: Error);
}

/// Default wall-clock slice for one incremental pump.
pub const DEFAULT_STEP_BUDGET: Duration = Duration::from_millis(10);

/// Decode and build a whole scene in one call.
pub fn build_scene(
    data: &[u8],
    entry_name: &str,
    archive: Option<&dyn ModelArchive>,
) -> Result<Scene> {
    let model = decode::decode(data, entry_name, archive)?;
    Ok(SceneBuild::new(model).finish())
}

/// An in-progress scene build, driven by the caller.
pub struct SceneBuild {
    assembler: SceneAssembler,
}

impl SceneBuild {
    pub fn new(model: Model) -> Self {
        Self { assembler: SceneAssembler::new(model) }
    }

    /// Build the next mesh, in decode order. Returns true while more
    /// meshes remain.
    pub fn step(&mut self) -> bool {
        self.assembler.build_next_mesh();
        !self.assembler.is_complete()
    }

    /// Pump steps until `budget` elapses or the build completes. Returns
    /// true while more meshes remain. Suspension only ever happens here,
    /// between whole meshes.
    pub fn step_for(&mut self, budget: Duration) -> bool {
        let start = Instant::now();
        while !self.assembler.is_complete() {
            self.assembler.build_next_mesh();
            if start.elapsed() >= budget {
                break;
            }
        }
        !self.assembler.is_complete()
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.assembler.is_complete()
    }

    /// Number of meshes already built.
    #[inline]
    pub fn built(&self) -> usize {
        self.assembler.built()
    }

    /// Total number of meshes.
    #[inline]
    pub fn total(&self) -> usize {
        self.assembler.total()
    }

    /// Build any remaining meshes synchronously and return the scene.
    pub fn finish(mut self) -> Scene {
        while self.step() {}
        self.assembler.into_scene()
    }
}

/// One decode/build request queued on a [`ModelBuilder`].
pub struct BuildRequest {
    pub entry_name: String,
    pub data: Vec<u8>,
    pub observer: Box<dyn BuildObserver + Send>,
    /// Pace assembly in wall-clock slices instead of building the whole
    /// scene in one go.
    pub incremental: bool,
}

/// Shared builder serializing independent requests through a FIFO queue.
///
/// Requests are processed one at a time so at most one decoded-but-unbuilt
/// model is held in memory. Queued requests can be cancelled in bulk; a
/// request already in its decode or build phase cannot.
pub struct ModelBuilder<A> {
    archive: A,
    queue: Mutex<VecDeque<BuildRequest>>,
    step_budget: Duration,
}

impl<A: ModelArchive> ModelBuilder<A> {
    pub fn new(archive: A) -> Self {
        Self {
            archive,
            queue: Mutex::new(VecDeque::new()),
            step_budget: DEFAULT_STEP_BUDGET,
        }
    }

    /// Override the incremental pump budget.
    pub fn with_step_budget(mut self, budget: Duration) -> Self {
        self.step_budget = budget;
        self
    }

    /// Append a request to the queue.
    pub fn enqueue(&self, request: BuildRequest) {
        self.queue.lock().push_back(request);
    }

    /// Number of queued-but-not-started requests.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Drop all queued-but-not-started requests, returning how many were
    /// discarded.
    pub fn cancel_pending(&self) -> usize {
        let mut queue = self.queue.lock();
        let cancelled = queue.len();
        queue.clear();
        cancelled
    }

    /// Decode and build the oldest queued request. Returns false when the
    /// queue was empty. The queue lock is not held across decode or build.
    pub fn process_next(&self) -> bool {
        let Some(mut request) = self.queue.lock().pop_front() else {
            return false;
        };
        debug!(entry = %request.entry_name, "processing build request");

        request.observer.progress(BuildPhase::Decode, &request.entry_name, 0.0);
        let model = match decode::decode(
            &request.data,
            &request.entry_name,
            Some(&self.archive as &dyn ModelArchive),
        ) {
            Ok(model) => model,
            Err(error) => {
                request.observer.failed(error);
                return true;
            }
        };

        let total = model.meshes.len().max(1);
        let mut build = SceneBuild::new(model);
        if request.incremental {
            while build.step_for(self.step_budget) {
                request.observer.progress(
                    BuildPhase::Assemble,
                    &request.entry_name,
                    build.built() as f32 / total as f32,
                );
            }
        }
        request.observer.progress(BuildPhase::Assemble, &request.entry_name, 1.0);
        request.observer.completed(build.finish());
        true
    }

    /// Process requests until the queue is empty.
    pub fn process_all(&self) {
        while self.process_next() {}
    }
}
