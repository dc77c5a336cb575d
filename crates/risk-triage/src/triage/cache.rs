use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::classifier::TrainedModel;

/// Progress of one detached training run, broadcast to every caller waiting on it.
#[derive(Clone, Debug)]
enum RunState {
    Training,
    Finished(Option<Arc<TrainedModel>>),
}

impl RunState {
    fn is_finished(&self) -> bool {
        matches!(self, RunState::Finished(_))
    }
}

#[derive(Debug)]
struct InFlight {
    run: u64,
    state: watch::Receiver<RunState>,
}

#[derive(Debug, Default)]
struct Slot {
    model: Option<Arc<TrainedModel>>,
    published_run: u64,
    in_flight: Option<InFlight>,
}

/// Process-scoped holder for the trained model.
///
/// Training runs as a detached task. Concurrent cache misses all await that one run, so
/// a caller that gives up early neither cancels nor repeats it, and an outcome of "not
/// enough data" is shared the same way. The published model is swapped in only once a
/// run finishes; readers never wait on training.
#[derive(Debug, Default)]
pub struct ModelCache {
    slot: Arc<Mutex<Slot>>,
    training_runs: AtomicU64,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<TrainedModel>> {
        lock(&self.slot).model.clone()
    }

    /// Drops the published model. A run already in flight still publishes when it lands.
    pub fn invalidate(&self) {
        lock(&self.slot).model.take();
    }

    /// Number of times a trainer has actually been invoked.
    pub fn training_runs(&self) -> u64 {
        self.training_runs.load(Ordering::Acquire)
    }

    /// Cached model, or the result of a single shared training run.
    pub async fn get_or_train<F, Fut>(&self, train: F) -> Option<Arc<TrainedModel>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<TrainedModel>> + Send + 'static,
    {
        let state = {
            let mut slot = lock(&self.slot);
            if let Some(model) = slot.model.as_ref() {
                return Some(model.clone());
            }
            match slot.in_flight.as_ref() {
                Some(flight) => {
                    debug!(run = flight.run, "joining in-flight training run");
                    flight.state.clone()
                }
                None => self.launch(&mut slot, train),
            }
        };
        wait(state).await
    }

    /// Trains unconditionally. The previous model stays published while the run is in
    /// flight, and survives if the new run yields none.
    pub async fn retrain<F, Fut>(&self, train: F) -> Option<Arc<TrainedModel>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<TrainedModel>> + Send + 'static,
    {
        let state = {
            let mut slot = lock(&self.slot);
            self.launch(&mut slot, train)
        };
        wait(state).await
    }

    /// Registers a new in-flight run and spawns it. Must be called with the slot locked.
    fn launch<F, Fut>(&self, slot: &mut Slot, train: F) -> watch::Receiver<RunState>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<TrainedModel>> + Send + 'static,
    {
        let run = self.training_runs.fetch_add(1, Ordering::AcqRel) + 1;
        let (sender, receiver) = watch::channel(RunState::Training);
        slot.in_flight = Some(InFlight {
            run,
            state: receiver.clone(),
        });

        let training = train();
        let shared = Arc::clone(&self.slot);
        tokio::spawn(async move {
            let trained = match tokio::spawn(training).await {
                Ok(trained) => trained.map(Arc::new),
                Err(error) => {
                    warn!(run, %error, "training task failed");
                    None
                }
            };
            let outcome = publish(&shared, run, trained);
            // Receivers may all be gone; the model is published regardless.
            let _ = sender.send(RunState::Finished(outcome));
        });
        receiver
    }
}

/// Swaps a finished run into the slot and returns the model callers should see.
fn publish(
    slot: &Mutex<Slot>,
    run: u64,
    trained: Option<Arc<TrainedModel>>,
) -> Option<Arc<TrainedModel>> {
    let mut slot = lock(slot);
    if slot.in_flight.as_ref().is_some_and(|flight| flight.run == run) {
        slot.in_flight = None;
    }
    match trained {
        Some(model) if run > slot.published_run => {
            slot.model = Some(model.clone());
            slot.published_run = run;
            Some(model)
        }
        Some(model) => {
            debug!(run, published = slot.published_run, "newer model already published");
            Some(model)
        }
        None => {
            info!(run, kept_previous = slot.model.is_some(), "training produced no model");
            slot.model.clone()
        }
    }
}

async fn wait(mut state: watch::Receiver<RunState>) -> Option<Arc<TrainedModel>> {
    let outcome = match state.wait_for(RunState::is_finished).await {
        Ok(finished) => match &*finished {
            RunState::Finished(model) => model.clone(),
            RunState::Training => None,
        },
        // The run was torn down with the runtime.
        Err(_) => None,
    };
    outcome
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
