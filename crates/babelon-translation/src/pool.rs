//! Bounded translation worker pool
//!
//! The translation model is blocking and potentially slow, and it is never
//! assumed safe for unbounded concurrent invocation. This pool runs a fixed
//! number of dedicated worker threads (independent of connection count)
//! draining one shared job queue; connection tasks submit a job and await a
//! oneshot reply without ever blocking the runtime.

use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use babelon_common::{BabelonError, Result};
use babelon_core::traits::TranslationBackend;

/// Default number of worker threads; the translation backend is assumed to
/// be the throughput bottleneck, not the registry.
pub const DEFAULT_WORKERS: usize = 4;

struct Job {
    text: String,
    source_lang: String,
    target_lang: String,
    reply: oneshot::Sender<Result<String>>,
}

/// Fixed-size pool of translation worker threads.
pub struct WorkerPool {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    workers: usize,
}

impl WorkerPool {
    /// Spawn `workers` threads serving `backend`. A worker count of zero is
    /// clamped to one.
    pub fn new(workers: usize, backend: Arc<dyn TranslationBackend>) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let receiver = Arc::clone(&receiver);
            let backend = Arc::clone(&backend);
            let handle = thread::Builder::new()
                .name(format!("translation-worker-{index}"))
                .spawn(move || worker_loop(index, receiver, backend));
            match handle {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!("❌ Failed to spawn translation worker {index}: {e}"),
            }
        }
        debug!("🔧 Translation worker pool started with {workers} worker(s)");

        Self {
            sender: Mutex::new(Some(sender)),
            handles: Mutex::new(handles),
            workers,
        }
    }

    /// Configured worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Queue one translation and await its result.
    ///
    /// Fails with [`BabelonError::PoolClosed`] once the pool is shut down;
    /// a backend failure is returned as [`BabelonError::Translation`].
    pub async fn submit(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let (reply, receiver) = oneshot::channel();
        let job = Job {
            text: text.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            reply,
        };

        let sender = {
            let guard = self
                .sender
                .lock()
                .map_err(|_| BabelonError::Internal("worker queue lock poisoned".to_string()))?;
            guard.as_ref().ok_or(BabelonError::PoolClosed)?.clone()
        };
        sender.send(job).map_err(|_| BabelonError::PoolClosed)?;

        receiver.await.map_err(|_| BabelonError::PoolClosed)?
    }

    /// Drop the job queue and join every worker. In-flight jobs run to
    /// completion; later `submit` calls fail with `PoolClosed`.
    pub fn shutdown(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        if let Ok(mut handles) = self.handles.lock() {
            for handle in handles.drain(..) {
                let _ = handle.join();
            }
        }
        debug!("🛑 Translation worker pool shut down");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Close the queue so worker threads exit instead of idling forever.
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
    }
}

fn worker_loop(
    index: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    backend: Arc<dyn TranslationBackend>,
) {
    loop {
        // Hold the queue lock only while dequeuing, not while translating.
        let job = {
            let Ok(receiver) = receiver.lock() else {
                break;
            };
            receiver.recv()
        };
        let Ok(job) = job else {
            trace!("translation worker {index} exiting");
            break;
        };

        let result = backend.translate(&job.text, &job.source_lang, &job.target_lang);
        // The requester may have disconnected; the result is still computed
        // so its cache write can land.
        let _ = job.reply.send(result);
    }
}
