//! Background job lifecycle for service mode.
//!
//! Submission is synchronous and cheap: the job is recorded as `Queued`
//! and its id returned immediately; a worker pool drains the queue and
//! runs one full pipeline per job. Job records follow single-writer
//! discipline — only the owning worker mutates a job while it is
//! `Processing`, and status queries clone a snapshot — so no state beyond
//! the short table lock is ever shared mutably.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use uuid::Uuid;

use crate::error::PosterError;
use crate::pipeline::{PosterArtifact, PosterPipeline, PosterRequest, ProgressSink};
use crate::prelude::HashMap;

pub type JobId = Uuid;

/// Lifecycle states. `Completed` and `Failed` are terminal: a finished
/// job never mutates again, a new request makes a new job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One unit of asynchronous work and its observable outcome.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub request: PosterRequest,
    pub state: JobState,
    /// Monotonically non-decreasing while processing.
    pub progress: u8,
    pub message: String,
    /// Set exactly when `state == Completed`.
    pub artifact: Option<PathBuf>,
    /// Stable error classification, set exactly when `state == Failed`.
    pub error_kind: Option<&'static str>,
    /// Human-readable error description, never a raw panic payload.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    fn queued(request: PosterRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            state: JobState::Queued,
            progress: 0,
            message: "Job queued for processing".into(),
            artifact: None,
            error_kind: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// What a worker executes per job. [`PosterPipeline`] is the production
/// runner; tests substitute fakes.
pub trait JobRunner: Send + Sync {
    fn run(
        &self,
        request: &PosterRequest,
        sink: &dyn ProgressSink,
    ) -> Result<PosterArtifact, PosterError>;
}

impl JobRunner for PosterPipeline {
    fn run(
        &self,
        request: &PosterRequest,
        sink: &dyn ProgressSink,
    ) -> Result<PosterArtifact, PosterError> {
        self.generate_with_progress(request, sink)
    }
}

/// Configuration for the job manager's worker pool.
#[derive(Debug, Clone)]
pub struct JobManagerConfig {
    /// Number of worker threads; each runs one job end-to-end at a time.
    pub workers: usize,
}

impl Default for JobManagerConfig {
    fn default() -> Self {
        Self { workers: 2 }
    }
}

type JobTable = Arc<Mutex<HashMap<JobId, Job>>>;

/// Progress sink owned by one worker for one job: forwards pipeline
/// percentages into the job table, keeping them monotone and never
/// touching a terminal record.
struct JobProgress {
    jobs: JobTable,
    id: JobId,
}

impl ProgressSink for JobProgress {
    fn report(&self, percent: u8, message: &str) {
        if let Ok(mut jobs) = self.jobs.lock() {
            if let Some(job) = jobs.get_mut(&self.id) {
                if job.state == JobState::Processing && percent >= job.progress {
                    job.progress = percent;
                    job.message = message.to_string();
                }
            }
        }
    }
}

/// Queues poster jobs onto a fixed worker pool and answers status
/// queries.
pub struct JobManager {
    jobs: JobTable,
    queue_tx: Sender<JobId>,
    _workers: Vec<thread::JoinHandle<()>>,
}

impl JobManager {
    pub fn new(runner: Arc<dyn JobRunner>, config: JobManagerConfig) -> Self {
        let jobs: JobTable = Arc::new(Mutex::new(HashMap::default()));
        let (queue_tx, queue_rx) = unbounded::<JobId>();

        let workers = (0..config.workers.max(1))
            .map(|i| {
                let jobs = Arc::clone(&jobs);
                let queue_rx: Receiver<JobId> = queue_rx.clone();
                let runner = Arc::clone(&runner);
                thread::Builder::new()
                    .name(format!("poster-worker-{i}"))
                    .spawn(move || worker_loop(&jobs, &queue_rx, runner.as_ref()))
                    .expect("failed to spawn job worker")
            })
            .collect();

        Self {
            jobs,
            queue_tx,
            _workers: workers,
        }
    }

    /// Records the job as `Queued` and returns its initial snapshot
    /// immediately; all pipeline work happens on a worker thread.
    pub fn submit(&self, request: PosterRequest) -> Job {
        let job = Job::queued(request);
        let snapshot = job.clone();
        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.insert(job.id, job);
        }
        // Send can only fail if all workers are gone, which only happens
        // during teardown; the record then simply stays queued.
        let _ = self.queue_tx.send(snapshot.id);
        log::info!("job {} queued", snapshot.id);
        snapshot
    }

    /// Snapshot of a job by id. `None` is the caller's "unknown id"
    /// client error, not a pipeline failure.
    pub fn status(&self, id: &JobId) -> Option<Job> {
        self.jobs.lock().ok()?.get(id).cloned()
    }

    /// Number of jobs in any state (service diagnostics).
    pub fn job_count(&self) -> usize {
        self.jobs.lock().map(|j| j.len()).unwrap_or(0)
    }
}

fn worker_loop(jobs: &JobTable, queue_rx: &Receiver<JobId>, runner: &dyn JobRunner) {
    while let Ok(id) = queue_rx.recv() {
        // Claim: Queued -> Processing, snapshot the request.
        let request = {
            let Ok(mut table) = jobs.lock() else { return };
            let Some(job) = table.get_mut(&id) else {
                continue;
            };
            job.state = JobState::Processing;
            job.message = "Processing".into();
            job.request.clone()
        };

        log::info!("job {id} processing");
        let sink = JobProgress {
            jobs: Arc::clone(jobs),
            id,
        };
        let outcome = runner.run(&request, &sink);

        let Ok(mut table) = jobs.lock() else { return };
        let Some(job) = table.get_mut(&id) else {
            continue;
        };
        match outcome {
            Ok(artifact) => {
                job.state = JobState::Completed;
                job.progress = 100;
                job.message = "Completed".into();
                job.artifact = Some(artifact.path);
                log::info!("job {id} completed");
            }
            Err(e) => {
                job.state = JobState::Failed;
                job.error_kind = Some(e.kind());
                job.error = Some(e.to_string());
                job.message = "Failed".into();
                log::warn!("job {id} failed: {e}");
            }
        }
        job.completed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::PlaceQuery;
    use crate::error::ThemeError;
    use std::time::{Duration, Instant};

    fn request() -> PosterRequest {
        PosterRequest::new(PlaceQuery::new("Venice", "Italy").unwrap(), "noir")
    }

    /// Runner scripted to succeed or fail after reporting staged progress.
    struct ScriptedRunner {
        fail: bool,
        delay: Duration,
    }

    impl JobRunner for ScriptedRunner {
        fn run(
            &self,
            _request: &PosterRequest,
            sink: &dyn ProgressSink,
        ) -> Result<PosterArtifact, PosterError> {
            for percent in [5u8, 20, 40, 70, 95] {
                sink.report(percent, "working");
                std::thread::sleep(self.delay);
            }
            if self.fail {
                return Err(ThemeError::NotFound("noir".into()).into());
            }
            Ok(PosterArtifact {
                path: PathBuf::from("posters/venice_noir_20260830_120000000.png"),
                location: crate::core::query::ResolvedLocation {
                    coordinate: crate::core::geo::LatLng::new(45.4408, 12.3155),
                    display_city: "Venice".into(),
                    display_country: "Italy".into(),
                },
                theme: "noir".into(),
            })
        }
    }

    fn wait_terminal(manager: &JobManager, id: &JobId) -> Job {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let job = manager.status(id).expect("job must stay queryable");
            if job.state.is_terminal() {
                return job;
            }
            assert!(Instant::now() < deadline, "job never finished");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_submit_returns_queued_immediately() {
        let manager = JobManager::new(
            Arc::new(ScriptedRunner {
                fail: false,
                delay: Duration::from_millis(10),
            }),
            JobManagerConfig::default(),
        );
        let job = manager.submit(request());
        assert_eq!(job.state, JobState::Queued);
        assert_eq!(job.progress, 0);
        assert!(job.artifact.is_none());
    }

    #[test]
    fn test_successful_job_completes_with_artifact() {
        let manager = JobManager::new(
            Arc::new(ScriptedRunner {
                fail: false,
                delay: Duration::ZERO,
            }),
            JobManagerConfig::default(),
        );
        let id = manager.submit(request()).id;
        let job = wait_terminal(&manager, &id);
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.artifact.is_some());
        assert!(job.error.is_none());
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn test_failed_job_carries_error_classification() {
        let manager = JobManager::new(
            Arc::new(ScriptedRunner {
                fail: true,
                delay: Duration::ZERO,
            }),
            JobManagerConfig::default(),
        );
        let id = manager.submit(request()).id;
        let job = wait_terminal(&manager, &id);
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(job.error_kind, Some("theme_not_found"));
        assert!(job.error.unwrap().contains("noir"));
        assert!(job.artifact.is_none());
    }

    #[test]
    fn test_progress_is_monotone_and_state_never_reverts() {
        let manager = JobManager::new(
            Arc::new(ScriptedRunner {
                fail: false,
                delay: Duration::from_millis(5),
            }),
            JobManagerConfig { workers: 1 },
        );
        let id = manager.submit(request()).id;

        let mut last_progress = 0u8;
        let mut saw_processing = false;
        loop {
            let job = manager.status(&id).unwrap();
            assert!(
                job.progress >= last_progress,
                "progress went backwards: {} -> {}",
                last_progress,
                job.progress
            );
            last_progress = job.progress;
            if job.state == JobState::Processing {
                saw_processing = true;
            }
            if job.state.is_terminal() {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(saw_processing);

        // Terminal state is final.
        std::thread::sleep(Duration::from_millis(20));
        let job = manager.status(&id).unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn test_unknown_id_is_none() {
        let manager = JobManager::new(
            Arc::new(ScriptedRunner {
                fail: false,
                delay: Duration::ZERO,
            }),
            JobManagerConfig::default(),
        );
        assert!(manager.status(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_concurrent_jobs_all_finish() {
        let manager = JobManager::new(
            Arc::new(ScriptedRunner {
                fail: false,
                delay: Duration::from_millis(1),
            }),
            JobManagerConfig { workers: 4 },
        );
        let ids: Vec<JobId> = (0..8).map(|_| manager.submit(request()).id).collect();
        for id in &ids {
            assert_eq!(wait_terminal(&manager, id).state, JobState::Completed);
        }
        assert_eq!(manager.job_count(), 8);
    }
}
