/// Job list state container
///
/// Every image selected by the user becomes an `ImageJob` that moves
/// through Pending → Processing → Completed/Error. All transitions go
/// through `JobList` so the rules live in one place:
/// - at most one job is Processing at any time,
/// - a Completed job never changes again (batch re-runs skip it),
/// - per-job progress never goes backwards,
/// - jobs cannot be removed while a run is in flight.

use chrono::{DateTime, Utc};
use iced::widget::image::Handle;
use std::path::PathBuf;
use std::sync::Arc;

/// Session-unique identifier for a job.
///
/// Jobs are always addressed by id, never by position, so a snapshot
/// taken at the start of a batch run can never alias a different job
/// after the list changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

/// Where a job currently sits in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    /// Short label for the UI
    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Processing => "Processing",
            JobStatus::Completed => "Done",
            JobStatus::Error => "Failed",
        }
    }
}

/// Result of a successful background removal for one image.
///
/// Keeps both the raw bytes (for the zip export) and a display handle
/// (for the preview grid). The bytes are shared, not copied, when the
/// job list is cloned into the view.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedImage {
    pub bytes: Arc<Vec<u8>>,
    pub handle: Handle,
}

impl ProcessedImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        let handle = Handle::from_bytes(bytes.clone());
        Self {
            bytes: Arc::new(bytes),
            handle,
        }
    }
}

/// One image file and its processing state
#[derive(Debug, Clone, PartialEq)]
pub struct ImageJob {
    pub id: JobId,
    /// Filename only (e.g., "IMG_0001.jpg")
    pub filename: String,
    /// Full path to the source file
    pub path: PathBuf,
    /// Thumbnail of the original, generated at intake
    pub preview: Handle,
    pub status: JobStatus,
    /// Percentage through the removal operation (0-100)
    pub progress: u8,
    /// Present only after successful completion
    pub output: Option<ProcessedImage>,
    /// Failure detail, present only in Error status
    pub error: Option<String>,
    /// When the job was added to the list
    pub added_at: DateTime<Utc>,
}

/// A state transition the job list refused
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("no job with that id")]
    UnknownJob,
    #[error("another image is already being processed")]
    AlreadyProcessing,
    #[error("job is {0:?} and cannot start processing")]
    NotStartable(JobStatus),
    #[error("job is not being processed")]
    NotProcessing,
    #[error("cannot remove an image while a batch run is in flight")]
    RemoveWhileRunning,
}

/// Ordered collection of jobs, insertion order preserved.
///
/// Re-selecting the same file twice produces two independent jobs;
/// nothing is deduplicated.
#[derive(Debug, Default)]
pub struct JobList {
    jobs: Vec<ImageJob>,
    next_id: u64,
}

impl JobList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageJob> {
        self.jobs.iter()
    }

    pub fn get(&self, id: JobId) -> Option<&ImageJob> {
        self.jobs.iter().find(|job| job.id == id)
    }

    fn get_mut(&mut self, id: JobId) -> Option<&mut ImageJob> {
        self.jobs.iter_mut().find(|job| job.id == id)
    }

    /// Id of the job currently being processed, if any
    pub fn processing_id(&self) -> Option<JobId> {
        self.jobs
            .iter()
            .find(|job| job.status == JobStatus::Processing)
            .map(|job| job.id)
    }

    /// True while a job is mid-removal
    pub fn is_busy(&self) -> bool {
        self.processing_id().is_some()
    }

    /// Number of jobs holding a processed output
    pub fn completed_count(&self) -> usize {
        self.jobs.iter().filter(|job| job.output.is_some()).count()
    }

    /// Append a freshly scanned image as a pending job
    pub fn append(&mut self, filename: String, path: PathBuf, preview: Handle) -> JobId {
        let id = JobId(self.next_id);
        self.next_id += 1;

        self.jobs.push(ImageJob {
            id,
            filename,
            path,
            preview,
            status: JobStatus::Pending,
            progress: 0,
            output: None,
            error: None,
            added_at: Utc::now(),
        });

        id
    }

    /// Remove a job, dropping its preview and output handles with it.
    ///
    /// Refused while any job is Processing: an in-flight run holds a
    /// snapshot of the list and removal mid-run is not supported.
    pub fn remove(&mut self, id: JobId) -> Result<ImageJob, TransitionError> {
        if self.is_busy() {
            return Err(TransitionError::RemoveWhileRunning);
        }

        let index = self
            .jobs
            .iter()
            .position(|job| job.id == id)
            .ok_or(TransitionError::UnknownJob)?;

        Ok(self.jobs.remove(index))
    }

    /// Move a job into Processing.
    ///
    /// Only one job may be Processing at a time; the list rejects a
    /// second concurrent start rather than trusting the caller's loop.
    /// Pending jobs and previously failed jobs may start; a Completed
    /// job may not (re-runs skip it).
    pub fn start(&mut self, id: JobId) -> Result<(), TransitionError> {
        if self.is_busy() {
            return Err(TransitionError::AlreadyProcessing);
        }

        let job = self.get_mut(id).ok_or(TransitionError::UnknownJob)?;
        match job.status {
            JobStatus::Pending | JobStatus::Error => {
                job.status = JobStatus::Processing;
                job.progress = 0;
                job.error = None;
                Ok(())
            }
            other => Err(TransitionError::NotStartable(other)),
        }
    }

    /// Update the in-flight job's progress percentage.
    ///
    /// Progress is monotonic for the lifetime of the attempt; an update
    /// below the current value is clamped, not applied.
    pub fn set_progress(&mut self, id: JobId, percent: u8) -> Result<(), TransitionError> {
        let job = self.get_mut(id).ok_or(TransitionError::UnknownJob)?;
        if job.status != JobStatus::Processing {
            return Err(TransitionError::NotProcessing);
        }

        job.progress = job.progress.max(percent.min(100));
        Ok(())
    }

    /// Finish the in-flight job successfully
    pub fn complete(&mut self, id: JobId, output: ProcessedImage) -> Result<(), TransitionError> {
        let job = self.get_mut(id).ok_or(TransitionError::UnknownJob)?;
        if job.status != JobStatus::Processing {
            return Err(TransitionError::NotProcessing);
        }

        job.status = JobStatus::Completed;
        job.progress = 100;
        job.output = Some(output);
        job.error = None;
        Ok(())
    }

    /// Finish the in-flight job with an error. The batch moves on to
    /// the next image; the job stays in Error until a later run
    /// retries it.
    pub fn fail(&mut self, id: JobId, message: String) -> Result<(), TransitionError> {
        let job = self.get_mut(id).ok_or(TransitionError::UnknownJob)?;
        if job.status != JobStatus::Processing {
            return Err(TransitionError::NotProcessing);
        }

        job.status = JobStatus::Error;
        job.output = None;
        job.error = Some(message);
        Ok(())
    }

    /// Overall batch progress, 0-100.
    ///
    /// Settled jobs (Completed or Error) count as whole units and the
    /// in-flight job contributes its fraction, so a run that ends with
    /// failures still lands on 100.
    pub fn total_progress(&self) -> f32 {
        if self.jobs.is_empty() {
            return 0.0;
        }

        let settled = self
            .jobs
            .iter()
            .filter(|job| matches!(job.status, JobStatus::Completed | JobStatus::Error))
            .count() as f32;

        let in_flight = self
            .jobs
            .iter()
            .find(|job| job.status == JobStatus::Processing)
            .map(|job| f32::from(job.progress) / 100.0)
            .unwrap_or(0.0);

        (settled + in_flight) / self.jobs.len() as f32 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_preview() -> Handle {
        Handle::from_rgba(1, 1, vec![0u8; 4])
    }

    fn add_job(list: &mut JobList, name: &str) -> JobId {
        list.append(
            name.to_string(),
            PathBuf::from(format!("/photos/{}", name)),
            blank_preview(),
        )
    }

    #[test]
    fn test_append_creates_pending_jobs() {
        let mut list = JobList::new();
        let a = add_job(&mut list, "a.jpg");
        let b = add_job(&mut list, "b.png");

        assert_eq!(list.len(), 2);
        assert_ne!(a, b);

        for job in list.iter() {
            assert_eq!(job.status, JobStatus::Pending);
            assert_eq!(job.progress, 0);
            assert!(job.output.is_none());
            assert!(job.error.is_none());
        }
    }

    #[test]
    fn test_duplicate_files_are_independent_jobs() {
        let mut list = JobList::new();
        let first = add_job(&mut list, "same.jpg");
        let second = add_job(&mut list, "same.jpg");

        assert_ne!(first, second);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_only_one_job_processes_at_a_time() {
        let mut list = JobList::new();
        let a = add_job(&mut list, "a.jpg");
        let b = add_job(&mut list, "b.jpg");

        list.start(a).unwrap();
        assert_eq!(list.start(b), Err(TransitionError::AlreadyProcessing));
        assert_eq!(list.processing_id(), Some(a));
    }

    #[test]
    fn test_completed_jobs_cannot_restart() {
        let mut list = JobList::new();
        let a = add_job(&mut list, "a.jpg");

        list.start(a).unwrap();
        list.complete(a, ProcessedImage::new(vec![1, 2, 3])).unwrap();

        assert_eq!(
            list.start(a),
            Err(TransitionError::NotStartable(JobStatus::Completed))
        );
        // The stored output is untouched by the refused restart
        let job = list.get(a).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.output.as_ref().unwrap().bytes.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_failed_jobs_may_retry_on_a_later_run() {
        let mut list = JobList::new();
        let a = add_job(&mut list, "a.jpg");

        list.start(a).unwrap();
        list.set_progress(a, 40).unwrap();
        list.fail(a, "service unavailable".to_string()).unwrap();

        let job = list.get(a).unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error.as_deref(), Some("service unavailable"));

        // A new run picks the job up again from zero
        list.start(a).unwrap();
        let job = list.get(a).unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 0);
        assert!(job.error.is_none());
    }

    #[test]
    fn test_progress_is_monotonic_and_capped() {
        let mut list = JobList::new();
        let a = add_job(&mut list, "a.jpg");

        list.start(a).unwrap();
        list.set_progress(a, 60).unwrap();
        list.set_progress(a, 30).unwrap();
        assert_eq!(list.get(a).unwrap().progress, 60);

        list.set_progress(a, 255).unwrap();
        assert_eq!(list.get(a).unwrap().progress, 100);
    }

    #[test]
    fn test_progress_requires_processing_status() {
        let mut list = JobList::new();
        let a = add_job(&mut list, "a.jpg");

        assert_eq!(
            list.set_progress(a, 10),
            Err(TransitionError::NotProcessing)
        );
    }

    #[test]
    fn test_terminal_transitions_happen_once() {
        let mut list = JobList::new();
        let a = add_job(&mut list, "a.jpg");

        list.start(a).unwrap();
        list.complete(a, ProcessedImage::new(vec![9])).unwrap();

        assert_eq!(
            list.complete(a, ProcessedImage::new(vec![7])),
            Err(TransitionError::NotProcessing)
        );
        assert_eq!(
            list.fail(a, "late".to_string()),
            Err(TransitionError::NotProcessing)
        );
    }

    #[test]
    fn test_remove_refused_mid_run() {
        let mut list = JobList::new();
        let a = add_job(&mut list, "a.jpg");
        let b = add_job(&mut list, "b.jpg");

        list.start(a).unwrap();
        assert_eq!(list.remove(b), Err(TransitionError::RemoveWhileRunning));

        list.fail(a, "boom".to_string()).unwrap();
        assert!(list.remove(b).is_ok());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove_preserves_order_and_ids() {
        let mut list = JobList::new();
        let a = add_job(&mut list, "a.jpg");
        let b = add_job(&mut list, "b.jpg");
        let c = add_job(&mut list, "c.jpg");

        let removed = list.remove(b).unwrap();
        assert_eq!(removed.filename, "b.jpg");

        let remaining: Vec<JobId> = list.iter().map(|job| job.id).collect();
        assert_eq!(remaining, vec![a, c]);
        assert!(list.get(b).is_none());
    }

    #[test]
    fn test_total_progress_combines_settled_and_in_flight() {
        let mut list = JobList::new();
        assert_eq!(list.total_progress(), 0.0);

        let a = add_job(&mut list, "a.jpg");
        let b = add_job(&mut list, "b.jpg");
        let c = add_job(&mut list, "c.jpg");
        assert_eq!(list.total_progress(), 0.0);

        list.start(a).unwrap();
        list.complete(a, ProcessedImage::new(vec![1])).unwrap();
        list.start(b).unwrap();
        list.set_progress(b, 50).unwrap();

        assert!((list.total_progress() - 50.0).abs() < 0.01);

        // A failed job still settles the run at 100
        list.fail(b, "boom".to_string()).unwrap();
        list.start(c).unwrap();
        list.complete(c, ProcessedImage::new(vec![2])).unwrap();

        assert!((list.total_progress() - 100.0).abs() < 0.01);
    }
}
