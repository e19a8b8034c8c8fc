//! Sequential, cancellable batch processing of a file list.
//!
//! A [`BatchPipeline`] walks a list of files in order, rewriting each one
//! with a [`FileRewriter`] and reporting every step to a driver-supplied
//! callback. A failing file is recorded and skipped; it never stops the batch.
//! Cancellation is cooperative and only observed between files, so a file
//! that is being rewritten always finishes.

use crate::collector::FileCollector;
use crate::config::Config;
use crate::errors::{Error, Result};
use crate::report::{ReportFormat, ReportFormatter};
use crate::rewriter::{FileRewriter, RewriteOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// Lifecycle of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    /// No batch has run yet.
    #[default]
    Idle,
    /// A batch is in progress.
    Running,
    /// The last batch went through the whole list.
    Completed,
    /// The last batch stopped early because cancellation was requested.
    Cancelled,
}

/// A file that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Aggregate outcome of a batch.
///
/// Owned by the worker while the batch runs and handed to the driver as a
/// finished value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    /// Number of files in the input list.
    pub total_files: usize,
    /// Number of files attempted, successful or not.
    pub processed_count: usize,
    /// Number of files whose content changed.
    pub rewritten_count: usize,
    /// Failures in input order.
    pub errors: Vec<FileFailure>,
    /// `true` if the batch stopped before the end of the list.
    pub cancelled: bool,
}

impl BatchResult {
    /// `true` if every file was processed without error.
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.errors.is_empty()
    }

    /// Files left untouched because the batch was cancelled.
    pub fn skipped_count(&self) -> usize {
        self.total_files - self.processed_count
    }
}

/// Notifications delivered to the driver, in input order.
///
/// `index` is the 1-based position of the file in the input list.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// A file was processed successfully.
    Progress {
        index: usize,
        path: PathBuf,
        outcome: RewriteOutcome,
    },
    /// A file could not be read or written; the batch continues.
    Error {
        index: usize,
        path: PathBuf,
        message: String,
    },
    /// The batch stopped early. Always the last event of a cancelled batch.
    Cancelled(BatchResult),
    /// The batch went through the whole list. Always the last event otherwise.
    Done(BatchResult),
}

/// A shared, cooperative cancellation flag.
///
/// Clones share the same flag. Cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Takes effect at the next file boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs a [`FileRewriter`] over a list of files.
///
/// Clones share the same state and cancellation flag, so a clone can be used
/// to cancel or inspect a batch started from another clone.
#[derive(Debug, Clone)]
pub struct BatchPipeline {
    rewriter: FileRewriter,
    state: Arc<Mutex<BatchState>>,
    cancel: CancelToken,
}

impl BatchPipeline {
    /// Creates an idle pipeline.
    pub fn new(rewriter: FileRewriter) -> Self {
        Self {
            rewriter,
            state: Arc::new(Mutex::new(BatchState::Idle)),
            cancel: CancelToken::new(),
        }
    }

    /// The current lifecycle state.
    pub fn state(&self) -> BatchState {
        *lock(&self.state)
    }

    /// A handle on this pipeline's cancellation flag.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Requests cancellation of the running batch.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Starts a batch on a dedicated worker thread and returns immediately.
    ///
    /// `on_event` is called on the worker thread, once per file and once more
    /// with the terminal `Done` or `Cancelled` event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRunning`] if a batch is in progress; the running
    /// batch is not affected.
    pub fn start<F>(&self, files: Vec<PathBuf>, on_event: F) -> Result<BatchHandle>
    where
        F: FnMut(BatchEvent) + Send + 'static,
    {
        self.begin()?;

        let worker = self.clone();
        let spawned = thread::Builder::new()
            .name("decomment-batch".to_string())
            .spawn(move || worker.drive(&files, on_event));

        match spawned {
            Ok(handle) => Ok(BatchHandle {
                handle,
                cancel: self.cancel.clone(),
            }),
            Err(e) => {
                *lock(&self.state) = BatchState::Idle;
                Err(e.into())
            }
        }
    }

    /// Runs a batch on the calling thread and returns its result.
    ///
    /// Same semantics as [`BatchPipeline::start`], without the thread.
    pub fn run<F>(&self, files: &[PathBuf], on_event: F) -> Result<BatchResult>
    where
        F: FnMut(BatchEvent),
    {
        self.begin()?;
        Ok(self.drive(files, on_event))
    }

    fn begin(&self) -> Result<()> {
        let mut state = lock(&self.state);
        if *state == BatchState::Running {
            tracing::warn!("batch already running, ignoring start request");
            return Err(Error::AlreadyRunning);
        }
        *state = BatchState::Running;
        self.cancel.reset();
        Ok(())
    }

    fn drive<F>(&self, files: &[PathBuf], mut on_event: F) -> BatchResult
    where
        F: FnMut(BatchEvent),
    {
        let _unwind = ResetOnUnwind(&self.state);
        let mut result = BatchResult {
            total_files: files.len(),
            ..BatchResult::default()
        };
        tracing::info!(total = files.len(), dry_run = self.rewriter.options().dry_run, "batch started");

        for (offset, path) in files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                result.cancelled = true;
                break;
            }

            let index = offset + 1;
            result.processed_count += 1;
            match self.rewriter.process(path) {
                Ok(outcome) => {
                    if outcome.is_rewritten() {
                        result.rewritten_count += 1;
                    }
                    on_event(BatchEvent::Progress {
                        index,
                        path: path.clone(),
                        outcome,
                    });
                }
                Err(e) => {
                    let message = failure_message(e);
                    tracing::warn!(path = %path.display(), %message, "failed to process file");
                    result.errors.push(FileFailure {
                        path: path.clone(),
                        message: message.clone(),
                    });
                    on_event(BatchEvent::Error {
                        index,
                        path: path.clone(),
                        message,
                    });
                }
            }
        }

        tracing::info!(
            processed = result.processed_count,
            rewritten = result.rewritten_count,
            errors = result.errors.len(),
            cancelled = result.cancelled,
            "batch finished"
        );

        let (state, event) = if result.cancelled {
            (BatchState::Cancelled, BatchEvent::Cancelled(result.clone()))
        } else {
            (BatchState::Completed, BatchEvent::Done(result.clone()))
        };
        *lock(&self.state) = state;
        on_event(event);

        result
    }
}

/// A batch running on its worker thread.
#[derive(Debug)]
pub struct BatchHandle {
    handle: JoinHandle<BatchResult>,
    cancel: CancelToken,
}

impl BatchHandle {
    /// Requests cancellation of this batch.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// `true` once the worker has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the batch to end and returns its result.
    pub fn join(self) -> Result<BatchResult> {
        self.handle.join().map_err(|_| Error::WorkerPanicked)
    }
}

/// Puts a pipeline left in `Running` back to `Idle` when a callback panics.
struct ResetOnUnwind<'a>(&'a Mutex<BatchState>);

impl Drop for ResetOnUnwind<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            let mut state = lock(self.0);
            if *state == BatchState::Running {
                *state = BatchState::Idle;
            }
        }
    }
}

fn lock(state: &Mutex<BatchState>) -> MutexGuard<'_, BatchState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The event already carries the path, so keep only the underlying cause.
fn failure_message(error: Error) -> String {
    match error {
        Error::FileAccess { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

/// Parameters of the `strip` command.
#[derive(Debug, Clone)]
pub struct StripRequest {
    pub dir: PathBuf,
    pub config: Config,
    pub dry_run: bool,
    pub fail_fast: bool,
    pub format: ReportFormat,
    pub output: Option<PathBuf>,
    pub quiet: bool,
    pub verbose: bool,
}

/// The main entry point for the `strip` command.
///
/// This function orchestrates the entire run:
/// 1. It collects the files under the target directory.
/// 2. It runs the batch on a worker thread, drawing a progress bar.
/// 3. It writes the report to the output file or standard output.
pub fn run_strip(request: StripRequest) -> Result<BatchResult> {
    let files = FileCollector::from_config(&request.config).collect(&request.dir)?;
    if files.is_empty() {
        eprintln!(
            "No .{} files found under {}",
            request.config.extensions.join(" / ."),
            request.dir.display()
        );
    }

    let pipeline = BatchPipeline::new(FileRewriter::from_config(&request.config, request.dry_run));
    let bar = progress_bar(files.len(), request.quiet);
    let token = pipeline.cancel_token();
    let (dry_run, fail_fast, verbose) = (request.dry_run, request.fail_fast, request.verbose);

    let handle = pipeline.start(files, move |event| match event {
        BatchEvent::Progress { index, path, outcome } => {
            bar.set_position(index as u64);
            bar.set_message(path.display().to_string());
            if verbose && outcome.is_rewritten() {
                let verb = if dry_run { "Would strip" } else { "Stripped" };
                bar.println(format!("{verb} {}", path.display()));
            }
        }
        BatchEvent::Error { index, path, message } => {
            bar.set_position(index as u64);
            bar.println(format!("Error processing file {}: {message}", path.display()));
            if fail_fast {
                token.cancel();
            }
        }
        BatchEvent::Cancelled(result) => {
            bar.abandon_with_message(format!(
                "Cancelled after {}/{} files",
                result.processed_count, result.total_files
            ));
        }
        BatchEvent::Done(_) => bar.finish_and_clear(),
    })?;

    let result = handle.join()?;
    write_report(&result, request.format, request.output.as_deref(), dry_run)?;
    Ok(result)
}

fn progress_bar(len: usize, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let style = ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {wide_msg}")
        .map(|style| style.progress_chars("##-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    ProgressBar::new(len as u64).with_style(style)
}

fn write_report(result: &BatchResult, format: ReportFormat, output: Option<&Path>, dry_run: bool) -> Result<()> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout()),
    };
    ReportFormatter::new(format, dry_run).write_report(&mut writer, result)?;
    writer.flush()?;
    Ok(())
}
