/// Batch processing engine
///
/// Drives every eligible job through the removal operation, strictly
/// one at a time in list order, and reports what happened as a stream
/// of `BatchEvent`s the UI folds into the job list. One image failing
/// never aborts the run; the engine records the failure and moves on.

use std::path::PathBuf;
use std::sync::Arc;

use futures::{SinkExt, Stream, StreamExt};

use crate::remover::{BackgroundRemover, RemovalUpdate};
use crate::state::jobs::JobId;

/// One entry of a batch run's snapshot, taken when the run starts.
/// Jobs are carried by id, so list edits after the snapshot cannot
/// redirect an event to the wrong image.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub id: JobId,
    pub filename: String,
    pub path: PathBuf,
}

/// What the engine reports while a run is in flight
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started { id: JobId },
    Progress { id: JobId, percent: u8 },
    Completed { id: JobId, output: Vec<u8> },
    Failed { id: JobId, message: String },
    Finished { completed: usize, failed: usize },
}

/// Process `items` sequentially through `remover`.
///
/// For each item: read the source file, consume the removal stream,
/// forward progress, and emit exactly one terminal event. A
/// `Finished` event with the run's tallies always closes the stream.
pub fn run_batch(
    items: Vec<BatchItem>,
    remover: Arc<dyn BackgroundRemover>,
) -> impl Stream<Item = BatchEvent> {
    iced::stream::channel(64, |mut events| async move {
        let mut completed = 0usize;
        let mut failed = 0usize;

        for item in items {
            let _ = events.send(BatchEvent::Started { id: item.id }).await;

            let source = match tokio::fs::read(&item.path).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    failed += 1;
                    eprintln!("⚠️  Could not read {}: {}", item.filename, err);
                    let _ = events
                        .send(BatchEvent::Failed {
                            id: item.id,
                            message: format!("could not read file: {}", err),
                        })
                        .await;
                    continue;
                }
            };

            let mut updates = remover.remove_background(source, &item.filename);
            let mut outcome = None;

            while let Some(update) = updates.next().await {
                match update {
                    RemovalUpdate::Progress(fraction) => {
                        let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u8;
                        let _ = events
                            .send(BatchEvent::Progress {
                                id: item.id,
                                percent,
                            })
                            .await;
                    }
                    RemovalUpdate::Done(result) => {
                        outcome = Some(result);
                        break;
                    }
                }
            }

            match outcome {
                Some(Ok(output)) => {
                    completed += 1;
                    println!("✅ Processed {} ({} bytes)", item.filename, output.len());
                    let _ = events
                        .send(BatchEvent::Completed {
                            id: item.id,
                            output,
                        })
                        .await;
                }
                Some(Err(err)) => {
                    failed += 1;
                    eprintln!("⚠️  Removal failed for {}: {}", item.filename, err);
                    let _ = events
                        .send(BatchEvent::Failed {
                            id: item.id,
                            message: err.to_string(),
                        })
                        .await;
                }
                // The stream ended without a terminal item; treat it
                // like any other per-job failure
                None => {
                    failed += 1;
                    eprintln!("⚠️  Removal stream for {} ended early", item.filename);
                    let _ = events
                        .send(BatchEvent::Failed {
                            id: item.id,
                            message: "removal ended without a result".to_string(),
                        })
                        .await;
                }
            }
        }

        println!("🏁 Batch done: {} processed, {} failed", completed, failed);
        let _ = events
            .send(BatchEvent::Finished { completed, failed })
            .await;
    })
}
