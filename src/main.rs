use iced::widget::image as iced_image;
use iced::widget::{
    button, column, container, horizontal_space, progress_bar, row, scrollable, text,
};
use iced::{Alignment, Element, Length, Task, Theme};
use rfd::FileDialog;
use std::sync::Arc;

// Declare the application modules
mod archive;
mod engine;
mod intake;
mod remover;
mod state;

use engine::{BatchEvent, BatchItem};
use intake::scan::ScannedImage;
use remover::{BackgroundRemover, HttpRemover, RemoverConfig};
use state::jobs::{ImageJob, JobId, JobList, JobStatus, ProcessedImage};
use state::notice::{Notice, NoticeKind};

/// Main application state
struct CutoutStudio {
    /// Every image the user has added, in selection order
    jobs: JobList,
    /// The external background-removal collaborator
    remover: Arc<dyn BackgroundRemover>,
    /// True from batch start until its Finished event
    run_in_flight: bool,
    /// Aggregate progress of the current/last batch run (0-100)
    overall_progress: f32,
    /// Latest status notice shown to the user
    notice: Option<Notice>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked the "Select Folder" button
    SelectFolder,
    /// Background folder scan finished
    FolderScanned(Result<Vec<ScannedImage>, String>),
    /// User removed one image from the list
    RemoveJob(JobId),
    /// User started a batch run
    ProcessAll,
    /// The batch engine reported progress
    BatchEvent(BatchEvent),
    /// User asked for the zip export
    ExportArchive,
    /// Background archive write finished
    ArchiveWritten(Result<usize, String>),
}

impl CutoutStudio {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = RemoverConfig::from_env();
        println!("🔌 Removal service: {}", config.base_url);

        // If this fails, we panic because the app cannot function
        // without its removal client
        let remover =
            HttpRemover::new(config).expect("Failed to initialize the removal service client");

        (
            CutoutStudio {
                jobs: JobList::new(),
                remover: Arc::new(remover),
                run_in_flight: false,
                overall_progress: 0.0,
                notice: None,
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SelectFolder => {
                if self.run_in_flight {
                    return Task::none();
                }

                // Show the native folder picker dialog
                let folder = FileDialog::new()
                    .set_title("Select Folder with Images")
                    .pick_folder();

                if let Some(folder_path) = folder {
                    self.notice =
                        Some(Notice::info(format!("Scanning {}...", folder_path.display())));

                    // Launch async scan task
                    return Task::perform(
                        intake::scan::scan_folder(folder_path),
                        Message::FolderScanned,
                    );
                }

                Task::none()
            }
            Message::FolderScanned(Ok(images)) => {
                if images.is_empty() {
                    self.notice =
                        Some(Notice::warning("No image files found in the selected folder"));
                    return Task::none();
                }

                let count = images.len();
                for image in images {
                    let preview = iced_image::Handle::from_rgba(
                        image.thumbnail.width,
                        image.thumbnail.height,
                        image.thumbnail.rgba,
                    );
                    self.jobs.append(image.filename, image.path, preview);
                }

                println!("✅ Added {} image(s) to the list", count);
                self.notice = Some(Notice::success(format!("Added {} image(s)", count)));
                Task::none()
            }
            Message::FolderScanned(Err(err)) => {
                self.notice = Some(Notice::error(format!("Folder scan failed: {}", err)));
                Task::none()
            }
            Message::RemoveJob(id) => {
                if self.run_in_flight {
                    return Task::none();
                }

                match self.jobs.remove(id) {
                    Ok(job) => println!("🗑️  Removed {}", job.filename),
                    Err(err) => eprintln!("⚠️  Could not remove image: {}", err),
                }
                Task::none()
            }
            Message::ProcessAll => {
                if self.run_in_flight || self.jobs.is_empty() {
                    return Task::none();
                }

                // Snapshot the eligible jobs; completed ones are
                // skipped so re-running the batch is idempotent
                let items: Vec<BatchItem> = self
                    .jobs
                    .iter()
                    .filter(|job| job.status != JobStatus::Completed)
                    .map(|job| BatchItem {
                        id: job.id,
                        filename: job.filename.clone(),
                        path: job.path.clone(),
                    })
                    .collect();

                if items.is_empty() {
                    self.notice = Some(Notice::info("All images are already processed"));
                    return Task::none();
                }

                self.run_in_flight = true;
                self.overall_progress = 0.0;
                println!("🚀 Starting batch over {} image(s)", items.len());
                self.notice = Some(Notice::info(format!(
                    "Processing {} image(s)...",
                    items.len()
                )));

                Task::run(
                    engine::run_batch(items, self.remover.clone()),
                    Message::BatchEvent,
                )
            }
            Message::BatchEvent(event) => {
                self.apply_batch_event(event);
                Task::none()
            }
            Message::ExportArchive => {
                let entries: Vec<archive::ArchiveEntry> = self
                    .jobs
                    .iter()
                    .filter_map(|job| {
                        job.output.as_ref().map(|output| archive::ArchiveEntry {
                            filename: job.filename.clone(),
                            bytes: output.bytes.clone(),
                        })
                    })
                    .collect();

                if entries.is_empty() {
                    self.notice = Some(Notice::error("No processed images to export yet"));
                    return Task::none();
                }

                // Native save dialog, the desktop version of a
                // browser download prompt
                let destination = FileDialog::new()
                    .set_title("Save Archive")
                    .set_file_name(archive::DEFAULT_ARCHIVE_NAME)
                    .save_file();

                let Some(destination) = destination else {
                    return Task::none();
                };

                self.notice = Some(Notice::info(format!(
                    "Packing {} image(s)...",
                    entries.len()
                )));

                Task::perform(
                    archive::write_archive(entries, destination),
                    Message::ArchiveWritten,
                )
            }
            Message::ArchiveWritten(Ok(count)) => {
                println!("📦 Archive saved with {} image(s)", count);
                self.notice = Some(Notice::success(format!(
                    "Archive saved with {} image(s)",
                    count
                )));
                Task::none()
            }
            Message::ArchiveWritten(Err(err)) => {
                self.notice = Some(Notice::error(format!("Export failed: {}", err)));
                Task::none()
            }
        }
    }

    /// Fold one engine event into the job list.
    ///
    /// Transitions the list refuses (e.g. an event for a job that no
    /// longer exists) are dropped; the engine carries on regardless.
    fn apply_batch_event(&mut self, event: BatchEvent) {
        match event {
            BatchEvent::Started { id } => {
                let _ = self.jobs.start(id);
            }
            BatchEvent::Progress { id, percent } => {
                let _ = self.jobs.set_progress(id, percent);
            }
            BatchEvent::Completed { id, output } => {
                let _ = self.jobs.complete(id, ProcessedImage::new(output));
            }
            BatchEvent::Failed { id, message } => {
                let filename = self
                    .jobs
                    .get(id)
                    .map(|job| job.filename.clone())
                    .unwrap_or_default();
                if self.jobs.fail(id, message.clone()).is_ok() {
                    self.notice = Some(Notice::error(format!(
                        "Failed to process {}: {}",
                        filename, message
                    )));
                }
            }
            BatchEvent::Finished { completed, failed } => {
                self.run_in_flight = false;
                println!("🏁 Batch finished: {} processed, {} failed", completed, failed);
                self.notice = Some(if failed == 0 {
                    Notice::success(format!(
                        "Processing complete: {} image(s) ready",
                        completed
                    ))
                } else {
                    Notice::warning(format!(
                        "Processing finished: {} succeeded, {} failed",
                        completed, failed
                    ))
                });
            }
        }

        // The displayed aggregate only ever moves forward during a run
        self.overall_progress = self.overall_progress.max(self.jobs.total_progress());
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let idle = !self.run_in_flight;

        let header = row![
            text("Cutout Studio").size(28),
            text(format!("{} image(s)", self.jobs.len())).size(14),
            horizontal_space(),
            button("Select Folder")
                .on_press_maybe(idle.then_some(Message::SelectFolder))
                .padding(10),
            button("Remove Backgrounds")
                .on_press_maybe((idle && !self.jobs.is_empty()).then_some(Message::ProcessAll))
                .padding(10),
            button("Export ZIP")
                .on_press_maybe(
                    (self.jobs.completed_count() > 0).then_some(Message::ExportArchive)
                )
                .padding(10),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let mut page = column![header].spacing(14).padding(20);

        if !self.jobs.is_empty() {
            page = page.push(
                row![
                    progress_bar(0.0..=100.0, self.overall_progress),
                    text(format!("{:.0}%", self.overall_progress)).size(14),
                ]
                .spacing(10)
                .align_y(Alignment::Center),
            );
        }

        if let Some(notice) = &self.notice {
            page = page.push(self.notice_view(notice));
        }

        page = page.push(self.gallery_view());

        container(page)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Status line, colored by severity
    fn notice_view<'a>(&'a self, notice: &'a Notice) -> Element<'a, Message> {
        let line = text(&notice.text).size(15);
        let line = match notice.kind {
            NoticeKind::Info => line,
            NoticeKind::Success => line.style(text::success),
            NoticeKind::Error => line.style(text::danger),
            NoticeKind::Warning => line.style(|_theme: &Theme| text::Style {
                color: Some(iced::Color::from_rgb(0.95, 0.72, 0.2)),
            }),
        };
        line.into()
    }

    /// Scrollable thumbnail grid, or a hint while the list is empty
    fn gallery_view(&self) -> Element<Message> {
        if self.jobs.is_empty() {
            return container(text("Select a folder of photos to get started").size(18))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into();
        }

        let cards: Vec<Element<Message>> =
            self.jobs.iter().map(|job| self.job_card(job)).collect();

        let grid = iced_aw::Wrap::with_elements(cards)
            .spacing(12.0)
            .line_spacing(12.0);

        scrollable(container(grid).width(Length::Fill).padding(4))
            .height(Length::Fill)
            .into()
    }

    /// One image card: preview, filename, status, remove control
    fn job_card<'a>(&'a self, job: &'a ImageJob) -> Element<'a, Message> {
        // Show the processed result once it exists
        let handle = job
            .output
            .as_ref()
            .map(|output| output.handle.clone())
            .unwrap_or_else(|| job.preview.clone());

        let preview = iced_image(handle)
            .width(Length::Fixed(180.0))
            .height(Length::Fixed(140.0));

        let status: Element<Message> = match job.status {
            JobStatus::Processing => column![
                progress_bar(0.0..=100.0, f32::from(job.progress))
                    .height(Length::Fixed(8.0)),
                text(format!("{}%", job.progress)).size(12),
            ]
            .spacing(2)
            .align_x(Alignment::Center)
            .into(),
            JobStatus::Completed => text(job.status.label()).size(12).style(text::success).into(),
            JobStatus::Error => text(
                job.error
                    .as_deref()
                    .unwrap_or(job.status.label()),
            )
            .size(12)
            .style(text::danger)
            .into(),
            JobStatus::Pending => text(job.status.label()).size(12).into(),
        };

        let remove = button(text("Remove").size(12))
            .on_press_maybe((!self.run_in_flight).then_some(Message::RemoveJob(job.id)))
            .padding(4);

        let card = column![
            preview,
            text(&job.filename).size(13),
            text(format!("added {}", job.added_at.format("%H:%M:%S"))).size(10),
            status,
            remove,
        ]
        .spacing(6)
        .align_x(Alignment::Center);

        container(card)
            .padding(10)
            .style(container::rounded_box)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    iced::application(
        "Cutout Studio",
        CutoutStudio::update,
        CutoutStudio::view,
    )
    .theme(CutoutStudio::theme)
    .centered()
    .run_with(CutoutStudio::new)
}
