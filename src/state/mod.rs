/// State management module
///
/// This module handles all application state, including:
/// - The job list and its transition rules (jobs.rs)
/// - User-visible status notices (notice.rs)
///
/// Nothing here depends on the widget tree beyond image handles, so
/// the batch loop and its interleavings are testable without a window.

pub mod jobs;
pub mod notice;
