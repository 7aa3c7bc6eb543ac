//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! 001 beach.jpg
//!     done: 412.3 KB (33%)
//! 002 broken.jpg
//!     error: decode failed: unsupported format (67%)
//! 003 city.png
//!     done: 1.2 MB (100%)
//!
//! Processed 3 images: 2 done, 1 failed
//! ```
//!
//! ## Plan
//!
//! ```text
//! 001 beach.jpg
//!     Source: 4000x2000
//!     Crop: 3556x2000 at (222, 0)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability. Format functions are pure and do no I/O. The CLI
//! prints their lines from a printer thread fed by the batch event channel.

use crate::batch::{BatchEvent, ItemOutcome, RunSummary};
use crate::imaging::{CropRect, Dimensions};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Human-readable byte size with one decimal.
fn format_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a single batch event as display lines.
///
/// `ItemStarted` prints the header so a slow item is visible while it is
/// being cropped; `ItemFinished` adds the outcome under it.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::ItemStarted { position, name, .. } => {
            vec![format!("{} {}", format_index(*position), name)]
        }
        BatchEvent::ItemFinished {
            outcome, progress, ..
        } => {
            let status = match outcome {
                ItemOutcome::Done { bytes } => format!("done: {}", format_bytes(*bytes)),
                ItemOutcome::Failed { reason } => format!("error: {}", reason),
            };
            vec![format!("    {} ({}%)", status, progress)]
        }
        BatchEvent::Finished(summary) => {
            let mut lines = vec![String::new(), format_summary(summary)];
            if summary.skipped > 0 {
                lines.push(format!(
                    "Skipped {} already processed or failed",
                    summary.skipped
                ));
            }
            lines
        }
    }
}

/// One-line run summary.
pub fn format_summary(summary: &RunSummary) -> String {
    let noun = if summary.total == 1 { "image" } else { "images" };
    let mut line = format!(
        "Processed {} {}: {} done, {} failed",
        summary.total, noun, summary.done, summary.failed
    );
    if summary.cancelled {
        let remaining = summary.total - summary.done - summary.failed;
        line.push_str(&format!(" (cancelled, {} left pending)", remaining));
    }
    line
}

/// Format the planned crop for one image.
pub fn format_plan(index: usize, name: &str, dims: Dimensions, rect: &CropRect) -> Vec<String> {
    let crop = if rect.is_full((dims.width, dims.height)) {
        "Crop: none (already at target ratio)".to_string()
    } else {
        format!(
            "Crop: {}x{} at ({}, {})",
            rect.width, rect.height, rect.x, rect.y
        )
    };
    vec![
        format!("{} {}", format_index(index), name),
        format!("    Source: {}x{}", dims.width, dims.height),
        format!("    {}", crop),
    ]
}

/// Format a plan entry for an image that could not be probed.
pub fn format_plan_error(index: usize, name: &str, error: &str) -> Vec<String> {
    vec![
        format!("{} {}", format_index(index), name),
        format!("    error: {}", error),
    ]
}
