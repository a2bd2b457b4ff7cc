//! Job list rendering helpers
//!
//! Display-label derivation and elapsed-time formatting are purely
//! presentational: they consume only fields of a `JobSnapshot` and never
//! touch supervisor state.

use schema::JobSnapshot;
use std::path::Path;

/// File extensions recognized as media files for label extraction
const MEDIA_EXTENSIONS: [&str; 3] = [".mp4", ".mkv", ".avi"];

/// Maximum label length before a command line is truncated
const MAX_LABEL_LEN: usize = 20;

/// Derive a short display label from a command line
///
/// If the command mentions a media file, its basename is the label
/// (encoding jobs are far easier to recognize by file than by flag
/// soup); otherwise the command itself, truncated.
pub fn display_label(command: &str) -> String {
    extract_media_filename(command).unwrap_or_else(|| truncate_command(command))
}

fn extract_media_filename(command: &str) -> Option<String> {
    command.split_whitespace().find_map(|part| {
        if MEDIA_EXTENSIONS.iter().any(|ext| part.ends_with(ext)) {
            Path::new(part)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        } else {
            None
        }
    })
}

fn truncate_command(command: &str) -> String {
    if command.chars().count() > MAX_LABEL_LEN {
        let prefix: String = command.chars().take(MAX_LABEL_LEN).collect();
        format!("{}...", prefix)
    } else {
        command.to_string()
    }
}

/// Format a run time in seconds as `3h 2m 1s`, dropping leading zero units
pub fn format_elapsed(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Print the job table to stdout
pub fn render_jobs(jobs: &[JobSnapshot]) {
    if jobs.is_empty() {
        println!("No jobs running");
        return;
    }

    println!("{:<6} {:<24} {:>12}  {}", "ID", "JOB", "ELAPSED", "STATE");
    for job in jobs {
        println!(
            "{:<6} {:<24} {:>12}  {:?}",
            job.id.to_string(),
            display_label(&job.command),
            format_elapsed(job.elapsed_secs),
            job.state
        );
    }
}
