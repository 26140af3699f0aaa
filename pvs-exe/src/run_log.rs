//! One line per finished build, appended to a plain text file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

fn host_name() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .ok()
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .and_then(|contents| first_host_line(&contents))
        })
        .unwrap_or_else(|| "unknown".to_owned())
}

/// The first non-empty, non-comment line of a hostname file
fn first_host_line(contents: &str) -> Option<String> {
    contents
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
}

/// Date, level name, time taken and host, then the PVS checksum
fn format_entry(date: &str, level: &Path, elapsed: Duration, host: &str, checksum: u64) -> String {
    let level_name = level
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let secs = elapsed.as_secs();
    format!(
        "{:<16} {:<16}{:3}:{:02}:{:02} [{:<16}] {:10}",
        date,
        level_name,
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        host,
        checksum
    )
}

pub fn append_entry(
    log_file: &Path,
    level: &Path,
    elapsed: Duration,
    checksum: u64,
) -> std::io::Result<()> {
    let date = chrono::Local::now().format("%d.%m.%Y %H:%M").to_string();
    let entry = format_entry(&date, level, elapsed, &host_name(), checksum);

    let mut file = OpenOptions::new().create(true).append(true).open(log_file)?;
    writeln!(file, "{entry}")
}
