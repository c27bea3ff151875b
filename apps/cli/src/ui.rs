use std::{path::Path, time::Duration};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .expect("static spinner template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn banner(subtitle: &str) {
    println!(
        "\n{}  {}\n",
        style("shotlist").cyan().bold(),
        style(subtitle).dim()
    );
}

pub fn rule() {
    println!("{}", style("─".repeat(60)).dim());
}

pub fn done(spinner: &ProgressBar, what: &str, elapsed: Duration) {
    spinner.finish_with_message(format!(
        "{} {} {}",
        style("✓").green().bold(),
        what,
        style(format!("[{}]", format_duration(elapsed))).dim()
    ));
}

pub fn failed(spinner: &ProgressBar, what: &str, err: &dyn std::fmt::Display) {
    spinner.finish_and_clear();
    eprintln!("{} {}: {}", style("✗").red().bold(), what, err);
}

pub fn saved(label: &str, path: &Path) {
    println!(
        "  {} {}",
        style(format!("{:<10}", label)).dim(),
        style(path.display()).cyan()
    );
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn summary(what: &str, succeeded: usize, failed: usize) {
    println!();
    rule();
    let failed_text = format!("{} failed", failed);
    println!(
        "{} {} succeeded, {}",
        style(format!("{}:", what)).bold(),
        style(succeeded).green().bold(),
        if failed > 0 {
            style(failed_text).red().bold()
        } else {
            style(failed_text).dim()
        }
    );
}
