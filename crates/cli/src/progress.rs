use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use pkgver_core::BatchEvent;
use std::time::Duration;

const TEMPLATE: &str = "{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} {elapsed_precise}";

pub fn batch_bar(len: usize, message: &str) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸ ");
    bar.set_style(style);
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Advance `bar` for each finished item; failures relabel the bar with
/// `"{verb} {name}"` failed and print the pip error above it.
pub fn track<'b>(bar: &'b ProgressBar, verb: &'static str) -> impl FnMut(BatchEvent<'_>) + 'b {
    move |event| match event {
        BatchEvent::Succeeded(_) => bar.inc(1),
        BatchEvent::Failed(pkg, err) => {
            bar.set_message(format!("Failed to {} {}", verb, pkg.name));
            bar.println(format!("{}", format!("  ✗ {}: {}", pkg.requirement(), err).bright_red()));
            bar.inc(1);
        }
    }
}
