//! Clipboard watcher: feeds newly copied links into the engine.
//!
//! Desktop backend is arboard (feature `clipboard`). Without it the watcher
//! is unavailable and `--no-clipboard` is implied.

use ksdown_core::intake::resolve_link;
use std::collections::HashSet;

pub const AVAILABLE: bool = cfg!(feature = "clipboard");

/// Remembers clipboard texts already handed to the engine.
#[derive(Debug, Default)]
#[cfg_attr(not(feature = "clipboard"), allow(dead_code))]
pub struct SeenTexts {
    seen: HashSet<String>,
}

#[cfg_attr(not(feature = "clipboard"), allow(dead_code))]
impl SeenTexts {
    /// Links in `text`, one per line, if the text has not been seen before.
    ///
    /// Lines that are not downloadable links are ordinary clipboard content
    /// and are dropped here, so they never reach intake. `None` when nothing
    /// new and usable was copied.
    pub fn observe(&mut self, text: &str) -> Option<Vec<String>> {
        let text = text.trim();
        if text.is_empty() || !self.seen.insert(text.to_string()) {
            return None;
        }
        let links: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| match resolve_link(line) {
                Ok(_) => true,
                Err(e) => {
                    tracing::debug!(text = line, "clipboard line ignored: {}", e);
                    false
                }
            })
            .map(str::to_string)
            .collect();
        (!links.is_empty()).then_some(links)
    }
}

#[cfg(feature = "clipboard")]
pub use watcher::spawn_watcher;

#[cfg(feature = "clipboard")]
mod watcher {
    use super::SeenTexts;
    use anyhow::{Context, Result};
    use ksdown_core::{Intake, ShutdownSignal};
    use std::thread::JoinHandle;
    use std::time::{Duration, Instant};

    const SHUTDOWN_CHECK: Duration = Duration::from_millis(100);

    /// Starts polling the clipboard every `interval` until shutdown.
    /// Text present at startup is treated like any newly copied text.
    /// The intake handle is dropped when the watcher stops.
    pub fn spawn_watcher(
        intake: Intake,
        shutdown: ShutdownSignal,
        interval: Duration,
    ) -> Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("ksdown-clipboard".to_string())
            .spawn(move || {
                // arboard handles stay on the thread that created them.
                let mut clip = match arboard::Clipboard::new() {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::error!("clipboard unavailable, watcher not started: {}", e);
                        return;
                    }
                };
                tracing::info!(interval_ms = interval.as_millis() as u64, "watching clipboard");
                let mut seen = SeenTexts::default();
                while !shutdown.is_triggered() {
                    match clip.get_text() {
                        Ok(text) => {
                            if let Some(links) = seen.observe(&text) {
                                tracing::info!(count = links.len(), "new clipboard content");
                                intake.add_task(&links);
                            }
                        }
                        Err(e) => tracing::debug!("read clipboard: {}", e),
                    }
                    sleep_unless_shutdown(interval, &shutdown);
                }
                tracing::debug!("clipboard watcher stopped");
            })
            .context("spawn clipboard watcher")
    }

    fn sleep_unless_shutdown(total: Duration, shutdown: &ShutdownSignal) {
        let deadline = Instant::now() + total;
        while !shutdown.is_triggered() {
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            std::thread::sleep((deadline - now).min(SHUTDOWN_CHECK));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeats_and_blanks_are_ignored() {
        let mut seen = SeenTexts::default();
        assert_eq!(
            seen.observe(" http://a/1.mp4\r\nhttp://a/2.mp4 "),
            Some(vec!["http://a/1.mp4".to_string(), "http://a/2.mp4".to_string()])
        );
        assert_eq!(seen.observe("http://a/1.mp4\r\nhttp://a/2.mp4"), None);
        assert_eq!(seen.observe("   "), None);
        assert_eq!(
            seen.observe("http://a/3.mp4"),
            Some(vec!["http://a/3.mp4".to_string()])
        );
    }

    #[test]
    fn plain_text_is_not_forwarded() {
        let mut seen = SeenTexts::default();
        assert_eq!(seen.observe("meeting notes for friday"), None);
        assert_eq!(
            seen.observe("see this:\nhttp://a/4.mp4\nftp://a/5.iso\nthanks"),
            Some(vec!["http://a/4.mp4".to_string()])
        );
    }

    #[test]
    fn commas_inside_a_line_are_kept() {
        let mut seen = SeenTexts::default();
        assert_eq!(
            seen.observe("http://a/get?ids=1,2,3\r\nhttp://a/b,c.mp4"),
            Some(vec![
                "http://a/get?ids=1,2,3".to_string(),
                "http://a/b,c.mp4".to_string()
            ])
        );
    }
}
