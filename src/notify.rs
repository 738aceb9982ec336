//! Notification surfaces: in-dashboard banners and system-level alerts.
//!
//! Banners are always available. System alerts are best effort; a sink
//! that cannot deliver one drops it without affecting the banner path.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Visual category of a banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    /// Neutral information.
    Info,
    /// A user action succeeded.
    Success,
    /// Something failed; previous state is still shown.
    Error,
    /// A task has become due.
    Reminder,
}

/// A transient in-dashboard message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    /// Category.
    pub kind: BannerKind,
    /// Headline.
    pub message: String,
    /// Optional second line.
    pub detail: Option<String>,
    /// How long to show it. `None` leaves it to the surface.
    pub duration: Option<Duration>,
}

impl Banner {
    /// Create a banner with no detail or duration.
    pub fn new(kind: BannerKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
            duration: None,
        }
    }

    /// Success banner.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(BannerKind::Success, message)
    }

    /// Error banner with a detail line.
    pub fn error(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(BannerKind::Error, message).with_detail(detail)
    }

    /// Attach a detail line.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Attach a display duration.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Where reminders and status messages go.
pub trait NotificationSink: Send + Sync {
    /// Show a banner in the dashboard surface.
    fn show_banner(&self, banner: Banner);

    /// Raise a system-level alert. `dedupe_tag` lets platforms that support
    /// it replace an earlier alert with the same tag.
    fn notify(&self, title: &str, body: &str, dedupe_tag: &str);
}

/// A message forwarded by [`ChannelSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// In-dashboard banner.
    Banner(Banner),
    /// System-level alert.
    Alert {
        /// Alert title.
        title: String,
        /// Alert body.
        body: String,
        /// Platform dedupe tag.
        tag: String,
    },
}

/// Sink that forwards every notice to a channel read by the UI surface.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Notice>,
    system_alerts: bool,
}

impl ChannelSink {
    /// Create a sink and the receiver the surface reads from.
    ///
    /// With `system_alerts` off, [`NotificationSink::notify`] is a no-op.
    pub fn new(system_alerts: bool) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, system_alerts }, rx)
    }

    fn forward(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            debug!("notice receiver closed, dropping notice");
        }
    }
}

impl NotificationSink for ChannelSink {
    fn show_banner(&self, banner: Banner) {
        self.forward(Notice::Banner(banner));
    }

    fn notify(&self, title: &str, body: &str, dedupe_tag: &str) {
        if !self.system_alerts {
            return;
        }
        self.forward(Notice::Alert {
            title: title.to_owned(),
            body: body.to_owned(),
            tag: dedupe_tag.to_owned(),
        });
    }
}

/// Sink that only writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn show_banner(&self, banner: Banner) {
        let detail = banner.detail.as_deref().unwrap_or("");
        match banner.kind {
            BannerKind::Error => error!("{} {}", banner.message, detail),
            _ => info!("{} {}", banner.message, detail),
        }
    }

    fn notify(&self, title: &str, body: &str, dedupe_tag: &str) {
        info!(tag = dedupe_tag, "{title}: {body}");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn channel_sink_forwards_banners_and_alerts() {
        let (sink, mut rx) = ChannelSink::new(true);
        sink.show_banner(Banner::success("Task created"));
        sink.notify("Task due", "Water plants", "t1@2024-01-01 09:00");

        assert_eq!(
            rx.try_recv().unwrap(),
            Notice::Banner(Banner::success("Task created"))
        );
        assert!(matches!(rx.try_recv().unwrap(), Notice::Alert { tag, .. } if tag == "t1@2024-01-01 09:00"));
    }

    #[test]
    fn alerts_can_be_disabled_without_affecting_banners() {
        let (sink, mut rx) = ChannelSink::new(false);
        sink.notify("Task due", "Water plants", "tag");
        sink.show_banner(Banner::new(BannerKind::Reminder, "Water plants"));

        assert!(matches!(rx.try_recv().unwrap(), Notice::Banner(_)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_receiver_is_tolerated() {
        let (sink, rx) = ChannelSink::new(true);
        drop(rx);
        sink.show_banner(Banner::error("Refresh failed", "timeout"));
        sink.notify("t", "b", "x");
    }

    #[test]
    fn log_sink_accepts_every_kind() {
        let sink = LogSink;
        for kind in [BannerKind::Info, BannerKind::Success, BannerKind::Error, BannerKind::Reminder] {
            sink.show_banner(Banner::new(kind, "message").with_detail("detail"));
        }
        sink.notify("Task due", "Water plants", "t1@2024-01-01 09:00");
    }

    #[test]
    fn banner_builders_fill_fields() {
        let banner = Banner::error("Refresh failed", "timeout")
            .with_duration(Duration::from_secs(3));
        assert_eq!(banner.kind, BannerKind::Error);
        assert_eq!(banner.detail.as_deref(), Some("timeout"));
        assert_eq!(banner.duration, Some(Duration::from_secs(3)));
    }
}
