use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    shown_at: Instant,
}

/// One message slot, last-write-wins. A new message replaces the old one and
/// restarts its timer; there is no queue and no priority. The message stays
/// fully visible for the display window, fades over the fade window, then
/// disappears.
pub struct NotificationsManager {
    active: Option<Notice>,
    display: Duration,
    fade: Duration,
}

const DISPLAY: Duration = Duration::from_millis(4000);
const FADE: Duration = Duration::from_millis(500);

impl Default for NotificationsManager {
    fn default() -> Self {
        Self {
            active: None,
            display: DISPLAY,
            fade: FADE,
        }
    }
}

impl NotificationsManager {
    pub fn show(&mut self, text: impl Into<String>, kind: NoticeKind, now: Instant) {
        self.active = Some(Notice {
            text: text.into(),
            kind,
            shown_at: now,
        });
    }

    /// The active message and its opacity (1.0 while visible, falling to 0.0
    /// across the fade window). Expired messages are dropped here.
    pub fn current(&mut self, now: Instant) -> Option<(&Notice, f32)> {
        let expired = self
            .active
            .as_ref()
            .is_some_and(|n| now.duration_since(n.shown_at) > self.display + self.fade);
        if expired {
            self.active = None;
        }

        let (display, fade) = (self.display, self.fade);
        self.active.as_ref().map(|notice| {
            let age = now.duration_since(notice.shown_at);
            let opacity = if age <= display {
                1.0
            } else {
                1.0 - (age - display).as_secs_f32() / fade.as_secs_f32()
            };
            (notice, opacity)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_visible_then_fading_then_gone() {
        let mut mgr = NotificationsManager::default();
        let t0 = Instant::now();
        mgr.show("card played", NoticeKind::Success, t0);

        let (_, opacity) = mgr.current(t0 + Duration::from_secs(2)).unwrap();
        assert_eq!(opacity, 1.0);

        let (_, opacity) = mgr.current(t0 + Duration::from_millis(4250)).unwrap();
        assert!(opacity > 0.0 && opacity < 1.0);

        assert!(mgr.current(t0 + Duration::from_secs(5)).is_none());
        assert!(mgr.current(t0 + Duration::from_secs(6)).is_none());
    }

    #[test]
    fn new_message_replaces_slot_and_restarts_timer() {
        let mut mgr = NotificationsManager::default();
        let t0 = Instant::now();
        mgr.show("first", NoticeKind::Info, t0);

        // Just before the first would expire, a second arrives.
        let t1 = t0 + Duration::from_millis(3900);
        mgr.show("second", NoticeKind::Warning, t1);

        let (notice, opacity) = mgr.current(t0 + Duration::from_millis(4500)).unwrap();
        assert_eq!(notice.text, "second");
        assert_eq!(notice.kind, NoticeKind::Warning);
        assert_eq!(opacity, 1.0);
    }
}
