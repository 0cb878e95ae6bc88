//! Optional page-level collaborators. Every hook defaults to a silent no-op so
//! a front end only implements what it actually has.

/// An error toast: every notification the flow raises reports a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            message: message.into(),
        }
    }
}

pub trait Collaborators: Send + Sync {
    /// Transient, non-blocking notification.
    fn notify(&self, _notification: &Notification) {}

    fn haptic_feedback(&self) {}

    fn is_logged_in(&self) -> bool {
        false
    }

    /// Celebrates points earned for a submission.
    fn award_points(&self, _points: u32) {}

    /// Called after new icon nodes have been rendered.
    fn replace_icons(&self) {}
}

pub struct NoopCollaborators;

impl Collaborators for NoopCollaborators {}
