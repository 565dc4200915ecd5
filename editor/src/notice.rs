use std::fmt;

pub const SAVE_SUCCEEDED: &str = "Images saved successfully!";
pub const SAVE_FAILED: &str = "Failed to save images. Please try again.";
pub const DELETE_FAILED: &str = "Failed to delete image";
pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this image pair?";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// A message the view shows the user after an action settles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
