//! Status observable shared with the UI shell.

use serde::Serialize;
use tokio::sync::watch;

use crate::error::PageCraftError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Status {
    Idle,
    Working {
        message: String,
        current: u32,
        total: u32,
    },
    Ready {
        message: String,
    },
    Failed {
        message: String,
    },
}

impl Status {
    pub fn is_working(&self) -> bool {
        matches!(self, Status::Working { .. })
    }
}

/// Publishes the latest [`Status`]; any number of receivers may watch it.
#[derive(Debug)]
pub struct StatusReporter {
    tx: watch::Sender<Status>,
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusReporter {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Status::Idle);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Status {
        self.tx.borrow().clone()
    }

    pub fn progress(&self, current: u32, total: u32, message: impl Into<String>) {
        self.tx.send_replace(Status::Working {
            message: message.into(),
            current,
            total,
        });
    }

    pub fn working(&self, message: impl Into<String>) {
        self.progress(0, 100, message);
    }

    pub fn ready(&self, message: impl Into<String>) {
        self.tx.send_replace(Status::Ready {
            message: message.into(),
        });
    }

    pub fn idle(&self) {
        self.tx.send_replace(Status::Idle);
    }

    pub fn failed(&self, error: &PageCraftError) {
        self.tx.send_replace(Status::Failed {
            message: error.to_string(),
        });
    }
}
