//! Host-facing notifications
//!
//! The editor never shows UI itself. Change notifications, blocking error
//! dialogs and warnings go through a [`NotificationSink`] supplied by the host.

use crate::mutations::Change;
use serde::Serialize;
use std::cell::RefCell;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Notification {
    DocumentChanged {
        document: String,
        version: u64,
        changes: Vec<Change>,
    },
    /// Blocking error the host should surface as a dialog
    ErrorDialog { title: String, message: String },
    Warning { message: String },
}

pub trait NotificationSink {
    fn notify(&self, notification: Notification);

    fn document_changed(&self, document: &str, version: u64, changes: &[Change]) {
        self.notify(Notification::DocumentChanged {
            document: document.to_string(),
            version,
            changes: changes.to_vec(),
        });
    }

    fn error_dialog(&self, title: &str, message: &str) {
        self.notify(Notification::ErrorDialog {
            title: title.to_string(),
            message: message.to_string(),
        });
    }

    fn warning(&self, message: &str) {
        self.notify(Notification::Warning {
            message: message.to_string(),
        });
    }
}

/// Forwards notifications to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::DocumentChanged {
                document,
                version,
                changes,
            } => debug!(%document, version, changes = changes.len(), "Document changed"),
            Notification::ErrorDialog { title, message } => error!(%title, %message, "Error dialog"),
            Notification::Warning { message } => warn!(%message, "Editor warning"),
        }
    }
}

/// Keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    notifications: RefCell<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.borrow().clone()
    }

    pub fn error_dialogs(&self) -> usize {
        self.notifications
            .borrow()
            .iter()
            .filter(|n| matches!(n, Notification::ErrorDialog { .. }))
            .count()
    }

    pub fn warnings(&self) -> usize {
        self.notifications
            .borrow()
            .iter()
            .filter(|n| matches!(n, Notification::Warning { .. }))
            .count()
    }

    pub fn clear(&self) {
        self.notifications.borrow_mut().clear();
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.notifications.borrow_mut().push(notification);
    }
}
