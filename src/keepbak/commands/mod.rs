use crate::model::BackupArtifact;

pub mod backup;
pub mod helpers;
pub mod retention;
pub mod transfer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// What a command did, for the UI to present however it likes.
#[derive(Debug, Default)]
pub struct CmdResult {
    /// The artifact written by this run's transfer.
    pub created: Option<BackupArtifact>,
    /// Artifacts left in place by retention, newest first.
    pub kept: Vec<BackupArtifact>,
    /// Artifacts removed by retention, in the order they were removed.
    pub pruned: Vec<BackupArtifact>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_created(mut self, artifact: BackupArtifact) -> Self {
        self.created = Some(artifact);
        self
    }

    pub fn with_kept(mut self, artifacts: Vec<BackupArtifact>) -> Self {
        self.kept = artifacts;
        self
    }

    /// Fold a later step's outcome into this one.
    pub fn merge(mut self, other: CmdResult) -> Self {
        if other.created.is_some() {
            self.created = other.created;
        }
        self.kept.extend(other.kept);
        self.pruned.extend(other.pruned);
        self.messages.extend(other.messages);
        self
    }
}
