//! Append-only log of page model gestures

use serde::{Deserialize, Serialize};

use crate::page_model::Direction;

pub type ActionId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PageAction {
    Load { name: String, page_count: u32 },
    MoveAdjacent { index: usize, direction: Direction },
    MoveTo { from: usize, to: usize },
    Rotate { index: usize, delta: i32 },
    ToggleKeep { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedAction {
    pub id: ActionId,
    #[serde(flatten)]
    pub action: PageAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionLog {
    next_id: ActionId,
    actions: Vec<LoggedAction>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, action: PageAction) -> ActionId {
        let id = self.next_id;
        self.next_id += 1;
        self.actions.push(LoggedAction { id, action });
        id
    }

    pub fn actions(&self) -> &[LoggedAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Actions recorded since the most recent `Load`.
    pub fn since_last_load(&self) -> &[LoggedAction] {
        let start = self
            .actions
            .iter()
            .rposition(|a| matches!(a.action, PageAction::Load { .. }))
            .unwrap_or(0);
        &self.actions[start..]
    }
}
