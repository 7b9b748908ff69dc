use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteId(pub String);

/// One position in a route: the identity whose approval is required there.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStep {
    pub approver_id: String,
}

/// Named ordered sequence of approval steps. Read-only to the workflow:
/// referenced at submission and during approval, never edited by it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRoute {
    pub id: RouteId,
    pub name: String,
    pub steps: Vec<RouteStep>,
    pub created_at: DateTime<Utc>,
}

impl ApprovalRoute {
    pub fn step_count(&self) -> u32 {
        self.steps.len() as u32
    }

    /// Approver at the given 1-based level.
    pub fn approver_at(&self, level: u32) -> Option<&str> {
        if level == 0 {
            return None;
        }
        self.steps.get(level as usize - 1).map(|step| step.approver_id.as_str())
    }

    pub fn first_approver(&self) -> Option<&str> {
        self.approver_at(1)
    }
}
