//! Domain events reported by the host application.

use serde::{Deserialize, Serialize};

/// Correlation id of an investigation plus the title shown on its
/// notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigationRef {
    pub id: String,
    pub title: String,
}

/// The two sides of an investigation: the user who requested it and, once
/// assigned, the user responding to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationParties {
    pub requested_by: String,
    #[serde(default)]
    pub responded_by: Option<String>,
}

impl InvestigationParties {
    /// The party that should hear about something `actor_id` did.
    ///
    /// The requester's actions go to the responder and everyone else's go to
    /// the requester. Returns None when there is nobody on the other side,
    /// or when the other side is the actor.
    pub fn counterpart_of(&self, actor_id: &str) -> Option<&str> {
        let counterpart = if actor_id == self.requested_by {
            self.responded_by.as_deref()
        } else {
            Some(self.requested_by.as_str())
        };
        counterpart.filter(|id| *id != actor_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestigationStatus {
    Pending,
    InProgress,
    Completed,
    Rejected,
}

impl InvestigationStatus {
    /// Label used in notification messages.
    pub fn label(&self) -> &'static str {
        match self {
            InvestigationStatus::Pending => "en attente",
            InvestigationStatus::InProgress => "en cours",
            InvestigationStatus::Completed => "terminée",
            InvestigationStatus::Rejected => "rejetée",
        }
    }
}

/// Something that happened in the dashboard and may produce a notification.
///
/// The acting user is never part of the event, it is the authenticated caller
/// that reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum DomainEvent {
    InvestigationCreated {
        investigation: InvestigationRef,
        establishment_name: String,
        receiver_id: String,
    },
    InvestigationStatusChanged {
        investigation: InvestigationRef,
        status: InvestigationStatus,
        requested_by: String,
    },
    CommentAdded {
        investigation: InvestigationRef,
        comment_id: String,
        parties: InvestigationParties,
    },
    ProfileUpdated {
        receiver_id: String,
    },
}
