use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RelKind {
    /// The owner's own entry, so they can appear in payer and bill lists
    #[serde(rename = "self")]
    Myself,
    Contact,
}

/// "This contact of mine": a participant as seen from one user's address book.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UsersRel {
    pub id: String,
    pub user_id: String,
    pub alias: String,
    pub phone: Option<String>,
    /// Set when the contact's phone belongs to a registered user
    pub target_user_id: Option<String>,
    pub kind: RelKind,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}

impl UsersRel {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}
