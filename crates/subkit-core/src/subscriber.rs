//! Subscriber: one managed proxy-service user.
//!
//! The id doubles as the credential embedded in every generated artifact, so
//! it is never exposed anywhere it could be enumerated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rendering fallback for subscribers created without a label.
pub const UNNAMED_LABEL: &str = "unnamed";

/// A registered subscriber. Every field is fixed at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
  pub id:         Uuid,
  /// Free-form display text; stored verbatim, possibly empty.
  pub label:      String,
  /// Server-assigned timestamp; never changes after creation.
  pub created_at: DateTime<Utc>,
}

impl Subscriber {
  /// The label to show in rendered artifacts, substituting
  /// [`UNNAMED_LABEL`] for an empty one.
  pub fn display_label(&self) -> &str {
    if self.label.trim().is_empty() {
      UNNAMED_LABEL
    } else {
      &self.label
    }
  }
}

/// Outcome of [`crate::store::SubscriberStore::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
  Deleted,
  NotFound,
}
