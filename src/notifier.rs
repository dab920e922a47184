//! Boundary to the reservation notifier.
//!
//! The carousel does not depend on this module. It describes the one operation
//! the external messaging service offers and the checks done before handing a
//! reservation over to it.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
}

impl Reservation {
    fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("specialty", self.specialty.as_str()),
            ("name", self.name.as_str()),
            ("identifier", self.identifier.as_str()),
            ("phone", self.phone.as_str()),
            ("date", self.date.as_str()),
            ("time", self.time.as_str()),
        ]
    }

    /// Names of the fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
            .collect()
    }

    /// Message body handed to the messaging service.
    pub fn render_message(&self) -> String {
        format!(
            "New reservation\nSpecialty: {}\nName: {}\nID: {}\nPhone: {}\nDate: {}\nTime: {}",
            self.specialty.trim(),
            self.name.trim(),
            self.identifier.trim(),
            self.phone.trim(),
            self.date.trim(),
            self.time.trim(),
        )
    }
}

/// Identifier the messaging service assigns to a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("missing recipient")]
    MissingRecipient,

    #[error("missing reservation fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("notifier not ready")]
    NotReady,

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// External messaging service. Implementations receive the structured
/// reservation and may use [`Reservation::render_message`] for the body.
pub trait Notifier {
    fn send_notification(
        &self,
        recipient: &str,
        reservation: &Reservation,
    ) -> impl Future<Output = Result<MessageId, NotifyError>> + Send;
}

/// Keeps only the digits of a phone-number style recipient.
pub fn normalize_recipient(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Validates a reservation and hands it to `notifier`.
pub async fn send_reservation<N: Notifier>(
    notifier: &N,
    recipient: &str,
    reservation: &Reservation,
) -> Result<MessageId, NotifyError> {
    let recipient = normalize_recipient(recipient);
    if recipient.is_empty() {
        return Err(NotifyError::MissingRecipient);
    }
    let missing = reservation.missing_fields();
    if !missing.is_empty() {
        return Err(NotifyError::MissingFields(missing));
    }

    match notifier.send_notification(&recipient, reservation).await {
        Ok(id) => {
            info!(%id, "reservation notification sent");
            Ok(id)
        }
        Err(e) => {
            warn!(error = %e, "reservation notification failed");
            Err(e)
        }
    }
}
