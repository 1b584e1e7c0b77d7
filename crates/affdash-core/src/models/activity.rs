//! Conversion and payout list items.
//!
//! Both lists arrive already ordered by the server (newest first). The
//! client renders them as-is: no sorting, merging or deduplication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validate::{require_non_empty, require_non_negative, Validate};
use super::Pence;

/// Envelope of the list endpoints: `{ "items": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
}

impl<T: Validate> Validate for Page<T> {
    fn validate(&self) -> Result<(), String> {
        self.items.validate()
    }
}

/// Declares a server status enum that keeps unknown values verbatim.
macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// A value this client does not know about yet
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Other(s) => s.as_str(),
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $($wire => $name::$variant,)+
                    _ => $name::Other(value),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(s) => s,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

status_enum! {
    /// What kind of referral activity earned the conversion.
    EventType {
        Signup => "SIGNUP",
        Payment => "PAYMENT",
    }
}

status_enum! {
    ConversionStatus {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
    }
}

status_enum! {
    PayoutStatus {
        Pending => "PENDING",
        Processing => "PROCESSING",
        Completed => "COMPLETED",
        Failed => "FAILED",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversion {
    pub id: String,
    pub event_type: EventType,
    pub amount_pence: Pence,
    pub commission_pence: Pence,
    pub status: ConversionStatus,
    pub created_at: DateTime<Utc>,
}

impl Validate for Conversion {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)?;
        require_non_negative("amount_pence", self.amount_pence.0)?;
        require_non_negative("commission_pence", self.commission_pence.0)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    pub id: String,
    pub amount_pence: Pence,
    pub method: String,
    pub status: PayoutStatus,
    pub created_at: DateTime<Utc>,
}

impl Validate for Payout {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("id", &self.id)?;
        require_non_negative("amount_pence", self.amount_pence.0)?;
        Ok(())
    }
}
