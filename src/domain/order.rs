use crate::domain::book::BookId;
use crate::domain::fine::{Fine, FineTier};
use crate::domain::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct OrderId(pub u32);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A loan record. Open (`returned == false`) until settled by a return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub order_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub returned: bool,
    /// Accrued while open, frozen at the settlement amount on return.
    pub fine_paid: Fine,
    /// Highest tier a notice has been dispatched for; repeat sweeps only
    /// notify when the tier rises above this.
    #[serde(default)]
    pub notified_tier: FineTier,
}

impl Order {
    /// A fresh open order. The id is assigned by the store on create.
    pub fn open(user_id: UserId, book_id: BookId, order_date: DateTime<Utc>) -> Self {
        Self {
            id: OrderId(0),
            user_id,
            book_id,
            order_date,
            return_date: None,
            returned: false,
            fine_paid: Fine::ZERO,
            notified_tier: FineTier::None,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.returned
    }

    /// Finalizes the order: freezes the fine at the caller-supplied
    /// settlement amount and records the return instant.
    pub fn settle(&mut self, returned_at: DateTime<Utc>, settled_fine: Fine) {
        self.returned = true;
        self.return_date = Some(returned_at);
        self.fine_paid = settled_fine;
    }
}
