use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BookId(pub u32);

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CategoryId(pub u32);

/// A catalog entry. `on_loan` mirrors "this book has an open order".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub category: Option<CategoryId>,
    pub on_loan: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub category: Option<CategoryId>,
}

/// Reference data; unique on the (category, sub_category) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookCategory {
    pub id: CategoryId,
    pub category: String,
    pub sub_category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCategory {
    pub category: String,
    pub sub_category: String,
}
