use super::book::{Book, BookCategory, BookId};
use super::order::{Order, OrderId};
use super::user::{User, UserId};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new user, assigning a fresh id; the id on the input record
    /// is ignored.
    async fn create(&self, user: User) -> Result<User>;
    async fn get(&self, id: UserId) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn update(&self, user: User) -> Result<()>;
    async fn all(&self) -> Result<Vec<User>>;
}

#[async_trait]
pub trait BookStore: Send + Sync {
    /// Persists a new book, assigning a fresh id.
    async fn create(&self, book: Book) -> Result<Book>;
    async fn get(&self, id: BookId) -> Result<Option<Book>>;
    async fn update(&self, book: Book) -> Result<()>;
    /// Returns false if no such book existed.
    async fn delete(&self, id: BookId) -> Result<bool>;
    async fn all(&self) -> Result<Vec<Book>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order, assigning a fresh id.
    async fn create(&self, order: Order) -> Result<Order>;
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;
    async fn update(&self, order: Order) -> Result<()>;
    /// Number of this user's orders not yet returned.
    async fn open_count_for_user(&self, user: UserId) -> Result<u32>;
    /// Open orders for a (user, book) pair. More than one element means the
    /// loan cap invariant was violated upstream.
    async fn open_for_pair(&self, user: UserId, book: BookId) -> Result<Vec<Order>>;
    /// All orders not yet returned.
    async fn open_orders(&self) -> Result<Vec<Order>>;
    async fn for_user(&self, user: UserId) -> Result<Vec<Order>>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Persists a new category, assigning a fresh id.
    async fn create(&self, category: BookCategory) -> Result<BookCategory>;
    /// Uniqueness probe on the (category, sub_category) pair.
    async fn exists(&self, category: &str, sub_category: &str) -> Result<bool>;
    async fn all(&self) -> Result<Vec<BookCategory>>;
}

/// Outbound notification sink. The engine composes complete messages;
/// transport is the implementor's concern.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

pub type UserStoreBox = Box<dyn UserStore>;
pub type BookStoreBox = Box<dyn BookStore>;
pub type OrderStoreBox = Box<dyn OrderStore>;
pub type CategoryStoreBox = Box<dyn CategoryStore>;
pub type NotifierBox = Box<dyn Notifier>;

/// The full set of storage ports the engine is constructed with.
pub struct Stores {
    pub users: UserStoreBox,
    pub books: BookStoreBox,
    pub orders: OrderStoreBox,
    pub categories: CategoryStoreBox,
}
