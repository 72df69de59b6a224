use crate::domain::book::{Book, BookCategory, BookId, CategoryId};
use crate::domain::order::{Order, OrderId};
use crate::domain::ports::{
    BookStore, CategoryStore, Notifier, OrderStore, Stores, UserStore,
};
use crate::domain::user::{User, UserId};
use crate::error::{LibraryError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory stores backed by `Arc<RwLock<HashMap>>`.
///
/// Ids are allocated from a shared counter per store, starting at 1. Ideal
/// for tests and for replays where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    next_id: Arc<AtomicU32>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, mut user: User) -> Result<User> {
        user.id = UserId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.users.write().await.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn update(&self, user: User) -> Result<()> {
        self.users.write().await.insert(user.id, user);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<User>> {
        Ok(self.users.read().await.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryBookStore {
    books: Arc<RwLock<HashMap<BookId, Book>>>,
    next_id: Arc<AtomicU32>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn create(&self, mut book: Book) -> Result<Book> {
        book.id = BookId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.books.write().await.insert(book.id, book.clone());
        Ok(book)
    }

    async fn get(&self, id: BookId) -> Result<Option<Book>> {
        Ok(self.books.read().await.get(&id).cloned())
    }

    async fn update(&self, book: Book) -> Result<()> {
        self.books.write().await.insert(book.id, book);
        Ok(())
    }

    async fn delete(&self, id: BookId) -> Result<bool> {
        Ok(self.books.write().await.remove(&id).is_some())
    }

    async fn all(&self) -> Result<Vec<Book>> {
        Ok(self.books.read().await.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    next_id: Arc<AtomicU32>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, mut order: Order) -> Result<Order> {
        order.id = OrderId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.orders.write().await.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn update(&self, order: Order) -> Result<()> {
        self.orders.write().await.insert(order.id, order);
        Ok(())
    }

    async fn open_count_for_user(&self, user: UserId) -> Result<u32> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|order| order.user_id == user && order.is_open())
            .count() as u32)
    }

    async fn open_for_pair(&self, user: UserId, book: BookId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|order| order.user_id == user && order.book_id == book && order.is_open())
            .cloned()
            .collect())
    }

    async fn open_orders(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.values().filter(|order| order.is_open()).cloned().collect())
    }

    async fn for_user(&self, user: UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|order| order.user_id == user)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryCategoryStore {
    categories: Arc<RwLock<HashMap<CategoryId, BookCategory>>>,
    next_id: Arc<AtomicU32>,
}

impl InMemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryStore for InMemoryCategoryStore {
    async fn create(&self, mut category: BookCategory) -> Result<BookCategory> {
        category.id = CategoryId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.categories
            .write()
            .await
            .insert(category.id, category.clone());
        Ok(category)
    }

    async fn exists(&self, category: &str, sub_category: &str) -> Result<bool> {
        let categories = self.categories.read().await;
        Ok(categories
            .values()
            .any(|c| c.category == category && c.sub_category == sub_category))
    }

    async fn all(&self) -> Result<Vec<BookCategory>> {
        Ok(self.categories.read().await.values().cloned().collect())
    }
}

/// A fresh set of in-memory stores for engine construction.
pub fn stores() -> Stores {
    Stores {
        users: Box::new(InMemoryUserStore::new()),
        books: Box::new(InMemoryBookStore::new()),
        orders: Box::new(InMemoryOrderStore::new()),
        categories: Box::new(InMemoryCategoryStore::new()),
    }
}

/// A message captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Captures dispatched messages instead of delivering them. Can be switched
/// into a failing mode to exercise fire-and-forget handling.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<SentMessage>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(LibraryError::Notify(format!(
                "recording notifier set to fail (to {recipient})"
            )));
        }
        self.sent.write().await.push(SentMessage {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{Role, Standing};
    use chrono::Utc;

    fn user(email: &str) -> User {
        User {
            id: UserId(0),
            first_name: "Alice".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            mobile_number: "555-0100".to_string(),
            role: Role::Student,
            standing: Standing::Unapproved,
            created_on: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_user_store_assigns_sequential_ids() {
        let store = InMemoryUserStore::new();
        let first = store.create(user("a@example.com")).await.unwrap();
        let second = store.create(user("b@example.com")).await.unwrap();
        assert_eq!(first.id, UserId(1));
        assert_eq!(second.id, UserId(2));

        let found = store.find_by_email("b@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, second.id);
        assert!(store.find_by_email("c@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_order_store_open_queries() {
        let store = InMemoryOrderStore::new();
        let now = Utc::now();
        let open = store
            .create(Order::open(UserId(1), BookId(1), now))
            .await
            .unwrap();
        let mut settled = store
            .create(Order::open(UserId(1), BookId(2), now))
            .await
            .unwrap();
        settled.settle(now, crate::domain::fine::Fine::ZERO);
        store.update(settled).await.unwrap();
        store
            .create(Order::open(UserId(2), BookId(3), now))
            .await
            .unwrap();

        assert_eq!(store.open_count_for_user(UserId(1)).await.unwrap(), 1);
        assert_eq!(store.open_orders().await.unwrap().len(), 2);
        assert_eq!(
            store.open_for_pair(UserId(1), BookId(1)).await.unwrap()[0].id,
            open.id
        );
        assert!(store
            .open_for_pair(UserId(1), BookId(2))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(store.for_user(UserId(1)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_recording_notifier_captures_and_fails() {
        let notifier = RecordingNotifier::new();
        notifier.notify("a@example.com", "Subject", "Body").await.unwrap();
        assert_eq!(notifier.sent().await.len(), 1);

        notifier.set_failing(true);
        assert!(notifier.notify("a@example.com", "Subject", "Body").await.is_err());
        assert_eq!(notifier.sent().await.len(), 1);
    }
}
