use crate::domain::book::{Book, BookCategory, BookId};
use crate::domain::order::{Order, OrderId};
use crate::domain::ports::{BookStore, CategoryStore, OrderStore, UserStore};
use crate::domain::user::{User, UserId};
use crate::error::{LibraryError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Column Family for users.
pub const CF_USERS: &str = "users";
/// Column Family for books.
pub const CF_BOOKS: &str = "books";
/// Column Family for orders.
pub const CF_ORDERS: &str = "orders";
/// Column Family for book categories.
pub const CF_CATEGORIES: &str = "categories";

/// A persistent store implementation using RocksDB.
///
/// One Column Family per entity, JSON values, big-endian u32 keys so the
/// natural key order matches id order (id allocation reads the last key).
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`), so
/// one handle can serve all four store ports.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// all required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_USERS, CF_BOOKS, CF_ORDERS, CF_CATEGORIES]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn handle(&self, cf: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(cf)
            .ok_or_else(|| LibraryError::Store(format!("column family {cf} not found")))
    }

    fn put<T: Serialize>(&self, cf: &str, id: u32, value: &T) -> Result<()> {
        let handle = self.handle(cf)?;
        let bytes = serde_json::to_vec(value)
            .map_err(|e| LibraryError::Store(format!("serialization error: {e}")))?;
        self.db.put_cf(&handle, id.to_be_bytes(), bytes)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, cf: &str, id: u32) -> Result<Option<T>> {
        let handle = self.handle(cf)?;
        match self.db.get_cf(&handle, id.to_be_bytes())? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| LibraryError::Store(format!("deserialization error: {e}")))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let handle = self.handle(cf)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(&handle, IteratorMode::Start) {
            let (_key, bytes) = item?;
            let value = serde_json::from_slice(&bytes)
                .map_err(|e| LibraryError::Store(format!("deserialization error: {e}")))?;
            values.push(value);
        }
        Ok(values)
    }

    /// Next fresh id for a column family: one past the largest stored key.
    fn next_id(&self, cf: &str) -> Result<u32> {
        let handle = self.handle(cf)?;
        let mut iter = self.db.iterator_cf(&handle, IteratorMode::End);
        match iter.next() {
            Some(item) => {
                let (key, _value) = item?;
                let key: [u8; 4] = key
                    .as_ref()
                    .try_into()
                    .map_err(|_| LibraryError::Store(format!("malformed key in {cf}")))?;
                Ok(u32::from_be_bytes(key) + 1)
            }
            None => Ok(1),
        }
    }
}

#[async_trait]
impl UserStore for RocksDBStore {
    async fn create(&self, mut user: User) -> Result<User> {
        user.id = UserId(self.next_id(CF_USERS)?);
        self.put(CF_USERS, user.id.0, &user)?;
        Ok(user)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>> {
        self.fetch(CF_USERS, id.0)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users: Vec<User> = self.scan(CF_USERS)?;
        Ok(users.into_iter().find(|user| user.email == email))
    }

    async fn update(&self, user: User) -> Result<()> {
        self.put(CF_USERS, user.id.0, &user)
    }

    async fn all(&self) -> Result<Vec<User>> {
        self.scan(CF_USERS)
    }
}

#[async_trait]
impl BookStore for RocksDBStore {
    async fn create(&self, mut book: Book) -> Result<Book> {
        book.id = BookId(self.next_id(CF_BOOKS)?);
        self.put(CF_BOOKS, book.id.0, &book)?;
        Ok(book)
    }

    async fn get(&self, id: BookId) -> Result<Option<Book>> {
        self.fetch(CF_BOOKS, id.0)
    }

    async fn update(&self, book: Book) -> Result<()> {
        self.put(CF_BOOKS, book.id.0, &book)
    }

    async fn delete(&self, id: BookId) -> Result<bool> {
        let handle = self.handle(CF_BOOKS)?;
        let existed = self.db.get_pinned_cf(&handle, id.0.to_be_bytes())?.is_some();
        if existed {
            self.db.delete_cf(&handle, id.0.to_be_bytes())?;
        }
        Ok(existed)
    }

    async fn all(&self) -> Result<Vec<Book>> {
        self.scan(CF_BOOKS)
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn create(&self, mut order: Order) -> Result<Order> {
        order.id = OrderId(self.next_id(CF_ORDERS)?);
        self.put(CF_ORDERS, order.id.0, &order)?;
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        self.fetch(CF_ORDERS, id.0)
    }

    async fn update(&self, order: Order) -> Result<()> {
        self.put(CF_ORDERS, order.id.0, &order)
    }

    async fn open_count_for_user(&self, user: UserId) -> Result<u32> {
        let orders: Vec<Order> = self.scan(CF_ORDERS)?;
        Ok(orders
            .iter()
            .filter(|order| order.user_id == user && order.is_open())
            .count() as u32)
    }

    async fn open_for_pair(&self, user: UserId, book: BookId) -> Result<Vec<Order>> {
        let orders: Vec<Order> = self.scan(CF_ORDERS)?;
        Ok(orders
            .into_iter()
            .filter(|order| order.user_id == user && order.book_id == book && order.is_open())
            .collect())
    }

    async fn open_orders(&self) -> Result<Vec<Order>> {
        let orders: Vec<Order> = self.scan(CF_ORDERS)?;
        Ok(orders.into_iter().filter(Order::is_open).collect())
    }

    async fn for_user(&self, user: UserId) -> Result<Vec<Order>> {
        let orders: Vec<Order> = self.scan(CF_ORDERS)?;
        Ok(orders.into_iter().filter(|order| order.user_id == user).collect())
    }
}

#[async_trait]
impl CategoryStore for RocksDBStore {
    async fn create(&self, mut category: BookCategory) -> Result<BookCategory> {
        category.id = crate::domain::book::CategoryId(self.next_id(CF_CATEGORIES)?);
        self.put(CF_CATEGORIES, category.id.0, &category)?;
        Ok(category)
    }

    async fn exists(&self, category: &str, sub_category: &str) -> Result<bool> {
        let categories: Vec<BookCategory> = self.scan(CF_CATEGORIES)?;
        Ok(categories
            .iter()
            .any(|c| c.category == category && c.sub_category == sub_category))
    }

    async fn all(&self) -> Result<Vec<BookCategory>> {
        self.scan(CF_CATEGORIES)
    }
}
