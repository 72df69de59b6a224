use crate::application::locks::UserLocks;
use crate::application::notify::{self, Notice};
use crate::config::EngineConfig;
use crate::domain::book::{Book, BookCategory, BookId, CategoryId, NewBook, NewCategory};
use crate::domain::clock::ClockRef;
use crate::domain::fine::Fine;
use crate::domain::order::{Order, OrderId};
use crate::domain::ports::{
    BookStoreBox, CategoryStoreBox, NotifierBox, OrderStoreBox, Stores, UserStoreBox,
};
use crate::domain::user::{NewUser, Role, Standing, User, UserId};
use crate::error::{LibraryError, Result};
use serde::Serialize;

/// Outcome of a registration attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    Registered(User),
    EmailTaken,
}

/// Signal the identity collaborator branches on when a login is attempted.
/// Only `Admitted` users may be issued a credential.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Admitted(User),
    Unapproved,
    Blocked,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproveOutcome {
    Approved,
    NotFound,
    NotPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnblockOutcome {
    Unblocked,
    NotFound,
    NotBlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanOutcome {
    Accepted(OrderId),
    LimitExceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnOutcome {
    Returned,
    NotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CategoryOutcome {
    Added(BookCategory),
    Duplicate,
}

/// Per-user snapshot emitted by the replay binary's final report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingSummary {
    pub user: UserId,
    pub name: String,
    pub standing: Standing,
    pub open_loans: u32,
    pub fine_due: Fine,
}

/// The main entry point for the lending engine.
///
/// `LibraryEngine` owns the storage and notification ports and enforces the
/// lending rules: the per-user loan cap, the standing state machine, and the
/// overdue sweep. Business rejections are reported as outcome enums, never as
/// errors; `Err` is reserved for dependency faults and invariant violations.
pub struct LibraryEngine {
    pub(crate) user_store: UserStoreBox,
    pub(crate) book_store: BookStoreBox,
    pub(crate) order_store: OrderStoreBox,
    pub(crate) category_store: CategoryStoreBox,
    pub(crate) notifier: NotifierBox,
    pub(crate) clock: ClockRef,
    pub(crate) config: EngineConfig,
    pub(crate) locks: UserLocks,
}

impl LibraryEngine {
    /// Creates a new engine. Fails if the configuration is invalid.
    pub fn new(
        stores: Stores,
        notifier: NotifierBox,
        clock: ClockRef,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            user_store: stores.users,
            book_store: stores.books,
            order_store: stores.orders,
            category_store: stores.categories,
            notifier,
            clock,
            config,
            locks: UserLocks::new(),
        })
    }

    /// Registers a new student account in `Unapproved` standing and sends the
    /// account-created notice.
    pub async fn register(&self, new_user: NewUser) -> Result<RegisterOutcome> {
        if self.user_store.find_by_email(&new_user.email).await?.is_some() {
            return Ok(RegisterOutcome::EmailTaken);
        }

        let user = self
            .user_store
            .create(User {
                id: UserId(0),
                first_name: new_user.first_name,
                last_name: new_user.last_name,
                email: new_user.email,
                mobile_number: new_user.mobile_number,
                role: Role::Student,
                standing: Standing::Unapproved,
                created_on: self.clock.now(),
            })
            .await?;

        self.dispatch(&user.email, notify::account_created(&user)).await;
        Ok(RegisterOutcome::Registered(user))
    }

    /// The authentication gate contract: one distinct signal per standing so
    /// the identity layer can present the right message. Credential issuance
    /// itself happens outside the engine.
    pub async fn login_gate(&self, email: &str) -> Result<GateOutcome> {
        let Some(user) = self.user_store.find_by_email(email).await? else {
            return Ok(GateOutcome::NotFound);
        };
        Ok(match user.standing {
            Standing::Unapproved => GateOutcome::Unapproved,
            Standing::Blocked => GateOutcome::Blocked,
            Standing::Active => GateOutcome::Admitted(user),
        })
    }

    /// Approves a pending registration and sends the approval notice. Fails
    /// softly (no notice) for missing or already-processed users.
    pub async fn approve(&self, id: UserId) -> Result<ApproveOutcome> {
        let Some(mut user) = self.user_store.get(id).await? else {
            return Ok(ApproveOutcome::NotFound);
        };
        if !user.approve() {
            return Ok(ApproveOutcome::NotPending);
        }
        self.user_store.update(user.clone()).await?;
        self.dispatch(&user.email, notify::account_approved(&user)).await;
        Ok(ApproveOutcome::Approved)
    }

    /// Administrative unblock; the only way out of `Blocked`.
    pub async fn unblock(&self, id: UserId) -> Result<UnblockOutcome> {
        let Some(mut user) = self.user_store.get(id).await? else {
            return Ok(UnblockOutcome::NotFound);
        };
        if !user.unblock() {
            return Ok(UnblockOutcome::NotBlocked);
        }
        self.user_store.update(user).await?;
        Ok(UnblockOutcome::Unblocked)
    }

    /// Sweep-driven block transition. Idempotent for already-blocked users.
    pub(crate) async fn block_for_fines(&self, id: UserId) -> Result<bool> {
        let Some(mut user) = self.user_store.get(id).await? else {
            return Ok(false);
        };
        if !user.block() {
            return Ok(false);
        }
        self.user_store.update(user).await?;
        Ok(true)
    }

    /// Creates an order for the book unless the user already has `loan_cap`
    /// open orders. The cap check and the insert run under the user's lock so
    /// concurrent requests cannot jointly exceed the cap.
    pub async fn request_loan(&self, user_id: UserId, book_id: BookId) -> Result<LoanOutcome> {
        let _guard = self.locks.acquire(user_id).await;

        if self.order_store.open_count_for_user(user_id).await? >= self.config.loan_cap {
            return Ok(LoanOutcome::LimitExceeded);
        }

        let order = self
            .order_store
            .create(Order::open(user_id, book_id, self.clock.now()))
            .await?;

        match self.book_store.get(book_id).await? {
            Some(mut book) => {
                book.on_loan = true;
                self.book_store.update(book).await?;
            }
            None => {
                // Permissive: the order stands even when the catalog lookup
                // misses, but the skip is operator-visible.
                tracing::warn!(
                    book = %book_id,
                    order = %order.id,
                    "loan created for unknown book; on-loan flag not set"
                );
            }
        }

        Ok(LoanOutcome::Accepted(order.id))
    }

    /// Settles the unique open order for the (user, book) pair. A second
    /// return of the same pair reports `NotFound`. More than one open order
    /// for the pair is an upstream invariant violation and comes back as
    /// `LibraryError::Consistency`.
    pub async fn return_loan(
        &self,
        user_id: UserId,
        book_id: BookId,
        settled_fine: Fine,
    ) -> Result<ReturnOutcome> {
        let _guard = self.locks.acquire(user_id).await;

        let mut open = self.order_store.open_for_pair(user_id, book_id).await?;
        if open.len() > 1 {
            return Err(LibraryError::Consistency(format!(
                "{} open orders for user {user_id} and book {book_id}",
                open.len()
            )));
        }
        let Some(mut order) = open.pop() else {
            return Ok(ReturnOutcome::NotFound);
        };

        order.settle(self.clock.now(), settled_fine);
        self.order_store.update(order).await?;

        if let Some(mut book) = self.book_store.get(book_id).await? {
            book.on_loan = false;
            self.book_store.update(book).await?;
        }

        Ok(ReturnOutcome::Returned)
    }

    pub async fn add_book(&self, book: NewBook) -> Result<Book> {
        self.book_store
            .create(Book {
                id: BookId(0),
                title: book.title,
                category: book.category,
                on_loan: false,
            })
            .await
    }

    pub async fn delete_book(&self, id: BookId) -> Result<bool> {
        self.book_store.delete(id).await
    }

    pub async fn books(&self) -> Result<Vec<Book>> {
        self.book_store.all().await
    }

    pub async fn add_category(&self, category: NewCategory) -> Result<CategoryOutcome> {
        if self
            .category_store
            .exists(&category.category, &category.sub_category)
            .await?
        {
            return Ok(CategoryOutcome::Duplicate);
        }
        let added = self
            .category_store
            .create(BookCategory {
                id: CategoryId(0),
                category: category.category,
                sub_category: category.sub_category,
            })
            .await?;
        Ok(CategoryOutcome::Added(added))
    }

    pub async fn categories(&self) -> Result<Vec<BookCategory>> {
        self.category_store.all().await
    }

    pub async fn users(&self) -> Result<Vec<User>> {
        self.user_store.all().await
    }

    pub async fn orders_for_user(&self, user: UserId) -> Result<Vec<Order>> {
        self.order_store.for_user(user).await
    }

    /// Per-user snapshot of standing, open loans and fines currently due,
    /// sorted by user id.
    pub async fn standings(&self) -> Result<Vec<StandingSummary>> {
        let mut users = self.user_store.all().await?;
        users.sort_by_key(|user| user.id);

        let mut rows = Vec::with_capacity(users.len());
        for user in users {
            let orders = self.order_store.for_user(user.id).await?;
            let mut open_loans = 0;
            let mut fine_due = Fine::ZERO;
            for order in orders.iter().filter(|order| order.is_open()) {
                open_loans += 1;
                fine_due += order.fine_paid;
            }
            rows.push(StandingSummary {
                user: user.id,
                name: user.full_name(),
                standing: user.standing,
                open_loans,
                fine_due,
            });
        }
        Ok(rows)
    }

    /// Fire-and-forget dispatch: a failed send is logged for the operator but
    /// never rolls back the state transition that triggered it.
    pub(crate) async fn dispatch(&self, recipient: &str, notice: Notice) -> bool {
        match self.notifier.notify(recipient, notice.subject, &notice.body).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(recipient, subject = notice.subject, %err, "notification dispatch failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::{Clock, ManualClock};
    use crate::infrastructure::in_memory::{self, RecordingNotifier};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Alice".to_string(),
            last_name: "Doe".to_string(),
            email: email.to_string(),
            mobile_number: "555-0100".to_string(),
        }
    }

    fn engine_with_notifier() -> (LibraryEngine, RecordingNotifier, Arc<ManualClock>) {
        let notifier = RecordingNotifier::new();
        let clock = Arc::new(ManualClock::starting_at(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let engine = LibraryEngine::new(
            in_memory::stores(),
            Box::new(notifier.clone()),
            clock.clone(),
            EngineConfig::default(),
        )
        .unwrap();
        (engine, notifier, clock)
    }

    #[tokio::test]
    async fn test_register_approve_login_flow() {
        let (engine, notifier, _clock) = engine_with_notifier();

        let RegisterOutcome::Registered(user) =
            engine.register(new_user("alice@example.com")).await.unwrap()
        else {
            panic!("registration rejected");
        };
        assert_eq!(user.standing, Standing::Unapproved);
        assert_eq!(user.role, Role::Student);

        // Unapproved users cannot pass the gate.
        assert_eq!(
            engine.login_gate("alice@example.com").await.unwrap(),
            GateOutcome::Unapproved
        );

        assert_eq!(
            engine.approve(user.id).await.unwrap(),
            ApproveOutcome::Approved
        );
        assert!(matches!(
            engine.login_gate("alice@example.com").await.unwrap(),
            GateOutcome::Admitted(_)
        ));

        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].subject, notify::ACCOUNT_CREATED);
        assert_eq!(sent[1].subject, notify::ACCOUNT_APPROVED);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (engine, _notifier, _clock) = engine_with_notifier();

        engine.register(new_user("alice@example.com")).await.unwrap();
        assert_eq!(
            engine.register(new_user("alice@example.com")).await.unwrap(),
            RegisterOutcome::EmailTaken
        );
    }

    #[tokio::test]
    async fn test_approve_is_a_one_way_gate() {
        let (engine, notifier, _clock) = engine_with_notifier();

        let RegisterOutcome::Registered(user) =
            engine.register(new_user("alice@example.com")).await.unwrap()
        else {
            panic!("registration rejected");
        };
        engine.approve(user.id).await.unwrap();
        let sent_before = notifier.sent().await.len();

        // Second approval reports failure and sends nothing.
        assert_eq!(
            engine.approve(user.id).await.unwrap(),
            ApproveOutcome::NotPending
        );
        assert_eq!(
            engine.approve(UserId(999)).await.unwrap(),
            ApproveOutcome::NotFound
        );
        assert_eq!(notifier.sent().await.len(), sent_before);
    }

    #[tokio::test]
    async fn test_unblock_refused_unless_blocked() {
        let (engine, _notifier, _clock) = engine_with_notifier();

        let RegisterOutcome::Registered(user) =
            engine.register(new_user("alice@example.com")).await.unwrap()
        else {
            panic!("registration rejected");
        };
        assert_eq!(
            engine.unblock(user.id).await.unwrap(),
            UnblockOutcome::NotBlocked
        );
        assert_eq!(
            engine.unblock(UserId(999)).await.unwrap(),
            UnblockOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_loan_cap_enforced() {
        let (engine, _notifier, _clock) = engine_with_notifier();

        for book in 1..=3u32 {
            assert!(matches!(
                engine.request_loan(UserId(1), BookId(book)).await.unwrap(),
                LoanOutcome::Accepted(_)
            ));
        }
        assert_eq!(
            engine.request_loan(UserId(1), BookId(4)).await.unwrap(),
            LoanOutcome::LimitExceeded
        );

        // Returning one frees a slot and the same request succeeds.
        assert_eq!(
            engine
                .return_loan(UserId(1), BookId(2), Fine::ZERO)
                .await
                .unwrap(),
            ReturnOutcome::Returned
        );
        assert!(matches!(
            engine.request_loan(UserId(1), BookId(4)).await.unwrap(),
            LoanOutcome::Accepted(_)
        ));
    }

    #[tokio::test]
    async fn test_loan_sets_and_return_clears_on_loan_flag() {
        let (engine, _notifier, _clock) = engine_with_notifier();

        let book = engine
            .add_book(NewBook {
                title: "Dune".to_string(),
                category: None,
            })
            .await
            .unwrap();
        assert!(!book.on_loan);

        engine.request_loan(UserId(1), book.id).await.unwrap();
        let books = engine.books().await.unwrap();
        assert!(books.iter().find(|b| b.id == book.id).unwrap().on_loan);

        engine
            .return_loan(UserId(1), book.id, Fine::ZERO)
            .await
            .unwrap();
        let books = engine.books().await.unwrap();
        assert!(!books.iter().find(|b| b.id == book.id).unwrap().on_loan);
    }

    #[tokio::test]
    async fn test_return_is_idempotent_safe() {
        let (engine, _notifier, clock) = engine_with_notifier();

        engine.request_loan(UserId(1), BookId(1)).await.unwrap();
        clock.advance(chrono::Duration::days(3));

        assert_eq!(
            engine
                .return_loan(UserId(1), BookId(1), Fine(dec!(0)))
                .await
                .unwrap(),
            ReturnOutcome::Returned
        );
        assert_eq!(
            engine
                .return_loan(UserId(1), BookId(1), Fine(dec!(0)))
                .await
                .unwrap(),
            ReturnOutcome::NotFound
        );

        let orders = engine.orders_for_user(UserId(1)).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert!(!orders[0].is_open());
        assert_eq!(orders[0].return_date, Some(clock.now()));
    }

    #[tokio::test]
    async fn test_return_settles_at_caller_supplied_fine() {
        let (engine, _notifier, _clock) = engine_with_notifier();

        engine.request_loan(UserId(1), BookId(1)).await.unwrap();
        engine
            .return_loan(UserId(1), BookId(1), Fine(dec!(250)))
            .await
            .unwrap();

        let orders = engine.orders_for_user(UserId(1)).await.unwrap();
        assert_eq!(orders[0].fine_paid, Fine(dec!(250)));
    }

    #[tokio::test]
    async fn test_duplicate_open_pair_is_a_consistency_violation() {
        let notifier = RecordingNotifier::new();
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let stores = in_memory::stores();
        // Seed two open orders for the same pair behind the engine's back.
        stores
            .orders
            .create(Order::open(UserId(1), BookId(1), clock.now()))
            .await
            .unwrap();
        stores
            .orders
            .create(Order::open(UserId(1), BookId(1), clock.now()))
            .await
            .unwrap();

        let engine = LibraryEngine::new(
            stores,
            Box::new(notifier),
            clock,
            EngineConfig::default(),
        )
        .unwrap();

        assert!(matches!(
            engine.return_loan(UserId(1), BookId(1), Fine::ZERO).await,
            Err(LibraryError::Consistency(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_book() {
        let (engine, _notifier, _clock) = engine_with_notifier();

        let book = engine
            .add_book(NewBook {
                title: "Dune".to_string(),
                category: None,
            })
            .await
            .unwrap();
        assert!(engine.delete_book(book.id).await.unwrap());
        assert!(!engine.delete_book(book.id).await.unwrap());
        assert!(engine.books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_category_rejected() {
        let (engine, _notifier, _clock) = engine_with_notifier();

        let outcome = engine
            .add_category(NewCategory {
                category: "Fiction".to_string(),
                sub_category: "Sci-Fi".to_string(),
            })
            .await
            .unwrap();
        assert!(matches!(outcome, CategoryOutcome::Added(_)));

        let outcome = engine
            .add_category(NewCategory {
                category: "Fiction".to_string(),
                sub_category: "Sci-Fi".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(outcome, CategoryOutcome::Duplicate);
        assert_eq!(engine.categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_registration_survives_notifier_failure() {
        let notifier = RecordingNotifier::new();
        notifier.set_failing(true);
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));
        let engine = LibraryEngine::new(
            in_memory::stores(),
            Box::new(notifier.clone()),
            clock,
            EngineConfig::default(),
        )
        .unwrap();

        let outcome = engine.register(new_user("alice@example.com")).await.unwrap();
        assert!(matches!(outcome, RegisterOutcome::Registered(_)));
        assert!(notifier.sent().await.is_empty());
    }
}
