use crate::application::engine::LibraryEngine;
use crate::application::notify;
use crate::domain::fine::{self, FineTier};
use crate::domain::user::UserId;
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeSet;

/// What one sweep pass did.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SweepReport {
    pub orders_swept: usize,
    pub notices_sent: usize,
    pub users_blocked: Vec<UserId>,
}

impl LibraryEngine {
    /// One pass over all open orders: recompute each fine, notify users whose
    /// order entered a new tier, and block users with any critical-tier
    /// order.
    ///
    /// Safe to re-run: fines and notified tiers only move forward, so a sweep
    /// with no elapsed time changes nothing and sends nothing.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let now = self.clock.now();
        let mut report = SweepReport::default();
        let mut critical: BTreeSet<UserId> = BTreeSet::new();

        for stale in self.order_store.open_orders().await? {
            let _guard = self.locks.acquire(stale.user_id).await;

            // Re-read under the lock; the order may have been settled since
            // the scan, and its fine must not be overwritten after return.
            let Some(order) = self.order_store.get(stale.id).await? else {
                continue;
            };
            if !order.is_open() {
                continue;
            }
            report.orders_swept += 1;

            let accrued = fine::accrue(order.order_date, now, &self.config.fines);
            // Never written back smaller.
            let amount = accrued.max(order.fine_paid);
            let tier = FineTier::classify(amount, &self.config.fines);

            let mut updated = order.clone();
            updated.fine_paid = amount;

            if tier > updated.notified_tier {
                match self.user_store.get(order.user_id).await? {
                    Some(user) => {
                        let title = self
                            .book_store
                            .get(order.book_id)
                            .await?
                            .map(|book| book.title)
                            .unwrap_or_else(|| format!("#{}", order.book_id));
                        if let Some(notice) = notify::overdue_notice(
                            tier,
                            &user,
                            &title,
                            amount,
                            self.config.fines.daily_fine,
                        ) {
                            if self.dispatch(&user.email, notice).await {
                                report.notices_sent += 1;
                            }
                        }
                    }
                    None => {
                        tracing::warn!(
                            user = %order.user_id,
                            order = %order.id,
                            "open order references unknown user; notice skipped"
                        );
                    }
                }
                updated.notified_tier = tier;
            }

            if updated != order {
                self.order_store.update(updated).await?;
            }
            if tier == FineTier::Critical {
                critical.insert(order.user_id);
            }
        }

        for user_id in critical {
            if self.block_for_fines(user_id).await? {
                report.users_blocked.push(user_id);
            }
        }

        tracing::info!(
            orders = report.orders_swept,
            notices = report.notices_sent,
            blocked = report.users_blocked.len(),
            "sweep complete"
        );
        Ok(report)
    }
}
