use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::evaluator::{self, Decision, SwapKind, SwapPlan};
use crate::adapters::{PoolResolver, PriceQuoter, SwapExecutor};
use crate::config::EngineConfig;
use crate::domain::LimitOrder;
use crate::error::{Result, TondealError};
use crate::signing::{Sender, Wallet};
use crate::store::OrderStore;

/// Terminal outcome of one order within one cycle. Anything but `Fulfilled`
/// leaves the order pending for the next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderOutcome {
    Fulfilled,
    Held,
    Failed,
    /// Cycle deadline passed before this order started
    Deferred,
    /// Another cycle is still working on this order
    InFlight,
}

/// What one cycle did, for logs and monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub users: usize,
    pub users_skipped: usize,
    pub orders_loaded: usize,
    pub fulfilled: usize,
    pub held: usize,
    pub failed: usize,
    pub deferred: usize,
    pub in_flight_skips: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: OrderOutcome) {
        match outcome {
            OrderOutcome::Fulfilled => self.fulfilled += 1,
            OrderOutcome::Held => self.held += 1,
            OrderOutcome::Failed => self.failed += 1,
            OrderOutcome::Deferred => self.deferred += 1,
            OrderOutcome::InFlight => self.in_flight_skips += 1,
        }
    }
}

impl std::fmt::Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} users ({} skipped), {} orders: {} fulfilled, {} held, {} failed, {} deferred, {} in flight",
            self.users,
            self.users_skipped,
            self.orders_loaded,
            self.fulfilled,
            self.held,
            self.failed,
            self.deferred,
            self.in_flight_skips,
        )
    }
}

/// Removes the in-flight marker when an evaluation finishes, however it
/// finishes.
struct InFlightGuard {
    markers: Arc<DashMap<Uuid, ()>>,
    order_id: Uuid,
}

impl InFlightGuard {
    fn try_mark(markers: &Arc<DashMap<Uuid, ()>>, order_id: Uuid) -> Option<Self> {
        match markers.entry(order_id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(Self {
                    markers: Arc::clone(markers),
                    order_id,
                })
            }
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.markers.remove(&self.order_id);
    }
}

/// The cycle driver: loads every user's pending orders, evaluates each one
/// against a fresh quote and executes fulfilments.
///
/// Orders are causally unrelated, so they run concurrently under a bounded
/// semaphore; the only serialization is per signing key, because two
/// submissions from one wallet must not race on sequence numbers. A cycle
/// ends when every spawned evaluation has finished (completion barrier) and
/// reports its outcomes.
pub struct ExecutionEngine {
    store: Arc<dyn OrderStore>,
    pools: Arc<dyn PoolResolver>,
    oracle: Arc<dyn PriceQuoter>,
    swaps: Arc<dyn SwapExecutor>,
    config: EngineConfig,
    /// Orders currently being evaluated, shared across overlapping cycles
    in_flight: Arc<DashMap<Uuid, ()>>,
    /// Per-signing-key submission locks. Engine state, not cycle state, so
    /// two overlapping cycles cannot submit from one wallet concurrently.
    submit_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl ExecutionEngine {
    pub fn new(
        store: Arc<dyn OrderStore>,
        pools: Arc<dyn PoolResolver>,
        oracle: Arc<dyn PriceQuoter>,
        swaps: Arc<dyn SwapExecutor>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            pools,
            oracle,
            swaps,
            config,
            in_flight: Arc::new(DashMap::new()),
            submit_locks: Arc::new(DashMap::new()),
        }
    }

    /// Run one full pass over all users' pending orders.
    ///
    /// Only a failed user listing aborts the cycle; every other failure is
    /// contained to its order or user and retried next cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let started = Instant::now();
        let deadline = started + self.config.cycle_deadline();

        let users = self.store.list_users_with_orders().await?;

        let mut report = CycleReport {
            users: users.len(),
            ..CycleReport::default()
        };

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut tasks: JoinSet<OrderOutcome> = JoinSet::new();

        for user in users {
            report.orders_loaded += user.orders.len();

            let wallet = match Wallet::from_material(user.secret_key.clone(), &user.wallet_address)
            {
                Ok(wallet) => wallet,
                Err(e) => {
                    warn!(
                        telegram_id = %user.telegram_id,
                        orders = user.orders.len(),
                        error = %e,
                        "cannot reconstruct signing capability, skipping user this cycle"
                    );
                    report.users_skipped += 1;
                    continue;
                }
            };

            // One submission at a time per signing key
            let submit_lock = self
                .submit_locks
                .entry(user.telegram_id.clone())
                .or_default()
                .clone();

            for order in &user.orders {
                let task = OrderTask {
                    store: Arc::clone(&self.store),
                    pools: Arc::clone(&self.pools),
                    oracle: Arc::clone(&self.oracle),
                    swaps: Arc::clone(&self.swaps),
                    in_flight: Arc::clone(&self.in_flight),
                    semaphore: Arc::clone(&semaphore),
                    submit_lock: Arc::clone(&submit_lock),
                    sender: wallet.sender(),
                    telegram_id: user.telegram_id.clone(),
                    order: order.clone(),
                    deadline,
                };
                tasks.spawn(task.run());
            }
        }

        // Completion barrier: the cycle ends only once every spawned
        // evaluation has finished
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    error!(error = %e, "order evaluation task panicked");
                    report.failed += 1;
                }
            }
        }

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            %report,
            "cycle finished"
        );
        Ok(report)
    }
}

/// Everything one order evaluation needs, owned so it can move into a task
struct OrderTask {
    store: Arc<dyn OrderStore>,
    pools: Arc<dyn PoolResolver>,
    oracle: Arc<dyn PriceQuoter>,
    swaps: Arc<dyn SwapExecutor>,
    in_flight: Arc<DashMap<Uuid, ()>>,
    semaphore: Arc<Semaphore>,
    submit_lock: Arc<Mutex<()>>,
    sender: Sender,
    telegram_id: String,
    order: LimitOrder,
    deadline: Instant,
}

impl OrderTask {
    async fn run(self) -> OrderOutcome {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => return OrderOutcome::Deferred,
        };

        // Orders that could not start before the deadline wait for the next
        // cycle; nothing is aborted mid-pipeline.
        if Instant::now() >= self.deadline {
            debug!(order_id = %self.order.id, "cycle deadline passed, deferring order");
            return OrderOutcome::Deferred;
        }

        let Some(_guard) = InFlightGuard::try_mark(&self.in_flight, self.order.id) else {
            debug!(order_id = %self.order.id, "order already being evaluated, skipping");
            return OrderOutcome::InFlight;
        };

        match self.evaluate_and_execute().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    order_id = %self.order.id,
                    telegram_id = %self.telegram_id,
                    pair = %self.order.pair,
                    is_buy = self.order.is_buy,
                    amount = %self.order.amount,
                    error = %e,
                    "order evaluation failed, order stays pending"
                );
                OrderOutcome::Failed
            }
        }
    }

    /// The per-order pipeline: resolve pool, fetch quote, decide, execute,
    /// retire. Every `?` leaves the order untouched.
    async fn evaluate_and_execute(&self) -> Result<OrderOutcome> {
        // Malformed fields are a resolution error for this order, caught
        // before any pair index is used
        self.order.validate()?;

        let pool = self
            .pools
            .get_pool(&self.order.pair)
            .await?
            .ok_or_else(|| TondealError::PoolNotFound(self.order.pair.clone()))?;

        let base = evaluator::quote_base(&self.order, &pool)?;
        let want = &pool.assets[self.order.want_index()];
        let held = &pool.assets[self.order.held_index()];
        let quote = self.oracle.get_quote(base, want, held).await?;

        let plan = match evaluator::evaluate(&self.order, &pool, &quote)? {
            Decision::Hold => {
                debug!(
                    order_id = %self.order.id,
                    pair = %self.order.pair,
                    price = %quote.price,
                    limit = %self.order.price,
                    "limit not reached, holding"
                );
                return Ok(OrderOutcome::Held);
            }
            Decision::Fulfil(plan) => plan,
        };

        let tx = self.submit_swap(&plan).await?;

        info!(
            order_id = %self.order.id,
            telegram_id = %self.telegram_id,
            pair = %self.order.pair,
            kind = ?plan.kind,
            amount = %plan.amount,
            tx_hash = %tx.tx_hash,
            "order fulfilled"
        );

        // Deletion only after a confirmed submission. A failed delete leaves
        // the order for a duplicate attempt next cycle, which is preferable
        // to silently dropping it.
        if let Err(e) = self.store.delete_order(&self.telegram_id, self.order.id).await {
            error!(
                order_id = %self.order.id,
                error = %e,
                "swap submitted but order could not be retired"
            );
        }

        Ok(OrderOutcome::Fulfilled)
    }

    async fn submit_swap(&self, plan: &SwapPlan) -> Result<crate::adapters::TxResult> {
        let missing = |side: &str| {
            TondealError::Internal(format!(
                "swap plan for order {} has no {side} address",
                self.order.id
            ))
        };

        // Serialize submissions per signing key; sequence numbers on one
        // wallet must not race.
        let _submit = self.submit_lock.lock().await;

        match plan.kind {
            SwapKind::NativeToToken => {
                let to = plan.to.address().ok_or_else(|| missing("target"))?;
                self.swaps.native_to_token(&self.sender, to, plan.amount).await
            }
            SwapKind::TokenToNative => {
                let from = plan.from.address().ok_or_else(|| missing("source"))?;
                self.swaps
                    .token_to_native(&self.sender, &self.sender.wallet_address, from, plan.amount)
                    .await
            }
            SwapKind::TokenToToken => {
                let from = plan.from.address().ok_or_else(|| missing("source"))?;
                let to = plan.to.address().ok_or_else(|| missing("target"))?;
                self.swaps
                    .token_to_token(&self.sender, &self.sender.wallet_address, from, to, plan.amount)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_marker_is_exclusive_and_released() {
        let markers = Arc::new(DashMap::new());
        let id = Uuid::new_v4();

        let guard = InFlightGuard::try_mark(&markers, id);
        assert!(guard.is_some());
        assert!(InFlightGuard::try_mark(&markers, id).is_none());

        drop(guard);
        assert!(InFlightGuard::try_mark(&markers, id).is_some());
    }

    #[test]
    fn report_tallies_outcomes() {
        let mut report = CycleReport::default();
        report.record(OrderOutcome::Fulfilled);
        report.record(OrderOutcome::Held);
        report.record(OrderOutcome::Held);
        report.record(OrderOutcome::Failed);
        report.record(OrderOutcome::Deferred);
        report.record(OrderOutcome::InFlight);

        assert_eq!(report.fulfilled, 1);
        assert_eq!(report.held, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.deferred, 1);
        assert_eq!(report.in_flight_skips, 1);
    }
}
