//! Kitchen service: one actor-scoped request per call.
//!
//! Each operation loads the actor's state from the stores, runs one domain
//! operation in memory, then writes back only what changed. Domain validation
//! always completes before the first store write.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use galley_core::{ActorId, DomainError, Entity};
use galley_inventory::{
    InventoryItem, InventoryItemId, NewInventoryItem, StockLedger, WasteItem, WasteItemId,
};
use galley_ordering::{
    LineRequest, Order, OrderId, OrderLineId, OrderLineItem, PendingOrder, SuggestedItem,
    compute_suggestions,
};
use galley_prep::{AppliedProduction, NewPrepItem, PrepItem, PrepItemId};

use crate::config::KitchenConfig;
use crate::error::{KitchenError, KitchenResult};
use crate::store::{ActorStore, InMemoryActorStore};

/// One store per collection.
#[derive(Clone)]
pub struct KitchenStores {
    pub inventory: Arc<dyn ActorStore<InventoryItemId, InventoryItem>>,
    pub prep: Arc<dyn ActorStore<PrepItemId, PrepItem>>,
    pub pending: Arc<dyn ActorStore<OrderLineId, OrderLineItem>>,
    pub orders: Arc<dyn ActorStore<OrderId, Order>>,
    pub waste: Arc<dyn ActorStore<WasteItemId, WasteItem>>,
}

impl KitchenStores {
    pub fn in_memory() -> Self {
        Self {
            inventory: Arc::new(InMemoryActorStore::new()),
            prep: Arc::new(InMemoryActorStore::new()),
            pending: Arc::new(InMemoryActorStore::new()),
            orders: Arc::new(InMemoryActorStore::new()),
            waste: Arc::new(InMemoryActorStore::new()),
        }
    }
}

/// Request handler for the reconciliation engine.
#[derive(Clone)]
pub struct Kitchen {
    stores: KitchenStores,
    config: KitchenConfig,
}

impl Kitchen {
    pub fn new(stores: KitchenStores, config: KitchenConfig) -> Self {
        Self { stores, config }
    }

    pub fn in_memory() -> Self {
        Self::new(KitchenStores::in_memory(), KitchenConfig::default())
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Inventory
    // ---------------------------------------------------------------------

    pub fn register_inventory_item(
        &self,
        actor: ActorId,
        new: NewInventoryItem,
    ) -> KitchenResult<InventoryItem> {
        self.run("register_inventory_item", actor, || {
            let item = InventoryItem::new(new)?;
            let id = item.id_typed();
            if self.stores.inventory.get(actor, &id)?.is_some() {
                return Err(DomainError::validation(format!("inventory item {id} already exists")).into());
            }
            self.stores.inventory.upsert(actor, id, item.clone())?;
            info!(actor_id = %actor, item_id = %id, name = item.name(), "inventory item registered");
            Ok(item)
        })
    }

    pub fn inventory_item(&self, actor: ActorId, id: InventoryItemId) -> KitchenResult<InventoryItem> {
        self.stores
            .inventory
            .get(actor, &id)?
            .ok_or_else(|| DomainError::not_found(format!("inventory item {id}")).into())
    }

    /// Every inventory item, ordered by case-folded name.
    pub fn inventory(&self, actor: ActorId) -> KitchenResult<Vec<InventoryItem>> {
        let mut items = self.stores.inventory.list(actor)?;
        items.sort_by(|a, b| {
            a.name()
                .to_lowercase()
                .cmp(&b.name().to_lowercase())
                .then_with(|| a.id_typed().cmp(&b.id_typed()))
        });
        Ok(items)
    }

    /// Add `delta` to an item's stock (deliveries, corrections).
    pub fn adjust_inventory_stock(
        &self,
        actor: ActorId,
        id: InventoryItemId,
        delta: Decimal,
    ) -> KitchenResult<Decimal> {
        self.run("adjust_inventory_stock", actor, || {
            let mut ledger = self.load_ledger(actor)?;
            let stock = ledger.apply_delta(id, delta)?;
            self.persist_ledger(actor, &mut ledger)?;
            info!(actor_id = %actor, item_id = %id, %delta, %stock, "inventory stock adjusted");
            Ok(stock)
        })
    }

    /// Overwrite an item's stock with a counted value.
    pub fn set_inventory_stock(
        &self,
        actor: ActorId,
        id: InventoryItemId,
        value: Decimal,
    ) -> KitchenResult<Decimal> {
        self.run("set_inventory_stock", actor, || {
            let mut ledger = self.load_ledger(actor)?;
            let stock = ledger.set_stock(id, value)?;
            self.persist_ledger(actor, &mut ledger)?;
            info!(actor_id = %actor, item_id = %id, %stock, "inventory stock counted");
            Ok(stock)
        })
    }

    /// Record the price last paid for an item. Completed orders are unaffected.
    pub fn record_purchase_price(
        &self,
        actor: ActorId,
        id: InventoryItemId,
        price: Decimal,
    ) -> KitchenResult<InventoryItem> {
        self.run("record_purchase_price", actor, || {
            let mut item = self.inventory_item(actor, id)?;
            item.set_last_price(price)?;
            self.stores.inventory.upsert(actor, id, item.clone())?;
            info!(actor_id = %actor, item_id = %id, %price, "purchase price recorded");
            Ok(item)
        })
    }

    // ---------------------------------------------------------------------
    // Suggestions and the pending order
    // ---------------------------------------------------------------------

    pub fn suggestions(&self, actor: ActorId) -> KitchenResult<Vec<SuggestedItem>> {
        let ledger = self.load_ledger(actor)?;
        Ok(compute_suggestions(ledger.items()))
    }

    /// The pending order as stored, with duplicate lines for one item shown
    /// merged. Nothing is written; the next change to the order persists the merge.
    pub fn pending_order(&self, actor: ActorId) -> KitchenResult<PendingOrder> {
        Ok(self.read_pending(actor)?.0)
    }

    /// Manual add or edit: replaces the item's pending quantity and price.
    pub fn add_to_order(&self, actor: ActorId, request: LineRequest) -> KitchenResult<OrderLineItem> {
        self.run("add_to_order", actor, || {
            self.inventory_item(actor, request.item_id)?;
            let mut pending = self.load_pending(actor)?;
            let line = pending.add_or_update(&request, Utc::now())?;
            self.stores.pending.upsert(actor, line.id, line.clone())?;
            info!(actor_id = %actor, item_id = %line.item_id, quantity = %line.quantity, "order line set");
            Ok(line)
        })
    }

    /// Automatic top-up: adds to the item's pending quantity.
    pub fn top_up_order(&self, actor: ActorId, request: LineRequest) -> KitchenResult<OrderLineItem> {
        self.run("top_up_order", actor, || {
            self.inventory_item(actor, request.item_id)?;
            let mut pending = self.load_pending(actor)?;
            let line = pending.increment_for_reorder(&request, Utc::now())?;
            self.stores.pending.upsert(actor, line.id, line.clone())?;
            info!(actor_id = %actor, item_id = %line.item_id, quantity = %line.quantity, "order line topped up");
            Ok(line)
        })
    }

    pub fn update_order_line(
        &self,
        actor: ActorId,
        line_id: OrderLineId,
        quantity: Decimal,
        price_per_unit: Decimal,
    ) -> KitchenResult<OrderLineItem> {
        self.run("update_order_line", actor, || {
            let mut pending = self.load_pending(actor)?;
            let line = pending.update_line(line_id, quantity, price_per_unit, Utc::now())?;
            self.stores.pending.upsert(actor, line.id, line.clone())?;
            Ok(line)
        })
    }

    /// Remove a pending line. Removing an absent line succeeds.
    pub fn remove_order_line(&self, actor: ActorId, line_id: OrderLineId) -> KitchenResult<()> {
        self.run("remove_order_line", actor, || {
            if self.stores.pending.remove(actor, &line_id)?.is_some() {
                info!(actor_id = %actor, line_id = %line_id, "order line removed");
            }
            Ok(())
        })
    }

    /// Put the shortfall of every current suggestion on the pending order.
    pub fn fill_order_from_suggestions(&self, actor: ActorId) -> KitchenResult<Vec<OrderLineItem>> {
        self.run("fill_order_from_suggestions", actor, || {
            let suggestions = self.suggestions(actor)?;
            let mut pending = self.load_pending(actor)?;
            let lines =
                pending.fill_from_suggestions(&suggestions, self.config.reorder_price, Utc::now())?;
            self.persist_lines(actor, &lines)?;
            info!(actor_id = %actor, lines = lines.len(), "order filled from suggestions");
            Ok(lines)
        })
    }

    /// Snapshot the pending order into history, then clear it.
    ///
    /// The history write must succeed before any pending line is removed; if it
    /// fails the pending order is left exactly as it was.
    pub fn complete_order(&self, actor: ActorId) -> KitchenResult<Order> {
        self.run("complete_order", actor, || {
            let pending = self.load_pending(actor)?;
            let order = Order::snapshot(OrderId::generate(), pending.lines(), Utc::now())?;

            self.stores.orders.upsert(actor, order.id_typed(), order.clone())?;

            for line in pending.lines() {
                if let Err(err) = self.stores.pending.remove(actor, &line.id) {
                    error!(
                        actor_id = %actor,
                        order_id = %order.id_typed(),
                        line_id = %line.id,
                        error = %err,
                        "order recorded but pending line could not be cleared"
                    );
                    return Err(err.into());
                }
            }

            info!(
                actor_id = %actor,
                order_id = %order.id_typed(),
                lines = order.lines().len(),
                total = %order.total_amount(),
                "order completed"
            );
            Ok(order)
        })
    }

    /// Completed orders, most recent first.
    pub fn order_history(&self, actor: ActorId) -> KitchenResult<Vec<Order>> {
        let mut orders = self.stores.orders.list(actor)?;
        orders.sort_by(|a, b| {
            b.completed_at()
                .cmp(&a.completed_at())
                .then_with(|| b.id_typed().cmp(&a.id_typed()))
        });
        Ok(orders)
    }

    // ---------------------------------------------------------------------
    // Prep
    // ---------------------------------------------------------------------

    /// Register a prep item. Every ingredient must reference a known inventory item.
    pub fn register_prep_item(&self, actor: ActorId, new: NewPrepItem) -> KitchenResult<PrepItem> {
        self.run("register_prep_item", actor, || {
            let prep = PrepItem::new(new)?;
            for ingredient in prep.ingredients() {
                self.inventory_item(actor, ingredient.item_id)?;
            }
            let id = prep.id_typed();
            if self.stores.prep.get(actor, &id)?.is_some() {
                return Err(DomainError::validation(format!("prep item {id} already exists")).into());
            }
            self.stores.prep.upsert(actor, id, prep.clone())?;
            info!(actor_id = %actor, prep_item_id = %id, name = prep.name(), "prep item registered");
            Ok(prep)
        })
    }

    pub fn prep_item(&self, actor: ActorId, id: PrepItemId) -> KitchenResult<PrepItem> {
        self.stores
            .prep
            .get(actor, &id)?
            .ok_or_else(|| DomainError::not_found(format!("prep item {id}")).into())
    }

    /// Set a prep item's stock, consuming ingredients for any increase.
    ///
    /// Ingredient stock is written first, then the prep item. If the prep write
    /// fails the ingredient rows are restored to their previous values.
    pub fn record_production(
        &self,
        actor: ActorId,
        prep_id: PrepItemId,
        requested_stock: Decimal,
    ) -> KitchenResult<AppliedProduction> {
        self.run("record_production", actor, || {
            let mut ledger = self.load_ledger(actor)?;
            let before = ledger.clone();
            let mut prep = self.prep_item(actor, prep_id)?;

            let applied = galley_prep::reconcile_production(&mut prep, requested_stock, &mut ledger)?;

            let changed = ledger.take_changed();
            self.stores
                .inventory
                .upsert_many(actor, ledger_entries(&ledger, &changed))?;

            if let Err(err) = self.stores.prep.upsert(actor, prep_id, prep) {
                error!(actor_id = %actor, prep_item_id = %prep_id, error = %err, "prep write failed, restoring ingredient stock");
                if let Err(restore_err) = self
                    .stores
                    .inventory
                    .upsert_many(actor, ledger_entries(&before, &changed))
                {
                    error!(actor_id = %actor, prep_item_id = %prep_id, error = %restore_err, "ingredient stock restore failed");
                }
                return Err(err.into());
            }

            info!(
                actor_id = %actor,
                prep_item_id = %prep_id,
                stock = %applied.prep_stock_after,
                status = ?applied.status,
                ingredients = applied.ingredient_deltas.len(),
                "production recorded"
            );
            Ok(applied)
        })
    }

    /// Push every ingredient shortfall for a production run onto the pending
    /// order (accumulating on existing lines).
    pub fn top_up_shortfalls(
        &self,
        actor: ActorId,
        prep_id: PrepItemId,
        requested_stock: Decimal,
    ) -> KitchenResult<Vec<OrderLineItem>> {
        self.run("top_up_shortfalls", actor, || {
            let ledger = self.load_ledger(actor)?;
            let prep = self.prep_item(actor, prep_id)?;
            let missing = galley_prep::shortfalls(&prep, requested_stock, &ledger)?;

            let mut pending = self.load_pending(actor)?;
            let now = Utc::now();
            let mut lines = Vec::with_capacity(missing.len());
            for shortfall in &missing {
                let price = self.config.reorder_price.price_of(ledger.require(shortfall.item_id)?);
                let request = LineRequest::new(shortfall.item_id, shortfall.unit.clone(), shortfall.shortfall, price);
                lines.push(pending.increment_for_reorder(&request, now)?);
            }
            self.persist_lines(actor, &lines)?;
            info!(actor_id = %actor, prep_item_id = %prep_id, lines = lines.len(), "shortfalls added to order");
            Ok(lines)
        })
    }

    pub fn prep_unit_cost(&self, actor: ActorId, prep_id: PrepItemId) -> KitchenResult<Decimal> {
        let ledger = self.load_ledger(actor)?;
        let prep = self.prep_item(actor, prep_id)?;
        Ok(galley_prep::unit_cost(&prep, &ledger)?)
    }

    // ---------------------------------------------------------------------
    // Waste
    // ---------------------------------------------------------------------

    /// Write off inventory stock and log the loss.
    ///
    /// The stock deduction is written first, then the waste record. If the waste
    /// write fails the previous stock is restored.
    pub fn record_inventory_waste(
        &self,
        actor: ActorId,
        item_id: InventoryItemId,
        quantity: Decimal,
        reason: Option<String>,
    ) -> KitchenResult<WasteItem> {
        self.run("record_inventory_waste", actor, || {
            let mut ledger = self.load_ledger(actor)?;
            let before = ledger.clone();
            let waste = galley_inventory::record_inventory_waste(&mut ledger, item_id, quantity, reason, Utc::now())?
                .with_cost_scale(self.config.money_scale);

            let changed = ledger.take_changed();
            self.stores
                .inventory
                .upsert_many(actor, ledger_entries(&ledger, &changed))?;

            let (waste_id, record) = waste.keyed();
            if let Err(err) = self.stores.waste.upsert(actor, waste_id, record) {
                error!(actor_id = %actor, item_id = %item_id, error = %err, "waste write failed, restoring stock");
                if let Err(restore_err) = self
                    .stores
                    .inventory
                    .upsert_many(actor, ledger_entries(&before, &changed))
                {
                    error!(actor_id = %actor, item_id = %item_id, error = %restore_err, "stock restore failed");
                }
                return Err(err.into());
            }
            info!(actor_id = %actor, item_id = %item_id, %quantity, cost = %waste.cost, "inventory waste recorded");
            Ok(waste)
        })
    }

    /// Write off prep stock and log the loss, priced at current recipe cost.
    ///
    /// The prep item is written first, then the waste record. If the waste write
    /// fails the prep item is restored.
    pub fn record_prep_waste(
        &self,
        actor: ActorId,
        prep_id: PrepItemId,
        quantity: Decimal,
        reason: Option<String>,
    ) -> KitchenResult<WasteItem> {
        self.run("record_prep_waste", actor, || {
            let ledger = self.load_ledger(actor)?;
            let mut prep = self.prep_item(actor, prep_id)?;
            let before = prep.clone();
            let waste = galley_prep::record_prep_waste(&mut prep, quantity, reason, &ledger, Utc::now())?
                .with_cost_scale(self.config.money_scale);

            self.stores.prep.upsert(actor, prep_id, prep)?;

            let (waste_id, record) = waste.keyed();
            if let Err(err) = self.stores.waste.upsert(actor, waste_id, record) {
                error!(actor_id = %actor, prep_item_id = %prep_id, error = %err, "waste write failed, restoring prep stock");
                if let Err(restore_err) = self.stores.prep.upsert(actor, prep_id, before) {
                    error!(actor_id = %actor, prep_item_id = %prep_id, error = %restore_err, "prep stock restore failed");
                }
                return Err(err.into());
            }
            info!(actor_id = %actor, prep_item_id = %prep_id, %quantity, cost = %waste.cost, "prep waste recorded");
            Ok(waste)
        })
    }

    /// Waste records, most recent first.
    pub fn waste_log(&self, actor: ActorId) -> KitchenResult<Vec<WasteItem>> {
        let mut log = self.stores.waste.list(actor)?;
        log.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(log)
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    fn run<T>(
        &self,
        op: &'static str,
        actor: ActorId,
        f: impl FnOnce() -> KitchenResult<T>,
    ) -> KitchenResult<T> {
        let span = tracing::debug_span!("kitchen", op, actor_id = %actor);
        let _guard = span.enter();
        f().inspect_err(|err| match err {
            KitchenError::Domain(e) => warn!(kind = ?e.kind(), error = %e, "request rejected"),
            KitchenError::Store(e) => error!(error = %e, "store failure"),
        })
    }

    fn load_ledger(&self, actor: ActorId) -> KitchenResult<StockLedger> {
        Ok(StockLedger::from_items(self.stores.inventory.list(actor)?))
    }

    fn persist_ledger(&self, actor: ActorId, ledger: &mut StockLedger) -> KitchenResult<()> {
        let changed = ledger.take_changed();
        self.stores
            .inventory
            .upsert_many(actor, ledger_entries(ledger, &changed))?;
        Ok(())
    }

    /// Stored pending lines folded into one line per item, plus the stored ids.
    fn read_pending(&self, actor: ActorId) -> KitchenResult<(PendingOrder, Vec<OrderLineId>)> {
        let mut stored = self.stores.pending.list(actor)?;
        stored.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        let stored_ids: Vec<OrderLineId> = stored.iter().map(|l| l.id).collect();
        Ok((PendingOrder::from_lines(stored)?, stored_ids))
    }

    /// Load the pending order for a mutation, writing back any duplicate-line merge.
    fn load_pending(&self, actor: ActorId) -> KitchenResult<PendingOrder> {
        let (pending, stored_ids) = self.read_pending(actor)?;
        if pending.len() != stored_ids.len() {
            warn!(
                actor_id = %actor,
                stored = stored_ids.len(),
                merged = pending.len(),
                "merging duplicate pending lines"
            );
            self.persist_lines(actor, pending.lines())?;
            let kept: HashSet<OrderLineId> = pending.lines().iter().map(|l| l.id).collect();
            for id in stored_ids.iter().filter(|id| !kept.contains(id)) {
                self.stores.pending.remove(actor, id)?;
            }
        }
        Ok(pending)
    }

    fn persist_lines(&self, actor: ActorId, lines: &[OrderLineItem]) -> KitchenResult<()> {
        self.stores
            .pending
            .upsert_many(actor, lines.iter().map(Entity::keyed).collect())?;
        Ok(())
    }
}

fn ledger_entries(
    ledger: &StockLedger,
    ids: &[InventoryItemId],
) -> Vec<(InventoryItemId, InventoryItem)> {
    ids.iter()
        .filter_map(|id| ledger.get(*id).map(Entity::keyed))
        .collect()
}
