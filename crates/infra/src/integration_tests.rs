//! End-to-end tests for the kitchen service.
//!
//! Tests: request → domain operation → actor-scoped stores
//!
//! Verifies:
//! - Completed orders are immutable snapshots
//! - A failed store write never loses pending lines or ingredient stock
//! - Actor isolation is preserved

#[cfg(test)]
mod tests {
    use std::hash::Hash;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use galley_core::{ActorId, DomainError, ErrorKind};
    use galley_inventory::{CategoryId, InventoryItemId, NewInventoryItem, WasteItemType};
    use galley_ordering::{LineRequest, OrderLineId, OrderLineItem, OrderLineStatus, ReorderPrice};
    use galley_prep::{NewPrepItem, PrepIngredient, PrepItemId, PrepStatus, Station};

    use crate::config::KitchenConfig;
    use crate::error::KitchenError;
    use crate::kitchen::{Kitchen, KitchenStores};
    use crate::store::{ActorStore, InMemoryActorStore, StoreError};

    /// In-memory store whose writes can be switched to fail.
    struct FlakyStore<K, V> {
        inner: InMemoryActorStore<K, V>,
        fail_writes: AtomicBool,
    }

    impl<K, V> FlakyStore<K, V> {
        fn new() -> Self {
            Self {
                inner: InMemoryActorStore::new(),
                fail_writes: AtomicBool::new(false),
            }
        }

        fn set_failing(&self, failing: bool) {
            self.fail_writes.store(failing, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(StoreError::Backend("write refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl<K, V> ActorStore<K, V> for FlakyStore<K, V>
    where
        K: Clone + Eq + Hash + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        fn get(&self, actor: ActorId, key: &K) -> Result<Option<V>, StoreError> {
            self.inner.get(actor, key)
        }

        fn upsert(&self, actor: ActorId, key: K, value: V) -> Result<(), StoreError> {
            self.check()?;
            self.inner.upsert(actor, key, value)
        }

        fn remove(&self, actor: ActorId, key: &K) -> Result<Option<V>, StoreError> {
            self.check()?;
            self.inner.remove(actor, key)
        }

        fn list(&self, actor: ActorId) -> Result<Vec<V>, StoreError> {
            self.inner.list(actor)
        }

        fn clear_actor(&self, actor: ActorId) -> Result<usize, StoreError> {
            self.check()?;
            self.inner.clear_actor(actor)
        }
    }

    fn setup() -> Kitchen {
        galley_observability::init();
        Kitchen::in_memory()
    }

    fn register(
        kitchen: &Kitchen,
        actor: ActorId,
        name: &str,
        stock: Decimal,
        par: Decimal,
        price: Decimal,
    ) -> InventoryItemId {
        let id = InventoryItemId::generate();
        kitchen
            .register_inventory_item(
                actor,
                NewInventoryItem {
                    id,
                    name: name.to_string(),
                    unit: "kg".to_string(),
                    current_stock: Some(stock),
                    par_level: Some(par),
                    default_price: Some(price),
                    last_price: None,
                    category_id: CategoryId::generate(),
                    vendor_id: None,
                    is_custom: false,
                },
            )
            .unwrap();
        id
    }

    fn register_salsa(
        kitchen: &Kitchen,
        actor: ActorId,
        tomatoes: InventoryItemId,
        onions: InventoryItemId,
    ) -> PrepItemId {
        let id = PrepItemId::generate();
        kitchen
            .register_prep_item(
                actor,
                NewPrepItem {
                    id,
                    name: "Salsa".to_string(),
                    station: Station::Sauces,
                    current_stock: dec!(0),
                    par_level: dec!(6),
                    yield_unit: "qt".to_string(),
                    ingredients: vec![
                        PrepIngredient::new(tomatoes, dec!(0.5), "kg").unwrap(),
                        PrepIngredient::new(onions, dec!(0.25), "kg").unwrap(),
                    ],
                },
            )
            .unwrap();
        id
    }

    fn stock_of(kitchen: &Kitchen, actor: ActorId, id: InventoryItemId) -> Decimal {
        kitchen
            .inventory_item(actor, id)
            .unwrap()
            .current_stock()
            .unwrap()
    }

    #[test]
    fn completed_order_ignores_later_price_changes() {
        let kitchen = setup();
        let actor = ActorId::new();
        let flour = register(&kitchen, actor, "Flour", dec!(1), dec!(10), dec!(2.00));

        kitchen
            .add_to_order(actor, LineRequest::new(flour, "kg", dec!(3), dec!(2.00)))
            .unwrap();
        let order = kitchen.complete_order(actor).unwrap();

        kitchen.record_purchase_price(actor, flour, dec!(5.00)).unwrap();

        let history = kitchen.order_history(actor).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0], order);
        assert_eq!(history[0].lines()[0].price_per_unit, dec!(2.00));
        assert_eq!(history[0].total_amount(), dec!(6.00));
        assert!(kitchen.pending_order(actor).unwrap().is_empty());
    }

    #[test]
    fn completing_empty_order_records_nothing() {
        let kitchen = setup();
        let actor = ActorId::new();

        let err = kitchen.complete_order(actor).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::EmptyOrder));
        assert!(kitchen.order_history(actor).unwrap().is_empty());
    }

    #[test]
    fn completing_n_lines_moves_all_of_them_to_history() {
        let kitchen = setup();
        let actor = ActorId::new();
        let items = [
            register(&kitchen, actor, "Butter", dec!(0), dec!(4), dec!(3.00)),
            register(&kitchen, actor, "Eggs", dec!(0), dec!(4), dec!(0.25)),
            register(&kitchen, actor, "Milk", dec!(0), dec!(4), dec!(1.10)),
        ];
        for (i, id) in items.iter().enumerate() {
            let quantity = Decimal::from(i as u32 + 1);
            kitchen
                .add_to_order(actor, LineRequest::new(*id, "kg", quantity, dec!(1.50)))
                .unwrap();
        }
        let expected_total = kitchen.pending_order(actor).unwrap().total();

        let order = kitchen.complete_order(actor).unwrap();

        assert_eq!(order.lines().len(), 3);
        assert_eq!(order.total_amount(), expected_total);
        assert_eq!(order.total_amount(), dec!(9.00));
        assert!(kitchen.pending_order(actor).unwrap().is_empty());
    }

    #[test]
    fn failed_history_write_keeps_pending_lines() {
        galley_observability::init();
        let orders = Arc::new(FlakyStore::new());
        let mut stores = KitchenStores::in_memory();
        stores.orders = orders.clone();
        let kitchen = Kitchen::new(stores, KitchenConfig::default());
        let actor = ActorId::new();
        let flour = register(&kitchen, actor, "Flour", dec!(1), dec!(10), dec!(2.00));
        kitchen
            .add_to_order(actor, LineRequest::new(flour, "kg", dec!(3), dec!(2.00)))
            .unwrap();

        orders.set_failing(true);
        let err = kitchen.complete_order(actor).unwrap_err();
        assert!(matches!(err, KitchenError::Store(StoreError::Backend(_))));
        assert_eq!(err.kind(), None);

        let pending = kitchen.pending_order(actor).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.lines()[0].quantity, dec!(3));
        assert!(kitchen.order_history(actor).unwrap().is_empty());

        orders.set_failing(false);
        kitchen.complete_order(actor).unwrap();
        assert!(kitchen.pending_order(actor).unwrap().is_empty());
    }

    #[test]
    fn manual_add_replaces_and_top_up_accumulates() {
        let kitchen = setup();
        let actor = ActorId::new();
        let flour = register(&kitchen, actor, "Flour", dec!(1), dec!(10), dec!(2.00));

        kitchen
            .add_to_order(actor, LineRequest::new(flour, "kg", dec!(5), dec!(2.00)))
            .unwrap();
        kitchen
            .add_to_order(actor, LineRequest::new(flour, "kg", dec!(2), dec!(2.00)))
            .unwrap();
        let line = kitchen
            .top_up_order(actor, LineRequest::new(flour, "kg", dec!(3), dec!(2.50)))
            .unwrap();

        assert_eq!(line.quantity, dec!(5));
        assert_eq!(line.price_per_unit, dec!(2.50));
        assert_eq!(line.total_price, dec!(12.50));
        assert_eq!(kitchen.pending_order(actor).unwrap().len(), 1);
    }

    #[test]
    fn line_edits_and_idempotent_removal() {
        let kitchen = setup();
        let actor = ActorId::new();
        let flour = register(&kitchen, actor, "Flour", dec!(1), dec!(10), dec!(2.00));
        let line = kitchen
            .add_to_order(actor, LineRequest::new(flour, "kg", dec!(5), dec!(2.00)))
            .unwrap();

        let edited = kitchen
            .update_order_line(actor, line.id, dec!(7), dec!(1.00))
            .unwrap();
        assert_eq!(edited.total_price, dec!(7.00));

        let err = kitchen
            .update_order_line(actor, line.id, dec!(0), dec!(1.00))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));

        kitchen.remove_order_line(actor, line.id).unwrap();
        kitchen.remove_order_line(actor, line.id).unwrap();
        assert!(kitchen.pending_order(actor).unwrap().is_empty());

        let err = kitchen
            .update_order_line(actor, OrderLineId::generate(), dec!(1), dec!(1))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }

    #[test]
    fn suggestions_fill_the_pending_order() {
        let kitchen = setup();
        let actor = ActorId::new();
        let flour = register(&kitchen, actor, "Flour", dec!(1), dec!(10), dec!(2.00));
        let sugar = register(&kitchen, actor, "Sugar", dec!(4), dec!(10), dec!(1.00));
        register(&kitchen, actor, "Salt", dec!(10), dec!(10), dec!(0.50));

        let suggestions = kitchen.suggestions(actor).unwrap();
        let ids: Vec<_> = suggestions.iter().map(|s| s.item_id).collect();
        assert_eq!(ids, vec![flour, sugar]);

        let lines = kitchen.fill_order_from_suggestions(actor).unwrap();
        assert_eq!(lines.len(), 2);
        let pending = kitchen.pending_order(actor).unwrap();
        assert_eq!(pending.line_for_item(flour).unwrap().quantity, dec!(9));
        assert_eq!(pending.line_for_item(sugar).unwrap().quantity, dec!(6));
        assert_eq!(pending.total(), dec!(24.00));
    }

    #[test]
    fn reorder_price_policy_follows_config() {
        galley_observability::init();
        let config = KitchenConfig {
            reorder_price: ReorderPrice::ListPrice,
            ..KitchenConfig::default()
        };
        let kitchen = Kitchen::new(KitchenStores::in_memory(), config);
        let actor = ActorId::new();
        let flour = register(&kitchen, actor, "Flour", dec!(1), dec!(10), dec!(2.00));
        kitchen.record_purchase_price(actor, flour, dec!(3.00)).unwrap();

        let lines = kitchen.fill_order_from_suggestions(actor).unwrap();
        assert_eq!(lines[0].price_per_unit, dec!(2.00));
    }

    #[test]
    fn duplicate_pending_lines_are_merged_on_load() {
        galley_observability::init();
        let stores = KitchenStores::in_memory();
        let kitchen = Kitchen::new(stores.clone(), KitchenConfig::default());
        let actor = ActorId::new();
        let flour = register(&kitchen, actor, "Flour", dec!(1), dec!(10), dec!(2.00));

        let now = chrono::Utc::now();
        for quantity in [dec!(2), dec!(3)] {
            let line = OrderLineItem {
                id: OrderLineId::generate(),
                item_id: flour,
                quantity,
                unit: "kg".to_string(),
                price_per_unit: dec!(2.00),
                total_price: quantity * dec!(2.00),
                status: OrderLineStatus::Pending,
                created_at: now,
                updated_at: now,
            };
            stores.pending.upsert(actor, line.id, line).unwrap();
        }

        let pending = kitchen.pending_order(actor).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending.lines()[0].quantity, dec!(5));
        assert_eq!(pending.lines()[0].total_price, dec!(10.00));
        // Reading leaves storage alone.
        assert_eq!(stores.pending.list(actor).unwrap().len(), 2);

        let sugar = register(&kitchen, actor, "Sugar", dec!(1), dec!(10), dec!(1.00));
        kitchen
            .add_to_order(actor, LineRequest::new(sugar, "kg", dec!(1), dec!(1.00)))
            .unwrap();
        let stored = stores.pending.list(actor).unwrap();
        assert_eq!(stored.len(), 2);
        let flour_line = stored.iter().find(|l| l.item_id == flour).unwrap();
        assert_eq!(flour_line.quantity, dec!(5));
    }

    #[test]
    fn actors_do_not_see_each_other() {
        let kitchen = setup();
        let alice = ActorId::new();
        let bob = ActorId::new();
        let flour = register(&kitchen, alice, "Flour", dec!(1), dec!(10), dec!(2.00));

        assert!(kitchen.inventory(bob).unwrap().is_empty());
        assert!(kitchen.suggestions(bob).unwrap().is_empty());

        let err = kitchen
            .add_to_order(bob, LineRequest::new(flour, "kg", dec!(1), dec!(2.00)))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));

        let err = kitchen.adjust_inventory_stock(bob, flour, dec!(5)).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        assert_eq!(stock_of(&kitchen, alice, flour), dec!(1));
    }

    #[test]
    fn stock_adjustments_reject_negative_results() {
        let kitchen = setup();
        let actor = ActorId::new();
        let flour = register(&kitchen, actor, "Flour", dec!(1), dec!(10), dec!(2.00));

        assert_eq!(kitchen.adjust_inventory_stock(actor, flour, dec!(4)).unwrap(), dec!(5));
        let err = kitchen
            .adjust_inventory_stock(actor, flour, dec!(-6))
            .unwrap_err();
        match err.as_domain() {
            Some(DomainError::InsufficientStock { shortfall, .. }) => {
                assert_eq!(*shortfall, dec!(1))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stock_of(&kitchen, actor, flour), dec!(5));

        assert_eq!(kitchen.set_inventory_stock(actor, flour, dec!(2)).unwrap(), dec!(2));
        assert_eq!(stock_of(&kitchen, actor, flour), dec!(2));
    }

    #[test]
    fn production_consumes_ingredients_and_sets_status() {
        let kitchen = setup();
        let actor = ActorId::new();
        let tomatoes = register(&kitchen, actor, "Tomatoes", dec!(5), dec!(10), dec!(2.00));
        let onions = register(&kitchen, actor, "Onions", dec!(2), dec!(5), dec!(1.00));
        let salsa = register_salsa(&kitchen, actor, tomatoes, onions);

        let applied = kitchen.record_production(actor, salsa, dec!(4)).unwrap();
        assert_eq!(applied.prep_stock_after, dec!(4));
        assert_eq!(applied.status, PrepStatus::Needed);
        assert_eq!(stock_of(&kitchen, actor, tomatoes), dec!(3));
        assert_eq!(stock_of(&kitchen, actor, onions), dec!(1));

        let prep = kitchen.prep_item(actor, salsa).unwrap();
        assert_eq!(prep.current_stock(), dec!(4));
        assert!(prep.status_is_consistent());

        // Lowering stock consumes nothing.
        kitchen.record_production(actor, salsa, dec!(1)).unwrap();
        assert_eq!(stock_of(&kitchen, actor, tomatoes), dec!(3));
        assert_eq!(kitchen.prep_item(actor, salsa).unwrap().current_stock(), dec!(1));
    }

    #[test]
    fn shortfall_blocks_production_then_tops_up_order() {
        let kitchen = setup();
        let actor = ActorId::new();
        let tomatoes = register(&kitchen, actor, "Tomatoes", dec!(1), dec!(10), dec!(2.00));
        let onions = register(&kitchen, actor, "Onions", dec!(5), dec!(5), dec!(1.00));
        let salsa = register_salsa(&kitchen, actor, tomatoes, onions);

        let err = kitchen.record_production(actor, salsa, dec!(4)).unwrap_err();
        match err.as_domain() {
            Some(DomainError::InsufficientStock {
                required,
                available,
                shortfall,
                ..
            }) => {
                assert_eq!(*required, dec!(2.0));
                assert_eq!(*available, dec!(1));
                assert_eq!(*shortfall, dec!(1.0));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stock_of(&kitchen, actor, tomatoes), dec!(1));
        assert_eq!(stock_of(&kitchen, actor, onions), dec!(5));
        assert_eq!(kitchen.prep_item(actor, salsa).unwrap().current_stock(), dec!(0));

        kitchen.top_up_shortfalls(actor, salsa, dec!(4)).unwrap();
        let lines = kitchen.top_up_shortfalls(actor, salsa, dec!(4)).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item_id, tomatoes);
        assert_eq!(lines[0].quantity, dec!(2));
        assert_eq!(lines[0].price_per_unit, dec!(2.00));

        kitchen.adjust_inventory_stock(actor, tomatoes, dec!(1)).unwrap();
        kitchen.record_production(actor, salsa, dec!(4)).unwrap();
        assert_eq!(stock_of(&kitchen, actor, tomatoes), dec!(0));
    }

    #[test]
    fn failed_prep_write_restores_ingredient_stock() {
        galley_observability::init();
        let prep_store = Arc::new(FlakyStore::new());
        let mut stores = KitchenStores::in_memory();
        stores.prep = prep_store.clone();
        let kitchen = Kitchen::new(stores, KitchenConfig::default());
        let actor = ActorId::new();
        let tomatoes = register(&kitchen, actor, "Tomatoes", dec!(5), dec!(10), dec!(2.00));
        let onions = register(&kitchen, actor, "Onions", dec!(2), dec!(5), dec!(1.00));
        let salsa = register_salsa(&kitchen, actor, tomatoes, onions);

        prep_store.set_failing(true);
        let err = kitchen.record_production(actor, salsa, dec!(4)).unwrap_err();
        assert!(matches!(err, KitchenError::Store(_)));

        assert_eq!(stock_of(&kitchen, actor, tomatoes), dec!(5));
        assert_eq!(stock_of(&kitchen, actor, onions), dec!(2));
        assert_eq!(kitchen.prep_item(actor, salsa).unwrap().current_stock(), dec!(0));
    }

    #[test]
    fn prep_item_requires_known_ingredients() {
        let kitchen = setup();
        let actor = ActorId::new();
        let tomatoes = register(&kitchen, actor, "Tomatoes", dec!(5), dec!(10), dec!(2.00));

        let err = kitchen
            .register_prep_item(
                actor,
                NewPrepItem {
                    id: PrepItemId::generate(),
                    name: "Salsa".to_string(),
                    station: Station::Sauces,
                    current_stock: dec!(0),
                    par_level: dec!(6),
                    yield_unit: "qt".to_string(),
                    ingredients: vec![
                        PrepIngredient::new(tomatoes, dec!(0.5), "kg").unwrap(),
                        PrepIngredient::new(InventoryItemId::generate(), dec!(0.1), "kg").unwrap(),
                    ],
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }

    #[test]
    fn waste_cost_is_frozen_and_rounded() {
        let kitchen = setup();
        let actor = ActorId::new();
        let tomatoes = register(&kitchen, actor, "Tomatoes", dec!(5), dec!(10), dec!(2.00));

        let waste = kitchen
            .record_inventory_waste(actor, tomatoes, dec!(0.333), Some("  bruised ".to_string()))
            .unwrap();
        assert_eq!(waste.item_type, WasteItemType::Inventory);
        assert_eq!(waste.cost, dec!(0.67));
        assert_eq!(waste.reason.as_deref(), Some("bruised"));
        assert_eq!(stock_of(&kitchen, actor, tomatoes), dec!(4.667));

        kitchen.record_purchase_price(actor, tomatoes, dec!(9.00)).unwrap();
        let log = kitchen.waste_log(actor).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].cost, dec!(0.67));

        let err = kitchen
            .record_inventory_waste(actor, tomatoes, dec!(10), None)
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InsufficientStock));
        assert_eq!(kitchen.waste_log(actor).unwrap().len(), 1);
    }

    #[test]
    fn prep_waste_uses_recipe_cost() {
        let kitchen = setup();
        let actor = ActorId::new();
        let tomatoes = register(&kitchen, actor, "Tomatoes", dec!(5), dec!(10), dec!(2.00));
        let onions = register(&kitchen, actor, "Onions", dec!(2), dec!(5), dec!(1.00));
        let salsa = register_salsa(&kitchen, actor, tomatoes, onions);
        kitchen.record_production(actor, salsa, dec!(2)).unwrap();

        // 0.5 * 2.00 + 0.25 * 1.00
        assert_eq!(kitchen.prep_unit_cost(actor, salsa).unwrap(), dec!(1.25));

        let waste = kitchen.record_prep_waste(actor, salsa, dec!(2), None).unwrap();
        assert_eq!(waste.item_type, WasteItemType::Prep);
        assert_eq!(waste.cost, dec!(2.50));
        assert_eq!(waste.unit, "qt");

        let prep = kitchen.prep_item(actor, salsa).unwrap();
        assert_eq!(prep.current_stock(), dec!(0));
        assert_eq!(prep.status(), PrepStatus::Urgent);

        let err = kitchen.record_prep_waste(actor, salsa, dec!(1), None).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::InsufficientStock));
    }

    #[test]
    fn failed_inventory_write_records_no_waste() {
        galley_observability::init();
        let inventory = Arc::new(FlakyStore::new());
        let mut stores = KitchenStores::in_memory();
        stores.inventory = inventory.clone();
        let kitchen = Kitchen::new(stores, KitchenConfig::default());
        let actor = ActorId::new();
        let tomatoes = register(&kitchen, actor, "Tomatoes", dec!(5), dec!(10), dec!(2.00));

        inventory.set_failing(true);
        let err = kitchen
            .record_inventory_waste(actor, tomatoes, dec!(1), None)
            .unwrap_err();
        assert!(matches!(err, KitchenError::Store(_)));
        assert!(kitchen.waste_log(actor).unwrap().is_empty());
        assert_eq!(stock_of(&kitchen, actor, tomatoes), dec!(5));
    }

    #[test]
    fn failed_waste_write_restores_inventory_stock() {
        galley_observability::init();
        let waste = Arc::new(FlakyStore::new());
        let mut stores = KitchenStores::in_memory();
        stores.waste = waste.clone();
        let kitchen = Kitchen::new(stores, KitchenConfig::default());
        let actor = ActorId::new();
        let tomatoes = register(&kitchen, actor, "Tomatoes", dec!(5), dec!(10), dec!(2.00));

        waste.set_failing(true);
        let err = kitchen
            .record_inventory_waste(actor, tomatoes, dec!(1), None)
            .unwrap_err();
        assert!(matches!(err, KitchenError::Store(_)));
        assert!(kitchen.waste_log(actor).unwrap().is_empty());
        assert_eq!(stock_of(&kitchen, actor, tomatoes), dec!(5));
    }

    #[test]
    fn failed_prep_write_records_no_waste() {
        galley_observability::init();
        let prep_store = Arc::new(FlakyStore::new());
        let mut stores = KitchenStores::in_memory();
        stores.prep = prep_store.clone();
        let kitchen = Kitchen::new(stores, KitchenConfig::default());
        let actor = ActorId::new();
        let tomatoes = register(&kitchen, actor, "Tomatoes", dec!(5), dec!(10), dec!(2.00));
        let onions = register(&kitchen, actor, "Onions", dec!(2), dec!(5), dec!(1.00));
        let salsa = register_salsa(&kitchen, actor, tomatoes, onions);
        kitchen.record_production(actor, salsa, dec!(2)).unwrap();

        prep_store.set_failing(true);
        let err = kitchen.record_prep_waste(actor, salsa, dec!(1), None).unwrap_err();
        assert!(matches!(err, KitchenError::Store(_)));
        assert!(kitchen.waste_log(actor).unwrap().is_empty());
        assert_eq!(kitchen.prep_item(actor, salsa).unwrap().current_stock(), dec!(2));
    }

    #[test]
    fn failed_waste_write_restores_prep_stock() {
        galley_observability::init();
        let waste = Arc::new(FlakyStore::new());
        let mut stores = KitchenStores::in_memory();
        stores.waste = waste.clone();
        let kitchen = Kitchen::new(stores, KitchenConfig::default());
        let actor = ActorId::new();
        let tomatoes = register(&kitchen, actor, "Tomatoes", dec!(5), dec!(10), dec!(2.00));
        let onions = register(&kitchen, actor, "Onions", dec!(2), dec!(5), dec!(1.00));
        let salsa = register_salsa(&kitchen, actor, tomatoes, onions);
        kitchen.record_production(actor, salsa, dec!(2)).unwrap();

        waste.set_failing(true);
        let err = kitchen.record_prep_waste(actor, salsa, dec!(1), None).unwrap_err();
        assert!(matches!(err, KitchenError::Store(_)));
        assert!(kitchen.waste_log(actor).unwrap().is_empty());
        let prep = kitchen.prep_item(actor, salsa).unwrap();
        assert_eq!(prep.current_stock(), dec!(2));
        assert!(prep.status_is_consistent());
    }

    #[test]
    fn out_of_range_amounts_are_rejected() {
        let kitchen = setup();
        let actor = ActorId::new();
        let flour = register(&kitchen, actor, "Flour", dec!(1), dec!(10), dec!(2.00));

        let err = kitchen
            .add_to_order(actor, LineRequest::new(flour, "kg", Decimal::MAX, dec!(2)))
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));
        assert!(kitchen.pending_order(actor).unwrap().is_empty());

        let err = kitchen
            .adjust_inventory_stock(actor, flour, Decimal::MAX)
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));
        assert_eq!(stock_of(&kitchen, actor, flour), dec!(1));
    }

    #[test]
    fn money_scale_controls_waste_rounding() {
        galley_observability::init();
        let config = KitchenConfig {
            money_scale: 0,
            ..KitchenConfig::default()
        };
        let kitchen = Kitchen::new(KitchenStores::in_memory(), config);
        let actor = ActorId::new();
        let tomatoes = register(&kitchen, actor, "Tomatoes", dec!(5), dec!(10), dec!(2.00));

        let waste = kitchen
            .record_inventory_waste(actor, tomatoes, dec!(1.8), None)
            .unwrap();
        assert_eq!(waste.cost, dec!(4));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let kitchen = setup();
        let actor = ActorId::new();
        let flour = register(&kitchen, actor, "Flour", dec!(1), dec!(10), dec!(2.00));
        let err = kitchen
            .register_inventory_item(
                actor,
                NewInventoryItem {
                    id: flour,
                    name: "Flour again".to_string(),
                    unit: "kg".to_string(),
                    current_stock: None,
                    par_level: None,
                    default_price: None,
                    last_price: None,
                    category_id: CategoryId::generate(),
                    vendor_id: None,
                    is_custom: true,
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Validation));
        assert_eq!(kitchen.inventory(actor).unwrap()[0].name(), "Flour");
    }
}
