//! Integration tests for ledger-engine

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use ledger_engine::{
    utils::{adopt_legacy_payment, LegacyPaymentRow, MemoryStore},
    BankPayment, CounterpartyKey, Customer, DateRange, Engine, EngineError, InvoiceLine, Item,
    InventoryStatus, PaymentStatus, PaymentTarget, Project, Purchase, SalesInvoice, Supplier,
    TransactionStore,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_complete_reconciliation_workflow() {
    let store = MemoryStore::new();
    store.insert_supplier(Supplier::new("SUP001", "Khan Steel Traders"));
    store.insert_customer(Customer::new("cust1", "Ayesha Builders"));
    store.insert_project(
        Project::new("p1", "PRJ-01", "Green Valley").with_value_of_job(BigDecimal::from(10000)),
    );
    store.insert_item(
        Item::new("CEM-01", "Cement", "bag")
            .with_min_stock_level(BigDecimal::from(10))
            .with_selling_price(BigDecimal::from(60)),
    );

    let mut engine = Engine::new(store.clone());

    // Buy 100 bags, attached counter step keeps stock current
    let purchase = store.insert_purchase(
        Purchase::new(
            "PO000001",
            date(2024, 3, 1),
            "SUP001",
            "CEM-01",
            "Cement",
            BigDecimal::from(100),
            BigDecimal::from(40),
        )
        .with_project("p1"),
    );
    engine.apply_purchase(&purchase).await.unwrap();

    // Sell 30 bags
    let invoice = store.insert_sales_invoice(
        SalesInvoice::new(
            "SI000001",
            date(2024, 3, 10),
            "cust1",
            vec![InvoiceLine::new(
                "CEM-01",
                "Cement",
                BigDecimal::from(30),
                BigDecimal::from(60),
            )],
        )
        .with_project("p1"),
    );
    engine.apply_sale(&invoice).await.unwrap();

    // Pay the supplier in full
    let receipt = engine
        .record_payment(
            &PaymentTarget::Purchase(purchase.id),
            &BigDecimal::from(4000),
            date(2024, 3, 15),
            Some("cement invoice settled"),
        )
        .await
        .unwrap();
    assert_eq!(receipt.target.status(), PaymentStatus::Paid);
    assert_eq!(receipt.payment.voucher_no, "BP000001");

    // Supplier ledger settles to zero
    let ledger = engine
        .build_ledger(&CounterpartyKey::Supplier("SUP001".to_string()), None)
        .await
        .unwrap();
    assert_eq!(ledger.total_debit, BigDecimal::from(4000));
    assert_eq!(ledger.total_credit, BigDecimal::from(4000));
    assert_eq!(ledger.balance, BigDecimal::from(0));

    // Stock counter matches a full replay
    let audit = engine.reconcile_stock("CEM-01").await.unwrap();
    assert_eq!(audit.actual, BigDecimal::from(70));
    assert!(audit.is_clean());

    // Inventory report sees the same counter
    let inventory = engine.inventory_report().await.unwrap();
    assert_eq!(inventory.summary.total_items, 1);
    let line = &inventory.items[0];
    assert_eq!(line.purchased, BigDecimal::from(100));
    assert_eq!(line.sold, BigDecimal::from(30));
    assert_eq!(line.status, InventoryStatus::InStock);

    // Income statement: revenue 1800; the purchase counts as material
    // expense and the recorded payment's description ("cement ...") lands in
    // the same bucket
    let statement = engine.income_statement(None).await.unwrap();
    assert_eq!(statement.revenue, BigDecimal::from(1800));
    assert_eq!(statement.expenses.material_expense, BigDecimal::from(8000));
    assert_eq!(statement.expenses.other_expenses, BigDecimal::from(0));
    assert_eq!(statement.total_expenses, BigDecimal::from(8000));
    assert_eq!(statement.net_income, BigDecimal::from(-6200));

    // Project spend covers the purchase and the payment
    let progress = engine.project_progress("p1").await.unwrap();
    assert_eq!(progress.spent, BigDecimal::from(8000));
    assert_eq!(progress.progress, BigDecimal::from(80));
}

#[tokio::test]
async fn test_supplier_scenario_with_interleaved_payment() {
    let store = MemoryStore::new();
    store.insert_supplier(Supplier::new("S", "Sarhad Suppliers"));

    let first = store.insert_purchase(Purchase::new(
        "PO000001",
        date(2024, 1, 1),
        "S",
        "STL-01",
        "Steel",
        BigDecimal::from(1),
        BigDecimal::from(1000),
    ));

    let mut engine = Engine::new(store.clone());
    engine
        .record_payment(
            &PaymentTarget::Purchase(first.id),
            &BigDecimal::from(600),
            date(2024, 1, 10),
            None,
        )
        .await
        .unwrap();

    store.insert_purchase(Purchase::new(
        "PO000002",
        date(2024, 1, 20),
        "S",
        "STL-01",
        "Steel",
        BigDecimal::from(1),
        BigDecimal::from(500),
    ));

    let ledger = engine
        .build_ledger(&CounterpartyKey::Supplier("S".to_string()), None)
        .await
        .unwrap();

    let balances: Vec<BigDecimal> = ledger.entries.iter().map(|e| e.balance.clone()).collect();
    assert_eq!(
        balances,
        vec![
            BigDecimal::from(1000),
            BigDecimal::from(400),
            BigDecimal::from(900)
        ]
    );
    assert_eq!(ledger.balance, BigDecimal::from(900));
    assert_eq!(ledger.balance, &ledger.total_debit - &ledger.total_credit);

    // Rebuilding is idempotent
    let again = engine
        .build_ledger(&CounterpartyKey::Supplier("S".to_string()), None)
        .await
        .unwrap();
    assert_eq!(ledger, again);
}

#[tokio::test]
async fn test_period_ledgers_are_independent() {
    let store = MemoryStore::new();
    store.insert_supplier(Supplier::new("SUP001", "Khan Steel Traders"));
    store.insert_purchase(Purchase::new(
        "PO000001",
        date(2024, 1, 5),
        "SUP001",
        "STL-01",
        "Steel",
        BigDecimal::from(1),
        BigDecimal::from(1000),
    ));
    store.insert_purchase(Purchase::new(
        "PO000002",
        date(2024, 2, 5),
        "SUP001",
        "STL-01",
        "Steel",
        BigDecimal::from(1),
        BigDecimal::from(700),
    ));

    let engine = Engine::new(store);
    let key = CounterpartyKey::Supplier("SUP001".to_string());

    let february = DateRange::new(Some(date(2024, 2, 1)), Some(date(2024, 2, 29))).unwrap();
    let ledger = engine.build_ledger(&key, Some(&february)).await.unwrap();

    // January's closing balance is not carried forward
    assert_eq!(ledger.entries.len(), 1);
    assert_eq!(ledger.entries[0].balance, BigDecimal::from(700));
    assert_eq!(ledger.balance, BigDecimal::from(700));

    let unfiltered = engine.build_ledger(&key, None).await.unwrap();
    assert_eq!(unfiltered.balance, BigDecimal::from(1700));
}

#[tokio::test]
async fn test_cancellation_removes_records_from_aggregates() {
    let store = MemoryStore::new();
    store.insert_supplier(Supplier::new("SUP001", "Khan Steel Traders"));
    store.insert_item(Item::new("CEM-01", "Cement", "bag"));

    let mut engine = Engine::new(store.clone());
    let keep = store.insert_purchase(Purchase::new(
        "PO000001",
        date(2024, 1, 5),
        "SUP001",
        "CEM-01",
        "Cement",
        BigDecimal::from(10),
        BigDecimal::from(50),
    ));
    let cancel = store.insert_purchase(Purchase::new(
        "PO000002",
        date(2024, 1, 6),
        "SUP001",
        "CEM-01",
        "Cement",
        BigDecimal::from(5),
        BigDecimal::from(50),
    ));
    engine.apply_purchase(&keep).await.unwrap();
    engine.apply_purchase(&cancel).await.unwrap();

    engine.cancel_purchase(&cancel.id).await.unwrap();

    let ledger = engine
        .build_ledger(&CounterpartyKey::Supplier("SUP001".to_string()), None)
        .await
        .unwrap();
    assert_eq!(ledger.entries.len(), 1);
    assert_eq!(ledger.balance, BigDecimal::from(500));

    let audit = engine.reconcile_stock("CEM-01").await.unwrap();
    assert_eq!(audit.actual, BigDecimal::from(10));
    assert!(audit.is_clean());

    let statement = engine.income_statement(None).await.unwrap();
    assert_eq!(statement.expenses.material_expense, BigDecimal::from(500));
}

#[tokio::test]
async fn test_legacy_payments_join_ledgers_after_adoption() {
    let suppliers = vec![Supplier::new("SUP001", "City Cement")];
    let row = LegacyPaymentRow {
        voucher_no: "BP000777".to_string(),
        date: date(2023, 12, 1),
        pay_to: "M/S City Cement (Pvt) Ltd".to_string(),
        description: Some("old system payment".to_string()),
        amount: BigDecimal::from(1500),
    };
    let adopted = adopt_legacy_payment(&row, &suppliers);
    assert_eq!(
        adopted.counterparty,
        Some(CounterpartyKey::Supplier("SUP001".to_string()))
    );

    let store = MemoryStore::new();
    store.insert_supplier(suppliers[0].clone());
    store.insert_purchase(Purchase::new(
        "PO000001",
        date(2023, 11, 20),
        "SUP001",
        "CEM-01",
        "Cement",
        BigDecimal::from(1),
        BigDecimal::from(2000),
    ));
    store.seed_bank_payment(adopted);

    let engine = Engine::new(store);
    let ledger = engine
        .build_ledger(&CounterpartyKey::Supplier("SUP001".to_string()), None)
        .await
        .unwrap();
    assert_eq!(ledger.total_credit, BigDecimal::from(1500));
    assert_eq!(ledger.balance, BigDecimal::from(500));
}

#[tokio::test]
async fn test_memory_store_operations() {
    let mut store = MemoryStore::new();

    // Creation order is assigned sequentially across streams
    let first = store.insert_purchase(Purchase::new(
        "PO000001",
        date(2024, 1, 1),
        "SUP001",
        "CEM-01",
        "Cement",
        BigDecimal::from(1),
        BigDecimal::from(100),
    ));
    let second = store.insert_sales_invoice(SalesInvoice::new(
        "SI000001",
        date(2024, 1, 1),
        "cust1",
        vec![InvoiceLine::new(
            "CEM-01",
            "Cement",
            BigDecimal::from(1),
            BigDecimal::from(100),
        )],
    ));
    assert!(second.seq > first.seq);

    // References are prefix-scoped and zero-padded
    assert_eq!(store.next_reference("BP").await.unwrap(), "BP000001");
    assert_eq!(store.next_reference("BP").await.unwrap(), "BP000002");
    assert_eq!(store.next_reference("CP").await.unwrap(), "CP000001");

    // Conditional writes guard the version
    let mut updated = first.clone();
    updated.amount_paid = BigDecimal::from(100);
    updated.payment_status =
        PaymentStatus::from_amounts(&updated.amount_paid, &updated.net_amount);
    let saved = store.update_purchase(&updated, first.version).await.unwrap();
    assert_eq!(saved.version, first.version + 1);
    assert_eq!(saved.seq, first.seq);

    let stale = store.update_purchase(&updated, first.version).await;
    assert!(matches!(stale, Err(EngineError::Conflict(_))));

    // Payments inserted through the engine write path get their sequence too
    let payment = BankPayment::new("BP000009", date(2024, 1, 2), BigDecimal::from(10));
    let stored = store.insert_bank_payment(&payment).await.unwrap();
    assert!(stored.seq > second.seq);
}
