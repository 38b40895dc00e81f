//! In-memory store implementation for testing and development

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

/// In-memory [`TransactionStore`] backed by hash maps
///
/// Clones share the same underlying maps, mirroring how concurrent request
/// handlers would share one database connection pool.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    suppliers: HashMap<String, Supplier>,
    customers: HashMap<String, Customer>,
    projects: HashMap<String, Project>,
    items: HashMap<String, Item>,
    purchases: HashMap<Uuid, Purchase>,
    bank_payments: HashMap<Uuid, BankPayment>,
    cash_payments: HashMap<Uuid, CashPayment>,
    sales_invoices: HashMap<Uuid, SalesInvoice>,
    plot_sales: HashMap<Uuid, PlotSale>,
    next_seq: u64,
    reference_counters: HashMap<String, u64>,
}

impl Inner {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        *self.inner.write().unwrap() = Inner::default();
    }

    /// Seed a supplier
    pub fn insert_supplier(&self, supplier: Supplier) {
        self.inner
            .write()
            .unwrap()
            .suppliers
            .insert(supplier.code.clone(), supplier);
    }

    /// Seed a customer
    pub fn insert_customer(&self, customer: Customer) {
        self.inner
            .write()
            .unwrap()
            .customers
            .insert(customer.id.clone(), customer);
    }

    /// Seed a project
    pub fn insert_project(&self, project: Project) {
        self.inner
            .write()
            .unwrap()
            .projects
            .insert(project.id.clone(), project);
    }

    /// Seed an item
    pub fn insert_item(&self, item: Item) {
        self.inner
            .write()
            .unwrap()
            .items
            .insert(item.code.clone(), item);
    }

    /// Seed a purchase, assigning its creation sequence
    pub fn insert_purchase(&self, mut purchase: Purchase) -> Purchase {
        let mut inner = self.inner.write().unwrap();
        purchase.seq = inner.next_seq();
        inner.purchases.insert(purchase.id, purchase.clone());
        purchase
    }

    /// Seed a cash payment, assigning its creation sequence
    pub fn insert_cash_payment(&self, mut payment: CashPayment) -> CashPayment {
        let mut inner = self.inner.write().unwrap();
        payment.seq = inner.next_seq();
        inner.cash_payments.insert(payment.id, payment.clone());
        payment
    }

    /// Seed a sales invoice, assigning its creation sequence
    pub fn insert_sales_invoice(&self, mut invoice: SalesInvoice) -> SalesInvoice {
        let mut inner = self.inner.write().unwrap();
        invoice.seq = inner.next_seq();
        inner.sales_invoices.insert(invoice.id, invoice.clone());
        invoice
    }

    /// Seed a plot sale, assigning its creation sequence
    pub fn insert_plot_sale(&self, mut sale: PlotSale) -> PlotSale {
        let mut inner = self.inner.write().unwrap();
        sale.seq = inner.next_seq();
        inner.plot_sales.insert(sale.id, sale.clone());
        sale
    }

    /// Seed a bank payment directly, bypassing the engine's write path
    pub fn seed_bank_payment(&self, mut payment: BankPayment) -> BankPayment {
        let mut inner = self.inner.write().unwrap();
        payment.seq = inner.next_seq();
        inner.bank_payments.insert(payment.id, payment.clone());
        payment
    }

    /// Overwrite an item's cached stock counter without touching history;
    /// lets tests manufacture drift for audit scenarios
    pub fn tamper_item_stock(&self, item_code: &str, stock: BigDecimal) {
        let mut inner = self.inner.write().unwrap();
        if let Some(item) = inner.items.get_mut(item_code) {
            item.current_stock = stock;
        }
    }
}

fn matches_common(
    filter: &TxnFilter,
    date: chrono::NaiveDate,
    cancelled: bool,
) -> bool {
    if cancelled && !filter.include_cancelled {
        return false;
    }
    match &filter.range {
        Some(range) => range.contains(date),
        None => true,
    }
}

fn matches_purchase(filter: &TxnFilter, purchase: &Purchase) -> bool {
    if !matches_common(filter, purchase.date, purchase.cancelled) {
        return false;
    }
    let counterparty_ok = match &filter.counterparty {
        None => true,
        Some(CounterpartyKey::Supplier(code)) => purchase.supplier_code == *code,
        Some(CounterpartyKey::Project(id)) => purchase.project_id.as_deref() == Some(id),
        Some(CounterpartyKey::Customer(_)) => false,
    };
    let project_ok = match &filter.project_id {
        Some(id) => purchase.project_id.as_deref() == Some(id),
        None => true,
    };
    let item_ok = match &filter.item_code {
        Some(code) => purchase.item_code == *code,
        None => true,
    };
    counterparty_ok && project_ok && item_ok
}

fn matches_bank_payment(filter: &TxnFilter, payment: &BankPayment) -> bool {
    if !matches_common(filter, payment.date, payment.cancelled) {
        return false;
    }
    if filter.item_code.is_some() {
        return false;
    }
    let counterparty_ok = match &filter.counterparty {
        None => true,
        Some(key) => payment.counterparty.as_ref() == Some(key),
    };
    let project_ok = match &filter.project_id {
        Some(id) => payment.project_id.as_deref() == Some(id),
        None => true,
    };
    counterparty_ok && project_ok
}

fn matches_cash_payment(filter: &TxnFilter, payment: &CashPayment) -> bool {
    if !matches_common(filter, payment.date, payment.cancelled) {
        return false;
    }
    if filter.item_code.is_some() {
        return false;
    }
    let counterparty_ok = match &filter.counterparty {
        None => true,
        Some(CounterpartyKey::Project(id)) => payment.project_id.as_deref() == Some(id),
        Some(_) => false,
    };
    let project_ok = match &filter.project_id {
        Some(id) => payment.project_id.as_deref() == Some(id),
        None => true,
    };
    counterparty_ok && project_ok
}

fn matches_sales_invoice(filter: &TxnFilter, invoice: &SalesInvoice) -> bool {
    if !matches_common(filter, invoice.date, invoice.cancelled) {
        return false;
    }
    let counterparty_ok = match &filter.counterparty {
        None => true,
        Some(CounterpartyKey::Customer(id)) => invoice.customer_id == *id,
        Some(CounterpartyKey::Project(id)) => invoice.project_id.as_deref() == Some(id),
        Some(CounterpartyKey::Supplier(_)) => false,
    };
    let project_ok = match &filter.project_id {
        Some(id) => invoice.project_id.as_deref() == Some(id),
        None => true,
    };
    let item_ok = match &filter.item_code {
        Some(code) => invoice.lines.iter().any(|line| line.item_code == *code),
        None => true,
    };
    counterparty_ok && project_ok && item_ok
}

fn matches_plot_sale(filter: &TxnFilter, sale: &PlotSale) -> bool {
    if !matches_common(filter, sale.date, sale.cancelled) {
        return false;
    }
    if filter.item_code.is_some() {
        return false;
    }
    let counterparty_ok = match &filter.counterparty {
        None => true,
        Some(CounterpartyKey::Customer(id)) => sale.customer_id == *id,
        Some(CounterpartyKey::Project(id)) => sale.project_id == *id,
        Some(CounterpartyKey::Supplier(_)) => false,
    };
    let project_ok = match &filter.project_id {
        Some(id) => sale.project_id == *id,
        None => true,
    };
    counterparty_ok && project_ok
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn get_supplier(&self, code: &str) -> EngineResult<Option<Supplier>> {
        Ok(self.inner.read().unwrap().suppliers.get(code).cloned())
    }

    async fn get_customer(&self, customer_id: &str) -> EngineResult<Option<Customer>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .customers
            .get(customer_id)
            .cloned())
    }

    async fn get_project(&self, project_id: &str) -> EngineResult<Option<Project>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .projects
            .get(project_id)
            .cloned())
    }

    async fn get_item(&self, item_code: &str) -> EngineResult<Option<Item>> {
        Ok(self.inner.read().unwrap().items.get(item_code).cloned())
    }

    async fn list_items(&self) -> EngineResult<Vec<Item>> {
        let inner = self.inner.read().unwrap();
        let mut items: Vec<Item> = inner.items.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn list_projects(&self) -> EngineResult<Vec<Project>> {
        let inner = self.inner.read().unwrap();
        let mut projects: Vec<Project> = inner.projects.values().cloned().collect();
        projects.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(projects)
    }

    async fn purchases(&self, filter: &TxnFilter) -> EngineResult<Vec<Purchase>> {
        let inner = self.inner.read().unwrap();
        let mut matched: Vec<Purchase> = inner
            .purchases
            .values()
            .filter(|purchase| matches_purchase(filter, purchase))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.date.cmp(&b.date).then(a.seq.cmp(&b.seq)));
        Ok(matched)
    }

    async fn bank_payments(&self, filter: &TxnFilter) -> EngineResult<Vec<BankPayment>> {
        let inner = self.inner.read().unwrap();
        let mut matched: Vec<BankPayment> = inner
            .bank_payments
            .values()
            .filter(|payment| matches_bank_payment(filter, payment))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.date.cmp(&b.date).then(a.seq.cmp(&b.seq)));
        Ok(matched)
    }

    async fn cash_payments(&self, filter: &TxnFilter) -> EngineResult<Vec<CashPayment>> {
        let inner = self.inner.read().unwrap();
        let mut matched: Vec<CashPayment> = inner
            .cash_payments
            .values()
            .filter(|payment| matches_cash_payment(filter, payment))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.date.cmp(&b.date).then(a.seq.cmp(&b.seq)));
        Ok(matched)
    }

    async fn sales_invoices(&self, filter: &TxnFilter) -> EngineResult<Vec<SalesInvoice>> {
        let inner = self.inner.read().unwrap();
        let mut matched: Vec<SalesInvoice> = inner
            .sales_invoices
            .values()
            .filter(|invoice| matches_sales_invoice(filter, invoice))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.date.cmp(&b.date).then(a.seq.cmp(&b.seq)));
        Ok(matched)
    }

    async fn plot_sales(&self, filter: &TxnFilter) -> EngineResult<Vec<PlotSale>> {
        let inner = self.inner.read().unwrap();
        let mut matched: Vec<PlotSale> = inner
            .plot_sales
            .values()
            .filter(|sale| matches_plot_sale(filter, sale))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.date.cmp(&b.date).then(a.seq.cmp(&b.seq)));
        Ok(matched)
    }

    async fn get_purchase(&self, id: &Uuid) -> EngineResult<Option<Purchase>> {
        Ok(self.inner.read().unwrap().purchases.get(id).cloned())
    }

    async fn get_sales_invoice(&self, id: &Uuid) -> EngineResult<Option<SalesInvoice>> {
        Ok(self.inner.read().unwrap().sales_invoices.get(id).cloned())
    }

    async fn get_plot_sale(&self, id: &Uuid) -> EngineResult<Option<PlotSale>> {
        Ok(self.inner.read().unwrap().plot_sales.get(id).cloned())
    }

    async fn insert_bank_payment(&mut self, payment: &BankPayment) -> EngineResult<BankPayment> {
        let mut inner = self.inner.write().unwrap();
        let mut stored = payment.clone();
        stored.seq = inner.next_seq();
        inner.bank_payments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_purchase(
        &mut self,
        purchase: &Purchase,
        expected_version: u64,
    ) -> EngineResult<Purchase> {
        let mut inner = self.inner.write().unwrap();
        let slot = inner
            .purchases
            .get_mut(&purchase.id)
            .ok_or_else(|| EngineError::NotFound(format!("purchase '{}'", purchase.id)))?;
        if slot.version != expected_version {
            return Err(EngineError::Conflict(format!(
                "purchase '{}' is at version {}, expected {}",
                purchase.id, slot.version, expected_version
            )));
        }
        let mut updated = purchase.clone();
        updated.seq = slot.seq;
        updated.version = expected_version + 1;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn update_sales_invoice(
        &mut self,
        invoice: &SalesInvoice,
        expected_version: u64,
    ) -> EngineResult<SalesInvoice> {
        let mut inner = self.inner.write().unwrap();
        let slot = inner
            .sales_invoices
            .get_mut(&invoice.id)
            .ok_or_else(|| EngineError::NotFound(format!("sales invoice '{}'", invoice.id)))?;
        if slot.version != expected_version {
            return Err(EngineError::Conflict(format!(
                "sales invoice '{}' is at version {}, expected {}",
                invoice.id, slot.version, expected_version
            )));
        }
        let mut updated = invoice.clone();
        updated.seq = slot.seq;
        updated.version = expected_version + 1;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn update_plot_sale(
        &mut self,
        sale: &PlotSale,
        expected_version: u64,
    ) -> EngineResult<PlotSale> {
        let mut inner = self.inner.write().unwrap();
        let slot = inner
            .plot_sales
            .get_mut(&sale.id)
            .ok_or_else(|| EngineError::NotFound(format!("plot sale '{}'", sale.id)))?;
        if slot.version != expected_version {
            return Err(EngineError::Conflict(format!(
                "plot sale '{}' is at version {}, expected {}",
                sale.id, slot.version, expected_version
            )));
        }
        let mut updated = sale.clone();
        updated.seq = slot.seq;
        updated.version = expected_version + 1;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn adjust_item_stock(
        &mut self,
        item_code: &str,
        delta: &BigDecimal,
    ) -> EngineResult<Item> {
        let mut inner = self.inner.write().unwrap();
        let item = inner
            .items
            .get_mut(item_code)
            .ok_or_else(|| EngineError::NotFound(format!("item '{item_code}'")))?;
        item.current_stock += delta;
        item.version += 1;
        Ok(item.clone())
    }

    async fn next_reference(&mut self, prefix: &str) -> EngineResult<String> {
        let mut inner = self.inner.write().unwrap();
        let counter = inner
            .reference_counters
            .entry(prefix.to_string())
            .or_insert(0);
        *counter += 1;
        Ok(format!("{prefix}{:06}", *counter))
    }
}
