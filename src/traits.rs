//! Storage abstraction consumed by the engine

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::types::*;

/// Filter applied to transaction-stream queries
///
/// Stores interpret the counterparty key per stream: a supplier key selects
/// purchases by `supplier_code` and payments by their counterparty reference,
/// a customer key selects invoices, plot sales, and receipts, and a project
/// key selects records attributed to that project.
#[derive(Debug, Clone, Default)]
pub struct TxnFilter {
    /// Restrict to records referencing this counterparty
    pub counterparty: Option<CounterpartyKey>,
    /// Restrict to records attributed to this project
    pub project_id: Option<String>,
    /// Restrict to records touching this item
    pub item_code: Option<String>,
    /// Restrict to records inside this date window
    pub range: Option<DateRange>,
    /// Cancelled records are excluded unless explicitly requested
    pub include_cancelled: bool,
}

impl TxnFilter {
    /// Match every live record
    pub fn all() -> Self {
        Self::default()
    }

    /// Match live records referencing a counterparty
    pub fn for_counterparty(key: CounterpartyKey) -> Self {
        Self {
            counterparty: Some(key),
            ..Self::default()
        }
    }

    /// Match live records attributed to a project
    pub fn for_project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id.into()),
            ..Self::default()
        }
    }

    /// Match live records touching an item
    pub fn for_item(item_code: impl Into<String>) -> Self {
        Self {
            item_code: Some(item_code.into()),
            ..Self::default()
        }
    }

    /// Restrict the filter to a date window
    pub fn in_range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Also return cancelled records
    pub fn with_cancelled(mut self) -> Self {
        self.include_cancelled = true;
        self
    }
}

/// Storage abstraction for the transaction store
///
/// The engine is a pure function of store contents; this trait is its only
/// window onto the outside world. Implementations may be backed by any
/// document or relational database. Query methods must return records ordered
/// by `(date, seq)` ascending so that ledger tie-breaks are deterministic.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Look up a supplier by code
    async fn get_supplier(&self, code: &str) -> EngineResult<Option<Supplier>>;

    /// Look up a customer by id
    async fn get_customer(&self, customer_id: &str) -> EngineResult<Option<Customer>>;

    /// Look up a project by id
    async fn get_project(&self, project_id: &str) -> EngineResult<Option<Project>>;

    /// Look up an item by code
    async fn get_item(&self, item_code: &str) -> EngineResult<Option<Item>>;

    /// List every inventory item
    async fn list_items(&self) -> EngineResult<Vec<Item>>;

    /// List every project
    async fn list_projects(&self) -> EngineResult<Vec<Project>>;

    /// Query the purchase stream
    async fn purchases(&self, filter: &TxnFilter) -> EngineResult<Vec<Purchase>>;

    /// Query the bank-payment stream
    async fn bank_payments(&self, filter: &TxnFilter) -> EngineResult<Vec<BankPayment>>;

    /// Query the cash-payment stream
    async fn cash_payments(&self, filter: &TxnFilter) -> EngineResult<Vec<CashPayment>>;

    /// Query the sales-invoice stream; an item filter matches invoices with at
    /// least one line for that item
    async fn sales_invoices(&self, filter: &TxnFilter) -> EngineResult<Vec<SalesInvoice>>;

    /// Query the plot-sale stream
    async fn plot_sales(&self, filter: &TxnFilter) -> EngineResult<Vec<PlotSale>>;

    /// Fetch a single purchase
    async fn get_purchase(&self, id: &Uuid) -> EngineResult<Option<Purchase>>;

    /// Fetch a single sales invoice
    async fn get_sales_invoice(&self, id: &Uuid) -> EngineResult<Option<SalesInvoice>>;

    /// Fetch a single plot sale
    async fn get_plot_sale(&self, id: &Uuid) -> EngineResult<Option<PlotSale>>;

    /// Persist a bank payment, assigning its creation sequence; returns the
    /// stored record
    async fn insert_bank_payment(&mut self, payment: &BankPayment) -> EngineResult<BankPayment>;

    /// Conditionally replace a purchase; fails with `Conflict` when the stored
    /// version differs from `expected_version`
    async fn update_purchase(
        &mut self,
        purchase: &Purchase,
        expected_version: u64,
    ) -> EngineResult<Purchase>;

    /// Conditionally replace a sales invoice; fails with `Conflict` when the
    /// stored version differs from `expected_version`
    async fn update_sales_invoice(
        &mut self,
        invoice: &SalesInvoice,
        expected_version: u64,
    ) -> EngineResult<SalesInvoice>;

    /// Conditionally replace a plot sale; fails with `Conflict` when the
    /// stored version differs from `expected_version`
    async fn update_plot_sale(
        &mut self,
        sale: &PlotSale,
        expected_version: u64,
    ) -> EngineResult<PlotSale>;

    /// Atomically add `delta` to an item's cached stock counter
    async fn adjust_item_stock(&mut self, item_code: &str, delta: &BigDecimal)
        -> EngineResult<Item>;

    /// Allocate the next reference for a two-letter prefix, zero-padded to six
    /// digits (e.g. "BP000001")
    async fn next_reference(&mut self, prefix: &str) -> EngineResult<String>;
}
