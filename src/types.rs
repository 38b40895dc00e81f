//! Core types and data structures for the reconciliation engine

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Side of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Debit - raises what the counterparty owes (purchases, invoices)
    Debit,
    /// Credit - settles an obligation (payments, receipts)
    Credit,
}

/// Settlement state of a payable or receivable document
///
/// The status is a pure function of `(amount_paid, net_amount)` and must never
/// be stored independently of the paid counter; construct it through
/// [`PaymentStatus::from_amounts`] only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Nothing has been paid against the document
    Unpaid,
    /// A partial amount has been paid
    Partial,
    /// The full net amount (or more) has been paid
    Paid,
}

impl PaymentStatus {
    /// Derive the status from the paid counter and the document's net amount
    pub fn from_amounts(amount_paid: &BigDecimal, net_amount: &BigDecimal) -> Self {
        let zero = BigDecimal::from(0);
        if *amount_paid == zero {
            PaymentStatus::Unpaid
        } else if amount_paid >= net_amount {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        }
    }
}

/// Key identifying the other party of a ledger
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterpartyKey {
    /// Supplier code (e.g. "SUP001")
    Supplier(String),
    /// Customer id
    Customer(String),
    /// Project id
    Project(String),
}

impl CounterpartyKey {
    /// Human-readable label used in error messages
    pub fn label(&self) -> String {
        match self {
            CounterpartyKey::Supplier(code) => format!("supplier '{code}'"),
            CounterpartyKey::Customer(id) => format!("customer '{id}'"),
            CounterpartyKey::Project(id) => format!("project '{id}'"),
        }
    }
}

/// Inclusive date window applied to queries and reports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First date included, open-ended when `None`
    pub start: Option<NaiveDate>,
    /// Last date included, open-ended when `None`
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Create a range, rejecting a start date after the end date
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> EngineResult<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    /// Check that the bounds are ordered
    pub fn validate(&self) -> EngineResult<()> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(EngineError::Validation(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }
        Ok(())
    }

    /// Whether a date falls inside the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }
}

/// Purchase of inventory from a supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    /// Unique identifier
    pub id: Uuid,
    /// Human-facing serial reference (e.g. "PO000001")
    pub serial_no: String,
    /// Date of the purchase
    pub date: NaiveDate,
    /// Supplier the purchase was made from
    pub supplier_code: String,
    /// Project the purchase is attributed to, if any
    pub project_id: Option<String>,
    /// Item purchased
    pub item_code: String,
    /// Item name captured at purchase time
    pub item_name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Quantity purchased
    pub quantity: BigDecimal,
    /// Unit rate
    pub rate: BigDecimal,
    /// Quantity x rate before discount
    pub gross_amount: BigDecimal,
    /// Optional discount, treated as zero when absent
    pub discount: Option<BigDecimal>,
    /// Gross amount minus discount
    pub net_amount: BigDecimal,
    /// Total paid so far against this purchase
    pub amount_paid: BigDecimal,
    /// Derived from `amount_paid` and `net_amount`
    pub payment_status: PaymentStatus,
    /// Cancelled records are excluded from every aggregate
    pub cancelled: bool,
    /// Store-assigned creation counter, the stable ordering tie-break
    pub seq: u64,
    /// Optimistic-concurrency token
    pub version: u64,
}

impl Purchase {
    /// Create a purchase; gross and net amounts are computed from quantity and rate
    pub fn new(
        serial_no: impl Into<String>,
        date: NaiveDate,
        supplier_code: impl Into<String>,
        item_code: impl Into<String>,
        item_name: impl Into<String>,
        quantity: BigDecimal,
        rate: BigDecimal,
    ) -> Self {
        let gross = &quantity * &rate;
        Self {
            id: Uuid::new_v4(),
            serial_no: serial_no.into(),
            date,
            supplier_code: supplier_code.into(),
            project_id: None,
            item_code: item_code.into(),
            item_name: item_name.into(),
            description: None,
            quantity,
            rate,
            net_amount: gross.clone(),
            gross_amount: gross,
            discount: None,
            amount_paid: BigDecimal::from(0),
            payment_status: PaymentStatus::Unpaid,
            cancelled: false,
            seq: 0,
            version: 0,
        }
    }

    /// Attribute the purchase to a project
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Apply a discount and recompute the net amount
    pub fn with_discount(mut self, discount: BigDecimal) -> Self {
        self.net_amount = &self.gross_amount - &discount;
        self.discount = Some(discount);
        self
    }

    /// Set the free-text description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Outstanding balance against the purchase
    pub fn balance(&self) -> BigDecimal {
        &self.net_amount - &self.amount_paid
    }
}

/// Payment issued from a bank account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankPayment {
    /// Unique identifier
    pub id: Uuid,
    /// Store-assigned voucher reference (e.g. "BP000001")
    pub voucher_no: String,
    /// Payment date
    pub date: NaiveDate,
    /// Explicit counterparty reference; legacy rows that named their payee in
    /// free text must be adopted through `utils::legacy` before the engine
    /// sees them
    pub counterparty: Option<CounterpartyKey>,
    /// Project the payment is attributed to, if any
    pub project_id: Option<String>,
    /// Free-text description, also drives expense classification
    pub description: Option<String>,
    /// Amount paid
    pub amount: BigDecimal,
    /// Cancelled records are excluded from every aggregate
    pub cancelled: bool,
    /// Store-assigned creation counter
    pub seq: u64,
    /// Optimistic-concurrency token
    pub version: u64,
}

impl BankPayment {
    /// Create a bank payment
    pub fn new(voucher_no: impl Into<String>, date: NaiveDate, amount: BigDecimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            voucher_no: voucher_no.into(),
            date,
            counterparty: None,
            project_id: None,
            description: None,
            amount,
            cancelled: false,
            seq: 0,
            version: 0,
        }
    }

    /// Reference the counterparty the payment settles
    pub fn with_counterparty(mut self, counterparty: CounterpartyKey) -> Self {
        self.counterparty = Some(counterparty);
        self
    }

    /// Attribute the payment to a project
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Set the free-text description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Petty-cash payment for day-to-day site spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashPayment {
    /// Unique identifier
    pub id: Uuid,
    /// Store-assigned voucher reference (e.g. "CP000001")
    pub voucher_no: String,
    /// Payment date
    pub date: NaiveDate,
    /// Project the payment is attributed to, if any
    pub project_id: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// Amount paid
    pub amount: BigDecimal,
    /// Cancelled records are excluded from every aggregate
    pub cancelled: bool,
    /// Store-assigned creation counter
    pub seq: u64,
}

impl CashPayment {
    /// Create a cash payment
    pub fn new(voucher_no: impl Into<String>, date: NaiveDate, amount: BigDecimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            voucher_no: voucher_no.into(),
            date,
            project_id: None,
            description: None,
            amount,
            cancelled: false,
            seq: 0,
        }
    }

    /// Attribute the payment to a project
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Set the free-text description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One line of a sales invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Item sold
    pub item_code: String,
    /// Item name captured at invoice time
    pub item_name: String,
    /// Quantity sold
    pub quantity: BigDecimal,
    /// Unit rate
    pub rate: BigDecimal,
    /// Quantity x rate
    pub amount: BigDecimal,
}

impl InvoiceLine {
    /// Create a line; the amount is computed from quantity and rate
    pub fn new(
        item_code: impl Into<String>,
        item_name: impl Into<String>,
        quantity: BigDecimal,
        rate: BigDecimal,
    ) -> Self {
        let amount = &quantity * &rate;
        Self {
            item_code: item_code.into(),
            item_name: item_name.into(),
            quantity,
            rate,
            amount,
        }
    }
}

/// Invoice issued to a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesInvoice {
    /// Unique identifier
    pub id: Uuid,
    /// Human-facing serial reference (e.g. "SI000001")
    pub serial_no: String,
    /// Invoice date
    pub date: NaiveDate,
    /// Customer billed
    pub customer_id: String,
    /// Project the sale belongs to, if any
    pub project_id: Option<String>,
    /// Line items
    pub lines: Vec<InvoiceLine>,
    /// Sum of line amounts
    pub net_total: BigDecimal,
    /// Total received so far against this invoice
    pub amount_received: BigDecimal,
    /// Derived from `amount_received` and `net_total`
    pub status: PaymentStatus,
    /// Cancelled records are excluded from every aggregate
    pub cancelled: bool,
    /// Store-assigned creation counter
    pub seq: u64,
    /// Optimistic-concurrency token
    pub version: u64,
}

impl SalesInvoice {
    /// Create an invoice; the net total is computed from the lines
    pub fn new(
        serial_no: impl Into<String>,
        date: NaiveDate,
        customer_id: impl Into<String>,
        lines: Vec<InvoiceLine>,
    ) -> Self {
        let net_total: BigDecimal = lines.iter().map(|line| &line.amount).sum();
        Self {
            id: Uuid::new_v4(),
            serial_no: serial_no.into(),
            date,
            customer_id: customer_id.into(),
            project_id: None,
            lines,
            net_total,
            amount_received: BigDecimal::from(0),
            status: PaymentStatus::Unpaid,
            cancelled: false,
            seq: 0,
            version: 0,
        }
    }

    /// Attribute the invoice to a project
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Outstanding balance against the invoice
    pub fn balance(&self) -> BigDecimal {
        &self.net_total - &self.amount_received
    }
}

/// Sale of a plot within a land project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSale {
    /// Unique identifier
    pub id: Uuid,
    /// Plot number (e.g. "A-14")
    pub plot_number: String,
    /// Sale date
    pub date: NaiveDate,
    /// Project the plot belongs to
    pub project_id: String,
    /// Buying customer
    pub customer_id: String,
    /// Agreed sale price
    pub final_price: BigDecimal,
    /// Total received so far against the sale
    pub amount_received: BigDecimal,
    /// Derived from `amount_received` and `final_price`
    pub status: PaymentStatus,
    /// Cancelled records are excluded from every aggregate
    pub cancelled: bool,
    /// Store-assigned creation counter
    pub seq: u64,
    /// Optimistic-concurrency token
    pub version: u64,
}

impl PlotSale {
    /// Create a plot sale
    pub fn new(
        plot_number: impl Into<String>,
        date: NaiveDate,
        project_id: impl Into<String>,
        customer_id: impl Into<String>,
        final_price: BigDecimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            plot_number: plot_number.into(),
            date,
            project_id: project_id.into(),
            customer_id: customer_id.into(),
            final_price,
            amount_received: BigDecimal::from(0),
            status: PaymentStatus::Unpaid,
            cancelled: false,
            seq: 0,
            version: 0,
        }
    }

    /// Outstanding balance against the sale
    pub fn balance(&self) -> BigDecimal {
        &self.final_price - &self.amount_received
    }
}

/// Transaction variant over the five independent record streams
///
/// Uniform accessors let callers merge heterogeneous streams without caring
/// which collection a record came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transaction {
    Purchase(Purchase),
    BankPayment(BankPayment),
    CashPayment(CashPayment),
    SalesInvoice(SalesInvoice),
    PlotSale(PlotSale),
}

impl Transaction {
    /// Unique identifier of the underlying record
    pub fn id(&self) -> Uuid {
        match self {
            Transaction::Purchase(p) => p.id,
            Transaction::BankPayment(p) => p.id,
            Transaction::CashPayment(p) => p.id,
            Transaction::SalesInvoice(i) => i.id,
            Transaction::PlotSale(s) => s.id,
        }
    }

    /// Transaction date
    pub fn date(&self) -> NaiveDate {
        match self {
            Transaction::Purchase(p) => p.date,
            Transaction::BankPayment(p) => p.date,
            Transaction::CashPayment(p) => p.date,
            Transaction::SalesInvoice(i) => i.date,
            Transaction::PlotSale(s) => s.date,
        }
    }

    /// Human-facing reference
    pub fn reference(&self) -> &str {
        match self {
            Transaction::Purchase(p) => &p.serial_no,
            Transaction::BankPayment(p) => &p.voucher_no,
            Transaction::CashPayment(p) => &p.voucher_no,
            Transaction::SalesInvoice(i) => &i.serial_no,
            Transaction::PlotSale(s) => &s.plot_number,
        }
    }

    /// Monetary value of the record
    pub fn amount(&self) -> &BigDecimal {
        match self {
            Transaction::Purchase(p) => &p.net_amount,
            Transaction::BankPayment(p) => &p.amount,
            Transaction::CashPayment(p) => &p.amount,
            Transaction::SalesInvoice(i) => &i.net_total,
            Transaction::PlotSale(s) => &s.final_price,
        }
    }

    /// Ledger side from the counterparty's perspective: purchases and sales
    /// raise an obligation, payments settle one
    pub fn direction(&self) -> Direction {
        match self {
            Transaction::Purchase(_) | Transaction::SalesInvoice(_) | Transaction::PlotSale(_) => {
                Direction::Debit
            }
            Transaction::BankPayment(_) | Transaction::CashPayment(_) => Direction::Credit,
        }
    }

    /// Cancelled flag
    pub fn cancelled(&self) -> bool {
        match self {
            Transaction::Purchase(p) => p.cancelled,
            Transaction::BankPayment(p) => p.cancelled,
            Transaction::CashPayment(p) => p.cancelled,
            Transaction::SalesInvoice(i) => i.cancelled,
            Transaction::PlotSale(s) => s.cancelled,
        }
    }

    /// Creation-order tie-break
    pub fn seq(&self) -> u64 {
        match self {
            Transaction::Purchase(p) => p.seq,
            Transaction::BankPayment(p) => p.seq,
            Transaction::CashPayment(p) => p.seq,
            Transaction::SalesInvoice(i) => i.seq,
            Transaction::PlotSale(s) => s.seq,
        }
    }
}

/// Supplier master record (consumed read-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    /// Unique supplier code
    pub code: String,
    /// Supplier name
    pub name: String,
    /// Inactive suppliers still appear in historical ledgers
    pub active: bool,
}

impl Supplier {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            active: true,
        }
    }
}

/// Customer master record (consumed read-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer id
    pub id: String,
    /// Customer name
    pub name: String,
}

impl Customer {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Lifecycle state of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    Active,
    Completed,
    OnHold,
}

/// Project master record (consumed read-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique project id
    pub id: String,
    /// Project code
    pub code: String,
    /// Project name
    pub name: String,
    /// Lifecycle state
    pub status: ProjectStatus,
    /// Contracted value of the job, the preferred budget figure
    pub value_of_job: Option<BigDecimal>,
    /// Estimated cost, used as the budget when no job value exists
    pub estimated_cost: Option<BigDecimal>,
}

impl Project {
    pub fn new(id: impl Into<String>, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            status: ProjectStatus::Active,
            value_of_job: None,
            estimated_cost: None,
        }
    }

    /// Set the contracted job value
    pub fn with_value_of_job(mut self, value: BigDecimal) -> Self {
        self.value_of_job = Some(value);
        self
    }

    /// Set the estimated cost
    pub fn with_estimated_cost(mut self, cost: BigDecimal) -> Self {
        self.estimated_cost = Some(cost);
        self
    }

    /// Set the lifecycle state
    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }

    /// Budget used for progress tracking: job value, falling back to estimate
    pub fn budget(&self) -> Option<&BigDecimal> {
        self.value_of_job.as_ref().or(self.estimated_cost.as_ref())
    }
}

/// Inventory item master record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique item code
    pub code: String,
    /// Item name
    pub name: String,
    /// Inventory category, if any
    pub category: Option<String>,
    /// Measurement unit (e.g. "bag", "ton")
    pub unit: String,
    /// Selling price per unit, used for stock valuation
    pub selling_price: BigDecimal,
    /// Warehouse stock the item was created with
    pub opening_stock: BigDecimal,
    /// Cached running counter maintained at write time; the audit replay must
    /// reproduce it from opening stock plus the purchase and sale streams
    pub current_stock: BigDecimal,
    /// Threshold at or below which the item counts as low stock
    pub min_stock_level: BigDecimal,
    /// Optimistic-concurrency token
    pub version: u64,
}

impl Item {
    /// Create an item with zero stock
    pub fn new(code: impl Into<String>, name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            category: None,
            unit: unit.into(),
            selling_price: BigDecimal::from(0),
            opening_stock: BigDecimal::from(0),
            current_stock: BigDecimal::from(0),
            min_stock_level: BigDecimal::from(0),
            version: 0,
        }
    }

    /// Seed the opening stock; the running counter starts from it
    pub fn with_opening_stock(mut self, stock: BigDecimal) -> Self {
        self.current_stock = stock.clone();
        self.opening_stock = stock;
        self
    }

    /// Set the selling price
    pub fn with_selling_price(mut self, price: BigDecimal) -> Self {
        self.selling_price = price;
        self
    }

    /// Set the low-stock threshold
    pub fn with_min_stock_level(mut self, level: BigDecimal) -> Self {
        self.min_stock_level = level;
        self
    }

    /// Set the inventory category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Kind of a computed ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEntryKind {
    Purchase,
    Payment,
    Invoice,
    PlotSale,
}

/// One row of a counterparty ledger; computed, never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry date
    pub date: NaiveDate,
    /// Which stream the entry came from
    pub kind: LedgerEntryKind,
    /// Human-facing reference of the source record
    pub reference: String,
    /// Description shown on the ledger
    pub description: String,
    /// Debit amount (zero on credit entries)
    pub debit: BigDecimal,
    /// Credit amount (zero on debit entries)
    pub credit: BigDecimal,
    /// Cumulative debits minus credits up to and including this entry
    pub balance: BigDecimal,
}

/// Chronological ledger for one counterparty with running balances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerReport {
    /// The counterparty the ledger was built for
    pub counterparty: CounterpartyKey,
    /// Entries ordered by date, then creation order
    pub entries: Vec<LedgerEntry>,
    /// Sum of all debit amounts
    pub total_debit: BigDecimal,
    /// Sum of all credit amounts
    pub total_credit: BigDecimal,
    /// Final running balance; equals `total_debit - total_credit`
    pub balance: BigDecimal,
    /// Window the ledger covers; a filtered ledger starts from zero and does
    /// not carry the prior period's closing balance
    pub period: Option<DateRange>,
    /// Records excluded because of malformed fields
    pub skipped: Vec<SkippedRecord>,
}

/// Derived stock counters for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockState {
    /// Total quantity from non-cancelled purchases
    pub total_purchased: BigDecimal,
    /// Total quantity from non-cancelled invoice lines
    pub total_sold: BigDecimal,
    /// The cached running counter
    pub current_stock: BigDecimal,
}

/// Result of replaying an item's full history against its cached counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAudit {
    /// Item audited
    pub item_code: String,
    /// Opening stock plus purchases minus sales, replayed from history
    pub expected: BigDecimal,
    /// The cached running counter
    pub actual: BigDecimal,
    /// `actual - expected`; positive means the cache is high
    pub drift: BigDecimal,
}

impl StockAudit {
    /// Whether the cached counter matches the replay
    pub fn is_clean(&self) -> bool {
        self.drift == BigDecimal::from(0)
    }
}

/// A record excluded from a best-effort aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Reference of the excluded record
    pub reference: String,
    /// Why it was excluded
    pub reason: String,
}

/// Errors surfaced by the engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn payment_status_follows_amounts() {
        let net = BigDecimal::from(1000);
        assert_eq!(
            PaymentStatus::from_amounts(&BigDecimal::from(0), &net),
            PaymentStatus::Unpaid
        );
        assert_eq!(
            PaymentStatus::from_amounts(&BigDecimal::from(400), &net),
            PaymentStatus::Partial
        );
        assert_eq!(
            PaymentStatus::from_amounts(&BigDecimal::from(1000), &net),
            PaymentStatus::Paid
        );
        assert_eq!(
            PaymentStatus::from_amounts(&BigDecimal::from(1200), &net),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        let result = DateRange::new(Some(date(2024, 3, 1)), Some(date(2024, 2, 1)));
        assert!(matches!(result, Err(EngineError::Validation(_))));

        let open = DateRange::new(Some(date(2024, 3, 1)), None).unwrap();
        assert!(open.contains(date(2030, 1, 1)));
        assert!(!open.contains(date(2024, 2, 28)));
    }

    #[test]
    fn purchase_amounts_derive_from_quantity_and_rate() {
        let purchase = Purchase::new(
            "PO000001",
            date(2024, 1, 10),
            "SUP001",
            "CEM-01",
            "Cement",
            BigDecimal::from(10),
            BigDecimal::from(120),
        )
        .with_discount(BigDecimal::from(200));

        assert_eq!(purchase.gross_amount, BigDecimal::from(1200));
        assert_eq!(purchase.net_amount, BigDecimal::from(1000));
        assert_eq!(purchase.balance(), BigDecimal::from(1000));
        assert_eq!(purchase.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn transaction_accessors_cover_every_variant() {
        let purchase = Purchase::new(
            "PO000001",
            date(2024, 1, 10),
            "SUP001",
            "CEM-01",
            "Cement",
            BigDecimal::from(5),
            BigDecimal::from(100),
        );
        let txn = Transaction::Purchase(purchase);
        assert_eq!(txn.reference(), "PO000001");
        assert_eq!(txn.amount(), &BigDecimal::from(500));
        assert_eq!(txn.direction(), Direction::Debit);
        assert!(!txn.cancelled());

        let payment = BankPayment::new("BP000001", date(2024, 1, 12), BigDecimal::from(300));
        let txn = Transaction::BankPayment(payment);
        assert_eq!(txn.direction(), Direction::Credit);
    }

    #[test]
    fn project_budget_falls_back_to_estimated_cost() {
        let bare = Project::new("p1", "PRJ-01", "Tower A");
        assert!(bare.budget().is_none());

        let estimated = bare.clone().with_estimated_cost(BigDecimal::from(5000));
        assert_eq!(estimated.budget(), Some(&BigDecimal::from(5000)));

        let contracted = estimated.with_value_of_job(BigDecimal::from(8000));
        assert_eq!(contracted.budget(), Some(&BigDecimal::from(8000)));
    }

    #[test]
    fn invoice_totals_follow_lines() {
        let invoice = SalesInvoice::new(
            "SI000001",
            date(2024, 2, 1),
            "cust1",
            vec![
                InvoiceLine::new("CEM-01", "Cement", BigDecimal::from(4), BigDecimal::from(100)),
                InvoiceLine::new("STL-01", "Steel", BigDecimal::from(2), BigDecimal::from(300)),
            ],
        );
        assert_eq!(invoice.net_total, BigDecimal::from(1000));
        assert_eq!(invoice.balance(), BigDecimal::from(1000));
    }
}
