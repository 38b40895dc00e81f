//! Top-level engine facade coordinating ledgers, reconciliation, and reports

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::ledger::LedgerBuilder;
use crate::reconcile::{PaymentReceipt, PaymentTarget, Reconciler};
use crate::reports::{
    DashboardStats, IncomeStatement, InventoryReport, ProjectProgress, ReportGenerator,
};
use crate::traits::*;
use crate::types::*;

/// Reconciliation engine over a transaction store
///
/// Computation is request-scoped and stateless: every read operation is a
/// pure function of store contents, so clones of the engine can serve
/// concurrent requests against the same store.
pub struct Engine<S: TransactionStore> {
    ledger: LedgerBuilder<S>,
    reconciler: Reconciler<S>,
    reports: ReportGenerator<S>,
}

impl<S: TransactionStore + Clone> Engine<S> {
    /// Create an engine over the given store
    pub fn new(store: S) -> Self {
        Self {
            ledger: LedgerBuilder::new(store.clone()),
            reconciler: Reconciler::new(store.clone()),
            reports: ReportGenerator::new(store),
        }
    }

    /// Create an engine with a custom bound on conflict retries
    pub fn with_max_retries(store: S, max_retries: u32) -> Self {
        Self {
            ledger: LedgerBuilder::new(store.clone()),
            reconciler: Reconciler::with_max_retries(store.clone(), max_retries),
            reports: ReportGenerator::new(store),
        }
    }

    // Ledger operations
    /// Build the chronological ledger for a counterparty
    pub async fn build_ledger(
        &self,
        key: &CounterpartyKey,
        range: Option<&DateRange>,
    ) -> EngineResult<LedgerReport> {
        self.ledger.build(key, range).await
    }

    // Report operations
    /// Build an income statement for a period
    pub async fn income_statement(
        &self,
        range: Option<&DateRange>,
    ) -> EngineResult<IncomeStatement> {
        self.reports.income_statement(range).await
    }

    /// Build the inventory report
    pub async fn inventory_report(&self) -> EngineResult<InventoryReport> {
        self.reports.inventory_report().await
    }

    /// Build dashboard statistics for the month containing `today`
    pub async fn dashboard_stats(&self, today: NaiveDate) -> EngineResult<DashboardStats> {
        self.reports.dashboard_stats(today).await
    }

    /// Compute budget consumption for one project
    pub async fn project_progress(&self, project_id: &str) -> EngineResult<ProjectProgress> {
        self.reports.project_progress(project_id).await
    }

    // Reconciliation operations
    /// Replay an item's history and compare against its cached counter
    pub async fn reconcile_stock(&self, item_code: &str) -> EngineResult<StockAudit> {
        self.reconciler.reconcile_stock(item_code).await
    }

    /// Replay an item's purchase and sale history
    pub async fn stock_state(&self, item_code: &str) -> EngineResult<StockState> {
        self.reconciler.stock_state(item_code).await
    }

    /// Record a payment against a payable or receivable document
    pub async fn record_payment(
        &mut self,
        target: &PaymentTarget,
        amount: &BigDecimal,
        date: NaiveDate,
        description: Option<&str>,
    ) -> EngineResult<PaymentReceipt> {
        self.reconciler
            .record_payment(target, amount, date, description)
            .await
    }

    /// Counter step attached to a purchase write
    pub async fn apply_purchase(&mut self, purchase: &Purchase) -> EngineResult<Item> {
        self.reconciler.apply_purchase(purchase).await
    }

    /// Counter step attached to an invoice write
    pub async fn apply_sale(&mut self, invoice: &SalesInvoice) -> EngineResult<()> {
        self.reconciler.apply_sale(invoice).await
    }

    /// Flag a purchase as cancelled and reverse its stock movement
    pub async fn cancel_purchase(&mut self, id: &Uuid) -> EngineResult<Purchase> {
        self.reconciler.cancel_purchase(id).await
    }

    /// Flag an invoice as cancelled and return its quantities to stock
    pub async fn cancel_sales_invoice(&mut self, id: &Uuid) -> EngineResult<SalesInvoice> {
        self.reconciler.cancel_sales_invoice(id).await
    }
}
