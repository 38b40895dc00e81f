//! Aggregate report generation
//!
//! Composes the classifier, the transaction streams, and the cached counters
//! into income statements, inventory reports, dashboard statistics, and
//! project progress figures. Reports are best-effort: malformed records are
//! excluded, logged, and listed instead of failing the whole report.

use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::classify::{ExpenseBreakdown, ExpenseCategory};
use crate::traits::*;
use crate::types::*;

/// Income statement over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    /// Period covered, open-ended when absent
    pub period: Option<DateRange>,
    /// Sum of non-cancelled invoice net totals
    pub revenue: BigDecimal,
    /// Expenses bucketed into the seven categories; purchases always count as
    /// material expense, bank payments are classified by description
    pub expenses: ExpenseBreakdown,
    /// Sum across all expense buckets
    pub total_expenses: BigDecimal,
    /// Revenue minus total expenses
    pub gross_profit: BigDecimal,
    /// Amounts received above invoice totals
    pub other_income: BigDecimal,
    /// Gross profit plus other income
    pub net_income: BigDecimal,
    /// Records excluded because of malformed fields
    pub skipped: Vec<SkippedRecord>,
}

/// Stock level classification for an inventory item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryStatus {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Low Stock")]
    LowStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl std::fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            InventoryStatus::InStock => "In Stock",
            InventoryStatus::LowStock => "Low Stock",
            InventoryStatus::OutOfStock => "Out of Stock",
        };
        f.write_str(label)
    }
}

/// One row of the inventory report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryLine {
    pub item_code: String,
    pub item_name: String,
    pub category: Option<String>,
    pub unit: String,
    pub opening_stock: BigDecimal,
    /// Quantity from non-cancelled purchases
    pub purchased: BigDecimal,
    /// Quantity from non-cancelled invoice lines
    pub sold: BigDecimal,
    /// The cached running counter
    pub current_stock: BigDecimal,
    pub rate: BigDecimal,
    /// Current stock valued at the selling price
    pub stock_value: BigDecimal,
    pub min_stock_level: BigDecimal,
    pub status: InventoryStatus,
}

/// Headline figures over the whole inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_items: usize,
    pub total_inventory_value: BigDecimal,
    pub low_stock_items: usize,
    pub out_of_stock_items: usize,
    pub in_stock_items: usize,
}

/// Inventory report: summary plus one line per item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryReport {
    pub summary: InventorySummary,
    pub items: Vec<InventoryLine>,
}

/// Dashboard statistics with month-over-month comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_sales: BigDecimal,
    pub sales_change: String,
    pub total_expenses: BigDecimal,
    pub expenses_change: String,
    pub net_profit: BigDecimal,
    pub profit_change: String,
    pub active_projects: usize,
    pub projects_change: String,
}

/// Budget consumption for one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectProgress {
    pub project_id: String,
    pub name: String,
    pub status: ProjectStatus,
    /// Job value, falling back to the estimated cost
    pub budget: Option<BigDecimal>,
    /// Attributable purchases plus bank payments
    pub spent: BigDecimal,
    /// Percentage of budget consumed, capped at 100
    pub progress: BigDecimal,
}

/// Month-over-month change formatted for the dashboard
///
/// `(current - previous) / previous * 100` with a division-by-zero guard:
/// growth from nothing reads "+100%", no movement reads "0%".
pub fn percent_change(current: &BigDecimal, previous: &BigDecimal) -> String {
    let zero = BigDecimal::from(0);
    if *previous == zero {
        if *current > zero {
            return "+100%".to_string();
        }
        return "0%".to_string();
    }
    let pct = ((current - previous) * BigDecimal::from(100) / previous).round(1);
    if pct >= zero {
        format!("+{pct}%")
    } else {
        format!("{pct}%")
    }
}

/// Classify a cached stock level against its low-stock threshold
pub fn stock_status(current_stock: &BigDecimal, min_stock_level: &BigDecimal) -> InventoryStatus {
    let zero = BigDecimal::from(0);
    if *current_stock <= zero {
        InventoryStatus::OutOfStock
    } else if current_stock <= min_stock_level {
        InventoryStatus::LowStock
    } else {
        InventoryStatus::InStock
    }
}

struct PeriodTotals {
    sales: BigDecimal,
    expenses: BigDecimal,
}

/// Generates aggregate reports from the transaction store
pub struct ReportGenerator<S: TransactionStore> {
    store: S,
}

impl<S: TransactionStore> ReportGenerator<S> {
    /// Create a generator over the given store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Build an income statement for a period
    pub async fn income_statement(
        &self,
        range: Option<&DateRange>,
    ) -> EngineResult<IncomeStatement> {
        if let Some(range) = range {
            range.validate()?;
        }
        let filter = match range {
            Some(range) => TxnFilter::all().in_range(range.clone()),
            None => TxnFilter::all(),
        };
        let zero = BigDecimal::from(0);
        let mut skipped = Vec::new();

        let mut revenue = BigDecimal::from(0);
        let mut other_income = BigDecimal::from(0);
        for invoice in self.store.sales_invoices(&filter).await? {
            if invoice.net_total < zero {
                tracing::warn!(
                    reference = %invoice.serial_no,
                    "excluding invoice with negative net total from income statement"
                );
                skipped.push(SkippedRecord {
                    reference: invoice.serial_no.clone(),
                    reason: format!("negative net total {}", invoice.net_total),
                });
                continue;
            }
            revenue += &invoice.net_total;
            let excess = &invoice.amount_received - &invoice.net_total;
            if excess > zero {
                other_income += excess;
            }
        }

        let mut expenses = ExpenseBreakdown::default();
        for purchase in self.store.purchases(&filter).await? {
            if purchase.net_amount < zero {
                tracing::warn!(
                    reference = %purchase.serial_no,
                    "excluding purchase with negative net amount from income statement"
                );
                skipped.push(SkippedRecord {
                    reference: purchase.serial_no.clone(),
                    reason: format!("negative net amount {}", purchase.net_amount),
                });
                continue;
            }
            expenses.add(ExpenseCategory::MaterialExpense, &purchase.net_amount);
        }
        for payment in self.store.bank_payments(&filter).await? {
            // Customer receipts flow through the same stream but are income,
            // not expenses
            if matches!(payment.counterparty, Some(CounterpartyKey::Customer(_))) {
                continue;
            }
            if payment.amount < zero {
                tracing::warn!(
                    reference = %payment.voucher_no,
                    "excluding payment with negative amount from income statement"
                );
                skipped.push(SkippedRecord {
                    reference: payment.voucher_no.clone(),
                    reason: format!("negative amount {}", payment.amount),
                });
                continue;
            }
            let description = payment.description.as_deref().unwrap_or("");
            expenses.add_classified(description, &payment.amount);
        }

        let total_expenses = expenses.total();
        let gross_profit = &revenue - &total_expenses;
        let net_income = &gross_profit + &other_income;

        Ok(IncomeStatement {
            period: range.cloned(),
            revenue,
            expenses,
            total_expenses,
            gross_profit,
            other_income,
            net_income,
            skipped,
        })
    }

    /// Build the inventory report, one item's streams at a time so that a
    /// large catalogue never materializes the full transaction universe
    pub async fn inventory_report(&self) -> EngineResult<InventoryReport> {
        let items = self.store.list_items().await?;
        let mut lines = Vec::with_capacity(items.len());
        let mut total_value = BigDecimal::from(0);
        let mut low = 0usize;
        let mut out = 0usize;

        for item in items {
            let filter = TxnFilter::for_item(item.code.clone());
            let purchased: BigDecimal = self
                .store
                .purchases(&filter)
                .await?
                .iter()
                .map(|purchase| &purchase.quantity)
                .sum();
            let sold: BigDecimal = self
                .store
                .sales_invoices(&filter)
                .await?
                .iter()
                .flat_map(|invoice| &invoice.lines)
                .filter(|line| line.item_code == item.code)
                .map(|line| &line.quantity)
                .sum();

            let status = stock_status(&item.current_stock, &item.min_stock_level);
            match status {
                InventoryStatus::LowStock => low += 1,
                InventoryStatus::OutOfStock => out += 1,
                InventoryStatus::InStock => {}
            }
            let stock_value = &item.current_stock * &item.selling_price;
            total_value += &stock_value;

            lines.push(InventoryLine {
                item_code: item.code,
                item_name: item.name,
                category: item.category,
                unit: item.unit,
                opening_stock: item.opening_stock,
                purchased,
                sold,
                current_stock: item.current_stock,
                rate: item.selling_price,
                stock_value,
                min_stock_level: item.min_stock_level,
                status,
            });
        }

        let total_items = lines.len();
        Ok(InventoryReport {
            summary: InventorySummary {
                total_items,
                total_inventory_value: total_value,
                low_stock_items: low,
                out_of_stock_items: out,
                in_stock_items: total_items - low - out,
            },
            items: lines,
        })
    }

    /// Build dashboard statistics for the month containing `today`, compared
    /// against the previous month
    pub async fn dashboard_stats(&self, today: NaiveDate) -> EngineResult<DashboardStats> {
        let current_range = month_range(today.year(), today.month())
            .ok_or_else(|| EngineError::Computation("calendar month out of range".to_string()))?;
        let (prev_year, prev_month) = previous_month(today.year(), today.month());
        let previous_range = month_range(prev_year, prev_month)
            .ok_or_else(|| EngineError::Computation("calendar month out of range".to_string()))?;

        let current = self.period_totals(&current_range).await?;
        let previous = self.period_totals(&previous_range).await?;
        let net_current = &current.sales - &current.expenses;
        let net_previous = &previous.sales - &previous.expenses;

        let active_projects = self
            .store
            .list_projects()
            .await?
            .iter()
            .filter(|project| project.status == ProjectStatus::Active)
            .count();

        Ok(DashboardStats {
            sales_change: percent_change(&current.sales, &previous.sales),
            expenses_change: percent_change(&current.expenses, &previous.expenses),
            profit_change: percent_change(&net_current, &net_previous),
            total_sales: current.sales,
            total_expenses: current.expenses,
            net_profit: net_current,
            active_projects,
            projects_change: format!("+{active_projects}"),
        })
    }

    /// Compute budget consumption for one project
    pub async fn project_progress(&self, project_id: &str) -> EngineResult<ProjectProgress> {
        let project = self
            .store
            .get_project(project_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("project '{project_id}'")))?;

        let filter = TxnFilter::for_project(project_id);
        let mut spent: BigDecimal = self
            .store
            .purchases(&filter)
            .await?
            .iter()
            .map(|purchase| &purchase.net_amount)
            .sum();
        for payment in self.store.bank_payments(&filter).await? {
            // Customer receipts attributed to the project are income, not spend
            if matches!(payment.counterparty, Some(CounterpartyKey::Customer(_))) {
                continue;
            }
            spent += &payment.amount;
        }

        let zero = BigDecimal::from(0);
        let hundred = BigDecimal::from(100);
        let progress = match project.budget() {
            Some(budget) if *budget > zero => {
                let mut pct = (&spent * &hundred) / budget;
                if pct > hundred {
                    pct = hundred;
                }
                pct.round(0)
            }
            _ => zero,
        };

        Ok(ProjectProgress {
            project_id: project.id.clone(),
            name: project.name.clone(),
            status: project.status,
            budget: project.budget().cloned(),
            spent,
            progress,
        })
    }

    async fn period_totals(&self, range: &DateRange) -> EngineResult<PeriodTotals> {
        let filter = TxnFilter::all().in_range(range.clone());
        let sales: BigDecimal = self
            .store
            .sales_invoices(&filter)
            .await?
            .iter()
            .map(|invoice| &invoice.net_total)
            .sum();
        let expenses: BigDecimal = self
            .store
            .purchases(&filter)
            .await?
            .iter()
            .map(|purchase| &purchase.net_amount)
            .sum();
        Ok(PeriodTotals { sales, expenses })
    }
}

/// First and last day of a calendar month
fn month_range(year: i32, month: u32) -> Option<DateRange> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    Some(DateRange {
        start: Some(start),
        end: Some(end),
    })
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn percent_change_handles_zero_previous() {
        assert_eq!(
            percent_change(&BigDecimal::from(150), &BigDecimal::from(0)),
            "+100%"
        );
        assert_eq!(
            percent_change(&BigDecimal::from(0), &BigDecimal::from(0)),
            "0%"
        );
    }

    #[test]
    fn percent_change_formats_one_decimal() {
        assert_eq!(
            percent_change(&BigDecimal::from(110), &BigDecimal::from(100)),
            "+10.0%"
        );
        assert_eq!(
            percent_change(&BigDecimal::from(75), &BigDecimal::from(100)),
            "-25.0%"
        );
    }

    #[test]
    fn stock_status_thresholds() {
        let min = BigDecimal::from(10);
        assert_eq!(
            stock_status(&BigDecimal::from(0), &min),
            InventoryStatus::OutOfStock
        );
        assert_eq!(
            stock_status(&BigDecimal::from(5), &min),
            InventoryStatus::LowStock
        );
        assert_eq!(
            stock_status(&BigDecimal::from(20), &min),
            InventoryStatus::InStock
        );
        assert_eq!(InventoryStatus::OutOfStock.to_string(), "Out of Stock");
    }

    #[tokio::test]
    async fn income_statement_composes_revenue_expenses_and_other_income() {
        let store = MemoryStore::new();
        let mut invoice = SalesInvoice::new(
            "SI000001",
            date(2024, 1, 10),
            "cust1",
            vec![InvoiceLine::new(
                "CEM-01",
                "Cement",
                BigDecimal::from(10),
                BigDecimal::from(100),
            )],
        );
        // Overpaid by 50: counts as other income
        invoice.amount_received = BigDecimal::from(1050);
        invoice.status = PaymentStatus::Paid;
        store.insert_sales_invoice(invoice);

        store.insert_purchase(Purchase::new(
            "PO000001",
            date(2024, 1, 5),
            "SUP001",
            "CEM-01",
            "Cement",
            BigDecimal::from(10),
            BigDecimal::from(40),
        ));
        store.seed_bank_payment(
            BankPayment::new("BP000001", date(2024, 1, 12), BigDecimal::from(200))
                .with_description("site labour wages"),
        );
        store.seed_bank_payment(
            BankPayment::new("BP000002", date(2024, 1, 15), BigDecimal::from(80))
                .with_description("unmarked spend"),
        );
        // A customer receipt must not be classified as an expense
        store.seed_bank_payment(
            BankPayment::new("BP000003", date(2024, 1, 20), BigDecimal::from(500))
                .with_counterparty(CounterpartyKey::Customer("cust1".to_string())),
        );

        let reports = ReportGenerator::new(store);
        let statement = reports.income_statement(None).await.unwrap();

        assert_eq!(statement.revenue, BigDecimal::from(1000));
        assert_eq!(statement.expenses.material_expense, BigDecimal::from(400));
        assert_eq!(statement.expenses.labour_wages, BigDecimal::from(200));
        assert_eq!(statement.expenses.other_expenses, BigDecimal::from(80));
        assert_eq!(statement.total_expenses, BigDecimal::from(680));
        assert_eq!(statement.gross_profit, BigDecimal::from(320));
        assert_eq!(statement.other_income, BigDecimal::from(50));
        assert_eq!(statement.net_income, BigDecimal::from(370));
        assert!(statement.skipped.is_empty());
    }

    #[tokio::test]
    async fn income_statement_skips_malformed_records() {
        let store = MemoryStore::new();
        store.insert_purchase(Purchase::new(
            "PO000001",
            date(2024, 1, 5),
            "SUP001",
            "CEM-01",
            "Cement",
            BigDecimal::from(1),
            BigDecimal::from(-500),
        ));
        store.insert_purchase(Purchase::new(
            "PO000002",
            date(2024, 1, 6),
            "SUP001",
            "CEM-01",
            "Cement",
            BigDecimal::from(1),
            BigDecimal::from(300),
        ));

        let reports = ReportGenerator::new(store);
        let statement = reports.income_statement(None).await.unwrap();

        assert_eq!(statement.skipped.len(), 1);
        assert_eq!(statement.skipped[0].reference, "PO000001");
        assert_eq!(statement.expenses.material_expense, BigDecimal::from(300));
    }

    #[tokio::test]
    async fn income_statement_respects_the_period() {
        let store = MemoryStore::new();
        store.insert_sales_invoice(SalesInvoice::new(
            "SI000001",
            date(2024, 1, 10),
            "cust1",
            vec![InvoiceLine::new(
                "CEM-01",
                "Cement",
                BigDecimal::from(1),
                BigDecimal::from(100),
            )],
        ));
        store.insert_sales_invoice(SalesInvoice::new(
            "SI000002",
            date(2024, 2, 10),
            "cust1",
            vec![InvoiceLine::new(
                "CEM-01",
                "Cement",
                BigDecimal::from(1),
                BigDecimal::from(200),
            )],
        ));

        let reports = ReportGenerator::new(store);
        let january = DateRange::new(Some(date(2024, 1, 1)), Some(date(2024, 1, 31))).unwrap();
        let statement = reports.income_statement(Some(&january)).await.unwrap();
        assert_eq!(statement.revenue, BigDecimal::from(100));

        let inverted = DateRange {
            start: Some(date(2024, 2, 1)),
            end: Some(date(2024, 1, 1)),
        };
        let result = reports.income_statement(Some(&inverted)).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn inventory_report_classifies_and_summarizes() {
        let store = MemoryStore::new();
        store.insert_item(
            Item::new("CEM-01", "Cement", "bag")
                .with_min_stock_level(BigDecimal::from(10))
                .with_selling_price(BigDecimal::from(50)),
        );
        store.insert_item(
            Item::new("STL-01", "Steel", "ton")
                .with_opening_stock(BigDecimal::from(5))
                .with_min_stock_level(BigDecimal::from(10))
                .with_selling_price(BigDecimal::from(1000)),
        );
        store.insert_item(
            Item::new("BRK-01", "Bricks", "thousand")
                .with_opening_stock(BigDecimal::from(20))
                .with_min_stock_level(BigDecimal::from(10))
                .with_selling_price(BigDecimal::from(100)),
        );

        let reports = ReportGenerator::new(store);
        let report = reports.inventory_report().await.unwrap();

        assert_eq!(report.summary.total_items, 3);
        assert_eq!(report.summary.out_of_stock_items, 1);
        assert_eq!(report.summary.low_stock_items, 1);
        assert_eq!(report.summary.in_stock_items, 1);
        assert_eq!(
            report.summary.total_inventory_value,
            BigDecimal::from(7000)
        );

        let bricks = report
            .items
            .iter()
            .find(|line| line.item_code == "BRK-01")
            .unwrap();
        assert_eq!(bricks.status, InventoryStatus::InStock);
        assert_eq!(bricks.stock_value, BigDecimal::from(2000));
    }

    #[tokio::test]
    async fn dashboard_compares_against_previous_month() {
        let store = MemoryStore::new();
        store.insert_project(Project::new("p1", "PRJ-01", "Green Valley"));
        store.insert_project(
            Project::new("p2", "PRJ-02", "Harbor View").with_status(ProjectStatus::Completed),
        );

        // January: sales 100, no expenses
        store.insert_sales_invoice(SalesInvoice::new(
            "SI000001",
            date(2024, 1, 10),
            "cust1",
            vec![InvoiceLine::new(
                "CEM-01",
                "Cement",
                BigDecimal::from(1),
                BigDecimal::from(100),
            )],
        ));
        // February: sales 110, expenses 150
        store.insert_sales_invoice(SalesInvoice::new(
            "SI000002",
            date(2024, 2, 10),
            "cust1",
            vec![InvoiceLine::new(
                "CEM-01",
                "Cement",
                BigDecimal::from(1),
                BigDecimal::from(110),
            )],
        ));
        store.insert_purchase(Purchase::new(
            "PO000001",
            date(2024, 2, 12),
            "SUP001",
            "CEM-01",
            "Cement",
            BigDecimal::from(1),
            BigDecimal::from(150),
        ));

        let reports = ReportGenerator::new(store);
        let stats = reports.dashboard_stats(date(2024, 2, 15)).await.unwrap();

        assert_eq!(stats.total_sales, BigDecimal::from(110));
        assert_eq!(stats.sales_change, "+10.0%");
        assert_eq!(stats.total_expenses, BigDecimal::from(150));
        assert_eq!(stats.expenses_change, "+100%");
        assert_eq!(stats.net_profit, BigDecimal::from(-40));
        assert_eq!(stats.profit_change, "-140.0%");
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.projects_change, "+1");
    }

    #[tokio::test]
    async fn project_progress_caps_at_one_hundred() {
        let store = MemoryStore::new();
        store.insert_project(
            Project::new("p1", "PRJ-01", "Green Valley")
                .with_estimated_cost(BigDecimal::from(1000)),
        );
        store.insert_purchase(
            Purchase::new(
                "PO000001",
                date(2024, 1, 5),
                "SUP001",
                "CEM-01",
                "Cement",
                BigDecimal::from(1),
                BigDecimal::from(900),
            )
            .with_project("p1"),
        );
        store.seed_bank_payment(
            BankPayment::new("BP000001", date(2024, 1, 10), BigDecimal::from(400))
                .with_project("p1"),
        );

        let reports = ReportGenerator::new(store);
        let progress = reports.project_progress("p1").await.unwrap();

        assert_eq!(progress.spent, BigDecimal::from(1300));
        assert_eq!(progress.budget, Some(BigDecimal::from(1000)));
        assert_eq!(progress.progress, BigDecimal::from(100));
    }

    #[tokio::test]
    async fn project_progress_without_budget_is_zero() {
        let store = MemoryStore::new();
        store.insert_project(Project::new("p1", "PRJ-01", "Green Valley"));
        store.seed_bank_payment(
            BankPayment::new("BP000001", date(2024, 1, 10), BigDecimal::from(400))
                .with_project("p1"),
        );

        let reports = ReportGenerator::new(store);
        let progress = reports.project_progress("p1").await.unwrap();
        assert_eq!(progress.progress, BigDecimal::from(0));
        assert!(progress.budget.is_none());

        let missing = reports.project_progress("nope").await;
        assert!(matches!(missing, Err(EngineError::NotFound(_))));
    }
}
