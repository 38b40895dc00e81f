//! Counterparty ledger construction
//!
//! Merges a counterparty's independent transaction streams into one
//! chronological sequence and computes the running balance. The build is a
//! pure read-then-aggregate operation: for a fixed transaction set it always
//! produces the same entries and balances.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::traits::*;
use crate::types::*;

/// Builds chronological ledgers for suppliers, customers, and projects
pub struct LedgerBuilder<S: TransactionStore> {
    store: S,
}

/// An entry before sorting and balance computation
struct RawEntry {
    date: NaiveDate,
    seq: u64,
    kind: LedgerEntryKind,
    reference: String,
    description: String,
    debit: BigDecimal,
    credit: BigDecimal,
}

/// Accumulates raw entries, diverting malformed records into the skip list
#[derive(Default)]
struct Collector {
    rows: Vec<RawEntry>,
    skipped: Vec<SkippedRecord>,
}

impl Collector {
    fn push(
        &mut self,
        side: Direction,
        date: NaiveDate,
        seq: u64,
        kind: LedgerEntryKind,
        reference: &str,
        description: String,
        amount: &BigDecimal,
    ) {
        if *amount < BigDecimal::from(0) {
            tracing::warn!(reference, "excluding record with negative amount from ledger");
            self.skipped.push(SkippedRecord {
                reference: reference.to_string(),
                reason: format!("negative amount {amount}"),
            });
            return;
        }
        let zero = BigDecimal::from(0);
        let (debit, credit) = match side {
            Direction::Debit => (amount.clone(), zero),
            Direction::Credit => (zero, amount.clone()),
        };
        self.rows.push(RawEntry {
            date,
            seq,
            kind,
            reference: reference.to_string(),
            description,
            debit,
            credit,
        });
    }

    fn debit(
        &mut self,
        date: NaiveDate,
        seq: u64,
        kind: LedgerEntryKind,
        reference: &str,
        description: String,
        amount: &BigDecimal,
    ) {
        self.push(Direction::Debit, date, seq, kind, reference, description, amount);
    }

    fn credit(
        &mut self,
        date: NaiveDate,
        seq: u64,
        kind: LedgerEntryKind,
        reference: &str,
        description: String,
        amount: &BigDecimal,
    ) {
        self.push(Direction::Credit, date, seq, kind, reference, description, amount);
    }
}

impl<S: TransactionStore> LedgerBuilder<S> {
    /// Create a builder over the given store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Build the ledger for a counterparty, optionally restricted to a date
    /// window applied before aggregation
    ///
    /// A filtered ledger's running balance restarts at zero; period ledgers
    /// are independent, not cumulative across periods.
    pub async fn build(
        &self,
        key: &CounterpartyKey,
        range: Option<&DateRange>,
    ) -> EngineResult<LedgerReport> {
        if let Some(range) = range {
            range.validate()?;
        }
        let collector = match key {
            CounterpartyKey::Supplier(code) => self.collect_supplier(code, range).await?,
            CounterpartyKey::Customer(id) => self.collect_customer(id, range).await?,
            CounterpartyKey::Project(id) => self.collect_project(id, range).await?,
        };
        Ok(assemble(key.clone(), range.cloned(), collector))
    }

    async fn collect_supplier(
        &self,
        code: &str,
        range: Option<&DateRange>,
    ) -> EngineResult<Collector> {
        self.store
            .get_supplier(code)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("supplier '{code}'")))?;

        let filter = in_range(
            TxnFilter::for_counterparty(CounterpartyKey::Supplier(code.to_string())),
            range,
        );
        let mut collector = Collector::default();

        for purchase in self.store.purchases(&filter).await? {
            collector.debit(
                purchase.date,
                purchase.seq,
                LedgerEntryKind::Purchase,
                &purchase.serial_no,
                format!("{} - Qty: {}", purchase.item_name, purchase.quantity),
                &purchase.net_amount,
            );
        }
        for payment in self.store.bank_payments(&filter).await? {
            let description = payment
                .description
                .clone()
                .unwrap_or_else(|| "Payment".to_string());
            collector.credit(
                payment.date,
                payment.seq,
                LedgerEntryKind::Payment,
                &payment.voucher_no,
                description,
                &payment.amount,
            );
        }
        Ok(collector)
    }

    async fn collect_customer(
        &self,
        customer_id: &str,
        range: Option<&DateRange>,
    ) -> EngineResult<Collector> {
        self.store
            .get_customer(customer_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("customer '{customer_id}'")))?;

        let filter = in_range(
            TxnFilter::for_counterparty(CounterpartyKey::Customer(customer_id.to_string())),
            range,
        );
        let mut collector = Collector::default();

        for invoice in self.store.sales_invoices(&filter).await? {
            collector.debit(
                invoice.date,
                invoice.seq,
                LedgerEntryKind::Invoice,
                &invoice.serial_no,
                format!("Sales invoice - {} line(s)", invoice.lines.len()),
                &invoice.net_total,
            );
        }
        for sale in self.store.plot_sales(&filter).await? {
            collector.debit(
                sale.date,
                sale.seq,
                LedgerEntryKind::PlotSale,
                &sale.plot_number,
                format!("Plot {} sale", sale.plot_number),
                &sale.final_price,
            );
        }
        for payment in self.store.bank_payments(&filter).await? {
            let description = payment
                .description
                .clone()
                .unwrap_or_else(|| "Payment received".to_string());
            collector.credit(
                payment.date,
                payment.seq,
                LedgerEntryKind::Payment,
                &payment.voucher_no,
                description,
                &payment.amount,
            );
        }
        Ok(collector)
    }

    /// Project ledgers put costs (purchases and payments) on the debit side
    /// and project income (invoices) on the credit side
    async fn collect_project(
        &self,
        project_id: &str,
        range: Option<&DateRange>,
    ) -> EngineResult<Collector> {
        self.store
            .get_project(project_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("project '{project_id}'")))?;

        let filter = in_range(TxnFilter::for_project(project_id), range);
        let mut collector = Collector::default();

        for purchase in self.store.purchases(&filter).await? {
            collector.debit(
                purchase.date,
                purchase.seq,
                LedgerEntryKind::Purchase,
                &purchase.serial_no,
                format!("{} - Qty: {}", purchase.item_name, purchase.quantity),
                &purchase.net_amount,
            );
        }
        for payment in self.store.bank_payments(&filter).await? {
            // Customer receipts attributed to the project are income, not
            // project spend; the invoice already carries the income side
            if matches!(payment.counterparty, Some(CounterpartyKey::Customer(_))) {
                continue;
            }
            let description = payment
                .description
                .clone()
                .unwrap_or_else(|| "Bank payment".to_string());
            collector.debit(
                payment.date,
                payment.seq,
                LedgerEntryKind::Payment,
                &payment.voucher_no,
                description,
                &payment.amount,
            );
        }
        for payment in self.store.cash_payments(&filter).await? {
            let description = payment
                .description
                .clone()
                .unwrap_or_else(|| "Cash payment".to_string());
            collector.debit(
                payment.date,
                payment.seq,
                LedgerEntryKind::Payment,
                &payment.voucher_no,
                description,
                &payment.amount,
            );
        }
        for invoice in self.store.sales_invoices(&filter).await? {
            collector.credit(
                invoice.date,
                invoice.seq,
                LedgerEntryKind::Invoice,
                &invoice.serial_no,
                format!("Sales invoice - {} line(s)", invoice.lines.len()),
                &invoice.net_total,
            );
        }
        Ok(collector)
    }
}

fn in_range(filter: TxnFilter, range: Option<&DateRange>) -> TxnFilter {
    match range {
        Some(range) => filter.in_range(range.clone()),
        None => filter,
    }
}

/// Sort merged rows by (date, creation order) and compute running balances
fn assemble(
    counterparty: CounterpartyKey,
    period: Option<DateRange>,
    collector: Collector,
) -> LedgerReport {
    let Collector { mut rows, skipped } = collector;
    rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.seq.cmp(&b.seq)));

    let mut running = BigDecimal::from(0);
    let mut total_debit = BigDecimal::from(0);
    let mut total_credit = BigDecimal::from(0);
    let entries: Vec<LedgerEntry> = rows
        .into_iter()
        .map(|row| {
            running += &row.debit;
            running -= &row.credit;
            total_debit += &row.debit;
            total_credit += &row.credit;
            LedgerEntry {
                date: row.date,
                kind: row.kind,
                reference: row.reference,
                description: row.description,
                debit: row.debit,
                credit: row.credit,
                balance: running.clone(),
            }
        })
        .collect();

    LedgerReport {
        counterparty,
        entries,
        total_debit,
        total_credit,
        balance: running,
        period,
        skipped,
    }
}
