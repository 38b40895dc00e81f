//! Adoption of legacy payment rows that referenced payees by free text
//!
//! The predecessor system joined payments to suppliers by matching the
//! payment's `pay_to` text against supplier names. The engine only accepts
//! explicit counterparty keys, so migrations run legacy rows through this
//! adapter first. Nothing in the ledger builder or reconciler calls into this
//! module.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::types::*;

/// A payment row as exported from the legacy system
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyPaymentRow {
    /// Voucher reference carried over unchanged
    pub voucher_no: String,
    /// Payment date
    pub date: NaiveDate,
    /// Free-text payee the legacy system matched by name
    pub pay_to: String,
    /// Free-text description
    pub description: Option<String>,
    /// Amount paid
    pub amount: BigDecimal,
}

/// Find the supplier a legacy payee string refers to
///
/// Matches the way the legacy system did: the payee equals the supplier name
/// or contains it, case-insensitively. Returns `None` when no supplier
/// matches; ambiguous rows resolve to the first match in the given order.
pub fn match_supplier_by_payee<'a>(payee: &str, suppliers: &'a [Supplier]) -> Option<&'a Supplier> {
    let payee = payee.trim().to_lowercase();
    if payee.is_empty() {
        return None;
    }
    suppliers.iter().find(|supplier| {
        let name = supplier.name.to_lowercase();
        payee == name || payee.contains(&name)
    })
}

/// Convert a legacy row into a payment with an explicit counterparty key
///
/// Rows whose payee cannot be resolved come through without a counterparty;
/// they still appear in unfiltered aggregates but never in supplier ledgers.
pub fn adopt_legacy_payment(row: &LegacyPaymentRow, suppliers: &[Supplier]) -> BankPayment {
    let mut payment = BankPayment::new(row.voucher_no.clone(), row.date, row.amount.clone());
    if let Some(supplier) = match_supplier_by_payee(&row.pay_to, suppliers) {
        payment = payment.with_counterparty(CounterpartyKey::Supplier(supplier.code.clone()));
    }
    if let Some(description) = &row.description {
        payment = payment.with_description(description.clone());
    }
    payment
}
