//! Free-text expense classification
//!
//! Bank payments carry only a free-text description; reports bucket them into
//! a fixed set of expense categories by keyword matching. Classification is a
//! pure function so that rebuilding a report always reproduces the same
//! figures.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// The seven fixed expense categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpenseCategory {
    MaterialExpense,
    LabourWages,
    TransportationExpense,
    AdministrativeExpenses,
    Utilities,
    Maintenance,
    OtherExpenses,
}

impl ExpenseCategory {
    /// Every category, in classification precedence order
    pub const ALL: [ExpenseCategory; 7] = [
        ExpenseCategory::MaterialExpense,
        ExpenseCategory::LabourWages,
        ExpenseCategory::TransportationExpense,
        ExpenseCategory::AdministrativeExpenses,
        ExpenseCategory::Utilities,
        ExpenseCategory::Maintenance,
        ExpenseCategory::OtherExpenses,
    ];
}

/// Keyword groups checked in strict precedence order; the first group with a
/// matching keyword wins
const KEYWORD_GROUPS: &[(ExpenseCategory, &[&str])] = &[
    (
        ExpenseCategory::MaterialExpense,
        &["material", "cement", "steel"],
    ),
    (
        ExpenseCategory::LabourWages,
        &["labour", "wage", "salary"],
    ),
    (
        ExpenseCategory::TransportationExpense,
        &["transport", "freight", "delivery"],
    ),
    (
        ExpenseCategory::AdministrativeExpenses,
        &["admin", "office"],
    ),
    (
        ExpenseCategory::Utilities,
        &["utility", "electricity", "water"],
    ),
    (
        ExpenseCategory::Maintenance,
        &["maintenance", "repair"],
    ),
];

/// Classify a payment description into one of the seven categories
///
/// Matching is case-insensitive substring search. An empty or unrecognized
/// description falls through to [`ExpenseCategory::OtherExpenses`]; the
/// function is total and deterministic.
pub fn classify_expense(description: &str) -> ExpenseCategory {
    let needle = description.to_lowercase();
    if needle.trim().is_empty() {
        return ExpenseCategory::OtherExpenses;
    }
    for (category, keywords) in KEYWORD_GROUPS {
        if keywords.iter().any(|keyword| needle.contains(keyword)) {
            return *category;
        }
    }
    ExpenseCategory::OtherExpenses
}

/// Amounts accumulated per expense category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseBreakdown {
    pub material_expense: BigDecimal,
    pub labour_wages: BigDecimal,
    pub transportation_expense: BigDecimal,
    pub administrative_expenses: BigDecimal,
    pub utilities: BigDecimal,
    pub maintenance: BigDecimal,
    pub other_expenses: BigDecimal,
}

impl ExpenseBreakdown {
    /// Add an amount to a category's bucket
    pub fn add(&mut self, category: ExpenseCategory, amount: &BigDecimal) {
        let bucket = match category {
            ExpenseCategory::MaterialExpense => &mut self.material_expense,
            ExpenseCategory::LabourWages => &mut self.labour_wages,
            ExpenseCategory::TransportationExpense => &mut self.transportation_expense,
            ExpenseCategory::AdministrativeExpenses => &mut self.administrative_expenses,
            ExpenseCategory::Utilities => &mut self.utilities,
            ExpenseCategory::Maintenance => &mut self.maintenance,
            ExpenseCategory::OtherExpenses => &mut self.other_expenses,
        };
        *bucket += amount;
    }

    /// Classify a description and add the amount to the winning bucket
    pub fn add_classified(&mut self, description: &str, amount: &BigDecimal) {
        self.add(classify_expense(description), amount);
    }

    /// Sum across all seven buckets
    pub fn total(&self) -> BigDecimal {
        &self.material_expense
            + &self.labour_wages
            + &self.transportation_expense
            + &self.administrative_expenses
            + &self.utilities
            + &self.maintenance
            + &self.other_expenses
    }
}
