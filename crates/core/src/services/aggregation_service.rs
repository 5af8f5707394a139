use chrono::{DateTime, Utc};

use crate::models::filter::TransactionFilter;
use crate::models::stats::{DashboardStats, MethodTotals};
use crate::models::transaction::{PaymentMethod, Transaction, TransactionType};

/// Derived totals and filtered listings over an in-memory transaction list.
///
/// Pure business logic, no I/O. Every call recomputes from scratch in O(n).
#[derive(Debug)]
pub struct AggregationService;

impl AggregationService {
    pub fn new() -> Self {
        Self
    }

    fn sum(&self, txs: &[Transaction], kind: TransactionType, method: Option<PaymentMethod>) -> f64 {
        txs.iter()
            .filter(|t| t.kind == kind && method.map_or(true, |m| t.method == m))
            .map(|t| t.amount)
            .sum()
    }

    /// Total income through `method`.
    pub fn income(&self, txs: &[Transaction], method: PaymentMethod) -> f64 {
        self.sum(txs, TransactionType::Income, Some(method))
    }

    /// Total expense through `method`.
    pub fn expense(&self, txs: &[Transaction], method: PaymentMethod) -> f64 {
        self.sum(txs, TransactionType::Expense, Some(method))
    }

    /// income(method) - expense(method)
    pub fn balance(&self, txs: &[Transaction], method: PaymentMethod) -> f64 {
        self.method_totals(txs, method).balance
    }

    pub fn method_totals(&self, txs: &[Transaction], method: PaymentMethod) -> MethodTotals {
        let income = self.income(txs, method);
        let expense = self.expense(txs, method);
        MethodTotals {
            method,
            income,
            expense,
            balance: income - expense,
        }
    }

    /// One entry per payment method, in display order.
    pub fn breakdown(&self, txs: &[Transaction]) -> Vec<MethodTotals> {
        PaymentMethod::ALL
            .iter()
            .map(|m| self.method_totals(txs, *m))
            .collect()
    }

    /// Totals across every payment method.
    pub fn dashboard(&self, txs: &[Transaction]) -> DashboardStats {
        let total_income = self.sum(txs, TransactionType::Income, None);
        let total_expenses = self.sum(txs, TransactionType::Expense, None);
        DashboardStats {
            total_balance: total_income - total_expenses,
            total_income,
            total_expenses,
        }
    }

    /// Apply type, time-window and search criteria, newest first.
    ///
    /// The window cutoff is inclusive: an entry exactly at `now - window` is kept.
    pub fn filter<'a>(
        &self,
        txs: &'a [Transaction],
        filter: &TransactionFilter,
        now: DateTime<Utc>,
    ) -> Vec<&'a Transaction> {
        let cutoff = filter.range.cutoff(now);
        let query = filter.search.trim().to_lowercase();

        let mut list: Vec<&Transaction> = txs
            .iter()
            .filter(|t| filter.kind.matches(t.kind))
            .filter(|t| cutoff.map_or(true, |c| t.date >= c))
            .filter(|t| {
                query.is_empty()
                    || t.description.to_lowercase().contains(&query)
                    || t.method.to_string().to_lowercase().contains(&query)
            })
            .collect();

        list.sort_by(|a, b| b.date.cmp(&a.date));
        list
    }
}

impl Default for AggregationService {
    fn default() -> Self {
        Self::new()
    }
}
