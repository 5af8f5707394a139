use serde::{Deserialize, Serialize};

use super::transaction::PaymentMethod;

/// Income, expense and balance for one payment method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodTotals {
    pub method: PaymentMethod,
    pub income: f64,
    pub expense: f64,
    /// income - expense
    pub balance: f64,
}

/// Headline numbers across all payment methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_balance: f64,
    pub total_income: f64,
    pub total_expenses: f64,
}
