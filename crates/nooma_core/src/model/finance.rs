//! Finance records: accounts, categories, transactions, budgets.

use super::RecordId;
use serde::{Deserialize, Serialize};

/// Kind of money account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Checking,
    Savings,
    CreditCard,
    Cash,
    Investment,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::CreditCard => "credit_card",
            Self::Cash => "cash",
            Self::Investment => "investment",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "checking" => Some(Self::Checking),
            "savings" => Some(Self::Savings),
            "credit_card" => Some(Self::CreditCard),
            "cash" => Some(Self::Cash),
            "investment" => Some(Self::Investment),
            _ => None,
        }
    }
}

/// Whether a category groups income or spending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryType {
    Income,
    Expense,
}

impl CategoryType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

/// Direction of a transaction. The stored amount is always a magnitude;
/// sign is derived from this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

/// Recurrence window of a budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountType,
    pub currency: String,
    /// Signed balance; no non-negativity is enforced.
    pub balance: f64,
    pub credit_limit: Option<f64>,
    pub institution: Option<String>,
    pub account_number: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Create request for an account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountType,
    /// Defaults to `"USD"`.
    pub currency: Option<String>,
    /// Defaults to `0`.
    pub balance: Option<f64>,
    pub institution: Option<String>,
}

impl NewAccount {
    pub fn new(name: impl Into<String>, kind: AccountType) -> Self {
        Self {
            name: name.into(),
            kind,
            currency: None,
            balance: None,
            institution: None,
        }
    }
}

/// Partial account update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub kind: Option<AccountType>,
    pub currency: Option<String>,
    pub balance: Option<f64>,
    pub institution: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CategoryType,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<RecordId>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub kind: CategoryType,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: RecordId,
    pub account_id: RecordId,
    pub category_id: Option<RecordId>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub description: String,
    pub notes: Option<String>,
    /// Calendar date string, compared lexically.
    pub date: String,
    pub is_recurring: bool,
    pub recurring_pattern: Option<String>,
    pub transfer_to_account_id: Option<RecordId>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account_id: RecordId,
    pub category_id: Option<RecordId>,
    pub kind: TransactionType,
    pub amount: f64,
    pub description: String,
    pub date: String,
    pub notes: Option<String>,
}

/// Partial transaction update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub account_id: Option<RecordId>,
    pub category_id: Option<RecordId>,
    pub kind: Option<TransactionType>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

/// Conjunctive transaction filter; omitted fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub account_id: Option<RecordId>,
    pub category_id: Option<RecordId>,
    /// Inclusive lower bound on `date`.
    pub start_date: Option<String>,
    /// Inclusive upper bound on `date`.
    pub end_date: Option<String>,
    /// Defaults to 100.
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: RecordId,
    pub category_id: RecordId,
    pub amount: f64,
    pub period: BudgetPeriod,
    pub start_date: String,
    pub end_date: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    pub category_id: RecordId,
    pub amount: f64,
    pub period: BudgetPeriod,
    pub start_date: String,
    pub end_date: Option<String>,
}

/// Finance overview derived from all accounts and the most recent
/// transactions window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceInsights {
    pub total_balance: f64,
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_cash_flow: f64,
    pub account_count: usize,
    pub transaction_count: usize,
}
