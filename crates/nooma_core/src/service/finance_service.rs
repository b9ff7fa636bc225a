//! Finance use-case service.
//!
//! # Responsibility
//! - Validate finance writes before they reach storage.
//! - Derive [`FinanceInsights`] from accounts and recent transactions.
//!
//! # Invariants
//! - Insights cover every account but only the most recent
//!   [`INSIGHTS_TRANSACTION_WINDOW`] transactions.
//! - `net_cash_flow == total_income - total_expenses`.

use super::{require_finite, require_text, ServiceError, ServiceResult};
use crate::model::finance::{
    Account, AccountPatch, Budget, Category, FinanceInsights, NewAccount, NewBudget, NewCategory,
    NewTransaction, Transaction, TransactionFilter, TransactionPatch, TransactionType,
};
use crate::repo::finance_repo::FinanceRepository;
use crate::repo::RepoResult;

/// Number of most recent transactions that feed [`FinanceService::insights`].
pub const INSIGHTS_TRANSACTION_WINDOW: u32 = 100;

/// Finance service facade over repository implementations.
pub struct FinanceService<R: FinanceRepository> {
    repo: R,
}

impl<R: FinanceRepository> FinanceService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_accounts(&self) -> RepoResult<Vec<Account>> {
        self.repo.list_accounts()
    }

    pub fn get_account(&self, id: &str) -> RepoResult<Option<Account>> {
        self.repo.get_account(id)
    }

    /// Creates an account; currency defaults to USD and balance to 0.
    pub fn create_account(&self, account: NewAccount) -> ServiceResult<Account> {
        let account = NewAccount {
            name: require_text(&account.name, "name")?,
            balance: account
                .balance
                .map(|value| require_finite(value, "balance"))
                .transpose()?,
            ..account
        };
        Ok(self.repo.create_account(&account)?)
    }

    pub fn update_account(&self, id: &str, patch: &AccountPatch) -> ServiceResult<Option<Account>> {
        if let Some(balance) = patch.balance {
            require_finite(balance, "balance")?;
        }
        Ok(self.repo.update_account(id, patch)?)
    }

    pub fn delete_account(&self, id: &str) -> RepoResult<bool> {
        self.repo.delete_account(id)
    }

    pub fn list_categories(&self) -> RepoResult<Vec<Category>> {
        self.repo.list_categories()
    }

    pub fn create_category(&self, category: NewCategory) -> ServiceResult<Category> {
        let category = NewCategory {
            name: require_text(&category.name, "name")?,
            ..category
        };
        Ok(self.repo.create_category(&category)?)
    }

    pub fn list_transactions(&self, filter: &TransactionFilter) -> RepoResult<Vec<Transaction>> {
        self.repo.list_transactions(filter)
    }

    pub fn get_transaction(&self, id: &str) -> RepoResult<Option<Transaction>> {
        self.repo.get_transaction(id)
    }

    /// Records one transaction against an existing account. The account
    /// balance is not touched.
    pub fn create_transaction(&self, transaction: NewTransaction) -> ServiceResult<Transaction> {
        let transaction = NewTransaction {
            account_id: require_text(&transaction.account_id, "accountId")?,
            description: require_text(&transaction.description, "description")?,
            date: require_text(&transaction.date, "date")?,
            amount: require_finite(transaction.amount, "amount")?,
            ..transaction
        };
        self.require_account(&transaction.account_id)?;
        Ok(self.repo.create_transaction(&transaction)?)
    }

    pub fn update_transaction(
        &self,
        id: &str,
        patch: &TransactionPatch,
    ) -> ServiceResult<Option<Transaction>> {
        if let Some(amount) = patch.amount {
            require_finite(amount, "amount")?;
        }
        if let Some(account_id) = patch.account_id.as_deref() {
            self.require_account(account_id)?;
        }
        Ok(self.repo.update_transaction(id, patch)?)
    }

    /// `transactions.account_id` carries no foreign key; this is the only
    /// existence check.
    fn require_account(&self, account_id: &str) -> ServiceResult<()> {
        match self.repo.get_account(account_id)? {
            Some(_) => Ok(()),
            None => Err(ServiceError::UnknownReference {
                field: "accountId",
                id: account_id.to_string(),
            }),
        }
    }

    pub fn delete_transaction(&self, id: &str) -> RepoResult<bool> {
        self.repo.delete_transaction(id)
    }

    pub fn list_budgets(&self) -> RepoResult<Vec<Budget>> {
        self.repo.list_budgets()
    }

    pub fn create_budget(&self, budget: NewBudget) -> ServiceResult<Budget> {
        let budget = NewBudget {
            amount: require_finite(budget.amount, "amount")?,
            ..budget
        };
        Ok(self.repo.create_budget(&budget)?)
    }

    /// Loads all accounts and the most recent transaction window and
    /// summarizes them.
    pub fn insights(&self) -> RepoResult<FinanceInsights> {
        let accounts = self.repo.list_accounts()?;
        let recent = self.repo.list_transactions(&TransactionFilter {
            limit: Some(INSIGHTS_TRANSACTION_WINDOW),
            ..TransactionFilter::default()
        })?;
        Ok(compute_insights(&accounts, &recent))
    }
}

/// Summarizes balances and cash flow.
///
/// Transfers count toward `transaction_count` but neither income nor
/// expenses.
pub fn compute_insights(accounts: &[Account], transactions: &[Transaction]) -> FinanceInsights {
    let total_balance = accounts.iter().map(|account| account.balance).sum::<f64>();
    let total_of = |kind: TransactionType| {
        transactions
            .iter()
            .filter(|transaction| transaction.kind == kind)
            .map(|transaction| transaction.amount)
            .sum::<f64>()
    };
    let total_income = total_of(TransactionType::Income);
    let total_expenses = total_of(TransactionType::Expense);

    FinanceInsights {
        total_balance,
        total_income,
        total_expenses,
        net_cash_flow: total_income - total_expenses,
        account_count: accounts.len(),
        transaction_count: transactions.len(),
    }
}
