//! Finance repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over accounts, categories, transactions, budgets.
//! - Build conjunctive transaction filters over the provided fields only.
//!
//! # Invariants
//! - Accounts are listed newest-created first.
//! - Transactions are listed by `date DESC`, capped at 100 by default.
//! - Creating a transaction never adjusts the account balance.
//! - Deleting an account does not touch its transactions.

use super::common::{
    ensure_tables, int_to_bool, load_required, new_record_id, parse_enum, query_all, query_one,
    Assignments, RepoResult,
};
use crate::model::finance::{
    Account, AccountPatch, AccountType, Budget, BudgetPeriod, Category, CategoryType,
    NewAccount, NewBudget, NewCategory, NewTransaction, Transaction, TransactionFilter,
    TransactionPatch, TransactionType,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

/// Default cap applied by [`FinanceRepository::list_transactions`].
pub const TRANSACTIONS_DEFAULT_LIMIT: u32 = 100;
const DEFAULT_CURRENCY: &str = "USD";

const ACCOUNT_SELECT_SQL: &str = "SELECT
    id,
    name,
    type,
    currency,
    balance,
    credit_limit,
    institution,
    account_number,
    is_active,
    created_at,
    updated_at
FROM accounts";

const TRANSACTION_SELECT_SQL: &str = "SELECT
    id,
    account_id,
    category_id,
    type,
    amount,
    description,
    notes,
    date,
    is_recurring,
    recurring_pattern,
    transfer_to_account_id,
    created_at,
    updated_at
FROM transactions";

const CATEGORY_SELECT_SQL: &str = "SELECT
    id,
    name,
    type,
    icon,
    color,
    parent_id,
    created_at
FROM categories";

const BUDGET_SELECT_SQL: &str = "SELECT
    id,
    category_id,
    amount,
    period,
    start_date,
    end_date,
    is_active,
    created_at
FROM budgets";

/// Repository interface for finance records.
pub trait FinanceRepository {
    fn list_accounts(&self) -> RepoResult<Vec<Account>>;
    fn get_account(&self, id: &str) -> RepoResult<Option<Account>>;
    fn create_account(&self, account: &NewAccount) -> RepoResult<Account>;
    fn update_account(&self, id: &str, patch: &AccountPatch) -> RepoResult<Option<Account>>;
    /// Returns `false` when no row had this id.
    fn delete_account(&self, id: &str) -> RepoResult<bool>;

    fn list_categories(&self) -> RepoResult<Vec<Category>>;
    fn create_category(&self, category: &NewCategory) -> RepoResult<Category>;

    fn list_transactions(&self, filter: &TransactionFilter) -> RepoResult<Vec<Transaction>>;
    fn get_transaction(&self, id: &str) -> RepoResult<Option<Transaction>>;
    fn create_transaction(&self, transaction: &NewTransaction) -> RepoResult<Transaction>;
    fn update_transaction(
        &self,
        id: &str,
        patch: &TransactionPatch,
    ) -> RepoResult<Option<Transaction>>;
    fn delete_transaction(&self, id: &str) -> RepoResult<bool>;

    fn list_budgets(&self) -> RepoResult<Vec<Budget>>;
    fn create_budget(&self, budget: &NewBudget) -> RepoResult<Budget>;
}

/// SQLite-backed finance repository.
pub struct SqliteFinanceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFinanceRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["accounts", "categories", "transactions", "budgets"])?;
        Ok(Self { conn })
    }
}

impl FinanceRepository for SqliteFinanceRepository<'_> {
    fn list_accounts(&self) -> RepoResult<Vec<Account>> {
        query_all(
            self.conn,
            &format!("{ACCOUNT_SELECT_SQL} ORDER BY created_at DESC, rowid DESC;"),
            Vec::new(),
            parse_account_row,
        )
    }

    fn get_account(&self, id: &str) -> RepoResult<Option<Account>> {
        query_one(
            self.conn,
            &format!("{ACCOUNT_SELECT_SQL} WHERE id = ?1;"),
            id,
            parse_account_row,
        )
    }

    fn create_account(&self, account: &NewAccount) -> RepoResult<Account> {
        let id = new_record_id();
        self.conn.execute(
            "INSERT INTO accounts (
                id,
                name,
                type,
                currency,
                balance,
                institution
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id,
                account.name,
                account.kind.as_str(),
                account.currency.as_deref().unwrap_or(DEFAULT_CURRENCY),
                account.balance.unwrap_or(0.0),
                account.institution,
            ],
        )?;
        load_required(self.get_account(&id)?, "accounts", &id)
    }

    fn update_account(&self, id: &str, patch: &AccountPatch) -> RepoResult<Option<Account>> {
        let changed = Assignments::default()
            .text("name", patch.name.as_deref())
            .text("type", patch.kind.map(AccountType::as_str))
            .text("currency", patch.currency.as_deref())
            .real("balance", patch.balance)
            .text("institution", patch.institution.as_deref())
            .flag("is_active", patch.is_active)
            .execute(self.conn, "accounts", id)?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_account(id)
    }

    fn delete_account(&self, id: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM accounts WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        query_all(
            self.conn,
            &format!("{CATEGORY_SELECT_SQL} ORDER BY name ASC, rowid ASC;"),
            Vec::new(),
            parse_category_row,
        )
    }

    fn create_category(&self, category: &NewCategory) -> RepoResult<Category> {
        let id = new_record_id();
        self.conn.execute(
            "INSERT INTO categories (id, name, type, icon, color, parent_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id,
                category.name,
                category.kind.as_str(),
                category.icon,
                category.color,
                category.parent_id,
            ],
        )?;
        let loaded = query_one(
            self.conn,
            &format!("{CATEGORY_SELECT_SQL} WHERE id = ?1;"),
            &id,
            parse_category_row,
        )?;
        load_required(loaded, "categories", &id)
    }

    fn list_transactions(&self, filter: &TransactionFilter) -> RepoResult<Vec<Transaction>> {
        let mut sql = format!("{TRANSACTION_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(account_id) = filter.account_id.as_ref() {
            sql.push_str(" AND account_id = ?");
            bind_values.push(Value::Text(account_id.clone()));
        }
        if let Some(category_id) = filter.category_id.as_ref() {
            sql.push_str(" AND category_id = ?");
            bind_values.push(Value::Text(category_id.clone()));
        }
        if let Some(start_date) = filter.start_date.as_ref() {
            sql.push_str(" AND date >= ?");
            bind_values.push(Value::Text(start_date.clone()));
        }
        if let Some(end_date) = filter.end_date.as_ref() {
            sql.push_str(" AND date <= ?");
            bind_values.push(Value::Text(end_date.clone()));
        }

        sql.push_str(" ORDER BY date DESC, created_at DESC, rowid DESC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_transaction_limit(
            filter.limit,
        ))));

        query_all(self.conn, &sql, bind_values, parse_transaction_row)
    }

    fn get_transaction(&self, id: &str) -> RepoResult<Option<Transaction>> {
        query_one(
            self.conn,
            &format!("{TRANSACTION_SELECT_SQL} WHERE id = ?1;"),
            id,
            parse_transaction_row,
        )
    }

    fn create_transaction(&self, transaction: &NewTransaction) -> RepoResult<Transaction> {
        let id = new_record_id();
        self.conn.execute(
            "INSERT INTO transactions (
                id,
                account_id,
                category_id,
                type,
                amount,
                description,
                notes,
                date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                id,
                transaction.account_id,
                transaction.category_id,
                transaction.kind.as_str(),
                transaction.amount,
                transaction.description,
                transaction.notes,
                transaction.date,
            ],
        )?;
        load_required(self.get_transaction(&id)?, "transactions", &id)
    }

    fn update_transaction(
        &self,
        id: &str,
        patch: &TransactionPatch,
    ) -> RepoResult<Option<Transaction>> {
        let changed = Assignments::default()
            .text("account_id", patch.account_id.as_deref())
            .text("category_id", patch.category_id.as_deref())
            .text("type", patch.kind.map(TransactionType::as_str))
            .real("amount", patch.amount)
            .text("description", patch.description.as_deref())
            .text("date", patch.date.as_deref())
            .text("notes", patch.notes.as_deref())
            .execute(self.conn, "transactions", id)?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_transaction(id)
    }

    fn delete_transaction(&self, id: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn list_budgets(&self) -> RepoResult<Vec<Budget>> {
        query_all(
            self.conn,
            &format!("{BUDGET_SELECT_SQL} ORDER BY created_at DESC, rowid DESC;"),
            Vec::new(),
            parse_budget_row,
        )
    }

    fn create_budget(&self, budget: &NewBudget) -> RepoResult<Budget> {
        let id = new_record_id();
        self.conn.execute(
            "INSERT INTO budgets (id, category_id, amount, period, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id,
                budget.category_id,
                budget.amount,
                budget.period.as_str(),
                budget.start_date,
                budget.end_date,
            ],
        )?;
        let loaded = query_one(
            self.conn,
            &format!("{BUDGET_SELECT_SQL} WHERE id = ?1;"),
            &id,
            parse_budget_row,
        )?;
        load_required(loaded, "budgets", &id)
    }
}

/// Normalizes the transaction list cap. `None` and `0` mean the default.
pub fn normalize_transaction_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => TRANSACTIONS_DEFAULT_LIMIT,
        Some(value) => value,
    }
}

fn parse_account_row(row: &Row<'_>) -> RepoResult<Account> {
    let type_text: String = row.get("type")?;
    Ok(Account {
        id: row.get("id")?,
        name: row.get("name")?,
        kind: parse_enum(&type_text, "accounts.type", AccountType::parse)?,
        currency: row.get("currency")?,
        balance: row.get("balance")?,
        credit_limit: row.get("credit_limit")?,
        institution: row.get("institution")?,
        account_number: row.get("account_number")?,
        is_active: int_to_bool(row.get("is_active")?, "accounts.is_active")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    let type_text: String = row.get("type")?;
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        kind: parse_enum(&type_text, "categories.type", CategoryType::parse)?,
        icon: row.get("icon")?,
        color: row.get("color")?,
        parent_id: row.get("parent_id")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_transaction_row(row: &Row<'_>) -> RepoResult<Transaction> {
    let type_text: String = row.get("type")?;
    Ok(Transaction {
        id: row.get("id")?,
        account_id: row.get("account_id")?,
        category_id: row.get("category_id")?,
        kind: parse_enum(&type_text, "transactions.type", TransactionType::parse)?,
        amount: row.get("amount")?,
        description: row.get("description")?,
        notes: row.get("notes")?,
        date: row.get("date")?,
        is_recurring: int_to_bool(row.get("is_recurring")?, "transactions.is_recurring")?,
        recurring_pattern: row.get("recurring_pattern")?,
        transfer_to_account_id: row.get("transfer_to_account_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_budget_row(row: &Row<'_>) -> RepoResult<Budget> {
    let period_text: String = row.get("period")?;
    Ok(Budget {
        id: row.get("id")?,
        category_id: row.get("category_id")?,
        amount: row.get("amount")?,
        period: parse_enum(&period_text, "budgets.period", BudgetPeriod::parse)?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        is_active: int_to_bool(row.get("is_active")?, "budgets.is_active")?,
        created_at: row.get("created_at")?,
    })
}
