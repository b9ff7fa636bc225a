use nooma_core::db::open_db_in_memory;
use nooma_core::model::finance::{
    AccountPatch, AccountType, BudgetPeriod, CategoryType, NewAccount, NewBudget, NewCategory,
    NewTransaction, TransactionFilter, TransactionPatch, TransactionType,
};
use nooma_core::{FinanceRepository, FinanceService, ServiceError, SqliteFinanceRepository};
use rusqlite::Connection;

fn transaction(account_id: &str, kind: TransactionType, amount: f64, date: &str) -> NewTransaction {
    NewTransaction {
        account_id: account_id.to_string(),
        category_id: None,
        kind,
        amount,
        description: format!("{} {amount}", kind.as_str()),
        date: date.to_string(),
        notes: None,
    }
}

fn service(conn: &Connection) -> FinanceService<SqliteFinanceRepository<'_>> {
    FinanceService::new(SqliteFinanceRepository::try_new(conn).unwrap())
}

#[test]
fn created_account_is_listed_once_with_default_balance_and_currency() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service
        .create_account(NewAccount::new("  Everyday  ", AccountType::Checking))
        .unwrap();
    assert_eq!(created.name, "Everyday");
    assert_eq!(created.balance, 0.0);
    assert_eq!(created.currency, "USD");
    assert!(created.is_active);

    let listed = service.list_accounts().unwrap();
    assert_eq!(listed, vec![created]);
}

#[test]
fn create_account_rejects_blank_name() {
    let conn = open_db_in_memory().unwrap();
    let err = service(&conn)
        .create_account(NewAccount::new("   ", AccountType::Cash))
        .unwrap_err();
    assert!(matches!(err, ServiceError::MissingField("name")));
    assert!(service(&conn).list_accounts().unwrap().is_empty());
}

#[test]
fn accounts_are_listed_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let first = service
        .create_account(NewAccount::new("First", AccountType::Savings))
        .unwrap();
    let second = service
        .create_account(NewAccount::new("Second", AccountType::Cash))
        .unwrap();

    let ids: Vec<_> = service
        .list_accounts()
        .unwrap()
        .into_iter()
        .map(|account| account.id)
        .collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[test]
fn update_account_touches_only_given_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .create_account(NewAccount {
            balance: Some(10.0),
            institution: Some("Bank".to_string()),
            ..NewAccount::new("Main", AccountType::Checking)
        })
        .unwrap();

    let updated = service
        .update_account(
            &created.id,
            &AccountPatch {
                balance: Some(42.5),
                is_active: Some(false),
                ..AccountPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.balance, 42.5);
    assert!(!updated.is_active);
    assert_eq!(updated.name, "Main");
    assert_eq!(updated.institution.as_deref(), Some("Bank"));

    assert!(service
        .update_account("missing", &AccountPatch::default())
        .unwrap()
        .is_none());
}

#[test]
fn list_transactions_filters_by_account_and_caps_by_limit() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let a = service
        .create_account(NewAccount::new("A", AccountType::Checking))
        .unwrap();
    let b = service
        .create_account(NewAccount::new("B", AccountType::Checking))
        .unwrap();

    for date in ["2024-01-03", "2024-01-01", "2024-01-05"] {
        service
            .create_transaction(transaction(&a.id, TransactionType::Expense, 5.0, date))
            .unwrap();
    }
    service
        .create_transaction(transaction(&b.id, TransactionType::Expense, 9.0, "2024-02-01"))
        .unwrap();

    let listed = service
        .list_transactions(&TransactionFilter {
            account_id: Some(a.id.clone()),
            limit: Some(2),
            ..TransactionFilter::default()
        })
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|row| row.account_id == a.id));
    let dates: Vec<_> = listed.iter().map(|row| row.date.as_str()).collect();
    assert_eq!(dates, vec!["2024-01-05", "2024-01-03"]);
}

#[test]
fn list_transactions_applies_inclusive_date_range() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let account = service
        .create_account(NewAccount::new("Main", AccountType::Checking))
        .unwrap();
    for date in ["2024-01-01", "2024-01-15", "2024-01-31", "2024-02-01"] {
        service
            .create_transaction(transaction(&account.id, TransactionType::Income, 1.0, date))
            .unwrap();
    }

    let listed = service
        .list_transactions(&TransactionFilter {
            start_date: Some("2024-01-15".to_string()),
            end_date: Some("2024-01-31".to_string()),
            ..TransactionFilter::default()
        })
        .unwrap();
    let dates: Vec<_> = listed.iter().map(|row| row.date.as_str()).collect();
    assert_eq!(dates, vec!["2024-01-31", "2024-01-15"]);
}

#[test]
fn insights_only_cover_the_most_recent_hundred_transactions() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let account = service
        .create_account(NewAccount {
            balance: Some(250.0),
            ..NewAccount::new("Main", AccountType::Checking)
        })
        .unwrap();

    service
        .create_transaction(transaction(
            &account.id,
            TransactionType::Expense,
            500.0,
            "2023-01-01",
        ))
        .unwrap();
    for _ in 0..100 {
        service
            .create_transaction(transaction(
                &account.id,
                TransactionType::Income,
                2.0,
                "2024-06-01",
            ))
            .unwrap();
    }

    let insights = service.insights().unwrap();
    assert_eq!(insights.transaction_count, 100);
    assert_eq!(insights.total_income, 200.0);
    assert_eq!(insights.total_expenses, 0.0);
    assert_eq!(
        insights.net_cash_flow,
        insights.total_income - insights.total_expenses
    );
    assert_eq!(insights.total_balance, 250.0);
    assert_eq!(insights.account_count, 1);
}

#[test]
fn deleting_account_leaves_its_transactions() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let account = service
        .create_account(NewAccount::new("Old", AccountType::Cash))
        .unwrap();
    let recorded = service
        .create_transaction(transaction(
            &account.id,
            TransactionType::Expense,
            3.0,
            "2024-01-01",
        ))
        .unwrap();

    assert!(service.delete_account(&account.id).unwrap());
    assert!(!service.delete_account(&account.id).unwrap());
    assert!(service.get_account(&account.id).unwrap().is_none());
    assert_eq!(
        service.get_transaction(&recorded.id).unwrap(),
        Some(recorded)
    );
}

#[test]
fn update_and_delete_transaction() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let account = service
        .create_account(NewAccount::new("Main", AccountType::Checking))
        .unwrap();
    let recorded = service
        .create_transaction(transaction(
            &account.id,
            TransactionType::Expense,
            3.0,
            "2024-01-01",
        ))
        .unwrap();

    let updated = service
        .update_transaction(
            &recorded.id,
            &TransactionPatch {
                amount: Some(4.5),
                kind: Some(TransactionType::Income),
                ..TransactionPatch::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.amount, 4.5);
    assert_eq!(updated.kind, TransactionType::Income);
    assert_eq!(updated.description, recorded.description);

    assert!(service.delete_transaction(&recorded.id).unwrap());
    assert!(service.get_transaction(&recorded.id).unwrap().is_none());
}

#[test]
fn create_transaction_requires_an_existing_account() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service
        .create_transaction(transaction(
            "no-such-account",
            TransactionType::Income,
            5.0,
            "2026-01-01",
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::UnknownReference { field: "accountId", ref id } if id == "no-such-account"
    ));
    assert!(service
        .list_transactions(&TransactionFilter::default())
        .unwrap()
        .is_empty());
}

#[test]
fn update_transaction_rejects_missing_account_and_non_finite_amount() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let account = service
        .create_account(NewAccount::new("Main", AccountType::Checking))
        .unwrap();
    let recorded = service
        .create_transaction(transaction(
            &account.id,
            TransactionType::Expense,
            3.0,
            "2024-01-01",
        ))
        .unwrap();

    let err = service
        .update_transaction(
            &recorded.id,
            &TransactionPatch {
                account_id: Some("gone".to_string()),
                ..TransactionPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::UnknownReference { .. }));

    let err = service
        .update_transaction(
            &recorded.id,
            &TransactionPatch {
                amount: Some(f64::INFINITY),
                ..TransactionPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidNumber("amount")));
    assert_eq!(
        service.get_transaction(&recorded.id).unwrap(),
        Some(recorded)
    );
}

#[test]
fn update_account_rejects_non_finite_balance() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .create_account(NewAccount::new("Main", AccountType::Checking))
        .unwrap();

    let err = service
        .update_account(
            &created.id,
            &AccountPatch {
                balance: Some(f64::NAN),
                ..AccountPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidNumber("balance")));
    assert_eq!(service.get_account(&created.id).unwrap().unwrap().balance, 0.0);
}

#[test]
fn create_transaction_rejects_blank_required_text() {
    let conn = open_db_in_memory().unwrap();
    let mut request = transaction("acc", TransactionType::Expense, 3.0, "2024-01-01");
    request.description = " ".to_string();
    let err = service(&conn).create_transaction(request).unwrap_err();
    assert!(matches!(err, ServiceError::MissingField("description")));
}

#[test]
fn categories_and_budgets_round_through_storage() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let groceries = service
        .create_category(NewCategory {
            name: "Groceries".to_string(),
            kind: CategoryType::Expense,
            icon: None,
            color: Some("#00aa00".to_string()),
            parent_id: None,
        })
        .unwrap();
    service
        .create_category(NewCategory {
            name: "Bonus".to_string(),
            kind: CategoryType::Income,
            icon: None,
            color: None,
            parent_id: None,
        })
        .unwrap();

    let names: Vec<_> = service
        .list_categories()
        .unwrap()
        .into_iter()
        .map(|category| category.name)
        .collect();
    assert_eq!(names, vec!["Bonus", "Groceries"]);

    let budget = service
        .create_budget(NewBudget {
            category_id: groceries.id.clone(),
            amount: 400.0,
            period: BudgetPeriod::Monthly,
            start_date: "2024-01-01".to_string(),
            end_date: None,
        })
        .unwrap();
    assert!(budget.is_active);
    assert_eq!(service.list_budgets().unwrap(), vec![budget]);

    let repo = SqliteFinanceRepository::try_new(&conn).unwrap();
    let filtered = repo
        .list_transactions(&TransactionFilter {
            category_id: Some(groceries.id),
            ..TransactionFilter::default()
        })
        .unwrap();
    assert!(filtered.is_empty());
}
