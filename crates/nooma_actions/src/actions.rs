//! Write actions for accounts, transactions, tasks, projects and notes.

use crate::form::FormData;
use crate::response::ActionResponse;
use crate::revalidate::Revalidator;
use log::{error, info};
use nooma_core::model::finance::{AccountType, NewAccount, NewTransaction, TransactionType};
use nooma_core::model::notes::{NewNote, Note};
use nooma_core::model::tasks::{NewProject, NewTask, TaskPriority};
use nooma_core::{
    FinanceService, NoteService, RecordId, ServiceError, SqliteFinanceRepository,
    SqliteNoteRepository, SqliteTaskRepository, TaskService,
};
use rusqlite::Connection;
use std::fmt::Display;

const ROUTES_ACCOUNTS: &[&str] = &["/finance", "/finance/accounts", "/"];
const ROUTES_TRANSACTIONS: &[&str] = &["/finance", "/finance/transactions", "/"];
const ROUTES_TASKS: &[&str] = &["/tasks", "/"];
const ROUTES_PROJECTS: &[&str] = &["/tasks", "/tasks/projects", "/"];
const ROUTES_NOTES: &[&str] = &["/notes", "/"];

/// Form actions bound to one connection and one revalidator.
pub struct Actions<'conn, V: Revalidator> {
    conn: &'conn Connection,
    revalidator: V,
}

/// Why an action did not produce a record.
enum Failure {
    /// Rejected before any write; the message goes to the user as-is.
    Invalid(&'static str),
    /// Target record does not exist.
    NotFound,
    Service(ServiceError),
}

impl From<ServiceError> for Failure {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<nooma_core::RepoError> for Failure {
    fn from(value: nooma_core::RepoError) -> Self {
        Self::Service(value.into())
    }
}

impl<'conn, V: Revalidator> Actions<'conn, V> {
    pub fn new(conn: &'conn Connection, revalidator: V) -> Self {
        Self { conn, revalidator }
    }

    /// Reads `name`, `type`, `balance` and `institution`.
    pub fn create_account(&self, form: &FormData) -> ActionResponse {
        let result = (|| -> Result<RecordId, Failure> {
            let (Some(name), Some(kind)) = (form.get_owned("name"), form.get("type")) else {
                return Err(Failure::Invalid("Name and type are required"));
            };
            let balance = form
                .number("balance")
                .map_err(|_| Failure::Invalid("Balance must be a number"))?;
            let account = NewAccount {
                balance: Some(balance.unwrap_or(0.0)),
                institution: form.get_owned("institution"),
                ..NewAccount::new(name, map_account_type(kind))
            };
            let service = FinanceService::new(SqliteFinanceRepository::try_new(self.conn)?);
            Ok(service.create_account(account)?.id)
        })();
        self.finish(
            "create_account",
            result,
            "Account created.",
            "Failed to create account",
            ROUTES_ACCOUNTS,
        )
    }

    /// Reads `accountId`, `type`, `amount`, `description`, `date`, and the
    /// optional `categoryId` and `notes`.
    pub fn create_transaction(&self, form: &FormData) -> ActionResponse {
        let result = (|| -> Result<RecordId, Failure> {
            let (Some(account_id), Some(kind), Some(_), Some(description), Some(date)) = (
                form.get_owned("accountId"),
                form.get("type"),
                form.get("amount"),
                form.get_owned("description"),
                form.get_owned("date"),
            ) else {
                return Err(Failure::Invalid("All required fields must be filled"));
            };
            let amount = form
                .number("amount")
                .ok()
                .flatten()
                .ok_or(Failure::Invalid("Amount must be a number"))?;
            let transaction = NewTransaction {
                account_id,
                category_id: form.get_owned("categoryId"),
                kind: map_transaction_type(kind),
                amount,
                description,
                date,
                notes: form.get_owned("notes"),
            };
            let service = FinanceService::new(SqliteFinanceRepository::try_new(self.conn)?);
            Ok(service.create_transaction(transaction)?.id)
        })();
        self.finish(
            "create_transaction",
            result,
            "Transaction recorded.",
            "Failed to record transaction",
            ROUTES_TRANSACTIONS,
        )
    }

    /// Reads `title`, `description`, `projectId`, `priority` and `dueDate`.
    pub fn create_task(&self, form: &FormData) -> ActionResponse {
        let result = (|| -> Result<RecordId, Failure> {
            let title = form
                .get_owned("title")
                .ok_or(Failure::Invalid("Title is required"))?;
            let task = NewTask {
                title,
                description: form.get_owned("description"),
                project_id: form.get_owned("projectId"),
                priority: Some(map_priority(form.get("priority"))),
                due_date: form.get_owned("dueDate"),
            };
            let service = TaskService::new(SqliteTaskRepository::try_new(self.conn)?);
            Ok(service.create_task(task)?.id)
        })();
        self.finish(
            "create_task",
            result,
            "Task created.",
            "Failed to create task",
            ROUTES_TASKS,
        )
    }

    pub fn complete_task(&self, task_id: &str) -> ActionResponse {
        let result = (|| -> Result<RecordId, Failure> {
            let service = TaskService::new(SqliteTaskRepository::try_new(self.conn)?);
            service
                .complete_task(task_id)?
                .map(|task| task.id)
                .ok_or(Failure::NotFound)
        })();
        self.finish(
            "complete_task",
            result,
            "Task completed.",
            "Failed to complete task",
            ROUTES_TASKS,
        )
    }

    pub fn delete_task(&self, task_id: &str) -> ActionResponse {
        let result = (|| -> Result<RecordId, Failure> {
            let service = TaskService::new(SqliteTaskRepository::try_new(self.conn)?);
            if service.delete_task(task_id)? {
                Ok(task_id.to_string())
            } else {
                Err(Failure::NotFound)
            }
        })();
        self.finish(
            "delete_task",
            result,
            "Task deleted.",
            "Failed to delete task",
            ROUTES_TASKS,
        )
    }

    /// Reads `name`, `description`, `color` and `dueDate`.
    pub fn create_project(&self, form: &FormData) -> ActionResponse {
        let result = (|| -> Result<RecordId, Failure> {
            let name = form
                .get_owned("name")
                .ok_or(Failure::Invalid("Project name is required"))?;
            let project = NewProject {
                name,
                description: form.get_owned("description"),
                color: form.get_owned("color"),
                due_date: form.get_owned("dueDate"),
            };
            let service = TaskService::new(SqliteTaskRepository::try_new(self.conn)?);
            Ok(service.create_project(project)?.id)
        })();
        self.finish(
            "create_project",
            result,
            "Project created.",
            "Failed to create project",
            ROUTES_PROJECTS,
        )
    }

    /// Reads `title`, `content` and `folderId`.
    pub fn create_note(&self, form: &FormData) -> ActionResponse {
        let result = (|| -> Result<RecordId, Failure> {
            let title = form
                .get_owned("title")
                .ok_or(Failure::Invalid("Title is required"))?;
            let note = NewNote {
                title,
                content: form.get_owned("content"),
                folder_id: form.get_owned("folderId"),
            };
            let service = NoteService::new(SqliteNoteRepository::try_new(self.conn)?);
            Ok(service.create_note(note)?.id)
        })();
        self.finish(
            "create_note",
            result,
            "Note created.",
            "Failed to create note",
            ROUTES_NOTES,
        )
    }

    /// Searches notes; any failure degrades to no results.
    pub fn search_notes(&self, query: &str) -> Vec<Note> {
        let result = SqliteNoteRepository::try_new(self.conn)
            .and_then(|repo| NoteService::new(repo).search_notes(query));
        match result {
            Ok(notes) => notes,
            Err(err) => {
                log_failure("search_notes", &err);
                Vec::new()
            }
        }
    }

    fn finish(
        &self,
        action: &'static str,
        result: Result<RecordId, Failure>,
        success_message: &str,
        failure_message: &str,
        routes: &[&str],
    ) -> ActionResponse {
        match result {
            Ok(id) => {
                for route in routes {
                    self.revalidator.invalidate(route);
                }
                info!("event=action module=actions status=ok action={action} id={id}");
                ActionResponse::success(success_message, id)
            }
            Err(Failure::Invalid(message)) => {
                info!("event=action module=actions status=rejected action={action}");
                ActionResponse::failure(message)
            }
            Err(Failure::NotFound) => {
                log_failure(action, &"record not found");
                ActionResponse::failure(failure_message)
            }
            Err(Failure::Service(err)) => {
                log_failure(action, &err);
                ActionResponse::failure(failure_message)
            }
        }
    }
}

fn log_failure(action: &str, err: &dyn Display) {
    error!("event=action module=actions status=error action={action} error={err}");
}

/// Maps form account types; `credit` is the form's name for credit cards.
fn map_account_type(value: &str) -> AccountType {
    match value {
        "credit" => AccountType::CreditCard,
        "savings" => AccountType::Savings,
        "cash" => AccountType::Cash,
        "investment" => AccountType::Investment,
        _ => AccountType::Checking,
    }
}

fn map_transaction_type(value: &str) -> TransactionType {
    TransactionType::parse(value).unwrap_or(TransactionType::Expense)
}

fn map_priority(value: Option<&str>) -> TaskPriority {
    value.and_then(TaskPriority::parse).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{map_account_type, map_priority, map_transaction_type, Actions};
    use crate::{FormData, RecordingRevalidator};
    use nooma_core::model::finance::{AccountType, TransactionFilter, TransactionType};
    use nooma_core::model::tasks::{TaskPriority, TaskStatus};
    use nooma_core::{
        open_db_in_memory, FinanceRepository, NoteRepository, SqliteFinanceRepository,
        SqliteNoteRepository, SqliteTaskRepository, TaskRepository,
    };

    fn form(fields: &[(&str, &str)]) -> FormData {
        fields.iter().copied().collect()
    }

    #[test]
    fn enum_mapping_falls_back_to_defaults() {
        assert_eq!(map_account_type("credit"), AccountType::CreditCard);
        assert_eq!(map_account_type("savings"), AccountType::Savings);
        assert_eq!(map_account_type("credit_card"), AccountType::Checking);
        assert_eq!(map_account_type("bogus"), AccountType::Checking);
        assert_eq!(map_transaction_type("income"), TransactionType::Income);
        assert_eq!(map_transaction_type("refund"), TransactionType::Expense);
        assert_eq!(map_priority(Some("urgent")), TaskPriority::Urgent);
        assert_eq!(map_priority(Some("asap")), TaskPriority::Medium);
        assert_eq!(map_priority(None), TaskPriority::Medium);
    }

    #[test]
    fn create_account_maps_type_defaults_balance_and_revalidates() {
        let conn = open_db_in_memory().expect("open db");
        let revalidator = RecordingRevalidator::new();
        let actions = Actions::new(&conn, &revalidator);

        let response = actions.create_account(&form(&[("name", "Visa"), ("type", "credit")]));
        assert!(response.ok, "{}", response.message);
        assert_eq!(
            revalidator.take(),
            vec!["/finance", "/finance/accounts", "/"]
        );

        let repo = SqliteFinanceRepository::try_new(&conn).expect("repo");
        let account = repo
            .get_account(response.id.as_deref().expect("id"))
            .expect("get")
            .expect("account exists");
        assert_eq!(account.kind, AccountType::CreditCard);
        assert_eq!(account.balance, 0.0);
    }

    #[test]
    fn create_account_rejects_missing_fields_without_writing() {
        let conn = open_db_in_memory().expect("open db");
        let revalidator = RecordingRevalidator::new();
        let actions = Actions::new(&conn, &revalidator);

        let response = actions.create_account(&form(&[("name", "Visa"), ("type", "")]));
        assert!(!response.ok);
        assert_eq!(response.message, "Name and type are required");

        let response = actions.create_account(&form(&[
            ("name", "Visa"),
            ("type", "cash"),
            ("balance", "lots"),
        ]));
        assert_eq!(response.message, "Balance must be a number");

        assert!(revalidator.take().is_empty());
        let repo = SqliteFinanceRepository::try_new(&conn).expect("repo");
        assert!(repo.list_accounts().expect("list").is_empty());
    }

    #[test]
    fn create_transaction_validates_and_defaults_type() {
        let conn = open_db_in_memory().expect("open db");
        let revalidator = RecordingRevalidator::new();
        let actions = Actions::new(&conn, &revalidator);

        let missing = actions.create_transaction(&form(&[("accountId", "a"), ("type", "income")]));
        assert_eq!(missing.message, "All required fields must be filled");

        let bad_amount = actions.create_transaction(&form(&[
            ("accountId", "a"),
            ("type", "income"),
            ("amount", "12,50"),
            ("description", "Lunch"),
            ("date", "2024-03-01"),
        ]));
        assert_eq!(bad_amount.message, "Amount must be a number");
        assert!(revalidator.take().is_empty());

        let unknown_account = actions.create_transaction(&form(&[
            ("accountId", "a"),
            ("type", "income"),
            ("amount", "5"),
            ("description", "Lunch"),
            ("date", "2024-03-01"),
        ]));
        assert!(!unknown_account.ok);
        assert_eq!(unknown_account.message, "Failed to record transaction");
        assert!(revalidator.take().is_empty());

        let account = actions.create_account(&form(&[("name", "Main"), ("type", "checking")]));
        let account_id = account.id.expect("account id");
        revalidator.take();

        let response = actions.create_transaction(&form(&[
            ("accountId", account_id.as_str()),
            ("type", "gift"),
            ("amount", "12.5"),
            ("description", "Lunch"),
            ("date", "2024-03-01"),
        ]));
        assert!(response.ok, "{}", response.message);
        assert_eq!(
            revalidator.take(),
            vec!["/finance", "/finance/transactions", "/"]
        );

        let repo = SqliteFinanceRepository::try_new(&conn).expect("repo");
        let listed = repo
            .list_transactions(&TransactionFilter::default())
            .expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].kind, TransactionType::Expense);
        assert_eq!(listed[0].amount, 12.5);
    }

    #[test]
    fn create_task_reports_store_failure_without_revalidating() {
        let conn = open_db_in_memory().expect("open db");
        let revalidator = RecordingRevalidator::new();
        let actions = Actions::new(&conn, &revalidator);

        let response = actions.create_task(&form(&[
            ("title", "Orphan"),
            ("projectId", "no-such-project"),
        ]));
        assert!(!response.ok);
        assert_eq!(response.id, None);
        assert_eq!(response.message, "Failed to create task");
        assert!(revalidator.take().is_empty());

        let repo = SqliteTaskRepository::try_new(&conn).expect("repo");
        assert!(repo.list_tasks(&Default::default()).expect("list").is_empty());
    }

    #[test]
    fn task_lifecycle_actions_revalidate_task_routes() {
        let conn = open_db_in_memory().expect("open db");
        let revalidator = RecordingRevalidator::new();
        let actions = Actions::new(&conn, &revalidator);

        assert_eq!(
            actions.create_task(&form(&[("title", " ")])).message,
            "Title is required"
        );

        let created = actions.create_task(&form(&[("title", "Ship"), ("priority", "loud")]));
        assert!(created.ok, "{}", created.message);
        let id = created.id.expect("id");
        assert_eq!(revalidator.take(), vec!["/tasks", "/"]);

        let repo = SqliteTaskRepository::try_new(&conn).expect("repo");
        let task = repo.get_task(&id).expect("get").expect("task exists");
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.status, TaskStatus::Todo);

        let completed = actions.complete_task(&id);
        assert!(completed.ok, "{}", completed.message);
        assert_eq!(revalidator.take(), vec!["/tasks", "/"]);
        let task = repo.get_task(&id).expect("get").expect("task exists");
        assert_eq!(task.status, TaskStatus::Done);
        assert!(task.completed_at.is_some());

        assert!(actions.delete_task(&id).ok);
        assert_eq!(revalidator.take(), vec!["/tasks", "/"]);
        assert!(repo.get_task(&id).expect("get").is_none());

        let missing = actions.delete_task(&id);
        assert!(!missing.ok);
        assert_eq!(missing.message, "Failed to delete task");
        assert_eq!(actions.complete_task(&id).message, "Failed to complete task");
        assert!(revalidator.take().is_empty());
    }

    #[test]
    fn create_project_requires_name() {
        let conn = open_db_in_memory().expect("open db");
        let revalidator = RecordingRevalidator::new();
        let actions = Actions::new(&conn, &revalidator);

        let rejected = actions.create_project(&form(&[("color", "#fff")]));
        assert_eq!(rejected.message, "Project name is required");

        let created = actions.create_project(&form(&[("name", "Launch")]));
        assert!(created.ok, "{}", created.message);
        assert_eq!(revalidator.take(), vec!["/tasks", "/tasks/projects", "/"]);
    }

    #[test]
    fn create_note_then_search_finds_it() {
        let conn = open_db_in_memory().expect("open db");
        let revalidator = RecordingRevalidator::new();
        let actions = Actions::new(&conn, &revalidator);

        let created = actions.create_note(&form(&[
            ("title", "Greeting"),
            ("content", "# Hello *world*"),
        ]));
        assert!(created.ok, "{}", created.message);
        assert_eq!(revalidator.take(), vec!["/notes", "/"]);

        let repo = SqliteNoteRepository::try_new(&conn).expect("repo");
        let note = repo
            .get_note(created.id.as_deref().expect("id"))
            .expect("get")
            .expect("note exists");
        assert_eq!(note.content_plain, "Hello world");

        let hits = actions.search_notes("world");
        assert_eq!(hits.len(), 1);
        assert!(actions.search_notes("   ").is_empty());
    }

    #[test]
    fn search_notes_degrades_to_empty_on_storage_failure() {
        let conn = open_db_in_memory().expect("open db");
        conn.execute_batch("DROP TABLE notes_to_tags; DROP TABLE note_links; DROP TABLE notes;")
            .expect("drop notes");
        let actions = Actions::new(&conn, RecordingRevalidator::new());
        assert!(actions.search_notes("anything").is_empty());
    }
}
