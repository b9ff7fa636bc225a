//! Overview snapshot across all three domains.

use super::finance_service::FinanceService;
use super::note_service::NoteService;
use super::task_service::TaskService;
use crate::model::finance::{FinanceInsights, Transaction, TransactionFilter};
use crate::model::notes::{Note, NoteStats};
use crate::model::tasks::{Task, TaskFilter, TaskStats, TaskStatus};
use crate::repo::finance_repo::SqliteFinanceRepository;
use crate::repo::note_repo::SqliteNoteRepository;
use crate::repo::task_repo::SqliteTaskRepository;
use crate::repo::RepoResult;
use rusqlite::Connection;
use serde::Serialize;

const RECENT_TRANSACTIONS: u32 = 5;
const RECENT_NOTES: u32 = 5;

/// Everything the overview page renders, loaded in one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub finance: FinanceInsights,
    pub tasks: TaskStats,
    pub notes: NoteStats,
    pub recent_transactions: Vec<Transaction>,
    pub todo_tasks: Vec<Task>,
    pub recent_notes: Vec<Note>,
}

/// Builds [`DashboardSnapshot`] values from one connection.
pub struct DashboardService<'conn> {
    finance: FinanceService<SqliteFinanceRepository<'conn>>,
    tasks: TaskService<SqliteTaskRepository<'conn>>,
    notes: NoteService<SqliteNoteRepository<'conn>>,
}

impl<'conn> DashboardService<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            finance: FinanceService::new(SqliteFinanceRepository::try_new(conn)?),
            tasks: TaskService::new(SqliteTaskRepository::try_new(conn)?),
            notes: NoteService::new(SqliteNoteRepository::try_new(conn)?),
        })
    }

    pub fn snapshot(&self) -> RepoResult<DashboardSnapshot> {
        Ok(DashboardSnapshot {
            finance: self.finance.insights()?,
            tasks: self.tasks.stats()?,
            notes: self.notes.stats()?,
            recent_transactions: self.finance.list_transactions(&TransactionFilter {
                limit: Some(RECENT_TRANSACTIONS),
                ..TransactionFilter::default()
            })?,
            todo_tasks: self.tasks.list_tasks(&TaskFilter {
                status: Some(TaskStatus::Todo),
                ..TaskFilter::default()
            })?,
            recent_notes: self.notes.recent_notes(RECENT_NOTES)?,
        })
    }
}
