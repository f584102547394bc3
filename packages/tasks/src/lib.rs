// ABOUTME: Task engine for Slips
// ABOUTME: Tasks with inbox/scheduled start dates, tag sets, archive state, and ordered checklists

pub mod checklist;
pub mod error;
pub mod service;
pub mod storage;
pub mod types;

pub use checklist::validate_checklist_order;
pub use error::{TaskError, TaskResult};
pub use service::TaskService;
pub use storage::TaskStorage;
pub use types::{
    ArchiveFilter, ChecklistItem, StartDate, StartDateChange, StartDateKind, Task,
    TaskCreateInput, TaskListQuery, TaskUpdateInput,
};
