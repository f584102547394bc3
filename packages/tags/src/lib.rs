// ABOUTME: Tag lifecycle for organizing tasks
// ABOUTME: Owner-scoped tag CRUD, get-or-create by name, and orphan cleanup

pub mod storage;
pub mod types;

// Re-export main types
pub use storage::{get_or_create_tag, TagStorage};
pub use types::{Tag, TagCreateInput, TagUpdateInput};
