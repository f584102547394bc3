// ABOUTME: Field limits and pagination defaults shared by every Slips package
// ABOUTME: Single source for bounds enforced at the request boundary

/// Maximum task title length in characters
pub const MAX_TITLE_LENGTH: usize = 500;

/// Maximum task notes length in characters
pub const MAX_NOTES_LENGTH: usize = 50_000;

/// Maximum tag name length in characters
pub const MAX_TAG_NAME_LENGTH: usize = 100;

/// Maximum checklist item content length in characters
pub const MAX_CHECKLIST_ITEM_LENGTH: usize = 1_000;

/// Maximum API token name length in characters
pub const MAX_TOKEN_NAME_LENGTH: usize = 255;

/// Maximum number of tag names attached to a single task
pub const MAX_TAGS_PER_TASK: usize = 100;

/// Maximum number of checklist items supplied when creating a task
pub const MAX_CHECKLIST_SEED_ITEMS: usize = 200;

/// Page size used when the caller supplies none or an out-of-range value
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Largest page size a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Calendar date format for task start dates (YYYY-MM-DD)
pub const START_DATE_FORMAT: &str = "%Y-%m-%d";
