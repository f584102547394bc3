// ABOUTME: Shared limits and validation for Slips
// ABOUTME: Foundational package used by every domain and API package

pub mod constants;
pub mod validation;

pub use constants::{
    DEFAULT_PAGE_SIZE, MAX_CHECKLIST_ITEM_LENGTH, MAX_CHECKLIST_SEED_ITEMS, MAX_NOTES_LENGTH,
    MAX_PAGE_SIZE, MAX_TAGS_PER_TASK, MAX_TAG_NAME_LENGTH, MAX_TITLE_LENGTH,
    MAX_TOKEN_NAME_LENGTH, START_DATE_FORMAT,
};

pub use validation::{
    clamp_page_size, normalize_tag_name, normalize_tag_names, parse_id, parse_start_date,
    validate_checklist_content, validate_length, validate_not_empty, validate_notes,
    validate_title, validate_token_name, ValidationError, ValidationResult,
};
