// ABOUTME: Helpers for decoding text-encoded columns
// ABOUTME: UUIDs are stored as hyphenated text and parsed back on read

use uuid::Uuid;

use crate::{StorageError, StorageResult};

pub fn parse_uuid(value: &str) -> StorageResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| StorageError::Corrupt(format!("invalid UUID '{}': {}", value, e)))
}

pub fn parse_uuids<I, S>(values: I) -> StorageResult<Vec<Uuid>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| parse_uuid(value.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_uuid("nope"), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_parse_uuids() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        assert_eq!(parse_uuids(&strings).unwrap(), ids);
    }
}
