//! Cache key layout shared by every backend.

/// Prefix of the per-record hash keys.
pub const STUDENT_KEY_PREFIX: &str = "student:";

/// Key of the serialized snapshot of the whole table.
pub const STUDENT_LIST_KEY: &str = "students_list";

/// Key holding the cached copy of one student.
pub fn student_key(id: i64) -> String {
    format!("{}{}", STUDENT_KEY_PREFIX, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_key() {
        assert_eq!(student_key(1), "student:1");
        assert_eq!(student_key(1234), "student:1234");
    }

    #[test]
    fn test_list_key_never_collides_with_record_keys() {
        assert!(!STUDENT_LIST_KEY.starts_with(STUDENT_KEY_PREFIX));
    }
}
