/// Canonical form used for every diagnosis lookup: surrounding whitespace
/// trimmed, `.` separators removed, ASCII uppercase.
pub fn normalize_diagnosis_code(value: &str) -> String {
    let stripped: String = value.chars().filter(|ch| *ch != '.').collect();
    stripped.trim().to_ascii_uppercase()
}
