/// Accepts digits, whitespace, dashes and parentheses, optionally after one leading `+`.
/// At least one digit is required.
pub(crate) fn is_valid_phone(raw: &str) -> bool {
    let body = raw.strip_prefix('+').unwrap_or(raw);
    !body.is_empty()
        && body.chars().any(|c| c.is_ascii_digit())
        && body.chars().all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '-' | '(' | ')'))
}

/// Keeps ASCII digits and a leading `+`. Applying it twice yields the same string.
pub(crate) fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut normalized = String::with_capacity(trimmed.len());
    if trimmed.starts_with('+') {
        normalized.push('+');
    }
    normalized.extend(trimmed.chars().filter(|c| c.is_ascii_digit()));
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_formats() {
        assert!(is_valid_phone("+7 (912) 345-67-89"));
        assert!(is_valid_phone("8-912-345-67-89"));
        assert!(is_valid_phone("89123456789"));
    }

    #[test]
    fn any_whitespace_separates_groups() {
        assert!(is_valid_phone("+7\t912 345"));
        assert!(is_valid_phone("8\u{a0}912\u{a0}345"));
        assert_eq!(normalize_phone("+7\t912 345"), "+7912345");
    }

    #[test]
    fn rejects_letters_and_misplaced_plus() {
        assert!(!is_valid_phone("call me"));
        assert!(!is_valid_phone("7+9123"));
        assert!(!is_valid_phone("+"));
        assert!(!is_valid_phone("++79123"));
        assert!(!is_valid_phone("(--)"));
    }

    #[test]
    fn normalization_strips_formatting() {
        assert_eq!(normalize_phone("+7 (912) 345-67-89"), "+79123456789");
        assert_eq!(normalize_phone(" 8-912-345 "), "8912345");
        assert_eq!(normalize_phone(""), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["+7 (912) 345-67-89", "8-912-345-67-89", "+1 555 0100", "(000)", ""] {
            let once = normalize_phone(raw);
            assert_eq!(normalize_phone(&once), once, "input: {raw:?}");
        }
    }
}
