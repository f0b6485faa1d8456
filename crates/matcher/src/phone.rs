/// Strip everything but digits and drop a leading US country code.
///
/// Only an 11-digit number starting with `1` loses its first digit. Other
/// lengths pass through untouched; callers decide what a valid number is.
pub fn normalize(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 11 && digits.starts_with('1') {
        digits[1..].to_string()
    } else {
        digits
    }
}

/// Two phone numbers match when their normalized forms are equal and non-empty.
pub fn phone_match(a: &str, b: &str) -> bool {
    let a = normalize(a);
    !a.is_empty() && a == normalize(b)
}
