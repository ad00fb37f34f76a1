use thiserror::Error;

/// Punctuation accepted as the "special character" class. This set is the
/// backend's contract; do not extend it without coordinating with the form
/// copy that lists it.
pub const SPECIAL_CHARACTERS: &str = r##"!@#$%^&*()_+-=[]{};':"\|,.<>/?"##;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

/// First rule a candidate password violates.
///
/// Rules are checked in a fixed order so the user always sees the same
/// message for the same input. The `Display` strings are surfaced verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasswordIssue {
    #[error("Password must be at least 8 characters long")]
    TooShort,
    #[error("Password must contain at least one number")]
    MissingDigit,
    #[error("Password must contain at least one letter")]
    MissingLetter,
    #[error("Password must contain at least one special character")]
    MissingSpecial,
}

/// Checks the composition rules, returning the first violated one.
///
/// Pure and cheap enough to run on every keystroke.
pub fn validate_password(candidate: &str) -> Result<(), PasswordIssue> {
    if candidate.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordIssue::TooShort);
    }
    if !candidate.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordIssue::MissingDigit);
    }
    if !candidate.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(PasswordIssue::MissingLetter);
    }
    if !candidate.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        return Err(PasswordIssue::MissingSpecial);
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/validator_tests.rs"]
mod tests;
