//! CLI exit code registry.
//!
//! Single source of truth for `plink` exit codes. Scripts branch on these,
//! so treat them as part of the shell contract.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad arguments, unreadable input file)   |
//! | 3    | Config failed to parse or validate                   |
//! | 4    | Reference or contact data failed to load             |
//! | 5    | `--strict` run left at least one contact unmatched   |
//!
//! New codes go at the end of the table; never renumber.

/// Command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Unspecified failure. Prefer a specific code.
pub const EXIT_ERROR: u8 = 1;

/// Bad arguments or an input path that cannot be read.
pub const EXIT_USAGE: u8 = 2;

/// TOML parse error or a validation failure (thresholds, counties, files).
pub const EXIT_CONFIG_INVALID: u8 = 3;

/// Missing column, malformed CSV or unreadable reference file.
pub const EXIT_LOAD: u8 = 4;

/// Strict mode: some contact ended in no_match, collection_not_found or
/// insufficient_input.
pub const EXIT_UNMATCHED: u8 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_CONFIG_INVALID,
            EXIT_LOAD,
            EXIT_UNMATCHED,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
