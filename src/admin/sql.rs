//! Statement building helpers
//!
//! Account-management statements cannot take bind parameters, so names
//! and passwords are embedded as quoted literals. Validation already
//! rejects quotes and backslashes in passwords; quoting here still
//! escapes them.

use std::sync::OnceLock;

use regex::Regex;

/// Quote a string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

/// Quote a schema identifier
pub fn quote_identifier(value: &str) -> String {
    format!("`{}`", value.replace('`', "``"))
}

/// `'user'@'host'`
pub fn account(user: &str, host: &str) -> String {
    format!("{}@{}", quote_literal(user), quote_literal(host))
}

fn literal_regex() -> &'static Regex {
    static LITERAL: OnceLock<Regex> = OnceLock::new();
    LITERAL.get_or_init(|| Regex::new(r"'(?:[^'\\]|\\.|'')*'").expect("static literal pattern"))
}

/// Replace every string literal with `'?'` so a statement can be logged
pub fn redact(statement: &str) -> String {
    literal_regex().replace_all(statement, "'?'").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("abc"), "'abc'");
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_literal("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("db"), "`db`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_account() {
        assert_eq!(account("app", "%"), "'app'@'%'");
    }

    #[test]
    fn test_redact_hides_passwords() {
        let stmt = "ALTER USER 'app'@'%' IDENTIFIED BY 'hunter2'";
        let redacted = redact(stmt);
        assert!(!redacted.contains("hunter2"));
        assert_eq!(redacted, "ALTER USER '?'@'?' IDENTIFIED BY '?'");
    }

    #[test]
    fn test_redact_leaves_plain_statements() {
        assert_eq!(redact("FLUSH PRIVILEGES"), "FLUSH PRIVILEGES");
    }
}
