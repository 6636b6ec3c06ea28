//! JSON line writer
//!
//! Each event becomes a single object on a single stdout line. `event`
//! and `severity` lead; the caller's fields follow in key order so two
//! lines for the same event always diff cleanly.

use std::io::{self, Write};

/// Severity attached to every line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Trace,
    Info,
    Warn,
    Error,
    /// The start is abandoned
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

/// Object under construction, opening brace already written
struct Line {
    text: String,
}

impl Line {
    fn open(event: &str, severity: Severity) -> Self {
        let mut line = Self {
            text: String::from("{"),
        };
        line.push("event", event);
        line.push("severity", severity.as_str());
        line
    }

    fn push(&mut self, key: &str, value: &str) {
        if self.text.len() > 1 {
            self.text.push(',');
        }
        push_quoted(&mut self.text, key);
        self.text.push(':');
        push_quoted(&mut self.text, value);
    }

    fn close(mut self) -> String {
        self.text.push_str("}\n");
        self.text
    }
}

fn push_quoted(out: &mut String, raw: &str) {
    out.push('"');
    for c in raw.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Render one event as a newline-terminated JSON object
fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut ordered = fields.to_vec();
    ordered.sort_unstable_by_key(|&(key, _)| key);

    let mut line = Line::open(event, severity);
    for (key, value) in ordered {
        line.push(key, value);
    }
    line.close()
}

/// Write one event to stdout
pub(super) fn emit(severity: Severity, event: &str, fields: &[(&str, &str)]) {
    let line = render(severity, event, fields);
    let _ = io::stdout().lock().write_all(line.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> serde_json::Value {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_event_and_severity_lead() {
        let line = render(Severity::Fatal, "ORCHESTRATION_ABORTED", &[("code", "4"), ("a", "b")]);
        assert!(line.starts_with("{\"event\":\"ORCHESTRATION_ABORTED\",\"severity\":\"FATAL\","));

        let parsed = parse(&line);
        assert_eq!(parsed["code"], "4");
        assert_eq!(parsed["a"], "b");
    }

    #[test]
    fn test_fields_in_key_order() {
        let forward = render(
            Severity::Warn,
            "REPLICATION_RETRY",
            &[("reason", "x"), ("attempt", "2"), ("delay", "1000ms")],
        );
        let shuffled = render(
            Severity::Warn,
            "REPLICATION_RETRY",
            &[("delay", "1000ms"), ("reason", "x"), ("attempt", "2")],
        );
        assert_eq!(forward, shuffled);
        assert!(forward.ends_with(",\"attempt\":\"2\",\"delay\":\"1000ms\",\"reason\":\"x\"}\n"));
    }

    #[test]
    fn test_values_stay_on_one_line() {
        let message = "Access denied for \"root\"\nretry\u{1}";
        let line = render(Severity::Error, "DAEMON_KILLED", &[("message", message)]);

        assert_eq!(line.matches('\n').count(), 1);
        assert_eq!(parse(&line)["message"], message);
    }

    #[test]
    fn test_no_fields() {
        let line = render(Severity::Info, "ORCHESTRATION_START", &[]);
        assert_eq!(line, "{\"event\":\"ORCHESTRATION_START\",\"severity\":\"INFO\"}\n");
    }
}
