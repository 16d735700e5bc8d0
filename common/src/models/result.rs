//! Result models produced by the adapters.

/// One result record: an ordered column-name-to-value mapping.
///
/// `serde_json`'s `preserve_order` feature keeps columns in SELECT order.
/// Column sets may vary row to row; nothing here enforces homogeneity
/// beyond what the source database returns.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Outcome of a successful connection test.
#[derive(Debug)]
pub struct TestOutcome {
    /// Confirmation message shown to the user.
    pub message: String,
}

impl TestOutcome {
    /// Standard confirmation for the given database label.
    pub fn succeeded(label: &str) -> Self {
        Self {
            message: format!("{} connection succeeded", label),
        }
    }
}

/// Outcome of a successful query execution.
#[derive(Debug)]
pub struct QueryOutcome {
    /// Result rows in the order the driver returned them.
    pub rows: Vec<Row>,

    /// Wall-clock time from just before connect to just after the
    /// result was read. Teardown is excluded.
    pub execution_time_ms: u64,
}

impl QueryOutcome {
    /// Builds an outcome from rows and a measured duration.
    pub fn new(rows: Vec<Row>, execution_time_ms: u64) -> Self {
        Self {
            rows,
            execution_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_message_names_the_backend() {
        let outcome = TestOutcome::succeeded("SQL Server");
        assert_eq!(outcome.message, "SQL Server connection succeeded");
    }
}
