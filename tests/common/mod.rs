#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use schemasync::{DataType, Dialect, QueryResult, Result, SchemaError, SqlConnection};

/// Minimal dialect adapter for tests; the `batched` flag drives the
/// executor's ALTER TABLE strategy.
pub struct TestDialect {
    batched: bool,
}

impl TestDialect {
    pub fn batched() -> Self {
        Self { batched: true }
    }

    pub fn unbatched() -> Self {
        Self { batched: false }
    }
}

impl Dialect for TestDialect {
    fn name(&self) -> &'static str {
        "test"
    }

    fn supports_batched_alter(&self) -> bool {
        self.batched
    }

    fn auto_increment_primary_key(&self) -> bool {
        true
    }

    fn column_type(&self, data_type: DataType) -> String {
        match data_type {
            DataType::Text => "TEXT",
            DataType::Integer => "INTEGER",
            DataType::Float => "REAL",
            DataType::Boolean => "BOOLEAN",
            DataType::Timestamp => "TIMESTAMP",
            DataType::Json => "JSON",
        }
        .to_string()
    }
}

/// Connection fake that records every statement, serves scripted query
/// results, and injects failures for statements matching a substring.
pub struct RecordingConnection {
    statements: Mutex<Vec<String>>,
    results: Mutex<VecDeque<QueryResult>>,
    fail_on: Mutex<Option<String>>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self {
            statements: Mutex::new(Vec::new()),
            results: Mutex::new(VecDeque::new()),
            fail_on: Mutex::new(None),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    pub fn executed_matching(&self, needle: &str) -> Vec<String> {
        self.executed()
            .into_iter()
            .filter(|sql| sql.contains(needle))
            .collect()
    }

    /// Next `query` call returns this result instead of an empty set.
    pub fn queue_result(&self, result: QueryResult) {
        self.results.lock().unwrap().push_back(result);
    }

    /// Statements containing `needle` fail until cleared.
    pub fn fail_matching(&self, needle: &str) {
        *self.fail_on.lock().unwrap() = Some(needle.to_string());
    }

    pub fn clear_failure(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    fn check_failure(&self, sql: &str) -> Result<()> {
        if let Some(needle) = self.fail_on.lock().unwrap().as_ref()
            && sql.contains(needle)
        {
            return Err(SchemaError::Connection(format!(
                "injected failure for '{needle}'"
            )));
        }
        Ok(())
    }
}

impl Default for RecordingConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SqlConnection for RecordingConnection {
    async fn execute(&self, sql: &str) -> Result<u64> {
        self.check_failure(sql)?;
        self.statements.lock().unwrap().push(sql.to_string());
        Ok(0)
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        self.check_failure(sql)?;
        self.statements.lock().unwrap().push(sql.to_string());
        Ok(self
            .results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(QueryResult::empty))
    }
}
