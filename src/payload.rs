//! The fixed request body.
//!
//! Every request carries the same transaction batch for a SQLite-over-HTTP
//! endpoint: credentials, a delete, a select, single and batched inserts
//! (one of them allowed to fail), a parameterized select and a final delete.
//! The batch is encoded once at startup and the bytes are shared by all
//! workers.

use serde::Serialize;
use serde_json::{json, Value};

/// Credentials block of a transaction request.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

/// One step of a transaction. Absent fields are not serialized.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionItem {
    #[serde(rename = "noFail", skip_serializing_if = "is_false")]
    pub no_fail: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Value>,
    #[serde(rename = "valuesBatch", skip_serializing_if = "Option::is_none")]
    pub values_batch: Option<Vec<Value>>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl TransactionItem {
    pub fn statement(sql: &str) -> Self {
        TransactionItem {
            statement: Some(sql.to_string()),
            ..Default::default()
        }
    }

    pub fn query(sql: &str) -> Self {
        TransactionItem {
            query: Some(sql.to_string()),
            ..Default::default()
        }
    }

    pub fn with_values(mut self, values: Value) -> Self {
        self.values = Some(values);
        self
    }

    pub fn with_values_batch(mut self, batch: Vec<Value>) -> Self {
        self.values_batch = Some(batch);
        self
    }

    pub fn no_fail(mut self) -> Self {
        self.no_fail = true;
        self
    }
}

/// Top-level request body.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionRequest {
    pub credentials: Credentials,
    pub transaction: Vec<TransactionItem>,
}

const INSERT: &str = "INSERT INTO TBL (ID, VAL) VALUES (:id, :val)";

impl TransactionRequest {
    /// The batch sent by every request of a burst.
    pub fn sample() -> Self {
        TransactionRequest {
            credentials: Credentials {
                user: "myUser".to_string(),
                password: "ciao".to_string(),
            },
            transaction: vec![
                TransactionItem::statement("DELETE FROM TBL"),
                TransactionItem::query("SELECT * FROM TBL"),
                TransactionItem::statement(INSERT).with_values(json!({"id": 0, "val": "zero"})),
                TransactionItem::statement(INSERT).with_values_batch(vec![
                    json!({"id": 1, "val": "uno"}),
                    json!({"id": 2, "val": "due"}),
                ]),
                // Wrong arity on purpose: the server must tolerate it because of noFail.
                TransactionItem::statement("INSERT INTO TBL (ID, VAL) VALUES (:id, :val, 1)")
                    .no_fail()
                    .with_values_batch(vec![
                        json!({"id": 1, "val": "uno"}),
                        json!({"id": 2, "val": "due"}),
                    ]),
                TransactionItem::statement(INSERT)
                    .with_values_batch(vec![json!({"id": 3, "val": "tre"})]),
                TransactionItem::query("SELECT * FROM TBL WHERE ID=:id")
                    .with_values(json!({"id": 1})),
                TransactionItem::statement("DELETE FROM TBL"),
            ],
        }
    }

    /// Encodes the request as compact UTF-8 JSON.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Encodes the sample batch and pins it for the rest of the process.
///
/// Workers borrow the returned slice concurrently; it is never mutated.
pub fn load() -> Result<&'static [u8], serde_json::Error> {
    let bytes = TransactionRequest::sample().encode()?;
    Ok(Box::leak(bytes.into_boxed_slice()))
}
