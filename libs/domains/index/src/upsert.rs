use std::sync::Arc;

use tracing::{info, warn};

use crate::connection::ConnectionManager;
use crate::error::IndexResult;
use crate::models::{FailedChunk, RejectedRecord, UpsertReport, VectorRecord};
use crate::store::IndexStore;

/// Records per write call. Remote stores cap payload size and request
/// rate, so bulk loads go out in bounded chunks.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Sequential, order-preserving bulk writer.
///
/// Splits input into fixed-size chunks and writes them one at a time
/// through the shared connection. A chunk the store rejects is recorded and
/// the remaining chunks still go out; retrying failed chunks is left to the
/// caller, since blind automatic retries can amplify transient failures.
pub struct BatchUpserter<S: IndexStore> {
    connection: Arc<ConnectionManager<S>>,
    chunk_size: usize,
}

impl<S: IndexStore> BatchUpserter<S> {
    pub fn new(connection: Arc<ConnectionManager<S>>) -> Self {
        Self {
            connection,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        // a zero chunk size would never drain the input
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Write `records` to the bound index and report what happened.
    ///
    /// Shape validation runs first, so records that cannot be stored are
    /// rejected before any network traffic; fully rejected or empty input
    /// never connects at all. Returns `Err` only when establishing the
    /// connection fails; per-chunk write failures are carried in the report.
    pub async fn upsert(&self, records: Vec<VectorRecord>) -> IndexResult<UpsertReport> {
        let total = records.len();
        let dimension = self.connection.descriptor().dimension;

        let mut valid = Vec::with_capacity(total);
        let mut report = UpsertReport::default();

        for record in records {
            match validate_record(&record, dimension) {
                Ok(()) => valid.push(record),
                Err(reason) => {
                    warn!(id = %record.id, %reason, "Rejecting record before send");
                    report
                        .rejected_before_send
                        .push(RejectedRecord { id: record.id, reason });
                }
            }
        }

        if valid.is_empty() {
            return Ok(report);
        }

        let handle = self.connection.connect().await?;

        info!(
            index = %self.connection.descriptor().name,
            records = valid.len(),
            chunk_size = self.chunk_size,
            "Uploading records"
        );

        for (index, chunk) in valid.chunks(self.chunk_size).enumerate() {
            let records = chunk.len();
            match handle.upsert(chunk.to_vec()).await {
                Ok(()) => report.total_accepted += records,
                Err(err) => {
                    warn!(chunk = index, records, error = %err, "Chunk write failed");
                    report.total_failed += records;
                    report.failed_chunks.push(FailedChunk {
                        index,
                        records,
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

fn validate_record(record: &VectorRecord, dimension: u32) -> Result<(), String> {
    if record.id.is_empty() {
        return Err("Record id must not be empty".to_string());
    }
    if record.values.len() != dimension as usize {
        return Err(format!(
            "Expected {} values, got {}",
            dimension,
            record.values.len()
        ));
    }
    Ok(())
}
