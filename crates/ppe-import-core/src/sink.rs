use async_trait::async_trait;
use ppe_import_parser::ImportRecord;

/// Destination for decoded records. One sink lives for a whole run.
#[async_trait]
pub trait RecordSink: Send {
    async fn insert(&mut self, record: &ImportRecord) -> Result<(), sqlx::Error>;

    /// Releases the underlying resources. Called once per run.
    async fn close(&mut self) -> Result<(), sqlx::Error>;
}

/// Decodes without writing anywhere.
#[derive(Debug, Default)]
pub struct DryRunSink {
    pub accepted: usize,
}

#[async_trait]
impl RecordSink for DryRunSink {
    async fn insert(&mut self, _record: &ImportRecord) -> Result<(), sqlx::Error> {
        self.accepted += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}
