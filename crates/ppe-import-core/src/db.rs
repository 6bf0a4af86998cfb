// crates/ppe-import-core/src/db.rs

use std::str::FromStr;
use std::sync::OnceLock;

use async_trait::async_trait;
use ppe_import_parser::{Column, ImportRecord};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;

use crate::config::DatabaseSettings;
use crate::sink::RecordSink;

pub const TABLE_NAME: &str = "PPE_DATA";

/// Parameterized insert covering every column in table order.
pub fn insert_query() -> &'static str {
    static QUERY: OnceLock<String> = OnceLock::new();
    QUERY.get_or_init(|| {
        let columns: Vec<&str> = Column::ALL.iter().map(Column::db_name).collect();
        let params: Vec<String> = (1..=Column::ALL.len()).map(|i| format!("${i}")).collect();
        format!(
            "INSERT INTO {TABLE_NAME} ({}) VALUES ({})",
            columns.join(", "),
            params.join(", ")
        )
    })
}

/// Accepts both `jdbc:postgresql://...` and native `postgres://...` URLs.
/// Credentials embedded in the URL are kept unless the settings supply their
/// own.
pub fn connect_options(
    settings: &DatabaseSettings,
    password: &str,
) -> Result<PgConnectOptions, sqlx::Error> {
    let url = settings
        .url
        .strip_prefix("jdbc:")
        .unwrap_or(&settings.url);

    let mut options = PgConnectOptions::from_str(url)?;
    if !settings.username.is_empty() {
        options = options.username(&settings.username);
    }
    if !password.is_empty() {
        options = options.password(password);
    }
    Ok(options)
}

/// A single connection used for every insert of a run. sqlx caches the
/// prepared insert per connection, so it is parsed once and then reused.
pub struct PgRecordSink {
    conn: Option<PgConnection>,
}

impl PgRecordSink {
    pub async fn connect(settings: &DatabaseSettings, password: &str) -> Result<Self, sqlx::Error> {
        let options = connect_options(settings, password)?;
        let conn = PgConnection::connect_with(&options).await?;
        Ok(Self { conn: Some(conn) })
    }
}

#[async_trait]
impl RecordSink for PgRecordSink {
    async fn insert(&mut self, record: &ImportRecord) -> Result<(), sqlx::Error> {
        let conn = self.conn.as_mut().ok_or(sqlx::Error::PoolClosed)?;

        sqlx::query(insert_query())
            .bind(&record.terminal)
            .bind(&record.department)
            .bind(record.event_time)
            .bind(&record.employee_number)
            .bind(&record.last_name)
            .bind(&record.first_name)
            .bind(&record.part_number)
            .bind(&record.item_id)
            .bind(&record.item_name)
            .bind(record.quantity)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), sqlx::Error> {
        match self.conn.take() {
            Some(conn) => conn.close().await,
            None => Ok(()),
        }
    }
}
