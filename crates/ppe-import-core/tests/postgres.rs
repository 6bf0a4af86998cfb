use std::env;
use std::fs;

use ppe_import_core::config::{DatabaseSettings, ImportSettings};
use ppe_import_core::db::{connect_options, insert_query};
use ppe_import_core::ingestion::{run_import, LoadReport};
use ppe_import_core::ErrorKind;
use sqlx::{Connection, PgConnection, Row};

const HEADER: &str = "Terminal,Department,DateTime,EmpNo,LastName,FirstName,PartNo,ItemId,ItemName,Qty";

#[test]
fn insert_query_lists_every_column() {
    assert_eq!(
        insert_query(),
        "INSERT INTO PPE_DATA (TERMINAL, DEPARTMENT, DATE_TIME, EMP_NUMBER, LAST_NAME, FIRST_NAME, GCT_PART_NUMBER, ITEM_ID, ITEM_NAME, QUANTITY) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
    );
}

#[test]
fn jdbc_prefix_is_accepted() {
    let settings = DatabaseSettings {
        url: "jdbc:postgresql://db.internal:6543/ppe".to_string(),
        username: "loader".to_string(),
        stored_password: String::new(),
    };
    let options = connect_options(&settings, "hunter2").expect("parse jdbc url");
    assert_eq!(options.get_host(), "db.internal");
    assert_eq!(options.get_port(), 6543);
    assert_eq!(options.get_username(), "loader");
    assert_eq!(options.get_database(), Some("ppe"));
}

#[tokio::test]
async fn imports_into_postgres() -> anyhow::Result<()> {
    let database_url = match env::var("PPE_IMPORT_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping Postgres import test because PPE_IMPORT_TEST_DATABASE_URL is not set"
            );
            return Ok(());
        }
    };

    let mut conn = PgConnection::connect(&database_url).await?;
    sqlx::query(
        r#"
            CREATE TABLE IF NOT EXISTS PPE_DATA (
                TERMINAL TEXT,
                DEPARTMENT TEXT,
                DATE_TIME TIMESTAMP,
                EMP_NUMBER TEXT,
                LAST_NAME TEXT,
                FIRST_NAME TEXT,
                GCT_PART_NUMBER TEXT,
                ITEM_ID TEXT,
                ITEM_NAME TEXT,
                QUANTITY INTEGER
            )
        "#,
    )
    .execute(&mut conn)
    .await?;
    sqlx::query("TRUNCATE TABLE PPE_DATA")
        .execute(&mut conn)
        .await?;

    let dir = tempfile::tempdir()?;
    fs::write(
        dir.path().join("first.csv"),
        format!("{HEADER}\nT01,Maintenance,03/14/2024 01:05:09 PM,004512,Doe,Jane,GCT-778,ITM-9,\"Gloves, Nitrile\",12\n"),
    )?;
    fs::write(
        dir.path().join("second.csv"),
        format!("{HEADER}\nT02,Stores,03/15/2024 09:00:00 AM,1200,Roe,Rick,GCT-100,ITM-1,Goggles,3\n"),
    )?;

    let settings = ImportSettings {
        source_dir: dir.path().to_path_buf(),
        database: DatabaseSettings {
            url: database_url.clone(),
            username: String::new(),
            stored_password: String::new(),
        },
    };

    let report = run_import(&settings, "", false).await?;
    assert_eq!(report, LoadReport { files: 2, records: 2 });

    let row = sqlx::query(
        "SELECT ITEM_NAME, QUANTITY, EMP_NUMBER FROM PPE_DATA WHERE TERMINAL = 'T01'",
    )
    .fetch_one(&mut conn)
    .await?;
    assert_eq!(row.get::<String, _>(0), "Gloves Nitrile");
    assert_eq!(row.get::<i32, _>(1), 12);
    assert_eq!(row.get::<String, _>(2), "004512");

    let bad_settings = ImportSettings {
        database: DatabaseSettings {
            url: database_url,
            username: "no_such_role_ppe_import".to_string(),
            stored_password: String::new(),
        },
        ..settings
    };
    let err = run_import(&bad_settings, "wrong", false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Database);

    conn.close().await?;
    Ok(())
}

