//! Shared test helpers for `PostgreSQL` integration tests.

use commentcast::campaign::{adapters::postgres::PostgresCampaignStore, domain::TaskId};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use eyre::Result;

/// SQL creating the campaign tables.
pub const CREATE_CAMPAIGN_TABLES_SQL: &str =
    include_str!("../../migrations/2026-10-16-000000_create_campaign_tables/up.sql");

/// Environment variable naming the database the tests may use.
pub const DATABASE_URL_ENV: &str = "COMMENTCAST_TEST_DATABASE_URL";

/// Points every pooled connection at the test schema.
#[derive(Debug)]
struct SchemaPath {
    schema: String,
}

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for SchemaPath {
    fn on_acquire(&self, connection: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        connection
            .batch_execute(&format!("SET search_path TO {}", self.schema))
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// A migrated schema that is dropped when the value goes out of scope.
pub struct TestSchema {
    url: String,
    name: String,
}

impl TestSchema {
    /// Creates a uniquely named schema and applies the migrations in it.
    ///
    /// # Errors
    ///
    /// Returns an error when the database is unreachable or the migration
    /// fails.
    pub fn create(url: &str) -> Result<Self> {
        let name = format!("commentcast_test_{}", TaskId::new());
        let mut connection = PgConnection::establish(url)?;
        connection.batch_execute(&format!(
            "CREATE SCHEMA {name}; SET search_path TO {name};"
        ))?;
        connection.batch_execute(CREATE_CAMPAIGN_TABLES_SQL)?;
        Ok(Self {
            url: url.to_owned(),
            name,
        })
    }

    /// Builds a store whose connections use this schema.
    ///
    /// # Errors
    ///
    /// Returns an error when the pool cannot be built.
    pub fn store(&self) -> Result<PostgresCampaignStore> {
        let pool = Pool::builder()
            .max_size(2)
            .connection_customizer(Box::new(SchemaPath {
                schema: self.name.clone(),
            }))
            .build(ConnectionManager::<PgConnection>::new(&self.url))?;
        Ok(PostgresCampaignStore::new(pool))
    }
}

impl Drop for TestSchema {
    fn drop(&mut self) {
        if let Ok(mut connection) = PgConnection::establish(&self.url) {
            let _ = connection.batch_execute(&format!("DROP SCHEMA {} CASCADE", self.name));
        }
    }
}

/// Returns a fresh schema, or `None` when no test database is configured.
///
/// # Errors
///
/// Returns an error when the configured database cannot be prepared.
pub fn test_schema() -> Result<Option<TestSchema>> {
    match std::env::var(DATABASE_URL_ENV) {
        Ok(url) if !url.trim().is_empty() => TestSchema::create(&url).map(Some),
        _ => {
            eprintln!("{DATABASE_URL_ENV} is not set; skipping PostgreSQL test");
            Ok(None)
        }
    }
}
