use anyhow::{Context, Result};
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::response::query_result::QueryResult;
use std::sync::Arc;
use tracing::info;

use crate::models::{AreaRecord, RegionRecord};
use crate::region::RegionStore;

/// ScyllaDB client holding the reference hierarchy and shipment records.
///
/// The region tables are denormalized per read path: every lookup the
/// resolver makes is an exact-equality query on a partition key.
#[derive(Clone)]
pub struct ScyllaClient {
    session: Arc<Session>,
}

impl ScyllaClient {
    pub async fn new(uri: &str) -> Result<Self> {
        info!("Connecting to ScyllaDB at {}...", uri);
        let session: Session = SessionBuilder::new()
            .known_node(uri)
            .build()
            .await
            .context("Failed to connect to ScyllaDB")?;

        let client = Self {
            session: Arc::new(session),
        };

        client.init_schema().await?;
        Ok(client)
    }

    async fn init_schema(&self) -> Result<()> {
        // Create keyspace if not exists
        self.session
            .query_unpaged(
                "CREATE KEYSPACE IF NOT EXISTS waybill
                 WITH REPLICATION = {
                    'class' : 'SimpleStrategy',
                    'replication_factor' : 1
                 }",
                &[],
            )
            .await?;

        self.session
            .query_unpaged(
                "CREATE TABLE IF NOT EXISTS waybill.provinces (
                    code text PRIMARY KEY,
                    name text
                )",
                &[],
            )
            .await?;

        self.session
            .query_unpaged(
                "CREATE TABLE IF NOT EXISTS waybill.cities_by_province (
                    province_code text,
                    code text,
                    name text,
                    PRIMARY KEY (province_code, code)
                )",
                &[],
            )
            .await?;

        self.session
            .query_unpaged(
                "CREATE TABLE IF NOT EXISTS waybill.areas_by_city (
                    city_code text,
                    code text,
                    name text,
                    PRIMARY KEY (city_code, code)
                )",
                &[],
            )
            .await?;

        self.session
            .query_unpaged(
                "CREATE TABLE IF NOT EXISTS waybill.areas_by_province (
                    province_code text,
                    code text,
                    city_code text,
                    name text,
                    PRIMARY KEY (province_code, code)
                )",
                &[],
            )
            .await?;

        // Shipment records, stored as JSON blobs
        self.session
            .query_unpaged(
                "CREATE TABLE IF NOT EXISTS waybill.shipments (
                    id text PRIMARY KEY,
                    data text
                )",
                &[],
            )
            .await?;

        Ok(())
    }

    pub async fn upsert_province(&self, record: &RegionRecord) -> Result<()> {
        self.session
            .query_unpaged(
                "INSERT INTO waybill.provinces (code, name) VALUES (?, ?)",
                (&record.code, &record.name),
            )
            .await?;
        Ok(())
    }

    pub async fn upsert_city(&self, province_code: &str, record: &RegionRecord) -> Result<()> {
        self.session
            .query_unpaged(
                "INSERT INTO waybill.cities_by_province (province_code, code, name)
                 VALUES (?, ?, ?)",
                (province_code, &record.code, &record.name),
            )
            .await?;
        Ok(())
    }

    /// Areas are written to both area tables: one keyed by owning city,
    /// one keyed by owning province (the grandparent join, precomputed).
    pub async fn upsert_area(
        &self,
        province_code: &str,
        city_code: &str,
        record: &RegionRecord,
    ) -> Result<()> {
        self.session
            .query_unpaged(
                "INSERT INTO waybill.areas_by_city (city_code, code, name)
                 VALUES (?, ?, ?)",
                (city_code, &record.code, &record.name),
            )
            .await?;
        self.session
            .query_unpaged(
                "INSERT INTO waybill.areas_by_province (province_code, code, city_code, name)
                 VALUES (?, ?, ?, ?)",
                (province_code, &record.code, city_code, &record.name),
            )
            .await?;
        Ok(())
    }

    pub async fn upsert_shipment(&self, id: &str, data: &str) -> Result<()> {
        self.session
            .query_unpaged(
                "INSERT INTO waybill.shipments (id, data) VALUES (?, ?)",
                (id, data),
            )
            .await?;
        Ok(())
    }

    async fn fetch_records(&self, query: &str, param: Option<&str>) -> Result<Vec<RegionRecord>> {
        let result: QueryResult = match param {
            Some(p) => self.session.query_unpaged(query, (p,)).await?,
            None => self.session.query_unpaged(query, &[]).await?,
        };

        let mut records = Vec::new();
        if let Ok(rows_result) = result.into_rows_result() {
            for row in rows_result.rows::<(String, String)>()? {
                let (code, name) = row?;
                records.push(RegionRecord { code, name });
            }
        }
        Ok(records)
    }
}

impl RegionStore for ScyllaClient {
    async fn provinces(&self) -> Result<Vec<RegionRecord>> {
        self.fetch_records("SELECT code, name FROM waybill.provinces", None)
            .await
            .context("Failed to list provinces")
    }

    async fn cities_of_province(&self, province_code: &str) -> Result<Vec<RegionRecord>> {
        self.fetch_records(
            "SELECT code, name FROM waybill.cities_by_province WHERE province_code = ?",
            Some(province_code),
        )
        .await
        .context("Failed to list cities of province")
    }

    async fn areas_of_city(&self, city_code: &str) -> Result<Vec<RegionRecord>> {
        self.fetch_records(
            "SELECT code, name FROM waybill.areas_by_city WHERE city_code = ?",
            Some(city_code),
        )
        .await
        .context("Failed to list areas of city")
    }

    async fn areas_of_province(&self, province_code: &str) -> Result<Vec<AreaRecord>> {
        let result = self
            .session
            .query_unpaged(
                "SELECT code, city_code, name FROM waybill.areas_by_province
                 WHERE province_code = ?",
                (province_code,),
            )
            .await
            .context("Failed to list areas of province")?;

        let mut records = Vec::new();
        if let Ok(rows_result) = result.into_rows_result() {
            for row in rows_result.rows::<(String, String, String)>()? {
                let (code, city_code, name) = row?;
                records.push(AreaRecord {
                    code,
                    name,
                    city_code,
                });
            }
        }
        Ok(records)
    }
}
