//! Shipment CSV ingest pipeline.
//!
//! Seeds the administrative reference store from a regions export,
//! then coerces shipment rows, resolves each raw address into
//! province/city/area, and writes records to ScyllaDB and Elasticsearch.

mod rows;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use hashbrown::HashMap;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use waybill::elasticsearch::{create_index, BulkIndexer, EsClient};
use waybill::goods::GoodsClassifier;
use waybill::models::{RegionRecord, RegionTier, Shipment};
use waybill::region::AddressResolver;
use waybill::scylla::ScyllaClient;

use crate::rows::{build_items, coerce_row, digit_pattern, skip_leading_rows, ColumnMap};

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Ingest region and shipment CSV exports")]
struct Args {
    /// Regions CSV (tier,code,name,parent_code) to seed the reference store
    #[arg(long)]
    regions: Option<PathBuf>,

    /// Shipments CSV export to ingest
    #[arg(long)]
    shipments: Option<PathBuf>,

    /// Leading banner lines to drop before the shipment header row
    #[arg(long, default_value = "0")]
    skip_rows: usize,

    /// ScyllaDB URL
    #[arg(long, default_value = "127.0.0.1")]
    scylla_url: String,

    /// Elasticsearch URL
    #[arg(long, default_value = "http://localhost:9200")]
    es_url: String,

    /// Elasticsearch index name
    #[arg(long, default_value = "shipments")]
    index: String,

    /// Create/recreate index before import
    #[arg(long)]
    create_index: bool,

    /// Batch size for bulk indexing
    #[arg(long, default_value = "1000")]
    batch_size: usize,

    /// Optional goods classification rules (TOML)
    #[arg(long)]
    goods_rules: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RegionRow {
    tier: String,
    code: String,
    name: String,
    #[serde(default)]
    parent_code: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    if args.regions.is_none() && args.shipments.is_none() {
        anyhow::bail!("Nothing to do: pass --regions and/or --shipments");
    }

    info!("Waybill Ingest Pipeline");

    let scylla_client = ScyllaClient::new(&args.scylla_url)
        .await
        .context("Failed to connect to ScyllaDB")?;

    if let Some(path) = &args.regions {
        seed_regions(&scylla_client, path).await?;
    }

    if let Some(path) = &args.shipments {
        ingest_shipments(&args, &scylla_client, path).await?;
    }

    Ok(())
}

/// Seed the reference hierarchy. Provinces are inserted first, then
/// cities, then areas, so that every area can be joined to its
/// grandparent province; areas referencing an unknown city are dropped.
async fn seed_regions(client: &ScyllaClient, path: &PathBuf) -> Result<()> {
    info!("Seeding regions from: {}", path.display());

    let mut reader = csv::Reader::from_path(path).context("Failed to open regions CSV")?;
    let mut region_rows: Vec<RegionRow> = Vec::new();
    for row in reader.deserialize() {
        let row: RegionRow = row.context("Failed to parse region row")?;
        region_rows.push(row);
    }

    let tier_of = |row: &RegionRow| RegionTier::parse(&row.tier);

    let mut counts = (0usize, 0usize, 0usize);

    for row in region_rows
        .iter()
        .filter(|r| tier_of(r) == Some(RegionTier::Province))
    {
        let record = RegionRecord::new(&row.code, &row.name);
        client.upsert_province(&record).await?;
        counts.0 += 1;
    }

    let mut city_to_province: HashMap<String, String> = HashMap::new();
    for row in region_rows
        .iter()
        .filter(|r| tier_of(r) == Some(RegionTier::City))
    {
        let record = RegionRecord::new(&row.code, &row.name);
        client.upsert_city(&row.parent_code, &record).await?;
        city_to_province.insert(row.code.clone(), row.parent_code.clone());
        counts.1 += 1;
    }

    for row in region_rows.iter() {
        match tier_of(row) {
            Some(RegionTier::Area) => {
                // Municipalities hang areas directly off the province code.
                let province_code = city_to_province
                    .get(&row.parent_code)
                    .cloned()
                    .unwrap_or_else(|| row.parent_code.clone());
                let record = RegionRecord::new(&row.code, &row.name);
                client
                    .upsert_area(&province_code, &row.parent_code, &record)
                    .await?;
                counts.2 += 1;
            }
            Some(_) => {}
            None => warn!("Unknown region tier {:?}, skipping row", row.tier),
        }
    }

    info!(
        "Seeded {} provinces, {} cities, {} areas",
        counts.0, counts.1, counts.2
    );
    Ok(())
}

async fn ingest_shipments(args: &Args, scylla_client: &ScyllaClient, path: &PathBuf) -> Result<()> {
    info!("Ingesting shipments from: {}", path.display());

    // Connect to Elasticsearch
    let es_client = EsClient::new(&args.es_url, &args.index)
        .await
        .context("Failed to connect to Elasticsearch")?;

    if !es_client.health_check().await? {
        anyhow::bail!("Elasticsearch cluster is not healthy");
    }
    info!("Connected to Elasticsearch");

    if args.create_index {
        create_index(&es_client, true).await?;
    }

    let classifier = match &args.goods_rules {
        Some(path) => GoodsClassifier::load_from_file(path)?,
        None => GoodsClassifier::default(),
    };

    // Build the resolver (loads the region cache from the store)
    let resolver = AddressResolver::new(scylla_client.clone())
        .await
        .context("Failed to build address resolver")?;

    let content = fs::read_to_string(path).context("Failed to read shipments CSV")?;
    let body = skip_leading_rows(&content, args.skip_rows);

    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let columns = ColumnMap::from_headers(reader.headers()?)?;

    let records: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .context("Failed to read shipment rows")?;

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let mut indexer = BulkIndexer::new(es_client.clone(), args.batch_size);
    let digits = digit_pattern();
    let today = Local::now().date_naive();
    let import_id = Uuid::new_v4().to_string();

    let mut skipped = 0usize;
    let mut ingested = 0usize;

    for record in &records {
        pb.inc(1);

        let Some(row) = coerce_row(record, &columns, &digits, today) else {
            skipped += 1;
            continue;
        };

        // No-match just leaves fields empty; an Err here is a store
        // connectivity fault and aborts the run.
        let resolved = resolver
            .resolve(&row.raw_address)
            .await
            .with_context(|| format!("Address resolution failed for: {}", row.raw_address))?;

        let items = build_items(&classifier, &row.raw_goods, row.quantity);

        let shipment = Shipment {
            id: Shipment::row_id(
                row.shipping_date,
                &row.raw_address,
                &row.raw_goods,
                row.quantity,
                row.total_price,
            ),
            shipping_date: row.shipping_date,
            raw_address: row.raw_address,
            province: resolved.province,
            city: resolved.city,
            area: resolved.area,
            total_price: row.total_price,
            quantity: row.quantity,
            unit: "件".to_string(),
            raw_goods: row.raw_goods,
            items,
            import_id: import_id.clone(),
        };

        let data = serde_json::to_string(&shipment)?;
        scylla_client.upsert_shipment(&shipment.id, &data).await?;
        indexer.add(shipment).await?;
        ingested += 1;
    }

    pb.finish_with_message("Processing complete");

    let (indexed, errors) = indexer.finish().await?;
    info!(
        "Ingested {} shipments ({} indexed, {} bulk errors, {} rows skipped)",
        ingested, indexed, errors, skipped
    );

    let doc_count = es_client.doc_count().await?;
    info!("Total documents in index: {}", doc_count);

    Ok(())
}
