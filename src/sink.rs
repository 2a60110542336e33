//! Quote persistence
//!
//! One CSV row per accepted quote. The file is opened in append mode and the
//! header is only written when the file is new or empty, so restarts on the
//! same day keep appending to the same file.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::engine::QuoteResult;

/// Written in place of the slippage percentage when the probe failed
pub const UNKNOWN_MARKER: &str = "unknown";

/// Constant columns shared by every row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMeta {
    pub quoter: String,
    pub aggregator: String,
    pub network: String,
    pub chain_id: u64,
}

impl RecordMeta {
    pub fn new(network: impl Into<String>, chain_id: u64) -> Self {
        Self {
            quoter: "uniswap_quoter".to_string(),
            aggregator: "uniswap".to_string(),
            network: network.into(),
            chain_id,
        }
    }
}

/// Flat output row. Column order follows field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub timestamp: String,
    pub quoter: String,
    pub aggregator: String,
    pub network: String,
    pub token_in_chain_id: u64,
    pub token_out_chain_id: u64,
    pub direction: String,
    pub notional: f64,
    pub selling: f64,
    pub token_in_symbol: String,
    pub token_in_address: String,
    pub receiving: f64,
    pub token_out_symbol: String,
    pub token_out_address: String,
    pub amount_in: String,
    pub amount_out: String,
    pub amount_out_decimals: String,
    pub price: f64,
    pub interface_fee: f64,
    pub gas_compute: String,
    pub gas_cost_eth: String,
    pub gas_cost_usd: String,
    pub effective_price: String,
    pub pool_address: String,
    pub fee_tier: u32,
    pub pool_fee: f64,
    pub slippage_percentage: String,
}

impl QuoteRecord {
    pub fn from_result(result: &QuoteResult, meta: &RecordMeta) -> Self {
        let request = &result.request;

        Self {
            timestamp: iso_timestamp(result.quoted_at),
            quoter: meta.quoter.clone(),
            aggregator: meta.aggregator.clone(),
            network: meta.network.clone(),
            token_in_chain_id: meta.chain_id,
            token_out_chain_id: meta.chain_id,
            direction: request.direction(),
            notional: request.notional_usd,
            selling: request.notional_usd,
            token_in_symbol: request.token_in.symbol.to_string(),
            token_in_address: request.token_in.address.to_checksum(None),
            receiving: result.received,
            token_out_symbol: request.token_out.symbol.to_string(),
            token_out_address: request.token_out.address.to_checksum(None),
            amount_in: result.amount_in.to_string(),
            amount_out: result.amount_out.to_string(),
            amount_out_decimals: result.received.to_string(),
            price: result.price,
            interface_fee: result.interface_fee_usd,
            gas_compute: result.gas_estimate.to_string(),
            gas_cost_eth: result.gas_cost_native.to_string(),
            gas_cost_usd: result.gas_cost_usd.to_string(),
            effective_price: result.effective_price.to_string(),
            pool_address: result
                .pool_address
                .map(|a| a.to_checksum(None))
                .unwrap_or_else(|| UNKNOWN_MARKER.to_string()),
            fee_tier: result.fee_tier.0,
            pool_fee: result.pool_fee_usd,
            slippage_percentage: result
                .slippage_pct
                .map(|pct| pct.to_string())
                .unwrap_or_else(|| UNKNOWN_MARKER.to_string()),
        }
    }
}

fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

#[async_trait]
pub trait Sink: Send + Sync {
    /// Append one record. Safe to call from many workers at once.
    async fn append(&self, record: &QuoteRecord) -> Result<()>;
}

// ============================================
// CSV SINK
// ============================================

pub struct CsvSink {
    path: PathBuf,
    writer: Mutex<csv::Writer<fs::File>>,
}

impl CsvSink {
    /// `<dir>/uniquotes_<version>_<YYYYMMDD>.csv`
    pub fn file_name(version: &str, date: DateTime<Utc>) -> String {
        format!("uniquotes_{}_{}.csv", version, date.format("%Y%m%d"))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .wrap_err_with(|| format!("Failed to create directory {}", parent.display()))?;
            }
        }

        let file_has_data = path.exists() && fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .wrap_err_with(|| format!("Failed to open CSV file {}", path.display()))?;

        let writer = WriterBuilder::new().has_headers(!file_has_data).from_writer(file);

        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }

    pub fn in_dir(dir: impl AsRef<Path>, version: &str, date: DateTime<Utc>) -> Result<Self> {
        Self::open(dir.as_ref().join(Self::file_name(version, date)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Sink for CsvSink {
    async fn append(&self, record: &QuoteRecord) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.serialize(record).wrap_err("Failed to write quote record")?;
        writer.flush().wrap_err("Failed to flush quote writer")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use chrono::TimeZone;
    use std::sync::Arc;

    use crate::chain::FeeTier;
    use crate::engine::QuoteRequest;
    use crate::tokens::get_token;

    fn sample_result(slippage_pct: Option<f64>) -> QuoteResult {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        QuoteResult {
            request: QuoteRequest::new(get_token("USDC").unwrap(), get_token("ETH").unwrap(), 500.0, at),
            quoted_at: at,
            fee_tier: FeeTier(3000),
            pool_address: None,
            amount_in: U256::from(500_000_000u64),
            amount_out: U256::from(150_000_000_000_000_000u64),
            received: 0.15,
            price: 500.0 / 0.15,
            pool_fee_usd: 1.5,
            interface_fee_usd: 1.25,
            gas_estimate: 150_000,
            gas_price_wei: 20_000_000_000,
            gas_cost_native: 0.003,
            gas_cost_usd: 9.0,
            native_price_usd: 3000.0,
            effective_price: 510.25 / 0.15,
            slippage_pct,
        }
    }

    #[test]
    fn test_record_from_result() {
        let meta = RecordMeta::new("ethereum", 1);
        let record = QuoteRecord::from_result(&sample_result(Some(2.5)), &meta);

        assert_eq!(record.direction, "USDC->ETH");
        assert_eq!(record.quoter, "uniswap_quoter");
        assert_eq!(record.token_in_chain_id, 1);
        assert_eq!(record.fee_tier, 3000);
        assert_eq!(record.pool_fee, 1.5);
        assert_eq!(record.amount_in, "500000000");
        assert_eq!(record.gas_compute, "150000");
        assert_eq!(record.slippage_percentage, "2.5");
        assert_eq!(record.pool_address, UNKNOWN_MARKER);
        assert_eq!(record.token_in_address, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        assert!(record.timestamp.starts_with("2024-05-01T12:00:00"));
    }

    #[test]
    fn test_missing_slippage_is_marked_unknown() {
        let meta = RecordMeta::new("ethereum", 1);
        let record = QuoteRecord::from_result(&sample_result(None), &meta);
        assert_eq!(record.slippage_percentage, UNKNOWN_MARKER);
    }

    #[test]
    fn test_file_name() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(CsvSink::file_name("v1", date), "uniquotes_v1_20240501.csv");
    }

    #[tokio::test]
    async fn test_header_written_once_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("quotes.csv");
        let record = QuoteRecord::from_result(&sample_result(Some(1.0)), &RecordMeta::new("ethereum", 1));

        {
            let sink = CsvSink::open(&path).unwrap();
            sink.append(&record).await.unwrap();
            sink.append(&record).await.unwrap();
        }
        {
            let sink = CsvSink::open(&path).unwrap();
            sink.append(&record).await.unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("timestamp,quoter,aggregator,network"));
        assert_eq!(lines.iter().filter(|l| l.starts_with("timestamp,")).count(), 1);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<QuoteRecord> = reader.deserialize().collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], record);
    }

    #[tokio::test]
    async fn test_concurrent_appends() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(CsvSink::in_dir(dir.path(), "v1", Utc::now()).unwrap());
        let record = QuoteRecord::from_result(&sample_result(None), &RecordMeta::new("ethereum", 1));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let sink = sink.clone();
                let record = record.clone();
                tokio::spawn(async move { sink.append(&record).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let contents = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(contents.lines().count(), 17);
    }
}
