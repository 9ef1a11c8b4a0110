// src/bin/snapshot.rs
// DOCUMENTATION: Crop layer snapshot tool
// PURPOSE: Ask a running map service for crop layers and write each one to
// <out>/<crop>.geojson
//
// Usage: snapshot [CROP ...]
// Crops default to SNAPSHOT_CROPS (comma separated). MAP_API_URL points at the
// service, SNAPSHOT_DIR at the output directory, SNAPSHOT_STATE optionally
// restricts every layer to one UF.

use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

// --- ANSI colors ---
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

const DEFAULT_CROPS: &str = "Soja,Milho,Cana-de-açúcar,Café,Algodão herbáceo";

/// Fields of the styled layer the summary needs; the rest is written untouched
#[derive(Debug, Deserialize)]
struct LayerSummary {
    name: String,
    #[serde(default)]
    matched_name: Option<String>,
    #[serde(default)]
    fallback: bool,
    feature_count: usize,
    range: RangeSummary,
}

#[derive(Debug, Deserialize)]
struct RangeSummary {
    min: f64,
    max: f64,
}

#[derive(Debug)]
struct SnapshotResult {
    crop: String,
    outcome: Result<(LayerSummary, PathBuf), String>,
    duration_secs: f64,
}

struct SnapshotRunner {
    base_url: Url,
    out_dir: PathBuf,
    state: Option<String>,
    client: Client,
    results: Vec<SnapshotResult>,
}

impl SnapshotRunner {
    fn new(base_url: &str, out_dir: PathBuf, state: Option<String>) -> Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("invalid MAP_API_URL '{}'", base_url))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            base_url,
            out_dir,
            state,
            client,
            results: Vec::new(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("MAP_API_URL cannot be a base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check_service_health(&self) -> bool {
        let Ok(url) = self.endpoint(&["health"]) else {
            return false;
        };
        match self.client.get(url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn snapshot_crop(&self, crop: &str) -> Result<(LayerSummary, PathBuf)> {
        let mut url = self.endpoint(&["layers", "crop", crop])?;
        if let Some(uf) = &self.state {
            url.query_pairs_mut().append_pair("state", uf);
        }

        let response = self.client.get(url).send().await.context("request failed")?;
        let status = response.status();
        let body = response.text().await.context("failed to read response")?;
        if !status.is_success() {
            bail!("HTTP {} - {}", status, body);
        }

        let mut layer: serde_json::Value =
            serde_json::from_str(&body).context("response is not JSON")?;
        let summary: LayerSummary =
            serde_json::from_value(layer.clone()).context("response is not a styled layer")?;
        let features = layer
            .get_mut("features")
            .map(serde_json::Value::take)
            .context("layer has no features")?;

        let path = self.out_dir.join(format!("{}.geojson", file_stem(crop)));
        let pretty = serde_json::to_string_pretty(&features)?;
        tokio::fs::write(&path, pretty)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        Ok((summary, path))
    }

    async fn run(&mut self, crops: &[String]) -> Result<()> {
        println!("\n{}🔍 Checking service status...{}", CYAN, RESET);
        if !self.check_service_health().await {
            println!("{}❌ Service unavailable at {}.{}", RED, self.base_url, RESET);
            println!("{}Please ensure agro-territory-map is running (cargo run){}", YELLOW, RESET);
            process::exit(1);
        }
        println!("{}✅ Service available{}\n", GREEN, RESET);

        tokio::fs::create_dir_all(&self.out_dir)
            .await
            .with_context(|| format!("failed to create {}", self.out_dir.display()))?;

        for (i, crop) in crops.iter().enumerate() {
            println!("{}[{}/{}] {}...{}", CYAN, i + 1, crops.len(), crop, RESET);
            let start = Instant::now();
            let outcome = self.snapshot_crop(crop).await.map_err(|e| format!("{:#}", e));
            let duration_secs = start.elapsed().as_secs_f64();

            match &outcome {
                Ok((layer, path)) => println!(
                    "{}✅ {}: {} features -> {} ({:.1}s){}",
                    GREEN,
                    layer.name,
                    layer.feature_count,
                    path.display(),
                    duration_secs,
                    RESET
                ),
                Err(e) => println!("{}❌ {}: {}{}", RED, crop, e, RESET),
            }

            self.results.push(SnapshotResult {
                crop: crop.clone(),
                outcome,
                duration_secs,
            });
        }

        self.print_summary();
        Ok(())
    }

    fn print_summary(&self) {
        println!("\n\n{}📋 Snapshot Summary{}", BOLD, RESET);
        println!("──────────────────────────────────────────────────────────────────────────────");
        println!(
            "{:<28} {:<8} {:>10} {:>14} {:>14}",
            "Crop", "Status", "Features", "Min (ha)", "Max (ha)"
        );
        println!("──────────────────────────────────────────────────────────────────────────────");

        let mut written = 0;
        for result in &self.results {
            match &result.outcome {
                Ok((layer, _)) => {
                    written += 1;
                    let mut label = layer.matched_name.clone().unwrap_or_else(|| result.crop.clone());
                    if layer.fallback {
                        label.push_str(" (demo)");
                    }
                    println!(
                        "{:<28} {:<8} {:>10} {:>14.0} {:>14.0}",
                        label, "✅", layer.feature_count, layer.range.min, layer.range.max
                    );
                }
                Err(_) => println!("{:<28} {:<8} {:>10}", result.crop, "❌", "-"),
            }
        }

        let total: f64 = self.results.iter().map(|r| r.duration_secs).sum();
        println!("──────────────────────────────────────────────────────────────────────────────");
        println!(
            "\n{}✨ {} of {} layers written to {} in {:.1}s{}",
            if written == self.results.len() { GREEN } else { YELLOW },
            written,
            self.results.len(),
            self.out_dir.display(),
            total,
            RESET
        );
    }
}

/// File name for a crop: lowercase, anything but letters and digits becomes `_`
fn file_stem(crop: &str) -> String {
    let stem: String = crop
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "layer".to_string()
    } else {
        stem
    }
}

fn crops_from(args: Vec<String>, fallback: &str) -> Vec<String> {
    let crops: Vec<String> = if args.is_empty() {
        fallback.split(',').map(str::to_string).collect()
    } else {
        args
    };
    crops
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn out_dir_from_env() -> PathBuf {
    PathBuf::from(env::var("SNAPSHOT_DIR").unwrap_or_else(|_| "snapshots".to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let base_url = env::var("MAP_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8003".to_string());
    let crops = crops_from(
        env::args().skip(1).collect(),
        &env::var("SNAPSHOT_CROPS").unwrap_or_else(|_| DEFAULT_CROPS.to_string()),
    );
    if crops.is_empty() {
        bail!("no crops to snapshot");
    }

    let state = env::var("SNAPSHOT_STATE").ok().filter(|s| !s.trim().is_empty());
    let mut runner = SnapshotRunner::new(&base_url, out_dir_from_env(), state)?;
    runner.run(&crops).await
}
