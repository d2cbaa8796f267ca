use anyhow::{bail, Context};
use bukken_scout::config::Config;
use bukken_scout::enrich::Enricher;
use bukken_scout::scrapers::{
    debug_listing_html, is_listing_url, parse_listing_html, HttpFetcher, PageFetcher,
    ParkingCrawler, ParkingQuery,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "bukken-scout", about = "Rental listing analyzer: listing, slopes and nearby parking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a listing page and print the property record
    Scrape { url: String },
    /// Dump the raw structure of a listing page
    Debug { url: String },
    /// Search monthly parking near an address
    Parking {
        #[arg(long)]
        address: String,
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lng: f64,
        /// Search radius in km (default from BUKKEN_PARKING_RADIUS_KM, else 1)
        #[arg(long)]
        radius_km: Option<f64>,
    },
    /// Scrape, geocode, compute slopes and search parking
    Analyze { url: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Scrape { url } => {
            let markup = fetch_listing(&config, &url).await?;
            let property = parse_listing_html(&markup, &url);
            if property.is_empty() {
                bail!("Could not parse the listing at {url}");
            }
            print_json(&property)
        }
        Commands::Debug { url } => {
            let markup = fetch_listing(&config, &url).await?;
            print_json(&debug_listing_html(&markup))
        }
        Commands::Parking {
            address,
            lat,
            lng,
            radius_km,
        } => {
            let fetcher = HttpFetcher::new(&config.crawler_user_agent, config.http_timeout)?;
            let crawler = ParkingCrawler::new(Arc::new(fetcher), config.parking_base_url.clone());
            let query = ParkingQuery::new(address, lat, lng)
                .with_radius_km(radius_km.unwrap_or(config.parking_radius_km));
            let lots = crawler.search_parking_near(&query).await;
            info!("Found {} parking lots", lots.len());
            print_json(&lots)
        }
        Commands::Analyze { url } => {
            let markup = fetch_listing(&config, &url).await?;
            let property = parse_listing_html(&markup, &url);
            if property.is_empty() {
                bail!("Could not parse the listing at {url}");
            }
            let report = Enricher::from_config(&config)?.analyze(property).await;
            info!(
                stations = report.stations.len(),
                parking = report.parking_lots.len(),
                "Analysis complete"
            );
            print_json(&report)
        }
    }
}

async fn fetch_listing(config: &Config, url: &str) -> anyhow::Result<String> {
    if !is_listing_url(url) {
        bail!("Not a supported listing URL: {url}");
    }
    let fetcher = HttpFetcher::for_listings(&config.listing_user_agent, config.http_timeout)?;
    info!("Fetching listing {}", url);
    fetcher
        .fetch(url)
        .await
        .with_context(|| format!("Failed to fetch listing page {url}"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
