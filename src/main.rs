//! APOD proxy - resilient fetcher for NASA's Astronomy Picture of the Day
//!
//! A command-line front end for the retrieval core: records are fetched
//! through a bounded cache and a circuit breaker, so repeated dates cost no
//! network calls and upstream outages degrade to a clear "unavailable"
//! message instead of an error.

mod cache;
mod cli;
mod data;
mod proxy;
mod resilience;

use clap::Parser;
use futures::future::join_all;
use tracing_subscriber::EnvFilter;

use cache::ApodCache;
use cli::{Cli, FetchPlan};
use data::{Apod, ApodClient};
use proxy::ApodProxy;
use resilience::CircuitBreaker;

/// Message shown when the upstream could not be reached, matching the
/// service this proxy fronts
const UNAVAILABLE_MESSAGE: &str = "APOD API is temporarily not available";

/// Prints one fetched record, or the unavailability notice for the sentinel
fn print_record(date: &str, apod: &Apod) {
    if apod.is_empty() {
        println!("{date}: {UNAVAILABLE_MESSAGE}");
        return;
    }

    println!("{date}: {}", apod.title);
    println!("  url: {}", apod.url);
    if let Some(hdurl) = &apod.hdurl {
        println!("  hd:  {hdurl}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let plan = FetchPlan::from_cli(&cli)?;

    let proxy = ApodProxy::new(
        ApodCache::with_capacity(plan.capacity),
        CircuitBreaker::default(),
        ApodClient::new(),
    );

    // Ids come from the persistence layer in the full service; a running
    // index stands in for that lookup here. All dates are fetched
    // concurrently against the shared proxy.
    let fetches = plan.dates.iter().enumerate().map(|(index, date)| {
        let proxy = &proxy;
        let api_key = &plan.api_key;
        async move {
            let apod = proxy.fetch_record(&index.to_string(), date, api_key).await;
            (date.clone(), apod)
        }
    });

    for (date, apod) in join_all(fetches).await {
        print_record(&date, &apod);
    }

    Ok(())
}
