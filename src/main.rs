mod api;
mod app;
mod components;
mod config;
mod dataset;
mod error;
mod guard;
mod http;
mod logging;
mod pages;
mod presenter;
mod session;
#[cfg(test)]
mod testing;
mod transfer;
mod workflow;

use leptos::prelude::*;
use tracing::{info, warn};

use app::App;
use config::AppConfig;

fn main() {
    let loaded = AppConfig::from_build_env();
    let config = loaded.clone().unwrap_or_default();
    logging::init(&config.log_filter);
    if let Err(e) = loaded {
        warn!("Ignoring build configuration: {}", e);
    }
    info!("Scheduling service at {}", config.api_base);

    leptos::mount::mount_to_body(move || view! { <App config /> });
}
