// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use std::error::Error;
use std::sync::Arc;

use log::{info, warn};
use tokio::time::MissedTickBehavior;

use flypad::config::AppConfig;
use flypad::dashboard::{CardSide, CurrentFlightMonitor, Dashboard};
use flypad::feeds::HttpTransport;
use flypad::persistence::{FilePropertyStore, MemoryPropertyStore, SharedPropertyStore};
use flypad::settings::{self, SYNCED_SETTINGS};
use flypad::simvar::{LocalVariableSource, SharedVariableSource};
use flypad::status::{lock_status, PanelStatus};
use flypad::sync::PropertySyncBridge;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting flypad...");

    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load configuration, using defaults: {}", e);
        AppConfig::default()
    });
    if let Ok(path) = AppConfig::get_config_path() {
        info!("Configuration: {}", path.display());
    }

    let store = open_store(&config);
    let source: SharedVariableSource = Arc::new(LocalVariableSource::new());
    let bridge = PropertySyncBridge::new(store, Arc::clone(&source));
    settings::register_all(&bridge, config.sync_poll_interval());

    let mut subscriptions = Vec::with_capacity(SYNCED_SETTINGS.len());
    for setting in SYNCED_SETTINGS {
        subscriptions.push(bridge.subscribe(setting.key).await?);
    }

    let status = PanelStatus::shared();
    let dashboard = Dashboard::new(
        bridge.clone(),
        Arc::new(HttpTransport::new()),
        &config,
        Arc::clone(&status),
    );
    let monitor = CurrentFlightMonitor::spawn(&source);

    let mut refresh = config
        .dashboard_refresh_interval()
        .map(tokio::time::interval);
    if let Some(ticker) = refresh.as_mut() {
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    } else {
        log_dashboard(&dashboard, dashboard.refresh().await);
    }

    loop {
        tokio::select! {
            () = async {
                match refresh.as_mut() {
                    Some(ticker) => { ticker.tick().await; }
                    None => std::future::pending().await,
                }
            } => {
                log_dashboard(&dashboard, dashboard.refresh().await);
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                break;
            }
        }
    }

    info!("Shutting down");
    monitor.shutdown();
    drop(subscriptions);
    for feed in lock_status(&status).feeds.values() {
        info!(
            "{}: {} ok, {} failed, {} superseded",
            feed.name, feed.success_count, feed.failure_count, feed.stale_count
        );
    }
    Ok(())
}

fn open_store(config: &AppConfig) -> SharedPropertyStore {
    let Some(path) = config.property_store_file() else {
        warn!("No data directory available, settings will not be saved");
        return Arc::new(MemoryPropertyStore::new());
    };

    match FilePropertyStore::open(&path) {
        Ok(store) => {
            info!("Property store: {}", store.path().display());
            Arc::new(store)
        }
        Err(e) => {
            warn!(
                "Failed to open property store {}: {}, settings will not be saved",
                path.display(),
                e
            );
            Arc::new(MemoryPropertyStore::new())
        }
    }
}

fn log_dashboard(dashboard: &Dashboard, refreshed: bool) {
    if !refreshed {
        return;
    }

    let plan = dashboard.dispatch();
    info!(
        "Flight {}{} {} -> {} ({})",
        plan.airline, plan.flight_number, plan.origin.icao, plan.destination.icao, plan.flight_time
    );
    for side in [CardSide::Origin, CardSide::Destination] {
        let weather = dashboard.card(side).summary();
        info!(
            "{} {}: {} {} {}",
            side.label(),
            weather.station,
            weather.wind,
            weather.temperature,
            weather.barometer
        );
    }
}
