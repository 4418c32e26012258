use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::{error::OrderError, models::{Order, OrderListResponse}};

/// Read side of the external order system.
#[async_trait]
pub trait OrderSource: Send + Sync {
    async fn orders_for_wallet(&self, wallet: &str) -> Result<Vec<Order>, OrderError>;
}

/// Process-local order book keyed by wallet address. Nothing is written to disk.
#[derive(Default)]
pub struct InMemoryOrders {
    by_wallet: RwLock<HashMap<String, Vec<Order>>>,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    orders: Vec<SeedOrder>,
}

#[derive(Debug, Deserialize)]
struct SeedOrder {
    wallet: String,
    #[serde(flatten)]
    order: Order,
}

impl InMemoryOrders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `{"orders": [{"wallet": "...", <Order fields>}, ...]}`.
    pub fn from_seed_file(path: &Path) -> Result<Self, OrderError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| OrderError::Decode(format!("{}: {}", path.display(), e)))?;
        let seed: SeedFile = serde_json::from_str(&raw)
            .map_err(|e| OrderError::Decode(format!("{}: {}", path.display(), e)))?;
        let store = Self::new();
        let count = seed.orders.len();
        for SeedOrder { wallet, order } in seed.orders {
            store.insert(&wallet, order);
        }
        info!("📦 Seeded {} orders from {}", count, path.display());
        Ok(store)
    }

    pub fn insert(&self, wallet: &str, order: Order) {
        self.by_wallet.write().entry(wallet.to_string()).or_default().push(order);
    }
}

#[async_trait]
impl OrderSource for InMemoryOrders {
    async fn orders_for_wallet(&self, wallet: &str) -> Result<Vec<Order>, OrderError> {
        let mut orders = self.by_wallet.read().get(wallet).cloned().unwrap_or_default();
        // Newest first; unparseable timestamps sink to the end.
        orders.sort_by(|a, b| b.placed_at().cmp(&a.placed_at()));
        Ok(orders)
    }
}

/// Forwards lookups to an order service exposing the same `/orders?wallet=` contract.
pub struct HttpOrders {
    client: Client,
    base_url: String,
}

impl HttpOrders {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl OrderSource for HttpOrders {
    async fn orders_for_wallet(&self, wallet: &str) -> Result<Vec<Order>, OrderError> {
        let url = format!("{}/orders", self.base_url.trim_end_matches('/'));
        let response = self.client
            .get(&url)
            .query(&[("wallet", wallet)])
            .send()
            .await
            .map_err(|e| OrderError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OrderError::Upstream(format!("{} returned {}", url, status)));
        }
        let body: OrderListResponse = response.json().await.map_err(|e| OrderError::Decode(e.to_string()))?;
        Ok(body.orders)
    }
}
