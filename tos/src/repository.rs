use crate::snapshot::{OrderSnapshot, SnapshotEntry};
use crate::storage::{self, StorageError};
use std::path::{Path, PathBuf};
use tesla_api::endpoints::{orders::Order, tasks::OrderDetails, ReferenceNumber};
use tesla_api::{ApiError, ApiSettings, Client, Request};
use tracing::{debug, info, warn};

pub const ORDERS_FILE: &str = "tesla_orders.json";

/// Fetches orders from the remote API and keeps the last snapshot on disk.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    api: ApiSettings,
    snapshot_path: PathBuf,
    auto_save: bool,
}

impl OrderRepository {
    pub fn new(api: ApiSettings, data_dir: &Path, auto_save: bool) -> Self {
        Self {
            api,
            snapshot_path: data_dir.join(ORDERS_FILE),
            auto_save,
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    fn client(&self, access_token: &str) -> Client {
        Client::with_settings(&self.api, access_token)
    }

    pub async fn retrieve_orders(&self, access_token: &str) -> Result<Vec<Order>, ApiError> {
        list_orders(&self.client(access_token)).await
    }

    pub async fn get_order_details(
        &self,
        reference: &ReferenceNumber,
        access_token: &str,
    ) -> Result<OrderDetails, ApiError> {
        order_details(&self.client(access_token), &self.api, reference).await
    }

    /// Fetch every order and its details without touching the disk.
    pub async fn fetch_current(&self, access_token: &str) -> Result<OrderSnapshot, ApiError> {
        let client = self.client(access_token);
        let orders = list_orders(&client).await?;
        info!("Retrieved {} order(s)", orders.len());

        let mut entries = Vec::with_capacity(orders.len());
        for order in orders {
            let details = order_details(&client, &self.api, &order.reference_number).await?;
            entries.push(SnapshotEntry { order, details });
        }

        OrderSnapshot::new(entries)
    }

    /// Fetch a snapshot and, when auto-save is on, persist it. A failed save
    /// is logged and the snapshot is still returned.
    pub async fn fetch_snapshot(&self, access_token: &str) -> Result<OrderSnapshot, ApiError> {
        let snapshot = self.fetch_current(access_token).await?;
        self.persist_if_enabled(&snapshot).await;
        Ok(snapshot)
    }

    async fn persist_if_enabled(&self, snapshot: &OrderSnapshot) {
        if !self.auto_save {
            debug!("Auto-save disabled, snapshot not persisted");
            return;
        }
        if let Err(e) = self.save_snapshot(snapshot).await {
            warn!("Failed to persist order snapshot: {}", e);
        }
    }

    pub async fn save_snapshot(&self, snapshot: &OrderSnapshot) -> Result<(), StorageError> {
        storage::write_json_atomic(&self.snapshot_path, snapshot).await?;
        debug!("Saved snapshot to {}", self.snapshot_path.display());
        Ok(())
    }

    pub async fn load_snapshot(&self) -> Result<Option<OrderSnapshot>, StorageError> {
        storage::read_json(&self.snapshot_path).await
    }
}

async fn list_orders(client: &Client) -> Result<Vec<Order>, ApiError> {
    let response = client.send(Request::orders().list()).await?;
    Ok(response.response)
}

async fn order_details(
    client: &Client,
    api: &ApiSettings,
    reference: &ReferenceNumber,
) -> Result<OrderDetails, ApiError> {
    debug!("Fetching details for order {}", reference);
    let request = Request::orders()
        .with_settings(api)
        .details(reference.clone());
    let details = match client.send(request).await {
        Ok(details) => details,
        Err(e) if e.is_undecodable_body() => {
            warn!("Order {} came back with an unusable body: {}", reference, e);
            return Err(ApiError::EmptyResponse);
        }
        Err(e) => return Err(e),
    };

    if !details.has_tasks() {
        warn!("Order {} came back without tasks", reference);
        return Err(ApiError::EmptyResponse);
    }
    Ok(details)
}
