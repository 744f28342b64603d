use super::ReferenceNumber;
use crate::{Endpoint, Host};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use tower_api_client::Request;

// Common

/// One order as listed by the owner API. Fields not modelled here are kept
/// in `extra` so persisted snapshots stay complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub reference_number: ReferenceNumber,
    pub order_status: Option<String>,
    pub model_code: Option<String>,
    pub vin: Option<String>,
    /// Comma separated option codes, e.g. `MDLY,PPSW`
    pub mkt_options: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Requests

#[derive(Default, Debug, Clone, Serialize)]
pub struct ListOrders;

impl ListOrders {
    pub fn new() -> Self {
        Self
    }
}

impl Request for ListOrders {
    type Data = ();
    type Response = OrdersResponse;

    fn endpoint(&self) -> Cow<'_, str> {
        "/api/1/users/orders".into()
    }
}

impl Endpoint for ListOrders {
    const HOST: Host = Host::Owner;
}

// Responses

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersResponse {
    pub response: Vec<Order>,
}
