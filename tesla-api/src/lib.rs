pub mod endpoints;
mod error;
mod macros;
pub mod repositories;
mod settings;

pub use crate::error::ApiError;
pub use crate::settings::ApiSettings;
use repositories::*;
use std::time::Duration;
use tower_api_client::{Client as ApiClient, Request as ApiRequest};

/// Which of the two remote services a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    /// Owner API, serves the order list
    Owner,
    /// Tasks gateway, serves per-order task trees
    Tasks,
}

/// A request that knows which host it must be sent to.
pub trait Endpoint: ApiRequest {
    const HOST: Host;
}

pub struct Client {
    owner: ApiClient,
    tasks: ApiClient,
    timeout: Duration,
}

impl Client {
    pub fn new(access_token: &str) -> Self {
        Self::with_settings(&ApiSettings::default(), access_token)
    }

    pub fn with_settings(settings: &ApiSettings, access_token: &str) -> Self {
        Self {
            owner: ApiClient::new(settings.owner_api_url.as_str()).bearer_auth(access_token),
            tasks: ApiClient::new(settings.tasks_api_url.as_str()).bearer_auth(access_token),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    pub async fn send<R>(&self, request: R) -> Result<R::Response, ApiError>
    where
        R: Endpoint,
    {
        let inner = match R::HOST {
            Host::Owner => &self.owner,
            Host::Tasks => &self.tasks,
        };

        match tokio::time::timeout(self.timeout, inner.send(request)).await {
            Ok(result) => result.map_err(From::from),
            Err(_) => Err(ApiError::Timeout(self.timeout)),
        }
    }
}

pub struct Request;

impl Request {
    pub fn orders() -> OrderEndpoints {
        OrderEndpoints::new()
    }
}
