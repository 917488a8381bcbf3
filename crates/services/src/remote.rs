use std::env;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use tutor_core::model::{Package, PackageId, PackagePayload};

use crate::error::RemoteError;

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl RemoteConfig {
    /// Read `TUTOR_API_URL` and `TUTOR_API_TOKEN`; `None` when no URL is set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("TUTOR_API_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let token = env::var("TUTOR_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        Some(Self { base_url, token })
    }
}

/// Read-only client for the package endpoints of the booking backend.
#[derive(Clone)]
pub struct PackageApiClient {
    client: Client,
    config: RemoteConfig,
}

impl PackageApiClient {
    /// # Errors
    ///
    /// Returns `RemoteError::InvalidUrl` when the base URL is not http(s).
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let trimmed = config.base_url.trim();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(RemoteError::InvalidUrl(config.base_url));
        }
        Ok(Self {
            client: Client::new(),
            config: RemoteConfig {
                base_url: trimmed.trim_end_matches('/').to_owned(),
                token: config.token,
            },
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    #[must_use]
    pub fn package_url(&self, id: PackageId) -> String {
        format!("{}/packages/{id}", self.config.base_url)
    }

    #[must_use]
    pub fn my_packages_url(&self) -> String {
        format!("{}/packages/my", self.config.base_url)
    }

    /// Fetch and validate one package.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::NotFound` on 404, `RemoteError::HttpStatus` for
    /// other non-success responses, and `RemoteError::Payload` when the body
    /// fails validation.
    pub async fn fetch_package(&self, id: PackageId) -> Result<Package, RemoteError> {
        let payload: PackagePayload = self
            .get_json(self.client.get(self.package_url(id)))
            .await?;
        tracing::debug!(package_id = %id, "fetched package from backend");
        Ok(payload.into_package()?)
    }

    /// Fetch the packages of the authenticated student.
    ///
    /// # Errors
    ///
    /// Same as [`PackageApiClient::fetch_package`]; one invalid package fails
    /// the whole call.
    pub async fn fetch_my_packages(&self) -> Result<Vec<Package>, RemoteError> {
        let payloads: Vec<PackagePayload> = self
            .get_json(self.client.get(self.my_packages_url()))
            .await?;
        tracing::debug!(count = payloads.len(), "fetched student packages from backend");
        payloads
            .into_iter()
            .map(|payload| payload.into_package().map_err(RemoteError::from))
            .collect()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, RemoteError> {
        let request = match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        check_status(response.status())?;
        Ok(response.json().await?)
    }
}

fn check_status(status: StatusCode) -> Result<(), RemoteError> {
    if status == StatusCode::NOT_FOUND {
        return Err(RemoteError::NotFound);
    }
    if !status.is_success() {
        return Err(RemoteError::HttpStatus(status));
    }
    Ok(())
}
