//! Thin HTTP client for the snk-daemon RPC surface.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use snk_schemas::api::{
    Ack, AddSnackRequest, AddSnackResponse, CreateLocationRequest, CreateSnackRequest,
    DeleteLocationRequest, DeleteSnackRequest, ErrorResponse, ListContentsRequest,
    ListContentsResponse, ListLocationsResponse, ListSnacksResponse, UpdateLocationRequest,
    UpdateSnackRequest,
};
use snk_schemas::{ContentEntry, Location, Snack};
use tracing::debug;

pub struct DaemonClient {
    http: reqwest::Client,
    base: String,
}

impl DaemonClient {
    pub fn new(address: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base: address.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get<Resp: DeserializeOwned>(&self, path: &str) -> Result<Resp> {
        debug!(path, "GET");
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .with_context(|| format!("daemon unreachable at {}", self.base))?;
        decode(resp).await
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        debug!(path, "POST");
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("daemon unreachable at {}", self.base))?;
        decode(resp).await
    }

    pub async fn create_snack(&self, snack: Snack) -> Result<()> {
        let _: Ack = self
            .post("/v1/snacks/create", &CreateSnackRequest { snack })
            .await?;
        Ok(())
    }

    pub async fn list_snacks(&self) -> Result<Vec<Snack>> {
        let resp: ListSnacksResponse = self.get("/v1/snacks/list").await?;
        Ok(resp.snacks)
    }

    pub async fn update_snack(&self, snack: Snack) -> Result<()> {
        let _: Ack = self
            .post("/v1/snacks/update", &UpdateSnackRequest { snack })
            .await?;
        Ok(())
    }

    pub async fn delete_snack(&self, barcode: String) -> Result<()> {
        let _: Ack = self
            .post("/v1/snacks/delete", &DeleteSnackRequest { barcode })
            .await?;
        Ok(())
    }

    pub async fn create_location(&self, location: Location) -> Result<()> {
        let _: Ack = self
            .post("/v1/locations/create", &CreateLocationRequest { location })
            .await?;
        Ok(())
    }

    pub async fn list_locations(&self) -> Result<Vec<Location>> {
        let resp: ListLocationsResponse = self.get("/v1/locations/list").await?;
        Ok(resp.locations)
    }

    pub async fn update_location(&self, name: String, new_name: String) -> Result<()> {
        let _: Ack = self
            .post("/v1/locations/update", &UpdateLocationRequest { name, new_name })
            .await?;
        Ok(())
    }

    pub async fn delete_location(&self, name: String) -> Result<()> {
        let _: Ack = self
            .post("/v1/locations/delete", &DeleteLocationRequest { name })
            .await?;
        Ok(())
    }

    /// AddSnack answers with its flags on failure too, so the body is decoded
    /// regardless of status. A transport failure is the only `Err`.
    pub async fn add_snack(
        &self,
        snack_barcode: String,
        location_name: String,
    ) -> Result<AddSnackResponse> {
        let req = AddSnackRequest {
            snack_barcode,
            location_name,
        };
        let resp = self
            .http
            .post(self.url("/v1/contents/add"))
            .json(&req)
            .send()
            .await
            .with_context(|| format!("daemon unreachable at {}", self.base))?;
        let status = resp.status();
        let body: AddSnackResponse = resp
            .json()
            .await
            .with_context(|| format!("undecodable add snack response (status {status})"))?;
        if !status.is_success() && body.error.is_none() {
            return Err(anyhow!("daemon returned status {status}"));
        }
        Ok(body)
    }

    pub async fn list_contents(&self, location_name: Option<String>) -> Result<Vec<ContentEntry>> {
        let resp: ListContentsResponse = self
            .post("/v1/contents/list", &ListContentsRequest { location_name })
            .await?;
        Ok(resp.contents)
    }
}

/// Decode a 2xx body as `Resp`; otherwise turn the daemon's error body into
/// an error of the form `CODE: message`.
async fn decode<Resp: DeserializeOwned>(resp: reqwest::Response) -> Result<Resp> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json::<Resp>()
            .await
            .context("undecodable daemon response");
    }
    match resp.json::<ErrorResponse>().await {
        Ok(e) => Err(anyhow!("{}: {}", e.code, e.error)),
        Err(_) => Err(anyhow!("daemon returned status {status}")),
    }
}
