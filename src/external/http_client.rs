use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{error, info};
use url::Url;

use crate::config::ClientConfig;
use crate::errors::{ApiError, ErrorBody};
use crate::external::stocks_api::StocksApi;
use crate::models::{Message, StockCreate, StockId, StockRecord, StockUpdate, StocksPage};

const STOCKS_PATH: &str = "api/v1/stocks/";

pub struct HttpStocksClient {
    client: reqwest::Client,
    stocks_url: Url,
    token: Option<String>,
    page_limit: u32,
}

impl HttpStocksClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            stocks_url: stocks_url(&config.base_url)?,
            token: config.token.clone(),
            page_limit: config.page_limit,
        })
    }

    fn item_url(&self, id: StockId) -> Result<Url, ApiError> {
        self.stocks_url
            .join(&id.to_string())
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let resp = self.authorize(request).send().await?;
        decode(resp).await
    }
}

fn stocks_url(base: &Url) -> Result<Url, ApiError> {
    // A base without a trailing slash would have its last segment replaced by `join`.
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(STOCKS_PATH)
        .map_err(|e| ApiError::Network(e.to_string()))
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return resp.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()));
    }

    let text = resp.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ErrorBody>(&text).ok();
    error!("Stocks API returned HTTP {}: {}", status, text);
    Err(ApiError::Status { status, body })
}

#[async_trait]
impl StocksApi for HttpStocksClient {
    async fn list(&self) -> Result<StocksPage, ApiError> {
        info!("GET {} - Fetching stocks", self.stocks_url);
        let request = self
            .client
            .get(self.stocks_url.clone())
            .query(&[("skip", "0"), ("limit", &self.page_limit.to_string())]);
        self.send(request).await
    }

    async fn read(&self, id: StockId) -> Result<StockRecord, ApiError> {
        let url = self.item_url(id)?;
        info!("GET {} - Fetching stock", url);
        self.send(self.client.get(url)).await
    }

    async fn create(&self, payload: StockCreate) -> Result<StockRecord, ApiError> {
        info!("POST {} - Creating stock {}", self.stocks_url, payload.symbol);
        let request = self.client.post(self.stocks_url.clone()).json(&payload);
        self.send(request).await
    }

    async fn update(&self, id: StockId, payload: StockUpdate) -> Result<StockRecord, ApiError> {
        let url = self.item_url(id)?;
        info!("PUT {} - Updating stock", url);
        self.send(self.client.put(url).json(&payload)).await
    }

    async fn delete(&self, id: StockId) -> Result<Message, ApiError> {
        let url = self.item_url(id)?;
        info!("DELETE {} - Deleting stock", url);
        self.send(self.client.delete(url)).await
    }
}
