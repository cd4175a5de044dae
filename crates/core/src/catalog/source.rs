use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::{
    config::AppConfig,
    models::{Product, ProductId},
};

/// Failures raised while retrieving catalog data.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response.
    #[error("catalog request to {url} failed: {source}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The endpoint answered with a non-success status.
    #[error("catalog endpoint {url} returned {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Status code received.
        status: StatusCode,
    },
    /// The response body was not the expected JSON shape.
    #[error("catalog response from {url} could not be decoded: {source}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// The payload decoded but violates catalog invariants.
    #[error("catalog data is invalid: {0}")]
    InvalidData(String),
    /// No product exists with the requested id.
    #[error("product {0} not found")]
    NotFound(ProductId),
}

/// External provider of catalog records.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Retrieve the full product list.
    async fn fetch_products(&self) -> Result<Vec<Product>, FetchError>;

    /// Retrieve a single product by id.
    async fn fetch_product(&self, id: ProductId) -> Result<Product, FetchError>;
}

/// Catalog source backed by a REST endpoint.
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: Client,
    endpoint: String,
}

impl HttpCatalogSource {
    /// Create a source for `endpoint` with the given request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Transport {
                url: endpoint.clone(),
                source,
            })?;
        Ok(Self { client, endpoint })
    }

    /// Build a source from application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, FetchError> {
        Self::new(
            config.catalog_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Base URL of the product list.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, FetchError> {
        debug!(%url, "Fetching catalog data");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode { url, source })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_products(&self) -> Result<Vec<Product>, FetchError> {
        self.get_json(self.endpoint.clone()).await
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Product, FetchError> {
        let url = format!("{}/{id}", self.endpoint);
        match self.get_json::<Option<Product>>(url).await {
            Ok(Some(product)) => Ok(product),
            // The public endpoint answers unknown ids with `200` and an empty body.
            Ok(None) => Err(FetchError::NotFound(id)),
            Err(FetchError::Status { status, .. }) if status == StatusCode::NOT_FOUND => {
                Err(FetchError::NotFound(id))
            }
            Err(FetchError::Decode { source, .. }) if source.is_eof() => {
                Err(FetchError::NotFound(id))
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    /// Serve a single canned HTTP response and return the base URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/products")
    }

    fn source(url: String) -> HttpCatalogSource {
        HttpCatalogSource::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn decodes_product_list() {
        let url = serve_once(
            "200 OK",
            r#"[{"id":1,"title":"Backpack","price":109.95,"description":"","category":"bags","image":""},
                {"id":2,"title":"T-Shirt","price":22.3,"description":"","category":"men","image":""}]"#,
        )
        .await;
        let products = source(url).fetch_products().await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[1].title, "T-Shirt");
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let url = serve_once("503 Service Unavailable", "{}").await;
        let err = source(url).fetch_products().await.unwrap_err();
        assert!(
            matches!(err, FetchError::Status { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE)
        );
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let url = serve_once("200 OK", r#"{"unexpected": true}"#).await;
        let err = source(url).fetch_products().await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn empty_detail_body_means_not_found() {
        let url = serve_once("200 OK", "").await;
        let err = source(url).fetch_product(99).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound(99)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = source(format!("http://{addr}/products"))
            .fetch_products()
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let source = source("https://fakestoreapi.com/products/".to_string());
        assert_eq!(source.endpoint(), "https://fakestoreapi.com/products");
    }
}
