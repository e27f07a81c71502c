//! HTTP remote resource.
//!
//! Maps the [`Remote`] operations onto a REST endpoint:
//!
//! | operation | request              |
//! |-----------|----------------------|
//! | `list`    | `GET {url}`          |
//! | `load`    | `GET {url}`          |
//! | `get`     | `GET {url}/{id}`     |
//! | `create`  | `POST {url}`         |
//! | `update`  | `PUT {url}/{id}`     |
//! | `destroy` | `DELETE {url}/{id}`  |

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde_json::Value;
use tether_engine::{Error, Fields, Remote, RemoteOp, Result, DEFAULT_ID_KEY};
use tracing::debug;

/// A [`Remote`] backed by a JSON REST endpoint.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: Client,
    url: String,
    id_key: String,
}

impl HttpRemote {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Use an existing client, sharing its connection pool.
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            id_key: DEFAULT_ID_KEY.to_string(),
        }
    }

    /// Field whose value addresses a single entity.
    pub fn with_id_key(mut self, id_key: impl Into<String>) -> Self {
        self.id_key = id_key.into();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// URL of the entity identified by `entity`.
    ///
    /// The id is pushed as one percent-encoded path segment.
    fn entity_url(&self, op: RemoteOp, entity: &Fields) -> Result<Url> {
        let id = match entity.get(&self.id_key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        let mut url = Url::parse(&self.url)
            .map_err(|e| Error::remote(op, format!("invalid url {}: {e}", self.url)))?;
        url.path_segments_mut()
            .map_err(|()| Error::remote(op, format!("url {} cannot take a path", self.url)))?
            .pop_if_empty()
            .push(&id);
        Ok(url)
    }

    async fn send(&self, op: RemoteOp, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::remote(op, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::remote(op, format!("{status}: {body}")));
        }
        Ok(response)
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        op: RemoteOp,
        request: RequestBuilder,
    ) -> Result<T> {
        self.send(op, request)
            .await?
            .json()
            .await
            .map_err(|e| Error::remote(op, format!("invalid response body: {e}")))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        debug!(%method, %url, "remote request");
        self.client.request(method, url)
    }

    fn entity_request(
        &self,
        op: RemoteOp,
        method: Method,
        entity: &Fields,
    ) -> Result<RequestBuilder> {
        let url = self.entity_url(op, entity)?;
        Ok(self.request(method, url.as_str()))
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn list(&self) -> Result<Vec<Fields>> {
        self.fetch(RemoteOp::List, self.request(Method::GET, &self.url))
            .await
    }

    async fn load(&self) -> Result<Fields> {
        self.fetch(RemoteOp::Load, self.request(Method::GET, &self.url))
            .await
    }

    async fn get(&self, entity: &Fields) -> Result<Fields> {
        let request = self.entity_request(RemoteOp::Get, Method::GET, entity)?;
        self.fetch(RemoteOp::Get, request).await
    }

    async fn create(&self, entity: Fields) -> Result<Fields> {
        let request = self.request(Method::POST, &self.url).json(&entity);
        self.fetch(RemoteOp::Create, request).await
    }

    async fn update(&self, entity: Fields) -> Result<Fields> {
        let request = self
            .entity_request(RemoteOp::Update, Method::PUT, &entity)?
            .json(&entity);
        self.fetch(RemoteOp::Update, request).await
    }

    async fn destroy(&self, entity: Fields) -> Result<()> {
        let request = self.entity_request(RemoteOp::Destroy, Method::DELETE, &entity)?;
        self.send(RemoteOp::Destroy, request).await.map(drop)
    }
}
