//! # TCP client — library-side counterpart to [`crate::server`]
//!
//! Speaks the same length-prefixed JSON frame protocol: one request per
//! frame, one response per frame, a fresh connection per call (matching the
//! source client's "connect, send, receive, close" per-request shape).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Result, VecStreamError};
use crate::metadata::Filter;

#[derive(Debug, Serialize, Default)]
struct Request<'a> {
    command: &'a str,
    collection: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vector: Option<&'a [f32]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_vector: Option<&'a [f32]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    k: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a Filter>,
}

#[derive(Debug, Deserialize)]
struct Response {
    status: String,
    message: Option<String>,
    vector: Option<Vec<f32>>,
    metadata: Option<Value>,
    results: Option<Vec<(String, f32)>>,
}

/// A client for the `vecstream` TCP server.
pub struct Client {
    addr: String,
}

impl Client {
    pub fn new(addr: impl Into<String>) -> Self {
        Client { addr: addr.into() }
    }

    async fn send(&self, request: &Request<'_>) -> Result<Response> {
        let mut stream = TcpStream::connect(&self.addr).await?;
        let payload = serde_json::to_vec(request)?;
        stream.write_all(&(payload.len() as u32).to_be_bytes()).await?;
        stream.write_all(&payload).await?;

        let mut len_buf = [0u8; 4];
        stream.read_exact(&mut len_buf).await?;
        let len = u32::from_be_bytes(len_buf) as usize;
        let mut body = vec![0u8; len];
        stream.read_exact(&mut body).await?;

        let response: Response = serde_json::from_slice(&body)?;
        Ok(response)
    }

    fn into_result(response: Response) -> Result<Response> {
        if response.status == "success" {
            Ok(response)
        } else {
            Err(VecStreamError::NotFound(response.message.unwrap_or_else(|| "request failed".into())))
        }
    }

    pub async fn add_vector(&self, collection: &str, id: &str, vector: &[f32], metadata: Option<Value>) -> Result<()> {
        let request = Request {
            command: "add",
            collection,
            id: Some(id),
            vector: Some(vector),
            metadata,
            ..Request::default()
        };
        Self::into_result(self.send(&request).await?).map(|_| ())
    }

    pub async fn get_vector(&self, collection: &str, id: &str) -> Result<(Vec<f32>, Option<Value>)> {
        let request = Request { command: "get", collection, id: Some(id), ..Request::default() };
        let response = Self::into_result(self.send(&request).await?)?;
        Ok((response.vector.unwrap_or_default(), response.metadata))
    }

    pub async fn remove_vector(&self, collection: &str, id: &str) -> Result<()> {
        let request = Request { command: "remove", collection, id: Some(id), ..Request::default() };
        Self::into_result(self.send(&request).await?).map(|_| ())
    }

    pub async fn search_similar(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
        threshold: f32,
        filter: Option<&Filter>,
    ) -> Result<Vec<(String, f32)>> {
        let request = Request {
            command: "search",
            collection,
            query_vector: Some(query),
            k: Some(k),
            threshold: Some(threshold),
            filter,
            ..Request::default()
        };
        let response = Self::into_result(self.send(&request).await?)?;
        Ok(response.results.unwrap_or_default())
    }

    /// Empty `collection`'s vectors and metadata in place; the collection
    /// stays registered and usable afterward.
    pub async fn clear(&self, collection: &str) -> Result<()> {
        let request = Request { command: "clear", collection, ..Request::default() };
        Self::into_result(self.send(&request).await?).map(|_| ())
    }
}
