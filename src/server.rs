//! # TCP server — length-prefixed JSON frames over a `CollectionManager`
//!
//! A minimal remote-access boundary, not part of the core: a `u32`
//! big-endian length prefix followed by a JSON request, one per frame, with
//! a JSON response framed the same way. Commands are `add`, `get`,
//! `remove`, `search`, `clear`, each naming a target collection; every
//! response carries `status: "success" | "error"`.
//!
//! The core is single-threaded cooperative (no internal locking — see
//! `spec.md` §5), so every request takes the same `Mutex<CollectionManager>`
//! for its duration; concurrent connections are accepted, but requests are
//! still serviced one at a time.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::collection_manager::CollectionManager;
use crate::metadata::Filter;

#[derive(Debug, Deserialize)]
struct Request {
    command: String,
    collection: String,
    id: Option<String>,
    vector: Option<Vec<f32>>,
    metadata: Option<Value>,
    query_vector: Option<Vec<f32>>,
    k: Option<usize>,
    threshold: Option<f32>,
    filter: Option<HashMap<String, Value>>,
}

#[derive(Debug, Serialize, Default)]
struct Response {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vector: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<Vec<(String, f32)>>,
}

impl Response {
    fn ok() -> Self {
        Response { status: "success", ..Default::default() }
    }

    fn error(message: impl Into<String>) -> Self {
        Response { status: "error", message: Some(message.into()), ..Default::default() }
    }
}

/// Serve `manager` on `addr` until the process is stopped.
pub async fn serve(addr: &str, manager: CollectionManager) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "vecstream server listening");
    let manager = Arc::new(Mutex::new(manager));

    loop {
        let (socket, peer) = listener.accept().await?;
        info!(%peer, "accepted connection");
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            if let Err(err) = handle_connection(socket, manager).await {
                warn!(%peer, error = %err, "connection ended with error");
            }
        });
    }
}

async fn handle_connection(mut socket: TcpStream, manager: Arc<Mutex<CollectionManager>>) -> std::io::Result<()> {
    loop {
        let mut len_buf = [0u8; 4];
        if socket.read_exact(&mut len_buf).await.is_err() {
            return Ok(());
        }
        let len = u32::from_be_bytes(len_buf) as usize;

        let mut payload = vec![0u8; len];
        socket.read_exact(&mut payload).await?;

        let response = match serde_json::from_slice::<Request>(&payload) {
            Ok(request) => {
                let mut manager = manager.lock().await;
                handle_request(&mut manager, request)
            }
            Err(err) => Response::error(format!("malformed request: {err}")),
        };

        let encoded = serde_json::to_vec(&response).expect("Response always serializes");
        socket.write_all(&(encoded.len() as u32).to_be_bytes()).await?;
        socket.write_all(&encoded).await?;
    }
}

fn handle_request(manager: &mut CollectionManager, request: Request) -> Response {
    match request.command.as_str() {
        "add" => {
            let (Some(id), Some(vector)) = (request.id, request.vector) else {
                return Response::error("add requires id and vector");
            };
            match manager.get(&request.collection) {
                Ok(collection) => match collection.add_vector(id, vector, request.metadata) {
                    Ok(()) => match collection.save() {
                        Ok(()) => Response::ok(),
                        Err(err) => Response::error(err.to_string()),
                    },
                    Err(err) => Response::error(err.to_string()),
                },
                Err(err) => Response::error(err.to_string()),
            }
        }
        "get" => {
            let Some(id) = request.id else {
                return Response::error("get requires id");
            };
            match manager.get(&request.collection) {
                Ok(collection) => match collection.get_vector_with_metadata(&id) {
                    Ok((vector, metadata)) => Response {
                        vector: Some(vector),
                        metadata,
                        ..Response::ok()
                    },
                    Err(err) => Response::error(err.to_string()),
                },
                Err(err) => Response::error(err.to_string()),
            }
        }
        "remove" => {
            let Some(id) = request.id else {
                return Response::error("remove requires id");
            };
            match manager.get(&request.collection) {
                Ok(collection) => match collection.remove_vector(&id) {
                    Ok(()) => match collection.save() {
                        Ok(()) => Response::ok(),
                        Err(err) => Response::error(err.to_string()),
                    },
                    Err(err) => Response::error(err.to_string()),
                },
                Err(err) => Response::error(err.to_string()),
            }
        }
        "search" => {
            let Some(query) = request.query_vector else {
                return Response::error("search requires query_vector");
            };
            let k = request.k.unwrap_or(10);
            let threshold = request.threshold.unwrap_or(0.0);
            let filter: Option<Filter> = request.filter;
            match manager.get(&request.collection) {
                Ok(collection) => match collection.search_similar(&query, k, threshold, filter.as_ref()) {
                    Ok(results) => Response { results: Some(results), ..Response::ok() },
                    Err(err) => Response::error(err.to_string()),
                },
                Err(err) => Response::error(err.to_string()),
            }
        }
        "clear" => match manager.get(&request.collection) {
            Ok(collection) => match collection.clear() {
                Ok(()) => Response::ok(),
                Err(err) => Response::error(err.to_string()),
            },
            Err(err) => Response::error(err.to_string()),
        },
        other => Response::error(format!("unknown command: {other}")),
    }
}
