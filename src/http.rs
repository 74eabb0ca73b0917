//! HTTP API for course content storage
//!
//! Routes, all JSON:
//!
//! - `GET  /health` - liveness plus storage counters (no identity required)
//! - `GET  /chapters` - ordered tree; learners see non-draft lessons only
//! - `PUT  /chapters/sync` - replace the whole tree snapshot (admin)
//! - `GET  /lessons/metadata` - caller's interaction maps and progress
//! - `GET  /lessons/{id}` - one lesson with its comment thread
//! - `POST /lessons/{id}/completed` / `DELETE` - completion toggle
//! - `POST /lessons/{id}/liked` / `DELETE` - like toggle
//! - `POST /lessons/{id}/saved` / `DELETE` - save toggle
//! - `PUT  /lessons/{id}/rating` - set rating 1 to 5
//! - `POST /lessons/{id}/comments` - append a comment
//! - `PUT  /lessons/{id}/content` - replace content fields (admin)
//!
//! Caller identity arrives in `x-user-id` / `x-user-role` headers, set by the
//! fronting gateway after it authenticates the session.
//!
//! ```bash
//! curl -H "x-user-id: u1" http://localhost:8090/chapters
//!
//! curl -X POST -H "x-user-id: u1" \
//!      http://localhost:8090/lessons/l1/completed
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::auth::Caller;
use crate::db::Database;
use crate::error::StorageError;
use crate::services::sync_service::ChapterInput;
use crate::services::{response, Services, UpdateContentInput};

#[derive(Debug, Deserialize)]
struct SyncRequest {
    chapters: Vec<ChapterInput>,
}

#[derive(Debug, Deserialize)]
struct RateRequest {
    rate: i32,
}

#[derive(Debug, Deserialize)]
struct CommentRequest {
    content: String,
}

/// HTTP server state
pub struct HttpServer {
    services: Services,
    db: Database,
    bind_addr: SocketAddr,
}

impl HttpServer {
    pub fn new(services: Services, db: Database, bind_addr: SocketAddr) -> Self {
        Self {
            services,
            db,
            bind_addr,
        }
    }

    /// Run the HTTP server
    pub async fn run(self: Arc<Self>) -> Result<(), StorageError> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        info!(addr = %self.bind_addr, "HTTP server listening");

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let server = self.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let server = server.clone();
                    async move { server.handle_request(req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(addr = %remote_addr, error = %err, "Connection error");
                }
            });
        }
    }

    /// Route requests to handlers
    async fn handle_request(
        &self,
        req: Request<Incoming>,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let (parts, body) = req.into_parts();
        let path = parts.uri.path().to_string();
        let method = parts.method.clone();

        debug!(method = %method, path = %path, "Incoming request");

        if method == Method::GET && path == "/health" {
            return Ok(self.handle_health());
        }

        let caller = match Caller::from_headers(&parts.headers) {
            Ok(caller) => caller,
            Err(e) => return Ok(response::error_response(e)),
        };

        // Collect the body up front; mutating routes parse it as JSON.
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                return Ok(response::bad_request(&format!(
                    "Failed to read body: {}",
                    e
                )))
            }
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let resp = match (method, segments.as_slice()) {
            (Method::GET, ["chapters"]) => response::from_result(self.services.sync.list(&caller)),

            (Method::PUT, ["chapters", "sync"]) => match parse_json::<SyncRequest>(&body) {
                Ok(req) => response::from_result(
                    self.services.sync.synchronize(&caller, req.chapters).await,
                ),
                Err(e) => response::error_response(e),
            },

            (Method::GET, ["lessons", "metadata"]) => {
                response::from_result(self.services.metadata.compute(&caller.user_id).await)
            }

            (Method::GET, ["lessons", id]) => response::from_option(
                self.services.lesson.get(&caller, id),
                "Lesson not found",
            ),

            (Method::POST, ["lessons", id, "completed"]) => {
                response::from_ack_result(self.services.lesson.set_completed(&caller, id))
            }
            (Method::DELETE, ["lessons", id, "completed"]) => {
                response::from_ack_result(self.services.lesson.set_incomplete(&caller, id))
            }

            (Method::POST, ["lessons", id, "liked"]) => {
                response::from_ack_result(self.services.lesson.set_liked(&caller, id))
            }
            (Method::DELETE, ["lessons", id, "liked"]) => {
                response::from_ack_result(self.services.lesson.set_disliked(&caller, id))
            }

            (Method::POST, ["lessons", id, "saved"]) => {
                response::from_ack_result(self.services.lesson.set_saved(&caller, id))
            }
            (Method::DELETE, ["lessons", id, "saved"]) => {
                response::from_ack_result(self.services.lesson.set_unsaved(&caller, id))
            }

            (Method::PUT, ["lessons", id, "rating"]) => match parse_json::<RateRequest>(&body) {
                Ok(req) => response::from_ack_result(
                    self.services.lesson.set_rated(&caller, id, req.rate),
                ),
                Err(e) => response::error_response(e),
            },

            (Method::POST, ["lessons", id, "comments"]) => {
                match parse_json::<CommentRequest>(&body) {
                    Ok(req) => response::from_result(
                        self.services.lesson.add_comment(&caller, id, &req.content),
                    ),
                    Err(e) => response::error_response(e),
                }
            }

            (Method::PUT, ["lessons", id, "content"]) => {
                match parse_json::<UpdateContentInput>(&body) {
                    Ok(input) => response::from_ack_result(
                        self.services.lesson.update_content(&caller, id, input),
                    ),
                    Err(e) => response::error_response(e),
                }
            }

            (_, ["chapters"]) | (_, ["chapters", "sync"]) | (_, ["lessons", ..]) => {
                response::method_not_allowed()
            }

            _ => response::not_found("Route not found"),
        };

        Ok(resp)
    }

    /// Health check endpoint
    fn handle_health(&self) -> Response<Full<Bytes>> {
        match self.db.stats() {
            Ok(stats) => response::ok(&serde_json::json!({
                "status": "ok",
                "chapters": stats.chapter_count,
                "lessons": stats.lesson_count,
                "published_lessons": stats.published_lesson_count,
                "comments": stats.comment_count,
            })),
            Err(e) => response::error_response(e),
        }
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, StorageError> {
    serde_json::from_slice(body).map_err(StorageError::from)
}
