// Search redirect service: GET /search?q=<text> -> {"redirectUrl": "<engine url>"}.
// A blocking tiny_http loop; routing is a pure function so it can be tested without sockets.

use std::net::SocketAddr;

use serde_json::json;
use tiny_http::{Header, Method, Request, Response, Server};
use url::Url;

use crate::error::BrowserError;
use crate::settings::SearchEngine;

pub const MISSING_QUERY_MESSAGE: &str = "Query não informada";

#[derive(Debug, Clone, PartialEq)]
pub struct SearchReply {
    pub status: u16,
    /// `None` for bodiless replies (CORS preflight).
    pub body: Option<serde_json::Value>,
}

impl SearchReply {
    fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "error": message }))
    }
}

/// Maps a request line to its reply.
pub fn route(method: &Method, raw_url: &str, engine: &SearchEngine) -> SearchReply {
    let parsed = match Url::parse("http://localhost").and_then(|base| base.join(raw_url)) {
        Ok(u) => u,
        Err(_) => return SearchReply::error(400, "Malformed request"),
    };
    if parsed.path() != "/search" {
        return SearchReply::error(404, "Not found");
    }

    match method {
        Method::Options => SearchReply { status: 204, body: None },
        Method::Get => {
            let query = parsed
                .query_pairs()
                .find(|(key, _)| key == "q")
                .map(|(_, value)| value.into_owned());
            match query {
                Some(q) if !q.is_empty() => SearchReply::json(200, json!({ "redirectUrl": engine.query_url(&q) })),
                _ => SearchReply::error(400, MISSING_QUERY_MESSAGE),
            }
        }
        _ => SearchReply::error(405, "Method not allowed"),
    }
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

pub struct SearchServer {
    server: Server,
    engine: SearchEngine,
}

impl SearchServer {
    pub fn bind(addr: &str, engine: SearchEngine) -> Result<Self, BrowserError> {
        let server = Server::http(addr).map_err(|e| BrowserError::Server(e.to_string()))?;
        Ok(Self { server, engine })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serves requests until the listener is closed.
    pub fn serve(&self) {
        for request in self.server.incoming_requests() {
            self.handle(request);
        }
    }

    /// Blocks for exactly one request.
    pub fn handle_one(&self) -> Result<(), BrowserError> {
        let request = self.server.recv()?;
        self.handle(request);
        Ok(())
    }

    fn handle(&self, request: Request) {
        let reply = route(request.method(), request.url(), &self.engine);
        log::info!("[Search] {} {} -> {}", request.method(), request.url(), reply.status);

        let data = reply.body.as_ref().map(|b| b.to_string()).unwrap_or_default();
        let mut response = Response::from_data(data.into_bytes()).with_status_code(reply.status);
        let mut headers = vec![
            header("Access-Control-Allow-Origin", "*"),
            header("Access-Control-Allow-Methods", "GET, OPTIONS"),
            header("Access-Control-Allow-Headers", "Content-Type"),
        ];
        if reply.body.is_some() {
            headers.push(header("Content-Type", "application/json; charset=utf-8"));
        }
        for h in headers.into_iter().flatten() {
            response.add_header(h);
        }

        if let Err(e) = request.respond(response) {
            log::warn!("[Search] Failed to send response: {}", e);
        }
    }
}
