//! Legacy HTTP+SSE transport.
//!
//! The client opens a `GET` event stream. The server first sends an
//! `endpoint` event naming the URL that accepts client messages, then pushes
//! its own JSON-RPC messages as `message` events. Client messages are
//! `POST`ed as JSON to the endpoint.

use async_trait::async_trait;
use futures::channel::mpsc as futures_mpsc;
use futures::StreamExt;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::Url;
use reqwest_eventsource::{retry::Never, Event, EventSource};
use rmcp::model::ClientInfo;
use rmcp::service::{RoleClient, RxJsonRpcMessage, ServiceExt, TxJsonRpcMessage};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

use super::{map_client_initialize_error, MCPRunningService, MCPTransport};
use crate::config::ServerKind;
use crate::error::{Result, TesterError};

const ENDPOINT_EVENT: &str = "endpoint";
const MESSAGE_EVENT: &str = "message";

/// SSE-based MCP transport (for remote MCP servers).
pub struct SseTransport {
    url: String,
    client: reqwest::Client,
}

impl SseTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    /// Use a caller-provided HTTP client. It must not set a total request
    /// timeout, since the event stream stays open for the whole session.
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MCPTransport for SseTransport {
    fn kind(&self) -> ServerKind {
        ServerKind::Sse
    }

    async fn connect(&mut self, client_info: ClientInfo) -> Result<MCPRunningService> {
        let base = Url::parse(&self.url).map_err(|e| {
            TesterError::Configuration(format!("invalid SSE url '{}': {e}", self.url))
        })?;

        let request = self
            .client
            .get(base.clone())
            .header(ACCEPT, HeaderValue::from_static("text/event-stream"));
        let mut events = EventSource::new(request)
            .map_err(|e| TesterError::Connection(format!("cannot open SSE stream: {e}")))?;
        events.set_retry_policy(Box::new(Never));

        let endpoint = match wait_for_endpoint(&mut events, &base).await {
            Ok(endpoint) => endpoint,
            Err(e) => {
                events.close();
                return Err(e);
            }
        };
        debug!(%endpoint, "SSE endpoint received");

        let (outbound_tx, outbound_rx) = futures_mpsc::unbounded::<TxJsonRpcMessage<RoleClient>>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<RxJsonRpcMessage<RoleClient>>();

        tokio::spawn(run_bridge(
            self.client.clone(),
            endpoint,
            events,
            outbound_rx,
            inbound_tx,
        ));

        client_info
            .into_dyn()
            .serve((outbound_tx, UnboundedReceiverStream::new(inbound_rx)))
            .await
            .map_err(map_client_initialize_error)
    }
}

async fn wait_for_endpoint(events: &mut EventSource, base: &Url) -> Result<Url> {
    while let Some(event) = events.next().await {
        match event {
            Ok(Event::Open) => debug!("SSE stream opened"),
            Ok(Event::Message(message)) if message.event == ENDPOINT_EVENT => {
                return resolve_endpoint(base, &message.data);
            }
            Ok(Event::Message(message)) => {
                debug!(event = %message.event, "ignoring SSE event before endpoint");
            }
            Err(e) => return Err(TesterError::Connection(format!("SSE stream failed: {e}"))),
        }
    }
    Err(TesterError::Connection(
        "SSE stream closed before the endpoint event".into(),
    ))
}

/// Resolve the `endpoint` event payload against the stream URL.
fn resolve_endpoint(base: &Url, data: &str) -> Result<Url> {
    base.join(data.trim())
        .map_err(|e| TesterError::protocol("sse", format!("invalid endpoint '{data}': {e}")))
}

fn parse_server_message(data: &str) -> Option<RxJsonRpcMessage<RoleClient>> {
    match serde_json::from_str(data) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!(error = %e, "dropping malformed SSE message");
            None
        }
    }
}

async fn post_message(
    client: &reqwest::Client,
    endpoint: &Url,
    message: &TxJsonRpcMessage<RoleClient>,
) -> Result<()> {
    let response = client.post(endpoint.clone()).json(message).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TesterError::api(status.as_u16(), body));
    }
    Ok(())
}

/// Shuttle messages between rmcp and the SSE connection until either side
/// goes away. Dropping `inbound` tells rmcp the transport is closed.
async fn run_bridge(
    client: reqwest::Client,
    endpoint: Url,
    mut events: EventSource,
    mut outbound: futures_mpsc::UnboundedReceiver<TxJsonRpcMessage<RoleClient>>,
    inbound: mpsc::UnboundedSender<RxJsonRpcMessage<RoleClient>>,
) {
    loop {
        tokio::select! {
            _ = inbound.closed() => break,
            message = outbound.next() => {
                let Some(message) = message else { break };
                if let Err(e) = post_message(&client, &endpoint, &message).await {
                    warn!(error = %e, "failed to post MCP message");
                    break;
                }
            }
            event = events.next() => match event {
                Some(Ok(Event::Message(message))) if message.event == MESSAGE_EVENT => {
                    if let Some(parsed) = parse_server_message(&message.data) {
                        if inbound.send(parsed).is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(error = %e, "SSE stream ended with error");
                    break;
                }
                None => break,
            },
        }
    }
    events.close();
    debug!("SSE bridge stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn relative_endpoint_resolves_against_stream_url() {
        let base = Url::parse("http://localhost:8080/sse").unwrap();
        let endpoint = resolve_endpoint(&base, "/messages?sessionId=abc\n").unwrap();
        assert_eq!(
            endpoint.as_str(),
            "http://localhost:8080/messages?sessionId=abc"
        );
    }

    #[test]
    fn absolute_endpoint_is_kept() {
        let base = Url::parse("http://localhost:8080/sse").unwrap();
        let endpoint = resolve_endpoint(&base, "http://other:9000/rpc").unwrap();
        assert_eq!(endpoint.as_str(), "http://other:9000/rpc");
    }

    #[test]
    fn server_messages_parse_and_garbage_is_dropped() {
        let data = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "tools": [] }
        })
        .to_string();
        assert!(parse_server_message(&data).is_some());
        assert!(parse_server_message("not json").is_none());
    }

    #[tokio::test]
    async fn invalid_url_is_configuration_error() {
        let mut transport = SseTransport::new("not a url");
        let err = match transport.connect(ClientInfo::default()).await {
            Ok(_) => panic!("invalid url should fail"),
            Err(err) => err,
        };
        assert!(matches!(err, TesterError::Configuration(_)));
    }

    #[tokio::test]
    async fn stream_without_endpoint_event_fails() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string("event: ping\ndata: {}\n\n"),
            )
            .mount(&server)
            .await;

        let mut transport = SseTransport::new(format!("{}/sse", server.uri()));
        let err = match transport.connect(ClientInfo::default()).await {
            Ok(_) => panic!("stream without endpoint should fail"),
            Err(err) => err,
        };
        assert!(matches!(err, TesterError::Connection(_)));
    }
}
