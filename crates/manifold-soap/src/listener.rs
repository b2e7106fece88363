// crates/manifold-soap/src/listener.rs
//
// HTTP listener for the SOAP adapter. POST carries an envelope, GET the
// WSDL. Faults are answered with status 200 and a fault envelope, the way
// the classic document/literal endpoints behave.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;

use manifold_core::{CorrelationId, Dispatcher, Params, RpcRequest, TransportKind};

use crate::envelope::{decode_envelope, encode_fault, encode_result, fault_code};
use crate::wsdl::WSDL;

const TEXT_XML: &str = "text/xml; charset=utf-8";

/// Configuration for the SOAP listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoapConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for SoapConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Error)]
pub enum SoapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// SOAP 1.1 HTTP listener.
pub struct SoapListener {
    config: SoapConfig,
    dispatcher: Arc<Dispatcher>,
}

impl SoapListener {
    pub fn new(config: SoapConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self { config, dispatcher }
    }

    pub async fn serve(self) -> Result<(), SoapError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let app = Router::new()
            .route("/", get(serve_wsdl).post(handle_envelope))
            .with_state(self.dispatcher);

        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("SOAP listener on http://{}", addr);
        axum::serve(listener, app).await?;
        Ok(())
    }
}

async fn serve_wsdl() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, TEXT_XML)], WSDL)
}

async fn handle_envelope(
    State(dispatcher): State<Arc<Dispatcher>>,
    body: String,
) -> impl IntoResponse {
    let xml = process_envelope(&dispatcher, &body).await;
    ([(header::CONTENT_TYPE, TEXT_XML)], xml)
}

/// Decode, dispatch, encode. Split from the axum handler so tests can
/// drive it without a socket.
pub async fn process_envelope(dispatcher: &Dispatcher, body: &str) -> String {
    let call = match decode_envelope(body) {
        Ok(call) => call,
        Err(e) => {
            tracing::debug!("rejected SOAP request: {}", e);
            return encode_fault("soap:Client", &e.to_string());
        }
    };

    // '.' spells '/' in operation names, since '/' cannot appear in an
    // XML element name: <tasks.create> calls tasks/create. The response
    // element keeps the wire spelling.
    let element = call.operation;
    let method = element.replace('.', "/");
    let response = dispatcher
        .dispatch(RpcRequest {
            method,
            params: Params::Named(call.args),
            correlation: CorrelationId::None,
            origin: TransportKind::Soap,
        })
        .await;

    match response.outcome {
        Ok(result) => encode_result(&element, &result),
        Err(fault) => encode_fault(fault_code(fault.kind), &fault.message),
    }
}
