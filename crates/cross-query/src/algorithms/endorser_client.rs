//! # Endorser Client
//!
//! One bounded request/response exchange with a single endorser.

use crate::domain::{
    EndorsedPayload, EndorserCallError, EndorserCallResult, EndorserRequest, EndorserResponse,
    QueryKind,
};
use crate::ports::outbound::EndorserConnector;
use std::time::Duration;
use tracing::debug;

/// Call one endorser.
///
/// Opens a fresh channel, sends `envelope`, and decodes the answer. The
/// whole connect + call is bounded by `timeout`; on expiry the pending
/// future is dropped together with its channel.
pub async fn call_endorser<C>(
    connector: &C,
    host: &str,
    envelope: EndorserRequest,
    expected: QueryKind,
    timeout: Duration,
) -> Result<EndorserCallResult, EndorserCallError>
where
    C: EndorserConnector + ?Sized,
{
    let exchange = async {
        let mut channel = connector.connect(host).await?;
        channel.endorser_call(envelope).await
    };

    let response = match tokio::time::timeout(timeout, exchange).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            return Err(EndorserCallError::Unreachable {
                host: host.to_string(),
                reason: e.to_string(),
            })
        }
        Err(_) => {
            return Err(EndorserCallError::Timeout {
                host: host.to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        }
    };

    debug!(host, "endorser answered");
    decode_endorser_response(host, response, expected)
}

/// Decode the endorsed payload carried in an endorser response.
///
/// Both the echoed request and the response must be of the `expected` kind.
pub fn decode_endorser_response(
    host: &str,
    response: EndorserResponse,
    expected: QueryKind,
) -> Result<EndorserCallResult, EndorserCallError> {
    let payload: EndorsedPayload =
        serde_json::from_slice(&response.response_data).map_err(|e| EndorserCallError::Decode {
            host: host.to_string(),
            reason: e.to_string(),
        })?;

    if payload.request.kind() != expected || payload.response.kind() != expected {
        return Err(EndorserCallError::Decode {
            host: host.to_string(),
            reason: format!(
                "expected {} payload, got request {} / response {}",
                expected,
                payload.request.kind(),
                payload.response.kind()
            ),
        });
    }

    Ok(EndorserCallResult {
        host: host.to_string(),
        request: payload.request,
        response: payload.response,
        signature: response.endorser_sign,
    })
}
