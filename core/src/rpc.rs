/// JSON-RPC plumbing shared by the node and wallet adapters: an alloy
/// [`RpcClient`] over HTTP, with every call bounded and every failure mapped
/// onto [`DappError`].
use std::time::Duration;

use alloy_json_rpc::{RpcError, RpcRecv, RpcSend};
use alloy_rpc_client::RpcClient;
use alloy_transport::{utils::guess_local_url, TransportError, TransportErrorKind};
use alloy_transport_http::{reqwest, Http};
use tracing::debug;

use crate::error::{with_timeout, DappError, Result};

/// HTTP JSON-RPC client for `url`. Connecting is bounded by `connect_timeout`;
/// responses are bounded per call, see [`request`].
pub fn http_client(url: url::Url, connect_timeout: Duration) -> Result<RpcClient> {
    let http = reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .map_err(|e| DappError::InvalidConfig(format!("Cannot build HTTP client: {e}")))?;
    let is_local = guess_local_url(url.as_str());
    debug!(host = ?url.host_str(), is_local, "json-rpc client");
    Ok(RpcClient::new(Http::with_client(http, url), is_local))
}

/// Send one request and wait at most `limit` for its result. Calls that wait
/// on the user pass `None` and are bounded by the caller instead.
pub async fn request<P, R>(
    client: &RpcClient,
    method: &'static str,
    params: P,
    limit: Option<Duration>,
) -> Result<R>
where
    P: RpcSend,
    R: RpcRecv,
{
    let call = async {
        client
            .request(method, params)
            .await
            .map_err(|e| rpc_error(method, e))
    };
    with_timeout(limit, method, call).await
}

/// Map an alloy transport error onto the error taxonomy.
pub(crate) fn rpc_error(method: &str, err: TransportError) -> DappError {
    match err {
        RpcError::ErrorResp(payload) => {
            debug!(%method, code = payload.code, message = %payload.message, "rpc error");
            DappError::Rpc {
                code: payload.code,
                message: payload.message.to_string(),
            }
        }
        RpcError::Transport(kind) => {
            DappError::RpcTransport(format!("{method}: {}", transport_message(kind)))
        }
        RpcError::DeserError { err, .. } => {
            DappError::Decode(format!("{method}: unexpected result: {err}"))
        }
        RpcError::NullResp => DappError::Decode(format!("{method}: empty result")),
        other => DappError::RpcTransport(format!("{method}: {other}")),
    }
}

// reqwest errors carry the request URL, and node URLs carry API keys.
fn transport_message(kind: TransportErrorKind) -> String {
    match kind {
        TransportErrorKind::Custom(err) => match err.downcast::<reqwest::Error>() {
            Ok(err) => (*err).without_url().to_string(),
            Err(err) => err.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_json_rpc::ErrorPayload;
    use alloy_primitives::U64;
    use tokio::net::TcpListener;

    #[test]
    fn error_object_keeps_code_and_message() {
        let err = rpc_error(
            "eth_requestAccounts",
            RpcError::ErrorResp(ErrorPayload {
                code: 4001,
                message: "User rejected the request.".into(),
                data: None,
            }),
        );
        assert!(err.is_user_rejection());
        assert!(err.to_string().contains("User rejected"));
    }

    #[test]
    fn transport_failure_names_the_method() {
        let err = rpc_error("eth_chainId", TransportErrorKind::custom_str("connection refused"));
        assert!(matches!(&err, DappError::RpcTransport(m) if m == "eth_chainId: connection refused"));
    }

    #[test]
    fn empty_result_is_decode_error() {
        let err = rpc_error("eth_call", RpcError::NullResp);
        assert!(matches!(err, DappError::Decode(_)));
    }

    /// Accept connections and never answer on them.
    async fn silent_endpoint() -> url::Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });
        format!("http://{addr}").parse().unwrap()
    }

    #[tokio::test]
    async fn silent_endpoint_times_out() {
        let client = http_client(silent_endpoint().await, Duration::from_secs(1)).unwrap();
        let err = request::<_, U64>(
            &client,
            "eth_chainId",
            serde_json::json!([]),
            Some(Duration::from_millis(200)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DappError::Timeout(_)), "got {err:?}");
        assert!(err.to_string().contains("eth_chainId"));
    }

    #[tokio::test]
    async fn closed_port_is_transport_error() {
        let client = http_client("http://127.0.0.1:9".parse().unwrap(), Duration::from_secs(1)).unwrap();
        let err = request::<_, U64>(
            &client,
            "eth_chainId",
            serde_json::json!([]),
            Some(Duration::from_secs(5)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DappError::RpcTransport(_)), "got {err:?}");
        assert!(!err.to_string().contains("127.0.0.1:9"));
    }
}
