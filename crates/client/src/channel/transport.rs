//! Websocket handshake for the streaming endpoint.

use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use crate::error::{Error, Result};

pub type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Performs one handshake against the streaming endpoint.
///
/// Failures (refused connection, TLS, rejected upgrade) all surface as
/// [`Error::Network`]; the channel's retry loop decides what to do with them.
pub async fn connect(url: &Url) -> Result<WsStream> {
	let (stream, _response) = connect_async(url.as_str())
		.await
		.map_err(|err| Error::Network(err.to_string()))?;
	Ok(stream)
}
