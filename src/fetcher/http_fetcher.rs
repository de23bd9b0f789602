use std::io;
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

use crate::app::{FeedreaderError, Result};
use crate::config::Settings;
use crate::fetcher::buffer::ResponseBuffer;
use crate::fetcher::tls::{classify_handshake_error, TlsContext};
use crate::url::ParsedUrl;

pub const HTTP_VERSION: &str = "HTTP/1.1";

/// How many times an interrupted read or write is retried before giving up.
const MAX_IO_RETRIES: usize = 8;

/// Plain HTTP and HTTPS transport: one `GET` per connection, response read
/// until the peer closes.
pub struct HttpFetcher {
    timeout: Duration,
    user_agent: String,
    tls: TlsContext,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Self {
        Self {
            timeout: settings.timeout,
            user_agent: settings.user_agent.clone(),
            tls: TlsContext::new(settings.ca_file.clone(), settings.ca_dir.clone()),
        }
    }

    pub async fn load_http(&self, url: &ParsedUrl, buf: &mut ResponseBuffer) -> Result<()> {
        let display = url.to_string();
        let mut stream = self.connect(url, &display).await?;
        let request = build_request(url, &self.user_agent);
        exchange(&mut stream, request.as_bytes(), buf, self.timeout, &display).await
    }

    pub async fn load_https(&self, url: &ParsedUrl, buf: &mut ResponseBuffer) -> Result<()> {
        let display = url.to_string();
        let config = self.tls.client_config()?;
        let server_name = ServerName::try_from(url.connect_host().to_string()).map_err(|_| {
            FeedreaderError::Url(format!("Invalid server name in URL '{}'!", display))
        })?;

        let tcp = self.connect(url, &display).await?;
        let connector = TlsConnector::from(config);
        let mut stream = match timeout(self.timeout, connector.connect(server_name, tcp)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(classify_handshake_error(&e, &display)),
            Err(_) => {
                return Err(FeedreaderError::Connection(format!(
                    "Cannot connect to the '{}'! (TLS handshake timed out)",
                    display
                )))
            }
        };

        let (_, session) = stream.get_ref();
        if session.peer_certificates().map_or(true, |certs| certs.is_empty()) {
            return Err(FeedreaderError::Verification(format!(
                "Unable to verify certificate of '{}'! (no peer certificate)",
                display
            )));
        }

        let request = build_request(url, &self.user_agent);
        exchange(&mut stream, request.as_bytes(), buf, self.timeout, &display).await
    }

    async fn connect(&self, url: &ParsedUrl, display: &str) -> Result<TcpStream> {
        let host = url.connect_host();
        let port = url.port_number().ok_or_else(|| {
            FeedreaderError::Url(format!("Missing port number of URL '{}'!", display))
        })?;

        match timeout(self.timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => {
                debug!(host, port, "connected");
                Ok(stream)
            }
            Ok(Err(e)) => Err(FeedreaderError::Connection(format!(
                "Cannot connect to the '{}'! ({})",
                display, e
            ))),
            Err(_) => Err(FeedreaderError::Connection(format!(
                "Cannot connect to the '{}'! (timed out)",
                display
            ))),
        }
    }
}

/// Request head for a single `GET` of `url`.
pub fn build_request(url: &ParsedUrl, user_agent: &str) -> String {
    format!(
        "GET {} {}\r\nHost: {}\r\nConnection: close\r\nUser-Agent: {}\r\n\r\n",
        url.request_target(),
        HTTP_VERSION,
        url.authority(),
        user_agent
    )
}

fn is_retryable(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock)
}

/// Send `request` and read the whole response into `buf`.
pub async fn exchange<S>(
    stream: &mut S,
    request: &[u8],
    buf: &mut ResponseBuffer,
    wait: Duration,
    url: &str,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    debug!(request = %String::from_utf8_lossy(request), "sending request");
    send_request(stream, request, wait, url).await?;
    receive_response(stream, buf, wait, url).await
}

async fn send_request<S>(stream: &mut S, request: &[u8], wait: Duration, url: &str) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    let send_error = |reason: String| {
        FeedreaderError::Communication(format!(
            "Unable to send request to the '{}'! ({})",
            url, reason
        ))
    };

    let mut sent = 0;
    let mut retries = 0;
    while sent < request.len() {
        match timeout(wait, stream.write(&request[sent..])).await {
            Ok(Ok(0)) => return Err(send_error("connection closed".into())),
            Ok(Ok(n)) => sent += n,
            Ok(Err(e)) if is_retryable(&e) && retries < MAX_IO_RETRIES => retries += 1,
            Ok(Err(e)) => return Err(send_error(e.to_string())),
            Err(_) => return Err(send_error(format!("not writable within {} ms", wait.as_millis()))),
        }
    }

    match timeout(wait, stream.flush()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(send_error(e.to_string())),
        Err(_) => Err(send_error(format!("not writable within {} ms", wait.as_millis()))),
    }
}

async fn receive_response<S>(
    stream: &mut S,
    buf: &mut ResponseBuffer,
    wait: Duration,
    url: &str,
) -> Result<()>
where
    S: AsyncRead + Unpin,
{
    let receive_error = |reason: String| {
        FeedreaderError::Communication(format!(
            "Unable to get response from the '{}'! ({})",
            url, reason
        ))
    };

    let mut retries = 0;
    loop {
        match timeout(wait, stream.read(buf.spare_mut())).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => buf.advance(n),
            // peers often close TLS without close_notify once the body is sent
            Ok(Err(e)) if e.kind() == io::ErrorKind::UnexpectedEof && !buf.is_empty() => break,
            Ok(Err(e)) if is_retryable(&e) && retries < MAX_IO_RETRIES => retries += 1,
            Ok(Err(e)) => return Err(receive_error(e.to_string())),
            Err(_) if buf.is_empty() => {
                return Err(receive_error(format!(
                    "nothing received within {} ms",
                    wait.as_millis()
                )))
            }
            Err(_) => {
                warn!(
                    "Response from '{}' did not finish within {} ms! Using {} received bytes.",
                    url,
                    wait.as_millis(),
                    buf.len()
                );
                break;
            }
        }
    }

    if buf.is_empty() {
        return Err(receive_error("empty response".into()));
    }

    debug!(bytes = buf.len(), capacity = buf.capacity(), "response received");
    Ok(())
}
