//! Transport abstraction over plaintext TCP and TLS.
//!
//! Both arms share one read/write code path: the poll contract of
//! `AsyncRead`/`AsyncWrite` already expresses "retry once readable" and
//! "retry once writable", so a TLS operation that must wait for the
//! opposite direction (renegotiation) parks in its poll method exactly
//! like a plain socket waiting for buffer space.

use pin_project_lite::pin_project;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

pin_project! {
    /// A byte-stream endpoint, plaintext or TLS.
    #[derive(Debug)]
    #[project = TransportProj]
    pub enum Transport {
        Plain { #[pin] stream: TcpStream },
        Tls { #[pin] stream: TlsStream<TcpStream> },
    }
}

impl Transport {
    pub fn is_tls(&self) -> bool {
        matches!(self, Transport::Tls { .. })
    }
}

impl AsyncRead for Transport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.project() {
            TransportProj::Plain { stream } => stream.poll_read(cx, buf),
            TransportProj::Tls { stream } => stream.poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Transport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.project() {
            TransportProj::Plain { stream } => stream.poll_write(cx, buf),
            TransportProj::Tls { stream } => stream.poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            TransportProj::Plain { stream } => stream.poll_flush(cx),
            TransportProj::Tls { stream } => stream.poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            TransportProj::Plain { stream } => stream.poll_shutdown(cx),
            TransportProj::Tls { stream } => stream.poll_shutdown(cx),
        }
    }
}
