// Copyright Materialize, Inc. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository, or online at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The single-listener TCP proxy (C6): accepts inbound connections, asks
//! the policy selector for an upstream, dials it locally, and bridges the
//! two connections bidirectionally.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};

use crate::error::ForwarderError;
use crate::policy::PolicySelector;

/// Binds `host_port` on localhost and runs the accept loop until `shutdown`
/// resolves or the listener errors out.
pub async fn serve(
    host_port: u16,
    selector: Arc<dyn PolicySelector>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), ForwarderError> {
    let addr: SocketAddr = ([0, 0, 0, 0], host_port).into();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("proxy listening on {addr}");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("proxy shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (client, remote_addr) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::warn!("accept error: {e}");
                        continue;
                    }
                };
                let selector = Arc::clone(&selector);
                tokio::spawn(async move {
                    if let Err(e) = bridge_one(client, remote_addr, selector).await {
                        tracing::warn!("bridge for {remote_addr} failed: {e}");
                    }
                });
            }
        }
    }
}

async fn bridge_one(
    mut client: TcpStream,
    remote_addr: SocketAddr,
    selector: Arc<dyn PolicySelector>,
) -> Result<(), ForwarderError> {
    let port = selector.next_port(remote_addr).await;
    if port.is_empty() {
        return Err(ForwarderError::NoUpstream);
    }
    let upstream_addr: SocketAddr = ([127, 0, 0, 1], port.parse().unwrap_or(0)).into();
    let mut upstream = TcpStream::connect(upstream_addr).await?;

    let (mut client_read, mut client_write) = client.split();
    let (mut upstream_read, mut upstream_write) = upstream.split();

    let client_to_upstream = tokio::io::copy(&mut client_read, &mut upstream_write);
    let upstream_to_client = tokio::io::copy(&mut upstream_read, &mut client_write);

    tokio::select! {
        r = client_to_upstream => { r?; }
        r = upstream_to_client => { r?; }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Pool;
    use crate::policy::RoundRobin;
    use std::io::{Read, Write};
    use std::net::TcpListener as StdTcpListener;

    #[tokio::test]
    async fn bridges_client_to_a_live_upstream() {
        let upstream = StdTcpListener::bind("127.0.0.1:0").unwrap();
        let upstream_port = upstream.local_addr().unwrap().port();
        std::thread::spawn(move || {
            if let Ok((mut conn, _)) = upstream.accept() {
                let mut buf = [0u8; 5];
                conn.read_exact(&mut buf).unwrap();
                conn.write_all(b"world").unwrap();
            }
        });

        let pool = Arc::new(Pool::new());
        pool.set_slot(pool.allocate(), &upstream_port.to_string());
        let selector: Arc<dyn PolicySelector> = Arc::new(RoundRobin::new(pool));

        let proxy_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let proxy_addr = proxy_listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (client, remote_addr) = proxy_listener.accept().await.unwrap();
            bridge_one(client, remote_addr, selector).await.unwrap();
        });

        let mut client = TcpStream::connect(proxy_addr).await.unwrap();
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        client.write_all(b"hello").await.unwrap();
        let mut buf = [0u8; 5];
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"world");

        let _ = server.await;
    }
}
