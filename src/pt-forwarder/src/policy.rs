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

//! Pluggable upstream-port selection (C5): round-robin with a liveness
//! probe, and source-IP sticky wrapping round-robin.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::error::ForwarderError;
use crate::pool::Pool;

const LIVENESS_PROBE_TIMEOUT: Duration = Duration::from_millis(50);

/// Chooses a host-port to dial for one inbound connection. An empty string
/// means "no upstream available"; the proxy drops the connection.
#[async_trait]
pub trait PolicySelector: Send + Sync {
    async fn next_port(&self, remote_addr: SocketAddr) -> String;
}

/// Round-robin over the pool's live slots, skipping any slot that fails a
/// short liveness probe. Borrows the pool by reference rather than copying
/// it, so it always observes the writer's latest mutations.
pub struct RoundRobin {
    pool: Arc<Pool>,
    cursor: Mutex<usize>,
}

impl RoundRobin {
    pub fn new(pool: Arc<Pool>) -> RoundRobin {
        RoundRobin {
            pool,
            cursor: Mutex::new(usize::MAX),
        }
    }
}

#[async_trait]
impl PolicySelector for RoundRobin {
    async fn next_port(&self, _remote_addr: SocketAddr) -> String {
        let slots = self.pool.slots();
        if slots.is_empty() {
            return String::new();
        }
        let len = slots.len();
        let start = {
            let mut cursor = self.cursor.lock().unwrap();
            *cursor = cursor.wrapping_add(1) % len;
            *cursor
        };

        let mut index = start;
        loop {
            let port = slots[index].clone();
            if !port.is_empty() && probe_liveness(&port).await {
                *self.cursor.lock().unwrap() = index;
                return port;
            }
            index = (index + 1) % len;
            if index == start {
                return String::new();
            }
        }
    }
}

/// Wraps [`RoundRobin`]: once a source host has been assigned a port, it
/// keeps getting that port for as long as the forwarder runs. The pin is
/// never invalidated when the underlying slot is released — an
/// acknowledged limitation, not an oversight.
pub struct Sticky {
    fallback: RoundRobin,
    pins: Mutex<HashMap<IpAddr, String>>,
}

impl Sticky {
    pub fn new(pool: Arc<Pool>) -> Sticky {
        Sticky {
            fallback: RoundRobin::new(pool),
            pins: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PolicySelector for Sticky {
    async fn next_port(&self, remote_addr: SocketAddr) -> String {
        let host = remote_addr.ip();
        if let Some(port) = self.pins.lock().unwrap().get(&host).cloned() {
            return port;
        }
        let port = self.fallback.next_port(remote_addr).await;
        if !port.is_empty() {
            self.pins.lock().unwrap().insert(host, port.clone());
        }
        port
    }
}

async fn probe_liveness(port: &str) -> bool {
    let Ok(port_num) = port.parse::<u16>() else {
        return false;
    };
    let addr = (std::net::Ipv4Addr::LOCALHOST, port_num);
    matches!(
        tokio::time::timeout(LIVENESS_PROBE_TIMEOUT, TcpStream::connect(addr)).await,
        Ok(Ok(_))
    )
}

/// Builds the selector named by `name`, or fails with [`ForwarderError::PolicyUnknown`].
pub fn build(name: &str, pool: Arc<Pool>) -> Result<Arc<dyn PolicySelector>, ForwarderError> {
    match name {
        "round-robin" => Ok(Arc::new(RoundRobin::new(pool))),
        "sticky" => Ok(Arc::new(Sticky::new(pool))),
        other => Err(ForwarderError::PolicyUnknown(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpListener as StdTcpListener};

    fn listen_on(port: u16) -> StdTcpListener {
        StdTcpListener::bind((Ipv4Addr::LOCALHOST, port)).unwrap()
    }

    fn remote(addr: &str) -> SocketAddr {
        addr.parse().unwrap()
    }

    #[tokio::test]
    async fn round_robin_cycles_through_all_live_ports() {
        let pool = Arc::new(Pool::new());
        let l0 = listen_on(0);
        let l1 = listen_on(0);
        let l2 = listen_on(0);
        let p0 = l0.local_addr().unwrap().port();
        let p1 = l1.local_addr().unwrap().port();
        let p2 = l2.local_addr().unwrap().port();

        for port in [p0, p1, p2] {
            let index = pool.allocate();
            pool.set_slot(index, &port.to_string());
        }

        let selector = RoundRobin::new(Arc::clone(&pool));
        let remote = remote("10.0.0.1:5000");
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(selector.next_port(remote).await);
        }
        assert_eq!(
            seen,
            vec![
                p0.to_string(),
                p1.to_string(),
                p2.to_string(),
                p0.to_string(),
                p1.to_string(),
                p2.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn round_robin_skips_dead_slots() {
        let pool = Arc::new(Pool::new());
        let live = listen_on(0);
        let live_port = live.local_addr().unwrap().port();

        pool.set_slot(pool.allocate(), "");
        pool.set_slot(pool.allocate(), &live_port.to_string());
        pool.set_slot(pool.allocate(), "");

        let selector = RoundRobin::new(Arc::clone(&pool));
        let remote = remote("10.0.0.1:5000");
        for _ in 0..10 {
            assert_eq!(selector.next_port(remote).await, live_port.to_string());
        }
    }

    #[tokio::test]
    async fn sticky_pins_per_source_host() {
        let pool = Arc::new(Pool::new());
        let l0 = listen_on(0);
        let l1 = listen_on(0);
        let p0 = l0.local_addr().unwrap().port();
        let p1 = l1.local_addr().unwrap().port();
        pool.set_slot(pool.allocate(), &p0.to_string());
        pool.set_slot(pool.allocate(), &p1.to_string());

        let selector = Sticky::new(pool);
        let host1 = remote("10.0.0.1:1");
        let host2 = remote("10.0.0.2:1");

        let first = selector.next_port(host1).await;
        let second = selector.next_port(host2).await;
        assert_ne!(first, second);
        let repeat = selector.next_port(remote("10.0.0.1:2")).await;
        assert_eq!(repeat, first);
    }
}
