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

//! The forwarder's dynamic slot table (C4): a dense sequence of host-ports,
//! a FIFO free-list for reuse, and the live tunnels bound to each slot.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use pt_client::{ClusterClient, PortForward, Replica};

use crate::error::ForwarderError;

/// Slot `i` is always bound to host-port `BASE_HOST_PORT + i`.
pub const BASE_HOST_PORT: u16 = 8080;

#[derive(Default)]
struct PoolState {
    /// Slot values: empty string means free, otherwise the decimal host-port
    /// currently bound there.
    slots: Vec<String>,
    free_list: VecDeque<usize>,
    replica_to_slot: HashMap<String, usize>,
}

/// The live pool, plus the tunnels bound to each occupied slot. The slot
/// table itself is guarded by a plain mutex held only across bookkeeping;
/// tunnel construction and teardown run outside the lock.
pub struct Pool {
    state: Mutex<PoolState>,
    tunnels: Mutex<HashMap<usize, PortForward>>,
}

impl Default for Pool {
    fn default() -> Pool {
        Pool::new()
    }
}

impl Pool {
    pub fn new() -> Pool {
        Pool {
            state: Mutex::new(PoolState::default()),
            tunnels: Mutex::new(HashMap::new()),
        }
    }

    /// A read-only snapshot of the current slot values, taken under the
    /// lock. The policy selector calls this on every lookup rather than
    /// holding its own copy, so it always observes live mutations.
    pub fn slots(&self) -> Vec<String> {
        self.state.lock().unwrap().slots.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pops the free-list head (FIFO) if non-empty, else extends the pool
    /// by one new slot.
    pub(crate) fn allocate(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        if let Some(index) = state.free_list.pop_front() {
            state.slots[index] = String::new();
            return index;
        }
        state.slots.push(String::new());
        state.slots.len() - 1
    }

    /// Clears the slot and returns it to the free-list.
    pub(crate) fn release(&self, index: usize) {
        let mut state = self.state.lock().unwrap();
        if index < state.slots.len() {
            state.slots[index] = String::new();
        }
        state.free_list.push_back(index);
        state.replica_to_slot.retain(|_, v| *v != index);
    }

    pub(crate) fn occupy(&self, index: usize, replica_name: &str) {
        let mut state = self.state.lock().unwrap();
        state.slots[index] = (BASE_HOST_PORT as usize + index).to_string();
        state.replica_to_slot.insert(replica_name.to_string(), index);
    }

    /// Directly overwrites a slot's value. Used only by the policy
    /// selector's unit tests, which need to bind test listeners on
    /// arbitrary (OS-assigned) ports rather than `BASE_HOST_PORT + index`.
    #[cfg(test)]
    pub(crate) fn set_slot(&self, index: usize, value: &str) {
        self.state.lock().unwrap().slots[index] = value.to_string();
    }

    pub(crate) fn slot_for(&self, replica_name: &str) -> Option<usize> {
        self.state.lock().unwrap().replica_to_slot.get(replica_name).copied()
    }

    async fn evict_stale_tunnel(&self, index: usize) {
        let existing = self.tunnels.lock().unwrap().remove(&index);
        if let Some(forward) = existing {
            forward.stop().await;
        }
    }

    /// Starts a tunnel for `replica`. `slot` pins the target slot for the
    /// initial snapshot (`0..N`); a watch arrival passes `None` to allocate
    /// a fresh (or recycled) slot.
    pub async fn start_tunnel(
        &self,
        client: &dyn ClusterClient,
        replica: &Replica,
        container_port: u16,
        slot: Option<usize>,
    ) -> Result<usize, ForwarderError> {
        let index = match slot {
            Some(index) => index,
            None => self.allocate(),
        };
        self.evict_stale_tunnel(index).await;

        let host_port = BASE_HOST_PORT + u16::try_from(index).unwrap_or(u16::MAX);
        match client.open_port_forward(replica, host_port, container_port).await {
            Ok(forward) => {
                self.occupy(index, &replica.name);
                self.tunnels.lock().unwrap().insert(index, forward);
                Ok(index)
            }
            Err(e) => {
                self.release(index);
                Err(e.into())
            }
        }
    }

    /// Tears down the tunnel bound to `replica`, if any, and releases its
    /// slot back to the free-list.
    pub async fn teardown_tunnel(&self, replica_name: &str) {
        let Some(index) = self.slot_for(replica_name) else {
            return;
        };
        self.evict_stale_tunnel(index).await;
        self.release(index);
    }
}
