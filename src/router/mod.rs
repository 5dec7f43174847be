/* Copyright (C) 2022 Antmicro
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     https://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

pub mod conflict_graph;
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::thread;

use crate::configuration::{
    ConfigurationAssembler,
    RoutingConfiguration,
    SwitchId,
    SwitchState,
    merge,
};
use crate::error::{Error, Result};
#[allow(unused)]
use crate::log::*;
use crate::permutation::Permutation;
use crate::topology::{Block, Topology};
use self::conflict_graph::{ConflictGraph, Subnet};

/// Computes switch settings of a Waksman network realizing a permutation.
///
/// # The algorithm
///
/// Each level of the network is routed by deciding, for every input, which of
/// the two middle sub-networks it crosses. Inputs sharing an input switch, as
/// well as inputs sharing an output switch, must use different sub-networks.
/// These constraints form a [`ConflictGraph`] which is 2-colored; the colors
/// determine the states of the outer switches and the two half-size
/// permutations the sub-networks have to realize. Both halves are then routed
/// recursively.
///
/// Routing is deterministic: chains without constraints always start with a
/// straight switch, and the unmatched wire of an odd-sized level always goes
/// to the lower (larger) sub-network.
pub struct Router {
    topology: Arc<Topology>,
}

impl Router {
    pub fn new(size: usize) -> Result<Self> {
        Ok(Self { topology: Arc::new(Topology::build(size)?) })
    }

    pub fn with_topology(topology: Arc<Topology>) -> Self {
        Self { topology }
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn route(&self, permutation: &Permutation) -> Result<RoutingConfiguration> {
        self.route_with_spawn_levels(permutation, 0)
    }

    /// Routes on up to `threads` threads. The result is identical to
    /// [`Router::route`].
    pub fn route_parallel(&self, permutation: &Permutation, threads: usize)
        -> Result<RoutingConfiguration>
    {
        let threads = threads.max(1);
        let spawn_levels = (usize::BITS - 1 - threads.leading_zeros()) as usize;
        self.route_with_spawn_levels(permutation, spawn_levels)
    }

    fn route_with_spawn_levels(&self, permutation: &Permutation, spawn_levels: usize)
        -> Result<RoutingConfiguration>
    {
        if permutation.len() != self.topology.size() {
            return Err(Error::InvalidPermutation(format!(
                "permutation of {} ports given for a network of {} ports",
                permutation.len(), self.topology.size()
            )));
        }

        dbg_log!(DBG_INFO, "Routing permutation {}", permutation);

        let config = route_block(
            &self.topology,
            self.topology.root(),
            0,
            0,
            permutation.as_slice(),
            spawn_levels
        )?;
        config.check_complete_for(&self.topology)?;

        Ok(config)
    }
}

/// Routes `permutation` on a freshly built network of matching size.
pub fn route(permutation: &Permutation) -> Result<RoutingConfiguration> {
    Router::new(permutation.len())?.route(permutation)
}

fn switch_id(
    topology: &Topology,
    stage: usize,
    line: usize,
    perm: &[usize]
) -> Result<SwitchId> {
    match topology.position_of(stage, line) {
        Some(position) => Ok(SwitchId { stage, position }),
        None => Err(Error::InconsistentRouting {
            stage,
            position: line / 2,
            permutation: perm.to_vec(),
        }),
    }
}

/// Routes `perm` through `block` placed at `stage`, starting at line `base`.
/// The upper half is routed on a separate thread for `spawn_levels` levels.
fn route_block(
    topology: &Arc<Topology>,
    block: &Arc<Block>,
    stage: usize,
    base: usize,
    perm: &[usize],
    spawn_levels: usize,
) -> Result<RoutingConfiguration> {
    let n = block.size;

    match n {
        1 => return Ok(RoutingConfiguration::new()),
        2 => {
            let state = match perm {
                [0, 1] => SwitchState::Straight,
                [1, 0] => SwitchState::Cross,
                _ => return Err(Error::InvalidPermutation(format!(
                    "{:?} is not a permutation of 2 ports", perm
                ))),
            };
            let mut assembler = ConfigurationAssembler::new(perm);
            assembler.assign(switch_id(topology, stage, base, perm)?, state)?;
            return Ok(assembler.finish());
        }
        _ => (),
    }

    let h = block.half();
    let mut inv = vec![0; n];
    for (input, &output) in perm.iter().enumerate() {
        inv[output] = input;
    }

    let colors = ConflictGraph::new(perm, &inv)
        .color()
        .map_err(|node| Error::InconsistentRouting {
            stage,
            position: topology.position_of(stage, base + (node & !1))
                .unwrap_or(node / 2),
            permutation: perm.to_vec(),
        })?;

    let state_of = |input: usize| match colors[input] {
        Subnet::Upper => SwitchState::Straight,
        Subnet::Lower => SwitchState::Cross,
    };

    let mut outer = ConfigurationAssembler::new(perm);
    for j in 0 .. block.input_switches() {
        let id = switch_id(topology, stage, base + 2 * j, perm)?;
        outer.assign(id, state_of(2 * j))?;
    }
    let out_stage = stage + block.output_stage();
    for k in 0 .. block.output_switches() {
        let id = switch_id(topology, out_stage, base + 2 * k, perm)?;
        outer.assign(id, state_of(inv[2 * k]))?;
    }

    let mut upper_perm = vec![0; h];
    let mut lower_perm = vec![0; n - h];
    for (input, &output) in perm.iter().enumerate() {
        match colors[input] {
            Subnet::Upper => upper_perm[input / 2] = output / 2,
            Subnet::Lower => lower_perm[input / 2] = output / 2,
        }
    }

    dbg_log!(
        DBG_EXTRA,
        "stage {} line {}: {:?} -> upper {:?}, lower {:?}",
        stage, base, perm, upper_perm, lower_perm
    );

    let (upper, lower) = match (&block.upper, &block.lower) {
        (Some(upper), Some(lower)) => (upper, lower),
        _ => return Err(Error::InconsistentRouting {
            stage,
            position: 0,
            permutation: perm.to_vec(),
        }),
    };

    let (upper_config, lower_config) = if spawn_levels > 0 {
        let me_topology = Arc::clone(topology);
        let me_upper = Arc::clone(upper);
        let handle = thread::spawn(move || {
            route_block(&me_topology, &me_upper, stage + 1, base, &upper_perm, spawn_levels - 1)
        });
        let lower_config =
            route_block(topology, lower, stage + 1, base + h, &lower_perm, spawn_levels - 1);
        let upper_config = handle.join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        (upper_config?, lower_config?)
    } else {
        (
            route_block(topology, upper, stage + 1, base, &upper_perm, 0)?,
            route_block(topology, lower, stage + 1, base + h, &lower_perm, 0)?,
        )
    };

    merge([outer.finish(), upper_config, lower_config], perm)
}
