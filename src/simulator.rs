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

use serde::Serialize;

use crate::configuration::RoutingConfiguration;
use crate::error::{Error, Result};
use crate::topology::Topology;

/// Path of a single input through the network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Trace {
    pub input: usize,
    pub output: usize,
    /// Output port (0 - upper, 1 - lower) taken at every switch on the way.
    /// This is the source-routing header of the port.
    pub bits: Vec<u8>,
}

pub fn trace(topology: &Topology, config: &RoutingConfiguration, input: usize)
    -> Result<Trace>
{
    let mut line = input;
    let mut bits = Vec::new();

    for stage in 0 .. topology.stage_count() {
        if let Some((id, port)) = topology.switch_on_line(stage, line) {
            let state = config.get(id).ok_or(Error::IncompleteConfiguration {
                stage: id.stage,
                position: id.position,
            })?;
            let out_port = state.output_port(port);
            line = line - port + out_port;
            bits.push(out_port as u8);
        }
        if stage + 1 < topology.stage_count() {
            line = topology.link(stage, line);
        }
    }

    Ok(Trace { input, output: line, bits })
}

/// Output reached by every input under `config`.
pub fn simulate(topology: &Topology, config: &RoutingConfiguration) -> Result<Vec<usize>> {
    (0 .. topology.size())
        .map(|input| trace(topology, config, input).map(|t| t.output))
        .collect()
}

/// Route bits for every input port.
pub fn route_bits(topology: &Topology, config: &RoutingConfiguration) -> Result<Vec<Trace>> {
    (0 .. topology.size())
        .map(|input| trace(topology, config, input))
        .collect()
}
