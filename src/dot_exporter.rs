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

use crate::configuration::{RoutingConfiguration, SwitchId, SwitchState};
use crate::topology::Topology;

fn state_color_str(state: Option<SwitchState>) -> &'static str {
    match state {
        Some(SwitchState::Straight) => "blue",
        Some(SwitchState::Cross) => "red",
        None => "gray",
    }
}

fn switch_node(id: SwitchId) -> String {
    format!("s{}_{}", id.stage, id.position)
}

/// Exports a network and, optionally, its switch settings to Graphviz DOT.
/// Drawing the graph is left to external tools.
pub struct NetworkDotExporter<'a> {
    topology: &'a Topology,
    config: Option<&'a RoutingConfiguration>,
}

impl<'a> NetworkDotExporter<'a> {
    pub fn new(topology: &'a Topology, config: Option<&'a RoutingConfiguration>) -> Self {
        Self { topology, config }
    }

    pub fn export_dot(&self, name: &str) -> String {
        let topology = self.topology;
        let n = topology.size();

        let mut dot = "# DOT Graph generated by mcenoc-route\n\n".to_string();
        dot += &format!("digraph {} {{\n\n", name);
        dot += "    rankdir = LR;\n\n";

        dot += "    subgraph cluster_inputs {\n";
        dot += "        label = \"inputs\";\n";
        for line in 0 .. n {
            dot += &format!("        in{} [label=\"{}\", shape=circle];\n", line, line);
        }
        dot += "    }\n\n";

        /* Node currently driving each line, and the port it drives it from */
        let mut drivers: Vec<(String, Option<usize>)> =
            (0 .. n).map(|line| (format!("in{}", line), None)).collect();
        let mut edges = Vec::new();

        for stage in 0 .. topology.stage_count() {
            dot += &format!("    subgraph cluster_stage_{} {{\n", stage);
            dot += &format!("        label = \"stage {}\";\n", stage);

            let switches = topology.switches().filter(|(id, _)| id.stage == stage);
            for (id, line) in switches {
                let state = self.config.and_then(|config| config.get(id));
                let label = state.map(|s| s.to_string()).unwrap_or_else(|| "?".into());
                let node = switch_node(id);

                dot += &format!(
                    "        {} [label=\"{}\\n{}\", shape=box, color=\"{}\"];\n",
                    node, node, label, state_color_str(state)
                );

                for port in 0 .. 2 {
                    let (from, from_port) = &drivers[line + port];
                    edges.push((from.clone(), *from_port, node.clone(), port));
                    drivers[line + port] = (node.clone(), Some(port));
                }
            }
            dot += "    }\n\n";

            if stage + 1 < topology.stage_count() {
                let mut linked = drivers.clone();
                for (line, driver) in drivers.into_iter().enumerate() {
                    linked[topology.link(stage, line)] = driver;
                }
                drivers = linked;
            }
        }

        dot += "    subgraph cluster_outputs {\n";
        dot += "        label = \"outputs\";\n";
        for line in 0 .. n {
            dot += &format!("        out{} [label=\"{}\", shape=circle];\n", line, line);
        }
        dot += "    }\n\n";

        for (line, (from, from_port)) in drivers.into_iter().enumerate() {
            edges.push((from, from_port, format!("out{}", line), 0));
        }

        for (from, from_port, to, to_port) in edges {
            match from_port {
                Some(from_port) => dot += &format!(
                    "    {} -> {} [taillabel=\"{}\", headlabel=\"{}\"];\n",
                    from, to, from_port, to_port
                ),
                None => dot += &format!("    {} -> {};\n", from, to),
            }
        }

        dot += "}\n";

        dot
    }
}
