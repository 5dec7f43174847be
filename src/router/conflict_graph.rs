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

/// Middle sub-network a signal is sent through.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Subnet {
    Upper,
    Lower,
}

impl Subnet {
    pub fn other(self) -> Self {
        match self {
            Self::Upper => Self::Lower,
            Self::Lower => Self::Upper,
        }
    }
}

#[derive(Clone, Default)]
struct ConflictNode {
    /// Input sharing the same input switch.
    input_peer: Option<usize>,
    /// Input whose output shares the same output switch.
    output_peer: Option<usize>,
}

/// Constraints between the inputs of one level of a Waksman network.
///
/// Nodes are network inputs, addressed by index. Two inputs are linked when
/// they enter the same input switch or leave through the same output switch;
/// linked inputs must cross the network through different sub-networks. Every
/// node has at most one link of each kind, so the graph is a union of
/// alternating cycles and (for odd sizes) a single path.
pub struct ConflictGraph {
    nodes: Vec<ConflictNode>,
    colors: Vec<Option<Subnet>>,
    anchor: usize,
}

impl ConflictGraph {
    /// `perm[i]` is the output of input `i`, `inv` is its inverse.
    pub fn new(perm: &[usize], inv: &[usize]) -> Self {
        let n = perm.len();
        let peer = |x: usize| if (x ^ 1) < n { Some(x ^ 1) } else { None };

        let nodes = perm.iter()
            .enumerate()
            .map(|(input, &output)| ConflictNode {
                input_peer: peer(input),
                output_peer: peer(output).map(|o| inv[o]),
            })
            .collect();

        Self {
            nodes,
            colors: vec![None; n],
            /* The last output is always fed by the lower sub-network */
            anchor: inv[n - 1],
        }
    }

    /// Assigns `subnet` to `start` and alternates along its chain. On a
    /// contradiction returns the offending node.
    fn propagate(&mut self, start: usize, subnet: Subnet) -> Result<(), usize> {
        let mut stack = vec![(start, subnet)];

        while let Some((node, subnet)) = stack.pop() {
            match self.colors[node] {
                Some(color) if color == subnet => continue,
                Some(_) => return Err(node),
                None => (),
            }
            self.colors[node] = Some(subnet);

            let links = &self.nodes[node];
            for peer in [links.input_peer, links.output_peer].into_iter().flatten() {
                stack.push((peer, subnet.other()));
            }
        }

        Ok(())
    }

    /// 2-colors the graph. Constrained chains go first. Every other chain
    /// starts at its lowest input switch, whose upper input is sent to the
    /// upper sub-network (the switch is left straight).
    pub fn color(mut self) -> Result<Vec<Subnet>, usize> {
        let n = self.nodes.len();

        self.propagate(self.anchor, Subnet::Lower)?;
        if n % 2 == 1 {
            /* Unmatched input goes to the larger (lower) sub-network */
            self.propagate(n - 1, Subnet::Lower)?;
        }
        for j in 0 .. n / 2 {
            if self.colors[2 * j].is_none() {
                self.propagate(2 * j, Subnet::Upper)?;
            }
        }

        self.colors.iter()
            .enumerate()
            .map(|(node, color)| color.ok_or(node))
            .collect()
    }
}
