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

//! Structure of arbitrary-size Waksman networks.
//!
//! A network of size `n >= 3` is a [`Block`] made of an input stage, two
//! interleaved sub-networks (upper of size `n / 2`, lower of size
//! `n - n / 2`) and an output stage:
//!
//! * input switch `j` sits on lines `2j, 2j + 1`. Its upper output feeds line
//!   `j` of the upper sub-network, its lower output line `j` of the lower one.
//!   For odd `n` the last input has no switch and feeds the last line of the
//!   lower sub-network.
//! * output switch `k` takes line `k` of both sub-networks. For even `n` the
//!   last output pair has no switch (it would always be set straight), for odd
//!   `n` the last output is fed directly by the lower sub-network.
//!
//! Lines are numbered from the top of the network. A sub-network shallower
//! than its sibling passes its lines straight through the remaining stages.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use crate::configuration::SwitchId;
use crate::error::{Error, Result};
#[allow(unused)]
use crate::log::*;

#[derive(Debug)]
pub struct Block {
    pub size: usize,
    /// Number of stages spanned by the block.
    pub depth: usize,
    /// Number of switches in the block, sub-networks included.
    pub switch_count: usize,
    pub upper: Option<Arc<Block>>,
    pub lower: Option<Arc<Block>>,
}

impl Block {
    pub fn half(&self) -> usize {
        self.size / 2
    }

    pub fn input_switches(&self) -> usize {
        self.size / 2
    }

    pub fn output_switches(&self) -> usize {
        match self.size {
            0 ..= 2 => 0,
            n if n % 2 == 0 => n / 2 - 1,
            n => n / 2,
        }
    }

    /// Stage of the output switches relative to the block's first stage.
    pub fn output_stage(&self) -> usize {
        self.depth.saturating_sub(1)
    }
}

/// Builds [`Block`]s, sharing sub-networks of equal size.
#[derive(Default)]
pub struct TopologyBuilder {
    cache: HashMap<usize, Arc<Block>>,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(&mut self, size: usize) -> Result<Arc<Block>> {
        if size < 1 {
            return Err(Error::UnsupportedSize(size));
        }
        if let Some(block) = self.cache.get(&size) {
            return Ok(Arc::clone(block));
        }

        let block = match size {
            1 => Block { size, depth: 0, switch_count: 0, upper: None, lower: None },
            2 => Block { size, depth: 1, switch_count: 1, upper: None, lower: None },
            _ => {
                let upper = self.build(size / 2)?;
                let lower = self.build(size - size / 2)?;
                let mut block = Block {
                    size,
                    depth: 2 + lower.depth,
                    switch_count: upper.switch_count + lower.switch_count,
                    upper: Some(upper),
                    lower: Some(lower),
                };
                block.switch_count += block.input_switches() + block.output_switches();
                block
            }
        };

        let block = Arc::new(block);
        self.cache.insert(size, Arc::clone(&block));
        Ok(block)
    }
}

/// Flattened network: switch placement per stage and line links between
/// consecutive stages.
#[derive(Debug)]
pub struct Topology {
    root: Arc<Block>,
    /* First line of every switch, per stage, sorted. Index in the list is the
     * position of the switch. */
    stages: Vec<Vec<usize>>,
    /* links[g][l] is the line at the input of stage g + 1 connected to line l
     * at the output of stage g */
    links: Vec<Vec<usize>>,
}

impl Topology {
    pub fn build(size: usize) -> Result<Self> {
        Self::build_with(&mut TopologyBuilder::new(), size)
    }

    pub fn build_with(builder: &mut TopologyBuilder, size: usize) -> Result<Self> {
        let root = builder.build(size)?;
        let gaps = root.depth.saturating_sub(1);

        let mut me = Self {
            stages: vec![Vec::new(); root.depth],
            links: (0 .. gaps).map(|_| (0 .. size).collect()).collect(),
            root: Arc::clone(&root),
        };
        me.place(&root, 0, 0);
        for stage in &mut me.stages {
            stage.sort_unstable();
        }

        dbg_log!(
            DBG_INFO,
            "Built Waksman network of size {}: {} stages, {} switches",
            size, me.stage_count(), me.switch_count()
        );

        Ok(me)
    }

    fn place(&mut self, block: &Block, stage: usize, base: usize) {
        let n = block.size;
        let h = block.half();

        if n == 2 {
            self.stages[stage].push(base);
        }
        if n < 3 {
            return;
        }

        for j in 0 .. block.input_switches() {
            self.stages[stage].push(base + 2 * j);
        }
        let out_stage = stage + block.output_stage();
        for k in 0 .. block.output_switches() {
            self.stages[out_stage].push(base + 2 * k);
        }

        /* Unshuffle after the input stage, shuffle before the output stage */
        for l in 0 .. n {
            let to_sub = if l < 2 * h { (l % 2) * h + l / 2 } else { l };
            self.links[stage][base + l] = base + to_sub;

            let from_sub = if l < h {
                2 * l
            } else if l - h < h {
                2 * (l - h) + 1
            } else {
                l
            };
            self.links[out_stage - 1][base + l] = base + from_sub;
        }

        if let Some(upper) = &block.upper {
            self.place(upper, stage + 1, base);
        }
        if let Some(lower) = &block.lower {
            self.place(lower, stage + 1, base + h);
        }
    }

    pub fn root(&self) -> &Arc<Block> {
        &self.root
    }

    pub fn size(&self) -> usize {
        self.root.size
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn switch_count(&self) -> usize {
        self.root.switch_count
    }

    pub fn switches_in_stage(&self, stage: usize) -> usize {
        self.stages.get(stage).map(|s| s.len()).unwrap_or(0)
    }

    /// All switches, ordered by stage and position, with their first line.
    pub fn switches<'s>(&'s self) -> impl Iterator<Item = (SwitchId, usize)> + 's {
        self.stages.iter()
            .enumerate()
            .flat_map(|(stage, lines)| {
                lines.iter()
                    .enumerate()
                    .map(move |(position, line)| (SwitchId { stage, position }, *line))
            })
    }

    /// Position of the switch whose upper port is on `line` in `stage`.
    pub fn position_of(&self, stage: usize, line: usize) -> Option<usize> {
        self.stages.get(stage)?.binary_search(&line).ok()
    }

    /// Switch whose upper or lower port is on `line` in `stage`, with the port.
    pub fn switch_on_line(&self, stage: usize, line: usize) -> Option<(SwitchId, usize)> {
        let lines = self.stages.get(stage)?;
        let position = match lines.binary_search(&line) {
            Ok(position) => return Some((SwitchId { stage, position }, 0)),
            Err(0) => return None,
            Err(next) => next - 1,
        };
        if lines[position] + 1 == line {
            Some((SwitchId { stage, position }, 1))
        } else {
            None
        }
    }

    pub fn line_of(&self, id: SwitchId) -> Option<usize> {
        self.stages.get(id.stage)?.get(id.position).copied()
    }

    /// Line entering stage `gap + 1` that is driven by `line` leaving stage `gap`.
    pub fn link(&self, gap: usize, line: usize) -> usize {
        self.links[gap][line]
    }
}
