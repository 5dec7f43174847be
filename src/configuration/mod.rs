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

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize, Serializer, ser::SerializeSeq};

use crate::error::{Error, Result};
use crate::topology::Topology;

/// Absolute address of a switch: its stage and its position within the stage,
/// counted from the top of the network.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct SwitchId {
    pub stage: usize,
    pub position: usize,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    /// Upper input to upper output, lower input to lower output.
    Straight,
    /// Inputs swapped.
    Cross,
}

impl SwitchState {
    /// Output port (0 - upper, 1 - lower) taken by a signal entering on `port`.
    pub fn output_port(self, port: usize) -> usize {
        match self {
            Self::Straight => port,
            Self::Cross => port ^ 1,
        }
    }
}

impl std::fmt::Display for SwitchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Straight => write!(f, "STRAIGHT"),
            Self::Cross => write!(f, "CROSS"),
        }
    }
}

/// One `(stage, position, state)` triple of a serialized configuration.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SwitchSetting {
    pub stage: usize,
    pub position: usize,
    pub state: SwitchState,
}

/// Settings of all switches of a network, ordered by stage, then by position.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct RoutingConfiguration {
    settings: BTreeMap<SwitchId, SwitchState>,
}

impl RoutingConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SwitchId) -> Option<SwitchState> {
        self.settings.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    pub fn iter<'s>(&'s self) -> impl Iterator<Item = (SwitchId, SwitchState)> + 's {
        self.settings.iter().map(|(id, state)| (*id, *state))
    }

    pub fn settings<'s>(&'s self) -> impl Iterator<Item = SwitchSetting> + 's {
        self.iter().map(|(id, state)| SwitchSetting {
            stage: id.stage,
            position: id.position,
            state,
        })
    }

    /// Checks that every switch of `topology` has a setting and nothing else does.
    pub fn check_complete_for(&self, topology: &Topology) -> Result<()> {
        for (id, _) in topology.switches() {
            if !self.settings.contains_key(&id) {
                return Err(Error::IncompleteConfiguration {
                    stage: id.stage,
                    position: id.position
                });
            }
        }
        if self.len() != topology.switch_count() {
            let stray = self.settings.keys()
                .find(|id| topology.line_of(**id).is_none())
                .copied()
                .unwrap_or(SwitchId { stage: 0, position: 0 });
            return Err(Error::IncompleteConfiguration {
                stage: stray.stage,
                position: stray.position
            });
        }
        Ok(())
    }

    pub fn is_complete_for(&self, topology: &Topology) -> bool {
        self.check_complete_for(topology).is_ok()
    }
}

impl Serialize for RoutingConfiguration {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> where
        S: Serializer
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for setting in self.settings() {
            seq.serialize_element(&setting)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for RoutingConfiguration {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error> where
        D: serde::Deserializer<'de>
    {
        let list = Vec::<SwitchSetting>::deserialize(deserializer)?;
        let mut assembler = ConfigurationAssembler::new(&[]);
        for s in list {
            assembler.assign(SwitchId { stage: s.stage, position: s.position }, s.state)
                .map_err(serde::de::Error::custom)?;
        }
        Ok(assembler.finish())
    }
}

/// Collects switch settings coming from different recursion levels and
/// rejects any switch claimed twice.
pub struct ConfigurationAssembler<'p> {
    permutation: &'p [usize],
    settings: BTreeMap<SwitchId, SwitchState>,
}

impl<'p> ConfigurationAssembler<'p> {
    /// `permutation` is only kept for error reports.
    pub fn new(permutation: &'p [usize]) -> Self {
        Self { permutation, settings: BTreeMap::new() }
    }

    pub fn assign(&mut self, id: SwitchId, state: SwitchState) -> Result<()> {
        match self.settings.entry(id) {
            Entry::Occupied(_) => Err(Error::DuplicateAssignment {
                stage: id.stage,
                position: id.position,
                permutation: self.permutation.to_vec(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(state);
                Ok(())
            }
        }
    }

    pub fn absorb(&mut self, config: RoutingConfiguration) -> Result<()> {
        if self.settings.is_empty() {
            self.settings = config.settings;
            return Ok(());
        }
        for (id, state) in config.settings {
            self.assign(id, state)?;
        }
        Ok(())
    }

    pub fn finish(self) -> RoutingConfiguration {
        RoutingConfiguration { settings: self.settings }
    }
}

/// Merges already stage-shifted configurations of one recursion level into
/// one flat configuration.
pub fn merge<I>(levels: I, permutation: &[usize]) -> Result<RoutingConfiguration> where
    I: IntoIterator<Item = RoutingConfiguration>
{
    let mut assembler = ConfigurationAssembler::new(permutation);
    for level in levels {
        assembler.absorb(level)?;
    }
    Ok(assembler.finish())
}
