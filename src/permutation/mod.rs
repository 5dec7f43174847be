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


use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A bijection of network inputs onto network outputs. `map[i]` is the output
/// reached by input `i`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Permutation {
    map: Vec<usize>,
    #[serde(skip)]
    inv: Vec<usize>,
}

impl Permutation {
    /// Validates `sequence` as a permutation of a network with `size` ports.
    pub fn validate(sequence: Vec<usize>, size: usize) -> Result<Self> {
        if sequence.is_empty() {
            return Err(Error::InvalidPermutation("empty sequence".into()));
        }
        if sequence.len() != size {
            return Err(Error::InvalidPermutation(format!(
                "sequence has {} entries, network has {} ports",
                sequence.len(), size
            )));
        }

        let mut inv = vec![usize::MAX; size];
        for (src, &dst) in sequence.iter().enumerate() {
            if dst >= size {
                return Err(Error::InvalidPermutation(format!(
                    "value {} outside node range [0, {})", dst, size
                )));
            }
            if inv[dst] != usize::MAX {
                return Err(Error::InvalidPermutation(format!(
                    "duplicate value {} (inputs {} and {})", dst, inv[dst], src
                )));
            }
            inv[dst] = src;
        }

        Ok(Self { map: sequence, inv })
    }

    pub fn new(sequence: Vec<usize>) -> Result<Self> {
        let size = sequence.len();
        Self::validate(sequence, size)
    }

    pub fn identity(size: usize) -> Self {
        let map: Vec<usize> = (0 .. size).collect();
        Self { inv: map.clone(), map }
    }

    pub fn random<R>(size: usize, rng: &mut R) -> Self where R: Rng + ?Sized {
        let mut map: Vec<usize> = (0 .. size).collect();
        map.shuffle(rng);
        let mut inv = vec![0; size];
        for (src, &dst) in map.iter().enumerate() {
            inv[dst] = src;
        }
        Self { map, inv }
    }

    /// Builds a permutation out of `src--dst` pairs. Sources which are not
    /// mentioned get the unused destinations, both taken in increasing order.
    pub fn from_pairs(size: usize, pairs: &[(usize, usize)]) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidPermutation("empty sequence".into()));
        }

        let mut map = vec![None; size];
        let mut dst_used = vec![false; size];
        for &(src, dst) in pairs {
            for v in [src, dst] {
                if v >= size {
                    return Err(Error::InvalidPermutation(format!(
                        "value {} outside node range [0, {})", v, size
                    )));
                }
            }
            if map[src].is_some() {
                return Err(Error::InvalidPermutation(format!("duplicate source {}", src)));
            }
            if dst_used[dst] {
                return Err(Error::InvalidPermutation(format!("duplicate destination {}", dst)));
            }
            map[src] = Some(dst);
            dst_used[dst] = true;
        }

        let mut free_dsts = dst_used.iter()
            .enumerate()
            .filter(|(_, used)| !**used)
            .map(|(dst, _)| dst);

        let sequence = map.into_iter()
            .map(|dst| match dst {
                Some(dst) => dst,
                /* Counts of free sources and free destinations always match */
                None => free_dsts.next().unwrap_or(usize::MAX),
            })
            .collect();

        Self::validate(sequence, size)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn get(&self, input: usize) -> usize {
        self.map[input]
    }

    pub fn inverse_of(&self, output: usize) -> usize {
        self.inv[output]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.map
    }

    pub fn is_identity(&self) -> bool {
        self.map.iter().enumerate().all(|(src, &dst)| src == dst)
    }

    pub fn pairs<'s>(&'s self) -> impl Iterator<Item = (usize, usize)> + 's {
        self.map.iter().copied().enumerate()
    }
}

impl<'de> Deserialize<'de> for Permutation {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error> where
        D: serde::Deserializer<'de>
    {
        #[derive(Deserialize)]
        struct Raw {
            map: Vec<usize>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.map).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Permutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (idx, (src, dst)) in self.pairs().enumerate() {
            if idx != 0 {
                write!(f, " ")?;
            }
            write!(f, "{}--{}", src, dst)?;
        }
        Ok(())
    }
}

fn parse_port_id(s: &str) -> Result<usize> {
    let s = s.trim();
    let (digits, radix) = match s.get(.. 2) {
        Some("0x") | Some("0X") => (&s[2 ..], 16),
        Some("0o") | Some("0O") => (&s[2 ..], 8),
        Some("0b") | Some("0B") => (&s[2 ..], 2),
        _ => (s, 10),
    };
    usize::from_str_radix(digits, radix)
        .map_err(|e| Error::Parse(format!("port id {:?}: {}", s, e)))
}

/// Parses a `src--dst` route request. Ids may be written in decimal,
/// hexadecimal (`0x`), octal (`0o`) or binary (`0b`).
pub fn parse_pair(s: &str) -> Result<(usize, usize)> {
    let (src, dst) = s.split_once("--")
        .ok_or_else(|| Error::Parse(format!("route {:?}, expected src--dst", s)))?;

    Ok((parse_port_id(src)?, parse_port_id(dst)?))
}
