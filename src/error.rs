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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Input is not a bijection on `[0, N)` or its size does not match.
    #[error("InvalidPermutationError: {0}")]
    InvalidPermutation(String),

    #[error("UnsupportedSizeError: network size {0} is not supported (need N >= 1)")]
    UnsupportedSize(usize),

    /// The conflict graph could not be 2-colored. Never happens for a
    /// validated bijection.
    #[error(
        "InconsistentRoutingError: coloring contradiction at stage {stage}, \
         switch {position} while routing {permutation:?}"
    )]
    InconsistentRouting {
        stage: usize,
        position: usize,
        permutation: Vec<usize>,
    },

    /// Two parts of the router claimed the same switch.
    #[error(
        "DuplicateAssignmentError: switch (stage {stage}, position {position}) \
         assigned twice while routing {permutation:?}"
    )]
    DuplicateAssignment {
        stage: usize,
        position: usize,
        permutation: Vec<usize>,
    },

    #[error("configuration has no setting for switch (stage {stage}, position {position})")]
    IncompleteConfiguration { stage: usize, position: usize },

    #[error("could not parse {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
