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

//! Loading of permutation files.
//!
//! A file holds either a bare list (`[3, 0, 2, 1]`) or a map with any of
//! `size`, `permutation` and `routes` (a list of `"src--dst"` strings, missing
//! sources completed in order). JSON and YAML are recognized by extension; a
//! trailing `.gz` means the file is gzip-compressed.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::permutation::{Permutation, parse_pair};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FileFormat {
    Json,
    Yaml,
}

pub struct OpenOpts {
    pub format: FileFormat,
    pub compressed: bool,
}

impl OpenOpts {
    /// Guesses options from a file name: `*.json`, `*.yaml`, `*.yml`, each
    /// optionally followed by `.gz`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path.file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Parse(format!("file name {:?}", path)))?;

        let (name, compressed) = match name.strip_suffix(".gz") {
            Some(stem) => (stem, true),
            None => (name, false),
        };

        let format = if name.ends_with(".json") {
            FileFormat::Json
        } else if name.ends_with(".yaml") || name.ends_with(".yml") {
            FileFormat::Yaml
        } else {
            return Err(Error::Parse(format!(
                "file {:?}: unknown format, expected .json or .yaml", path
            )));
        };

        Ok(Self { format, compressed })
    }
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum PermutationFile {
    List(Vec<usize>),
    Spec {
        size: Option<usize>,
        permutation: Option<Vec<usize>>,
        #[serde(default)]
        routes: Vec<String>,
    },
}

impl PermutationFile {
    fn into_permutation(self, size: Option<usize>) -> Result<Permutation> {
        match self {
            Self::List(list) => {
                let size = size.unwrap_or(list.len());
                Permutation::validate(list, size)
            },
            Self::Spec { size: file_size, permutation, routes } => {
                let size = match (size, file_size) {
                    (Some(a), Some(b)) if a != b => return Err(Error::InvalidPermutation(
                        format!("file describes {} ports, network has {}", b, a)
                    )),
                    (Some(s), _) | (None, Some(s)) => Some(s),
                    (None, None) => None,
                };

                match permutation {
                    Some(list) => {
                        if !routes.is_empty() {
                            return Err(Error::Parse(
                                "both `permutation` and `routes` given".into()
                            ));
                        }
                        let size = size.unwrap_or(list.len());
                        Permutation::validate(list, size)
                    },
                    None => {
                        let size = size.ok_or_else(|| Error::Parse(
                            "`routes` need an explicit `size`".into()
                        ))?;
                        let pairs = routes.iter()
                            .map(|r| parse_pair(r))
                            .collect::<Result<Vec<_>>>()?;
                        Permutation::from_pairs(size, &pairs)
                    },
                }
            },
        }
    }
}

fn parse_file<R>(reader: R, format: FileFormat) -> Result<PermutationFile> where
    R: Read
{
    let reader = BufReader::new(reader);
    match format {
        FileFormat::Json => serde_json::from_reader(reader)
            .map_err(|e| Error::Parse(format!("JSON permutation: {}", e))),
        FileFormat::Yaml => serde_yaml::from_reader(reader)
            .map_err(|e| Error::Parse(format!("YAML permutation: {}", e))),
    }
}

/// Reads a permutation from `reader`. `size`, if given, must match the file.
pub fn read_permutation<R>(reader: R, opts: &OpenOpts, size: Option<usize>)
    -> Result<Permutation>
where
    R: Read
{
    let file = if opts.compressed {
        parse_file(GzDecoder::new(reader), opts.format)?
    } else {
        parse_file(reader, opts.format)?
    };

    file.into_permutation(size)
}

pub fn open<P>(path: P, size: Option<usize>) -> Result<Permutation> where
    P: AsRef<Path>
{
    let path = path.as_ref();
    let opts = OpenOpts::from_path(path)?;
    let file = File::open(path)?;
    read_permutation(file, &opts, size)
}
