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

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;

use crate::configuration::RoutingConfiguration;
use crate::permutation::Permutation;
use crate::simulator::Trace;
use crate::topology::Topology;

pub trait AsBytes {
    fn as_bytes<'s>(&'s self) -> &'s [u8];
}

impl AsBytes for String {
    fn as_bytes<'s>(&'s self) -> &'s [u8] {
        String::as_bytes(self)
    }
}

impl AsBytes for str {
    fn as_bytes<'s>(&'s self) -> &'s [u8] {
        str::as_bytes(self)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// Where exported data goes. Files ending with `.gz` are gzip-compressed.
#[derive(Clone, Debug)]
pub enum Target {
    Stdout,
    File(PathBuf),
}

impl Target {
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None | Some("-") => Self::Stdout,
            Some(path) => Self::File(path.into()),
        }
    }

    fn write_all(&self, data: &[u8]) -> std::io::Result<()> {
        match self {
            Self::Stdout => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                lock.write_all(data)?;
                lock.flush()
            },
            Self::File(path) => {
                let file = BufWriter::new(File::create(path)?);
                if path.extension().map(|e| e == "gz").unwrap_or(false) {
                    let mut enc = GzEncoder::new(file, Compression::default());
                    enc.write_all(data)?;
                    enc.finish()?.flush()
                } else {
                    let mut file = file;
                    file.write_all(data)?;
                    file.flush()
                }
            },
        }
    }
}

pub trait Exporter<D> {
    /// Produces and exports `D` only if this exporter is enabled.
    fn ignore_or_export<'s, F>(&'s mut self, name: &str, exporter: F)
        -> std::io::Result<()>
    where
        F: FnOnce() -> D + 's;

    fn flush(&mut self) -> std::io::Result<()>;
}

/// Writes raw data (for example a DOT description) as soon as it is exported.
pub struct RawExporter {
    target: Option<Target>,
}

impl RawExporter {
    pub fn new(target: Option<Target>) -> Self {
        Self { target }
    }
}

impl<D> Exporter<D> for RawExporter where D: AsBytes {
    fn ignore_or_export<'s, F>(&'s mut self, _name: &str, exporter: F)
        -> std::io::Result<()>
    where
        F: FnOnce() -> D + 's
    {
        if let Some(target) = &self.target {
            let data = exporter();
            return target.write_all(data.as_bytes());
        }
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Human-readable rendering of a report.
pub trait TextReport {
    fn write_text(&self, out: &mut String);
}

/// Gathers named reports and writes them together on `flush`.
pub struct ReportExporter<D> where D: Serialize + TextReport {
    target: Target,
    format: OutputFormat,
    data: Vec<(String, D)>,
}

impl<D> ReportExporter<D> where D: Serialize + TextReport {
    pub fn new(target: Target, format: OutputFormat) -> Self {
        Self { target, format, data: Vec::new() }
    }

    pub fn render(&self) -> std::io::Result<String> {
        let to_io = |e: String| std::io::Error::new(std::io::ErrorKind::InvalidData, e);

        /* A single report is written bare, several as a map keyed by name */
        match self.format {
            OutputFormat::Text => {
                let mut out = String::new();
                for (name, report) in &self.data {
                    if self.data.len() > 1 {
                        out += &format!("== {} ==\n", name);
                    }
                    report.write_text(&mut out);
                }
                Ok(out)
            },
            OutputFormat::Json => {
                let out = match self.data.as_slice() {
                    [(_, report)] => serde_json::to_string_pretty(report),
                    _ => serde_json::to_string_pretty(&self.named()),
                };
                let mut out = out.map_err(|e| to_io(e.to_string()))?;
                out.push('\n');
                Ok(out)
            },
            OutputFormat::Yaml => {
                let out = match self.data.as_slice() {
                    [(_, report)] => serde_yaml::to_string(report),
                    _ => serde_yaml::to_string(&self.named()),
                };
                out.map_err(|e| to_io(e.to_string()))
            },
        }
    }

    fn named(&self) -> std::collections::BTreeMap<&str, &D> {
        self.data.iter().map(|(name, report)| (name.as_str(), report)).collect()
    }
}

impl<D> Exporter<D> for ReportExporter<D> where D: Serialize + TextReport {
    fn ignore_or_export<'s, F>(&'s mut self, name: &str, exporter: F)
        -> std::io::Result<()>
    where
        F: FnOnce() -> D + 's
    {
        self.data.push((name.into(), exporter()));
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if self.data.is_empty() {
            return Ok(());
        }
        let out = self.render()?;
        self.target.write_all(out.as_bytes())?;
        self.data.clear();
        Ok(())
    }
}

/// Everything known about one routed permutation.
#[derive(Serialize)]
pub struct RoutingReport {
    pub size: usize,
    pub stages: usize,
    pub switches: usize,
    pub permutation: Vec<usize>,
    pub configuration: RoutingConfiguration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_bits: Option<Vec<Trace>>,
}

impl RoutingReport {
    pub fn new(
        topology: &Topology,
        permutation: &Permutation,
        configuration: RoutingConfiguration,
        route_bits: Option<Vec<Trace>>,
    ) -> Self {
        Self {
            size: topology.size(),
            stages: topology.stage_count(),
            switches: topology.switch_count(),
            permutation: permutation.as_slice().to_vec(),
            configuration,
            route_bits,
        }
    }
}

impl TextReport for RoutingReport {
    fn write_text(&self, out: &mut String) {
        out.push_str(&format!(
            "Network: {} ports, {} stages, {} switches\n",
            self.size, self.stages, self.switches
        ));
        out.push_str("Route:");
        for (src, dst) in self.permutation.iter().enumerate() {
            out.push_str(&format!(" {}--{}", src, dst));
        }
        out.push('\n');

        out.push_str("Switch settings (stage, position, state):\n");
        for s in self.configuration.settings() {
            out.push_str(&format!("    {:>3} {:>4}  {}\n", s.stage, s.position, s.state));
        }

        if let Some(bits) = &self.route_bits {
            out.push_str("Route bits per port:\n");
            for t in bits {
                let bits: String = t.bits.iter().map(|b| if *b == 0 { '0' } else { '1' }).collect();
                out.push_str(&format!("    {:>4} -> {:<4} {}\n", t.input, t.output, bits));
            }
        }
    }
}

/// Summary of a batch of randomly generated permutations checked by simulation.
#[derive(Serialize)]
pub struct VerifyReport {
    pub size: usize,
    pub trials: usize,
    pub passed: usize,
    pub failures: Vec<String>,
}

impl TextReport for VerifyReport {
    fn write_text(&self, out: &mut String) {
        out.push_str(&format!(
            "Verified {}/{} random permutations of size {}\n",
            self.passed, self.trials, self.size
        ));
        for failure in &self.failures {
            out.push_str(&format!("    FAILED: {}\n", failure));
        }
    }
}
