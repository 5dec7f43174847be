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

use std::process::ExitCode;
use std::time::Instant;

use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use mcenoc_route::dbg_log;
use mcenoc_route::dot_exporter::NetworkDotExporter;
use mcenoc_route::error::{Error, Result};
use mcenoc_route::exporter::*;
#[allow(unused)]
use mcenoc_route::log::*;
use mcenoc_route::permutation::{Permutation, parse_pair};
use mcenoc_route::router::Router;
use mcenoc_route::simulator::route_bits;
use mcenoc_route::{loader, verify};

#[derive(Parser, Debug)]
#[command(
    author = "Antmicro",
    version = "0.1.0",
    about = "MCENoC Static Router - switch settings for Waksman permutation networks",
    long_about = None
)]
struct Args {
    #[command(subcommand)]
    command: SubCommands,
}

#[derive(Parser, Debug)]
struct RouteCmd {
    #[arg(help = "Number of network ports")]
    size: usize,
    #[arg(
        help = "Routes as src--dst pairs (up to <SIZE> of them). No repeated src or dst. \
                Unlisted sources are completed in order. Randomly generated by default"
    )]
    routes: Vec<String>,
    #[arg(short, long, help = "Read the permutation from a .json/.yaml(.gz) file")]
    input: Option<String>,
    #[arg(long, help = "Seed for the random permutation")]
    seed: Option<u64>,
    #[arg(short, long, value_enum, default_value = "text", help = "Output format")]
    format: OutputFormat,
    #[arg(short, long, help = "Output file (stdout by default, .gz to compress)")]
    output: Option<String>,
    #[arg(short, long, help = "Print routing bits for each port")]
    print: bool,
    #[arg(
        long,
        help = "Export the configured network to a graphviz .dot file \
                (`-` for stdout, only together with --output)"
    )]
    dot: Option<String>,
    #[arg(
        long,
        default_value = "1",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..),
        help = "Number of threads used for routing"
    )]
    threads: usize,
}

#[derive(Parser, Debug)]
struct VerifyCmd {
    #[arg(help = "Number of network ports")]
    size: usize,
    #[arg(long, default_value = "100", help = "Number of random permutations")]
    trials: usize,
    #[arg(long, default_value = "0", help = "Seed of the first permutation")]
    seed: u64,
    #[arg(short, long, value_enum, default_value = "text", help = "Output format")]
    format: OutputFormat,
    #[arg(
        long,
        default_value = "1",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..),
        help = "Number of threads"
    )]
    threads: usize,
}

#[derive(Subcommand, Debug)]
enum SubCommands {
    /// Route a single permutation
    Route(RouteCmd),
    /// Route random permutations and check them by simulation
    Verify(VerifyCmd),
}

fn requested_permutation(args: &RouteCmd) -> Result<Permutation> {
    if let Some(input) = &args.input {
        if !args.routes.is_empty() {
            return Err(Error::Parse("routes given together with --input".into()));
        }
        return loader::open(input, Some(args.size));
    }

    if !args.routes.is_empty() {
        let pairs = args.routes.iter()
            .map(|r| parse_pair(r))
            .collect::<Result<Vec<_>>>()?;
        return Permutation::from_pairs(args.size, &pairs);
    }

    eprintln!("No route given. Generating random route");
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Ok(Permutation::random(args.size, &mut rng))
}

/// Stdout may carry either the report or the DOT description, not both.
fn dot_target(args: &RouteCmd) -> Result<Option<Target>> {
    let dot = match args.dot.as_deref() {
        Some(dot) => Target::from_arg(Some(dot)),
        None => return Ok(None),
    };
    let report = Target::from_arg(args.output.as_deref());
    if let (Target::Stdout, Target::Stdout) = (&dot, &report) {
        return Err(Error::Parse(
            "--dot - needs the report redirected with --output".into()
        ));
    }
    Ok(Some(dot))
}

fn route(args: RouteCmd) -> Result<()> {
    let router = Router::new(args.size)?;
    let dot_target = dot_target(&args)?;
    let perm = requested_permutation(&args)?;

    let start = Instant::now();
    let config = router.route_parallel(&perm, args.threads)?;
    eprintln!("Routed permutation in {:.4} seconds", start.elapsed().as_secs_f64());

    dbg_log!(DBG_INFO, "{} switch settings", config.len());

    let mut dot_exporter = RawExporter::new(dot_target);
    dot_exporter.ignore_or_export("waksman", || {
        NetworkDotExporter::new(router.topology(), Some(&config)).export_dot("waksman")
    })?;
    <RawExporter as Exporter<String>>::flush(&mut dot_exporter)?;

    let bits = if args.print {
        Some(route_bits(router.topology(), &config)?)
    } else {
        None
    };

    let mut report_exporter =
        ReportExporter::new(Target::from_arg(args.output.as_deref()), args.format);
    report_exporter.ignore_or_export("route", || {
        RoutingReport::new(router.topology(), &perm, config, bits)
    })?;
    report_exporter.flush()?;

    Ok(())
}

fn verify(args: VerifyCmd) -> Result<bool> {
    let start = Instant::now();
    let report = verify::verify_random(args.size, args.trials, args.seed, args.threads)?;
    eprintln!(
        "Verified {} permutations in {:.4} seconds",
        args.trials, start.elapsed().as_secs_f64()
    );

    let ok = report.failures.is_empty();
    let mut exporter = ReportExporter::new(Target::Stdout, args.format);
    exporter.ignore_or_export("verify", || report)?;
    exporter.flush()?;

    Ok(ok)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        SubCommands::Route(rargs) => route(rargs).map(|_| true),
        SubCommands::Verify(vargs) => verify(vargs),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route_args(argv: &[&str]) -> RouteCmd {
        let argv = ["mcenoc-route", "route"].iter().chain(argv);
        match Args::try_parse_from(argv).unwrap().command {
            SubCommands::Route(rargs) => rargs,
            c => panic!("unexpected command {:?}", c),
        }
    }

    #[test]
    fn test_zero_threads_is_a_usage_error() {
        assert!(Args::try_parse_from(["mcenoc-route", "route", "4", "--threads", "0"]).is_err());
        assert!(Args::try_parse_from(["mcenoc-route", "verify", "4", "--threads", "0"]).is_err());
        assert_eq!(route_args(&["4", "--threads", "2"]).threads, 2);
    }

    #[test]
    fn test_dot_on_stdout_needs_redirected_report() {
        let args = route_args(&["4", "--dot", "-"]);
        assert!(matches!(dot_target(&args), Err(Error::Parse(_))));

        let args = route_args(&["4", "--dot", "-", "--output", "report.json"]);
        assert!(matches!(dot_target(&args), Ok(Some(Target::Stdout))));

        let args = route_args(&["4", "--dot", "net.dot"]);
        assert!(matches!(dot_target(&args), Ok(Some(Target::File(_)))));

        assert!(matches!(dot_target(&route_args(&["4"])), Ok(None)));
    }
}
