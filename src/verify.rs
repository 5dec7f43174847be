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

use std::sync::Arc;
use std::thread;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::common::split_range_nicely;
use crate::error::Result;
use crate::exporter::VerifyReport;
#[allow(unused)]
use crate::log::*;
use crate::permutation::Permutation;
use crate::router::Router;
use crate::simulator::simulate;

/// Permutation used by trial `trial` of a batch seeded with `seed`. Does not
/// depend on how trials are split between threads.
pub fn trial_permutation(size: usize, seed: u64, trial: usize) -> Permutation {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(trial as u64));
    Permutation::random(size, &mut rng)
}

/// Routes a single trial and checks the result by simulation. Returns a
/// description of the failure, if any.
fn check_trial(router: &Router, size: usize, seed: u64, trial: usize) -> Option<String> {
    let perm = trial_permutation(size, seed, trial);

    let outcome = router.route(&perm).and_then(|config| {
        let realized = simulate(router.topology(), &config)?;
        Ok((config, realized))
    });

    match outcome {
        Ok((config, realized)) if realized == perm.as_slice() => {
            if config.len() == router.topology().switch_count() {
                None
            } else {
                Some(format!("trial {}: {} switches set", trial, config.len()))
            }
        },
        Ok((_, realized)) => Some(format!(
            "trial {}: routed {:?}, network realizes {:?}", trial, perm.as_slice(), realized
        )),
        Err(e) => Some(format!("trial {}: {}", trial, e)),
    }
}

fn check_range(router: &Router, size: usize, seed: u64, range: std::ops::Range<usize>)
    -> Vec<String>
{
    dbg_log!(DBG_EXTRA, "Verifying trials {:?}", range);
    range.filter_map(|trial| check_trial(router, size, seed, trial)).collect()
}

/// Routes `trials` random permutations of `size` ports on `threads` threads and
/// checks each one by simulation.
pub fn verify_random(size: usize, trials: usize, seed: u64, threads: usize)
    -> Result<VerifyReport>
{
    let router = Arc::new(Router::new(size)?);

    let mut failures = Vec::new();
    if threads <= 1 {
        failures = check_range(&router, size, seed, 0 .. trials);
    } else {
        let mut handles = Vec::new();
        for range in split_range_nicely(0 .. trials, threads) {
            let router = Arc::clone(&router);
            let handle = thread::spawn(move || {
                check_range(&router, size, seed, range)
            });
            handles.push(handle);
        }
        for handle in handles {
            let part = handle.join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            failures.extend(part);
        }
    }

    for failure in &failures {
        dbg_log!(DBG_CRITICAL, "{}", failure);
    }

    Ok(VerifyReport {
        size,
        trials,
        passed: trials - failures.len(),
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_passes() {
        for size in [1, 2, 3, 8, 13] {
            let report = verify_random(size, 20, 7, 1).unwrap();
            assert_eq!(report.passed, 20, "{:?}", report.failures);
        }
    }

    #[test]
    fn test_verify_multithreaded() {
        let report = verify_random(24, 40, 11, 3).unwrap();
        assert_eq!(report.trials, 40);
        assert_eq!(report.passed, 40, "{:?}", report.failures);
    }

    #[test]
    fn test_trial_permutations_are_reproducible() {
        assert_eq!(trial_permutation(16, 5, 3), trial_permutation(16, 5, 3));
    }

    #[test]
    fn test_unsupported_size() {
        assert!(matches!(
            verify_random(0, 1, 0, 1),
            Err(crate::error::Error::UnsupportedSize(0))
        ));
    }
}
