//! Concurrency stress driver.
//!
//! Hammers the tool's shared build cache from many simultaneous invocations of the same, already warm,
//! program. The harness itself shares nothing mutable between workers: any race lives inside the tool, and
//! the driver only observes nonzero exit statuses.
//!
//! Workers run on tokio's blocking pool, so each one is a real OS thread blocked on its own child process.
//! Every worker draws from the [`InvocationPlan`] with its own `StdRng` seeded from the run seed plus its
//! index, so a failing run can be replayed with `--seed`.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};
use tokio::task::JoinSet;

use crate::assertions::{AssertionFailure, expect_status};
use crate::config::{HarnessConfig, StressConfig};
use crate::driver::{ArgumentVector, CaseDriver};
use crate::error::HarnessError;
use crate::fixture::FixtureManager;

/// Program that takes long enough for concurrent invocations to overlap.
pub const DELAY_SOURCE: &str = "void main() { import core.thread; Thread.sleep(100.msecs); }";
const DELAY_SOURCE_PATH: &str = "stress/delay_.d";

// ============================================================================
// Invocation plan
// ============================================================================

/// One way of invoking the tool against the shared target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentVariant {
    pub label: &'static str,
    pub flags: &'static [&'static str],
    pub weight: u32,
}

/// Plain runs hit the cache, forced runs rewrite it underneath them.
pub const DEFAULT_VARIANTS: [ArgumentVariant; 2] = [
    ArgumentVariant {
        label: "plain",
        flags: &[],
        weight: 1,
    },
    ArgumentVariant {
        label: "force",
        flags: &["--force"],
        weight: 1,
    },
];

/// Weighted table of variants, redrawn on every iteration.
#[derive(Debug, Clone)]
pub struct InvocationPlan {
    variants: Vec<ArgumentVariant>,
    index: WeightedIndex<u32>,
}

impl InvocationPlan {
    pub fn new(variants: &[ArgumentVariant]) -> Result<Self, HarnessError> {
        let index = WeightedIndex::new(variants.iter().map(|v| v.weight))
            .map_err(|e| HarnessError::InvalidPlan(e.to_string()))?;
        Ok(Self {
            variants: variants.to_vec(),
            index,
        })
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> &ArgumentVariant {
        &self.variants[self.index.sample(rng)]
    }
}

// ============================================================================
// Reports
// ============================================================================

/// The first failed invocation of one worker.
#[derive(Debug, Clone)]
pub struct StressFailure {
    pub worker: usize,
    pub iteration: usize,
    pub variant: &'static str,
    pub failure: AssertionFailure,
}

/// Aggregate result of a stress run.
#[derive(Debug, Clone)]
pub struct StressReport {
    pub seed: u64,
    pub workers: usize,
    /// Invocations issued by workers (the warm-up run is not counted).
    pub invocations: usize,
    pub failures: Vec<StressFailure>,
}

impl StressReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

struct WorkerOutcome {
    invocations: usize,
    failure: Option<StressFailure>,
}

// ============================================================================
// Driver
// ============================================================================

pub struct StressDriver<'a> {
    config: &'a HarnessConfig,
    stress: &'a StressConfig,
    driver: Arc<dyn CaseDriver>,
    plan: Arc<InvocationPlan>,
}

impl<'a> StressDriver<'a> {
    pub fn new(config: &'a HarnessConfig, stress: &'a StressConfig, driver: Arc<dyn CaseDriver>) -> Result<Self, HarnessError> {
        Ok(Self {
            config,
            stress,
            driver,
            plan: Arc::new(InvocationPlan::new(&DEFAULT_VARIANTS)?),
        })
    }

    pub fn with_plan(mut self, plan: InvocationPlan) -> Self {
        self.plan = Arc::new(plan);
        self
    }

    /// Warm the cache, then fan out the workers and wait for every one of them.
    #[tracing::instrument(skip_all, fields(workers = self.stress.workers, iterations = self.stress.iterations))]
    pub fn run(&self, fixtures: &FixtureManager) -> Result<StressReport, HarnessError> {
        let seed = self.stress.seed.unwrap_or_else(|| OsRng.next_u64());
        tracing::info!(seed, "stress run starting");

        let target = fixtures.file(DELAY_SOURCE_PATH, DELAY_SOURCE)?;
        let target_path = target.path().to_path_buf();
        let base = self.config.tool_args();

        let mut report = StressReport {
            seed,
            workers: self.stress.workers,
            invocations: 0,
            failures: Vec::new(),
        };

        let warm = self.driver.run(&base.clone().file(&target_path))?;
        if let Err(failure) = expect_status(&warm, 0) {
            tracing::error!("warm-up invocation failed; not starting workers");
            report.failures.push(StressFailure {
                worker: 0,
                iteration: 0,
                variant: "warm-up",
                failure,
            });
            return Ok(report);
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(HarnessError::Runtime)?;

        let outcomes = runtime.block_on(self.fan_out(seed, base, target_path))?;
        for outcome in outcomes {
            report.invocations += outcome.invocations;
            report.failures.extend(outcome.failure);
        }
        report.failures.sort_by_key(|f| f.worker);

        tracing::info!(
            invocations = report.invocations,
            failures = report.failures.len(),
            "stress run finished"
        );
        drop(target);
        Ok(report)
    }

    async fn fan_out(&self, seed: u64, base: ArgumentVector, target: PathBuf) -> Result<Vec<WorkerOutcome>, HarnessError> {
        let mut joins = JoinSet::new();
        for worker in 0..self.stress.workers {
            let driver = Arc::clone(&self.driver);
            let plan = Arc::clone(&self.plan);
            let base = base.clone();
            let target = target.clone();
            let iterations = self.stress.iterations;
            joins.spawn_blocking(move || {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(worker as u64));
                run_worker(worker, iterations, &plan, &mut rng, &base, &target, driver.as_ref())
            });
        }

        // No cancellation: a failing worker does not stop its siblings.
        let mut outcomes = Vec::with_capacity(self.stress.workers);
        while let Some(joined) = joins.join_next().await {
            outcomes.push(joined.map_err(HarnessError::WorkerJoin)?);
        }
        Ok(outcomes)
    }
}

fn run_worker(
    worker: usize,
    iterations: usize,
    plan: &InvocationPlan,
    rng: &mut StdRng,
    base: &ArgumentVector,
    target: &std::path::Path,
    driver: &dyn CaseDriver,
) -> WorkerOutcome {
    let mut outcome = WorkerOutcome {
        invocations: 0,
        failure: None,
    };

    for iteration in 0..iterations {
        let variant = plan.draw(rng);
        let argv = base.clone().args(variant.flags.iter().copied()).file(target);
        outcome.invocations += 1;

        let attempt = panic::catch_unwind(AssertUnwindSafe(|| driver.run(&argv)));
        let checked = match attempt {
            Ok(Ok(result)) => expect_status(&result, 0),
            Ok(Err(error)) => Err(AssertionFailure::standalone(format!("{argv}: {error}"))),
            Err(_) => Err(AssertionFailure::standalone(format!("{argv}: driver panicked"))),
        };

        if let Err(failure) = checked {
            tracing::error!(worker, iteration, variant = variant.label, "stress invocation failed");
            outcome.failure = Some(StressFailure {
                worker,
                iteration,
                variant: variant.label,
                failure,
            });
            break;
        }
    }

    outcome
}

// ============================================================================
// Tests
// ============================================================================
