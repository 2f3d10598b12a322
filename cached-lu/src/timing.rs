use std::{
    fmt,
    time::{Duration, Instant},
};

/// The three phases of a solve that get timed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Building the dense Jacobian.
    Assembly,
    /// Decomposing it.
    Factorization,
    /// Triangular solves against the cached decomposition.
    Solve,
}

impl fmt::Display for Phase {
    #[mutants::skip]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Assembly => "assembly",
            Phase::Factorization => "factorization",
            Phase::Solve => "solve",
        })
    }
}

/// Accumulated time and call counts per phase.
/// Only ever grows; a fresh solver starts from zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timings {
    assembly: Duration,
    factorization: Duration,
    solve: Duration,
    assemblies: usize,
    factorizations: usize,
    solves: usize,
}

impl Timings {
    /// Total wall-clock time spent in this phase.
    pub fn elapsed(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Assembly => self.assembly,
            Phase::Factorization => self.factorization,
            Phase::Solve => self.solve,
        }
    }

    /// How many times this phase ran.
    /// For [`Phase::Solve`] that's once per right-hand side.
    pub fn count(&self, phase: Phase) -> usize {
        match phase {
            Phase::Assembly => self.assemblies,
            Phase::Factorization => self.factorizations,
            Phase::Solve => self.solves,
        }
    }

    /// Time spent across all phases.
    pub fn total(&self) -> Duration {
        self.assembly + self.factorization + self.solve
    }

    pub(crate) fn record(&mut self, phase: Phase, runs: usize, elapsed: Option<Duration>) {
        let (time, count) = match phase {
            Phase::Assembly => (&mut self.assembly, &mut self.assemblies),
            Phase::Factorization => (&mut self.factorization, &mut self.factorizations),
            Phase::Solve => (&mut self.solve, &mut self.solves),
        };
        *count += runs;
        if let Some(elapsed) = elapsed {
            *time += elapsed;
        }
    }
}

impl fmt::Display for Timings {
    #[mutants::skip]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, phase) in [Phase::Assembly, Phase::Factorization, Phase::Solve]
            .into_iter()
            .enumerate()
        {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{phase}: {:?} ({} calls)",
                self.elapsed(phase),
                self.count(phase)
            )?;
        }
        Ok(())
    }
}

/// Times one phase, if timing is switched on.
pub(crate) struct Stopwatch(Option<Instant>);

impl Stopwatch {
    pub fn start(enabled: bool) -> Self {
        Self(enabled.then(Instant::now))
    }

    pub fn stop(self) -> Option<Duration> {
        self.0.map(|started| started.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates() {
        let mut timings = Timings::default();
        timings.record(Phase::Solve, 3, Some(Duration::from_millis(2)));
        timings.record(Phase::Solve, 1, Some(Duration::from_millis(1)));
        timings.record(Phase::Assembly, 1, None);
        assert_eq!(timings.count(Phase::Solve), 4);
        assert_eq!(timings.elapsed(Phase::Solve), Duration::from_millis(3));
        assert_eq!(timings.count(Phase::Assembly), 1);
        assert_eq!(timings.elapsed(Phase::Assembly), Duration::ZERO);
        assert_eq!(timings.count(Phase::Factorization), 0);
        assert_eq!(timings.total(), Duration::from_millis(3));
    }

    #[test]
    fn disabled_stopwatch_reports_nothing() {
        assert_eq!(Stopwatch::start(false).stop(), None);
        assert!(Stopwatch::start(true).stop().is_some());
    }

    #[test]
    fn phases_have_names() {
        assert_eq!(Phase::Assembly.to_string(), "assembly");
        assert_eq!(Phase::Factorization.to_string(), "factorization");
        assert_eq!(Phase::Solve.to_string(), "solve");
    }
}
