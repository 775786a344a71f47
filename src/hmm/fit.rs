use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::model::normalize_or_uniform;
use super::{DiscreteHmm, HmmError};

/// Baum-Welch settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Upper bound on EM iterations
    pub max_iterations: usize,
    /// Stop once the log-likelihood gain drops below this
    pub tolerance: f64,
    /// Lower bound applied to every emission probability after each M-step;
    /// 0 disables flooring
    pub emission_floor: f64,
    /// Re-estimate start probabilities
    pub update_start: bool,
    /// Re-estimate the transition matrix
    pub update_transition: bool,
    /// Re-estimate the emission matrix
    pub update_emission: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-4,
            emission_floor: 1e-6,
            update_start: true,
            update_transition: true,
            update_emission: true,
        }
    }
}

/// Outcome of [`DiscreteHmm::fit`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    /// EM iterations performed
    pub iterations: usize,
    /// Total log-likelihood of all sequences; under the fitted model once
    /// the fit has returned, under the model before the M-step while it runs
    pub log_likelihood: f64,
    /// Whether the tolerance was reached before `max_iterations`
    pub converged: bool,
}

/// Expected counts accumulated over sequences
#[derive(Debug, Clone)]
struct SufficientStats {
    start: Vec<f64>,
    transition: Vec<f64>,
    emission: Vec<f64>,
    log_likelihood: f64,
}

impl SufficientStats {
    fn zeros(model: &DiscreteHmm) -> Self {
        Self {
            start: vec![0.0; model.n_states],
            transition: vec![0.0; model.n_states * model.n_states],
            emission: vec![0.0; model.n_states * model.n_symbols],
            log_likelihood: 0.0,
        }
    }

    fn add(mut self, other: SufficientStats) -> Self {
        add_into(&mut self.start, &other.start);
        add_into(&mut self.transition, &other.transition);
        add_into(&mut self.emission, &other.emission);
        self.log_likelihood += other.log_likelihood;
        self
    }
}

fn add_into(target: &mut [f64], source: &[f64]) {
    target.iter_mut().zip(source).for_each(|(t, s)| *t += s);
}

impl DiscreteHmm {
    /// Fit the model to unlabelled sequences with Baum-Welch
    ///
    /// Transitions that are zero in the current model stay zero.
    pub fn fit<S>(&mut self, sequences: &[S], options: &FitOptions) -> Result<FitReport, HmmError>
    where
        S: AsRef<[usize]> + Sync,
    {
        self.fit_with(sequences, options, |_| Ok(()))
    }

    /// [`fit`](Self::fit) with a callback after every EM iteration
    ///
    /// An error returned by `on_iteration` (typically
    /// [`HmmError::Interrupted`]) stops the fit and is passed through; the
    /// model keeps the parameters of the last completed iteration.
    pub fn fit_with<S, F>(
        &mut self,
        sequences: &[S],
        options: &FitOptions,
        mut on_iteration: F,
    ) -> Result<FitReport, HmmError>
    where
        S: AsRef<[usize]> + Sync,
        F: FnMut(&FitReport) -> Result<(), HmmError>,
    {
        if sequences.is_empty() {
            return Err(HmmError::NoSequences);
        }
        if !(options.emission_floor >= 0.0 && options.emission_floor * (self.n_symbols as f64) < 1.0)
        {
            return Err(HmmError::InvalidParameter(format!(
                "emission floor {} is too large for {} symbols",
                options.emission_floor, self.n_symbols
            )));
        }
        for sequence in sequences {
            self.check_observations(sequence.as_ref())?;
        }

        let mut previous = f64::NEG_INFINITY;
        let mut report = FitReport {
            iterations: 0,
            log_likelihood: f64::NEG_INFINITY,
            converged: false,
        };

        for iteration in 1..=options.max_iterations {
            let stats = self.expectation(sequences)?;
            self.maximization(&stats, options);

            report.iterations = iteration;
            report.log_likelihood = stats.log_likelihood;
            debug!(
                "Baum-Welch iteration {}: log-likelihood {:.6}",
                iteration, stats.log_likelihood
            );

            let converged = (stats.log_likelihood - previous).abs() < options.tolerance;
            report.converged = converged;
            on_iteration(&report)?;
            if converged {
                break;
            }
            previous = stats.log_likelihood;
        }

        report.log_likelihood = sequences
            .iter()
            .map(|s| self.log_likelihood(s.as_ref()))
            .sum::<Result<f64, HmmError>>()?;

        info!(
            "Baum-Welch finished after {} iteration(s), log-likelihood {:.4}{}",
            report.iterations,
            report.log_likelihood,
            if report.converged { "" } else { " (not converged)" }
        );
        Ok(report)
    }

    #[cfg(not(feature = "parallel"))]
    fn expectation<S: AsRef<[usize]>>(&self, sequences: &[S]) -> Result<SufficientStats, HmmError> {
        sequences
            .iter()
            .map(|s| self.sequence_stats(s.as_ref()))
            .try_fold(SufficientStats::zeros(self), |acc, stats| Ok(acc.add(stats?)))
    }

    #[cfg(feature = "parallel")]
    fn expectation<S: AsRef<[usize]> + Sync>(
        &self,
        sequences: &[S],
    ) -> Result<SufficientStats, HmmError> {
        use rayon::prelude::*;

        sequences
            .par_iter()
            .map(|s| self.sequence_stats(s.as_ref()))
            .try_reduce(|| SufficientStats::zeros(self), |a, b| Ok(a.add(b)))
    }

    /// Expected start, transition and emission counts for one sequence
    fn sequence_stats(&self, observations: &[usize]) -> Result<SufficientStats, HmmError> {
        let n = self.n_states;
        let fb = self.forward_backward(observations)?;
        let mut stats = SufficientStats::zeros(self);
        stats.log_likelihood = fb.log_likelihood();

        for (t, &symbol) in observations.iter().enumerate() {
            let mut gamma: Vec<f64> = fb.alpha[t]
                .iter()
                .zip(&fb.beta[t])
                .map(|(a, b)| a * b)
                .collect();
            normalize_or_uniform(&mut gamma);

            if t == 0 {
                add_into(&mut stats.start, &gamma);
            }
            for (i, g) in gamma.iter().enumerate() {
                stats.emission[i * self.n_symbols + symbol] += g;
            }
        }

        for t in 0..observations.len().saturating_sub(1) {
            let next = observations[t + 1];
            for i in 0..n {
                for j in 0..n {
                    stats.transition[i * n + j] += fb.alpha[t][i]
                        * self.transition[i * n + j]
                        * self.emission(j, next)
                        * fb.beta[t + 1][j]
                        / fb.scale[t + 1];
                }
            }
        }

        Ok(stats)
    }

    fn maximization(&mut self, stats: &SufficientStats, options: &FitOptions) {
        if options.update_start {
            self.start.copy_from_slice(&stats.start);
            normalize_or_uniform(&mut self.start);
        }

        if options.update_transition {
            let n = self.n_states;
            for (row, counts) in self
                .transition
                .chunks_mut(n)
                .zip(stats.transition.chunks(n))
            {
                // States never left keep their previous row
                if counts.iter().sum::<f64>() > 0.0 {
                    row.copy_from_slice(counts);
                    normalize_or_uniform(row);
                }
            }
        }

        if options.update_emission {
            let m = self.n_symbols;
            for (row, counts) in self.emission.chunks_mut(m).zip(stats.emission.chunks(m)) {
                if counts.iter().sum::<f64>() > 0.0 {
                    row.copy_from_slice(counts);
                    normalize_or_uniform(row);
                }
                if options.emission_floor > 0.0 {
                    apply_floor(row, options.emission_floor);
                }
            }
        }
    }
}

/// Raise entries below `floor` to it and take the excess from the rest
fn apply_floor(row: &mut [f64], floor: f64) {
    let deficit: f64 = row.iter().filter(|&&p| p < floor).map(|p| floor - p).sum();
    if deficit <= 0.0 {
        return;
    }
    let surplus: f64 = row.iter().filter(|&&p| p >= floor).map(|p| p - floor).sum();
    for p in row.iter_mut() {
        if *p < floor {
            *p = floor;
        } else if surplus > 0.0 {
            *p -= (*p - floor) / surplus * deficit;
        }
    }
}
