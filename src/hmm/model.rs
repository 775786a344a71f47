use serde::{Deserialize, Serialize};

use super::HmmError;

/// Allowed deviation of a probability row sum from 1
const STOCHASTIC_TOLERANCE: f64 = 1e-6;

/// Discrete-emission hidden Markov model
///
/// Matrices are stored row-major: `transition[i * n_states + j]` is
/// P(state j | state i) and `emission[i * n_symbols + k]` is P(symbol k | state i).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscreteHmm {
    pub(super) n_states: usize,
    pub(super) n_symbols: usize,
    pub(super) start: Vec<f64>,
    pub(super) transition: Vec<f64>,
    pub(super) emission: Vec<f64>,
}

/// Result of the forward-backward pass for one sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Posteriors {
    /// `gamma[t][i]` = P(state i at t | observations)
    pub gamma: Vec<Vec<f64>>,
    /// Log-likelihood of the observations
    pub log_likelihood: f64,
}

impl Posteriors {
    /// Most probable state at every time point (posterior decoding)
    pub fn argmax(&self) -> Vec<usize> {
        self.gamma.iter().map(|row| argmax(row)).collect()
    }
}

/// Scaled forward and backward variables
pub(super) struct ForwardBackward {
    pub alpha: Vec<Vec<f64>>,
    pub beta: Vec<Vec<f64>>,
    pub scale: Vec<f64>,
}

impl ForwardBackward {
    pub fn log_likelihood(&self) -> f64 {
        self.scale.iter().map(|c| c.ln()).sum()
    }
}

impl DiscreteHmm {
    /// Build a model from start probabilities and row-major matrices
    pub fn new(
        start: Vec<f64>,
        transition: Vec<f64>,
        emission: Vec<f64>,
        n_symbols: usize,
    ) -> Result<Self, HmmError> {
        let n_states = start.len();
        if n_states == 0 || n_symbols == 0 {
            return Err(HmmError::DimensionMismatch(
                "model needs at least one state and one symbol".to_string(),
            ));
        }
        if transition.len() != n_states * n_states {
            return Err(HmmError::DimensionMismatch(format!(
                "transition has {} entries, expected {}x{}",
                transition.len(),
                n_states,
                n_states
            )));
        }
        if emission.len() != n_states * n_symbols {
            return Err(HmmError::DimensionMismatch(format!(
                "emission has {} entries, expected {}x{}",
                emission.len(),
                n_states,
                n_symbols
            )));
        }

        check_stochastic("start", &start, n_states)?;
        check_stochastic("transition", &transition, n_states)?;
        check_stochastic("emission", &emission, n_symbols)?;

        Ok(Self {
            n_states,
            n_symbols,
            start,
            transition,
            emission,
        })
    }

    /// Build a model from nested rows
    pub fn from_rows(
        start: Vec<f64>,
        transition: &[Vec<f64>],
        emission: &[Vec<f64>],
    ) -> Result<Self, HmmError> {
        let n_symbols = emission.first().map(Vec::len).unwrap_or(0);
        if emission.iter().any(|row| row.len() != n_symbols) {
            return Err(HmmError::DimensionMismatch(
                "emission rows differ in length".to_string(),
            ));
        }
        if transition.iter().any(|row| row.len() != transition.len()) {
            return Err(HmmError::DimensionMismatch(
                "transition matrix is not square".to_string(),
            ));
        }
        Self::new(start, transition.concat(), emission.concat(), n_symbols)
    }

    /// Initial model estimated from labelled tracks
    ///
    /// States and symbols are both the `n_states` class indices. Start and
    /// transition probabilities are label counts plus `pseudo_count`; the
    /// emission matrix assigns `confidence` to the correct label and spreads
    /// the rest evenly over the others.
    pub fn estimate_from_labels<S: AsRef<[usize]>>(
        sequences: &[S],
        n_states: usize,
        confidence: f64,
        pseudo_count: f64,
    ) -> Result<Self, HmmError> {
        if n_states == 0 {
            return Err(HmmError::InvalidParameter("n_states must be positive".to_string()));
        }
        if !(confidence > 0.0 && confidence <= 1.0) {
            return Err(HmmError::InvalidParameter(format!(
                "confidence must be in (0, 1], got {}",
                confidence
            )));
        }
        if !(pseudo_count >= 0.0 && pseudo_count.is_finite()) {
            return Err(HmmError::InvalidParameter(format!(
                "pseudo count must be non-negative, got {}",
                pseudo_count
            )));
        }

        let mut start = vec![pseudo_count; n_states];
        let mut transition = vec![pseudo_count; n_states * n_states];

        for sequence in sequences {
            let sequence = sequence.as_ref();
            check_symbols(sequence, n_states)?;
            if let Some(&first) = sequence.first() {
                start[first] += 1.0;
            }
            for pair in sequence.windows(2) {
                transition[pair[0] * n_states + pair[1]] += 1.0;
            }
        }

        normalize_or_uniform(&mut start);
        for row in transition.chunks_mut(n_states) {
            normalize_or_uniform(row);
        }

        let mut emission = vec![0.0; n_states * n_states];
        let off_diagonal = if n_states > 1 {
            (1.0 - confidence) / (n_states - 1) as f64
        } else {
            0.0
        };
        for (i, row) in emission.chunks_mut(n_states).enumerate() {
            for (k, value) in row.iter_mut().enumerate() {
                *value = if i == k {
                    if n_states > 1 { confidence } else { 1.0 }
                } else {
                    off_diagonal
                };
            }
        }

        Self::new(start, transition, emission, n_states)
    }

    /// Number of hidden states
    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// Size of the observation alphabet
    pub fn n_symbols(&self) -> usize {
        self.n_symbols
    }

    /// Start probabilities
    pub fn start(&self) -> &[f64] {
        &self.start
    }

    /// P(state `to` | state `from`)
    pub fn transition(&self, from: usize, to: usize) -> f64 {
        self.transition[from * self.n_states + to]
    }

    /// P(symbol | state)
    pub fn emission(&self, state: usize, symbol: usize) -> f64 {
        self.emission[state * self.n_symbols + symbol]
    }

    /// Transition matrix as rows
    pub fn transition_rows(&self) -> Vec<Vec<f64>> {
        self.transition.chunks(self.n_states).map(<[f64]>::to_vec).collect()
    }

    /// Emission matrix as rows
    pub fn emission_rows(&self) -> Vec<Vec<f64>> {
        self.emission.chunks(self.n_symbols).map(<[f64]>::to_vec).collect()
    }

    /// Log-likelihood of an observation sequence
    pub fn log_likelihood(&self, observations: &[usize]) -> Result<f64, HmmError> {
        Ok(self.forward_backward(observations)?.log_likelihood())
    }

    /// Posterior state probabilities for every time point
    pub fn posteriors(&self, observations: &[usize]) -> Result<Posteriors, HmmError> {
        let fb = self.forward_backward(observations)?;
        let gamma = fb
            .alpha
            .iter()
            .zip(&fb.beta)
            .map(|(a, b)| {
                let mut row: Vec<f64> = a.iter().zip(b).map(|(x, y)| x * y).collect();
                normalize_or_uniform(&mut row);
                row
            })
            .collect();
        Ok(Posteriors {
            gamma,
            log_likelihood: fb.log_likelihood(),
        })
    }

    /// Most likely state path and its log-probability
    pub fn viterbi(&self, observations: &[usize]) -> Result<(Vec<usize>, f64), HmmError> {
        self.check_observations(observations)?;
        let n = self.n_states;
        let len = observations.len();

        let log_start: Vec<f64> = self.start.iter().map(|p| p.ln()).collect();
        let log_trans: Vec<f64> = self.transition.iter().map(|p| p.ln()).collect();
        let log_emit: Vec<f64> = self.emission.iter().map(|p| p.ln()).collect();
        let emit = |state: usize, symbol: usize| log_emit[state * self.n_symbols + symbol];

        let mut delta: Vec<f64> = (0..n)
            .map(|i| log_start[i] + emit(i, observations[0]))
            .collect();
        let mut backpointers = vec![vec![0usize; n]; len];

        for t in 1..len {
            let mut next = vec![f64::NEG_INFINITY; n];
            for j in 0..n {
                let (best_i, best) = (0..n)
                    .map(|i| (i, delta[i] + log_trans[i * n + j]))
                    .fold((0, f64::NEG_INFINITY), |acc, cur| if cur.1 > acc.1 { cur } else { acc });
                backpointers[t][j] = best_i;
                next[j] = best + emit(j, observations[t]);
            }
            delta = next;
        }

        let last = argmax(&delta);
        let log_prob = delta[last];
        if log_prob == f64::NEG_INFINITY {
            return Err(HmmError::ZeroProbability);
        }

        let mut path = vec![0usize; len];
        path[len - 1] = last;
        for t in (1..len).rev() {
            path[t - 1] = backpointers[t][path[t]];
        }
        Ok((path, log_prob))
    }

    /// Viterbi-decode a label track into the most likely class sequence
    pub fn smooth(&self, labels: &[usize]) -> Result<Vec<usize>, HmmError> {
        Ok(self.viterbi(labels)?.0)
    }

    pub(super) fn check_observations(&self, observations: &[usize]) -> Result<(), HmmError> {
        if observations.is_empty() {
            return Err(HmmError::EmptySequence);
        }
        check_symbols(observations, self.n_symbols)
    }

    /// Scaled forward-backward pass
    pub(super) fn forward_backward(&self, observations: &[usize]) -> Result<ForwardBackward, HmmError> {
        self.check_observations(observations)?;
        let n = self.n_states;
        let len = observations.len();

        let mut alpha = vec![vec![0.0; n]; len];
        let mut scale = vec![0.0; len];

        for i in 0..n {
            alpha[0][i] = self.start[i] * self.emission(i, observations[0]);
        }
        scale[0] = rescale(&mut alpha[0])?;

        for t in 1..len {
            for j in 0..n {
                let incoming: f64 = (0..n)
                    .map(|i| alpha[t - 1][i] * self.transition[i * n + j])
                    .sum();
                alpha[t][j] = incoming * self.emission(j, observations[t]);
            }
            scale[t] = rescale(&mut alpha[t])?;
        }

        let mut beta = vec![vec![1.0; n]; len];
        for t in (0..len - 1).rev() {
            for i in 0..n {
                beta[t][i] = (0..n)
                    .map(|j| {
                        self.transition[i * n + j]
                            * self.emission(j, observations[t + 1])
                            * beta[t + 1][j]
                    })
                    .sum::<f64>()
                    / scale[t + 1];
            }
        }

        Ok(ForwardBackward { alpha, beta, scale })
    }
}

fn check_symbols(observations: &[usize], n_symbols: usize) -> Result<(), HmmError> {
    match observations.iter().find(|&&s| s >= n_symbols) {
        Some(&symbol) => Err(HmmError::SymbolOutOfRange { symbol, n_symbols }),
        None => Ok(()),
    }
}

fn check_stochastic(what: &'static str, values: &[f64], row_len: usize) -> Result<(), HmmError> {
    for (row, chunk) in values.chunks(row_len).enumerate() {
        let sum: f64 = chunk.iter().sum();
        let valid = chunk.iter().all(|p| p.is_finite() && *p >= 0.0);
        if !valid || (sum - 1.0).abs() > STOCHASTIC_TOLERANCE {
            return Err(HmmError::NotStochastic { what, row, sum });
        }
    }
    Ok(())
}

/// Normalise to sum 1 and return the original sum
fn rescale(row: &mut [f64]) -> Result<f64, HmmError> {
    let sum: f64 = row.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return Err(HmmError::ZeroProbability);
    }
    row.iter_mut().for_each(|v| *v /= sum);
    Ok(sum)
}

/// Normalise to sum 1; an all-zero row becomes uniform
pub(super) fn normalize_or_uniform(row: &mut [f64]) {
    let sum: f64 = row.iter().sum();
    if sum > 0.0 {
        row.iter_mut().for_each(|v| *v /= sum);
    } else {
        let uniform = 1.0 / row.len() as f64;
        row.iter_mut().for_each(|v| *v = uniform);
    }
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
        .0
}
