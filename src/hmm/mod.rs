//! # Discrete Hidden Markov Models
//!
//! Error correction for classification tracks. A tracked cell is classified
//! independently in every frame; the resulting label sequence is noisy. A
//! discrete HMM whose hidden states are the true phenotype classes and whose
//! symbols are the classifier outputs recovers the most likely class sequence
//! with Viterbi decoding.
//!
//! Models are typically seeded from labelled tracks with
//! [`DiscreteHmm::estimate_from_labels`], refined on unlabelled tracks with
//! Baum-Welch ([`DiscreteHmm::fit`]) and then used to [`smooth`](DiscreteHmm::smooth)
//! each track.
//!
//! ```rust
//! use cecog::hmm::DiscreteHmm;
//!
//! let tracks = vec![vec![0, 0, 1, 1, 2], vec![0, 1, 1, 2, 2]];
//! let model = DiscreteHmm::estimate_from_labels(&tracks, 3, 0.9, 1.0)?;
//! let smoothed = model.smooth(&[0, 0, 2, 0, 1, 1])?;
//! assert_eq!(smoothed.len(), 6);
//! # Ok::<(), cecog::hmm::HmmError>(())
//! ```

mod error;
mod fit;
mod model;

#[cfg(test)]
mod tests;

pub use error::HmmError;
pub use fit::{FitOptions, FitReport};
pub use model::{DiscreteHmm, Posteriors};
