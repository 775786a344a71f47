/// Errors that can occur when building, fitting or decoding an HMM
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HmmError {
    /// Observation sequence has no elements
    #[error("Observation sequence is empty")]
    EmptySequence,

    /// No sequences were given for fitting
    #[error("No observation sequences to fit")]
    NoSequences,

    /// Observation symbol is not part of the model alphabet
    #[error("Symbol {symbol} out of range (model has {n_symbols} symbols)")]
    SymbolOutOfRange {
        /// Offending symbol
        symbol: usize,
        /// Alphabet size
        n_symbols: usize,
    },

    /// Matrix or vector shape does not match the model
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A probability row does not sum to one or has invalid entries
    #[error("{what} row {row} is not a probability distribution (sum {sum})")]
    NotStochastic {
        /// Which parameter ("start", "transition", "emission")
        what: &'static str,
        /// Row index
        row: usize,
        /// Row sum
        sum: f64,
    },

    /// Parameter outside its valid range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The sequence cannot be produced by the model
    #[error("Observation sequence has zero probability under the model")]
    ZeroProbability,

    /// An iteration callback stopped the fit
    #[error("Fitting was interrupted")]
    Interrupted,
}
