use anyhow::Error;

#[macro_use]
pub mod macros;

pub mod alignment;
pub mod alphabets;
pub mod counts;
pub mod io;
pub mod matcher;
pub mod output;
pub mod ranking;
pub mod sampling;
pub mod scoring;
pub mod substitution_models;

pub type Result<T> = std::result::Result<T, Error>;

message_error!(
    /// Malformed, empty or unsupported input data. Fatal for the run.
    InputError
);

message_error!(
    /// Invalid run settings, or a request the ranking cannot satisfy. Fatal for the run.
    ConfigurationError
);

message_error!(
    /// Scoring of a single model variant broke down numerically. Only that candidate is lost.
    NumericalFailure
);

#[allow(non_camel_case_types)]
type f64_h = ordered_float::OrderedFloat<f64>;
