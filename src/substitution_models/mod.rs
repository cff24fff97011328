use std::fmt::Display;

use anyhow::bail;
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector, SymmetricEigen};
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::Rng;

use crate::alphabets::N;
use crate::{ConfigurationError, InputError, Result};

pub mod protein_models;
pub use protein_models::ProteinModelType;

pub type SubstMatrix = DMatrix<f64>;
pub type FreqVector = DVector<f64>;

/// Number of exchangeabilities in the lower triangle of a 20x20 symmetric matrix.
pub const N_EXCHANGEABILITIES: usize = N * (N - 1) / 2;

/// An amino acid replacement model with its eigen-decomposition.
///
/// With Π the diagonal matrix of equilibrium frequencies, `Q = R·diag(Λ)·L` where `L·R = I`.
/// The decomposition is done once through the symmetric matrix `Π^½·Q·Π^-½`.
#[derive(Clone, Debug, PartialEq)]
pub struct RateMatrix {
    name: String,
    freqs: FreqVector,
    q: SubstMatrix,
    eigenvalues: FreqVector,
    right: SubstMatrix,
    left: SubstMatrix,
}

impl RateMatrix {
    /// Creates a model from PAML-ordered exchangeabilities (lower triangle, row by row) and
    /// equilibrium frequencies. Frequencies are rescaled to sum to one and the rate matrix is
    /// normalised to one expected substitution per unit time.
    /// Bails on wrong value counts, negative or non-finite exchangeabilities, and frequencies
    /// that are not strictly positive.
    ///
    /// # Example
    /// ```
    /// use modelmatcher::substitution_models::RateMatrix;
    /// let poisson = RateMatrix::new("Poisson", &[1.0; 190], &[0.05; 20]).unwrap();
    /// assert_eq!(poisson.name(), "Poisson");
    /// assert!((poisson.q()[(0, 1)] - 1.0 / 19.0).abs() < 1e-12);
    /// ```
    pub fn new(name: &str, exchangeabilities: &[f64], freqs: &[f64]) -> Result<RateMatrix> {
        if exchangeabilities.len() != N_EXCHANGEABILITIES {
            bail!(InputError::new(format!(
                "Model {} needs {} exchangeabilities, got {}",
                name,
                N_EXCHANGEABILITIES,
                exchangeabilities.len()
            )));
        }
        if freqs.len() != N {
            bail!(InputError::new(format!(
                "Model {} needs {} frequencies, got {}",
                name,
                N,
                freqs.len()
            )));
        }
        if exchangeabilities.iter().any(|&s| !s.is_finite() || s < 0.0) {
            bail!(InputError::new(format!(
                "Model {} has negative or non-finite exchangeabilities",
                name
            )));
        }
        if freqs.iter().any(|&f| !f.is_finite() || f <= 0.0) {
            bail!(InputError::new(format!(
                "Model {} must have strictly positive frequencies",
                name
            )));
        }

        let mut freqs = FreqVector::from_column_slice(freqs);
        let total = freqs.sum();
        if (total - 1.0).abs() > 1e-6 {
            debug!("Rescaling frequencies of {} summing to {}", name, total);
        }
        freqs /= total;

        let exchangeabilities = symmetric_from_lower_triangle(exchangeabilities);
        let mut q = SubstMatrix::from_fn(N, N, |i, j| exchangeabilities[(i, j)] * freqs[j]);
        for i in 0..N {
            q[(i, i)] = 0.0;
            let row_sum = q.row(i).sum();
            q[(i, i)] = -row_sum;
        }
        let rate = -(freqs.transpose() * q.diagonal())[(0, 0)];
        if rate <= 0.0 {
            bail!(InputError::new(format!(
                "Model {} has no substitutions, all exchangeabilities are zero",
                name
            )));
        }
        q /= rate;

        let sqrt_freqs = freqs.map(f64::sqrt);
        let symmetric = SubstMatrix::from_fn(N, N, |i, j| {
            if i <= j {
                q[(i, j)] * sqrt_freqs[i] / sqrt_freqs[j]
            } else {
                q[(j, i)] * sqrt_freqs[j] / sqrt_freqs[i]
            }
        });
        let eigen = SymmetricEigen::new(symmetric);
        let right = SubstMatrix::from_fn(N, N, |i, k| eigen.eigenvectors[(i, k)] / sqrt_freqs[i]);
        let left = SubstMatrix::from_fn(N, N, |k, j| eigen.eigenvectors[(j, k)] * sqrt_freqs[j]);
        debug!("Decomposed model {}", name);

        Ok(RateMatrix {
            name: name.to_string(),
            freqs,
            q,
            eigenvalues: eigen.eigenvalues,
            right,
            left,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Equilibrium frequencies.
    pub fn freqs(&self) -> &FreqVector {
        &self.freqs
    }

    pub fn q(&self) -> &SubstMatrix {
        &self.q
    }

    pub fn eigenvalues(&self) -> &FreqVector {
        &self.eigenvalues
    }

    /// Right eigenvectors, one per column.
    pub fn right_eigenvectors(&self) -> &SubstMatrix {
        &self.right
    }

    /// Left eigenvectors, one per row; the inverse of the right eigenvectors.
    pub fn left_eigenvectors(&self) -> &SubstMatrix {
        &self.left
    }

    /// Transition probability matrix after `time` expected substitutions per site.
    pub fn p(&self, time: f64) -> SubstMatrix {
        let decay = SubstMatrix::from_diagonal(&self.eigenvalues.map(|l| (l * time).exp()));
        &self.right * decay * &self.left
    }

    /// Expected joint probabilities of aligned residue pairs at a given distance.
    pub fn joint_probabilities(&self, time: f64) -> SubstMatrix {
        SubstMatrix::from_diagonal(&self.freqs) * self.p(time)
    }

    /// Simulates `n` aligned residue pairs under the model and counts them. Each pair picks
    /// its distance uniformly from `distances`. The counts are not symmetrised and sum to `n`.
    pub fn sample_count_matrix<R: Rng + ?Sized>(
        &self,
        n: usize,
        distances: &[f64],
        rng: &mut R,
    ) -> Result<SubstMatrix> {
        if distances.is_empty() {
            bail!(ConfigurationError::new(
                "At least one distance is needed to simulate pairs"
            ));
        }
        let samplers = distances
            .iter()
            .map(|&time| {
                let joint = self.joint_probabilities(time);
                WeightedIndex::new(joint.iter().map(|&p| p.max(0.0)))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut counts = SubstMatrix::zeros(N, N);
        for _ in 0..n {
            let distance = rng.gen_range(0..samplers.len());
            let cell = samplers[distance].sample(rng);
            // column-major storage
            counts[(cell % N, cell / N)] += 1.0;
        }
        Ok(counts)
    }
}

impl Display for RateMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn symmetric_from_lower_triangle(values: &[f64]) -> SubstMatrix {
    let mut matrix = SubstMatrix::zeros(N, N);
    let mut values = values.iter();
    for i in 1..N {
        for j in 0..i {
            if let Some(&value) = values.next() {
                matrix[(i, j)] = value;
                matrix[(j, i)] = value;
            }
        }
    }
    matrix
}

/// The set of models candidates are scored against. Built once per run and handed to the
/// scorer explicitly.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelRegistry {
    models: Vec<RateMatrix>,
}

impl ModelRegistry {
    /// All built-in empirical models, in [`ProteinModelType::ALL`] order.
    pub fn builtin() -> Result<ModelRegistry> {
        ModelRegistry::from_types(&ProteinModelType::ALL)
    }

    /// The chosen built-in models, in the given order.
    pub fn from_types(model_types: &[ProteinModelType]) -> Result<ModelRegistry> {
        let models = model_types
            .iter()
            .map(|model_type| model_type.rate_matrix())
            .collect::<Result<Vec<_>>>()?;
        info!("Loaded {} built-in models", models.len());
        Ok(ModelRegistry { models })
    }

    pub fn from_models(models: Vec<RateMatrix>) -> ModelRegistry {
        ModelRegistry { models }
    }

    pub fn models(&self) -> &[RateMatrix] {
        &self.models
    }

    /// Adds a model at the end of the registry. A model with the same name, compared without
    /// case, is replaced in place instead.
    pub fn insert(&mut self, model: RateMatrix) {
        match self
            .models
            .iter_mut()
            .find(|existing| existing.name().eq_ignore_ascii_case(model.name()))
        {
            Some(existing) => {
                warn!("Model {} replaces the registered model {}", model, existing);
                *existing = model;
            }
            None => {
                debug!("Added model {} to the registry", model);
                self.models.push(model);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&RateMatrix> {
        self.models
            .iter()
            .find(|model| model.name().eq_ignore_ascii_case(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|model| model.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
