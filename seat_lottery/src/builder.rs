pub use crate::config::*;

/// A builder for setting up a draw.
///
/// Candidates come with a category label, as found in most input files.
/// The label is resolved when the candidate is added.
///
/// ```
/// pub use seat_lottery::builder::Builder;
/// pub use seat_lottery::{PerCategory, QuotaConfig};
/// # use seat_lottery::LotteryError;
///
/// let config = QuotaConfig::new(2, PerCategory::new(0.5, 0.5, 0.0))?;
/// let mut builder = Builder::new(&config).seed(42);
///
/// builder.add_candidate("1", "Aluno", &[("nome", "Ana")])?;
/// builder.add_candidate("2", "Servidor", &[("nome", "Bruno")])?;
/// builder.add_candidate("3", "Comunidade Externa", &[("nome", "Clara")])?;
///
/// let allocation = builder.run()?;
/// assert_eq!(allocation.approved.len(), 2);
/// assert_eq!(allocation.waitlist.len(), 1);
///
/// # Ok::<(), LotteryError>(())
/// ```
pub struct Builder {
    pub(crate) _config: QuotaConfig,
    pub(crate) _seed: u64,
    pub(crate) _candidates: Vec<Candidate>,
}

impl Builder {
    pub fn new(config: &QuotaConfig) -> Builder {
        Builder {
            _config: config.clone(),
            _seed: 0,
            _candidates: Vec::new(),
        }
    }

    pub fn seed(self, seed: u64) -> Builder {
        Builder {
            _seed: seed,
            ..self
        }
    }

    /// Adds a candidate whose category is given by its label
    /// (`Aluno`, `Servidor` or `Comunidade Externa`).
    ///
    /// The attributes are kept as they are, in the given order.
    pub fn add_candidate(
        &mut self,
        id: &str,
        category_label: &str,
        attributes: &[(&str, &str)],
    ) -> LotteryResult<()> {
        let category: Category = category_label.parse().map_err(|_| {
            LotteryError::UnresolvedCategory {
                id: id.to_string(),
                label: category_label.to_string(),
            }
        })?;
        let attributes = attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.add(Candidate::with_attributes(id, category, attributes))
    }

    pub fn add(&mut self, candidate: Candidate) -> LotteryResult<()> {
        self._candidates.push(candidate);
        Ok(())
    }

    pub fn run(&self) -> LotteryResult<Allocation> {
        crate::run_lottery(&self._candidates, &self._config, self._seed)
    }
}
