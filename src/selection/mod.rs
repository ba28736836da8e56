pub mod first_stage;
pub mod second_stage;

use crate::config::Parameters;
use crate::matrix::{ConfidenceMatrix, MatrixError};
use crate::store::{CategoryRegistry, ParameterStore};
use crate::types::decision::{DecisionError, DecisionReport, DecisionResult, DecisionStage};
pub use first_stage::{first_stage, FirstStageOutcome};
pub use second_stage::second_stage;

/// Picks one category out of a confidence matrix.
///
/// Stores are injected at construction. The engine holds no state of its
/// own between calls, and is not safe to run concurrently against one
/// store: the usage counter update is a plain read followed by a write.
pub struct DecisionEngine<P, R> {
	parameters: P,
	registry: R,
}

impl<'s, S> DecisionEngine<&'s S, &'s S>
where
	S: ParameterStore + CategoryRegistry,
{
	/// Engine over a single store serving both roles.
	pub fn with_store(store: &'s S) -> Self {
		Self::new(store, store)
	}
}

impl<P, R> DecisionEngine<P, R>
where
	P: ParameterStore,
	R: CategoryRegistry,
{
	pub fn new(parameters: P, registry: R) -> Self {
		Self {
			parameters,
			registry,
		}
	}

	pub fn registry(&self) -> &R {
		&self.registry
	}

	pub fn decide(&self, matrix: &ConfidenceMatrix) -> Result<DecisionResult, DecisionError> {
		self.decide_report(matrix).map(|report| report.result)
	}

	pub fn decide_report(&self, matrix: &ConfidenceMatrix) -> Result<DecisionReport, DecisionError> {
		if matrix.is_empty() {
			return Err(MatrixError::Empty.into());
		}

		let fingerprint = matrix.fingerprint();
		tracing::debug!(
			fingerprint = %fingerprint,
			categories = matrix.len(),
			sources = matrix.sources().len(),
			"deciding"
		);

		// 0. Parameters first, so a misconfigured store has no side effects
		let params = Parameters::load(&self.parameters)?;

		// 1. Registration
		self.register_categories(matrix)?;

		// 2. Threshold screening
		let (result, stage, qualifying_cells) = match first_stage(matrix, params.confidence_threshold) {
			FirstStageOutcome::Decided(decision) => {
				(DecisionResult::single(decision), DecisionStage::SingleSignal, 1)
			}
			// 3. Averaging
			FirstStageOutcome::Escalate {
				candidates,
				qualifying_cells,
			} => {
				let stage = if qualifying_cells == 0 {
					DecisionStage::NoStrongSignal
				} else {
					DecisionStage::Contested
				};
				tracing::debug!(
					qualifying_cells,
					candidates = candidates.len(),
					"averaging candidates"
				);
				let result = second_stage(&candidates, params.margin_error).ok_or(MatrixError::Empty)?;
				(result, stage, qualifying_cells)
			}
		};

		// 4. Usage counter
		let winner = result.decision.area.as_str();
		let count = self.registry.usage_count(winner)?;
		self.registry.set_usage_count(winner, count + 1)?;

		tracing::info!(
			area = %winner,
			score = result.decision.score,
			others = result.others.len(),
			stage = ?stage,
			times_chosen = count + 1,
			"decision made"
		);

		Ok(DecisionReport {
			result,
			stage,
			matrix_fingerprint: fingerprint,
			qualifying_cells,
		})
	}

	/// Register every category of `matrix` the registry does not know yet.
	/// Returns how many were added.
	pub fn register_categories(&self, matrix: &ConfidenceMatrix) -> Result<usize, DecisionError> {
		let known = self.registry.list_all()?;
		let mut added = 0;
		for category in matrix.categories() {
			if known.contains(category.as_str()) {
				continue;
			}
			if self.registry.register(category.as_str())? {
				tracing::info!(area = %category, "registered new category");
				added += 1;
			}
		}
		Ok(added)
	}
}
