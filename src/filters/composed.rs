use serde_json::Value as JsonValue;

use crate::backend::pipeline::PipelineState;
use crate::filters::filter::{Filter, deserialize_filter};
use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{FrescoError, FrescoResult};

/// A container filter that applies an ordered sequence of sub-filters as one
/// logical pass.
///
/// Composing lets a list of filters be added, removed, and serialized exactly
/// like a single filter, at any nesting depth, while the pipeline's pass
/// accounting stays correct: `apply_to` grows the pass budget by
/// `sub_filters.len() - 1` before delegating, so the total decrements across
/// the sub-chain still equal one.
#[derive(Debug, Default)]
pub struct Composed {
    sub_filters: Vec<Box<dyn Filter>>,
}

impl Composed {
    /// Create a container over an owned, ordered list of sub-filters.
    pub fn new(sub_filters: Vec<Box<dyn Filter>>) -> Self {
        Self { sub_filters }
    }

    /// The contained sub-filters, in application order.
    pub fn sub_filters(&self) -> &[Box<dyn Filter>] {
        &self.sub_filters
    }

    /// Append a sub-filter at the end of the chain.
    pub fn push(&mut self, filter: Box<dyn Filter>) {
        self.sub_filters.push(filter);
    }
}

impl Filter for Composed {
    fn type_tag(&self) -> &'static str {
        "Composed"
    }

    fn apply_to(&self, state: &mut PipelineState<'_>) -> FrescoResult<()> {
        state.passes = (state.passes + self.sub_filters.len()).saturating_sub(1);
        for filter in &self.sub_filters {
            filter.apply_to(state)?;
        }
        Ok(())
    }

    fn fragment_source(&self) -> String {
        // Never compiled: apply_to fans out to the sub-filters' programs.
        String::new()
    }

    fn apply_cpu(&self, _image: &mut PixelBuffer) -> FrescoResult<()> {
        Ok(())
    }

    fn to_serializable(&self) -> JsonValue {
        serde_json::json!({
            "type": "Composed",
            "subFilters": self
                .sub_filters
                .iter()
                .map(|f| f.to_serializable())
                .collect::<Vec<_>>(),
        })
    }

    fn is_neutral_state(&self) -> bool {
        self.sub_filters.iter().all(|f| f.is_neutral_state())
    }
}

/// Reconstruct a [`Composed`] filter, recursively enlivening every
/// `subFilters` entry through the filter-type registry.
pub(crate) fn deserialize_composed(value: &JsonValue) -> FrescoResult<Box<dyn Filter>> {
    let entries = match value.get("subFilters") {
        None => &[][..],
        Some(v) => v
            .as_array()
            .ok_or_else(|| FrescoError::serde("Composed `subFilters` must be an array"))?
            .as_slice(),
    };
    let sub_filters = entries
        .iter()
        .map(deserialize_filter)
        .collect::<FrescoResult<Vec<_>>>()?;
    Ok(Box::new(Composed::new(sub_filters)))
}

#[cfg(test)]
#[path = "../../tests/unit/filters/composed.rs"]
mod tests;
