use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value as JsonValue;

use crate::backend::pipeline::PipelineState;
use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{FrescoError, FrescoResult};

/// A unit of pixel transformation that can participate in a filter pipeline.
///
/// A filter reads the pipeline's current source, writes its result into the
/// pipeline's target (accelerated passes) or mutates the pixel buffer in
/// place (software passes), and consumes exactly one pass from the
/// pipeline's budget. [`crate::filters::composed::Composed`] is the one
/// exception: it pre-adjusts the budget so a whole sub-chain still accounts
/// as one logical pass.
///
/// Parameters are immutable during a single pipeline run; owners may mutate
/// them between runs. The pipeline borrows the filter only for the duration
/// of one `apply_filters` call.
pub trait Filter: Debug + Send + Sync {
    /// Stable tag identifying this filter type in serialized form and in the
    /// filter-type registry.
    fn type_tag(&self) -> &'static str;

    /// Apply this filter against the shared pipeline state.
    ///
    /// Implementations must decrement the pipeline's remaining-pass counter
    /// by exactly one; primitive filters get this by delegating to
    /// [`crate::backend::pipeline::apply_standard`].
    fn apply_to(&self, state: &mut PipelineState<'_>) -> FrescoResult<()>;

    /// WGSL fragment stage executed by an accelerated pass.
    ///
    /// The engine prepends the shared vertex stage and the probed precision
    /// prelude; sources declare the `t_src`/`s_src`/`u` bindings they use.
    fn fragment_source(&self) -> String;

    /// Parameter block uploaded to the pass uniform buffer, padded by the
    /// engine to the fixed block size.
    fn uniform_data(&self) -> Vec<f32> {
        Vec::new()
    }

    /// Signature for the compiled-program cache.
    ///
    /// Defaults to the type tag; filters whose options change the generated
    /// shader must fold those options in.
    fn program_key(&self) -> String {
        self.type_tag().to_string()
    }

    /// Software rendition of the transform, mutating `image` in place.
    fn apply_cpu(&self, image: &mut PixelBuffer) -> FrescoResult<()>;

    /// Structural, JSON-safe description carrying a `type` tag and every
    /// parameter needed to reconstruct the filter.
    fn to_serializable(&self) -> JsonValue;

    /// `true` iff applying the filter would not visibly change the image.
    ///
    /// Callers use this to skip no-op filters before building a pipeline.
    fn is_neutral_state(&self) -> bool;
}

/// Reconstructor registered for a filter type tag.
pub type FilterCtor = fn(&JsonValue) -> FrescoResult<Box<dyn Filter>>;

/// Serialize a filter into its JSON description.
pub fn serialize_filter(filter: &dyn Filter) -> JsonValue {
    filter.to_serializable()
}

/// Reconstruct a filter from its JSON description.
///
/// Looks up the `type` tag in the filter-type registry and delegates to the
/// registered reconstructor; nested descriptions (`Composed`) recurse back
/// through here. Fails with [`FrescoError::UnknownFilterType`] when the tag
/// is not registered.
pub fn deserialize_filter(value: &JsonValue) -> FrescoResult<Box<dyn Filter>> {
    let tag = value
        .get("type")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| FrescoError::serde("serialized filter is missing a string `type` tag"))?;
    let ctor = read_registry()
        .get(tag)
        .copied()
        .ok_or_else(|| FrescoError::unknown_filter_type(tag))?;
    ctor(value)
}

/// Register a filter type under `tag`, replacing any previous registration.
///
/// Built-in types are pre-registered; external filter types call this once
/// at startup to take part in deserialization.
pub fn register_filter_type(tag: impl Into<String>, ctor: FilterCtor) {
    write_registry().insert(tag.into(), ctor);
}

fn registry() -> &'static RwLock<HashMap<String, FilterCtor>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, FilterCtor>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(builtin_filter_types()))
}

fn read_registry() -> RwLockReadGuard<'static, HashMap<String, FilterCtor>> {
    match registry().read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_registry() -> RwLockWriteGuard<'static, HashMap<String, FilterCtor>> {
    match registry().write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn builtin_filter_types() -> HashMap<String, FilterCtor> {
    use crate::filters::color::{Brightness, Contrast, Invert};
    use crate::filters::color_matrix::ColorMatrix;
    use crate::filters::composed;

    let mut map: HashMap<String, FilterCtor> = HashMap::new();
    map.insert("Brightness".into(), ctor_of::<Brightness>);
    map.insert("Contrast".into(), ctor_of::<Contrast>);
    map.insert("Invert".into(), ctor_of::<Invert>);
    map.insert("ColorMatrix".into(), ctor_of::<ColorMatrix>);
    map.insert("Composed".into(), composed::deserialize_composed);
    map
}

/// Reconstructor for filter types whose parameters derive `Deserialize`.
///
/// The `type` tag riding along in `value` is ignored by serde.
pub fn ctor_of<T>(value: &JsonValue) -> FrescoResult<Box<dyn Filter>>
where
    T: serde::de::DeserializeOwned + Filter + 'static,
{
    let filter: T = serde_json::from_value(value.clone())
        .map_err(|e| FrescoError::serde(format!("invalid filter description: {e}")))?;
    Ok(Box::new(filter))
}

#[cfg(test)]
#[path = "../../tests/unit/filters/filter.rs"]
mod tests;
