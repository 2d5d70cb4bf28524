use super::*;

use crate::filters::color::{Brightness, Invert};
use crate::foundation::error::FrescoError;

#[test]
fn builtin_types_round_trip() {
    let brightness = Brightness { brightness: 0.5 };
    let revived = deserialize_filter(&serialize_filter(&brightness)).unwrap();
    assert_eq!(revived.type_tag(), "Brightness");
    assert_eq!(revived.to_serializable(), brightness.to_serializable());

    let invert = Invert { invert: false };
    let revived = deserialize_filter(&serialize_filter(&invert)).unwrap();
    assert!(revived.is_neutral_state());
}

#[test]
fn missing_type_tag_is_a_serde_error() {
    match deserialize_filter(&serde_json::json!({ "brightness": 0.5 })) {
        Err(FrescoError::Serde(_)) => {}
        other => panic!("expected Serde error, got {other:?}"),
    }
}

#[test]
fn unregistered_tag_fails_with_unknown_filter_type() {
    match deserialize_filter(&serde_json::json!({ "type": "Sparkle" })) {
        Err(FrescoError::UnknownFilterType(tag)) => assert_eq!(tag, "Sparkle"),
        other => panic!("expected UnknownFilterType, got {other:?}"),
    }
}

#[test]
fn missing_parameters_fall_back_to_defaults() {
    let revived = deserialize_filter(&serde_json::json!({ "type": "Brightness" })).unwrap();
    assert!(revived.is_neutral_state());
}

#[derive(Clone, Copy, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct Mirror {
    flip: bool,
}

impl Filter for Mirror {
    fn type_tag(&self) -> &'static str {
        "Mirror"
    }

    fn apply_to(&self, state: &mut PipelineState<'_>) -> FrescoResult<()> {
        crate::backend::pipeline::apply_standard(self, state)
    }

    fn fragment_source(&self) -> String {
        String::new()
    }

    fn apply_cpu(&self, _image: &mut PixelBuffer) -> FrescoResult<()> {
        Ok(())
    }

    fn to_serializable(&self) -> serde_json::Value {
        serde_json::json!({ "type": "Mirror", "flip": self.flip })
    }

    fn is_neutral_state(&self) -> bool {
        !self.flip
    }
}

#[test]
fn external_types_can_register() {
    register_filter_type("Mirror", ctor_of::<Mirror>);
    let revived = deserialize_filter(&serde_json::json!({ "type": "Mirror", "flip": true })).unwrap();
    assert_eq!(revived.type_tag(), "Mirror");
    assert!(!revived.is_neutral_state());
}
