use super::*;

use crate::backend::pipeline::{PassContext, SoftwarePass};
use crate::filters::color::{Brightness, Contrast, Invert};

fn software_state(passes: usize) -> PipelineState<'static> {
    PipelineState {
        original_width: 2,
        original_height: 2,
        source_width: 2,
        source_height: 2,
        dest_width: 2,
        dest_height: 2,
        passes,
        pass: 0,
        ctx: PassContext::Software(SoftwarePass {
            image: PixelBuffer::new(2, 2),
        }),
    }
}

#[test]
fn one_logical_pass_regardless_of_length() {
    let composed = Composed::new(vec![
        Box::new(Invert::default()),
        Box::new(Brightness { brightness: 0.1 }),
        Box::new(Contrast { contrast: 0.2 }),
    ]);

    let mut state = software_state(1);
    composed.apply_to(&mut state).unwrap();
    assert_eq!(state.passes, 0);
    assert_eq!(state.pass, 3);
}

#[test]
fn pass_accounting_is_flatten_invariant() {
    // [A, Composed[B, Composed[C, D]], E]: five actual passes, three logical.
    let nested = Composed::new(vec![
        Box::new(Invert::default()),
        Box::new(Composed::new(vec![
            Box::new(Brightness { brightness: 0.1 }),
            Box::new(Contrast { contrast: 0.1 }),
        ])),
    ]);

    let mut state = software_state(3);
    Invert::default().apply_to(&mut state).unwrap();
    nested.apply_to(&mut state).unwrap();
    Brightness { brightness: 0.2 }.apply_to(&mut state).unwrap();

    assert_eq!(state.passes, 0);
    assert_eq!(state.pass, 5);
}

#[test]
fn empty_composed_consumes_its_pass_without_applying() {
    let composed = Composed::default();
    let mut state = software_state(1);
    composed.apply_to(&mut state).unwrap();
    assert_eq!(state.passes, 0);
    assert_eq!(state.pass, 0);
}

#[test]
fn neutral_iff_every_sub_filter_is_neutral() {
    assert!(Composed::default().is_neutral_state());
    assert!(
        Composed::new(vec![
            Box::new(Brightness { brightness: 0.0 }),
            Box::new(Invert { invert: false }),
        ])
        .is_neutral_state()
    );
    assert!(
        !Composed::new(vec![
            Box::new(Brightness { brightness: 0.0 }),
            Box::new(Invert::default()),
        ])
        .is_neutral_state()
    );
}

#[test]
fn serialization_round_trips_at_any_nesting_depth() {
    let composed = Composed::new(vec![
        Box::new(Brightness { brightness: 0.25 }),
        Box::new(Composed::new(vec![
            Box::new(Invert::default()),
            Box::new(Contrast { contrast: -0.5 }),
        ])),
    ]);

    let serialized = composed.to_serializable();
    assert_eq!(serialized["type"], "Composed");

    let revived = deserialize_filter(&serialized).unwrap();
    assert_eq!(revived.to_serializable(), serialized);
}

#[test]
fn deserializing_without_sub_filters_yields_empty_chain() {
    let revived = deserialize_filter(&serde_json::json!({ "type": "Composed" })).unwrap();
    assert!(revived.is_neutral_state());
}

#[test]
fn unknown_sub_filter_type_fails_deserialization() {
    let value = serde_json::json!({
        "type": "Composed",
        "subFilters": [{ "type": "Sparkle" }],
    });
    match deserialize_filter(&value) {
        Err(FrescoError::UnknownFilterType(tag)) => assert_eq!(tag, "Sparkle"),
        other => panic!("expected UnknownFilterType, got {other:?}"),
    }
}
