use super::*;

use crate::filters::color::{Brightness, Invert};

fn software_state(passes: usize) -> PipelineState<'static> {
    PipelineState {
        original_width: 1,
        original_height: 1,
        source_width: 1,
        source_height: 1,
        dest_width: 1,
        dest_height: 1,
        passes,
        pass: 0,
        ctx: PassContext::Software(SoftwarePass {
            image: PixelBuffer::from_rgba8(1, 1, vec![100, 100, 100, 255]).unwrap(),
        }),
    }
}

#[test]
fn standard_pass_consumes_exactly_one_pass() {
    let mut state = software_state(2);
    apply_standard(&Invert::default(), &mut state).unwrap();
    assert_eq!(state.passes, 1);
    assert_eq!(state.pass, 1);
    apply_standard(&Brightness { brightness: 0.0 }, &mut state).unwrap();
    assert_eq!(state.passes, 0);
    assert_eq!(state.pass, 2);
}

#[test]
fn standard_pass_mutates_the_software_image() {
    let mut state = software_state(1);
    apply_standard(&Invert::default(), &mut state).unwrap();
    let PassContext::Software(sw) = &state.ctx else {
        panic!("software state changed context");
    };
    assert_eq!(sw.image.pixel(0, 0), [155, 155, 155, 255]);
}

#[test]
fn exhausted_budget_saturates_instead_of_underflowing() {
    let mut state = software_state(0);
    apply_standard(&Invert::default(), &mut state).unwrap();
    assert_eq!(state.passes, 0);
    assert_eq!(state.pass, 1);
}
