use super::*;

use std::time::Duration;

#[test]
fn faster_method_wins() {
    assert_eq!(
        choose(Duration::from_micros(900), Duration::from_micros(300)),
        CopyStrategy::Persistent
    );
    assert_eq!(
        choose(Duration::from_micros(300), Duration::from_micros(900)),
        CopyStrategy::Transient
    );
}

#[test]
fn ties_favor_the_transient_method() {
    let t = Duration::from_micros(500);
    assert_eq!(choose(t, t), CopyStrategy::Transient);
}

#[test]
fn failed_benchmark_never_wins() {
    assert_eq!(
        choose(Duration::from_micros(1), Duration::MAX),
        CopyStrategy::Transient
    );
    assert_eq!(
        choose(Duration::MAX, Duration::from_micros(1)),
        CopyStrategy::Persistent
    );
}

#[test]
fn row_stride_is_aligned_for_buffer_copies() {
    assert_eq!(padded_bytes_per_row(64), 256);
    assert_eq!(padded_bytes_per_row(100), 512);
    assert_eq!(padded_bytes_per_row(2048), 2048 * 4);
}
