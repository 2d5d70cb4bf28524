use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        FrescoError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        FrescoError::unknown_filter_type("Sparkle")
            .to_string()
            .contains("unknown filter type: Sparkle")
    );
    assert!(
        FrescoError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert!(
        FrescoError::acceleration("x")
            .to_string()
            .contains("acceleration error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FrescoError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
