use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MontageError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        MontageError::manifest("x")
            .to_string()
            .contains("manifest error:")
    );
    assert!(
        MontageError::compile("x")
            .to_string()
            .contains("compile error:")
    );
    assert!(
        MontageError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    assert_eq!(
        MontageError::unknown_effect("mv.nope").to_string(),
        "unknown effect 'mv.nope'"
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MontageError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
