#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use super::*;

fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
    move |key: &str| {
        pairs
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| (*value).to_owned())
    }
}

#[test]
fn default_config_is_disabled_modern() {
    let config = DebugInfoConfig::default();
    assert_eq!(config.level, DebugLevel::None);
    assert_eq!(config.schema, MetadataSchema::Modern);
    assert_eq!(config.language, SourceLanguage::C);
    assert_eq!(config.producer, "Ori Compiler");
    assert!(config.optimized);
    assert!(!config.level.is_enabled());
}

#[test]
fn development_enables_full_debug_info() {
    let config = DebugInfoConfig::development();
    assert!(config.level.is_enabled());
    assert_eq!(config.schema, MetadataSchema::Modern);
}

#[test]
fn builder_setters() {
    let config = DebugInfoConfig::new(DebugLevel::Full)
        .with_schema(MetadataSchema::Legacy)
        .with_language(SourceLanguage::Python)
        .with_producer("ori-jit")
        .with_optimized(false);
    assert_eq!(config.schema, MetadataSchema::Legacy);
    assert_eq!(config.language, SourceLanguage::Python);
    assert_eq!(config.producer, "ori-jit");
    assert!(!config.optimized);
}

#[test]
fn schema_for_target() {
    assert_eq!(
        MetadataSchema::for_target("nvptx64-nvidia-cuda"),
        MetadataSchema::Legacy
    );
    assert_eq!(
        MetadataSchema::for_target("x86_64-unknown-linux-gnu"),
        MetadataSchema::Modern
    );
    let config = DebugInfoConfig::for_target(DebugLevel::Full, "nvptx-nvidia-cuda");
    assert_eq!(config.schema, MetadataSchema::Legacy);
    assert_eq!(config.level, DebugLevel::Full);
}

#[test]
fn language_codes() {
    assert_eq!(SourceLanguage::C.dwarf_code(), 0x0002);
    assert_eq!(SourceLanguage::C99.dwarf_code(), 0x000c);
    assert_eq!(SourceLanguage::Python.dwarf_code(), 0x0014);
    assert_eq!(SourceLanguage::Python.token(), "DW_LANG_Python");
}

#[test]
fn level_and_schema_parse_round_trip_through_display() {
    for level in [DebugLevel::None, DebugLevel::Full] {
        assert_eq!(level.to_string().parse::<DebugLevel>(), Ok(level));
    }
    for schema in [MetadataSchema::Modern, MetadataSchema::Legacy] {
        assert_eq!(schema.to_string().parse::<MetadataSchema>(), Ok(schema));
    }
    assert_eq!("1".parse::<DebugLevel>(), Ok(DebugLevel::Full));
    assert_eq!(" FALSE ".parse::<DebugLevel>(), Ok(DebugLevel::None));
    assert_eq!("nvvm".parse::<MetadataSchema>(), Ok(MetadataSchema::Legacy));
}

#[test]
fn from_vars_reads_level_and_schema() {
    let config = DebugInfoConfig::from_vars(vars(&[
        ("ORI_DEBUGINFO", "1"),
        ("ORI_DEBUGINFO_SCHEMA", "legacy"),
    ]))
    .unwrap();
    assert_eq!(config.level, DebugLevel::Full);
    assert_eq!(config.schema, MetadataSchema::Legacy);

    let unset = DebugInfoConfig::from_vars(vars(&[])).unwrap();
    assert_eq!(unset, DebugInfoConfig::default());
}

#[test]
fn from_vars_rejects_unknown_values() {
    assert_eq!(
        DebugInfoConfig::from_vars(vars(&[("ORI_DEBUGINFO", "maybe")])),
        Err(DebugInfoError::UnknownLevel("maybe".into()))
    );
    assert_eq!(
        DebugInfoConfig::from_vars(vars(&[("ORI_DEBUGINFO_SCHEMA", "dwarf9")])),
        Err(DebugInfoError::UnknownSchema("dwarf9".into()))
    );
}

#[test]
fn error_messages() {
    let err = invalid_source_path(Path::new("/"), "path has no file name");
    assert_eq!(
        err.to_string(),
        "invalid source path '/': path has no file name"
    );
    assert_eq!(
        DebugInfoError::UnknownSchema("x".into()).to_string(),
        "unknown metadata schema 'x' (expected modern or legacy)"
    );
}
