use nova_class_index::{ConfigError, IndexBuilder, IndexConfig, MergePolicy};

use super::support::class;

#[test]
fn loads_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("class-index.toml");
    std::fs::write(&path, "track_users = false\nmerge_policy = \"replace\"\n").unwrap();

    let config = IndexConfig::load(&path).unwrap();
    assert_eq!(
        config,
        IndexConfig {
            track_users: false,
            merge_policy: MergePolicy::Replace,
        }
    );

    let mut builder = IndexBuilder::with_config(config);
    builder.add_unit(&class("p/A").references("p/B")).unwrap();
    assert_eq!(builder.finish().users("p.B").count(), 0);
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = IndexConfig::load(&path).unwrap_err();
    match err {
        ConfigError::Io { path: reported, .. } => assert!(reported.ends_with("absent.toml")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_values_are_rejected() {
    for text in ["merge_policy = \"newest\"", "track_users = \"yes\"", "[index]\ntrack_users = true"] {
        assert!(
            matches!(IndexConfig::from_toml_str(text), Err(ConfigError::Toml(_))),
            "{text:?}"
        );
    }
}

#[test]
fn config_round_trips_through_toml() {
    let config = IndexConfig {
        track_users: false,
        merge_policy: MergePolicy::KeepExisting,
    };
    let text = toml::to_string(&config).unwrap();
    assert!(text.contains("keep_existing"));
    assert_eq!(IndexConfig::from_toml_str(&text).unwrap(), config);
}
