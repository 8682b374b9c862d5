use std::{fs, time::Duration};

use tempfile::tempdir;
use watchseerr_config::{
    Cadence, ConfigGuardRailError, ConfigLoadError, ConfigLoader,
    ConfigMetadata, EnvConfig, FileConfig,
};
use watchseerr_model::ProfitPolicy;

const FULL_CONFIG: &str = r#"
http_timeout = "5s"

[source]
base_url = "http://lists.local:8080"
username = "cinephile"
password = "letmein"

[catalog]
api_key = "tmdb-key"
enrichment_parallelism = 2

[requests]
base_url = "http://seerr.local:5055"
api_key = "seerr-key"
quota = 4
filters = ["released", "profitable"]
profit_policy = "inclusive"
refresh_backoff = "250ms"

[tasks]
sync_watchlist = "0 */6 * * *"

[storage]
data_dir = "/srv/watchseerr"
"#;

fn required_env() -> EnvConfig {
    EnvConfig {
        source_base_url: Some("http://lists.local".into()),
        source_username: Some("cinephile".into()),
        source_password: Some("letmein".into()),
        catalog_api_key: Some("tmdb-key".into()),
        requests_base_url: Some("http://seerr.local:5055".into()),
        requests_api_key: Some("seerr-key".into()),
        ..EnvConfig::default()
    }
}

fn file_metadata() -> ConfigMetadata {
    ConfigMetadata {
        config_path: Some("watchseerr.toml".into()),
        env_file_loaded: false,
    }
}

#[test]
fn explicit_file_is_loaded() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("watchseerr.toml");
    fs::write(&path, FULL_CONFIG).expect("write config");

    let load = ConfigLoader::new()
        .with_config_path(&path)
        .with_env_file(dir.path().join("missing.env"))
        .load()
        .expect("config loads");
    let config = load.config;

    assert_eq!(config.metadata.config_path.as_deref(), Some(path.as_path()));
    assert_eq!(config.source.username, "cinephile");
    assert_eq!(config.catalog.enrichment_parallelism, 2);
    assert_eq!(config.requests.quota_limit(), Some(4));
    assert_eq!(config.requests.profit_policy, ProfitPolicy::Inclusive);
    assert_eq!(config.requests.refresh_backoff, Duration::from_millis(250));
    assert_eq!(config.http_timeout, Duration::from_secs(5));
    assert_eq!(
        config.tasks.sync_watchlist.cron().map(|c| c.normalized()),
        Some("0 0 */6 * * *")
    );
    assert!(
        config
            .storage
            .ledger_path()
            .ends_with("watchseerr/films.json")
    );
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let err = ConfigLoader::new()
        .with_config_path(dir.path().join("absent.toml"))
        .with_env_file(dir.path().join("missing.env"))
        .load()
        .expect_err("explicit path must exist");

    assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));
}

#[test]
fn environment_overrides_file_values() {
    let file: FileConfig = toml::from_str(FULL_CONFIG).expect("parse");
    let env = EnvConfig {
        requests_quota: Some("-1".into()),
        server_port: Some("8099".into()),
        server_enabled: Some("off".into()),
        request_filters: Some(vec!["dry_run".into()]),
        sync_watchlist: Some("disabled".into()),
        ..required_env()
    };

    let load = ConfigLoader::compose(Some(file), env, file_metadata())
        .expect("compose");

    assert_eq!(load.config.requests.quota_limit(), None);
    assert_eq!(load.config.requests.filters, vec!["dry_run".to_string()]);
    assert_eq!(load.config.tasks.sync_watchlist, Cadence::Disabled);
    assert_eq!(load.config.server.port, 8099);
    assert!(!load.config.server.enabled);
    assert_eq!(load.config.source.base_url.as_str(), "http://lists.local/");
    assert!(
        load.warnings
            .items
            .iter()
            .any(|w| w.message.contains("dry_run"))
    );
}

#[test]
fn defaults_fill_optional_settings() {
    let load = ConfigLoader::compose(
        None,
        required_env(),
        ConfigMetadata::default(),
    )
    .expect("compose");
    let config = load.config;

    assert_eq!(config.requests.quota, -1);
    assert!(config.requests.filters.is_empty());
    assert_eq!(config.requests.profit_policy, ProfitPolicy::Strict);
    assert_eq!(config.requests.refresh_attempts, 3);
    assert_eq!(config.catalog.enrichment_parallelism, 6);
    assert_eq!(config.server.port, 3333);
    assert_eq!(config.source.primary_endpoint, "/watchlist");
    assert!(!config.tasks.sync_watchlist.is_enabled());
    assert!(
        load.warnings
            .items
            .iter()
            .any(|w| w.message.contains("No watchseerr.toml"))
    );
}

#[test]
fn missing_credentials_name_the_env_var() {
    let env = EnvConfig {
        catalog_api_key: None,
        ..required_env()
    };

    let err = ConfigLoader::compose(None, env, ConfigMetadata::default())
        .expect_err("api key required");

    match err {
        ConfigLoadError::MissingField { env, .. } => {
            assert_eq!(env, "TMDB_API_KEY")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn malformed_values_are_rejected() {
    let bad_url = EnvConfig {
        requests_base_url: Some("not a url".into()),
        ..required_env()
    };
    assert!(matches!(
        ConfigLoader::compose(None, bad_url, ConfigMetadata::default()),
        Err(ConfigLoadError::InvalidUrl {
            field: "requests.base_url",
            ..
        })
    ));

    let bad_cron = EnvConfig {
        sync_watchlist: Some("every tuesday".into()),
        ..required_env()
    };
    assert!(matches!(
        ConfigLoader::compose(None, bad_cron, ConfigMetadata::default()),
        Err(ConfigLoadError::Cadence(_))
    ));

    let zero_timeout = EnvConfig {
        http_timeout: Some("0s".into()),
        ..required_env()
    };
    assert!(matches!(
        ConfigLoader::compose(None, zero_timeout, ConfigMetadata::default()),
        Err(ConfigLoadError::GuardRail(
            ConfigGuardRailError::ZeroDuration { .. }
        ))
    ));
}

#[test]
fn zero_parallelism_is_rejected() {
    let file: FileConfig = toml::from_str(
        r#"
        [catalog]
        enrichment_parallelism = 0
        "#,
    )
    .expect("parse");

    let err = ConfigLoader::compose(Some(file), required_env(), file_metadata())
        .expect_err("parallelism must be positive");
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::ZeroParallelism)
    ));
}

#[test]
fn unparsable_numeric_and_flag_overrides_are_fatal() {
    let bad_quota = EnvConfig {
        requests_quota: Some("2x".into()),
        ..required_env()
    };
    assert!(matches!(
        ConfigLoader::compose(None, bad_quota, ConfigMetadata::default()),
        Err(ConfigLoadError::InvalidValue {
            field: "requests.quota",
            ..
        })
    ));

    let bad_port = EnvConfig {
        server_port: Some("70000".into()),
        ..required_env()
    };
    assert!(matches!(
        ConfigLoader::compose(None, bad_port, ConfigMetadata::default()),
        Err(ConfigLoadError::InvalidValue {
            field: "server.port",
            ..
        })
    ));

    let bad_flag = EnvConfig {
        server_enabled: Some("sometimes".into()),
        ..required_env()
    };
    assert!(matches!(
        ConfigLoader::compose(None, bad_flag, ConfigMetadata::default()),
        Err(ConfigLoadError::InvalidValue {
            field: "server.enabled",
            ..
        })
    ));
}
