use qc_review::config::{resolve_rules_path, Config, Secrets};
use qc_review::error::ConfigError;
use qc_review::lifecycle::RetryPolicy;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[test]
fn parse_example_config() {
    let raw = include_str!("../qc-review.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.polling.transport_retry_cap, 3);
    assert_eq!(cfg.polling.max_restarts, None);

    let policy = RetryPolicy::from_config(&cfg);
    assert_eq!(policy.poll_interval, Duration::from_secs(5));
    assert_eq!(policy.max_restarts, None);
}

#[test]
fn validate_rejects_unusable_settings() {
    let mut cfg = Config::default();
    assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

    cfg.service.job_slug = "review".into();
    cfg.tracker.backends = vec!["dry_run".into()];
    assert!(cfg.validate().is_ok());

    cfg.polling.interval_seconds = 0;
    assert!(cfg.validate().is_err());
    cfg.polling.interval_seconds = 5;

    cfg.tracker.backends = vec!["trello".into()];
    assert!(cfg.validate().is_err());

    cfg.tracker.backends = vec!["github".into()];
    assert!(cfg.validate().is_err());
}

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn secrets_require_client_and_enabled_tracker_tokens() {
    let cfg = Config::default();
    let vars = env(&[
        ("CLIENT_ID", "id"),
        ("CLIENT_SECRET", "secret"),
        ("CLIENT_REALM", "acme"),
    ]);

    let err = Secrets::from_lookup(&cfg, |k| vars.get(k).cloned()).unwrap_err();
    assert_eq!(err, ConfigError::MissingEnv("JIRA_API_TOKEN".into()));

    let mut dry = cfg.clone();
    dry.tracker.backends = vec!["dry_run".into()];
    let secrets = Secrets::from_lookup(&dry, |k| vars.get(k).cloned()).unwrap();
    assert_eq!(secrets.realm, "acme");
    assert!(secrets.jira_token.is_none());

    let missing = env(&[("CLIENT_ID", "id"), ("CLIENT_REALM", "acme")]);
    let err = Secrets::from_lookup(&dry, |k| missing.get(k).cloned()).unwrap_err();
    assert_eq!(err, ConfigError::MissingEnv("CLIENT_SECRET".into()));
}

#[test]
fn rules_path_prefers_workspace() {
    let cfg = Config::default();
    let repo = Path::new("/repo");
    assert_eq!(
        resolve_rules_path(&cfg, repo, Some("/ws")),
        Path::new("/ws/scripts/define-scannable-files.yaml")
    );
    assert_eq!(
        resolve_rules_path(&cfg, repo, None),
        Path::new("/repo/scripts/define-scannable-files.yaml")
    );
}
