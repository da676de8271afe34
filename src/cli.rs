use crate::{
    config::{resolve_rules_path, Config, Secrets},
    dispatch::Dispatcher,
    lifecycle::RetryPolicy,
    report::RunReport,
    select::{collect_sources, SelectionRules, SourceFile},
    service::{
        http::build_client, ClientCredentials, CredentialProvider, HttpQuickCommandApi,
        ResultPayload,
    },
    tracker::build_filers,
    translate::translate,
    util::ensure_dir,
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "qc-review")]
#[command(about = "Submit repository files to quick-command analysis and file the findings as issues")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./qc-review.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze every selected file and file the findings.
    Run {
        #[arg(long, default_value = ".")]
        repo: PathBuf,
        /// Quick-command slug; overrides service.job_slug.
        #[arg(long, env = "QC_SLUG")]
        slug: Option<String>,
        /// Seconds of polling before a job is restarted.
        #[arg(long, env = "QC_TIMEOUT_LIMIT")]
        timeout_limit: Option<u64>,
        #[arg(long)]
        max_restarts: Option<u32>,
        /// Log findings instead of filing them.
        #[arg(long)]
        dry_run: bool,
    },
    /// List the files the rule file selects.
    Select {
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },
    /// Turn a saved callback response into findings.
    Translate {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        source_label: Option<String>,
    },
    /// Check that the credential exchange works.
    Auth {},
}

pub async fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref())?;
    let mut cfg = Config::load(&cfg_path)?;
    let _guard = init_logging(&args, &cfg)?;

    match args.cmd {
        Command::Run {
            repo,
            slug,
            timeout_limit,
            max_restarts,
            dry_run,
        } => {
            if let Some(slug) = slug {
                cfg.service.job_slug = slug;
            }
            if let Some(t) = timeout_limit {
                cfg.polling.timeout_limit_seconds = t;
            }
            if max_restarts.is_some() {
                cfg.polling.max_restarts = max_restarts;
            }
            if dry_run {
                cfg.tracker.backends = vec!["dry_run".into()];
            }
            run(&cfg, &repo, dry_run).await
        }
        Command::Select { repo } => select(&cfg, &repo),
        Command::Translate {
            input,
            source_label,
        } => translate_file(&input, source_label.as_deref()),
        Command::Auth {} => auth(&cfg).await,
    }
}

fn resolve_config_path(user: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = user {
        return Ok(p.to_path_buf());
    }
    let default = PathBuf::from("qc-review.toml");
    if default.exists() {
        Ok(default)
    } else {
        Ok(PathBuf::from("qc-review.example.toml"))
    }
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .boxed()
    };

    let file_path = if cfg.logging.write_to_file && !cfg.logging.file_path.is_empty() {
        Some(PathBuf::from(&cfg.logging.file_path))
    } else {
        None
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(&path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

async fn run(cfg: &Config, repo: &Path, dry_run: bool) -> Result<()> {
    cfg.validate()?;
    let secrets = Secrets::from_env(cfg)?;

    if cfg.debug.dump_effective_config {
        let raw = toml::to_string(cfg).unwrap_or_default();
        info!("effective config:\n{raw}");
    }

    let api = HttpQuickCommandApi::new(cfg)?;
    let credential = api
        .acquire_credential(&client_credentials(&secrets))
        .await
        .context("acquiring analysis service credential")?;

    let files = selected_files(cfg, repo)?;

    let client = build_client(Duration::from_secs(cfg.service.request_timeout_seconds))?;
    let filers = build_filers(cfg, &secrets, client, dry_run)?;

    let dispatcher = Dispatcher::new(
        Arc::new(api),
        filers,
        RetryPolicy::from_config(cfg),
        credential,
        cfg.service.job_slug.clone(),
    )
    .with_max_parallel(cfg.global.max_parallel_files);

    let report = dispatcher.run(files).await;
    write_report(cfg, &report)?;
    Ok(())
}

fn select(cfg: &Config, repo: &Path) -> Result<()> {
    let files = selected_files(cfg, repo)?;
    let listing: Vec<_> = files
        .iter()
        .map(|f| {
            serde_json::json!({
                "path": f.path,
                "payload_bytes": f.payload.len(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

fn translate_file(input: &Path, source_label: Option<&str>) -> Result<()> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("reading payload: {}", input.display()))?;
    let payload: ResultPayload =
        serde_json::from_str(&raw).with_context(|| "parsing payload JSON")?;
    let label = source_label
        .map(str::to_string)
        .unwrap_or_else(|| input.display().to_string());
    let findings = translate(&payload, &label);
    println!("{}", serde_json::to_string_pretty(&findings)?);
    Ok(())
}

async fn auth(cfg: &Config) -> Result<()> {
    // Tracker tokens are irrelevant to the exchange.
    let mut client_only = cfg.clone();
    client_only.tracker.backends.clear();
    let secrets = Secrets::from_env(&client_only)?;
    let api = HttpQuickCommandApi::new(cfg)?;
    api.acquire_credential(&client_credentials(&secrets))
        .await
        .context("acquiring analysis service credential")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "realm": secrets.realm,
            "status": "ok"
        }))?
    );
    Ok(())
}

fn client_credentials(secrets: &Secrets) -> ClientCredentials {
    ClientCredentials {
        client_id: secrets.client_id.clone(),
        client_secret: secrets.client_secret.clone(),
        realm: secrets.realm.clone(),
    }
}

fn selected_files(cfg: &Config, repo: &Path) -> Result<Vec<SourceFile>> {
    let workspace = std::env::var(&cfg.env.workspace).ok();
    let rules_path = resolve_rules_path(cfg, repo, workspace.as_deref());
    let rules = SelectionRules::load(&rules_path)?;
    collect_sources(repo, &rules, cfg)
}

fn write_report(cfg: &Config, report: &RunReport) -> Result<()> {
    let summary = report.summary();
    info!(
        "run finished: {} files, {} processed, {} skipped, {} failed, {} issues filed",
        summary.files, summary.processed, summary.skipped, summary.failed, summary.issues_filed
    );

    if cfg.output.write_report_json {
        let path = PathBuf::from(&cfg.output.report_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(report)?)
            .with_context(|| format!("writing report: {}", path.display()))?;
    }

    if cfg.global.print_summary {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
