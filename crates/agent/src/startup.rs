use std::path::Path;
use std::sync::Arc;

use adapters::alert::file_tailer::AlertFileTailer;
use adapters::alert::json_decoder::JsonAlertDecoder;
use adapters::controller::log_flow_adapter::LogFlowRuleAdapter;
use adapters::controller::rest_flow_adapter::RestFlowRuleAdapter;
use adapters::controller::switch_poller::SwitchPoller;
use adapters::metrics::noop_sink::NoopMetricsSink;
use adapters::metrics::pushgateway_sink::PushgatewaySink;
use application::blocked_source_registry::BlockedSourceRegistry;
use application::datapath_lifecycle::DatapathLifecycleService;
use application::datapath_registry::DatapathRegistry;
use application::enforcement_gateway::EnforcementGateway;
use application::metrics_aggregator::MetricsAggregator;
use application::mitigation_engine::{FlushMode, MitigationEngine};
use infrastructure::config::{AgentConfig, FlushModeConfig, MetricsConfig, mask_url_credentials};
use infrastructure::constants::{DATAPATH_EVENT_CHANNEL_CAPACITY, GRACEFUL_SHUTDOWN_TIMEOUT};
use infrastructure::logging::init_logging;
use infrastructure::metrics::MitigationMetrics;
use ports::secondary::flow_rule_port::FlowRulePort;
use ports::secondary::metrics_port::MetricsPort;
use ports::secondary::metrics_sink::MetricsSink;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::shutdown::create_shutdown_token;

/// Run the agent startup sequence and block until shutdown.
#[allow(clippy::too_many_lines)] // startup is sequential wiring
pub async fn run(cli: &Cli) -> anyhow::Result<()> {
    // ── 1. Load config ──────────────────────────────────────────────
    let config = AgentConfig::load(Path::new(&cli.config))?;

    // ── 2. Initialize logging ───────────────────────────────────────
    // CLI flags take precedence over config file
    let log_level = cli.log_level.unwrap_or(config.agent.log_level);
    let log_format = cli.log_format.unwrap_or(config.agent.log_format);
    init_logging(log_level, log_format)?;

    // Service root span. Fields appear in every log entry on this task.
    let _root_span = tracing::span!(
        tracing::Level::INFO,
        "service",
        service.name = "fabricguard",
        service.version = env!("CARGO_PKG_VERSION"),
    )
    .entered();

    info!(
        config_path = %cli.config,
        log_level = log_level.as_str(),
        log_format = log_format.as_str(),
        "fabricguard agent starting"
    );

    // ── 3. Metrics registry and sink ────────────────────────────────
    let metrics = Arc::new(MitigationMetrics::new());
    let metrics_port = Arc::clone(&metrics) as Arc<dyn MetricsPort>;
    let sink = build_sink(&config.metrics)?;

    // ── 4. Controller adapters ──────────────────────────────────────
    let flow_rules: Arc<dyn FlowRulePort> = if config.controller.dry_run {
        warn!("controller dry run enabled, drop rules will only be logged");
        Arc::new(LogFlowRuleAdapter)
    } else {
        Arc::new(RestFlowRuleAdapter::new(
            &config.controller.url,
            config.controller.request_timeout(),
        )?)
    };
    let poller = SwitchPoller::new(&config.controller.url, config.controller.request_timeout())?;
    info!(
        controller = %mask_url_credentials(&config.controller.url),
        dry_run = config.controller.dry_run,
        drop_priority = config.controller.drop_priority,
        "controller adapters initialized"
    );

    // ── 5. Shared state and services ────────────────────────────────
    let datapaths = Arc::new(DatapathRegistry::new());
    let blocked = Arc::new(BlockedSourceRegistry::new());
    let gateway = Arc::new(
        EnforcementGateway::new(
            Arc::clone(&datapaths),
            flow_rules,
            Arc::clone(&metrics_port),
        )
        .with_drop_priority(
            config.controller.drop_priority,
            config.controller.default_flow_priority,
        )?,
    );

    let aggregator = MetricsAggregator::new(Arc::clone(&metrics_port), sink)
        .with_job(config.metrics.job.clone())
        .with_push_timeout(config.metrics.push_timeout());
    let flush_mode = match config.metrics.flush_mode {
        FlushModeConfig::PerAlert => FlushMode::PerAlert,
        FlushModeConfig::Interval => FlushMode::Interval(config.metrics.flush_interval()),
    };
    let trigger = config.alerts.trigger_policy()?;
    info!(
        trigger_keyword = trigger.keyword(),
        flush_mode = ?flush_mode,
        job = %config.metrics.job,
        "mitigation engine initialized"
    );
    let engine = MitigationEngine::new(
        trigger,
        Arc::clone(&blocked),
        Arc::clone(&gateway),
        aggregator,
    )
    .with_flush_mode(flush_mode);

    let lifecycle = DatapathLifecycleService::new(
        Arc::clone(&datapaths),
        Arc::clone(&blocked),
        Arc::clone(&gateway),
    )
    .with_table_miss(config.controller.install_table_miss)
    .with_replay_on_join(config.controller.replay_on_join);

    // ── 6. Alert source ─────────────────────────────────────────────
    let tailer = AlertFileTailer::open(
        &config.alerts.path,
        JsonAlertDecoder::new(config.alerts.fields.clone()),
    )?
    .with_metrics(Arc::clone(&metrics_port));

    // ── 7. Spawn tasks ──────────────────────────────────────────────
    let cancel_token = create_shutdown_token();
    let (alert_tx, alert_rx) = mpsc::channel(config.alerts.channel_capacity);
    let (event_tx, event_rx) = mpsc::channel(DATAPATH_EVENT_CHANNEL_CAPACITY);

    let lifecycle_handle = tokio::spawn(lifecycle.run(event_rx, cancel_token.clone()));
    let poller_handle = tokio::spawn(poller.run(
        event_tx,
        config.controller.switch_poll_interval(),
        cancel_token.clone(),
    ));
    let engine_handle = tokio::spawn(engine.run(alert_rx, cancel_token.clone()));
    let tailer_handle = tokio::spawn(tailer.run(
        alert_tx,
        config.alerts.poll_interval(),
        cancel_token.clone(),
    ));

    // ── 8. Ready, wait for cancellation ─────────────────────────────
    info!(alert_log = %config.alerts.path, "agent ready, waiting for shutdown signal");
    cancel_token.cancelled().await;

    // ── 9. Ordered shutdown ─────────────────────────────────────────
    info!("shutdown phase 1: stopping alert tailer and switch poller");
    await_task("alert_tailer", tailer_handle).await;
    await_task("switch_poller", poller_handle).await;

    info!("shutdown phase 2: draining mitigation engine and datapath events");
    await_task("mitigation_engine", engine_handle).await;
    await_task("datapath_lifecycle", lifecycle_handle).await;

    info!(
        blocked_sources = blocked.len(),
        datapaths = datapaths.len(),
        "agent stopped"
    );
    Ok(())
}

fn build_sink(config: &MetricsConfig) -> anyhow::Result<Arc<dyn MetricsSink>> {
    match config.pushgateway_url {
        Some(ref url) => {
            info!(
                pushgateway = %mask_url_credentials(url),
                job = %config.job,
                "pushing metrics to Pushgateway"
            );
            Ok(Arc::new(PushgatewaySink::new(url, config.push_timeout())?))
        }
        None => {
            info!("no Pushgateway configured, metrics stay in memory");
            Ok(Arc::new(NoopMetricsSink))
        }
    }
}

async fn await_task(name: &str, handle: JoinHandle<()>) {
    match tokio::time::timeout(GRACEFUL_SHUTDOWN_TIMEOUT, handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(task = name, error = %e, "task panicked during shutdown"),
        Err(_) => warn!(
            task = name,
            timeout_secs = GRACEFUL_SHUTDOWN_TIMEOUT.as_secs(),
            "task did not stop in time"
        ),
    }
}
