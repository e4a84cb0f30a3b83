// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, process::ExitCode, sync::Arc};

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use zfs_composition::{
    cache::SampleCache,
    command::ProcessRunner,
    config::{Config, SinkKind},
    emitter::{MetricEmitter, ReportSink, PLUGIN_NAME},
    poller::{Poller, TokioClock},
    sampler::ZfsSampler,
    sinks::{CollectdSink, DogStatsDSink},
};

#[tokio::main]
pub async fn main() -> ExitCode {
    let oneshot = env::args().any(|arg| arg == "--oneshot");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Logging is configured from the config, so this goes straight to stderr
            eprintln!("{PLUGIN_NAME}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let env_filter = format!("zfs_composition={0},zfs_composition_agent={0}", config.log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");
    info!("Loading {PLUGIN_NAME}: {config:?}");

    let sink: Arc<dyn ReportSink> = match config.sink {
        SinkKind::Collectd => Arc::new(CollectdSink::stdout(
            config.hostname.clone(),
            config.read_interval,
        )),
        SinkKind::DogStatsD => {
            match DogStatsDSink::connect(&config.dogstatsd_host, config.dogstatsd_port).await {
                Ok(sink) => Arc::new(sink),
                Err(e) => {
                    error!("Error creating DogStatsD sink: {e}");
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    let runner = Arc::new(ProcessRunner::new(config.command_timeout));
    let poller = Poller::new(
        ZfsSampler::new(runner, &config.zfs_bin),
        SampleCache::new(config.check_interval),
        MetricEmitter::new(sink),
        Arc::new(TokioClock),
    );

    if oneshot {
        return match poller.poll().await {
            Ok(emitted) => {
                info!("Oneshot poll emitted {emitted} metrics");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Poll failed: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let cancel_token = CancellationToken::new();
    tokio::spawn({
        let cancel_token = cancel_token.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => cancel_token.cancel(),
                Err(e) => error!("Unable to listen for shutdown signal: {e}"),
            }
        }
    });

    let mut read_interval = interval(config.read_interval);
    read_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("Shutting down {PLUGIN_NAME}");
                break;
            }
            _ = read_interval.tick() => {
                match poller.poll().await {
                    Ok(emitted) => debug!("Emitted {emitted} metrics"),
                    Err(e) => error!("Poll failed: {e}"),
                }
            }
        }
    }

    ExitCode::SUCCESS
}
