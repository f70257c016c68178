use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use fin_analyzer::application::ports::{JobQueue, JobRepository, UserRepository};
use fin_analyzer::application::services::{
    FinancialAnalystFactory, InFlightJobs, StatusService, SubmissionService, WorkerContext,
    WorkerPool,
};
use fin_analyzer::infrastructure::llm::create_llm_client;
use fin_analyzer::infrastructure::observability::{TracingConfig, init_tracing};
use fin_analyzer::infrastructure::persistence::{
    InMemoryJobRepository, InMemoryUserRepository, PgJobRepository, PgUserRepository,
    create_pool, run_migrations,
};
use fin_analyzer::infrastructure::queue::{InMemoryJobQueue, RedisJobQueue};
use fin_analyzer::infrastructure::storage::StagingStoreFactory;
use fin_analyzer::infrastructure::text_processing::PdfTextExtractor;
use fin_analyzer::presentation::config::QueueProviderSetting;
use fin_analyzer::presentation::{AppState, Settings, create_router, shutdown_signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;

    init_tracing(&TracingConfig::from_settings(&settings));

    let (job_repository, user_repository): (Arc<dyn JobRepository>, Arc<dyn UserRepository>) =
        match settings.database.url.as_deref() {
            Some(url) => {
                let pool = create_pool(url, settings.database.max_connections).await?;
                run_migrations(&pool).await?;
                (
                    Arc::new(PgJobRepository::new(pool.clone())),
                    Arc::new(PgUserRepository::new(pool)),
                )
            }
            None => {
                tracing::warn!("No database configured, job state will not survive restarts");
                (
                    Arc::new(InMemoryJobRepository::new()),
                    Arc::new(InMemoryUserRepository::new()),
                )
            }
        };

    let queue: Arc<dyn JobQueue> = match settings.queue.provider {
        QueueProviderSetting::Redis => Arc::new(
            RedisJobQueue::connect(
                &settings.queue.redis_url,
                &settings.queue.queue_name,
                settings.queue.poll_timeout(),
            )
            .await?,
        ),
        QueueProviderSetting::Memory => Arc::new(InMemoryJobQueue::new(
            settings.queue.capacity,
            settings.queue.poll_timeout(),
        )),
    };

    let staging_store = StagingStoreFactory::create(&settings.storage)?;
    let llm_client = create_llm_client(&settings.llm)?;
    tracing::info!(provider = %settings.llm.provider, model = %settings.llm.model, "LLM client ready");

    let analyzer_factory = Arc::new(FinancialAnalystFactory::new(
        llm_client,
        settings.worker.retry.policy(),
        settings.llm.max_document_chars,
    ));

    let submission_service = Arc::new(SubmissionService::new(
        Arc::clone(&job_repository),
        Arc::clone(&user_repository),
        Arc::clone(&staging_store),
        Arc::clone(&queue),
        settings.storage.max_upload_bytes(),
    ));
    let status_service = Arc::new(StatusService::new(
        Arc::clone(&job_repository),
        Arc::clone(&user_repository),
    ));

    let abandoned = WorkerPool::fail_abandoned(job_repository.as_ref(), staging_store.as_ref()).await?;
    if abandoned > 0 {
        tracing::warn!(abandoned, "Failed jobs left processing by a previous run");
    }

    if settings.queue.provider == QueueProviderSetting::Redis {
        let recovered = queue.recover().await?;
        tracing::info!(recovered, "Queue recovery complete");
    }

    let pool = WorkerPool::start(
        settings.worker.concurrency,
        WorkerContext {
            queue: Arc::clone(&queue),
            job_repository: Arc::clone(&job_repository),
            staging_store: Arc::clone(&staging_store),
            extractor: Arc::new(PdfTextExtractor::new(settings.worker.extraction_timeout())),
            analyzer_factory,
            analysis_timeout: settings.worker.analysis_timeout(),
            finalize_retry: settings.worker.retry.policy(),
            in_flight: InFlightJobs::default(),
        },
    );

    if settings.queue.provider == QueueProviderSetting::Memory {
        let submission_service = Arc::clone(&submission_service);
        tokio::spawn(async move {
            match submission_service.republish_queued().await {
                Ok(republished) => tracing::info!(republished, "Republished queued jobs"),
                Err(e) => tracing::error!(error = %e, "Failed to republish queued jobs"),
            }
        });
    }

    let state = AppState {
        submission_service,
        status_service,
        max_upload_bytes: settings.storage.max_upload_bytes(),
    };
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!(
        %addr,
        environment = %settings.environment,
        workers = pool.size(),
        "Listening"
    );

    let shutdown = CancellationToken::new();
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    if let Err(e) = pool.shutdown(settings.worker.shutdown_grace()).await {
        tracing::warn!(error = %e, "Worker pool did not drain cleanly");
    }
    tracing::info!("Shutdown complete");

    Ok(())
}
