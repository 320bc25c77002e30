use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use bizhub_api::{build_router, AppState};
use bizhub_core::repositories::ActivityRecorder;
use bizhub_core::services::{
    ActivityService, AuthService, CatalogService, ComplaintService, ContractService, HumanitarianOrgService,
    HumanitarianRenewalService, ParkingDirectoryService, ProviderService, RenewalService, StatisticsService,
    UserService,
};
use bizhub_infrastructure::{
    create_pool, run_migrations, ActivityLogger, LoggerConfig, PgActivityLogRepository, PgComplaintRepository,
    PgContractRepository, PgHumanitarianOrgRepository, PgHumanitarianRenewalRepository, PgParkingServiceRepository,
    PgProviderRepository, PgRenewalRepository, PgServiceOfferingRepository, PgUserRepository,
};
use bizhub_security::{JwtService, LoginRateLimiter};
use bizhub_shared::config::AppConfig;

mod scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize telemetry; the guard flushes the log file on exit
    let _log_guard = bizhub_shared::telemetry::init_telemetry(&config.logging)?;
    info!("{} starting ({})", config.app.name, config.app.env);

    // Connect to Database
    let pool = create_pool(&config.database).await?;
    info!("Database connection established");

    if config.database.run_migrations {
        run_migrations(&pool).await?;
    }

    // Repositories
    let user_repo = Arc::new(PgUserRepository::new(pool.clone()));
    let contract_repo = Arc::new(PgContractRepository::new(pool.clone()));
    let renewal_repo = Arc::new(PgRenewalRepository::new(pool.clone()));
    let humanitarian_renewal_repo = Arc::new(PgHumanitarianRenewalRepository::new(pool.clone()));
    let complaint_repo = Arc::new(PgComplaintRepository::new(pool.clone()));

    // Audit trail writer
    let (activity_logger, activity_workers) =
        ActivityLogger::new(pool.clone(), LoggerConfig::from(&config.activity_log));
    let recorder: Arc<dyn ActivityRecorder> = Arc::new(activity_logger);

    // Services
    let limiter = Arc::new(LoginRateLimiter::new(config.rate_limit.login_attempts_per_minute));
    let jwt = JwtService::new(config.jwt.secret.clone(), config.jwt.access_token_expiry);

    let users = Arc::new(UserService::new(user_repo.clone(), recorder.clone()));
    let contracts = Arc::new(ContractService::new(
        contract_repo.clone(),
        renewal_repo.clone(),
        recorder.clone(),
    ));

    let state = AppState {
        db: pool.clone(),
        auth: Arc::new(AuthService::new(user_repo.clone(), recorder.clone(), jwt, limiter.clone())),
        users: users.clone(),
        contracts: contracts.clone(),
        renewals: Arc::new(RenewalService::new(contract_repo.clone(), renewal_repo, recorder.clone())),
        humanitarian_renewals: Arc::new(HumanitarianRenewalService::new(
            humanitarian_renewal_repo,
            contract_repo.clone(),
            recorder.clone(),
        )),
        complaints: Arc::new(ComplaintService::new(complaint_repo.clone(), user_repo, recorder.clone())),
        providers: Arc::new(ProviderService::new(
            Arc::new(PgProviderRepository::new(pool.clone())),
            recorder.clone(),
        )),
        humanitarian_orgs: Arc::new(HumanitarianOrgService::new(
            Arc::new(PgHumanitarianOrgRepository::new(pool.clone())),
            recorder.clone(),
        )),
        parking_services: Arc::new(ParkingDirectoryService::new(
            Arc::new(PgParkingServiceRepository::new(pool.clone())),
            recorder.clone(),
        )),
        catalog: Arc::new(CatalogService::new(
            Arc::new(PgServiceOfferingRepository::new(pool.clone())),
            recorder.clone(),
        )),
        activity: Arc::new(ActivityService::new(Arc::new(PgActivityLogRepository::new(pool.clone())))),
        statistics: Arc::new(StatisticsService::new(complaint_repo, contract_repo)),
        expiring_soon_days: config.scheduler.expiring_soon_days,
    };

    // First administrator
    let bootstrap = &config.bootstrap;
    match users
        .ensure_admin(&bootstrap.admin_name, &bootstrap.admin_email, &bootstrap.admin_password)
        .await
    {
        Ok(Some(admin)) => warn!("Bootstrap administrator created: {}", admin.id),
        Ok(None) => {}
        Err(e) => {
            error!("Failed to create bootstrap administrator: {}", e);
            return Err(e.into());
        }
    }

    // Background jobs
    let sweeper = scheduler::spawn_expiry_sweeper(
        contracts,
        limiter,
        config.scheduler.expiry_check_interval_seconds,
    );

    // Build router
    let app = build_router(state, Duration::from_secs(config.app.request_timeout_seconds));

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    // Start server
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    // Router and services are gone; drain the audit queue before the pool closes
    if let Some(handle) = sweeper {
        handle.abort();
    }
    drop(users);
    drop(recorder);
    activity_workers.shutdown().await;
    pool.close().await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
