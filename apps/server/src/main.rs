use bookshelf_server::{
    api::app_router,
    build_state,
    config::Config,
    events::{ServerEvent, SERVER_READY},
    init_tracing, scheduler,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    let state = build_state(&config).await?;

    if let Some(every) = config.refresh_interval {
        scheduler::start_rate_refresh_scheduler(state.clone(), every);
    }

    let router = app_router(state.clone(), &config)?;
    tracing::info!("Listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    state.event_bus.publish(ServerEvent::new(SERVER_READY));
    axum::serve(listener, router).await?;
    Ok(())
}
