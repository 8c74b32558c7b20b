use filepoint_api::{landlock, setup};
use filepoint_core::Config;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    landlock::linux::init();

    let config = Config::from_env();
    filepoint_infra::init_telemetry("filepoint-api").map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (_state, router) = setup::initialize_app(config.clone()).await?;

    setup::server::start_server(&config, router).await?;

    Ok(())
}
