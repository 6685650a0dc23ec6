use quote_gateway::{app, config, Result};

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::load_from_env()?;
    app::run(config).await
}
