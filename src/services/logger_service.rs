use tracing_subscriber::{EnvFilter, fmt};

pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::from_default_env()
        .add_directive("foodgram=debug".parse()?)
        .add_directive("tower_http=info".parse()?)
        .add_directive("sea_orm=info".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(filter).try_init()?;

    Ok(())
}
