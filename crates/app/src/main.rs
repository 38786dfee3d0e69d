use std::{process::ExitCode, rc::Rc};

use engine::{Engine, FileStore};

mod actions;
mod config;
mod error;
mod render;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let (settings, action) = match config::load() {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "levelquote={level},engine={level}",
            level = settings.level
        ))
        .with_writer(std::io::stderr)
        .init();

    match run(settings, action).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("{}", err.operator_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: config::AppConfig, action: config::Action) -> error::Result<()> {
    let default_vertical = settings.default_vertical()?;
    let calculator = settings.calculator()?;

    std::fs::create_dir_all(&settings.data_dir)?;
    let data_dir = settings.data_dir.clone();
    let Some(store) = engine::wait_for("data directory", settings.retry_policy(), || {
        FileStore::open(&data_dir).ok()
    })
    .await
    else {
        tracing::warn!("data directory {data_dir} is not available, nothing done");
        return Ok(());
    };
    tracing::debug!("using data directory {}", store.root().display());

    let mut engine = Engine::builder()
        .store(store)
        .price_source(calculator)
        .renderer(Rc::new(render::ConsoleRenderer))
        .tax_rate_bps(settings.tax_rate_bps)
        .build();

    actions::run(&mut engine, action, default_vertical)
}
