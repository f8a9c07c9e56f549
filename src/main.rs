use clap::Parser;
use trivia_api::adapters::http;
use trivia_api::app::build_router;
use trivia_api::utils::error::ErrorSeverity;
use trivia_api::utils::{logger, validation::Validate};
use trivia_api::{CliConfig, ConfigProvider, TomlConfig, TriviaError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(cli.verbose, cli.json_logs);

    tracing::info!("Starting trivia-api");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config: Box<dyn ConfigProvider> = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path);
            let file_config = TomlConfig::from_file(path).unwrap_or_else(|e| fail(e));
            exit_if_invalid(&file_config);
            Box::new(file_config)
        }
        None => {
            exit_if_invalid(&cli);
            Box::new(cli.clone())
        }
    };

    let app = build_router(config.as_ref())
        .await
        .unwrap_or_else(|e| fail(e));
    let listener = http::bind(&config.bind_address())
        .await
        .unwrap_or_else(|e| fail(e));

    if let Err(e) = http::serve(listener, app).await {
        fail(e);
    }

    Ok(())
}

fn exit_if_invalid<C: Validate>(config: &C) {
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
}

fn fail(e: TriviaError) -> ! {
    tracing::error!("❌ trivia-api failed: {} (Severity: {:?})", e, e.severity());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
