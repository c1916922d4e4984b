use anyhow::Context;
use clap::Parser;
use sos_utils::utils::{logger, validation::Validate};
use sos_utils::{CliConfig, QueryEngine, RestClient, SosError, TomlConfig};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting sos-utils");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    match run(&config).await {
        Ok(output) => print!("{}", output),
        Err(e) => {
            // 錯誤碼沿用 SosError 的分類，其餘視為一般失敗
            let exit_code = e.downcast_ref::<SosError>().map_or(1, SosError::code);
            tracing::error!("❌ Request failed: {:#}", e);
            eprintln!("❌ {:#}", e);
            std::process::exit(exit_code);
        }
    }
}

async fn run(config: &CliConfig) -> anyhow::Result<String> {
    config.validate()?;

    let file = match &config.config {
        Some(path) => {
            let file = TomlConfig::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            file.validate()?;
            Some(file)
        }
        None => None,
    };

    // 命令列參數逐欄覆蓋設定檔
    let context = config.client_context(file.as_ref())?;
    tracing::debug!("Connecting to {}", context.base_url());

    let view = config.view_options(file.as_ref())?;
    let request = config.service_request()?;

    let engine = QueryEngine::new(RestClient::new(context)?);
    let output = engine.run(request, &view).await?;
    Ok(output)
}
