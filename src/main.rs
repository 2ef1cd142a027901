use clap::Parser;
use qc_etl::core::{ConfigProvider, Pipeline};
use qc_etl::utils::error::{ErrorSeverity, QcError};
use qc_etl::utils::{logger, validation::Validate};
use qc_etl::{CliConfig, EtlEngine, LocalStorage, QcPipeline, TomlConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 載入 TOML 配置（若有指定），命令列參數優先
    let toml_config = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(mut config) => {
                cli.apply_to(&mut config);
                Some(config)
            }
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => None,
    };

    let verbose = cli.verbose || toml_config.as_ref().is_some_and(|c| c.verbose());
    let json_logs = cli.json_logs || toml_config.as_ref().is_some_and(|c| c.json_logs());
    if json_logs {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("Starting qc-etl v{}", env!("CARGO_PKG_VERSION"));

    let dry_run = cli.dry_run;
    let outcome = match toml_config {
        Some(config) => run(config, dry_run).await,
        None => run(cli, dry_run).await,
    };

    if let Err(e) = outcome {
        tracing::error!(
            "❌ QC report collection failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 1,
            ErrorSeverity::High => 2,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run<C>(config: C, dry_run: bool) -> Result<(), QcError>
where
    C: ConfigProvider + Validate + std::fmt::Debug,
{
    tracing::debug!("Config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        return Err(e);
    }

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = QcPipeline::new(storage, config)?;

    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written");
        let files = pipeline.extract().await?;
        println!("📋 {} matching log files:", files.len());
        for file in &files {
            println!("  [{}] {} -> {}", file.module, file.display_path(), file.sample_name);
        }
        return Ok(());
    }

    let engine = EtlEngine::new(pipeline);
    let output_path = engine.run().await?;

    tracing::info!("✅ QC report collection completed successfully!");
    println!("✅ QC report collection completed successfully!");
    println!("📁 Output saved to: {}", output_path);
    Ok(())
}
