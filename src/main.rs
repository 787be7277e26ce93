use clap::Parser;

use smartlinker::config::{Cli, Command, LoggingConfig, init_config};
use smartlinker::runtime::modes;
use smartlinker::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match init_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    // CLI 模式只输出警告以上的日志，避免干扰报表输出
    let logging = if cli.is_server_mode() {
        config.logging.clone()
    } else {
        LoggingConfig {
            level: "warn".to_string(),
            ..config.logging.clone()
        }
    };
    let _guard = match init_logging(&logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            std::process::exit(1);
        }
    };

    match cli.command {
        None | Some(Command::Serve) => modes::server::run_server(config).await,
        #[cfg(feature = "cli")]
        Some(command) => {
            if let Err(e) = modes::cli::run_cli(&command, &config) {
                eprintln!("{}", e.format_simple());
                std::process::exit(1);
            }
            Ok(())
        }
        #[cfg(not(feature = "cli"))]
        Some(_) => {
            eprintln!("CLI commands are not available in this build");
            std::process::exit(1);
        }
    }
}
