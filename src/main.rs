use log::{error, info};
use menu_extract::{ExtractorConfig, MenuExtractor};
use std::env;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let candidates: Vec<String> = env::args().skip(1).collect();
    if candidates.is_empty() {
        eprintln!("Usage: menu-extract <url> [<url>...]");
        return ExitCode::from(2);
    }

    let config = match ExtractorConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let extractor = match MenuExtractor::builder().config(config).build() {
        Ok(extractor) => extractor,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = extractor.extract_first(&candidates).await;
    if !result.found {
        info!("No menu found in {} candidate(s)", candidates.len());
    }

    match result.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize result: {}", e);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
