use std::path::PathBuf;
use std::process::ExitCode;

use zuber_service::config::AnalysisConfig;
use zuber_service::logging::{self, Stage};
use zuber_service::pipeline;

fn main() -> ExitCode {
    // Optional first argument: path to a TOML config file.
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);

    let config = match AnalysisConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
    };

    logging::init_logger(config.log_level, config.log_file.as_deref(), false);

    match pipeline::run(&config) {
        Ok(summary) => {
            logging::debug(
                Stage::System,
                None,
                &format!(
                    "Run complete: charts {} and {}",
                    summary.charts[0].display(),
                    summary.charts[1].display()
                ),
            );
            ExitCode::SUCCESS
        }
        Err(e) if e.is_path_not_found() => {
            logging::error(Stage::System, None, &e.to_string());
            ExitCode::from(1)
        }
        Err(e) => {
            logging::error(Stage::System, None, &format!("Run aborted: {}", e));
            ExitCode::from(1)
        }
    }
}
