use std::path::PathBuf;
use std::process::ExitCode;

use angle_survey::api::CameraAngleSurvey;
use angle_survey::core::survey::{SurveyConfig, SurveyError};
use log::{error, info};

const USAGE: &str = "usage: angle-survey [CONFIG.json5] [DATASET_PATH]\n\
exit status: 0 ok, 1 run failed, 2 dataset root missing or not a directory";

fn load_config() -> Result<SurveyConfig, SurveyError> {
    let mut args = std::env::args().skip(1);
    let mut config = match args.next() {
        Some(path) => SurveyConfig::from_file(&PathBuf::from(path))?,
        None => SurveyConfig::default(),
    };
    if let Some(dataset) = args.next() {
        config.dataset_path = PathBuf::from(dataset);
    }
    Ok(config)
}

fn main() -> ExitCode {
    angle_survey::init_logging();

    if std::env::args().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let result = load_config()
        .and_then(CameraAngleSurvey::create)
        .and_then(|survey| survey.run_and_write());

    match result {
        Ok((report, written)) => {
            for summary in &report.action_summaries {
                info!("{}: {}", summary.action, summary.summary);
            }
            for path in written {
                println!("{}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) if e.is_fatal() => {
            error!("❌ Dataset unusable: {}", e);
            eprintln!("{}", USAGE);
            ExitCode::from(2)
        }
        Err(e) => {
            error!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}
