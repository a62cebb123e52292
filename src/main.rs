use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "taskdeck-data";

#[tokio::main]
async fn main() {
    let data_dir = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TASKDECK_DATA_DIR").ok())
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    if let Err(error) = taskdeck_lib::logging::init_logging(&data_dir) {
        eprintln!("failed to initialize logging: {error}");
    }

    if let Err(error) = taskdeck_lib::run(data_dir).await {
        log::error!("taskdeck failed: {error}");
        eprintln!("taskdeck failed: {error}");
        std::process::exit(1);
    }
}
