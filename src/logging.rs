use std::path::{Path, PathBuf};

pub const LOG_DIR_NAME: &str = "logs";
pub const LOG_FILE_BASENAME: &str = "taskdeck";
pub const LOG_FILE_SUFFIX: &str = "log";
pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const LOG_ROTATE_KEEP_FILES: usize = 10;

/// `TASKDECK_LOG` wins over `RUST_LOG`; blank values count as unset.
pub fn resolve_log_spec(taskdeck_log: Option<String>, rust_log: Option<String>) -> String {
    // Dependencies stay at WARN; our crate is more verbose in debug builds.
    let default_spec = if cfg!(debug_assertions) {
        "warn,taskdeck_lib=debug,taskdeck=debug"
    } else {
        "warn,taskdeck_lib=info,taskdeck=info"
    };
    taskdeck_log
        .filter(|value| !value.trim().is_empty())
        .or_else(|| rust_log.filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| default_spec.to_string())
}

/// Log files live in their own directory under the data dir.
pub fn log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_DIR_NAME)
}

/// Starts the rotating file logger for `data_dir` and installs the panic hook.
#[cfg(all(feature = "app", not(test)))]
pub fn init_logging(data_dir: &Path) -> Result<(), flexi_logger::FlexiLoggerError> {
    use flexi_logger::{detailed_format, Cleanup, Criterion, Logger, Naming, WriteMode};

    let dir = log_dir(data_dir);
    std::fs::create_dir_all(&dir)?;
    let spec = resolve_log_spec(
        std::env::var("TASKDECK_LOG").ok(),
        std::env::var("RUST_LOG").ok(),
    );

    Logger::try_with_str(&spec)?
        .log_to_file(file_spec(&dir))
        .write_mode(WriteMode::BufferAndFlush)
        .format_for_files(detailed_format)
        .rotate(
            Criterion::Size(LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(LOG_ROTATE_KEEP_FILES),
        )
        .duplicate_to_stdout(stdout_duplicate())
        .start()?;

    install_panic_hook();
    log::info!("logging to dir={} spec={spec}", dir.display());
    Ok(())
}

#[cfg(all(feature = "app", not(test)))]
fn file_spec(dir: &Path) -> flexi_logger::FileSpec {
    flexi_logger::FileSpec::default()
        .directory(dir)
        .basename(LOG_FILE_BASENAME)
        .suffix(LOG_FILE_SUFFIX)
}

/// Debug builds echo INFO and above to the terminal.
#[cfg(all(feature = "app", not(test)))]
fn stdout_duplicate() -> flexi_logger::Duplicate {
    if cfg!(debug_assertions) {
        flexi_logger::Duplicate::Info
    } else {
        flexi_logger::Duplicate::None
    }
}

/// Routes unexpected panics into the log file with a backtrace. Panics inside event
/// handlers are left to the bus, which logs them once and keeps going.
#[cfg(all(feature = "app", not(test)))]
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info: &std::panic::PanicHookInfo<'_>| {
        if crate::events::in_event_handler() {
            return;
        }
        let location = info
            .location()
            .map(ToString::to_string)
            .unwrap_or_else(|| "<unknown>".to_string());
        log::error!(
            "panic at {location}: {}\nbacktrace:\n{}",
            crate::events::panic_message(info.payload()),
            std::backtrace::Backtrace::force_capture()
        );
        default_hook(info);
    }));
}
