use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use env_logger::{Env, Target};
use lazy_static::lazy_static;

lazy_static! {
    pub static ref LOG_FILE_PATH: PathBuf = dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("statify")
        .join("statify.log");
}

/// Send log records to [`LOG_FILE_PATH`] so they stay out of the terminal output.
///
/// `RUST_LOG` takes precedence over the default level.
pub fn init(verbose: bool) -> color_eyre::Result<()> {
    if let Some(parent) = LOG_FILE_PATH.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE_PATH.as_path())?;

    let level = if verbose { "statify=debug" } else { "statify=info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(file)))
        .try_init()?;

    Ok(())
}
