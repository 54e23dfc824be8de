use std::path::Path;

use anyhow::Context;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::Appender;
use log4rs::config::Logger;
use log4rs::config::Root;
use log4rs::Config;

const LOG_FILE_NAME: &str = "tx-chain.log";

/// The more verbose of the command line and config levels, `Info` if neither is set
fn effective_level(
    cmdline_log_level: Option<LevelFilter>,
    config_log_level: Option<LevelFilter>,
) -> LevelFilter {
    let config_level = config_log_level.unwrap_or(LevelFilter::Info);
    match cmdline_log_level {
        Some(cmdline_level) if cmdline_level > config_level => cmdline_level,
        Some(_) | None => config_level,
    }
}

pub fn setup_log(
    cmdline_log_level: Option<LevelFilter>,
    config_log_level: Option<LevelFilter>,
    data_dir: &Path,
) -> Result<(), anyhow::Error> {
    let stdout = ConsoleAppender::builder().build();

    let window_size = 3; // log0, log1, log2
    let roller_pattern = data_dir.join(format!("{LOG_FILE_NAME}{{}}"));
    let fixed_window_roller = FixedWindowRoller::builder()
        .build(&roller_pattern.to_string_lossy(), window_size)
        .map_err(|e| anyhow::anyhow!("invalid log roller pattern: {e}"))?;

    let size_limit = 5 * 1024 * 1024; // 5MB as max log file size to roll
    let size_trigger = SizeTrigger::new(size_limit);

    let compound_policy =
        CompoundPolicy::new(Box::new(size_trigger), Box::new(fixed_window_roller));

    let log_level = effective_level(cmdline_log_level, config_log_level);
    let log_path = data_dir.join(LOG_FILE_NAME);
    let logfile = RollingFileAppender::builder()
        .build(&log_path, Box::new(compound_policy))
        .with_context(|| format!("cannot open log file {}", log_path.display()))?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .logger(
            Logger::builder()
                .appender("logfile")
                .appender("stdout")
                .additive(false)
                .build("tx_chain", log_level),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("logfile")
                .build(LevelFilter::Info),
        )?;

    log4rs::init_config(config)?;

    log_panics::init();
    Ok(())
}
