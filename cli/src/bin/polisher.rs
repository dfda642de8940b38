use clap::Parser;
use polisher_cli::commands::Args;
use std::process::ExitCode;
#[macro_use]
extern crate log;

fn main() -> ExitCode {
    let args = Args::parse();
    let config = args.to_config();
    let verbose = match config.as_ref() {
        Ok(config) => config.verbose,
        Err(_) => args.verbose as usize,
    };
    let level = polisher_cli::log_level(verbose);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    let result = config.and_then(|config| {
        let report = polisher::run_pipeline(&config)?;
        match args.report.as_ref() {
            Some(path) => polisher_cli::report::write_report(&report, path),
            None => Ok(()),
        }
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(why) => {
            error!("{}", why);
            ExitCode::from(why.exit_code())
        }
    }
}
