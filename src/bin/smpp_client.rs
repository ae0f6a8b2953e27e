// ABOUTME: smpp_client binary: binds one SMPP transmitter session and keeps it open until Ctrl-C
// ABOUTME: Exit status is non-zero when the bind fails

use smpp_client::cli::{self, AUTHOR, CliArgs, Command, NAME, VERSION};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> ExitCode {
    let args: CliArgs = argh::from_env();

    if args.version {
        println!("{NAME} {VERSION}");
        println!("{AUTHOR}");
        return ExitCode::SUCCESS;
    }

    let level = if args.debugging {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("{NAME}: unable to install logger: {e}");
    }

    match args.command {
        Some(Command::RunClient(_)) => ExitCode::from(cli::exit_status(&cli::run(&args).await)),
        None => {
            eprintln!("{NAME}: no command given, try --help");
            ExitCode::from(2)
        }
    }
}
