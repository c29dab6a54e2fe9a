use clap::Parser;
use colored::*;
use pkgver_cli::app::{App, Outcome};
use pkgver_cli::logging::init_logging;
use pkgver_cli::settings::{Cli, Settings};

const EXIT_OK: i32 = 0;
const EXIT_ERROR: i32 = 1;
const CANCELLED_MESSAGE: &str = "Operation cancelled by user";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let settings = Settings::from_cli(cli);

    if let Err(err) = init_logging(settings.verbose) {
        eprintln!("{}", format!("warning: {}", err).bright_yellow());
    }

    let app = App::new(settings);

    let code = tokio::select! {
        result = app.run() => match result {
            Ok(Outcome::Completed) => EXIT_OK,
            Ok(Outcome::Cancelled) => {
                println!("\n{}", CANCELLED_MESSAGE);
                EXIT_OK
            }
            Err(err) => {
                eprintln!(
                    "\n{}",
                    format!("An unexpected error occurred: {:#}", err).bright_red()
                );
                EXIT_ERROR
            }
        },
        _ = tokio::signal::ctrl_c() => {
            let _ = console::Term::stderr().show_cursor();
            println!("\n{}", CANCELLED_MESSAGE);
            EXIT_OK
        }
    };

    std::process::exit(code);
}
