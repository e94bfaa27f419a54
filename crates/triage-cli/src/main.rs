mod cmd;
mod interval;
mod output;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "gh-triage",
    about = "Triage GitHub issues and pull requests through unread notifications",
    long_about = "Triage GitHub issues and pull requests through unread notifications.\n\n\
                  Each profile decides, by rule, which notifications are opened in the \
                  browser, which are marked as read and which are listed.",
    version,
    disable_version_flag = true
)]
struct Cli {
    // Long form only: `-V` is --verbose.
    /// Print version
    #[arg(long, action = clap::ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,

    /// Profile name for the configuration file (default: the default profile)
    #[arg(short = 'p', long, default_value = "")]
    profile: String,

    /// Keep running and triage on a fixed interval
    #[arg(short = 'w', long)]
    watch: bool,

    /// Interval for watch mode (e.g. 5min, 1hour, 1h30m)
    #[arg(short = 'i', long, default_value = "5min")]
    interval: String,

    /// Verbose output
    #[arg(short = 'V', long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else if cli.watch {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = cmd::triage::run(cmd::triage::Options {
        profile: cli.profile,
        watch: cli.watch,
        interval: cli.interval,
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
