use clap::Parser;
use miette::Result;
use roster::cli::helpers::find_project;
use roster::cli::{Cli, Commands, GlobalOpts};
use roster::core::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(&global);

    match cli.command {
        Commands::Init(args) => roster::cli::commands::init::run(args, &global).await,
        Commands::Status(args) => roster::cli::commands::status::run(args, &global).await,
        Commands::Unit(cmd) => roster::cli::commands::unit::run(cmd, &global).await,
        Commands::Person(cmd) => roster::cli::commands::person::run(cmd, &global).await,
        Commands::Export(args) => roster::cli::commands::transfer::run_export(args, &global).await,
        Commands::Import(args) => roster::cli::commands::transfer::run_import(args, &global).await,
        Commands::Passkey(cmd) => roster::cli::commands::passkey::run(cmd, &global).await,
        Commands::Config(cmd) => roster::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => roster::cli::commands::completions::run(args),
    }
}

/// Diagnostics go to stderr: `-v` forces debug, otherwise RUST_LOG, then
/// the `log` config key, then warnings only
fn init_tracing(global: &GlobalOpts) {
    let filter = if global.verbose {
        EnvFilter::new("roster=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let config = Config::load_for(find_project(global).ok().as_ref());
            config
                .log
                .as_deref()
                .and_then(|directives| EnvFilter::try_new(directives).ok())
                .unwrap_or_else(|| EnvFilter::new("warn"))
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
