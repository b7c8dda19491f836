use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use authprobe::driver::web::WebLauncher;
use authprobe::runner::{ConsoleEventListener, EventEmitter};
use authprobe::utils::config::Config;
use authprobe::{report, runner, scenarios};

#[derive(Parser)]
#[command(name = "authprobe")]
#[command(version = "0.1.0")]
#[command(about = "Browser-driven validation and security checks for registration and login pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenario groups against the application (default)
    Run(RunArgs),

    /// Print the summary of a saved report
    Summary {
        /// Path to a FINAL_REPORT_*.json file
        report: PathBuf,
    },

    /// List scenario groups and their scenarios
    Groups,
}

#[derive(Args, Default)]
struct RunArgs {
    /// Root URL of the application under test
    #[arg(long)]
    base_url: Option<String>,

    /// Run the browser without a window
    #[arg(long, default_value = "false")]
    headless: bool,

    /// Output directory for the report and screenshots
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only run the named group. Can be specified multiple times.
    #[arg(short, long)]
    group: Vec<String>,
}

impl RunArgs {
    fn into_config(self) -> Config {
        let mut config = Config::default();
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if self.headless {
            config.headless = true;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            let groups = scenarios::select_groups(&args.group)?;
            let config = args.into_config();

            println!(
                "{} Testing: {}",
                "▶".green().bold(),
                config.base_url.cyan()
            );
            println!(
                "  Output: {}",
                config.output_dir.display().to_string().cyan()
            );
            if config.headless {
                println!("  Headless: {}", "Enabled".green());
            }

            let (emitter, receiver) = EventEmitter::new();
            let listener = tokio::spawn(ConsoleEventListener::listen(receiver));

            let result = runner::run_harness(&config, &WebLauncher, &groups, &emitter).await;
            drop(emitter);
            let _ = listener.await;
            result?;
        }

        Commands::Summary { report } => {
            println!(
                "{} Summary of: {}",
                "📊".to_string().blue(),
                report.display()
            );
            report::summarize_report(&report)?;
        }

        Commands::Groups => {
            for group in scenarios::all_groups() {
                println!("{} {}", group.name.cyan().bold(), group.title.dimmed());
                for name in group.scenario_names() {
                    println!("    {}", name);
                }
            }
        }
    }

    Ok(())
}
