use clap::{Parser, Subcommand};
use rgenai_studio::{
    logger::{self, LogLevel, LoggerConfig},
    GeminiClient, GeminiConfig, Studio, Tab,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "rgenai-studio", version, about = "AI image studio: remove backgrounds and generate images with Gemini")]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Remove the background of an image
    Remove {
        input: PathBuf,
        /// Directory to write background-removed.png into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Generate an image from a text prompt
    Generate {
        prompt: String,
        /// Directory to write the result into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
        /// Also cut the generated image out of its background
        #[arg(long)]
        remove_background: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Info };
    let log_config = if cli.json_logs {
        LoggerConfig::production().with_level(level)
    } else {
        LoggerConfig::new().with_level(level)
    };
    if let Err(e) = logger::init_with_config(log_config) {
        eprintln!("{}", e);
    }

    if dotenv_loaded {
        log::debug!("✅ .env file loaded");
    } else {
        log::debug!("No .env file found, using system environment variables");
    }

    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match run(cli.command).await {
        Ok(saved) => {
            for path in saved {
                println!("{}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> rgenai_studio::Result<Vec<PathBuf>> {
    let config = GeminiConfig::from_env();
    logger::log_config_info(&config);

    let client = GeminiClient::new(config)?;
    let mut studio = Studio::new(client);

    match command {
        Command::Remove { input, output } => {
            studio.select_tab(Tab::Remover);
            studio.remover_mut().upload(&input).await?;
            studio.remove_background().await?;
            Ok(vec![studio.remover().download(&output).await?])
        }
        Command::Generate {
            prompt,
            output,
            remove_background,
        } => {
            studio.select_tab(Tab::Generator);
            studio.generator_mut().set_prompt(prompt);
            studio.generate().await?;
            let mut saved = vec![studio.generator().download(&output).await?];

            if remove_background {
                studio.generator().use_for_background_removal()?;
                studio.process_events();
                if let Some(message) = studio.remover().error() {
                    return Err(rgenai_studio::StudioError::Read(message.to_string()));
                }
                studio.remove_background().await?;
                saved.push(studio.remover().download(&output).await?);
            }

            Ok(saved)
        }
    }
}
