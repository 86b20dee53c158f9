use clap::{ Parser, Subcommand };
use std::fs::OpenOptions;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use api::HttpApi;
use config::Config;
use error::Result;
use navigator::{ Navigator, Opened };
use shell::Shell;

mod api;
mod config;
mod error;
mod models;
mod navigator;
mod paths;
mod shell;
#[cfg(test)]
mod testing;

/// Terminal client for a remote file manager.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// YAML config file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Server base url, overrides `server_url` from the config
    #[arg(short, long)]
    server: Option<String>,

    /// More logging, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the server's drives
    Drives,
    /// List a directory
    Ls {
        path: String,
    },
    /// Print a file, or list it when it is a directory
    Cat {
        path: String,
    },
    /// Write a file from --file or stdin
    Put {
        path: String,
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Create an empty file
    Touch {
        path: String,
    },
    /// Create a folder
    Mkdir {
        path: String,
    },
    /// Delete a file or folder
    Rm {
        path: String,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Rename or move an entry
    Mv {
        old: String,
        new: String,
    },
    /// Upload a local file to a remote path
    Upload {
        local: PathBuf,
        remote: String,
    },
    /// Download a remote file
    Download {
        remote: String,
        /// Target directory, defaults to `download_dir`
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Send free text to the server's prompt action
    Prompt {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Interactive browser (default)
    Shell {
        /// Start here instead of `start_path`
        path: Option<String>,
    },
}

#[derive(Debug, PartialEq)]
enum LogSink {
    Stderr,
    File(PathBuf),
    Off,
}

/// The full-screen shell owns the terminal, so it only logs to a file.
fn log_sink(config: &Config, interactive: bool) -> LogSink {
    match &config.log_file {
        Some(path) => LogSink::File(path.clone()),
        None if interactive => LogSink::Off,
        None => LogSink::Stderr,
    }
}

fn init_logging(config: &Config, verbose: u8, interactive: bool) -> Result<()> {
    let level = match verbose {
        0 => config.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    match log_sink(config, interactive) {
        LogSink::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        LogSink::Stderr => builder.with_writer(std::io::stderr).init(),
        LogSink::Off => {}
    }
    Ok(())
}

fn ask(question: &str) -> bool {
    eprint!("{} [y/N] ", question);
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn print_entries(nav: &Navigator<HttpApi>) {
    for entry in &nav.session().entries {
        let name = if entry.is_dir { format!("{}/", entry.name) } else { entry.name.to_string() };
        println!("{:<40} {}", name, entry.meta_label());
    }
}

fn status_line(nav: &Navigator<HttpApi>, fallback: String) {
    let status = &nav.session().status;
    println!("{}", if status.is_empty() { &fallback } else { status });
}

async fn run(command: Command, config: &Config, mut nav: Navigator<HttpApi>) -> Result<()> {
    debug!(?command, "running");
    match command {
        Command::Drives => {
            for drive in nav.list_drives().await? {
                println!("{}", drive);
            }
        }
        Command::Ls { path } => {
            nav.browse(&path).await?;
            print_entries(&nav);
        }
        Command::Cat { path } => {
            match nav.open(&path).await? {
                Opened::File => print!("{}", nav.session().editor),
                Opened::Directory => print_entries(&nav),
            }
        }
        Command::Put { path, file } => {
            let content = match file {
                Some(file) => tokio::fs::read_to_string(file).await?,
                None => {
                    let mut content = String::new();
                    std::io::stdin().read_to_string(&mut content)?;
                    content
                }
            };
            nav.select(&path);
            nav.save(content).await?;
            status_line(&nav, format!("saved {}", path));
        }
        Command::Touch { path } => {
            nav.create_path(&path, paths::parent_or_root(&path)).await?;
            println!("created {}", path);
        }
        Command::Mkdir { path } => {
            nav.mkdir_path(&path, paths::parent_or_root(&path)).await?;
            println!("created folder {}", path);
        }
        Command::Rm { path, yes } => {
            nav.select(&path);
            let deleted = nav.delete(|path| yes || ask(&format!("Delete {} ?", path))).await?;
            if deleted {
                println!("deleted {}", path);
            }
        }
        Command::Mv { old, new } => {
            nav.browse(paths::parent_or_root(&old)).await?;
            nav.rename(&old, &new).await?;
            println!("renamed {} -> {}", old, new);
        }
        Command::Upload { local, remote } => {
            nav.upload_to(&local, &remote, paths::parent_or_root(&remote)).await?;
            println!("uploaded {}", remote);
        }
        Command::Download { remote, out } => {
            nav.select(&remote);
            let dir = out.unwrap_or_else(|| config.download_dir.clone());
            let target = nav.download(&dir).await?;
            println!("saved to {}", target.display());
        }
        Command::Prompt { text } => {
            nav.run_prompt(&text.join(" ")).await?;
            status_line(&nav, "done".to_string());
        }
        Command::Shell { path } => {
            let start = path.or_else(|| config.start_path.clone());
            let mut shell = Shell::new(nav, config.download_dir.clone());
            shell.start(start).await?;
            shell.listen_terminal().await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::load(&cli.config).and_then(|c| c.with_server(cli.server.clone())) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("config bad: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let command = cli.command.unwrap_or(Command::Shell { path: None });
    let interactive = matches!(command, Command::Shell { .. });
    if let Err(e) = init_logging(&config, cli.verbose, interactive) {
        eprintln!("couldn't set up logging: {}", e);
        return ExitCode::FAILURE;
    }
    let api = match HttpApi::new(&config.server_url) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    match run(command, &config, Navigator::new(api)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
