use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use dbbackup::backup::{Tool, ToolLocator};
use dbbackup::cli::{handle_backup_command, BackupCommands};
use dbbackup::config::{BackupPaths, Settings};
use dbbackup::logging;

#[derive(Parser)]
#[command(
    name = "dbbackup",
    version,
    about = "MySQL backup export, import and rotation",
    long_about = "dbbackup exports MySQL databases with mysqldump, optionally \
                  compressed with gzip or bzip2, restores them with mysql, and \
                  keeps the backup directory tidy with count-based rotation."
)]
struct Cli {
    /// Backup directory (overrides the settings file)
    #[arg(long, global = true, env = "DBBACKUP_BACKUP_DIR")]
    backup_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Backup(BackupCommands),

    /// Write a default settings file and create the backup directory
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = BackupPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    logging::init(logging::level_for(cli.verbose, &settings.log_level));

    let backup_dir = settings.backup_dir(&paths, cli.backup_dir.as_deref());

    match cli.command {
        Some(Commands::Backup(cmd)) => {
            handle_backup_command(&settings, &backup_dir, cmd)?;
        }
        Some(Commands::Init) => {
            if paths.is_initialized() {
                println!("Settings already exist: {}", paths.settings_file().display());
            } else {
                settings.save(&paths)?;
                println!("Settings written: {}", paths.settings_file().display());
            }
            std::fs::create_dir_all(&backup_dir)?;
            println!("Backup directory: {}", backup_dir.display());
            println!();
            println!("Add a connection named '{}' to the settings file", settings.default_connection);
            println!("before running 'dbbackup export'.");
        }
        Some(Commands::Config) => print_config(&paths, &settings, &backup_dir),
        None => {
            println!("dbbackup - MySQL backup lifecycle");
            println!();
            println!("Run 'dbbackup --help' for usage information.");
        }
    }

    Ok(())
}

fn print_config(paths: &BackupPaths, settings: &Settings, backup_dir: &std::path::Path) {
    println!("dbbackup Configuration");
    println!("======================");
    println!("Home directory:   {}", paths.base_dir().display());
    println!("Settings file:    {}", paths.settings_file().display());
    println!("Backup directory: {}", backup_dir.display());
    println!();
    println!("Settings:");
    println!("  Default connection: {}", settings.default_connection);
    println!("  Compression:        {}", settings.compression);
    match settings.rotate {
        Some(keep) => println!("  Rotate after export: keep {}", keep),
        None => println!("  Rotate after export: off"),
    }
    println!("  File mode:          {:o}", settings.file_mode);
    println!();

    println!("Connections:");
    if settings.connections.is_empty() {
        println!("  (none)");
    }
    for (name, conn) in &settings.connections {
        println!("  {}: {}@{}/{}", name, conn.username, conn.host, conn.database);
    }
    println!();

    println!("Binaries:");
    let locator = settings.tool_locator();
    for tool in Tool::ALL {
        match locator.locate(tool) {
            Ok(path) => println!("  {:<10} {}", tool.binary_name(), path.display()),
            Err(err) => println!("  {:<10} {}", tool.binary_name(), err),
        }
    }
}
