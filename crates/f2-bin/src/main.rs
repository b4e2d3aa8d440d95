mod cli;
mod report;

use anyhow::Result;
use cli::{Cli, CommitArgs, Commands, RenameArgs};
use f2_core::{BackupStore, Config, Error, FindOptions, NamingRules};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    setup_logging(&cli)?;

    info!("Starting f2");

    match cli.command {
        Commands::Rename(args) => handle_rename_command(args)?,
        Commands::Undo(args) => handle_undo_command(args)?,
    }

    debug!("f2 completed successfully");
    Ok(())
}

fn backup_store(args: &CommitArgs) -> Result<BackupStore> {
    let store = match &args.data_dir {
        Some(dir) => BackupStore::new(dir),
        None => BackupStore::from_data_dir()?,
    };
    debug!("Backup directory: {:?}", store.root());
    Ok(store)
}

fn build_config(args: RenameArgs) -> Result<Config> {
    let mut config = Config::new(std::env::current_dir()?);

    config.naming = NamingRules::new(&args.find, &args.replace)?;
    config.csv_file = args.csv;
    config.exec = args.commit.exec;
    config.interactive = args.commit.interactive;
    config.find = FindOptions {
        paths: args.paths,
        max_depth: args.max_depth,
        recursive: args.recursive,
        include_hidden: args.hidden,
        include_dir: args.include_dir,
        only_dir: args.only_dir,
        ignore_ext: args.ignore_ext,
        exclude: args.exclude,
    };

    Ok(config)
}

fn handle_rename_command(args: RenameArgs) -> Result<()> {
    let store = backup_store(&args.commit)?;
    let json = args.commit.json;
    let mut config = build_config(args)?;

    info!("Working directory: {:?}", config.working_dir);

    let discovery = f2_core::discover(&config)?;
    let changes = discovery.plan(&config);

    if changes.is_empty() {
        println!("No matches found.");
        return Ok(());
    }

    if config.interactive {
        report::print_plan(&changes);
        if !report::confirm("Proceed with renaming?")? {
            println!("Aborted. No changes were made.");
            return Ok(());
        }
        config.exec = true;
    }

    let outcome = f2_core::rename(&config, changes, &store);

    report::print_outcome(&outcome, &config, json)?;

    if let Some(err) = &outcome.backup_error {
        report::warn(err);
    }

    outcome.check()?;
    Ok(())
}

fn handle_undo_command(args: CommitArgs) -> Result<()> {
    let store = backup_store(&args)?;
    let mut config = Config::new(std::env::current_dir()?);
    config.exec = args.exec;
    config.interactive = args.interactive;

    let plan = match f2_core::undo::plan(&store, &config.working_dir) {
        Ok(plan) => plan,
        Err(Error::NothingToUndo) => {
            println!("Nothing to undo in {}", config.working_dir.display());
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if config.interactive {
        report::print_plan(&plan.changes);
        if !report::confirm("Revert these changes?")? {
            println!("Aborted. No changes were made.");
            return Ok(());
        }
        config.exec = true;
    }

    let undone = f2_core::undo::apply(&config, &store, plan)?;

    report::print_outcome(&undone.outcome, &config, args.json)?;

    if let Some(err) = &undone.removal_warning {
        warn!("Backup file was left behind");
        report::warn(err);
    }

    undone.check()?;
    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let filter = if cli.quiet {
        EnvFilter::new("error")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_writer(std::io::stderr)
                .compact()
        )
        .with(filter)
        .init();

    Ok(())
}
