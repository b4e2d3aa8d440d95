use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "f2")]
#[command(version)]
#[command(about = "Bulk rename files and directories safely, with undo")]
#[command(long_about = "A CLI tool that finds files matching a pattern (or listed in a CSV manifest), renames them in one batch, and records a backup so the batch can be reverted.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Find matching files and rename them (dry run unless --exec)")]
    Rename(RenameArgs),

    #[command(about = "Revert the last renaming operation in the current directory")]
    Undo(CommitArgs),
}

#[derive(Args)]
pub struct RenameArgs {
    #[arg(short, long, help = "Search pattern (regex); repeat to chain several replacements")]
    pub find: Vec<String>,

    #[arg(short, long, help = "Replacement for the matching --find pattern; supports $1 capture references")]
    pub replace: Vec<String>,

    #[arg(short = 'E', long, help = "Exclude entries matching this pattern (repeatable)")]
    pub exclude: Vec<String>,

    #[arg(long, help = "Read source,target rows from a CSV file instead of searching")]
    pub csv: Option<PathBuf>,

    #[arg(short = 'R', long, help = "Search subdirectories recursively")]
    pub recursive: bool,

    #[arg(short, long, default_value_t = 0, help = "Maximum recursion depth (0 = unlimited)")]
    pub max_depth: usize,

    #[arg(short = 'H', long, help = "Include hidden files and directories")]
    pub hidden: bool,

    #[arg(short = 'd', long, help = "Rename directories as well as files")]
    pub include_dir: bool,

    #[arg(short = 'D', long, help = "Rename directories only")]
    pub only_dir: bool,

    #[arg(short = 'e', long, help = "Ignore file extensions when matching")]
    pub ignore_ext: bool,

    #[arg(help = "Files or directories to search (defaults to current directory)")]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub commit: CommitArgs,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short = 'x', long, env = "F2_EXEC", help = "Apply the changes (default is a dry run)")]
    pub exec: bool,

    #[arg(short, long, help = "Show the changes and ask before applying them")]
    pub interactive: bool,

    #[arg(long, help = "Print the result as JSON")]
    pub json: bool,

    #[arg(long, env = "F2_DATA_DIR", help = "Directory holding backup files")]
    pub data_dir: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_rename_command() {
        let args = vec![
            "f2",
            "rename",
            "-f",
            "img",
            "-r",
            "photo",
            "-E",
            r"\.tmp$",
            "-R",
            "--max-depth",
            "2",
            "-d",
            "-x",
            "photos",
        ];

        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Rename(args) => {
                assert_eq!(args.find, vec!["img"]);
                assert_eq!(args.replace, vec!["photo"]);
                assert_eq!(args.exclude, vec![r"\.tmp$"]);
                assert!(args.recursive);
                assert_eq!(args.max_depth, 2);
                assert!(args.include_dir);
                assert!(args.commit.exec);
                assert_eq!(args.paths, vec![PathBuf::from("photos")]);
            }
            _ => panic!("Expected Rename command"),
        }
    }

    #[test]
    fn test_rename_defaults_to_dry_run() {
        let cli = Cli::try_parse_from(["f2", "rename", "--csv", "plan.csv"]).unwrap();

        match cli.command {
            Commands::Rename(args) => {
                assert_eq!(args.csv, Some(PathBuf::from("plan.csv")));
                assert!(args.paths.is_empty());
                assert_eq!(args.max_depth, 0);
            }
            _ => panic!("Expected Rename command"),
        }
    }

    #[test]
    fn test_undo_command() {
        let cli = Cli::try_parse_from(["f2", "undo", "--exec", "--json", "-v"]).unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Undo(args) => {
                assert!(args.exec);
                assert!(args.json);
                assert!(!args.interactive);
            }
            _ => panic!("Expected Undo command"),
        }
    }
}
