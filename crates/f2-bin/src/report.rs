use anyhow::Result;
use f2_core::{Change, Config, Output, RenameOutcome};
use inquire::Confirm;

fn display_path(change: &Change, target: bool) -> String {
    let path = if target {
        change.target_path()
    } else {
        change.source_path()
    };
    path.display().to_string()
}

pub fn print_plan(changes: &[Change]) {
    println!("\n📁 Planned renames:");
    for change in changes {
        println!("  \x1b[31m- {}\x1b[0m", display_path(change, false));
        println!("  \x1b[32m+ {}\x1b[0m", display_path(change, true));
    }
}

pub fn confirm(prompt: &str) -> Result<bool> {
    let proceed = Confirm::new(prompt).with_default(false).prompt()?;
    Ok(proceed)
}

pub fn print_json(output: &Output) -> Result<()> {
    println!("{}", output.to_json()?);
    Ok(())
}

pub fn print_outcome(outcome: &RenameOutcome, config: &Config, json: bool) -> Result<()> {
    if json {
        return print_json(&outcome.to_output(config));
    }

    for change in &outcome.changes {
        let source = display_path(change, false);
        let target = display_path(change, true);

        match &change.error {
            Some(reason) => println!("  \x1b[31m✗ {} -> {} ({})\x1b[0m", source, target, reason),
            None if outcome.dry_run => println!("  • {} -> {}", source, target),
            None => println!("  \x1b[32m✓ {} -> {}\x1b[0m", source, target),
        }
    }

    if outcome.dry_run {
        println!("\nDry run complete! Use --exec to apply these changes.");
    } else {
        println!("\nRenaming complete!");
    }
    println!("  Changes: {}", outcome.changes.len());
    println!("  Failed: {}", outcome.errors.len());

    Ok(())
}

pub fn warn(err: &f2_core::Error) {
    eprintln!("\x1b[33mWarning:\x1b[0m {}", err);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_path_joins_base_dir() {
        let change = Change::new("photos", "img.jpg", "2024/img.jpg");

        assert_eq!(display_path(&change, false), std::path::Path::new("photos/img.jpg").display().to_string());
        assert_eq!(display_path(&change, true), std::path::Path::new("photos/2024/img.jpg").display().to_string());
    }
}
