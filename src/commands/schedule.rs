//! `ralph schedule` - emit a recurring-run entry for launchd or cron.
//!
//! Writes the plist (macOS) or prints the crontab line (everywhere else)
//! and tells the user how to install it. Never calls launchctl or crontab
//! itself.

use std::env;
use std::fs;

use tera::Context;

use crate::commands::prompt_line;
use crate::context::ProjectContext;
use crate::git::kebab_slug;
use crate::prd::PrdStore;
use crate::templates::{self, builtin, TemplateResolver};

pub fn execute(context: &ProjectContext) -> Result<i32, String> {
    if !context.is_initialized() {
        return Err(format!(
            "No {} found - run `ralph init` first.",
            context.config_path().display()
        ));
    }

    let prd = PrdStore::new(context).load()?;
    let minutes = ask_interval_minutes()?;

    let program = env::current_exe()
        .map_err(|e| format!("Failed to resolve the ralph executable path: {}", e))?;
    let log_path = context.ralph_dir().join("schedule.log");

    let mut resolver = TemplateResolver::new().with_project_path(context.root());
    let mut vars = Context::new();
    vars.insert("working_dir", &context.root().display().to_string());
    vars.insert("program", &program.display().to_string());
    vars.insert("log_path", &log_path.display().to_string());

    if cfg!(target_os = "macos") {
        let label = format!("com.ralph.loop.{}", kebab_slug(&prd.project, 40));
        vars.insert("label", &label);
        vars.insert("interval_secs", &(minutes * 60));
        let plist = templates::render(&mut resolver, builtin::LAUNCHD_PLIST, &vars)
            .map_err(|e| e.to_string())?;

        let agents_dir = dirs::home_dir()
            .ok_or_else(|| "Could not resolve the home directory".to_string())?
            .join("Library/LaunchAgents");
        fs::create_dir_all(&agents_dir)
            .map_err(|e| format!("Failed to create {}: {}", agents_dir.display(), e))?;
        let plist_path = agents_dir.join(format!("{}.plist", label));
        fs::write(&plist_path, plist)
            .map_err(|e| format!("Failed to write {}: {}", plist_path.display(), e))?;

        println!("Wrote {}.", plist_path.display());
        println!();
        println!("Load it with:");
        println!("  launchctl load -w {}", plist_path.display());
        println!("Stop it with:");
        println!("  launchctl unload -w {}", plist_path.display());
    } else {
        let supported = cron_supported_interval(minutes);
        if supported != minutes {
            println!(
                "cron cannot fire every {} minutes evenly; scheduling every {} minutes instead.",
                minutes, supported
            );
        }
        vars.insert("schedule", &cron_schedule(minutes));
        let line = templates::render(&mut resolver, builtin::CRON_LINE, &vars)
            .map_err(|e| e.to_string())?;
        println!("Add this line to your crontab (crontab -e):");
        println!();
        println!("  {}", line.trim_end());
    }

    Ok(0)
}

fn ask_interval_minutes() -> Result<u32, String> {
    loop {
        let answer = prompt_line("Run every how many minutes?", Some("60"))?;
        match answer.trim().parse::<u32>() {
            Ok(n) if n > 0 => return Ok(n),
            _ => println!("Please enter a positive number of minutes."),
        }
    }
}

/// Largest interval at or below the requested one that cron fires evenly:
/// a divisor of 60 below the hour, a whole number of hours from 60 up.
fn cron_supported_interval(minutes: u32) -> u32 {
    if minutes >= 60 {
        minutes - minutes % 60
    } else {
        (1..=minutes).rev().find(|m| 60 % m == 0).unwrap_or(1)
    }
}

/// Cron schedule for an every-N-minutes interval. Whole hours become an
/// hour-step entry, sub-hour intervals a minute-step entry. A `*/N` minute
/// field only means "every N minutes" when N divides 60, so unsupported
/// intervals are rounded down first.
fn cron_schedule(minutes: u32) -> String {
    let minutes = cron_supported_interval(minutes);
    if minutes % 60 == 0 {
        let hours = minutes / 60;
        if hours == 1 {
            "0 * * * *".to_string()
        } else {
            format!("0 */{} * * *", hours)
        }
    } else {
        format!("*/{} * * * *", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cron_schedule_minute_steps() {
        assert_eq!(cron_schedule(15), "*/15 * * * *");
        assert_eq!(cron_schedule(30), "*/30 * * * *");
    }

    #[test]
    fn test_cron_schedule_hourly_and_up() {
        assert_eq!(cron_schedule(60), "0 * * * *");
        assert_eq!(cron_schedule(120), "0 */2 * * *");
    }

    // */45 would fire at :00 and :45, not every 45 minutes
    #[test]
    fn test_cron_schedule_rounds_uneven_intervals_down() {
        assert_eq!(cron_schedule(45), "*/30 * * * *");
        assert_eq!(cron_schedule(90), "0 * * * *");
        assert_eq!(cron_schedule(150), "0 */2 * * *");
    }

    #[test]
    fn test_cron_supported_interval() {
        assert_eq!(cron_supported_interval(20), 20);
        assert_eq!(cron_supported_interval(7), 6);
        assert_eq!(cron_supported_interval(45), 30);
        assert_eq!(cron_supported_interval(90), 60);
        assert_eq!(cron_supported_interval(120), 120);
    }
}
