//! Implementation of the `gmutex status`, `list`, and `clear` commands.

use crate::cli::{ClearArgs, StatusArgs};
use global_mutex::exit_codes;
use global_mutex::locks::{self, LockInfo, LockMetadata, LockState};
use global_mutex::{Config, GlobalMutexError, Result};

pub fn cmd_status(config: &Config, args: StatusArgs) -> Result<i32> {
    let info = locks::inspect(config, &args.name)?;

    println!("Lock: {}", info.name);
    print_details(config, &info, "  ");

    Ok(exit_codes::SUCCESS)
}

pub fn cmd_list(config: &Config) -> Result<i32> {
    let locks = locks::list_locks(config)?;

    if locks.is_empty() {
        println!("No locks in {}.", config.lock_dir().display());
        return Ok(exit_codes::SUCCESS);
    }

    println!("Locks ({}):", locks.len());
    println!();

    for lock in &locks {
        println!("  {}:", lock.name);
        print_details(config, lock, "    ");
        println!();
    }

    let abandoned = locks
        .iter()
        .filter(|l| matches!(l.state, LockState::Abandoned(_)))
        .count();
    if abandoned > 0 {
        println!(
            "Note: {} lock(s) were abandoned. Use `gmutex clear <name> --force` to clear.",
            abandoned
        );
    }

    Ok(exit_codes::SUCCESS)
}

pub fn cmd_clear(config: &Config, args: ClearArgs) -> Result<i32> {
    // Require --force flag
    if !args.force {
        return Err(GlobalMutexError::Usage(format!(
            "refusing to clear lock without --force flag.\n\n\
             Clearing a lock discards the record that its last holder exited\n\
             without releasing it. Only clear it once whatever the lock protects\n\
             has been checked.\n\n\
             To clear the lock, run:\n  gmutex clear {} --force",
            args.name
        )));
    }

    let cleared = locks::clear_abandoned(config, &args.name)?;

    println!("Cleared lock: {}", cleared.name);
    if let Some(owner) = cleared.state.owner() {
        println!();
        println!("Previous holder:");
        print_owner(owner, "  ");
    }

    Ok(exit_codes::SUCCESS)
}

fn print_details(config: &Config, info: &LockInfo, indent: &str) {
    println!("{}State:      {}", indent, info.state.as_str());
    if let Some(owner) = info.state.owner() {
        print_owner(owner, indent);
        if info.is_stale(config.stale_minutes) {
            println!(
                "{}Status:     STALE (exceeds {} min threshold)",
                indent, config.stale_minutes
            );
        }
    }
    println!("{}Path:       {}", indent, info.path.display());
}

fn print_owner(owner: &LockMetadata, indent: &str) {
    println!("{}Owner:      {}", indent, owner.owner);
    if let Some(pid) = owner.pid {
        println!("{}PID:        {}", indent, pid);
    }
    println!(
        "{}Acquired:   {}",
        indent,
        owner.acquired_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("{}Age:        {}", indent, owner.age_string());
}
