// Signal handling: clean up the run lock before the process dies

use crate::context::ProjectContext;
use anyhow::Result;
use log::{info, warn};
use std::fs;
use std::path::Path;

fn cleanup_and_exit(lock_path: &Path, code: i32) -> ! {
    if lock_path.exists() {
        if let Err(e) = fs::remove_file(lock_path) {
            warn!("[Shutdown] Failed to remove {}: {}", lock_path.display(), e);
        } else {
            info!("[Shutdown] Removed run lock");
        }
    }
    std::process::exit(code);
}

/// Register handlers that remove `.ralph/ralph.lock` before the process
/// dies. Termination is the only cancellation path; the loop itself has no
/// cancelled state.
#[cfg(unix)]
pub fn install_signal_cleanup(context: &ProjectContext) -> Result<()> {
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;
    use std::thread;

    let lock_path = context.lock_path();
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])
        .map_err(|e| anyhow::anyhow!("Failed to register signal handlers: {}", e))?;

    thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            match signal {
                SIGINT => info!("[Shutdown] Received SIGINT (Ctrl+C)"),
                SIGTERM => info!("[Shutdown] Received SIGTERM"),
                SIGHUP => info!("[Shutdown] Received SIGHUP"),
                _ => {}
            }
            cleanup_and_exit(&lock_path, 128 + signal);
        }
    });

    Ok(())
}

/// Register the Ctrl+C handler on Windows.
#[cfg(windows)]
pub fn install_signal_cleanup(context: &ProjectContext) -> Result<()> {
    let lock_path = context.lock_path();
    ctrlc::set_handler(move || {
        info!("[Shutdown] Received Ctrl+C");
        cleanup_and_exit(&lock_path, 130);
    })
    .map_err(|e| anyhow::anyhow!("Failed to register Ctrl+C handler: {}", e))?;

    Ok(())
}
