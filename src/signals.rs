//! Process signals forwarded to the update loop as [`SchedulerCommand`]s.

use std::sync::mpsc::Sender;
use std::thread;

use anyhow::{Context, Result};
use log::info;

use crate::scheduler::SchedulerCommand;

/// SIGINT/SIGTERM stop the loop; SIGUSR1 re-resolves today's solar times.
#[cfg(unix)]
pub fn forward_signals(commands: Sender<SchedulerCommand>) -> Result<()> {
    use signal_hook::consts::signal::{SIGINT, SIGTERM, SIGUSR1};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGUSR1, SIGTERM, SIGINT]).context("failed to register signal handler")?;

    // Lives until the process exits.
    thread::spawn(move || {
        for sig in signals.forever() {
            let command = if sig == SIGUSR1 {
                info!("received SIGUSR1, refreshing solar times");
                SchedulerCommand::Refresh
            } else {
                info!("received signal {sig}, shutting down");
                SchedulerCommand::Stop
            };
            if commands.send(command).is_err() {
                break;
            }
        }
    });
    Ok(())
}

/// Ctrl-C and console close stop the loop.
#[cfg(not(unix))]
pub fn forward_signals(commands: Sender<SchedulerCommand>) -> Result<()> {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use signal_hook::consts::{SIGINT, SIGTERM};

    let quit = Arc::new(AtomicBool::new(false));
    for sig in [SIGINT, SIGTERM] {
        signal_hook::flag::register(sig, Arc::clone(&quit))
            .context("failed to register signal handler")?;
    }

    thread::spawn(move || {
        while !quit.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(250));
        }
        info!("received Ctrl-C, shutting down");
        let _ = commands.send(SchedulerCommand::Stop);
    });
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use signal_hook::consts::signal::SIGUSR1;

    use super::*;

    #[test]
    fn sigusr1_requests_refresh() {
        let (tx, rx) = mpsc::channel();
        forward_signals(tx).unwrap();

        signal_hook::low_level::raise(SIGUSR1).unwrap();
        let command = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(command, SchedulerCommand::Refresh);
    }
}
