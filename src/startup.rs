//! Run-at-login registration through the per-user `Run` registry key.

#[cfg(windows)]
mod platform {
    use std::io;

    use anyhow::{Context, Result};
    use winreg::RegKey;
    use winreg::enums::{HKEY_CURRENT_USER, KEY_QUERY_VALUE, KEY_SET_VALUE};

    const RUN_KEY: &str = "Software\\Microsoft\\Windows\\CurrentVersion\\Run";
    const RUN_VALUE: &str = "SolarWallpaper";

    /// Whether our `Run` value exists, whatever command it holds.
    pub fn is_enabled() -> Result<bool> {
        let key = open_run_key(KEY_QUERY_VALUE)?;
        match key.get_value::<String, _>(RUN_VALUE) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err).context("failed to read startup registry value"),
        }
    }

    /// Point the `Run` value at this executable's update loop.
    pub fn enable() -> Result<()> {
        let exe = std::env::current_exe().context("failed to resolve current executable")?;
        let command = super::launch_command(&exe.display().to_string());
        open_run_key(KEY_SET_VALUE)?
            .set_value(RUN_VALUE, &command)
            .context("failed to set startup registry value")?;
        log::info!("registered for login: {command}");
        Ok(())
    }

    /// Remove the `Run` value; already absent is fine.
    pub fn disable() -> Result<()> {
        let key = open_run_key(KEY_SET_VALUE)?;
        match key.delete_value(RUN_VALUE) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).context("failed to remove startup registry value"),
        }
    }

    fn open_run_key(flags: u32) -> Result<RegKey> {
        RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey_with_flags(RUN_KEY, flags)
            .context("failed to open startup registry key")
    }
}

/// Command line stored in the `Run` key: the quoted executable plus `run`.
#[cfg_attr(not(windows), allow(dead_code))]
fn launch_command(exe: &str) -> String {
    format!("\"{exe}\" run")
}

#[cfg(windows)]
pub use platform::{disable, enable, is_enabled};

#[cfg(not(windows))]
pub fn is_enabled() -> anyhow::Result<bool> {
    Ok(false)
}

#[cfg(not(windows))]
pub fn enable() -> anyhow::Result<()> {
    Err(anyhow::anyhow!("run at login is only supported on Windows"))
}

#[cfg(not(windows))]
pub fn disable() -> anyhow::Result<()> {
    Ok(())
}
