//! Windows accent color derived from the current background color.

use anyhow::Result;
use log::debug;

use crate::scheduler::ColorSink;
use crate::timeline::Color;

/// Strength of the black or white overlay blended over the background.
const BLEND_AMOUNT: f64 = 0.15;

/// Accent for a background: darken light colors, lighten dark ones.
pub fn accent_for(background: Color) -> Color {
    let keep = 1.0 - BLEND_AMOUNT;
    let overlay = if background.brightness() > 128 {
        0.0
    } else {
        255.0 * BLEND_AMOUNT
    };
    let blend = |channel: u8| (f64::from(channel) * keep + overlay) as u8;
    Color::new(blend(background.r), blend(background.g), blend(background.b))
}

/// Pack as an opaque ABGR DWORD, the layout DWM expects.
pub fn to_abgr(color: Color) -> u32 {
    0xFF00_0000 | (u32::from(color.b) << 16) | (u32::from(color.g) << 8) | u32::from(color.r)
}

/// Eight RGBA shades from 60% to 130% of the accent, as stored in `AccentPalette`.
#[cfg_attr(not(windows), allow(dead_code))]
pub fn accent_palette(color: Color) -> [u8; 32] {
    let mut palette = [0u8; 32];
    for (idx, shade) in palette.chunks_exact_mut(4).enumerate() {
        let factor = 60 + idx as u32 * 10;
        let scale = |channel: u8| (u32::from(channel) * factor / 100).min(255) as u8;
        shade.copy_from_slice(&[scale(color.r), scale(color.g), scale(color.b), 255]);
    }
    palette
}

#[cfg(windows)]
mod platform {
    use anyhow::{Context, Result};
    use winreg::enums::{HKEY_CURRENT_USER, KEY_SET_VALUE, REG_BINARY};
    use winreg::{RegKey, RegValue};
    use windows::Win32::Foundation::{LPARAM, WPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{
        HWND_BROADCAST, SMTO_ABORTIFHUNG, SendMessageTimeoutW, WM_DWMCOLORIZATIONCOLORCHANGED,
        WM_SETTINGCHANGE,
    };

    use super::{accent_palette, to_abgr};
    use crate::timeline::Color;

    const DWM_KEY: &str = "SOFTWARE\\Microsoft\\Windows\\DWM";

    pub fn apply_accent(accent: Color) -> Result<()> {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let dwm = hkcu
            .open_subkey_with_flags(DWM_KEY, KEY_SET_VALUE)
            .context("failed to open DWM registry key")?;
        let value = to_abgr(accent);
        for name in [
            "AccentColor",
            "ColorizationColor",
            "ColorizationAfterglow",
            "AccentColorMenu",
        ] {
            dwm.set_value(name, &value)
                .with_context(|| format!("failed to set {name}"))?;
        }
        let palette = RegValue {
            bytes: accent_palette(accent).to_vec(),
            vtype: REG_BINARY,
        };
        dwm.set_raw_value("AccentPalette", &palette)
            .context("failed to set AccentPalette")?;

        let immersive: Vec<u16> = "ImmersiveColorSet"
            .encode_utf16()
            .chain(std::iter::once(0))
            .collect();
        unsafe {
            let _ = SendMessageTimeoutW(
                HWND_BROADCAST,
                WM_DWMCOLORIZATIONCOLORCHANGED,
                WPARAM(value as usize),
                LPARAM(0),
                SMTO_ABORTIFHUNG,
                1000,
                None,
            );
            let _ = SendMessageTimeoutW(
                HWND_BROADCAST,
                WM_SETTINGCHANGE,
                WPARAM(0),
                LPARAM(immersive.as_ptr() as isize),
                SMTO_ABORTIFHUNG,
                1000,
                None,
            );
        }
        Ok(())
    }
}

/// Write the accent to the DWM registry key and notify running apps.
#[cfg(windows)]
pub fn apply_accent(accent: Color) -> Result<()> {
    platform::apply_accent(accent)
}

#[cfg(not(windows))]
pub fn apply_accent(_accent: Color) -> Result<()> {
    Err(anyhow::anyhow!("accent colors are only supported on Windows"))
}

/// Derives and applies the accent color for each background color.
#[derive(Debug, Default)]
pub struct AccentSink {
    last: Option<Color>,
}

impl ColorSink for AccentSink {
    fn name(&self) -> &'static str {
        "accent color"
    }

    fn apply(&mut self, color: Color) -> Result<()> {
        let accent = accent_for(color);
        if self.last == Some(accent) {
            return Ok(());
        }
        apply_accent(accent)?;
        debug!("accent color set to {:#010X}", to_abgr(accent));
        self.last = Some(accent);
        Ok(())
    }
}
