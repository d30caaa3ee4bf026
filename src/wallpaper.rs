//! Solid-color desktop wallpaper.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{ImageFormat, Rgb, RgbImage};
use log::debug;

use crate::scheduler::ColorSink;
use crate::settings;
use crate::timeline::Color;

/// File name of the rendered wallpaper under the per-user cache directory.
const WALLPAPER_FILE: &str = "current.bmp";
/// Edge length of the rendered bitmap; Windows stretches it to fill.
const WALLPAPER_SIZE: u32 = 64;

pub fn wallpaper_path() -> Result<PathBuf> {
    Ok(settings::cache_dir()?.join(WALLPAPER_FILE))
}

/// Render a solid bitmap of `color` to `path`.
pub fn paint_solid(color: Color, path: &Path) -> Result<()> {
    let img = RgbImage::from_pixel(
        WALLPAPER_SIZE,
        WALLPAPER_SIZE,
        Rgb([color.r, color.g, color.b]),
    );
    img.save_with_format(path, ImageFormat::Bmp)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(windows)]
mod platform {
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;

    use anyhow::{Context, Result, anyhow};
    use winreg::RegKey;
    use winreg::enums::{HKEY_CURRENT_USER, KEY_SET_VALUE};
    use windows::Win32::UI::WindowsAndMessaging::{
        SPI_SETDESKWALLPAPER, SPIF_SENDCHANGE, SPIF_UPDATEINIFILE, SystemParametersInfoW,
    };

    const DESKTOP_KEY: &str = "Control Panel\\Desktop";

    /// Stretch the bitmap over every monitor ("Fill": style 10, no tiling).
    pub fn set_fill_style() -> Result<()> {
        let desktop = RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey_with_flags(DESKTOP_KEY, KEY_SET_VALUE)
            .context("failed to open desktop registry key")?;
        desktop.set_value("WallpaperStyle", &"10")?;
        desktop.set_value("TileWallpaper", &"0")?;
        Ok(())
    }

    /// Install `bitmap` as the desktop wallpaper and persist it to the profile.
    pub fn set_wallpaper(bitmap: &Path) -> Result<()> {
        let wide = wide_path(bitmap);
        unsafe {
            SystemParametersInfoW(
                SPI_SETDESKWALLPAPER,
                0,
                Some(wide.as_ptr() as *mut _),
                SPIF_UPDATEINIFILE | SPIF_SENDCHANGE,
            )
        }
        .map_err(|err| anyhow!("failed to set wallpaper {}: {err}", bitmap.display()))
    }

    /// NUL-terminated UTF-16 path for the wide Win32 APIs.
    fn wide_path(path: &Path) -> Vec<u16> {
        path.as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect()
    }
}

#[cfg(windows)]
use platform::{set_fill_style, set_wallpaper};

#[cfg(not(windows))]
fn set_fill_style() -> Result<()> {
    Ok(())
}

#[cfg(not(windows))]
fn set_wallpaper(_path: &Path) -> Result<()> {
    Err(anyhow::anyhow!("setting the wallpaper is only supported on Windows"))
}

/// Paints each new color to a bitmap and installs it as the wallpaper.
pub struct WallpaperSink {
    path: PathBuf,
    last: Option<Color>,
    styled: bool,
}

impl WallpaperSink {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            last: None,
            styled: false,
        }
    }
}

impl ColorSink for WallpaperSink {
    fn name(&self) -> &'static str {
        "wallpaper"
    }

    fn apply(&mut self, color: Color) -> Result<()> {
        if self.last == Some(color) {
            return Ok(());
        }
        if !self.styled {
            set_fill_style().context("failed to set wallpaper style")?;
            self.styled = true;
        }
        paint_solid(color, &self.path)?;
        set_wallpaper(&self.path)?;
        debug!("wallpaper set to {},{},{}", color.r, color.g, color.b);
        self.last = Some(color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paints_uniform_bitmap() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(WALLPAPER_FILE);
        paint_solid(Color::new(220, 130, 70), &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (WALLPAPER_SIZE, WALLPAPER_SIZE));
        assert!(img.pixels().all(|px| *px == Rgb([220, 130, 70])));
    }

    #[test]
    fn unchanged_color_is_not_repainted() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(WALLPAPER_FILE);
        let mut sink = WallpaperSink::new(path.clone());
        sink.last = Some(Color::new(1, 2, 3));
        sink.apply(Color::new(1, 2, 3)).unwrap();
        assert!(!path.exists());
    }
}
