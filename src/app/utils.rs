use std::path::{Path, PathBuf};

use crate::{
    app::Config,
    core::{
        ppu::{SCREEN_HEIGHT, SCREEN_WIDTH},
        Snes,
    },
};
use log::*;

/// Name a savestate after the cartridge's internal title, falling back to the ROM's file name.
///
/// Header titles are padded with spaces and may hold punctuation, so anything that isn't
/// alphanumeric becomes an underscore.
fn savestate_name(snes: &Snes, config: &Config) -> String {
    let title = snes.bus.cartridge.title.trim();
    let game = if title.is_empty() {
        config.game_name.as_deref().unwrap_or("untitled")
    } else {
        title
    };
    let game: String = game
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let time = chrono::Local::now().format("%Y%m%d_%H%M%S%3f");
    format!("{}_{}.state", game, time)
}

/// Write a savestate of the whole console into [Config::savestate_dir].
///
/// On success the file is remembered in [Config::quickload_file], so a later [quickload] picks
/// it up. Returns the path written to.
pub fn quicksave(snes: &Snes, config: &mut Config) -> Option<PathBuf> {
    let data = match snes.to_savestate() {
        Ok(d) => d,
        Err(e) => {
            error!("Unable to serialize the console: {}", e);
            return None;
        }
    };
    if let Err(e) = std::fs::create_dir_all(&config.savestate_dir) {
        error!(
            "Unable to create savestate directory {:?}: {}",
            config.savestate_dir, e
        );
        return None;
    }
    let path = config.savestate_dir.join(savestate_name(snes, config));
    match std::fs::write(&path, data) {
        Ok(_) => {
            info!("Quicksaved to {:?}", path);
            config.quickload_file = Some(path.clone());
            Some(path)
        }
        Err(e) => {
            error!("Unable to write savestate {:?}: {}", path, e);
            None
        }
    }
}

/// Restore the savestate named by [Config::quickload_file].
///
/// The console's settings and SRAM save file are kept. Returns whether anything was loaded.
pub fn quickload(snes: &mut Snes, config: &Config) -> bool {
    let Some(path) = &config.quickload_file else {
        warn!("No savestate to quickload");
        return false;
    };
    let data = match std::fs::read(path) {
        Ok(d) => d,
        Err(e) => {
            error!("Unable to read savestate {:?}: {}", path, e);
            return false;
        }
    };
    match snes.load_savestate(&data) {
        Ok(_) => {
            info!("Quickloaded {:?}", path);
            true
        }
        Err(e) => {
            error!("{:?} is not a savestate for this version: {}", path, e);
            false
        }
    }
}

/// Write the PPU's front buffer to an image file, in whatever format the extension names.
pub fn screenshot(snes: &Snes, path: &Path) -> Result<(), image::ImageError> {
    let bytes: Vec<u8> = snes
        .bus
        .ppu
        .front_buffer()
        .iter()
        .flat_map(|p| p.to_be_bytes())
        .collect();
    image::save_buffer(
        path,
        &bytes,
        SCREEN_WIDTH as u32,
        SCREEN_HEIGHT as u32,
        image::ColorType::Rgba8,
    )?;
    info!("Wrote screenshot to {:?}", path);
    Ok(())
}
