use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use log::*;

use crate::core::Error;

/// A battery backed SRAM save file on disk.
///
/// The SRAM itself lives in the cartridge, this only knows where to load it from and where to
/// write it back to.
#[derive(Debug)]
pub struct SaveFile {
    path: PathBuf,
}

impl SaveFile {
    /// Open the save file at `path`, returning it along with its contents.
    ///
    /// Creates a zero filled file of `size` bytes if none exists.
    /// A file of any other size is an error, since loading it would corrupt the save.
    pub fn open(path: impl AsRef<Path>, size: usize) -> Result<(SaveFile, Vec<u8>), Error> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            info!("Creating save file {}", path.display());
            let mut file = File::create(&path)?;
            file.write_all(&vec![0; size])?;
            return Ok((SaveFile { path }, vec![0; size]));
        }
        let actual = fs::metadata(&path)?.len();
        if actual != size as u64 {
            error!(
                "Save file {} is {:#X} bytes, expected {:#X}",
                path.display(),
                actual,
                size
            );
            return Err(Error::SaveFileSize {
                expected: size,
                actual,
            });
        }
        info!("Loading save file {}", path.display());
        let data = fs::read(&path)?;
        Ok((SaveFile { path }, data))
    }
    /// Write `data` back to the file.
    pub fn write(&self, data: &[u8]) -> Result<(), Error> {
        debug!("Writing {:#X} bytes to {}", data.len(), self.path.display());
        fs::write(&self.path, data)?;
        Ok(())
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
}
