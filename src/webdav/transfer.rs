use std::path::{Path, PathBuf};

use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};

use super::Error;

/// Local file read by `put`. Closed when dropped, so every exit path of the
/// caller releases it; a failed `open` leaves nothing to release.
pub(crate) struct LocalSource {
    path: PathBuf,
    file: File,
}

impl LocalSource {
    pub async fn open(path: &Path) -> Result<LocalSource, Error> {
        let file = File::open(path)
            .await
            .map_err(|e| Error::local_io(path, e))?;
        Ok(LocalSource {
            path: path.to_path_buf(),
            file,
        })
    }

    pub async fn read_all(&mut self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        self.file
            .read_to_end(&mut buf)
            .await
            .map_err(|e| Error::local_io(&self.path, e))?;
        Ok(buf)
    }
}

/// Local file written by `get`, created or truncated on open.
pub(crate) struct LocalDestination {
    path: PathBuf,
    file: File,
    written: u64,
}

impl LocalDestination {
    pub async fn create(path: &Path) -> Result<LocalDestination, Error> {
        let file = File::create(path)
            .await
            .map_err(|e| Error::local_io(path, e))?;
        Ok(LocalDestination {
            path: path.to_path_buf(),
            file,
            written: 0,
        })
    }

    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), Error> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| Error::local_io(&self.path, e))?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub async fn finish(mut self) -> Result<u64, Error> {
        self.file
            .flush()
            .await
            .map_err(|e| Error::local_io(&self.path, e))?;
        Ok(self.written)
    }
}
