use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use ndarray::Array1;

static NEXT_FILE: AtomicUsize = AtomicUsize::new(0);

/// Iterates of one solve, spooled to a JSON-lines file.
///
/// Each line is one decision vector. The file lives only for the duration of
/// the solve: [`History::finish`] reads it back and dropping the history
/// removes it.
#[derive(Debug)]
pub(crate) struct History {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl History {
    /// Creates an empty history file under `directory`.
    pub(crate) fn create(directory: &Path) -> io::Result<Self> {
        fs::create_dir_all(directory)?;
        let path = directory.join(format!(
            "iterations-{}-{}.jsonl",
            std::process::id(),
            NEXT_FILE.fetch_add(1, Ordering::Relaxed),
        ));
        let writer = BufWriter::new(File::create(&path)?);
        Ok(Self { path, writer })
    }

    pub(crate) fn append(&mut self, x: &Array1<f64>) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, &x.to_vec())?;
        self.writer.write_all(b"\n")
    }

    /// Reads every appended iterate back, in order, and removes the file.
    pub(crate) fn finish(mut self) -> io::Result<Vec<Array1<f64>>> {
        self.writer.flush()?;
        let reader = BufReader::new(File::open(&self.path)?);
        let iterates = reader
            .lines()
            .map(|line| {
                let values: Vec<f64> = serde_json::from_str(&line?)?;
                Ok(Array1::from(values))
            })
            .collect::<io::Result<Vec<_>>>()?;
        fs::remove_file(&self.path)?;
        Ok(iterates)
    }

    #[cfg(test)]
    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for History {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(error) = fs::remove_file(&self.path) {
                log::warn!("could not remove {}: {error}", self.path.display());
            }
        }
    }
}
