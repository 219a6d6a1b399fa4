use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::drivers::{BufferSnapshot, Sample};
use crate::gateway::{session_key, GatewayError, PersistenceGateway};

const FILE_PREFIX: &str = "session_";

/// Local session store: one CSV file per saved session.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_files(&self) -> Result<Vec<PathBuf>, GatewayError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_session = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(FILE_PREFIX) && n.ends_with(".csv"))
                .unwrap_or(false);
            if is_session {
                files.push(path);
            }
        }
        Ok(files)
    }
}

// 文件名里只保留安全字符，标签本身写进表里
fn file_safe(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn write_rows<W: Write>(w: &mut W, stream: &str, samples: &[Sample]) -> std::io::Result<()> {
    for s in samples {
        writeln!(w, "{},{},{:.6},{:.6},{:.6}", s.arrival_seq, stream, s.x, s.y, s.z)?;
    }
    Ok(())
}

impl PersistenceGateway for FileStore {
    fn save(&self, label: &str, snapshot: &BufferSnapshot) -> Result<(), GatewayError> {
        fs::create_dir_all(&self.dir)?;
        let filename = format!("{FILE_PREFIX}{}_{}.csv", file_safe(label), session_key());
        let path = self.dir.join(filename);
        // create_new: a clash is an error, never a silent overwrite
        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        let mut w = BufWriter::new(file);
        writeln!(w, "# label={label}")?;
        writeln!(w, "seq,stream,x,y,z")?;
        write_rows(&mut w, "accel", &snapshot.accel)?;
        write_rows(&mut w, "gyro", &snapshot.gyro)?;
        w.flush()?;
        info!("💾 session saved: {}", path.display());
        Ok(())
    }

    fn drop_all(&self) -> Result<(), GatewayError> {
        let files = self.session_files()?;
        for path in &files {
            fs::remove_file(path)?;
        }
        info!("💣 removed {} stored sessions", files.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::SampleBuffer;
    use crate::types::Reading;

    #[test]
    fn save_writes_one_row_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("sessions"));
        let mut buffer = SampleBuffer::new();
        buffer.reset();
        let epoch = buffer.epoch();
        buffer.append_accel(epoch, Reading::new(1.0, 2.0, 3.0));
        buffer.append_gyro(epoch, Reading::new(4.0, 5.0, 6.0));
        buffer.append_accel(epoch, Reading::new(7.0, 8.0, 9.0));
        store.save("jumping jack", &buffer.snapshot()).unwrap();

        let files = store.session_files().unwrap();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().unwrap().to_str().unwrap().to_owned();
        assert!(name.starts_with("session_jumping_jack_"));
        let text = fs::read_to_string(&files[0]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# label=jumping jack");
        assert_eq!(lines[1], "seq,stream,x,y,z");
        assert_eq!(lines.len(), 5);
        assert!(lines[2].starts_with("0,accel,1.000000"));
        assert!(lines[3].starts_with("2,accel,7.000000"));
        assert!(lines[4].starts_with("1,gyro,4.000000"));
    }

    #[test]
    fn drop_all_only_removes_session_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.save("a", &BufferSnapshot::default()).unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        store.drop_all().unwrap();
        assert!(store.session_files().unwrap().is_empty());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn back_to_back_saves_keep_every_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.save("squat", &BufferSnapshot::default()).unwrap();
        store.save("squat", &BufferSnapshot::default()).unwrap();
        // both sanitize to "a_b"
        store.save("a b", &BufferSnapshot::default()).unwrap();
        store.save("a_b", &BufferSnapshot::default()).unwrap();
        assert_eq!(store.session_files().unwrap().len(), 4);
    }

    #[test]
    fn drop_all_on_missing_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent"));
        assert!(store.drop_all().is_ok());
    }
}
