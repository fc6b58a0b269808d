//! Macro persistence - JSON lines, one action per line
//!
//! The first line is a header carrying the action count and duration so a
//! truncated or edited file is rejected instead of half-loaded.

use crate::events::{Macro, MacroAction};
use macromaker_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const FORMAT: &str = "macromaker";
const VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    format: String,
    version: u32,
    actions: usize,
    duration: u64,
}

/// Reads and writes whole macros. Both directions are all-or-nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacroSerializer;

impl MacroSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn serialize<W: Write>(&self, macro_: &Macro, writer: W) -> Result<()> {
        let mut w = BufWriter::new(writer);

        let header = Header {
            format: FORMAT.to_string(),
            version: VERSION,
            actions: macro_.len(),
            duration: macro_.duration_ms(),
        };
        serde_json::to_writer(&mut w, &header).map_err(io_error)?;
        writeln!(w)?;

        for action in macro_.actions() {
            serde_json::to_writer(&mut w, action).map_err(io_error)?;
            writeln!(w)?;
        }

        w.flush()?;
        Ok(())
    }

    pub fn deserialize<R: BufRead>(&self, reader: R) -> Result<Macro> {
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| Error::deserialization("empty macro file"))?
            .map_err(read_error)?;
        let header: Header = serde_json::from_str(&header_line)
            .map_err(|e| Error::deserialization(format!("bad header: {}", e)))?;
        if header.format != FORMAT {
            return Err(Error::deserialization(format!(
                "unknown format '{}'",
                header.format
            )));
        }
        if header.version != VERSION {
            return Err(Error::deserialization(format!(
                "unsupported version {}",
                header.version
            )));
        }

        let mut actions = Vec::with_capacity(header.actions.min(1 << 16));
        for (i, line) in lines.enumerate() {
            let line = line.map_err(read_error)?;
            if line.trim().is_empty() {
                continue;
            }
            let action: MacroAction = serde_json::from_str(&line)
                .map_err(|e| Error::deserialization(format!("line {}: {}", i + 2, e)))?;
            actions.push(action);
        }

        if actions.len() != header.actions {
            return Err(Error::deserialization(format!(
                "expected {} actions, found {}",
                header.actions,
                actions.len()
            )));
        }

        let macro_ = Macro::from_actions(actions).map_err(|e| match e {
            Error::InvalidState(msg) => Error::Deserialization(msg),
            other => other,
        })?;
        if macro_.duration_ms() != header.duration {
            return Err(Error::deserialization(format!(
                "header says {}ms, actions end at {}ms",
                header.duration,
                macro_.duration_ms()
            )));
        }

        Ok(macro_)
    }
}

fn io_error(e: serde_json::Error) -> Error {
    Error::Io(e.into())
}

fn read_error(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::InvalidData => Error::deserialization(e.to_string()),
        _ => Error::Io(e),
    }
}

/// Directory of saved macros.
pub struct MacroStorage {
    dir: PathBuf,
    serializer: MacroSerializer,
}

impl MacroStorage {
    pub fn with_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            serializer: MacroSerializer::new(),
        })
    }

    /// Save under `<name>_<timestamp>.jsonl`, returning the full path.
    pub fn save(&self, name: &str, macro_: &Macro) -> Result<PathBuf> {
        let ts = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!("{}_{}.jsonl", sanitize(name), ts);
        let path = self.dir.join(&filename);

        self.serializer.serialize(macro_, File::create(&path)?)?;
        tracing::info!(path = %path.display(), actions = macro_.len(), "macro saved");
        Ok(path)
    }

    /// Load by file name (relative to the storage directory) or absolute path.
    pub fn load(&self, file: &str) -> Result<Macro> {
        let path = self.resolve(file);
        let reader = BufReader::new(File::open(&path)?);
        self.serializer.deserialize(reader)
    }

    pub fn list(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(s) = name.to_str() {
                if s.ends_with(".jsonl") {
                    files.push(s.to_string());
                }
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn delete(&self, file: &str) -> Result<()> {
        fs::remove_file(self.resolve(file))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn resolve(&self, file: &str) -> PathBuf {
        let p = Path::new(file);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.dir.join(p)
        }
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use macromaker_core::{InputEvent, KeyCode, MouseButton};
    use std::io::Cursor;

    fn sample(n: usize) -> Macro {
        let events = [
            InputEvent::KeyPress { key: KeyCode::CTRL },
            InputEvent::MouseMove { x: 10, y: -4 },
            InputEvent::MousePress { button: MouseButton::Middle },
            InputEvent::Scroll { amount: -3 },
            InputEvent::MouseRelease { button: MouseButton::Middle },
            InputEvent::KeyRelease { key: KeyCode::CTRL },
        ];
        let actions = (0..n)
            .map(|i| MacroAction::new(i as u64 * 37, events[i % events.len()].clone()))
            .collect();
        Macro::from_actions(actions).unwrap()
    }

    fn to_text(m: &Macro) -> String {
        let mut buf = Vec::new();
        MacroSerializer::new().serialize(m, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn from_text(s: &str) -> Result<Macro> {
        MacroSerializer::new().deserialize(Cursor::new(s))
    }

    #[test]
    fn round_trip_zero_one_many() {
        for n in [0, 1, 25] {
            let m = sample(n);
            let back = from_text(&to_text(&m)).unwrap();
            assert_eq!(back, m);
            assert_eq!(back.duration_ms(), m.duration_ms());
        }
    }

    #[test]
    fn header_line_first() {
        let text = to_text(&sample(2));
        let first = text.lines().next().unwrap();
        assert_eq!(first, r#"{"format":"macromaker","version":1,"actions":2,"duration":37}"#);
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn rejects_truncated_file() {
        let text = to_text(&sample(4));
        let truncated: Vec<&str> = text.lines().take(3).collect();
        let err = from_text(&truncated.join("\n")).unwrap_err();
        assert!(matches!(err, Error::Deserialization(_)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(from_text(""), Err(Error::Deserialization(_))));
        assert!(matches!(from_text("not json"), Err(Error::Deserialization(_))));

        let bad_action = concat!(
            "{\"format\":\"macromaker\",\"version\":1,\"actions\":1,\"duration\":0}\n",
            "{\"t\":0,\"e\":\"zz\"}\n",
        );
        assert!(matches!(from_text(bad_action), Err(Error::Deserialization(_))));

        let wrong_format = "{\"format\":\"other\",\"version\":1,\"actions\":0,\"duration\":0}\n";
        assert!(matches!(from_text(wrong_format), Err(Error::Deserialization(_))));
    }

    #[test]
    fn rejects_out_of_order_and_bad_duration() {
        let out_of_order = concat!(
            "{\"format\":\"macromaker\",\"version\":1,\"actions\":2,\"duration\":5}\n",
            "{\"t\":10,\"e\":\"kp\",\"k\":1}\n",
            "{\"t\":5,\"e\":\"kp\",\"k\":1}\n",
        );
        assert!(matches!(from_text(out_of_order), Err(Error::Deserialization(_))));

        let bad_duration = concat!(
            "{\"format\":\"macromaker\",\"version\":1,\"actions\":1,\"duration\":99}\n",
            "{\"t\":10,\"e\":\"kp\",\"k\":1}\n",
        );
        assert!(matches!(from_text(bad_duration), Err(Error::Deserialization(_))));
    }

    #[test]
    fn storage_save_list_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MacroStorage::with_dir(dir.path().join("macros")).unwrap();
        let m = sample(3);

        let path = storage.save("my macro/1", &m).unwrap();
        let file = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(file.starts_with("my_macro_1_"));
        assert!(file.ends_with(".jsonl"));

        assert_eq!(storage.list().unwrap(), vec![file.clone()]);
        assert_eq!(storage.load(&file).unwrap(), m);
        assert_eq!(storage.load(path.to_str().unwrap()).unwrap(), m);

        storage.delete(&file).unwrap();
        assert!(storage.list().unwrap().is_empty());
        assert!(matches!(storage.load(&file), Err(Error::Io(_))));
    }
}
