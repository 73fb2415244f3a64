use crate::error::Result;
use crate::session::Response;
use chrono::Local;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct ResponseRow {
    word: String,
    ink: String,
    response: String,
    correct: bool,
    reaction_time: f64,
}

impl From<&Response> for ResponseRow {
    fn from(r: &Response) -> Self {
        Self {
            word: r.trial.word.to_string(),
            ink: r.trial.ink.to_string(),
            response: r.chosen.to_string(),
            correct: r.correct,
            reaction_time: r.reaction_time_seconds,
        }
    }
}

/// Write the response log as CSV, one row per trial, header
/// `word,ink,response,correct,reaction_time`.
pub fn write_responses<W: Write>(writer: W, responses: &[Response]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    if responses.is_empty() {
        // serde only emits the header alongside the first record
        csv.write_record(["word", "ink", "response", "correct", "reaction_time"])?;
    }
    for response in responses {
        csv.serialize(ResponseRow::from(response))?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the log into `dir` under a timestamped name and return the file path.
/// Earlier exports are never overwritten.
pub fn export_to_dir<P: AsRef<Path>>(dir: P, responses: &[Response]) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let stem = format!("stroop-{}", Local::now().format("%Y%m%d-%H%M%S-%3f"));
    let (path, file) = create_unique(dir, &stem)?;
    write_responses(file, responses)?;

    tracing::info!(path = %path.display(), rows = responses.len(), "exported responses");
    Ok(path)
}

/// Create `<stem>.csv`, or `<stem>-1.csv`, `<stem>-2.csv`, ... if taken
fn create_unique(dir: &Path, stem: &str) -> io::Result<(PathBuf, fs::File)> {
    let mut attempt = 0u32;
    loop {
        let name = match attempt {
            0 => format!("{stem}.csv"),
            n => format!("{stem}-{n}.csv"),
        };
        let path = dir.join(name);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::ColorName;
    use crate::session::Trial;
    use tempfile::tempdir;

    fn sample() -> Vec<Response> {
        vec![
            Response {
                trial: Trial::new(ColorName::Red, ColorName::Blue),
                chosen: ColorName::Blue,
                correct: true,
                reaction_time_seconds: 0.8,
            },
            Response {
                trial: Trial::new(ColorName::Green, ColorName::Yellow),
                chosen: ColorName::Green,
                correct: false,
                reaction_time_seconds: 2.5,
            },
        ]
    }

    #[test]
    fn test_write_responses_layout() {
        let mut out = Vec::new();
        write_responses(&mut out, &sample()).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "word,ink,response,correct,reaction_time");
        assert_eq!(lines[1], "RED,BLUE,BLUE,true,0.8");
        assert_eq!(lines[2], "GREEN,YELLOW,GREEN,false,2.5");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_empty_log_still_has_header() {
        let mut out = Vec::new();
        write_responses(&mut out, &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "word,ink,response,correct,reaction_time\n"
        );
    }

    #[test]
    fn test_export_to_dir_creates_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested").join("exports");

        let path = export_to_dir(&target, &sample()).unwrap();

        assert!(path.starts_with(&target));
        assert!(path.extension().is_some_and(|e| e == "csv"));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn test_back_to_back_exports_keep_both_files() {
        let dir = tempdir().unwrap();
        let responses = sample();

        let first = export_to_dir(dir.path(), &responses).unwrap();
        let second = export_to_dir(dir.path(), &responses[..1]).unwrap();

        assert_ne!(first, second);
        assert_eq!(std::fs::read_to_string(&first).unwrap().lines().count(), 3);
        assert_eq!(std::fs::read_to_string(&second).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_create_unique_adds_suffix_when_taken() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("stroop-x.csv"), "earlier").unwrap();
        std::fs::write(dir.path().join("stroop-x-1.csv"), "earlier").unwrap();

        let (path, _) = create_unique(dir.path(), "stroop-x").unwrap();

        assert_eq!(path, dir.path().join("stroop-x-2.csv"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("stroop-x.csv")).unwrap(),
            "earlier"
        );
    }
}
