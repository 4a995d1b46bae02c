use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error("Failed to read env file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An entry dotenvy could not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub text: String,
    /// Offset within the line where parsing stopped
    pub column: usize,
}

/// Parsed contents of a `.env`-style file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    pub entries: Vec<(String, String)>,
    pub skipped: Vec<SkippedLine>,
}

/// Parse `.env` content without touching the process environment.
///
/// Blank lines and `#` comments are ignored; quoting, `export` and inline
/// comments follow dotenvy. A malformed line is recorded in `skipped` and
/// parsing continues with the next one.
pub fn parse(content: &str) -> EnvFile {
    let mut env = EnvFile::default();

    for item in dotenvy::from_read_iter(content.as_bytes()) {
        match item {
            Ok(pair) => env.entries.push(pair),
            Err(dotenvy::Error::LineParse(text, column)) => {
                env.skipped.push(SkippedLine { text, column })
            }
            Err(e) => env.skipped.push(SkippedLine {
                text: e.to_string(),
                column: 0,
            }),
        }
    }

    env
}

/// Load and parse an env file. A missing file yields `Ok(None)`.
pub fn load(path: &Path) -> Result<Option<EnvFile>, EnvFileError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(parse(&content))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(EnvFileError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
