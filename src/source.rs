use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("cannot read {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// One input to the filter: a named file, or standard input.
#[derive(Debug, Clone)]
pub enum Input {
    Stdin,
    Path(PathBuf),
}

impl Input {
    pub fn open(&self) -> Result<Box<dyn BufRead>, SourceError> {
        match self {
            Input::Stdin => Ok(Box::new(BufReader::new(io::stdin()))),
            Input::Path(p) => {
                let file = File::open(p).map_err(|source| SourceError::Open {
                    path: p.display().to_string(),
                    source,
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

/// Files named on the command line, else standard input.
pub fn inputs_from_args(paths: &[PathBuf]) -> Vec<Input> {
    if paths.is_empty() {
        vec![Input::Stdin]
    } else {
        paths.iter().cloned().map(Input::Path).collect()
    }
}
