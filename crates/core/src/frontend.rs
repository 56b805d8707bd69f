//! Lexing and parsing glued together.
//!
//! A compilation unit is one file. Within a check every file is tokenized by
//! the same [`Tokenizer`], so naming a file twice is reported as an error
//! instead of silently parsing it again. A failure in one file does not stop
//! the others.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::ast::Ast;
use crate::error::FrontendError;
use crate::lexer::{self, Tokenizer};
use crate::parser::{self, ParserOptions};
use crate::source::{FileSystemProvider, SourceProvider};

/// Tokenize and parse `text` as the file `filename`.
pub fn parse_source(filename: &str, text: impl Into<String>) -> Result<Ast, FrontendError> {
    let mut stream = lexer::tokenize(filename, text.into())?;
    Ok(parser::parse(&mut stream)?)
}

/// Read and parse one file from disk.
pub fn parse_file(path: &Path) -> Result<Ast, FrontendError> {
    let text = FileSystemProvider
        .read_source(path)
        .map_err(|source| FrontendError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_source(&FileSystemProvider.file_name(path), text)
}

/// Outcome for one file of a [`check_files`] run.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub result: Result<Ast, FrontendError>,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Parse every file in `paths`, in order, with one shared tokenizer.
pub fn check_files(
    paths: &[PathBuf],
    provider: &dyn SourceProvider,
    options: ParserOptions,
) -> Vec<FileReport> {
    let mut tokenizer = Tokenizer::new();
    let reports: Vec<FileReport> = paths
        .iter()
        .map(|path| FileReport {
            path: path.clone(),
            result: check_one(&mut tokenizer, path, provider, options),
        })
        .collect();
    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    info!(files = reports.len(), failed, "check finished");
    reports
}

fn check_one(
    tokenizer: &mut Tokenizer,
    path: &Path,
    provider: &dyn SourceProvider,
    options: ParserOptions,
) -> Result<Ast, FrontendError> {
    let name = provider.file_name(path);
    debug!(file = %name, "checking");
    let text = provider
        .read_source(path)
        .map_err(|source| FrontendError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let stream = tokenizer.tokenize(&name, text)?;
    let result = parser::parse_with_options(stream, options);
    if let Err(err) = &result {
        debug!(file = %name, line = err.line, column = err.column, "{}", err.message);
    }
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryProvider;

    fn provider() -> InMemoryProvider {
        InMemoryProvider::default()
            .with_file("a.cour", "{ x := 1; }")
            .with_file("bad.cour", "{ x := ; }")
            .with_file("lex.cour", "{ x := $; }")
    }

    #[test]
    fn parse_source_wraps_both_error_kinds() {
        assert!(parse_source("ok.cour", "{ }").is_ok());
        assert!(matches!(
            parse_source("l.cour", "{ ::x; }"),
            Err(FrontendError::Lex(_))
        ));
        assert!(matches!(
            parse_source("p.cour", "{ x }"),
            Err(FrontendError::Parse(_))
        ));
    }

    #[test]
    fn one_failure_does_not_stop_the_others() {
        let paths: Vec<PathBuf> = ["bad.cour", "lex.cour", "a.cour", "missing.cour"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let reports = check_files(&paths, &provider(), ParserOptions::default());
        assert!(matches!(reports[0].result, Err(FrontendError::Parse(_))));
        assert!(matches!(reports[1].result, Err(FrontendError::Lex(_))));
        assert!(reports[2].is_ok());
        assert!(matches!(reports[3].result, Err(FrontendError::Io { .. })));
    }

    #[test]
    fn the_same_file_twice_is_rejected() {
        let paths = vec![PathBuf::from("a.cour"), PathBuf::from("./a.cour")];
        let reports = check_files(&paths, &provider(), ParserOptions::default());
        assert!(reports[0].is_ok());
        match &reports[1].result {
            Err(FrontendError::Lex(e)) => {
                assert_eq!(e.message, "file 'a.cour' has already been tokenized")
            }
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn files_in_different_parent_dirs_are_distinct() {
        let provider = InMemoryProvider::default()
            .with_file("../x.cour", "{ }")
            .with_file("../../x.cour", "{ y; }");
        let paths = vec![PathBuf::from("../x.cour"), PathBuf::from("../../x.cour")];
        let reports = check_files(&paths, &provider, ParserOptions::default());
        assert!(reports.iter().all(FileReport::is_ok));
        let nodes: Vec<usize> = reports
            .iter()
            .map(|r| r.result.as_ref().map(Ast::len).unwrap_or(0))
            .collect();
        assert_eq!(nodes, vec![2, 3]);
    }

    #[test]
    fn parse_file_reports_missing_files_as_io() {
        let err = parse_file(Path::new("/definitely/not/here.cour")).unwrap_err();
        assert!(err.to_string().starts_with("cannot read '/definitely/not/here.cour'"));
    }
}
