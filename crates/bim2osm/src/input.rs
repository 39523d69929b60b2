// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Input optimizer
//!
//! Rewrites the source file into a sanitized temporary copy. The source
//! file itself is never modified.

use crate::config::ConverterConfig;
use crate::error::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

lazy_static! {
    /// A complete `/* ... */` span on one line
    static ref BLOCK_COMMENT: Regex =
        Regex::new(r"/\*.*?\*/").expect("block comment pattern is valid");
}

const OPEN: &str = "/*";
const CLOSE: &str = "*/";

/// Sanitized copy of an input file
///
/// The temporary file is deleted when this value is dropped.
#[derive(Debug)]
pub struct OptimizedInput {
    file: NamedTempFile,
    /// Number of comment spans removed
    pub stripped_comments: usize,
}

impl OptimizedInput {
    /// Location of the sanitized copy
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn read_to_string(&self) -> Result<String> {
        Ok(std::fs::read_to_string(self.file.path())?)
    }
}

/// Produces [`OptimizedInput`]s according to a [`ConverterConfig`]
pub struct InputOptimizer;

impl InputOptimizer {
    /// Copy `path` into a temporary file, applying the enabled rewrites
    ///
    /// The copy is made even when no rewrite is enabled.
    pub fn optimize_file(config: &ConverterConfig, path: impl AsRef<Path>) -> Result<OptimizedInput> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;

        let (text, stripped_comments) = if config.remove_block_comments {
            strip_block_comments(&source)
        } else {
            (source, 0)
        };

        let mut file = tempfile::Builder::new()
            .prefix("bim2osm-")
            .suffix(".ifc")
            .tempfile()?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            writer.write_all(text.as_bytes())?;
            writer.flush()?;
        }

        log::debug!(
            "Optimized {} -> {} ({} block comments removed)",
            path.display(),
            file.path().display(),
            stripped_comments
        );

        Ok(OptimizedInput {
            file,
            stripped_comments,
        })
    }
}

/// Remove every `/* ... */` span, including spans over several lines
///
/// Works line by line, carrying the open-comment state across lines. Line
/// breaks inside a removed span are kept, so line numbers still match the
/// source. Returns the cleaned text and the number of spans removed.
pub fn strip_block_comments(source: &str) -> (String, usize) {
    let mut out = String::with_capacity(source.len());
    let mut in_comment = false;
    let mut count = 0;

    for line in source.split_inclusive('\n') {
        let (body, terminator) = split_terminator(line);
        let mut rest = body;

        loop {
            if in_comment {
                match rest.find(CLOSE) {
                    Some(end) => {
                        rest = &rest[end + CLOSE.len()..];
                        in_comment = false;
                    }
                    None => break,
                }
            } else {
                count += BLOCK_COMMENT.find_iter(rest).count();
                let cleaned = BLOCK_COMMENT.replace_all(rest, "");
                match cleaned.find(OPEN) {
                    Some(start) => {
                        out.push_str(&cleaned[..start]);
                        in_comment = true;
                        count += 1;
                    }
                    None => out.push_str(&cleaned),
                }
                break;
            }
        }

        out.push_str(terminator);
    }

    (out, count)
}

fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_single_line() {
        let (out, count) = strip_block_comments("#1=IFCWALL(/* x */'a');\n");
        assert_eq!(out, "#1=IFCWALL('a');\n");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_strip_multi_line_keeps_line_breaks() {
        let source = "ISO-10303-21;\n/* generated\n   by exporter */HEADER;\nDATA;\n";
        let (out, count) = strip_block_comments(source);
        assert_eq!(out, "ISO-10303-21;\n\nHEADER;\nDATA;\n");
        assert_eq!(count, 1);
        assert_eq!(out.lines().count(), source.lines().count());
    }

    #[test]
    fn test_strip_mixed_spans_on_one_line() {
        let (out, count) = strip_block_comments("a /* 1 */ b /* 2\nc */ d /* 3 */ e\r\nf");
        assert_eq!(out, "a  b \n d  e\r\nf");
        assert_eq!(count, 3);
    }

    #[test]
    fn test_text_without_comments_is_unchanged() {
        let source = "#5=IFCLABEL('a*b/c');\r\n#6=IFCWALL($);";
        let (out, count) = strip_block_comments(source);
        assert_eq!(out, source);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_optimize_file_leaves_source_untouched() {
        let mut source = NamedTempFile::new().unwrap();
        let original = "DATA;\n/* note */#1=IFCWALL($);\n";
        source.write_all(original.as_bytes()).unwrap();

        let config = ConverterConfig::default();
        let optimized = InputOptimizer::optimize_file(&config, source.path()).unwrap();
        let temp_path = optimized.path().to_path_buf();

        assert_eq!(optimized.read_to_string().unwrap(), "DATA;\n#1=IFCWALL($);\n");
        assert_eq!(optimized.stripped_comments, 1);
        assert_eq!(std::fs::read_to_string(source.path()).unwrap(), original);

        drop(optimized);
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_optimize_file_copies_when_disabled() {
        let mut source = NamedTempFile::new().unwrap();
        source.write_all(b"/* kept */").unwrap();

        let config = ConverterConfig::default().with_remove_block_comments(false);
        let optimized = InputOptimizer::optimize_file(&config, source.path()).unwrap();
        assert_ne!(optimized.path(), source.path());
        assert_eq!(optimized.read_to_string().unwrap(), "/* kept */");
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let config = ConverterConfig::default();
        let result = InputOptimizer::optimize_file(&config, "/nonexistent/model.ifc");
        assert!(matches!(result, Err(crate::ConvertError::Io(_))));
    }
}
