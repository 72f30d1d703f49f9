// src/io/corpus.rs

use std::fs;
use std::path::Path;

use crate::error::CorpusError;
use crate::model::structure::StructureRecord;

/// Reads already-ingested records: a JSON array, or one JSON object per line
pub fn load_corpus(path: &Path) -> Result<Vec<StructureRecord>, CorpusError> {
    let text = fs::read_to_string(path).map_err(|source| CorpusError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_corpus(&text).map_err(|(line, source)| CorpusError::Parse {
        path: path.to_path_buf(),
        line,
        source,
    })?;
    log::info!("Loaded {} structures from {:?}", records.len(), path);
    Ok(records)
}

fn parse_corpus(text: &str) -> Result<Vec<StructureRecord>, (usize, serde_json::Error)> {
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(text).map_err(|e| (e.line(), e));
    }

    // JSON Lines
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| serde_json::from_str(line).map_err(|e| (i + 1, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const NACL: &str = r#"{"id":"nacl","sites":[{"element":"Na","frac_coords":[0,0,0]},{"element":"Cl","frac_coords":[0.5,0.5,0.5]}],"lattice":{"a":5.64,"b":5.64,"c":5.64,"alpha":90,"beta":90,"gamma":90}}"#;

    #[test]
    fn reads_array_and_lines() {
        let array = format!("[{}, {}]", NACL, NACL);
        assert_eq!(parse_corpus(&array).unwrap().len(), 2);

        let lines = format!("{}\n\n{}\n", NACL, NACL);
        let records = parse_corpus(&lines).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "nacl");
        assert!(records[0].space_group.is_none());
    }

    #[test]
    fn parse_errors_carry_the_line() {
        let text = format!("{}\n{{ broken\n", NACL);
        let (line, _) = parse_corpus(&text).unwrap_err();
        assert_eq!(line, 2);
    }

    #[test]
    fn load_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", NACL).unwrap();
        assert_eq!(load_corpus(file.path()).unwrap().len(), 1);

        let missing = load_corpus(Path::new("/nonexistent/corpus.jsonl"));
        assert!(matches!(missing, Err(CorpusError::Io { .. })));
    }
}
