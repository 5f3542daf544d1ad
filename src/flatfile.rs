//! Plain-text formats shared by every stage of the pipeline.
//!
//! - entity lists: one identifier per line
//! - triplet files: `head relation tail`, single spaces
//! - value files: `id value`, where the value is the rest of the line and
//!   the literal `None` marks a missing value
//!
//! Writers go through a temporary sibling file and a rename, so a failed run
//! never leaves a truncated output behind.

use indexmap::{IndexMap, IndexSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::entity::EntityId;
use crate::error::{Result, WikigraphError};
use crate::graph::{Relation, Triplet};

/// Marker for a missing value in value files.
pub const NONE_VALUE: &str = "None";

fn read(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

/// Lines with their 1-based numbers, blank lines skipped.
fn content_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty())
}

/// Parse an entity list. Duplicates collapse onto their first occurrence.
pub fn parse_entities(content: &str, path: &Path) -> Result<IndexSet<EntityId>> {
    let mut entities = IndexSet::new();

    for (line_no, line) in content_lines(content) {
        let id = EntityId::from(line.trim());
        if !id.is_well_formed() {
            return Err(WikigraphError::malformed(
                path,
                line_no,
                format!("expected an entity id like Q42 or P31, found {:?}", line.trim()),
            ));
        }
        entities.insert(id);
    }

    Ok(entities)
}

pub fn load_entities(path: &Path) -> Result<IndexSet<EntityId>> {
    parse_entities(&read(path)?, path)
}

/// Parse a triplet file.
pub fn parse_triplets(content: &str, path: &Path) -> Result<Vec<Triplet>> {
    let mut triplets = Vec::new();

    for (line_no, line) in content_lines(content) {
        let fields: Vec<&str> = line.split(' ').collect();
        match fields.as_slice() {
            [head, relation, tail] if !head.is_empty() && !relation.is_empty() && !tail.is_empty() => {
                triplets.push(Triplet {
                    head: EntityId::from(*head),
                    relation: Relation::from(*relation),
                    tail: EntityId::from(*tail),
                });
            }
            _ => {
                return Err(WikigraphError::malformed(
                    path,
                    line_no,
                    format!("expected `head relation tail`, found {} fields", fields.len()),
                ));
            }
        }
    }

    Ok(triplets)
}

pub fn load_triplets(path: &Path) -> Result<Vec<Triplet>> {
    parse_triplets(&read(path)?, path)
}

pub fn dump_triplets<'a, I>(path: &Path, triplets: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a Triplet>,
{
    let mut out = String::new();
    let mut count = 0;
    for t in triplets {
        // Display writes `head relation tail`
        let _ = writeln!(out, "{}", t);
        count += 1;
    }
    write_atomic(path, &out)?;
    Ok(count)
}

/// Parse a value file. A repeated id keeps its first position and last value.
pub fn parse_values(content: &str, path: &Path) -> Result<IndexMap<EntityId, Option<String>>> {
    let mut values = IndexMap::new();

    for (line_no, line) in content_lines(content) {
        let (id, value) = line.split_once(' ').ok_or_else(|| {
            WikigraphError::malformed(path, line_no, "expected `id value`, found a single field")
        })?;
        if id.is_empty() {
            return Err(WikigraphError::malformed(path, line_no, "empty id"));
        }
        let value = (value != NONE_VALUE).then(|| value.to_string());
        values.insert(EntityId::from(id), value);
    }

    Ok(values)
}

pub fn load_values(path: &Path) -> Result<IndexMap<EntityId, Option<String>>> {
    parse_values(&read(path)?, path)
}

pub fn dump_values<'a, I>(path: &Path, values: I) -> Result<usize>
where
    I: IntoIterator<Item = (&'a EntityId, Option<&'a str>)>,
{
    let mut out = String::new();
    let mut count = 0;
    for (id, value) in values {
        // Values are single-line; embedded newlines would split the record.
        let value = value.map(|v| v.replace(['\n', '\r'], " "));
        let _ = writeln!(out, "{} {}", id, value.as_deref().unwrap_or(NONE_VALUE));
        count += 1;
    }
    write_atomic(path, &out)?;
    Ok(count)
}

pub fn dump_entities<'a, I>(path: &Path, entities: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a EntityId>,
{
    let mut out = String::new();
    let mut count = 0;
    for id in entities {
        let _ = writeln!(out, "{}", id);
        count += 1;
    }
    write_atomic(path, &out)?;
    Ok(count)
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Replace `path` with `content` in one rename.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path);
    let written = fs::write(&tmp, content).and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = written {
        // a partial write or a failed rename must not leave the temp file behind
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn p() -> &'static Path {
        Path::new("test.txt")
    }

    #[test]
    fn test_entities_skip_blank_lines() {
        let entities = parse_entities("Q1\n\nQ2\r\n  \nP31", p()).unwrap();
        let ids: Vec<&str> = entities.iter().map(EntityId::as_str).collect();
        assert_eq!(ids, vec!["Q1", "Q2", "P31"]);
    }

    #[test]
    fn test_entities_dedup_keeps_first_position() {
        let entities = parse_entities("Q2\nQ1\nQ2\n", p()).unwrap();
        let ids: Vec<&str> = entities.iter().map(EntityId::as_str).collect();
        assert_eq!(ids, vec!["Q2", "Q1"]);
    }

    #[test]
    fn test_entities_malformed_line_reports_position() {
        let err = parse_entities("Q1\nQ2 Q3\n", p()).unwrap_err();
        match err {
            WikigraphError::Malformed { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_triplets_parse() {
        let triplets = parse_triplets(
            "Q1 http://www.wikidata.org/prop/direct/P31 Q2\n\nQ2 P279 Q3\n",
            p(),
        )
        .unwrap();
        assert_eq!(
            triplets,
            vec![
                Triplet::new("Q1", "http://www.wikidata.org/prop/direct/P31", "Q2"),
                Triplet::new("Q2", "P279", "Q3"),
            ]
        );
    }

    #[test]
    fn test_triplets_wrong_field_count() {
        assert!(matches!(
            parse_triplets("Q1 P31\n", p()),
            Err(WikigraphError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            parse_triplets("Q1 P31 Q2\nQ1 P31 Q2 Q3\n", p()),
            Err(WikigraphError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            parse_triplets("Q1  Q2\n", p()),
            Err(WikigraphError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn test_values_keep_spaces_and_none() {
        let values = parse_values("Q1 capital of France\nQ2 None\nQ3 None of the above\n", p()).unwrap();
        assert_eq!(values["Q1"].as_deref(), Some("capital of France"));
        assert_eq!(values["Q2"], None);
        assert_eq!(values["Q3"].as_deref(), Some("None of the above"));
    }

    #[test]
    fn test_values_single_field_is_malformed() {
        assert!(matches!(
            parse_values("Q1 a\nQ2\n", p()),
            Err(WikigraphError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn test_dump_and_load_files() {
        let dir = TempDir::new().unwrap();
        let graph_path = dir.path().join("out/graph.txt");
        let triplets = vec![Triplet::new("Q1", "R1", "Q2"), Triplet::new("Q2", "R1", "Q3")];

        assert_eq!(dump_triplets(&graph_path, &triplets).unwrap(), 2);
        assert_eq!(
            fs::read_to_string(&graph_path).unwrap(),
            "Q1 R1 Q2\nQ2 R1 Q3\n"
        );
        assert_eq!(load_triplets(&graph_path).unwrap(), triplets);
        assert!(!dir.path().join("out/.graph.txt.tmp").exists());

        let values_path = dir.path().join("labels.txt");
        let q1 = EntityId::from("Q1");
        let q2 = EntityId::from("Q2");
        dump_values(&values_path, vec![(&q1, Some("Paris")), (&q2, None)]).unwrap();
        assert_eq!(fs::read_to_string(&values_path).unwrap(), "Q1 Paris\nQ2 None\n");
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entities.txt");
        fs::write(&path, "old\n").unwrap();
        let ids = [EntityId::from("Q9")];
        dump_entities(&path, &ids).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Q9\n");
    }

    #[test]
    fn test_write_atomic_failure_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("labels.txt");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();

        let err = write_atomic(&target, "Q1 Paris\n").unwrap_err();
        assert!(matches!(err, WikigraphError::Io(_)));
        assert!(!dir.path().join(".labels.txt.tmp").exists());
        assert!(target.join("keep").exists());
    }
}
