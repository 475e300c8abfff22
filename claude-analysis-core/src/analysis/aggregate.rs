//! Record emitter and the aggregation entry points.

use super::fold::ResultFolder;
use super::git::{GitConfigProbe, RemoteProbe};
use super::index::InvocationIndex;
use crate::ingest::{LogEnvelope, RawRecord};
use crate::types::AnalysisRecord;
use std::path::Path;

/// Aggregate raw records into at most one analysis record.
///
/// Returns an empty vector when no record survives normalization.
///
/// # Example
///
/// ```
/// use claude_analysis_core::analysis::aggregate;
/// use claude_analysis_core::ingest::RawRecord;
///
/// let records: Vec<RawRecord> = Vec::new();
/// assert!(aggregate(records).is_empty());
/// ```
pub fn aggregate<I>(records: I) -> Vec<AnalysisRecord>
where
    I: IntoIterator<Item = RawRecord>,
{
    aggregate_with(records, &GitConfigProbe)
}

/// Aggregate with an explicit repository probe.
pub fn aggregate_with<I>(records: I, probe: &dyn RemoteProbe) -> Vec<AnalysisRecord>
where
    I: IntoIterator<Item = RawRecord>,
{
    let envelopes = normalize(records);
    if envelopes.is_empty() {
        return Vec::new();
    }

    let index = InvocationIndex::build(&envelopes);
    let folder = ResultFolder::fold_all(&index, &envelopes);

    tracing::debug!(
        records = envelopes.len(),
        tools = index.tool_counts.total(),
        reads = folder.read_details.len(),
        writes = folder.write_details.len(),
        diffs = folder.apply_diff_details.len(),
        commands = index.run_details.len(),
        "Aggregated session log"
    );

    vec![emit(index, folder, probe)]
}

fn normalize<I>(records: I) -> Vec<LogEnvelope>
where
    I: IntoIterator<Item = RawRecord>,
{
    records
        .into_iter()
        .enumerate()
        .filter_map(|(position, raw)| match LogEnvelope::from_raw(raw) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                tracing::debug!(position, error = %e, "Dropping record that failed normalization");
                None
            }
        })
        .collect()
}

fn emit(index: InvocationIndex, folder: ResultFolder, probe: &dyn RemoteProbe) -> AnalysisRecord {
    let folder_path = index.folder_path.unwrap_or_default();
    let git_remote_url = if folder_path.is_empty() {
        String::new()
    } else {
        probe.remote_url(Path::new(&folder_path))
    };

    AnalysisRecord {
        total_unique_files: folder.unique_files.len(),
        total_write_lines: folder.total_write_lines,
        total_read_characters: folder.total_read_characters,
        total_write_characters: folder.total_write_characters,
        total_diff_characters: folder.total_diff_characters,
        write_to_file_details: folder.write_details,
        read_file_details: folder.read_details,
        apply_diff_details: folder.apply_diff_details,
        run_command_details: index.run_details,
        tool_call_counts: index.tool_counts,
        task_id: index.task_id.unwrap_or_default(),
        timestamp: index.last_timestamp,
        folder_path,
        git_remote_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolKind;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    /// Probe returning a fixed URL and remembering what it was asked.
    struct FixedProbe {
        url: &'static str,
        calls: RefCell<Vec<String>>,
    }

    impl FixedProbe {
        fn new(url: &'static str) -> Self {
            Self {
                url,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl RemoteProbe for FixedProbe {
        fn remote_url(&self, cwd: &Path) -> String {
            self.calls.borrow_mut().push(cwd.display().to_string());
            self.url.to_string()
        }
    }

    fn raw(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn tool_use(uuid: &str, name: &str, input: Value) -> RawRecord {
        raw(json!({
            "type": "assistant",
            "uuid": uuid,
            "cwd": "/work",
            "sessionId": "session-1",
            "timestamp": "2025-01-01T00:00:00Z",
            "message": {"content": [{"type": "tool_use", "name": name, "input": input}]}
        }))
    }

    fn result(parent: &str, timestamp: &str, payload: Value) -> RawRecord {
        raw(json!({
            "type": "user",
            "parentUuid": parent,
            "cwd": "/work",
            "sessionId": "session-1",
            "timestamp": timestamp,
            "toolUseResult": payload
        }))
    }

    /// S1–S5 in one session.
    fn session() -> Vec<RawRecord> {
        vec![
            tool_use("a1", "Read", json!({"file_path": "fileA.txt"})),
            result(
                "a1",
                "2025-01-01T00:00:01Z",
                json!({"filePath": "fileA.txt", "content": "hello世界\n"}),
            ),
            tool_use("b1", "Write", json!({})),
            result(
                "b1",
                "2025-01-01T00:00:02Z",
                json!({"file": {"filePath": "fileB.txt", "content": "line1\nline2\n"}}),
            ),
            tool_use("c1", "ApplyDiff", json!({})),
            result(
                "c1",
                "2025-01-01T00:00:03.250Z",
                json!({"filePath": "fileB.txt", "structuredPatch": ["@@ -1,1 +1,1 @@"]}),
            ),
            result(
                "zz",
                "2025-01-01T00:00:04Z",
                json!({"filePath": "orphan.txt", "content": "lost"}),
            ),
            tool_use(
                "d1",
                "Bash",
                json!({"command": "ls -la", "description": "list files"}),
            ),
        ]
    }

    fn check_invariants(record: &AnalysisRecord) {
        let read: usize = record.read_file_details.iter().map(|d| d.base.character_count).sum();
        let write: usize = record
            .write_to_file_details
            .iter()
            .map(|d| d.base.character_count)
            .sum();
        let lines: usize = record.write_to_file_details.iter().map(|d| d.base.line_count).sum();
        let diff: usize = record.apply_diff_details.iter().map(|d| d.base.character_count).sum();
        assert_eq!(record.total_read_characters, read);
        assert_eq!(record.total_write_characters, write);
        assert_eq!(record.total_write_lines, lines);
        assert_eq!(record.total_diff_characters, diff);

        let paths: HashSet<&str> = record
            .read_file_details
            .iter()
            .map(|d| d.base.file_path.as_str())
            .chain(record.write_to_file_details.iter().map(|d| d.base.file_path.as_str()))
            .chain(record.apply_diff_details.iter().map(|d| d.base.file_path.as_str()))
            .filter(|p| !p.is_empty())
            .collect();
        assert_eq!(record.total_unique_files, paths.len());

        let max_detail = record
            .read_file_details
            .iter()
            .map(|d| d.base.timestamp)
            .chain(record.write_to_file_details.iter().map(|d| d.base.timestamp))
            .chain(record.apply_diff_details.iter().map(|d| d.base.timestamp))
            .chain(record.run_command_details.iter().map(|d| d.base.timestamp))
            .max()
            .unwrap_or(0);
        assert!(record.timestamp >= max_detail);
    }

    #[test]
    fn test_full_session() {
        crate::logging::init_test();
        let probe = FixedProbe::new("");
        let records = aggregate_with(session(), &probe);
        assert_eq!(records.len(), 1);
        let record = &records[0];

        // S1
        assert_eq!(record.tool_call_counts.of(ToolKind::Read), 1);
        assert_eq!(record.read_file_details.len(), 1);
        assert_eq!(record.read_file_details[0].base.file_path, "fileA.txt");
        assert_eq!(record.read_file_details[0].base.character_count, 8);
        assert_eq!(record.total_read_characters, 8);

        // S2
        assert_eq!(record.write_to_file_details[0].base.line_count, 3);
        assert_eq!(record.total_write_lines, 3);
        assert_eq!(record.total_write_characters, 12);

        // S3
        assert_eq!(record.apply_diff_details.len(), 1);
        assert!(record.total_diff_characters > 0);
        assert_eq!(record.total_unique_files, 2);

        // S4: orphaned result produced nothing
        assert!(record
            .read_file_details
            .iter()
            .all(|d| d.base.file_path != "orphan.txt"));

        // S5
        assert_eq!(record.tool_call_counts.of(ToolKind::Bash), 1);
        let run = &record.run_command_details[0];
        assert_eq!(run.command, "ls -la");
        assert_eq!(run.description, "list files");
        assert_eq!(run.base.file_path, "/work");
        assert_eq!(run.base.line_count, 0);
        assert_eq!(run.base.character_count, 6);

        assert_eq!(record.task_id, "session-1");
        assert_eq!(record.folder_path, "/work");
        assert_eq!(record.timestamp, 1_735_689_604_000);
        check_invariants(record);
    }

    #[test]
    fn test_empty_input_yields_no_records() {
        assert!(aggregate(Vec::new()).is_empty());
    }

    #[test]
    fn test_only_unnormalizable_records_yield_no_records() {
        let records = vec![raw(json!({"uuid": 1})), raw(json!({"type": 7}))];
        assert!(aggregate(records).is_empty());
    }

    #[test]
    fn test_malformed_records_are_indistinguishable_from_absence() {
        let probe = FixedProbe::new("");
        let clean = aggregate_with(session(), &probe);

        let mut noisy = session();
        noisy.insert(1, raw(json!({"uuid": ["not", "a", "string"]})));
        noisy.insert(4, raw(json!({"parentUuid": 12, "toolUseResult": {"content": "x"}})));
        noisy.push(raw(json!({"type": "assistant", "message": 5})));
        let noisy = aggregate_with(noisy, &probe);

        assert_eq!(clean, noisy);
    }

    #[test]
    fn test_permutation_preserves_counts_and_totals() {
        let probe = FixedProbe::new("");
        let forward = aggregate_with(session(), &probe).remove(0);
        let mut reversed_input = session();
        reversed_input.reverse();
        let reversed = aggregate_with(reversed_input, &probe).remove(0);

        assert_eq!(forward.tool_call_counts, reversed.tool_call_counts);
        assert_eq!(forward.total_unique_files, reversed.total_unique_files);
        assert_eq!(forward.total_read_characters, reversed.total_read_characters);
        assert_eq!(forward.total_write_characters, reversed.total_write_characters);
        assert_eq!(forward.total_write_lines, reversed.total_write_lines);
        assert_eq!(forward.total_diff_characters, reversed.total_diff_characters);
        assert_eq!(forward.timestamp, reversed.timestamp);
        check_invariants(&reversed);
    }

    #[test]
    fn test_idempotent() {
        let probe = FixedProbe::new("");
        assert_eq!(
            aggregate_with(session(), &probe),
            aggregate_with(session(), &probe)
        );
    }

    #[test]
    fn test_detail_order_follows_input() {
        let records = vec![
            tool_use("r1", "Read", json!({})),
            tool_use("r2", "Read", json!({})),
            result("r2", "2025-01-01T00:00:01Z", json!({"filePath": "second.txt", "content": "2"})),
            result("r1", "2025-01-01T00:00:02Z", json!({"filePath": "first.txt", "content": "1"})),
        ];
        let record = aggregate_with(records, &FixedProbe::new("")).remove(0);
        let paths: Vec<_> = record
            .read_file_details
            .iter()
            .map(|d| d.base.file_path.as_str())
            .collect();
        assert_eq!(paths, ["second.txt", "first.txt"]);
    }

    #[test]
    fn test_empty_uuids_never_link_results() {
        let mut without_uuid = tool_use("", "Read", json!({"file_path": "b.txt"}));
        without_uuid.remove("uuid");
        let mut without_parent = result("", "2025-01-01T00:00:02Z", json!({"content": "b"}));
        without_parent.remove("parentUuid");

        let records = vec![
            tool_use("", "Read", json!({"file_path": "a.txt"})),
            result(
                "",
                "2025-01-01T00:00:01Z",
                json!({"filePath": "a.txt", "content": "hello"}),
            ),
            without_uuid,
            without_parent,
        ];
        let record = aggregate_with(records, &FixedProbe::new("")).remove(0);

        assert_eq!(record.tool_call_counts.of(ToolKind::Read), 2);
        assert!(record.read_file_details.is_empty());
        assert_eq!(record.total_read_characters, 0);
        assert_eq!(record.total_unique_files, 0);
    }

    #[test]
    fn test_probe_called_with_folder_path() {
        let probe = FixedProbe::new("git@example.com:org/repo.git");
        let record = aggregate_with(session(), &probe).remove(0);
        assert_eq!(record.git_remote_url, "git@example.com:org/repo.git");
        assert_eq!(*probe.calls.borrow(), vec!["/work".to_string()]);
    }

    #[test]
    fn test_probe_skipped_without_folder_path() {
        let probe = FixedProbe::new("should-not-appear");
        let records = vec![raw(json!({"type": "user", "sessionId": "s"}))];
        let record = aggregate_with(records, &probe).remove(0);
        assert_eq!(record.git_remote_url, "");
        assert!(probe.calls.borrow().is_empty());
    }

    #[test]
    fn test_reads_origin_from_working_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(
            dir.path().join(".git/config"),
            "[remote \"origin\"]\n\turl = git@example.com:org/repo.git\n",
        )
        .unwrap();
        let cwd = dir.path().display().to_string();

        let record = aggregate(vec![raw(json!({"cwd": cwd}))]).remove(0);
        assert_eq!(record.git_remote_url, "git@example.com:org/repo.git");

        let empty = TempDir::new().unwrap();
        let cwd = empty.path().display().to_string();
        let record = aggregate(vec![raw(json!({"cwd": cwd}))]).remove(0);
        assert_eq!(record.git_remote_url, "");
    }
}
