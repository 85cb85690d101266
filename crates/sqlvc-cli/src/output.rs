//! Terminal rendering of command results

use comfy_table::{ContentArrangement, Table, presets};
use sqlvc_schema::{ChangeKind, Reconciliation, SynthesisReport};
use sqlvc_versioning::{DiffEngine, SyncOutcome};

/// Table of added, modified and deleted objects
pub fn changes_table(result: &Reconciliation) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Change", "Kind", "Schema", "Name", "Lines"]);

    for (change, key) in result.changes() {
        let lines = result
            .find_modified(&key)
            .map(|m| {
                let (ins, del) = DiffEngine::line_stats(&m.saved.definition, &m.current.definition);
                format!("+{ins} -{del}")
            })
            .unwrap_or_default();
        table.add_row(vec![
            change_label(change).to_string(),
            key.kind.display_name().to_string(),
            key.schema.clone(),
            key.name.clone(),
            lines,
        ]);
    }
    table
}

fn change_label(change: ChangeKind) -> &'static str {
    match change {
        ChangeKind::Added => "+ added",
        ChangeKind::Modified => "~ modified",
        ChangeKind::Deleted => "- deleted",
        ChangeKind::Unchanged => "  unchanged",
    }
}

/// Full `status` report
pub fn status_report(result: &Reconciliation) -> String {
    if result.is_clean() {
        return format!(
            "Schema matches the snapshot ({} objects).",
            result.unchanged.len()
        );
    }
    format!("{}\n{}", changes_table(result), result.summary())
}

/// Warning lines for tables whose DDL could not be synthesized
pub fn synthesis_warnings(report: &SynthesisReport) -> Vec<String> {
    report
        .missing
        .iter()
        .map(|(schema, table)| {
            format!("warning: no column metadata for {schema}.{table}; its definition is empty")
        })
        .collect()
}

/// Result of `sync`/`commit`
pub fn sync_report(outcome: &SyncOutcome, dry_run: bool) -> String {
    let mut lines = vec![status_report(&outcome.reconciliation)];
    if dry_run {
        lines.push("Dry run: nothing written.".to_string());
        return lines.join("\n");
    }
    if outcome.written {
        lines.push("Snapshot written.".to_string());
    }
    if outcome.staged {
        lines.push("Snapshot staged.".to_string());
    } else if outcome.written {
        lines.push("Not inside a repository; snapshot not staged.".to_string());
    }
    if outcome.committed {
        lines.push("Committed.".to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sqlvc_schema::{ObjectKind, SchemaObject, reconcile};

    fn sample() -> Reconciliation {
        reconcile(
            &[
                SchemaObject::new("dbo", "Orders", ObjectKind::Table, "t1\nt2\n"),
                SchemaObject::new("sales", "vTotals", ObjectKind::View, "v"),
            ],
            &[
                SchemaObject::new("dbo", "Orders", ObjectKind::Table, "t1\n"),
                SchemaObject::new("dbo", "usp_Old", ObjectKind::Procedure, "p"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_changes_table_lists_every_change() {
        let rendered = changes_table(&sample()).to_string();

        assert!(rendered.contains("+ added"));
        assert!(rendered.contains("vTotals"));
        assert!(rendered.contains("~ modified"));
        assert!(rendered.contains("Orders"));
        assert!(rendered.contains("- deleted"));
        assert!(rendered.contains("Procedure"));
    }

    #[test]
    fn test_changes_table_counts_lines_of_modified_only() {
        let rendered = changes_table(&sample()).to_string();

        assert!(rendered.contains("+1 -0"));
        assert_eq!(rendered.matches("+1 -0").count(), 1);
        assert!(!rendered.contains("+0"));
    }

    #[test]
    fn test_status_report_clean() {
        let objects = vec![SchemaObject::new("dbo", "v", ObjectKind::View, "x")];
        let result = reconcile(&objects, &objects).unwrap();

        assert_eq!(status_report(&result), "Schema matches the snapshot (1 objects).");
    }

    #[test]
    fn test_status_report_ends_with_summary() {
        assert!(status_report(&sample()).ends_with("1 added, 1 modified, 1 deleted, 0 unchanged"));
    }

    #[test]
    fn test_synthesis_warnings() {
        let report = SynthesisReport {
            synthesized: 0,
            missing: vec![("dbo".to_string(), "Gone".to_string())],
        };
        assert_eq!(
            synthesis_warnings(&report),
            vec!["warning: no column metadata for dbo.Gone; its definition is empty"]
        );
    }

    #[test]
    fn test_sync_report_dry_run() {
        let outcome = SyncOutcome {
            reconciliation: sample(),
            ..Default::default()
        };
        assert!(sync_report(&outcome, true).ends_with("Dry run: nothing written."));
    }

    #[test]
    fn test_sync_report_committed() {
        let outcome = SyncOutcome {
            reconciliation: sample(),
            written: true,
            staged: true,
            committed: true,
            ..Default::default()
        };
        let report = sync_report(&outcome, false);
        assert!(report.ends_with("Snapshot written.\nSnapshot staged.\nCommitted."));
    }
}
