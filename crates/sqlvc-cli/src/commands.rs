//! Subcommand implementations

use anyhow::{Context, Result, bail};
use sqlvc_schema::{ChangeKind, ModifiedObject, ObjectKey, Reconciliation, SchemaObject};
use sqlvc_versioning::{
    DEFAULT_CONTEXT_LINES, DiffEngine, ReconcileSession, SyncOptions, VcsRepository,
};

use crate::output;

/// Schema assumed when `ddl` is given a bare table name
pub const DEFAULT_SCHEMA: &str = "dbo";

pub async fn run_status(session: &ReconcileSession) -> Result<()> {
    let (result, synthesis) = session.reconcile().await?;
    for warning in output::synthesis_warnings(&synthesis) {
        eprintln!("{warning}");
    }
    println!("{}", output::status_report(&result));
    Ok(())
}

pub async fn run_sync(session: &ReconcileSession, options: SyncOptions) -> Result<()> {
    let dry_run = options.dry_run;
    let outcome = session.sync(&options).await?;
    for warning in output::synthesis_warnings(&outcome.synthesis) {
        eprintln!("{warning}");
    }
    println!("{}", output::sync_report(&outcome, dry_run));
    Ok(())
}

pub async fn run_diff(session: &ReconcileSession, key: Option<&str>) -> Result<()> {
    let key = key
        .map(|k| ObjectKey::parse(k).with_context(|| format!("Invalid object key '{k}'")))
        .transpose()?;

    let (result, _) = session.reconcile().await?;
    let pairs = diff_pairs(&result, key.as_ref())?;
    if pairs.is_empty() {
        println!("No modified objects.");
        return Ok(());
    }
    for pair in &pairs {
        print!("{}", DiffEngine::object_diff(pair, DEFAULT_CONTEXT_LINES));
    }
    Ok(())
}

/// Objects to diff
///
/// Without a key this is every modified object. With one, added and
/// deleted objects are diffed against an empty definition; an unchanged
/// object yields nothing and an unknown key is an error.
pub fn diff_pairs(
    result: &Reconciliation,
    key: Option<&ObjectKey>,
) -> Result<Vec<ModifiedObject>> {
    let Some(key) = key else {
        return Ok(result.modified.clone());
    };

    let find = |objects: &[SchemaObject]| objects.iter().find(|o| &o.key() == key).cloned();
    let pair = match result.classify(key) {
        Some(ChangeKind::Modified) => result.find_modified(key).cloned(),
        Some(ChangeKind::Added) => find(&result.added).map(|current| ModifiedObject {
            saved: SchemaObject {
                definition: String::new(),
                ..current.clone()
            },
            current,
        }),
        Some(ChangeKind::Deleted) => find(&result.deleted).map(|saved| ModifiedObject {
            current: SchemaObject {
                definition: String::new(),
                ..saved.clone()
            },
            saved,
        }),
        Some(ChangeKind::Unchanged) => None,
        None => bail!("No object {key} in the database or the snapshot"),
    };
    Ok(pair.into_iter().collect())
}

pub async fn run_ddl(session: &ReconcileSession, table: &str) -> Result<()> {
    let (schema, name) = split_table_name(table);
    match session.table_ddl(schema, name).await? {
        Some(ddl) => {
            println!("{ddl}");
            Ok(())
        }
        None => bail!("No column metadata for table {schema}.{name}"),
    }
}

/// Split `schema.table`; a name without a dot is in the default schema
pub fn split_table_name(arg: &str) -> (&str, &str) {
    match arg.split_once('.') {
        Some((schema, table)) if !schema.is_empty() => (schema, table),
        Some((_, table)) => (DEFAULT_SCHEMA, table),
        None => (DEFAULT_SCHEMA, arg),
    }
}

pub async fn run_push(
    repo: &VcsRepository,
    remote: Option<&str>,
    branch: Option<&str>,
) -> Result<()> {
    let output = repo.push(remote, branch).await?;
    print!("{output}");
    Ok(())
}

pub async fn run_pull(
    repo: &VcsRepository,
    remote: Option<&str>,
    branch: Option<&str>,
) -> Result<()> {
    let output = repo.pull(remote, branch).await?;
    print!("{output}");
    Ok(())
}
