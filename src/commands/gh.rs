//! `ralph gh` - GitHub issue integration.
//!
//! `check` probes the pieces the workflow needs, `import` pulls one issue
//! into the backlog as a story, `sync` marks stories passing when their
//! linked issue closed.

use std::collections::HashSet;

use which::which;

use crate::config::ConfigManager;
use crate::context::ProjectContext;
use crate::git;
use crate::github;
use crate::prd::PrdStore;

/// Report whether the GitHub workflow is usable: gh CLI, an API token,
/// and a parseable origin remote. Exits 1 when a required piece is
/// missing.
pub async fn check(context: &ProjectContext) -> Result<i32, String> {
    let mut ok = true;

    match which("gh") {
        Ok(path) => println!("  ok  gh CLI at {}", path.display()),
        // gh absence alone is not fatal; a token can come from elsewhere
        Err(_) => println!("  --  gh CLI not on PATH (optional, one of the token sources)"),
    }

    match github::discover_token().await {
        Ok((_, source)) => println!("  ok  token from {}", source),
        Err(e) => {
            ok = false;
            println!("  !!  no token: {}", e);
        }
    }

    match git::origin_slug(context.root()) {
        Some(slug) => println!("  ok  origin remote {}", slug),
        None => {
            ok = false;
            println!("  !!  origin remote missing or not a github.com URL");
        }
    }

    Ok(if ok { 0 } else { 1 })
}

/// Import one issue as a story appended to the backlog.
pub async fn import(context: &ProjectContext, number: u32) -> Result<i32, String> {
    let config = ConfigManager::new(context).read()?;
    let client = github::client_for(context).await?;
    let issue = client.get_issue(number).await?;

    let store = PrdStore::new(context);
    let mut imported_id = String::new();
    store.update(|prd| {
        imported_id = github::import::import_issue(prd, &issue, &config.ticket_prefix)?;
        Ok(())
    })?;

    println!(
        "Imported #{} \"{}\" as {}.",
        issue.number, issue.title, imported_id
    );
    Ok(0)
}

/// Mark stories whose linked issue closed as passing.
pub async fn sync(context: &ProjectContext) -> Result<i32, String> {
    let client = github::client_for(context).await?;
    let closed: HashSet<u32> = client
        .list_issues("closed")
        .await?
        .iter()
        .map(|issue| issue.number)
        .collect();

    let store = PrdStore::new(context);
    let mut updated: Vec<String> = Vec::new();
    store.update(|prd| {
        updated = github::import::sync_closed_issues(prd, &closed);
        Ok(())
    })?;

    if updated.is_empty() {
        println!("Backlog already in sync with {}.", client.slug());
    } else {
        for id in &updated {
            println!("  {} marked passing (issue closed)", id);
        }
        println!(
            "{} stor{} updated.",
            updated.len(),
            if updated.len() == 1 { "y" } else { "ies" }
        );
    }
    Ok(0)
}
