//! System status dashboard command.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Display system status dashboard.
///
/// Shows account and usage counts, storage info, and version.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let reader = &state.db_pool.reader;

    let (user_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(reader)
        .await?;
    let (session_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_sessions")
        .fetch_one(reader)
        .await?;
    let (message_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
        .fetch_one(reader)
        .await?;
    let (file_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM uploaded_files")
        .fetch_one(reader)
        .await?;
    let (active_subs,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE status = 'active'")
            .fetch_one(reader)
            .await?;

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "users": user_count,
            "sessions": session_count,
            "messages": message_count,
            "documents": file_count,
            "active_subscriptions": active_subs,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Counsel v{}",
        style("⚖").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Accounts ──").dim());
    println!("  Users:         {}", style(user_count).bold());
    println!("  Subscriptions: {}", style(active_subs).green());
    println!();

    println!("  {}", style("── Usage ──").dim());
    println!("  Sessions:  {}", session_count);
    println!("  Messages:  {}", message_count);
    println!("  Documents: {}", file_count);
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!("  Database: {}", style("SQLite (WAL mode)").dim());
    println!();

    Ok(())
}
