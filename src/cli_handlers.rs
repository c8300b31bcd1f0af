use crate::config::ServiceConfig;
use crate::core::TaskStore;
use crate::error::TaskError;
use crate::models::Task;
use crate::resolver::ResolvedTarget;

/// Handle the add command
pub async fn handle_add(
    store: &TaskStore,
    config: &ServiceConfig,
    title: &str,
) -> Result<(), TaskError> {
    let task = store.create(title, &config.instance.name).await?;
    println!("Created task {}: {}", task.id, task.title);
    Ok(())
}

/// Handle the list command
pub async fn handle_list(store: &TaskStore, json: bool) -> Result<(), TaskError> {
    let tasks = store.list().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    for task in &tasks {
        println!(
            "{} {}  {}  ({})",
            task.icon(),
            task.id,
            task.title,
            task.created_by_instance
        );
    }

    Ok(())
}

/// Handle the show command
pub async fn handle_show(store: &TaskStore, id: &str) -> Result<(), TaskError> {
    let task = store.get(id).await?;
    print_task(&task);
    Ok(())
}

/// Handle the toggle command
pub async fn handle_toggle(
    store: &TaskStore,
    config: &ServiceConfig,
    id: &str,
) -> Result<(), TaskError> {
    let task = store.toggle_complete(id, &config.instance.name).await?;
    println!("Task {} marked as {}", task.id, task.status());
    Ok(())
}

/// Handle the delete command
pub async fn handle_delete(store: &TaskStore, id: &str) -> Result<(), TaskError> {
    store.delete(id).await?;
    println!("Deleted task {id}");
    Ok(())
}

/// Handle the clear command
pub async fn handle_clear(store: &TaskStore) -> Result<(), TaskError> {
    let removed = store.delete_all().await?;
    println!("Deleted {removed} task(s)");
    Ok(())
}

/// Handle the clear-completed command
pub async fn handle_clear_completed(store: &TaskStore) -> Result<(), TaskError> {
    let removed = store.delete_completed().await?;
    println!("Deleted {removed} completed task(s)");
    Ok(())
}

/// Handle the stats command
pub async fn handle_stats(store: &TaskStore) -> Result<(), TaskError> {
    let summary = store.summary().await?;
    println!("Total:      {}", summary.total);
    println!("Completed:  {}", summary.completed);
    println!("Pending:    {}", summary.pending);
    Ok(())
}

/// Handle the ready command. Returns whether the database answered.
pub async fn handle_ready(store: &TaskStore, config: &ServiceConfig) -> Result<bool, TaskError> {
    let report = store.readiness(&config.instance).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report.is_ready())
}

/// Handle the resolve command
pub fn handle_resolve(target: &ResolvedTarget) {
    println!("Method:      {}", target.method);
    println!("Connection:  {}", target.redacted());
    println!("Database:    {}", target.database_name);
}

fn print_task(task: &Task) {
    println!("[{}] {}", task.id, task.title);
    println!("Status:       {}", task.status());
    println!(
        "Created:      {} by {}",
        task.created_at.format("%Y-%m-%d %H:%M:%S"),
        task.created_by_instance
    );
    if let (Some(at), Some(by)) = (task.updated_at, task.updated_by_instance.as_deref()) {
        println!("Updated:      {} by {}", at.format("%Y-%m-%d %H:%M:%S"), by);
    }
}
