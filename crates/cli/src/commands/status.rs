//! `taskpilot status`: connectivity probe against the projects API.

use super::build_runtime;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = build_runtime()?;

    println!();
    println!("  Model:  {}", runtime.config.model.name);
    println!("  Portal: {}", runtime.config.projects.portal_id);

    match runtime.client.get_all_projects("active").await {
        Ok(projects) => {
            println!("  Projects API: reachable ({} active projects)", projects.len());
            println!();
            Ok(())
        }
        Err(e) => {
            println!("  Projects API: unreachable");
            println!();
            Err(format!("Connectivity check failed: {e}").into())
        }
    }
}
