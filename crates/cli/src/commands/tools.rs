//! `taskpilot tools`: list the assistant's tools.

use super::build_runtime;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = build_runtime()?;

    println!();
    let mut tools = runtime.agent.list_tools();
    tools.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, description) in tools {
        println!("  {name:24} {description}");
    }
    println!();
    Ok(())
}
