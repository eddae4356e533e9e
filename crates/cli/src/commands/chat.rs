//! `taskpilot chat`: interactive shell or single-message mode.

use super::{build_runtime, Runtime};
use std::io::Write;
use taskpilot_channels::CliChannel;

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = build_runtime()?;

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let response = runtime.agent.chat(&msg, None).await;
        eprint!("\r              \r");
        println!("{response}");
        return Ok(());
    }

    interactive(runtime).await
}

async fn interactive(runtime: Runtime) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("  taskpilot - project assistant");
    println!();
    println!("  Model:  {}", runtime.config.model.name);
    println!("  Portal: {}", runtime.config.projects.portal_id);
    println!("  Tools:  {} registered", runtime.agent.list_tools().len());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Commands: /help /tools /history /clear /status ('exit' to quit).");
    println!();

    let channel = CliChannel::new();
    let mut rx = channel.start();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = rx.recv().await {
        if let Some(command) = line.strip_prefix('/') {
            handle_command(&runtime, command).await;
        } else {
            eprint!("  ...");
            let response = runtime.agent.chat(&line, None).await;
            eprint!("\r     \r");
            println!();
            for out_line in response.lines() {
                println!("  Assistant > {out_line}");
            }
            println!();
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    Ok(())
}

async fn handle_command(runtime: &Runtime, command: &str) {
    match command.trim() {
        "help" => {
            println!();
            println!("  /help     Show this help");
            println!("  /tools    List the assistant's tools");
            println!("  /history  Show the remembered conversation");
            println!("  /clear    Forget the conversation so far");
            println!("  /status   Check connectivity to the projects API");
            println!("  exit      Leave the shell");
            println!();
        }
        "tools" => {
            println!();
            for (name, description) in runtime.agent.list_tools() {
                println!("  {name:24} {description}");
            }
            println!();
        }
        "history" => {
            let history = runtime.agent.history().await;
            println!();
            if history.is_empty() {
                println!("  (no conversation yet)");
            }
            for message in history {
                let who = match message.role {
                    taskpilot_core::message::Role::User => "You",
                    taskpilot_core::message::Role::Assistant => "Assistant",
                    _ => "System",
                };
                println!("  {who} > {}", message.content);
            }
            println!();
        }
        "clear" => {
            runtime.agent.clear().await;
            println!("  Conversation cleared.");
        }
        "status" => match runtime.client.get_all_projects("active").await {
            Ok(projects) => {
                println!(
                    "  Connected. {} active projects in portal {}.",
                    projects.len(),
                    runtime.config.projects.portal_id
                );
            }
            Err(e) => println!("  Connection failed: {e}"),
        },
        other => println!("  Unknown command '/{other}'. Try /help."),
    }
}
