use std::io::Write;
use std::path::Path;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use chefagent::agent_output_sanitize::Sanitizer;
use chefagent::chat::{render_history, ChatCommand, EXAMPLE_PROMPTS};
use chefagent::recipes;
use chefagent::runtime_config::ChefConfig;
use chefagent::runtime_wiring::build_chat;

use crate::cli_args::{AskArgs, ChatArgs, RecipesArgs, SanitizeArgs};

pub(crate) async fn handle_chat_command(args: &ChatArgs, mut cfg: ChefConfig) -> anyhow::Result<()> {
    args.provider.apply(&mut cfg);
    cfg.validate()?;
    let mut chat = build_chat(&cfg)?;
    chat.set_debug(args.debug);

    println!("🧑‍🍳 Chef Agente IA 🥑");
    println!("Chatea conmigo para descubrir qué recetas puedes preparar con tus compras del supermercado.");
    println!("Ejemplos:");
    for example in EXAMPLE_PROMPTS {
        println!("  - {example}");
    }
    println!("Comandos: /debug [on|off], /reset, /history, /exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("failed to flush stdout")?;
        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        match ChatCommand::parse(&line) {
            ChatCommand::Empty => continue,
            ChatCommand::Exit => break,
            ChatCommand::Reset => {
                chat.reset();
                println!("[conversación reiniciada]");
            }
            ChatCommand::History => println!("{}", render_history(chat.history())),
            ChatCommand::Debug(toggle) => {
                let on = toggle.unwrap_or(!chat.debug());
                chat.set_debug(on);
                println!("[modo debug {}]", if on { "activado" } else { "desactivado" });
            }
            ChatCommand::Message(message) => {
                let reply = chat.respond(&message).await;
                println!("{reply}\n");
            }
        }
    }
    Ok(())
}

pub(crate) async fn handle_ask_command(args: &AskArgs, mut cfg: ChefConfig) -> anyhow::Result<()> {
    args.provider.apply(&mut cfg);
    cfg.validate()?;
    let mut chat = build_chat(&cfg)?;
    chat.set_debug(args.debug);
    println!("{}", chat.respond(&args.message).await);
    Ok(())
}

pub(crate) async fn handle_sanitize_command(
    args: &SanitizeArgs,
    cfg: &ChefConfig,
) -> anyhow::Result<()> {
    let raw = match &args.input {
        Some(path) => read_transcript(path)?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read transcript from stdin")?;
            buf
        }
    };
    let sanitizer = Sanitizer::new(cfg.sanitize.clone());
    println!("{}", sanitizer.sanitize(Some(&raw)));
    Ok(())
}

fn read_transcript(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read transcript: {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub(crate) fn handle_recipes_command(args: &RecipesArgs) -> anyhow::Result<()> {
    let ingredients = if args.ingredients.is_empty() {
        recipes::last_order()
    } else {
        args.ingredients.clone()
    };
    match &args.cuisine {
        Some(cuisine) => println!("{}", recipes::find_recipes(cuisine, &ingredients)),
        None => {
            for cuisine in recipes::cuisines() {
                println!("## {cuisine}\n");
                println!("{}", recipes::find_recipes(cuisine, &ingredients));
            }
        }
    }
    Ok(())
}

pub(crate) fn handle_version_command() {
    println!(
        "chefagent {} (git {}, target {}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("CHEFAGENT_GIT_SHA"),
        env!("CHEFAGENT_TARGET"),
        env!("CHEFAGENT_BUILD_TIME_UTC"),
    );
}
