use clap::Args as ClapArgs;
use inquire::Text;
use miette::IntoDiagnostic as _;
use termimad::MadSkin;

use crate::config::RootConfig;
use crate::llm::LlmClient;
use crate::store::{ChatMessage, Store, StoredState};

#[derive(ClapArgs)]
pub struct Args {
    /// Send a single message and print the reply instead of starting a session
    #[arg(long, short)]
    pub message: Option<String>,

    /// Clear the stored chat transcript and exit
    #[arg(long)]
    pub clear: bool,
}

pub fn run(args: Args, config: &RootConfig) -> miette::Result<()> {
    let store = Store::open(crate::home::state_path()?);
    let mut state = store.load();

    if args.clear {
        state.chat_history.clear();
        store.save(&state)?;
        println!("Chat history cleared");
        return Ok(());
    }

    let client = LlmClient::new(config.api.clone());
    let skin = MadSkin::default();

    if let Some(message) = args.message {
        send_turn(&client, &store, &mut state, &skin, &message)?;
        return Ok(());
    }

    println!(
        "Chatting with {} model '{}'. Submit an empty line to leave.",
        config.api.mode, config.api.model
    );

    replay_transcript(&skin, &state);

    loop {
        let line = Text::new("you:").prompt_skippable().into_diagnostic()?;

        let Some(line) = line else { break };
        let message = line.trim();

        if message.is_empty() {
            break;
        }

        send_turn(&client, &store, &mut state, &skin, message)?;
    }

    Ok(())
}

/// One chat round-trip. Backend failures land in the transcript as an error
/// message rather than aborting the session.
fn send_turn(
    client: &LlmClient,
    store: &Store,
    state: &mut StoredState,
    skin: &MadSkin,
    message: &str,
) -> miette::Result<()> {
    state.chat_history.push(ChatMessage::user(message));
    store.save(state)?;

    let reply = super::block_on_runtime_aware(async {
        client.chat(message).await.into_diagnostic()
    });

    match reply {
        Ok(reply) => {
            skin.print_text(&reply);
            state.chat_history.push(ChatMessage::assistant(reply));
        }
        Err(error) => {
            let rendered = format!("message failed: {error}");
            eprintln!("{rendered}");
            state.chat_history.push(ChatMessage::error(rendered));
        }
    }

    store.save(state)?;

    Ok(())
}

fn replay_transcript(skin: &MadSkin, state: &StoredState) {
    for message in &state.chat_history {
        match message.role.as_str() {
            "assistant" => skin.print_text(&message.content),
            role => println!("{role}: {}", message.content),
        }
    }
}
