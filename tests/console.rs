//! Interactive console tests
//!
//! Feeds scripted input through `Console` and checks the transcript

use std::sync::Arc;

use smartbot::{ChatBot, Console};

mod common;
use common::{ScriptedClient, bot, knowledge};

async fn transcript(bot: &mut ChatBot, input: &str) -> String {
    let mut out = Vec::new();
    Console::new(input.as_bytes(), &mut out)
        .run(bot)
        .await
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn answers_learns_and_exits() {
    let client = Arc::new(ScriptedClient::new());
    let mut bot = bot(&client, &[], knowledge(&[("hello", &["Hi!"])]));

    let out = transcript(
        &mut bot,
        "hello\nwhat is the meaning of life\n42\nWhat is the meaning of life\nEXIT\nhello\n",
    )
    .await;

    assert!(out.contains("You: Bot: Hi!\n"));
    assert!(out.contains("Bot: I don't know how to answer that yet.\n"));
    assert!(out.contains("Bot: How should I respond? (or type 'skip' to skip): "));
    assert!(out.contains("Bot: Thanks! I've learned that now.\n"));
    assert!(out.contains("You: Bot: 42\n"));
    assert!(out.ends_with("Bot: Goodbye!\n"));
    assert_eq!(
        bot.knowledge().lookup("what is the meaning of life"),
        Some(&["42".to_string()][..])
    );
}

#[tokio::test]
async fn skip_does_not_learn() {
    let client = Arc::new(ScriptedClient::new());
    let mut bot = bot(&client, &[], knowledge(&[]));

    let out = transcript(&mut bot, "who are you\nSKIP\nquit\n").await;

    assert!(out.contains("Bot: Okay, I'll skip learning that for now.\n"));
    assert!(bot.knowledge().lookup("who are you").is_none());
}

#[tokio::test]
async fn end_of_input_stops_loop() {
    let client = Arc::new(ScriptedClient::new());
    let mut bot = bot(&client, &[], knowledge(&[]));

    let out = transcript(&mut bot, "something new\n").await;

    assert!(out.ends_with("Bot: How should I respond? (or type 'skip' to skip): "));
    assert!(bot.knowledge().is_empty());
}

#[tokio::test]
async fn persona_commands() {
    let client = Arc::new(ScriptedClient::new());
    let mut bot = bot(&client, &[], knowledge(&[]));

    let out = transcript(
        &mut bot,
        "/personas\n/persona joker\n/persona\n/persona Ninja\nexit\n",
    )
    .await;

    assert!(out.contains("* Helpful Assistant\n"));
    assert!(out.contains("  Military Soldier\n"));
    assert!(out.contains("Bot: Persona switched to Joker.\n"));
    assert!(out.contains("Bot: Current persona: Joker\n"));
    assert!(out.contains("persona not found: Ninja. Available: Helpful Assistant, Pirate"));
}

#[tokio::test]
async fn unknown_command_shows_help() {
    let client = Arc::new(ScriptedClient::new());
    let mut bot = bot(&client, &[], knowledge(&[]));

    let out = transcript(&mut bot, "/dance\nexit\n").await;

    assert!(out.contains("Bot: Commands: /new"));
}

#[tokio::test]
async fn retry_regenerates_without_old_exchange() {
    let client = Arc::new(ScriptedClient::new().replying("good", "Rust is a language."));
    let mut bot = bot(&client, &["good"], knowledge(&[]));

    let out = transcript(&mut bot, "what is rust\n/retry\n/new\n/retry\nexit\n").await;

    let requests = client.chat_requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].1.history.is_empty());
    assert_eq!(out.matches("Bot: Rust is a language.\n").count(), 2);
    assert!(out.contains("Bot: Started a new conversation.\n"));
    assert!(out.contains("Bot: Nothing to retry yet.\n"));
}

#[tokio::test]
async fn retry_repeats_last_local_answer() {
    let client = Arc::new(ScriptedClient::new().replying("good", "Rust is a language."));
    let mut bot = bot(&client, &["good"], knowledge(&[("hello", &["Hi!"])]));

    let out = transcript(&mut bot, "what is rust\nhello\n/retry\nexit\n").await;

    assert_eq!(out.matches("Bot: Hi!\n").count(), 2);
    assert_eq!(out.matches("Bot: Rust is a language.\n").count(), 1);
    assert_eq!(client.chat_requests().len(), 1);
}

#[tokio::test]
async fn retry_after_remote_replaces_exchange_in_history() {
    let client = Arc::new(ScriptedClient::new().replying("good", "Rust is a language."));
    let mut bot = bot(&client, &["good"], knowledge(&[]));

    transcript(&mut bot, "what is rust\n/retry\nand go?\nexit\n").await;

    let requests = client.chat_requests();
    assert_eq!(requests.len(), 3);
    // The regenerated exchange is the only one before the follow-up
    assert_eq!(requests[2].1.history.len(), 2);
    assert_eq!(requests[2].1.history[0].content, "what is rust");
}

#[tokio::test]
async fn attach_sends_table_with_next_message() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("sales.csv");
    std::fs::write(&csv, "region;total\nnorth;12\nsouth;30\n").unwrap();
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "hello").unwrap();

    let client = Arc::new(ScriptedClient::new().replying("good", "South sold more."));
    let mut bot = bot(&client, &["good"], knowledge(&[("hello", &["Hi!"])]));

    let input = format!(
        "/attach {}\n/attach {}\nhello\nhello\nexit\n",
        notes.display(),
        csv.display()
    );
    let out = transcript(&mut bot, &input).await;

    assert!(out.contains("unsupported file type: notes.txt"));
    assert!(out.contains("Bot: Attached sales.csv."));
    // The attachment goes with the first message only
    assert!(out.contains("You: Bot: South sold more.\n"));
    assert!(out.contains("You: Bot: Hi!\n"));

    let requests = client.chat_requests();
    assert_eq!(requests.len(), 1);
    let smartbot::llm::Part::Text(text) = &requests[0].1.parts[0] else {
        panic!("table should be rendered as text");
    };
    assert!(text.contains("[Attached table: sales.csv]"));
    assert!(text.contains("south"));
}
