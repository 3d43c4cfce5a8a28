//! Interactive console
//!
//! Reads one line at a time, answers it, and asks the operator for an answer
//! when nothing knows one. Lines starting with `/` are commands.

use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::attachments::Attachment;
use crate::bot::ChatBot;
use crate::resolver::{AnswerSource, Resolution};
use crate::session::Session;
use crate::Result;

const HELP: &str = "Commands: /new, /persona <name>, /personas, /attach <path>, /retry. Type 'exit' to quit.";

/// Last input the console resolved
struct LastInput {
    text: String,
    /// The answer came from the remote model and sits in history
    remote: bool,
}

/// Line-oriented chat loop over any async reader and writer
pub struct Console<R, W> {
    lines: Lines<R>,
    writer: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a console over `reader` and `writer`
    #[must_use]
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: reader.lines(),
            writer,
        }
    }

    /// Run until `exit`, `quit`, or end of input
    ///
    /// # Errors
    ///
    /// Returns error if reading input or writing output fails
    pub async fn run(&mut self, bot: &mut ChatBot) -> Result<()> {
        let mut session = bot.new_session();
        let mut staged: Option<Attachment> = None;
        let mut last: Option<LastInput> = None;

        self.say(&format!(
            "Hi! I'm your {}. {HELP}",
            session.persona().name
        ))
        .await?;

        loop {
            self.write("You: ").await?;
            let Some(line) = self.lines.next_line().await? else {
                break;
            };
            let input = line.trim();

            if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
                self.say("Goodbye!").await?;
                break;
            }

            if let Some(command) = input.strip_prefix('/') {
                self.command(bot, &mut session, &mut staged, &mut last, command)
                    .await?;
                continue;
            }

            let attachment = staged.take();
            if !self
                .turn(bot, &mut session, &mut last, input.to_string(), attachment)
                .await?
            {
                break;
            }
        }

        tracing::debug!("console closed");
        Ok(())
    }

    /// Resolve one input and answer it, remembering it for `/retry`
    async fn turn(
        &mut self,
        bot: &mut ChatBot,
        session: &mut Session,
        last: &mut Option<LastInput>,
        input: String,
        attachment: Option<Attachment>,
    ) -> Result<bool> {
        let resolution = bot.resolve(session, &input, attachment).await;
        let remote = matches!(
            resolution,
            Resolution::Answered {
                source: AnswerSource::Remote,
                ..
            }
        );
        let answered = self.answer(bot, &input, resolution).await?;
        *last = Some(LastInput {
            text: input,
            remote,
        });
        Ok(answered)
    }

    /// Print an answer, or run the teaching dialog for unknown input
    ///
    /// Returns `false` when input ended during the dialog.
    async fn answer(
        &mut self,
        bot: &mut ChatBot,
        input: &str,
        resolution: Resolution,
    ) -> Result<bool> {
        let Resolution::Answered { text, .. } = resolution else {
            return self.learn(bot, input).await;
        };
        self.say(&text).await?;
        Ok(true)
    }

    async fn learn(&mut self, bot: &mut ChatBot, input: &str) -> Result<bool> {
        self.say("I don't know how to answer that yet.").await?;
        self.write("Bot: How should I respond? (or type 'skip' to skip): ")
            .await?;

        let Some(line) = self.lines.next_line().await? else {
            return Ok(false);
        };
        let answer = line.trim();

        if answer.is_empty() || answer.eq_ignore_ascii_case("skip") {
            self.say("Okay, I'll skip learning that for now.").await?;
        } else {
            bot.teach(input, answer);
            self.say("Thanks! I've learned that now.").await?;
        }
        Ok(true)
    }

    async fn command(
        &mut self,
        bot: &mut ChatBot,
        session: &mut Session,
        staged: &mut Option<Attachment>,
        last: &mut Option<LastInput>,
        command: &str,
    ) -> Result<()> {
        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(n, a)| (n, a.trim()));

        match name.to_ascii_lowercase().as_str() {
            "new" => {
                session.clear();
                *staged = None;
                *last = None;
                self.say("Started a new conversation.").await
            }
            "persona" if arg.is_empty() => {
                let current = format!("Current persona: {}", session.persona().name);
                self.say(&current).await
            }
            "persona" => match session.set_persona(bot.personas(), arg) {
                Ok(()) => {
                    let msg = format!("Persona switched to {}.", session.persona().name);
                    self.say(&msg).await
                }
                Err(e) => {
                    let names: Vec<_> = bot.personas().names().collect();
                    self.say(&format!("{e}. Available: {}", names.join(", ")))
                        .await
                }
            },
            "personas" => {
                let listing: Vec<String> = bot
                    .personas()
                    .names()
                    .map(|n| {
                        if n == session.persona().name {
                            format!("* {n}")
                        } else {
                            format!("  {n}")
                        }
                    })
                    .collect();
                self.say(&format!("Personas:\n{}", listing.join("\n")))
                    .await
            }
            "attach" if arg.is_empty() => self.say("Usage: /attach <path>").await,
            "attach" => match Attachment::from_path(Path::new(arg)) {
                Ok(attachment) => {
                    let msg = format!(
                        "Attached {}. It will be sent with your next message.",
                        attachment.name()
                    );
                    *staged = Some(attachment);
                    self.say(&msg).await
                }
                Err(e) => self.say(&e.to_string()).await,
            },
            "retry" => {
                let Some(previous) = last.take() else {
                    return self.say("Nothing to retry yet.").await;
                };
                // Only remote answers were recorded in history
                if previous.remote {
                    session.pop_exchange();
                }
                tracing::debug!(input = %previous.text, "retrying last input");
                self.turn(bot, session, last, previous.text, None).await?;
                Ok(())
            }
            _ => self.say(HELP).await,
        }
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        self.write(&format!("Bot: {text}\n")).await
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
