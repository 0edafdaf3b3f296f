//! Interactive console front end.
//!
//! Everything here reads from a [`BufRead`] and writes to a [`Write`], so the
//! whole question/answer loop can run against in-memory buffers.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use colored::{ColoredString, Colorize};

use crate::knowledge_base::{self, DEFAULT_KNOWLEDGE_BASE_PATH};
use crate::messages::MessageCompletion;
use crate::session::{AskOutcome, Session, SessionConfigBuilder};
use crate::{Error, Result};

pub const KNOWLEDGE_BASE_PROMPT: &str =
    "Enter the path to the knowledge base file (or press Enter for default): ";
pub const QUESTION_PROMPT: &str = "Enter your question: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Banner,
    Notice,
    Prompt,
    Error,
}

/// Styles `text` for the terminal.
pub fn paint(text: &str, tone: Tone) -> ColoredString {
    match tone {
        Tone::Success => text.green(),
        Tone::Banner => text.cyan(),
        Tone::Notice => text.yellow(),
        Tone::Prompt => text.magenta(),
        Tone::Error => text.red(),
    }
}

/// What a line typed at the question prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Exit,
    Clear,
    Question(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() || line.eq_ignore_ascii_case("exit") {
            Input::Exit
        } else if line.eq_ignore_ascii_case("clear") {
            Input::Clear
        } else {
            Input::Question(line.to_string())
        }
    }
}

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Shows `prompt` and reads one line. Returns `None` at end of input.
    pub fn prompt(&mut self, prompt: &str, tone: Tone) -> Result<Option<String>> {
        write!(self.output, "{}", paint(prompt, tone))?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn line(&mut self, text: &str, tone: Tone) -> Result<()> {
        writeln!(self.output, "{}", paint(text, tone))?;
        Ok(())
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Loads the knowledge base and runs the question loop until the user
    /// leaves.
    ///
    /// `path` skips the knowledge base prompt when set. A knowledge base that
    /// cannot be read is reported and returned before any question is asked.
    pub async fn run(
        &mut self,
        client: Box<dyn MessageCompletion>,
        mut config: SessionConfigBuilder,
        path: Option<PathBuf>,
    ) -> Result<()> {
        let path = match path {
            Some(path) => path,
            None => match self.prompt(KNOWLEDGE_BASE_PROMPT, Tone::Prompt)? {
                Some(path) if !path.is_empty() => PathBuf::from(path),
                _ => PathBuf::from(DEFAULT_KNOWLEDGE_BASE_PATH),
            },
        };

        let text = match knowledge_base::load(&path).await {
            Ok(text) => text,
            Err(error) => {
                self.line(&format!("Error reading knowledge base: {error}"), Tone::Error)?;
                return Err(error);
            }
        };
        self.line("Knowledge base loaded successfully.", Tone::Success)?;

        let config = config
            .system_prompt(knowledge_base::system_prompt(&text))
            .build()?;
        let mut session = Session::new(client, config);

        self.line("Welcome to the Knowledge Base QA System!", Tone::Banner)?;
        self.line(
            "Type 'exit' to quit the program or 'clear' to clear the conversation history.",
            Tone::Notice,
        )?;

        loop {
            writeln!(self.output)?;
            let Some(line) = self.prompt(QUESTION_PROMPT, Tone::Prompt)? else {
                break;
            };

            match Input::parse(&line) {
                Input::Exit => break,
                Input::Clear => {
                    session.clear_history();
                    self.line("Conversation history cleared.", Tone::Notice)?;
                }
                Input::Question(question) => {
                    self.answer(&mut session, question).await?;
                }
            }
        }

        self.line(
            "Thank you for using the Knowledge Base QA System. Goodbye!",
            Tone::Banner,
        )?;
        Ok(())
    }

    async fn answer(&mut self, session: &mut Session, question: String) -> Result<()> {
        writeln!(self.output)?;
        self.line("Answer:", Tone::Success)?;

        let outcome = session.ask(question, &mut self.output).await;
        writeln!(self.output)?;

        if let AskOutcome::Interrupted { error, .. } = outcome {
            let message = match error {
                Error::Api(api_error) => format!("Error: {}", api_error.message),
                other => format!("An error occurred: {other}"),
            };
            self.line(&message, Tone::Error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;
    use crate::messages::{ApiError, Fragment, Turn};
    use crate::session::test::{FakeClient, Script};

    async fn run_console(
        client: FakeClient,
        input: &str,
        knowledge_base: Option<PathBuf>,
    ) -> (Result<()>, String) {
        let mut console = Console::new(Cursor::new(input.to_string()), Vec::new());
        let result = console
            .run(Box::new(client), SessionConfigBuilder::default(), knowledge_base)
            .await;
        let (_, output) = console.into_inner();
        (result, String::from_utf8(output).unwrap())
    }

    fn write_knowledge_base(name: &str, text: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("kbchat-{name}-{}.txt", std::process::id()));
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(Input::parse(""), Input::Exit);
        assert_eq!(Input::parse("   \n"), Input::Exit);
        assert_eq!(Input::parse("EXIT"), Input::Exit);
        assert_eq!(Input::parse("Clear"), Input::Clear);
        assert_eq!(
            Input::parse("  what is clear? \n"),
            Input::Question("what is clear?".to_string())
        );
    }

    #[test]
    fn test_paint_keeps_text() {
        for tone in [Tone::Success, Tone::Banner, Tone::Notice, Tone::Prompt, Tone::Error] {
            assert!(paint("Answer:", tone).to_string().contains("Answer:"));
        }
    }

    #[tokio::test]
    async fn test_unreadable_knowledge_base_stops_before_questions() {
        let client = FakeClient::default();
        let (result, output) = run_console(
            client.clone(),
            "/definitely/not/here/kb.txt\nWhat?\n",
            None,
        )
        .await;

        assert!(matches!(result, Err(Error::KnowledgeBase { .. })));
        assert!(output.contains(KNOWLEDGE_BASE_PROMPT));
        assert!(output.contains("Error reading knowledge base:"));
        assert!(!output.contains(QUESTION_PROMPT));
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn test_question_is_answered_with_streamed_text() {
        let path = write_knowledge_base("answer", "Greetings are polite.");
        let client = FakeClient::default().answer(&["Hello", " world"]);

        let (result, output) = run_console(client.clone(), "Say hello\nexit\n", Some(path.clone())).await;

        assert!(result.is_ok());
        assert!(!output.contains(KNOWLEDGE_BASE_PROMPT));
        assert!(output.contains("Knowledge base loaded successfully."));
        assert!(output.contains("Answer:"));
        assert!(output.contains("Hello world"));
        assert!(output.contains("Goodbye!"));

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0]
            .system
            .as_deref()
            .unwrap()
            .contains("Greetings are polite."));

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_error_fragment_is_shown_after_partial_text() {
        let path = write_knowledge_base("error", "facts");
        let client = FakeClient::default().script(Script::Fragments(vec![
            Ok(Fragment::Text("Hello".to_string())),
            Ok(Fragment::Error(ApiError::new("overloaded_error", "Overloaded"))),
        ]));

        let (_, output) = run_console(client, "Say hello\n", Some(path.clone())).await;

        let text_at = output.find("Hello").unwrap();
        let error_at = output.find("Error: Overloaded").unwrap();
        assert!(text_at < error_at);

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_transport_fault_is_reported_and_loop_continues() {
        let path = write_knowledge_base("fault", "facts");
        let client = FakeClient::default()
            .script(Script::Refuse(Error::StreamError("connection reset".to_string())))
            .answer(&["Recovered"]);

        let (result, output) = run_console(client, "first\nsecond\n", Some(path.clone())).await;

        assert!(result.is_ok());
        assert!(output.contains("An error occurred: Event stream error: connection reset"));
        assert!(output.contains("Recovered"));

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_clear_command_empties_history() {
        let path = write_knowledge_base("clear", "facts");
        let client = FakeClient::default().answer(&["a0"]).answer(&["a1"]);

        let (_, output) = run_console(client.clone(), "q0\nCLEAR\nq1\nexit\n", Some(path.clone())).await;

        assert!(output.contains("Conversation history cleared."));
        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages, vec![Turn::user("q1")]);

        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_blank_path_uses_default_knowledge_base() {
        let client = FakeClient::default();
        let (result, output) = run_console(client, "\n", None).await;

        // the default file is not expected next to the test binary
        if let Err(Error::KnowledgeBase { path, .. }) = result {
            assert_eq!(path, PathBuf::from(DEFAULT_KNOWLEDGE_BASE_PATH));
            assert!(!output.contains(QUESTION_PROMPT));
        }
    }
}
