//! End-to-end REPL flow with scripted collaborators and a real shell.
//!
//! Drives a full session through the public API: compose a task, review and
//! run the proposed command against `/bin/sh`, then verify the captured
//! results flow into the following turn.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Write;
use std::rc::Rc;

use anyhow::Result;

use think::agent::{Agent, Turn};
use think::editor::{LineReader, ReadEvent};
use think::exec::OUTPUT_TAIL_CHARS;
use think::repl::{Mode, Repl, ReplOptions};

struct ScriptedReader {
    events: VecDeque<ReadEvent>,
    preloaded: Rc<RefCell<Vec<String>>>,
}

impl LineReader for ScriptedReader {
    fn read_line(&mut self) -> Result<ReadEvent> {
        Ok(self.events.pop_front().unwrap_or(ReadEvent::Eof))
    }

    fn set_prompt(&mut self, _prompt: &str) {}

    fn preload(&mut self, text: &str) -> Result<()> {
        self.preloaded.borrow_mut().push(text.to_string());
        Ok(())
    }
}

struct ScriptedAgent {
    replies: VecDeque<String>,
    turns: Rc<RefCell<Vec<Turn>>>,
}

impl Agent for ScriptedAgent {
    fn listen(&mut self, turn: &Turn) -> Result<()> {
        self.turns.borrow_mut().push(turn.clone());
        Ok(())
    }

    fn respond(&mut self, sink: &mut dyn Write) -> Result<String> {
        let reply = self.replies.pop_front().unwrap_or_default();
        sink.write_all(reply.as_bytes())?;
        Ok(reply)
    }
}

fn options() -> ReplOptions {
    ReplOptions {
        shell_path: "/bin/sh".to_string(),
        send_output: true,
        initial_input: String::new(),
        composing_prompt: "think> ".to_string(),
        reviewing_prompt: "run> ".to_string(),
    }
}

#[test]
fn full_session_cycle() {
    let preloaded = Rc::new(RefCell::new(Vec::new()));
    let turns = Rc::new(RefCell::new(Vec::new()));

    let reader = ScriptedReader {
        events: VecDeque::from(vec![
            // Compose: ask for a greeting; the reply proposes a command.
            ReadEvent::Line("print a greeting".to_string()),
            // Review: run an edited version of the proposal.
            ReadEvent::Line("echo hi && echo err 1>&2".to_string()),
            // Compose again: the previous run's results ride along.
            ReadEvent::Line("thanks".to_string()),
            // Interrupt cancels the second proposal.
            ReadEvent::Interrupted,
            // End of input in composing mode terminates.
            ReadEvent::Eof,
        ]),
        preloaded: Rc::clone(&preloaded),
    };
    let agent = ScriptedAgent {
        replies: VecDeque::from(vec![
            "Prints a greeting.\n\necho hello\n\n".to_string(),
            "Nothing more to do.\n\ntrue\n".to_string(),
        ]),
        turns: Rc::clone(&turns),
    };

    let mut repl = Repl::new(reader, agent, options());
    repl.run().expect("session should terminate cleanly");

    assert_eq!(repl.mode(), Mode::Composing);
    assert_eq!(
        *preloaded.borrow(),
        vec!["echo hello".to_string(), "true".to_string()]
    );

    let turns = turns.borrow();
    assert_eq!(turns.len(), 2);

    let first = &turns[0];
    assert_eq!(first.message, "print a greeting");
    assert!(!first.command_was_run);
    assert!(first.actual_command.is_empty());
    assert_eq!(first.exit_code, 0);

    let second = &turns[1];
    assert_eq!(second.message, "thanks");
    assert!(second.command_was_run);
    assert_eq!(second.actual_command, "/bin/sh -c echo hi && echo err 1>&2");
    assert_eq!(second.stdout, "hi\n");
    assert_eq!(second.stderr, "err\n");
    assert_eq!(second.exit_code, 0);
    assert!(second.send_output);

    let record = repl.last_run();
    assert!(record.ran);
    assert!(record.stdout_tail.chars().count() <= OUTPUT_TAIL_CHARS);
}

#[test]
fn failed_command_is_reported_not_fatal() {
    let preloaded = Rc::new(RefCell::new(Vec::new()));
    let turns = Rc::new(RefCell::new(Vec::new()));

    let reader = ScriptedReader {
        events: VecDeque::from(vec![
            ReadEvent::Line("remove a file that is not there".to_string()),
            ReadEvent::Line("false".to_string()),
            ReadEvent::Line("it failed".to_string()),
            ReadEvent::Interrupted,
            ReadEvent::Eof,
        ]),
        preloaded: Rc::clone(&preloaded),
    };
    let agent = ScriptedAgent {
        replies: VecDeque::from(vec!["false\n".to_string(), "true\n".to_string()]),
        turns: Rc::clone(&turns),
    };

    let mut repl = Repl::new(reader, agent, options());
    repl.run().expect("non-zero exits are not errors");

    let turns = turns.borrow();
    assert_eq!(turns[1].exit_code, 1);
    assert!(turns[1].command_was_run);
}
