//! POSIX launch: `primary || fallback` as a shell job in its own process group.

use std::os::unix::process::CommandExt;
use std::process::Command;

use crate::domain::{ForwardRequest, FALLBACK_SEPARATOR};

const SHELL: &str = "/bin/sh";

/// The job gets its own process group so terminal signals aimed at kfwd
/// never reach it.
pub fn detached_command(primary: &str, fallback: Option<&str>, request: &ForwardRequest) -> Command {
    let mut command = Command::new(SHELL);
    command
        .arg("-c")
        .arg(shell_script(primary, fallback, request))
        .process_group(0);
    command
}

pub fn background(_command: &mut Command) {}

pub fn shell_script(primary: &str, fallback: Option<&str>, request: &ForwardRequest) -> String {
    let args = request.forward_args();
    let primary_line = client_line(primary, &args);

    match fallback {
        Some(fallback) => format!("{}{}{}", primary_line, FALLBACK_SEPARATOR, client_line(fallback, &args)),
        None => primary_line,
    }
}

fn client_line(client: &str, args: &[String]) -> String {
    std::iter::once(client)
        .chain(args.iter().map(String::as_str))
        .map(shell_word)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote a word unless it is plain. Service references and port pairs are
/// always plain, so they appear in the job's command line exactly as the
/// client sees them.
fn shell_word(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'/' | b':'));

    if plain {
        word.to_string()
    } else {
        shell_words::quote(word).into_owned()
    }
}
