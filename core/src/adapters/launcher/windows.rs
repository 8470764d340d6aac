//! Windows launch: the primary client directly, with no console window.

use std::os::windows::process::CommandExt;
use std::process::Command;

use crate::domain::ForwardRequest;

const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

// No shell here, so there is no fallback client.
pub fn detached_command(primary: &str, _fallback: Option<&str>, request: &ForwardRequest) -> Command {
    let mut command = Command::new(primary);
    command
        .args(request.forward_args())
        .creation_flags(CREATE_NO_WINDOW | CREATE_NEW_PROCESS_GROUP);
    command
}

pub fn background(command: &mut Command) {
    command.creation_flags(CREATE_NO_WINDOW);
}
