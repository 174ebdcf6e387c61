//! Binary entrypoint that launches the meeting scribe.

use std::process::ExitCode;

use meeting_scribe::start_meeting_scribe;

/// Load configuration, start the runtime and serve until shutdown.
fn main() -> ExitCode {
    start_meeting_scribe::run()
}
