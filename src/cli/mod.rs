//! CLI commands for lectern.
//!
//! Commands follow one pattern: an `Options` struct, a serializable
//! `Output` struct with a `success` flag, `run(...)`, and
//! `format_output(...)` honoring `--json`/`--quiet`.

pub mod checkpoint;
pub mod classify;
pub mod clean;
pub mod init;
pub mod recover;
pub mod report_cmd;
pub mod run_cmd;
pub mod runs_cmd;
pub mod score;
pub mod validate;

pub use checkpoint::CheckpointCommand;
pub use classify::ClassifyCommand;
pub use clean::CleanCommand;
pub use init::InitCommand;
pub use recover::RecoverCommand;
pub use report_cmd::ReportCommand;
pub use run_cmd::RunCommand;
pub use runs_cmd::RunsCommand;
pub use score::ScoreCommand;
pub use validate::ValidateCommand;

use std::io::Read;
use std::path::Path;

use crate::error::{LecternError, Result};
use crate::util::read_to_string_limited;

/// Read command input from a file path, or stdin when the path is `-` or
/// absent.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p.as_os_str() != "-" => read_to_string_limited(p),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| LecternError::storage("<stdin>", e))?;
            Ok(buf)
        }
    }
}
