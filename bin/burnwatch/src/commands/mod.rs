//! Contains subcommands for the burnwatch binary.

mod run;
pub(crate) use run::RunCommand;

mod reset;
pub(crate) use reset::ResetCommand;
