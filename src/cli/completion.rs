use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;

/// Print a completion script for `leanrag-db` to stdout
#[derive(Parser, Debug, Clone)]
pub struct Completion {
    /// Target shell
    #[arg(value_enum, long)]
    pub shell: Shell,
}

impl Completion {
    pub fn run(&self) -> anyhow::Result<()> {
        self.write_to(&mut io::stdout());
        Ok(())
    }

    fn write_to(&self, out: &mut dyn io::Write) {
        let mut cmd = crate::cli::Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(self.shell, &mut cmd, bin_name, out);
    }
}
