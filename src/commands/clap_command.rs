use clap::ArgMatches;

use crate::commands::{ForestVizCommand, Settings};

#[cfg(test)]
mod tests {
    use clap::ArgMatches;

    use crate::commands::test_support::{settings, with_data_dir};
    use crate::commands::{ClapCommand, ForestVizCommand, Settings};

    struct DummyCommand {
        succeeds: bool,
    }

    impl ForestVizCommand for DummyCommand {
        fn get_description(&self) -> &'static str {
            "dummy"
        }

        fn args(&self, command: clap::Command<'static>) -> clap::Command<'static> {
            command.arg(clap::arg!(<NAME> "A name"))
        }

        fn exec(&self, _: &Settings, args: &ArgMatches) -> anyhow::Result<()> {
            if self.succeeds && args.value_of("NAME") == Some("ok") {
                Ok(())
            } else {
                anyhow::bail!("dummy failed")
            }
        }
    }

    #[test]
    fn clap_command_new_builds_correctly() {
        let cmd = ClapCommand::new("foo", Box::new(DummyCommand { succeeds: true }));
        assert_eq!(cmd.identifier, "foo".to_string());
        assert_eq!(cmd.exec.get_description(), "dummy");
        assert_eq!(Some("dummy"), cmd.register().get_about());
    }

    #[test]
    fn clap_command_passes_its_arguments_on() {
        with_data_dir(|data_dir| {
            let ok = ClapCommand::new("foo", Box::new(DummyCommand { succeeds: true }));
            let matches = ok.register().get_matches_from(vec!["foo", "ok"]);
            assert!(ok.run(&settings(&data_dir), &matches).is_ok());

            let failing = ClapCommand::new("foo", Box::new(DummyCommand { succeeds: false }));
            let matches = failing.register().get_matches_from(vec!["foo", "ok"]);
            assert!(failing.run(&settings(&data_dir), &matches).is_err());
        })
        .unwrap();
    }
}

/// A named subcommand and the implementation behind it.
pub struct ClapCommand {
    pub identifier: String,
    pub exec: Box<dyn ForestVizCommand>,
}

impl ClapCommand {
    pub fn new(identifier: &str, exec: Box<dyn ForestVizCommand>) -> Self {
        ClapCommand { identifier: identifier.to_string(), exec }
    }

    pub fn register(&self) -> clap::Command<'static> {
        let command = clap::Command::new(self.identifier.clone()).about(self.exec.get_description());

        self.exec.args(command)
    }

    pub fn run(&self, settings: &Settings, args: &ArgMatches) -> anyhow::Result<()> {
        self.exec.exec(settings, args)
    }
}
