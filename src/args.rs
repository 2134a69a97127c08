// ------------------------------------------------------------------------
// Argument parsing
// ------------------------------------------------------------------------

use clap::{Arg, ArgAction, ArgMatches, Command};

const HELP_ABOUT: &str = r#"
touca -- submit test output generated by other applications

Captures the output of any test, one file or one stream at a time, and
records it as testcases of a suite so it can be compared against a
baseline."#;

const HELP_CHECK: &str = r#"
Submit the test output generated by other applications.

The output is read from standard input when it is piped. Otherwise `src`
must name a file or a directory. A file becomes a single testcase, named
after its path relative to the current working directory. Every regular
file directly inside a directory becomes its own testcase.

`--testcase` overrides the name of the single testcase. For a directory
it names the one testcase under which all files are submitted, each with
its own key."#;

const HELP_CHECK_EXAMPLES: &str = r#"Examples:

  # submit the output of a command as testcase `stdout`
  ./my-app | touca check --suite my-app

  # submit a single file as testcase `out_result_txt`
  touca check --suite my-app out/result.txt

  # submit every file of a directory, one testcase per file
  touca check --suite my-app --revision v2.0 out/
"#;

const HELP_CONFIG: &str = r#"
Manage persistent settings of touca.

Settings are stored as JSON in the platform specific configuration
directory, or in the file named by the TOUCA_CONFIG environment variable.
Known keys are `output-directory` and `revision`. Values given on the
command line of `touca check` take precedence."#;

pub fn touca_app(src_required: bool) -> Command {
    let touca = Command::new("touca")
        .version(clap::crate_version!())
        .about(HELP_ABOUT)
        .arg_required_else_help(true);

    let cmd_check = Command::new("check")
        .about("Submit the test output generated by other applications")
        .long_about(HELP_CHECK)
        .after_help(HELP_CHECK_EXAMPLES)
        .arg(
            Arg::new("suite")
                .help("name of the suite to associate with this output")
                .long("suite")
                .required(true),
        )
        .arg(
            Arg::new("testcase")
                .help("name of the testcase to associate with this output")
                .long("testcase")
                .required(false),
        )
        .arg(
            Arg::new("revision")
                .help("version of the code under test [default: local]")
                .long("revision")
                .required(false),
        )
        .arg(
            Arg::new("output-directory")
                .help("directory to store the recorded results in [default: ./results]")
                .long("output-directory")
                .required(false),
        )
        .arg(
            Arg::new("src")
                .help("path to file or directory to submit")
                .required(src_required),
        );

    let cmd_config = Command::new("config")
        .about("Manage persistent settings")
        .long_about(HELP_CONFIG)
        .arg_required_else_help(true)
        .subcommand(Command::new("list").about("List all settings").aliases(["ls"]))
        .subcommand(
            Command::new("get")
                .about("Print the value of a setting")
                .arg(Arg::new("key").help("name of the setting").required(true)),
        )
        .subcommand(
            Command::new("set")
                .about("Change the value of a setting")
                .arg(Arg::new("key").help("name of the setting").required(true))
                .arg(Arg::new("value").help("new value").required(true)),
        )
        .subcommand(
            Command::new("rm")
                .about("Remove a setting")
                .aliases(["unset"])
                .arg(Arg::new("key").help("name of the setting").required(true)),
        );

    touca
        .arg(
            Arg::new("quiet")
                .help("Suppress output (overrides `--verbose`)")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .help("Verbose output")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(cmd_check)
        .subcommand(cmd_config)
}

pub fn parse_args(stdin_is_tty: bool) -> ArgMatches {
    touca_app(stdin_is_tty).get_matches()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_is_consistent() {
        touca_app(true).debug_assert();
        touca_app(false).debug_assert();
    }

    #[test]
    fn src_is_required_on_a_terminal() {
        let res = touca_app(true).try_get_matches_from(["touca", "check", "--suite", "s"]);
        assert!(res.is_err());

        let args = touca_app(false)
            .try_get_matches_from(["touca", "-vv", "check", "--suite", "s"])
            .unwrap();
        assert_eq!(args.get_count("verbose"), 2);
        let (name, sub) = args.subcommand().unwrap();
        assert_eq!(name, "check");
        assert_eq!(sub.get_one::<String>("suite").unwrap(), "s");
        assert!(sub.get_one::<String>("src").is_none());
    }
}
