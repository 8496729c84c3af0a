//! Command templates for external programs.
//!
//! A template is a program followed by arguments. Arguments may contain `{name}`
//! placeholders that are substituted right before the program is launched. In JSON a template
//! is either a single whitespace-separated string or an array of strings.

use super::error::Error;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCommand")]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCommand {
    Line(String),
    Argv(Vec<String>),
}

impl TryFrom<RawCommand> for CommandSpec {
    type Error = String;

    fn try_from(raw: RawCommand) -> Result<Self, Self::Error> {
        let argv: Vec<String> = match raw {
            RawCommand::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            RawCommand::Argv(argv) => argv,
        };
        Self::from_argv(argv).ok_or_else(|| "command must name a program".to_string())
    }
}

impl CommandSpec {
    /// Splits a whitespace-separated command line.
    pub fn parse(tool: &'static str, line: &str) -> Result<Self, Error> {
        Self::from_argv(line.split_whitespace().map(str::to_string).collect())
            .ok_or_else(|| Error::invalid_command(tool, "command must name a program"))
    }

    fn from_argv(mut argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() || argv[0].trim().is_empty() {
            return None;
        }
        let program = argv.remove(0);
        Some(Self {
            program,
            args: argv,
        })
    }

    /// Arguments with every `{name}` placeholder replaced.
    pub fn render(&self, vars: &[(&str, String)]) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                vars.iter().fold(arg.clone(), |acc, (name, value)| {
                    acc.replace(&format!("{{{}}}", name), value)
                })
            })
            .collect()
    }

    /// Runs the command in `cwd` and waits for it to finish.
    pub fn run(&self, tool: &'static str, vars: &[(&str, String)], cwd: &Path) -> Result<(), Error> {
        let args = self.render(vars);
        log::debug!("running {}: {} {}", tool, self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(cwd)
            .output()
            .map_err(|source| Error::Launch {
                tool,
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            return Err(Error::Failed {
                tool,
                status: output.status.to_string(),
                stderr: tail.into_iter().rev().collect::<Vec<_>>().join("\n"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines_and_argv_from_json() {
        let line: CommandSpec = serde_json::from_str(r#""apbs {input}""#).unwrap();
        let argv: CommandSpec = serde_json::from_str(r#"["apbs", "{input}"]"#).unwrap();

        assert_eq!(line, argv);
        assert_eq!(line.program, "apbs");
        assert_eq!(line.args, vec!["{input}"]);
    }

    #[test]
    fn empty_commands_are_rejected() {
        assert!(serde_json::from_str::<CommandSpec>(r#""""#).is_err());
        assert!(serde_json::from_str::<CommandSpec>("[]").is_err());
        assert!(CommandSpec::parse("mesher", "   ").is_err());
    }

    #[test]
    fn render_substitutes_every_placeholder() {
        let spec = CommandSpec::parse("pdb2pqr", "pdb2pqr --ff={force_field} {input} {output}.pqr").unwrap();

        let args = spec.render(&[
            ("input", "a.pdb".to_string()),
            ("output", "a".to_string()),
            ("force_field", "AMBER".to_string()),
        ]);

        assert_eq!(args, vec!["--ff=AMBER", "a.pdb", "a.pqr"]);
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let spec = CommandSpec::parse("tool", "tool {other}").unwrap();
        assert_eq!(spec.render(&[("input", "x".to_string())]), vec!["{other}"]);
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let spec = CommandSpec::parse("tool", "surface-forge-no-such-program-3f9a").unwrap();
        let dir = tempfile::tempdir().unwrap();

        let err = spec.run("tool", &[], dir.path()).unwrap_err();
        assert!(matches!(err, Error::Launch { .. }));
    }
}
