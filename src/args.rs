//! Command-line parsing for yin-yang.
//!
//! yin-yang has three actions (toggle now, run the scheduling daemon, list
//! themes) plus the usual help, version, debug and config directory flags.
//! Without any action it prints help.

/// What the command line asked for.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Flip the theme now and turn automatic modes off
    Toggle {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Run the scheduling daemon
    Schedule {
        debug_enabled: bool,
        config_dir: Option<String>,
        log_to_file: bool,
    },
    /// Print each plugin's installed themes
    Themes {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    ShowHelp,
    ShowVersion,
    /// Invalid arguments: print help and exit with failure
    ShowHelpDueToError,
}

/// Parsed command line.
pub struct ParsedArgs {
    pub action: CliAction,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Requested {
    Toggle,
    Schedule,
    Themes,
}

impl ParsedArgs {
    /// Parse an argument list.
    ///
    /// The first item is the program name and is skipped.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut log_to_file = false;
        let mut invalid = false;
        let mut config_dir: Option<String> = None;
        let mut requested: Vec<Requested> = Vec::new();

        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut iter = args_vec.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-h" | "--help" => display_help = true,
                "-V" | "-v" | "--version" => display_version = true,
                "-d" | "--debug" => debug_enabled = true,
                "--log" => log_to_file = true,
                "-t" | "--toggle" => requested.push(Requested::Toggle),
                "-s" | "--schedule" => requested.push(Requested::Schedule),
                "themes" => requested.push(Requested::Themes),
                "-c" | "--config" => match iter.next() {
                    Some(dir) if !dir.starts_with('-') => config_dir = Some(dir.clone()),
                    _ => invalid = true,
                },
                _ => invalid = true,
            }
        }

        let action = if display_help {
            CliAction::ShowHelp
        } else if display_version {
            CliAction::ShowVersion
        } else if invalid || requested.len() > 1 {
            CliAction::ShowHelpDueToError
        } else {
            match requested.first() {
                Some(Requested::Toggle) => CliAction::Toggle {
                    debug_enabled,
                    config_dir,
                },
                Some(Requested::Schedule) => CliAction::Schedule {
                    debug_enabled,
                    config_dir,
                    log_to_file,
                },
                Some(Requested::Themes) => CliAction::Themes {
                    debug_enabled,
                    config_dir,
                },
                None => CliAction::ShowHelp,
            }
        };

        ParsedArgs { action }
    }

    /// Parse the process arguments.
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Print the version header and the one-line description.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    log_decorated!(env!("CARGO_PKG_DESCRIPTION"));
    log_end!();
}

/// Print usage, actions and options.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("yin-yang [OPTIONS] [ACTION]");
    log_block_start!("Actions:");
    log_indented!("-t, --toggle           Switch between light and dark now");
    log_indented!("                       (turns schedule and follow-sun off)");
    log_indented!("-s, --schedule         Run the daemon for the configured mode");
    log_indented!("themes                 List installed themes per plugin");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("    --log              Also write daemon output to yin_yang.log");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_args() {
        let parsed = ParsedArgs::parse(vec!["yin-yang"]);
        assert_eq!(parsed.action, CliAction::ShowHelp);
    }

    #[test]
    fn test_parse_toggle() {
        for flag in ["-t", "--toggle"] {
            let parsed = ParsedArgs::parse(vec!["yin-yang", flag]);
            assert_eq!(
                parsed.action,
                CliAction::Toggle {
                    debug_enabled: false,
                    config_dir: None
                }
            );
        }
    }

    #[test]
    fn test_parse_schedule_with_options() {
        let parsed = ParsedArgs::parse(vec![
            "yin-yang", "--debug", "-s", "--config", "/tmp/cfg", "--log",
        ]);
        assert_eq!(
            parsed.action,
            CliAction::Schedule {
                debug_enabled: true,
                config_dir: Some("/tmp/cfg".to_string()),
                log_to_file: true,
            }
        );
    }

    #[test]
    fn test_parse_themes_command() {
        let parsed = ParsedArgs::parse(vec!["yin-yang", "themes", "-d"]);
        assert_eq!(
            parsed.action,
            CliAction::Themes {
                debug_enabled: true,
                config_dir: None
            }
        );
    }

    #[test]
    fn test_parse_help_takes_precedence() {
        let parsed = ParsedArgs::parse(vec!["yin-yang", "--toggle", "--help"]);
        assert_eq!(parsed.action, CliAction::ShowHelp);
        let parsed = ParsedArgs::parse(vec!["yin-yang", "--unknown", "-h"]);
        assert_eq!(parsed.action, CliAction::ShowHelp);
    }

    #[test]
    fn test_parse_version_flags() {
        for flag in ["-V", "-v", "--version"] {
            let parsed = ParsedArgs::parse(vec!["yin-yang", flag]);
            assert_eq!(parsed.action, CliAction::ShowVersion);
        }
    }

    #[test]
    fn test_parse_debug_alone_shows_help() {
        let parsed = ParsedArgs::parse(vec!["yin-yang", "-d"]);
        assert_eq!(parsed.action, CliAction::ShowHelp);
    }

    #[test]
    fn test_parse_errors() {
        for args in [
            vec!["yin-yang", "--unknown"],
            vec!["yin-yang", "-t", "-s"],
            vec!["yin-yang", "-s", "--config"],
            vec!["yin-yang", "-s", "--config", "--debug"],
            vec!["yin-yang", "theme"],
        ] {
            let parsed = ParsedArgs::parse(args.clone());
            assert_eq!(parsed.action, CliAction::ShowHelpDueToError, "{args:?}");
        }
    }
}
