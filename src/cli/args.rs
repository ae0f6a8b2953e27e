// ABOUTME: Command-line surface of the smpp_client binary
// ABOUTME: Global connection flags plus the single runClient subcommand

use argh::FromArgs;

/// SMPP client for SMSC
#[derive(FromArgs, Debug, Default, PartialEq)]
pub struct CliArgs {
    /// set SMPP server host:port (default: localhost:6200)
    #[argh(option)]
    pub addr: Option<String>,

    /// set SMPP username (overrides SMPP_USER)
    #[argh(option)]
    pub user: Option<String>,

    /// set SMPP password (overrides SMPP_PASSWD)
    #[argh(option)]
    pub passwd: Option<String>,

    /// use client TLS connection
    #[argh(switch)]
    pub tls: bool,

    /// accept invalid TLS certificate
    #[argh(switch)]
    pub precaire: bool,

    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    pub debugging: bool,

    /// print version information and exit
    #[argh(switch, short = 'V')]
    pub version: bool,

    #[argh(subcommand)]
    pub command: Option<Command>,
}

#[derive(FromArgs, Debug, PartialEq)]
#[argh(subcommand)]
pub enum Command {
    RunClient(RunClient),
}

/// start SMPP client
#[derive(FromArgs, Debug, PartialEq)]
#[argh(subcommand, name = "runClient")]
pub struct RunClient {}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, argh::EarlyExit> {
        CliArgs::from_args(&["smpp_client"], args)
    }

    #[test]
    fn global_flags_precede_the_subcommand() {
        let args = parse(&[
            "--addr",
            "smsc.example.com:2775",
            "--user",
            "alice",
            "--passwd",
            "secret",
            "--tls",
            "--precaire",
            "runClient",
        ])
        .unwrap();

        assert_eq!(args.addr.as_deref(), Some("smsc.example.com:2775"));
        assert_eq!(args.user.as_deref(), Some("alice"));
        assert_eq!(args.passwd.as_deref(), Some("secret"));
        assert!(args.tls);
        assert!(args.precaire);
        assert_eq!(args.command, Some(Command::RunClient(RunClient {})));
    }

    #[test]
    fn everything_is_optional() {
        let args = parse(&["runClient"]).unwrap();
        assert_eq!(
            args,
            CliArgs {
                command: Some(Command::RunClient(RunClient {})),
                ..Default::default()
            }
        );
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(parse(&["--bogus", "runClient"]).is_err());
    }

    #[test]
    fn subcommand_name_is_camel_case() {
        assert!(parse(&["run-client"]).is_err());
        assert!(parse(&["runClient"]).unwrap().command.is_some());
    }
}
