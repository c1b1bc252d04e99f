use std::{fs, path::Path, path::PathBuf};

use clap::{ArgAction, Parser};
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, IntoDiagnostic, Report, Result};
use reaction_network::ReactionNetwork;
use rustyline::DefaultEditor;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

/// Derives the mass-action ODEs of a chemical reaction network
///
/// Without a FILE, reactions are read interactively, with `;` separating reactions on a line.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// A reaction diagram, or a `.kdl` network description
    file: Option<PathBuf>,
    /// Log more detail to stderr (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Silence all logging
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose, args.quiet);

    if let Some(path) = args.file {
        let network = load_network(&path)?;
        print!("{}", network_info(&network));
    } else {
        repl()?;
    }

    Ok(())
}

fn setup_logging(verbosity: u8, quiet: bool) {
    let level_filter = if quiet {
        LevelFilter::OFF
    } else {
        match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(level_filter)
        .with(stderr_layer)
        .init();
}

fn load_network(path: &Path) -> Result<ReactionNetwork> {
    let text = fs::read_to_string(path).into_diagnostic()?;
    info!(path = %path.display(), "loading reaction network");

    if path.extension().is_some_and(|extension| extension == "kdl") {
        ReactionNetwork::from_kdl(path.display().to_string(), text)
    } else {
        ReactionNetwork::from_diagram(text).map_err(|error| Report::new(*error))
    }
}

fn repl() -> Result<()> {
    let mut rl = DefaultEditor::new().into_diagnostic()?;
    while let Ok(reactions) = rl.readline("Reactions: ") {
        rl.add_history_entry(&reactions).into_diagnostic()?;
        match ReactionNetwork::from_diagram(reactions.replace(';', "\n")) {
            Ok(network) => println!("{}", network_info(&network)),
            Err(diagnostic) => println!("{}", render_error(&*diagnostic)),
        }
    }
    Ok(())
}

fn network_info(network: &ReactionNetwork) -> String {
    format!("{network}\n\n{}\n", network.to_ode_system())
}

fn render_error(diagnostic: &dyn Diagnostic) -> String {
    let mut buf = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode())
        .render_report(&mut buf, diagnostic)
        .map_or_else(|_| diagnostic.to_string(), |()| buf)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn verbosity_flags() {
        let args = Args::try_parse_from(["mass-action", "-vv", "network.kdl"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert!(!args.quiet);
        assert_eq!(args.file, Some(PathBuf::from("network.kdl")));

        let args = Args::try_parse_from(["mass-action", "-q"]).unwrap();
        assert!(args.quiet);
        assert_eq!(args.file, None);

        assert!(Args::try_parse_from(["mass-action", "-q", "-v"]).is_err());
    }

    #[test]
    fn load_network_description() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("crates/reaction-network/tests/data/autocatalysis.kdl");
        let network = load_network(&path).unwrap();
        assert_eq!(
            network_info(&network),
            "x1 + x2 -> 2 x2\nx2 -> x1\n\n\
             dx1/dt = -k_0_1*x1*x2 + k_3_2*x2\n\
             dx2/dt = k_0_1*x1*x2 - k_3_2*x2\n"
        );
    }

    #[test]
    fn missing_files_are_errors() {
        assert!(load_network(Path::new("no/such/network.txt")).is_err());
    }

    #[test]
    fn rendered_errors_name_the_line() {
        let error = ReactionNetwork::from_diagram("A -> B\nA -> B -> C").unwrap_err();
        let report = render_error(&*error);
        assert!(report.contains("line 2"));
        assert!(report.contains("A -> B -> C"));
    }
}
