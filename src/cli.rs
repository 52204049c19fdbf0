//! Command line interface for the `smartmocks` demo binary.
//!
//! The binary builds the demo authentication feature, dispatches a single
//! request against it and prints the response, or renders the feature as
//! Gherkin text.

use std::path::PathBuf;

use clap::Parser;

/// Command line arguments for the `smartmocks` binary.
#[derive(Debug, Parser)]
#[command(
    name = "smartmocks",
    version,
    about = "Dispatch a request against the demo scenarios"
)]
pub struct Cli {
    /// Request path.
    #[arg(default_value = "/features/v1/authenticated")]
    pub path: String,
    /// HTTP method of the request.
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,
    /// Request header as `name: value`; may be repeated.
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
    /// JSON file holding the dispatch configuration.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Print the Gherkin rendering of every scenario instead of dispatching.
    #[arg(long)]
    pub render: bool,
    /// Print the dispatch counters in Prometheus text format afterwards.
    #[arg(long)]
    pub metrics: bool,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `name: value`, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing header name in `{raw}`"));
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rstest::rstest;

    use super::Cli;

    #[test]
    fn defaults_target_the_demo_route() {
        let cli = Cli::parse_from(["smartmocks"]);
        assert_eq!(cli.method, "GET");
        assert_eq!(cli.path, "/features/v1/authenticated");
        assert!(cli.headers.is_empty());
        assert!(!cli.render);
    }

    #[test]
    fn parses_repeated_headers() {
        let cli = Cli::parse_from([
            "smartmocks",
            "-H",
            "x-auth: token",
            "--header",
            "accept:text/plain",
            "/other",
        ]);
        assert_eq!(
            cli.headers,
            [
                ("x-auth".to_owned(), "token".to_owned()),
                ("accept".to_owned(), "text/plain".to_owned()),
            ]
        );
        assert_eq!(cli.path, "/other");
    }

    #[rstest]
    #[case("no-colon")]
    #[case(": value")]
    fn rejects_malformed_headers(#[case] header: &str) {
        assert!(Cli::try_parse_from(["smartmocks", "-H", header]).is_err());
    }
}
