use std::path::PathBuf;

use clap::{ArgAction, ArgMatches};

use tax_reporter::cli;
use tax_reporter::config::Config;
use tax_reporter::core::GenericResult;
use tax_reporter::report::ReportFormat;
use tax_reporter::types::Date;
use tax_reporter::valuation::RateChoice;

use super::action::Action;

pub struct Parser {
    matches: Option<ArgMatches>,
}

pub struct GlobalOptions {
    pub log_level: log::Level,
    pub config_dir: String,
}

impl Parser {
    pub fn new() -> Parser {
        Parser {
            matches: None,
        }
    }

    pub fn parse_global(&mut self) -> GenericResult<GlobalOptions> {
        const DEFAULT_CONFIG_DIR_PATH: &str = "~/.tax-reporter";

        let matches = cli::new_app("tax-reporter", "Helps you with Czech personal income tax declaration")
            .version(env!("CARGO_PKG_VERSION"))
            .subcommand_required(true)
            .arg_required_else_help(true)
            .args([
                cli::new_arg("config", "Configuration directory path [default: ~/.tax-reporter]")
                    .short('c').long("config")
                    .value_name("PATH")
                    .global(true),

                cli::new_arg("verbose", "Set verbosity level")
                    .short('v').long("verbose")
                    .action(ArgAction::Count)
                    .global(true),
            ])

            .subcommand(cli::new_subcommand(
                "report", "Show broker statement transactions with their CZK values")
                .long_about("\
                    Reads broker statements and shows every transaction amount converted to CZK \
                    using both the Czech National Bank daily rate and the yearly average rate. \
                    Every statement is processed independently.")
                .args([
                    cli::new_arg("json", "Output in JSON format")
                        .long("json")
                        .action(ArgAction::SetTrue),

                    cli::new_arg("xlsx", "Save the report to the specified spreadsheet")
                        .long("xlsx")
                        .value_name("PATH")
                        .conflicts_with("json"),

                    paths::arg(),
                ]))

            .subcommand(cli::new_subcommand(
                "declaration", "Generate tax declaration")
                .long_about("\
                    Reads broker statements and fills the appendices of the specified tax \
                    declaration (EPO XML file) with dividend, stock income and stock sale \
                    information. The result is saved to OUTPUT.")
                .args([
                    cli::new_arg("rate", "Currency rate to declare the income with")
                        .short('r').long("rate")
                        .value_name("TYPE")
                        .value_parser(["daily", "yearly-average"]),

                    cli::new_arg("YEAR", "Year to generate the declaration for").required(true),
                    cli::new_arg("TEMPLATE", "Path to tax declaration template").required(true),
                    cli::new_arg("OUTPUT", "Path to save the tax declaration to").required(true),
                    paths::arg(),
                ]))

            .get_matches();

        let log_level = match matches.get_count("verbose") {
            0 => log::Level::Info,
            1 => log::Level::Debug,
            2 => log::Level::Trace,
            _ => return Err("Invalid verbosity level".into()),
        };

        let config_dir = matches.get_one::<String>("config").map(String::as_str)
            .unwrap_or(DEFAULT_CONFIG_DIR_PATH);
        let config_dir = shellexpand::tilde(config_dir).to_string();

        self.matches = Some(matches);

        Ok(GlobalOptions {log_level, config_dir})
    }

    pub fn parse(mut self, config: &Config) -> GenericResult<Action> {
        let matches = self.matches.take().ok_or("Global options haven't been parsed")?;
        let (command, matches) = matches.subcommand().ok_or("Command is missing")?;

        Ok(match command {
            "report" => Action::Report {
                paths: paths::get(matches),
                format: if let Some(path) = matches.get_one::<String>("xlsx") {
                    ReportFormat::Spreadsheet(PathBuf::from(path))
                } else if matches.get_flag("json") {
                    ReportFormat::Json
                } else {
                    ReportFormat::PlainText
                },
            },

            "declaration" => Action::Declaration {
                year: get_year(matches)?,
                rate: match matches.get_one::<String>("rate") {
                    Some(rate) => RateChoice::parse(rate)?,
                    None => config.declaration_rate,
                },
                template_path: get_required(matches, "TEMPLATE")?,
                output_path: get_required(matches, "OUTPUT")?,
                paths: paths::get(matches),
            },

            _ => return Err(format!("Unsupported command: {:?}", command).into()),
        })
    }
}

fn get_required(matches: &ArgMatches, name: &str) -> GenericResult<String> {
    Ok(matches.get_one::<String>(name).cloned().ok_or_else(|| format!("{} is missing", name))?)
}

fn get_year(matches: &ArgMatches) -> GenericResult<i32> {
    let year = get_required(matches, "YEAR")?;
    Ok(year.parse::<i32>().ok()
        .and_then(|year| Date::from_ymd_opt(year, 1, 1).and(Some(year)))
        .ok_or_else(|| format!("Invalid year: {}", year))?)
}

mod paths {
    use super::*;

    pub fn arg() -> clap::Arg {
        cli::new_arg("PATHS", "Broker statement files or directories")
            .required(true)
            .num_args(1..)
    }

    pub fn get(matches: &ArgMatches) -> Vec<PathBuf> {
        matches.get_many::<String>("PATHS").unwrap_or_default().map(PathBuf::from).collect()
    }
}
