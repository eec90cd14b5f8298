mod action;
mod parser;

use std::io::{self, Write};
use std::process::ExitCode;

use log::error;

use tax_reporter::config::Config;
use tax_reporter::core::EmptyResult;
use tax_reporter::declaration;
use tax_reporter::report;

use self::action::Action;
use self::parser::{Parser, GlobalOptions};

fn main() -> ExitCode {
    let mut parser = Parser::new();

    let global = match parser.parse_global() {
        Ok(global) => global,
        Err(err) => {
            let _ = writeln!(io::stderr(), "{err}.");
            return ExitCode::FAILURE;
        },
    };

    if let Err(err) = easy_logging::init(module_path!(), global.log_level) {
        let _ = writeln!(io::stderr(), "Failed to initialize the logging: {err}.");
        return ExitCode::FAILURE;
    }

    if let Err(err) = run(global, parser) {
        let message = err.to_string();

        if message.contains('\n') {
            error!("{err}");
        } else {
            error!("{err}.");
        }

        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(global: GlobalOptions, parser: Parser) -> EmptyResult {
    let config = Config::new(&global.config_dir)?;

    match parser.parse(&config)? {
        Action::Report {paths, format} => report::generate_report(&config, &paths, &format),
        Action::Declaration {year, rate, template_path, output_path, paths} =>
            declaration::generate_declaration(&config, year, rate, &template_path, &output_path, &paths),
    }
}
