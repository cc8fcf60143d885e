//! Error rendering for the CLI.
//!
//! Known library errors are shown as diagnostics with suggestions; source
//! errors with a location go through miette. Anything else prints its
//! context chain.

use miette::{Diagnostic as MietteDiagnostic, GraphicalReportHandler, GraphicalTheme};

use shimsmith::codegen::GenerationError;
use shimsmith::resolver::ResolveError;
use shimsmith::rewrite::RewriteError;
use shimsmith::util::diagnostic::{emit, ConfigParseError};

pub fn error(err: &anyhow::Error, color: bool) {
    if let Some(parse) = err.downcast_ref::<ConfigParseError>() {
        render(parse, color, err);
    } else if let Some(resolve) = err.downcast_ref::<ResolveError>() {
        match resolve.to_report() {
            Some(report) => render(&report, color, err),
            None => emit(&resolve.to_diagnostic(), color),
        }
    } else if let Some(generation) = err.downcast_ref::<GenerationError>() {
        emit(&generation.to_diagnostic(), color);
    } else if let Some(rewrite) = err.downcast_ref::<RewriteError>() {
        emit(&rewrite.to_diagnostic(), color);
    } else {
        eprintln!("error: {:#}", err);
    }
}

fn render(diagnostic: &dyn MietteDiagnostic, color: bool, fallback: &anyhow::Error) {
    let theme = if color {
        GraphicalTheme::unicode()
    } else {
        GraphicalTheme::unicode_nocolor()
    };
    let mut out = String::new();
    match GraphicalReportHandler::new_themed(theme).render_report(&mut out, diagnostic) {
        Ok(()) => eprint!("{}", out),
        Err(_) => eprintln!("error: {:#}", fallback),
    }
}
