use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};

// NOTE: Rendered without colour and at a fixed width, so the output only depends on the diagnostic itself
pub(crate) fn render_report(diagnostic: &dyn Diagnostic) -> String {
    let mut out = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
        .with_width(80)
        .render_report(&mut out, diagnostic)
        .unwrap();
    out
}
