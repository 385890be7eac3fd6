//! Plain-text serializer for terminal output.

use std::fmt::Write as _;

use crate::host::{Host, Value};
use crate::model::Descriptor;
use crate::report::{CheckReport, Severity};
use crate::schema::Schema;

use super::format_array;

/// Renders a schema as an aligned table of descriptors and their links.
#[must_use]
pub fn schema_to_text(schema: &Schema) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "schema {}", schema.name());
    let width = name_width(schema);
    for d in schema.iter() {
        let links = match d {
            Descriptor::Property(p) => {
                let mut parts = Vec::new();
                if let Some(m) = &p.mapping {
                    parts.push(format!("mapping={m}"));
                }
                if let Some(r) = &p.reciprocal {
                    parts.push(format!("reciprocal={r}"));
                }
                parts.join(" ")
            }
            Descriptor::Mapping(m) => m
                .prop
                .as_ref()
                .map(|p| format!("prop={p}"))
                .unwrap_or_default(),
            Descriptor::Derivative(dv) => dv
                .physical_property
                .as_ref()
                .map(|p| format!("of={p}"))
                .unwrap_or_default(),
        };
        let _ = writeln!(
            out,
            "  {:<width$}  {:<17}  {}",
            d.name(),
            d.kind().as_str(),
            links
        );
        if !d.help().is_empty() {
            let _ = writeln!(out, "  {:<width$}  {}", "", d.help());
        }
    }
    out
}

/// Renders the model and every resolved attribute of a host.
#[must_use]
pub fn host_to_text(host: &Host) -> String {
    let mut out = String::new();
    let width = name_width(host.schema()).max("model".len());
    let model = host.model().map_or_else(|| "unset".to_owned(), format_array);
    let _ = writeln!(out, "{:<width$} = {model}", "model");
    for (name, value) in host.resolve_all() {
        let rendered = match &value {
            None => "unset".to_owned(),
            Some(Value::Array(a)) => format_array(a),
            Some(other) => other.to_string(),
        };
        let marker = if host.get_raw(name).is_some() { "*" } else { " " };
        let _ = writeln!(out, "{name:<width$}{marker}= {rendered}");
    }
    out
}

/// Renders a check report, one line per finding plus a summary line.
///
/// Passing results are listed only when `verbose` is set.
#[must_use]
pub fn report_to_text(report: &CheckReport, verbose: bool) -> String {
    let mut out = String::new();
    for r in &report.results {
        if verbose || r.severity != Severity::Pass {
            let _ = writeln!(out, "{r}");
        }
    }
    let _ = writeln!(
        out,
        "{} passed, {} warning(s), {} failure(s)",
        report.count(Severity::Pass),
        report.count(Severity::Warning),
        report.count(Severity::Failure)
    );
    out
}

fn name_width(schema: &Schema) -> usize {
    schema.iter().map(|d| d.name().len()).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Invertible;
    use crate::report::CheckResult;
    use ndarray::array;
    use std::sync::Arc;

    fn host() -> Host {
        let schema = Schema::builder("conductivity")
            .invertible(Invertible::new("sigma", "Electrical conductivity"))
            .invertible(Invertible::new("rho", "Electrical resistivity"))
            .reciprocal("sigma", "rho")
            .and_then(|b| b.build())
            .unwrap();
        Host::new(Arc::new(schema))
    }

    #[test]
    fn schema_table() {
        let text = schema_to_text(host().schema());
        assert!(text.starts_with("schema conductivity\n"));
        assert!(text.contains("mapping=sigmaMap reciprocal=rho"));
        assert!(text.contains("prop=rho"));
        assert!(text.contains("of=sigma"));
    }

    #[test]
    fn host_marks_stored_slots() {
        let mut h = host();
        h.set_property("rho", Some(array![2.0, 4.0])).unwrap();
        let text = host_to_text(&h);
        assert!(text.contains("model      = unset"), "{text}");
        assert!(text.contains("sigma      = [0.5, 0.25]"), "{text}");
        assert!(text.contains("rho       *= [2, 4]"), "{text}");
        assert!(text.contains("sigmaDeriv = Zero"), "{text}");
    }

    #[test]
    fn report_hides_passes_unless_verbose() {
        let mut report = CheckReport::new();
        report.push(CheckResult::pass("schema/help", "sigma", "documented"));
        report.push(CheckResult::warn("schema/help", "rho", "help text is empty"));
        let quiet = report_to_text(&report, false);
        assert!(!quiet.contains("[PASS]"));
        assert!(quiet.contains("[WARN] schema/help (rho)"));
        assert!(quiet.ends_with("1 passed, 1 warning(s), 0 failure(s)\n"));
        assert!(report_to_text(&report, true).contains("[PASS]"));
    }
}
