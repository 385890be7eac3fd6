//! Non-fatal checks over schemas and host state.
//!
//! [`SchemaBuilder::build`](crate::SchemaBuilder::build) already rejects
//! structurally broken schemas. The checks here flag schemas that are valid
//! but probably not what the author meant (a derivative that can only ever be
//! zero, an undocumented attribute), and host states that break the
//! one-live-source rule, which can only happen through raw slot writes.

use crate::host::Host;
use crate::model::Descriptor;
use crate::report::{CheckReport, CheckResult};
use crate::schema::Schema;

/// Runs every schema check.
#[must_use]
pub fn schema(schema: &Schema) -> CheckReport {
    let mut report = CheckReport::new();
    check_help(schema, &mut report);
    check_derivatives(schema, &mut report);
    check_orphan_mappings(schema, &mut report);
    check_reciprocal_sources(schema, &mut report);
    report
}

/// Verifies that each property and its related slots hold at most one
/// stored source on `host`.
#[must_use]
pub fn host(host: &Host) -> CheckReport {
    const CHECK: &str = "host/exclusive-source";
    let mut report = CheckReport::new();
    let schema = host.schema();

    for p in schema.properties() {
        let reciprocal = p.reciprocal.as_deref().and_then(|r| schema.property(r).ok());
        if let Some(r) = reciprocal {
            // each pair is reported once, from the side whose name sorts first
            if r.name < p.name {
                continue;
            }
        }

        let mut slots: Vec<&str> = vec![p.name.as_str()];
        slots.extend(p.mapping.as_deref());
        if let Some(r) = reciprocal {
            slots.push(r.name.as_str());
            slots.extend(r.mapping.as_deref());
        }
        let live: Vec<&str> = slots
            .into_iter()
            .filter(|s| host.get_raw(s).is_some())
            .collect();

        let subject = match reciprocal {
            Some(r) => format!("{} / {}", p.name, r.name),
            None => p.name.clone(),
        };
        if live.len() > 1 {
            report.push(CheckResult::fail(
                CHECK,
                subject,
                format!("several sources are stored at once: {}", live.join(", ")),
            ));
        } else {
            report.push(CheckResult::pass(CHECK, subject, "at most one source stored"));
        }
    }
    report
}

fn check_help(schema: &Schema, report: &mut CheckReport) {
    const CHECK: &str = "schema/help";
    for d in schema.iter() {
        if d.help().trim().is_empty() {
            report.push(CheckResult::warn(CHECK, d.name(), "help text is empty"));
        } else {
            report.push(CheckResult::pass(CHECK, d.name(), "documented"));
        }
    }
}

fn check_derivatives(schema: &Schema, report: &mut CheckReport) {
    const CHECK: &str = "schema/derivative";
    for d in schema.iter() {
        let Descriptor::Derivative(dv) = d else {
            continue;
        };
        match dv.physical_property.as_deref() {
            None => report.push(CheckResult::warn(
                CHECK,
                &dv.name,
                "not bound to a physical property; always zero",
            )),
            Some(prop) if dv.mapping(schema).is_none() => report.push(CheckResult::warn(
                CHECK,
                &dv.name,
                format!("`{prop}` has no mapping; always zero"),
            )),
            Some(prop) => report.push(CheckResult::pass(
                CHECK,
                &dv.name,
                format!("differentiates `{prop}`"),
            )),
        }
    }
}

fn check_orphan_mappings(schema: &Schema, report: &mut CheckReport) {
    const CHECK: &str = "schema/mapping";
    for d in schema.iter() {
        let Descriptor::Mapping(m) = d else {
            continue;
        };
        match m.prop.as_deref() {
            None => report.push(CheckResult::warn(
                CHECK,
                &m.name,
                "not bound to a physical property; nothing reads it",
            )),
            Some(prop) => report.push(CheckResult::pass(
                CHECK,
                &m.name,
                format!("produces `{prop}`"),
            )),
        }
    }
}

fn check_reciprocal_sources(schema: &Schema, report: &mut CheckReport) {
    const CHECK: &str = "schema/reciprocal";
    for (a, b) in schema.reciprocal_pairs() {
        let mapped = [a, b]
            .iter()
            .filter(|n| {
                schema
                    .property(n)
                    .map(|p| p.mapping.is_some())
                    .unwrap_or(false)
            })
            .count();
        let subject = format!("{a} / {b}");
        if mapped == 0 {
            report.push(CheckResult::warn(
                CHECK,
                subject,
                "neither side has a mapping; the pair can only be set directly",
            ));
        } else {
            report.push(CheckResult::pass(
                CHECK,
                subject,
                format!("{mapped} side(s) mapped"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Value;
    use crate::model::{Derivative, Invertible, PhysicalProperty};
    use crate::report::Severity;
    use ndarray::array;
    use std::sync::Arc;

    #[test]
    fn clean_schema_has_no_findings() {
        let schema = Schema::builder("clean")
            .invertible(Invertible::new("sigma", "Electrical conductivity"))
            .invertible(Invertible::new("rho", "Electrical resistivity"))
            .reciprocal("sigma", "rho")
            .and_then(|b| b.build())
            .unwrap();
        let report = self::schema(&schema);
        assert_eq!(report.findings().count(), 0, "{:#?}", report.results);
    }

    #[test]
    fn flags_zero_only_derivatives_and_missing_help() {
        let mut loose = Derivative::new("etaDeriv", "");
        loose.physical_property = Some("eta".into());
        let schema = Schema::builder("loose")
            .descriptor(PhysicalProperty::new("eta", "Chargeability"))
            .descriptor(loose)
            .build()
            .unwrap();
        let report = self::schema(&schema);
        let warnings: Vec<_> = report
            .results
            .iter()
            .filter(|r| r.severity == Severity::Warning)
            .map(|r| (r.check.as_str(), r.subject.as_str()))
            .collect();
        assert_eq!(
            warnings,
            vec![("schema/help", "etaDeriv"), ("schema/derivative", "etaDeriv")]
        );
    }

    #[test]
    fn flags_unmapped_reciprocal_pairs() {
        let schema = Schema::builder("bare")
            .descriptor(PhysicalProperty::new("sigma", "Electrical conductivity"))
            .descriptor(PhysicalProperty::new("rho", "Electrical resistivity"))
            .reciprocal("sigma", "rho")
            .and_then(|b| b.build())
            .unwrap();
        let report = self::schema(&schema);
        assert!(report
            .findings()
            .any(|r| r.check == "schema/reciprocal" && r.subject == "sigma / rho"));
    }

    #[test]
    fn host_check_catches_raw_writes() {
        let schema = Schema::builder("raw")
            .invertible(Invertible::new("sigma", "Electrical conductivity"))
            .invertible(Invertible::new("rho", "Electrical resistivity"))
            .reciprocal("sigma", "rho")
            .and_then(|b| b.build())
            .unwrap();
        let mut h = Host::new(Arc::new(schema));
        h.set_property("sigma", Some(array![1.0])).unwrap();
        assert!(self::host(&h).all_passed());

        h.set_raw("rho", Some(Value::Array(array![2.0])));
        let report = self::host(&h);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.results[0].subject, "rho / sigma");
    }
}
