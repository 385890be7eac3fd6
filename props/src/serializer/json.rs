//! JSON serializer.
//!
//! Schemas serialize to their descriptor list and reciprocal pairs; hosts
//! serialize to the model, the stored slots and every resolved attribute in
//! registration order. Arrays become JSON number arrays, mappings their
//! label, and sensitivities a tagged object.

use serde_json::{json, Value};

use crate::deriv::Deriv;
use crate::host::{Host, Value as HostValue};
use crate::model::Descriptor;
use crate::report::{CheckReport, CheckResult, Severity};
use crate::schema::Schema;

/// Serializes the descriptors and reciprocal pairs of a schema.
#[must_use]
pub fn schema_to_json(schema: &Schema) -> Value {
    let descriptors: Vec<Value> = schema.iter().map(descriptor_to_json).collect();
    let reciprocals: Vec<Value> = schema
        .reciprocal_pairs()
        .into_iter()
        .map(|(a, b)| json!([a, b]))
        .collect();
    json!({
        "schema": schema.name(),
        "descriptors": descriptors,
        "reciprocals": reciprocals
    })
}

fn descriptor_to_json(d: &Descriptor) -> Value {
    let mut node = json!({
        "name": d.name(),
        "kind": d.kind().as_str(),
        "help": d.help()
    });
    match d {
        Descriptor::Property(p) => {
            if let Some(m) = &p.mapping {
                node["mapping"] = json!(m);
            }
            if let Some(r) = &p.reciprocal {
                node["reciprocal"] = json!(r);
            }
        }
        Descriptor::Mapping(m) => {
            if let Some(prop) = &m.prop {
                node["prop"] = json!(prop);
            }
        }
        Descriptor::Derivative(dv) => {
            if let Some(prop) = &dv.physical_property {
                node["physicalProperty"] = json!(prop);
            }
        }
    }
    node
}

/// Serializes the model, stored slots and resolved attributes of a host.
///
/// Unresolvable attributes appear with a `null` value.
#[must_use]
pub fn host_to_json(host: &Host) -> Value {
    let attributes: Vec<Value> = host
        .resolve_all()
        .into_iter()
        .map(|(name, value)| {
            let kind = host
                .schema()
                .get(name)
                .map(|d| d.kind().as_str())
                .unwrap_or_default();
            json!({
                "name": name,
                "kind": kind,
                "value": value.as_ref().map_or(Value::Null, value_to_json)
            })
        })
        .collect();
    json!({
        "schema": host.schema().name(),
        "model": host.model().map(|m| m.to_vec()),
        "stored": host.stored(),
        "attributes": attributes
    })
}

/// Serializes a single attribute value.
#[must_use]
pub fn value_to_json(value: &HostValue) -> Value {
    match value {
        HostValue::Array(a) => json!(a.to_vec()),
        HostValue::Map(m) => json!({ "mapping": m.label() }),
        HostValue::Deriv(d) => deriv_to_json(d),
    }
}

fn deriv_to_json(d: &Deriv) -> Value {
    match d {
        Deriv::Zero => json!({ "kind": d.kind() }),
        Deriv::Diagonal(diag) => json!({ "kind": d.kind(), "diagonal": diag.to_vec() }),
        Deriv::Dense(m) => {
            let rows: Vec<Vec<f64>> = m.rows().into_iter().map(|r| r.to_vec()).collect();
            json!({ "kind": d.kind(), "rows": rows })
        }
    }
}

/// Serializes a check report with per-severity totals.
#[must_use]
pub fn report_to_json(report: &CheckReport) -> Value {
    let results: Vec<Value> = report.results.iter().map(result_to_json).collect();
    json!({
        "passed": report.count(Severity::Pass),
        "warnings": report.count(Severity::Warning),
        "failures": report.count(Severity::Failure),
        "results": results
    })
}

fn result_to_json(r: &CheckResult) -> Value {
    json!({
        "check": r.check,
        "subject": r.subject,
        "severity": r.severity.as_str(),
        "message": r.message
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maps::ExpMap;
    use crate::model::Invertible;
    use ndarray::array;
    use std::sync::Arc;

    fn schema() -> Schema {
        Schema::builder("conductivity")
            .invertible(Invertible::new("sigma", "Electrical conductivity"))
            .invertible(Invertible::new("rho", "Electrical resistivity"))
            .reciprocal("sigma", "rho")
            .and_then(|b| b.build())
            .unwrap()
    }

    #[test]
    fn schema_lists_links() {
        let value = schema_to_json(&schema());
        assert_eq!(value["schema"], "conductivity");
        assert_eq!(value["descriptors"].as_array().unwrap().len(), 6);
        assert_eq!(value["descriptors"][0]["kind"], "physical property");
        assert_eq!(value["descriptors"][0]["mapping"], "sigmaMap");
        assert_eq!(value["descriptors"][0]["reciprocal"], "rho");
        assert_eq!(value["descriptors"][1]["prop"], "sigma");
        assert_eq!(value["descriptors"][2]["physicalProperty"], "sigma");
        assert_eq!(value["reciprocals"], json!([["sigma", "rho"]]));
    }

    #[test]
    fn host_state() {
        let mut host = Host::new(Arc::new(schema()));
        host.set_model(Some(array![0.0, 0.0]));
        host.set_mapping("sigmaMap", Some(Arc::new(ExpMap))).unwrap();

        let value = host_to_json(&host);
        assert_eq!(value["model"], json!([0.0, 0.0]));
        assert_eq!(value["stored"], json!(["sigmaMap"]));
        assert_eq!(value["attributes"][0]["name"], "sigma");
        assert_eq!(value["attributes"][0]["value"], json!([1.0, 1.0]));
        assert_eq!(value["attributes"][1]["value"]["mapping"], "ExpMap");
        assert_eq!(value["attributes"][2]["value"]["kind"], "diagonal");
        assert_eq!(value["attributes"][3]["value"], json!([1.0, 1.0]));
        assert_eq!(value["attributes"][4]["value"]["mapping"], "ReciprocalMap * ExpMap");
    }

    #[test]
    fn unresolved_attributes_are_null() {
        let host = Host::new(Arc::new(schema()));
        let value = host_to_json(&host);
        assert_eq!(value["model"], Value::Null);
        assert_eq!(value["attributes"][0]["value"], Value::Null);
        assert_eq!(value["attributes"][2]["value"], json!({ "kind": "zero" }));
    }
}
