//! FHIR to canonical mapping
//!
//! Pure functions with no I/O. Vendor adapters call these on every payload so
//! no partially mapped vendor data reaches callers.

use super::models::{
    CodeableConcept, Coding, DiagnosticReport, FhirPatient, HumanName, Reference, ServiceRequest,
};
use crate::domain::{
    Gender, Interpretation, LabResult, Order, OrderType, Patient, PatientQuery,
};

/// Identifier type code for medical record numbers (HL7 v2-0203)
const MRN_TYPE_CODE: &str = "MR";

/// Maps a FHIR `Patient` to the canonical [`Patient`]
pub fn patient_from_fhir(resource: &FhirPatient) -> Patient {
    let name = preferred_name(&resource.name);

    Patient {
        id: resource.id.clone().unwrap_or_default(),
        mrn: mrn(resource).unwrap_or_default(),
        first_name: name
            .and_then(|n| n.given.first().cloned())
            .unwrap_or_default(),
        last_name: name.and_then(|n| n.family.clone()).unwrap_or_default(),
        dob: resource.birth_date.clone().unwrap_or_default(),
        gender: resource
            .gender
            .as_deref()
            .map(Gender::from_code)
            .unwrap_or_default(),
        phone: telecom(resource, "phone"),
        email: telecom(resource, "email"),
        allergies: None,
        conditions: None,
    }
}

/// Official name if present, else the first one
fn preferred_name(names: &[HumanName]) -> Option<&HumanName> {
    names
        .iter()
        .find(|n| n.name_use.as_deref() == Some("official"))
        .or_else(|| names.first())
}

/// MR-typed identifier if present, else the first identifier with a value
fn mrn(resource: &FhirPatient) -> Option<String> {
    resource
        .identifier
        .iter()
        .find(|id| {
            id.kind
                .as_ref()
                .map(|k| k.has_code(MRN_TYPE_CODE))
                .unwrap_or(false)
        })
        .or_else(|| resource.identifier.iter().find(|id| id.value.is_some()))
        .and_then(|id| id.value.clone())
}

fn telecom(resource: &FhirPatient, system: &str) -> Option<String> {
    resource
        .telecom
        .iter()
        .find(|t| t.system.as_deref() == Some(system))
        .and_then(|t| t.value.clone())
}

/// FHIR search parameters for a patient query
pub fn patient_search_params(query: &PatientQuery) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if let Some(name) = &query.name {
        params.push(("name".to_string(), name.clone()));
    }
    if let Some(mrn) = &query.mrn {
        params.push(("identifier".to_string(), mrn.clone()));
    }
    if let Some(dob) = &query.dob {
        params.push(("birthdate".to_string(), dob.clone()));
    }
    params
}

/// Builds the `ServiceRequest` submitted for a canonical order
///
/// Always `status: active, intent: order`, whatever the order's own status.
pub fn service_request_from_order(order: &Order) -> ServiceRequest {
    ServiceRequest {
        resource_type: "ServiceRequest".to_string(),
        id: None,
        status: "active".to_string(),
        intent: "order".to_string(),
        priority: Some(order.priority.as_str().to_string()),
        category: vec![CodeableConcept {
            coding: vec![],
            text: Some(order_category(order.order_type).to_string()),
        }],
        code: Some(CodeableConcept {
            coding: vec![Coding {
                system: Some(order.code_system.uri().to_string()),
                code: Some(order.code.clone()),
                display: Some(order.description.clone()),
            }],
            text: Some(order.description.clone()),
        }),
        subject: Reference::to("Patient", &order.patient_id),
        requester: Some(Reference {
            reference: None,
            display: Some(order.ordering_provider.clone()),
        }),
    }
}

fn order_category(order_type: OrderType) -> &'static str {
    match order_type {
        OrderType::Lab => "laboratory",
        OrderType::Radiology => "imaging",
        OrderType::Medication => "medication",
        OrderType::Procedure => "procedure",
        OrderType::Referral => "referral",
    }
}

/// Maps a `DiagnosticReport` to a [`LabResult`]
///
/// A report carries no discrete value, unit, reference range or
/// interpretation. `value` takes the conclusion text, `unit` and
/// `reference_range` stay empty and `interpretation` is always `normal`.
/// Following the report's `result` Observations would fill these in.
pub fn lab_result_from_report(report: &DiagnosticReport, patient_id: &str) -> LabResult {
    let coding = report.code.as_ref().and_then(CodeableConcept::first_coding);

    LabResult {
        id: report.id.clone().unwrap_or_default(),
        order_id: report
            .based_on
            .iter()
            .find_map(|r| r.id_of("ServiceRequest"))
            .unwrap_or_default()
            .to_string(),
        patient_id: patient_id.to_string(),
        code: coding.and_then(|c| c.code.clone()).unwrap_or_default(),
        name: report
            .code
            .as_ref()
            .and_then(|c| c.text.clone())
            .or_else(|| coding.and_then(|c| c.display.clone()))
            .unwrap_or_default(),
        value: report.conclusion.clone().unwrap_or_default(),
        unit: String::new(),
        reference_range: String::new(),
        interpretation: Interpretation::Normal,
        collected_at: report.effective_date_time.clone().unwrap_or_default(),
        resulted_at: report.issued.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CodeSystem, OrderStatus, Priority};
    use serde_json::json;

    fn fhir_patient(value: serde_json::Value) -> FhirPatient {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_patient_mapping_full() {
        let resource = fhir_patient(json!({
            "resourceType": "Patient",
            "id": "12724066",
            "identifier": [
                {"system": "urn:oid:1.1", "value": "SSN-1"},
                {"type": {"coding": [{"code": "MR"}]}, "value": "MRN-778"}
            ],
            "name": [
                {"use": "nickname", "given": ["Bobby"], "family": "Smith"},
                {"use": "official", "given": ["Robert", "James"], "family": "Smith"}
            ],
            "gender": "male",
            "birthDate": "1990-09-15",
            "telecom": [
                {"system": "email", "value": "rsmith@example.org"},
                {"system": "phone", "value": "555-0100"}
            ]
        }));

        let patient = patient_from_fhir(&resource);
        assert_eq!(patient.id, "12724066");
        assert_eq!(patient.mrn, "MRN-778");
        assert_eq!(patient.first_name, "Robert");
        assert_eq!(patient.last_name, "Smith");
        assert_eq!(patient.dob, "1990-09-15");
        assert_eq!(patient.gender, Gender::Male);
        assert_eq!(patient.phone.as_deref(), Some("555-0100"));
        assert_eq!(patient.email.as_deref(), Some("rsmith@example.org"));
    }

    #[test]
    fn test_patient_mapping_sparse() {
        let resource = fhir_patient(json!({
            "resourceType": "Patient",
            "id": "p2",
            "identifier": [{"value": "ONLY-ID"}]
        }));

        let patient = patient_from_fhir(&resource);
        assert_eq!(patient.mrn, "ONLY-ID");
        assert_eq!(patient.first_name, "");
        assert_eq!(patient.gender, Gender::Unknown);
        assert!(patient.phone.is_none());
    }

    #[test]
    fn test_search_params() {
        let query = PatientQuery {
            name: Some("Smith".to_string()),
            mrn: Some("MRN-1".to_string()),
            dob: None,
        };
        assert_eq!(
            patient_search_params(&query),
            vec![
                ("name".to_string(), "Smith".to_string()),
                ("identifier".to_string(), "MRN-1".to_string())
            ]
        );
        assert!(patient_search_params(&PatientQuery::default()).is_empty());
    }

    #[test]
    fn test_service_request_from_order() {
        let order = Order {
            id: None,
            patient_id: "p1".to_string(),
            order_type: OrderType::Radiology,
            code: "71046".to_string(),
            code_system: CodeSystem::Cpt,
            description: "Chest X-ray".to_string(),
            priority: Priority::Urgent,
            status: OrderStatus::Draft,
            ordering_provider: "Dr. Grey".to_string(),
        };

        let request = service_request_from_order(&order);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["status"], "active");
        assert_eq!(value["intent"], "order");
        assert_eq!(value["priority"], "urgent");
        assert_eq!(value["subject"]["reference"], "Patient/p1");
        assert_eq!(value["code"]["coding"][0]["system"], "http://www.ama-assn.org/go/cpt");
        assert_eq!(value["code"]["coding"][0]["code"], "71046");
        assert_eq!(value["category"][0]["text"], "imaging");
        assert_eq!(value["requester"]["display"], "Dr. Grey");
    }

    #[test]
    fn test_lab_result_defaults_unmapped_fields() {
        let report: DiagnosticReport = serde_json::from_value(json!({
            "resourceType": "DiagnosticReport",
            "id": "dr-1",
            "status": "final",
            "code": {"coding": [{"system": "http://loinc.org", "code": "24323-8", "display": "CMP"}]},
            "basedOn": [{"reference": "ServiceRequest/sr-5"}],
            "effectiveDateTime": "2024-03-01T08:00:00Z",
            "issued": "2024-03-01T10:30:00Z",
            "conclusion": "Within limits"
        }))
        .unwrap();

        let result = lab_result_from_report(&report, "p1");
        assert_eq!(result.id, "dr-1");
        assert_eq!(result.order_id, "sr-5");
        assert_eq!(result.patient_id, "p1");
        assert_eq!(result.code, "24323-8");
        assert_eq!(result.name, "CMP");
        assert_eq!(result.value, "Within limits");
        assert_eq!(result.unit, "");
        assert_eq!(result.reference_range, "");
        assert_eq!(result.interpretation, Interpretation::Normal);
        assert_eq!(result.collected_at, "2024-03-01T08:00:00Z");
        assert_eq!(result.resulted_at, "2024-03-01T10:30:00Z");
    }
}
