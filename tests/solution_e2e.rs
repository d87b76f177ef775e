//! End-to-end runs of the solution validator, with and without full context.

use serde_json::{json, Value};

use skillforge_domain::{codes, SolutionContext};
use skillforge_domain::solution::{ConnectorDecl, SourceFile};
use skillforge_solution::SolutionValidator;

fn customer_care_solution() -> Value {
    json!({
        "id": "customer_care",
        "name": "Customer Care",
        "identity": {
            "actor_types": ["customer", "agent"],
            "default_actor_type": "customer",
            "admin_roles": ["agent"]
        },
        "skills": [
            {"id": "front_desk", "role": "gateway", "entry_channels": ["chat", "email"],
             "connectors": ["orders-db"]},
            {"id": "billing", "role": "worker", "entry_channels": [], "connectors": []},
            {"id": "escalations", "role": "approval", "entry_channels": [], "connectors": []}
        ],
        "grants": [{
            "key": "customer_verified",
            "issued_by": ["front_desk"],
            "consumed_by": ["billing"],
            "source_tool": "verify_identity",
            "source_field": "customer_id",
            "ttl_seconds": 3600
        }],
        "handoffs": [
            {"id": "desk_to_billing", "from": "front_desk", "to": "billing",
             "grants_passed": ["customer_verified"], "grants_dropped": [],
             "mechanism": "internal-message"},
            {"id": "billing_to_escalations", "from": "billing", "to": "escalations",
             "grants_passed": ["customer_verified"], "grants_dropped": [],
             "mechanism": "internal-message"}
        ],
        "routing": {"chat": "front_desk", "email": "front_desk"},
        "platform_connectors": [],
        "security_contracts": [{
            "consumer": "billing",
            "provider": "front_desk",
            "requires_grants": ["customer_verified"],
            "required_values": {},
            "for_tools": ["charge_card"]
        }]
    })
}

#[test]
fn well_formed_solution_validates_clean() {
    let report = SolutionValidator::validate_value(&customer_care_solution(), None).unwrap();
    assert!(report.valid, "unexpected errors: {:?}", report.errors);
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty(), "unexpected warnings: {:?}", report.warnings);
    assert_eq!(report.summary.skills, 3);
    assert_eq!(report.summary.grants, 1);
}

#[test]
fn grant_propagation_across_the_found_path() {
    // contract satisfied with the grant passed on the single hop
    let value = customer_care_solution();
    let report = SolutionValidator::validate_value(&value, None).unwrap();
    assert!(report
        .errors
        .iter()
        .all(|i| i.code != codes::CONTRACT_GRANT_NOT_PASSED));

    // dropping the grant from the hop produces exactly one error
    let mut dropped = value;
    dropped["handoffs"][0]["grants_passed"] = json!([]);
    let report = SolutionValidator::validate_value(&dropped, None).unwrap();
    assert_eq!(
        report
            .errors
            .iter()
            .filter(|i| i.code == codes::CONTRACT_GRANT_NOT_PASSED)
            .count(),
        1
    );
}

#[test]
fn handoff_cycle_round_trip() {
    let mut value = customer_care_solution();
    value["handoffs"].as_array_mut().unwrap().push(json!({
        "id": "escalations_back",
        "from": "escalations",
        "to": "front_desk",
        "grants_passed": [],
        "grants_dropped": [],
        "mechanism": "internal-message"
    }));
    let report = SolutionValidator::validate_value(&value, None).unwrap();
    assert_eq!(
        report
            .errors
            .iter()
            .filter(|i| i.code == codes::HANDOFF_CIRCULAR)
            .count(),
        1
    );

    value["handoffs"].as_array_mut().unwrap().pop();
    let report = SolutionValidator::validate_value(&value, None).unwrap();
    assert!(report.errors.iter().all(|i| i.code != codes::HANDOFF_CIRCULAR));
}

#[test]
fn context_checks_catch_unbound_connector() {
    let mut ctx = SolutionContext::default();
    ctx.skills.insert(
        "front_desk".to_string(),
        serde_json::from_value(json!({
            "id": "front_desk",
            "name": "Front Desk",
            "tools": [{
                "id": "lookup_order", "name": "Lookup Order",
                "source": {"kind": "mcp_bridge", "connection_id": "orders-db"}
            }]
        }))
        .unwrap(),
    );
    // the connector the tool binds to is not declared
    ctx.connectors.push(ConnectorDecl {
        id: "crm".to_string(),
        transport: "stdio".to_string(),
        command: Some("node".to_string()),
        args: vec!["servers/crm/index.js".to_string()],
        ui_capable: false,
    });
    ctx.mcp_store.insert(
        "crm".to_string(),
        vec![SourceFile {
            path: "index.js".to_string(),
            content: "const fs = require('fs');".to_string(),
        }],
    );

    let report =
        SolutionValidator::validate_value(&customer_care_solution(), Some(&ctx)).unwrap();
    assert!(report.errors.iter().any(|i| i.code == codes::CONNECTOR_NOT_FOUND));
}

#[test]
fn structural_checks_run_without_context() {
    let mut value = customer_care_solution();
    value["routing"]["fax"] = json!("nobody");
    let report = SolutionValidator::validate_value(&value, None).unwrap();
    assert!(report
        .errors
        .iter()
        .any(|i| i.code == codes::ROUTING_TARGET_UNKNOWN));
}
