//! Cloud controller (v2) response bodies.

use serde_json::{json, Value};

/// A single page of a listing, pointing to `next_url` if there are more pages.
pub fn page(resources: Vec<Value>, next_url: Option<&str>) -> Value {
    json!({
        "total_results": resources.len(),
        "next_url": next_url,
        "resources": resources,
    })
}

/// A user provided service instance. Without a `syslog_drain_url` it is no drain.
pub fn service_instance(guid: &str, name: &str, syslog_drain_url: Option<&str>) -> Value {
    json!({
        "metadata": { "guid": guid },
        "entity": {
            "name": name,
            "syslog_drain_url": syslog_drain_url,
            "space_guid": "space-1",
            "service_bindings_url": format!("/v2/user_provided_service_instances/{}/service_bindings", guid),
        }
    })
}

pub fn service_binding(guid: &str, app_guid: &str, instance_guid: &str) -> Value {
    json!({
        "metadata": { "guid": guid },
        "entity": {
            "app_guid": app_guid,
            "service_instance_guid": instance_guid,
        }
    })
}

pub fn app(guid: &str, name: &str, state: &str) -> Value {
    json!({
        "metadata": { "guid": guid },
        "entity": {
            "name": name,
            "space_guid": "space-1",
            "state": state,
        }
    })
}

pub fn token(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 599,
        "scope": "cloud_controller.read cloud_controller.write",
        "jti": "1f2b6a0e",
    })
}
