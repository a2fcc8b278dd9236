//! End-to-end tests against the in-process mock Collins server.
//!
//! Each test starts its own mock on an ephemeral port (fresh state, no
//! cross-test interference) and drives the real blocking client over HTTP,
//! covering the idempotent-create helpers and the soft-update guards.

use collins_client::{ClientError, CollinsClient, CollinsConfig, LogSeverity, Params};

/// Start a mock Collins on a random port and return its base URL.
fn start_mock() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            collins_mock::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn client(base_url: &str) -> CollinsClient {
    CollinsClient::new(CollinsConfig::new(
        base_url,
        collins_mock::USERNAME,
        collins_mock::PASSWORD,
    ))
    .unwrap()
}

#[test]
fn asset_lifecycle() {
    let base_url = start_mock();
    let collins = client(&base_url);

    let pong = collins.ping().unwrap();
    assert!(pong.is_success());

    // Unknown tag is a plain 404 API error.
    let err = collins.asset_info("web-01", &Params::new()).unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 404, .. }));

    let created = collins.create_asset("web-01", &Params::new()).unwrap();
    assert_eq!(created.status, "success:created");

    let info = collins.asset_info("web-01", &Params::new()).unwrap();
    assert_eq!(info.data["ASSET"]["TAG"], "web-01");

    // Second create on the same tag conflicts when called directly.
    let err = collins.create_asset("web-01", &Params::new()).unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 409, .. }));

    let deleted = collins.delete_asset("web-01", &Params::new()).unwrap();
    assert!(deleted.is_success());
    let err = collins.asset_info("web-01", &Params::new()).unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 404, .. }));
}

#[test]
fn ensure_asset_is_idempotent() {
    let base_url = start_mock();
    let collins = client(&base_url);

    let first = collins.ensure_asset("db-01", &Params::new()).unwrap();
    assert_eq!(first.status, "success:created");

    let second = collins.ensure_asset("db-01", &Params::new()).unwrap();
    assert_eq!(second.status, "success:exists");
    assert_eq!(second.data["SUCCESS"], true);
}

#[test]
fn ensure_asset_converts_api_errors_to_failure_envelope() {
    let base_url = start_mock();
    // Bad credentials: every request answers 401.
    let collins = CollinsClient::new(CollinsConfig::new(
        &base_url,
        collins_mock::USERNAME,
        "wrong-password",
    ))
    .unwrap();

    let envelope = collins.ensure_asset("db-01", &Params::new()).unwrap();
    assert_eq!(envelope.status, "failure:401");
    assert!(!envelope.is_success());
    assert_eq!(envelope.data["SUCCESS"], false);
}

#[test]
fn ensure_asset_type_is_idempotent() {
    let base_url = start_mock();
    let collins = client(&base_url);

    let first = collins.ensure_asset_type("SERVICE", "Service").unwrap();
    assert_eq!(first.status, "success:created");

    let second = collins.ensure_asset_type("SERVICE", "Service").unwrap();
    assert_eq!(second.status, "success:exists");
}

#[test]
fn asset_type_crud() {
    let base_url = start_mock();
    let collins = client(&base_url);

    collins.create_asset_type("SERVICE", "Service").unwrap();

    let fetched = collins.get_asset_type("SERVICE").unwrap();
    assert_eq!(fetched.data["LABEL"], "Service");

    // Rename and relabel in one call; only provided fields are sent.
    collins
        .update_asset_type("SERVICE", Some("Managed Service"), Some("MANAGED_SERVICE"))
        .unwrap();

    let err = collins.get_asset_type("SERVICE").unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 404, .. }));
    let renamed = collins.get_asset_type("MANAGED_SERVICE").unwrap();
    assert_eq!(renamed.data["LABEL"], "Managed Service");

    collins.delete_asset_type("MANAGED_SERVICE").unwrap();
    let err = collins.get_asset_type("MANAGED_SERVICE").unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 404, .. }));
}

#[test]
fn soft_update_writes_only_on_change() {
    let base_url = start_mock();
    let collins = client(&base_url);
    collins.create_asset("web-02", &Params::new()).unwrap();

    // First write: attribute absent, update issued.
    assert!(collins
        .soft_update("web-02", "hostname", "web-02.example.net")
        .unwrap());
    let info = collins.asset_info("web-02", &Params::new()).unwrap();
    assert_eq!(info.data["ATTRIBS"]["0"]["HOSTNAME"], "web-02.example.net");

    // Same value again: no write.
    assert!(!collins
        .soft_update("web-02", "hostname", "web-02.example.net")
        .unwrap());

    // Changed value: exactly one write, visible afterwards.
    assert!(collins
        .soft_update("web-02", "hostname", "web-02b.example.net")
        .unwrap());
    let info = collins.asset_info("web-02", &Params::new()).unwrap();
    assert_eq!(info.data["ATTRIBS"]["0"]["HOSTNAME"], "web-02b.example.net");
}

#[test]
fn soft_update_never_erases() {
    let base_url = start_mock();
    let collins = client(&base_url);
    collins.create_asset("web-03", &Params::new()).unwrap();
    collins
        .soft_update("web-03", "hostname", "web-03.example.net")
        .unwrap();

    assert!(!collins.soft_update("web-03", "hostname", "").unwrap());
    assert!(!collins.soft_update("web-03", "hostname", "None").unwrap());

    let info = collins.asset_info("web-03", &Params::new()).unwrap();
    assert_eq!(info.data["ATTRIBS"]["0"]["HOSTNAME"], "web-03.example.net");
}

#[test]
fn update_and_delete_attribute() {
    let base_url = start_mock();
    let collins = client(&base_url);
    collins.create_asset("web-04", &Params::new()).unwrap();

    let mut params = Params::new();
    params.insert("attribute", "primary_role;APP");
    collins.update_asset("web-04", &params).unwrap();

    let info = collins.asset_info("web-04", &Params::new()).unwrap();
    assert_eq!(info.data["ATTRIBS"]["0"]["PRIMARY_ROLE"], "APP");

    collins
        .delete_asset_attribute("web-04", "primary_role")
        .unwrap();
    let info = collins.asset_info("web-04", &Params::new()).unwrap();
    assert!(info.data["ATTRIBS"]["0"].get("PRIMARY_ROLE").is_none());
}

#[test]
fn find_assets_with_repeated_attribute_filters() {
    let base_url = start_mock();
    let collins = client(&base_url);

    for (tag, role) in [("app-01", "APP"), ("app-02", "APP"), ("db-01", "DB")] {
        collins.create_asset(tag, &Params::new()).unwrap();
        collins.soft_update(tag, "primary_role", role).unwrap();
        collins
            .soft_update(tag, "hostname", &format!("{tag}.example.net"))
            .unwrap();
    }

    let mut params = Params::new();
    params.append_all("attribute", ["PRIMARY_ROLE;APP", "HOSTNAME;app-01.example.net"]);
    let found = collins.find_assets(&params).unwrap();
    let matches = found.data["Data"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["ASSET"]["TAG"], "app-01");
}

#[test]
fn asset_log_round_trip() {
    let base_url = start_mock();
    let collins = client(&base_url);
    collins.create_asset("web-05", &Params::new()).unwrap();

    collins
        .create_asset_log("web-05", "provisioned", Some(LogSeverity::Note))
        .unwrap();
    collins.create_asset_log("web-05", "allocated", None).unwrap();

    let logs = collins.asset_logs("web-05", &Params::new()).unwrap();
    let entries = logs.data["Data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["MESSAGE"], "provisioned");
    assert_eq!(entries[0]["TYPE"], "NOTE");
    assert_eq!(entries[1]["TYPE"], "INFORMATIONAL");
}

#[test]
fn prepared_requests_execute_like_direct_calls() {
    let base_url = start_mock();
    let collins = client(&base_url);
    collins.create_asset("web-06", &Params::new()).unwrap();

    // Build now, dispatch later: the deferred-update path.
    let mut params = Params::new();
    params.insert("attribute", "nodeclass;web");
    let request = collins.prepare_update_asset("web-06", &params).unwrap();
    let updated = collins.execute(request).unwrap();
    assert!(updated.is_success());

    let request = collins.prepare_find_assets(&Params::new()).unwrap();
    let found = collins.execute(request).unwrap();
    assert_eq!(found.data["Data"].as_array().unwrap().len(), 1);
}
