#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use pathwarden_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
gateway:
  listen: "0.0.0.0:8000"
authz:
  client_headr: "x-forwarded-sub" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.class().as_str(), "CONFIG_FATAL");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.listen, "0.0.0.0:8000");
    assert_eq!(cfg.gateway.ops_listen, "0.0.0.0:9090");
    assert_eq!(cfg.gateway.grpc_listen, "0.0.0.0:9000");
    assert_eq!(cfg.authz.client_header, "x-forwarded-sub");
    assert_eq!(cfg.authz.host_header, "x-forwarded-host");
    assert_eq!(cfg.authz.clients_dir, "/var/run/pathwarden/clients");
}

#[test]
fn rejects_unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert!(err.to_string().contains("version"));
}

#[test]
fn rejects_bad_listen_addresses() {
    let bad = r#"
version: 1
gateway:
  listen: "localhost"
"#;
    assert!(config::load_from_str(bad).is_err());

    let same = r#"
version: 1
gateway:
  listen: "127.0.0.1:8000"
  ops_listen: "127.0.0.1:8000"
"#;
    let err = config::load_from_str(same).expect_err("must fail");
    assert!(err.to_string().contains("must differ"));

    let grpc_clash = r#"
version: 1
gateway:
  grpc_listen: "0.0.0.0:8000"
"#;
    assert!(config::load_from_str(grpc_clash).is_err());
}

#[test]
fn rejects_invalid_header_names() {
    for header in ["\"\"", "X-Forwarded-Sub", "\"bad header\""] {
        let doc = format!("version: 1\nauthz:\n  client_header: {header}\n");
        assert!(config::load_from_str(&doc).is_err(), "{header}");
    }
}
