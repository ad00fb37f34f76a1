use super::*;

#[test]
fn terminal_statuses() {
    assert!(!DeploymentStatus::Processing.is_terminal());
    assert!(DeploymentStatus::Completed.is_terminal());
    assert!(DeploymentStatus::Error.is_terminal());
}

#[test]
fn tenant_id_displays_raw_value() {
    assert_eq!(TenantId("tenant3".into()).to_string(), "tenant3");
}
