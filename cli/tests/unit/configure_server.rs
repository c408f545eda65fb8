//! Server configuration: keyring rotation and transport security.

use confab_cli::domain::error::{ConfigStep, ControllerError};
use confab_cli::domain::params::NodeRole;

use crate::fakes::{
    FakeClient, FakeClock, FakeRunner, Op, controller, joined, key, params,
};

#[tokio::test]
async fn rotation_touches_only_the_difference() {
    let (k1, k2, k3) = (key(1), key(2), key(3));
    let runner = FakeRunner::running(7);
    let client = FakeClient::with_members(&["a"])
        .with_keys(&[k1.clone(), k3.clone()])
        .with_primary(&k1);
    let clock = FakeClock::new();
    let mut p = params(NodeRole::Server, &["a"], 3);
    p.encryption_keys = vec![k1.clone(), k2.clone()];
    let ctl = controller(&runner, &client, &clock, p);

    let proof = joined(&ctl).await;
    ctl.configure_server(&proof).await.expect("configure");

    assert_eq!(client.installs(), vec![k2.clone()]);
    assert_eq!(client.removals(), vec![k3]);
    assert!(!client.installs().contains(&k1));
    assert!(!client.removals().contains(&k1));
    assert!(client.activations().is_empty());
    assert!(!client.calls().contains(&Op::UseKey));
    assert_eq!(client.keys(), [k1.clone(), k2].into_iter().collect());
    assert_eq!(client.primary(), Some(k1));
}

#[tokio::test]
async fn removed_primary_is_replaced_before_pruning() {
    let (old, new) = (key(1), key(2));
    let runner = FakeRunner::running(7);
    let client = FakeClient::with_members(&["a"]).with_primary(&old);
    let clock = FakeClock::new();
    let mut p = params(NodeRole::Server, &["a"], 0);
    p.encryption_keys = vec![new.clone()];
    let ctl = controller(&runner, &client, &clock, p);

    let proof = joined(&ctl).await;
    ctl.configure_server(&proof).await.expect("configure");

    assert_eq!(client.installs(), vec![new.clone()]);
    assert_eq!(client.activations(), vec![new.clone()]);
    assert_eq!(client.removals(), vec![old]);
    assert_eq!(client.primary(), Some(new.clone()));
    assert_eq!(client.keys(), [new].into_iter().collect());

    let calls = client.calls();
    let use_at = calls.iter().position(|op| *op == Op::UseKey).expect("use");
    let remove_at = calls.iter().position(|op| *op == Op::RemoveKey).expect("remove");
    assert!(use_at < remove_at, "{calls:?}");
}

#[tokio::test]
async fn nothing_to_prune_skips_primary_lookup() {
    let runner = FakeRunner::running(7);
    let client = FakeClient::with_members(&["a"]).with_primary(&key(1));
    let clock = FakeClock::new();
    let mut p = params(NodeRole::Server, &["a"], 0);
    p.encryption_keys = vec![key(1), key(2)];
    let ctl = controller(&runner, &client, &clock, p);

    let proof = joined(&ctl).await;
    ctl.configure_server(&proof).await.expect("configure");

    assert!(!client.calls().contains(&Op::ListPrimary));
    assert_eq!(client.primary(), Some(key(1)));
}

#[tokio::test]
async fn new_keys_are_installed_before_stale_ones_are_removed() {
    let runner = FakeRunner::running(7);
    let client = FakeClient::with_members(&["a"]).with_keys(&[key(9)]);
    let clock = FakeClock::new();
    let mut p = params(NodeRole::Server, &["a"], 0);
    p.encryption_keys = vec![key(1)];
    let ctl = controller(&runner, &client, &clock, p);

    let proof = joined(&ctl).await;
    ctl.configure_server(&proof).await.expect("configure");

    let calls = client.calls();
    let set_at = calls.iter().position(|op| *op == Op::SetKey).expect("set");
    let remove_at = calls.iter().position(|op| *op == Op::RemoveKey).expect("remove");
    assert!(set_at < remove_at, "{calls:?}");
    assert_eq!(calls.last(), Some(&Op::Transport));
}

#[tokio::test]
async fn no_keys_means_no_keyring_calls() {
    let runner = FakeRunner::running(7);
    let client = FakeClient::with_members(&["a"]).with_keys(&[key(1)]);
    let clock = FakeClock::new();
    let ctl = controller(&runner, &client, &clock, params(NodeRole::Server, &["a"], 3));

    let proof = joined(&ctl).await;
    ctl.configure_server(&proof).await.expect("configure");

    assert_eq!(client.calls(), vec![Op::Transport]);
    assert_eq!(client.transport(), Some(true));
}

#[tokio::test]
async fn disabled_transport_security_is_pushed() {
    let runner = FakeRunner::running(7);
    let client = FakeClient::with_members(&["a"]);
    let clock = FakeClock::new();
    let mut p = params(NodeRole::Server, &["a"], 3);
    p.transport_security_disabled = true;
    let ctl = controller(&runner, &client, &clock, p);

    let proof = joined(&ctl).await;
    ctl.configure_server(&proof).await.expect("configure");

    assert_eq!(client.transport_calls(), vec![false]);
}

#[tokio::test]
async fn transient_failures_are_retried_within_budget() {
    let runner = FakeRunner::running(7);
    let client = FakeClient::with_members(&["a"]).failing(Op::ListKeys, 2);
    let clock = FakeClock::new();
    let mut p = params(NodeRole::Server, &["a"], 3);
    p.encryption_keys = vec![key(1)];
    let ctl = controller(&runner, &client, &clock, p);

    let proof = joined(&ctl).await;
    ctl.configure_server(&proof).await.expect("configure");

    assert_eq!(client.installs(), vec![key(1)]);
    assert_eq!(clock.sleeps().len(), 2);
}

#[tokio::test]
async fn exhausted_install_step_aborts_remaining_steps() {
    let runner = FakeRunner::running(7);
    let client = FakeClient::with_members(&["a"]).failing(Op::SetKey, u32::MAX);
    let clock = FakeClock::new();
    let mut p = params(NodeRole::Server, &["a"], 2);
    p.encryption_keys = vec![key(1)];
    let ctl = controller(&runner, &client, &clock, p);

    let proof = joined(&ctl).await;
    let err = ctl.configure_server(&proof).await.expect_err("fails");

    match err {
        ControllerError::ServerConfigurationFailure {
            step,
            attempts,
            reason,
        } => {
            assert_eq!(step, ConfigStep::InstallKeys);
            assert_eq!(attempts, 3);
            assert!(reason.contains("installing encryption key"), "{reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!client.calls().contains(&Op::RemoveKey));
    assert!(client.transport().is_none());
}

#[tokio::test]
async fn failed_prune_keeps_installed_keys() {
    let runner = FakeRunner::running(7);
    let client = FakeClient::with_members(&["a"])
        .with_keys(&[key(3)])
        .failing(Op::RemoveKey, u32::MAX);
    let clock = FakeClock::new();
    let mut p = params(NodeRole::Server, &["a"], 1);
    p.encryption_keys = vec![key(2)];
    let ctl = controller(&runner, &client, &clock, p);

    let proof = joined(&ctl).await;
    let err = ctl.configure_server(&proof).await.expect_err("fails");

    assert!(matches!(
        err,
        ControllerError::ServerConfigurationFailure {
            step: ConfigStep::PruneKeys,
            ..
        }
    ));
    assert!(client.keys().contains(&key(2)));
    assert!(client.keys().contains(&key(3)));
    assert!(client.transport().is_none());
}

#[tokio::test]
async fn transport_security_failure_names_its_step() {
    let runner = FakeRunner::running(7);
    let client = FakeClient::with_members(&["a"]).failing(Op::Transport, u32::MAX);
    let clock = FakeClock::new();
    let ctl = controller(&runner, &client, &clock, params(NodeRole::Server, &["a"], 1));

    let proof = joined(&ctl).await;
    let err = ctl.configure_server(&proof).await.expect_err("fails");

    assert!(err.to_string().contains("set transport security"), "{err}");
    assert!(matches!(
        err,
        ControllerError::ServerConfigurationFailure {
            step: ConfigStep::TransportSecurity,
            attempts: 2,
            ..
        }
    ));
}

#[tokio::test]
async fn client_role_cannot_be_configured() {
    let runner = FakeRunner::running(7);
    let client = FakeClient::with_members(&["a"]);
    let clock = FakeClock::new();
    let ctl = controller(&runner, &client, &clock, params(NodeRole::Client, &["a"], 1));

    let proof = joined(&ctl).await;
    let err = ctl.configure_server(&proof).await.expect_err("fails");

    assert!(matches!(err, ControllerError::InvalidParameters(_)));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn repeated_configuration_is_a_no_op_for_keys() {
    let runner = FakeRunner::running(7);
    let client = FakeClient::with_members(&["a"]).with_keys(&[key(5)]);
    let clock = FakeClock::new();
    let mut p = params(NodeRole::Server, &["a"], 1);
    p.encryption_keys = vec![key(1), key(2)];
    let ctl = controller(&runner, &client, &clock, p);

    let proof = joined(&ctl).await;
    ctl.configure_server(&proof).await.expect("first");
    ctl.configure_server(&proof).await.expect("second");

    assert_eq!(client.installs(), vec![key(1), key(2)]);
    assert_eq!(client.removals(), vec![key(5)]);
}
