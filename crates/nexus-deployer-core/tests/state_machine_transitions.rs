use nexus_deployer_core::state_machine::deploy_transition;
use nexus_deployer_core::{DeployAction, DeployPhase};

#[test]
fn deploy_happy_path_transitions() {
    let (s1, _) = deploy_transition(DeployPhase::Idle, DeployAction::Validate).expect("idle -> validate");
    assert_eq!(s1, DeployPhase::Validating);
    let (s2, _) = deploy_transition(s1, DeployAction::InputAccepted).expect("validating -> ready");
    assert_eq!(s2, DeployPhase::Ready);
    let (s3, _) = deploy_transition(s2, DeployAction::Estimate).expect("ready -> estimating");
    assert_eq!(s3, DeployPhase::Estimating);
    let (s4, _) = deploy_transition(s3, DeployAction::EstimateSettled).expect("estimating -> ready");
    assert_eq!(s4, DeployPhase::Ready);
    let (s5, _) = deploy_transition(s4, DeployAction::Submit).expect("ready -> awaiting approval");
    assert_eq!(s5, DeployPhase::AwaitingWalletApproval);
    let (s6, _) = deploy_transition(s5, DeployAction::WalletApproved).expect("approved -> pending");
    assert_eq!(s6, DeployPhase::PendingConfirmation);
    let (s7, t) = deploy_transition(s6, DeployAction::Confirmed).expect("pending -> succeeded");
    assert_eq!(s7, DeployPhase::Succeeded);
    assert_eq!(t.from, DeployPhase::PendingConfirmation);
    assert_eq!(t.action, DeployAction::Confirmed);
}

#[test]
fn rejected_input_returns_to_idle() {
    let (s, _) = deploy_transition(DeployPhase::Validating, DeployAction::InputRejected)
        .expect("validating -> idle");
    assert_eq!(s, DeployPhase::Idle);
}

#[test]
fn wallet_rejection_and_revert_both_fail() {
    let (s, _) = deploy_transition(
        DeployPhase::AwaitingWalletApproval,
        DeployAction::WalletRejected,
    )
    .expect("awaiting -> failed");
    assert_eq!(s, DeployPhase::Failed);
    let (s, _) = deploy_transition(
        DeployPhase::PendingConfirmation,
        DeployAction::ConfirmationFailed,
    )
    .expect("pending -> failed");
    assert_eq!(s, DeployPhase::Failed);
}

#[test]
fn submit_while_in_flight_is_rejected() {
    for phase in [
        DeployPhase::Validating,
        DeployPhase::Estimating,
        DeployPhase::AwaitingWalletApproval,
        DeployPhase::PendingConfirmation,
    ] {
        assert!(phase.is_in_flight());
        let err = deploy_transition(phase, DeployAction::Submit).expect_err("must fail");
        assert!(err.to_string().contains("illegal deploy transition"));
        assert!(deploy_transition(phase, DeployAction::Reset).is_err());
    }
}

#[test]
fn reset_from_settled_phases_returns_to_idle() {
    for phase in [
        DeployPhase::Idle,
        DeployPhase::Ready,
        DeployPhase::Succeeded,
        DeployPhase::Failed,
    ] {
        let (s, _) = deploy_transition(phase, DeployAction::Reset).expect("reset");
        assert_eq!(s, DeployPhase::Idle);
    }
}

#[test]
fn succeeded_requires_reset_before_revalidating() {
    assert!(deploy_transition(DeployPhase::Succeeded, DeployAction::Validate).is_err());
    let (s, _) =
        deploy_transition(DeployPhase::Failed, DeployAction::Validate).expect("retry after failure");
    assert_eq!(s, DeployPhase::Validating);
}
