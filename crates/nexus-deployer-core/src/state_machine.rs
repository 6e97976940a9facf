use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployPhase {
    #[default]
    Idle,
    Validating,
    /// Inputs coerced; estimate and submit are available.
    Ready,
    Estimating,
    AwaitingWalletApproval,
    PendingConfirmation,
    Succeeded,
    Failed,
}

impl DeployPhase {
    /// Phases in which the triggering control must stay disabled.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Self::Validating
                | Self::Estimating
                | Self::AwaitingWalletApproval
                | Self::PendingConfirmation
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployAction {
    Validate,
    InputRejected,
    InputAccepted,
    Estimate,
    EstimateSettled,
    Submit,
    WalletApproved,
    WalletRejected,
    Confirmed,
    ConfirmationFailed,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: DeployPhase,
    pub to: DeployPhase,
    pub action: DeployAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal deploy transition: {from:?} --{action:?}-->")]
pub struct TransitionError {
    pub from: DeployPhase,
    pub action: DeployAction,
}

pub fn deploy_transition(
    from: DeployPhase,
    action: DeployAction,
) -> Result<(DeployPhase, StateTransition), TransitionError> {
    use DeployAction as A;
    use DeployPhase as S;

    let to = match (from, action) {
        (S::Idle | S::Ready | S::Failed, A::Validate) => S::Validating,
        (S::Validating, A::InputRejected) => S::Idle,
        (S::Validating, A::InputAccepted) => S::Ready,
        (S::Ready, A::Estimate) => S::Estimating,
        (S::Estimating, A::EstimateSettled) => S::Ready,
        (S::Ready, A::Submit) => S::AwaitingWalletApproval,
        (S::AwaitingWalletApproval, A::WalletApproved) => S::PendingConfirmation,
        (S::AwaitingWalletApproval, A::WalletRejected) => S::Failed,
        (S::PendingConfirmation, A::Confirmed) => S::Succeeded,
        (S::PendingConfirmation, A::ConfirmationFailed) => S::Failed,
        (S::Idle | S::Ready | S::Succeeded | S::Failed, A::Reset) => S::Idle,
        _ => return Err(TransitionError { from, action }),
    };
    Ok((to, StateTransition { from, to, action }))
}
