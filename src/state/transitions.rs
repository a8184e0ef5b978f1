use std::future::Future;

use crate::{
    error::ServiceError,
    state::{
        SharedState,
        catalog,
        events::CompetitionNotification,
        sequencer::{CompetitionPhase, SequencerEvent},
    },
};

/// Execute a planned sequencer transition, then notify observers of the
/// lifecycle change it caused.
pub async fn run_transition_with_broadcast<F, Fut, T>(
    state: &SharedState,
    event: SequencerEvent,
    work: F,
) -> Result<(T, CompetitionPhase), ServiceError>
where
    F: FnOnce(crate::state::competition::CompetitionState) -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let (res, next) = state.run_transition(event, work).await?;
    if let Some(notification) = lifecycle_notification(state, event, next).await {
        state.publish(&notification);
    }
    Ok((res, next))
}

async fn lifecycle_notification(
    state: &SharedState,
    event: SequencerEvent,
    next: CompetitionPhase,
) -> Option<CompetitionNotification> {
    match (event, next) {
        (SequencerEvent::Start, CompetitionPhase::Running(_)) => {
            let teams = state
                .read_competition(|competition| competition.roster().teams().to_vec())
                .await;
            Some(CompetitionNotification::CompetitionStarted {
                teams,
                total_games: catalog::total_games(),
            })
        }
        (SequencerEvent::Advance, CompetitionPhase::Finished) => {
            Some(CompetitionNotification::CompetitionFinished {
                total_games: catalog::total_games(),
            })
        }
        _ => None,
    }
}
