use outreach_logging::{outreach_debug, outreach_info};

use crate::{lookup_query, AppState, Effect, Msg, RecordOutcome, SessionKey, SessionPhase};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::QueryChanged { side, query } => {
            if state.selector(side).selected.is_some() {
                return (state, Vec::new());
            }
            let min_len = state.min_query_len();
            let lookup = lookup_query(&query, min_len).map(ToOwned::to_owned);
            let selector = state.selector_mut(side);
            selector.query = query;
            let effect = match lookup {
                Some(query) => Effect::Lookup { side, query },
                None => {
                    selector.results.clear();
                    Effect::CancelLookup { side }
                }
            };
            state.mark_dirty();
            vec![effect]
        }
        Msg::LookupCompleted {
            side,
            query,
            companies,
        } => {
            let selector = state.selector_mut(side);
            // Results for anything but the current query are stale.
            if selector.selected.is_none() && selector.query.trim() == query {
                selector.results = companies;
                state.mark_dirty();
            } else {
                outreach_debug!("Dropping stale lookup results for {query:?}");
            }
            Vec::new()
        }
        Msg::CompanySelected { side, company } => {
            let selector = state.selector_mut(side);
            selector.selected = Some(company);
            selector.query.clear();
            selector.results.clear();
            state.mark_dirty();
            vec![Effect::CancelLookup { side }]
        }
        Msg::SelectionCleared { side } => {
            if state.selector(side).selected.is_none() {
                return (state, Vec::new());
            }
            state.selector_mut(side).selected = None;
            state.mark_dirty();
            close_live_session(&mut state)
        }
        Msg::StartClicked => start_session(&mut state),
        Msg::CancelClicked => close_live_session(&mut state),
        Msg::StageCompleted {
            session_id,
            stage,
            result,
        } => {
            if state.live_session().map(|s| s.id) != Some(session_id) {
                outreach_debug!("Ignoring {stage} for inactive session {session_id}");
                return (state, Vec::new());
            }
            let outcome = state.apply_stage(stage, result);
            if stage.is_terminal() && outcome == RecordOutcome::Recorded {
                state.set_phase(SessionPhase::Complete);
            }
            Vec::new()
        }
        Msg::StreamFailed {
            session_id,
            message,
        } => {
            if state.live_session().map(|s| s.id) == Some(session_id) {
                state.set_phase(SessionPhase::Failed { message });
            }
            Vec::new()
        }
        Msg::StreamFinished { session_id } => {
            if state.live_session().map(|s| s.id) == Some(session_id) {
                state.set_phase(SessionPhase::Complete);
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start_session(state: &mut AppState) -> Vec<Effect> {
    let Some((source, target)) = state.selected_domains() else {
        return Vec::new();
    };
    let live = state.live_session().map(|s| (s.id, s.key.clone()));
    let key = match SessionKey::new(source, target) {
        Ok(key) => key,
        Err(err) => {
            state.set_phase(SessionPhase::Failed {
                message: err.to_string(),
            });
            // A rejected restart still ends whatever was streaming.
            return live
                .map(|(session_id, _)| vec![Effect::CloseSession { session_id }])
                .unwrap_or_default();
        }
    };

    let mut effects = Vec::with_capacity(2);
    if let Some((live_id, live_key)) = live {
        if live_key == key {
            return Vec::new();
        }
        // Old connection goes away before the new one is requested.
        effects.push(Effect::CloseSession {
            session_id: live_id,
        });
    }
    let session_id = state.begin_session(key.clone());
    outreach_info!("Starting session {session_id} for {key}");
    effects.push(Effect::OpenSession { session_id, key });
    effects
}

fn close_live_session(state: &mut AppState) -> Vec<Effect> {
    match state.live_session().map(|s| s.id) {
        Some(session_id) => {
            state.set_phase(SessionPhase::Cancelled);
            vec![Effect::CloseSession { session_id }]
        }
        None => Vec::new(),
    }
}
