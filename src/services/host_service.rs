//! Host console operations: round commands, settings, team management, the
//! photo deck and the fade-in controls.

use std::time::Duration;

use tracing::info;

use crate::{
    dto::host::{
        ActionResponse, DeckResponse, FadeSettingsRequest, FadeStatus, HostStateResponse,
        PhotoSummary, SettingsRequest, SettingsResponse, TeamEntry,
    },
    error::ServiceError,
    photo::{NetpbmDecoder, PhotoDeck},
    services::{
        coordination::CoordinationStore, display::DisplaySurface,
        reveal_service::spawn_fade_ticker,
    },
    state::{
        SharedState,
        host::{HostSession, RevealSettings},
        reveal::shuffled_order,
        round::{RoundState, RoundUpdate},
        state_machine::{HostCommand, HostPhase, plan},
    },
};

const NO_PHOTOS: &str = "no photos loaded; add photos and reload the deck";
const NO_PHOTO_SELECTED: &str = "waiting for the host to pick a photo";

/// Snapshot of everything the host console shows.
pub async fn host_state(state: &SharedState) -> Result<HostStateResponse, ServiceError> {
    let store = state.coordination().await?;
    let round = store.read().await;
    let host = state.host().lock().await;

    let photo = host.current_photo().zip(host.cursor()).map(|(photo, index)| {
        let pixels = photo.pixels();
        PhotoSummary {
            index,
            name: photo.name().to_string(),
            width: pixels.width(),
            height: pixels.height(),
        }
    });

    Ok(HostStateResponse {
        phase: phase_of(&round, &host).into(),
        subject: round.subject.clone(),
        photo,
        photo_count: host.deck().len(),
        winner: round.winner.clone(),
        revealed: round.revealed.len(),
        total_cells: round.order.len(),
        teams: team_entries(&round),
        paused: host.is_paused(),
        settings: host.settings().into(),
        fade: host.fade().into(),
    })
}

/// Start (or restart) the round for the selected photo with a fresh order.
pub async fn start_round(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    let store = state.coordination().await?;
    let mut host = state.host().lock().await;
    if let Some(waiting) = require_photo(&host) {
        return Ok(waiting);
    }

    let order = shuffled_order(host.settings().grid_size, &mut rand::rng());
    host.set_paused(false);
    host.abort_reveal();
    host.fade_mut().stop();
    let round = apply(&store, &host, HostCommand::Start { order }).await?.round;
    let phase = phase_of(&round, &host);
    drop(host);

    state.wake_host();
    Ok(ActionResponse::applied("round started", phase))
}

/// Uncover the whole photo.
pub async fn reveal_all(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    let store = state.coordination().await?;
    let mut host = state.host().lock().await;
    if let Some(waiting) = require_photo(&host) {
        return Ok(waiting);
    }

    host.abort_reveal();
    let round = apply(&store, &host, HostCommand::RevealAll).await?.round;
    let phase = phase_of(&round, &host);
    drop(host);

    state.wake_host();
    Ok(ActionResponse::applied("photo revealed", phase))
}

/// Reject the answering team for this photo and resume the reveal.
pub async fn exclude_and_continue(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    let store = state.coordination().await?;
    let host = state.host().lock().await;
    if let Some(waiting) = require_photo(&host) {
        return Ok(waiting);
    }

    let applied = apply(&store, &host, HostCommand::ExcludeAndContinue).await?;
    let phase = phase_of(&applied.round, &host);
    drop(host);

    state.wake_host();
    let message = match applied.prior_winner {
        Some(team) => format!("{team} excluded; reveal continues"),
        None => "reveal continues".to_string(),
    };
    Ok(ActionResponse::applied(message, phase))
}

/// Hold the grid reveal, or resume it at the next cell of the order.
pub async fn pause_reveal(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    let store = state.coordination().await?;
    let round = store.read().await;
    let mut host = state.host().lock().await;
    if let Some(waiting) = require_photo(&host) {
        return Ok(waiting);
    }

    let paused = host.toggle_reveal_pause();
    let phase = phase_of(&round, &host);
    drop(host);

    info!(paused, "reveal pause toggled");
    state.wake_host();
    let message = if paused { "reveal paused" } else { "reveal resumed" };
    Ok(ActionResponse::applied(message, phase))
}

/// Abandon the round and go back to the start screen for the same photo.
pub async fn stop_round(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    let store = state.coordination().await?;
    let mut host = state.host().lock().await;
    if let Some(waiting) = require_photo(&host) {
        return Ok(waiting);
    }

    host.set_paused(false);
    host.abort_reveal();
    host.fade_mut().stop();
    let round = apply(&store, &host, HostCommand::Stop).await?.round;
    let phase = phase_of(&round, &host);
    drop(host);

    state.wake_host();
    Ok(ActionResponse::applied("round stopped", phase))
}

/// Clear the round and move to the next photo, wrapping at the end of the deck.
pub async fn next_photo(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    let store = state.coordination().await?;
    let mut host = state.host().lock().await;
    if host.deck().is_empty() {
        return Ok(ActionResponse::waiting(NO_PHOTOS, HostPhase::Idle));
    }

    host.set_paused(false);
    host.abort_reveal();
    host.fade_mut().stop();
    let round = apply(&store, &host, HostCommand::NextPhoto).await?.round;
    let index = host.advance_cursor().unwrap_or_default();
    let name = host
        .current_photo()
        .map(|photo| photo.name().to_string())
        .unwrap_or_default();
    let total = host.deck().len();
    let phase = phase_of(&round, &host);
    drop(host);

    info!(photo = %name, index, "next photo");
    state.wake_host();
    Ok(ActionResponse::applied(
        format!("photo {} of {total}: {name}", index + 1),
        phase,
    ))
}

/// Reset the whole document, team registry included, and drop the photo
/// selection.
pub async fn full_reset(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    let store = state.coordination().await?;
    let mut host = state.host().lock().await;

    host.set_paused(false);
    host.abort_reveal();
    host.fade_mut().stop();
    store.overwrite(RoundState::default()).await?;
    host.clear_selection();
    drop(host);

    info!("game reset");
    state.wake_host();
    Ok(ActionResponse::applied("game reset", HostPhase::Idle))
}

/// Change the category label shown to every participant.
pub async fn set_subject(
    state: &SharedState,
    subject: &str,
) -> Result<ActionResponse, ServiceError> {
    let store = state.coordination().await?;
    let subject = subject.trim().to_string();
    let round = store.try_write(RoundUpdate::new().subject(subject)).await?;
    let host = state.host().lock().await;
    Ok(ActionResponse::applied("subject updated", phase_of(&round, &host)))
}

/// Registered teams with their exclusion flag.
pub async fn list_teams(state: &SharedState) -> Result<Vec<TeamEntry>, ServiceError> {
    let store = state.coordination().await?;
    Ok(team_entries(&store.read().await))
}

/// Drop `name` from the registry. The team's client registers again on its
/// next poll.
pub async fn remove_team(state: &SharedState, name: &str) -> Result<Vec<TeamEntry>, ServiceError> {
    let store = state.coordination().await?;
    let round = store
        .try_modify(|round| {
            if !round.is_registered(name) {
                return Err(ServiceError::NotFound(format!("team `{name}`")));
            }
            let remaining = round
                .connected_teams
                .iter()
                .filter(|team| team.as_str() != name)
                .cloned()
                .collect();
            Ok(RoundUpdate::new().replace_teams(remaining).applied_to(round))
        })
        .await?;

    info!(team = %name, "team removed");
    Ok(team_entries(&round))
}

/// Update the grid size and/or the reveal delay.
pub async fn update_settings(
    state: &SharedState,
    request: SettingsRequest,
) -> Result<SettingsResponse, ServiceError> {
    let mut host = state.host().lock().await;
    let current = host.settings();
    let grid_size = request.grid_size.unwrap_or(current.grid_size);
    let reveal_delay = match request.reveal_delay_secs {
        Some(secs) => Duration::try_from_secs_f64(secs)
            .map_err(|err| ServiceError::InvalidInput(format!("reveal delay: {err}")))?,
        None => current.reveal_delay,
    };

    let settings = RevealSettings::clamped(grid_size, reveal_delay);
    host.set_settings(settings);
    info!(
        grid_size = settings.grid_size,
        delay_ms = settings.reveal_delay.as_millis() as u64,
        "reveal settings updated"
    );
    Ok(settings.into())
}

/// Load the photo deck again from the configured directory.
pub async fn reload_photos(state: &SharedState) -> Result<DeckResponse, ServiceError> {
    let dir = &state.config().photos_dir;
    let deck = PhotoDeck::load_dir(dir, &NetpbmDecoder)
        .await
        .map_err(|err| {
            ServiceError::Internal(format!("cannot read `{}`: {err}", dir.display()))
        })?;

    let photos = deck.names();
    let mut host = state.host().lock().await;
    host.replace_deck(deck);
    if !host.photo_selected() {
        host.abort_reveal();
        host.fade_mut().stop();
    }
    drop(host);

    state.wake_host();
    Ok(DeckResponse { photos })
}

/// Restart the fade-in from a blank canvas.
pub async fn fade_start(state: &SharedState) -> Result<FadeStatus, ServiceError> {
    let mut host = state.host().lock().await;
    if !host.photo_selected() {
        return Err(ServiceError::InvalidState(NO_PHOTO_SELECTED.into()));
    }

    host.abort_reveal();
    host.fade_mut().start();
    ensure_fade_ticker(state, &mut host);
    Ok(host.fade().into())
}

/// Pause a playing fade or resume a paused one.
pub async fn fade_pause(state: &SharedState) -> Result<FadeStatus, ServiceError> {
    let mut host = state.host().lock().await;
    if host.fade_mut().toggle_pause() {
        ensure_fade_ticker(state, &mut host);
    }
    Ok(host.fade().into())
}

/// Stop the fade and hand the display back to the grid reveal.
pub async fn fade_stop(state: &SharedState) -> Result<FadeStatus, ServiceError> {
    let mut host = state.host().lock().await;
    host.fade_mut().stop();
    let status = host.fade().into();
    drop(host);

    state.wake_host();
    Ok(status)
}

/// Change the fade step and/or background.
pub async fn update_fade_settings(
    state: &SharedState,
    request: FadeSettingsRequest,
) -> Result<FadeStatus, ServiceError> {
    let mut host = state.host().lock().await;
    let fade = host.fade_mut();
    if let Some(step) = request.step {
        fade.set_step(step);
    }
    if let Some(background) = request.background {
        fade.set_background(background.into());
    }

    // repaint a paused fade so the new background shows right away
    if !fade.is_playing() && fade.is_engaged() {
        if let Some(photo) = host.current_pixels() {
            state.display().present(host.fade().frame(&photo));
        }
    }
    Ok(host.fade().into())
}

fn ensure_fade_ticker(state: &SharedState, host: &mut HostSession) {
    if !host.fade().ticker_running() {
        host.fade_mut().set_ticker(spawn_fade_ticker(state.clone()));
    }
}

fn require_photo(host: &HostSession) -> Option<ActionResponse> {
    if host.deck().is_empty() {
        Some(ActionResponse::waiting(NO_PHOTOS, HostPhase::Idle))
    } else if !host.photo_selected() {
        Some(ActionResponse::waiting(NO_PHOTO_SELECTED, HostPhase::Idle))
    } else {
        None
    }
}

/// Round document after a host command, with the team that held the buzz
/// lock when the command was applied.
struct Applied {
    round: RoundState,
    prior_winner: Option<String>,
}

async fn apply(
    store: &CoordinationStore,
    host: &HostSession,
    command: HostCommand,
) -> Result<Applied, ServiceError> {
    let name = command.name();
    let photo_selected = host.photo_selected();
    let mut prior_winner = None;
    let round = store
        .try_modify(|round| {
            prior_winner = round.winner.clone();
            plan(round, photo_selected, command).map_err(ServiceError::from)
        })
        .await?;
    info!(
        command = name,
        phase = HostPhase::derive(&round, photo_selected).as_str(),
        "host command applied"
    );
    Ok(Applied {
        round,
        prior_winner,
    })
}

fn phase_of(round: &RoundState, host: &HostSession) -> HostPhase {
    HostPhase::derive(round, host.photo_selected())
}

fn team_entries(round: &RoundState) -> Vec<TeamEntry> {
    round
        .connected_teams
        .iter()
        .map(|name| TeamEntry {
            name: name.clone(),
            excluded: round.is_excluded(name),
        })
        .collect()
}
