//! Supervision d'une session de lecture.
//!
//! Une session: installer l'URI, lancer la lecture, puis surveiller le
//! device par polling jusqu'à ce que l'opérateur annule ou que le
//! device signale la fin de piste. Toutes les actions de contrôle
//! partent du thread appelant, jamais en concurrence.
//!
//! L'annulation arrive par un canal crossbeam: un seul message suffit,
//! et un canal fermé vaut annulation (le watcher stdin est parti).

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use tracing::{debug, warn};

use crate::capabilities::{PlaybackMonitor, PlaybackState, TransportControl};
use crate::errors::ControlError;
use crate::model::PositionSnapshot;

/// Issue d'une session qui s'est terminée proprement.
///
/// Les échecs (device injoignable, URI refusée...) ne sont pas des
/// issues: ils remontent en [`ControlError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Arrêt demandé par l'opérateur; un Stop a été envoyé au device
    Stopped,
    /// Le device a lu la piste jusqu'au bout et s'est arrêté seul
    Ended,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Intervalle entre deux polls d'état
    pub poll_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1500),
        }
    }
}

/// Joue `media_uri` sur le transport et supervise jusqu'au dénouement.
///
/// Déroulement:
/// 1. SetAVTransportURI puis Play. Un refus remonte tel quel, sans
///    tentative de Stop: rien n'a démarré.
/// 2. Boucle de surveillance: attendre l'annulation pendant
///    `poll_interval`, puis prendre un snapshot position + état et le
///    passer à `on_poll`.
///
/// Règles de sortie:
/// - Annulation (message ou canal fermé) -> Stop best-effort, issue
///   [`SessionOutcome::Stopped`]. Plus aucun poll après l'annulation,
///   et un snapshot en vol au moment de l'annulation est jeté.
/// - Device passé à STOPPED ou NO_MEDIA_PRESENT après avoir été vu en
///   lecture -> [`SessionOutcome::Ended`], sans Stop. Un STOPPED vu
///   avant toute lecture est un état transitoire de démarrage.
/// - Si l'annulation et la fin de piste tombent sur le même poll,
///   l'annulation gagne.
///
/// Un poll qui échoue est loggé et sauté; le device garde sa chance au
/// cycle suivant, et l'opérateur garde la main via l'annulation.
pub fn run_session<T, F>(
    transport: &T,
    media_uri: &str,
    cancel: &Receiver<()>,
    options: &SessionOptions,
    mut on_poll: F,
) -> Result<SessionOutcome, ControlError>
where
    T: TransportControl + PlaybackMonitor,
    F: FnMut(&PositionSnapshot),
{
    transport.set_uri(media_uri, "")?;
    transport.play()?;
    debug!("▶️ Session started: {}", media_uri);

    let mut saw_playing = false;

    loop {
        match cancel.recv_timeout(options.poll_interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                return finish_stopped(transport);
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        let snapshot = match transport.position_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Status poll failed (keeping the session alive): {}", e);
                continue;
            }
        };

        // Annulation arrivée pendant le poll en vol: l'opérateur gagne,
        // le snapshot est jeté
        match cancel.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => {
                return finish_stopped(transport);
            }
            Err(TryRecvError::Empty) => {}
        }

        match snapshot.state {
            PlaybackState::Playing => {
                saw_playing = true;
            }
            PlaybackState::Stopped | PlaybackState::NoMedia if saw_playing => {
                debug!("Device reports end of track");
                return Ok(SessionOutcome::Ended);
            }
            _ => {}
        }

        on_poll(&snapshot);
    }
}

/// Stop best-effort puis issue Stopped: à ce stade la session est finie
/// quoi que réponde le device.
fn finish_stopped(transport: &impl TransportControl) -> Result<SessionOutcome, ControlError> {
    if let Err(e) = transport.stop() {
        warn!("Best-effort Stop failed: {}", e);
    }
    Ok(SessionOutcome::Stopped)
}
