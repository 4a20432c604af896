use std::time::Duration;

use chrono::{TimeZone, Utc};
use mezwed::catalog::{Artist, Track};
use mezwed::config::PlaybackTimings;
use mezwed::player::simulated::{SdkBehaviour, SimulatedHost, TrackBehaviour};
use mezwed::player::{EmbedHost, PlaybackController, PlayerPhase, SessionDriver, UserCommand};
use tokio::time::Instant;

fn artist() -> Artist {
    Artist {
        name: "Lotfi Jormana".into(),
        description: "Modern Mezwed performer".into(),
        image: String::new(),
        songs: ["sahra", "zina", "hawa"]
            .iter()
            .map(|id| Track {
                title: id.to_string(),
                youtube_id: id.to_string(),
                url: format!("https://www.youtube.com/watch?v={id}"),
                thumbnail: None,
                channel_title: "Jormana".into(),
                published_at: Utc.with_ymd_and_hms(2021, 12, 1, 21, 45, 0).unwrap(),
                duration: None,
                view_count: None,
            })
            .collect(),
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_track_is_skipped_by_the_second_watchdog() {
    let (host, signals) = SimulatedHost::new(SdkBehaviour::Loads);
    let host = host.behaviour("sahra", TrackBehaviour::StuckBuffering);
    let controller = PlaybackController::new(artist(), host, PlaybackTimings::default(), 50).unwrap();
    let (driver, _commands) = SessionDriver::new(controller, signals);

    let controller = driver
        .run(Some(Instant::now() + Duration::from_secs(11)))
        .await;

    assert_eq!(controller.session().track_index, 1);
    assert_eq!(controller.host().constructed_videos(), ["sahra", "zina"]);
}

#[tokio::test(start_paused = true)]
async fn healthy_tracks_play_through_the_playlist() {
    let (host, signals) = SimulatedHost::new(SdkBehaviour::Loads);
    let host = host.default_behaviour(TrackBehaviour::Healthy { length: 2.0 });
    let controller = PlaybackController::new(artist(), host, PlaybackTimings::default(), 50).unwrap();
    let (driver, _commands) = SessionDriver::new(controller, signals);

    let controller = driver
        .run(Some(Instant::now() + Duration::from_secs(7)))
        .await;

    assert!(controller.host().constructed_videos().len() >= 3);
    assert!(controller.session().track_index < 3);
}

#[tokio::test(start_paused = true)]
async fn silent_runtime_still_accepts_track_selection() {
    let (host, signals) = SimulatedHost::new(SdkBehaviour::Silent);
    let controller = PlaybackController::new(artist(), host, PlaybackTimings::default(), 50).unwrap();
    let (driver, commands) = SessionDriver::new(controller, signals);
    commands.send(UserCommand::SelectTrack(1)).unwrap();

    let controller = driver
        .run(Some(Instant::now() + Duration::from_secs(6)))
        .await;

    assert_eq!(controller.session().track_index, 1);
    assert!(controller.host().constructed_videos().is_empty());
    // A runtime that was requested but never answered is not retried
    assert_eq!(controller.host().sdk_requests(), 1);
}

#[tokio::test(start_paused = true)]
async fn user_commands_are_applied_in_order() {
    let (host, signals) = SimulatedHost::new(SdkBehaviour::Loads);
    let controller = PlaybackController::new(artist(), host, PlaybackTimings::default(), 50).unwrap();
    let (driver, commands) = SessionDriver::new(controller, signals);
    commands.send(UserCommand::SetVolume(30)).unwrap();
    commands.send(UserCommand::SelectTrack(2)).unwrap();
    commands.send(UserCommand::Stop).unwrap();

    let controller = driver.run(None).await;

    assert_eq!(controller.session().track_index, 2);
    assert_eq!(controller.session().volume, 30);
    assert_eq!(
        controller.host().constructed_videos().last().map(String::as_str),
        Some("hawa")
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_every_sender_ends_the_session() {
    let (host, signals) = SimulatedHost::new(SdkBehaviour::Present);
    let controller = PlaybackController::new(artist(), host, PlaybackTimings::default(), 50).unwrap();
    let hook = controller.host().ready_hook().clone();
    let (driver, commands) = SessionDriver::new(controller, signals);
    drop(commands);

    let controller = driver.run(None).await;
    assert_eq!(controller.phase(), PlayerPhase::Uninitialized);
    assert!(!hook.is_claimed());
}
