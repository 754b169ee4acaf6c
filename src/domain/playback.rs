//! Authoritative playback state machine, one per room.
//!
//! States: `Stopped` (no track loaded), `Playing`, `Paused`. All transitions
//! are pure functions of the current state plus a caller-supplied timestamp,
//! which keeps the machine trivially testable; the session actor owns the
//! clock.
//!
//! Two invariants hold at all times:
//! - `sync_timestamp` is monotonically non-decreasing across transitions.
//! - While paused or stopped, `position_seconds` is frozen; while playing,
//!   the effective position observed by a client is
//!   `position_seconds + elapsed-since(sync_timestamp)`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::timestamp::Timestamp;

/// Track descriptor as shared across the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    /// External catalog ids, keyed by provider name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub external_ids: BTreeMap<String, String>,
}

impl Track {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            external_ids: BTreeMap::new(),
        }
    }
}

/// Discrete playback states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

/// Guard failures. Reported to the issuing connection; never broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("no song is currently playing")]
    NotPlaying,

    #[error("playback is not paused")]
    NotPaused,

    #[error("no track is loaded")]
    NoTrackLoaded,
}

/// Per-room authoritative playback state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    status: PlaybackStatus,
    track: Option<Track>,
    position_seconds: f64,
    sync_timestamp: Timestamp,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackState {
    /// Initial state: `Stopped`, position 0.
    pub fn new() -> Self {
        Self {
            status: PlaybackStatus::Stopped,
            track: None,
            position_seconds: 0.0,
            sync_timestamp: Timestamp::ZERO,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn position_seconds(&self) -> f64 {
        self.position_seconds
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn sync_timestamp(&self) -> Timestamp {
        self.sync_timestamp
    }

    /// Start playing `track` from `position`. Valid from any state.
    pub fn play(&mut self, track: Track, position: f64, now: Timestamp) {
        self.status = PlaybackStatus::Playing;
        self.track = Some(track);
        self.position_seconds = position;
        self.stamp(now);
    }

    /// Pause at the client-reported `position`. Only valid while playing.
    pub fn pause(&mut self, position: f64, now: Timestamp) -> Result<(), PlaybackError> {
        if self.status != PlaybackStatus::Playing {
            return Err(PlaybackError::NotPlaying);
        }
        self.status = PlaybackStatus::Paused;
        self.position_seconds = position;
        self.stamp(now);
        Ok(())
    }

    /// Resume from the frozen position. Only valid while paused.
    pub fn resume(&mut self, now: Timestamp) -> Result<(), PlaybackError> {
        if self.status != PlaybackStatus::Paused {
            return Err(PlaybackError::NotPaused);
        }
        self.status = PlaybackStatus::Playing;
        self.stamp(now);
        Ok(())
    }

    /// Jump to `position` without changing the playing/paused state.
    /// Requires a loaded track.
    pub fn seek(&mut self, position: f64, now: Timestamp) -> Result<(), PlaybackError> {
        if self.track.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        self.position_seconds = position;
        self.stamp(now);
        Ok(())
    }

    /// Record a client-reported position while playing. Not a state
    /// transition; exists so the server's recorded position tracks client
    /// drift between authoritative updates.
    pub fn sync_position(&mut self, position: f64, now: Timestamp) -> Result<(), PlaybackError> {
        if self.status != PlaybackStatus::Playing {
            return Err(PlaybackError::NotPlaying);
        }
        self.position_seconds = position;
        self.stamp(now);
        Ok(())
    }

    /// Position a client should observe at `now`: the recorded position plus
    /// elapsed wall time while playing, the frozen position otherwise.
    pub fn effective_position(&self, now: Timestamp) -> f64 {
        if self.is_playing() {
            self.position_seconds + self.sync_timestamp.elapsed_seconds_until(now)
        } else {
            self.position_seconds
        }
    }

    // sync_timestamp never moves backwards, even if the caller's clock does.
    fn stamp(&mut self, now: Timestamp) {
        if now > self.sync_timestamp {
            self.sync_timestamp = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(millis: i64) -> Timestamp {
        Timestamp::new(millis)
    }

    #[test]
    fn test_initial_state_is_stopped_at_zero() {
        // テスト項目: 初期状態は Stopped、位置 0
        // given (前提条件):

        // when (操作):
        let state = PlaybackState::new();

        // then (期待する結果):
        assert_eq!(state.status(), PlaybackStatus::Stopped);
        assert_eq!(state.position_seconds(), 0.0);
        assert!(state.track().is_none());
        assert!(!state.is_playing());
    }

    #[test]
    fn test_play_loads_track_and_starts_playing() {
        // テスト項目: play でトラックがロードされ再生状態になる
        // given (前提条件):
        let mut state = PlaybackState::new();
        let track = Track::new("Aqueous Transmission", "Incubus");

        // when (操作):
        state.play(track.clone(), 0.0, ts(1_000));

        // then (期待する結果):
        assert_eq!(state.status(), PlaybackStatus::Playing);
        assert_eq!(state.track(), Some(&track));
        assert_eq!(state.position_seconds(), 0.0);
        assert_eq!(state.sync_timestamp(), ts(1_000));
    }

    #[test]
    fn test_pause_freezes_reported_position() {
        // テスト項目: pause で報告された位置に固定される
        // given (前提条件):
        let mut state = PlaybackState::new();
        state.play(Track::new("T", "A"), 0.0, ts(1_000));

        // when (操作):
        state.pause(10.0, ts(5_000)).unwrap();

        // then (期待する結果):
        assert_eq!(state.status(), PlaybackStatus::Paused);
        assert_eq!(state.position_seconds(), 10.0);
        assert!(!state.is_playing());
        // frozen: effective position ignores further elapsed time
        assert_eq!(state.effective_position(ts(60_000)), 10.0);
    }

    #[test]
    fn test_pause_rejected_when_not_playing() {
        // テスト項目: 再生中でなければ pause は拒否される
        // given (前提条件):
        let mut state = PlaybackState::new();

        // when (操作):
        let result = state.pause(1.0, ts(1_000));

        // then (期待する結果):
        assert_eq!(result, Err(PlaybackError::NotPlaying));
        assert_eq!(state.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_resume_keeps_frozen_position() {
        // テスト項目: resume は位置を変えずに再生を再開する
        // given (前提条件):
        let mut state = PlaybackState::new();
        state.play(Track::new("T", "A"), 0.0, ts(1_000));
        state.pause(42.0, ts(5_000)).unwrap();

        // when (操作):
        state.resume(ts(9_000)).unwrap();

        // then (期待する結果):
        assert_eq!(state.status(), PlaybackStatus::Playing);
        assert_eq!(state.position_seconds(), 42.0);
        assert_eq!(state.sync_timestamp(), ts(9_000));
    }

    #[test]
    fn test_resume_rejected_when_not_paused() {
        // テスト項目: 一時停止中でなければ resume は拒否される
        // given (前提条件):
        let mut state = PlaybackState::new();
        state.play(Track::new("T", "A"), 0.0, ts(1_000));

        // when (操作):
        let result = state.resume(ts(2_000));

        // then (期待する結果):
        assert_eq!(result, Err(PlaybackError::NotPaused));
    }

    #[test]
    fn test_seek_requires_loaded_track() {
        // テスト項目: トラック未ロードの seek は拒否される
        // given (前提条件):
        let mut state = PlaybackState::new();

        // when (操作):
        let result = state.seek(30.0, ts(1_000));

        // then (期待する結果):
        assert_eq!(result, Err(PlaybackError::NoTrackLoaded));
    }

    #[test]
    fn test_seek_preserves_paused_state() {
        // テスト項目: seek は再生/停止状態を変えない
        // given (前提条件):
        let mut state = PlaybackState::new();
        state.play(Track::new("T", "A"), 0.0, ts(1_000));
        state.pause(10.0, ts(2_000)).unwrap();

        // when (操作):
        state.seek(90.0, ts(3_000)).unwrap();

        // then (期待する結果):
        assert_eq!(state.status(), PlaybackStatus::Paused);
        assert_eq!(state.position_seconds(), 90.0);
    }

    #[test]
    fn test_sync_position_rejected_while_paused() {
        // テスト項目: 一時停止中の sync_position は拒否される
        // given (前提条件):
        let mut state = PlaybackState::new();
        state.play(Track::new("T", "A"), 0.0, ts(1_000));
        state.pause(10.0, ts(2_000)).unwrap();

        // when (操作):
        let result = state.sync_position(11.0, ts(3_000));

        // then (期待する結果):
        assert_eq!(result, Err(PlaybackError::NotPlaying));
        assert_eq!(state.position_seconds(), 10.0);
    }

    #[test]
    fn test_sync_timestamp_is_monotonic() {
        // テスト項目: sync_timestamp は過去方向に戻らない
        // given (前提条件):
        let mut state = PlaybackState::new();
        state.play(Track::new("T", "A"), 0.0, ts(5_000));

        // when (操作): a late command carries an older timestamp
        state.seek(20.0, ts(3_000)).unwrap();

        // then (期待する結果): position applied (last writer wins),
        // timestamp held at the newest value
        assert_eq!(state.position_seconds(), 20.0);
        assert_eq!(state.sync_timestamp(), ts(5_000));
    }

    #[test]
    fn test_effective_position_advances_while_playing() {
        // テスト項目: 再生中の実効位置は経過時間分進む
        // given (前提条件):
        let mut state = PlaybackState::new();
        state.play(Track::new("T", "A"), 12.0, ts(10_000));

        // when (操作):
        let position = state.effective_position(ts(14_500));

        // then (期待する結果):
        assert!((position - 16.5).abs() < 1e-9);
    }

    #[test]
    fn test_play_replaces_current_track() {
        // テスト項目: 再生中の play は新しいトラックに置き換わる
        // given (前提条件):
        let mut state = PlaybackState::new();
        state.play(Track::new("First", "A"), 100.0, ts(1_000));

        // when (操作):
        state.play(Track::new("Second", "B"), 0.0, ts(2_000));

        // then (期待する結果):
        assert_eq!(state.track().map(|t| t.title.as_str()), Some("Second"));
        assert_eq!(state.position_seconds(), 0.0);
        assert_eq!(state.status(), PlaybackStatus::Playing);
    }
}
