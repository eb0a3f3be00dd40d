use tempfile::TempDir;
use vidshelf_db::{PoolConfig, Progress, SeriesSettings, StoreError, Stores, open_stores};

fn temp_stores() -> (TempDir, Stores) {
    let dir = tempfile::tempdir().unwrap();
    let stores = open_stores(&dir.path().join("series.db"), PoolConfig::default()).unwrap();
    (dir, stores)
}

fn intro_settings() -> SeriesSettings {
    SeriesSettings {
        autoplay: true,
        skip_intro: true,
        skip_outro: false,
        intro_start: Some(30),
        intro_end: Some(90),
        credits_duration: Some(120),
    }
}

#[test]
fn settings_round_trip() {
    let (_dir, stores) = temp_stores();
    let session = stores.playback.session().unwrap();

    session
        .save_series_settings("TestShow.S01", "1080p", &intro_settings())
        .unwrap();

    let loaded = session
        .get_series_settings("TestShow.S01", "1080p")
        .unwrap()
        .unwrap();
    assert_eq!(loaded, intro_settings());
}

#[test]
fn stored_columns_use_flags_and_text_times() {
    let (_dir, stores) = temp_stores();
    stores
        .playback
        .session()
        .unwrap()
        .save_series_settings("TestShow.S01", "1080p", &intro_settings())
        .unwrap();

    let conn = stores.pool.acquire().unwrap();
    let row: (i64, i64, i64, String, String, String) = conn
        .query_row(
            "SELECT autoplay, skip_intro, skip_outro, intro_start, intro_end, credits_duration
             FROM series_settings WHERE series_prefix = ?1 AND series_suffix = ?2",
            ["TestShow.S01", "1080p"],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                ))
            },
        )
        .unwrap();
    assert_eq!(
        row,
        (1, 1, 0, "30".to_string(), "90".to_string(), "120".to_string())
    );
}

#[test]
fn missing_settings_are_none() {
    let (_dir, stores) = temp_stores();
    let session = stores.playback.session().unwrap();
    assert!(session.get_series_settings("Nothing.S01", "720p").unwrap().is_none());
}

#[test]
fn unset_times_stay_unset() {
    let (_dir, stores) = temp_stores();
    let session = stores.playback.session().unwrap();

    let settings = SeriesSettings {
        autoplay: true,
        ..SeriesSettings::default()
    };
    session.save_series_settings("Show.S02", "x265", &settings).unwrap();
    assert_eq!(
        session.get_series_settings("Show.S02", "x265").unwrap(),
        Some(settings)
    );
}

#[test]
fn unparseable_times_read_as_unset() {
    let (_dir, stores) = temp_stores();
    {
        let conn = stores.pool.acquire().unwrap();
        conn.execute(
            "INSERT INTO series_settings (series_prefix, series_suffix, autoplay, skip_intro,
                 skip_outro, intro_start, intro_end, credits_duration)
             VALUES ('Hand.S01', 'web', 0, 1, 0, '', 'soon', '45')",
            [],
        )
        .unwrap();
    }

    let loaded = stores
        .playback
        .session()
        .unwrap()
        .get_series_settings("Hand.S01", "web")
        .unwrap()
        .unwrap();
    assert!(loaded.skip_intro);
    assert_eq!(loaded.intro_start, None);
    assert_eq!(loaded.intro_end, None);
    assert_eq!(loaded.credits_duration, Some(45));
}

#[test]
fn save_overwrites_settings() {
    let (_dir, stores) = temp_stores();
    let session = stores.playback.session().unwrap();

    session
        .save_series_settings("TestShow.S01", "1080p", &intro_settings())
        .unwrap();
    let updated = SeriesSettings {
        autoplay: false,
        intro_end: Some(95),
        ..intro_settings()
    };
    session
        .save_series_settings("TestShow.S01", "1080p", &updated)
        .unwrap();

    assert_eq!(
        session.get_series_settings("TestShow.S01", "1080p").unwrap(),
        Some(updated)
    );
}

#[test]
fn validate_rejects_inverted_intro() {
    let settings = SeriesSettings {
        intro_start: Some(90),
        intro_end: Some(30),
        ..SeriesSettings::default()
    };
    let err = settings.validate().unwrap_err();
    assert!(matches!(err, StoreError::Validation { ref field, .. } if field == "intro_end"));

    assert!(intro_settings().validate().is_ok());
    assert!(
        SeriesSettings {
            intro_start: Some(90),
            ..SeriesSettings::default()
        }
        .validate()
        .is_ok()
    );
}

#[test]
fn other_versions_come_from_history_and_settings() {
    let (_dir, stores) = temp_stores();
    let session = stores.playback.session().unwrap();

    for (file, suffix) in [
        ("Show.S01E01.1080p.mkv", "1080p"),
        ("Show.S01E02.1080p.mkv", "1080p"),
        ("Show.S01E01.720p.mkv", "720p"),
        ("Show.S01E01.x265.mkv", "x265"),
    ] {
        session
            .save_playback(file, Progress::new(1, 10, 10), Some("Show.S01"), Some(suffix))
            .unwrap();
    }
    session
        .save_playback("Other.S01E01.480p.mkv", Progress::new(1, 10, 10), Some("Other.S01"), Some("480p"))
        .unwrap();
    session
        .save_playback("Show.S01E03.mkv", Progress::new(1, 10, 10), Some("Show.S01"), None)
        .unwrap();
    session
        .save_series_settings("Show.S01", "bluray", &SeriesSettings::default())
        .unwrap();

    let others = session.find_other_versions("Show.S01", "1080p").unwrap();
    assert_eq!(others, vec!["720p", "bluray", "x265"]);

    assert!(session.find_other_versions("Missing.S09", "1080p").unwrap().is_empty());
}

#[test]
fn propagate_copies_to_every_other_version() {
    let (_dir, stores) = temp_stores();
    let session = stores.playback.session().unwrap();

    for suffix in ["1080p", "720p", "480p"] {
        session
            .save_playback(
                &format!("Show.S01E01.{suffix}.mkv"),
                Progress::new(1, 10, 10),
                Some("Show.S01"),
                Some(suffix),
            )
            .unwrap();
    }
    session
        .save_series_settings("Show.S01", "1080p", &intro_settings())
        .unwrap();

    let written = session.propagate_series_settings("Show.S01", "1080p").unwrap();
    assert_eq!(written, 2);
    for suffix in ["720p", "480p"] {
        assert_eq!(
            session.get_series_settings("Show.S01", suffix).unwrap(),
            Some(intro_settings())
        );
    }
}

#[test]
fn propagate_without_source_does_nothing() {
    let (_dir, stores) = temp_stores();
    let session = stores.playback.session().unwrap();

    session
        .save_playback("Show.S01E01.720p.mkv", Progress::new(1, 10, 10), Some("Show.S01"), Some("720p"))
        .unwrap();

    assert_eq!(session.propagate_series_settings("Show.S01", "1080p").unwrap(), 0);
    assert!(session.get_series_settings("Show.S01", "720p").unwrap().is_none());
    // The connection is usable again afterwards.
    assert!(session.find_other_versions("Show.S01", "1080p").unwrap().len() == 1);
}
