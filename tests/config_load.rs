// tests/config_load.rs
use newsfeed_ranker::config::feed::{ENV_FEED_CONFIG_PATH, ENV_PAGE_SIZE, ENV_SETTLE_MS};
use newsfeed_ranker::FeedConfig;
use std::{env, fs};

fn clear_env() {
    env::remove_var(ENV_FEED_CONFIG_PATH);
    env::remove_var(ENV_PAGE_SIZE);
    env::remove_var(ENV_SETTLE_MS);
}

#[test]
fn load_from_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("feed.toml");
    fs::write(
        &p,
        r#"
[scoring]
w_freshness = 0.5
floor = -3.0

[session]
page_size = 10
"#,
    )
    .unwrap();

    let cfg = FeedConfig::load_from(&p).unwrap();
    assert_eq!(cfg.scoring.w_freshness, 0.5);
    assert_eq!(cfg.scoring.w_trending, 0.25);
    // non-positive floor falls back to the default
    assert_eq!(cfg.scoring.floor, 0.01);
    assert_eq!(cfg.session.page_size, 10);
    assert_eq!(cfg.session.settle_ms, 300);
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) Nothing at all -> defaults
    let cfg = FeedConfig::load_default().unwrap();
    assert_eq!(cfg.session.page_size, 20);

    // 2) Fallback ./config/feed.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(tmp.path().join("config/feed.toml"), "[session]\npage_size = 7\n").unwrap();
    let cfg = FeedConfig::load_default().unwrap();
    assert_eq!(cfg.session.page_size, 7);

    // 3) Env path wins over the fallback
    let alt = tmp.path().join("alt.toml");
    fs::write(&alt, "[session]\npage_size = 3\nsettle_ms = 50\n").unwrap();
    env::set_var(ENV_FEED_CONFIG_PATH, &alt);
    let cfg = FeedConfig::load_default().unwrap();
    assert_eq!(cfg.session.page_size, 3);
    assert_eq!(cfg.session.settle_ms, 50);

    // 4) Env overrides beat the file
    env::set_var(ENV_PAGE_SIZE, "12");
    env::set_var(ENV_SETTLE_MS, "not-a-number");
    let cfg = FeedConfig::load_default().unwrap();
    assert_eq!(cfg.session.page_size, 12);
    assert_eq!(cfg.session.settle_ms, 50);

    // 5) Env path to a missing file is an error
    env::set_var(ENV_FEED_CONFIG_PATH, tmp.path().join("missing.toml"));
    assert!(FeedConfig::load_default().is_err());

    clear_env();
    env::set_current_dir(old).unwrap();
}

#[serial_test::serial]
#[test]
fn invalid_file_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("bad.toml");
    fs::write(&p, "[session\n").unwrap();
    clear_env();
    env::set_var(ENV_FEED_CONFIG_PATH, &p);
    assert!(FeedConfig::load_default().is_err());
    clear_env();
}
