use super::{classify, parse, DEFAULT_TIMEOUT};
use crate::cli::Invocation;
use std::path::Path;
use std::time::Duration;
use websend_core::relay::RelayCommand;

#[test]
fn no_arguments_prints_usage() {
    assert_eq!(classify(&["websend"]).unwrap(), Invocation::Usage);
}

#[test]
fn single_scheme_argument_is_one_shot() {
    let got = classify(&["websend", r#"websend://{"message":"version"}"#]).unwrap();
    assert_eq!(got, Invocation::OneShot(r#"{"message":"version"}"#.to_string()));
}

#[test]
fn scheme_argument_with_more_arguments_is_a_relay() {
    match classify(&["websend", "websend://{}", "x"]).unwrap() {
        Invocation::Relay(cmd) => assert_eq!(cmd.target, "websend://{}"),
        other => panic!("expected Relay, got {:?}", other),
    }
}

#[test]
fn chrome_origin_starts_session() {
    let got = classify(&["websend", "chrome-extension://abcdefghijklmnop/"]).unwrap();
    assert_eq!(got, Invocation::Session);
    let got = classify(&["websend", "chrome-extension://abc/", "--parent-window=0"]).unwrap();
    assert_eq!(got, Invocation::Session);
}

#[test]
fn firefox_extension_id_starts_session() {
    assert_eq!(classify(&["websend", "@websend"]).unwrap(), Invocation::Session);
    assert_eq!(
        classify(&["websend", "/usr/lib/mozilla/native-messaging-hosts/websend.json", "@websend"]).unwrap(),
        Invocation::Session
    );
    assert!(matches!(
        classify(&["websend", "praat", "Quit", "@websend"]).unwrap(),
        Invocation::Relay(_)
    ));
}

#[test]
fn session_flag_forces_session() {
    assert_eq!(classify(&["websend", "--session"]).unwrap(), Invocation::Session);
}

#[test]
fn relay_uses_default_timeout() {
    let got = classify(&["websend", "praat", "Play reverse", "Quit"]).unwrap();
    assert_eq!(
        got,
        Invocation::Relay(RelayCommand {
            timeout: DEFAULT_TIMEOUT,
            target: "praat".into(),
            lines: vec!["Play reverse".into(), "Quit".into()],
        })
    );
}

#[test]
fn leading_number_is_the_timeout() {
    match classify(&["websend", "0", "praat", "Quit"]).unwrap() {
        Invocation::Relay(cmd) => {
            assert_eq!(cmd.timeout, Duration::ZERO);
            assert_eq!(cmd.target, "praat");
            assert_eq!(cmd.lines, vec!["Quit".to_string()]);
        }
        other => panic!("expected Relay, got {:?}", other),
    }
}

#[test]
fn program_without_lines_is_allowed() {
    match classify(&["websend", "1000", "praat"]).unwrap() {
        Invocation::Relay(cmd) => {
            assert_eq!(cmd.timeout, Duration::from_secs(1000));
            assert!(cmd.lines.is_empty());
        }
        other => panic!("expected Relay, got {:?}", other),
    }
}

#[test]
fn timeout_without_program_is_an_error() {
    let err = classify(&["websend", "5"]).unwrap_err();
    assert!(err.to_string().contains("missing program name"));
}

#[test]
fn hyphenated_script_lines_are_kept() {
    match classify(&["websend", "praat", "-x", "--flag-like line"]).unwrap() {
        Invocation::Relay(cmd) => assert_eq!(cmd.lines, vec!["-x".to_string(), "--flag-like line".to_string()]),
        other => panic!("expected Relay, got {:?}", other),
    }
}

#[test]
fn config_flag_parses() {
    let cli = parse(&["websend", "--config", "/tmp/w.toml", "praat", "Quit"]);
    assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/w.toml")));
    assert_eq!(cli.args, vec!["praat".to_string(), "Quit".to_string()]);
}
