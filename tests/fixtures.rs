use std::fs;

use glob::glob;
use subtext::{
    filter::{Filter, Filterable, Pattern},
    srt::SubripText,
    webvtt::WebVtt,
    LineEnding,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fixtures(pattern: &str) -> Vec<(String, String)> {
    let files = glob(&format!("./fixtures/{pattern}"))
        .unwrap()
        .map(|path| {
            let path = path.unwrap();
            let content = fs::read_to_string(&path).unwrap();
            (path.display().to_string(), content)
        })
        .collect::<Vec<_>>();
    assert!(!files.is_empty(), "no fixture matching '{pattern}'");
    files
}

#[test]
fn srt_fixtures_are_stable() {
    init_logger();
    for (path, content) in fixtures("*.srt") {
        let srt = SubripText::parse(&content).unwrap();
        assert_eq!(srt.to_text(LineEnding::CrLf, false), content, "{path}");

        let reparsed = SubripText::parse(&srt.to_text(LineEnding::Lf, true)).unwrap();
        assert_eq!(reparsed, srt, "{path}");
    }
}

#[test]
fn srt_fixtures_shift_and_filter() {
    init_logger();
    for (path, content) in fixtures("*.srt") {
        let mut srt = SubripText::parse(&content).unwrap();
        let count = srt.len();

        let nothing = Pattern::from_expression("/^no such line$/").unwrap();
        assert!(srt.filter(&nothing).is_empty(), "{path}");
        assert_eq!(srt.len(), count, "{path}");

        let removed = Filter::new().with(Pattern::annotations()).apply(&mut srt);
        assert_eq!(removed.len() + srt.len(), count, "{path}");
        assert!(srt.entries().all(|s| !Pattern::annotations().is_match(&s.text)));
        assert!(removed.iter().all(|s| Pattern::annotations().is_match(&s.text)));
        assert!(srt.entries().zip(srt.entries().skip(1)).all(|(a, b)| a.index < b.index));

        let mut shifted = srt.clone();
        shifted.offset(-500);
        shifted.offset(2000);
        srt.offset(1500);
        assert_eq!(shifted, srt, "{path}");
    }
}

#[test]
fn vtt_fixtures_are_stable() {
    init_logger();
    for (path, content) in fixtures("*.vtt") {
        let vtt = WebVtt::parse(&content).unwrap();
        assert_eq!(vtt.to_text(LineEnding::Lf, false), content, "{path}");

        let reparsed = WebVtt::parse(&vtt.to_text(LineEnding::CrLf, true)).unwrap();
        assert_eq!(reparsed, vtt, "{path}");
        assert_eq!(reparsed.blocks(), vtt.blocks(), "{path}");
    }
}

#[test]
fn vtt_storm_content() {
    init_logger();
    let vtt = WebVtt::parse(&fs::read_to_string("./fixtures/storm.vtt").unwrap()).unwrap();
    assert_eq!(vtt.header(), "Storm");
    assert_eq!(vtt.len(), 7);
    assert_eq!(vtt.comments().len(), 2);
    assert_eq!(vtt.comments()[1].text, " last line is spoken off screen");
    assert_eq!(vtt.cues()[2].time.start.msecs(), 62_003);
    assert_eq!(vtt.cues()[0].settings.as_deref(), Some("line:90%"));
}
