use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use assert_matches::assert_matches;

use typometer::clock::ManualClock;
use typometer::{
    Applied, CharState, Difficulty, KeyInput, Lifecycle, SessionConfig, TestResult, TypingTest,
};

fn timed(reference: &str, secs: u64) -> (TypingTest<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let config = SessionConfig::timed(Difficulty::Medium, secs).unwrap();
    let test = TypingTest::new(reference, config, clock.clone()).unwrap();
    (test, clock)
}

fn words(reference: &str) -> (TypingTest<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let count = reference.split(' ').count();
    let config = SessionConfig::words(Difficulty::Medium, count).unwrap();
    let test = TypingTest::new(reference, config, clock.clone()).unwrap();
    (test, clock)
}

fn type_str<C: typometer::clock::Clock>(test: &mut TypingTest<C>, text: &str) {
    for c in text.chars() {
        test.apply_key(KeyInput::Char(c));
    }
}

fn collect_results<C: typometer::clock::Clock>(
    test: &mut TypingTest<C>,
) -> Rc<RefCell<Vec<TestResult>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    test.on_complete(move |result| sink.borrow_mut().push(result.clone()));
    seen
}

#[test]
fn duration_mode_wpm_after_thirty_seconds() {
    let (mut test, clock) = timed("the cat sat", 60);
    type_str(&mut test, "the cat sat");
    clock.advance(Duration::from_secs(30));
    assert_eq!(test.tick(), Applied::Updated);

    let stats = test.query_stats();
    assert_eq!(stats.correct_chars, 11);
    assert_eq!(stats.wpm, 4);
    assert_eq!(stats.raw_wpm, 4);
    assert_eq!(stats.accuracy, 100.0);
    assert_eq!(stats.time_taken_secs, 30);
    assert_eq!(test.lifecycle(), Lifecycle::Running);
}

#[test]
fn word_mode_finishes_without_any_tick() {
    let reference = "one two three four five six seven eight nine ten";
    let (mut test, clock) = words(reference);
    let results = collect_results(&mut test);

    type_str(&mut test, &reference[..reference.len() - 1]);
    assert_eq!(test.lifecycle(), Lifecycle::Running);
    clock.advance(Duration::from_secs(12));

    assert_eq!(test.apply_key(KeyInput::Char('n')), Applied::Completed);
    assert!(test.has_finished());

    let results = results.borrow();
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.stats.correct_chars, reference.len());
    assert_eq!(result.stats.time_taken_secs, 12);
    assert_eq!(result.difficulty, Difficulty::Medium);
    assert_eq!(Some(result), test.result());
}

#[test]
fn backspace_restores_pending() {
    let (mut test, _clock) = words("help");
    type_str(&mut test, "hel");
    let states: Vec<_> = test.statuses().iter().map(|s| s.state).collect();
    assert_eq!(
        states,
        [
            CharState::Correct,
            CharState::Correct,
            CharState::Correct,
            CharState::Pending
        ]
    );

    assert_eq!(test.apply_key(KeyInput::Backspace), Applied::Updated);
    assert_eq!(test.input(), "he");
    let states: Vec<_> = test.statuses().iter().map(|s| s.state).collect();
    assert_eq!(
        states,
        [
            CharState::Correct,
            CharState::Correct,
            CharState::Pending,
            CharState::Pending
        ]
    );
}

#[test]
fn restart_clears_everything() {
    let (mut test, clock) = words("ab cd");
    type_str(&mut test, "ab");
    clock.advance(Duration::from_secs(2));
    type_str(&mut test, " cx");
    assert!(test.has_finished());
    assert!(test.query_stats().wpm > 0);

    test.restart();
    assert_eq!(test.lifecycle(), Lifecycle::NotStarted);
    assert_eq!(test.input(), "");
    assert!(test
        .statuses()
        .iter()
        .all(|s| s.state == CharState::Pending));
    assert_eq!(test.elapsed(), Duration::ZERO);
    assert_eq!(test.current_word_index(), 0);
    assert!(test.result().is_none());

    let live = test.live_stats();
    assert_eq!(live.wpm, 0);
    assert_eq!(live.raw_wpm, 0);
    assert_eq!(live.accuracy, 0.0);
    assert!(!live.accuracy.is_nan());
    assert_eq!(live.errors, 0);
}

#[test]
fn prefixes_are_fully_accurate() {
    let reference = "quick brown fox";
    for end in 1..=reference.len() {
        let (mut test, clock) = timed(reference, 60);
        type_str(&mut test, &reference[..end]);
        clock.advance(Duration::from_secs(5));
        test.tick();

        let stats = test.query_stats();
        assert_eq!(stats.correct_chars, end);
        assert_eq!(stats.accuracy, 100.0);
    }
}

#[test]
fn all_wrong_input_has_zero_accuracy() {
    let (mut test, _clock) = timed("abc", 60);
    type_str(&mut test, "xyz");
    let stats = test.query_stats();
    assert_eq!(stats.correct_chars, 0);
    assert_eq!(stats.accuracy, 0.0);
    assert_eq!(stats.errors, 3);
}

#[test]
fn query_stats_is_a_pure_read() {
    let (mut test, clock) = timed("hello world", 60);
    type_str(&mut test, "hello w");
    clock.advance(Duration::from_secs(3));
    test.tick();

    let first = test.query_stats();
    clock.advance(Duration::from_secs(40));
    let second = test.query_stats();
    assert_eq!(first, second);
}

#[test]
fn repeated_expiry_completes_once() {
    let (mut test, clock) = timed("some words here", 1);
    let results = collect_results(&mut test);

    type_str(&mut test, "so");
    clock.advance(Duration::from_secs(3));

    assert_eq!(test.tick(), Applied::Completed);
    assert_eq!(test.tick(), Applied::Ignored);
    assert_eq!(test.poll_timers(), Applied::Ignored);
    assert_eq!(test.apply_key(KeyInput::Char('m')), Applied::Ignored);

    assert_eq!(results.borrow().len(), 1);
    // the measured time is kept, not clipped to the limit
    assert_eq!(test.elapsed(), Duration::from_secs(3));
}

#[test]
fn word_index_never_goes_backwards_while_appending() {
    let reference = "a bb ccc dddd";
    let (mut test, _clock) = timed(reference, 60);
    let mut last = test.current_word_index();
    for c in format!("{reference}xyz").chars() {
        test.apply_key(KeyInput::Char(c));
        assert!(test.current_word_index() >= last);
        last = test.current_word_index();
    }
    assert_eq!(last, 3);
}

#[test]
fn overtype_counts_extra_characters_as_errors() {
    let (mut test, _clock) = timed("cat", 60);
    type_str(&mut test, "cats!");

    let stats = test.query_stats();
    assert_eq!(stats.incorrect_chars, 2);
    assert_eq!(stats.correct_chars, 3);
    assert_eq!(stats.total_chars, 3);
    assert_eq!(test.statuses()[3].state, CharState::Extra);
    assert_eq!(test.statuses()[4].ch, '!');
}

#[test]
fn overtype_can_finish_word_mode_early() {
    let (mut test, _clock) = words("ab cd");
    type_str(&mut test, "abcdef");
    assert!(test.has_finished());
    assert_eq!(test.input_len(), 5);
    assert!(test.query_stats().errors > 0);
}

#[test]
fn near_zero_elapsed_is_floored() {
    let (mut test, _clock) = timed("hello", 60);
    type_str(&mut test, "hello");
    test.tick();

    let stats = test.query_stats();
    // five correct characters over the 0.5 s floor
    assert_eq!(stats.wpm, 120);
    assert!(stats.raw_wpm < u32::MAX);
}

#[test]
fn new_test_installs_fresh_text_and_drops_stale_timers() {
    let (mut test, clock) = timed("first text", 1);
    let results = collect_results(&mut test);
    type_str(&mut test, "fi");

    test.new_test("second text").unwrap();
    clock.advance(Duration::from_secs(5));
    assert_eq!(test.poll_timers(), Applied::Ignored);
    assert_eq!(test.lifecycle(), Lifecycle::NotStarted);
    assert_eq!(test.reference(), "second text");
    assert!(results.borrow().is_empty());

    assert_matches!(test.new_test(""), Err(typometer::ConfigError::EmptyReference));
}

#[test]
fn listener_fires_again_for_the_next_attempt() {
    let (mut test, _clock) = words("go");
    let results = collect_results(&mut test);

    type_str(&mut test, "go");
    test.restart();
    type_str(&mut test, "gx");

    let results = results.borrow();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].stats.errors, 0);
    assert_eq!(results[1].stats.errors, 1);
}
