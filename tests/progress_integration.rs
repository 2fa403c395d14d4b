//! Integration tests for the progress ledger and reward economy
//!
//! Walks the completion pipeline: completeLesson → food → badge

use chrono::Utc;
use pretty_assertions::assert_eq;

use lesson_engine::core::{award_badge, complete_lesson, credit_lesson, feed};
use lesson_engine::types::{
    BadgeId, Course, FeedReason, Lesson, MascotLevel, ProgressLedger, Unit,
};

fn unit(id: &str, lessons: Vec<Lesson>) -> Unit {
    Unit {
        id: id.into(),
        title: id.into(),
        description: String::new(),
        color: "bg-brand".into(),
        lessons,
    }
}

/// completeLesson, +2 food, badge evaluation; returns the badge awarded
fn finish(course: &mut Course, ledger: &mut ProgressLedger, lesson_id: &str) -> (Option<BadgeId>, bool) {
    let done = complete_lesson(course, ledger, lesson_id).unwrap();
    credit_lesson(ledger, 0);
    let badge = award_badge(ledger, done.completed_count, done.unit_just_completed, Utc::now());
    (badge.map(|b| b.id), done.unit_just_completed)
}

#[test]
fn test_one_unit_two_lessons_end_to_end() {
    let mut course = Course {
        id: "c".into(),
        topic: "T".into(),
        units: vec![unit("u1", vec![Lesson::new("l1", "One", false), Lesson::new("l2", "Two", true)])],
    };
    let mut ledger = ProgressLedger { food: 3, ..ProgressLedger::new() };

    let (badge, unit_done) = finish(&mut course, &mut ledger, "l1");
    assert_eq!(badge, Some(BadgeId::FirstLesson));
    assert!(!unit_done);
    assert!(!course.units[0].lessons[1].is_locked);
    assert_eq!(ledger.completed_count(), 1);
    assert_eq!(ledger.food, 5);

    let (badge, unit_done) = finish(&mut course, &mut ledger, "l2");
    assert!(unit_done);
    assert_eq!(badge, Some(BadgeId::Master));
    assert_eq!(ledger.completed_count(), 2);
    assert_eq!(ledger.food, 7);
    assert!(course.units[0].is_complete(&ledger));
    assert_eq!(course.progress_percent(&ledger), 100);
    assert_eq!(ledger.owned_badges(), vec![BadgeId::FirstLesson, BadgeId::Master]);
}

#[test]
fn test_recompletion_counts_once_but_pays_food() {
    let mut course = Course {
        id: "c".into(),
        topic: "T".into(),
        units: vec![unit("u1", vec![Lesson::new("l1", "One", false), Lesson::new("l2", "Two", true)])],
    };
    let mut ledger = ProgressLedger::new();
    finish(&mut course, &mut ledger, "l1");
    let (badge, _) = finish(&mut course, &mut ledger, "l1");
    assert_eq!(badge, None);
    assert_eq!(ledger.completed_count(), 1);
    assert_eq!(ledger.food, 4);
}

#[test]
fn test_scholar_then_master_across_units() {
    let mut course = Course {
        id: "c".into(),
        topic: "T".into(),
        units: vec![
            unit("u1", vec![Lesson::new("a", "A", false), Lesson::new("b", "B", true)]),
            unit("u2", vec![Lesson::new("c", "C", true), Lesson::new("d", "D", true)]),
        ],
    };
    let mut ledger = ProgressLedger::new();

    let awarded: Vec<Option<BadgeId>> = ["a", "b", "c", "d"]
        .iter()
        .map(|id| finish(&mut course, &mut ledger, id).0)
        .collect();
    assert_eq!(
        awarded,
        vec![Some(BadgeId::FirstLesson), Some(BadgeId::Master), Some(BadgeId::Scholar), None]
    );
    assert!(course.lessons().all(|l| !l.is_locked));
}

#[test]
fn test_unknown_lesson_is_rejected_without_side_effects() {
    let mut course = Course {
        id: "c".into(),
        topic: "T".into(),
        units: vec![unit("u1", vec![Lesson::new("l1", "One", false)])],
    };
    let mut ledger = ProgressLedger::new();
    assert!(complete_lesson(&mut course, &mut ledger, "ghost").is_err());
    assert_eq!(ledger, ProgressLedger::new());
}

#[test]
fn test_fifteen_feeds_reach_adult_and_cap() {
    let mut ledger = ProgressLedger { food: 20, ..ProgressLedger::new() };
    let mut level_ups = 0;
    for _ in 0..15 {
        let out = feed(&mut ledger, false);
        assert!(out.reason.fed());
        if out.leveled_up() {
            level_ups += 1;
        }
        assert!(ledger.food_eaten_progress < 5);
    }
    assert_eq!(level_ups, 2);
    assert_eq!(ledger.mascot_level, MascotLevel::Adult);
    assert_eq!(ledger.food, 5);
    assert_eq!(ledger.level_progress_percent(), 0);
}

#[test]
fn test_feed_without_food_is_noop() {
    let mut ledger = ProgressLedger::new();
    let before = ledger.clone();
    assert_eq!(feed(&mut ledger, false).reason, FeedReason::F404_NO_FOOD);
    assert_eq!(ledger, before);
}
